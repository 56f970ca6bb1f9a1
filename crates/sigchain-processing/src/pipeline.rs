//! Filter chain: ordered, reorderable list of filter stages

use crate::filters::{FilterKind, FilterStage};
use crate::processor::{apply_fail_open, ProcessingMetrics, SignalTransform};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sigchain_core::{SigError, SigResult};
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Stable identity of a chain entry, unchanged by reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(Uuid);

impl StageId {
    fn new() -> Self {
        StageId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stage in the chain together with its id and enabled flag
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEntry {
    id: StageId,
    enabled: bool,
    stage: FilterStage,
    /// Unrecognized document fields carried through load and save
    extra: Map<String, Value>,
}

impl ChainEntry {
    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn stage(&self) -> &FilterStage {
        &self.stage
    }

    pub fn kind(&self) -> FilterKind {
        self.stage.kind()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Timing and outcome of one enabled stage
#[derive(Debug, Clone)]
pub struct StageReport {
    pub id: StageId,
    pub kind: FilterKind,
    pub metrics: ProcessingMetrics,
}

/// Chain output with per-stage metrics
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub output: Vec<f64>,
    pub stage_reports: Vec<StageReport>,
    pub total_time_us: u64,
    /// One entry per stage that failed open
    pub warnings: Vec<String>,
}

impl ChainOutput {
    pub fn bypassed_count(&self) -> usize {
        self.stage_reports.iter().filter(|r| !r.metrics.success).count()
    }
}

/// Ordered chain of filter stages
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    entries: Vec<ChainEntry>,
}

impl FilterChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage of `kind` with default parameters, enabled
    pub fn append(&mut self, kind: FilterKind) -> StageId {
        self.append_stage(kind.default_stage())
    }

    /// Append a pre-built stage, enabled
    pub fn append_stage(&mut self, stage: FilterStage) -> StageId {
        let id = StageId::new();
        debug!("Appending stage {} ({})", id, stage);
        self.entries.push(ChainEntry {
            id,
            enabled: true,
            stage,
            extra: Map::new(),
        });
        id
    }

    /// Remove a stage by id, returning it
    pub fn remove(&mut self, id: StageId) -> SigResult<FilterStage> {
        let index = self.position(id)?;
        Ok(self.entries.remove(index).stage)
    }

    /// Reorder the chain to match `order`, which must be a permutation of
    /// the current ids. The chain is unchanged on error.
    pub fn reorder(&mut self, order: &[StageId]) -> SigResult<()> {
        if order.len() != self.entries.len() {
            return Err(SigError::InvalidReorder {
                reason: format!(
                    "expected {} ids, got {}",
                    self.entries.len(),
                    order.len()
                ),
            });
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !seen.insert(*id) {
                return Err(SigError::InvalidReorder {
                    reason: format!("stage {} listed twice", id),
                });
            }
        }

        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            let entry = self
                .entries
                .iter()
                .find(|e| e.id == *id)
                .ok_or_else(|| SigError::InvalidReorder {
                    reason: format!("stage {} is not in the chain", id),
                })?;
            reordered.push(entry.clone());
        }

        self.entries = reordered;
        Ok(())
    }

    /// Update one declared parameter of a stage
    pub fn set_param(&mut self, id: StageId, name: &str, value: f64) -> SigResult<()> {
        let index = self.position(id)?;
        self.entries[index].stage.set_param(name, value)
    }

    /// Flip the enabled flag, returning the new value
    pub fn toggle(&mut self, id: StageId) -> SigResult<bool> {
        let index = self.position(id)?;
        let entry = &mut self.entries[index];
        entry.enabled = !entry.enabled;
        Ok(entry.enabled)
    }

    pub fn set_enabled(&mut self, id: StageId, enabled: bool) -> SigResult<()> {
        let index = self.position(id)?;
        self.entries[index].enabled = enabled;
        Ok(())
    }

    /// Attach pass-through fields to a stage
    pub fn set_extra(&mut self, id: StageId, extra: Map<String, Value>) -> SigResult<()> {
        let index = self.position(id)?;
        self.entries[index].extra = extra;
        Ok(())
    }

    pub fn get(&self, id: StageId) -> Option<&ChainEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<StageId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.enabled).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Apply every enabled stage in order
    pub fn apply(&self, signal: &[f64], sampling_rate: f64) -> Vec<f64> {
        self.apply_with_report(signal, sampling_rate).output
    }

    /// Apply every enabled stage in order, recording per-stage metrics.
    ///
    /// A stage that faults passes its input through and adds a warning.
    pub fn apply_with_report(&self, signal: &[f64], sampling_rate: f64) -> ChainOutput {
        let start_time = Instant::now();
        let mut current = signal.to_vec();
        let mut stage_reports = Vec::with_capacity(self.enabled_count());
        let mut warnings = Vec::new();

        for entry in self.entries.iter().filter(|e| e.enabled) {
            let outcome = apply_fail_open(&entry.stage, &current, sampling_rate);

            if let Some(reason) = &outcome.metrics.error_message {
                warn!("Stage {} ({}) bypassed: {}", entry.id, entry.stage, reason);
                warnings.push(format!(
                    "Stage '{}' failed: {}, bypassing",
                    entry.stage.kind(),
                    reason
                ));
            } else {
                debug!(
                    "Stage {} took {}μs for {} samples",
                    entry.stage.kind(),
                    outcome.metrics.processing_time_us,
                    outcome.metrics.input_len
                );
            }

            stage_reports.push(StageReport {
                id: entry.id,
                kind: entry.stage.kind(),
                metrics: outcome.metrics,
            });
            current = outcome.output;
        }

        ChainOutput {
            output: current,
            stage_reports,
            total_time_us: start_time.elapsed().as_micros() as u64,
            warnings,
        }
    }

    fn position(&self, id: StageId) -> SigResult<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| SigError::StageNotFound { id: id.to_string() })
    }
}

impl SignalTransform for FilterChain {
    fn apply(&self, signal: &[f64], sampling_rate: f64) -> SigResult<Vec<f64>> {
        Ok(FilterChain::apply(self, signal, sampling_rate))
    }

    fn name(&self) -> &str {
        "filter chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * 0.5 + (i as f64).sin()).collect()
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = FilterChain::new();
        let data = ramp(50);
        assert_eq!(chain.apply(&data, 100.0), data);
    }

    #[test]
    fn test_append_defaults_and_unique_ids() {
        let mut chain = FilterChain::new();
        let a = chain.append(FilterKind::Lowpass);
        let b = chain.append(FilterKind::Lowpass);
        assert_ne!(a, b);
        assert_eq!(chain.len(), 2);
        let entry = chain.get(a).unwrap();
        assert!(entry.enabled());
        assert_eq!(entry.stage().param("cutoff"), Some(50.0));
    }

    #[test]
    fn test_disabled_stage_is_skipped() {
        let mut chain = FilterChain::new();
        let id = chain.append(FilterKind::Normalize);
        assert!(!chain.toggle(id).unwrap());
        let data = ramp(20);
        assert_eq!(chain.apply(&data, 100.0), data);
        assert_eq!(chain.enabled_count(), 0);

        assert!(chain.toggle(id).unwrap());
        assert_ne!(chain.apply(&data, 100.0), data);
    }

    #[test]
    fn test_apply_is_left_fold() {
        let mut chain = FilterChain::new();
        chain.append(FilterKind::Detrend);
        chain.append(FilterKind::Normalize);
        let data = ramp(64);

        let expected = FilterStage::Normalize
            .apply(&FilterStage::Detrend.apply(&data, 100.0).unwrap(), 100.0)
            .unwrap();
        assert_eq!(chain.apply(&data, 100.0), expected);
    }

    #[test]
    fn test_reorder_changes_output() {
        let mut chain = FilterChain::new();
        let normalize = chain.append(FilterKind::Normalize);
        let detrend = chain.append(FilterKind::Detrend);
        let data = ramp(64);

        let before = chain.apply(&data, 100.0);
        chain.reorder(&[detrend, normalize]).unwrap();
        let after = chain.apply(&data, 100.0);

        assert_eq!(chain.ids(), vec![detrend, normalize]);
        assert_ne!(before, after);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut chain = FilterChain::new();
        let a = chain.append(FilterKind::Normalize);
        let b = chain.append(FilterKind::Detrend);
        let original = chain.ids();

        assert!(matches!(chain.reorder(&[a]), Err(SigError::InvalidReorder { .. })));
        assert!(matches!(chain.reorder(&[a, a]), Err(SigError::InvalidReorder { .. })));

        let mut other = FilterChain::new();
        let stranger = other.append(FilterKind::Median);
        assert!(matches!(
            chain.reorder(&[b, stranger]),
            Err(SigError::InvalidReorder { .. })
        ));
        assert_eq!(chain.ids(), original);
    }

    #[test]
    fn test_remove_and_missing_id() {
        let mut chain = FilterChain::new();
        let id = chain.append(FilterKind::Median);
        assert_eq!(chain.remove(id).unwrap().kind(), FilterKind::Median);
        assert!(chain.is_empty());
        assert!(matches!(chain.remove(id), Err(SigError::StageNotFound { .. })));
        assert!(chain.toggle(id).is_err());
    }

    #[test]
    fn test_set_param() {
        let mut chain = FilterChain::new();
        let id = chain.append(FilterKind::Notch);
        chain.set_param(id, "frequency", 60.0).unwrap();
        assert_eq!(chain.get(id).unwrap().stage().param("frequency"), Some(60.0));
        assert!(matches!(
            chain.set_param(id, "cutoff", 1.0),
            Err(SigError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_stage_fails_open() {
        let mut chain = FilterChain::new();
        chain.append_stage(FilterStage::lowpass(-5.0, 4.0));
        let normalize = chain.append(FilterKind::Normalize);
        let data = vec![1.0, 3.0, 2.0];

        let report = chain.apply_with_report(&data, 100.0);
        assert_eq!(report.output, vec![0.0, 1.0, 0.5]);
        assert_eq!(report.bypassed_count(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.stage_reports.len(), 2);
        assert_eq!(report.stage_reports[1].id, normalize);
        assert!(report.stage_reports[1].metrics.success);
    }

    #[test]
    fn test_zero_sampling_rate_fails_open() {
        let mut chain = FilterChain::new();
        chain.append(FilterKind::Notch);
        let data = ramp(10);
        assert_eq!(chain.apply(&data, 0.0), data);
    }

    #[test]
    fn test_output_length_preserved() {
        let mut chain = FilterChain::new();
        for kind in FilterKind::ALL {
            chain.append(kind);
        }
        let data = ramp(500);
        let report = chain.apply_with_report(&data, 250.0);
        assert_eq!(report.output.len(), 500);
        assert_eq!(report.stage_reports.len(), FilterKind::ALL.len());
    }
}
