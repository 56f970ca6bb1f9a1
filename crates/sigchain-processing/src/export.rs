//! Export of processed data and of the chain as a standalone script

use crate::filters::FilterStage;
use crate::pipeline::FilterChain;
use sigchain_core::{SigError, SigResult};
use std::fmt::Write as _;
use std::io;

/// Processed channel aligned with its timestamps, ready for CSV output
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub channel: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl CsvExport {
    pub fn new(channel: impl Into<String>, times: Vec<f64>, values: Vec<f64>) -> SigResult<Self> {
        if times.len() != values.len() {
            return Err(SigError::InvalidSignalData {
                reason: format!(
                    "Cannot export {} values against {} timestamps",
                    values.len(),
                    times.len()
                ),
            });
        }
        Ok(Self {
            channel: channel.into(),
            times,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write `time,<channel>` rows with 6 decimal digits
    pub fn write_to<W: io::Write>(&self, writer: W) -> SigResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(["time", self.channel.as_str()])
            .map_err(csv_error)?;
        for (t, v) in self.times.iter().zip(&self.values) {
            csv_writer
                .write_record([format!("{:.6}", t), format!("{:.6}", v)])
                .map_err(csv_error)?;
        }
        csv_writer.flush().map_err(|e| SigError::SerializationError {
            message: format!("Failed to flush CSV output: {}", e),
        })
    }

    pub fn to_csv_string(&self) -> SigResult<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| SigError::SerializationError {
            message: format!("CSV output is not UTF-8: {}", e),
        })
    }
}

fn csv_error(e: csv::Error) -> SigError {
    SigError::SerializationError {
        message: format!("Failed to write CSV: {}", e),
    }
}

/// Generates a Python (NumPy/SciPy) script reproducing the enabled stages
#[derive(Debug, Clone)]
pub struct ScriptGenerator {
    channel: String,
    sampling_rate: f64,
    input_path: String,
    output_path: String,
}

impl ScriptGenerator {
    pub fn new(channel: impl Into<String>, sampling_rate: f64) -> Self {
        Self {
            channel: channel.into(),
            sampling_rate,
            input_path: "data.csv".to_string(),
            output_path: "processed.csv".to_string(),
        }
    }

    pub fn with_paths(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input_path = input.into();
        self.output_path = output.into();
        self
    }

    /// Full script: header, one stanza per enabled stage, footer
    pub fn generate(&self, chain: &FilterChain) -> String {
        let mut script = self.header();
        for (step, entry) in chain.entries().iter().filter(|e| e.enabled()).enumerate() {
            let _ = writeln!(script, "# Step {}: {}", step + 1, entry.kind().display_name());
            script.push_str(&stage_stanza(entry.stage()));
            script.push('\n');
        }
        script.push_str(&self.footer());
        script
    }

    fn header(&self) -> String {
        format!(
            "import numpy as np\n\
             import pandas as pd\n\
             from scipy import signal\n\
             \n\
             # Load data\n\
             df = pd.read_csv(\"{input}\")\n\
             data = df[\"{channel}\"].to_numpy()\n\
             fs = {fs}  # Sampling rate (Hz)\n\
             \n",
            input = self.input_path,
            channel = self.channel,
            fs = self.sampling_rate,
        )
    }

    fn footer(&self) -> String {
        format!(
            "# Save result\n\
             pd.DataFrame({{\"time\": df[\"time\"], \"{channel}\": data}}).to_csv(\"{output}\", index=False)\n",
            channel = self.channel,
            output = self.output_path,
        )
    }
}

/// Integer literal for count-like parameters
fn count_literal(value: f64) -> i64 {
    if value.is_finite() && value > 0.0 {
        value as i64
    } else {
        0
    }
}

fn stage_stanza(stage: &FilterStage) -> String {
    match stage {
        FilterStage::Detrend => "data = signal.detrend(data)\n".to_string(),
        FilterStage::Normalize => {
            "data = (data - data.min()) / (data.max() - data.min())\n".to_string()
        }
        FilterStage::Standardize => "data = (data - data.mean()) / data.std()\n".to_string(),
        FilterStage::Lowpass(p) => format!(
            "b, a = signal.butter({}, {} / (fs / 2), btype=\"low\")\n\
             data = signal.filtfilt(b, a, data)\n",
            count_literal(p.order),
            p.cutoff
        ),
        FilterStage::Highpass(p) => format!(
            "b, a = signal.butter({}, {} / (fs / 2), btype=\"high\")\n\
             data = signal.filtfilt(b, a, data)\n",
            count_literal(p.order),
            p.cutoff
        ),
        FilterStage::Bandpass(p) => format!(
            "b, a = signal.butter({}, [{} / (fs / 2), {} / (fs / 2)], btype=\"band\")\n\
             data = signal.filtfilt(b, a, data)\n",
            count_literal(p.order),
            p.low,
            p.high
        ),
        FilterStage::Bandstop(p) => format!(
            "b, a = signal.butter({}, [{} / (fs / 2), {} / (fs / 2)], btype=\"bandstop\")\n\
             data = signal.filtfilt(b, a, data)\n",
            count_literal(p.order),
            p.low,
            p.high
        ),
        FilterStage::Savgol(p) => format!(
            "data = signal.savgol_filter(data, {}, {})\n",
            count_literal(p.window),
            count_literal(p.polyorder)
        ),
        FilterStage::Median(p) => {
            format!("data = signal.medfilt(data, {})\n", count_literal(p.kernel))
        }
        FilterStage::Notch(p) => format!(
            "b, a = signal.iirnotch({}, {}, fs)\n\
             data = signal.filtfilt(b, a, data)\n",
            p.frequency, p.quality
        ),
        FilterStage::MovingAverage(p) => {
            let window = count_literal(p.window);
            format!(
                "data = np.convolve(data, np.ones({}) / {}, mode=\"same\")\n",
                window, window
            )
        }
    }
}
