//! CSV recordings in and out

use anyhow::{bail, Context, Result};
use sigchain_core::Dataset;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Cell as a number; anything unparsable becomes NaN and its row is
/// dropped from that channel
fn parse_cell(cell: Option<&str>) -> f64 {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Load a CSV with a header row. The `time` column (case-insensitive), or
/// the first column when there is none, supplies timestamps; every other
/// column becomes a channel.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of '{}'", path.display()))?
        .clone();
    if headers.len() < 2 {
        bail!(
            "'{}' needs a time column and at least one channel column",
            path.display()
        );
    }

    let time_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("time"))
        .unwrap_or(0);
    let mut times = Vec::new();
    let mut columns: Vec<(String, Vec<f64>)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_index)
        .map(|(_, name)| (name.to_string(), Vec::new()))
        .collect();

    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {}", row + 2))?;
        times.push(parse_cell(record.get(time_index)));

        let cells = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != time_index)
            .map(|(_, cell)| cell);
        let mut filled = 0;
        for ((_, values), cell) in columns.iter_mut().zip(cells) {
            values.push(parse_cell(Some(cell)));
            filled += 1;
        }
        for (_, values) in columns.iter_mut().skip(filled) {
            values.push(f64::NAN);
        }
    }

    let dataset = Dataset::from_columns(&times, columns)
        .with_context(|| format!("Invalid recording in '{}'", path.display()))?;
    tracing::info!(
        "Loaded {} channels, {} rows from {}",
        dataset.channel_count(),
        times.len(),
        path.display()
    );
    Ok(dataset)
}

/// Write every channel on a merged time axis. Each row carries the samples
/// taken at that time; a channel without one gets an empty cell, which
/// `load_csv` drops again.
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec!["time".to_string()];
    header.extend(dataset.channel_names().iter().map(|s| s.to_string()));
    csv_writer.write_record(&header)?;

    let buffers: Vec<_> = dataset.channels().iter().map(|c| &c.buffer).collect();
    let mut cursors = vec![0usize; buffers.len()];
    loop {
        let next = buffers
            .iter()
            .zip(&cursors)
            .filter_map(|(buffer, &i)| buffer.times().get(i).copied())
            .min_by(f64::total_cmp);
        let Some(t) = next else { break };

        let mut row = vec![format!("{:.6}", t)];
        for (buffer, cursor) in buffers.iter().zip(cursors.iter_mut()) {
            match buffer.sample(*cursor) {
                Some((time, value)) if time == t => {
                    row.push(format!("{:.6}", value));
                    *cursor += 1;
                }
                _ => row.push(String::new()),
            }
        }
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// File at `path`, or stdout
pub fn output_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_with_time_column() {
        let file = write_temp("ch1,time,ch2\n1.0,0.0,5\n2.0,0.5,x\n3.0,1.0,7\n");
        let dataset = load_csv(file.path()).unwrap();
        assert_eq!(dataset.channel_names(), vec!["ch1", "ch2"]);
        assert_eq!(dataset.channel("ch1").unwrap().buffer.len(), 3);
        // Unparsable cell dropped
        assert_eq!(dataset.channel("ch2").unwrap().buffer.times(), &[0.0, 1.0]);
    }

    #[test]
    fn test_first_column_is_time_by_default() {
        let file = write_temp("t,a\n0,1\n1,2\n");
        let dataset = load_csv(file.path()).unwrap();
        assert_eq!(dataset.channel_names(), vec!["a"]);
        assert_eq!(dataset.channel("a").unwrap().buffer.times(), &[0.0, 1.0]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let file = write_temp("time,a,b\n0,1,2\n1,3\n");
        let dataset = load_csv(file.path()).unwrap();
        assert_eq!(dataset.channel("a").unwrap().buffer.len(), 2);
        assert_eq!(dataset.channel("b").unwrap().buffer.len(), 1);
    }

    #[test]
    fn test_rejects_single_column() {
        let file = write_temp("time\n0\n1\n");
        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn test_write_dataset_keeps_channels_aligned() {
        let dataset = Dataset::from_columns(
            &[0.0, 0.5, 1.0],
            vec![("a", vec![1.0, f64::NAN, 3.0]), ("b", vec![4.0, 5.0, 6.0])],
        )
        .unwrap();
        let mut buffer = Vec::new();
        write_dataset(&dataset, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "time,a,b\n0.000000,1.000000,4.000000\n0.500000,,5.000000\n1.000000,3.000000,6.000000\n"
        );

        let file = write_temp("time,a,b\n0,1,4\n0.5,,5\n1,3,6\n");
        let reloaded = load_csv(file.path()).unwrap();
        assert_eq!(reloaded.channel("a").unwrap().buffer.times(), &[0.0, 1.0]);
        assert_eq!(reloaded.channel("b").unwrap().buffer.len(), 3);
    }

    #[test]
    fn test_write_dataset() {
        let dataset = Dataset::from_columns(&[0.0, 0.5], vec![("a", vec![1.0, 2.0])]).unwrap();
        let mut buffer = Vec::new();
        write_dataset(&dataset, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "time,a\n0.000000,1.000000\n0.500000,2.000000\n"
        );
    }
}
