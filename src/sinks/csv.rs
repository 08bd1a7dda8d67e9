//! Appends readings to a daily CSV file.

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use super::{ReadingSink, SinkError};
use crate::domain::Reading;

pub const CSV_HEADER: [&str; 5] = ["timestamp", "sensor_id", "sensor_type", "value", "unit"];

/// CSV file sink. The file name carries the date the sink was created:
/// `sensor_data_<YYYY-MM-DD>.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Create the data directory if needed and point at today's file
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let file_name = format!("sensor_data_{}.csv", Local::now().format("%Y-%m-%d"));
        Ok(Self {
            path: data_dir.join(file_name),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(r: &Reading) -> [String; 5] {
    [
        r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        r.sensor_id.clone(),
        r.sensor_type.to_string(),
        format!("{:.2}", r.value),
        r.unit.clone(),
    ]
}

fn append(path: &Path, records: &[[String; 5]]) -> Result<(), SinkError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_new = file.metadata()?.len() == 0;

    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer.write_record(CSV_HEADER)?;
    }
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl ReadingSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn on_readings(&self, batch: &[Reading]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let path = self.path.clone();
        let records: Vec<[String; 5]> = batch.iter().map(to_record).collect();

        tokio::task::spawn_blocking(move || append(&path, &records))
            .await
            .map_err(|e| SinkError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorType;
    use chrono::{FixedOffset, TimeZone};

    fn reading(id: &str, value: f64) -> Reading {
        Reading {
            sensor_id: id.into(),
            sensor_type: SensorType::Humidity,
            value,
            unit: "%".into(),
            timestamp: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 6, 15, 8, 30, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_new_creates_dated_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("data")).unwrap();
        let name = sink.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("sensor_data_") && name.ends_with(".csv"));
        assert!(dir.path().join("data").is_dir());
    }

    #[tokio::test]
    async fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::with_path(dir.path().join("out.csv"));

        sink.on_readings(&[reading("hum001", 55.456)]).await.unwrap();
        sink.on_readings(&[reading("hum002", 60.0)]).await.unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,sensor_id,sensor_type,value,unit");
        assert_eq!(lines[1], "2024-06-15T08:30:00Z,hum001,humidity,55.46,%");
        assert_eq!(lines[2], "2024-06-15T08:30:00Z,hum002,humidity,60.00,%");
    }

    #[tokio::test]
    async fn test_unwritable_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let sink = CsvSink::with_path(dir.path());
        assert!(sink.on_readings(&[reading("hum001", 50.0)]).await.is_err());
    }
}
