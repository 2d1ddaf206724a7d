//! Export of result records and raw samples for downstream tabular and
//! plotting sinks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use crudperf_core::{ExportFormat, ObjectType, OperationKind, ResultRecord};
use serde::Serialize;

use crate::driver::RunOutput;
use crate::error::HarnessResult;

/// JSON envelope around the records.
#[derive(Debug, Serialize)]
struct ResultsReport<'a> {
    generated_at: DateTime<Utc>,
    runs: usize,
    aborted: usize,
    records: &'a [ResultRecord],
}

/// One row of the raw sample export.
#[derive(Debug, Serialize)]
struct SampleRow {
    object_type: ObjectType,
    operation: OperationKind,
    workload_size: usize,

    /// Milliseconds since the first sample of the same run
    offset_ms: f64,
    cpu_percent: f64,
    memory_mb: f64,
}

/// Write records in `format` to any writer.
pub fn write_records<W: Write>(
    writer: W,
    records: &[ResultRecord],
    format: ExportFormat,
) -> HarnessResult<()> {
    match format {
        ExportFormat::Csv => {
            let mut csv = csv::Writer::from_writer(writer);
            for record in records {
                csv.serialize(record)?;
            }
            csv.flush()?;
        }
        ExportFormat::Json => {
            let report = ResultsReport {
                generated_at: Utc::now(),
                runs: records.len(),
                aborted: records.iter().filter(|r| !r.is_completed()).count(),
                records,
            };
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Write records to a file, replacing it.
pub fn write_records_to_path(
    path: impl AsRef<Path>,
    records: &[ResultRecord],
    format: ExportFormat,
) -> HarnessResult<()> {
    let file = File::create(path)?;
    write_records(BufWriter::new(file), records, format)
}

/// Write the raw sample time series of every run as CSV.
pub fn write_samples<W: Write>(writer: W, outputs: &[RunOutput]) -> HarnessResult<()> {
    let mut csv = csv::Writer::from_writer(writer);

    for output in outputs {
        let Some(first) = output.samples.first() else {
            continue;
        };
        for sample in &output.samples {
            csv.serialize(SampleRow {
                object_type: output.record.object_type,
                operation: output.record.operation,
                workload_size: output.record.workload_size,
                offset_ms: sample.timestamp.duration_since(first.timestamp).as_secs_f64() * 1000.0,
                cpu_percent: sample.cpu_percent,
                memory_mb: sample.memory_mb,
            })?;
        }
    }

    csv.flush()?;
    Ok(())
}

pub fn write_samples_to_path(path: impl AsRef<Path>, outputs: &[RunOutput]) -> HarnessResult<()> {
    let file = File::create(path)?;
    write_samples(BufWriter::new(file), outputs)
}

/// Human-readable summary of one run for console output.
pub fn summarize(record: &ResultRecord) -> String {
    let mut summary = format!(
        "{} {} x{}: {} ops in {:.2}s ({:.1} ops/s, {:.4}s/op)\n  CPU: avg={:.1}%, max={:.1}%\n  Memory: avg={:.1}MB, max={:.1}MB ({} samples)",
        record.object_type,
        record.operation,
        record.workload_size,
        record.count,
        record.time_seconds,
        record.operations_per_second,
        record.avg_time_per_op,
        record.cpu_avg_percent,
        record.cpu_max_percent,
        record.memory_avg_mb,
        record.memory_max_mb,
        record.sample_count,
    );

    if record.failed_count > 0 {
        summary.push_str(&format!("\n  Failed operations: {}", record.failed_count));
    }
    if let Some(error) = &record.error {
        summary.push_str(&format!("\n  ABORTED: {}", error));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crudperf_core::{RunKey, RunStatistics, Sample};
    use std::time::{Duration, Instant};

    fn record(size: usize, stats: RunStatistics) -> ResultRecord {
        ResultRecord::completed(
            RunKey {
                object_type: ObjectType::Project,
                operation: OperationKind::Create,
                workload_size: size,
            },
            size,
            0,
            stats,
        )
    }

    #[test]
    fn test_csv_roundtrip_rows() {
        let records = vec![
            record(10, RunStatistics { time_seconds: 0.5, ..Default::default() }),
            record(50, RunStatistics { time_seconds: 2.5, ..Default::default() }),
        ];

        let mut buffer = Vec::new();
        write_records(&mut buffer, &records, ExportFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let parsed: Vec<ResultRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_json_report_counts_aborted() {
        let key = RunKey {
            object_type: ObjectType::Todo,
            operation: OperationKind::Update,
            workload_size: 10,
        };
        let records = vec![
            record(10, RunStatistics::default()),
            ResultRecord::aborted(key, 0, 0, RunStatistics::default(), "connection refused"),
        ];

        let mut buffer = Vec::new();
        write_records(&mut buffer, &records, ExportFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["runs"], 2);
        assert_eq!(value["aborted"], 1);
        assert_eq!(value["records"][1]["status"], "aborted");
        assert_eq!(value["records"][1]["error"], "connection refused");
        assert_eq!(value["records"][0]["object_type"], "project");
    }

    #[test]
    fn test_samples_offsets_relative_to_run_start() {
        let start = Instant::now();
        let samples = vec![
            Sample { timestamp: start, cpu_percent: 0.0, memory_mb: 10.0 },
            Sample { timestamp: start + Duration::from_millis(100), cpu_percent: 5.0, memory_mb: 11.0 },
        ];
        let outputs = vec![
            RunOutput { record: record(10, RunStatistics::default()), samples },
            RunOutput { record: record(50, RunStatistics::default()), samples: Vec::new() },
        ];

        let mut buffer = Vec::new();
        write_samples(&mut buffer, &outputs).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "object_type,operation,workload_size,offset_ms,cpu_percent,memory_mb");
        assert_eq!(lines[1], "project,create,10,0.0,0.0,10.0");
        assert_eq!(lines[2], "project,create,10,100.0,5.0,11.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_records_to_path(&path, &[record(10, RunStatistics::default())], ExportFormat::Csv)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("object_type,operation,workload_size,count"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_summary_mentions_abort() {
        let key = RunKey {
            object_type: ObjectType::Todo,
            operation: OperationKind::Delete,
            workload_size: 5,
        };
        let aborted = ResultRecord::aborted(key, 2, 1, RunStatistics::default(), "target unreachable: refused");
        let text = summarize(&aborted);
        assert!(text.starts_with("todo delete x5: 2 ops"));
        assert!(text.contains("Failed operations: 1"));
        assert!(text.contains("ABORTED: target unreachable: refused"));
    }
}
