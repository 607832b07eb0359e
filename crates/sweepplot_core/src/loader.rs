//! Reading the results cache.
//!
//! Each line holds a parameter token followed by whitespace-separated metric
//! fields. Lines that cannot be turned into a [`Record`] are skipped and
//! counted; only I/O failures are fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{LineError, LoadError};
use crate::model::{Metrics, Params, Record};

/// Minimum number of whitespace-separated fields on a usable line
pub const MIN_FIELDS: usize = 1 + Metrics::REQUIRED_FIELDS;

/// Outcome of loading a cache
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub records: Vec<Record>,
    /// Non-blank lines that were not turned into records
    pub skipped: usize,
    /// Non-blank lines read
    pub lines: usize,
    pub elapsed: Duration,
}

/// Parse one cache line into a record
pub fn parse_line(line: &str) -> Result<Record, LineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(LineError::TooFewFields {
            found: fields.len(),
        });
    }

    let params = Params::parse(fields[0])?;
    let values = fields[1..]
        .iter()
        .take(Metrics::ALL_FIELDS)
        .enumerate()
        .map(|(i, text)| {
            text.parse::<f64>().map_err(|_| LineError::BadNumber {
                field: i + 1,
                text: (*text).to_string(),
            })
        })
        .collect::<Result<Vec<f64>, LineError>>()?;

    let metrics = Metrics::from_fields(&values).ok_or(LineError::TooFewFields {
        found: fields.len(),
    })?;
    Ok(Record::new(params, metrics))
}

/// Read every line of `reader`, skipping malformed ones
pub fn read_cache<R: BufRead>(reader: R) -> Result<LoadReport, LoadError> {
    let start = Instant::now();
    let mut report = LoadReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;
        match parse_line(&line) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                report.skipped += 1;
                tracing::debug!(line = index + 1, error = %e, "Skipping cache line");
            }
        }
    }

    report.elapsed = start.elapsed();
    if report.skipped > 0 {
        tracing::warn!(
            skipped = report.skipped,
            lines = report.lines,
            "Some cache lines could not be parsed"
        );
    }
    tracing::info!(
        records = report.records.len(),
        "Took {:.2} seconds to load results cache",
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}

/// Open and read a cache file
pub fn load_cache(path: &Path) -> Result<LoadReport, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: Some(path.to_path_buf()),
        source,
    })?;
    read_cache(BufReader::new(file)).map_err(|e| match e {
        LoadError::Io { path: None, source } => LoadError::Io {
            path: Some(path.to_path_buf()),
            source,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metric, Value};

    #[test]
    fn test_parse_full_line() {
        let line = "method=mcts,mcts.samples_n=64,use_cfb=false,rng_seed=3, \
                    1.5 0.25 0.1 0.15 0.9 0.0 1 0.3 0.02 0.05 0.08 0.1 0.01";
        let record = parse_line(line).unwrap();

        assert_eq!(record.params().get("samples_n"), Some(&Value::from(64)));
        assert_eq!(record.metric(Metric::CostEfficiency), Some(1.5));
        assert_eq!(record.metric(Metric::Cost), Some(2.0));
        assert_eq!(record.metric(Metric::UncomfortableDecels), Some(1.0));
        assert_eq!(record.metric(Metric::P997Time), Some(0.08));
        assert_eq!(record.metric(Metric::StdDevTime), Some(0.01));
    }

    #[test]
    fn test_parse_short_line() {
        let err = parse_line("method=fixed 1 2 3 4 5 6 7").unwrap_err();
        assert_eq!(err, LineError::TooFewFields { found: 8 });

        let record = parse_line("method=fixed 1 2 3 4 5 6 7 8 9").unwrap();
        assert_eq!(record.metric(Metric::MeanTime), Some(9.0));
        assert_eq!(record.metric(Metric::P95Time), None);
    }

    #[test]
    fn test_parse_bad_number() {
        let err = parse_line("method=fixed 1 2 x 4 5 6 7 8 9").unwrap_err();
        assert_eq!(
            err,
            LineError::BadNumber {
                field: 3,
                text: "x".to_string()
            }
        );
    }

    #[test]
    fn test_read_cache_counts_skips() {
        let data = "method=fixed 1 2 3 4 5 6 7 8 9\n\
                    \n\
                    method=mpdm 1 2 3\n\
                    =oops 1 2 3 4 5 6 7 8 9\n\
                    method=eudm 1 2 3 4 5 6 7 8 9 10\n";
        let report = read_cache(data.as_bytes()).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.lines, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_cache(Path::new("/nonexistent/results.cache")).unwrap_err();
        let LoadError::Io { path, .. } = err;
        assert_eq!(path.as_deref(), Some(Path::new("/nonexistent/results.cache")));
    }
}
