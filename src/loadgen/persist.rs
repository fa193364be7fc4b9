/// Persistence of aggregate reports as timestamped JSON files.
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::loadgen::report::AggregateReport;

/// Write `report` to `{output_dir}/{test_name}_{YYYYMMDD_HHMMSS}.json`.
///
/// Creates the directory if needed. Write failures propagate; silently losing
/// measurement results is unacceptable.
pub fn write_report(
    output_dir: &Path,
    report: &AggregateReport,
    test_name: &str,
) -> Result<PathBuf, AppError> {
    fs::create_dir_all(output_dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("{}_{}.json", test_name, timestamp));

    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json)?;

    Ok(path)
}
