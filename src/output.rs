use crate::types::{QuerySummary, Result};
use std::io::Write;
use std::path::Path;

/// Write a query summary to a JSON file
pub fn write_json_file(summary: &QuerySummary, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Write a query summary to a JSON string
pub fn to_json_string(summary: &QuerySummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Write a query summary to stdout
pub fn write_json_stdout(summary: &QuerySummary) -> Result<()> {
    let json = to_json_string(summary)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}
