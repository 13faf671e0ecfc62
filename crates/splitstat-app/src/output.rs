// Result table CSV writer.

use splitstat_core::ResultTable;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Output columns, in order.
pub const OUTPUT_HEADER: [&str; 5] = ["SubjectId", "Stat", "Split", "Subject", "Value"];

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to create {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

fn write_results_to_writer<W: Write>(w: W, table: &ResultTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(w);
    // `serialize` only emits a header alongside the first row.
    if table.is_empty() {
        writer.write_record(OUTPUT_HEADER)?;
    }
    for row in table.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `table` to `path`, creating parent directories as needed.
pub fn write_results(path: &Path, table: &ResultTable) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_results_to_writer(file, table).map_err(|e| WriteError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
