//! Atomic program output.
//!
//! The program is written to a temporary file in the destination's
//! directory, flushed to disk and renamed over the destination. A
//! reader never sees a partial program, and a failed write leaves
//! nothing behind (the temporary file is removed on drop).

use std::io::{BufWriter, Write};
use std::path::Path;

use pixplot_export::GCodeProgram;
use tempfile::NamedTempFile;

use crate::error::EmitError;

/// Write `program` to `destination`, replacing any existing file.
///
/// # Errors
///
/// Returns [`EmitError`] if the temporary file cannot be created or
/// written, or the final rename fails.
pub fn write_program(program: &GCodeProgram, destination: &Path) -> Result<(), EmitError> {
    let emit_error = |source: std::io::Error| EmitError {
        path: destination.to_path_buf(),
        source,
    };

    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir).map_err(emit_error)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        write!(writer, "{program}").map_err(emit_error)?;
        writer.flush().map_err(emit_error)?;
    }
    file.as_file().sync_all().map_err(emit_error)?;
    file.persist(destination).map_err(|e| emit_error(e.error))?;

    tracing::debug!(
        path = %destination.display(),
        lines = program.len(),
        "wrote program"
    );
    Ok(())
}
