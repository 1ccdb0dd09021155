//! Converter plumbing.
//!
//! Writes the HTML page into a fresh temporary directory, runs the converter
//! CLI with `<args> input.html output.pdf` and reads the PDF back.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

use super::RenderError;

const INPUT_FILENAME: &str = "document.html";
const OUTPUT_FILENAME: &str = "document.pdf";

/// Run `program` over `html`; the temp directory is removed when this returns.
pub fn run_converter(program: &str, args: &[String], html: &str) -> Result<Vec<u8>, RenderError> {
    let temp_dir = tempdir().map_err(RenderError::TempDir)?;
    let input_path = temp_dir.path().join(INPUT_FILENAME);
    let output_path = temp_dir.path().join(OUTPUT_FILENAME);

    fs::write(&input_path, html).map_err(RenderError::Write)?;

    let output = Command::new(program)
        .args(args)
        .arg(&input_path)
        .arg(&output_path)
        .current_dir(temp_dir.path())
        .output()
        .map_err(|source| RenderError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        log::error!(
            "{} exited with status {}: {}",
            program,
            code,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(RenderError::Exit(code));
    }

    fs::read(&output_path).map_err(RenderError::ReadPdf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = run_converter("definitely-not-a-pdf-converter", &[], "<p>x</p>").unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_reported() {
        let err = run_converter("false", &[], "<p>x</p>").unwrap_err();
        assert!(matches!(err, RenderError::Exit(1)));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_is_read_back() {
        // `cp input output` stands in for a converter.
        let pdf = run_converter("cp", &[], "<p>copied</p>").unwrap();
        assert_eq!(pdf, b"<p>copied</p>");
    }
}
