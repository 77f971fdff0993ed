//! Guards against a stage clobbering its own input.
//!
//! A stage's output file fully replaces the previous checkpoint, so writing
//! it over the file the stage is reading would destroy the only durable
//! state the pipeline has. Checked before any record is processed; a
//! violation is a configuration failure that aborts the run.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that a stage output path is safe to overwrite: it must differ
/// from every input path and carry the stage's marker in its filename
/// (e.g. "resolved"), so checkpoints from different stages cannot be
/// confused for one another.
pub fn validate_output_path(output: &Path, stage_marker: &str, inputs: &[&Path]) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !output_name.contains(stage_marker) {
        bail!(
            "refusing to write '{}': stage output filename must contain '{}'",
            output.display(),
            stage_marker
        );
    }

    for input in inputs {
        if output == *input {
            bail!(
                "refusing to write '{}': it is also a stage input",
                output.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_stage_output() {
        let output = PathBuf::from("data/resolved_tracks.json");
        let input = PathBuf::from("data/extracted_tracks.json");
        assert!(validate_output_path(&output, "resolved", &[&input]).is_ok());
    }

    #[test]
    fn test_missing_marker_rejected() {
        let output = PathBuf::from("data/tracks.json");
        let input = PathBuf::from("data/extracted_tracks.json");
        let err = validate_output_path(&output, "resolved", &[&input]).unwrap_err();
        assert!(err.to_string().contains("must contain 'resolved'"));
    }

    #[test]
    fn test_output_equal_to_input_rejected() {
        let path = PathBuf::from("data/resolved_tracks.json");
        let err = validate_output_path(&path, "resolved", &[&path]).unwrap_err();
        assert!(err.to_string().contains("also a stage input"));
    }
}
