//! Safety utilities to prevent overwriting inputs.
//!
//! The categorized table is written in one pass after classification, so
//! pointing it at the vidinfo table or alive list would destroy the input.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

fn resolved(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that an output path is safe to overwrite.
///
/// The output must not be any of `inputs`, either literally or after
/// resolving symlinks and relative components.
pub fn validate_output_path(output: &Path, inputs: &[&Path]) -> Result<()> {
    let output_resolved = resolved(output);
    for input in inputs {
        if output == *input || output_resolved == resolved(input) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_output_is_ok() {
        let output = PathBuf::from("/tmp/vidinfo-categorized.csv");
        let source = PathBuf::from("/data/vidinfo.csv");
        let alive = PathBuf::from("/data/alive.txt");
        assert!(validate_output_path(&output, &[&source, &alive]).is_ok());
    }

    #[test]
    fn test_output_equals_input() {
        let path = PathBuf::from("/data/vidinfo.csv");
        let result = validate_output_path(&path, &[&path]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as input"));
    }

    #[test]
    fn test_same_file_through_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("vidinfo.csv");
        std::fs::write(&source, "Server\n").unwrap();
        let roundabout = dir.path().join(".").join("vidinfo.csv");
        assert!(validate_output_path(&roundabout, &[&source]).is_err());
    }
}
