//! Input validation utilities
//!
//! Common checks for command-line parameters and file paths, reported through
//! [`SamspillError`] so the message names the offending option or file.

use crate::errors::SamspillError;
use std::fmt::Display;
use std::path::Path;

/// Result type for validation functions.
pub type Result<T> = std::result::Result<T, SamspillError>;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input BAM", "Spill file")
///
/// # Errors
/// Returns an error if the file does not exist or is a directory
///
/// # Example
/// ```
/// use samspill_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/file.bam", "Input file");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(SamspillError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    if path_ref.is_dir() {
        return Err(SamspillError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "Path is a directory".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist
///
/// # Errors
/// Returns an error for the first file that doesn't exist
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, desc) in files {
        validate_file_exists(path, desc)?;
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Errors
/// Returns an error if value <= 0
///
/// # Example
/// ```
/// use samspill_lib::validation::validate_positive;
///
/// validate_positive(100, "group-size").unwrap();
/// assert!(validate_positive(0, "group-size").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(SamspillError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}

/// Validate that an output path does not overwrite one of the inputs.
///
/// # Errors
/// Returns an error if `output` names the same path as any of `inputs`
pub fn validate_output_distinct<P: AsRef<Path>>(output: &Path, inputs: &[P]) -> Result<()> {
    for input in inputs {
        if input.as_ref() == output {
            return Err(SamspillError::InvalidParameter {
                parameter: "output".to_string(),
                reason: format!("Output {} is also an input", output.display()),
            });
        }
    }
    Ok(())
}
