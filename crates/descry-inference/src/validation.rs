//! Input validation ahead of extraction.
//!
//! Everything rejected here is a permanent failure: retrying cannot make a
//! missing, oversized or non-image file processable.

use std::path::Path;

use descry_core::{defaults, ExtractionError};

/// An input that passed validation, with its bytes already loaded.
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    pub bytes: Vec<u8>,
    /// MIME type detected from magic bytes, e.g. `image/png`.
    pub mime_type: &'static str,
}

/// `MAX_INPUT_SIZE_BYTES`, or the 10 MB default when unset or unparseable.
pub fn max_input_bytes_from_env() -> u64 {
    std::env::var(defaults::ENV_MAX_INPUT_SIZE_BYTES)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::MAX_INPUT_SIZE_BYTES)
}

/// Check that `path` names a readable image no larger than `max_bytes`.
pub async fn validate_input(
    path: &Path,
    max_bytes: u64,
) -> Result<ValidatedInput, ExtractionError> {
    let display = path.display();

    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            return Err(ExtractionError::Permanent(format!(
                "Image file not found: {display}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractionError::Permanent(format!(
                "Image file not found: {display}"
            )))
        }
        Err(e) => {
            return Err(ExtractionError::Permanent(format!(
                "Cannot read image file: {display} - {e}"
            )))
        }
    };

    if metadata.len() > max_bytes {
        return Err(ExtractionError::Permanent(too_large_message(
            metadata.len(),
            max_bytes,
        )));
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ExtractionError::Permanent(format!("Cannot read image file: {display} - {e}"))
    })?;

    match infer::get(&bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(ValidatedInput {
            mime_type: kind.mime_type(),
            bytes,
        }),
        _ => Err(ExtractionError::Permanent(format!(
            "Invalid or corrupt image file: {display}"
        ))),
    }
}

fn too_large_message(size: u64, max_bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    format!(
        "Image file too large: {:.1}MB exceeds {:.0}MB limit",
        size as f64 / MB,
        max_bytes as f64 / MB
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_format() {
        let msg = too_large_message(11 * 1024 * 1024, 10 * 1024 * 1024);
        assert_eq!(msg, "Image file too large: 11.0MB exceeds 10MB limit");
    }

    #[tokio::test]
    async fn test_missing_file_is_permanent() {
        let err = validate_input(Path::new("/nonexistent/descry/cat.png"), 1024)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ExtractionError::Permanent("Image file not found: /nonexistent/descry/cat.png".into())
        );
    }
}
