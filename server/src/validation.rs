use crate::error::ApiError;

/// Maximum script length in characters
const MAX_SCRIPT_LENGTH: usize = 20_000;

pub const EMPTY_SCRIPT_MESSAGE: &str = "Text cannot be empty";

/// Validate and trim a submitted script
pub fn validate_script(script: &str) -> Result<&str, ApiError> {
    let script = script.trim();
    if script.is_empty() {
        return Err(ApiError::InvalidInput(EMPTY_SCRIPT_MESSAGE.to_string()));
    }
    if script.chars().count() > MAX_SCRIPT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Text too long (max {} characters)",
            MAX_SCRIPT_LENGTH
        )));
    }
    Ok(script)
}

/// Parse the speaker count field. Missing means one speaker; counts above the
/// voice catalog are accepted and capped later.
pub fn parse_speaker_count(raw: Option<&str>) -> Result<usize, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(1),
        Some(v) => v,
    };
    let count: usize = raw.parse().map_err(|_| {
        ApiError::InvalidInput(format!("Invalid number of speakers: {}", raw))
    })?;
    if count < 1 {
        return Err(ApiError::InvalidInput(
            "Number of speakers must be at least 1".to_string(),
        ));
    }
    Ok(count)
}

/// Validate a requested download name. Only plain file names are served.
pub fn validate_filename(name: &str) -> Result<(), ApiError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(ApiError::InvalidInput(format!("Invalid file name: {}", name)));
    }
    Ok(())
}
