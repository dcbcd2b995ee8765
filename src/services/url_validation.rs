//! Checks a URL before it is offered to the link store.

use url::Url;

use crate::types::errors::UrlValidationError;

/// Schemes that point at browser internals or the local disk.
pub const DISALLOWED_SCHEMES: &[&str] = &["about", "chrome", "edge", "file"];

/// Parses `raw` and rejects browser-internal and local schemes.
pub fn validate_saveable_url(raw: &str) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|_| UrlValidationError::Malformed(raw.to_string()))?;
    if DISALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(UrlValidationError::DisallowedScheme(parsed.scheme().to_string()));
    }
    Ok(parsed)
}
