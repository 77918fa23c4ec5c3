use snip_core::ShortenerError;
use url::Url;

/// Checks that `raw` is an absolute http(s) URL with a host.
///
/// Returns the input with surrounding whitespace removed. The URL is not
/// normalized, so the caller stores exactly what the user sent.
pub fn validate_url(raw: &str) -> Result<&str, ShortenerError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ShortenerError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }

    let parsed =
        Url::parse(url).map_err(|e| ShortenerError::InvalidUrl(format!("{url}: {e}")))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL scheme must be http or https: {scheme}"
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL must have a host: {url}"
        )));
    }

    Ok(url)
}
