use url::Url;

use crate::error::AppError;

/// Render a duration in seconds as e.g. `"1h 2m 3s"`.
///
/// Hours and minutes are omitted when zero; seconds are always present.
/// Negative input renders as `"Unknown"`.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "Unknown".to_string();
    }
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if h > 0 {
        parts.push(format!("{h}h"));
    }
    if m > 0 {
        parts.push(format!("{m}m"));
    }
    parts.push(format!("{s}s"));
    parts.join(" ")
}

/// Host of `url` with a leading `www.` stripped, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Domain recorded on a job; `"unknown"` when the URL has no host.
pub fn domain_of(url: &str) -> String {
    host_of(url).unwrap_or_else(|| "unknown".to_string())
}

/// Exact match, or suffix match on `.<domain>`.
///
/// `m.example.com` matches `example.com`; `notexample.com` does not.
pub fn host_matches(host: &str, domain: &str) -> bool {
    if host.eq_ignore_ascii_case(domain) {
        return true;
    }
    let Some(idx) = host.len().checked_sub(domain.len()) else {
        return false;
    };
    idx > 1
        && host.is_char_boundary(idx)
        && host.as_bytes()[idx - 1] == b'.'
        && host[idx..].eq_ignore_ascii_case(domain)
}

/// Boundary check for submitted addresses: an absolute http(s) URL with a host.
///
/// Returns the trimmed URL. The job store itself never validates.
pub fn validate_submission(raw: &str) -> Result<String, AppError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(AppError::ValidationError("URL must not be empty".into()));
    }

    let parsed =
        Url::parse(url).map_err(|e| AppError::ValidationError(format!("Invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::ValidationError(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::ValidationError("URL has no host".into()));
    }

    Ok(url.to_string())
}
