//! Shared yt-dlp invocation used by the command-line strategies.

use clipclock_core::config::ExtractorConfig;
use clipclock_core::error::AppError;
use clipclock_core::traits::CommandRunner;

/// Ask yt-dlp to print `fields` (one per line, in order) without downloading.
///
/// Always returns exactly `fields.len()` trimmed lines; missing lines are empty.
pub(crate) async fn print_fields<R: CommandRunner>(
    runner: &R,
    config: &ExtractorConfig,
    url: &str,
    fields: &[&str],
) -> Result<Vec<String>, AppError> {
    let mut args = Vec::with_capacity(fields.len() * 2 + 4);
    for &field in fields {
        args.push("--print");
        args.push(field);
    }
    args.extend(["--no-download", "--no-warnings", "--", url]);

    let output = runner
        .run(&config.ytdlp_bin, &args, config.extract_timeout)
        .await?;

    if output.timed_out {
        return Err(AppError::extraction(format!(
            "yt-dlp timed out after {}s",
            config.extract_timeout.as_secs()
        )));
    }
    if !output.success() {
        let detail = format!("{} {}", output.stdout, output.stderr);
        return Err(AppError::extraction(format!(
            "yt-dlp failed (code {}): {}",
            output.exit_code,
            detail.trim()
        )));
    }

    let mut lines: Vec<String> = output
        .stdout
        .lines()
        .take(fields.len())
        .map(|l| l.trim().to_string())
        .collect();
    lines.resize(fields.len(), String::new());
    Ok(lines)
}

/// Float seconds (`"1587"`, `"1587.4"`) rounded to the nearest integer.
///
/// Returns `None` for anything unparsable, including yt-dlp's `NA`.
pub(crate) fn parse_seconds(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| value.round() as i64)
}

/// Empty strings become `None`.
pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
