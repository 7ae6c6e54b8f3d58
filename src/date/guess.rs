use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

// Hyphens in both the date and the time part, e.g. "2023-07-04 14-30-00".
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}-\d{2}-\d{2}").unwrap());

const DATE_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// Extract the fallback date embedded in a file name.
///
/// `Ok(None)` when the name contains no date-shaped run. A run that matches
/// the pattern but carries invalid calendar values (month 13, hour 25, ...)
/// is an error, so the file ends up in the error folder instead of silently
/// falling through to a lower-priority candidate. When a name contains
/// several date-shaped runs, the first one by scan order wins.
pub fn date_from_filename(filename: &str) -> Result<Option<NaiveDateTime>> {
    let Some(m) = DATE_RE.find(filename) else {
        return Ok(None);
    };
    let date = NaiveDateTime::parse_from_str(m.as_str(), DATE_FORMAT)
        .with_context(|| format!("invalid calendar values in filename date {:?}", m.as_str()))?;
    Ok(Some(date))
}
