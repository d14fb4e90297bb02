//! Internal helpers for validation and display formatting.
//!
//! These utilities centralize input checks so every engine operation enforces
//! the same invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

pub(crate) const MIN_SCORE: f64 = 0.5;
pub(crate) const MAX_SCORE: f64 = 5.0;
pub(crate) const MAX_PLUGIN_NAME_CHARS: usize = 30;
pub(crate) const MAX_DOWNLOAD_LINK_CHARS: usize = 99;
pub(crate) const MAX_SIZE_MB: f64 = 1000.0;

/// Validate a rating score: a finite number in `0.5..=5.0`, in half steps.
pub(crate) fn validate_score(score: f64) -> ResultEngine<f64> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(EngineError::InvalidScore(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}"
        )));
    }
    if (score * 2.0).fract() != 0.0 {
        return Err(EngineError::InvalidScore(
            "score must be a multiple of 0.5".to_string(),
        ));
    }
    Ok(score)
}

/// Trim a required text field and enforce an optional character limit.
pub(crate) fn required_text(value: &str, label: &str, max_chars: Option<usize>) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidField(format!(
            "{label} must not be empty"
        )));
    }
    if let Some(max) = max_chars
        && trimmed.chars().count() > max
    {
        return Err(EngineError::InvalidField(format!(
            "{label} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Accept absolute `http`/`https` links only.
pub(crate) fn validate_link(value: &str, label: &str, max_chars: Option<usize>) -> ResultEngine<String> {
    let link = required_text(value, label, max_chars)?;
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') && !link.contains(char::is_whitespace) => {
            Ok(link)
        }
        _ => Err(EngineError::InvalidField(format!(
            "{label} must be an http(s) URL"
        ))),
    }
}

/// Size in megabytes: non-negative, below 1000 and with at most two decimals.
pub(crate) fn validate_size(size: f64) -> ResultEngine<f64> {
    if !size.is_finite() || size < 0.0 || size >= MAX_SIZE_MB {
        return Err(EngineError::InvalidField(format!(
            "size must be between 0 and {MAX_SIZE_MB} MB"
        )));
    }
    let cents = size * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        return Err(EngineError::InvalidField(
            "size must have at most two decimal places".to_string(),
        ));
    }
    Ok(size)
}

/// Render a size stored in megabytes with the most readable unit.
pub fn format_size(size_mb: f64) -> String {
    if size_mb < 1.0 {
        format!("{:.0} KB", size_mb * 1024.0)
    } else if size_mb < 1024.0 {
        format!("{size_mb:.2} MB")
    } else {
        format!("{:.2} GB", size_mb / 1024.0)
    }
}

/// Derive a URL slug from a display name: ASCII-folded, lowercase words
/// joined by `-`.
pub fn slugify(value: &str) -> Option<String> {
    let mut out = String::new();
    let mut prev_dash = false;
    for ch in value.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !out.is_empty() && !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    let slug = out.trim_end_matches('-');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Keep only the final path component of an uploaded file name and replace
/// characters that do not belong in a storage key.
pub(crate) fn sanitize_file_name(value: &str) -> String {
    let base = value
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// The file name without directories, used as a demo title fallback.
pub(crate) fn display_file_name(value: &str) -> String {
    value
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Audio demo")
        .to_string()
}

/// Case-folded form of a plugin name, stored next to the name and used for
/// substring matching. SQLite only folds ASCII, so folding happens here.
pub(crate) fn fold_name(value: &str) -> String {
    value.nfkc().flat_map(char::to_lowercase).collect()
}

/// Fold `value` like [`fold_name`] and escape `LIKE` wildcards so user input
/// matches literally.
pub(crate) fn like_contains_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('%');
    for ch in fold_name(value).chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bounds_and_steps() {
        assert!(validate_score(0.5).is_ok());
        assert!(validate_score(5.0).is_ok());
        assert!(validate_score(3.5).is_ok());
        assert!(validate_score(0.0).is_err());
        assert!(validate_score(5.5).is_err());
        assert!(validate_score(3.7).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn size_formatting_picks_unit() {
        assert_eq!(format_size(0.5), "512 KB");
        assert_eq!(format_size(12.5), "12.50 MB");
        assert_eq!(format_size(2048.0), "2.00 GB");
    }

    #[test]
    fn size_validation() {
        assert!(validate_size(12.34).is_ok());
        assert!(validate_size(0.0).is_ok());
        assert!(validate_size(12.345).is_err());
        assert!(validate_size(1000.0).is_err());
        assert!(validate_size(-1.0).is_err());
    }

    #[test]
    fn slugify_folds_accents_and_spaces() {
        assert_eq!(slugify("EQ & Filtering").as_deref(), Some("eq-filtering"));
        assert_eq!(slugify("Créative FX").as_deref(), Some("creative-fx"));
        assert_eq!(slugify("  ").as_deref(), None);
    }

    #[test]
    fn links_must_be_http() {
        assert!(validate_link("https://example.com/x", "link", None).is_ok());
        assert!(validate_link("ftp://example.com", "link", None).is_err());
        assert!(validate_link("https://", "link", None).is_err());
        assert!(validate_link("https://exa mple.com", "link", None).is_err());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\music\\my loop.wav"), "my_loop.wav");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(display_file_name("dir/Bass Line.mp3"), "Bass Line.mp3");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains_pattern("Ser"), "%ser%");
        assert_eq!(like_contains_pattern("50%_"), "%50\\%\\_%");
        assert_eq!(like_contains_pattern("Ödem"), "%ödem%");
    }
}
