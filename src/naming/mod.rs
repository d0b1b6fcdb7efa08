//! File naming helpers
//!
//! Pure functions for building file and folder names: suffix insertion
//! before the extension and path-safe timestamps for per-run directories.

use chrono::{Local, NaiveDateTime, SubsecRound};
use rand::Rng;

/// Letter names used for throwaway project names.
pub const GREEK_ALPHABET: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega",
];

/// Insert `suffix` between the stem and the final extension of `file_name`.
///
/// `insert_suffix("icon.png", Some("@3x"))` gives `icon@3x.png`. A name
/// without an extension gets the suffix appended, and an empty or missing
/// suffix leaves the name untouched. Only the last segment of a path-like
/// name is inspected, so dots in parent directories are ignored.
pub fn insert_suffix(file_name: &str, suffix: Option<&str>) -> String {
    let suffix = match suffix {
        Some(s) if !s.is_empty() => s,
        _ => return file_name.to_string(),
    };

    let segment_start = file_name
        .rfind(|c| c == '/' || c == '\\')
        .map_or(0, |i| i + 1);
    let segment = &file_name[segment_start..];

    // A leading dot marks a hidden file, a trailing dot carries no extension
    match segment.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < segment.len() => {
            let split = segment_start + dot;
            format!("{}{}{}", &file_name[..split], suffix, &file_name[split..])
        }
        _ => format!("{}{}", file_name, suffix),
    }
}

/// Render `instant` as an ISO-8601 timestamp without sub-seconds or colons.
///
/// The result (e.g. `2022-06-01T123456`) is safe as a path segment on all
/// common filesystems.
pub fn format_timestamp(instant: &NaiveDateTime) -> String {
    instant
        .trunc_subsecs(0)
        .format("%Y-%m-%dT%H%M%S")
        .to_string()
}

/// Current local time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// `format_timestamp(now())`
pub fn format_now() -> String {
    format_timestamp(&now())
}

/// Pick a random letter name from [`GREEK_ALPHABET`].
pub fn random_name() -> &'static str {
    let index = rand::rng().random_range(0..GREEK_ALPHABET.len());
    GREEK_ALPHABET[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    #[test_case("icon.png", "@3x", "icon@3x.png" ; "before extension")]
    #[test_case("icon", "@3x", "icon@3x" ; "no extension")]
    #[test_case("archive.tar.gz", "_a", "archive.tar_a.gz" ; "only final extension")]
    #[test_case("shape.png", "_a", "shape_a.png" ; "underscore suffix")]
    #[test_case(".bashrc", "_b", ".bashrc_b" ; "hidden file")]
    #[test_case("frames/f.01/frame.png", "07", "frames/f.01/frame07.png" ; "dotted parent dir")]
    #[test_case("trailing.", "_x", "trailing._x" ; "trailing dot")]
    fn test_insert_suffix(name: &str, suffix: &str, expected: &str) {
        assert_eq!(insert_suffix(name, Some(suffix)), expected);
    }

    #[test]
    fn test_insert_empty_suffix_is_identity() {
        assert_eq!(insert_suffix("icon.png", Some("")), "icon.png");
        assert_eq!(insert_suffix("icon.png", None), "icon.png");
        assert_eq!(insert_suffix("icon", None), "icon");
    }

    #[test]
    fn test_format_timestamp_strips_colons_and_subseconds() {
        let instant = NaiveDate::from_ymd_opt(2022, 6, 1)
            .unwrap()
            .and_hms_milli_opt(12, 34, 56, 789)
            .unwrap();

        let formatted = format_timestamp(&instant);
        assert_eq!(formatted, "2022-06-01T123456");
        assert!(!formatted.contains(':'));
    }

    #[test]
    fn test_now_has_no_subseconds() {
        use chrono::Timelike;
        assert_eq!(now().nanosecond(), 0);
        assert_eq!(format_now().len(), "2022-06-01T123456".len());
    }

    #[test]
    fn test_random_name_is_greek() {
        for _ in 0..50 {
            assert!(GREEK_ALPHABET.contains(&random_name()));
        }
    }
}
