//! Text normalization shared by the cache and the pattern matcher.

/// Regex fragment matching one signed decimal number.
pub const NUMBER: &str = r"[+-]?\d+(?:\.\d+)?";

/// Lowercase, collapse runs of whitespace, trim, and drop trailing periods.
///
/// ```rust
/// use modcalc::parser::normalize::normalize;
///
/// assert_eq!(normalize("  10%  Increased\tMaximum Life. "), "10% increased maximum life");
/// assert_eq!(normalize("Corrupted..."), "corrupted");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches('.').trim_end().to_string()
}

/// Collapse whitespace left behind after phrases are cut out of a string.
pub(crate) fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a captured number, tolerating a leading `+`.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim_start_matches('+').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize("Adds 5 to 10 Fire Damage to Attacks.");
        assert_eq!(once, "adds 5 to 10 fire damage to attacks");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_blank() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("."), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("+15"), Some(15.0));
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        assert_eq!(parse_number("abc"), None);
    }
}
