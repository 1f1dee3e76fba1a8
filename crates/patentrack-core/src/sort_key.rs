//! Sort key normalisation for tracking ids.
//!
//! Tracking ids are typed by hand ("PAT-2", "pat-10", "IN/2024/7") so plain
//! string order puts "PAT-10" before "PAT-2". The normalised key zero-pads
//! every digit run so that `ORDER BY sort_key` recovers natural order.

const DIGIT_WIDTH: usize = 6;

/// Normalise a tracking id into a lexicographically-sortable string.
///
/// Input: "PAT-2", "pat-2024-07", "IN/2024/7A"
/// Output: "PAT-000002", "PAT-002024-000007", "IN/002024/000007A"
///
/// # Algorithm
///
/// 1. Trim and upper-case ASCII letters
/// 2. Left-pad each maximal run of ASCII digits to 6 places (leading zeros
///    in the input are dropped first, so "007" and "7" agree)
/// 3. Copy every other character through unchanged
pub fn normalize_tracking_id(s: &str) -> String {
    let upper = s.trim().to_ascii_uppercase();
    let mut out = String::with_capacity(upper.len() + DIGIT_WIDTH);
    let mut digits = String::new();

    for ch in upper.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        flush_digits(&mut out, &mut digits);
        out.push(ch);
    }
    flush_digits(&mut out, &mut digits);
    out
}

fn flush_digits(out: &mut String, digits: &mut String) {
    if digits.is_empty() {
        return;
    }
    let significant = digits.trim_start_matches('0');
    let significant = if significant.is_empty() { "0" } else { significant };
    for _ in significant.len()..DIGIT_WIDTH {
        out.push('0');
    }
    out.push_str(significant);
    digits.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: assert a list of inputs produces sort keys in strictly ascending order.
    fn assert_sorted_order(inputs: &[&str]) {
        let keys: Vec<String> = inputs.iter().map(|s| normalize_tracking_id(s)).collect();
        for i in 1..keys.len() {
            assert!(
                keys[i - 1] < keys[i],
                "Expected {:?} ({}) < {:?} ({})",
                inputs[i - 1],
                keys[i - 1],
                inputs[i],
                keys[i],
            );
        }
    }

    #[test]
    fn plain_numeric_sequence() {
        assert_sorted_order(&["PAT-1", "PAT-2", "PAT-9", "PAT-10", "PAT-11", "PAT-100"]);
    }

    #[test]
    fn year_then_serial() {
        assert_sorted_order(&["PAT-2023-99", "PAT-2024-1", "PAT-2024-2", "PAT-2024-10"]);
    }

    #[test]
    fn letter_suffix_after_number() {
        assert_sorted_order(&["PAT-7", "PAT-7A", "PAT-7B", "PAT-8"]);
    }

    #[test]
    fn exact_values() {
        assert_eq!(normalize_tracking_id("PAT-2"), "PAT-000002");
        assert_eq!(normalize_tracking_id("pat-2024-07"), "PAT-002024-000007");
        assert_eq!(normalize_tracking_id("IN/2024/7A"), "IN/002024/000007A");
        assert_eq!(normalize_tracking_id("0"), "000000");
    }

    #[test]
    fn leading_zeros_ignored() {
        assert_eq!(normalize_tracking_id("PAT-007"), normalize_tracking_id("PAT-7"));
    }

    #[test]
    fn lowercase_normalised() {
        assert_eq!(normalize_tracking_id("pat-3a"), normalize_tracking_id("PAT-3A"));
    }

    #[test]
    fn whitespace_trimmed() {
        assert_eq!(normalize_tracking_id("  PAT-3  "), normalize_tracking_id("PAT-3"));
    }

    #[test]
    fn empty_string() {
        assert_eq!(normalize_tracking_id(""), "");
    }
}
