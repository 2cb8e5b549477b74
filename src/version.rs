//! rpm-style version comparator, lifted byte-for-byte (well,
//! char-for-char) from the `rpmvercmp` algorithm so that the ordering stays
//! compatible with every other tool built on the same scheme.

use std::cmp::Ordering;

use crate::package::Comparison;

/// Compare two version strings the rpm way: walk alternating runs of
/// digits and letters, comparing numerically within digit runs and
/// lexicographically within letter runs. Returns -1, 0 or 1.
///
/// The type-mismatch tiebreak below is intentionally NOT antisymmetric in
/// the case it guards against (see DESIGN.md) — preserved for byte-exact
/// compatibility with the scheme this was derived from, not because it is
/// principled.
pub fn compare_versions(a: &str, b: &str) -> i32 {
    if a == b {
        return 0;
    }

    let mut one = a;
    let mut two = b;

    loop {
        one = one.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
        two = two.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one.as_bytes()[0].is_ascii_digit();
        let (seg_one, rest_one) = take_segment(one, numeric);
        let (seg_two, rest_two) = take_segment(two, numeric);

        // Type-mismatch tiebreak, applied to both sides in sequence: if
        // either segment came up empty, the types disagreed (one side's
        // first char isn't the type the other side determined) and we
        // arbitrarily call the left side the loser.
        if seg_one.is_empty() {
            return -1;
        }
        if seg_two.is_empty() {
            return -1;
        }

        let cmp = if numeric {
            let n_one = seg_one.trim_start_matches('0');
            let n_two = seg_two.trim_start_matches('0');
            match n_one.len().cmp(&n_two.len()) {
                Ordering::Equal => n_one.cmp(n_two),
                other => other,
            }
        } else {
            seg_one.cmp(seg_two)
        };

        match cmp {
            Ordering::Less => return -1,
            Ordering::Greater => return 1,
            Ordering::Equal => {}
        }

        one = rest_one;
        two = rest_two;
    }

    match (one.is_empty(), two.is_empty()) {
        (true, true) => 0,
        (true, false) => -1,
        (false, true) => 1,
        (false, false) => unreachable!("loop only exits when at least one side is empty"),
    }
}

/// Split off the maximal leading run of digits (if `numeric`) or letters
/// (otherwise), returning `(segment, rest)`.
fn take_segment(s: &str, numeric: bool) -> (&str, &str) {
    let end = s
        .find(|c: char| {
            if numeric {
                !c.is_ascii_digit()
            } else {
                !c.is_ascii_alphabetic()
            }
        })
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Apply `comparison` to `compare_versions(a, b)`.
pub fn version_test(comparison: Comparison, a: &str, b: &str) -> bool {
    match comparison {
        Comparison::Less => compare_versions(a, b) < 0,
        Comparison::LessEq => compare_versions(a, b) <= 0,
        Comparison::Greater => compare_versions(a, b) > 0,
        Comparison::GreaterEq => compare_versions(a, b) >= 0,
        Comparison::Equal => compare_versions(a, b) == 0,
        Comparison::NotEqual => compare_versions(a, b) != 0,
        Comparison::AlwaysMatch => true,
    }
}

pub fn comparison_to_str(comparison: Comparison) -> &'static str {
    comparison.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_equal() {
        assert_eq!(compare_versions("1.2.3", "1.2.3"), 0);
    }

    #[test]
    fn numeric_segments_compare_numerically_not_lexically() {
        assert_eq!(compare_versions("1.9", "1.10"), -1);
        assert_eq!(compare_versions("1.10", "1.9"), 1);
    }

    #[test]
    fn leading_zeros_are_stripped() {
        assert_eq!(compare_versions("1.01", "1.1"), 0);
    }

    #[test]
    fn longer_remainder_wins() {
        assert_eq!(compare_versions("1.2.3", "1.2"), 1);
        assert_eq!(compare_versions("1.2", "1.2.3"), -1);
    }

    #[test]
    fn alpha_segments_compare_lexically() {
        assert_eq!(compare_versions("1.0a", "1.0b"), -1);
    }

    #[test]
    fn totality_sign_is_antisymmetric_for_well_typed_inputs() {
        for (a, b) in [("1.2.3", "1.3.0"), ("2.0", "2.0"), ("1.0", "0.9")] {
            assert_eq!(compare_versions(a, b), -compare_versions(b, a));
        }
    }

    #[test]
    fn version_test_matches_each_operator() {
        assert!(version_test(Comparison::Greater, "2.0", "1.9"));
        assert!(version_test(Comparison::GreaterEq, "2.0", "2.0"));
        assert!(version_test(Comparison::Less, "1.9", "2.0"));
        assert!(version_test(Comparison::LessEq, "2.0", "2.0"));
        assert!(version_test(Comparison::Equal, "2.0", "2.0"));
        assert!(version_test(Comparison::NotEqual, "2.0", "1.9"));
        assert!(version_test(Comparison::AlwaysMatch, "anything", "anything-else"));
    }

    #[test]
    fn comparison_labels() {
        assert_eq!(comparison_to_str(Comparison::GreaterEq), ">=");
        assert_eq!(comparison_to_str(Comparison::AlwaysMatch), "(any)");
    }
}
