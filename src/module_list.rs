//! Module-list tokenizer: turns a `Requires:`-style string into
//! `RequiredVersion` triples using a six-state scan over the raw text.

use crate::errors::Result;
use crate::package::{Comparison, RequiredVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InName,
    BeforeOp,
    InOp,
    AfterOp,
    InVersion,
}

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!'];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// True when `tok` is composed entirely of operator characters - i.e. it
/// came out of the tokenizer's `InOp` state, whether or not it's one of
/// the six operators `parse_module_list` actually recognizes. Used to
/// tell a malformed operator (`"<>"`, `"!<"`) apart from the next bare
/// package name.
fn is_operator_like(tok: &str) -> bool {
    !tok.is_empty() && tok.chars().all(|c| OPERATOR_CHARS.contains(&c))
}

/// Splits `text` into bare tokens (names, operators, versions), the way
/// `split_module_list` walks through `OUTSIDE`/`IN_NAME`/`BEFORE_OP`/
/// `IN_OP`/`AFTER_OP`/`IN_VERSION` one character at a time.
fn split_module_list(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut state = State::Outside;
    let mut current = String::new();

    macro_rules! flush {
        () => {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        };
    }

    for c in text.chars() {
        match state {
            State::Outside => {
                if is_separator(c) {
                    // stay outside
                } else if OPERATOR_CHARS.contains(&c) {
                    // an operator with no preceding name: treat as its own
                    // token so the triple-grouping stage can report it.
                    current.push(c);
                    state = State::InOp;
                } else {
                    current.push(c);
                    state = State::InName;
                }
            }
            State::InName => {
                if is_separator(c) {
                    flush!();
                    state = State::BeforeOp;
                } else if OPERATOR_CHARS.contains(&c) {
                    flush!();
                    current.push(c);
                    state = State::InOp;
                } else {
                    current.push(c);
                }
            }
            State::BeforeOp => {
                if is_separator(c) {
                    // stay
                } else if OPERATOR_CHARS.contains(&c) {
                    current.push(c);
                    state = State::InOp;
                } else {
                    flush!();
                    current.push(c);
                    state = State::InName;
                }
            }
            State::InOp => {
                if OPERATOR_CHARS.contains(&c) {
                    current.push(c);
                } else {
                    flush!();
                    state = State::AfterOp;
                    if is_separator(c) {
                        // stay in AfterOp
                    } else {
                        current.push(c);
                        state = State::InVersion;
                    }
                }
            }
            State::AfterOp => {
                if is_separator(c) {
                    // stay
                } else {
                    current.push(c);
                    state = State::InVersion;
                }
            }
            State::InVersion => {
                if is_separator(c) {
                    flush!();
                    state = State::Outside;
                } else {
                    current.push(c);
                }
            }
        }
    }
    flush!();
    tokens
}

/// Groups the flat token stream into `RequiredVersion` entries: a bare name
/// starts a new entry; an operator immediately following one is paired with
/// the version token after it; anything else starts a fresh bare-name entry.
///
/// In lax mode, an operator with no trailing version token gets a
/// synthesized `"0"` so the comparison is always well-formed; in strict
/// mode that's a hard error.
pub fn parse_module_list(
    text: &str,
    owner: impl Into<String>,
    strict: bool,
) -> Result<Vec<RequiredVersion>> {
    let owner = owner.into();
    let tokens = split_module_list(text);
    let mut entries = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let name = tokens[i].clone();
        i += 1;

        if let Some(comparison) = Comparison::from_operator(&name) {
            // An operator with no preceding name: malformed, but we already
            // lost the name slot. Treat the operator token itself as the
            // start of a new (nameless) requirement so parsing can proceed;
            // strict mode rejects it outright.
            if strict {
                return Err(crate::errors::Error::strict(format!(
                    "operator '{}' with no preceding package name in '{}'",
                    comparison.as_str(),
                    text
                )));
            }
            continue;
        }

        let mut comparison = Comparison::AlwaysMatch;
        let mut version = String::new();

        if let Some(op_tok) = tokens.get(i) {
            if let Some(found) = Comparison::from_operator(op_tok) {
                comparison = found;
                i += 1;
                match tokens.get(i) {
                    Some(v) if Comparison::from_operator(v).is_none() => {
                        version = v.clone();
                        i += 1;
                    }
                    _ => {
                        if strict {
                            return Err(crate::errors::Error::strict(format!(
                                "operator '{}' for '{}' has no version in '{}'",
                                comparison.as_str(),
                                name,
                                text
                            )));
                        }
                        version = "0".to_string();
                    }
                }
            } else if is_operator_like(op_tok) {
                // A run of operator characters that isn't one of the six
                // recognized operators. Strict mode rejects it outright;
                // lax mode logs and discards it along with its would-be
                // version token (the rest of this malformed entry), the
                // way the original parser `continue`s past the whole
                // group rather than re-walking the operator or its
                // version as a fresh package name.
                if strict {
                    return Err(crate::errors::Error::strict(format!(
                        "unknown version comparison operator '{}' after package name '{}' in '{}'",
                        op_tok, name, text
                    )));
                }
                log::warn!(
                    "unknown version comparison operator '{}' after package name '{}' in '{}', skipping",
                    op_tok,
                    name,
                    text
                );
                i += 1;
                if i < tokens.len() {
                    i += 1;
                }
            }
        }

        entries.push(RequiredVersion {
            name,
            comparison,
            version,
            owner: owner.clone(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_have_no_constraint() {
        let entries = parse_module_list("foo bar", "pkg", true).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "foo");
        assert_eq!(entries[0].comparison, Comparison::AlwaysMatch);
        assert_eq!(entries[1].name, "bar");
    }

    #[test]
    fn comma_separated_names_split_the_same_as_whitespace() {
        let entries = parse_module_list("foo, bar,baz", "pkg", true).unwrap();
        assert_eq!(entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn name_with_operator_and_version() {
        let entries = parse_module_list("foo >= 1.2.3", "pkg", true).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "foo");
        assert_eq!(entries[0].comparison, Comparison::GreaterEq);
        assert_eq!(entries[0].version, "1.2.3");
    }

    #[test]
    fn operator_glued_to_name_with_no_space() {
        let entries = parse_module_list("foo>=1.2.3", "pkg", true).unwrap();
        assert_eq!(entries[0].comparison, Comparison::GreaterEq);
        assert_eq!(entries[0].version, "1.2.3");
    }

    #[test]
    fn mixed_bare_and_versioned_entries() {
        let entries = parse_module_list("foo bar >= 2.0 baz", "pkg", true).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "foo");
        assert_eq!(entries[1].name, "bar");
        assert_eq!(entries[1].comparison, Comparison::GreaterEq);
        assert_eq!(entries[2].name, "baz");
        assert_eq!(entries[2].comparison, Comparison::AlwaysMatch);
    }

    #[test]
    fn owner_is_attached_to_every_entry() {
        let entries = parse_module_list("foo bar", "owner-pkg", true).unwrap();
        assert!(entries.iter().all(|e| e.owner == "owner-pkg"));
    }

    #[test]
    fn dangling_operator_is_fatal_in_strict_mode() {
        let err = parse_module_list("foo >=", "pkg", true).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Strict(_)));
    }

    #[test]
    fn dangling_operator_synthesizes_zero_version_in_lax_mode() {
        let entries = parse_module_list("foo >=", "pkg", false).unwrap();
        assert_eq!(entries[0].version, "0");
    }

    #[test]
    fn malformed_operator_is_fatal_in_strict_mode() {
        let err = parse_module_list("foo <> 1.2.3", "pkg", true).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Strict(_)));
    }

    #[test]
    fn malformed_operator_and_its_version_are_skipped_in_lax_mode() {
        let entries = parse_module_list("foo <> 1.2.3", "pkg", false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "foo");
        assert_eq!(entries[0].comparison, Comparison::AlwaysMatch);
        assert_eq!(entries[0].version, "");
    }

    #[test]
    fn malformed_operator_at_end_of_list_is_skipped_without_consuming_past_the_end() {
        let entries = parse_module_list("foo !<", "pkg", false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "foo");
    }
}
