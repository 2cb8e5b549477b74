//! Shell-style tokenizer, re-escaper and flag classifier for
//! `Cflags:`/`Libs:` lines.

use crate::errors::{Error, Result};
use crate::package::{Flag, FlagKind};

/// Characters that survive unescaped in the shell re-encoding; everything
/// else gets a `\` prefix.
fn is_safe_shell_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '@' | '^' | '+' | ',' | '%' | '=' | '-')
}

/// Backslash-escapes every byte outside the safe set, so the result can be
/// fed back through a shell-word splitter without surprises from the
/// substituted variable values it wraps.
pub fn shell_escape_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if !is_safe_shell_char(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Splits `line` into shell-style words, then re-escapes each resulting
/// word individually: the word-split has to see the line's own unescaped
/// spaces as delimiters, so escaping must happen per-token afterwards, not
/// over the whole line beforehand (escaping the line first would turn
/// every separator space into a literal, non-splitting space).
fn tokenize(line: &str) -> Result<Vec<String>> {
    let words = shell_words::split(line)
        .map_err(|e| Error::strict(format!("unterminated quote in '{}': {}", line, e)))?;
    Ok(words.iter().map(|w| shell_escape_encode(w)).collect())
}

/// Rewrites a GCC-style flag into its MSVC equivalent, when `msvc_syntax` is
/// enabled: `-Ipath` -> `-Ipath` (unchanged), `-Lpath` -> `/libpath:path`,
/// `-lname` -> `name.lib`.
fn rewrite_msvc(kind: FlagKind, arg: &str) -> String {
    match kind {
        FlagKind::LibsL => {
            let path = arg.strip_prefix("-L").unwrap_or(arg);
            format!("/libpath:{}", path)
        }
        FlagKind::Libsl => {
            let name = arg.strip_prefix("-l").unwrap_or(arg);
            format!("{}.lib", name)
        }
        _ => arg.to_string(),
    }
}

fn classify_cflag(tokens: &[String], i: usize) -> (FlagKind, String, usize) {
    let tok = &tokens[i];

    if tok == "-idirafter" || tok == "-isystem" {
        if let Some(next) = tokens.get(i + 1) {
            return (FlagKind::CflagsOther, format!("{} {}", tok, next), 2);
        }
    }
    if let Some(rest) = tok.strip_prefix("-I") {
        if !rest.is_empty() {
            return (FlagKind::CflagsI, tok.clone(), 1);
        }
        if let Some(next) = tokens.get(i + 1) {
            return (FlagKind::CflagsI, format!("-I{}", next), 2);
        }
    }
    (FlagKind::CflagsOther, tok.clone(), 1)
}

fn classify_libs_flag(tokens: &[String], i: usize) -> (FlagKind, String, usize) {
    let tok = &tokens[i];

    if tok == "-framework" || tok == "-Wl,-framework" {
        if let Some(next) = tokens.get(i + 1) {
            return (FlagKind::LibsOther, format!("{} {}", tok, next), 2);
        }
    }
    if tok.starts_with("-l") && !tok.starts_with("-lib:") {
        if let Some(rest) = tok.strip_prefix("-l") {
            if !rest.is_empty() {
                return (FlagKind::Libsl, tok.clone(), 1);
            }
        }
    }
    if let Some(rest) = tok.strip_prefix("-L") {
        if !rest.is_empty() {
            return (FlagKind::LibsL, tok.clone(), 1);
        }
        if let Some(next) = tokens.get(i + 1) {
            return (FlagKind::LibsL, format!("-L{}", next), 2);
        }
    }
    (FlagKind::LibsOther, tok.clone(), 1)
}

/// Tokenizes and classifies a `Cflags:`-style line into `-I` vs.
/// everything-else flags.
pub fn parse_cflags(line: &str, msvc_syntax: bool) -> Result<Vec<Flag>> {
    let tokens = tokenize(line)?;
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let (kind, arg, consumed) = classify_cflag(&tokens, i);
        let arg = if msvc_syntax { rewrite_msvc(kind, &arg) } else { arg };
        out.push(Flag { kind, arg });
        i += consumed;
    }
    Ok(out)
}

/// Tokenizes and classifies a `Libs:`-style line into `-l`/`-L`/everything
/// else flags.
pub fn parse_libs(line: &str, msvc_syntax: bool) -> Result<Vec<Flag>> {
    let tokens = tokenize(line)?;
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let (kind, arg, consumed) = classify_libs_flag(&tokens, i);
        let arg = if msvc_syntax { rewrite_msvc(kind, &arg) } else { arg };
        out.push(Flag { kind, arg });
        i += consumed;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_unsafe_characters() {
        assert_eq!(shell_escape_encode("a b"), "a\\ b");
        assert_eq!(shell_escape_encode("foo-bar_1.0"), "foo-bar_1.0");
    }

    #[test]
    fn splits_cflags_into_include_and_other() {
        let flags = parse_cflags("-I/usr/include -DFOO=1 -Wall", false).unwrap();
        assert_eq!(flags[0].kind, FlagKind::CflagsI);
        assert_eq!(flags[0].arg, "-I/usr/include");
        assert_eq!(flags[1].kind, FlagKind::CflagsOther);
        assert_eq!(flags[1].arg, "-DFOO=1");
        assert_eq!(flags[2].arg, "-Wall");
    }

    #[test]
    fn include_flag_joins_a_separated_path_argument() {
        let flags = parse_cflags("-I /usr/include", false).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].arg, "-I/usr/include");
    }

    #[test]
    fn isystem_keeps_its_argument_attached_as_other() {
        let flags = parse_cflags("-isystem /opt/include", false).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, FlagKind::CflagsOther);
        assert_eq!(flags[0].arg, "-isystem /opt/include");
    }

    #[test]
    fn splits_libs_into_l_bigl_and_other() {
        let flags = parse_libs("-L/usr/lib -lfoo -pthread", false).unwrap();
        assert_eq!(flags[0].kind, FlagKind::LibsL);
        assert_eq!(flags[1].kind, FlagKind::Libsl);
        assert_eq!(flags[1].arg, "-lfoo");
        assert_eq!(flags[2].kind, FlagKind::LibsOther);
        assert_eq!(flags[2].arg, "-pthread");
    }

    #[test]
    fn framework_flag_joins_its_name_argument() {
        let flags = parse_libs("-framework CoreFoundation", false).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, FlagKind::LibsOther);
        assert_eq!(flags[0].arg, "-framework CoreFoundation");
    }

    #[test]
    fn csharp_lib_colon_syntax_is_not_treated_as_dash_l() {
        let flags = parse_libs("-lib:foo.lib", false).unwrap();
        assert_eq!(flags[0].kind, FlagKind::LibsOther);
    }

    #[test]
    fn msvc_syntax_rewrites_l_and_bigl() {
        let flags = parse_libs("-L/usr/lib -lfoo", true).unwrap();
        assert_eq!(flags[0].arg, "/libpath:/usr/lib");
        assert_eq!(flags[1].arg, "foo.lib");
    }

    #[test]
    fn quoted_space_groups_into_one_token_then_gets_escaped() {
        // Quotes are real shell grouping syntax, consumed by the word
        // split before escaping ever runs, so a quoted space stays part of
        // a single token instead of splitting it - and that now-internal
        // space gets backslash-escaped like any other unsafe byte.
        let flags = parse_cflags("-DNAME=\"a b\"", false).unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].arg, "-DNAME=a\\ b");
    }
}
