//! Expression substitutor: `${var}` expansion over a package scope.

use std::collections::HashMap;

use crate::errors::{Error, Result};
use crate::package::Package;

/// Resolves a variable name the way `package_get_var` does: a global
/// override wins, then the package's own `vars` (which already carries the
/// synthetic `pcfiledir` entry — see `Package::new`), and finally a direct
/// fallback to `pcfiledir` for robustness if a `Package` was ever built
/// without that entry present.
pub fn lookup_var(globals: &HashMap<String, String>, pkg: &Package, name: &str) -> Option<String> {
    if let Some(v) = globals.get(name) {
        return Some(v.clone());
    }
    if let Some(v) = pkg.vars.get(name) {
        return Some(v.clone());
    }
    if name == "pcfiledir" {
        return Some(pkg.pcfiledir.clone());
    }
    None
}

/// Trims `raw`, then expands `$$` and `${name}` tokens in one pass. The
/// output is never re-scanned, so a variable whose value itself contains
/// `${...}` is left untouched (substitution runs exactly one fixed pass).
pub fn substitute(
    raw: &str,
    globals: &HashMap<String, String>,
    pkg: &Package,
    strict: bool,
    path: &str,
) -> Result<String> {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek().map(|&(_, c2)| c2) {
            Some('$') => {
                out.push('$');
                chars.next();
            }
            Some('{') => {
                chars.next(); // consume '{'
                let name_start = chars.peek().map(|&(p, _)| p).unwrap_or(trimmed.len());
                let mut name_end = trimmed.len();
                let mut closed = false;
                while let Some(&(p, c3)) = chars.peek() {
                    if c3 == '}' {
                        name_end = p;
                        chars.next();
                        closed = true;
                        break;
                    }
                    chars.next();
                    name_end = p + c3.len_utf8();
                }
                let _ = closed;
                let name = &trimmed[name_start..name_end];

                match lookup_var(globals, pkg, name) {
                    Some(v) => out.push_str(&v),
                    None => {
                        log::warn!("Variable '{}' not defined in '{}'", name, path);
                        if strict {
                            return Err(Error::strict(format!(
                                "Variable '{}' not defined in '{}'",
                                name, path
                            )));
                        }
                    }
                }
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> (HashMap<String, String>, Package) {
        let mut pkg = Package::new("foo", "/usr/lib/pkgconfig");
        pkg.vars.insert("libdir".to_string(), "/usr/lib".to_string());
        (HashMap::new(), pkg)
    }

    #[test]
    fn expands_known_variable() {
        let (globals, pkg) = scope();
        let out = substitute("${libdir}/libfoo.so", &globals, &pkg, true, "foo.pc").unwrap();
        assert_eq!(out, "/usr/lib/libfoo.so");
    }

    #[test]
    fn double_dollar_is_literal() {
        let (globals, pkg) = scope();
        let out = substitute("$$HOME", &globals, &pkg, true, "foo.pc").unwrap();
        assert_eq!(out, "$HOME");
    }

    #[test]
    fn globals_override_package_vars() {
        let (mut globals, pkg) = scope();
        globals.insert("libdir".to_string(), "/override".to_string());
        let out = substitute("${libdir}", &globals, &pkg, true, "foo.pc").unwrap();
        assert_eq!(out, "/override");
    }

    #[test]
    fn undefined_variable_is_fatal_in_strict_mode() {
        let (globals, pkg) = scope();
        let err = substitute("${nope}", &globals, &pkg, true, "foo.pc").unwrap_err();
        assert!(matches!(err, Error::Strict(_)));
    }

    #[test]
    fn undefined_variable_expands_to_empty_in_lax_mode() {
        let (globals, pkg) = scope();
        let out = substitute("x${nope}y", &globals, &pkg, false, "foo.pc").unwrap();
        assert_eq!(out, "xy");
    }

    #[test]
    fn output_is_not_rescanned() {
        let (mut globals, pkg) = scope();
        globals.insert("a".to_string(), "${b}".to_string());
        globals.insert("b".to_string(), "resolved".to_string());
        let out = substitute("${a}", &globals, &pkg, true, "foo.pc").unwrap();
        assert_eq!(out, "${b}");
    }

    #[test]
    fn leading_and_trailing_whitespace_is_trimmed() {
        let (globals, pkg) = scope();
        let out = substitute("   plain value   ", &globals, &pkg, true, "foo.pc").unwrap();
        assert_eq!(out, "plain value");
    }
}
