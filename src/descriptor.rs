//! Top-level descriptor parser: drives a `LineReader` to EOF, dispatches
//! each logical line to a known field or a variable assignment, and builds
//! the resulting `Package`.

use std::collections::HashMap;
use std::io::Read;

use crate::argv::{parse_cflags, parse_libs};
use crate::errors::{Error, Result};
use crate::line_reader::LineReader;
use crate::module_list::parse_module_list;
use crate::package::Package;
use crate::substitute::substitute;

/// When `--define-prefix` is in effect and a descriptor's directory is
/// itself named `pkgconfig` (case-insensitively), the real install prefix is
/// recovered as `dirname(dirname(pcfiledir))` — e.g. `/alt/lib/pkgconfig`
/// relocates to `/alt`. Returns the relocated prefix, forward-slash
/// normalized, or `None` if `pcfiledir`'s basename isn't `pkgconfig`.
fn relocated_prefix_for(pcfiledir: &str) -> Option<String> {
    let path = std::path::Path::new(pcfiledir);
    let basename = path.file_name()?.to_str()?;
    if !basename.eq_ignore_ascii_case("pkgconfig") {
        return None;
    }
    let grandparent = path.parent()?.parent()?;
    Some(grandparent.to_string_lossy().replace('\\', "/"))
}

/// If `raw` begins with `old_prefix` followed by a directory separator (or
/// equals it exactly), rewrites that leading portion to `new_prefix`. Runs
/// on the raw, pre-substitution text of every variable assignment that
/// follows a relocated `prefix=`, so a value hardcoded against the stale
/// prefix (rather than built from `${prefix}`) still relocates.
fn rewrite_literal_prefix(raw: &str, old_prefix: &str, new_prefix: &str) -> String {
    if let Some(rest) = raw.strip_prefix(old_prefix) {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
            return format!("{}{}", new_prefix, rest);
        }
    }
    raw.to_string()
}

enum Line {
    Field(String, String),
    Variable(String, String),
}

/// Splits one logical line into a field (`Name:` style) or a variable
/// assignment (`prefix=` style) the way `parse_line` distinguishes them: by
/// which punctuation - `:` or `=` - first follows a run of key characters.
fn classify_line(raw: &str, path: &str, strict: bool) -> Result<Option<Line>> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let key_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(line.len());

    if key_end == 0 {
        if strict {
            return Err(Error::strict(format!("malformed line in '{}': {}", path, raw)));
        }
        return Ok(None);
    }

    let key = &line[..key_end];
    match line[key_end..].chars().next() {
        Some(':') => Ok(Some(Line::Field(
            key.to_string(),
            line[key_end + 1..].to_string(),
        ))),
        Some('=') => Ok(Some(Line::Variable(
            key.to_string(),
            line[key_end + 1..].to_string(),
        ))),
        _ => {
            if strict {
                return Err(Error::strict(format!("malformed line in '{}': {}", path, raw)));
            }
            Ok(None)
        }
    }
}

/// Parses a whole descriptor stream into a `Package`.
///
/// `globals` are variable overrides supplied from outside the file (for
/// example `--define-variable`); they take priority over the file's own
/// `name=value` assignments during substitution, per `lookup_var`.
pub fn parse_descriptor<R: Read>(
    reader: R,
    key: &str,
    pcfiledir: &str,
    path: &str,
    globals: &HashMap<String, String>,
    strict: bool,
    msvc_syntax: bool,
    define_prefix: bool,
    prefix_variable: &str,
) -> Result<Package> {
    let mut pkg = Package::new(key, pcfiledir);
    let mut reader = LineReader::new(reader);
    let mut buf = Vec::new();
    let mut seen_fields: std::collections::HashSet<&'static str> = std::collections::HashSet::new();

    let relocated_prefix = if define_prefix {
        relocated_prefix_for(&pkg.pcfiledir)
    } else {
        None
    };

    while reader.read_line(&mut buf).map_err(|e| Error::Io {
        source: e,
        path: path.into(),
    })? {
        let raw = String::from_utf8_lossy(&buf).into_owned();
        let line = match classify_line(&raw, path, strict)? {
            Some(l) => l,
            None => continue,
        };

        match line {
            Line::Variable(name, raw_value) => {
                let raw_value = match (&pkg.orig_prefix, &relocated_prefix) {
                    (Some(old_prefix), Some(new_prefix)) if name != prefix_variable => {
                        rewrite_literal_prefix(&raw_value, old_prefix, new_prefix)
                    }
                    _ => raw_value,
                };
                let mut value = substitute(&raw_value, globals, &pkg, strict, path)?;
                if name == prefix_variable {
                    if let Some(actual) = &relocated_prefix {
                        if *actual != value {
                            pkg.orig_prefix = Some(value.clone());
                            value = actual.clone();
                        }
                    }
                }
                if pkg.vars.contains_key(&name) {
                    if strict {
                        return Err(Error::strict(format!(
                            "duplicate variable '{}' in '{}'",
                            name, path
                        )));
                    }
                    log::warn!("duplicate variable '{}' in '{}', ignoring", name, path);
                    continue;
                }
                pkg.vars.insert(name, value);
            }
            Line::Field(name, raw_value) => {
                let canonical = canonical_field_name(&name);
                if let Some(canonical) = canonical {
                    if !seen_fields.insert(canonical) {
                        if strict {
                            return Err(Error::strict(format!(
                                "duplicate field '{}' in '{}'",
                                name, path
                            )));
                        }
                        log::warn!("duplicate field '{}' in '{}', ignoring", name, path);
                        continue;
                    }
                }
                let value = substitute(&raw_value, globals, &pkg, strict, path)?;
                apply_field(&mut pkg, &name, &value, key, path, strict, msvc_syntax)?;
            }
        }
    }

    Ok(pkg)
}

/// Maps a field name to a canonical, alias-collapsed identity for duplicate
/// tracking (`Cflags`/`CFlags` are the same field), or `None` for a field
/// this parser doesn't recognize - duplicates of those are forward
/// compatibility noise, not an error.
fn canonical_field_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "Name" => "Name",
        "Description" => "Description",
        "Version" => "Version",
        "URL" => "URL",
        "Requires" => "Requires",
        "Requires.private" => "Requires.private",
        "Conflicts" => "Conflicts",
        "Cflags" | "CFlags" => "Cflags",
        "Libs" => "Libs",
        "Libs.private" => "Libs.private",
        _ => return None,
    })
}

fn apply_field(
    pkg: &mut Package,
    name: &str,
    value: &str,
    key: &str,
    path: &str,
    strict: bool,
    msvc_syntax: bool,
) -> Result<()> {
    match name {
        "Name" => pkg.name = value.to_string(),
        "Description" => pkg.description = value.to_string(),
        "Version" => pkg.version = value.to_string(),
        "URL" => pkg.url = value.to_string(),
        "Requires" => {
            let entries = parse_module_list(value, key, strict)?;
            for e in &entries {
                pkg.required_versions.insert(e.name.clone(), e.clone());
            }
            pkg.requires_entries.extend(entries);
        }
        "Requires.private" => {
            let entries = parse_module_list(value, key, strict)?;
            for e in &entries {
                pkg.required_versions.insert(e.name.clone(), e.clone());
            }
            pkg.requires_private_entries.extend(entries);
        }
        "Conflicts" => {
            pkg.conflicts.extend(parse_module_list(value, key, strict)?);
        }
        "Cflags" | "CFlags" => {
            pkg.cflags.extend(parse_cflags(value, msvc_syntax)?);
        }
        "Libs" => {
            pkg.libs.extend(parse_libs(value, msvc_syntax)?);
        }
        "Libs.private" => {
            pkg.libs_private.extend(parse_libs(value, msvc_syntax)?);
        }
        unknown => {
            log::debug!("unknown field '{}' in '{}', ignoring", unknown, path);
        }
    }
    Ok(())
}
