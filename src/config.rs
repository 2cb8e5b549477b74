//! Configuration layer: an optional TOML file layered under the
//! environment variables and CLI flags, read the same way as any other
//! `serde`/`toml`-backed config: parse, then fall back to field defaults
//! for anything absent.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::errors::{Error, Result};

/// The system package directory baked in at compile time, overridable by
/// setting `PKGMETA_SYSTEM_PKGCONFIG_DIR` in the build environment; falls
/// back to the conventional `/usr/lib/pkgconfig` when unset. This is the
/// lowest-precedence entry in the search path assembled by the front end
/// (see `bin/pkgmeta.rs::build_registry`), and the only one `PKG_CONFIG_LIBDIR`
/// replaces rather than supplements.
pub const DEFAULT_SYSTEM_DIR: &str = match option_env!("PKGMETA_SYSTEM_PKGCONFIG_DIR") {
    Some(v) => v,
    None => "/usr/lib/pkgconfig",
};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub parse_strict: Option<bool>,
    pub define_prefix: Option<bool>,
    pub prefix_variable: Option<String>,
    pub msvc_syntax: Option<bool>,
    pub disable_uninstalled: Option<bool>,
    pub search_path: Option<Vec<PathBuf>>,
    pub define_variable: Option<HashMap<String, String>>,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, IgnoredAny>,
}

impl Config {
    pub fn parse(path: &Path) -> Result<Config> {
        let mut file = File::open(path).map_err(|e| Error::Io {
            source: e,
            path: path.to_path_buf(),
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content).map_err(|e| Error::Io {
            source: e,
            path: path.to_path_buf(),
        })?;
        toml::from_str(&content).map_err(|e| Error::strict(format!("{}: {}", path.display(), e)))
    }

    /// Loads `pkgmeta.toml` out of the first directory `dirs::config_dir`
    /// reports, if one exists. Absence is not an error - the tool runs
    /// entirely off environment variables and flags by default.
    pub fn load_from_default_location() -> Result<Option<Config>> {
        let dir = match dirs::config_dir() {
            Some(d) => d,
            None => return Ok(None),
        };
        let path = dir.join("pkgmeta.toml");
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Config::parse(&path)?))
    }

    pub fn parse_strict(&self) -> bool {
        self.parse_strict.unwrap_or(false)
    }

    pub fn define_prefix(&self) -> bool {
        self.define_prefix.unwrap_or(false)
    }

    pub fn prefix_variable(&self) -> &str {
        self.prefix_variable.as_deref().unwrap_or("prefix")
    }

    pub fn msvc_syntax(&self) -> bool {
        self.msvc_syntax.unwrap_or(false)
    }

    pub fn disable_uninstalled(&self) -> bool {
        self.disable_uninstalled.unwrap_or(false)
    }
}
