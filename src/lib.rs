//! `pkgmeta`: a `pkg-config`-equivalent descriptor parser and dependency
//! resolver. Parses `.pc`-style descriptors, resolves transitive
//! `Requires:` closures against an interning registry, and merges the
//! resulting compiler/linker flags in the same order pkg-config does.

pub mod argv;
pub mod cli;
pub mod compat;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod line_reader;
pub mod merge;
pub mod module_list;
pub mod package;
pub mod registry;
pub mod scanner;
pub mod substitute;
pub mod version;

pub use errors::{Error, Result};
pub use package::{Comparison, Flag, FlagKind, Package, RequiredVersion};
pub use registry::Registry;
