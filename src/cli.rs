//! Command-line surface: one subcommand per `pkg-config`-style query.

use std::path::PathBuf;

use clap::{builder::styling::AnsiColor, builder::Styles, Parser, Subcommand};

const CLI_STYLE: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Debug, Clone, Parser)]
#[command(name = "pkgmeta", about = "Resolve package metadata descriptors")]
#[command(version)]
#[command(styles = CLI_STYLE)]
pub struct Cli {
    /// One or more package names to resolve.
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Directories to search, in priority order. Falls back to
    /// `PKG_CONFIG_PATH`/`PKG_CONFIG_LIBDIR` when unset.
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_path: Vec<PathBuf>,

    /// Reject any descriptor syntax error instead of logging and
    /// continuing past it.
    #[arg(long)]
    pub strict: bool,

    /// Rewrite a relocated package's `prefix` variable (and anything built
    /// from it) to match where the descriptor actually lives on disk.
    #[arg(long)]
    pub define_prefix: bool,

    /// Variable consulted by `--define-prefix`, default `prefix`.
    #[arg(long, value_name = "VAR", default_value = "prefix")]
    pub prefix_variable: String,

    /// Emit `-L`/`-l` flags in MSVC `LIBPATH:`/`.lib` form.
    #[arg(long)]
    pub msvc_syntax: bool,

    /// `name=value` variable overrides, highest priority in substitution.
    #[arg(long = "define-variable", value_name = "NAME=VALUE")]
    pub define_variable: Vec<String>,

    /// Path to a `pkgmeta.toml` config file, overriding the default
    /// location `dirs::config_dir` reports.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Query {
    /// Print `-I`/other preprocessor flags for the named packages.
    Cflags,
    /// Print `-L`/`-l`/other linker flags for the named packages.
    Libs,
    /// Print each named package's `Version:`.
    Modversion,
    /// Exit 0 if every named package resolves, nonzero otherwise.
    Exists,
    /// Print the value of `--variable=NAME` for each named package.
    Variable {
        #[arg(long, value_name = "NAME")]
        variable: String,
    },
    /// List every descriptor found on the search path.
    ListAll,
    /// Exit 0 if the named package's version is >= VERSION.
    AtLeastVersion { version: String },
    /// Exit 0 if the named package's version is exactly VERSION.
    ExactVersion { version: String },
    /// Exit 0 if the named package's version is <= VERSION.
    MaxVersion { version: String },
}

#[derive(Debug, Clone, clap::Args)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub query: Query,
}
