use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use nu_ansi_term::Color::Red;

use pkgmeta::cli::{Cli, Query};
use pkgmeta::config::Config;
use pkgmeta::errors::Result;
use pkgmeta::{Comparison, Registry};

#[test]
fn verify_app() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}

fn env_path_list(name: &str) -> Vec<PathBuf> {
    env::var_os(name)
        .map(|v| env::split_paths(&v).collect())
        .unwrap_or_default()
}

fn parse_define_variable(entries: &[String]) -> Result<HashMap<String, String>> {
    let mut globals = HashMap::new();
    for entry in entries {
        match entry.split_once('=') {
            Some((name, value)) => {
                globals.insert(name.to_string(), value.to_string());
            }
            None => {
                return Err(pkgmeta::Error::strict(format!(
                    "malformed --define-variable '{}', expected NAME=VALUE",
                    entry
                )))
            }
        }
    }
    Ok(globals)
}

fn build_registry(cli: &Cli) -> Result<Registry> {
    let config = match &cli.config {
        Some(path) => Some(Config::parse(path)?),
        None => Config::load_from_default_location()?,
    };
    let config = config.unwrap_or_default();

    // Precedence, highest to lowest (earlier entries in the final list win
    // ties during scanning): CLI `--search-path` overrides everything;
    // otherwise `PKG_CONFIG_PATH` is prepended, then either
    // `PKG_CONFIG_LIBDIR` or the compiled-in system default (LIBDIR
    // *replaces* the default rather than supplementing it), then any
    // directories named in the config file.
    let search_path = if !cli.search_path.is_empty() {
        cli.search_path.clone()
    } else {
        let mut dirs = env_path_list("PKG_CONFIG_PATH");
        let libdir = env_path_list("PKG_CONFIG_LIBDIR");
        if libdir.is_empty() {
            dirs.push(PathBuf::from(pkgmeta::config::DEFAULT_SYSTEM_DIR));
        } else {
            dirs.extend(libdir);
        }
        if let Some(configured) = &config.search_path {
            dirs.extend(configured.clone());
        }
        dirs
    };

    let mut globals = parse_define_variable(&cli.define_variable)?;
    if let Some(configured) = &config.define_variable {
        for (k, v) in configured {
            globals.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
    if let Some(top_build_dir) = env::var_os("PKG_CONFIG_TOP_BUILD_DIR") {
        globals
            .entry("pc_top_builddir".to_string())
            .or_insert_with(|| top_build_dir.to_string_lossy().into_owned());
    }

    // Accepted for compatibility but inert: the core never special-cases
    // system include/library directories, so these only avoid surprising a
    // caller who happens to set them.
    let _allow_system_cflags = env::var_os("PKG_CONFIG_ALLOW_SYSTEM_CFLAGS").is_some();
    let _allow_system_libs = env::var_os("PKG_CONFIG_ALLOW_SYSTEM_LIBS").is_some();

    let strict = cli.strict || config.parse_strict();
    let define_prefix = cli.define_prefix || config.define_prefix();
    let msvc_syntax = cli.msvc_syntax || config.msvc_syntax();
    let prefix_variable = if cli.prefix_variable != "prefix" {
        cli.prefix_variable.clone()
    } else {
        config.prefix_variable().to_string()
    };
    let disable_uninstalled = env::var_os("PKG_CONFIG_DISABLE_UNINSTALLED").is_some()
        || config.disable_uninstalled();

    log::debug!(
        "search path: {:?} (strict={}, define_prefix={}, msvc_syntax={})",
        search_path,
        strict,
        define_prefix,
        msvc_syntax
    );

    Ok(Registry::with_uninstalled_policy(
        search_path,
        globals,
        strict,
        msvc_syntax,
        define_prefix,
        prefix_variable,
        disable_uninstalled,
    ))
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();
    let registry = build_registry(&cli)?;

    match &cli.query.query {
        Query::Cflags => {
            println!("{}", registry.packages_get_all_cflags(&cli.packages)?);
        }
        Query::Libs => {
            println!("{}", registry.packages_get_all_libs(&cli.packages)?);
        }
        Query::Modversion => {
            for name in &cli.packages {
                println!("{}", registry.modversion(name)?);
            }
        }
        Query::Exists => {
            if !registry.exists(&cli.packages) {
                process::exit(1);
            }
        }
        Query::Variable { variable } => {
            println!("{}", registry.packages_get_var(&cli.packages, variable)?);
        }
        Query::ListAll => {
            println!("{}", registry.print_package_list());
        }
        Query::AtLeastVersion { version } => {
            check_single_version(&registry, &cli.packages, Comparison::GreaterEq, version)?;
        }
        Query::ExactVersion { version } => {
            check_single_version(&registry, &cli.packages, Comparison::Equal, version)?;
        }
        Query::MaxVersion { version } => {
            check_single_version(&registry, &cli.packages, Comparison::LessEq, version)?;
        }
    }

    Ok(())
}

/// Every named package's version must satisfy `comparison wanted`, or the
/// process exits nonzero - the `--atleast-version`/`--exact-version`/
/// `--max-version` family of checks.
fn check_single_version(registry: &Registry, names: &[String], comparison: Comparison, wanted: &str) -> Result<()> {
    for name in names {
        if !registry.check_versions(name, comparison, wanted)? {
            process::exit(1);
        }
    }
    Ok(())
}

/// Installs the `env_logger` subscriber, honoring `RUST_LOG` but raising the
/// default filter to `debug` when `PKG_CONFIG_DEBUG_SPEW` is set and
/// `RUST_LOG` wasn't already pinning a level.
fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    if env::var_os("RUST_LOG").is_none() && env::var_os("PKG_CONFIG_DEBUG_SPEW").is_some() {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    init_logging();
    if let Err(e) = real_main() {
        eprintln!("{}", Red.bold().paint(format!("pkgmeta: {}", e)));
        process::exit(1);
    }
}
