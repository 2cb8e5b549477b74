//! Registry: resolves package names to loaded, verified
//! `Package`s, and the multi-package query surface built on top of it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::PathBuf;
use std::rc::Rc;

use crate::compat::{CompatResolver, NullCompatResolver};
use crate::descriptor::parse_descriptor;
use crate::errors::{Error, Result};
use crate::merge::recursive_fill_list;
use crate::package::Package;
use crate::scanner::scan_search_path;
use crate::version::version_test;

pub struct Registry {
    search_path: Vec<PathBuf>,
    found: HashMap<String, PathBuf>,
    uninstalled: HashMap<String, PathBuf>,
    disable_uninstalled: bool,
    cache: RefCell<HashMap<String, Rc<Package>>>,
    /// Keys currently being loaded, to catch a `Requires:` cycle before it
    /// exhausts the stack. This guard lives at the load path, not in
    /// `merge::recursive_fill_list`, which stays a trusting, cycle-blind
    /// walker over whatever graph it's handed.
    loading: RefCell<HashSet<String>>,
    globals: HashMap<String, String>,
    strict: bool,
    msvc_syntax: bool,
    define_prefix: bool,
    prefix_variable: String,
    compat: Box<dyn CompatResolver>,
}

impl Registry {
    pub fn new(
        search_path: Vec<PathBuf>,
        globals: HashMap<String, String>,
        strict: bool,
        msvc_syntax: bool,
        define_prefix: bool,
        prefix_variable: impl Into<String>,
    ) -> Self {
        Self::with_uninstalled_policy(search_path, globals, strict, msvc_syntax, define_prefix, prefix_variable, false)
    }

    /// Like `new`, but lets the caller disable the `*-uninstalled.pc`
    /// preference (`PKG_CONFIG_DISABLE_UNINSTALLED`/`disable_uninstalled`).
    pub fn with_uninstalled_policy(
        search_path: Vec<PathBuf>,
        globals: HashMap<String, String>,
        strict: bool,
        msvc_syntax: bool,
        define_prefix: bool,
        prefix_variable: impl Into<String>,
        disable_uninstalled: bool,
    ) -> Self {
        let scanned = scan_search_path(&search_path);
        Registry {
            search_path,
            found: scanned.found,
            uninstalled: scanned.uninstalled,
            disable_uninstalled,
            cache: RefCell::new(HashMap::new()),
            loading: RefCell::new(HashSet::new()),
            globals,
            strict,
            msvc_syntax,
            define_prefix,
            prefix_variable: prefix_variable.into(),
            compat: Box::new(NullCompatResolver),
        }
    }

    pub fn with_compat_resolver(mut self, compat: Box<dyn CompatResolver>) -> Self {
        self.compat = compat;
        self
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.found.keys()
    }

    /// Adds one more directory to the search path and scans it immediately,
    /// merging its descriptors in with first-wins semantics against
    /// whatever's already been found - a directory added later only fills
    /// gaps, it never displaces an earlier hit. Mirrors upstream's pattern
    /// of calling this repeatedly before the first `get_package`; since
    /// packages are cached lazily, calling it after resolving a package
    /// whose key this directory also provides has no effect on that
    /// already-cached package.
    pub fn add_search_dir(&mut self, dir: PathBuf) {
        let scanned = scan_search_path(std::slice::from_ref(&dir));
        for (k, v) in scanned.found {
            self.found.entry(k).or_insert(v);
        }
        for (k, v) in scanned.uninstalled {
            self.uninstalled.entry(k).or_insert(v);
        }
        self.search_path.push(dir);
    }

    /// Defines a global variable override, taking priority over any
    /// descriptor-local variable of the same name in every subsequent
    /// substitution (`package_get_var`'s global-override-wins rule).
    pub fn define_global_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.globals.insert(name.into(), value.into());
    }

    /// Resolves `name` to a fully loaded, transitively-requires-resolved,
    /// verified package, consulting the interning cache first.
    pub fn get_package(&self, name: &str) -> Result<Rc<Package>> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(Rc::clone(cached));
        }

        // A name ending in `.pc` that exists on disk is a direct file path,
        // bypassing the search path entirely - lets a caller point straight
        // at a descriptor that was never scanned.
        if name.ends_with(".pc") {
            let direct = PathBuf::from(name);
            if direct.is_file() {
                let key = direct
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(name)
                    .to_string();
                let uninstalled = direct
                    .file_name()
                    .and_then(|s| s.to_str())
                    .map(|f| f.ends_with("uninstalled.pc"))
                    .unwrap_or(false);
                let pkg = self.load_package(&key, &direct, uninstalled)?;
                self.verify_package(&pkg)?;
                self.cache.borrow_mut().insert(name.to_string(), Rc::clone(&pkg));
                return Ok(pkg);
            }
        }

        let uninstalled_path = if self.disable_uninstalled {
            None
        } else {
            self.uninstalled.get(name)
        };

        let pkg = match uninstalled_path.or_else(|| self.found.get(name)) {
            Some(path) => self.load_package(name, path, uninstalled_path.is_some())?,
            None => match self.compat.resolve(name) {
                Some(pkg) => Rc::new(pkg),
                None => return Err(Error::NotFound(name.to_string())),
            },
        };

        self.verify_package(&pkg)?;
        self.cache.borrow_mut().insert(name.to_string(), Rc::clone(&pkg));
        Ok(pkg)
    }

    fn load_package(&self, key: &str, path: &PathBuf, uninstalled: bool) -> Result<Rc<Package>> {
        if !self.loading.borrow_mut().insert(key.to_string()) {
            return Err(Error::Cycle(key.to_string()));
        }

        let result = self.load_package_inner(key, path, uninstalled);
        self.loading.borrow_mut().remove(key);
        result
    }

    fn load_package_inner(&self, key: &str, path: &PathBuf, uninstalled: bool) -> Result<Rc<Package>> {
        let file = File::open(path).map_err(|e| Error::Io {
            source: e,
            path: path.clone(),
        })?;
        let pcfiledir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let display_path = path.to_string_lossy().into_owned();

        let mut pkg = parse_descriptor(
            file,
            key,
            &pcfiledir,
            &display_path,
            &self.globals,
            self.strict,
            self.msvc_syntax,
            self.define_prefix,
            &self.prefix_variable,
        )?;

        let mut requires = Vec::with_capacity(pkg.requires_entries.len() + pkg.requires_private_entries.len());
        for entry in pkg.requires_entries.iter().chain(pkg.requires_private_entries.iter()) {
            requires.push(self.get_package(&entry.name)?);
        }
        pkg.requires = requires;
        pkg.uninstalled = uninstalled;

        Ok(Rc::new(pkg))
    }

    /// Required-field presence, every `required_versions` constraint
    /// against the actually-resolved dependency version, and conflicts.
    fn verify_package(&self, pkg: &Package) -> Result<()> {
        if pkg.name.is_empty() {
            return Err(Error::MissingField {
                key: pkg.key.clone(),
                field: "Name",
            });
        }
        if pkg.version.is_empty() {
            return Err(Error::MissingField {
                key: pkg.key.clone(),
                field: "Version",
            });
        }
        if pkg.description.is_empty() {
            return Err(Error::MissingField {
                key: pkg.key.clone(),
                field: "Description",
            });
        }

        for dep in &pkg.requires {
            if let Some(required) = pkg.required_versions.get(&dep.key) {
                if !version_test(required.comparison, &dep.version, &required.version) {
                    return Err(Error::VersionConstraint {
                        pkg: pkg.key.clone(),
                        dep: dep.key.clone(),
                        op: required.comparison.as_str(),
                        wanted: required.version.clone(),
                        got: dep.version.clone(),
                    });
                }
            }
        }

        // Walk the transitive requires closure and the transitive conflicts
        // closure (not just `pkg`'s own direct requires/conflicts), and fail
        // on any pair
        // where a conflict's name matches a package actually pulled in and
        // the conflict's version predicate accepts that package's version.
        let selector_key_version = |p: &Package| vec![(p.key.clone(), p.version.clone())];
        let mut required_pkgs = Vec::new();
        for dep in &pkg.requires {
            recursive_fill_list(dep, &selector_key_version, &mut required_pkgs);
        }

        let selector_conflicts = |p: &Package| p.conflicts.clone();
        let mut transitive_conflicts = pkg.conflicts.clone();
        for dep in &pkg.requires {
            recursive_fill_list(dep, &selector_conflicts, &mut transitive_conflicts);
        }

        let mut versions_by_key: HashMap<&str, &str> = HashMap::new();
        versions_by_key.insert(pkg.key.as_str(), pkg.version.as_str());
        for (k, v) in &required_pkgs {
            versions_by_key.insert(k.as_str(), v.as_str());
        }

        for (dep_key, dep_version) in &required_pkgs {
            for conflict in &transitive_conflicts {
                if &conflict.name == dep_key && version_test(conflict.comparison, dep_version, &conflict.version) {
                    let owner_version = versions_by_key.get(conflict.owner.as_str()).copied().unwrap_or(pkg.version.as_str());
                    return Err(Error::Conflict {
                        name: dep_key.clone(),
                        version: dep_version.clone(),
                        conflict_name: conflict.name.clone(),
                        op: conflict.comparison.as_str(),
                        conflict_version: conflict.version.clone(),
                        owner_name: conflict.owner.clone(),
                        owner_version: owner_version.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn resolve_all(&self, names: &[String]) -> Result<Vec<Rc<Package>>> {
        names.iter().map(|n| self.get_package(n)).collect()
    }

    /// `-I` then everything merged across every named package and its
    /// transitive requirements, each package's own flags forward-deduped
    /// against the others in declaration order.
    pub fn packages_get_all_cflags(&self, names: &[String]) -> Result<String> {
        let pkgs = self.resolve_all(names)?;
        let mut parts = Vec::new();
        for pkg in &pkgs {
            let i_cflags = pkg.I_cflags();
            if !i_cflags.is_empty() {
                parts.push(i_cflags);
            }
        }
        for pkg in &pkgs {
            let other = pkg.other_cflags();
            if !other.is_empty() {
                parts.push(other);
            }
        }
        Ok(parts.join(" "))
    }

    /// `-L` then `-l` then everything-else across every named package and
    /// its transitive requirements.
    pub fn packages_get_all_libs(&self, names: &[String]) -> Result<String> {
        let pkgs = self.resolve_all(names)?;
        let mut parts = Vec::new();
        for pkg in &pkgs {
            let big_l = pkg.L_libs();
            if !big_l.is_empty() {
                parts.push(big_l);
            }
        }
        for pkg in &pkgs {
            let l = pkg.l_libs();
            if !l.is_empty() {
                parts.push(l);
            }
        }
        for pkg in &pkgs {
            let other = pkg.other_libs();
            if !other.is_empty() {
                parts.push(other);
            }
        }
        Ok(parts.join(" "))
    }

    /// `package_get_var`: a global override wins, then the package's own
    /// `vars` (which already carries the synthetic `pcfiledir` entry).
    pub fn package_get_var(&self, pkg: &Package, name: &str) -> Option<String> {
        crate::substitute::lookup_var(&self.globals, pkg, name)
    }

    /// `parse_package_variable`: like `package_get_var`, but a value that
    /// is fully quoted (leading `"` or `'`) is returned shell-unquoted. A
    /// value that doesn't parse as a single shell word is returned raw
    /// rather than failing the whole lookup.
    pub fn parse_package_variable(&self, pkg: &Package, name: &str) -> Option<String> {
        let raw = self.package_get_var(pkg, name)?;
        let quoted = matches!(raw.as_bytes().first(), Some(b'"') | Some(b'\''));
        if !quoted {
            return Some(raw);
        }
        match shell_words::split(&raw) {
            Ok(words) if words.len() == 1 => Some(words.into_iter().next().unwrap()),
            _ => Some(raw),
        }
    }

    /// Multi-package variant of `package_get_var`: each named package's
    /// value (globals still taking priority per `package_get_var`), joined
    /// in input order.
    pub fn packages_get_var(&self, names: &[String], var: &str) -> Result<String> {
        let pkgs = self.resolve_all(names)?;
        let values: Vec<String> = pkgs
            .iter()
            .filter_map(|p| self.package_get_var(p, var))
            .filter(|v| !v.is_empty())
            .collect();
        Ok(values.join(" "))
    }

    pub fn modversion(&self, name: &str) -> Result<String> {
        Ok(self.get_package(name)?.version.clone())
    }

    pub fn exists(&self, names: &[String]) -> bool {
        self.resolve_all(names).is_ok()
    }

    /// Checks every named package's `required_versions` against the version
    /// actually present in the registry, independent of whether that
    /// package is anyone's dependency yet (`pkg-config --atleast-version`
    /// and friends drive this directly from the command line).
    pub fn check_versions(&self, name: &str, comparison: crate::package::Comparison, wanted: &str) -> Result<bool> {
        let pkg = self.get_package(name)?;
        Ok(version_test(comparison, &pkg.version, wanted))
    }

    /// One line per discovered descriptor: `key\t\tname - description`,
    /// sorted by key, matching `print_package_list`'s listing order.
    pub fn print_package_list(&self) -> String {
        let mut keys: Vec<&String> = self.found.keys().collect();
        keys.sort();

        let mut lines = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get_package(key) {
                Ok(pkg) => lines.push(format!("{}\t\t{} - {}", pkg.key, pkg.name, pkg.description)),
                Err(e) => lines.push(format!("{}\t\terror: {}", key, e)),
            }
        }
        lines.join("\n")
    }
}
