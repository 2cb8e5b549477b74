//! The loaded representation of one descriptor file, and the per-package
//! query surface built on top of it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::merge::{backward_dedup, forward_dedup, join_args, recursive_fill_list};

/// One `name [op version]` entry from a `Requires:` / `Requires.private:` /
/// `Conflicts:` line.
#[derive(Debug, Clone)]
pub struct RequiredVersion {
    pub name: String,
    pub comparison: Comparison,
    pub version: String,
    /// Key of the package that declared this constraint. Kept as an owned
    /// string rather than a back-reference to the owning `Package` so that
    /// the dependency graph never needs a reference cycle (see DESIGN.md).
    pub owner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AlwaysMatch,
    Equal,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl Comparison {
    pub fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "=" => Comparison::Equal,
            "!=" => Comparison::NotEqual,
            "<" => Comparison::Less,
            "<=" => Comparison::LessEq,
            ">" => Comparison::Greater,
            ">=" => Comparison::GreaterEq,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::AlwaysMatch => "(any)",
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::LessEq => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    CflagsI,
    CflagsOther,
    LibsL,
    Libsl,
    LibsOther,
}

/// A single already-shell-escaped, already-prefixed compiler or linker
/// argument, tagged with the category the merger needs to tell `-I`/`-L`/
/// `-l` apart from everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub kind: FlagKind,
    pub arg: String,
}

/// The loaded representation of one `.pc`-style descriptor.
#[derive(Debug)]
pub struct Package {
    pub key: String,
    pub pcfiledir: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub url: String,
    pub vars: HashMap<String, String>,
    pub orig_prefix: Option<String>,

    pub requires_entries: Vec<RequiredVersion>,
    pub requires_private_entries: Vec<RequiredVersion>,
    pub conflicts: Vec<RequiredVersion>,
    pub required_versions: HashMap<String, RequiredVersion>,
    pub requires: Vec<Rc<Package>>,

    pub cflags: Vec<Flag>,
    pub libs: Vec<Flag>,
    pub libs_private: Vec<Flag>,

    pub uninstalled: bool,

    l_libs_cache: RefCell<Option<String>>,
    big_l_libs_cache: RefCell<Option<String>>,
    i_cflags_cache: RefCell<Option<String>>,
}

impl Package {
    pub fn new(key: impl Into<String>, pcfiledir: impl Into<String>) -> Self {
        let pcfiledir = pcfiledir.into();
        let mut vars = HashMap::new();
        vars.insert("pcfiledir".to_string(), pcfiledir.clone());
        Package {
            key: key.into(),
            pcfiledir,
            name: String::new(),
            version: String::new(),
            description: String::new(),
            url: String::new(),
            vars,
            orig_prefix: None,
            requires_entries: Vec::new(),
            requires_private_entries: Vec::new(),
            conflicts: Vec::new(),
            required_versions: HashMap::new(),
            requires: Vec::new(),
            cflags: Vec::new(),
            libs: Vec::new(),
            libs_private: Vec::new(),
            uninstalled: false,
            l_libs_cache: RefCell::new(None),
            big_l_libs_cache: RefCell::new(None),
            i_cflags_cache: RefCell::new(None),
        }
    }

    /// `-l` flags across the transitive `requires` closure, rightmost
    /// occurrence wins (backward-dedup), memoized after first call.
    pub fn l_libs(&self) -> String {
        if let Some(cached) = self.l_libs_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut collected = Vec::new();
        recursive_fill_list(
            self,
            &|p: &Package| {
                p.libs
                    .iter()
                    .filter(|f| f.kind == FlagKind::Libsl)
                    .cloned()
                    .collect()
            },
            &mut collected,
        );
        let merged = join_args(&backward_dedup(collected));
        *self.l_libs_cache.borrow_mut() = Some(merged.clone());
        merged
    }

    /// `-L` flags across the transitive `requires` closure, first occurrence
    /// wins (forward-dedup), memoized after first call.
    #[allow(non_snake_case)]
    pub fn L_libs(&self) -> String {
        if let Some(cached) = self.big_l_libs_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut collected = Vec::new();
        recursive_fill_list(
            self,
            &|p: &Package| {
                p.libs
                    .iter()
                    .filter(|f| f.kind == FlagKind::LibsL)
                    .cloned()
                    .collect()
            },
            &mut collected,
        );
        let merged = join_args(&forward_dedup(collected));
        *self.big_l_libs_cache.borrow_mut() = Some(merged.clone());
        merged
    }

    /// `-I` flags across the transitive `requires` closure, first occurrence
    /// wins, memoized after first call.
    #[allow(non_snake_case)]
    pub fn I_cflags(&self) -> String {
        if let Some(cached) = self.i_cflags_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut collected = Vec::new();
        recursive_fill_list(
            self,
            &|p: &Package| {
                p.cflags
                    .iter()
                    .filter(|f| f.kind == FlagKind::CflagsI)
                    .cloned()
                    .collect()
            },
            &mut collected,
        );
        let merged = join_args(&forward_dedup(collected));
        *self.i_cflags_cache.borrow_mut() = Some(merged.clone());
        merged
    }

    /// Everything in `Libs:` that isn't `-l`/`-L`, for this package alone.
    /// Unlike `l_libs`/`L_libs` this does NOT walk `requires` — matching the
    /// upstream behavior where "other" flags of a dependency only show up
    /// for callers that depend on it directly (see DESIGN.md).
    pub fn other_libs(&self) -> String {
        let flags: Vec<Flag> = self
            .libs
            .iter()
            .filter(|f| f.kind == FlagKind::LibsOther)
            .cloned()
            .collect();
        join_args(&flags)
    }

    /// Everything in `Cflags:` that isn't `-I`, for this package alone (see
    /// `other_libs` for why this isn't transitive).
    pub fn other_cflags(&self) -> String {
        let flags: Vec<Flag> = self
            .cflags
            .iter()
            .filter(|f| f.kind == FlagKind::CflagsOther)
            .cloned()
            .collect();
        join_args(&flags)
    }
}

#[cfg(test)]
mod tests {
    use assert2::assert;

    use super::*;

    fn flag(kind: FlagKind, arg: &str) -> Flag {
        Flag {
            kind,
            arg: arg.to_string(),
        }
    }

    #[test]
    fn single_package_libs_and_cflags() {
        let mut pkg = Package::new("foo", "/usr/lib/pkgconfig");
        pkg.libs.push(flag(FlagKind::LibsL, "-L/usr/lib"));
        pkg.libs.push(flag(FlagKind::Libsl, "-lfoo"));
        pkg.cflags.push(flag(FlagKind::CflagsI, "-I/usr/include"));

        assert!(pkg.l_libs() == "-lfoo");
        assert!(pkg.L_libs() == "-L/usr/lib");
        assert!(pkg.I_cflags() == "-I/usr/include");
    }

    #[test]
    fn transitive_dedup_keeps_rightmost_l_flag() {
        let mut b = Package::new("b", "/x");
        b.libs.push(flag(FlagKind::Libsl, "-lb"));
        b.libs.push(flag(FlagKind::Libsl, "-la"));
        let b = Rc::new(b);

        let mut a = Package::new("a", "/x");
        a.libs.push(flag(FlagKind::Libsl, "-la"));
        a.requires.push(b);

        // recursive_fill_list visits `a` first, then `b`: [-la, -lb, -la]
        // backward-dedup keeps the rightmost occurrence of each arg.
        assert_eq!(a.l_libs(), "-lb -la");
    }

    #[test]
    fn other_libs_does_not_cross_requires() {
        let mut b = Package::new("b", "/x");
        b.libs.push(flag(FlagKind::LibsOther, "-pthread"));
        let b = Rc::new(b);

        let mut a = Package::new("a", "/x");
        a.requires.push(b);

        assert_eq!(a.other_libs(), "");
    }
}
