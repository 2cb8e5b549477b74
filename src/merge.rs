//! Transitive walker and flag merger. Both are pure functions over an
//! already-resolved `Package` graph; neither needs the registry.

use itertools::Itertools;

use crate::package::{Flag, Package};

/// Depth-first pre-order walk over `pkg` and its transitive `requires`,
/// appending whatever `selector` returns for each package visited, in
/// order. No cycle detection: the core trusts the graph to be acyclic (the
/// resolver's load path is what actually guards against cycles, by
/// refusing to link a `Requires:` entry back onto a package already being
/// loaded). Generic over the accumulated item type so the same walk drives
/// both the `Flag` merger and the registry's transitive conflicts/requires
/// checks.
pub fn recursive_fill_list<T, F>(pkg: &Package, selector: &F, out: &mut Vec<T>)
where
    F: Fn(&Package) -> Vec<T>,
{
    out.extend(selector(pkg));
    for dep in &pkg.requires {
        recursive_fill_list(dep, selector, out);
    }
}

/// First occurrence of each `arg` survives; used for `-I` and `-L`.
pub fn forward_dedup(flags: Vec<Flag>) -> Vec<Flag> {
    flags.into_iter().unique_by(|f| f.arg.clone()).collect()
}

/// Last occurrence of each `arg` survives; used for `-l`, which is the
/// correct linker ordering for repeated libraries.
pub fn backward_dedup(mut flags: Vec<Flag>) -> Vec<Flag> {
    flags.reverse();
    let mut deduped = forward_dedup(flags);
    deduped.reverse();
    deduped
}

/// Space-joins flag args with no trailing space.
pub fn join_args(flags: &[Flag]) -> String {
    flags
        .iter()
        .map(|f| f.arg.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
