use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use crate::Crdt;

/// Identifier of an atom: the generating site and the atom's index within
/// that site's yarn.
pub type AtomId<S> = (S, u32);

/// One entry of a yarn: an application operation, its identity, and the
/// identifiers of causally prior atoms.
///
/// Atoms are immutable after insertion; the only sanctioned mutation is
/// the dependency scrub performed by the local-GC [`Yarn::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom<O, S> {
    /// The application operation this atom carries.
    pub op: O,
    /// `(site, index)` identity within the graph.
    pub id: AtomId<S>,
    /// Identifiers this atom declares as causally prior.
    pub deps: BTreeSet<AtomId<S>>,
}

/// Error from yarn operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YarnError {
    /// Two yarns with different sites cannot merge.
    SiteMismatch,
    /// The yarn holds no atoms.
    EmptyYarn,
}

impl fmt::Display for YarnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SiteMismatch => write!(f, "cannot merge yarns of different sites"),
            Self::EmptyYarn => write!(f, "yarn holds no atoms"),
        }
    }
}

/// An append-only sequence of atoms from a single site.
///
/// Indices ascend in insertion order, so a yarn doubles as the site's
/// operation history. Yarns of the same site merge by deduplicating on
/// identifier; merging yarns of different sites is an error.
///
/// # Example
///
/// ```
/// use woot_kit::prelude::*;
/// use std::collections::BTreeSet;
///
/// let mut yarn = Yarn::new("site-a");
/// let first = yarn.insert("set x=1", BTreeSet::new());
/// let second = yarn.insert("set x=2", BTreeSet::from([first.clone()]));
///
/// assert_eq!(first, ("site-a", 0));
/// assert_eq!(second, ("site-a", 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Yarn<O, S> {
    site: S,
    atoms: Vec<Atom<O, S>>,
}

impl<O: Clone, S: Ord + Clone> Yarn<O, S> {
    /// Create an empty yarn for `site`.
    pub fn new(site: S) -> Self {
        Self {
            site,
            atoms: Vec::new(),
        }
    }

    /// The site all atoms of this yarn belong to.
    #[must_use]
    pub fn site(&self) -> &S {
        &self.site
    }

    /// Number of atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Whether the yarn holds no atoms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// The atom at position `pos` in the yarn.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&Atom<O, S>> {
        self.atoms.get(pos)
    }

    /// Iterate over the atoms in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Atom<O, S>> {
        self.atoms.iter()
    }

    /// The most recently appended atom, or [`YarnError::EmptyYarn`].
    pub fn latest(&self) -> Result<&Atom<O, S>, YarnError> {
        self.atoms.last().ok_or(YarnError::EmptyYarn)
    }

    /// Append an operation with its dependency set, returning the new
    /// atom's identifier. The index continues from the last atom's.
    pub fn insert(&mut self, op: O, deps: BTreeSet<AtomId<S>>) -> AtomId<S> {
        let index = match self.atoms.last() {
            Some(atom) => atom.id.1 + 1,
            None => 0,
        };
        let id = (self.site.clone(), index);
        self.atoms.push(Atom {
            op,
            id: id.clone(),
            deps,
        });
        id
    }

    /// Merge another yarn of the same site: the union of both atom lists,
    /// deduplicated by identifier and ascending by index.
    ///
    /// Fails with [`YarnError::SiteMismatch`] when the sites differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), YarnError> {
        if self.site != other.site {
            return Err(YarnError::SiteMismatch);
        }
        let mut by_index: BTreeMap<u32, Atom<O, S>> = BTreeMap::new();
        for atom in self.atoms.drain(..) {
            by_index.entry(atom.id.1).or_insert(atom);
        }
        for atom in &other.atoms {
            by_index
                .entry(atom.id.1)
                .or_insert_with(|| atom.clone());
        }
        self.atoms = by_index.into_values().collect();
        Ok(())
    }

    /// Local-GC utility: drop the atom with `id` and scrub `id` from every
    /// remaining atom's dependency set.
    ///
    /// This is the one mutation that breaks append-only semantics. It is
    /// purely local; a removed atom resurfaces on the next merge with a
    /// replica that still holds it.
    pub fn remove(&mut self, id: &AtomId<S>) {
        self.atoms.retain(|atom| &atom.id != id);
        for atom in &mut self.atoms {
            atom.deps.remove(id);
        }
    }
}

/// A causal graph: one yarn per site.
///
/// The graph is the cross-site view of operation history. Merging two
/// graphs takes the union of their site sets, merging yarns pairwise
/// where both sides know the site and adopting single-side yarns
/// unchanged.
///
/// # Example
///
/// ```
/// use woot_kit::prelude::*;
/// use std::collections::BTreeSet;
///
/// let mut g1 = CausalGraph::new();
/// let a0 = g1.insert("a", "write", BTreeSet::new());
///
/// let mut g2 = CausalGraph::new();
/// g2.insert("b", "write", BTreeSet::from([a0]));
///
/// g1.merge(&g2);
/// assert_eq!(g1.site_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CausalGraph<O, S: Ord> {
    yarns: BTreeMap<S, Yarn<O, S>>,
}

impl<O: Clone, S: Ord + Clone> CausalGraph<O, S> {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            yarns: BTreeMap::new(),
        }
    }

    /// Number of sites with a yarn.
    #[must_use]
    pub fn site_count(&self) -> usize {
        self.yarns.len()
    }

    /// The yarn for `site`, if the graph has seen that site.
    #[must_use]
    pub fn yarn(&self, site: &S) -> Option<&Yarn<O, S>> {
        self.yarns.get(site)
    }

    /// The yarn for `site`, created empty on first access.
    pub fn yarn_mut(&mut self, site: S) -> &mut Yarn<O, S> {
        self.yarns
            .entry(site.clone())
            .or_insert_with(|| Yarn::new(site))
    }

    /// Append an operation to `site`'s yarn, creating the yarn if needed.
    /// Returns the new atom's identifier.
    pub fn insert(&mut self, site: S, op: O, deps: BTreeSet<AtomId<S>>) -> AtomId<S> {
        self.yarn_mut(site).insert(op, deps)
    }

    /// Iterate over the yarns in site order.
    pub fn iter(&self) -> impl Iterator<Item = &Yarn<O, S>> {
        self.yarns.values()
    }

    /// Graph-wide local GC: remove the atom with `id` from its yarn and
    /// scrub `id` from every atom's dependency set across all yarns.
    pub fn remove(&mut self, id: &AtomId<S>) {
        for yarn in self.yarns.values_mut() {
            yarn.remove(id);
        }
    }
}

impl<O: Clone, S: Ord + Clone> Default for CausalGraph<O, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Clone, S: Ord + Clone> Crdt for CausalGraph<O, S> {
    fn merge(&mut self, other: &Self) {
        for (site, yarn) in &other.yarns {
            match self.yarns.get_mut(site) {
                Some(local) => {
                    // Keys equal sites, so a same-key merge cannot mismatch.
                    local.merge(yarn).ok();
                }
                None => {
                    self.yarns.insert(site.clone(), yarn.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps<S: Ord>(ids: impl IntoIterator<Item = AtomId<S>>) -> BTreeSet<AtomId<S>> {
        ids.into_iter().collect()
    }

    #[test]
    fn insert_assigns_gapless_indices() {
        let mut yarn = Yarn::new(1u8);
        for i in 0..5u32 {
            let id = yarn.insert(i, BTreeSet::new());
            assert_eq!(id, (1, i));
        }
        let indices: Vec<u32> = yarn.iter().map(|a| a.id.1).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn latest_on_empty_yarn() {
        let yarn = Yarn::<u32, u8>::new(1);
        assert_eq!(yarn.latest().unwrap_err(), YarnError::EmptyYarn);

        let mut yarn = yarn;
        yarn.insert(7, BTreeSet::new());
        assert_eq!(yarn.latest().unwrap().op, 7);
    }

    #[test]
    fn merge_requires_same_site() {
        let mut a = Yarn::<u32, u8>::new(1);
        let b = Yarn::<u32, u8>::new(2);
        assert_eq!(a.merge(&b).unwrap_err(), YarnError::SiteMismatch);
        assert_eq!(
            YarnError::SiteMismatch.to_string(),
            "cannot merge yarns of different sites"
        );
    }

    #[test]
    fn merge_deduplicates_and_sorts() {
        let mut a = Yarn::new(1u8);
        a.insert("w", BTreeSet::new());
        a.insert("x", BTreeSet::new());

        // A replica of the same site that diverged after the first atom.
        let mut b = Yarn::new(1u8);
        b.insert("w", BTreeSet::new());
        b.insert("x", BTreeSet::new());
        b.insert("y", BTreeSet::new());

        a.merge(&b).unwrap();
        assert_eq!(a.len(), 3);
        let indices: Vec<u32> = a.iter().map(|atom| atom.id.1).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn remove_scrubs_dependencies() {
        let mut yarn = Yarn::new(1u8);
        let first = yarn.insert("a", BTreeSet::new());
        let second = yarn.insert("b", deps([first.clone()]));
        yarn.insert("c", deps([first.clone(), second.clone()]));

        yarn.remove(&first);
        assert_eq!(yarn.len(), 2);
        for atom in yarn.iter() {
            assert!(!atom.deps.contains(&first));
        }
        assert!(yarn.get(1).unwrap().deps.contains(&second));
    }

    #[test]
    fn graph_creates_yarns_on_demand() {
        let mut graph = CausalGraph::<&str, u8>::new();
        assert!(graph.yarn(&1).is_none());
        assert!(graph.yarn_mut(1).is_empty());
        assert_eq!(graph.site_count(), 1);

        let id = graph.insert(1, "op", BTreeSet::new());
        assert_eq!(id, (1, 0));
        assert_eq!(graph.yarn(&1).unwrap().len(), 1);
    }

    #[test]
    fn graph_merge_combines_shared_sites() {
        let mut g1 = CausalGraph::new();
        g1.insert(1u8, "a0", BTreeSet::new());
        g1.insert(1u8, "a1", BTreeSet::new());

        let mut g2 = CausalGraph::new();
        g2.insert(1u8, "a0", BTreeSet::new());

        g1.merge(&g2);
        assert_eq!(g1.yarn(&1).unwrap().len(), 2);
    }

    #[test]
    fn merge_keeps_single_side_yarns() {
        let mut g1 = CausalGraph::new();
        g1.insert(1u8, "only-in-g1", BTreeSet::new());

        let mut g2 = CausalGraph::new();
        g2.insert(2u8, "only-in-g2", BTreeSet::new());

        let mut left = g1.clone();
        left.merge(&g2);
        assert_eq!(left.site_count(), 2);
        assert_eq!(left.yarn(&1).unwrap().len(), 1);
        assert_eq!(left.yarn(&2).unwrap().len(), 1);

        let mut right = g2.clone();
        right.merge(&g1);
        assert_eq!(left, right);
    }

    #[test]
    fn graph_remove_scrubs_across_sites() {
        let mut graph = CausalGraph::new();
        let a0 = graph.insert(1u8, "a", BTreeSet::new());
        graph.insert(2u8, "b", deps([a0.clone()]));

        graph.remove(&a0);
        assert!(graph.yarn(&1).unwrap().is_empty());
        let b_atom = graph.yarn(&2).unwrap().get(0).unwrap();
        assert!(b_atom.deps.is_empty());
    }

    #[test]
    fn lattice_laws() {
        let mut a = CausalGraph::new();
        a.insert(1u8, "a", BTreeSet::new());
        let mut b = CausalGraph::new();
        b.insert(2u8, "b", BTreeSet::new());
        let mut c = CausalGraph::new();
        c.insert(1u8, "a", BTreeSet::new());
        c.insert(3u8, "c", BTreeSet::new());

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);
        let mut bc = b.clone();
        bc.merge(&c);
        let mut right = a.clone();
        right.merge(&bc);
        assert_eq!(left, right);

        let mut aa = a.clone();
        aa.merge(&a);
        assert_eq!(aa, a);
    }
}
