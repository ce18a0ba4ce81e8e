use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

use crate::crdt::{Crdt, OpCrdt};
use crate::id::Id;

/// A single cell of the internal sequence.
///
/// Cells are never removed once integrated. A delete only clears the
/// `visible` flag, leaving a tombstone whose position keeps anchoring the
/// neighbours of in-flight operations. The `prev` and `next` identifiers
/// record the visible neighbours observed by the generating site; after
/// integration they are hints, not authoritative adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element<S, T> {
    /// Stable identifier, unique across all replicas.
    pub id: Id<S>,
    /// The user value; `None` only for the two sentinels.
    pub value: Option<T>,
    /// Cleared by a delete operation referencing this identifier.
    pub visible: bool,
    /// Identifier of the visible predecessor at generation time.
    pub prev: Id<S>,
    /// Identifier of the visible successor at generation time.
    pub next: Id<S>,
}

impl<S, T> Element<S, T> {
    fn start() -> Self {
        Element {
            id: Id::Start,
            value: None,
            visible: false,
            prev: Id::Start,
            next: Id::End,
        }
    }

    fn end() -> Self {
        Element {
            id: Id::End,
            value: None,
            visible: false,
            prev: Id::Start,
            next: Id::End,
        }
    }

    /// Whether this is one of the two sentinel cells.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.id.is_sentinel()
    }
}

/// Discriminant of an [`Op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    /// Places a new element into the sequence.
    Insert,
    /// Tombstones an existing element.
    Delete,
}

/// A replicable sequence operation.
///
/// Two operations are equal when their kind and element identifier match.
/// The visibility flag and payload carried inside the element do not
/// participate, so a re-delivered operation compares equal to the one
/// already applied regardless of local tombstone state.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op<S, T> {
    /// Place the carried element between its hinted neighbours.
    Insert(Element<S, T>),
    /// Tombstone the element with the carried identifier.
    Delete(Element<S, T>),
}

impl<S, T> Op<S, T> {
    /// The operation's discriminant.
    #[must_use]
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Insert(_) => OpKind::Insert,
            Op::Delete(_) => OpKind::Delete,
        }
    }

    /// The element payload.
    #[must_use]
    pub fn element(&self) -> &Element<S, T> {
        match self {
            Op::Insert(e) | Op::Delete(e) => e,
        }
    }
}

impl<S: PartialEq, T> PartialEq for Op<S, T> {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.element().id == other.element().id
    }
}

impl<S: Eq, T> Eq for Op<S, T> {}

/// Error from a local generate call on a [`WootSeq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WootError {
    /// No visible element exists at the requested index.
    IndexOutOfRange {
        /// The requested visible index.
        index: usize,
        /// The number of visible elements at the time of the call.
        len: usize,
    },
}

impl fmt::Display for WootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for sequence of length {len}")
            }
        }
    }
}

/// A replicated ordered sequence (WOOT).
///
/// Every replica owns a site identifier and a logical clock, and keeps the
/// full element list including tombstones. Local edits go through
/// [`insert`](WootSeq::insert) and [`delete`](WootSeq::delete), which
/// mutate the local state and return the operation to broadcast. Remote
/// operations arrive through [`apply_op`](OpCrdt::apply_op) (or
/// [`enqueue`](WootSeq::enqueue) plus [`apply_pending`](WootSeq::apply_pending));
/// operations whose prerequisites are still in flight are parked until
/// they become executable.
///
/// Concurrent inserts between the same pair of neighbours are ordered by
/// the identifier total order, so every replica resolves the ambiguity
/// identically and all replicas converge under any delivery order.
///
/// # Example
///
/// ```
/// use woot_kit::prelude::*;
///
/// let mut a = WootSeq::new(1u8);
/// let mut b = WootSeq::new(2u8);
///
/// let x = a.insert(0, 'x').unwrap();
/// let y = b.insert(0, 'y').unwrap();
///
/// // Deliver in opposite orders; both replicas agree.
/// a.apply_op(&y);
/// b.apply_op(&x);
///
/// assert_eq!(a.to_vec(), b.to_vec());
/// assert_eq!(a.to_vec(), vec!['x', 'y']);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WootSeq<S: Ord + Clone, T: Clone> {
    site: S,
    clock: u64,
    /// The internal list, sentinels included. Grows, never shrinks.
    elements: Vec<Element<S, T>>,
    /// Operations waiting for their prerequisites, in arrival order.
    pending: Vec<Op<S, T>>,
    /// Replay detection, keyed by operation kind and element identifier.
    integrated: BTreeSet<(OpKind, Id<S>)>,
}

impl<S: Ord + Clone, T: Clone> WootSeq<S, T> {
    /// Create an empty sequence owned by `site`.
    pub fn new(site: S) -> Self {
        let mut elements = Vec::with_capacity(2);
        elements.push(Element::start());
        elements.push(Element::end());
        WootSeq {
            site,
            clock: 0,
            elements,
            pending: Vec::new(),
            integrated: BTreeSet::new(),
        }
    }

    /// The owning replica's site identifier.
    #[must_use]
    pub fn site(&self) -> &S {
        &self.site
    }

    /// The logical clock. Advances only on local generates.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.iter().filter(|e| e.visible).count()
    }

    /// Whether no elements are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tombstoned (deleted but retained) elements.
    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| !e.visible && !e.is_sentinel())
            .count()
    }

    /// Number of operations parked while their prerequisites are in flight.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Reference to the visible value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.visible_at(index).and_then(|e| e.value.as_ref())
    }

    /// Iterate over visible values in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements
            .iter()
            .filter(|e| e.visible)
            .filter_map(|e| e.value.as_ref())
    }

    /// Clone the visible values into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Insert `value` at visible `index`, returning the operation to
    /// broadcast to other replicas.
    ///
    /// `index` may be at most [`len`](WootSeq::len) (append).
    pub fn insert(&mut self, index: usize, value: T) -> Result<Op<S, T>, WootError> {
        let prev = match index.checked_sub(1) {
            None => Id::Start,
            Some(i) => match self.visible_at(i) {
                Some(e) => e.id.clone(),
                None => {
                    return Err(WootError::IndexOutOfRange {
                        index,
                        len: self.len(),
                    })
                }
            },
        };
        let next = match self.visible_at(index) {
            Some(e) => e.id.clone(),
            None => Id::End,
        };

        self.clock += 1;
        let elem = Element {
            id: Id::element(self.site.clone(), self.clock),
            value: Some(value),
            visible: true,
            prev,
            next,
        };
        self.integrate_insert(elem.clone());
        Ok(Op::Insert(elem))
    }

    /// Tombstone the visible element at `index`, returning the operation to
    /// broadcast to other replicas.
    pub fn delete(&mut self, index: usize) -> Result<Op<S, T>, WootError> {
        let elem = match self.visible_at(index) {
            Some(e) => e.clone(),
            None => {
                return Err(WootError::IndexOutOfRange {
                    index,
                    len: self.len(),
                })
            }
        };
        self.integrate_delete(&elem);
        Ok(Op::Delete(elem))
    }

    /// Queue a remote operation for integration.
    ///
    /// The queue is pre-filtered: an insert whose element is already in the
    /// sequence is dropped, as is any operation already queued. Replay of
    /// an integrated operation is still caught later by the drain.
    pub fn enqueue(&mut self, op: Op<S, T>) {
        if let Op::Insert(e) = &op {
            if self.position_of(&e.id).is_some() {
                return;
            }
        }
        if self.pending.contains(&op) {
            return;
        }
        self.pending.push(op);
    }

    /// Integrate queued operations until the queue is empty or blocked on
    /// missing prerequisites. Returns the number of operations applied.
    ///
    /// When the head of the queue is not executable, the queue is reordered
    /// so executable operations come first (stable among themselves). A
    /// drain that pops an already-integrated operation stops there; the
    /// next call picks the queue up again.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            if self.pending.is_empty() {
                return applied;
            }
            if !self.is_executable(&self.pending[0]) {
                self.executable_first();
                if !self.is_executable(&self.pending[0]) {
                    return applied;
                }
            }
            let op = self.pending.remove(0);
            if self.integrated.contains(&(op.kind(), op.element().id.clone())) {
                return applied;
            }
            match op {
                Op::Insert(e) => self.integrate_insert(e),
                Op::Delete(e) => self.integrate_delete(&e),
            }
            applied += 1;
        }
    }

    /// Whether `op` can be integrated against the current sequence: an
    /// insert needs both neighbour hints present, a delete needs its
    /// target present. Sentinels are always present.
    #[must_use]
    pub fn is_executable(&self, op: &Op<S, T>) -> bool {
        match op {
            Op::Insert(e) => {
                self.position_of(&e.prev).is_some() && self.position_of(&e.next).is_some()
            }
            Op::Delete(e) => self.position_of(&e.id).is_some(),
        }
    }

    // ---- internal helpers ----

    /// The `index`-th element with `visible = true`.
    fn visible_at(&self, index: usize) -> Option<&Element<S, T>> {
        self.elements.iter().filter(|e| e.visible).nth(index)
    }

    /// Position of `id` in the internal list.
    fn position_of(&self, id: &Id<S>) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    /// Stable reorder of the pending queue: executable operations first,
    /// arrival order preserved within each group.
    fn executable_first(&mut self) {
        let ops = core::mem::take(&mut self.pending);
        let (mut executable, blocked): (Vec<_>, Vec<_>) =
            ops.into_iter().partition(|op| self.is_executable(op));
        executable.extend(blocked);
        self.pending = executable;
    }

    /// Place `elem` between its hinted neighbours.
    ///
    /// When other elements already sit strictly between the hints, the
    /// bracket narrows: concurrent siblings are ordered purely by the
    /// identifier total order, which every replica evaluates identically.
    /// Callers must have established executability; both hints must be
    /// present in the sequence.
    fn integrate_insert(&mut self, elem: Element<S, T>) {
        let mut prev = elem.prev.clone();
        let mut next = elem.next.clone();
        loop {
            let (p, n) = match (self.position_of(&prev), self.position_of(&next)) {
                (Some(p), Some(n)) => (p, n),
                _ => panic!("integration hints missing from the sequence"),
            };
            if n == p + 1 {
                self.integrated.insert((OpKind::Insert, elem.id.clone()));
                self.elements.insert(n, elem);
                return;
            }
            let mut k = p + 1;
            while k < n && self.elements[k].id < elem.id {
                k += 1;
            }
            prev = self.elements[k - 1].id.clone();
            next = self.elements[k].id.clone();
        }
    }

    /// Tombstone the element carrying the same identifier as `elem`. The
    /// visibility flag that travelled with the operation is ignored; only
    /// the identifier matters.
    fn integrate_delete(&mut self, elem: &Element<S, T>) {
        if let Some(pos) = self.position_of(&elem.id) {
            self.elements[pos].visible = false;
            self.integrated.insert((OpKind::Delete, elem.id.clone()));
        }
    }
}

impl<S: Ord + Clone, T: Clone> OpCrdt for WootSeq<S, T> {
    type Op = Op<S, T>;

    fn apply_op(&mut self, op: &Op<S, T>) {
        self.enqueue(op.clone());
        self.apply_pending();
    }
}

impl<S: Ord + Clone, T: Clone> Crdt for WootSeq<S, T> {
    /// State merge built on op replay: every element and queued operation
    /// of `other` is re-delivered through the normal enqueue/drain path.
    /// Stale already-integrated entries, whether parked earlier by the
    /// transport or carried by `other`, are flushed before draining so
    /// the drain's stop-on-replay rule cannot stall the merge.
    fn merge(&mut self, other: &Self) {
        // A redelivered op may still sit in the queue even though its
        // original was integrated long ago; popping one stops a drain.
        self.pending
            .retain(|op| !self.integrated.contains(&(op.kind(), op.element().id.clone())));
        for elem in &other.elements {
            if elem.is_sentinel() {
                continue;
            }
            if !self
                .integrated
                .contains(&(OpKind::Insert, elem.id.clone()))
            {
                let mut insert = elem.clone();
                insert.visible = true;
                self.enqueue(Op::Insert(insert));
            }
            if !elem.visible
                && !self
                    .integrated
                    .contains(&(OpKind::Delete, elem.id.clone()))
            {
                self.enqueue(Op::Delete(elem.clone()));
            }
        }
        for op in &other.pending {
            if !self
                .integrated
                .contains(&(op.kind(), op.element().id.clone()))
            {
                self.enqueue(op.clone());
            }
        }
        // Drain on queue state, not on the applied count: a drain that
        // only discarded a replayed op reports zero applied but has
        // still made progress.
        loop {
            let remaining = self.pending.len();
            self.apply_pending();
            if self.pending.len() == remaining {
                break;
            }
        }
    }
}
