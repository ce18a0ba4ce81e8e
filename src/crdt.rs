/// The merge contract shared by every replicated type in this crate.
///
/// Replicas of a CRDT (Conflict-free Replicated Data Type) may be
/// mutated independently and reconciled later by folding one state into
/// the other. No update is lost and no coordination is required, because
/// `merge` computes a least upper bound: the result subsumes everything
/// either replica had seen.
///
/// # Laws
///
/// For convergence, `merge` must be a join:
/// - **commutative** - merging `a` into `b` or `b` into `a` gives equal states
/// - **associative** - how successive merges are grouped does not matter
/// - **idempotent** - merging a state it has already absorbed changes nothing
pub trait Crdt {
    /// Fold another replica's state into this one.
    ///
    /// Afterwards `self` is the least upper bound of the two states.
    fn merge(&mut self, other: &Self);
}

/// A CRDT that can express its mutations as discrete operations.
///
/// Unlike state-based replication (which merges full state), op-based
/// replication ships individual operations: a replica mutates locally,
/// emits the operation, and every other replica applies it. For
/// convergence, `apply_op` must be commutative across concurrent
/// operations and idempotent under re-delivery.
///
/// # Example
///
/// ```
/// use woot_kit::prelude::*;
///
/// let mut local = WootSeq::new(1u8);
/// let mut remote = WootSeq::new(2u8);
///
/// let op = local.insert(0, 'a').unwrap();
/// remote.apply_op(&op);
///
/// assert_eq!(local.to_vec(), remote.to_vec());
/// ```
pub trait OpCrdt {
    /// The operation type this CRDT produces and consumes.
    ///
    /// Operations must be self-describing enough to apply on any replica,
    /// regardless of that replica's local state.
    type Op;

    /// Apply an operation, local or remote, to the current state.
    ///
    /// Applying an operation whose causal prerequisites have not arrived
    /// yet must not corrupt state; implementations defer such operations
    /// until they become applicable.
    fn apply_op(&mut self, op: &Self::Op);
}
