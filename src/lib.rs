//! # woot-kit
//!
//! CRDTs for peer-to-peer collaboration without central coordination.
//!
//! A CRDT (Conflict-free Replicated Data Type) is a data structure that can be
//! replicated across multiple devices and updated independently. When replicas
//! exchange state or operations, they are guaranteed to converge to the same
//! result without coordination, consensus, or operational transformation.
//!
//! The centrepiece is [`WootSeq`], a WOOT linear sequence: a replicated
//! ordered list whose insert and delete operations commute, tolerate
//! re-delivery, and may arrive in any order. Deleted elements stay in the
//! internal list as invisible tombstones so that the positions referenced
//! by in-flight operations stay anchored, and concurrent inserts between
//! the same neighbours are ordered by a total order over stable
//! identifiers, so every replica breaks the tie the same way.
//!
//! ## `no_std` Support
//!
//! This crate supports `no_std` environments with the `alloc` crate.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! woot-kit = { version = "0.1", default-features = false }
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use woot_kit::prelude::*;
//!
//! let mut alice = WootSeq::new("alice");
//! let mut bob = WootSeq::new("bob");
//!
//! // Each site edits locally and broadcasts the returned operation.
//! let hi = alice.insert(0, "hi").unwrap();
//! let yo = bob.insert(0, "yo").unwrap();
//!
//! // Operations cross on the wire; both replicas converge anyway.
//! alice.apply_op(&yo);
//! bob.apply_op(&hi);
//! assert_eq!(alice.to_vec(), bob.to_vec());
//! ```
//!
//! ## Available CRDTs
//!
//! ### Sequences
//! - [`WootSeq`] - WOOT replicated ordered list (op-based, tombstoned)
//!
//! ### Sets
//! - [`GSet`] - Grow-only set (add only)
//! - [`PnSet`] - Positive-negative set (add and remove, remove is permanent)
//! - [`McSet`] - Max-change set (add and remove freely; the busier replica wins)
//!
//! ### Histories
//! - [`CausalGraph`] - Per-site append-only operation logs ("yarns") with
//!   explicit dependency sets
//!
//! ## The `Crdt` and `OpCrdt` Traits
//!
//! All types implement the [`Crdt`] trait, which provides the [`Crdt::merge`]
//! method; merge is guaranteed to be commutative, associative, and idempotent.
//! [`WootSeq`] additionally implements [`OpCrdt`] for operation-based
//! delivery: remote operations enter through [`OpCrdt::apply_op`] and are
//! parked until their causal prerequisites have arrived.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod causal;
mod crdt;
mod gset;
mod id;
mod mcset;
mod pnset;
mod woot;

pub mod prelude;

pub use causal::{Atom, AtomId, CausalGraph, Yarn, YarnError};
pub use crdt::{Crdt, OpCrdt};
pub use gset::GSet;
pub use id::Id;
pub use mcset::McSet;
pub use pnset::PnSet;
pub use woot::{Element, Op, OpKind, WootError, WootSeq};
