//! Convenient re-exports for common usage.
//!
//! ```
//! use woot_kit::prelude::*;
//! ```

pub use crate::CausalGraph;
pub use crate::Crdt;
pub use crate::GSet;
pub use crate::Id;
pub use crate::McSet;
pub use crate::Op;
pub use crate::OpCrdt;
pub use crate::PnSet;
pub use crate::WootSeq;
pub use crate::Yarn;
