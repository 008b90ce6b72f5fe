//! Lock Module
//!
//! Key-scoped locks: one mutual-exclusion primitive per distinct key, shared
//! by every caller presenting that key and reclaimed once unused.

mod async_keyed;
mod keyed;
mod registry;

pub use async_keyed::{AsyncKeyGuard, AsyncKeyLock};
pub use keyed::{KeyGuard, KeyLock};
