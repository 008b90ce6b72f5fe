//! Memoization Module
//!
//! Decorator-style wrappers that cache function results by argument key.

mod cached;
mod key;

pub use cached::{cached, cached_with, Cached, DefaultStore, FreshStore, Memoized};
pub use key::{make_key, CallKey, Kwargs};
