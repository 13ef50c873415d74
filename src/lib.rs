#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A key-value map layered over the probing table.
///
/// This module provides a `HashMap` that wraps the `HashTable`, supplies its
/// entry representation, and hashes keys with a configurable hasher builder.
#[cfg(feature = "foldhash")]
pub mod hash_map;

/// The linear-probing hash table and the entry contract it is generic over.
pub mod hash_table;

#[cfg(feature = "foldhash")]
pub use hash_map::HashMap;
pub use hash_table::Entry;
pub use hash_table::HashTable;
