//! weak-ordered-map: a single-threaded ordered map whose keys are scalars
//! or weakly held objects, with an internal cursor that stays on its entry
//! while the map is mutated.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one engine whose insert/delete behaviour is chosen per instance
//!   by capability flags, built in layers so each invariant has one home.
//! - Layers:
//!   - KeyRef<O>: stored key. Scalars by value, objects as `Weak<O>` plus
//!     the allocation address; every stored key carries a generational
//!     `KeyId`.
//!   - EntryTable<V, O, S>: structural storage. Slot map of entries keyed
//!     by `KeyId`, a hash index over canonical key hashes, and an order
//!     vector. No capabilities, no cursor.
//!   - Cursor: position in insertion order plus the mark/restore pair
//!     that re-finds an entry by identity after a mutation.
//!   - OrderedMap<V, O>: public engine. Applies `associative`/`unique`,
//!     resolves keys, renumbers positional maps, runs copy-on-transform
//!     operations.
//!   - TypedMap<V, T, O>: wraps OrderedMap and checks every written or
//!     produced value against a `TypeDescriptor`.
//!
//! Constraints
//! - Single-threaded: `Rc`/`Weak` keys make the map `!Send`/`!Sync`.
//! - The map never keeps an object key alive. Once the object is dropped
//!   its entry is stale: the value stays reachable by position, but the
//!   key can never be handed out again (`Error::StaleKey`).
//! - Key ids are generational; an id of a removed entry never resolves,
//!   even after its slot is reused.
//! - Object keys compare by allocation identity. A stored `Weak` keeps the
//!   allocation reserved, so a new object can never alias a stale key.
//!
//! Capabilities
//! - `associative`: caller keys are kept. Without it every key is a
//!   position `0..n`, `set` ignores its key and appends, and any deletion
//!   that opens a gap renumbers the survivors by re-inserting them.
//! - `unique`: inserting a value already present (under the configured
//!   value equality) is a no-op reported as `Ok(false)`.
//!
//! Cursor policy
//! - Structural mutations capture the id under the cursor, mutate, then
//!   walk from the start until that id is found again. A removed entry
//!   leaves the cursor past-end; a cursor that was already past-end (or
//!   on an empty map) rewinds.
//! - Overwriting an existing key is not structural and leaves the cursor
//!   alone.
//! - `seek(n)` is zero-based.
//!
//! Notes and non-goals
//! - No thread safety and no garbage collection of stale entries beyond
//!   the explicit `purge_stale`.
//! - Serialization covers scalar keys only; an entry under an object key
//!   fails to serialize.
//! - Public API surface is `OrderedMap`, `TypedMap` and the key, config
//!   and error types; `EntryTable` is exposed only for benchmarks.

pub mod config;
mod cursor;
#[cfg(feature = "bench_internal")]
pub mod entry_table;
#[cfg(not(feature = "bench_internal"))]
mod entry_table;
pub mod error;
pub mod key;
mod ordered_map;
mod ordered_map_proptest;
mod serde_impls;
pub mod typed;
pub mod value;

// Public surface
pub use config::{Capabilities, Equality, MapConfig, DEFAULT_SEPARATOR};
pub use entry_table::Iter;
pub use error::{Error, Result};
pub use key::{Key, KeyId, KeyRef};
pub use ordered_map::OrderedMap;
pub use typed::{JsonType, Predicate, TypeDescriptor, TypedMap};
pub use value::{LooseEq, Nested, StringForm};
