//! fat-collections: tagged growable buffers, non-owning views, dynamic
//! arrays, and a hopscotch hash table, built in layers so each piece can
//! be reasoned about independently.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a compact family of contiguous-storage containers sharing one
//!   tagged allocation scheme and one growth engine.
//! - Layers:
//!   - `RawBuf`/`StackBuf` (in `tagged`): owned byte allocations carrying
//!     an allocation-class tag, element count, and a zeroed trailing
//!     sentinel byte; realloc-semantics resizing through a pluggable
//!     `Allocator`.
//!   - `View<T>`: borrowed windows over contiguous elements with checked
//!     sub-windowing, length-first ordering, and materialization into
//!     owned arrays.
//!   - `DynArray<T>`: growable array over a tagged buffer. Every size
//!     change funnels through one growth routine parameterized by
//!     length-following and exact-vs-amortized capacity; removal comes in
//!     order-preserving, exact-fit shrinking, and order-breaking
//!     tail-swap flavors.
//!   - `HopTable<T>`: hopscotch open-addressing hash set over two
//!     parallel `DynArray`s (element slots plus per-slot info words
//!     encoding occupancy and neighborhood membership), defaulting to the
//!     `fnv1a` hasher.
//!   - `BitMask`: auto-growing bitmask over `DynArray<usize>` blocks.
//!
//! Constraints
//! - Single-threaded containers; no atomics, no internal locking.
//! - Allocation failure is a value: fallible operations return
//!   `Result<_, AllocError>` (or `InsertError` at the table layer) and
//!   leave the container structurally intact on failure.
//! - Indices are asserted; out-of-bounds access panics instead of
//!   wrapping or truncating.
//! - Zero-sized element types are rejected at construction.
//!
//! Why this split?
//! - Localize invariants: buffer-level concerns (sentinel, tag, realloc
//!   semantics) never leak above `tagged`; element-move concerns stay in
//!   `dyn_array`; hashing policy stays in `hop_table`.
//! - Minimize unsafe: raw-pointer handling is isolated in `tagged` and
//!   the element-moving paths of `dyn_array`; `view`, `bitmask`, and most
//!   of `hop_table` work through safe slices.
//! - Clear failure boundaries: user code (Clone, Hash, Eq, Drop) only
//!   runs when the structure is consistent.
//!
//! Notes and non-goals
//! - `HopTable` stores elements, not key-value pairs; map behavior comes
//!   from storing pair types whose Hash/Eq project the key (see the
//!   `Borrow`-keyed lookup methods).
//! - FNV-1a is the default hash for speed and simplicity, not DoS
//!   resistance; any `BuildHasher` can be plugged in.
//! - Removal from the table deliberately leaves neighborhood bits stale
//!   until the next rehash; lookups re-check occupancy per probe.
//! - No thread-safe variants.

pub mod bitmask;
pub mod dyn_array;
pub mod fnv1a;
pub mod hop_table;
mod hop_table_proptest;
pub mod tagged;
pub mod view;

// Public surface
pub use bitmask::{BitMask, BitMaskParseError};
pub use dyn_array::DynArray;
pub use fnv1a::{fnv1a_hash, Fnv1aBuildHasher, Fnv1aHasher};
pub use hop_table::{HopConfig, HopTable, InsertError};
pub use tagged::{AllocError, Allocator, Global, RawBuf, StackBuf, Tag};
pub use view::View;
