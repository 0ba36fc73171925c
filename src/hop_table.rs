//! Hopscotch open-addressing hash set.
//!
//! Storage is two parallel arrays over tagged buffers: a slot array of
//! element storage and an `entry_infos` word per slot. Bit 31 of a slot's
//! word says whether that slot holds a live element; the low
//! `neighborhood` bits of a *home* slot's word say which of its
//! neighborhood positions (`home + i`, wrapping) hold elements that hash
//! home to it. Lookups therefore touch only the home word plus its set
//! bits, never a full probe chain.
//!
//! When an insert finds its whole neighborhood occupied, the table doubles
//! and rehashes and tries again, up to a configured retry budget; a table
//! that still cannot place the element reports `Overloaded` rather than
//! looping.
//!
//! Removal clears only the occupancy bit. The home slot's neighborhood
//! bit for the vacated position goes stale and stays set until the next
//! rehash; lookups tolerate this by re-checking occupancy per probe.
//! Eager clearing would also be correct, but it costs a second hash per
//! removal, so the stale-until-rehash behavior is deliberate.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem::{self, MaybeUninit};
use core::ptr;

use crate::dyn_array::DynArray;
use crate::fnv1a::Fnv1aBuildHasher;
use crate::tagged::{AllocError, Allocator, Global, Tag};
use crate::view::View;

/// Occupancy flag in an `entry_infos` word; bits below it are
/// neighborhood membership bits.
const OCCUPIED_BIT: usize = 1 << 31;

/// Neighborhood bits must stay below the occupancy flag.
pub const MAX_NEIGHBORHOOD: usize = 31;

/// Tuning knobs for a `HopTable`.
#[derive(Clone, Debug)]
pub struct HopConfig<S = Fnv1aBuildHasher> {
    /// Hash state factory for elements and lookup keys.
    pub hasher: S,
    /// Initial slot count.
    pub base_size: usize,
    /// Probe window per home slot, in slots; at most `MAX_NEIGHBORHOOD`.
    pub neighborhood: usize,
    /// How many double-and-rehash attempts a single insert may trigger
    /// before giving up with `Overloaded`.
    pub max_fail_retries: usize,
}

impl Default for HopConfig<Fnv1aBuildHasher> {
    fn default() -> Self {
        Self::with_hasher(Fnv1aBuildHasher)
    }
}

impl<S> HopConfig<S> {
    /// Default sizing with a caller-supplied hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            base_size: 8,
            neighborhood: 8,
            max_fail_retries: 8,
        }
    }
}

/// Insertion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The retry budget ran out with the neighborhood still full; the
    /// key distribution defeats the hash at every attempted size.
    Overloaded,
    Alloc(AllocError),
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::Overloaded => f.write_str("hash table overloaded"),
            InsertError::Alloc(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for InsertError {}

impl From<AllocError> for InsertError {
    fn from(e: AllocError) -> Self {
        InsertError::Alloc(e)
    }
}

/// Slot storage; liveness is tracked by the parallel info word, so the
/// array layer never drops through it.
struct Slot<T>(MaybeUninit<T>);

impl<T> Slot<T> {
    fn empty() -> Self {
        Slot(MaybeUninit::uninit())
    }
}

/// Hopscotch hash set of `T`.
pub struct HopTable<T, S = Fnv1aBuildHasher, A: Allocator = Global> {
    slots: DynArray<Slot<T>, A>,
    entry_infos: DynArray<usize, A>,
    config: HopConfig<S>,
}

impl<T: Hash + Eq> HopTable<T> {
    /// Table with default configuration (FNV-1a, 8 slots, neighborhood 8).
    pub fn new() -> Result<Self, AllocError> {
        Self::with_config(HopConfig::default())
    }

    /// Table populated with clones of the viewed elements; duplicates
    /// collapse to the last occurrence.
    pub fn from_view(view: View<'_, T>) -> Result<Self, InsertError>
    where
        T: Clone,
    {
        Self::from_view_with_config(view, HopConfig::default())
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher> HopTable<T, S> {
    pub fn from_view_with_config(
        view: View<'_, T>,
        config: HopConfig<S>,
    ) -> Result<Self, InsertError> {
        let mut table = Self::with_config(config)?;
        for item in view.iter() {
            table.insert(item.clone())?;
        }
        Ok(table)
    }
}

impl<T: Hash + Eq, S: BuildHasher> HopTable<T, S> {
    pub fn with_config(config: HopConfig<S>) -> Result<Self, AllocError> {
        Self::with_config_in(config, Global)
    }
}

impl<T: Hash + Eq, S: BuildHasher, A: Allocator> HopTable<T, S, A> {
    pub fn with_config_in(config: HopConfig<S>, alloc: A) -> Result<Self, AllocError>
    where
        A: Clone,
    {
        assert!(config.base_size >= 1, "base_size must be at least 1");
        assert!(
            (1..=MAX_NEIGHBORHOOD).contains(&config.neighborhood),
            "neighborhood must be in 1..={}",
            MAX_NEIGHBORHOOD
        );
        let mut slots = DynArray::with_tag_in(Tag::HashTable, alloc.clone());
        slots.resize_with(config.base_size, Slot::empty)?;
        let mut entry_infos = DynArray::with_tag_in(Tag::HashTable, alloc);
        entry_infos.resize(config.base_size, 0)?;
        Ok(Self {
            slots,
            entry_infos,
            config,
        })
    }

    pub fn config(&self) -> &HopConfig<S> {
        &self.config
    }

    /// Total slots, occupied or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live elements. O(slots): liveness is scanned, not
    /// counted incrementally.
    pub fn occupied_len(&self) -> usize {
        self.entry_infos
            .iter()
            .filter(|&&w| w & OCCUPIED_BIT != 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_infos.iter().all(|&w| w & OCCUPIED_BIT == 0)
    }

    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.config.hasher.hash_one(key)
    }

    fn home_index(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    fn occupied(&self, pos: usize) -> bool {
        self.entry_infos[pos] & OCCUPIED_BIT != 0
    }

    /// Slot index of `key`, if present. Scans only the home slot's set
    /// neighborhood bits; stale bits are filtered by the occupancy
    /// re-check.
    pub fn find_position<Q>(&self, key: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let n = self.slots.len();
        let home = self.home_index(self.hash_of(key));
        let info = self.entry_infos[home];
        for i in 0..self.config.neighborhood {
            if info & (1 << i) == 0 {
                continue;
            }
            let probe = (home + i) % n;
            if !self.occupied(probe) {
                continue;
            }
            let stored = unsafe { self.slots[probe].0.assume_init_ref() };
            if stored.borrow() == key {
                return Some(probe);
            }
        }
        None
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_position(key).is_some()
    }

    pub fn find<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.find_position(key)?;
        Some(unsafe { self.slots[pos].0.assume_init_ref() })
    }

    /// Mutable access to the stored element equal to `key`. Mutations
    /// must not change the element's hash or equality class.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.find_position(key)?;
        Some(unsafe { self.slots[pos].0.assume_init_mut() })
    }

    /// Insert `value`, replacing (and dropping) any equal element in
    /// place. Returns the slot index. May double the table; `Overloaded`
    /// means the retry budget ran out.
    pub fn insert(&mut self, value: T) -> Result<usize, InsertError> {
        if let Some(pos) = self.find_position(&value) {
            // The slot reads as vacant while the old element drops; a
            // panicking Drop leaves a gap, never a doubly-live slot.
            self.entry_infos[pos] &= !OCCUPIED_BIT;
            unsafe { self.slots[pos].0.assume_init_drop() };
            self.slots[pos].0.write(value);
            self.entry_infos[pos] |= OCCUPIED_BIT;
            return Ok(pos);
        }
        self.insert_inner(value, 0)
    }

    /// Insert without the duplicate probe. The caller vouches that no
    /// equal element is present; violating that leaves two equal
    /// elements and makes find/remove results arbitrary between them.
    pub fn insert_unique(&mut self, value: T) -> Result<usize, InsertError> {
        self.insert_inner(value, 0)
    }

    fn insert_inner(&mut self, value: T, failures: usize) -> Result<usize, InsertError> {
        let n = self.slots.len();
        let home = self.home_index(self.hash_of(&value));
        for i in 0..self.config.neighborhood {
            let probe = (home + i) % n;
            if self.occupied(probe) {
                continue;
            }
            self.slots[probe].0.write(value);
            self.entry_infos[home] |= 1 << i;
            self.entry_infos[probe] |= OCCUPIED_BIT;
            return Ok(probe);
        }
        if failures >= self.config.max_fail_retries {
            return Err(InsertError::Overloaded);
        }
        self.double_and_rehash_inner(failures + 1)?;
        self.insert_inner(value, failures + 1)
    }

    /// Remove and return the element equal to `key`. Clears only the
    /// occupancy bit; the home slot's neighborhood bit stays stale until
    /// the next rehash.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.find_position(key)?;
        let value = unsafe { self.slots[pos].0.assume_init_read() };
        self.entry_infos[pos] &= !OCCUPIED_BIT;
        Some(value)
    }

    /// Re-place every live element against the current slot count and
    /// rebuild all info words, shedding stale neighborhood bits. May
    /// itself double the table when an element no longer fits its
    /// neighborhood.
    pub fn rehash(&mut self) -> Result<(), InsertError> {
        self.rehash_inner(0)
    }

    fn rehash_inner(&mut self, failures: usize) -> Result<(), InsertError> {
        let n = self.slots.len();
        if self.entry_infos.len() < n {
            self.entry_infos.resize(n, 0)?;
        }
        // Doubling mid-walk grows the table under us; the bound stays at
        // the original n and re-reads each info word, so entries the
        // nested rehash already re-placed are simply placed again.
        for i in 0..n {
            let info = self.entry_infos[i];
            self.entry_infos[i] = 0;
            if info & OCCUPIED_BIT == 0 {
                continue;
            }
            let value = unsafe { self.slots[i].0.assume_init_read() };
            self.insert_inner(value, failures)?;
        }
        Ok(())
    }

    /// Double the slot count and rehash. Elements at odd index `i` move
    /// to `2n - i` first so the rebuild starts from a spread-out layout.
    pub fn double_and_rehash(&mut self) -> Result<(), InsertError> {
        self.double_and_rehash_inner(0)
    }

    fn double_and_rehash_inner(&mut self, failures: usize) -> Result<(), InsertError> {
        let n = self.slots.len();
        let new_n = n.checked_mul(2).ok_or(AllocError)?;
        self.slots.resize_with(new_n, Slot::empty)?;
        self.entry_infos.resize(new_n, 0)?;
        for i in (1..n).step_by(2) {
            let j = new_n - i;
            unsafe {
                // Bitwise relocation; liveness travels with the info swap.
                let p = self.slots.as_mut_ptr();
                ptr::copy_nonoverlapping(p.add(i), p.add(j), 1);
            }
            self.entry_infos.swap(i, j);
        }
        self.rehash_inner(failures)
    }

    /// Lowest slot index holding a live element.
    pub fn first_occupied_position(&self) -> Option<usize> {
        self.entry_infos.iter().position(|&w| w & OCCUPIED_BIT != 0)
    }

    /// Highest slot index holding a live element.
    pub fn last_occupied_position(&self) -> Option<usize> {
        self.entry_infos.iter().rposition(|&w| w & OCCUPIED_BIT != 0)
    }

    /// The element in the lowest occupied slot.
    pub fn first_occupied(&self) -> Option<&T> {
        let pos = self.first_occupied_position()?;
        Some(unsafe { self.slots[pos].0.assume_init_ref() })
    }

    /// The element in the highest occupied slot.
    pub fn last_occupied(&self) -> Option<&T> {
        let pos = self.last_occupied_position()?;
        Some(unsafe { self.slots[pos].0.assume_init_ref() })
    }

    /// Iterate live elements in slot order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            infos: &self.entry_infos,
            pos: 0,
        }
    }

    /// Drop every live element and zero all info words. Slot count is
    /// kept.
    pub fn clear(&mut self) {
        for i in 0..self.slots.len() {
            // Each info word zeroes before its destructor runs; a
            // panicking Drop leaves the slot vacant, never re-droppable.
            let info = self.entry_infos[i];
            self.entry_infos[i] = 0;
            if info & OCCUPIED_BIT != 0 {
                unsafe { self.slots[i].0.assume_init_drop() };
            }
        }
    }
}

impl<T, S, A: Allocator> Drop for HopTable<T, S, A> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }
        for i in 0..self.slots.len() {
            if self.entry_infos[i] & OCCUPIED_BIT != 0 {
                unsafe { self.slots[i].0.assume_init_drop() };
            }
        }
    }
}

impl<T: fmt::Debug + Hash + Eq, S: BuildHasher, A: Allocator> fmt::Debug for HopTable<T, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T: Hash + Eq, S: BuildHasher, A: Allocator> IntoIterator for &'a HopTable<T, S, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a table's live elements in slot order.
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    infos: &'a [usize],
    pos: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while self.pos < self.slots.len() {
            let i = self.pos;
            self.pos += 1;
            if self.infos[i] & OCCUPIED_BIT != 0 {
                return Some(unsafe { self.slots[i].0.assume_init_ref() });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    /// Keyed drop counter; the flagged instance panics out of its
    /// destructor.
    struct FragileEntry {
        key: u32,
        drops: Rc<Cell<usize>>,
        explode: bool,
    }

    impl FragileEntry {
        fn new(key: u32, drops: &Rc<Cell<usize>>, explode: bool) -> Self {
            FragileEntry {
                key,
                drops: drops.clone(),
                explode,
            }
        }
    }

    impl PartialEq for FragileEntry {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }
    impl Eq for FragileEntry {}
    impl Hash for FragileEntry {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.key.hash(state);
        }
    }
    impl Borrow<u32> for FragileEntry {
        fn borrow(&self) -> &u32 {
            &self.key
        }
    }
    impl Drop for FragileEntry {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
            if self.explode {
                panic!("element destructor failed");
            }
        }
    }

    /// Hashes and compares by the first field only; the second is
    /// payload.
    #[derive(Clone, Debug)]
    struct Pair(u32, u32);
    impl PartialEq for Pair {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }
    impl Eq for Pair {}
    impl Hash for Pair {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.0.hash(state);
        }
    }

    #[test]
    fn insert_find_remove_round() {
        let mut t: HopTable<u64> = HopTable::new().unwrap();
        assert!(t.is_empty());
        for v in 0..20u64 {
            t.insert(v).unwrap();
        }
        assert_eq!(t.occupied_len(), 20);
        for v in 0..20u64 {
            assert!(t.contains(&v), "missing {}", v);
        }
        assert!(!t.contains(&99));

        assert_eq!(t.remove(&7), Some(7));
        assert_eq!(t.remove(&7), None);
        assert_eq!(t.occupied_len(), 19);
        for v in (0..20u64).filter(|&v| v != 7) {
            assert!(t.contains(&v), "lost {} after removal", v);
        }
    }

    /// Invariant: inserting an equal element replaces in place and keeps
    /// the element count.
    #[test]
    fn duplicate_insert_replaces() {
        let mut t: HopTable<Pair> = HopTable::new().unwrap();
        let first = t.insert(Pair(1, 10)).unwrap();
        let second = t.insert(Pair(1, 20)).unwrap();
        assert_eq!(first, second);
        assert_eq!(t.occupied_len(), 1);
        assert_eq!(t.find(&Pair(1, 0)).map(|p| p.1), Some(20));
    }

    /// Invariant: find_mut edits payload in place without moving the
    /// element; insert_unique skips the duplicate probe.
    #[test]
    fn find_mut_edits_in_place() {
        let mut t: HopTable<Pair> = HopTable::new().unwrap();
        let pos = t.insert_unique(Pair(5, 1)).unwrap();
        if let Some(p) = t.find_mut(&Pair(5, 0)) {
            p.1 = 9;
        }
        assert_eq!(t.find_position(&Pair(5, 0)), Some(pos));
        assert_eq!(t.find(&Pair(5, 0)).map(|p| p.1), Some(9));
        assert_eq!(t.first_occupied().map(|p| p.0), Some(5));
        assert_eq!(t.last_occupied().map(|p| p.0), Some(5));
    }

    /// Invariant: growth keeps every element reachable.
    #[test]
    fn grows_past_base_size() {
        let mut config = HopConfig::default();
        config.base_size = 2;
        let mut t: HopTable<u64> = HopTable::with_config(config).unwrap();
        for v in 0..200u64 {
            t.insert(v).unwrap();
        }
        assert!(t.slot_count() > 2);
        assert_eq!(t.occupied_len(), 200);
        for v in 0..200u64 {
            assert!(t.contains(&v), "missing {}", v);
        }
    }

    /// Invariant: removal leaves the home slot's neighborhood bit stale;
    /// lookups of other elements still succeed and a rehash sheds it.
    #[test]
    fn stale_bits_tolerated_and_shed() {
        let mut t: HopTable<u64> = HopTable::new().unwrap();
        for v in 0..6u64 {
            t.insert(v).unwrap();
        }
        t.remove(&3);
        for v in [0u64, 1, 2, 4, 5] {
            assert!(t.contains(&v));
        }
        t.rehash().unwrap();
        assert_eq!(t.occupied_len(), 5);
        for v in [0u64, 1, 2, 4, 5] {
            assert!(t.contains(&v));
        }
        assert!(!t.contains(&3));
    }

    /// Invariant: a full rehash at the same size is observationally a
    /// no-op.
    #[test]
    fn rehash_preserves_contents() {
        let mut t: HopTable<u64> = HopTable::new().unwrap();
        for v in 0..50u64 {
            t.insert(v).unwrap();
        }
        let before = t.occupied_len();
        t.rehash().unwrap();
        assert_eq!(t.occupied_len(), before);
        for v in 0..50u64 {
            assert!(t.contains(&v));
        }
    }

    /// Invariant: explicit doubling doubles the slot count and keeps the
    /// contents.
    #[test]
    fn explicit_double() {
        let mut t: HopTable<u64> = HopTable::new().unwrap();
        for v in 0..5u64 {
            t.insert(v).unwrap();
        }
        let n = t.slot_count();
        t.double_and_rehash().unwrap();
        assert_eq!(t.slot_count(), n * 2);
        assert_eq!(t.occupied_len(), 5);
        for v in 0..5u64 {
            assert!(t.contains(&v));
        }
    }

    /// A hasher that sends every key to the same bucket: with a
    /// one-slot neighborhood the second distinct key can never be
    /// placed, at any size.
    #[derive(Clone, Default)]
    struct Colliding;
    impl BuildHasher for Colliding {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> ConstHasher {
            ConstHasher
        }
    }
    struct ConstHasher;
    impl Hasher for ConstHasher {
        fn finish(&self) -> u64 {
            0
        }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    /// Invariant: a defeated neighborhood exhausts the retry budget and
    /// reports Overloaded instead of looping.
    #[test]
    fn overload_reports_instead_of_spinning() {
        let mut config = HopConfig::with_hasher(Colliding);
        config.neighborhood = 1;
        config.max_fail_retries = 3;
        let mut t: HopTable<u64, Colliding> = HopTable::with_config(config).unwrap();
        t.insert(1).unwrap();
        assert_eq!(t.insert(2), Err(InsertError::Overloaded));
        // The first element is still there.
        assert!(t.contains(&1));
    }

    /// Invariant: borrowed-key lookups hash equal to the owned form.
    #[test]
    fn borrowed_key_lookup() {
        let mut t: HopTable<String> = HopTable::new().unwrap();
        t.insert("alpha".to_string()).unwrap();
        t.insert("beta".to_string()).unwrap();
        assert!(t.contains("alpha"));
        assert_eq!(t.find("beta").map(String::as_str), Some("beta"));
        assert_eq!(t.remove("alpha"), Some("alpha".to_string()));
        assert!(!t.contains("alpha"));
    }

    #[test]
    fn iter_visits_each_once() {
        let mut t: HopTable<u64> = HopTable::new().unwrap();
        for v in 0..30u64 {
            t.insert(v).unwrap();
        }
        let mut seen: Vec<u64> = t.iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..30u64).collect::<Vec<_>>());
    }

    #[test]
    fn first_and_last_occupied() {
        let mut t: HopTable<u64> = HopTable::new().unwrap();
        assert_eq!(t.first_occupied_position(), None);
        assert_eq!(t.last_occupied_position(), None);
        t.insert(1).unwrap();
        let first = t.first_occupied_position().unwrap();
        assert_eq!(t.last_occupied_position(), Some(first));
        t.insert(2).unwrap();
        assert!(t.first_occupied_position().unwrap() <= t.last_occupied_position().unwrap());
    }

    /// Invariant: clear and drop run element destructors exactly once.
    #[test]
    fn destructors_run_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        #[derive(Clone)]
        struct Counted(u32, Rc<Cell<usize>>);
        impl PartialEq for Counted {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for Counted {}
        impl Hash for Counted {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }
        impl Drop for Counted {
            fn drop(&mut self) {
                self.1.set(self.1.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        {
            let mut t: HopTable<Counted> = HopTable::new().unwrap();
            for i in 0..4 {
                t.insert(Counted(i, drops.clone())).unwrap();
            }
            // Replacement drops the old element.
            t.insert(Counted(0, drops.clone())).unwrap();
            assert_eq!(drops.get(), 1);
            drop(t.remove(&Counted(1, drops.clone())));
        }
        // removal key temp + removed value + three left in the table
        assert_eq!(drops.get(), 6);
    }

    /// Invariant: when the displaced element's destructor panics during
    /// a replacing insert, the slot is vacated; the table neither
    /// re-drops it nor reports the dead value as present.
    #[test]
    fn replace_with_panicking_drop_vacates_slot() {
        let drops = Rc::new(Cell::new(0));
        let mut t: HopTable<FragileEntry> = HopTable::new().unwrap();
        t.insert(FragileEntry::new(1, &drops, true)).unwrap();
        t.insert(FragileEntry::new(2, &drops, false)).unwrap();
        let unwound = catch_unwind(AssertUnwindSafe(|| {
            let _ = t.insert(FragileEntry::new(1, &drops, false));
        }));
        assert!(unwound.is_err());
        // The old element dropped once; the incoming value dropped on
        // the way out of the unwound insert.
        assert_eq!(drops.get(), 2);
        assert!(!t.contains(&1u32));
        assert!(t.contains(&2u32));
        drop(t);
        assert_eq!(drops.get(), 3);
    }

    /// Invariant: a destructor that panics mid-clear leaves every other
    /// slot consistent; across clear and drop each element drops exactly
    /// once.
    #[test]
    fn clear_with_panicking_drop_never_double_drops() {
        let drops = Rc::new(Cell::new(0));
        let mut t: HopTable<FragileEntry> = HopTable::new().unwrap();
        for k in 0..4 {
            t.insert(FragileEntry::new(k, &drops, k == 1)).unwrap();
        }
        let unwound = catch_unwind(AssertUnwindSafe(|| t.clear()));
        assert!(unwound.is_err());
        drop(t);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn from_view_collapses_duplicates() {
        let data = [1u64, 2, 3, 2, 1];
        let t = HopTable::from_view(View::new(&data[..])).unwrap();
        assert_eq!(t.occupied_len(), 3);
        for v in [1u64, 2, 3] {
            assert!(t.contains(&v));
        }
    }
}
