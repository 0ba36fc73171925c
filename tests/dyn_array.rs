//! End-to-end tests for DynArray growth, removal flavors, and range
//! swaps, driven through the public API only.

use fat_collections::{DynArray, View};

/// Invariant: amortized growth allocates 16 bytes worth of elements
/// first, then powers of two; element addresses within a grown buffer
/// stay index-stable.
#[test]
fn growth_policy_and_index_stability() {
    let mut a: DynArray<u32> = DynArray::new();
    let mut caps = Vec::new();
    for v in 0..40u32 {
        a.push(v).unwrap();
        caps.push(a.capacity());
    }
    // 16 bytes / 4-byte elements = 4 slots first, then doubling.
    assert_eq!(caps[0], 4);
    assert!(caps.windows(2).all(|w| w[0] <= w[1]), "capacity regressed");
    assert_eq!(a.capacity(), 64);
    for (i, &v) in a.iter().enumerate() {
        assert_eq!(v as usize, i);
    }
}

/// Invariant: capacity never shrinks except through the explicit
/// exact-fit operations.
#[test]
fn capacity_monotonic_until_shrink() {
    let mut a: DynArray<u8> = DynArray::new();
    for v in 0..100u8 {
        a.push(v).unwrap();
    }
    let cap = a.capacity();
    a.delete_range(10, 50);
    assert_eq!(a.capacity(), cap);
    a.truncate(20);
    assert_eq!(a.capacity(), cap);
    a.shrink_to_fit().unwrap();
    assert_eq!(a.capacity(), 20);
}

/// Invariant: the three removal flavors agree on which elements die and
/// differ only in ordering and capacity effects.
#[test]
fn removal_flavors() {
    let seed = [0, 1, 2, 3, 4, 5, 6, 7];

    let mut ordered = DynArray::from_view(View::new(&seed[..])).unwrap();
    ordered.delete_range(2, 3);
    assert_eq!(&ordered[..], &[0, 1, 5, 6, 7]);

    let mut shrunk = DynArray::from_view(View::new(&seed[..])).unwrap();
    shrunk.shrink_delete_range(2, 3).unwrap();
    assert_eq!(&shrunk[..], &[0, 1, 5, 6, 7]);
    assert_eq!(shrunk.capacity(), 5);

    let mut swapped = DynArray::from_view(View::new(&seed[..])).unwrap();
    swapped.swap_delete_range(2, 3);
    assert_eq!(swapped.len(), 5);
    let mut got: Vec<i32> = swapped.iter().copied().collect();
    got.sort_unstable();
    assert_eq!(got, vec![0, 1, 5, 6, 7]);
    // Prefix before the hole is untouched.
    assert_eq!(&swapped[..2], &[0, 1]);
}

/// Invariant: swap-delete fills the hole from the tail; when hole and
/// tail overlap, survivors move at most once.
#[test]
fn swap_delete_tail_overlap() {
    let mut a: DynArray<i32> = DynArray::new();
    for v in [10, 20, 30, 40, 50, 60, 70] {
        a.push(v).unwrap();
    }
    a.swap_delete_range(4, 3); // remove the tail itself
    assert_eq!(&a[..], &[10, 20, 30, 40]);

    a.swap_delete_range(0, 1); // single-element hole, last fills in
    assert_eq!(&a[..], &[40, 20, 30]);
}

/// Invariant: overlapping range swaps produce the staged result on every
/// scratch strategy (stack, spare capacity, heap).
#[test]
fn overlapping_swap_all_scratch_paths() {
    fn staged_expect(data: &[u64], a: usize, b: usize, count: usize) -> Vec<u64> {
        let mut out = data.to_vec();
        let fst: Vec<u64> = out[a..a + count].to_vec();
        out.copy_within(b..b + count, a);
        out[b..b + count].copy_from_slice(&fst);
        out
    }

    // Heavily-overlapping small case.
    let mut ten: DynArray<u64> = DynArray::new();
    for v in 0..10u64 {
        ten.push(v).unwrap();
    }
    let expect = staged_expect(&ten, 0, 3, 5);
    ten.swap_range(0, 3, 5).unwrap();
    assert_eq!(&ten[..], &expect[..]);

    // Small: fits the 256-byte stack scratch.
    let mut small: DynArray<u64> = DynArray::new();
    for v in 0..8u64 {
        small.push(v).unwrap();
    }
    let expect = staged_expect(&small, 0, 2, 4);
    small.swap_range(0, 2, 4).unwrap();
    assert_eq!(&small[..], &expect[..]);

    // Large with spare trailing capacity.
    let mut spare: DynArray<u64> = DynArray::new();
    spare.reserve(512).unwrap();
    for v in 0..300u64 {
        spare.push(v).unwrap();
    }
    let expect = staged_expect(&spare, 10, 60, 100);
    spare.swap_range(10, 60, 100).unwrap();
    assert_eq!(&spare[..], &expect[..]);

    // Large with no spare capacity: heap scratch.
    let mut heap: DynArray<u64> = DynArray::new();
    for v in 0..300u64 {
        heap.push(v).unwrap();
    }
    heap.shrink_to_fit().unwrap();
    let expect = staged_expect(&heap, 100, 40, 150);
    heap.swap_range(100, 40, 150).unwrap();
    assert_eq!(&heap[..], &expect[..]);
}

/// Invariant: views track live array contents and splices round-trip
/// through owned copies.
#[test]
fn views_and_splices() {
    let mut a: DynArray<u16> = DynArray::new();
    for v in [1, 2, 7, 8] {
        a.push(v).unwrap();
    }
    let mid = [3, 4, 5, 6];
    a.insert_view(2, View::new(&mid[..])).unwrap();
    assert_eq!(&a[..], &[1, 2, 3, 4, 5, 6, 7, 8]);

    let window = a.view(2, 4);
    assert_eq!(window.as_slice(), &[3, 4, 5, 6]);
    let copy = window.to_dyn_array().unwrap();
    assert_eq!(copy.capacity(), 4);

    let joined = copy.concat(a.view(6, 2)).unwrap();
    assert_eq!(&joined[..], &[3, 4, 5, 6, 7, 8]);
}

/// Invariant: resize is exact in both directions and fills with the
/// given value; resizing to zero releases the buffer.
#[test]
fn resize_lifecycle() {
    let mut a: DynArray<u32> = DynArray::new();
    a.resize(6, 9).unwrap();
    assert_eq!(a.len(), 6);
    assert_eq!(a.capacity(), 6);
    assert!(a.iter().all(|&v| v == 9));

    a.resize(2, 0).unwrap();
    assert_eq!((a.len(), a.capacity()), (2, 2));

    a.resize(0, 0).unwrap();
    assert_eq!((a.len(), a.capacity()), (0, 0));
    assert!(!a.is_valid());

    // Reusable after release.
    a.push(1).unwrap();
    assert_eq!(&a[..], &[1]);
}

/// Invariant: deque-style front operations preserve order.
#[test]
fn front_operations() {
    let mut a: DynArray<i32> = DynArray::new();
    a.push(2).unwrap();
    a.push(3).unwrap();
    a.push_front(1).unwrap();
    assert_eq!(&a[..], &[1, 2, 3]);
    assert_eq!(a.pop_front(), Some(1));
    assert_eq!(a.pop_front(), Some(2));
    assert_eq!(a.pop_front(), Some(3));
    assert_eq!(a.pop_front(), None);
}
