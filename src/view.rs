//! Non-owning windows into contiguous element storage.
//!
//! A `View` is a borrow of a slice with the handful of operations the
//! array and table layers want to speak in: checked construction,
//! sub-windowing, length-first ordering, search, and materialization into
//! an owned `DynArray`. The borrow checker ties each view to its backing
//! storage, so the dangling-window hazard of the original is a compile
//! error here rather than a documented footgun.

use core::cmp::Ordering;
use core::fmt;
use core::ops::Index;
use core::slice;

use crate::dyn_array::DynArray;
use crate::tagged::AllocError;

/// A non-owning window over `[T]`.
pub struct View<'a, T> {
    data: &'a [T],
}

// The shared-slice field is Copy for every T; hand impls avoid the
// derive's spurious `T: Copy` / `T: Clone` bounds.
impl<T> Copy for View<'_, T> {}

impl<T> Clone for View<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> View<'a, T> {
    /// View covering the whole slice.
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    /// View of `len` elements of `data` starting at `start`.
    ///
    /// Panics when the window falls outside the slice.
    pub fn make(data: &'a [T], start: usize, len: usize) -> Self {
        let end = start
            .checked_add(len)
            .unwrap_or_else(|| panic!("view window overflows usize"));
        assert!(
            end <= data.len(),
            "view window {}..{} out of bounds for length {}",
            start,
            end,
            data.len()
        );
        Self {
            data: &data[start..end],
        }
    }

    /// A window into this view, bounds-checked against the view itself.
    pub fn subview(&self, start: usize, len: usize) -> View<'a, T> {
        View::make(self.data, start, len)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.data.get(index)
    }

    pub fn first(&self) -> Option<&'a T> {
        self.data.first()
    }

    pub fn last(&self) -> Option<&'a T> {
        self.data.last()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    pub fn iter(&self) -> slice::Iter<'a, T> {
        self.data.iter()
    }

    /// Copy the viewed elements into a freshly allocated `DynArray` with
    /// capacity exactly `len`.
    pub fn to_dyn_array(&self) -> Result<DynArray<T>, AllocError>
    where
        T: Clone,
    {
        DynArray::from_view(*self)
    }
}

impl<'a, T: PartialEq> View<'a, T> {
    /// Index of the first occurrence of `needle`.
    pub fn find(&self, needle: &T) -> Option<usize> {
        self.data.iter().position(|x| x == needle)
    }

    /// Index of the last occurrence of `needle`.
    pub fn rfind(&self, needle: &T) -> Option<usize> {
        self.data.iter().rposition(|x| x == needle)
    }

    pub fn contains(&self, needle: &T) -> bool {
        self.data.contains(needle)
    }
}

impl<'a, T: Ord> View<'a, T> {
    /// Length-first ordering: a shorter view sorts before a longer one
    /// regardless of content, equal lengths fall back to element order.
    pub fn compare(&self, other: &View<'_, T>) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.data.cmp(other.data))
    }
}

impl<'a> View<'a, u8> {
    /// Borrow the viewed bytes as `&str` when they are valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.data).ok()
    }
}

impl<'a, T: Copy> View<'a, T> {
    /// Reinterpret the window as raw bytes. Restricted to `Copy` payloads
    /// so no drop-relevant structure is ever viewed as bytes.
    pub fn as_bytes(&self) -> View<'a, u8> {
        let bytes = core::mem::size_of::<T>() * self.data.len();
        let ptr = self.data.as_ptr() as *const u8;
        // Lifetime and provenance both come from self.data.
        View {
            data: unsafe { slice::from_raw_parts(ptr, bytes) },
        }
    }
}

/// Element equality requires equal lengths first; two views of different
/// lengths are never equal, whatever their common prefix.
impl<'a, 'b, T: PartialEq> PartialEq<View<'b, T>> for View<'a, T> {
    fn eq(&self, other: &View<'b, T>) -> bool {
        self.data == other.data
    }
}

impl<'a, T: Eq> Eq for View<'a, T> {}

impl<'a, T> Index<usize> for View<'a, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<'a, T> IntoIterator for View<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for View<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}
