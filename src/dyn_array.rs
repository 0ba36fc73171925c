//! Growable arrays over tagged buffers.
//!
//! `DynArray` owns a `RawBuf` plus a capacity, and funnels every size
//! change through one growth routine (`maybe_grow`) with two independent
//! switches: whether the logical length follows the request, and whether
//! capacity is sized exactly or rounded by the amortized policy. All the
//! public operations are thin wrappers that pick a switch combination and
//! then move elements.
//!
//! Removal comes in three flavors with different cost/ordering trade-offs:
//! order-preserving (`delete_range`), order-preserving with an exact-fit
//! reallocation (`shrink_delete_range`), and order-breaking
//! (`swap_delete_range`), which fills the hole from the tail in O(count)
//! moves.
//!
//! Unsafe code here is confined to moving and dropping elements by raw
//! pointer; indices are asserted before any pointer math.

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use core::slice;

use crate::tagged::{AllocError, Allocator, Global, RawBuf, StackBuf, Tag};
use crate::view::View;

/// Initial allocation size in bytes for the non-exact growth path; the
/// first amortized growth allocates `16 / size_of::<T>()` elements
/// (minimum one).
pub const DEFAULT_SIZE_BYTES: usize = 16;

/// Byte threshold under which overlapping-range swaps borrow stack
/// scratch instead of spare capacity or the heap.
const STACK_SCRATCH_BYTES: usize = 256;

/// A growable array of `T` in a tagged allocation.
pub struct DynArray<T, A: Allocator = Global> {
    buf: RawBuf<A>,
    cap: usize,
    _marker: PhantomData<T>,
}

impl<T> DynArray<T, Global> {
    /// Empty array; nothing is allocated until the first growth.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Array holding clones of the viewed elements, with capacity exactly
    /// the view length.
    pub fn from_view(view: View<'_, T>) -> Result<Self, AllocError>
    where
        T: Clone,
    {
        let mut out = Self::new();
        out.reserve(view.len())?;
        out.extend_from_view(view)?;
        Ok(out)
    }
}

impl<T> Default for DynArray<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> DynArray<T, A> {
    /// Empty array using `alloc`.
    pub fn new_in(alloc: A) -> Self {
        assert!(
            mem::size_of::<T>() != 0,
            "zero-sized element types are not supported"
        );
        Self {
            buf: RawBuf::new_in(Tag::DynArray, mem::align_of::<T>(), alloc),
            cap: 0,
            _marker: PhantomData,
        }
    }

    /// Like `new_in` but with a caller-chosen allocation tag, for owners
    /// that embed arrays as their backing storage.
    pub(crate) fn with_tag_in(tag: Tag, alloc: A) -> Self {
        let mut out = Self::new_in(alloc);
        out.buf.set_tag(tag);
        out
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Capacity in elements.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn tag(&self) -> Tag {
        self.buf.tag()
    }

    pub fn is_valid(&self) -> bool {
        self.buf.is_valid()
    }

    pub fn as_slice(&self) -> &[T] {
        self
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    /// View of `len` elements starting at `start`. Panics out of bounds.
    pub fn view(&self, start: usize, len: usize) -> View<'_, T> {
        View::make(self.as_slice(), start, len)
    }

    pub fn view_full(&self) -> View<'_, T> {
        View::new(self.as_slice())
    }

    fn ptr(&self) -> *mut T {
        match self.buf.raw_ptr() {
            Some(p) => p.as_ptr() as *mut T,
            None => NonNull::<T>::dangling().as_ptr(),
        }
    }

    fn byte_size(elems: usize) -> Result<usize, AllocError> {
        elems.checked_mul(mem::size_of::<T>()).ok_or(AllocError)
    }

    /// The growth engine. Ensures capacity for `new_size` elements;
    /// `update_len` additionally raises the length to `new_size` when it
    /// is currently below it (never lowers it). `exact` sizes capacity to
    /// the request instead of the amortized policy (first allocation of
    /// `DEFAULT_SIZE_BYTES` worth of elements, then next power of two).
    fn maybe_grow(&mut self, new_size: usize, update_len: bool, exact: bool) -> Result<(), AllocError> {
        if self.cap == 0 && new_size > 0 {
            let mut initial = if exact {
                new_size
            } else {
                DEFAULT_SIZE_BYTES / mem::size_of::<T>()
            };
            if initial == 0 {
                initial = 1;
            }
            self.buf.resize(Self::byte_size(initial)?)?;
            self.cap = initial;
        }
        if new_size > self.cap {
            let new_cap = if exact {
                new_size
            } else {
                new_size.checked_next_power_of_two().ok_or(AllocError)?
            };
            self.buf.resize(Self::byte_size(new_cap)?)?;
            self.cap = new_cap;
        }
        if update_len && new_size > self.buf.len() {
            self.buf.set_len(new_size);
        }
        Ok(())
    }

    /// Ensure capacity for at least `additional_total` elements, sized
    /// exactly. Never shrinks and never touches the length.
    pub fn reserve(&mut self, total: usize) -> Result<(), AllocError> {
        if total <= self.cap {
            return Ok(());
        }
        self.maybe_grow(total, false, true)
    }

    /// Append one element, growing amortized.
    pub fn push(&mut self, value: T) -> Result<(), AllocError> {
        let idx = self.len();
        self.maybe_grow(idx + 1, true, false)?;
        unsafe { ptr::write(self.ptr().add(idx), value) };
        Ok(())
    }

    /// Insert at the front; shifts everything right.
    pub fn push_front(&mut self, value: T) -> Result<(), AllocError> {
        self.insert(0, value)
    }

    /// Insert at `pos`, shifting `pos..` right by one. Panics when
    /// `pos > len`.
    pub fn insert(&mut self, pos: usize, value: T) -> Result<(), AllocError> {
        let len = self.len();
        assert!(pos <= len, "insert position {} out of bounds {}", pos, len);
        self.maybe_grow(len + 1, true, false)?;
        unsafe {
            let p = self.ptr().add(pos);
            ptr::copy(p, p.add(1), len - pos);
            ptr::write(p, value);
        }
        Ok(())
    }

    /// Splice clones of the viewed elements in at `pos`, shifting the
    /// tail right by the view length. Panics when `pos > len`.
    pub fn insert_view(&mut self, pos: usize, view: View<'_, T>) -> Result<(), AllocError>
    where
        T: Clone,
    {
        let len = self.len();
        assert!(pos <= len, "insert position {} out of bounds {}", pos, len);
        let count = view.len();
        if count == 0 {
            return Ok(());
        }
        self.maybe_grow(len.checked_add(count).ok_or(AllocError)?, false, false)?;
        unsafe {
            let base = self.ptr();
            ptr::copy(base.add(pos), base.add(pos + count), len - pos);
            // Length covers only the intact prefix while clones land; a
            // panicking Clone leaks the moved tail instead of double-dropping.
            self.buf.set_len(pos);
            for (i, item) in view.iter().enumerate() {
                ptr::write(base.add(pos + i), item.clone());
                self.buf.set_len(pos + i + 1);
            }
        }
        self.buf.set_len(len + count);
        Ok(())
    }

    /// Append clones of the viewed elements.
    pub fn extend_from_view(&mut self, view: View<'_, T>) -> Result<(), AllocError>
    where
        T: Clone,
    {
        let len = self.len();
        let count = view.len();
        if count == 0 {
            return Ok(());
        }
        self.maybe_grow(len.checked_add(count).ok_or(AllocError)?, false, false)?;
        unsafe {
            let base = self.ptr();
            for (i, item) in view.iter().enumerate() {
                ptr::write(base.add(len + i), item.clone());
                self.buf.set_len(len + i + 1);
            }
        }
        Ok(())
    }

    /// A fresh array holding this one followed by the viewed elements,
    /// with capacity exactly the combined length.
    pub fn concat(&self, view: View<'_, T>) -> Result<Self, AllocError>
    where
        T: Clone,
        A: Clone,
    {
        let mut out = Self::with_tag_in(self.tag(), self.buf.allocator().clone());
        out.reserve(self.len().checked_add(view.len()).ok_or(AllocError)?)?;
        out.extend_from_view(self.view_full())?;
        out.extend_from_view(view)?;
        Ok(out)
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.buf.set_len(len - 1);
        Some(unsafe { ptr::read(self.ptr().add(len - 1)) })
    }

    /// Remove and return the first element; shifts everything left.
    pub fn pop_front(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        unsafe {
            let base = self.ptr();
            let value = ptr::read(base);
            ptr::copy(base.add(1), base, len - 1);
            self.buf.set_len(len - 1);
            Some(value)
        }
    }

    /// Drop the tail beyond `new_len`. No-op when `new_len >= len`.
    pub fn truncate(&mut self, new_len: usize) {
        let len = self.len();
        if new_len >= len {
            return;
        }
        // Length shrinks before any destructor runs; a panicking Drop
        // leaks the rest of the tail instead of double-dropping it.
        self.buf.set_len(new_len);
        unsafe {
            for i in new_len..len {
                ptr::drop_in_place(self.ptr().add(i));
            }
        }
    }

    /// Order-preserving removal of `pos..pos + count`; the tail shifts
    /// left. Capacity is untouched. Panics when the range escapes.
    pub fn delete_range(&mut self, pos: usize, count: usize) {
        let len = self.len();
        let end = Self::range_end(pos, count, len);
        if count == 0 {
            return;
        }
        // Only the prefix stays live while the victims drop; a panicking
        // Drop leaks the tail instead of double-dropping it.
        self.buf.set_len(pos);
        unsafe {
            let base = self.ptr();
            for i in pos..end {
                ptr::drop_in_place(base.add(i));
            }
            ptr::copy(base.add(end), base.add(pos), len - end);
        }
        self.buf.set_len(len - count);
    }

    /// Order-preserving removal of one element.
    pub fn delete(&mut self, pos: usize) {
        self.delete_range(pos, 1);
    }

    /// Order-preserving removal that also reallocates to exactly the
    /// surviving length, releasing all spare capacity.
    pub fn shrink_delete_range(&mut self, pos: usize, count: usize) -> Result<(), AllocError> {
        self.delete_range(pos, count);
        self.shrink_to_fit()
    }

    pub fn shrink_delete(&mut self, pos: usize) -> Result<(), AllocError> {
        self.shrink_delete_range(pos, 1)
    }

    /// Reallocate to capacity exactly `len`. `len == 0` frees the buffer.
    pub fn shrink_to_fit(&mut self) -> Result<(), AllocError> {
        let len = self.len();
        if self.cap == len {
            return Ok(());
        }
        self.buf.resize(Self::byte_size(len)?)?;
        self.cap = len;
        Ok(())
    }

    /// Order-breaking removal of `pos..pos + count`: the hole is filled
    /// from the tail in O(count) moves instead of shifting the whole
    /// tail. Panics when the range escapes.
    pub fn swap_delete_range(&mut self, pos: usize, count: usize) {
        let len = self.len();
        let end = Self::range_end(pos, count, len);
        if count == 0 {
            return;
        }
        // Movers start past both the hole and the removed range; when the
        // two overlap only the survivors beyond them move.
        let tail_start = core::cmp::max(end, len - count);
        // Same drop ordering as delete_range: prefix-only length while
        // the victims drop, full length restored after the movers land.
        self.buf.set_len(pos);
        unsafe {
            let base = self.ptr();
            for i in pos..end {
                ptr::drop_in_place(base.add(i));
            }
            ptr::copy(base.add(tail_start), base.add(pos), len - tail_start);
        }
        self.buf.set_len(len - count);
    }

    pub fn swap_delete(&mut self, pos: usize) {
        self.swap_delete_range(pos, 1);
    }

    /// Swap two elements. Panics out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.as_mut_slice().swap(a, b);
    }

    /// Drop every element; capacity is kept.
    pub fn clear(&mut self) {
        let len = self.len();
        // Length goes to zero before any destructor runs so a panicking
        // Drop cannot expose half-dead elements.
        self.buf.set_len(0);
        if mem::needs_drop::<T>() {
            unsafe {
                for i in 0..len {
                    ptr::drop_in_place(self.ptr().add(i));
                }
            }
        }
    }

    /// Grow or shrink the length to `new_len`; new slots come from `f`,
    /// removed slots are dropped and capacity is trimmed to fit.
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) -> Result<(), AllocError> {
        let len = self.len();
        if new_len > len {
            self.maybe_grow(new_len, false, true)?;
            unsafe {
                let base = self.ptr();
                for i in len..new_len {
                    ptr::write(base.add(i), f());
                    self.buf.set_len(i + 1);
                }
            }
            Ok(())
        } else {
            self.shrink_delete_range(new_len, len - new_len)
        }
    }

    /// `resize_with` filling new slots with clones of `value`.
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<(), AllocError>
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone())
    }

    pub fn find(&self, needle: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|x| x == needle)
    }

    pub fn rfind(&self, needle: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().rposition(|x| x == needle)
    }

    pub fn contains(&self, needle: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().contains(needle)
    }

    /// Fallible clone: capacity of the copy is exactly this array's
    /// length.
    pub fn try_clone(&self) -> Result<Self, AllocError>
    where
        T: Clone,
        A: Clone,
    {
        let mut out = Self::with_tag_in(self.tag(), self.buf.allocator().clone());
        out.reserve(self.len())?;
        out.extend_from_view(self.view_full())?;
        Ok(out)
    }

    fn range_end(pos: usize, count: usize, len: usize) -> usize {
        let end = pos
            .checked_add(count)
            .unwrap_or_else(|| panic!("range overflows usize"));
        assert!(
            end <= len,
            "range {}..{} out of bounds for length {}",
            pos,
            end,
            len
        );
        end
    }
}

impl<T: Copy, A: Allocator> DynArray<T, A> {
    /// Swap the element ranges `a..a + count` and `b..b + count`, which
    /// may overlap. Overlapping swaps stage one side through scratch:
    /// the stack for small ranges, spare trailing capacity when there is
    /// enough, a temporary heap buffer otherwise (the only path that can
    /// fail). Restricted to `Copy` payloads so staging is a plain byte
    /// move. Panics when either range escapes.
    pub fn swap_range(&mut self, a: usize, b: usize, count: usize) -> Result<(), AllocError> {
        let len = self.len();
        Self::range_end(a, count, len);
        Self::range_end(b, count, len);
        if count == 0 || a == b {
            return Ok(());
        }
        let size = mem::size_of::<T>();
        let bytes = count * size;
        let overlap = if a < b { a + count > b } else { b + count > a };
        unsafe {
            let base = self.ptr() as *mut u8;
            let pa = base.add(a * size);
            let pb = base.add(b * size);
            if !overlap {
                ptr::swap_nonoverlapping(pa, pb, bytes);
            } else if bytes < STACK_SCRATCH_BYTES {
                let mut scratch = StackBuf::<STACK_SCRATCH_BYTES>::new(bytes, count);
                swap_through(pa, pb, scratch.as_mut_slice().as_mut_ptr(), bytes);
            } else if self.cap - len >= count {
                // Spare capacity past the live elements is disjoint from
                // both ranges.
                swap_through(pa, pb, base.add(len * size), bytes);
            } else {
                let mut scratch = RawBuf::new(Tag::Heap, 1);
                scratch.resize(bytes)?;
                if let Some(s) = scratch.raw_ptr() {
                    swap_through(pa, pb, s.as_ptr(), bytes);
                }
            }
        }
        Ok(())
    }
}

/// Exchange two possibly-overlapping `bytes`-sized regions through a
/// disjoint scratch region.
///
/// # Safety
/// `scratch` must be valid for `bytes` bytes and disjoint from both `a`
/// and `b`; `a` and `b` must each be valid for `bytes` bytes.
unsafe fn swap_through(a: *mut u8, b: *mut u8, scratch: *mut u8, bytes: usize) {
    ptr::copy_nonoverlapping(a, scratch, bytes);
    ptr::copy(b, a, bytes);
    ptr::copy_nonoverlapping(scratch, b, bytes);
}

impl<T, A: Allocator> Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr(), self.len()) }
    }
}

impl<T, A: Allocator> DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr(), self.len()) }
    }
}

impl<T, A: Allocator> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        self.clear();
        // RawBuf frees the storage.
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for DynArray<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(out) => out,
            Err(AllocError) => panic!("allocation failed while cloning DynArray"),
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<DynArray<T, B>> for DynArray<T, A> {
    fn eq(&self, other: &DynArray<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: Allocator> Eq for DynArray<T, A> {}

impl<'a, T, A: Allocator> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
