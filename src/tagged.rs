//! Tagged allocations: the bottom layer every other structure builds on.
//!
//! A `RawBuf` is an owned, untyped byte allocation carrying the metadata
//! the original fat-pointer scheme hid in a header before the data: an
//! allocation-class tag, an element count, and the payload size. Here the
//! metadata lives in an explicit struct instead of at a negative pointer
//! offset; the behavioral contract is unchanged (realloc-style growth
//! preserving the common prefix, a zeroed trailing sentinel byte, explicit
//! free, and a defensive validity check).
//!
//! Raw-pointer handling in this crate is isolated to this module and the
//! element-moving paths of `dyn_array`; everything above works through
//! safe slices.

use core::fmt;
use core::ptr::NonNull;
use std::alloc::{self, Layout};

/// Allocation-class tags. The discriminants mirror the original magic
/// numbers (`0xFE__`, chosen to be invalid Unicode code points); they are
/// not a wire format, only a debugging aid.
#[repr(u16)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tag {
    /// Plain heap allocation.
    Heap = 0xFEFE,
    /// Scoped stack scratch buffer; never heap-freed.
    Stack = 0xFEFF,
    /// Storage owned by a `DynArray`.
    DynArray = 0xFEFD,
    /// Slot storage owned by a `HopTable`.
    HashTable = 0xFEFC,
}

impl Tag {
    /// Decode a raw tag word. Tolerates arbitrary input and returns `None`
    /// for anything that is not a known allocation class; this is the
    /// defensive check, not a type system.
    pub fn decode(raw: u16) -> Option<Tag> {
        match raw {
            0xFEFE => Some(Tag::Heap),
            0xFEFF => Some(Tag::Stack),
            0xFEFD => Some(Tag::DynArray),
            0xFEFC => Some(Tag::HashTable),
            _ => None,
        }
    }

    /// The raw tag word.
    pub fn encode(self) -> u16 {
        self as u16
    }
}

/// The allocator returned null (or the request overflowed `usize`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("allocation failed")
    }
}

impl std::error::Error for AllocError {}

/// Pluggable allocation hook with malloc/realloc/free semantics folded
/// into one entry point:
///
/// - `ptr == None`, `new_size > 0`: fresh allocation.
/// - `ptr == Some`, `new_size > 0`: reallocation preserving
///   `min(old_size, new_size)` bytes; on failure the old allocation stays
///   valid and `None` is returned.
/// - `new_size == 0`: frees `ptr` (if any) and returns `None`.
///
/// `old_size`/`align` describe the existing allocation; they are required
/// by Rust's allocation ABI where C `realloc` tracked sizes internally.
pub trait Allocator {
    fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>;
}

/// Default allocator over `std::alloc`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Global;

impl Allocator for Global {
    fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        unsafe {
            match (ptr, new_size) {
                (None, 0) => None,
                (Some(p), 0) => {
                    alloc::dealloc(p.as_ptr(), Layout::from_size_align_unchecked(old_size, align));
                    None
                }
                (None, n) => {
                    let layout = Layout::from_size_align(n, align).ok()?;
                    NonNull::new(alloc::alloc(layout))
                }
                (Some(p), n) => {
                    // Validate the new size before touching the old block so a
                    // failed request leaves it intact.
                    Layout::from_size_align(n, align).ok()?;
                    let old = Layout::from_size_align_unchecked(old_size, align);
                    NonNull::new(alloc::realloc(p.as_ptr(), old, n))
                }
            }
        }
    }
}

/// An owned, untyped, tagged allocation.
///
/// `bytes` is the payload size; one extra sentinel byte past the payload
/// is always allocated and kept zero, so byte-oriented callers (string
/// layers) may read one past the end and find a terminator. `len` is the
/// element count and is maintained by whichever structure owns the buffer;
/// `RawBuf` itself only stores it.
pub struct RawBuf<A: Allocator = Global> {
    ptr: Option<NonNull<u8>>,
    bytes: usize,
    len: usize,
    align: usize,
    tag: Tag,
    alloc: A,
}

impl RawBuf<Global> {
    /// Empty buffer with the default allocator. No allocation happens
    /// until the first `resize`.
    pub fn new(tag: Tag, align: usize) -> Self {
        Self::new_in(tag, align, Global)
    }
}

impl<A: Allocator> RawBuf<A> {
    /// Empty buffer using `alloc`. Stack-class buffers are a separate
    /// type (`StackBuf`); they have no heap-free path by construction.
    pub fn new_in(tag: Tag, align: usize, alloc: A) -> Self {
        assert!(tag != Tag::Stack, "stack allocations use StackBuf");
        assert!(align.is_power_of_two(), "alignment must be a power of two");
        Self {
            ptr: None,
            bytes: 0,
            len: 0,
            align,
            tag,
            alloc,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub(crate) fn set_tag(&mut self, tag: Tag) {
        assert!(tag != Tag::Stack, "stack allocations use StackBuf");
        self.tag = tag;
    }

    /// Payload size in bytes (excluding the sentinel).
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Element count, as maintained by the owner.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The defensive validity check: a buffer is considered live when it
    /// has elements or capacity. (The tag half of the original check is
    /// carried by the type; `Tag::decode` covers raw words.)
    pub fn is_valid(&self) -> bool {
        self.len > 0 || self.bytes > 0
    }

    /// Raw payload pointer, if allocated.
    pub fn raw_ptr(&self) -> Option<NonNull<u8>> {
        self.ptr
    }

    /// The sentinel byte one past the payload. `None` when unallocated.
    pub fn sentinel(&self) -> Option<u8> {
        // Invariant: every successful resize writes 0 here.
        self.ptr.map(|p| unsafe { p.as_ptr().add(self.bytes).read() })
    }

    /// Grow or shrink the payload to `new_bytes`, preserving
    /// `min(old, new)` bytes and re-zeroing the sentinel. `new_bytes == 0`
    /// frees the buffer. On failure the buffer is left untouched; the
    /// metadata is never torn.
    pub fn resize(&mut self, new_bytes: usize) -> Result<(), AllocError> {
        if new_bytes == 0 {
            self.free();
            return Ok(());
        }
        let old_alloc = if self.ptr.is_some() { self.bytes + 1 } else { 0 };
        let new_alloc = new_bytes.checked_add(1).ok_or(AllocError)?;
        let p = self
            .alloc
            .reallocate(self.ptr, old_alloc, self.align, new_alloc)
            .ok_or(AllocError)?;
        unsafe { p.as_ptr().add(new_bytes).write(0) };
        self.ptr = Some(p);
        self.bytes = new_bytes;
        Ok(())
    }

    /// Explicitly release the allocation. Also run on drop.
    pub fn free(&mut self) {
        if let Some(p) = self.ptr.take() {
            self.alloc
                .reallocate(Some(p), self.bytes + 1, self.align, 0);
        }
        self.bytes = 0;
        self.len = 0;
    }
}

impl<A: Allocator> Drop for RawBuf<A> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<A: Allocator> fmt::Debug for RawBuf<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuf")
            .field("tag", &self.tag)
            .field("bytes", &self.bytes)
            .field("len", &self.len)
            .finish()
    }
}

/// Fixed-size, `Stack`-tagged scratch buffer.
///
/// The stand-in for the original's alloca'd allocations: it lives inline
/// in its owner's frame, is reclaimed by scope exit, and cannot reach the
/// heap-free path at all — where the original asserted at runtime, the
/// type system rejects it here. Used by the array layer for small
/// overlapping-swap scratch.
pub struct StackBuf<const N: usize> {
    bytes: usize,
    len: usize,
    data: [u8; N],
}

impl<const N: usize> StackBuf<N> {
    /// Buffer with a `bytes`-byte payload holding `len` elements. One
    /// sentinel byte is reserved, so `bytes` must be strictly below `N`.
    pub fn new(bytes: usize, len: usize) -> Self {
        assert!(bytes < N, "stack scratch overflow");
        Self {
            bytes,
            len,
            data: [0u8; N],
        }
    }

    pub fn tag(&self) -> Tag {
        Tag::Stack
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_valid(&self) -> bool {
        self.len > 0 || self.bytes > 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.bytes]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.bytes]
    }
}
