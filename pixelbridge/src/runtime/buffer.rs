use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

/// Memory behind an `ArrayBuffer`.
///
/// The runtime reads and writes `size()` bytes starting at `data()` and drops the value
/// when the last `ArrayBuffer` referencing it is collected. Implementations decide who
/// really owns the bytes.
pub trait MutableBuffer {
    fn size(&self) -> usize;
    fn data(&self) -> *mut u8;
}

/// Bytes owned by the runtime heap (script-created buffers, copy-mode results).
///
/// Holds the leaked allocation as a raw slice pointer so that writes through `data()`
/// never alias a live `&mut` to the box.
pub struct HeapBuffer {
    bytes: NonNull<[u8]>,
}

impl HeapBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: NonNull::from(Box::leak(bytes.into_boxed_slice())),
        }
    }
}

impl MutableBuffer for HeapBuffer {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn data(&self) -> *mut u8 {
        self.bytes.as_ptr().cast()
    }
}

impl Drop for HeapBuffer {
    fn drop(&mut self) {
        // SAFETY: `bytes` came from Box::leak in new() and is reclaimed only here.
        drop(unsafe { Box::from_raw(self.bytes.as_ptr()) });
    }
}

/// A reference to runtime-visible binary memory. Clones share the same backing store.
#[derive(Clone)]
pub struct ArrayBuffer {
    inner: Rc<dyn MutableBuffer>,
}

impl ArrayBuffer {
    /// Wrap foreign memory; `buffer` is dropped when the last clone goes away.
    pub fn from_external<B: MutableBuffer + 'static>(buffer: B) -> Self {
        Self {
            inner: Rc::new(buffer),
        }
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::from_external(HeapBuffer::new(bytes))
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn data(&self) -> *mut u8 {
        self.inner.data()
    }

    /// Read-only view of the whole buffer.
    ///
    /// Writers go through [`data`](Self::data), which requires `unsafe`; safe code can
    /// therefore not mutate the bytes while this borrow is live.
    pub fn as_slice(&self) -> &[u8] {
        let len = self.size();
        if len == 0 {
            return &[];
        }
        // SAFETY: MutableBuffer guarantees `size()` readable bytes at `data()` while alive,
        // and self keeps the backing store alive for the borrow.
        unsafe { std::slice::from_raw_parts(self.data(), len) }
    }

    pub fn ptr_eq(&self, other: &ArrayBuffer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ArrayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBuffer")
            .field("size", &self.size())
            .field("data", &self.data())
            .finish()
    }
}
