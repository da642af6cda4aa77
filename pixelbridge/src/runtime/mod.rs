//! Host runtime binding: the slice of a script engine the bridge talks to.
//!
//! Values are reference counted and single-threaded, like the engines this models. An
//! object is collected when its last [`Object`] handle is dropped, which is what drives
//! the release of externally backed buffers.

mod buffer;
mod value;

pub use buffer::{ArrayBuffer, HeapBuffer, MutableBuffer};
pub use value::{HostFn, JsError, Object, Uint8Array, Value};

use std::rc::Rc;

/// A live runtime instance with its own global object.
#[derive(Debug, Default)]
pub struct Runtime {
    global: Object,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self) -> Object {
        self.global.clone()
    }

    /// Create a function object backed by native code.
    pub fn create_function<F>(&self, name: &str, arity: u32, func: F) -> Object
    where
        F: Fn(&Runtime, &Value, &[Value]) -> Result<Value, JsError> + 'static,
    {
        Object::function_object(name, arity, Rc::new(func))
    }

    /// Invoke `func` with the given receiver and arguments.
    pub fn call(&self, func: &Object, this: &Value, args: &[Value]) -> Result<Value, JsError> {
        let host = func
            .host_function()
            .ok_or_else(|| JsError::new("TypeError: object is not a function"))?;
        host(self, this, args)
    }

    /// Expose `buffer` to script as an `ArrayBuffer` object.
    pub fn array_buffer_object(&self, buffer: ArrayBuffer) -> Object {
        Object::array_buffer_object(buffer)
    }

    /// `new ArrayBuffer(...)` holding `bytes` on the runtime heap.
    pub fn new_array_buffer(&self, bytes: Vec<u8>) -> Object {
        self.array_buffer_object(ArrayBuffer::from_vec(bytes))
    }

    /// `new Uint8Array(buffer, byteOffset, byteLength)`; a missing length spans to the end.
    pub fn new_uint8_array(
        &self,
        buffer: &Object,
        byte_offset: usize,
        byte_length: Option<usize>,
    ) -> Result<Object, JsError> {
        let size = buffer
            .array_buffer()
            .ok_or_else(|| JsError::new("TypeError: argument is not an ArrayBuffer"))?
            .size();
        if byte_offset > size {
            return Err(JsError::new("RangeError: start offset is outside the bounds of the buffer"));
        }
        let byte_length = byte_length.unwrap_or(size - byte_offset);
        if byte_length > size - byte_offset {
            return Err(JsError::new("RangeError: invalid typed array length"));
        }
        Object::uint8_array_object(buffer.clone(), byte_offset, byte_length)
            .ok_or_else(|| JsError::new("TypeError: argument is not an ArrayBuffer"))
    }

    /// `Uint8Array.from(bytes)`: copies into a fresh runtime-owned buffer.
    pub fn uint8_array_from(&self, bytes: &[u8]) -> Object {
        let buffer = self.new_array_buffer(bytes.to_vec());
        let len = bytes.len();
        Object::uint8_array_object(buffer, 0, len).unwrap_or_default()
    }
}
