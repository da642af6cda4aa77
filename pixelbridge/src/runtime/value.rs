use super::Runtime;
use super::buffer::ArrayBuffer;
use crate::error::Error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Native function callable from script: `(runtime, this, args) -> value | exception`.
pub type HostFn = dyn Fn(&Runtime, &Value, &[Value]) -> Result<Value, JsError>;

/// Exception raised into script code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct JsError {
    message: String,
    cause: Option<Error>,
}

impl JsError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The bridge error behind this exception, when it came from the bridge.
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_ref()
    }
}

impl From<Error> for JsError {
    fn from(err: Error) -> Self {
        Self {
            message: err.to_string(),
            cause: Some(err),
        }
    }
}

/// A script value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(Object),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

/// A typed byte view over an `ArrayBuffer`.
#[derive(Clone, Debug)]
pub struct Uint8Array {
    buffer_object: Object,
    buffer: ArrayBuffer,
    byte_offset: usize,
    byte_length: usize,
}

impl Uint8Array {
    pub fn buffer(&self) -> &ArrayBuffer {
        &self.buffer
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn len(&self) -> usize {
        self.byte_length
    }

    pub fn is_empty(&self) -> bool {
        self.byte_length == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer.as_slice()[self.byte_offset..self.byte_offset + self.byte_length]
    }
}

enum ObjectKind {
    Plain,
    ArrayBuffer(ArrayBuffer),
    Uint8Array(Uint8Array),
    Function {
        name: String,
        arity: u32,
        func: Rc<HostFn>,
    },
}

struct ObjectCell {
    kind: ObjectKind,
    props: RefCell<HashMap<String, Value>>,
}

/// A reference to a script object. Clones refer to the same object; it is collected when
/// the last reference is dropped.
#[derive(Clone)]
pub struct Object(Rc<ObjectCell>);

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    /// A plain `{}` object.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }

    fn with_kind(kind: ObjectKind) -> Self {
        Object(Rc::new(ObjectCell {
            kind,
            props: RefCell::new(HashMap::new()),
        }))
    }

    pub(crate) fn array_buffer_object(buffer: ArrayBuffer) -> Self {
        Self::with_kind(ObjectKind::ArrayBuffer(buffer))
    }

    /// Caller validates that the view fits the buffer.
    pub(crate) fn uint8_array_object(buffer_object: Object, byte_offset: usize, byte_length: usize) -> Option<Self> {
        let buffer = buffer_object.array_buffer()?.clone();
        Some(Self::with_kind(ObjectKind::Uint8Array(Uint8Array {
            buffer_object,
            buffer,
            byte_offset,
            byte_length,
        })))
    }

    pub(crate) fn function_object(name: &str, arity: u32, func: Rc<HostFn>) -> Self {
        Self::with_kind(ObjectKind::Function {
            name: name.to_string(),
            arity,
            func,
        })
    }

    /// Property lookup, including the intrinsic properties of buffers, views and functions.
    pub fn get_property(&self, name: &str) -> Value {
        match (&self.0.kind, name) {
            (ObjectKind::ArrayBuffer(buf), "byteLength") => Value::Number(buf.size() as f64),
            (ObjectKind::Uint8Array(view), "buffer") => Value::Object(view.buffer_object.clone()),
            (ObjectKind::Uint8Array(view), "byteOffset") => Value::Number(view.byte_offset as f64),
            (ObjectKind::Uint8Array(view), "byteLength" | "length") => {
                Value::Number(view.byte_length as f64)
            }
            (ObjectKind::Function { name, .. }, "name") => Value::from(name.as_str()),
            (ObjectKind::Function { arity, .. }, "length") => Value::from(*arity),
            _ => self
                .0
                .props
                .borrow()
                .get(name)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Define or replace an own property.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) {
        self.0.props.borrow_mut().insert(name.to_string(), value.into());
    }

    pub fn has_property(&self, name: &str) -> bool {
        !self.get_property(name).is_undefined()
    }

    pub fn is_function(&self) -> bool {
        matches!(self.0.kind, ObjectKind::Function { .. })
    }

    pub fn is_array_buffer(&self) -> bool {
        matches!(self.0.kind, ObjectKind::ArrayBuffer(_))
    }

    pub fn array_buffer(&self) -> Option<&ArrayBuffer> {
        match &self.0.kind {
            ObjectKind::ArrayBuffer(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn uint8_array(&self) -> Option<&Uint8Array> {
        match &self.0.kind {
            ObjectKind::Uint8Array(view) => Some(view),
            _ => None,
        }
    }

    pub(crate) fn host_function(&self) -> Option<Rc<HostFn>> {
        match &self.0.kind {
            ObjectKind::Function { func, .. } => Some(Rc::clone(func)),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ObjectKind::Plain => {
                let props = self.0.props.borrow();
                let mut keys: Vec<_> = props.keys().collect();
                keys.sort();
                f.debug_struct("Object").field("keys", &keys).finish()
            }
            ObjectKind::ArrayBuffer(buf) => fmt::Debug::fmt(buf, f),
            ObjectKind::Uint8Array(view) => f
                .debug_struct("Uint8Array")
                .field("byte_offset", &view.byte_offset)
                .field("byte_length", &view.byte_length)
                .finish(),
            ObjectKind::Function { name, arity, .. } => f
                .debug_struct("Function")
                .field("name", name)
                .field("arity", arity)
                .finish(),
        }
    }
}
