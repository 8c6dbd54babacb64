//! Exception values: the payload carried by `throw` and caught by `catch`.

use std::rc::Rc;

use super::Value;

struct ExceptionData {
    name: String,
    payload: Value,
}

/// A value of exception type, as produced by the `exception(name, data)`
/// built-in and matched by name in a `catch` clause.
#[derive(Clone)]
pub struct ExceptionObject(Rc<ExceptionData>);

impl ExceptionObject {
    pub fn new(name: String, payload: Value) -> Self {
        ExceptionObject(Rc::new(ExceptionData { name, payload }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn payload(&self) -> &Value {
        &self.0.payload
    }

    pub fn use_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn intptr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ExceptionObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ExceptionObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Exception({})>", self.0.name)
    }
}
