//! Shared dictionaries.
//!
//! A dict never needs the array's copy-on-write dance: there is no slicing,
//! and `clone()` performs a real deep copy (an empty dict clones itself for
//! free; a non-empty one allocates a fresh backing map), so no aliasing can
//! ever straddle a mutation the way array slices can.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::lvalue::{new_lvalue, LValueHandle};
use super::Value;

/// Only hashable value variants may be used as dictionary keys, matching the
/// original's type-descriptor table: arrays, dicts, functions and exceptions
/// never wire up `hash`/`eq` there, so using one as a key is a `TypeError`
/// the caller must check for when building a `DictKey`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DictKey {
    None,
    /// Also how `true`/`false` are keyed: this language has no separate
    /// bool type, so they are ordinary `Int` 1/0.
    Int(i64),
    /// Bit-pattern of the float, so that `NaN`/`-0.0` hash and compare the
    /// way the underlying bits do rather than via `PartialEq for f64`.
    Float(u64),
    Str(String),
}

impl DictKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::None => Some(DictKey::None),
            Value::Int(i) => Some(DictKey::Int(*i)),
            Value::Float(f) => Some(DictKey::Float(f.to_bits())),
            Value::Str(s) => Some(DictKey::Str(s.as_str().to_string())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DictKey::None => Value::None,
            DictKey::Int(i) => Value::Int(*i),
            DictKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            DictKey::Str(s) => Value::Str(super::string::SharedStr::new(s.clone())),
        }
    }
}

struct DictData {
    entries: HashMap<DictKey, LValueHandle>,
}

/// A value of dict type: a reference-counted map from hashable values to
/// L-value cells.
#[derive(Clone)]
pub struct Dict(Rc<RefCell<DictData>>);

impl Dict {
    pub fn new() -> Self {
        Dict(Rc::new(RefCell::new(DictData {
            entries: HashMap::new(),
        })))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn use_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn intptr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn get(&self, key: &DictKey) -> Option<LValueHandle> {
        self.0.borrow().entries.get(key).cloned()
    }

    /// Looks a key up, inserting a fresh `none` L-value if it's missing, and
    /// returns that cell either way -- matching `TypeDict::subscript`, which
    /// unconditionally materializes a slot on a miss rather than only doing
    /// so when the result is used as an assignment target.
    pub fn subscript_or_insert(&self, key: DictKey) -> LValueHandle {
        self.0
            .borrow_mut()
            .entries
            .entry(key)
            .or_insert_with(|| new_lvalue(Value::None, false))
            .clone()
    }

    pub fn set(&self, key: DictKey, value: Value) {
        match self.0.borrow_mut().entries.entry(key) {
            std::collections::hash_map::Entry::Occupied(e) => {
                e.get().borrow_mut().value = value;
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(new_lvalue(value, false));
            }
        }
    }

    pub fn remove(&self, key: &DictKey) -> Option<Value> {
        self.0
            .borrow_mut()
            .entries
            .remove(key)
            .map(|cell| cell.borrow().value.clone())
    }

    pub fn entries(&self) -> Vec<(DictKey, Value)> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.borrow().value.clone()))
            .collect()
    }

    /// A real deep copy: an empty dict clones for free (nothing to share),
    /// otherwise a fresh backing map is allocated so the clone and the
    /// original evolve independently, unlike an array's lazy COW.
    pub fn deep_clone(&self) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let new_entries: HashMap<DictKey, LValueHandle> = self
            .0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| {
                let cell = v.borrow();
                (k.clone(), new_lvalue(cell.value.clone(), cell.is_const))
            })
            .collect();
        Dict(Rc::new(RefCell::new(DictData {
            entries: new_entries,
        })))
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.0.borrow().entries, &other.0.borrow().entries);
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|(k, v)| {
            b.get(k)
                .is_some_and(|ov| ov.borrow().value == v.borrow().value)
        })
    }
}

impl std::fmt::Debug for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dict").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscript_inserts_none_on_miss() {
        let d = Dict::new();
        assert_eq!(d.len(), 0);
        let cell = d.subscript_or_insert(DictKey::Str("x".into()));
        assert_eq!(cell.borrow().value, Value::None);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn deep_clone_is_independent() {
        let d = Dict::new();
        d.set(DictKey::Int(1), Value::Int(10));
        let clone = d.deep_clone();
        clone.set(DictKey::Int(1), Value::Int(99));
        assert_eq!(d.get(&DictKey::Int(1)).unwrap().borrow().value, Value::Int(10));
    }
}
