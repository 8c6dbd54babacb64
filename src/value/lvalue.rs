//! L-value cells: the mutable storage behind identifiers, array elements and
//! dictionary entries.

use std::cell::RefCell;
use std::rc::Rc;

use super::array::Array;
use super::dict::{Dict, DictKey};
use super::Value;

/// Where a subscript-produced L-value is anchored, so an assignment through
/// it can trigger the container's own mutation protocol (the array
/// copy-on-write dance; a plain insert for dictionaries).
#[derive(Clone)]
pub enum ContainerBackLink {
    Array { array: Array, index: usize },
    Dict { dict: Dict, key: DictKey },
}

pub struct LValueCell {
    pub value: Value,
    pub is_const: bool,
    pub container: Option<ContainerBackLink>,
}

impl LValueCell {
    pub fn new(value: Value, is_const: bool) -> Self {
        Self {
            value,
            is_const,
            container: None,
        }
    }

    pub fn with_container(value: Value, is_const: bool, container: ContainerBackLink) -> Self {
        Self {
            value,
            is_const,
            container: Some(container),
        }
    }
}

pub type LValueHandle = Rc<RefCell<LValueCell>>;

pub fn new_lvalue(value: Value, is_const: bool) -> LValueHandle {
    Rc::new(RefCell::new(LValueCell::new(value, is_const)))
}

pub fn new_lvalue_with_container(
    value: Value,
    is_const: bool,
    container: ContainerBackLink,
) -> LValueHandle {
    Rc::new(RefCell::new(LValueCell::with_container(
        value, is_const, container,
    )))
}

/// Writes `new_value` through an L-value, honoring its container back-link
/// if it has one: an array-backed cell routes through
/// [`Array::prepare_for_mutation`] (the copy-on-write dance) so the write
/// lands on the live, correctly-detached cell rather than on this possibly
/// now-stale snapshot; a dict-backed cell just upserts the key (dicts never
/// need detaching); a plain cell (an identifier or a captured variable)
/// is written in place.
pub fn put(handle: &LValueHandle, new_value: Value) {
    let container = handle.borrow().container.clone();
    match container {
        None => handle.borrow_mut().value = new_value,
        Some(ContainerBackLink::Array { array, index }) => {
            let live_cell = array.prepare_for_mutation(index);
            live_cell.borrow_mut().value = new_value;
        }
        Some(ContainerBackLink::Dict { dict, key }) => {
            dict.set(key, new_value);
        }
    }
}
