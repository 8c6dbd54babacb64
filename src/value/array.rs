//! Slice-aware shared arrays.
//!
//! An array's elements live in a backing [`Vec`] owned by an [`Rc`]. A value
//! of array type is a small *view* onto that backing vector: an offset, a
//! length and a `is_slice` flag. Views are themselves reference-counted
//! (`Rc<RefCell<ArrayView>>`) so that every place holding "the same array
//! value" shares one view and observes the other's mutations, while two
//! *different* array values that happen to share a backing vector (a slice
//! and its parent, or two overlapping slices) stay independent until one of
//! them is mutated.
//!
//! Mutation protocol (see [`Array::prepare_for_mutation`]): a non-slice
//! array with more than one reference to its backing vector must first
//! detach every *other* live slice whose range covers the mutated index, so
//! that code still holding a slice keeps observing the pre-mutation values.
//! A slice itself can never grow or shrink the shared backing, so mutating
//! through a slice always clones its own window into a fresh, unshared
//! vector first.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::lvalue::LValueCell;
use super::Value;

struct ArrayBacking {
    vec: RefCell<Vec<Rc<RefCell<LValueCell>>>>,
    slices: RefCell<Vec<Weak<RefCell<ArrayView>>>>,
}

struct ArrayView {
    backing: Rc<ArrayBacking>,
    offset: usize,
    /// Meaningful only when `is_slice`: the frozen window length. An owner
    /// view's length is always read live off the backing vector (mirroring
    /// `FlatSharedArrayTempl::size()`, which returns `get_ref().size()` for a
    /// non-slice), so that two owner views of "the same array" -- e.g. `a`
    /// and `b` after `var b = a;` -- both observe a push/pop done through
    /// either one.
    fixed_len: usize,
    is_slice: bool,
}

/// A value of array type: a reference-counted, possibly-sliced view onto a
/// shared vector of L-values.
pub struct Array(Rc<RefCell<ArrayView>>);

impl Array {
    pub fn from_values(values: Vec<Value>) -> Self {
        let vec = values
            .into_iter()
            .map(|v| Rc::new(RefCell::new(LValueCell::new(v, false))))
            .collect::<Vec<_>>();
        Self::from_cells(vec)
    }

    pub fn from_cells(vec: Vec<Rc<RefCell<LValueCell>>>) -> Self {
        let backing = Rc::new(ArrayBacking {
            vec: RefCell::new(vec),
            slices: RefCell::new(Vec::new()),
        });
        Array(Rc::new(RefCell::new(ArrayView {
            backing,
            offset: 0,
            fixed_len: 0,
            is_slice: false,
        })))
    }

    pub fn empty() -> Self {
        Self::from_values(Vec::new())
    }

    fn view_len(view: &ArrayView) -> usize {
        if view.is_slice {
            view.fixed_len
        } else {
            view.backing.vec.borrow().len().saturating_sub(view.offset)
        }
    }

    /// Number of elements visible through this view.
    pub fn len(&self) -> usize {
        Self::view_len(&self.0.borrow())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_slice(&self) -> bool {
        self.0.borrow().is_slice
    }

    /// Identity of the backing vector; stable across clones that share a
    /// backing, changes once a detach (explicit clone or COW) happens.
    pub fn intptr(&self) -> usize {
        Rc::as_ptr(&self.0.borrow().backing) as usize
    }

    /// Reference count on the backing vector (not on this particular view).
    pub fn use_count(&self) -> usize {
        Rc::strong_count(&self.0.borrow().backing)
    }

    pub fn cell_at(&self, index: usize) -> Option<Rc<RefCell<LValueCell>>> {
        let view = self.0.borrow();
        if index >= Self::view_len(&view) {
            return None;
        }
        view.backing
            .vec
            .borrow()
            .get(view.offset + index)
            .cloned()
    }

    pub fn values(&self) -> Vec<Value> {
        let view = self.0.borrow();
        let len = Self::view_len(&view);
        let vec = view.backing.vec.borrow();
        vec[view.offset..view.offset + len]
            .iter()
            .map(|c| c.borrow().value.clone())
            .collect()
    }

    /// Build a new view of the `[start, start+len)` window of the same
    /// backing vector, registering it as a live slice so future mutations
    /// through the parent know to detach it.
    pub fn slice_view(&self, start: usize, len: usize) -> Self {
        let view = self.0.borrow();
        let new_view = Rc::new(RefCell::new(ArrayView {
            backing: view.backing.clone(),
            offset: view.offset + start,
            fixed_len: len,
            is_slice: true,
        }));
        view.backing
            .slices
            .borrow_mut()
            .push(Rc::downgrade(&new_view));
        Array(new_view)
    }

    /// Ensures this view is safe to mutate at `local_index` (an index within
    /// `[0, len)` of *this* view), applying the copy-on-write protocol, then
    /// returns the cell to mutate.
    pub fn prepare_for_mutation(&self, local_index: usize) -> Rc<RefCell<LValueCell>> {
        {
            let is_slice = self.0.borrow().is_slice;
            if is_slice {
                self.detach_self();
            } else if Rc::strong_count(&self.0.borrow().backing) > 1 {
                let abs_index = self.0.borrow().offset + local_index;
                self.detach_aliased_slices(abs_index);
            }
        }
        let view = self.0.borrow();
        view.backing.vec.borrow()[view.offset + local_index].clone()
    }

    /// Detaches *this* view from its shared backing by cloning its visible
    /// window into a brand new, uniquely-owned vector.
    pub fn detach_self(&self) {
        let new_vec = {
            let view = self.0.borrow();
            let vec = view.backing.vec.borrow();
            vec[view.offset..view.offset + view.fixed_len]
                .iter()
                .map(|cell| {
                    let old = cell.borrow();
                    Rc::new(RefCell::new(LValueCell::new(old.value.clone(), old.is_const)))
                })
                .collect::<Vec<_>>()
        };

        let mut view = self.0.borrow_mut();
        view.backing = Rc::new(ArrayBacking {
            vec: RefCell::new(new_vec),
            slices: RefCell::new(Vec::new()),
        });
        view.offset = 0;
        view.is_slice = false;
    }

    /// Walks the live sibling slices of our *old* backing and detaches every
    /// one whose window covers `abs_index`, so they keep their pre-mutation
    /// values after we write through this (non-slice) view.
    fn detach_aliased_slices(&self, abs_index: usize) {
        let backing = self.0.borrow().backing.clone();
        let mut alive = Vec::new();
        for weak in backing.slices.borrow().iter() {
            if let Some(sibling) = weak.upgrade() {
                let covers = {
                    let sv = sibling.borrow();
                    Rc::ptr_eq(&sv.backing, &backing)
                        && sv.is_slice
                        && sv.offset <= abs_index
                        && abs_index < sv.offset + sv.fixed_len
                };
                if covers {
                    Array(sibling.clone()).detach_self();
                }
                alive.push(Rc::downgrade(&sibling));
            }
        }
        *backing.slices.borrow_mut() = alive;
    }

    /// Growing never changes the value at an existing index, so unlike
    /// overwrite-mutation this never has to detach sibling slices -- it
    /// only has to refuse to grow a *shared* backing out from under a
    /// slice's own window.
    pub fn push(&self, value: Value) {
        if self.is_slice() {
            self.detach_self();
        }
        let view = self.0.borrow();
        let at = view.offset + Self::view_len(&view);
        view.backing
            .vec
            .borrow_mut()
            .insert(at, Rc::new(RefCell::new(LValueCell::new(value, false))));
    }

    /// Shrinking, unlike growing, can strand a sibling slice whose window
    /// reached the removed index, so siblings covering it are detached
    /// first (mirroring the overwrite-mutation protocol).
    pub fn pop(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        if self.is_slice() {
            self.detach_self();
        } else if Rc::strong_count(&self.0.borrow().backing) > 1 {
            let abs_index = self.0.borrow().offset + Self::view_len(&self.0.borrow()) - 1;
            self.detach_aliased_slices(abs_index);
        }
        let view = self.0.borrow();
        let idx = view.offset + Self::view_len(&view) - 1;
        let removed = view.backing.vec.borrow_mut().remove(idx);
        Some(removed.borrow().value.clone())
    }

    /// Non-slice append: grows the shared backing directly if unshared and
    /// not itself a slice; otherwise builds a fresh concatenated vector.
    pub fn concat(&self, other: &Array) -> Array {
        let mut values = self.values();
        values.extend(other.values());
        Array::from_values(values)
    }

    /// Appends every element of `other` one at a time through [`Array::push`],
    /// so a slice receiver still detaches from its shared backing exactly
    /// once before growing (rather than duplicating that logic here).
    pub fn append_in_place(&mut self, other: &Array) {
        for v in other.values() {
            self.push(v);
        }
    }
}

impl Clone for Array {
    /// Produces an independent *view* that shares the same backing vector:
    /// mirrors the original's array copy-constructor, which duplicates the
    /// (offset, len, is_slice) view and registers a fresh slice entry if
    /// `is_slice` is set.
    fn clone(&self) -> Self {
        let view = self.0.borrow();
        let new_view = Rc::new(RefCell::new(ArrayView {
            backing: view.backing.clone(),
            offset: view.offset,
            fixed_len: view.fixed_len,
            is_slice: view.is_slice,
        }));
        if view.is_slice {
            view.backing
                .slices
                .borrow_mut()
                .push(Rc::downgrade(&new_view));
        }
        Array(new_view)
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let av = self.values();
        let bv = other.values();
        av.iter().zip(bv.iter()).all(|(x, y)| x == y)
    }
}

impl std::fmt::Debug for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("len", &self.len())
            .field("is_slice", &self.is_slice())
            .finish()
    }
}
