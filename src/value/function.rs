//! Function values: an immutable declaration node plus a capture snapshot.

use std::rc::Rc;

use crate::env::Environment;
use crate::syntax::FuncDecl;

use super::lvalue::LValueHandle;

/// A closure's capture environment: the scope a call's fresh frame is
/// rooted at, plus a snapshot of any explicitly `[captured]` names taken at
/// closure-creation time. `root` is the program's global scope for an
/// ordinary function and the const-only root for a `pure` one (spec.md
/// §4.3, §4.5) -- never the lexical chain at the definition site, so a
/// function never implicitly closes over an enclosing block's locals.
#[derive(Clone)]
pub struct CaptureEnv {
    pub root: Environment,
    pub symbols: Vec<(String, LValueHandle)>,
}

impl CaptureEnv {
    pub fn get(&self, name: &str) -> Option<LValueHandle> {
        self.symbols
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

impl std::fmt::Debug for CaptureEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureEnv")
            .field("captured", &self.symbols.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

struct FunctionData {
    decl: Rc<FuncDecl>,
    capture: CaptureEnv,
}

/// A value of function type: reference-counted so that `clone()` on an empty
/// capture list is free (mirrors `TypeFunc::clone`, which returns the same
/// `EvalValue` when there's nothing captured to duplicate).
#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

impl Function {
    pub fn new(decl: Rc<FuncDecl>, capture: CaptureEnv) -> Self {
        Function(Rc::new(FunctionData { decl, capture }))
    }

    pub fn decl(&self) -> &Rc<FuncDecl> {
        &self.0.decl
    }

    pub fn capture(&self) -> &CaptureEnv {
        &self.0.capture
    }

    pub fn is_pure(&self) -> bool {
        self.0.decl.is_pure
    }

    pub fn use_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn intptr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// A real duplicate of the capture environment when there's anything to
    /// duplicate; otherwise the same reference-counted handle, matching
    /// `TypeFunc::clone`'s "nothing captured -> return the same value" path.
    pub fn deep_clone(&self) -> Self {
        if self.0.capture.symbols.is_empty() {
            return self.clone();
        }
        let capture = CaptureEnv {
            root: self.0.capture.root.clone(),
            symbols: self.0.capture.symbols.clone(),
        };
        Function(Rc::new(FunctionData {
            decl: self.0.decl.clone(),
            capture,
        }))
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<function>")
    }
}
