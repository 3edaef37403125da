//! Environments: identifier-to-thunk frames plus the object frame.
//!
//! Environments are immutable once populated and share structure through
//! `Rc` parent links, so extending one allocates only a delta. The
//! `RefCell` around each frame's bindings exists solely for construction:
//! `local` binds are mutually recursive, so the frame must be allocated
//! before the thunks that close over it are inserted.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use jsonnet_ir::Name;

use crate::object::ObjectValue;
use crate::thunk::Thunk;

/// A set of bindings captured or introduced at one scope level.
pub type BindingFrame = FxHashMap<Name, Thunk>;

/// The object frame: the current `self` and how many inheritance levels
/// `super` has already skipped.
#[derive(Clone)]
pub struct SelfBinding {
    pub object: ObjectValue,
    pub super_depth: usize,
}

impl SelfBinding {
    pub fn new(object: ObjectValue) -> Self {
        SelfBinding {
            object,
            super_depth: 0,
        }
    }

    /// The frame one inheritance level deeper; used by `super` and
    /// `in super`.
    #[must_use]
    pub fn super_binding(&self) -> SelfBinding {
        SelfBinding {
            object: self.object.clone(),
            super_depth: self.super_depth + 1,
        }
    }
}

struct EnvNode {
    bindings: RefCell<BindingFrame>,
    self_binding: Option<SelfBinding>,
    parent: Option<Environment>,
}

/// Immutable mapping from identifier to thunk, with structural sharing.
#[derive(Clone)]
pub struct Environment {
    node: Rc<EnvNode>,
}

impl Environment {
    /// Root environment for a program; holds `std` and nothing else.
    pub fn root(bindings: BindingFrame) -> Self {
        Environment {
            node: Rc::new(EnvNode {
                bindings: RefCell::new(bindings),
                self_binding: None,
                parent: None,
            }),
        }
    }

    /// Standalone frame with an explicit object frame; used when binding
    /// object fields and when functions capture their definition site.
    pub fn from_frame(bindings: BindingFrame, self_binding: Option<SelfBinding>) -> Self {
        Environment {
            node: Rc::new(EnvNode {
                bindings: RefCell::new(bindings),
                self_binding,
                parent: None,
            }),
        }
    }

    /// New empty child frame. The object frame is inherited from the
    /// nearest ancestor that has one.
    #[must_use]
    pub fn extend(&self) -> Environment {
        Environment {
            node: Rc::new(EnvNode {
                bindings: RefCell::new(BindingFrame::default()),
                self_binding: None,
                parent: Some(self.clone()),
            }),
        }
    }

    /// Insert a binding into this frame.
    ///
    /// Only used while a frame is being populated; `local` binds insert
    /// thunks that already close over the frame they are inserted into.
    pub fn define(&self, name: Name, thunk: Thunk) {
        self.node.bindings.borrow_mut().insert(name, thunk);
    }

    /// Look up an identifier, walking parent frames.
    pub fn lookup(&self, name: Name) -> Option<Thunk> {
        let mut current = Some(self);
        while let Some(env) = current {
            if let Some(t) = env.node.bindings.borrow().get(&name) {
                return Some(t.clone());
            }
            current = env.node.parent.as_ref();
        }
        None
    }

    /// The nearest enclosing object frame, if any.
    pub fn self_binding(&self) -> Option<SelfBinding> {
        let mut current = Some(self);
        while let Some(env) = current {
            if let Some(sb) = &env.node.self_binding {
                return Some(sb.clone());
            }
            current = env.node.parent.as_ref();
        }
        None
    }

    /// Capture the thunks for the given free variables into a flat frame.
    ///
    /// Variables the analyzer listed but this environment cannot see are
    /// skipped; the evaluator reports them when looked up.
    pub fn capture(&self, free_vars: &[Name]) -> BindingFrame {
        let mut frame = BindingFrame::default();
        for &name in free_vars {
            if let Some(t) = self.lookup(name) {
                frame.insert(name, t);
            }
        }
        frame
    }
}
