//! The object engine: field tables, inheritance, and lookup.
//!
//! An object is either *simple* (one field table plus captured upvalues and
//! assertions) or *extended* (an ordered pair `left + right` where `right`
//! overrides). Merge is O(1); all cost is deferred to lookup, which walks
//! the inheritance chain from the most derived side. Field bodies are
//! *unbound* until looked up: binding supplies `self` (always the whole,
//! outermost object) and the depth `super` resolves past.
//!
//! Per-instance caches keep lookup and assertion checking single-shot: a
//! field bound through a given root object is bound once, and an object's
//! assertions run at most once, with the failure cached.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use jsonnet_ir::{ExprId, Hide, LocationRange, Name, SharedArena, StringInterner};

use crate::builtins::Builtin;
use crate::environment::{BindingFrame, Environment, SelfBinding};
use crate::errors::EvalError;
use crate::thunk::Thunk;
use crate::value::{FuncValue, Value};

/// A field body that still needs a `self`/`super` binding to evaluate.
pub enum UnboundField {
    /// Ordinary field body; evaluates under the object's upvalues plus the
    /// supplied object frame.
    Code { arena: SharedArena, body: ExprId },
    /// `+:` field: the produced value is `super.f + body`, or just `body`
    /// when no ancestor defines `f`.
    PlusSuper { inner: Rc<UnboundField> },
    /// Wrapper that swaps in a different upvalue frame at bind time; used
    /// by `$objectFlatMerge` to keep each merged field's original scope.
    Bindings {
        inner: Rc<UnboundField>,
        upvalues: BindingFrame,
    },
    /// Builtin function field of the `std` object.
    Builtin(Builtin),
}

impl UnboundField {
    fn loc(&self) -> LocationRange {
        match self {
            UnboundField::Code { arena, body } => arena.loc(*body).clone(),
            UnboundField::PlusSuper { inner } => inner.loc(),
            UnboundField::Bindings { inner, .. } => inner.loc(),
            UnboundField::Builtin(_) => LocationRange::message("<builtin>"),
        }
    }

    /// Bind to a concrete object frame, producing the field's thunk.
    ///
    /// `sb.super_depth` must be the inheritance depth at which this field's
    /// definition was found, so `super` inside the body resolves past it.
    pub(crate) fn bind(
        &self,
        sb: &SelfBinding,
        upvalues: &BindingFrame,
        name: Name,
        interner: &StringInterner,
    ) -> Thunk {
        match self {
            UnboundField::Code { arena, body } => {
                let env = Environment::from_frame(upvalues.clone(), Some(sb.clone()));
                Thunk::pending(
                    env,
                    arena.clone(),
                    *body,
                    format!("object <{}>", interner.lookup(name)),
                    self.loc(),
                )
            }
            UnboundField::PlusSuper { inner } => {
                let right = inner.bind(sb, upvalues, name, interner);
                match try_object_index(&sb.super_binding(), name, interner) {
                    Some(left) => Thunk::deferred_call(
                        Rc::new(FuncValue::Builtin(Builtin::Plus)),
                        vec![left, right],
                        format!("object <{}>", interner.lookup(name)),
                        self.loc(),
                    ),
                    None => right,
                }
            }
            UnboundField::Bindings { inner, upvalues } => {
                inner.bind(sb, upvalues, name, interner)
            }
            UnboundField::Builtin(b) => Thunk::ready(Value::builtin(*b)),
        }
    }
}

/// One entry of a simple object's field table.
#[derive(Clone)]
pub struct SimpleField {
    pub hide: Hide,
    pub field: Rc<UnboundField>,
}

/// One object-level assertion; the desugarer guarantees the expression
/// either evaluates to `true` or raises.
pub struct ObjectAssert {
    pub arena: SharedArena,
    pub expr: ExprId,
}

/// Assertion progress for one object instance.
pub(crate) enum AssertState {
    Unchecked,
    /// Re-entrant check (an assertion reads a field of the same object);
    /// treated as passed to avoid a livelock.
    InProgress,
    Checked,
    Failed(EvalError),
}

/// Per-instance caches, keyed by the instance acting as lookup root.
pub(crate) struct ObjectCaches {
    /// Bound field thunks by (name, starting super depth).
    pub(crate) fields: RefCell<FxHashMap<(Name, usize), Thunk>>,
    pub(crate) asserts: RefCell<AssertState>,
}

impl Default for ObjectCaches {
    fn default() -> Self {
        ObjectCaches {
            fields: RefCell::new(FxHashMap::default()),
            asserts: RefCell::new(AssertState::Unchecked),
        }
    }
}

/// Object with a single field table.
pub struct SimpleObject {
    /// Environment captured when the object literal was evaluated.
    pub upvalues: BindingFrame,
    pub fields: FxHashMap<Name, SimpleField>,
    pub asserts: Vec<ObjectAssert>,
    pub(crate) caches: ObjectCaches,
}

impl SimpleObject {
    pub fn new(
        upvalues: BindingFrame,
        fields: FxHashMap<Name, SimpleField>,
        asserts: Vec<ObjectAssert>,
    ) -> Self {
        SimpleObject {
            upvalues,
            fields,
            asserts,
            caches: ObjectCaches::default(),
        }
    }
}

/// Inheritance pair: `right` extends `left`.
pub struct ExtendedObject {
    pub left: ObjectValue,
    pub right: ObjectValue,
    /// Number of simple objects in the subtree; lets `super` depths be
    /// computed without re-walking.
    pub simple_count: usize,
    pub(crate) caches: ObjectCaches,
}

/// An object value: one simple table or an inheritance pair.
#[derive(Clone)]
pub enum ObjectValue {
    Simple(Rc<SimpleObject>),
    Extended(Rc<ExtendedObject>),
}

impl ObjectValue {
    pub fn simple(obj: SimpleObject) -> Self {
        ObjectValue::Simple(Rc::new(obj))
    }

    /// Merge: `right` extends `left`. O(1); assertions of both survive.
    pub fn extend(left: ObjectValue, right: ObjectValue) -> Self {
        let simple_count = left.simple_count() + right.simple_count();
        ObjectValue::Extended(Rc::new(ExtendedObject {
            left,
            right,
            simple_count,
            caches: ObjectCaches::default(),
        }))
    }

    pub fn simple_count(&self) -> usize {
        match self {
            ObjectValue::Simple(_) => 1,
            ObjectValue::Extended(e) => e.simple_count,
        }
    }

    pub(crate) fn caches(&self) -> &ObjectCaches {
        match self {
            ObjectValue::Simple(s) => &s.caches,
            ObjectValue::Extended(e) => &e.caches,
        }
    }
}

/// Find the most derived definition of `name`, skipping the first
/// `start_from` simple objects (counted from the most derived side).
///
/// Returns the defining simple object and its depth from the root.
pub(crate) fn find_field(
    obj: &ObjectValue,
    start_from: usize,
    name: Name,
) -> Option<(Rc<SimpleObject>, usize)> {
    fn walk(
        obj: &ObjectValue,
        start_from: usize,
        name: Name,
        counter: &mut usize,
    ) -> Option<(Rc<SimpleObject>, usize)> {
        match obj {
            ObjectValue::Extended(e) => walk(&e.right, start_from, name, counter)
                .or_else(|| walk(&e.left, start_from, name, counter)),
            ObjectValue::Simple(s) => {
                let depth = *counter;
                *counter += 1;
                if depth >= start_from && s.fields.contains_key(&name) {
                    Some((s.clone(), depth))
                } else {
                    None
                }
            }
        }
    }
    let mut counter = 0;
    walk(obj, start_from, name, &mut counter)
}

/// Resolve `name` through `sb`, producing (and caching) the bound thunk.
///
/// Hidden fields are always reachable through indexing; visibility only
/// matters for enumeration and manifestation.
pub(crate) fn try_object_index(
    sb: &SelfBinding,
    name: Name,
    interner: &StringInterner,
) -> Option<Thunk> {
    let caches = sb.object.caches();
    if let Some(t) = caches.fields.borrow().get(&(name, sb.super_depth)) {
        return Some(t.clone());
    }
    let (def, found_at) = find_field(&sb.object, sb.super_depth, name)?;
    let field = &def.fields[&name];
    let bind_sb = SelfBinding {
        object: sb.object.clone(),
        super_depth: found_at,
    };
    let thunk = field.field.bind(&bind_sb, &def.upvalues, name, interner);
    caches
        .fields
        .borrow_mut()
        .insert((name, sb.super_depth), thunk.clone());
    Some(thunk)
}

/// Effective visibility of every field.
///
/// The most derived definition decides, except that an `Inherit` (single
/// colon) definition takes the flag of the definition it overrides.
pub(crate) fn field_visibility(obj: &ObjectValue) -> FxHashMap<Name, Hide> {
    match obj {
        ObjectValue::Simple(s) => s
            .fields
            .iter()
            .map(|(&name, field)| (name, field.hide))
            .collect(),
        ObjectValue::Extended(e) => {
            let mut result = field_visibility(&e.left);
            for (name, hide) in field_visibility(&e.right) {
                match hide {
                    Hide::Inherit => {
                        result.entry(name).or_insert(Hide::Inherit);
                    }
                    Hide::Hidden | Hide::Visible => {
                        result.insert(name, hide);
                    }
                }
            }
            result
        }
    }
}

/// The field names of `obj`, unsorted.
pub fn field_names(obj: &ObjectValue, include_hidden: bool) -> Vec<Name> {
    field_visibility(obj)
        .into_iter()
        .filter(|&(_, hide)| include_hidden || hide != Hide::Hidden)
        .map(|(name, _)| name)
        .collect()
}

/// Whether `obj` has a field, honoring the hidden-visibility flag.
pub fn has_field(obj: &ObjectValue, name: Name, include_hidden: bool) -> bool {
    field_visibility(obj)
        .get(&name)
        .is_some_and(|&hide| include_hidden || hide != Hide::Hidden)
}
