//! Builtin functions and the `std` object.
//!
//! Dispatch is direct enum matching: the builtin set is fixed, so pattern
//! matching beats trait objects for exhaustiveness and speed. Builtins
//! receive their arguments as thunks; laziness is what lets `&&`/`||`
//! short-circuit and lets `makeArray`/`map` keep elements unevaluated.
//!
//! `$objectFlatMerge` is internal plumbing for desugared object
//! comprehensions; `mod`, `equals`, `notEquals`, and `objectHasAll` are the
//! helpers desugaring emits for `%`, `==`, `!=`, and `in`.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use jsonnet_ir::{Hide, Name, SharedInterner};

use crate::environment::{BindingFrame, SelfBinding};
use crate::errors::{
    codepoint_wrong_length, division_by_zero, function_equality, internal_error, invalid_codepoint,
    length_unsupported, mod_unsupported, negative_codepoint, order_comparison_unsupported,
    primitive_equals_non_primitive, undefined_external_variable, EvalResult,
};
use crate::interpreter::Interpreter;
use crate::object::{
    field_names, has_field, ObjectValue, SimpleField, SimpleObject, UnboundField,
};
use crate::thunk::Thunk;
use crate::value::Value;

/// Maximum allowed unicode code point.
const CODEPOINT_MAX: f64 = 0x10FFFF as f64;

/// Builtin dispatch tags.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Builtin {
    // Binary operators
    Plus,
    Minus,
    Mult,
    Div,
    ShiftL,
    ShiftR,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,

    // Unary operators
    Not,
    BitNeg,
    UnaryPlus,
    UnaryMinus,

    // std members
    ExtVar,
    Length,
    ToString,
    MakeArray,
    FlatMap,
    Filter,
    Map,
    PrimitiveEquals,
    Equals,
    NotEquals,
    Mod,
    ObjectHasAll,
    ObjectFieldsEx,
    ObjectHasEx,
    Type,
    Char,
    Codepoint,
    Ceil,
    Floor,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Log,
    Exp,
    Mantissa,
    Exponent,
    Pow,
    Modulo,
    Md5,
    ObjectFlatMerge,
}

impl Builtin {
    /// Display name used in trace frames and `std` field names.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Plus => "operator+",
            Builtin::Minus => "operator-",
            Builtin::Mult => "operator*",
            Builtin::Div => "operator/",
            Builtin::ShiftL => "operator<<",
            Builtin::ShiftR => "operator>>",
            Builtin::Greater => "operator>",
            Builtin::GreaterEq => "operator>=",
            Builtin::Less => "operator<",
            Builtin::LessEq => "operator<=",
            Builtin::BitAnd => "operator&",
            Builtin::BitXor => "operator^",
            Builtin::BitOr => "operator|",
            Builtin::And => "operator&&",
            Builtin::Or => "operator||",
            Builtin::Not => "operator!",
            Builtin::BitNeg => "operator~",
            Builtin::UnaryPlus => "operator+ (unary)",
            Builtin::UnaryMinus => "operator- (unary)",
            Builtin::ExtVar => "extVar",
            Builtin::Length => "length",
            Builtin::ToString => "toString",
            Builtin::MakeArray => "makeArray",
            Builtin::FlatMap => "flatMap",
            Builtin::Filter => "filter",
            Builtin::Map => "map",
            Builtin::PrimitiveEquals => "primitiveEquals",
            Builtin::Equals => "equals",
            Builtin::NotEquals => "notEquals",
            Builtin::Mod => "mod",
            Builtin::ObjectHasAll => "objectHasAll",
            Builtin::ObjectFieldsEx => "objectFieldsEx",
            Builtin::ObjectHasEx => "objectHasEx",
            Builtin::Type => "type",
            Builtin::Char => "char",
            Builtin::Codepoint => "codepoint",
            Builtin::Ceil => "ceil",
            Builtin::Floor => "floor",
            Builtin::Sqrt => "sqrt",
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Asin => "asin",
            Builtin::Acos => "acos",
            Builtin::Atan => "atan",
            Builtin::Log => "log",
            Builtin::Exp => "exp",
            Builtin::Mantissa => "mantissa",
            Builtin::Exponent => "exponent",
            Builtin::Pow => "pow",
            Builtin::Modulo => "modulo",
            Builtin::Md5 => "md5",
            Builtin::ObjectFlatMerge => "$objectFlatMerge",
        }
    }

    /// Declared parameter names, used for arity checks, named-argument
    /// binding, and `std.length` on builtin functions.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Builtin::Plus
            | Builtin::Minus
            | Builtin::Mult
            | Builtin::Div
            | Builtin::ShiftL
            | Builtin::ShiftR
            | Builtin::Greater
            | Builtin::GreaterEq
            | Builtin::Less
            | Builtin::LessEq
            | Builtin::BitAnd
            | Builtin::BitXor
            | Builtin::BitOr
            | Builtin::And
            | Builtin::Or
            | Builtin::PrimitiveEquals
            | Builtin::Equals
            | Builtin::NotEquals
            | Builtin::Mod
            | Builtin::Modulo => &["x", "y"],

            Builtin::Not
            | Builtin::BitNeg
            | Builtin::UnaryPlus
            | Builtin::UnaryMinus
            | Builtin::ExtVar
            | Builtin::Length
            | Builtin::ToString
            | Builtin::Type
            | Builtin::Char
            | Builtin::Codepoint
            | Builtin::Ceil
            | Builtin::Floor
            | Builtin::Sqrt
            | Builtin::Sin
            | Builtin::Cos
            | Builtin::Tan
            | Builtin::Asin
            | Builtin::Acos
            | Builtin::Atan
            | Builtin::Log
            | Builtin::Exp
            | Builtin::Mantissa
            | Builtin::Exponent
            | Builtin::Md5
            | Builtin::ObjectFlatMerge => &["x"],

            Builtin::MakeArray => &["sz", "func"],
            Builtin::FlatMap | Builtin::Filter | Builtin::Map => &["func", "arr"],
            Builtin::ObjectHasAll => &["o", "f"],
            Builtin::ObjectFieldsEx => &["obj", "hidden"],
            Builtin::ObjectHasEx => &["obj", "fname", "hidden"],
            Builtin::Pow => &["base", "exp"],
        }
    }
}

/// Builtins exposed as fields of the `std` object.
pub(crate) const STD_MEMBERS: &[Builtin] = &[
    Builtin::ExtVar,
    Builtin::Length,
    Builtin::ToString,
    Builtin::MakeArray,
    Builtin::FlatMap,
    Builtin::Filter,
    Builtin::Map,
    Builtin::PrimitiveEquals,
    Builtin::Equals,
    Builtin::NotEquals,
    Builtin::Mod,
    Builtin::ObjectHasAll,
    Builtin::ObjectFieldsEx,
    Builtin::ObjectHasEx,
    Builtin::Type,
    Builtin::Char,
    Builtin::Codepoint,
    Builtin::Ceil,
    Builtin::Floor,
    Builtin::Sqrt,
    Builtin::Sin,
    Builtin::Cos,
    Builtin::Tan,
    Builtin::Asin,
    Builtin::Acos,
    Builtin::Atan,
    Builtin::Log,
    Builtin::Exp,
    Builtin::Mantissa,
    Builtin::Exponent,
    Builtin::Pow,
    Builtin::Modulo,
    Builtin::Md5,
    Builtin::ObjectFlatMerge,
];

/// Build the `std` object: a simple object whose fields are the builtin
/// functions, all hidden so they never manifest.
pub(crate) fn make_std_object(interner: &SharedInterner) -> ObjectValue {
    let mut fields = FxHashMap::default();
    for &b in STD_MEMBERS {
        fields.insert(
            interner.intern(b.name()),
            SimpleField {
                hide: Hide::Hidden,
                field: Rc::new(UnboundField::Builtin(b)),
            },
        );
    }
    ObjectValue::simple(SimpleObject::new(BindingFrame::default(), fields, vec![]))
}

/// Evaluate a builtin on already-bound argument thunks.
///
/// The caller has validated arity against [`Builtin::params`].
pub(crate) fn dispatch_builtin(i: &mut Interpreter, b: Builtin, args: &[Thunk]) -> EvalResult {
    debug_assert_eq!(args.len(), b.params().len(), "arity for {}", b.name());
    match b {
        Builtin::Plus => builtin_plus(i, &args[0], &args[1]),
        Builtin::Minus => {
            let x = i.force_number(&args[0])?;
            let y = i.force_number(&args[1])?;
            i.double_check(x - y).map(Value::Number)
        }
        Builtin::Mult => {
            let x = i.force_number(&args[0])?;
            let y = i.force_number(&args[1])?;
            i.double_check(x * y).map(Value::Number)
        }
        Builtin::Div => {
            let x = i.force_number(&args[0])?;
            let y = i.force_number(&args[1])?;
            if y == 0.0 {
                return i.fail(division_by_zero());
            }
            i.double_check(x / y).map(Value::Number)
        }
        Builtin::Modulo => {
            let x = i.force_number(&args[0])?;
            let y = i.force_number(&args[1])?;
            if y == 0.0 {
                return i.fail(division_by_zero());
            }
            i.double_check(x % y).map(Value::Number)
        }

        Builtin::Less => builtin_less(i, &args[0], &args[1]),
        Builtin::Greater => builtin_less(i, &args[1], &args[0]),
        Builtin::GreaterEq => match builtin_less(i, &args[0], &args[1])? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => i.fail(internal_error("comparison produced a non-boolean")),
        },
        Builtin::LessEq => match builtin_less(i, &args[1], &args[0])? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => i.fail(internal_error("comparison produced a non-boolean")),
        },

        Builtin::And => {
            if !i.force_boolean(&args[0])? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(i.force_boolean(&args[1])?))
        }
        Builtin::Or => {
            if i.force_boolean(&args[0])? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(i.force_boolean(&args[1])?))
        }

        Builtin::ShiftL => builtin_bitwise(i, &args[0], &args[1], |x, s| {
            if (0..64).contains(&s) {
                x << s
            } else {
                0
            }
        }),
        Builtin::ShiftR => builtin_bitwise(i, &args[0], &args[1], |x, s| {
            if (0..64).contains(&s) {
                x >> s
            } else {
                x >> 63
            }
        }),
        Builtin::BitAnd => builtin_bitwise(i, &args[0], &args[1], |x, y| x & y),
        Builtin::BitOr => builtin_bitwise(i, &args[0], &args[1], |x, y| x | y),
        Builtin::BitXor => builtin_bitwise(i, &args[0], &args[1], |x, y| x ^ y),

        Builtin::Not => Ok(Value::Bool(!i.force_boolean(&args[0])?)),
        Builtin::BitNeg => {
            let x = i.force_number(&args[0])?;
            i.double_check(!(x as i64) as f64).map(Value::Number)
        }
        // Unary + is the identity.
        Builtin::UnaryPlus => i.force(&args[0]),
        Builtin::UnaryMinus => Ok(Value::Number(-i.force_number(&args[0])?)),

        Builtin::ExtVar => {
            let name = i.force_string(&args[0])?;
            let key = i.interner.intern(&name);
            match i.ext_vars.get(&key).cloned() {
                Some(t) => i.force(&t),
                None => i.fail(undefined_external_variable(&name)),
            }
        }

        Builtin::Length => builtin_length(i, &args[0]),
        Builtin::ToString => {
            let v = i.force(&args[0])?;
            if let Value::Str(_) = v {
                return Ok(v);
            }
            i.to_display_string(&v).map(Value::string)
        }
        Builtin::Type => {
            let v = i.force(&args[0])?;
            Ok(Value::string(v.type_name()))
        }

        Builtin::MakeArray => {
            let sz = i.force_number(&args[0])?;
            let func = i.force_function(&args[1])?;
            let count = if sz > 0.0 { sz as usize } else { 0 };
            let elements = (0..count)
                .map(|idx| {
                    Thunk::deferred_call(
                        func.clone(),
                        vec![Thunk::ready(Value::Number(idx as f64))],
                        format!("array element {idx}"),
                        jsonnet_ir::LocationRange::message("<builtin>"),
                    )
                })
                .collect();
            Ok(Value::array(elements))
        }
        Builtin::FlatMap => {
            let func = i.force_function(&args[0])?;
            let arr = i.force_array(&args[1])?;
            let mut elements = Vec::with_capacity(arr.elements.len());
            for elem in &arr.elements {
                let returned = i.call_with_thunks(&func, vec![elem.clone()])?;
                let inner = i.as_array(returned)?;
                elements.extend(inner.elements.iter().cloned());
            }
            Ok(Value::array(elements))
        }
        Builtin::Filter => {
            let func = i.force_function(&args[0])?;
            let arr = i.force_array(&args[1])?;
            let mut elements = Vec::with_capacity(arr.elements.len());
            for elem in &arr.elements {
                let included = i.call_with_thunks(&func, vec![elem.clone()])?;
                if i.as_boolean(included)? {
                    elements.push(elem.clone());
                }
            }
            Ok(Value::array(elements))
        }
        Builtin::Map => {
            let func = i.force_function(&args[0])?;
            let arr = i.force_array(&args[1])?;
            let elements = arr
                .elements
                .iter()
                .enumerate()
                .map(|(idx, elem)| {
                    Thunk::deferred_call(
                        func.clone(),
                        vec![elem.clone()],
                        format!("array element {idx}"),
                        jsonnet_ir::LocationRange::message("<builtin>"),
                    )
                })
                .collect();
            Ok(Value::array(elements))
        }

        Builtin::PrimitiveEquals => builtin_primitive_equals(i, &args[0], &args[1]),
        Builtin::Equals => {
            let x = i.force(&args[0])?;
            let y = i.force(&args[1])?;
            deep_equals(i, &x, &y).map(Value::Bool)
        }
        Builtin::NotEquals => {
            let x = i.force(&args[0])?;
            let y = i.force(&args[1])?;
            deep_equals(i, &x, &y).map(|eq| Value::Bool(!eq))
        }
        Builtin::Mod => {
            let x = i.force(&args[0])?;
            let y = i.force(&args[1])?;
            match (&x, &y) {
                (Value::Number(a), Value::Number(b)) => {
                    if *b == 0.0 {
                        return i.fail(division_by_zero());
                    }
                    i.double_check(a % b).map(Value::Number)
                }
                _ => i.fail(mod_unsupported(x.type_name(), y.type_name())),
            }
        }

        Builtin::ObjectHasAll => {
            let obj = i.force_object(&args[0])?;
            let fname = i.force_string(&args[1])?;
            let name = i.interner.intern(&fname);
            Ok(Value::Bool(has_field(&obj, name, true)))
        }
        Builtin::ObjectFieldsEx => {
            let obj = i.force_object(&args[0])?;
            let include_hidden = i.force_boolean(&args[1])?;
            let names = i.sorted_field_names(&obj, include_hidden);
            let elements = names
                .into_iter()
                .map(|n| Thunk::ready(Value::string(i.interner.lookup(n))))
                .collect();
            Ok(Value::array(elements))
        }
        Builtin::ObjectHasEx => {
            let obj = i.force_object(&args[0])?;
            let fname = i.force_string(&args[1])?;
            let include_hidden = i.force_boolean(&args[2])?;
            let name = i.interner.intern(&fname);
            Ok(Value::Bool(has_field(&obj, name, include_hidden)))
        }

        Builtin::Char => {
            let x = i.force_number(&args[0])?;
            if x > CODEPOINT_MAX {
                return i.fail(invalid_codepoint(x));
            }
            if x < 0.0 {
                return i.fail(negative_codepoint(x));
            }
            match char::from_u32(x as u32) {
                Some(c) => Ok(Value::string(c.to_string())),
                None => i.fail(invalid_codepoint(x)),
            }
        }
        Builtin::Codepoint => {
            let s = i.force_string(&args[0])?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Number(c as u32 as f64)),
                _ => i.fail(codepoint_wrong_length(s.chars().count())),
            }
        }

        Builtin::Ceil => builtin_numeric(i, &args[0], f64::ceil),
        Builtin::Floor => builtin_numeric(i, &args[0], f64::floor),
        Builtin::Sqrt => builtin_numeric(i, &args[0], f64::sqrt),
        Builtin::Sin => builtin_numeric(i, &args[0], f64::sin),
        Builtin::Cos => builtin_numeric(i, &args[0], f64::cos),
        Builtin::Tan => builtin_numeric(i, &args[0], f64::tan),
        Builtin::Asin => builtin_numeric(i, &args[0], f64::asin),
        Builtin::Acos => builtin_numeric(i, &args[0], f64::acos),
        Builtin::Atan => builtin_numeric(i, &args[0], f64::atan),
        Builtin::Log => builtin_numeric(i, &args[0], f64::ln),
        Builtin::Exp => builtin_numeric(i, &args[0], f64::exp),
        Builtin::Mantissa => builtin_numeric(i, &args[0], |x| frexp(x).0),
        Builtin::Exponent => builtin_numeric(i, &args[0], |x| frexp(x).1 as f64),
        Builtin::Pow => {
            let base = i.force_number(&args[0])?;
            let exp = i.force_number(&args[1])?;
            i.double_check(base.powf(exp)).map(Value::Number)
        }

        Builtin::Md5 => {
            let s = i.force_string(&args[0])?;
            let digest = md5::compute(s.as_bytes());
            Ok(Value::string(format!("{digest:x}")))
        }

        Builtin::ObjectFlatMerge => builtin_object_flat_merge(i, &args[0]),
    }
}

/// Polymorphic `+`: numbers add, strings concatenate (coercing the other
/// side through `toString`), arrays concatenate, objects merge.
fn builtin_plus(i: &mut Interpreter, xp: &Thunk, yp: &Thunk) -> EvalResult {
    let x = i.force(xp)?;
    let y = i.force(yp)?;
    if let Value::Str(right) = &y {
        if !matches!(x, Value::Str(_)) {
            let left = i.to_display_string(&x)?;
            return Ok(Value::string(format!("{left}{right}")));
        }
    }
    match x {
        Value::Number(a) => {
            let b = i.as_number(y)?;
            i.double_check(a + b).map(Value::Number)
        }
        Value::Str(left) => {
            let right = match y {
                Value::Str(s) => s.to_string(),
                other => i.to_display_string(&other)?,
            };
            Ok(Value::string(format!("{left}{right}")))
        }
        Value::Object(left) => {
            let right = i.as_object(y)?;
            Ok(Value::Object(ObjectValue::extend(left, right)))
        }
        Value::Array(left) => {
            let right = i.as_array(y)?;
            let mut elements = left.elements.clone();
            elements.extend(right.elements.iter().cloned());
            Ok(Value::array(elements))
        }
        other => i.fail(crate::errors::binary_plus_unsupported(
            other.type_name(),
            y.type_name(),
        )),
    }
}

/// `<` over two numbers or two strings (code-point lexicographic).
fn builtin_less(i: &mut Interpreter, xp: &Thunk, yp: &Thunk) -> EvalResult {
    let x = i.force(xp)?;
    match x {
        Value::Number(a) => {
            let b = i.force_number(yp)?;
            Ok(Value::Bool(a < b))
        }
        // UTF-8 byte order coincides with code-point order.
        Value::Str(a) => {
            let b = i.force_string(yp)?;
            Ok(Value::Bool(a.as_ref() < b.as_ref()))
        }
        v => i.fail(order_comparison_unsupported(v.type_name())),
    }
}

fn builtin_bitwise(
    i: &mut Interpreter,
    xp: &Thunk,
    yp: &Thunk,
    f: impl FnOnce(i64, i64) -> i64,
) -> EvalResult {
    let x = i.force_number(xp)?;
    let y = i.force_number(yp)?;
    // 64-bit signed conversion by truncation.
    i.double_check(f(x as i64, y as i64) as f64).map(Value::Number)
}

fn builtin_numeric(i: &mut Interpreter, xp: &Thunk, f: impl FnOnce(f64) -> f64) -> EvalResult {
    let x = i.force_number(xp)?;
    i.double_check(f(x)).map(Value::Number)
}

fn builtin_length(i: &mut Interpreter, xp: &Thunk) -> EvalResult {
    let v = i.force(xp)?;
    let len = match &v {
        Value::Object(o) => field_names(o, false).len(),
        Value::Array(a) => a.elements.len(),
        Value::Str(s) => s.chars().count(),
        Value::Function(f) => f.param_count(),
        other => return i.fail(length_unsupported(other.type_name())),
    };
    Ok(Value::Number(len as f64))
}

/// Value equality on primitives only; composite types are rejected so the
/// standard library can build structural equality on top of this.
fn builtin_primitive_equals(i: &mut Interpreter, xp: &Thunk, yp: &Thunk) -> EvalResult {
    let x = i.force(xp)?;
    let y = i.force(yp)?;
    if x.type_name() != y.type_name() {
        return Ok(Value::Bool(false));
    }
    match (&x, &y) {
        (Value::Null, Value::Null) => Ok(Value::Bool(true)),
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a == b)),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a == b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a.as_ref() == b.as_ref())),
        (Value::Function(_), _) => i.fail(function_equality()),
        _ => i.fail(primitive_equals_non_primitive(x.type_name())),
    }
}

/// Structural equality; functions anywhere in either value are an error.
pub(crate) fn deep_equals(i: &mut Interpreter, a: &Value, b: &Value) -> EvalResult<bool> {
    match (a, b) {
        (Value::Function(_), _) | (_, Value::Function(_)) => i.fail(function_equality()),
        (Value::Null, Value::Null) => Ok(true),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Number(x), Value::Number(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x.as_ref() == y.as_ref()),
        (Value::Array(x), Value::Array(y)) => {
            if x.elements.len() != y.elements.len() {
                return Ok(false);
            }
            for (ex, ey) in x.elements.iter().zip(y.elements.iter()) {
                let vx = i.force(ex)?;
                let vy = i.force(ey)?;
                if !deep_equals(i, &vx, &vy)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Object(x), Value::Object(y)) => {
            let xnames = i.sorted_field_names(x, false);
            let ynames = i.sorted_field_names(y, false);
            if xnames != ynames {
                return Ok(false);
            }
            for name in xnames {
                let vx = i.object_index(&SelfBinding::new(x.clone()), name)?;
                let vy = i.object_index(&SelfBinding::new(y.clone()), name)?;
                if !deep_equals(i, &vx, &vy)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Union an array of simple objects into one simple object.
///
/// Each copied field keeps its original scope by wrapping its unbound body
/// in a `Bindings` shim that re-installs the source object's upvalues at
/// bind time. Duplicate names across inputs are an error; the result has
/// no assertions.
fn builtin_object_flat_merge(i: &mut Interpreter, arrp: &Thunk) -> EvalResult {
    let arr = i.force_array(arrp)?;
    let mut merged: FxHashMap<Name, SimpleField> = FxHashMap::default();
    for elem in &arr.elements {
        let obj = i.force_object(elem)?;
        let simple = match &obj {
            ObjectValue::Simple(s) => s.clone(),
            ObjectValue::Extended(_) => {
                return i.fail(internal_error(
                    "$objectFlatMerge requires an array of simple objects",
                ))
            }
        };
        for (&name, field) in &simple.fields {
            if merged.contains_key(&name) {
                return i.fail(crate::errors::duplicate_field_name(i.interner.lookup(name)));
            }
            merged.insert(
                name,
                SimpleField {
                    hide: field.hide,
                    field: Rc::new(UnboundField::Bindings {
                        inner: field.field.clone(),
                        upvalues: simple.upvalues.clone(),
                    }),
                },
            );
        }
    }
    Ok(Value::Object(ObjectValue::simple(SimpleObject::new(
        BindingFrame::default(),
        merged,
        vec![],
    ))))
}

/// Decompose into (mantissa, exponent) with `|mantissa| ∈ [0.5, 1)`,
/// matching the C `frexp` contract the original relies on.
fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let mut exp = x.abs().log2().floor() as i32 + 1;
    let mut mant = x / 2f64.powi(exp);
    // log2 can land one off at powers of two; nudge back into range.
    if mant.abs() >= 1.0 {
        mant /= 2.0;
        exp += 1;
    }
    if mant.abs() < 0.5 {
        mant *= 2.0;
        exp -= 1;
    }
    (mant, exp)
}
