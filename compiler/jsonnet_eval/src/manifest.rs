//! JSON manifestation of fully-evaluated values.
//!
//! Output is canonical: object fields appear in lexicographic order, hidden
//! fields are omitted, and an object's assertions must pass before any of
//! its fields are emitted. Numbers use the shortest representation that
//! round-trips. Multi-line output indents with the configured indent
//! string; empty containers stay on one line as `[ ]` / `{ }`.

use std::fmt::Write as _;

use crate::environment::SelfBinding;
use crate::errors::{manifest_function, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

impl Interpreter {
    /// Manifest a value as a JSON string.
    ///
    /// `multiline` selects between indented output and the compact
    /// single-line form used by `toString` and error messages.
    pub(crate) fn manifest_json(&mut self, v: &Value, multiline: bool) -> EvalResult<String> {
        let mut buf = String::new();
        let indent = self.indent.clone();
        self.manifest_value(v, multiline, &indent, "", &mut buf)?;
        Ok(buf)
    }

    fn manifest_value(
        &mut self,
        v: &Value,
        multiline: bool,
        indent: &str,
        cur_indent: &str,
        buf: &mut String,
    ) -> EvalResult<()> {
        match v {
            Value::Null => buf.push_str("null"),
            Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => buf.push_str(&format_number(*n)),
            Value::Str(s) => buf.push_str(&escape_json_string(s)),
            Value::Function(_) => return self.fail(manifest_function()),
            Value::Array(arr) => {
                if arr.elements.is_empty() {
                    buf.push_str("[ ]");
                    return Ok(());
                }
                let inner_indent = format!("{cur_indent}{indent}");
                buf.push('[');
                for (idx, elem) in arr.elements.iter().enumerate() {
                    if idx > 0 {
                        buf.push(',');
                        if !multiline {
                            buf.push(' ');
                        }
                    }
                    if multiline {
                        buf.push('\n');
                        buf.push_str(&inner_indent);
                    }
                    let value = self.force(elem)?;
                    self.manifest_value(&value, multiline, indent, &inner_indent, buf)?;
                }
                if multiline {
                    buf.push('\n');
                    buf.push_str(cur_indent);
                }
                buf.push(']');
            }
            Value::Object(obj) => {
                // All assertions must hold even if the object has no
                // visible fields.
                self.check_assertions(obj)?;
                let names = self.sorted_field_names(obj, false);
                if names.is_empty() {
                    buf.push_str("{ }");
                    return Ok(());
                }
                let inner_indent = format!("{cur_indent}{indent}");
                buf.push('{');
                for (idx, name) in names.into_iter().enumerate() {
                    if idx > 0 {
                        buf.push(',');
                        if !multiline {
                            buf.push(' ');
                        }
                    }
                    if multiline {
                        buf.push('\n');
                        buf.push_str(&inner_indent);
                    }
                    buf.push_str(&escape_json_string(self.interner.lookup(name)));
                    buf.push_str(": ");
                    let value = self.object_index(&SelfBinding::new(obj.clone()), name)?;
                    self.manifest_value(&value, multiline, indent, &inner_indent, buf)?;
                }
                if multiline {
                    buf.push('\n');
                    buf.push_str(cur_indent);
                }
                buf.push('}');
            }
        }
        Ok(())
    }
}

/// Shortest round-trip rendering; integral doubles print with no fraction.
pub(crate) fn format_number(n: f64) -> String {
    format!("{n}")
}

/// JSON string escaping: `"` and `\` are escaped, common control characters
/// use their short forms, the rest of the C0 range uses `\u00XX`.
pub(crate) fn escape_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
