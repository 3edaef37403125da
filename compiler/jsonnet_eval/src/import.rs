//! Import resolution seam.
//!
//! The evaluator never touches the filesystem; the host supplies an
//! [`ImportResolver`] that turns `import`/`importstr` paths into parsed
//! trees or raw strings. Results are cached per evaluation run keyed by
//! (importing file, path), so a diamond import evaluates once. There is no
//! cross-run caching.

use jsonnet_ir::{ExprId, SharedArena};

/// A parsed, desugared, analyzer-validated tree produced by a resolver.
#[derive(Clone)]
pub struct ImportedProgram {
    pub arena: SharedArena,
    pub root: ExprId,
}

/// Host-provided import resolution.
///
/// `here` is the file containing the `import` expression, when known.
/// Failures are plain strings; the evaluator wraps them into runtime
/// errors carrying the import site's trace.
pub trait ImportResolver {
    /// Resolve `import "path"` to a desugared tree.
    fn import_ast(&self, here: Option<&str>, path: &str) -> Result<ImportedProgram, String>;

    /// Resolve `importstr "path"` to the file's contents.
    fn import_str(&self, here: Option<&str>, path: &str) -> Result<String, String>;
}

/// Default resolver: all imports fail.
pub struct NoImports;

impl ImportResolver for NoImports {
    fn import_ast(&self, _here: Option<&str>, _path: &str) -> Result<ImportedProgram, String> {
        Err("imports are not available".to_string())
    }

    fn import_str(&self, _here: Option<&str>, _path: &str) -> Result<String, String> {
        Err("imports are not available".to_string())
    }
}
