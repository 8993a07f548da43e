//! Callables held by the value stack and the reference table.

use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, Scope, AST};

/// A script callable together with the compiled source it belongs to.
#[derive(Clone)]
pub enum ScriptFunction {
    /// A whole compiled chunk. Invoking it evaluates the chunk; call
    /// arguments are visible to the chunk as the `args` array.
    Chunk { ast: Rc<AST> },
    /// A function pointer or closure, resolved against `source`.
    Pointer { fn_ptr: FnPtr, source: Rc<AST> },
}

impl ScriptFunction {
    pub fn chunk(ast: AST) -> Self {
        ScriptFunction::Chunk { ast: Rc::new(ast) }
    }

    pub fn pointer(fn_ptr: FnPtr, source: Rc<AST>) -> Self {
        ScriptFunction::Pointer { fn_ptr, source }
    }

    /// The compiled source this callable runs in.
    pub fn source(&self) -> &Rc<AST> {
        match self {
            ScriptFunction::Chunk { ast } => ast,
            ScriptFunction::Pointer { source, .. } => source,
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> String {
        match self {
            ScriptFunction::Chunk { ast } => ast.source().unwrap_or("<chunk>").to_string(),
            ScriptFunction::Pointer { fn_ptr, source } => match source.source() {
                Some(chunk) => format!("{chunk}::{}", fn_ptr.fn_name()),
                None => fn_ptr.fn_name().to_string(),
            },
        }
    }

    /// Run the callable. `scope` carries the globals; only chunks see it,
    /// pointers run with the captures they were created with.
    pub(crate) fn invoke(
        &self,
        engine: &Engine,
        mut scope: Scope<'static>,
        args: Vec<Dynamic>,
    ) -> Result<Dynamic, Box<EvalAltResult>> {
        match self {
            ScriptFunction::Chunk { ast } => {
                scope.push("args", args.into_iter().collect::<Array>());
                engine.eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            }
            ScriptFunction::Pointer { fn_ptr, source } => fn_ptr.call::<Dynamic>(engine, source, args),
        }
    }
}

impl std::fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptFunction::Chunk { .. } => write!(f, "Chunk({})", self.name()),
            ScriptFunction::Pointer { .. } => write!(f, "Pointer({})", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_sees_args() {
        let engine = Engine::new();
        let chunk = ScriptFunction::chunk(engine.compile("args[0] + args[1]").unwrap());
        let value = chunk
            .invoke(&engine, Scope::new(), vec![Dynamic::from(2_i64), Dynamic::from(3_i64)])
            .unwrap();
        assert_eq!(value.as_int().unwrap(), 5);
    }

    #[test]
    fn test_chunk_sees_scope() {
        let engine = Engine::new();
        let mut scope = Scope::new();
        scope.push("base", 40_i64);
        let chunk = ScriptFunction::chunk(engine.compile("base + 2").unwrap());
        let value = chunk.invoke(&engine, scope, Vec::new()).unwrap();
        assert_eq!(value.as_int().unwrap(), 42);
    }

    #[test]
    fn test_pointer_resolves_against_source() {
        let engine = Engine::new();
        let mut ast = engine.compile("fn double(x) { x * 2 }").unwrap();
        ast.set_source("lib");
        let function = ScriptFunction::pointer(FnPtr::new("double").unwrap(), Rc::new(ast));
        assert_eq!(function.name(), "lib::double");
        let value = function.invoke(&engine, Scope::new(), vec![Dynamic::from(21_i64)]).unwrap();
        assert_eq!(value.as_int().unwrap(), 42);
    }
}
