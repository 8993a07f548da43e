//! The script bridge.
//!
//! A [`ScriptBridge`] owns one Rhai runtime. It registers the type bindings
//! it was built with, loads and executes script sources, and marshals calls
//! from the host into script callables, either through the explicit
//! three-phase protocol (`begin_call` / `execute_call` / `end_call`) or the
//! direct [`ScriptBridge::call`].
//!
//! Failures never propagate out of the loading and call-protocol
//! operations. Each one is logged at error level and recorded as a
//! [`ScriptDiagnostic`], retrievable with [`ScriptBridge::take_diagnostics`].

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::rc::{Rc, Weak};

use rhai::{Dynamic, Engine, FnPtr, Scope, AST};

use crate::bindings::{default_bindings, BindingContext, TypeBinding};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::function::ScriptFunction;
use crate::host::{Core, Document};
use crate::references::{FunctionReference, ReferenceTable};
use crate::script_diagnostics::{from_bridge_error, ScriptDiagnostic, ScriptPhase};
use crate::script_log::SCRIPT_TARGET;
use crate::value_stack::{StackValue, ValueStack};

/// A started runtime. Held through `Rc` so code running inside a script can
/// shut the bridge down without pulling the engine from under itself.
#[derive(Clone)]
struct Runtime {
    engine: Rc<Engine>,
    globals: Rc<HashMap<String, Dynamic>>,
}

pub struct ScriptBridge {
    this: Weak<ScriptBridge>,
    core: Core,
    config: BridgeConfig,
    bindings: Vec<TypeBinding>,
    runtime: RefCell<Option<Runtime>>,
    stack: RefCell<ValueStack>,
    references: RefCell<ReferenceTable>,
    /// Sources of the callables currently executing, innermost last.
    running: RefCell<Vec<Rc<AST>>>,
    /// Documents whose scripts are currently executing, innermost last.
    documents: RefCell<Vec<Document>>,
    diagnostics: RefCell<VecDeque<ScriptDiagnostic>>,
}

impl ScriptBridge {
    /// Create a stopped bridge for `core`. `bindings` are registered, in
    /// order, every time the runtime starts.
    pub fn new(core: &Core, config: BridgeConfig, bindings: Vec<TypeBinding>) -> Rc<Self> {
        Rc::new_cyclic(|this| ScriptBridge {
            this: this.clone(),
            core: core.clone(),
            config,
            bindings,
            runtime: RefCell::new(None),
            stack: RefCell::new(ValueStack::new()),
            references: RefCell::new(ReferenceTable::new()),
            running: RefCell::new(Vec::new()),
            documents: RefCell::new(Vec::new()),
            diagnostics: RefCell::new(VecDeque::new()),
        })
    }

    pub fn with_default_bindings(core: &Core) -> Rc<Self> {
        Self::new(core, BridgeConfig::default(), default_bindings())
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn bindings(&self) -> &[TypeBinding] {
        &self.bindings
    }

    // === Lifecycle ===

    /// Create the runtime and register every binding.
    pub fn startup(&self) {
        if self.is_running() {
            log::warn!("Script runtime already running; startup ignored");
            return;
        }
        log::info!("Loading script runtime");

        let mut engine = Engine::new();
        self.config.apply(&mut engine);
        engine.on_print(|text| log::info!(target: SCRIPT_TARGET, "{}", text));
        engine.on_debug(|text, source, pos| match source {
            Some(source) => log::debug!(target: SCRIPT_TARGET, "[{} {}] {}", source, pos, text),
            None => log::debug!(target: SCRIPT_TARGET, "[{}] {}", pos, text),
        });

        let mut ctx = BindingContext::new(self.core.clone(), self.this.clone());
        for binding in &self.bindings {
            match binding.parent {
                Some(parent) => log::debug!("Registering {} (extends {})", binding.name, parent),
                None => log::debug!("Registering {}", binding.name),
            }
            (binding.register)(&mut engine, &mut ctx);
        }

        *self.runtime.borrow_mut() = Some(Runtime {
            engine: Rc::new(engine),
            globals: Rc::new(ctx.into_globals()),
        });
    }

    /// Close the runtime, dropping the value stack and every reference.
    pub fn shutdown(&self) {
        let runtime = self.runtime.borrow_mut().take();
        if runtime.is_none() {
            return;
        }
        // Taken out first: dropping script values can re-enter the bridge.
        let stack = std::mem::take(&mut *self.stack.borrow_mut());
        let references = std::mem::take(&mut *self.references.borrow_mut());
        drop(stack);
        drop(references);
        drop(runtime);
        log::info!("Script runtime closed");
    }

    pub fn is_running(&self) -> bool {
        self.runtime.borrow().is_some()
    }

    fn runtime(&self) -> Result<Runtime, BridgeError> {
        self.runtime.borrow().clone().ok_or(BridgeError::NotRunning)
    }

    pub fn engine(&self) -> Result<Rc<Engine>, BridgeError> {
        Ok(self.runtime()?.engine)
    }

    fn scope(&self, runtime: &Runtime) -> Scope<'static> {
        let mut scope = Scope::new();
        for (name, value) in runtime.globals.iter() {
            scope.push_dynamic(name.as_str(), value.clone());
        }
        if let Some(document) = self.current_document() {
            scope.push("document", document);
        }
        scope
    }

    // === Loading ===

    fn compile(&self, code: &str, chunk: &str) -> Result<ScriptFunction, BridgeError> {
        let engine = self.engine()?;
        let mut ast = engine.compile(code).map_err(|source| BridgeError::Compile {
            chunk: chunk.to_string(),
            source,
        })?;
        ast.set_source(chunk);
        Ok(ScriptFunction::chunk(ast))
    }

    fn compile_file(&self, path: &Path) -> Result<ScriptFunction, BridgeError> {
        // Checked before touching the disk so a stopped bridge reports that.
        self.engine()?;
        let code = std::fs::read_to_string(path).map_err(|source| BridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile(&code, &path.display().to_string())
    }

    /// Compile a file and execute it once. Returns whether it ran cleanly.
    pub fn load_file(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let function = match self.compile_file(path) {
            Ok(function) => function,
            Err(err) => {
                self.report(ScriptPhase::Compile, &err);
                return false;
            }
        };
        match self.call_function(&function, Vec::new()) {
            Ok(_) => {
                log::debug!("Loading was successful. {}", path.display());
                true
            }
            Err(err) => {
                self.report(ScriptPhase::Execute, &err);
                false
            }
        }
    }

    /// Compile `code` under the chunk name `chunk` and execute it. Nothing
    /// runs if it does not compile.
    pub fn do_string(&self, code: &str, chunk: &str) -> bool {
        let function = match self.compile(code, chunk) {
            Ok(function) => function,
            Err(err) => {
                self.report(ScriptPhase::Compile, &err);
                return false;
            }
        };
        match self.call_function(&function, Vec::new()) {
            Ok(_) => true,
            Err(err) => {
                self.report(ScriptPhase::Execute, &err);
                false
            }
        }
    }

    /// Compile `code` and push the chunk onto the value stack without
    /// running it. Pushes nothing on failure.
    pub fn load_string(&self, code: &str, chunk: &str) -> bool {
        match self.compile(code, chunk) {
            Ok(function) => {
                self.stack.borrow_mut().push(StackValue::Callable(function));
                true
            }
            Err(err) => {
                self.report(ScriptPhase::Compile, &err);
                false
            }
        }
    }

    /// Compile and evaluate `code`, handing the result or the error back
    /// to the caller. Nothing is reported.
    pub fn eval(&self, code: &str, chunk: &str) -> Result<Dynamic, BridgeError> {
        let function = self.compile(code, chunk)?;
        self.call_function(&function, Vec::new())
    }

    // === Value stack ===

    fn stack_value(&self, value: Dynamic, source: Option<&Rc<AST>>) -> StackValue {
        if !value.is::<FnPtr>() {
            return StackValue::Value(value);
        }
        match value.try_cast::<FnPtr>() {
            Some(fn_ptr) => {
                let source = source.cloned().unwrap_or_else(|| self.current_source());
                StackValue::Callable(ScriptFunction::pointer(fn_ptr, source))
            }
            None => StackValue::Value(Dynamic::UNIT),
        }
    }

    fn current_source(&self) -> Rc<AST> {
        self.running
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| Rc::new(AST::empty()))
    }

    /// Push one call argument. Function pointers become callable slots.
    pub fn push_argument(&self, value: Dynamic) {
        let value = self.stack_value(value, None);
        self.stack.borrow_mut().push(value);
    }

    /// Pop the top slot in its script-visible form.
    pub fn pop_value(&self) -> Option<Dynamic> {
        let top = self.stack.borrow_mut().pop();
        top.map(StackValue::into_dynamic)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.borrow().depth()
    }

    // === References ===

    /// Pop the top slot and keep it in the reference table. A unit value
    /// yields [`FunctionReference::NIL`]. The slot is consumed either way.
    pub fn take_reference(&self) -> Result<FunctionReference, BridgeError> {
        let (top, depth) = {
            let mut stack = self.stack.borrow_mut();
            let depth = stack.depth();
            (stack.pop(), depth)
        };
        match top {
            Some(StackValue::Callable(function)) => Ok(self.reference_function(function)),
            Some(StackValue::Value(value)) if value.is_unit() => Ok(FunctionReference::NIL),
            Some(other) => Err(BridgeError::NotCallable {
                index: depth - 1,
                found: other.type_name(),
            }),
            None => Err(BridgeError::NotCallable {
                index: 0,
                found: "nothing".to_string(),
            }),
        }
    }

    pub fn reference_function(&self, function: ScriptFunction) -> FunctionReference {
        self.references.borrow_mut().insert(function)
    }

    /// Reference a function pointer received from the script currently
    /// running; it resolves against that script's source.
    pub fn reference_pointer(&self, fn_ptr: FnPtr) -> FunctionReference {
        let source = self.current_source();
        self.reference_function(ScriptFunction::pointer(fn_ptr, source))
    }

    pub fn release_reference(&self, reference: FunctionReference) -> bool {
        let removed = self.references.borrow_mut().remove(reference);
        removed.is_some()
    }

    pub fn function(&self, reference: FunctionReference) -> Option<ScriptFunction> {
        self.references.borrow().get(reference).cloned()
    }

    pub fn num_references(&self) -> usize {
        self.references.borrow().len()
    }

    // === Call protocol ===

    /// Start a call: clear the stack and push the referenced callable.
    pub fn begin_call(&self, reference: FunctionReference) -> bool {
        let previous = std::mem::take(&mut *self.stack.borrow_mut());
        drop(previous);

        match self.function(reference) {
            Some(function) => {
                self.stack.borrow_mut().push(StackValue::Callable(function));
                true
            }
            None => {
                self.report(ScriptPhase::Call, &BridgeError::InvalidReference(reference));
                false
            }
        }
    }

    /// Invoke the callable sitting below the top `param_count` slots and
    /// push exactly `result_count` results.
    pub fn execute_call(&self, param_count: usize, result_count: usize) -> bool {
        let taken = {
            let mut stack = self.stack.borrow_mut();
            let depth = stack.depth();
            let args = stack.split_top(param_count);
            match stack.pop() {
                Some(StackValue::Callable(function)) => Ok((function, args)),
                Some(other) => {
                    let found = other.type_name();
                    stack.push(other);
                    let err = BridgeError::NotCallable {
                        index: depth - 1 - param_count,
                        found,
                    };
                    Err((err, args))
                }
                None => {
                    let err = BridgeError::NotCallable {
                        index: 0,
                        found: "nothing".to_string(),
                    };
                    Err((err, args))
                }
            }
        };

        let (function, args) = match taken {
            Ok(taken) => taken,
            Err((err, discarded)) => {
                drop(discarded);
                self.report(ScriptPhase::Call, &err);
                return false;
            }
        };

        let args = args.into_iter().map(StackValue::into_dynamic).collect();
        match self.call_function(&function, args) {
            Ok(value) => {
                let results: Vec<StackValue> = spread_results(value, result_count)
                    .into_iter()
                    .map(|v| self.stack_value(v, Some(function.source())))
                    .collect();
                self.stack.borrow_mut().extend(results);
                true
            }
            Err(err) => {
                self.report(ScriptPhase::Call, &err);
                false
            }
        }
    }

    /// Pop the `result_count` results of the last call.
    pub fn end_call(&self, result_count: usize) {
        let popped = self.stack.borrow_mut().split_top(result_count);
        drop(popped);
    }

    /// Call a referenced function directly. The value stack is untouched
    /// and failures are returned, not reported.
    pub fn call(
        &self,
        reference: FunctionReference,
        args: Vec<Dynamic>,
    ) -> Result<Vec<Dynamic>, BridgeError> {
        if !self.is_running() {
            return Err(BridgeError::NotRunning);
        }
        let function = self
            .function(reference)
            .ok_or(BridgeError::InvalidReference(reference))?;
        let value = self.call_function(&function, args)?;
        Ok(into_values(value))
    }

    pub fn call_function(
        &self,
        function: &ScriptFunction,
        args: Vec<Dynamic>,
    ) -> Result<Dynamic, BridgeError> {
        let runtime = self.runtime()?;
        // Native re-entry starts a fresh Rhai call count, so nesting through
        // the host is bounded here.
        let depth = self.running.borrow().len();
        if depth >= self.config.max_nested_calls {
            return Err(BridgeError::TooDeep(self.config.max_nested_calls));
        }
        let scope = self.scope(&runtime);

        self.running.borrow_mut().push(function.source().clone());
        let result = function.invoke(&runtime.engine, scope, args);
        self.running.borrow_mut().pop();

        result.map_err(|source| BridgeError::Runtime {
            chunk: function.name(),
            source,
        })
    }

    // === Documents ===

    /// Run `f` with `document` as the script-visible `document` global.
    pub fn run_in_document<R>(&self, document: &Document, f: impl FnOnce() -> R) -> R {
        self.documents.borrow_mut().push(document.clone());
        let result = f();
        self.documents.borrow_mut().pop();
        result
    }

    pub fn current_document(&self) -> Option<Document> {
        self.documents.borrow().last().cloned()
    }

    // === Diagnostics ===

    /// Log an error and record it as a diagnostic.
    pub fn report(&self, phase: ScriptPhase, err: &BridgeError) {
        log::error!("{}", err);
        let mut diagnostics = self.diagnostics.borrow_mut();
        diagnostics.push_back(from_bridge_error(phase, err));
        while diagnostics.len() > self.config.max_diagnostics.max(1) {
            diagnostics.pop_front();
        }
    }

    pub fn take_diagnostics(&self) -> Vec<ScriptDiagnostic> {
        self.diagnostics.borrow_mut().drain(..).collect()
    }

    pub fn last_error(&self) -> Option<String> {
        self.diagnostics.borrow().back().map(|d| d.message.clone())
    }
}

/// Fit a script result into `count` slots.
fn spread_results(value: Dynamic, count: usize) -> Vec<Dynamic> {
    let mut values = if count > 1 && value.is_array() {
        into_values(value)
    } else if value.is_unit() {
        Vec::new()
    } else {
        vec![value]
    };
    values.resize(count, Dynamic::UNIT);
    values
}

/// Script results as a value sequence: unit is empty, arrays spread.
fn into_values(value: Dynamic) -> Vec<Dynamic> {
    if value.is_unit() {
        Vec::new()
    } else if value.is_array() {
        value.into_array().unwrap_or_default()
    } else {
        vec![value]
    }
}

impl std::fmt::Debug for ScriptBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptBridge")
            .field("running", &self.is_running())
            .field("stack_depth", &self.stack_depth())
            .field("references", &self.num_references())
            .finish()
    }
}
