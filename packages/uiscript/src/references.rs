//! Reference table: stable integer handles for script callables.

use std::collections::HashMap;

use crate::function::ScriptFunction;

/// Opaque handle to a callable held by a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionReference(i32);

impl FunctionReference {
    /// No reference at all.
    pub const NONE: FunctionReference = FunctionReference(-2);
    /// Reference to nothing (a unit value was referenced).
    pub const NIL: FunctionReference = FunctionReference(-1);

    pub const fn from_raw(raw: i32) -> Self {
        FunctionReference(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for FunctionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handles start at 1; released handles are handed out again.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: HashMap<i32, ScriptFunction>,
    free: Vec<i32>,
    next: i32,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: ScriptFunction) -> FunctionReference {
        let id = self.free.pop().unwrap_or_else(|| {
            self.next += 1;
            self.next
        });
        self.entries.insert(id, function);
        FunctionReference(id)
    }

    pub fn get(&self, reference: FunctionReference) -> Option<&ScriptFunction> {
        self.entries.get(&reference.0)
    }

    /// Remove an entry and hand it back so the caller controls when it drops.
    pub fn remove(&mut self, reference: FunctionReference) -> Option<ScriptFunction> {
        let removed = self.entries.remove(&reference.0);
        if removed.is_some() {
            self.free.push(reference.0);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
