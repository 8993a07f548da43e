//! Explicit value stack behind the begin/execute/end call protocol.

use rhai::Dynamic;

use crate::function::ScriptFunction;

#[derive(Debug, Clone)]
pub enum StackValue {
    Value(Dynamic),
    Callable(ScriptFunction),
}

impl StackValue {
    pub fn type_name(&self) -> String {
        match self {
            StackValue::Value(value) => value.type_name().to_string(),
            StackValue::Callable(ScriptFunction::Chunk { .. }) => "chunk".to_string(),
            StackValue::Callable(ScriptFunction::Pointer { .. }) => "Fn".to_string(),
        }
    }

    /// Script-visible form of the slot. Chunks have none and become unit.
    pub fn into_dynamic(self) -> Dynamic {
        match self {
            StackValue::Value(value) => value,
            StackValue::Callable(ScriptFunction::Pointer { fn_ptr, .. }) => Dynamic::from(fn_ptr),
            StackValue::Callable(ScriptFunction::Chunk { .. }) => Dynamic::UNIT,
        }
    }
}

/// Slots are indexed from the bottom, starting at 0.
#[derive(Debug, Default)]
pub struct ValueStack {
    slots: Vec<StackValue>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, value: StackValue) {
        self.slots.push(value);
    }

    pub fn pop(&mut self) -> Option<StackValue> {
        self.slots.pop()
    }

    /// Remove the topmost `count` slots, returned bottom-first.
    pub fn split_top(&mut self, count: usize) -> Vec<StackValue> {
        let at = self.slots.len().saturating_sub(count);
        self.slots.split_off(at)
    }
}

impl Extend<StackValue> for ValueStack {
    fn extend<I: IntoIterator<Item = StackValue>>(&mut self, iter: I) {
        self.slots.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(i: i64) -> StackValue {
        StackValue::Value(Dynamic::from(i))
    }

    #[test]
    fn test_split_top_keeps_order() {
        let mut stack = ValueStack::new();
        stack.extend([value(1), value(2), value(3)]);
        let top = stack.split_top(2);
        assert_eq!(stack.depth(), 1);
        let ints: Vec<i64> = top
            .into_iter()
            .map(|s| s.into_dynamic().as_int().unwrap())
            .collect();
        assert_eq!(ints, vec![2, 3]);
    }

    #[test]
    fn test_split_top_saturates() {
        let mut stack = ValueStack::new();
        stack.push(value(1));
        assert_eq!(stack.split_top(5).len(), 1);
        assert_eq!(stack.depth(), 0);
    }
}
