//! Variable storage for one action call.

use pfa_core::Value;
use pfa_ir::Slot;

/// Flat slot array. Scoping was resolved at compile time and slots are
/// never reused, so one frame serves the whole call.
#[derive(Debug)]
pub struct Frame {
    slots: Vec<Value>,
}

impl Frame {
    /// Create a frame with `input` bound and every other slot null.
    pub fn new(slot_count: usize, input: Value) -> Self {
        let mut slots = vec![Value::Null; slot_count.max(1)];
        slots[Slot::INPUT.0 as usize] = input;
        Self { slots }
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> &Value {
        &self.slots[slot.0 as usize]
    }

    #[inline]
    pub fn set(&mut self, slot: Slot, value: Value) {
        self.slots[slot.0 as usize] = value;
    }
}
