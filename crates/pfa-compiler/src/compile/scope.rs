//! Lexical scopes mapping variable names to frame slots.

use indexmap::IndexMap;
use pfa_core::AvroType;
use pfa_ir::Slot;

use crate::diagnostics::Pos;

pub(super) struct Var {
    pub slot: Slot,
    /// `None` when the declaring expression failed to compile; references
    /// to it are dropped silently instead of cascading.
    pub ty: Option<AvroType>,
    pub pos: Pos,
}

/// Stack of scopes. Slots are never reused, so the frame size is the total
/// number of declarations.
pub(super) struct Scopes {
    frames: Vec<IndexMap<String, Var>>,
    next_slot: u32,
}

impl Scopes {
    pub fn with_input(input: AvroType) -> Self {
        let mut root = IndexMap::new();
        root.insert(
            "input".to_owned(),
            Var {
                slot: Slot::INPUT,
                ty: Some(input),
                pos: Pos::new("input"),
            },
        );
        Self {
            frames: vec![root],
            next_slot: 1,
        }
    }

    pub fn push(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn lookup(&self, name: &str) -> Option<&Var> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Declare `name` in the innermost scope.
    ///
    /// Shadowing is not allowed: if `name` is visible from any enclosing
    /// scope, returns the position of the earlier declaration.
    pub fn declare(&mut self, name: &str, ty: Option<AvroType>, pos: Pos) -> Result<Slot, Pos> {
        if let Some(existing) = self.lookup(name) {
            return Err(existing.pos.clone());
        }
        let slot = Slot(self.next_slot);
        self.next_slot += 1;
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_owned(), Var { slot, ty, pos });
        }
        Ok(slot)
    }

    pub fn slot_count(&self) -> usize {
        self.next_slot as usize
    }
}
