//! Executable IR.
//!
//! The compiler produces this tree with every node annotated by its static
//! type and every call bound to a concrete signature. Variables live in
//! numbered slots of a flat frame; cells and pools are addressed by index.
//! Nothing here is mutated after compilation.

use std::sync::Arc;

use indexmap::IndexMap;
use pfa_core::{AvroType, Value};

use crate::library::{FcnId, Library};

/// Frame slot of a local variable. Slot 0 holds `input`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(pub u32);

impl Slot {
    pub const INPUT: Slot = Slot(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolId(pub u32);

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: AvroType,
}

impl Node {
    pub fn new(kind: NodeKind, ty: AvroType) -> Self {
        Self { kind, ty }
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Literal(Value),
    Var(Slot),
    /// Bind new variables; evaluates to null.
    Let(Vec<Assign>),
    /// Reassign existing variables; evaluates to null.
    Set(Vec<Assign>),
    Call(CallNode),
    If {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    Cond {
        branches: Vec<(Node, Node)>,
        otherwise: Option<Box<Node>>,
    },
    Do(Vec<Node>),
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    ForEach {
        slot: Slot,
        array: Box<Node>,
        body: Box<Node>,
    },
    /// Record, array or map construction; the result conforms to `Node::ty`.
    NewRecord(Vec<(String, Node)>),
    NewArray(Vec<Node>),
    NewMap(Vec<(String, Node)>),
    Attr {
        base: Box<Node>,
        path: Vec<PathStep>,
        pos: String,
    },
    CellGet(CellId),
    CellSet {
        cell: CellId,
        value: Box<Node>,
    },
    PoolGet {
        pool: PoolId,
        key: Box<Node>,
        default: Option<Box<Node>>,
        pos: String,
    },
    PoolSet {
        pool: PoolId,
        key: Box<Node>,
        value: Box<Node>,
    },
    Error {
        message: String,
        code: Option<i32>,
        pos: String,
    },
    Log {
        args: Vec<Node>,
        namespace: Option<String>,
    },
}

/// Assignment target: the value is conformed to `ty` before it is stored.
#[derive(Clone, Debug)]
pub struct Assign {
    pub slot: Slot,
    pub ty: AvroType,
    pub value: Node,
}

#[derive(Clone, Debug)]
pub struct CallNode {
    pub fcn: FcnId,
    /// Bound parameter types; arguments are conformed to these.
    pub params: Vec<AvroType>,
    pub args: Vec<Node>,
    pub pos: String,
}

#[derive(Clone, Debug)]
pub enum PathStep {
    Field(String),
    Index(Node),
    Key(Node),
}

#[derive(Clone, Debug)]
pub struct CellDecl {
    pub name: String,
    pub ty: AvroType,
    pub init: Value,
    pub shared: bool,
}

#[derive(Clone, Debug)]
pub struct PoolDecl {
    pub name: String,
    /// Type of each pool entry.
    pub ty: AvroType,
    pub init: IndexMap<String, Value>,
    pub shared: bool,
}

/// Compiled form of a document.
#[derive(Debug)]
pub struct Executable {
    pub name: String,
    pub input: AvroType,
    pub output: AvroType,
    pub randseed: Option<i64>,
    pub cells: Vec<CellDecl>,
    pub pools: Vec<PoolDecl>,
    pub action: Node,
    pub slot_count: usize,
    /// No RNG draws and no cell or pool access anywhere in the action.
    pub is_pure: bool,
    pub library: Arc<Library>,
}

impl Executable {
    pub fn cell_id(&self, name: &str) -> Option<CellId> {
        self.cells
            .iter()
            .position(|c| c.name == name)
            .map(|i| CellId(i as u32))
    }

    pub fn pool_id(&self, name: &str) -> Option<PoolId> {
        self.pools
            .iter()
            .position(|p| p.name == name)
            .map(|i| PoolId(i as u32))
    }
}
