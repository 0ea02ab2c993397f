//! Document model and action tree.
//!
//! This is what a front end (JSON or YAML reader) produces. Nothing here is
//! type checked; see [`crate::compile`].

use indexmap::IndexMap;
use pfa_core::{AvroType, Value};

/// A scoring-engine document.
#[derive(Clone, Debug)]
pub struct Document {
    pub name: Option<String>,
    pub input: AvroType,
    pub output: AvroType,
    pub randseed: Option<i64>,
    pub cells: IndexMap<String, CellSpec>,
    pub pools: IndexMap<String, PoolSpec>,
    /// Evaluated in order; the last expression is the output.
    pub action: Vec<Expr>,
}

impl Document {
    pub fn new(input: AvroType, output: AvroType, action: Vec<Expr>) -> Self {
        Self {
            name: None,
            input,
            output,
            randseed: None,
            cells: IndexMap::new(),
            pools: IndexMap::new(),
            action,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn randseed(mut self, seed: i64) -> Self {
        self.randseed = Some(seed);
        self
    }

    pub fn cell(mut self, name: impl Into<String>, spec: CellSpec) -> Self {
        self.cells.insert(name.into(), spec);
        self
    }

    pub fn pool(mut self, name: impl Into<String>, spec: PoolSpec) -> Self {
        self.pools.insert(name.into(), spec);
        self
    }
}

/// A named, typed, persistent value.
#[derive(Clone, Debug)]
pub struct CellSpec {
    pub ty: AvroType,
    pub init: Value,
    /// One value for every instance of an engine instead of one per instance.
    pub shared: bool,
}

impl CellSpec {
    pub fn new(ty: AvroType, init: Value) -> Self {
        Self {
            ty,
            init,
            shared: false,
        }
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }
}

/// A named map of persistent values keyed by string.
#[derive(Clone, Debug)]
pub struct PoolSpec {
    /// Type of each entry.
    pub ty: AvroType,
    pub init: IndexMap<String, Value>,
    pub shared: bool,
}

impl PoolSpec {
    pub fn new(ty: AvroType) -> Self {
        Self {
            ty,
            init: IndexMap::new(),
            shared: false,
        }
    }

    pub fn entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.init.insert(key.into(), value);
        self
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal {
        value: Value,
        ty: AvroType,
    },
    Ref(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Let(Vec<(String, Expr)>),
    Set(Vec<(String, Expr)>),
    If {
        cond: Box<Expr>,
        then: Vec<Expr>,
        otherwise: Option<Vec<Expr>>,
    },
    Cond {
        branches: Vec<(Expr, Vec<Expr>)>,
        otherwise: Option<Vec<Expr>>,
    },
    Do(Vec<Expr>),
    While {
        cond: Box<Expr>,
        body: Vec<Expr>,
    },
    ForEach {
        name: String,
        array: Box<Expr>,
        body: Vec<Expr>,
    },
    New {
        ty: AvroType,
        init: NewInit,
    },
    /// Walk into records (field name literals), arrays (indexes) and maps (keys).
    Attr {
        base: Box<Expr>,
        path: Vec<Expr>,
    },
    CellGet(String),
    CellSet {
        cell: String,
        value: Box<Expr>,
    },
    PoolGet {
        pool: String,
        key: Box<Expr>,
        default: Option<Box<Expr>>,
    },
    PoolSet {
        pool: String,
        key: Box<Expr>,
        value: Box<Expr>,
    },
    /// Abort the action with a user error.
    Error {
        message: String,
        code: Option<i32>,
    },
    Log {
        args: Vec<Expr>,
        namespace: Option<String>,
    },
}

/// Contents of a `New` form.
#[derive(Clone, Debug)]
pub enum NewInit {
    /// Record fields or map entries.
    Fields(Vec<(String, Expr)>),
    /// Array items.
    Items(Vec<Expr>),
}

impl Expr {
    pub fn literal(value: Value, ty: AvroType) -> Self {
        Self::Literal { value, ty }
    }

    pub fn null() -> Self {
        Self::literal(Value::Null, AvroType::Null)
    }

    pub fn boolean(b: bool) -> Self {
        Self::literal(Value::Boolean(b), AvroType::Boolean)
    }

    pub fn int(i: i32) -> Self {
        Self::literal(Value::Int(i), AvroType::Int)
    }

    pub fn long(l: i64) -> Self {
        Self::literal(Value::Long(l), AvroType::Long)
    }

    pub fn double(d: f64) -> Self {
        Self::literal(Value::Double(d), AvroType::Double)
    }

    pub fn string(s: &str) -> Self {
        Self::literal(Value::from(s), AvroType::String)
    }

    pub fn var(name: &str) -> Self {
        Self::Ref(name.to_owned())
    }

    pub fn call(name: &str, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::Call {
            name: name.to_owned(),
            args: args.into_iter().collect(),
        }
    }

    pub fn let_(name: &str, value: Expr) -> Self {
        Self::Let(vec![(name.to_owned(), value)])
    }

    pub fn set(name: &str, value: Expr) -> Self {
        Self::Set(vec![(name.to_owned(), value)])
    }

    pub fn if_(cond: Expr, then: Vec<Expr>, otherwise: Option<Vec<Expr>>) -> Self {
        Self::If {
            cond: Box::new(cond),
            then,
            otherwise,
        }
    }

    pub fn while_(cond: Expr, body: Vec<Expr>) -> Self {
        Self::While {
            cond: Box::new(cond),
            body,
        }
    }

    pub fn for_each(name: &str, array: Expr, body: Vec<Expr>) -> Self {
        Self::ForEach {
            name: name.to_owned(),
            array: Box::new(array),
            body,
        }
    }

    pub fn attr(base: Expr, path: impl IntoIterator<Item = Expr>) -> Self {
        Self::Attr {
            base: Box::new(base),
            path: path.into_iter().collect(),
        }
    }

    pub fn cell(name: &str) -> Self {
        Self::CellGet(name.to_owned())
    }

    pub fn cell_set(name: &str, value: Expr) -> Self {
        Self::CellSet {
            cell: name.to_owned(),
            value: Box::new(value),
        }
    }

    pub fn pool(name: &str, key: Expr, default: Option<Expr>) -> Self {
        Self::PoolGet {
            pool: name.to_owned(),
            key: Box::new(key),
            default: default.map(Box::new),
        }
    }

    pub fn pool_set(name: &str, key: Expr, value: Expr) -> Self {
        Self::PoolSet {
            pool: name.to_owned(),
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            code: None,
        }
    }
}
