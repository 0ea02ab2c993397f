use std::fmt;

use serde::Serialize;

/// Diagnostic kinds, roughly in the order the compiler discovers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticKind {
    // Declarations
    SchemaError,
    InvalidInitializer,

    // Names
    UnknownFunction,
    UnresolvedReference,
    VariableRedeclared,
    UnknownCell,
    UnknownPool,

    // Calls
    NoMatchingSignature,
    AmbiguousSignature,

    // Types
    TypeMismatch,
    InvalidPath,
    OutputTypeMismatch,
}

impl DiagnosticKind {
    /// Base message for this kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::SchemaError => "invalid schema",
            Self::InvalidInitializer => "initial value does not match the declared type",
            Self::UnknownFunction => "unknown function",
            Self::UnresolvedReference => "unresolved reference",
            Self::VariableRedeclared => "variable is already declared",
            Self::UnknownCell => "unknown cell",
            Self::UnknownPool => "unknown pool",
            Self::NoMatchingSignature => "no signature matches the arguments",
            Self::AmbiguousSignature => "ambiguous call",
            Self::TypeMismatch => "type mismatch",
            Self::InvalidPath => "invalid path",
            Self::OutputTypeMismatch => "action does not produce the declared output type",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnknownFunction => "`{}` is not a known function".to_string(),
            Self::UnresolvedReference => "`{}` is not defined".to_string(),
            Self::VariableRedeclared => "`{}` is already declared".to_string(),
            Self::UnknownCell => "`{}` is not a declared cell".to_string(),
            Self::UnknownPool => "`{}` is not a declared pool".to_string(),
            Self::NoMatchingSignature | Self::AmbiguousSignature => "{}".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

/// Location of an expression in a document, e.g. `action[0].args[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Pos(String);

impl Pos {
    pub fn new(root: &str) -> Self {
        Self(root.to_owned())
    }

    /// `self.name`
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    /// `self[index]`
    pub fn item(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedInfo {
    pub pos: Pos,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticMessage {
    pub kind: DiagnosticKind,
    pub pos: Pos,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl DiagnosticMessage {
    pub(crate) fn with_default_message(kind: DiagnosticKind, pos: Pos) -> Self {
        Self {
            kind,
            pos,
            message: kind.fallback_message().to_owned(),
            related: Vec::new(),
            hints: Vec::new(),
        }
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.pos, self.message)?;
        for related in &self.related {
            write!(f, "\n  note at {}: {}", related.pos, related.message)?;
        }
        for hint in &self.hints {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}
