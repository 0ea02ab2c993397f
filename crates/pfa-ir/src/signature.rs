//! Signature patterns.
//!
//! A pattern is matched against the concrete argument type at a call site.
//! Wildcards with the same label must bind to a single type per call.

use std::fmt;

use pfa_core::AvroType;

/// Restriction on what a wildcard may bind to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WildClass {
    Any,
    /// `int`, `long`, `float` or `double`.
    Numeric,
    /// Exactly one of the listed types.
    OneOf(Vec<AvroType>),
    Record,
    Enum,
    Fixed,
}

impl WildClass {
    pub fn admits(&self, ty: &AvroType) -> bool {
        match self {
            Self::Any => true,
            Self::Numeric => ty.is_numeric(),
            Self::OneOf(types) => types.contains(ty),
            Self::Record => matches!(ty, AvroType::Record(_)),
            Self::Enum => matches!(ty, AvroType::Enum(_)),
            Self::Fixed => matches!(ty, AvroType::Fixed(_)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    Concrete(AvroType),
    Wildcard { label: String, class: WildClass },
    Array(Box<Pattern>),
    Map(Box<Pattern>),
}

impl Pattern {
    pub fn any(label: &str) -> Self {
        Self::wildcard(label, WildClass::Any)
    }

    pub fn numeric(label: &str) -> Self {
        Self::wildcard(label, WildClass::Numeric)
    }

    pub fn one_of(label: &str, types: impl IntoIterator<Item = AvroType>) -> Self {
        Self::wildcard(label, WildClass::OneOf(types.into_iter().collect()))
    }

    pub fn wildcard(label: &str, class: WildClass) -> Self {
        Self::Wildcard {
            label: label.to_owned(),
            class,
        }
    }

    pub fn array(items: impl Into<Pattern>) -> Self {
        Self::Array(Box::new(items.into()))
    }

    pub fn map(values: impl Into<Pattern>) -> Self {
        Self::Map(Box::new(values.into()))
    }

    /// Wildcard labels in order of first appearance.
    pub fn labels<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Concrete(_) => {}
            Self::Wildcard { label, .. } => {
                if !out.contains(&label.as_str()) {
                    out.push(label.as_str());
                }
            }
            Self::Array(inner) | Self::Map(inner) => inner.labels(out),
        }
    }

    fn classes<'a>(&'a self, out: &mut Vec<(&'a str, &'a WildClass)>) {
        match self {
            Self::Concrete(_) => {}
            Self::Wildcard { label, class } => {
                if !out.iter().any(|(l, _)| *l == label.as_str()) {
                    out.push((label.as_str(), class));
                }
            }
            Self::Array(inner) | Self::Map(inner) => inner.classes(out),
        }
    }
}

impl From<AvroType> for Pattern {
    fn from(ty: AvroType) -> Self {
        Self::Concrete(ty)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(ty) => write!(f, "{ty}"),
            Self::Wildcard { label, .. } => f.write_str(label),
            Self::Array(inner) => write!(f, "array<{inner}>"),
            Self::Map(inner) => write!(f, "map<{inner}>"),
        }
    }
}

impl fmt::Display for WildClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Numeric => f.write_str("numeric"),
            Self::OneOf(types) => {
                f.write_str("one of ")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
            Self::Record => f.write_str("any record"),
            Self::Enum => f.write_str("any enum"),
            Self::Fixed => f.write_str("any fixed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub pattern: Pattern,
}

/// Ordered named parameter patterns and a return pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub ret: Pattern,
}

impl Signature {
    pub fn new<'a>(
        params: impl IntoIterator<Item = (&'a str, Pattern)>,
        ret: impl Into<Pattern>,
    ) -> Self {
        Self {
            params: params
                .into_iter()
                .map(|(name, pattern)| Param {
                    name: name.to_owned(),
                    pattern,
                })
                .collect(),
            ret: ret.into(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Return-pattern wildcards that no parameter binds.
    pub fn unbound_return_labels(&self) -> Vec<String> {
        let mut bound = Vec::new();
        for param in &self.params {
            param.pattern.labels(&mut bound);
        }
        let mut ret = Vec::new();
        self.ret.labels(&mut ret);
        ret.into_iter()
            .filter(|label| !bound.contains(label))
            .map(str::to_owned)
            .collect()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name, param.pattern)?;
        }
        write!(f, ") -> {}", self.ret)?;

        let mut classes = Vec::new();
        for param in &self.params {
            param.pattern.classes(&mut classes);
        }
        let constrained: Vec<_> = classes
            .into_iter()
            .filter(|(_, class)| **class != WildClass::Any)
            .collect();
        for (i, (label, class)) in constrained.iter().enumerate() {
            f.write_str(if i == 0 { " where " } else { ", " })?;
            write!(f, "{label}: {class}")?;
        }
        Ok(())
    }
}
