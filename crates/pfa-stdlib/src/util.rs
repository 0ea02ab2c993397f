//! Argument access and signature shorthands shared by the namespaces.

use indexmap::IndexMap;
use pfa_core::{AvroType, Value};
use pfa_ir::{FcnError, Pattern, Signature};

pub(crate) type FcnResult = Result<Value, FcnError>;

pub(crate) fn ty(t: AvroType) -> Pattern {
    Pattern::from(t)
}

pub(crate) fn nullary(ret: AvroType) -> Signature {
    Signature::new(std::iter::empty(), ret)
}

/// Signature with concrete parameter and return types.
pub(crate) fn concrete<'a>(
    params: impl IntoIterator<Item = (&'a str, AvroType)>,
    ret: AvroType,
) -> Signature {
    Signature::new(params.into_iter().map(|(n, t)| (n, ty(t))), ret)
}

fn wrong_type(index: usize, expected: &str, got: &Value) -> FcnError {
    FcnError::new(format!(
        "argument {index} should be {expected}, found {}",
        got.kind_name()
    ))
}

pub(crate) fn boolean(args: &[Value], index: usize) -> Result<bool, FcnError> {
    args[index]
        .as_bool()
        .ok_or_else(|| wrong_type(index, "boolean", &args[index]))
}

pub(crate) fn int(args: &[Value], index: usize) -> Result<i32, FcnError> {
    match &args[index] {
        Value::Int(i) => Ok(*i),
        other => Err(wrong_type(index, "int", other)),
    }
}

pub(crate) fn long(args: &[Value], index: usize) -> Result<i64, FcnError> {
    args[index]
        .as_i64()
        .ok_or_else(|| wrong_type(index, "long", &args[index]))
}

pub(crate) fn double(args: &[Value], index: usize) -> Result<f64, FcnError> {
    args[index]
        .as_f64()
        .ok_or_else(|| wrong_type(index, "a number", &args[index]))
}

pub(crate) fn string(args: &[Value], index: usize) -> Result<&str, FcnError> {
    match &args[index] {
        Value::String(s) => Ok(s),
        other => Err(wrong_type(index, "string", other)),
    }
}

pub(crate) fn bytes(args: &[Value], index: usize) -> Result<&[u8], FcnError> {
    args[index]
        .as_bytes()
        .ok_or_else(|| wrong_type(index, "bytes", &args[index]))
}

pub(crate) fn array(args: &[Value], index: usize) -> Result<&[Value], FcnError> {
    args[index]
        .as_array()
        .ok_or_else(|| wrong_type(index, "array", &args[index]))
}

pub(crate) fn map(args: &[Value], index: usize) -> Result<&IndexMap<String, Value>, FcnError> {
    match &args[index] {
        Value::Map(m) => Ok(m),
        other => Err(wrong_type(index, "map", other)),
    }
}

/// Clip `[start, end)` to `0..len`; negative indexes count from the end.
pub(crate) fn clip_range(len: usize, start: i64, end: i64) -> (usize, usize) {
    let len = len as i64;
    let clip = |i: i64| {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len)
    };
    let start = clip(start);
    let end = clip(end).max(start);
    (start as usize, end as usize)
}
