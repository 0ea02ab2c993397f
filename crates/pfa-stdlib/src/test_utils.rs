use pfa_core::{AvroType, Rng, Value};
use pfa_ir::{CallContext, FcnError, resolve};

use crate::default_library;

/// Type of a literal test argument. Containers take their first element's type.
pub fn type_of(value: &Value) -> AvroType {
    match value {
        Value::Null => AvroType::Null,
        Value::Boolean(_) => AvroType::Boolean,
        Value::Int(_) => AvroType::Int,
        Value::Long(_) => AvroType::Long,
        Value::Float(_) => AvroType::Float,
        Value::Double(_) => AvroType::Double,
        Value::String(_) => AvroType::String,
        Value::Bytes(_) => AvroType::Bytes,
        Value::Array(items) => AvroType::array(items.first().map_or(AvroType::Null, type_of)),
        Value::Map(entries) => AvroType::map(entries.values().next().map_or(AvroType::Null, type_of)),
        other => panic!("no literal type for {}", other.kind_name()),
    }
}

/// Resolve `name` against the default library and invoke it.
pub fn call_typed(
    name: &str,
    args: Vec<Value>,
    arg_types: &[AvroType],
    rng: &mut Rng,
) -> Result<Value, FcnError> {
    let library = default_library().expect("built-ins register cleanly");
    let fcn = library.get(name).expect("known function");
    let resolved = resolve(name, &fcn.signatures, arg_types).expect("signature resolves");
    let args: Vec<Value> = args
        .into_iter()
        .zip(&resolved.params)
        .map(|(value, ty)| value.conform(ty).expect("argument conforms"))
        .collect();

    let mut ctx = CallContext {
        rng,
        params: &resolved.params,
        ret: &resolved.ret,
    };
    (fcn.imp)(&mut ctx, &args)
}

pub fn call(name: &str, args: Vec<Value>) -> Result<Value, FcnError> {
    let types: Vec<AvroType> = args.iter().map(type_of).collect();
    call_typed(name, args, &types, &mut Rng::from_seed(12345))
}

pub fn ok(name: &str, args: Vec<Value>) -> Value {
    call(name, args).unwrap_or_else(|e| panic!("{name} failed: {e}"))
}

pub fn err(name: &str, args: Vec<Value>) -> String {
    match call(name, args) {
        Ok(v) => panic!("{name} should fail, returned {v}"),
        Err(e) => e.message,
    }
}

pub fn ints(xs: &[i32]) -> Value {
    Value::Array(xs.iter().copied().map(Value::Int).collect())
}

pub fn strs(xs: &[&str]) -> Value {
    Value::Array(xs.iter().map(|&s| Value::from(s)).collect())
}
