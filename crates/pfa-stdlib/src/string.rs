//! `s.*`: string manipulation. Lengths and indexes count code points.

use pfa_core::{AvroType, Value};
use pfa_ir::{CallContext, LibFcn, LibraryBuilder, RegistryError};

use crate::util::{FcnResult, array, clip_range, concrete, int, string};

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    use AvroType::{Boolean, Int, String};

    let predicate = || concrete([("haystack", String), ("needle", String)], Boolean);

    lib.register(
        LibFcn::new("s.len", len)
            .signature(concrete([("s", String)], Int))
            .doc("Number of code points."),
    )?
    .register(
        LibFcn::new("s.substr", substr)
            .signature(concrete([("s", String), ("start", Int), ("end", Int)], String))
            .doc("Code points from start (inclusive) to end (exclusive); negative indexes count from the end."),
    )?
    .register(LibFcn::new("s.concat", concat).signature(concrete([("x", String), ("y", String)], String)))?
    .register(LibFcn::new("s.upper", |_, args| Ok(Value::from(string(args, 0)?.to_uppercase())))
        .signature(concrete([("s", String)], String)))?
    .register(LibFcn::new("s.lower", |_, args| Ok(Value::from(string(args, 0)?.to_lowercase())))
        .signature(concrete([("s", String)], String)))?
    .register(LibFcn::new("s.contains", |_, args| {
        Ok(Value::Boolean(string(args, 0)?.contains(string(args, 1)?)))
    }).signature(predicate()))?
    .register(LibFcn::new("s.startswith", |_, args| {
        Ok(Value::Boolean(string(args, 0)?.starts_with(string(args, 1)?)))
    }).signature(predicate()))?
    .register(LibFcn::new("s.endswith", |_, args| {
        Ok(Value::Boolean(string(args, 0)?.ends_with(string(args, 1)?)))
    }).signature(predicate()))?
    .register(
        LibFcn::new("s.index", index)
            .signature(concrete([("haystack", String), ("needle", String)], Int))
            .doc("Code point index of the first occurrence of needle, or -1."),
    )?
    .register(
        LibFcn::new("s.join", join)
            .signature(concrete([("array", AvroType::array(String)), ("sep", String)], String)),
    )?;
    Ok(())
}

fn len(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Int(string(args, 0)?.chars().count() as i32))
}

fn substr(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let s = string(args, 0)?;
    let (start, end) = clip_range(
        s.chars().count(),
        i64::from(int(args, 1)?),
        i64::from(int(args, 2)?),
    );
    Ok(Value::from(s.chars().skip(start).take(end - start).collect::<String>()))
}

fn concat(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::from(format!("{}{}", string(args, 0)?, string(args, 1)?)))
}

fn index(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let haystack = string(args, 0)?;
    let found = haystack
        .find(string(args, 1)?)
        .map_or(-1, |byte| haystack[..byte].chars().count() as i32);
    Ok(Value::Int(found))
}

fn join(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let parts: Vec<&str> = array(args, 0)?.iter().filter_map(Value::as_str).collect();
    Ok(Value::from(parts.join(string(args, 1)?)))
}
