//! `bytes.*` and `fixed.*`.

use pfa_core::{AvroType, Value};
use pfa_ir::{CallContext, FcnError, LibFcn, LibraryBuilder, Pattern, RegistryError, Signature, WildClass};

use crate::util::{FcnResult, bytes, clip_range, concrete, int, string};

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    let fixed = || Pattern::wildcard("A", WildClass::Fixed);

    lib.register(
        LibFcn::new("bytes.len", |_, args| Ok(Value::Int(bytes(args, 0)?.len() as i32)))
            .signature(concrete([("x", AvroType::Bytes)], AvroType::Int)),
    )?
    .register(
        LibFcn::new("bytes.subseq", subseq)
            .signature(concrete(
                [("x", AvroType::Bytes), ("start", AvroType::Int), ("end", AvroType::Int)],
                AvroType::Bytes,
            ))
            .doc("Bytes from start (inclusive) to end (exclusive); negative indexes count from the end."),
    )?
    .register(
        LibFcn::new("bytes.encodeUtf8", |_, args| {
            Ok(Value::Bytes(string(args, 0)?.as_bytes().to_vec()))
        })
        .signature(concrete([("s", AvroType::String)], AvroType::Bytes)),
    )?
    .register(
        LibFcn::new("bytes.decodeUtf8", decode_utf8)
            .signature(concrete([("x", AvroType::Bytes)], AvroType::String)),
    )?
    .register(
        LibFcn::new("fixed.toBytes", |_, args| Ok(Value::Bytes(bytes(args, 0)?.to_vec())))
            .signature(Signature::new([("x", fixed())], AvroType::Bytes))
            .doc("Convert fixed-width data to bytes."),
    )?
    .register(
        LibFcn::new("fixed.fromBytes", from_bytes)
            .signature(Signature::new(
                [("original", fixed()), ("replacement", Pattern::from(AvroType::Bytes))],
                fixed(),
            ))
            .doc("Overwrite the leading bytes of original; extra replacement bytes are dropped."),
    )?;
    Ok(())
}

fn subseq(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let x = bytes(args, 0)?;
    let (start, end) = clip_range(x.len(), i64::from(int(args, 1)?), i64::from(int(args, 2)?));
    Ok(Value::Bytes(x[start..end].to_vec()))
}

fn decode_utf8(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    std::str::from_utf8(bytes(args, 0)?)
        .map(Value::from)
        .map_err(|_| FcnError::new("invalid bytes"))
}

fn from_bytes(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let mut out = bytes(args, 0)?.to_vec();
    let replacement = bytes(args, 1)?;
    let n = out.len().min(replacement.len());
    out[..n].copy_from_slice(&replacement[..n]);
    Ok(Value::Fixed(out))
}
