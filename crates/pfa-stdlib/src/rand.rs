//! `rand.*`: draws from the engine instance's generator.
//!
//! Every function here consumes RNG state, so none may be reordered or
//! elided by the engine.

use pfa_core::{AvroType, RngError, Value};
use pfa_ir::{CallContext, FcnError, LibFcn, LibraryBuilder, Pattern, RegistryError, Signature};

use crate::util::{FcnResult, array, bytes, concrete, double, int, long, nullary, string};

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    use AvroType::{Bytes, Double, Float, Int, Long, String};

    let population = || Pattern::array(Pattern::any("A"));

    lib.register(
        LibFcn::new("rand.int", rand_int)
            .signature(nullary(Int))
            .signature(concrete([("low", Int), ("high", Int)], Int))
            .consumes_rng()
            .doc("Uniform int over the whole range, or in [low, high)."),
    )?
    .register(
        LibFcn::new("rand.long", rand_long)
            .signature(nullary(Long))
            .signature(concrete([("low", Long), ("high", Long)], Long))
            .consumes_rng()
            .doc("Uniform long over the whole range, or in [low, high)."),
    )?
    .register(
        LibFcn::new("rand.float", |ctx, args| {
            let lo = double(args, 0)? as f32;
            let hi = double(args, 1)? as f32;
            Ok(Value::Float(ctx.rng.float(lo, hi)?))
        })
        .signature(concrete([("low", Float), ("high", Float)], Float))
        .consumes_rng(),
    )?
    .register(
        LibFcn::new("rand.double", |ctx, args| {
            Ok(Value::Double(ctx.rng.double(double(args, 0)?, double(args, 1)?)?))
        })
        .signature(concrete([("low", Double), ("high", Double)], Double))
        .consumes_rng(),
    )?
    .register(
        LibFcn::new("rand.string", rand_string)
            .signature(concrete([("size", Int)], String))
            .signature(concrete([("size", Int), ("population", String)], String))
            .signature(concrete([("size", Int), ("low", Int), ("high", Int)], String))
            .consumes_rng()
            .doc("Random string of size code points."),
    )?
    .register(
        LibFcn::new("rand.bytes", rand_bytes)
            .signature(concrete([("size", Int)], Bytes))
            .signature(concrete([("size", Int), ("population", Bytes)], Bytes))
            .signature(concrete([("size", Int), ("low", Int), ("high", Int)], Bytes))
            .consumes_rng(),
    )?
    .register(
        LibFcn::new("rand.uuid", |ctx, _| Ok(Value::from(ctx.rng.uuid4())))
            .signature(nullary(String))
            .consumes_rng()
            .doc("Random version 4 UUID."),
    )?
    .register(
        LibFcn::new("rand.uuid4", |ctx, _| Ok(Value::from(ctx.rng.uuid4())))
            .signature(nullary(String))
            .consumes_rng(),
    )?
    .register(
        LibFcn::new("rand.gaussian", |ctx, args| {
            Ok(Value::Double(ctx.rng.gaussian(double(args, 0)?, double(args, 1)?)))
        })
        .signature(concrete([("mu", Double), ("sigma", Double)], Double))
        .consumes_rng(),
    )?
    .register(
        LibFcn::new("rand.choice", |ctx, args| {
            let items = array(args, 0)?;
            Ok(items[ctx.rng.choice(items.len())?].clone())
        })
        .signature(Signature::new([("population", population())], Pattern::any("A")))
        .consumes_rng(),
    )?
    .register(
        LibFcn::new("rand.choices", choices)
            .signature(Signature::new(
                [("size", Pattern::from(Int)), ("population", population())],
                population(),
            ))
            .consumes_rng()
            .doc("Draw size items with replacement."),
    )?
    .register(
        LibFcn::new("rand.sample", sample)
            .signature(Signature::new(
                [("size", Pattern::from(Int)), ("population", population())],
                population(),
            ))
            .consumes_rng()
            .doc("Draw size distinct positions without replacement."),
    )?
    .register(
        LibFcn::new("rand.histogram", histogram)
            .signature(concrete([("distribution", AvroType::array(Double))], Int))
            .consumes_rng()
            .doc("Index drawn with probability proportional to its weight."),
    )?;
    Ok(())
}

fn rand_int(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    match args {
        [] => Ok(Value::Int(ctx.rng.int())),
        _ => Ok(Value::Int(ctx.rng.int_range(int(args, 0)?, int(args, 1)?)?)),
    }
}

fn rand_long(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    match args {
        [] => Ok(Value::Long(ctx.rng.long())),
        _ => Ok(Value::Long(ctx.rng.long_range(long(args, 0)?, long(args, 1)?)?)),
    }
}

fn rand_string(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let size = int(args, 0)?;
    let s = match args {
        [_] => ctx.rng.string(size)?,
        [_, _] => ctx.rng.string_from(size, string(args, 1)?)?,
        _ => ctx.rng.string_between(size, int(args, 1)?, int(args, 2)?)?,
    };
    Ok(Value::String(s))
}

fn rand_bytes(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let size = int(args, 0)?;
    let b = match args {
        [_] => ctx.rng.bytes(size)?,
        [_, _] => ctx.rng.bytes_from(size, bytes(args, 1)?)?,
        _ => ctx.rng.bytes_between(size, int(args, 1)?, int(args, 2)?)?,
    };
    Ok(Value::Bytes(b))
}

/// Sample size in argument 0; like `rand.string`, it must be positive.
fn size(args: &[Value]) -> Result<usize, FcnError> {
    match usize::try_from(int(args, 0)?) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(RngError::NonPositiveSize.into()),
    }
}

fn choices(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let size = size(args)?;
    let items = array(args, 1)?;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        out.push(items[ctx.rng.choice(items.len())?].clone());
    }
    Ok(Value::Array(out))
}

fn sample(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let size = size(args)?;
    let items = array(args, 1)?;
    let picked = ctx.rng.sample(items.len(), size)?;
    Ok(Value::Array(picked.into_iter().map(|i| items[i].clone()).collect()))
}

fn histogram(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let weights: Vec<f64> = array(args, 0)?.iter().filter_map(Value::as_f64).collect();
    Ok(Value::Int(ctx.rng.histogram(&weights)? as i32))
}

#[cfg(test)]
#[path = "rand_tests.rs"]
mod rand_tests;
