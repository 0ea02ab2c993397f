//! Core operators: arithmetic, comparison and logic.
//!
//! Arithmetic is generic over one numeric wildcard, so mixed arguments are
//! promoted to the wider type before the operation. Integer overflow and
//! integer division by zero are runtime errors; floating point follows IEEE.

use std::cmp::Ordering;

use pfa_core::{AvroType, Value};
use pfa_ir::{CallContext, FcnError, LibFcn, LibraryBuilder, Pattern, RegistryError, Signature};

use crate::util::{FcnResult, boolean, concrete, double, long};

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    let binary_numeric = || {
        Signature::new(
            [("x", Pattern::numeric("A")), ("y", Pattern::numeric("A"))],
            Pattern::numeric("A"),
        )
    };
    let integral = || Pattern::one_of("A", [AvroType::Int, AvroType::Long]);
    let binary_any = |ret: AvroType| {
        Signature::new([("x", Pattern::any("A")), ("y", Pattern::any("A"))], ret)
    };
    let logic = || concrete([("x", AvroType::Boolean), ("y", AvroType::Boolean)], AvroType::Boolean);

    lib.register(LibFcn::new("+", add).signature(binary_numeric()).doc("Add two numbers."))?
        .register(LibFcn::new("-", sub).signature(binary_numeric()).doc("Subtract y from x."))?
        .register(LibFcn::new("*", mul).signature(binary_numeric()).doc("Multiply two numbers."))?
        .register(
            LibFcn::new("/", div)
                .signature(concrete([("x", AvroType::Double), ("y", AvroType::Double)], AvroType::Double))
                .doc("Divide as floating point."),
        )?
        .register(
            LibFcn::new("//", floor_div)
                .signature(Signature::new([("x", integral()), ("y", integral())], integral()))
                .doc("Integer division rounding toward negative infinity."),
        )?
        .register(
            LibFcn::new("u-", neg)
                .signature(Signature::new([("x", Pattern::numeric("A"))], Pattern::numeric("A")))
                .doc("Negate a number."),
        )?
        .register(LibFcn::new("%", modulo).signature(binary_numeric()).doc("Modulo with the sign of y."))?
        .register(LibFcn::new("%%", remainder).signature(binary_numeric()).doc("Remainder with the sign of x."))?
        .register(LibFcn::new("**", pow).signature(binary_numeric()).doc("Raise x to the power y."))?
        .register(LibFcn::new("==", eq).signature(binary_any(AvroType::Boolean)))?
        .register(LibFcn::new("!=", ne).signature(binary_any(AvroType::Boolean)))?
        .register(LibFcn::new("<", lt).signature(binary_any(AvroType::Boolean)))?
        .register(LibFcn::new("<=", le).signature(binary_any(AvroType::Boolean)))?
        .register(LibFcn::new(">", gt).signature(binary_any(AvroType::Boolean)))?
        .register(LibFcn::new(">=", ge).signature(binary_any(AvroType::Boolean)))?
        .register(
            LibFcn::new("cmp", cmp)
                .signature(binary_any(AvroType::Int))
                .doc("Return -1, 0 or 1 as x is less than, equal to or greater than y."),
        )?
        .register(
            LibFcn::new("max", max).signature(Signature::new(
                [("x", Pattern::any("A")), ("y", Pattern::any("A"))],
                Pattern::any("A"),
            )),
        )?
        .register(
            LibFcn::new("min", min).signature(Signature::new(
                [("x", Pattern::any("A")), ("y", Pattern::any("A"))],
                Pattern::any("A"),
            )),
        )?
        .register(LibFcn::new("&&", and).signature(logic()))?
        .register(LibFcn::new("||", or).signature(logic()))?
        .register(LibFcn::new("^^", xor).signature(logic()))?
        .register(
            LibFcn::new("!", not).signature(concrete([("x", AvroType::Boolean)], AvroType::Boolean)),
        )?;
    Ok(())
}

fn overflow(ret: &AvroType) -> FcnError {
    FcnError::new(format!("{ret} overflow"))
}

fn division_by_zero() -> FcnError {
    FcnError::new("integer division by zero")
}

fn arith(
    ret: &AvroType,
    args: &[Value],
    int_op: fn(i32, i32) -> Option<i32>,
    long_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> FcnResult {
    match (ret, &args[0], &args[1]) {
        (AvroType::Int, Value::Int(x), Value::Int(y)) => {
            int_op(*x, *y).map(Value::Int).ok_or_else(|| overflow(ret))
        }
        (AvroType::Long, Value::Long(x), Value::Long(y)) => {
            long_op(*x, *y).map(Value::Long).ok_or_else(|| overflow(ret))
        }
        (AvroType::Float, _, _) => Ok(Value::Float(float_op(double(args, 0)?, double(args, 1)?) as f32)),
        _ => Ok(Value::Double(float_op(double(args, 0)?, double(args, 1)?))),
    }
}

fn add(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    arith(ctx.ret, args, i32::checked_add, i64::checked_add, |x, y| x + y)
}

fn sub(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    arith(ctx.ret, args, i32::checked_sub, i64::checked_sub, |x, y| x - y)
}

fn mul(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    arith(ctx.ret, args, i32::checked_mul, i64::checked_mul, |x, y| x * y)
}

fn div(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Double(double(args, 0)? / double(args, 1)?))
}

fn floor_div(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (x, y) = (long(args, 0)?, long(args, 1)?);
    if y == 0 {
        return Err(division_by_zero());
    }
    let q = x.checked_div(y).ok_or_else(|| overflow(ctx.ret))?;
    let q = if x.wrapping_rem(y) != 0 && ((x < 0) != (y < 0)) { q - 1 } else { q };
    match ctx.ret {
        AvroType::Int => i32::try_from(q).map(Value::Int).map_err(|_| overflow(ctx.ret)),
        _ => Ok(Value::Long(q)),
    }
}

fn neg(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    match &args[0] {
        Value::Int(x) => x.checked_neg().map(Value::Int).ok_or_else(|| overflow(ctx.ret)),
        Value::Long(x) => x.checked_neg().map(Value::Long).ok_or_else(|| overflow(ctx.ret)),
        Value::Float(x) => Ok(Value::Float(-x)),
        _ => Ok(Value::Double(-double(args, 0)?)),
    }
}

fn floored<T>(r: T, y: T, zero: T) -> T
where
    T: PartialOrd + std::ops::Add<Output = T> + Copy,
{
    if r != zero && ((r < zero) != (y < zero)) { r + y } else { r }
}

fn modulo(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    match (&args[0], &args[1]) {
        (Value::Int(_), Value::Int(0)) | (Value::Long(_), Value::Long(0)) => Err(division_by_zero()),
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(floored(x.wrapping_rem(*y), *y, 0))),
        (Value::Long(x), Value::Long(y)) => Ok(Value::Long(floored(x.wrapping_rem(*y), *y, 0))),
        _ => {
            let (x, y) = (double(args, 0)?, double(args, 1)?);
            let r = floored(x % y, y, 0.0);
            Ok(match ctx.ret {
                AvroType::Float => Value::Float(r as f32),
                _ => Value::Double(r),
            })
        }
    }
}

fn remainder(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    match (&args[0], &args[1]) {
        (Value::Int(_), Value::Int(0)) | (Value::Long(_), Value::Long(0)) => Err(division_by_zero()),
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_rem(*y))),
        (Value::Long(x), Value::Long(y)) => Ok(Value::Long(x.wrapping_rem(*y))),
        _ => {
            let r = double(args, 0)? % double(args, 1)?;
            Ok(match ctx.ret {
                AvroType::Float => Value::Float(r as f32),
                _ => Value::Double(r),
            })
        }
    }
}

fn int_pow(x: i64, y: i64) -> Option<i64> {
    if y >= 0 {
        return x.checked_pow(u32::try_from(y).ok()?);
    }
    match x {
        1 => Some(1),
        -1 => Some(if y % 2 == 0 { 1 } else { -1 }),
        0 => None,
        _ => Some(0),
    }
}

fn pow(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    match (&args[0], &args[1]) {
        (Value::Int(x), Value::Int(y)) => int_pow(i64::from(*x), i64::from(*y))
            .and_then(|r| i32::try_from(r).ok())
            .map(Value::Int)
            .ok_or_else(|| overflow(ctx.ret)),
        (Value::Long(x), Value::Long(y)) => int_pow(*x, *y).map(Value::Long).ok_or_else(|| overflow(ctx.ret)),
        _ => {
            let r = double(args, 0)?.powf(double(args, 1)?);
            Ok(match ctx.ret {
                AvroType::Float => Value::Float(r as f32),
                _ => Value::Double(r),
            })
        }
    }
}

fn ordering(ctx: &CallContext<'_>, args: &[Value]) -> Result<Ordering, FcnError> {
    args[0]
        .compare(&args[1], &ctx.params[0])
        .ok_or_else(|| FcnError::new(format!("values of type {} are not comparable", ctx.params[0])))
}

fn eq(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(args[0] == args[1]))
}

fn ne(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(args[0] != args[1]))
}

fn lt(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(ordering(ctx, args)?.is_lt()))
}

fn le(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(ordering(ctx, args)?.is_le()))
}

fn gt(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(ordering(ctx, args)?.is_gt()))
}

fn ge(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(ordering(ctx, args)?.is_ge()))
}

fn cmp(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Int(ordering(ctx, args)? as i32))
}

fn max(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let pick = if ordering(ctx, args)?.is_lt() { 1 } else { 0 };
    Ok(args[pick].clone())
}

fn min(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let pick = if ordering(ctx, args)?.is_gt() { 1 } else { 0 };
    Ok(args[pick].clone())
}

fn and(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(boolean(args, 0)? && boolean(args, 1)?))
}

fn or(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(boolean(args, 0)? || boolean(args, 1)?))
}

fn xor(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(boolean(args, 0)? ^ boolean(args, 1)?))
}

fn not(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    Ok(Value::Boolean(!boolean(args, 0)?))
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod ops_tests;
