//! `m.*`: constants and elementary functions.

use pfa_core::{AvroType, Value};
use pfa_ir::{CallContext, FcnError, LibFcn, LibraryBuilder, Pattern, RegistryError, Signature};

use crate::util::{FcnResult, concrete, double, nullary};

macro_rules! unary_double {
    ($lib:expr, $($name:literal => $op:expr),* $(,)?) => {
        $(
            $lib.register(
                LibFcn::new($name, |_, args| Ok(Value::Double(($op)(double(args, 0)?))))
                    .signature(concrete([("x", AvroType::Double)], AvroType::Double)),
            )?;
        )*
    };
}

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    lib.register(
        LibFcn::new("m.pi", |_, _| Ok(Value::Double(std::f64::consts::PI)))
            .signature(nullary(AvroType::Double)),
    )?
    .register(
        LibFcn::new("m.e", |_, _| Ok(Value::Double(std::f64::consts::E)))
            .signature(nullary(AvroType::Double)),
    )?
    .register(
        LibFcn::new("m.abs", abs)
            .signature(Signature::new([("x", Pattern::numeric("A"))], Pattern::numeric("A")))
            .doc("Absolute value; the most negative integer overflows."),
    )?
    .register(
        LibFcn::new("m.atan2", |_, args| {
            Ok(Value::Double(double(args, 0)?.atan2(double(args, 1)?)))
        })
        .signature(concrete([("y", AvroType::Double), ("x", AvroType::Double)], AvroType::Double)),
    )?
    .register(
        LibFcn::new("m.hypot", |_, args| {
            Ok(Value::Double(double(args, 0)?.hypot(double(args, 1)?)))
        })
        .signature(concrete([("x", AvroType::Double), ("y", AvroType::Double)], AvroType::Double)),
    )?
    .register(
        LibFcn::new("m.round", round)
            .signature(concrete([("x", AvroType::Float)], AvroType::Int))
            .signature(concrete([("x", AvroType::Double)], AvroType::Long))
            .doc("Round half up to the nearest integer."),
    )?;

    unary_double!(lib,
        "m.sqrt" => f64::sqrt,
        "m.exp" => f64::exp,
        "m.ln" => f64::ln,
        "m.log10" => f64::log10,
        "m.sin" => f64::sin,
        "m.cos" => f64::cos,
        "m.tan" => f64::tan,
        "m.floor" => f64::floor,
        "m.ceil" => f64::ceil,
    );
    Ok(())
}

fn abs(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let overflow = || FcnError::new(format!("{} overflow", ctx.ret));
    match &args[0] {
        Value::Int(x) => x.checked_abs().map(Value::Int).ok_or_else(overflow),
        Value::Long(x) => x.checked_abs().map(Value::Long).ok_or_else(overflow),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        _ => Ok(Value::Double(double(args, 0)?.abs())),
    }
}

fn round(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let x = double(args, 0)?;
    if !x.is_finite() {
        return Err(FcnError::new("domain error"));
    }
    let rounded = (x + 0.5).floor();
    match ctx.ret {
        AvroType::Int => {
            if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
                return Err(FcnError::new("int overflow"));
            }
            Ok(Value::Int(rounded as i32))
        }
        _ => {
            if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                return Err(FcnError::new("long overflow"));
            }
            Ok(Value::Long(rounded as i64))
        }
    }
}
