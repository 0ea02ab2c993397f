//! `a.*` and `map.*`: arrays and maps. Both are values, so "mutators"
//! return an updated copy.

use pfa_core::{AvroType, Value};
use pfa_ir::{CallContext, FcnError, LibFcn, LibraryBuilder, Pattern, RegistryError, Signature};

use crate::util::{FcnResult, array, clip_range, int, map, string};

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    let items = || Pattern::array(Pattern::any("A"));
    let entries = || Pattern::map(Pattern::any("A"));
    let item = || Pattern::any("A");

    lib.register(
        LibFcn::new("a.len", |_, args| Ok(Value::Int(array(args, 0)?.len() as i32)))
            .signature(Signature::new([("a", items())], AvroType::Int)),
    )?
    .register(
        LibFcn::new("a.subseq", subseq).signature(Signature::new(
            [
                ("a", items()),
                ("start", Pattern::from(AvroType::Int)),
                ("end", Pattern::from(AvroType::Int)),
            ],
            items(),
        )),
    )?
    .register(
        LibFcn::new("a.append", append)
            .signature(Signature::new([("a", items()), ("item", item())], items())),
    )?
    .register(
        LibFcn::new("a.concat", concat)
            .signature(Signature::new([("a", items()), ("b", items())], items())),
    )?
    .register(
        LibFcn::new("a.contains", |_, args| {
            Ok(Value::Boolean(array(args, 0)?.contains(&args[1])))
        })
        .signature(Signature::new([("a", items()), ("item", item())], AvroType::Boolean)),
    )?
    .register(
        LibFcn::new("a.sum", sum)
            .signature(Signature::new(
                [("a", Pattern::array(Pattern::numeric("A")))],
                Pattern::numeric("A"),
            ))
            .doc("Sum of the items; zero for an empty array."),
    )?
    .register(
        LibFcn::new("map.len", |_, args| Ok(Value::Int(map(args, 0)?.len() as i32)))
            .signature(Signature::new([("m", entries())], AvroType::Int)),
    )?
    .register(
        LibFcn::new("map.keys", |_, args| {
            Ok(Value::Array(map(args, 0)?.keys().map(|k| Value::from(k.as_str())).collect()))
        })
        .signature(Signature::new([("m", entries())], AvroType::array(AvroType::String))),
    )?
    .register(
        LibFcn::new("map.values", |_, args| {
            Ok(Value::Array(map(args, 0)?.values().cloned().collect()))
        })
        .signature(Signature::new([("m", entries())], items())),
    )?
    .register(
        LibFcn::new("map.containsKey", |_, args| {
            Ok(Value::Boolean(map(args, 0)?.contains_key(string(args, 1)?)))
        })
        .signature(Signature::new(
            [("m", entries()), ("key", Pattern::from(AvroType::String))],
            AvroType::Boolean,
        )),
    )?
    .register(
        LibFcn::new("map.add", add).signature(Signature::new(
            [
                ("m", entries()),
                ("key", Pattern::from(AvroType::String)),
                ("value", item()),
            ],
            entries(),
        )),
    )?;
    Ok(())
}

fn subseq(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let a = array(args, 0)?;
    let (start, end) = clip_range(a.len(), i64::from(int(args, 1)?), i64::from(int(args, 2)?));
    Ok(Value::Array(a[start..end].to_vec()))
}

fn append(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let mut out = array(args, 0)?.to_vec();
    out.push(args[1].clone());
    Ok(Value::Array(out))
}

fn concat(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let mut out = array(args, 0)?.to_vec();
    out.extend_from_slice(array(args, 1)?);
    Ok(Value::Array(out))
}

fn sum(ctx: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let items = array(args, 0)?;
    let overflow = || FcnError::new(format!("{} overflow", ctx.ret));
    match ctx.ret {
        AvroType::Int => items
            .iter()
            .try_fold(0i32, |acc, v| match v {
                Value::Int(x) => acc.checked_add(*x),
                _ => None,
            })
            .map(Value::Int)
            .ok_or_else(overflow),
        AvroType::Long => items
            .iter()
            .try_fold(0i64, |acc, v| acc.checked_add(v.as_i64()?))
            .map(Value::Long)
            .ok_or_else(overflow),
        AvroType::Float => Ok(Value::Float(
            items.iter().filter_map(Value::as_f64).sum::<f64>() as f32,
        )),
        _ => Ok(Value::Double(items.iter().filter_map(Value::as_f64).sum())),
    }
}

fn add(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let mut out = map(args, 0)?.clone();
    out.insert(string(args, 1)?.to_owned(), args[2].clone());
    Ok(Value::Map(out))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use pfa_core::Value;

    use crate::test_utils::{err, ints, ok, strs};

    #[test]
    fn append_widens_items() {
        let out = ok("a.append", vec![ints(&[1, 2]), Value::Double(0.5)]);

        assert_eq!(
            out,
            Value::Array(vec![Value::Double(1.0), Value::Double(2.0), Value::Double(0.5)])
        );
    }

    #[test]
    fn subseq_and_concat() {
        assert_eq!(ok("a.subseq", vec![ints(&[1, 2, 3, 4]), Value::Int(1), Value::Int(-1)]), ints(&[2, 3]));
        assert_eq!(ok("a.concat", vec![ints(&[1]), ints(&[2])]), ints(&[1, 2]));
        assert_eq!(ok("a.contains", vec![strs(&["x", "y"]), Value::from("y")]), Value::Boolean(true));
    }

    #[test]
    fn sum_checks_overflow() {
        assert_eq!(ok("a.sum", vec![ints(&[1, 2, 3])]), Value::Int(6));
        assert_eq!(err("a.sum", vec![ints(&[i32::MAX, 1])]), "int overflow");
    }

    #[test]
    fn map_functions() {
        let m = Value::Map(IndexMap::from([
            ("a".to_owned(), Value::Int(1)),
            ("b".to_owned(), Value::Int(2)),
        ]));

        assert_eq!(ok("map.keys", vec![m.clone()]), strs(&["a", "b"]));
        assert_eq!(ok("map.values", vec![m.clone()]), ints(&[1, 2]));
        assert_eq!(ok("map.containsKey", vec![m.clone(), Value::from("c")]), Value::Boolean(false));

        let added = ok("map.add", vec![m, Value::from("c"), Value::Int(3)]);
        assert_eq!(ok("map.len", vec![added]), Value::Int(3));
    }
}
