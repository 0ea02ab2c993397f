//! End-to-end scoring: documents compiled and run through the public surface.

use std::sync::Arc;

use indoc::indoc;
use pfa_ir::FcnError;

use crate::{
    AvroType, CellSpec, Document, EngineBuilder, EngineInstance, Error, Expr, LibFcn, Library,
    Pattern, RuntimeError, Signature, Value, compile,
};

fn seeded(call: Expr, output: AvroType) -> EngineInstance {
    let doc = Document::new(AvroType::Null, output, vec![call]).randseed(12345);
    compile(&doc).expect("compiles").instantiate(1).remove(0)
}

fn draw(engine: &mut EngineInstance, n: usize) -> Vec<Value> {
    (0..n)
        .map(|_| engine.action(Value::Null).expect("draws"))
        .collect()
}

fn close(values: &[Value], expected: &[f64]) {
    assert_eq!(values.len(), expected.len());
    for (value, want) in values.iter().zip(expected) {
        let Value::Double(x) = value else {
            panic!("expected double, got {value}");
        };
        assert!((x - want).abs() < 1e-8, "{x} != {want}");
    }
}

#[test]
fn integer_draws_reproduce_reference() {
    let mut ints = seeded(Expr::call("rand.int", []), AvroType::Int);
    assert_eq!(
        draw(&mut ints, 3),
        vec![Value::Int(-358114921), Value::Int(-2103807398), Value::Int(1396751321)]
    );

    let mut bounded = seeded(Expr::call("rand.int", [Expr::int(5), Expr::int(10)]), AvroType::Int);
    assert_eq!(draw(&mut bounded, 3), vec![Value::Int(7), Value::Int(5), Value::Int(9)]);

    let mut longs = seeded(Expr::call("rand.long", []), AvroType::Long);
    assert_eq!(
        draw(&mut longs, 3),
        vec![
            Value::Long(4292285838037326215),
            Value::Long(6551146165133617474),
            Value::Long(-5650950641291792112),
        ]
    );
}

#[test]
fn real_draws_reproduce_reference() {
    let mut doubles = seeded(
        Expr::call("rand.double", [Expr::int(5), Expr::int(10)]),
        AvroType::Double,
    );
    close(&draw(&mut doubles, 3), &[7.08309936273, 5.05084584729, 9.12603254627]);

    let mut gaussian = seeded(
        Expr::call("rand.gaussian", [Expr::int(10), Expr::int(2)]),
        AvroType::Double,
    );
    close(&draw(&mut gaussian, 3), &[9.75239840882, 10.143049927, 10.7667383886]);
}

#[test]
fn text_draws_reproduce_reference() {
    let mut alphabet = seeded(
        Expr::call(
            "rand.string",
            [Expr::int(10), Expr::string("abcdefghijklmnopqrstuvwxyz0123456789")],
        ),
        AvroType::String,
    );
    assert_eq!(draw(&mut alphabet, 1), vec![Value::from("oa3kngufep")]);

    let mut range = seeded(
        Expr::call("rand.string", [Expr::int(10), Expr::int(33), Expr::int(127)]),
        AvroType::String,
    );
    assert_eq!(draw(&mut range, 1), vec![Value::from("H!n=C3V0,I")]);

    let mut bytes = seeded(Expr::call("rand.bytes", [Expr::int(10)]), AvroType::Bytes);
    assert_eq!(
        draw(&mut bytes, 1),
        vec![Value::Bytes(b"j\x02\xd3L^1\x90)\x1fn".to_vec())]
    );
}

#[test]
fn uuids_have_version_and_variant() {
    let doc = Document::new(AvroType::Null, AvroType::String, vec![Expr::call("rand.uuid4", [])]);
    let mut engine = compile(&doc).expect("compiles").instantiate(1).remove(0);

    for _ in 0..20 {
        let Ok(Value::String(uuid)) = engine.action(Value::Null) else {
            panic!("uuid is a string");
        };
        let groups: Vec<&str> = uuid.split('-').collect();
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), [8, 4, 4, 4, 12]);
        assert!(groups[2].starts_with('4'), "{uuid}");
        assert!(groups[3].starts_with(['8', '9', 'a', 'b']), "{uuid}");
    }
}

#[test]
fn fixed_converts_to_bytes() {
    let doc = Document::new(
        AvroType::fixed("Digest", 4),
        AvroType::Bytes,
        vec![Expr::call("fixed.toBytes", [Expr::var("input")])],
    );
    let mut engine = compile(&doc).expect("compiles").instantiate(1).remove(0);

    assert_eq!(
        engine.action(Value::Fixed(vec![1, 2, 3, 4])),
        Ok(Value::Bytes(vec![1, 2, 3, 4]))
    );
    assert!(matches!(
        engine.action(Value::Fixed(vec![1, 2])),
        Err(RuntimeError::InputTypeMismatch { .. })
    ));
}

#[test]
fn regex_calls_run_end_to_end() {
    let find = Document::new(
        AvroType::String,
        AvroType::union([AvroType::String, AvroType::Null]),
        vec![Expr::call("re.findFirst", [Expr::var("input"), Expr::string("[0-9]+")])],
    );
    let mut find = compile(&find).expect("compiles").instantiate(1).remove(0);
    assert_eq!(find.action(Value::from("ab123c45")), Ok(Value::from("123")));
    assert_eq!(find.action(Value::from("abc")), Ok(Value::Null));

    let replace = Document::new(
        AvroType::String,
        AvroType::String,
        vec![Expr::call(
            "re.replaceAll",
            [Expr::var("input"), Expr::string("[0-9]"), Expr::string("#")],
        )],
    );
    let mut replace = compile(&replace).expect("compiles").instantiate(1).remove(0);
    assert_eq!(replace.action(Value::from("a1b22")), Ok(Value::from("a#b##")));

    let bad = Document::new(
        AvroType::String,
        AvroType::Int,
        vec![Expr::call("re.count", [Expr::var("input"), Expr::string("(")])],
    );
    let mut bad = compile(&bad).expect("compiles").instantiate(1).remove(0);
    assert!(matches!(
        bad.action(Value::from("x")),
        Err(RuntimeError::Function { name, .. }) if name == "re.count"
    ));
}

#[test]
fn pure_actions_are_referentially_transparent() {
    let doc = Document::new(
        AvroType::String,
        AvroType::Int,
        vec![Expr::call("*", [Expr::call("s.len", [Expr::var("input")]), Expr::int(3)])],
    );
    let engine = compile(&doc).expect("compiles");
    assert!(engine.executable().is_pure);

    let mut instances = engine.instantiate(2);
    for word in ["", "abc", "héllo"] {
        let first = instances[0].action(Value::from(word));
        assert_eq!(instances[0].action(Value::from(word)), first);
        assert_eq!(instances[1].action(Value::from(word)), first);
    }
}

#[test]
fn stateful_engines_are_not_pure() {
    let doc = Document::new(AvroType::Null, AvroType::Int, vec![Expr::cell("n")])
        .cell("n", CellSpec::new(AvroType::Int, Value::Int(3)));

    let engine = compile(&doc).expect("compiles");

    assert!(!engine.executable().is_pure);
    assert_eq!(engine.instantiate(1)[0].get_cell("n"), Ok(Value::Int(3)));
}

#[test]
fn compile_errors_surface_diagnostics() {
    let doc = Document::new(
        AvroType::Int,
        AvroType::String,
        vec![
            Expr::call("nope", [Expr::var("input")]),
            Expr::call("s.len", [Expr::var("missing")]),
        ],
    );

    let Err(err) = compile(&doc) else {
        panic!("expected compile errors");
    };
    assert_eq!(err.to_string(), "compilation failed with 2 errors");
    let Error::CompileError(diagnostics) = err else {
        panic!("expected diagnostics");
    };
    assert_eq!(
        diagnostics.render(),
        indoc! {"
            error at action[0]: `nope` is not a known function
            error at action[1].args[0]: `missing` is not defined"}
    );
}

#[test]
fn builder_limits_nesting() {
    let mut expr = Expr::int(1);
    for _ in 0..50 {
        expr = Expr::call("u-", [expr]);
    }
    let doc = Document::new(AvroType::Null, AvroType::Int, vec![expr]);

    let result = EngineBuilder::new().max_depth(16).compile(&doc);

    assert!(matches!(result, Err(Error::RecursionLimitExceeded)));
    assert!(EngineBuilder::new().compile(&doc).is_ok());
}

fn twice(_: &mut pfa_ir::CallContext<'_>, args: &[Value]) -> Result<Value, FcnError> {
    match args.first() {
        Some(Value::Int(x)) => x
            .checked_mul(2)
            .map(Value::Int)
            .ok_or_else(|| FcnError::new("int overflow")),
        _ => Err(FcnError::new("expected an int")),
    }
}

#[test]
fn builder_accepts_custom_library() {
    let mut library = Library::builder();
    library
        .register(LibFcn::new("twice", twice).signature(Signature::new(
            [("x", Pattern::from(AvroType::Int))],
            AvroType::Int,
        )))
        .expect("register");
    let mut builder = EngineBuilder::new().library(Arc::new(library.build()));

    let doc = Document::new(
        AvroType::Int,
        AvroType::Int,
        vec![Expr::call("twice", [Expr::var("input")])],
    );
    let mut engine = builder.compile(&doc).expect("compiles").instantiate(1).remove(0);
    assert_eq!(engine.action(Value::Int(21)), Ok(Value::Int(42)));

    let builtin = Document::new(
        AvroType::Int,
        AvroType::Int,
        vec![Expr::call("+", [Expr::var("input"), Expr::int(1)])],
    );
    assert!(matches!(builder.compile(&builtin), Err(Error::CompileError(_))));
}

#[test]
fn unseeded_instances_draw_independently() {
    let doc = Document::new(AvroType::Null, AvroType::Long, vec![Expr::call("rand.long", [])]);
    let mut instances = compile(&doc).expect("compiles").instantiate(2);

    let a = draw(&mut instances[0], 4);
    let b = draw(&mut instances[1], 4);

    assert_ne!(a, b);
}

#[test]
fn outputs_serialize_as_json() {
    let point = AvroType::record("Point", [("x", AvroType::Double), ("tag", AvroType::Bytes)]);
    let doc = Document::new(
        AvroType::Double,
        point.clone(),
        vec![Expr::New {
            ty: point,
            init: crate::NewInit::Fields(vec![
                ("tag".to_owned(), Expr::call("bytes.encodeUtf8", [Expr::string("é")])),
                ("x".to_owned(), Expr::var("input")),
            ]),
        }],
    );
    let mut engine = compile(&doc).expect("compiles").instantiate(1).remove(0);

    let out = engine.action(Value::Int(3)).expect("builds");

    let json = serde_json::to_string(&out).expect("serializes");
    insta::assert_snapshot!(json, @r#"{"x":3.0,"tag":"Ã©"}"#);
}
