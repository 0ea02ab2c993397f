use std::sync::Arc;

use indoc::indoc;
use pfa_core::{AvroType, Value};
use pfa_ir::{LibFcn, Library, NodeKind, Pattern, Signature, Slot};

use crate::ast::{CellSpec, Document, Expr, NewInit, PoolSpec};
use crate::compile::Compiler;
use crate::diagnostics::DiagnosticKind;
use crate::test_utils::{compile, compile_err, compile_ok, library};
use crate::Error;

fn doc(input: AvroType, output: AvroType, action: Vec<Expr>) -> Document {
    Document::new(input, output, action)
}

fn record_r() -> AvroType {
    AvroType::record(
        "R",
        [
            ("a", AvroType::array(AvroType::Int)),
            ("b", AvroType::String),
        ],
    )
}

#[test]
fn call_binds_widened_params() {
    let exe = compile_ok(&doc(
        AvroType::Double,
        AvroType::Double,
        vec![Expr::call("+", [Expr::var("input"), Expr::int(1)])],
    ));

    assert_eq!(exe.action.ty, AvroType::Double);
    assert!(exe.is_pure);
    assert_eq!(exe.slot_count, 1);
    let NodeKind::Do(items) = &exe.action.kind else {
        panic!("action lowers to a sequence");
    };
    let NodeKind::Call(call) = &items[0].kind else {
        panic!("expected a call");
    };
    assert_eq!(call.params, vec![AvroType::Double, AvroType::Double]);
    assert_eq!(call.pos, "action[0]");
}

#[test]
fn int_output_accepts_narrower_action() {
    let exe = compile_ok(&doc(
        AvroType::Int,
        AvroType::Long,
        vec![Expr::var("input")],
    ));

    assert_eq!(exe.action.ty, AvroType::Int);
}

#[test]
fn unknown_function() {
    let out = compile_err(&doc(
        AvroType::Int,
        AvroType::Int,
        vec![Expr::call("nope", [Expr::var("input")])],
    ));

    insta::assert_snapshot!(out, @"error at action[0]: `nope` is not a known function");
}

#[test]
fn unresolved_reference() {
    let out = compile_err(&doc(
        AvroType::Int,
        AvroType::Int,
        vec![Expr::call("+", [Expr::var("x"), Expr::int(1)])],
    ));

    insta::assert_snapshot!(out, @"error at action[0].args[0]: `x` is not defined");
}

#[test]
fn no_matching_signature_lists_candidates() {
    let out = compile_err(&doc(
        AvroType::Int,
        AvroType::Int,
        vec![Expr::call("s.len", [Expr::var("input")])],
    ));

    insta::assert_snapshot!(out, @r"
    error at action[0]: no signature of `s.len` accepts (int)
      note at action[0].args[0]: (s: string) -> int: argument 0 expects string, got int
    ");
}

#[test]
fn ambiguous_signature_fails() {
    let mut builder = Library::builder();
    builder
        .register(
            LibFcn::new("f", |_, _| Ok(Value::Null))
                .signature(Signature::new(
                    [("x", Pattern::from(AvroType::Long)), ("y", Pattern::from(AvroType::Float))],
                    AvroType::Double,
                ))
                .signature(Signature::new(
                    [("x", Pattern::from(AvroType::Float)), ("y", Pattern::from(AvroType::Long))],
                    AvroType::Double,
                )),
        )
        .expect("register f");
    let library = Arc::new(builder.build());

    let result = Compiler::builder(&library).build().compile(&doc(
        AvroType::Int,
        AvroType::Double,
        vec![Expr::call("f", [Expr::var("input"), Expr::var("input")])],
    ));

    let Err(Error::CompileError(diagnostics)) = result else {
        panic!("expected an ambiguity error");
    };
    insta::assert_snapshot!(diagnostics.render(), @r"
    error at action[0]: call to `f` is ambiguous between 2 signatures
      note at action[0]: candidate (x: long, y: float) -> double
      note at action[0]: candidate (x: float, y: long) -> double
    ");
}

#[test]
fn output_type_mismatch() {
    let out = compile_err(&doc(
        AvroType::String,
        AvroType::Int,
        vec![Expr::var("input")],
    ));

    insta::assert_snapshot!(out, @"error at action: action does not produce the declared output type: expected int, got string");
}

#[test]
fn literal_must_match_its_type() {
    let out = compile_err(&doc(
        AvroType::Null,
        AvroType::Int,
        vec![Expr::literal(Value::from("x"), AvroType::Int)],
    ));

    insta::assert_snapshot!(out, @r#"error at action[0]: type mismatch: literal "x" is not a valid int"#);
}

#[test]
fn literal_is_conformed() {
    let exe = compile_ok(&doc(
        AvroType::Null,
        AvroType::Double,
        vec![Expr::literal(Value::Int(3), AvroType::Double)],
    ));

    let NodeKind::Do(items) = &exe.action.kind else {
        panic!("action lowers to a sequence");
    };
    assert!(matches!(&items[0].kind, NodeKind::Literal(Value::Double(x)) if *x == 3.0));
}

#[test]
fn redeclaration_points_at_first_declaration() {
    let out = compile_err(&doc(
        AvroType::Null,
        AvroType::Int,
        vec![
            Expr::let_("x", Expr::int(1)),
            Expr::let_("x", Expr::int(2)),
            Expr::var("x"),
        ],
    ));

    assert_eq!(
        out,
        indoc! {"
            error at action[1].let.x: `x` is already declared
              note at action[0].let.x: first declared here
              hint: use `set` to assign an existing variable"}
    );
}

#[test]
fn input_cannot_be_shadowed() {
    let out = compile_err(&doc(
        AvroType::Int,
        AvroType::Null,
        vec![Expr::Do(vec![Expr::let_("input", Expr::int(1))])],
    ));

    assert!(out.starts_with("error at action[0].do[0].let.input: `input` is already declared"));
}

#[test]
fn set_requires_compatible_type() {
    let out = compile_err(&doc(
        AvroType::Null,
        AvroType::Int,
        vec![
            Expr::let_("x", Expr::int(1)),
            Expr::set("x", Expr::string("a")),
            Expr::var("x"),
        ],
    ));

    insta::assert_snapshot!(out, @"error at action[1].set.x: type mismatch: `x` is int, cannot assign string");
}

#[test]
fn scopes_end_with_their_block() {
    let out = compile_err(&doc(
        AvroType::Null,
        AvroType::Int,
        vec![Expr::Do(vec![Expr::let_("x", Expr::int(1))]), Expr::var("x")],
    ));

    insta::assert_snapshot!(out, @"error at action[1]: `x` is not defined");
}

#[test]
fn if_branch_types() {
    let with_else = compile_ok(&doc(
        AvroType::Boolean,
        AvroType::Double,
        vec![Expr::if_(
            Expr::var("input"),
            vec![Expr::int(1)],
            Some(vec![Expr::double(2.0)]),
        )],
    ));
    assert_eq!(with_else.action.ty, AvroType::Double);

    let mixed = compile_ok(&doc(
        AvroType::Boolean,
        AvroType::union([AvroType::Int, AvroType::String]),
        vec![Expr::if_(
            Expr::var("input"),
            vec![Expr::int(1)],
            Some(vec![Expr::string("no")]),
        )],
    ));
    assert_eq!(mixed.action.ty, AvroType::union([AvroType::Int, AvroType::String]));

    let without_else = compile_ok(&doc(
        AvroType::Boolean,
        AvroType::Null,
        vec![Expr::if_(Expr::var("input"), vec![Expr::int(1)], None)],
    ));
    assert_eq!(without_else.action.ty, AvroType::Null);
}

#[test]
fn error_branch_does_not_widen() {
    let exe = compile_ok(&doc(
        AvroType::Boolean,
        AvroType::Int,
        vec![Expr::if_(
            Expr::var("input"),
            vec![Expr::int(1)],
            Some(vec![Expr::error("boom")]),
        )],
    ));

    assert_eq!(exe.action.ty, AvroType::Int);
}

#[test]
fn condition_must_be_boolean() {
    let out = compile_err(&doc(
        AvroType::Int,
        AvroType::Null,
        vec![Expr::if_(Expr::var("input"), vec![Expr::null()], None)],
    ));

    insta::assert_snapshot!(out, @"error at action[0].if: type mismatch: condition must be boolean, got int");
}

#[test]
fn cond_without_else_is_null() {
    let exe = compile_ok(&doc(
        AvroType::Int,
        AvroType::Null,
        vec![Expr::Cond {
            branches: vec![(
                Expr::call("<", [Expr::var("input"), Expr::int(0)]),
                vec![Expr::string("negative")],
            )],
            otherwise: None,
        }],
    ));

    assert_eq!(exe.action.ty, AvroType::Null);
}

#[test]
fn independent_errors_are_all_reported() {
    let result = compile(&doc(
        AvroType::Null,
        AvroType::Null,
        vec![Expr::call("nope", []), Expr::cell("missing"), Expr::var("y")],
    ));

    let Err(Error::CompileError(diagnostics)) = result else {
        panic!("expected diagnostics");
    };
    assert_eq!(
        diagnostics.kinds(),
        vec![
            DiagnosticKind::UnknownFunction,
            DiagnosticKind::UnknownCell,
            DiagnosticKind::UnresolvedReference,
        ]
    );
}

#[test]
fn for_each_binds_item_type() {
    let exe = compile_ok(&doc(
        AvroType::array(AvroType::Int),
        AvroType::Long,
        vec![
            Expr::let_("total", Expr::long(0)),
            Expr::for_each(
                "x",
                Expr::var("input"),
                vec![Expr::set("total", Expr::call("+", [Expr::var("total"), Expr::var("x")]))],
            ),
            Expr::var("total"),
        ],
    ));

    assert_eq!(exe.slot_count, 3);
    let NodeKind::Do(items) = &exe.action.kind else {
        panic!("action lowers to a sequence");
    };
    assert!(matches!(&items[1].kind, NodeKind::ForEach { slot: Slot(2), .. }));
}

#[test]
fn for_each_needs_an_array() {
    let out = compile_err(&doc(
        AvroType::Int,
        AvroType::Null,
        vec![Expr::for_each("x", Expr::var("input"), vec![])],
    ));

    insta::assert_snapshot!(out, @"error at action[0].in: type mismatch: foreach needs an array, got int");
}

#[test]
fn attr_walks_records_and_arrays() {
    let exe = compile_ok(&doc(
        record_r(),
        AvroType::Int,
        vec![Expr::attr(Expr::var("input"), [Expr::string("a"), Expr::int(0)])],
    ));
    assert_eq!(exe.action.ty, AvroType::Int);

    let out = compile_err(&doc(
        record_r(),
        AvroType::Int,
        vec![Expr::attr(Expr::var("input"), [Expr::string("c")])],
    ));
    insta::assert_snapshot!(out, @"error at action[0].path[0]: invalid path: record R has no field `c`");

    let out = compile_err(&doc(
        record_r(),
        AvroType::Int,
        vec![Expr::attr(Expr::var("input"), [Expr::string("b"), Expr::int(0)])],
    ));
    insta::assert_snapshot!(out, @"error at action[0].path[1]: invalid path: cannot index into string");
}

#[test]
fn new_record_checks_fields() {
    let build = |fields: Vec<(String, Expr)>| {
        doc(
            AvroType::Null,
            record_r(),
            vec![Expr::New {
                ty: record_r(),
                init: NewInit::Fields(fields),
            }],
        )
    };

    compile_ok(&build(vec![
        (
            "a".to_owned(),
            Expr::New {
                ty: AvroType::array(AvroType::Int),
                init: NewInit::Items(vec![Expr::int(1), Expr::int(2)]),
            },
        ),
        ("b".to_owned(), Expr::string("x")),
    ]));

    let out = compile_err(&build(vec![("b".to_owned(), Expr::int(1))]));
    insta::assert_snapshot!(out, @r"
    error at action[0].new.b: type mismatch: field `b` is string, got int
    error at action[0].new: type mismatch: missing field `a`
    ");
}

#[test]
fn cells_and_pools_resolve() {
    let document = doc(
        AvroType::String,
        AvroType::Int,
        vec![
            Expr::cell_set("count", Expr::call("+", [Expr::cell("count"), Expr::int(1)])),
            Expr::pool_set("seen", Expr::var("input"), Expr::cell("count")),
            Expr::pool("seen", Expr::var("input"), Some(Expr::int(0))),
        ],
    )
    .cell("count", CellSpec::new(AvroType::Int, Value::Int(0)))
    .pool("seen", PoolSpec::new(AvroType::Int).entry("a", Value::Int(1)));

    let exe = compile_ok(&document);

    assert!(!exe.is_pure);
    assert_eq!(exe.cells[0].init, Value::Int(0));
    assert_eq!(exe.pools[0].init["a"], Value::Int(1));
}

#[test]
fn unknown_state_names() {
    let out = compile_err(&doc(
        AvroType::String,
        AvroType::Null,
        vec![
            Expr::cell("nope"),
            Expr::pool_set("missing", Expr::var("input"), Expr::int(1)),
            Expr::null(),
        ],
    ));

    insta::assert_snapshot!(out, @r"
    error at action[0]: `nope` is not a declared cell
    error at action[1]: `missing` is not a declared pool
    ");
}

#[test]
fn pool_keys_are_strings() {
    let document = doc(
        AvroType::Int,
        AvroType::Int,
        vec![Expr::pool("p", Expr::var("input"), None)],
    )
    .pool("p", PoolSpec::new(AvroType::Int));

    insta::assert_snapshot!(compile_err(&document), @"error at action[0].key: type mismatch: pool keys are strings, got int");
}

#[test]
fn invalid_initializer() {
    let document = doc(AvroType::Null, AvroType::Null, vec![Expr::null()])
        .cell("count", CellSpec::new(AvroType::Int, Value::from("x")));

    insta::assert_snapshot!(compile_err(&document), @r#"error at cells.count.init: initial value does not match the declared type: "x" is not a valid int"#);
}

#[test]
fn schema_errors_are_positional() {
    let bad = AvroType::record("R", [("a", AvroType::Int), ("a", AvroType::Long)]);

    let out = compile_err(&doc(bad, AvroType::Null, vec![Expr::null()]));

    insta::assert_snapshot!(out, @"error at input: invalid schema: record `R` declares field `a` more than once");
}

#[test]
fn rng_use_marks_impure() {
    let exe = compile_ok(&doc(
        AvroType::Null,
        AvroType::Int,
        vec![Expr::call("rand.int", [])],
    ));

    assert!(!exe.is_pure);
}

#[test]
fn deep_nesting_hits_recursion_limit() {
    let mut expr = Expr::int(1);
    for _ in 0..20 {
        expr = Expr::call("u-", [expr]);
    }
    let document = doc(AvroType::Null, AvroType::Int, vec![expr]);

    let result = Compiler::builder(&library())
        .max_depth(10)
        .build()
        .compile(&document);

    assert!(matches!(result, Err(Error::RecursionLimitExceeded)));
    assert!(compile(&document).is_ok());
}
