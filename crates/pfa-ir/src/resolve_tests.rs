use pfa_core::AvroType;

use super::*;
use crate::signature::{Pattern, Signature};

fn add_signature() -> Signature {
    Signature::new(
        [("x", Pattern::numeric("A")), ("y", Pattern::numeric("A"))],
        Pattern::numeric("A"),
    )
}

#[test]
fn wildcard_binds_first_argument() {
    let resolved = resolve("+", &[add_signature()], &[AvroType::Int, AvroType::Int]).expect("resolves");

    assert_eq!(resolved.params, vec![AvroType::Int, AvroType::Int]);
    assert_eq!(resolved.ret, AvroType::Int);
    assert_eq!(resolved.widening, 0);
}

#[test]
fn wildcard_widens_to_later_numeric() {
    let resolved =
        resolve("+", &[add_signature()], &[AvroType::Int, AvroType::Double]).expect("resolves");

    assert_eq!(resolved.params, vec![AvroType::Double, AvroType::Double]);
    assert_eq!(resolved.ret, AvroType::Double);
    assert_eq!(resolved.widening, 3);
}

#[test]
fn wildcard_accepts_narrower_later_argument() {
    let resolved =
        resolve("+", &[add_signature()], &[AvroType::Long, AvroType::Int]).expect("resolves");

    assert_eq!(resolved.ret, AvroType::Long);
    assert_eq!(resolved.widening, 1);
}

#[test]
fn wildcard_class_rejects_outside_types() {
    let err = resolve("+", &[add_signature()], &[AvroType::String, AvroType::Int])
        .expect_err("strings are not numeric");

    let ResolveError::NoMatch { candidates, .. } = err else {
        panic!("expected NoMatch");
    };
    assert_eq!(candidates[0].1.position(), Some(0));
    insta::assert_snapshot!(candidates[0].1.to_string(), @"argument 0 expects A: numeric, got string");
}

#[test]
fn conflicting_bindings_reject_signature() {
    let eq = Signature::new(
        [("x", Pattern::any("A")), ("y", Pattern::any("A"))],
        AvroType::Boolean,
    );

    let err = resolve("==", &[eq], &[AvroType::Int, AvroType::String]).expect_err("conflict");
    let ResolveError::NoMatch { candidates, .. } = err else {
        panic!("expected NoMatch");
    };
    insta::assert_snapshot!(candidates[0].1.to_string(), @"argument 1 is string, but A is already int");
}

#[test]
fn wildcard_widens_to_union_containing_binding() {
    let eq = Signature::new(
        [("x", Pattern::any("A")), ("y", Pattern::any("A"))],
        AvroType::Boolean,
    );
    let nullable = AvroType::union([AvroType::Null, AvroType::String]);

    let resolved = resolve("==", &[eq], &[AvroType::Null, nullable.clone()]).expect("resolves");
    assert_eq!(resolved.params, vec![nullable.clone(), nullable]);
}

#[test]
fn container_patterns_bind_item_types() {
    let append = Signature::new(
        [("a", Pattern::array(Pattern::any("A"))), ("item", Pattern::any("A"))],
        Pattern::array(Pattern::any("A")),
    );

    let resolved = resolve(
        "a.append",
        &[append],
        &[AvroType::array(AvroType::Int), AvroType::Double],
    )
    .expect("resolves");
    assert_eq!(resolved.params[0], AvroType::array(AvroType::Double));
    assert_eq!(resolved.ret, AvroType::array(AvroType::Double));
}

#[test]
fn least_widening_wins() {
    let round = [
        Signature::new([("x", Pattern::from(AvroType::Float))], AvroType::Int),
        Signature::new([("x", Pattern::from(AvroType::Double))], AvroType::Long),
    ];

    let from_int = resolve("m.round", &round, &[AvroType::Int]).expect("resolves");
    assert_eq!(from_int.index, 0);
    let from_double = resolve("m.round", &round, &[AvroType::Double]).expect("resolves");
    assert_eq!(from_double.index, 1);
}

#[test]
fn equal_widening_is_ambiguous() {
    let f = [
        Signature::new(
            [("x", Pattern::from(AvroType::Long)), ("y", Pattern::from(AvroType::Double))],
            AvroType::Long,
        ),
        Signature::new(
            [("x", Pattern::from(AvroType::Double)), ("y", Pattern::from(AvroType::Long))],
            AvroType::Long,
        ),
    ];

    let err = resolve("f", &f, &[AvroType::Int, AvroType::Int]).expect_err("tie");
    assert!(matches!(&err, ResolveError::Ambiguous { candidates, .. } if candidates.len() == 2));
    insta::assert_snapshot!(err.to_string(), @"call to `f` is ambiguous between 2 signatures");
}

#[test]
fn arity_mismatch_is_reported_per_candidate() {
    let err = resolve("+", &[add_signature()], &[AvroType::Int]).expect_err("arity");

    let ResolveError::NoMatch { candidates, .. } = err else {
        panic!("expected NoMatch");
    };
    assert_eq!(
        candidates[0].1,
        Mismatch::Arity {
            expected: 2,
            actual: 1
        }
    );
    assert_eq!(candidates[0].1.position(), None);
}

#[test]
fn resolution_is_deterministic() {
    let args = [AvroType::Int, AvroType::Float];

    let first = resolve("+", &[add_signature()], &args);
    let second = resolve("+", &[add_signature()], &args);
    assert_eq!(first, second);
}

#[test]
fn signature_display_lists_constraints() {
    let sig = Signature::new(
        [
            ("a", Pattern::array(Pattern::numeric("A"))),
            ("f", Pattern::one_of("B", [AvroType::String, AvroType::Bytes])),
        ],
        Pattern::any("A"),
    );

    insta::assert_snapshot!(sig.to_string(), @"(a: array<A>, f: B) -> A where A: numeric, B: one of string | bytes");
}
