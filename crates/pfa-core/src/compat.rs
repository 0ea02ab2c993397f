//! Type compatibility: acceptance, numeric widening, least upper bound.
//!
//! Widening follows the chain `int < long < float < double`. Containers are
//! covariant in their item/value type. A union accepts anything one of its
//! variants accepts; a union is accepted when every variant is.

use crate::avro::AvroType;

/// Whether a value of type `actual` may be used where `expected` is required.
pub fn accepts(expected: &AvroType, actual: &AvroType) -> bool {
    widening_cost(expected, actual).is_some()
}

/// Numeric promotion distance needed to use `actual` as `expected`.
///
/// `None` when `expected` does not accept `actual`; `Some(0)` for exact
/// structural matches.
pub fn widening_cost(expected: &AvroType, actual: &AvroType) -> Option<u32> {
    if expected == actual {
        return Some(0);
    }

    match (expected, actual) {
        (_, AvroType::Union(variants)) => variants.iter().try_fold(0, |worst, variant| {
            widening_cost(expected, variant).map(|cost| worst.max(cost))
        }),
        (AvroType::Union(variants), _) => variants
            .iter()
            .filter_map(|variant| widening_cost(variant, actual))
            .min(),
        (AvroType::Array(e), AvroType::Array(a)) => widening_cost(e, a),
        (AvroType::Map(e), AvroType::Map(a)) => widening_cost(e, a),
        _ => match (expected.numeric_rank(), actual.numeric_rank()) {
            (Some(e), Some(a)) if e >= a => Some(u32::from(e - a)),
            _ => None,
        },
    }
}

/// Narrowest type accepting both `a` and `b`.
///
/// Unrelated types produce a flattened union in first-seen order; variants
/// subsumed by another variant are dropped.
pub fn least_upper_bound(a: &AvroType, b: &AvroType) -> AvroType {
    if accepts(a, b) {
        return a.clone();
    }
    if accepts(b, a) {
        return b.clone();
    }

    let mut variants: Vec<AvroType> = Vec::new();
    for candidate in a.variants().iter().chain(b.variants()) {
        if variants.iter().any(|v| accepts(v, candidate)) {
            continue;
        }
        if let Some(pos) = variants.iter().position(|v| accepts(candidate, v)) {
            variants[pos] = candidate.clone();
            variants.retain(|v| v == candidate || !accepts(candidate, v));
            continue;
        }
        variants.push(candidate.clone());
    }

    match variants.len() {
        1 => variants.remove(0),
        _ => AvroType::Union(variants),
    }
}

#[cfg(test)]
#[path = "compat_tests.rs"]
mod compat_tests;
