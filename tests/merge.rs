use chainstream::merge::{Combine, MergeError, fold_chunks, merge};
use proptest::prelude::*;
use serde_json::{Value, json};

#[test]
fn first_chunk_passes_through() {
    assert_eq!(merge(None, json!("hello")).unwrap(), json!("hello"));
    assert_eq!(merge(None, json!([1, 2])).unwrap(), json!([1, 2]));
}

#[test]
fn null_is_identity_on_either_side() {
    assert_eq!(merge(Some(Value::Null), json!("x")).unwrap(), json!("x"));
    assert_eq!(merge(Some(json!("x")), Value::Null).unwrap(), json!("x"));
}

#[test]
fn strings_concatenate_in_order() {
    assert_eq!(merge(Some(json!("he")), json!("llo")).unwrap(), json!("hello"));
}

#[test]
fn lists_concatenate_without_dedup() {
    assert_eq!(
        merge(Some(json!([1, 2])), json!([2, 3])).unwrap(),
        json!([1, 2, 2, 3])
    );
}

#[test]
fn numbers_accumulate() {
    assert_eq!(merge(Some(json!(1)), json!(1)).unwrap(), json!(2));
    assert_eq!(merge(Some(json!(1.5)), json!(2)).unwrap(), json!(3.5));
    assert_eq!(merge(Some(json!(-3)), json!(5)).unwrap(), json!(2));
}

#[test]
fn integer_sums_stay_exact() {
    // Large positive sums promote to u64 without losing precision.
    assert_eq!(
        merge(Some(json!(i64::MAX)), json!(1)).unwrap(),
        json!(i64::MAX as u64 + 1)
    );
    assert_eq!(
        merge(Some(json!(u64::MAX - 1)), json!(1)).unwrap(),
        json!(u64::MAX)
    );
}

#[test]
fn integer_overflow_is_an_error_not_a_float() {
    let err = merge(Some(json!(u64::MAX)), json!(1)).unwrap_err();
    assert!(matches!(err, MergeError::NotRepresentable));

    // Mixed signs beyond the exact paths are rejected too.
    let err = merge(Some(json!(-1)), json!(u64::MAX)).unwrap_err();
    assert!(matches!(err, MergeError::NotRepresentable));
}

#[test]
fn maps_merge_keywise_and_recurse() {
    let merged = merge(
        Some(json!({"text": "he", "usage": {"tokens": 1}})),
        json!({"text": "llo", "usage": {"tokens": 2}, "model": "m"}),
    )
    .unwrap();
    assert_eq!(
        merged,
        json!({"text": "hello", "usage": {"tokens": 3}, "model": "m"})
    );
}

#[test]
fn exclusive_keys_pass_through_unchanged() {
    let merged = merge(Some(json!({"a": 1})), json!({"b": 2})).unwrap();
    assert_eq!(merged, json!({"a": 1, "b": 2}));
}

#[test]
fn string_into_list_is_a_merge_error() {
    let err = merge(Some(json!([1])), json!("nope")).unwrap_err();
    assert!(matches!(
        err,
        MergeError::Incompatible {
            left: "array",
            right: "string"
        }
    ));
}

#[test]
fn booleans_have_no_combine_rule() {
    assert!(merge(Some(json!(true)), json!(true)).is_err());
}

#[test]
fn nested_shape_mismatch_surfaces() {
    let err = merge(Some(json!({"k": "text"})), json!({"k": [1]})).unwrap_err();
    assert!(matches!(err, MergeError::Incompatible { .. }));
}

#[test]
fn fold_chunks_replays_production_order() {
    let folded = fold_chunks(vec![json!("a"), json!("b"), json!("c")])
        .unwrap()
        .unwrap();
    assert_eq!(folded, json!("abc"));

    assert_eq!(fold_chunks(Vec::<Value>::new()).unwrap(), None);
}

#[test]
fn combine_is_usable_directly() {
    let out = json!({"n": 1}).combine(json!({"n": 2})).unwrap();
    assert_eq!(out, json!({"n": 3}));
}

proptest! {
    #[test]
    fn string_concat_is_associative(a in ".{0,16}", b in ".{0,16}", c in ".{0,16}") {
        let left = merge(Some(merge(Some(json!(a.clone())), json!(b.clone())).unwrap()), json!(c.clone())).unwrap();
        let right = merge(Some(json!(a)), merge(Some(json!(b)), json!(c)).unwrap()).unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn list_concat_preserves_length(a in proptest::collection::vec(0i64..100, 0..8),
                                    b in proptest::collection::vec(0i64..100, 0..8)) {
        let merged = merge(Some(json!(a.clone())), json!(b.clone())).unwrap();
        prop_assert_eq!(merged.as_array().unwrap().len(), a.len() + b.len());
    }

    #[test]
    fn small_integers_add(a in -1000i64..1000, b in -1000i64..1000) {
        let merged = merge(Some(json!(a)), json!(b)).unwrap();
        prop_assert_eq!(merged, json!(a + b));
    }
}
