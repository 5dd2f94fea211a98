//! Integration tests for freeze/thaw semantics and attached identity.

use strata::config::Config;
use strata::error::TreeError;
use strata::value::{Complex, Value};

fn sample() -> Config {
    Config::from_pairs([
        ("b", Value::Int(3)),
        ("a", Value::Complex(Complex::new(2.0, 3.0))),
        (
            "c",
            Value::from(vec![
                Value::Int(3),
                Value::Str("asdf".into()),
                Value::Map(Config::from_pairs([("cool", Value::Float(f64::INFINITY))]).unwrap()),
            ]),
        ),
    ])
    .unwrap()
}

#[test]
fn test_finalized_config_rejects_mutation_at_every_depth() {
    let mut cfg = sample();
    cfg.finalize();

    let expected = format!(
        "_CFG_ID: {}\n\nb: 3\n\na: 2+3j\n\nc:\n- 3\n- asdf\n- cool: .inf\n",
        cfg.identity().unwrap()
    );
    assert_eq!(cfg.to_string(), expected);

    // top-level insertion
    let err = cfg.set("d", Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "this config was already finalized: setting key 'd' to value null failed"
    );

    // top-level replacement
    let err = cfg
        .set("b", Value::Complex(Complex::new(3.0, 2.0)))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "this config was already finalized: setting key 'b' to value 3+2j failed"
    );

    // mutation through a frozen sequence is blocked too
    assert!(matches!(
        cfg.get_path_mut("c"),
        Err(TreeError::FrozenAccess { .. })
    ));
    let seq = cfg.get("c").unwrap().as_seq().unwrap();
    assert!(seq.frozen());
    // a frozen mapping nested inside the frozen sequence stays a frozen mapping
    assert!(seq.get(2).unwrap().as_map().unwrap().frozen());
}

#[test]
fn test_unfinalize_restores_mutation_everywhere() {
    let mut cfg = sample();
    cfg.finalize();
    cfg.unfinalize();

    cfg.set("d", Value::Null).unwrap();
    cfg.set("b", Value::Complex(Complex::new(3.0, 2.0))).unwrap();
    {
        let seq = cfg.get_path_mut("c").unwrap().as_seq_mut().unwrap();
        let nested = seq.get_mut(2).unwrap().as_map_mut().unwrap();
        nested.set("cool", std::f64::consts::PI).unwrap();
        seq.remove(1).unwrap();
    }

    cfg.finalize();
    let expected = format!(
        "_CFG_ID: {}\n\nb: 3+2j\n\na: 2+3j\n\nc:\n- 3\n- cool: 3.141592653589793\n\nd: null\n",
        cfg.identity().unwrap()
    );
    assert_eq!(cfg.to_string(), expected);
}

#[test]
fn test_finalize_unfinalize_keeps_canonical_text_stable() {
    let mut cfg = sample();
    cfg.finalize();
    let frozen_text = cfg.to_string();

    cfg.unfinalize();
    // identity is neither removed nor recomputed by unfinalize
    assert_eq!(cfg.to_string(), frozen_text);
}

#[test]
fn test_identity_is_shape_only() {
    let mut with_values = Config::from_pairs([
        ("a", Value::Int(3)),
        (
            "b",
            Value::Map(
                Config::from_pairs([("d", Value::Null), ("c", Value::Str("c".into()))]).unwrap(),
            ),
        ),
        ("c", Value::Str("c".into())),
    ])
    .unwrap();
    let mut other_values = Config::from_pairs([
        (
            "b",
            Value::Map(
                Config::from_pairs([("c", Value::Str("x".into())), ("d", Value::Int(9))]).unwrap(),
            ),
        ),
        ("a", Value::Str("hi".into())),
        ("c", Value::Float(3.14)),
    ])
    .unwrap();
    let mut extra_key = Config::from_pairs([
        ("a", Value::Int(3)),
        (
            "b",
            Value::Map(
                Config::from_pairs([
                    ("d", Value::Null),
                    ("c", Value::Str("c".into())),
                    ("e", Value::Null),
                ])
                .unwrap(),
            ),
        ),
        ("c", Value::Str("c".into())),
    ])
    .unwrap();

    with_values.finalize();
    other_values.finalize();
    extra_key.finalize();

    assert_eq!(with_values.identity(), other_values.identity());
    assert_ne!(with_values.identity(), extra_key.identity());
}

#[test]
fn test_chained_calls_return_the_receiver() {
    let mut cfg = sample();
    let id = cfg.finalize().unfinalize().refresh_identity().identity().map(str::to_owned);
    assert!(id.is_some());
    // still the same tree, not a copy
    assert_eq!(cfg.get("b"), Some(&Value::Int(3)));
}
