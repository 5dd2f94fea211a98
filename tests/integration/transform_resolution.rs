//! Integration tests for declaration-driven transform execution.

use std::fs;
use strata::config::{Config, TRANSFORM_KEY};
use strata::error::ResolveError;
use strata::transform::register_transform;
use strata::value::Value;
use tempfile::TempDir;

const TRANSFORMED: &str = "\
nature:
  _TRANSFORM:
  - name: make_setlike_dict
    targets: [non_living]
  - name: remove_element
    target: living.animals
    key: 0
  - name: remove_element
    target: living.plants
    key: tree
  non_living:
  - rocks
  - water
  - air
  living:
    animals:
    - dog
    - cat
    plants:
      tree:
        branches:
          leaves: green
        trunk: brown
      appletree:
        _TRANSFORM:
        - name: make_keys_upper_case
        branches:
          leaves: green
          fruits: apples
        trunk: brown
      oaktree:
        _TRANSFORM:
        - name: MAKE_KEYS_UPPER_CASE
          recursive: false
        branches:
          leaves: green
        trunk: white
      algea: null
";

#[test]
fn test_transform_resolution_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("transformed.yml");
    fs::write(&path, TRANSFORMED).unwrap();

    let mut cfg = Config::load(&path).unwrap();
    cfg.finalize();

    let expected = format!(
        "_CFG_ID: {}

nature:
  non_living:
    rocks: null
    water: null
    air: null
  living:
    animals:
    - cat
    plants:
      appletree:
        BRANCHES:
          LEAVES: green
          FRUITS: apples
        TRUNK: brown
      oaktree:
        BRANCHES:
          leaves: green
        TRUNK: white
      algea: null
",
        cfg.identity().unwrap()
    );
    assert_eq!(cfg.to_string(), expected);
}

#[test]
fn test_env_resolution_through_declaration() {
    std::env::set_var("STRATA_TEST_TRANSFORM_HOME", "/x");
    let mut cfg = Config::from_pairs([
        (
            TRANSFORM_KEY,
            Value::from(vec![Value::Map(
                Config::from_pairs([("name", "resolve_env")]).unwrap(),
            )]),
        ),
        ("home", Value::Str("$STRATA_TEST_TRANSFORM_HOME".into())),
    ])
    .unwrap();

    cfg.resolve_transforms().unwrap();
    assert_eq!(cfg.get("home"), Some(&Value::Str("/x".into())));
    assert!(!cfg.contains(TRANSFORM_KEY));
}

#[test]
fn test_env_resolution_missing_variable_fails() {
    let mut cfg = Config::from_pairs([
        (
            TRANSFORM_KEY,
            Value::from(vec![Value::Map(
                Config::from_pairs([("name", "resolve_env")]).unwrap(),
            )]),
        ),
        ("home", Value::Str("$STRATA_TEST_TRANSFORM_UNDEFINED".into())),
    ])
    .unwrap();

    let err = cfg.resolve_transforms().unwrap_err();
    assert!(matches!(err, ResolveError::MissingEnvVar { name } if name == "STRATA_TEST_TRANSFORM_UNDEFINED"));
}

#[test]
fn test_copy_transform_through_declaration() {
    let mut cfg = Config::from_pairs([
        (
            "a",
            Value::Map(Config::from_pairs([("b", 3.14)]).unwrap()),
        ),
        (
            TRANSFORM_KEY,
            Value::from(vec![Value::Map(
                Config::from_pairs([
                    ("name", "copy"),
                    ("src", "a.b"),
                    ("dest", "c.d.e"),
                ])
                .unwrap(),
            )]),
        ),
    ])
    .unwrap();

    cfg.resolve_transforms().unwrap();
    assert_eq!(cfg.get_path("c.d.e"), Some(&Value::Float(3.14)));
}

#[test]
fn test_registering_a_taken_name_fails() {
    fn dummy(_cfg: &mut Config, _kwargs: &Config) -> Result<(), ResolveError> {
        Ok(())
    }

    let err = register_transform(dummy, "remove_element").unwrap_err();
    assert_eq!(
        err.to_string(),
        "can not register 'remove_element' as transform, as the name is already in use"
    );
}

#[test]
fn test_registered_transform_is_invocable_by_name() {
    fn double_num(cfg: &mut Config, _kwargs: &Config) -> Result<(), ResolveError> {
        let doubled = cfg.get("num").and_then(Value::as_int).unwrap_or(0) * 2;
        cfg.set("num", doubled)?;
        Ok(())
    }

    register_transform(double_num, "test_double_num").unwrap();

    let mut cfg = Config::from_pairs([
        ("num", Value::Int(21)),
        (
            TRANSFORM_KEY,
            Value::from(vec![Value::Map(
                Config::from_pairs([("name", "test_double_num")]).unwrap(),
            )]),
        ),
    ])
    .unwrap();

    cfg.resolve_transforms().unwrap();
    assert_eq!(cfg.get("num"), Some(&Value::Int(42)));
}
