//! Integration tests for fragment inheritance over loaded files.

use std::fs;
use strata::config::Config;
use strata::error::ResolveError;
use strata::value::Value;
use tempfile::TempDir;

const FRAGMENTS: &str = "\
plants:
  tree:
    branches:
      leaves: green
    trunk: brown
  appletree:
    _BASE: [plants.tree]
    branches:
      fruits: apples
  oaktree:
    _BASE: [plants.tree]
    trunk: white

with_apples:
  branches:
    fruits: apples

pets:
- dog
- cat

nature:
  non_living:
  - rocks
  - water
  - air
  living:
    animals:
    - dog
    - cat
    plants:
      _BASE: [plants]
      algea: null
";

fn write_fragments(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("fragments.yml");
    fs::write(&path, FRAGMENTS).unwrap();
    path
}

#[test]
fn test_base_resolution_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut cfg = Config::load(write_fragments(&dir)).unwrap();
    cfg.finalize();

    let expected = format!(
        "_CFG_ID: {}

plants:
  tree:
    branches:
      leaves: green
    trunk: brown
  appletree:
    branches:
      leaves: green
      fruits: apples
    trunk: brown
  oaktree:
    branches:
      leaves: green
    trunk: white

with_apples:
  branches:
    fruits: apples

pets:
- dog
- cat

nature:
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
        branches:
          leaves: green
          fruits: apples
        trunk: brown
      oaktree:
        branches:
          leaves: green
        trunk: white
      algea: null
",
        cfg.identity().unwrap()
    );
    assert_eq!(cfg.to_string(), expected);
}

#[test]
fn test_fragment_equals_manual_merge() {
    // a fragment with bases [A, B] and own keys equals rupdate over the
    // resolved bases in order, own content last
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fragments.yml");
    fs::write(
        &path,
        "\
a:
  x: 1
  shared: from_a
b:
  shared: from_b
  y: 2
c:
  _BASE: [a, b]
  own: 3
",
    )
    .unwrap();

    let cfg = Config::load(&path).unwrap();

    let mut manual = Config::new();
    manual
        .rupdate(cfg.get("a").unwrap().as_map().unwrap().clone())
        .unwrap();
    manual
        .rupdate(cfg.get("b").unwrap().as_map().unwrap().clone())
        .unwrap();
    manual
        .rupdate(Config::from_pairs([("own", 3)]).unwrap())
        .unwrap();

    assert_eq!(cfg.get("c").unwrap().as_map().unwrap(), &manual);
    // later bases win over earlier ones
    assert_eq!(
        cfg.get_path("c.shared"),
        Some(&Value::Str("from_b".into()))
    );
}

#[test]
fn test_undeclared_base_fails_loading() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fragments.yml");
    fs::write(&path, "a:\n  _BASE: [ghost]\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownFragment { name } if name == "ghost"));
}

#[test]
fn test_base_cycle_fails_loading() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fragments.yml");
    fs::write(&path, "a:\n  _BASE: [b]\nb:\n  _BASE: [a]\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ResolveError::CyclicBases { .. }));
}
