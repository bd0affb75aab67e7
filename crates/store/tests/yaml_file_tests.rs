use std::fs;

use typedconf_store::MemoryTree;
use typedconf_types::{ConfigTree, print_tree};

#[test]
fn loads_tree_named_after_file_stem() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("car.yaml");
    fs::write(&path, "'@name': Roadster\ndoors: 2\nengine:\n  power: 150\n").expect("write yaml");

    let tree = MemoryTree::from_yaml_file(&path).expect("load tree");
    assert_eq!(tree.root_name(), "car");
    assert_eq!(tree.scalar("engine.power").as_deref(), Some("150"));
    assert_eq!(
        print_tree(&tree),
        "Configuration root: car\n---\n  [[@name]] -> Roadster\n  [doors] -> 2\n  [engine.power] -> 150\n"
    );
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.yaml");
    let error = MemoryTree::from_yaml_file(&path).expect_err("file is missing");
    assert!(format!("{error:#}").contains("absent.yaml"));
}

#[test]
fn malformed_yaml_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "a: [unclosed\n").expect("write yaml");
    assert!(MemoryTree::from_yaml_file(&path).is_err());
}
