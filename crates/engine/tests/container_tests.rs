use std::sync::Arc;

use proptest::prelude::*;
use typedconf_engine::{
    Annotation, ConfigError, ConfigMap, ConfigProxy, ConfigProxyFactory, EnumType, MemberSpec, ScalarKind, SchemaSpec,
    TypeDescriptor, Value,
};
use typedconf_store::MemoryTree;

fn int() -> TypeDescriptor {
    TypeDescriptor::scalar(ScalarKind::I32)
}

fn proxy_over(member: MemberSpec, tree: &MemoryTree) -> Result<ConfigProxy, ConfigError> {
    let schema = SchemaSpec::new("Holder").with_member(member).shared();
    ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle())
}

fn server_schema() -> Arc<SchemaSpec> {
    SchemaSpec::new("Server")
        .with_member(MemberSpec::new("getName", TypeDescriptor::string()).optional())
        .with_member(MemberSpec::new("getPort", int()).with_default_value("80"))
        .shared()
}

const SERVERS: &str = "
server:
  - name: alpha
    port: 1
  - name: beta
    port: 2
  - name: alpha
    port: 3
  - port: 4
";

#[test]
fn list_keeps_store_order_and_duplicates() {
    let tree = MemoryTree::from_yaml_str("test", "port: [3, 1, 3, 2]\n").expect("yaml");
    let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::list_of(int())).with_key("port"), &tree).expect("proxy");
    let ports = proxy.get_as::<Vec<Value>>("ports").expect("list");
    assert_eq!(ports, vec![Value::I32(3), Value::I32(1), Value::I32(3), Value::I32(2)]);
}

#[test]
fn set_drops_duplicates_in_first_seen_order() {
    let tree = MemoryTree::from_yaml_str("test", "port: [3, 1, 3, 2]\n").expect("yaml");
    let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::set_of(int())).with_key("port"), &tree).expect("proxy");
    let ports = proxy.get_as::<Vec<Value>>("ports").expect("set");
    assert_eq!(ports, vec![Value::I32(3), Value::I32(1), Value::I32(2)]);
}

#[test]
fn sorted_set_uses_natural_order() {
    let tree = MemoryTree::from_yaml_str("test", "tag: [pear, apple, pear, fig]\n").expect("yaml");
    let proxy = proxy_over(
        MemberSpec::new("tags", TypeDescriptor::sorted_set_of(TypeDescriptor::string())).with_key("tag"),
        &tree,
    )
    .expect("proxy");
    let tags = proxy.get("tags").expect("sorted set");
    assert!(matches!(tags, Value::SortedSet(_)));
    assert_eq!(tags.to_string(), "[apple, fig, pear]");
}

#[test]
fn absent_container_is_empty() {
    let tree = MemoryTree::new("test");
    let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::list_of(int())).with_key("port"), &tree).expect("proxy");
    assert_eq!(proxy.get_as::<Vec<Value>>("ports").expect("list"), Vec::<Value>::new());
}

#[test]
fn container_follows_store_changes() {
    let tree = MemoryTree::from_yaml_str("test", "port: [1]\n").expect("yaml");
    let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::list_of(int())).with_key("port"), &tree).expect("proxy");
    tree.add_property("port", "2").expect("add");
    assert_eq!(proxy.get_as::<Vec<Value>>("ports").expect("list"), vec![Value::I32(1), Value::I32(2)]);
}

#[test]
fn unconvertible_element_fails_the_whole_container() {
    let tree = MemoryTree::from_yaml_str("test", "port: [1, many]\n").expect("yaml");
    let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::list_of(int())).with_key("port"), &tree).expect("proxy");
    assert!(proxy.get("ports").is_err());
}

#[test]
fn enum_elements_are_supported() {
    let level = TypeDescriptor::enumeration(EnumType::new("Level", ["LOW", "HIGH"]));
    let tree = MemoryTree::from_yaml_str("test", "level: [HIGH, LOW]\n").expect("yaml");
    let proxy = proxy_over(MemberSpec::new("levels", TypeDescriptor::list_of(level)).with_key("level"), &tree).expect("proxy");
    assert_eq!(proxy.get("levels").expect("levels").to_string(), "[HIGH, LOW]");
}

#[test]
fn nested_list_binds_one_proxy_per_sub_tree() {
    let tree = MemoryTree::from_yaml_str("test", SERVERS).expect("yaml");
    let proxy = proxy_over(
        MemberSpec::new("servers", TypeDescriptor::list_of(TypeDescriptor::schema(server_schema()))).with_key("server"),
        &tree,
    )
    .expect("proxy");

    let servers = proxy.get_as::<Vec<Value>>("servers").expect("servers");
    assert_eq!(servers.len(), 4);
    let ports: Vec<i32> = servers
        .iter()
        .map(|server| server.as_proxy().expect("proxy element").get_as::<i32>("port").expect("port"))
        .collect();
    assert_eq!(ports, vec![1, 2, 3, 4]);
}

#[test]
fn containers_of_containers_are_schema_errors() {
    let member = MemberSpec::new("grid", TypeDescriptor::list_of(TypeDescriptor::list_of(int())));
    let error = proxy_over(member, &MemoryTree::new("test")).expect_err("nested containers");
    assert!(error.is_schema_error());
}

#[test]
fn unclaimed_element_types_fail_at_construction() {
    let member = MemberSpec::new("counters", TypeDescriptor::list_of(TypeDescriptor::custom("Counter")));
    let error = proxy_over(member, &MemoryTree::new("test")).expect_err("no factory for counters");
    assert!(matches!(error, ConfigError::RegistryLookup { .. }));
}

#[test]
fn map_over_raw_trees_is_a_schema_error() {
    let member = MemberSpec::new("nodes", TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::Tree))
        .with_key("node")
        .with_annotation(Annotation::map_key("name"));
    let tree = MemoryTree::from_yaml_str("test", "node:\n  - name: a\n").expect("yaml");
    let error = proxy_over(member, &tree).expect_err("tree elements");
    assert!(error.is_schema_error());
    assert!(matches!(error, ConfigError::InvalidSchema { .. }));
}

#[test]
fn list_of_raw_trees_yields_one_handle_per_node() {
    let tree = MemoryTree::from_yaml_str("test", "node:\n  - name: a\n  - name: b\n").expect("yaml");
    let proxy = proxy_over(MemberSpec::new("nodes", TypeDescriptor::list_of(TypeDescriptor::Tree)).with_key("node"), &tree).expect("proxy");
    let nodes = proxy.get_as::<Vec<Value>>("nodes").expect("nodes");
    let names: Vec<String> = nodes
        .iter()
        .map(|node| match node {
            Value::Tree(handle) => handle.scalar("name").expect("name"),
            other => panic!("expected a tree, found {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn broken_element_schema_fails_at_construction() {
    let broken = SchemaSpec::new("Broken")
        .with_member(MemberSpec::new("count", int()).with_default_value("many"))
        .shared();
    let member = MemberSpec::new("items", TypeDescriptor::list_of(TypeDescriptor::schema(broken)));
    let error = proxy_over(member, &MemoryTree::new("test")).expect_err("broken element");
    assert!(matches!(error, ConfigError::InvalidDefault { .. }));
}

fn servers_by_name(required: bool) -> MemberSpec {
    let annotation = if required {
        Annotation::map_key("name")
    } else {
        Annotation::optional_map_key("name")
    };
    MemberSpec::new(
        "servers",
        TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::schema(server_schema())),
    )
    .with_key("server")
    .with_annotation(annotation)
}

#[test]
fn map_keys_elements_by_property_and_keeps_first_duplicate() {
    let tree = MemoryTree::from_yaml_str("test", SERVERS).expect("yaml");
    let proxy = proxy_over(servers_by_name(true), &tree).expect("proxy");
    let servers = proxy.get_as::<ConfigMap>("servers").expect("map");

    assert_eq!(servers.len(), 2);
    let keys: Vec<String> = servers.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["alpha", "beta"]);

    let alpha = servers.get(&Value::from("alpha")).expect("present").expect("alpha");
    assert_eq!(alpha.as_proxy().expect("proxy").get_as::<i32>("port").expect("port"), 1);
}

#[test]
fn required_map_rejects_missing_keys() {
    let tree = MemoryTree::from_yaml_str("test", SERVERS).expect("yaml");
    let servers = proxy_over(servers_by_name(true), &tree)
        .expect("proxy")
        .get_as::<ConfigMap>("servers")
        .expect("map");
    assert!(servers.is_required());
    let error = servers.get(&Value::from("gamma")).expect_err("required map");
    assert!(matches!(error, ConfigError::RequiredMapKeyMissing { ref map_key, .. } if map_key == "gamma"));
}

#[test]
fn optional_map_answers_none_for_missing_keys() {
    let tree = MemoryTree::from_yaml_str("test", SERVERS).expect("yaml");
    let servers = proxy_over(servers_by_name(false), &tree)
        .expect("proxy")
        .get_as::<ConfigMap>("servers")
        .expect("map");
    assert!(!servers.is_required());
    assert!(servers.get(&Value::from("gamma")).expect("optional map").is_none());
}

#[test]
fn map_keys_are_converted_to_the_key_type() {
    let tree = MemoryTree::from_yaml_str("test", SERVERS).expect("yaml");
    let member = MemberSpec::new("servers", TypeDescriptor::map_of(int(), TypeDescriptor::schema(server_schema())))
        .with_key("server")
        .with_annotation(Annotation::map_key("port"));
    let servers = proxy_over(member, &tree).expect("proxy").get_as::<ConfigMap>("servers").expect("map");
    assert_eq!(servers.len(), 4);
    assert!(servers.contains_key(&Value::I32(3)));
}

#[test]
fn map_without_map_key_is_a_schema_error() {
    let member = MemberSpec::new(
        "servers",
        TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::schema(server_schema())),
    );
    let error = proxy_over(member, &MemoryTree::new("test")).expect_err("no map key");
    assert!(error.is_schema_error());
}

#[test]
fn map_key_must_name_an_element_property() {
    let member = MemberSpec::new(
        "servers",
        TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::schema(server_schema())),
    )
    .with_annotation(Annotation::map_key("region"));
    let error = proxy_over(member, &MemoryTree::new("test")).expect_err("unknown property");
    assert!(error.to_string().contains("region"));
}

#[test]
fn map_over_simple_elements_is_a_schema_error() {
    let member = MemberSpec::new("ports", TypeDescriptor::map_of(TypeDescriptor::string(), int())).with_annotation(Annotation::map_key("name"));
    let error = proxy_over(member, &MemoryTree::new("test")).expect_err("simple elements");
    assert!(error.is_schema_error());
}

fn tree_with_ports(ports: &[i32]) -> MemoryTree {
    let tree = MemoryTree::new("test");
    for port in ports {
        tree.add_property("port", port.to_string()).expect("add");
    }
    tree
}

proptest! {
    #[test]
    fn list_preserves_every_stored_value_in_order(ports in prop::collection::vec(-1000i32..1000, 0..24)) {
        let tree = tree_with_ports(&ports);
        let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::list_of(int())).with_key("port"), &tree).expect("proxy");
        let expected: Vec<Value> = ports.iter().copied().map(Value::I32).collect();
        prop_assert_eq!(proxy.get_as::<Vec<Value>>("ports").expect("list"), expected);
    }

    #[test]
    fn sorted_set_is_sorted_and_unique(ports in prop::collection::vec(-50i32..50, 0..24)) {
        let tree = tree_with_ports(&ports);
        let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::sorted_set_of(int())).with_key("port"), &tree).expect("proxy");
        let mut expected = ports.clone();
        expected.sort_unstable();
        expected.dedup();
        let expected: Vec<Value> = expected.into_iter().map(Value::I32).collect();
        prop_assert_eq!(proxy.get_as::<Vec<Value>>("ports").expect("sorted set"), expected);
    }

    #[test]
    fn set_keeps_first_occurrences(ports in prop::collection::vec(-20i32..20, 0..24)) {
        let tree = tree_with_ports(&ports);
        let proxy = proxy_over(MemberSpec::new("ports", TypeDescriptor::set_of(int())).with_key("port"), &tree).expect("proxy");
        let mut expected = Vec::new();
        for port in &ports {
            if !expected.contains(&Value::I32(*port)) {
                expected.push(Value::I32(*port));
            }
        }
        prop_assert_eq!(proxy.get_as::<Vec<Value>>("ports").expect("set"), expected);
    }
}
