use std::sync::Arc;

use typedconf_engine::{
    Annotation, BindingOption, CacheEverythingForever, CacheNothing, ConfigError, ConfigProxyFactory, ConstraintDescriptor,
    DelimitedKeyCombination, EnumType, MemberSpec, ScalarKind, SchemaSpec, TypeDescriptor, Value, Violation,
};
use typedconf_store::MemoryTree;

fn int() -> TypeDescriptor {
    TypeDescriptor::scalar(ScalarKind::I32)
}

fn tree(yaml: &str) -> MemoryTree {
    MemoryTree::from_yaml_str("test", yaml).expect("valid yaml")
}

fn single(member: MemberSpec) -> Arc<SchemaSpec> {
    SchemaSpec::new("Single").with_member(member).shared()
}

#[test]
fn simple_values_are_converted_and_stable() {
    let tree = tree("port: 8080\nname: api\n");
    let schema = SchemaSpec::new("Server")
        .with_member(MemberSpec::new("port", int()))
        .with_member(MemberSpec::new("name", TypeDescriptor::string()))
        .shared();
    let proxy = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle()).expect("proxy");

    for _ in 0..3 {
        assert_eq!(proxy.get("port").expect("port"), Value::I32(8080));
        assert_eq!(proxy.get_as::<String>("name").expect("name"), "api");
    }
}

#[test]
fn simple_values_stay_live() {
    let tree = tree("port: 8080\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("port", int())), &tree.handle())
        .expect("proxy");
    tree.set_property("port", "9090").expect("update");
    assert_eq!(proxy.get_as::<i32>("port").expect("port"), 9090);
}

#[test]
fn required_member_without_value_fails_with_dump() {
    let tree = tree("other: 1\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("port", int())), &tree.handle())
        .expect("proxy");

    let error = proxy.get("port").expect_err("port is required");
    match error {
        ConfigError::RequiredKeyMissing { key, dump } => {
            assert_eq!(key, "port");
            assert!(dump.starts_with("Configuration root: test\n"));
            assert!(dump.contains("[other] -> 1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn optional_member_without_value_is_null() {
    let tree = tree("other: 1\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("port", int()).optional()), &tree.handle())
        .expect("proxy");
    assert_eq!(proxy.get("port").expect("port"), Value::Null);
    assert_eq!(proxy.get_opt::<i32>("port").expect("port"), None);
}

#[test]
fn primitive_members_are_implicitly_required() {
    let tree = tree("other: 1\n");
    let member = MemberSpec::new("port", TypeDescriptor::primitive(ScalarKind::I32)).optional();
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(member), &tree.handle())
        .expect("proxy");
    assert!(proxy.get("port").expect_err("primitive").is_missing_key());
}

#[test]
fn check_exists_ignores_the_value() {
    let tree = tree("present: ~\nfalse-flag: 'false'\nsection:\n  inner: 1\n");
    let flag = |key: &str| {
        MemberSpec::new(key, TypeDescriptor::scalar(ScalarKind::Bool))
            .with_key(key)
            .with_options([BindingOption::CheckKeyExists])
    };
    let schema = SchemaSpec::new("Flags")
        .with_member(flag("present"))
        .with_member(flag("false-flag"))
        .with_member(flag("section"))
        .with_member(flag("absent"))
        .shared();
    let proxy = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle()).expect("proxy");

    assert_eq!(proxy.get("present").expect("present"), Value::Bool(true));
    assert_eq!(proxy.get("false-flag").expect("false-flag"), Value::Bool(true));
    assert_eq!(proxy.get("section").expect("section"), Value::Bool(true));
    assert_eq!(proxy.get("absent").expect("absent"), Value::Bool(false));
}

#[test]
fn check_exists_on_non_boolean_is_a_schema_error() {
    let member = MemberSpec::new("port", int()).with_options([BindingOption::CheckKeyExists]);
    let error = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(member), &tree("").handle())
        .expect_err("not a bool");
    assert!(error.is_schema_error());
}

#[test]
fn check_exists_cannot_take_a_default() {
    let member = MemberSpec::new("flag", TypeDescriptor::scalar(ScalarKind::Bool))
        .with_options([BindingOption::CheckKeyExists])
        .with_default_value("true");
    let error = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(member), &tree("").handle())
        .expect_err("no default on key-exists");
    assert!(matches!(error, ConfigError::InvalidDefault { .. }));
}

#[test]
fn default_literal_applies_only_when_absent() {
    let tree = tree("");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("doors", int()).with_default_value("4")), &tree.handle())
        .expect("proxy");
    assert_eq!(proxy.get("doors").expect("default"), Value::I32(4));

    tree.set_property("doors", "2").expect("set");
    assert_eq!(proxy.get("doors").expect("stored"), Value::I32(2));
}

#[test]
fn bad_default_fails_at_construction_not_at_resolve() {
    let error = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("doors", int()).with_default_value("four")), &tree("doors: 2\n").handle())
        .expect_err("bad default");
    assert!(matches!(error, ConfigError::InvalidDefault { ref raw, .. } if raw == "four"));
    assert!(error.is_schema_error());
}

#[test]
fn default_literal_on_nested_member_is_rejected() {
    let address = SchemaSpec::new("Address").with_member(MemberSpec::new("city", TypeDescriptor::string()));
    let member = MemberSpec::new("address", TypeDescriptor::schema(address.shared())).with_default_value("x");
    let error = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(member), &tree("").handle())
        .expect_err("nested default");
    assert!(error.is_schema_error());
}

#[test]
fn default_lookup_reads_an_alternate_key_under_the_base_key() {
    let tree = tree("server:\n  fallback-port: 7000\n");
    let schema = SchemaSpec::new("Server")
        .with_base_key("server")
        .with_member(MemberSpec::new("port", int()).with_default_lookup("fallback-port"))
        .shared();
    let proxy = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle()).expect("proxy");
    assert_eq!(proxy.get("port").expect("fallback"), Value::I32(7000));

    tree.set_property("server.port", "7001").expect("set");
    assert_eq!(proxy.get("port").expect("own"), Value::I32(7001));
}

#[test]
fn conversion_failures_name_key_and_target() {
    let tree = tree("port: lots\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("port", int())), &tree.handle())
        .expect("proxy");
    let error = proxy.get("port").expect_err("not a number");
    assert!(matches!(error, ConfigError::Conversion { ref key, ref raw, .. } if key == "port" && raw == "lots"));
}

#[test]
fn blank_numbers_are_conversion_errors_not_missing_keys() {
    let tree = tree("port: ''\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("port", int())), &tree.handle())
        .expect("proxy");
    let error = proxy.get("port").expect_err("blank is not a number");
    assert!(matches!(error, ConfigError::Conversion { ref key, ref raw, .. } if key == "port" && raw.is_empty()));
}

#[test]
fn blank_default_literal_is_ignored() {
    let tree = tree("");
    let member = MemberSpec::new("port", int()).optional().with_default_value("  ");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(member), &tree.handle())
        .expect("blank default is not a schema error");
    assert_eq!(proxy.get("port").expect("no default"), Value::Null);
}

#[test]
fn enums_accept_declared_labels_only() {
    let colors = TypeDescriptor::enumeration(EnumType::new("Color", ["RED", "BLUE"]));
    let tree = tree("color: BLUE\nblank: ''\n");
    let schema = SchemaSpec::new("Paint")
        .with_member(MemberSpec::new("color", colors.clone()))
        .with_member(MemberSpec::new("blank", colors.clone()).optional())
        .shared();
    let proxy = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle()).expect("proxy");
    assert_eq!(proxy.get("color").expect("color"), Value::Enum("BLUE".into()));
    assert_eq!(proxy.get("blank").expect("blank"), Value::Null);

    tree.set_property("color", "PINK").expect("set");
    assert!(matches!(proxy.get("color"), Err(ConfigError::Conversion { .. })));
}

#[test]
fn property_accessors_bind_to_their_property_key() {
    let tree = tree("doorCount: 5\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(MemberSpec::new("getDoorCount", int())), &tree.handle())
        .expect("proxy");
    assert_eq!(proxy.get("getDoorCount").expect("by member"), Value::I32(5));
    assert_eq!(proxy.get("doorCount").expect("by property"), Value::I32(5));
    assert!(matches!(proxy.get("windows"), Err(ConfigError::UnknownMember { .. })));
}

#[test]
fn members_with_parameters_cannot_be_bound() {
    let member = MemberSpec::new("compute", int()).with_parameter_count(2);
    let error = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&single(member), &tree("").handle())
        .expect_err("parameters");
    assert!(error.to_string().contains("takes 2 parameters"));
}

#[test]
fn explicit_delimiter_strategy_combines_base_keys() {
    let tree = MemoryTree::with_delimiter("root", "/");
    tree.set_property("server/port", "1").expect("set");
    let schema = SchemaSpec::new("Server")
        .with_base_key("server")
        .with_member(MemberSpec::new("port", int()))
        .shared();

    let smart = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle()).expect("smart");
    assert_eq!(smart.get("port").expect("smart picks '/'"), Value::I32(1));

    let dotted = ConfigProxyFactory::builder()
        .key_strategy(DelimitedKeyCombination::dot())
        .build()
        .make_proxy(&schema, &tree.handle())
        .expect("dotted");
    assert!(dotted.get("port").is_err());
}

fn lookup_schema() -> Arc<SchemaSpec> {
    SchemaSpec::new("Routing")
        .with_member(
            MemberSpec::new("target", int())
                .with_key("active")
                .with_options([BindingOption::LookupResult]),
        )
        .shared()
}

#[test]
fn lookup_resolves_the_named_key_and_follows_retargeting() {
    let tree = tree("active: primary\nprimary: 1\nsecondary: 2\n");
    let proxy = ConfigProxyFactory::builder()
        .build()
        .make_proxy(&lookup_schema(), &tree.handle())
        .expect("proxy");

    assert_eq!(proxy.get("target").expect("primary"), Value::I32(1));
    tree.set_property("primary", "10").expect("set");
    assert_eq!(proxy.get("target").expect("same target, live value"), Value::I32(10));

    tree.set_property("active", "secondary").expect("retarget");
    assert_eq!(proxy.get("target").expect("secondary"), Value::I32(2));

    tree.set_property("active", "  ").expect("blank");
    assert_eq!(proxy.get("target").expect("blank target"), Value::Null);
}

#[test]
fn lookup_combined_with_required_or_default_is_rejected() {
    let required = MemberSpec::new("target", int()).with_options([BindingOption::LookupResult, BindingOption::Required]);
    let defaulted = MemberSpec::new("target", int())
        .with_options([BindingOption::LookupResult])
        .with_default_value("1");
    let primitive = MemberSpec::new("target", TypeDescriptor::primitive(ScalarKind::I32)).with_options([BindingOption::LookupResult]);

    let factory = ConfigProxyFactory::builder().build();
    for member in [required, defaulted, primitive] {
        let error = factory.make_proxy(&single(member), &tree("").handle()).expect_err("rejected");
        assert!(error.is_schema_error(), "{error}");
    }
}

#[test]
fn validation_runs_only_with_a_validator() {
    let max_five = ConstraintDescriptor::new("max").with_attribute("value", "5");
    let schema = single(MemberSpec::new("getDoors", int()).with_annotation(Annotation::constraint(max_five)));
    let tree = tree("doors: 9\n");

    let unchecked = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle()).expect("proxy");
    assert_eq!(unchecked.get("doors").expect("no validation by default"), Value::I32(9));

    let validator = |type_name: &str, property: &str, constraints: &[ConstraintDescriptor], value: &Value| {
        assert_eq!((type_name, property), ("Single", "doors"));
        let mut violations = Vec::new();
        for constraint in constraints {
            let limit: i32 = constraint.attribute("value").and_then(|text| text.parse().ok()).unwrap_or(i32::MAX);
            if i32::try_from(value.clone()).is_ok_and(|doors| doors > limit) {
                violations.push(Violation::new(&constraint.name, format!("must be at most {limit}")));
            }
        }
        violations
    };
    let checked = ConfigProxyFactory::builder()
        .validator(validator)
        .build()
        .make_proxy(&schema, &tree.handle())
        .expect("proxy");
    match checked.get("doors").expect_err("too many doors") {
        ConfigError::ConstraintViolation {
            property, value, violations, ..
        } => {
            assert_eq!(property, "doors");
            assert_eq!(value, "9");
            assert_eq!(violations, vec!["max: must be at most 5".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    tree.set_property("doors", "3").expect("set");
    assert_eq!(checked.get("doors").expect("valid"), Value::I32(3));
}

#[test]
fn constraints_on_non_properties_are_schema_errors_when_validating() {
    let schema = single(
        MemberSpec::new("doors", int()).with_annotation(Annotation::constraint(ConstraintDescriptor::new("not_null"))),
    );
    let error = ConfigProxyFactory::builder()
        .validator(|_: &str, _: &str, _: &[ConstraintDescriptor], _: &Value| Vec::new())
        .build()
        .make_proxy(&schema, &tree("doors: 1\n").handle())
        .expect_err("not a property");
    assert!(error.is_schema_error());
}

#[test]
fn cache_everything_forever_ignores_mutations() {
    let tree = tree("port: 1\n");
    let proxy = ConfigProxyFactory::builder()
        .cache_strategy(CacheEverythingForever)
        .build()
        .make_proxy(&single(MemberSpec::new("port", int())), &tree.handle())
        .expect("proxy");
    assert_eq!(proxy.get("port").expect("first"), Value::I32(1));
    tree.set_property("port", "2").expect("set");
    assert_eq!(proxy.get("port").expect("cached"), Value::I32(1));
}

#[test]
fn cache_nothing_rebuilds_nested_proxies() {
    let address = SchemaSpec::new("Address").with_member(MemberSpec::new("city", TypeDescriptor::string()));
    let schema = single(MemberSpec::new("address", TypeDescriptor::schema(address.shared())));
    let tree = tree("address:\n  city: Oslo\n");
    let proxy = ConfigProxyFactory::builder()
        .cache_strategy(CacheNothing)
        .build()
        .make_proxy(&schema, &tree.handle())
        .expect("proxy");

    let first = proxy.get_as::<typedconf_engine::ConfigProxy>("address").expect("first");
    let second = proxy.get_as::<typedconf_engine::ConfigProxy>("address").expect("second");
    assert!(first.equals(&second).expect("comparable"));
    assert_eq!(second.get_as::<String>("city").expect("city"), "Oslo");
}
