use jsonwire_core_rs::{
  from_json, to_json, ConfigOption, ConnectionContext, JsonBean, JsonCodec, JsonEnum, JsonSerializer, JsonType,
  SerializerError, TypeDescriptor, TypeRegistry,
};
use rstest::rstest;
use serde_json::json;
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, JsonBean)]
struct Person {
  name: String,
  age: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, JsonEnum)]
enum Alignment {
  #[json(rename = "LEFT")]
  Left,
  #[json(rename = "RIGHT")]
  Right,
}

#[derive(Debug, Clone, PartialEq, JsonBean)]
#[json(type_name = "com.example.Address")]
struct Address {
  street: String,
  #[json(rename = "zip")]
  postal_code: String,
}

#[derive(Debug, Clone, PartialEq, JsonBean)]
struct Contact {
  person: Person,
  address: Option<Address>,
  tags: Vec<String>,
  alignment: Alignment,
  #[json(skip)]
  cached_label: Option<String>,
}

#[derive(Debug, JsonBean)]
struct Team {
  lead: Arc<Person>,
  members: Vec<Arc<Person>>,
}

#[derive(Debug, Clone, PartialEq, JsonBean)]
struct Scores {
  by_name: BTreeMap<String, i64>,
  by_rank: BTreeMap<i32, String>,
}

#[derive(Debug, Clone, PartialEq, JsonBean)]
struct Node {
  label: String,
  children: Vec<Node>,
}

fn init_tracing() {
  env::set_var("RUST_LOG", "debug");
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

fn ann() -> Person {
  Person {
    name: "Ann".to_string(),
    age: 30,
  }
}

fn contact() -> Contact {
  Contact {
    person: ann(),
    address: Some(Address {
      street: "Main St 1".to_string(),
      postal_code: "20100".to_string(),
    }),
    tags: vec!["friend".to_string(), "work".to_string()],
    alignment: Alignment::Left,
    cached_label: None,
  }
}

fn chain(length: usize) -> Node {
  (0..length).fold(
    Node {
      label: "leaf".to_string(),
      children: vec![],
    },
    |child, depth| Node {
      label: format!("node-{}", depth),
      children: vec![child],
    },
  )
}

#[test]
fn test_person_example() {
  init_tracing();
  let mut ctx = ConnectionContext::new();

  let json = to_json(&ann(), &mut ctx).expect("serialize");
  assert_eq!(json.to_string(), r#"{"name":"Ann","age":30}"#);
  assert_eq!(from_json::<Person>(&json, &mut ctx).expect("deserialize"), ann());

  let err = from_json::<Person>(&json!({"name": "Ann"}), &mut ctx).expect_err("missing age");
  assert_eq!(err, SerializerError::malformed_payload("Person", "missing field `age`"));
}

#[test]
fn test_descriptor_of_another_type_is_unknown_type() {
  let mut ctx = ConnectionContext::new();
  let err = Person::json_serializer()
    .deserialize(
      &Address::type_descriptor(),
      &json!({"name": "Ann", "age": 30}),
      &mut ctx,
    )
    .expect_err("wrong descriptor");
  assert_eq!(err, SerializerError::unknown_type("Person", "com.example.Address"));
}

#[test]
fn test_payload_of_another_type_is_malformed() {
  let mut ctx = ConnectionContext::new();
  let address = to_json(&contact().address, &mut ctx).expect("serialize");
  let err = from_json::<Person>(&address, &mut ctx).expect_err("address is not a person");
  assert!(err.is_malformed_payload());
}

#[rstest]
#[case(json!({"name": "Ann", "age": "30"}))]
#[case(json!({"name": 7, "age": 30}))]
#[case(json!({"name": "Ann", "age": 30.5}))]
#[case(json!(["Ann", 30]))]
#[case(json!(null))]
fn test_wrong_shapes_are_malformed(#[case] payload: serde_json::Value) {
  let mut ctx = ConnectionContext::new();
  let err = from_json::<Person>(&payload, &mut ctx).expect_err("wrong shape");
  assert!(err.is_malformed_payload(), "{:?}", err);
}

#[test]
fn test_nested_bean_round_trip() {
  let mut ctx = ConnectionContext::new();
  let value = contact();

  let json = to_json(&value, &mut ctx).expect("serialize");
  assert_eq!(
    json,
    json!({
      "person": {"name": "Ann", "age": 30},
      "address": {"street": "Main St 1", "zip": "20100"},
      "tags": ["friend", "work"],
      "alignment": "LEFT"
    })
  );
  assert_eq!(from_json::<Contact>(&json, &mut ctx).expect("deserialize"), value);
}

#[test]
fn test_skipped_field_is_rebuilt_with_default() {
  let mut ctx = ConnectionContext::new();
  let mut value = contact();
  value.cached_label = Some("Ann (work)".to_string());

  let json = to_json(&value, &mut ctx).expect("serialize");
  assert!(json.get("cached_label").is_none());
  let decoded = from_json::<Contact>(&json, &mut ctx).expect("deserialize");
  assert_eq!(decoded.cached_label, None);
}

#[rstest]
#[case(json!({"person": {"name": "Ann", "age": 30}, "tags": [], "alignment": "RIGHT"}))]
#[case(json!({"person": {"name": "Ann", "age": 30}, "address": null, "tags": [], "alignment": "RIGHT"}))]
fn test_absent_optional_property(#[case] payload: serde_json::Value) {
  let mut ctx = ConnectionContext::new();
  let decoded = from_json::<Contact>(&payload, &mut ctx).expect("deserialize");
  assert_eq!(decoded.address, None);
  assert_eq!(decoded.alignment, Alignment::Right);
}

#[test]
fn test_absent_optional_property_when_disallowed() {
  let mut ctx = ConnectionContext::from_options([ConfigOption::with_allow_missing_optional(false)]);
  let payload = json!({"person": {"name": "Ann", "age": 30}, "tags": [], "alignment": "RIGHT"});
  let err = from_json::<Contact>(&payload, &mut ctx).expect_err("address required");
  assert_eq!(err, SerializerError::malformed_payload("Contact", "missing field `address`"));
}

#[test]
fn test_unknown_properties() {
  let payload = json!({"name": "Ann", "age": 30, "email": "ann@example.com"});

  let mut lenient = ConnectionContext::new();
  assert_eq!(from_json::<Person>(&payload, &mut lenient).expect("ignored"), ann());

  let mut strict = ConnectionContext::from_options([ConfigOption::with_reject_unknown_fields(true)]);
  let err = from_json::<Person>(&payload, &mut strict).expect_err("rejected");
  assert_eq!(err, SerializerError::malformed_payload("Person", "unknown field `email`"));
}

#[test]
fn test_unknown_enum_variant() {
  let mut ctx = ConnectionContext::new();
  let err = from_json::<Alignment>(&json!("CENTER"), &mut ctx).expect_err("unknown variant");
  assert!(err.is_malformed_payload());
  assert_eq!(<Alignment as jsonwire_core_rs::JsonEnum>::variant_names(), &["LEFT", "RIGHT"]);
}

#[test]
fn test_shared_values_decode_to_one_allocation() {
  let mut ctx = ConnectionContext::new();
  let lead = Arc::new(ann());
  let team = Team {
    lead: lead.clone(),
    members: vec![lead.clone(), Arc::new(Person {
      name: "Bob".to_string(),
      age: 41,
    })],
  };

  let json = to_json(&team, &mut ctx).expect("serialize");
  assert_eq!(
    json,
    json!({
      "lead": {"@id": 1, "value": {"name": "Ann", "age": 30}},
      "members": [{"@ref": 1}, {"@id": 2, "value": {"name": "Bob", "age": 41}}]
    })
  );

  let mut receiver = ConnectionContext::new();
  let decoded = from_json::<Team>(&json, &mut receiver).expect("deserialize");
  assert!(Arc::ptr_eq(&decoded.lead, &decoded.members[0]));
  assert!(!Arc::ptr_eq(&decoded.lead, &decoded.members[1]));
  assert_eq!(*decoded.lead, ann());
}

#[test]
fn test_unknown_reference_is_malformed() {
  let mut ctx = ConnectionContext::new();
  let payload = json!({"lead": {"@ref": 9}, "members": []});
  let err = from_json::<Team>(&payload, &mut ctx).expect_err("dangling reference");
  assert!(err.is_malformed_payload());
}

#[test]
fn test_independent_contexts_decode_to_equal_values() {
  let lead = Arc::new(ann());
  let team = Team {
    lead: lead.clone(),
    members: vec![lead],
  };

  let mut first = ConnectionContext::new();
  let mut second = ConnectionContext::new();
  first.identity_map_mut().register(&Arc::new(0_u8));
  let json_first = to_json(&team, &mut first).expect("first");
  let json_second = to_json(&team, &mut second).expect("second");
  assert_ne!(json_first, json_second);

  let decoded_first = from_json::<Team>(&json_first, &mut ConnectionContext::new()).expect("decode first");
  let decoded_second = from_json::<Team>(&json_second, &mut ConnectionContext::new()).expect("decode second");
  assert_eq!(*decoded_first.lead, *decoded_second.lead);
  assert_eq!(
    decoded_first.members.iter().map(|p| (**p).clone()).collect::<Vec<_>>(),
    decoded_second.members.iter().map(|p| (**p).clone()).collect::<Vec<_>>()
  );
}

#[test]
fn test_maps_by_key_type() {
  let mut ctx = ConnectionContext::new();
  let scores = Scores {
    by_name: BTreeMap::from([("ann".to_string(), 3), ("bob".to_string(), 5)]),
    by_rank: BTreeMap::from([(1, "bob".to_string()), (2, "ann".to_string())]),
  };

  let json = to_json(&scores, &mut ctx).expect("serialize");
  assert_eq!(
    json,
    json!({
      "by_name": {"ann": 3, "bob": 5},
      "by_rank": [[1, 2], ["bob", "ann"]]
    })
  );
  assert_eq!(from_json::<Scores>(&json, &mut ctx).expect("deserialize"), scores);
}

#[test]
fn test_recursive_bean_round_trip() {
  let mut ctx = ConnectionContext::new();
  let tree = chain(5);
  let json = to_json(&tree, &mut ctx).expect("serialize");
  assert_eq!(from_json::<Node>(&json, &mut ctx).expect("deserialize"), tree);
}

#[test]
fn test_depth_limit() {
  let tree = chain(10);
  let json = to_json(&tree, &mut ConnectionContext::new()).expect("within default depth");

  let mut shallow = ConnectionContext::from_options([ConfigOption::with_max_depth(8)]);
  let err = to_json(&tree, &mut shallow).expect_err("encode too deep");
  assert!(err.is_unsupported_value());
  let err = from_json::<Node>(&json, &mut shallow).expect_err("decode too deep");
  assert!(err.is_malformed_payload());
  assert_eq!(shallow.depth(), 0);
}

#[test]
fn test_derived_beans_through_registry() {
  init_tracing();
  let registry = TypeRegistry::with_defaults();
  registry.register_type::<Person>().expect("register Person");
  registry.register_type::<Contact>().expect("register Contact");
  assert_eq!(
    registry.register_type::<Person>(),
    Err(SerializerError::DuplicateEntry("Person".to_string()))
  );

  let codec = JsonCodec::new(registry);
  let mut ctx = ConnectionContext::new();
  let descriptor: TypeDescriptor = "Contact".parse().expect("descriptor");
  let json = codec.encode_value(&contact(), &descriptor, &mut ctx).expect("encode");
  let decoded = codec.decode(&descriptor, &json, &mut ctx).expect("decode");
  assert_eq!(decoded.downcast_ref::<Contact>(), Some(&contact()));

  let err = codec
    .decode_value::<Person>(&TypeDescriptor::of("Address"), &json!({}), &mut ctx)
    .expect_err("not registered");
  assert!(err.is_unknown_type());
}
