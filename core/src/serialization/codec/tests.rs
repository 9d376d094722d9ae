use super::*;
use crate::serialization::{ConfigOption, ConnectorRef, JsonType, SerdeJsonSerializer};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
  name: String,
  age: i32,
}

fn init_tracing() {
  env::set_var("RUST_LOG", "trace");
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

fn person_descriptor() -> TypeDescriptor {
  TypeDescriptor::of("person")
}

fn codec() -> JsonCodec {
  let registry = TypeRegistry::with_defaults();
  registry
    .register::<Person>(Arc::new(SerdeJsonSerializer::<Person>::new(person_descriptor())))
    .expect("register person");
  registry.register_type::<Vec<String>>().expect("register list<string>");
  registry.register_type::<Arc<String>>().expect("register shared<string>");
  JsonCodec::new(registry)
}

#[test]
fn test_person_round_trip() {
  init_tracing();
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let ann = Person {
    name: "Ann".to_string(),
    age: 30,
  };

  let json = codec.encode_value(&ann, &person_descriptor(), &mut ctx).expect("encode");
  assert_eq!(codec.to_wire(&json), r#"{"name":"Ann","age":30}"#);

  let decoded: Person = codec
    .decode_value(&person_descriptor(), &json, &mut ctx)
    .expect("decode");
  assert_eq!(decoded, ann);

  let err = codec
    .decode_value::<Person>(&person_descriptor(), &json!({"name": "Ann"}), &mut ctx)
    .expect_err("missing age");
  assert!(err.is_malformed_payload());
}

#[test]
fn test_erased_round_trip() {
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let descriptor = Vec::<String>::type_descriptor();
  let value = vec!["a".to_string(), "b".to_string()];

  let json = codec.encode(&value, &descriptor, &mut ctx).expect("encode");
  assert_eq!(json, json!(["a", "b"]));
  let decoded = codec.decode(&descriptor, &json, &mut ctx).expect("decode");
  assert_eq!(decoded.downcast_ref::<Vec<String>>(), Some(&value));
}

#[test]
fn test_unregistered_descriptor() {
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let err = codec
    .decode(&TypeDescriptor::of("animal"), &json!({}), &mut ctx)
    .expect_err("unregistered");
  assert!(err.is_unknown_type());
}

#[test]
fn test_wrong_rust_type_for_descriptor() {
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let err = codec
    .encode_value(&5_i64, &person_descriptor(), &mut ctx)
    .expect_err("i64 is not a person");
  assert!(err.is_unknown_type());
}

#[rstest]
#[case("{\"name\":")]
#[case("")]
#[case("[1, 2")]
fn test_from_wire_rejects_invalid_text(#[case] text: &str) {
  let err = codec().from_wire(text).expect_err("invalid json");
  assert!(err.is_malformed_payload());
}

#[test]
fn test_wire_round_trip_keeps_member_order() {
  let codec = codec();
  let text = r#"{"z":1,"a":2}"#;
  let json = codec.from_wire(text).expect("parse");
  assert_eq!(codec.to_wire(&json), text);
}

#[derive(Debug)]
struct Button {
  id: String,
}

impl crate::serialization::Connector for Button {
  fn connector_id(&self) -> &str {
    &self.id
  }

  fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
    self
  }
}

#[test]
fn test_invocation_round_trip() {
  init_tracing();
  let codec = codec();
  let mut ctx = ConnectionContext::from_options([ConfigOption::with_session_id("session-1")]);
  let target = ConnectorRef::from_connector(Button { id: "12".to_string() });
  ctx.connector_map_mut().register(target.clone());

  let clicks = 2_i32;
  let caption = "OK".to_string();
  let invocation = codec
    .encode_invocation(
      "12",
      "ButtonServerRpc",
      "click",
      &[
        (i32::type_descriptor(), &clicks as &(dyn Any + Send + Sync)),
        (String::type_descriptor(), &caption as &(dyn Any + Send + Sync)),
        (ConnectorRef::type_descriptor(), &target as &(dyn Any + Send + Sync)),
      ],
      &mut ctx,
    )
    .expect("encode");
  let wire = codec.to_wire(&invocation.to_json());
  assert_eq!(wire, r#"["12","ButtonServerRpc","click",[2,"OK","12"]]"#);

  let received = MethodInvocation::from_json(&codec.from_wire(&wire).expect("parse")).expect("invocation");
  let parameters = codec
    .decode_parameters(
      &received,
      &[
        i32::type_descriptor(),
        String::type_descriptor(),
        ConnectorRef::type_descriptor(),
      ],
      &mut ctx,
    )
    .expect("decode");
  assert_eq!(parameters[0].downcast_ref::<i32>(), Some(&2));
  assert_eq!(parameters[1].downcast_ref::<String>(), Some(&caption));
  assert_eq!(parameters[2].downcast_ref::<ConnectorRef>(), Some(&target));
}

#[test]
fn test_invocation_is_one_identity_scope() {
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let shared = Arc::new("caption".to_string());
  let descriptor = Arc::<String>::type_descriptor();

  for _ in 0..2 {
    let invocation = codec
      .encode_invocation(
        "12",
        "ButtonServerRpc",
        "rename",
        &[
          (descriptor.clone(), &shared as &(dyn Any + Send + Sync)),
          (descriptor.clone(), &shared as &(dyn Any + Send + Sync)),
        ],
        &mut ctx,
      )
      .expect("encode");
    assert_eq!(
      invocation.parameters,
      vec![json!({"@id": 1, "value": "caption"}), json!({"@ref": 1})]
    );
    assert!(ctx.identity_map().is_empty());
    assert_eq!(Arc::strong_count(&shared), 1);

    let parameters = codec
      .decode_parameters(&invocation, &[descriptor.clone(), descriptor.clone()], &mut ctx)
      .expect("decode");
    assert!(ctx.identity_map().is_empty());
    let first = parameters[0].downcast_ref::<Arc<String>>().expect("first");
    let second = parameters[1].downcast_ref::<Arc<String>>().expect("second");
    assert!(Arc::ptr_eq(first, second));
    assert_eq!(Arc::strong_count(first), 2);
  }
}

#[test]
fn test_failed_invocation_releases_identities() {
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let shared = Arc::new("caption".to_string());
  let err = codec
    .encode_invocation(
      "12",
      "ButtonServerRpc",
      "rename",
      &[
        (Arc::<String>::type_descriptor(), &shared as &(dyn Any + Send + Sync)),
        (person_descriptor(), &shared as &(dyn Any + Send + Sync)),
      ],
      &mut ctx,
    )
    .expect_err("second parameter is not a person");
  assert!(err.is_unsupported_value());
  assert!(ctx.identity_map().is_empty());
  assert_eq!(Arc::strong_count(&shared), 1);
}

#[test]
fn test_decode_parameters_checks_arity() {
  let codec = codec();
  let mut ctx = ConnectionContext::new();
  let invocation = MethodInvocation::new("12", "ButtonServerRpc", "click", vec![json!(1)]);
  let err = codec
    .decode_parameters(
      &invocation,
      &[i32::type_descriptor(), String::type_descriptor()],
      &mut ctx,
    )
    .expect_err("arity");
  assert_eq!(
    err,
    SerializerError::malformed_payload("ButtonServerRpc.click", "expected 2 parameters, found 1")
  );
}

#[test]
fn test_default_codec_uses_global_registry() {
  let codec = JsonCodec::default();
  assert!(codec.registry().contains(&TypeDescriptor::of("boolean")));
}
