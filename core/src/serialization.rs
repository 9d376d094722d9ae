pub mod any_serializer;
pub mod bean;
pub mod codec;
mod collection_serializers;
mod config;
mod config_option;
pub mod connection_context;
pub mod connector;
pub mod enum_serializer;
pub mod error;
pub mod identity_map;
pub mod invocation;
pub mod json_kind;
pub mod json_serializer;
mod primitive_serializers;
pub mod registry;
pub mod serde_serializer;
pub mod shared_serializer;
pub mod type_descriptor;

pub use self::{
  any_serializer::*, bean::*, codec::*, collection_serializers::*, config::*, config_option::*, connection_context::*,
  connector::*, enum_serializer::*, error::*, identity_map::*, invocation::*, json_kind::*, json_serializer::*,
  primitive_serializers::*, registry::*, serde_serializer::*, shared_serializer::*, type_descriptor::*,
};
