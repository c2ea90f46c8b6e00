//! Runtime codec for the sproto binary wire format.
//!
//! This crate speaks the wire side of the sproto protocol family: it loads
//! precompiled binary schema bundles, encodes and decodes tag-sparse records
//! against them, compresses frames with the 0-pack scheme, and multiplexes
//! RPC requests and responses by session id. Compiling `.sproto` source text
//! into a bundle is a separate tool's job.
//!
//! # Quick start
//!
//! ```
//! use sproto_wire::schema::{Field, FieldKind, Schema, TypeDef};
//! use sproto_wire::{codec, Value};
//!
//! let person = TypeDef::new("Person", vec![
//!     Field::new("name", 0, FieldKind::String),
//!     Field::new("age", 1, FieldKind::Integer),
//! ]);
//! let schema = Schema::assemble(vec![person], vec![]);
//!
//! let ty = schema.type_by_name("Person").unwrap();
//! let value = Value::record([("name", "Alice".into()), ("age", 30i64.into())]);
//! let bytes = codec::encode(&schema, ty, &value).unwrap();
//! assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
//! ```
//!
//! Schemas usually come from a bundle instead of being built by hand:
//! [`bundle::load`] parses one into the same [`Schema`] catalogue.

pub mod bundle;
pub mod codec;
pub mod error;
pub mod pack;
pub mod rpc;
pub mod schema;
pub mod value;

#[cfg(feature = "serde")]
pub mod serde;

pub use error::Error;
pub use schema::Schema;
pub use value::Value;
