//! Serde bridge: schema-driven conversion between native Rust records and
//! the wire format, by way of the dynamic [`Value`] variant.
//!
//! Field names in the Rust type must match field names in the schema; `None`
//! fields are omitted on the wire and absent wire fields surface as `None`.

mod de;
mod error;
mod ser;

pub use error::SerdeError;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::schema::{Schema, TypeDef};
use crate::value::Value;

/// Encode a native record as a wire record of `ty`.
pub fn to_bytes<T: Serialize>(
    schema: &Schema,
    ty: &TypeDef,
    value: &T,
) -> Result<Vec<u8>, SerdeError> {
    let tree = ser::ValueSerializer::serialize(value)?;
    Ok(codec::encode(schema, ty, &tree)?)
}

/// Decode a wire record of `ty` into a native record.
pub fn from_bytes<T: for<'de> Deserialize<'de>>(
    schema: &Schema,
    ty: &TypeDef,
    data: &[u8],
) -> Result<T, SerdeError> {
    let tree = codec::decode(schema, ty, data)?;
    de::ValueDeserializer::deserialize(&tree)
}

/// Lower a native record to a [`Value`] tree without encoding it.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, SerdeError> {
    ser::ValueSerializer::serialize(value)
}

/// Raise a [`Value`] tree into a native record.
pub fn from_value<T: for<'de> Deserialize<'de>>(value: &Value) -> Result<T, SerdeError> {
    de::ValueDeserializer::deserialize(value)
}
