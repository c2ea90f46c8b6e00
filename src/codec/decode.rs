//! Record decoder: walks header slots with a running tag, pulling bodies
//! from the data region as value slots are seen.
//!
//! Unknown tags are skipped after their data-region bytes are consumed, so
//! records encoded under a newer schema still decode (forward compatibility).

use std::collections::HashMap;

use crate::error::DecodeError;
use crate::schema::{Field, FieldKind, Schema, TypeDef};
use crate::value::Value;

use super::wire::*;
use super::MAX_DEPTH;

/// Decode a record of `ty`. Trailing bytes after the record are permitted;
/// records are delimited by their container.
pub fn decode(schema: &Schema, ty: &TypeDef, data: &[u8]) -> Result<Value, DecodeError> {
    decode_record(schema, ty, data, 0).map(|(value, _)| value)
}

/// Decode a record and also return the number of bytes it occupied. The RPC
/// host uses this to split an envelope off a concatenated packet.
pub fn decode_prefix(
    schema: &Schema,
    ty: &TypeDef,
    data: &[u8],
) -> Result<(Value, usize), DecodeError> {
    decode_record(schema, ty, data, 0)
}

fn decode_record(
    schema: &Schema,
    ty: &TypeDef,
    data: &[u8],
    depth: usize,
) -> Result<(Value, usize), DecodeError> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::TooDeep);
    }

    let mut r = Reader::new(data);
    let slot_count = r.u16()? as usize;
    let mut slots = Vec::with_capacity(slot_count);
    for _ in 0..slot_count {
        slots.push(r.u16()?);
    }

    let mut fields: HashMap<String, Value> = HashMap::new();
    // i64: runs of gap markers can push the tag far past the u16 range, and
    // anything out there is simply unknown
    let mut tag: i64 = -1;

    for slot in slots {
        tag += 1;
        if slot & 1 != 0 {
            // odd slot: advance over a run of absent tags
            tag += i64::from(slot) / 2;
            continue;
        }

        let inline = i32::from(slot) / 2 - 1;
        let field = u16::try_from(tag).ok().and_then(|t| ty.field_by_tag(t));
        if inline < 0 {
            // the value lives in the data region; consume it even when the
            // tag is unknown so later fields stay aligned
            let body = r.chunk()?;
            let field = match field {
                Some(f) => f,
                None => continue,
            };
            let value = if field.is_array {
                decode_array(schema, field, body, depth)?
            } else {
                decode_body(schema, field, body, depth)?
            };
            fields.insert(field.name.clone(), value);
        } else {
            let field = match field {
                Some(f) => f,
                None => continue,
            };
            let value = decode_inline(field, inline as u64)?;
            fields.insert(field.name.clone(), value);
        }
    }

    Ok((Value::Struct(fields), r.offset()))
}

fn decode_inline(field: &Field, raw: u64) -> Result<Value, DecodeError> {
    match field.kind {
        FieldKind::Integer => Ok(scaled_integer(field, raw as i64)),
        FieldKind::Boolean => Ok(Value::Boolean(raw != 0)),
        _ => Err(DecodeError::Malformed(format!(
            "field '{}' of kind {} cannot carry an inline value",
            field.name,
            kind_name(field)
        ))),
    }
}

fn decode_body(
    schema: &Schema,
    field: &Field,
    body: &[u8],
    depth: usize,
) -> Result<Value, DecodeError> {
    match field.kind {
        FieldKind::Integer => {
            let raw = read_integer_body(field, body)?;
            Ok(scaled_integer(field, raw))
        }
        FieldKind::Double => {
            if body.len() != SIZEOF_INT64 {
                return Err(DecodeError::Malformed(format!(
                    "double field '{}' has a {}-byte body, expected 8",
                    field.name,
                    body.len()
                )));
            }
            let mut r = Reader::new(body);
            Ok(Value::Double(f64::from_bits(r.u64()?)))
        }
        FieldKind::Boolean => Err(DecodeError::Malformed(format!(
            "boolean field '{}' in data region",
            field.name
        ))),
        FieldKind::String => {
            let s = String::from_utf8(body.to_vec()).map_err(|source| DecodeError::Utf8 {
                field: field.name.clone(),
                source,
            })?;
            Ok(Value::Str(s))
        }
        FieldKind::Binary => Ok(Value::Binary(body.to_vec())),
        FieldKind::Struct(idx) => {
            let (value, _) = decode_record(schema, &schema.types[idx], body, depth + 1)?;
            Ok(value)
        }
    }
}

fn read_integer_body(field: &Field, body: &[u8]) -> Result<i64, DecodeError> {
    let mut r = Reader::new(body);
    match body.len() {
        SIZEOF_INT32 => Ok(expand64(r.u32()?) as i64),
        SIZEOF_INT64 => Ok(r.u64()? as i64),
        n => Err(DecodeError::Malformed(format!(
            "integer field '{}' has invalid body size {}",
            field.name, n
        ))),
    }
}

/// Fixed-point fields surface as doubles: raw wire value divided by the
/// declared scale.
fn scaled_integer(field: &Field, raw: i64) -> Value {
    if field.decimal > 0 {
        Value::Double(raw as f64 / f64::from(field.decimal))
    } else {
        Value::Integer(raw)
    }
}

fn decode_array(
    schema: &Schema,
    field: &Field,
    body: &[u8],
    depth: usize,
) -> Result<Value, DecodeError> {
    if body.is_empty() {
        // present-but-empty, distinct from an absent field
        return Ok(Value::Array(Vec::new()));
    }
    match field.kind {
        FieldKind::Integer | FieldKind::Double => decode_packed_array(field, body),
        FieldKind::Boolean => Ok(Value::Array(
            body.iter().map(|&b| Value::Boolean(b != 0)).collect(),
        )),
        FieldKind::String | FieldKind::Binary | FieldKind::Struct(_) => {
            decode_object_array(schema, field, body, depth)
        }
    }
}

fn decode_packed_array(field: &Field, body: &[u8]) -> Result<Value, DecodeError> {
    let width = body[0] as usize;
    let elements = &body[1..];
    let is_double = field.kind == FieldKind::Double;

    if width != SIZEOF_INT32 && width != SIZEOF_INT64 {
        return Err(DecodeError::Malformed(format!(
            "array field '{}' has invalid element width {}",
            field.name, width
        )));
    }
    if is_double && width != SIZEOF_INT64 {
        return Err(DecodeError::Malformed(format!(
            "double array field '{}' has element width {}, expected 8",
            field.name, width
        )));
    }
    if elements.len() % width != 0 {
        return Err(DecodeError::Malformed(format!(
            "array field '{}' body of {} bytes is not a multiple of width {}",
            field.name,
            elements.len(),
            width
        )));
    }

    let mut items = Vec::with_capacity(elements.len() / width);
    let mut r = Reader::new(elements);
    while !r.is_empty() {
        let raw = if width == SIZEOF_INT32 {
            expand64(r.u32()?)
        } else {
            r.u64()?
        };
        items.push(if is_double {
            Value::Double(f64::from_bits(raw))
        } else {
            scaled_integer(field, raw as i64)
        });
    }
    Ok(Value::Array(items))
}

fn decode_object_array(
    schema: &Schema,
    field: &Field,
    body: &[u8],
    depth: usize,
) -> Result<Value, DecodeError> {
    let mut items = Vec::new();
    let mut r = Reader::new(body);
    while !r.is_empty() {
        let element = r.chunk()?;
        let value = match field.kind {
            FieldKind::String => {
                let s =
                    String::from_utf8(element.to_vec()).map_err(|source| DecodeError::Utf8 {
                        field: field.name.clone(),
                        source,
                    })?;
                Value::Str(s)
            }
            FieldKind::Binary => Value::Binary(element.to_vec()),
            FieldKind::Struct(idx) => {
                let (value, _) = decode_record(schema, &schema.types[idx], element, depth + 1)?;
                value
            }
            _ => unreachable!("dispatched by caller"),
        };
        items.push(value);
    }
    Ok(Value::Array(items))
}

fn kind_name(field: &Field) -> &'static str {
    match field.kind {
        FieldKind::Integer => "integer",
        FieldKind::Boolean => "boolean",
        FieldKind::String => "string",
        FieldKind::Binary => "binary",
        FieldKind::Double => "double",
        FieldKind::Struct(_) => "struct",
    }
}
