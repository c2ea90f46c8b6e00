//! Record encoder: header slots with tag-gap compression plus a data region
//! of length-prefixed bodies.

use crate::error::EncodeError;
use crate::schema::{Field, FieldKind, Schema, TypeDef};
use crate::value::Value;

use super::wire::*;
use super::MAX_DEPTH;

/// Encode a `Value::Struct` as a record of `ty`.
pub fn encode(schema: &Schema, ty: &TypeDef, value: &Value) -> Result<Vec<u8>, EncodeError> {
    encode_record(schema, ty, value, 0)
}

fn encode_record(
    schema: &Schema,
    ty: &TypeDef,
    value: &Value,
    depth: usize,
) -> Result<Vec<u8>, EncodeError> {
    if depth >= MAX_DEPTH {
        return Err(EncodeError::TooDeep(ty.name.clone()));
    }
    let fields = match value {
        Value::Struct(map) => map,
        _ => {
            return Err(EncodeError::TypeMismatch {
                field: ty.name.clone(),
                expected: "struct",
                actual: value.kind(),
            })
        }
    };

    let mut slots: Vec<u16> = Vec::with_capacity(ty.maxn);
    let mut data: Vec<u8> = Vec::new();
    let mut last_tag: i32 = -1;

    // Fields are stored sorted by tag, so one pass emits slots in tag order.
    for field in &ty.fields {
        let value = match fields.get(&field.name) {
            Some(v) => v,
            None => continue, // absent field: represented by the next tag gap
        };

        let slot = if field.is_array {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(field, "array", value))?;
            let body = encode_array(schema, field, items, depth)?;
            data.extend_from_slice(&body);
            0
        } else {
            match encode_field(schema, field, value, depth)? {
                Encoded::Inline(v) => v,
                Encoded::Body(body) => {
                    data.extend_from_slice(&body);
                    0
                }
            }
        };

        let gap = i32::from(field.tag) - last_tag - 1;
        if gap > 0 {
            let marker = (gap - 1) * 2 + 1;
            if marker > i32::from(u16::MAX) {
                return Err(EncodeError::TagGapOverflow {
                    field: field.name.clone(),
                });
            }
            slots.push(marker as u16);
        }
        slots.push(slot);
        last_tag = i32::from(field.tag);
    }

    if slots.len() > usize::from(u16::MAX) {
        return Err(EncodeError::HeaderOverflow(ty.name.clone()));
    }

    let mut out = Vec::with_capacity(SIZEOF_HEADER + slots.len() * SIZEOF_FIELD + data.len());
    put_u16(&mut out, slots.len() as u16);
    for slot in &slots {
        put_u16(&mut out, *slot);
    }
    out.extend_from_slice(&data);
    Ok(out)
}

enum Encoded {
    /// Small value carried in the header slot as `2*(v+1)`.
    Inline(u16),
    /// Length-prefixed body appended to the data region.
    Body(Vec<u8>),
}

fn encode_field(
    schema: &Schema,
    field: &Field,
    value: &Value,
    depth: usize,
) -> Result<Encoded, EncodeError> {
    match field.kind {
        FieldKind::Integer => Ok(encode_integer(integer_wire_value(field, value)?)),
        FieldKind::Boolean => {
            let b = value
                .as_boolean()
                .ok_or_else(|| mismatch(field, "boolean", value))?;
            Ok(Encoded::Inline((u16::from(b) + 1) * 2))
        }
        FieldKind::Double => {
            let d = double_value(field, value)?;
            let mut body = Vec::with_capacity(SIZEOF_LENGTH + SIZEOF_INT64);
            put_u32(&mut body, SIZEOF_INT64 as u32);
            put_u64(&mut body, d.to_bits());
            Ok(Encoded::Body(body))
        }
        FieldKind::String => {
            let s = value
                .as_str()
                .ok_or_else(|| mismatch(field, "string", value))?;
            Ok(Encoded::Body(length_prefixed(s.as_bytes())))
        }
        FieldKind::Binary => {
            let b = value
                .as_binary()
                .ok_or_else(|| mismatch(field, "binary", value))?;
            Ok(Encoded::Body(length_prefixed(b)))
        }
        FieldKind::Struct(idx) => {
            let nested = encode_record(schema, &schema.types[idx], value, depth + 1)?;
            Ok(Encoded::Body(length_prefixed(&nested)))
        }
    }
}

/// Wire value of an integer field: fixed-point fields scale a double by
/// `decimal` and round half away from zero; plain fields take the integer
/// as-is.
fn integer_wire_value(field: &Field, value: &Value) -> Result<i64, EncodeError> {
    if field.decimal > 0 {
        let d = match value {
            Value::Double(d) => *d,
            Value::Integer(i) => *i as f64,
            _ => return Err(mismatch(field, "double", value)),
        };
        let scaled = (d * f64::from(field.decimal)).round();
        if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
            return Err(EncodeError::IntegerOverflow {
                field: field.name.clone(),
            });
        }
        Ok(scaled as i64)
    } else {
        value
            .as_integer()
            .ok_or_else(|| mismatch(field, "integer", value))
    }
}

fn double_value(field: &Field, value: &Value) -> Result<f64, EncodeError> {
    match value {
        Value::Double(d) => Ok(*d),
        Value::Integer(i) => Ok(*i as f64),
        _ => Err(mismatch(field, "double", value)),
    }
}

fn encode_integer(v: i64) -> Encoded {
    if (0..=0x7FFE).contains(&v) {
        // small non-negative values ride in the header slot
        Encoded::Inline(((v + 1) * 2) as u16)
    } else if v as i32 as i64 == v {
        let mut body = Vec::with_capacity(SIZEOF_LENGTH + SIZEOF_INT32);
        put_u32(&mut body, SIZEOF_INT32 as u32);
        put_u32(&mut body, v as u32);
        Encoded::Body(body)
    } else {
        let mut body = Vec::with_capacity(SIZEOF_LENGTH + SIZEOF_INT64);
        put_u32(&mut body, SIZEOF_INT64 as u32);
        put_u64(&mut body, v as u64);
        Encoded::Body(body)
    }
}

fn encode_array(
    schema: &Schema,
    field: &Field,
    items: &[Value],
    depth: usize,
) -> Result<Vec<u8>, EncodeError> {
    if items.is_empty() {
        // zero length prefix, no width byte
        let mut body = Vec::with_capacity(SIZEOF_LENGTH);
        put_u32(&mut body, 0);
        return Ok(body);
    }
    match field.kind {
        FieldKind::Integer | FieldKind::Double => encode_packed_array(field, items),
        FieldKind::Boolean => encode_boolean_array(field, items),
        FieldKind::String | FieldKind::Binary | FieldKind::Struct(_) => {
            encode_object_array(schema, field, items, depth)
        }
    }
}

/// Integer/double array body: a width byte (4 or 8) then fixed-width
/// elements. Integer arrays start narrow and widen in place on the first
/// element that needs 8 bytes; double arrays are always wide.
fn encode_packed_array(field: &Field, items: &[Value]) -> Result<Vec<u8>, EncodeError> {
    let is_double = field.kind == FieldKind::Double;
    let mut wide = is_double;
    let mut body: Vec<u8> = vec![if wide { SIZEOF_INT64 } else { SIZEOF_INT32 } as u8];

    for item in items {
        let raw: u64 = if is_double {
            double_value(field, item)?.to_bits()
        } else {
            integer_wire_value(field, item)? as u64
        };

        if !wide && (raw as i64) as i32 as i64 != raw as i64 {
            body = widen_elements(&body);
            wide = true;
        }
        if wide {
            put_u64(&mut body, raw);
        } else {
            put_u32(&mut body, raw as u32);
        }
    }

    Ok(length_prefixed(&body))
}

/// Rewrite a narrow array body as a wide one, sign-extending each element.
fn widen_elements(body: &[u8]) -> Vec<u8> {
    let mut wide = Vec::with_capacity(1 + (body.len() - 1) * 2);
    wide.push(SIZEOF_INT64 as u8);
    for chunk in body[1..].chunks_exact(SIZEOF_INT32) {
        let v = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        put_u64(&mut wide, expand64(v));
    }
    wide
}

fn encode_boolean_array(field: &Field, items: &[Value]) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::with_capacity(items.len());
    for item in items {
        let b = item
            .as_boolean()
            .ok_or_else(|| mismatch(field, "boolean", item))?;
        body.push(u8::from(b));
    }
    Ok(length_prefixed(&body))
}

fn encode_object_array(
    schema: &Schema,
    field: &Field,
    items: &[Value],
    depth: usize,
) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::new();
    for item in items {
        match field.kind {
            FieldKind::String => {
                let s = item
                    .as_str()
                    .ok_or_else(|| mismatch(field, "string", item))?;
                body.extend_from_slice(&length_prefixed(s.as_bytes()));
            }
            FieldKind::Binary => {
                let b = item
                    .as_binary()
                    .ok_or_else(|| mismatch(field, "binary", item))?;
                body.extend_from_slice(&length_prefixed(b));
            }
            FieldKind::Struct(idx) => {
                let nested = encode_record(schema, &schema.types[idx], item, depth + 1)?;
                body.extend_from_slice(&length_prefixed(&nested));
            }
            _ => unreachable!("dispatched by caller"),
        }
    }
    Ok(length_prefixed(&body))
}

fn length_prefixed(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SIZEOF_LENGTH + content.len());
    put_u32(&mut out, content.len() as u32);
    out.extend_from_slice(content);
    out
}

fn mismatch(field: &Field, expected: &'static str, got: &Value) -> EncodeError {
    EncodeError::TypeMismatch {
        field: field.name.clone(),
        expected,
        actual: got.kind(),
    }
}
