//! Bundle loader: parses a precompiled, self-describing binary schema bundle
//! into a [`Schema`] catalogue.
//!
//! A bundle is one record of the meta-schema below, encoded in the same wire
//! format this crate decodes:
//!
//! ```text
//! .field {
//!     name 0 : string
//!     buildin 1 : integer   # 0 integer, 1 boolean, 2 string, 3 double
//!     type 2 : integer      # subtype index; for integer: decimal exponent;
//!                           # for string: non-zero marks opaque binary
//!     tag 3 : integer
//!     array 4 : boolean
//!     key 5 : integer       # main-index tag for struct arrays
//! }
//! .type     { name 0 : string, fields 1 : *field }
//! .protocol { name 0 : string, tag 1, request 2, response 3, confirm 4 }
//! .group    { type 0 : *type, protocol 1 : *protocol }
//! ```
//!
//! Validation is strict: unknown meta tags, non-monotonic tag sequences, and
//! dangling type indices are all rejected.

use crate::codec::wire::Reader;
use crate::error::SchemaError;
use crate::schema::{Field, FieldKind, Protocol, Schema, TypeDef};

/// Parse a bundle into a catalogue.
pub fn load(data: &[u8]) -> Result<Schema, SchemaError> {
    let mut r = Reader::new(data);
    let outer = r.u16()? as usize;
    if outer == 0 || outer > 2 {
        return Err(SchemaError::Malformed(format!(
            "bundle group has {} fields, expected 1 or 2",
            outer
        )));
    }
    for _ in 0..outer {
        if r.u16()? != 0 {
            return Err(SchemaError::Malformed(
                "bundle group fields must live in the data region".into(),
            ));
        }
    }

    let mut raw_types = Vec::new();
    for child in children(r.chunk()?)? {
        raw_types.push(parse_type(child)?);
    }

    let mut raw_protocols = Vec::new();
    if outer == 2 {
        for child in children(r.chunk()?)? {
            raw_protocols.push(parse_protocol(child)?);
        }
    }

    build(raw_types, raw_protocols)
}

// --- raw meta records ---

struct RawField {
    name: String,
    builtin: Option<u16>,
    /// Meta tag 2: subtype index, decimal exponent, or binary marker,
    /// depending on `builtin`.
    aux: Option<u16>,
    tag: u16,
    array: bool,
    key: Option<u16>,
}

struct RawType {
    name: String,
    fields: Vec<RawField>,
}

struct RawProtocol {
    name: String,
    tag: u16,
    request: Option<u16>,
    response: Option<u16>,
    confirm: bool,
}

// --- generic struct walk ---

struct RawEntry<'a> {
    tag: u16,
    inline: Option<u16>,
    body: &'a [u8],
}

impl<'a> RawEntry<'a> {
    fn inline_value(&self, context: &'static str) -> Result<u16, SchemaError> {
        self.inline.ok_or_else(|| {
            SchemaError::Malformed(format!(
                "meta tag {} in {} descriptor must be an inline value",
                self.tag, context
            ))
        })
    }

    fn name_value(&self, context: &'static str) -> Result<String, SchemaError> {
        if self.inline.is_some() {
            return Err(SchemaError::Malformed(format!(
                "name in {} descriptor must be a string body",
                context
            )));
        }
        Ok(String::from_utf8(self.body.to_vec())?)
    }
}

fn walk_struct(data: &[u8]) -> Result<Vec<RawEntry<'_>>, SchemaError> {
    let mut r = Reader::new(data);
    let slot_count = r.u16()? as usize;
    let mut slots = Vec::with_capacity(slot_count);
    for _ in 0..slot_count {
        slots.push(r.u16()?);
    }

    let mut entries = Vec::new();
    let mut tag: i64 = -1;
    for slot in slots {
        tag += 1;
        if slot & 1 != 0 {
            tag += i64::from(slot) / 2;
            continue;
        }
        let tag = u16::try_from(tag)
            .map_err(|_| SchemaError::Malformed("meta tag out of range".into()))?;
        let inline = i32::from(slot) / 2 - 1;
        if inline < 0 {
            let body = r.chunk()?;
            entries.push(RawEntry {
                tag,
                inline: None,
                body,
            });
        } else {
            entries.push(RawEntry {
                tag,
                inline: Some(inline as u16),
                body: &[],
            });
        }
    }
    Ok(entries)
}

fn children(data: &[u8]) -> Result<Vec<&[u8]>, SchemaError> {
    let mut r = Reader::new(data);
    let mut out = Vec::new();
    while !r.is_empty() {
        out.push(r.chunk()?);
    }
    Ok(out)
}

// --- per-record parsers ---

fn parse_type(data: &[u8]) -> Result<RawType, SchemaError> {
    let mut name = String::new();
    let mut fields = Vec::new();
    for entry in walk_struct(data)? {
        match entry.tag {
            0 => name = entry.name_value("type")?,
            1 => {
                for child in children(entry.body)? {
                    fields.push(parse_field(child)?);
                }
            }
            tag => {
                return Err(SchemaError::UnknownMetaTag {
                    context: "type",
                    tag,
                })
            }
        }
    }
    Ok(RawType { name, fields })
}

fn parse_field(data: &[u8]) -> Result<RawField, SchemaError> {
    let mut field = RawField {
        name: String::new(),
        builtin: None,
        aux: None,
        tag: 0,
        array: false,
        key: None,
    };
    for entry in walk_struct(data)? {
        match entry.tag {
            0 => field.name = entry.name_value("field")?,
            1 => field.builtin = Some(entry.inline_value("field")?),
            2 => field.aux = Some(entry.inline_value("field")?),
            3 => field.tag = entry.inline_value("field")?,
            4 => field.array = entry.inline_value("field")? != 0,
            5 => field.key = Some(entry.inline_value("field")?),
            tag => {
                return Err(SchemaError::UnknownMetaTag {
                    context: "field",
                    tag,
                })
            }
        }
    }
    Ok(field)
}

fn parse_protocol(data: &[u8]) -> Result<RawProtocol, SchemaError> {
    let mut proto = RawProtocol {
        name: String::new(),
        tag: 0,
        request: None,
        response: None,
        confirm: false,
    };
    for entry in walk_struct(data)? {
        match entry.tag {
            0 => proto.name = entry.name_value("protocol")?,
            1 => proto.tag = entry.inline_value("protocol")?,
            2 => proto.request = Some(entry.inline_value("protocol")?),
            3 => proto.response = Some(entry.inline_value("protocol")?),
            4 => proto.confirm = entry.inline_value("protocol")? != 0,
            tag => {
                return Err(SchemaError::UnknownMetaTag {
                    context: "protocol",
                    tag,
                })
            }
        }
    }
    Ok(proto)
}

// --- catalogue assembly ---

fn build(raw_types: Vec<RawType>, raw_protocols: Vec<RawProtocol>) -> Result<Schema, SchemaError> {
    let type_count = raw_types.len();

    let mut types = Vec::with_capacity(type_count);
    for rt in &raw_types {
        let mut fields = Vec::with_capacity(rt.fields.len());
        let mut last: i32 = -1;
        for rf in &rt.fields {
            if i32::from(rf.tag) <= last {
                return Err(SchemaError::NonMonotonicTags {
                    type_name: rt.name.clone(),
                });
            }
            last = i32::from(rf.tag);

            let (kind, decimal) = resolve_kind(rf, type_count)?;
            let mut field = Field::new(&rf.name, rf.tag, kind);
            field.is_array = rf.array;
            field.key_tag = rf.key.map(i32::from).unwrap_or(-1);
            field.decimal = decimal;
            fields.push(field);
        }
        types.push(TypeDef::new(&rt.name, fields));
    }

    let mut protocols = Vec::with_capacity(raw_protocols.len());
    let mut last: i32 = -1;
    for rp in raw_protocols {
        if i32::from(rp.tag) <= last {
            return Err(SchemaError::NonMonotonicProtocols { name: rp.name });
        }
        last = i32::from(rp.tag);

        let request = checked_type_index(rp.request, type_count)?;
        let response = checked_type_index(rp.response, type_count)?;
        protocols.push(Protocol {
            name: rp.name,
            tag: rp.tag,
            request,
            response,
            confirm: rp.confirm,
        });
    }

    Ok(Schema::assemble(types, protocols))
}

fn resolve_kind(rf: &RawField, type_count: usize) -> Result<(FieldKind, u32), SchemaError> {
    if let Some(code) = rf.builtin {
        let kind = match code {
            0 => FieldKind::Integer,
            1 => FieldKind::Boolean,
            2 => {
                if rf.aux.unwrap_or(0) != 0 {
                    FieldKind::Binary
                } else {
                    FieldKind::String
                }
            }
            3 => FieldKind::Double,
            other => return Err(SchemaError::InvalidTypeCode(other)),
        };
        let decimal = match (code, rf.aux) {
            (0, Some(exp)) => 10u32.checked_pow(u32::from(exp)).ok_or_else(|| {
                SchemaError::Malformed(format!(
                    "decimal exponent {} too large for field '{}'",
                    exp, rf.name
                ))
            })?,
            _ => 0,
        };
        Ok((kind, decimal))
    } else if let Some(idx) = rf.aux {
        let idx = usize::from(idx);
        if idx >= type_count {
            return Err(SchemaError::TypeIndexOutOfRange {
                index: idx,
                count: type_count,
            });
        }
        Ok((FieldKind::Struct(idx), 0))
    } else {
        Err(SchemaError::MissingFieldType(rf.name.clone()))
    }
}

fn checked_type_index(idx: Option<u16>, type_count: usize) -> Result<Option<usize>, SchemaError> {
    match idx {
        // one-past-the-end indices are dangling references like any other
        Some(i) if usize::from(i) >= type_count => Err(SchemaError::TypeIndexOutOfRange {
            index: usize::from(i),
            count: type_count,
        }),
        Some(i) => Ok(Some(usize::from(i))),
        None => Ok(None),
    }
}
