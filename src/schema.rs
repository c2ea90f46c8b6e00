use std::collections::HashMap;

/// The wire kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Boolean,
    String,
    /// A string field flagged opaque: raw bytes, never UTF-8 decoded.
    Binary,
    Double,
    /// A nested record type; the payload is an index into `Schema::types`.
    Struct(usize),
}

/// A field descriptor inside a type.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Field tag, unique and strictly ascending within a type.
    pub tag: u16,
    pub kind: FieldKind,
    pub is_array: bool,
    /// Main-index tag for arrays of structs, -1 when none. Retained from the
    /// bundle; the codec treats such arrays as plain sequences.
    pub key_tag: i32,
    /// Fixed-point scale (10^k) for integer fields, 0 for plain integers.
    pub decimal: u32,
}

impl Field {
    pub fn new(name: &str, tag: u16, kind: FieldKind) -> Self {
        Field {
            name: name.to_string(),
            tag,
            kind,
            is_array: false,
            key_tag: -1,
            decimal: 0,
        }
    }

    /// Mark the field as an array of its base kind.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Give an integer field `digits` decimal digits of fixed-point scale.
    pub fn fixed(mut self, digits: u32) -> Self {
        self.decimal = 10u32.pow(digits);
        self
    }

    /// Record the main-index tag of a struct-array field.
    pub fn keyed(mut self, key_tag: u16) -> Self {
        self.key_tag = i32::from(key_tag);
        self
    }
}

/// A record type: fields sorted by tag.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub fields: Vec<Field>,
    /// First tag when the tag run is dense (direct indexing applies),
    /// -1 when sparse (binary search applies).
    pub base: i32,
    /// Effective slot count including tag-gap markers; bounds the header
    /// the encoder reserves.
    pub maxn: usize,
}

impl TypeDef {
    /// Build a type from fields, computing `base` and `maxn`. Fields are
    /// sorted by tag.
    pub fn new(name: &str, mut fields: Vec<Field>) -> Self {
        fields.sort_by_key(|f| f.tag);
        let (base, maxn) = layout(&fields);
        TypeDef {
            name: name.to_string(),
            fields,
            base,
            maxn,
        }
    }

    /// Field lookup by tag: direct index for dense tag runs, binary search
    /// otherwise.
    pub fn field_by_tag(&self, tag: u16) -> Option<&Field> {
        if self.base >= 0 {
            let idx = i32::from(tag) - self.base;
            if idx < 0 {
                return None;
            }
            self.fields.get(idx as usize)
        } else {
            self.fields
                .binary_search_by_key(&tag, |f| f.tag)
                .ok()
                .map(|i| &self.fields[i])
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn layout(fields: &[Field]) -> (i32, usize) {
    let n = fields.len();
    if n == 0 {
        return (-1, 0);
    }
    let mut maxn = n;
    let mut last: i32 = -1;
    for f in fields {
        let tag = i32::from(f.tag);
        if tag > last + 1 {
            maxn += 1;
        }
        last = tag;
    }
    let first = i32::from(fields[0].tag);
    let span = i32::from(fields[n - 1].tag) - first + 1;
    let base = if span as usize == n { first } else { -1 };
    (base, maxn)
}

/// An RPC protocol entry.
#[derive(Debug, Clone)]
pub struct Protocol {
    pub name: String,
    pub tag: u16,
    /// Request type index into `Schema::types`, if the protocol carries one.
    pub request: Option<usize>,
    /// Response type index, if the protocol carries one.
    pub response: Option<usize>,
    /// Response is an explicit empty acknowledgment.
    pub confirm: bool,
}

impl Protocol {
    /// Whether a sender of this protocol should expect a response packet.
    pub fn responded(&self) -> bool {
        self.response.is_some() || self.confirm
    }
}

/// The immutable type/protocol catalogue produced by the bundle loader.
///
/// All lookup indices are materialised at construction, so a `Schema` can be
/// shared freely across threads for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub types: Vec<TypeDef>,
    /// Sorted by tag ascending.
    pub protocols: Vec<Protocol>,
    types_by_name: HashMap<String, usize>,
    protocols_by_name: HashMap<String, usize>,
    protocols_by_tag: HashMap<u16, usize>,
}

impl Schema {
    /// Assemble a catalogue from already-validated types and protocols.
    /// Protocols are sorted by tag; the bundle loader validates ordering and
    /// index ranges before calling this.
    pub fn assemble(types: Vec<TypeDef>, mut protocols: Vec<Protocol>) -> Self {
        protocols.sort_by_key(|p| p.tag);
        let types_by_name = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        let protocols_by_name = protocols
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        let protocols_by_tag = protocols
            .iter()
            .enumerate()
            .map(|(i, p)| (p.tag, i))
            .collect();
        Schema {
            types,
            protocols,
            types_by_name,
            protocols_by_name,
            protocols_by_tag,
        }
    }

    pub fn type_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.types_by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn type_by_index(&self, index: usize) -> Option<&TypeDef> {
        self.types.get(index)
    }

    pub fn type_index(&self, name: &str) -> Option<usize> {
        self.types_by_name.get(name).copied()
    }

    pub fn protocol_by_name(&self, name: &str) -> Option<&Protocol> {
        self.protocols_by_name.get(name).map(|&i| &self.protocols[i])
    }

    pub fn protocol_by_tag(&self, tag: u16) -> Option<&Protocol> {
        self.protocols_by_tag.get(&tag).map(|&i| &self.protocols[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_field(name: &str, tag: u16) -> Field {
        Field::new(name, tag, FieldKind::Integer)
    }

    #[test]
    fn dense_tags_use_direct_indexing() {
        let ty = TypeDef::new(
            "T",
            vec![int_field("a", 2), int_field("b", 3), int_field("c", 4)],
        );
        assert_eq!(ty.base, 2);
        assert_eq!(ty.maxn, 4); // leading gap from tag 0 counts one marker
        assert_eq!(ty.field_by_tag(3).unwrap().name, "b");
        assert!(ty.field_by_tag(1).is_none());
        assert!(ty.field_by_tag(5).is_none());
    }

    #[test]
    fn sparse_tags_use_binary_search() {
        let ty = TypeDef::new("T", vec![int_field("a", 0), int_field("b", 5)]);
        assert_eq!(ty.base, -1);
        assert_eq!(ty.maxn, 3);
        assert_eq!(ty.field_by_tag(5).unwrap().name, "b");
        assert!(ty.field_by_tag(2).is_none());
    }

    #[test]
    fn empty_type_layout() {
        let ty = TypeDef::new("T", vec![]);
        assert_eq!(ty.base, -1);
        assert_eq!(ty.maxn, 0);
        assert!(ty.field_by_tag(0).is_none());
    }

    #[test]
    fn catalogue_lookups() {
        let schema = Schema::assemble(
            vec![TypeDef::new("Ping", vec![])],
            vec![Protocol {
                name: "ping".into(),
                tag: 10,
                request: None,
                response: Some(0),
                confirm: false,
            }],
        );
        assert!(schema.type_by_name("Ping").is_some());
        assert_eq!(schema.type_index("Ping"), Some(0));
        assert_eq!(schema.protocol_by_name("ping").unwrap().tag, 10);
        assert_eq!(schema.protocol_by_tag(10).unwrap().name, "ping");
        assert!(schema.protocol_by_tag(11).is_none());
    }
}
