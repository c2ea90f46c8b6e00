//! Hand-rolled wire-format builders used to produce schema bundles in tests,
//! independent of the crate's own encoder.
#![allow(dead_code)]

/// Builds one record: header slots with tag-gap markers plus a data region.
pub struct StructBuilder {
    slots: Vec<u16>,
    data: Vec<u8>,
    last_tag: i32,
}

impl StructBuilder {
    pub fn new() -> Self {
        StructBuilder {
            slots: Vec::new(),
            data: Vec::new(),
            last_tag: -1,
        }
    }

    fn advance(&mut self, tag: u16) {
        let gap = i32::from(tag) - self.last_tag - 1;
        if gap > 0 {
            self.slots.push(((gap - 1) * 2 + 1) as u16);
        }
        self.last_tag = i32::from(tag);
    }

    /// Small non-negative integer carried in the header slot.
    pub fn inline(mut self, tag: u16, v: u16) -> Self {
        self.advance(tag);
        self.slots.push((v + 1) * 2);
        self
    }

    /// Length-prefixed body in the data region.
    pub fn chunk(mut self, tag: u16, content: &[u8]) -> Self {
        self.advance(tag);
        self.slots.push(0);
        self.data
            .extend_from_slice(&(content.len() as u32).to_le_bytes());
        self.data.extend_from_slice(content);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.slots.len() as u16).to_le_bytes());
        for s in &self.slots {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out.extend_from_slice(&self.data);
        out
    }
}

/// Concatenate length-prefixed children, the wire form of an object array.
pub fn array_of(children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for c in children {
        out.extend_from_slice(&(c.len() as u32).to_le_bytes());
        out.extend_from_slice(c);
    }
    out
}

// Builtin type codes in the field meta-schema.
pub const CODE_INTEGER: u16 = 0;
pub const CODE_BOOLEAN: u16 = 1;
pub const CODE_STRING: u16 = 2;
pub const CODE_DOUBLE: u16 = 3;

/// One field descriptor record of the bundle meta-schema.
pub struct FieldSpec {
    pub name: &'static str,
    pub builtin: Option<u16>,
    pub aux: Option<u16>,
    pub tag: u16,
    pub array: bool,
    pub key: Option<u16>,
}

impl FieldSpec {
    pub fn builtin(name: &'static str, code: u16, tag: u16) -> Self {
        FieldSpec {
            name,
            builtin: Some(code),
            aux: None,
            tag,
            array: false,
            key: None,
        }
    }

    pub fn subtype(name: &'static str, index: u16, tag: u16) -> Self {
        FieldSpec {
            name,
            builtin: None,
            aux: Some(index),
            tag,
            array: false,
            key: None,
        }
    }

    /// Meta tag 2: decimal exponent for integers, binary marker for strings.
    pub fn aux(mut self, v: u16) -> Self {
        self.aux = Some(v);
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn key(mut self, k: u16) -> Self {
        self.key = Some(k);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut b = StructBuilder::new().chunk(0, self.name.as_bytes());
        if let Some(code) = self.builtin {
            b = b.inline(1, code);
        }
        if let Some(aux) = self.aux {
            b = b.inline(2, aux);
        }
        b = b.inline(3, self.tag);
        if self.array {
            b = b.inline(4, 1);
        }
        if let Some(k) = self.key {
            b = b.inline(5, k);
        }
        b.build()
    }
}

pub fn type_record(name: &str, fields: &[FieldSpec]) -> Vec<u8> {
    let mut b = StructBuilder::new().chunk(0, name.as_bytes());
    if !fields.is_empty() {
        let encoded: Vec<Vec<u8>> = fields.iter().map(FieldSpec::encode).collect();
        b = b.chunk(1, &array_of(&encoded));
    }
    b.build()
}

pub fn protocol_record(
    name: &str,
    tag: u16,
    request: Option<u16>,
    response: Option<u16>,
    confirm: bool,
) -> Vec<u8> {
    let mut b = StructBuilder::new()
        .chunk(0, name.as_bytes())
        .inline(1, tag);
    if let Some(r) = request {
        b = b.inline(2, r);
    }
    if let Some(r) = response {
        b = b.inline(3, r);
    }
    if confirm {
        b = b.inline(4, 1);
    }
    b.build()
}

/// Assemble a whole bundle: the outer group record wrapping the type array
/// and, optionally, the protocol array.
pub fn bundle(types: &[Vec<u8>], protocols: Option<&[Vec<u8>]>) -> Vec<u8> {
    let n: u16 = if protocols.is_some() { 2 } else { 1 };
    let mut out = Vec::new();
    out.extend_from_slice(&n.to_le_bytes());
    for _ in 0..n {
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    let ta = array_of(types);
    out.extend_from_slice(&(ta.len() as u32).to_le_bytes());
    out.extend_from_slice(&ta);
    if let Some(ps) = protocols {
        let pa = array_of(ps);
        out.extend_from_slice(&(pa.len() as u32).to_le_bytes());
        out.extend_from_slice(&pa);
    }
    out
}
