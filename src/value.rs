use std::collections::HashMap;
use std::fmt;

/// Dynamic value for the sproto wire format.
///
/// A record is encoded from and decoded into this variant; applications
/// convert between `Value` and their own types by hand or through the
/// optional serde bridge.
#[derive(Clone, Debug)]
pub enum Value {
    /// Signed 64-bit integer (also carries scaled fixed-point wire values).
    Integer(i64),
    /// Boolean.
    Boolean(bool),
    /// UTF-8 string.
    Str(String),
    /// Opaque bytes (a string field flagged binary in the schema).
    Binary(Vec<u8>),
    /// IEEE 754 binary64.
    Double(f64),
    /// A record: named fields, absent keys mean absent fields.
    Struct(HashMap<String, Value>),
    /// Homogeneous ordered sequence.
    Array(Vec<Value>),
}

impl Value {
    /// An empty record.
    pub fn empty_struct() -> Self {
        Value::Struct(HashMap::new())
    }

    /// Build a record from `(name, value)` pairs.
    pub fn record<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        Value::Struct(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Look up a field on a record; `None` for non-structs or absent fields.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Struct(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Str(_) => "string",
            Value::Binary(_) => "binary",
            Value::Double(_) => "double",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            // bit equality so NaN round-trips compare equal
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::Double(v) => write!(f, "{}", v),
            Value::Struct(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Struct(v)
    }
}

macro_rules! from_vec {
    ($($elem:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$elem>> for Value {
                fn from(v: Vec<$elem>) -> Self {
                    Value::Array(v.into_iter().map(Value::$variant).collect())
                }
            }
        )*
    };
}

from_vec! {
    i64 => Integer,
    f64 => Double,
    bool => Boolean,
    String => Str,
}

impl TryFrom<Value> for i64 {
    type Error = &'static str;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        v.as_integer().ok_or("expected integer")
    }
}

impl TryFrom<Value> for bool {
    type Error = &'static str;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Boolean(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            _ => Err("expected boolean"),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = &'static str;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Double(d) => Ok(d),
            Value::Integer(i) => Ok(i as f64),
            _ => Err("expected double"),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = &'static str;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Str(s) => Ok(s),
            _ => Err("expected string"),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = &'static str;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Binary(b) => Ok(b),
            _ => Err("expected binary"),
        }
    }
}

macro_rules! try_from_vec {
    ($($elem:ty),* $(,)?) => {
        $(
            impl TryFrom<Value> for Vec<$elem> {
                type Error = &'static str;
                fn try_from(v: Value) -> Result<Self, Self::Error> {
                    match v {
                        Value::Array(items) => {
                            items.into_iter().map(<$elem>::try_from).collect()
                        }
                        _ => Err("expected array"),
                    }
                }
            }
        )*
    };
}

try_from_vec!(i64, f64, bool, String);
