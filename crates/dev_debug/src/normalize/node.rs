use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Declared visibility of a structure field, reported alongside its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(value) => serializer.serialize_bool(*value),
            Scalar::Int(value) => serializer.serialize_i64(*value),
            Scalar::UInt(value) => serializer.serialize_u64(*value),
            Scalar::Float(value) => serializer.serialize_f64(*value),
            Scalar::Str(value) => serializer.serialize_str(value),
        }
    }
}

macro_rules! scalar_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Scalar {
                fn from(value: $source) -> Self {
                    Scalar::$variant(value as $target)
                }
            }
        )+
    };
}

scalar_from!(Int as i64: i8, i16, i32, i64, isize);
scalar_from!(UInt as u64: u8, u16, u32, u64, usize);
scalar_from!(Float as f64: f32, f64);

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub visibility: Visibility,
    pub value: NormalizedNode,
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("visibility", &self.visibility)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("value", &self.value)?;
        map.end()
    }
}

/// A keyed structure with identity, as reported to the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredObject {
    pub type_name: String,
    pub identity: u64,
    pub fields: Vec<Field>,
}

impl StructuredObject {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Leaves standing in for values that were not expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// The object is already being expanded further up the current path.
    Circular { type_name: String, identity: u64 },
    /// The configured maximum depth was exceeded.
    DepthLimit,
    /// The value could not be read.
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedNode {
    Scalar(Scalar),
    Sequence(Vec<NormalizedNode>),
    Map(Vec<(String, NormalizedNode)>),
    Object(StructuredObject),
    Marker(Marker),
}

impl NormalizedNode {
    pub fn null() -> Self {
        NormalizedNode::Scalar(Scalar::Null)
    }

    pub fn as_object(&self) -> Option<&StructuredObject> {
        match self {
            NormalizedNode::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[NormalizedNode]> {
        match self {
            NormalizedNode::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Scalar> for NormalizedNode {
    fn from(value: Scalar) -> Self {
        NormalizedNode::Scalar(value)
    }
}

macro_rules! node_from_scalar {
    ($($source:ty),+) => {
        $(
            impl From<$source> for NormalizedNode {
                fn from(value: $source) -> Self {
                    NormalizedNode::Scalar(Scalar::from(value))
                }
            }
        )+
    };
}

node_from_scalar!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, &str, String
);

impl Serialize for NormalizedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NormalizedNode::Scalar(scalar) => scalar.serialize(serializer),
            NormalizedNode::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            NormalizedNode::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            NormalizedNode::Object(object) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("__type", "object")?;
                map.serialize_entry("__class", &object.type_name)?;
                map.serialize_entry("__id", &object.identity)?;
                map.serialize_entry("properties", &object.fields)?;
                map.end()
            }
            NormalizedNode::Marker(Marker::Circular {
                type_name,
                identity,
            }) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("__type", "circular")?;
                map.serialize_entry("__class", type_name)?;
                map.serialize_entry("__id", identity)?;
                map.end()
            }
            NormalizedNode::Marker(Marker::DepthLimit) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("__type", "depth_limit")?;
                map.end()
            }
            NormalizedNode::Marker(Marker::Error { message }) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("__type", "error")?;
                map.serialize_entry("message", message)?;
                map.end()
            }
        }
    }
}
