//! Custom serde Serializer that records any `Serialize` value as a [`Node`]
//! tree, keeping integer widths, field order and struct names.
//!
//! Nothing is rejected here except map keys that are not strings. `None`
//! becomes [`Node::Absent`] and shapes no setting can hold (bytes, unit,
//! enum variants with data) become [`Node::Unsupported`], so the converter can
//! report them with the group and field they belong to.

use serde::ser::{self, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Seq(Vec<Node>),
    Map(Vec<(String, Node)>),
    Struct {
        name: &'static str,
        fields: Vec<(String, Node)>,
    },
    Absent,
    Unsupported(&'static str),
}

pub(crate) fn capture<T: Serialize + ?Sized>(value: &T) -> Result<Node, CaptureError> {
    value.serialize(NodeSerializer)
}

#[derive(Debug)]
pub(crate) struct CaptureError(String);

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CaptureError {}

impl ser::Error for CaptureError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CaptureError(msg.to_string())
    }
}

struct NodeSerializer;

impl ser::Serializer for NodeSerializer {
    type Ok = Node;
    type Error = CaptureError;
    type SerializeSeq = SeqCapture;
    type SerializeTuple = SeqCapture;
    type SerializeTupleStruct = SeqCapture;
    type SerializeTupleVariant = SeqCapture;
    type SerializeMap = MapCapture;
    type SerializeStruct = StructCapture;
    type SerializeStructVariant = StructCapture;

    fn serialize_bool(self, v: bool) -> Result<Node, CaptureError> {
        Ok(Node::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Node, CaptureError> {
        Ok(Node::I8(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Node, CaptureError> {
        Ok(Node::I16(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Node, CaptureError> {
        Ok(Node::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Node, CaptureError> {
        Ok(Node::I64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Node, CaptureError> {
        Ok(Node::U8(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Node, CaptureError> {
        Ok(Node::U16(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Node, CaptureError> {
        Ok(Node::U32(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Node, CaptureError> {
        Ok(Node::U64(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Node, CaptureError> {
        Ok(Node::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Node, CaptureError> {
        Ok(Node::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<Node, CaptureError> {
        Ok(Node::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Node, CaptureError> {
        Ok(Node::Str(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Node, CaptureError> {
        Ok(Node::Unsupported("byte string"))
    }

    fn serialize_none(self) -> Result<Node, CaptureError> {
        Ok(Node::Absent)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Node, CaptureError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node, CaptureError> {
        Ok(Node::Unsupported("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node, CaptureError> {
        Ok(Node::Unsupported("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node, CaptureError> {
        Ok(Node::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Node, CaptureError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Node, CaptureError> {
        Ok(Node::Unsupported("enum variant with data"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCapture, CaptureError> {
        Ok(SeqCapture {
            items: Vec::with_capacity(len.unwrap_or(0)),
            variant: false,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCapture, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCapture, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<SeqCapture, CaptureError> {
        Ok(SeqCapture {
            items: Vec::new(),
            variant: true,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCapture, CaptureError> {
        Ok(MapCapture {
            entries: Vec::new(),
            key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<StructCapture, CaptureError> {
        Ok(StructCapture {
            name,
            fields: Vec::with_capacity(len),
            variant: false,
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<StructCapture, CaptureError> {
        Ok(StructCapture {
            name,
            fields: Vec::new(),
            variant: true,
        })
    }
}

// --- SerializeStruct ---

struct StructCapture {
    name: &'static str,
    fields: Vec<(String, Node)>,
    variant: bool,
}

impl ser::SerializeStruct for StructCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CaptureError> {
        self.fields.push((key.to_string(), value.serialize(NodeSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        if self.variant {
            return Ok(Node::Unsupported("enum variant with data"));
        }
        Ok(Node::Struct {
            name: self.name,
            fields: self.fields,
        })
    }
}

impl ser::SerializeStructVariant for StructCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<(), CaptureError> {
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        ser::SerializeStruct::end(self)
    }
}

// --- SerializeMap ---

struct MapCapture {
    entries: Vec<(String, Node)>,
    key: Option<String>,
}

impl ser::SerializeMap for MapCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), CaptureError> {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CaptureError> {
        let key = self
            .key
            .take()
            .ok_or_else(|| CaptureError("map value serialized before its key".into()))?;
        self.entries.push((key, value.serialize(NodeSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        Ok(Node::Map(self.entries))
    }
}

// --- SerializeSeq (Vec, arrays, tuples) ---

struct SeqCapture {
    items: Vec<Node>,
    variant: bool,
}

impl ser::SerializeSeq for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CaptureError> {
        if !self.variant {
            self.items.push(value.serialize(NodeSerializer)?);
        }
        Ok(())
    }

    fn end(self) -> Result<Node, CaptureError> {
        if self.variant {
            return Ok(Node::Unsupported("enum variant with data"));
        }
        Ok(Node::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CaptureError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CaptureError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqCapture {
    type Ok = Node;
    type Error = CaptureError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CaptureError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node, CaptureError> {
        ser::SerializeSeq::end(self)
    }
}

// --- Key serializer (map keys become path segments) ---

struct KeySerializer;

fn key_error(kind: &str) -> CaptureError {
    CaptureError(format!("map keys must be strings, found {kind}"))
}

macro_rules! reject_key {
    ($($method:ident($ty:ty) => $kind:literal),* $(,)?) => {$(
        fn $method(self, _: $ty) -> Result<String, CaptureError> {
            Err(key_error($kind))
        }
    )*};
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = CaptureError;
    type SerializeSeq = ser::Impossible<String, CaptureError>;
    type SerializeTuple = ser::Impossible<String, CaptureError>;
    type SerializeTupleStruct = ser::Impossible<String, CaptureError>;
    type SerializeTupleVariant = ser::Impossible<String, CaptureError>;
    type SerializeMap = ser::Impossible<String, CaptureError>;
    type SerializeStruct = ser::Impossible<String, CaptureError>;
    type SerializeStructVariant = ser::Impossible<String, CaptureError>;

    fn serialize_str(self, v: &str) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String, CaptureError> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<String, CaptureError> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<String, CaptureError> {
        value.serialize(self)
    }

    reject_key! {
        serialize_bool(bool) => "bool",
        serialize_i8(i8) => "integer",
        serialize_i16(i16) => "integer",
        serialize_i32(i32) => "integer",
        serialize_i64(i64) => "integer",
        serialize_u8(u8) => "integer",
        serialize_u16(u16) => "integer",
        serialize_u32(u32) => "integer",
        serialize_u64(u64) => "integer",
        serialize_f32(f32) => "float",
        serialize_f64(f64) => "float",
        serialize_bytes(&[u8]) => "bytes",
        serialize_unit_struct(&'static str) => "unit struct",
    }

    fn serialize_none(self) -> Result<String, CaptureError> {
        Err(key_error("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<String, CaptureError> {
        Err(key_error("option"))
    }

    fn serialize_unit(self) -> Result<String, CaptureError> {
        Err(key_error("unit"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<String, CaptureError> {
        Err(key_error("enum variant with data"))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, CaptureError> {
        Err(key_error("sequence"))
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, CaptureError> {
        Err(key_error("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, CaptureError> {
        Err(key_error("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, CaptureError> {
        Err(key_error("enum variant with data"))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, CaptureError> {
        Err(key_error("map"))
    }

    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, CaptureError> {
        Err(key_error("struct"))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, CaptureError> {
        Err(key_error("enum variant with data"))
    }
}
