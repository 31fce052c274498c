//! Plist encoding and value-tree serialization.
//!
//! This module turns value trees into markup text, and any `T: Serialize`
//! into a value tree through [`ValueSerializer`].
//!
//! ## Encoding
//!
//! Encoding is a total function over [`Value`]: every tree has exactly one
//! encoding for a given [`EncodeOptions`]. Doubles are written through the
//! bit-pattern codec, so parsing the output reproduces every `Real` bit for
//! bit.
//!
//! ```rust
//! use bitplist::{encode, encode_value, Value};
//!
//! assert_eq!(encode(&Value::from(1.0)), "<real>4607182418800017408L</real>");
//! assert_eq!(encode(&Value::List(vec![])), "<array></array>");
//! assert_eq!(
//!     encode_value("on", &Value::from(true)),
//!     "<key>on</key><true/>"
//! );
//! ```

use crate::escape::escape;
use crate::real::encode_real;
use crate::{EncodeOptions, Error, PlistMap, Result, Value};
use serde::{ser, Serialize};

/// Encodes a value as a compact fragment.
#[must_use]
pub fn encode(value: &Value) -> String {
    let mut output = String::with_capacity(64);
    write_value(&mut output, value, &EncodeOptions::new(), 0);
    output
}

/// Encodes a `key` element followed by `value`, i.e. one dictionary entry.
#[must_use]
pub fn encode_value(key: &str, value: &Value) -> String {
    let mut output = String::with_capacity(64);
    let options = EncodeOptions::new();
    write_key(&mut output, key, &options, 0);
    write_value(&mut output, value, &options, 0);
    output
}

/// Encodes a full document with `dict` as its root.
///
/// # Examples
///
/// ```rust
/// use bitplist::{encode_document, plist, EncodeOptions};
///
/// let state = plist!({"n": 2});
/// let text = encode_document(state.as_dict().unwrap(), &EncodeOptions::pretty());
/// assert_eq!(
///     text,
///     "<plist version=\"1.0\">\n<dict>\n  <key>n</key>\n  <integer>2</integer>\n</dict>\n</plist>\n"
/// );
/// ```
#[must_use]
pub fn encode_document(dict: &PlistMap, options: &EncodeOptions) -> String {
    // Checkpoints are dominated by numeric leaves; 48 bytes per entry is a fair first guess.
    let mut output = String::with_capacity(64 + dict.len() * 48);
    if options.header {
        output.push_str("<plist version=\"1.0\">");
        write_newline(&mut output, options);
    }
    write_dict(&mut output, dict, options, 0);
    if options.header {
        output.push_str("</plist>");
        write_newline(&mut output, options);
    }
    output
}

fn write_newline(output: &mut String, options: &EncodeOptions) {
    if options.pretty {
        output.push('\n');
    }
}

fn write_indent(output: &mut String, options: &EncodeOptions, level: usize) {
    if options.pretty {
        output.push_str(&" ".repeat(level * options.indent));
    }
}

fn write_leaf(output: &mut String, tag: &str, text: &str, options: &EncodeOptions, level: usize) {
    write_indent(output, options, level);
    output.push('<');
    output.push_str(tag);
    output.push('>');
    output.push_str(text);
    output.push_str("</");
    output.push_str(tag);
    output.push('>');
    write_newline(output, options);
}

fn write_key(output: &mut String, key: &str, options: &EncodeOptions, level: usize) {
    write_leaf(output, "key", &escape(key), options, level);
}

fn write_dict(output: &mut String, dict: &PlistMap, options: &EncodeOptions, level: usize) {
    write_indent(output, options, level);
    output.push_str("<dict>");
    write_newline(output, options);
    for (key, value) in dict.iter() {
        write_key(output, key, options, level + 1);
        write_value(output, value, options, level + 1);
    }
    write_indent(output, options, level);
    output.push_str("</dict>");
    write_newline(output, options);
}

fn write_list(output: &mut String, list: &[Value], options: &EncodeOptions, level: usize) {
    write_indent(output, options, level);
    output.push_str("<array>");
    write_newline(output, options);
    for element in list {
        write_value(output, element, options, level + 1);
    }
    write_indent(output, options, level);
    output.push_str("</array>");
    write_newline(output, options);
}

fn write_value(output: &mut String, value: &Value, options: &EncodeOptions, level: usize) {
    match value {
        Value::Dict(map) => write_dict(output, map, options, level),
        Value::List(list) => write_list(output, list, options, level),
        Value::Str(s) => write_leaf(output, "string", &escape(s), options, level),
        Value::Int(i) => write_leaf(output, "integer", &i.to_string(), options, level),
        Value::Real(r) => write_leaf(output, "real", &encode_real(*r), options, level),
        Value::Bool(b) => {
            write_indent(output, options, level);
            output.push_str(if *b { "<true/>" } else { "<false/>" });
            write_newline(output, options);
        }
    }
}

/// Serializes any `T: Serialize` into a [`Value`].
///
/// Integers must fit in 32 bits. `None` and unit fields of structs and maps
/// are left out; anywhere else they are an error, since the format has no null.
/// Enum variants with data become single-entry dictionaries keyed by the
/// variant name.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: PlistMap,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

fn wrap_variant(variant: Option<&'static str>, value: Value) -> Value {
    match variant {
        Some(name) => {
            let mut map = PlistMap::with_capacity(1);
            map.insert(name.to_string(), value);
            Value::Dict(map)
        }
        None => value,
    }
}

fn int_value<T>(v: T) -> Result<Value>
where
    T: TryInto<i32> + std::fmt::Display + Copy,
{
    v.try_into()
        .map(Value::Int)
        .map_err(|_| Error::unsupported_type(&format!("integer {} does not fit in 32 bits", v)))
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(v as i32))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(v as i32))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        int_value(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Int(v as i32))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Int(v as i32))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        int_value(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        int_value(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Real(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Real(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::List(v.iter().map(|&b| Value::Int(b as i32)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Err(Error::NoValue)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(Error::NoValue)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Err(Error::NoValue)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(wrap_variant(Some(variant), required_value(value, "as a variant payload")?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

/// Serializes a value that has no key to leave out, so none or unit is fatal.
///
/// The missing value is reported as unsupported rather than `NoValue`; an
/// enclosing dict entry only drops itself for its own none or unit.
fn required_value<T: ?Sized + Serialize>(value: &T, place: &str) -> Result<Value> {
    to_value(value).map_err(|e| match e {
        Error::NoValue => Error::unsupported_type(&format!("none or unit {}", place)),
        e => e,
    })
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(required_value(value, "inside an array")?);
        Ok(())
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::List(self.vec))
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: PlistMap::new(),
            current_key: None,
            variant,
        }
    }

    /// Inserts `value` under `key`, leaving the entry out when the value
    /// itself is none or unit.
    fn insert<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        match to_value(value) {
            Ok(value) => {
                self.map.insert(key, value);
                Ok(())
            }
            Err(Error::NoValue) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::Dict(self.map))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::Str(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::unsupported_type(&format!(
                "dict keys must be strings, found {}",
                other.type_name()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use bitplist::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Cell { id: u16, mass: f64, label: Option<String> }
///
/// let value = to_value(&Cell { id: 3, mass: 0.5, label: None }).unwrap();
/// assert_eq!(value.get("mass"), Some(&Value::Real(0.5)));
/// assert!(value.get("label").is_none());
/// ```
///
/// # Errors
///
/// Returns an error for integers outside 32 bits, non-string map keys, and
/// `None`/unit values outside of struct fields and map entries.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

impl Serialize for PlistMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        use serde::ser::SerializeMap as _;
        let mut state = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            state.serialize_entry(k, v)?;
        }
        state.end()
    }
}
