//! Plist parsing and value-tree deserialization.
//!
//! This module provides the recovering [`Parser`] that turns a tag stream into
//! a [`PlistMap`], and the serde bridge [`from_value`] that turns a value tree
//! into any `T: Deserialize`.
//!
//! ## Recovery
//!
//! State files outlive the code that wrote them, so the parser never rejects
//! input. Every anomaly becomes a [`ParseWarning`] (also logged through
//! `tracing`) and the parser keeps whatever it could read:
//!
//! - a missing `</dict>` or `</array>` closes the frame where the stream ends
//! - a `key`, `/dict` or `/plist` inside an array closes the array
//! - a `/plist` inside a dict closes the dict
//! - a value without a preceding `key` is dropped
//! - unknown or out-of-context tags are skipped
//! - unparsable `integer` and `real` payloads are dropped
//!
//! ```rust
//! use bitplist::parse_with_diagnostics;
//!
//! let (dict, warnings) = parse_with_diagnostics(
//!     "<plist><dict><key>a</key><array><integer>1</integer><key>b</key><true/></dict>",
//! );
//! assert_eq!(dict.len(), 2);
//! assert_eq!(warnings.len(), 2); // array closed by `key`, plist never closed
//! ```

use crate::escape::unescape;
use crate::real::decode_real;
use crate::tag::{TagRecord, TagSource};
use crate::{Error, PlistMap, Result, Value};
use serde::{de, forward_to_deserialize_any};
use std::fmt;

/// Frame kinds of the parser's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    Root,
    Dict,
    Array,
}

impl Context {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Context::Root => "plist",
            Context::Dict => "dict",
            Context::Array => "array",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong, without the location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseWarningKind {
    /// A frame ended without its closing tag.
    MissingClosingTag { context: Context },
    /// A value appeared in a dict with no `key` before it.
    MissingKey { tag: String, value: Option<String> },
    /// A `key` was not followed by a value.
    DanglingKey { key: String },
    /// A tag that has no meaning where it appeared.
    UnexpectedTag { tag: String, context: Context },
    /// An `integer` or `real` payload that could not be read.
    MalformedScalar { tag: String, text: String },
}

impl fmt::Display for ParseWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarningKind::MissingClosingTag { context } => {
                write!(f, "missing closing tag for {}", context)
            }
            ParseWarningKind::MissingKey { tag, value: Some(value) } => {
                write!(f, "{} value {:?} has no key, dropping it", tag, value)
            }
            ParseWarningKind::MissingKey { tag, value: None } => {
                write!(f, "{} value has no key, dropping it", tag)
            }
            ParseWarningKind::DanglingKey { key } => {
                write!(f, "key {:?} has no value", key)
            }
            ParseWarningKind::UnexpectedTag { tag, context } => {
                write!(f, "unexpected <{}> in {}, skipping it", tag, context)
            }
            ParseWarningKind::MalformedScalar { tag, text } => {
                write!(f, "cannot read {} from {:?}, dropping it", tag, text)
            }
        }
    }
}

/// A recoverable anomaly found while parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: usize,
    pub kind: ParseWarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Outcome of reading one tag in value position.
enum Read {
    Value(Value),
    /// A value tag whose payload was unusable; already reported.
    Dropped,
    NotAValue(TagRecord),
}

/// Builds a value tree from a [`TagSource`].
///
/// The parser owns a one-slot lookahead buffer: when an array frame meets a
/// tag that belongs to an enclosing frame, the tag is parked there and the
/// enclosing frame reads it next.
///
/// # Examples
///
/// ```rust
/// use bitplist::de::Parser;
/// use bitplist::tag::TagRecord;
///
/// let tags = vec![
///     TagRecord::open("dict"),
///     TagRecord::leaf("key", "dt"),
///     TagRecord::leaf("real", "0.5"),
///     TagRecord::close("dict"),
/// ];
/// let (dict, warnings) = Parser::new(tags.into_iter()).parse();
/// assert_eq!(dict.get("dt").and_then(|v| v.as_f64()), Some(0.5));
/// assert!(warnings.is_empty());
/// ```
pub struct Parser<S: TagSource> {
    source: S,
    lookahead: Option<TagRecord>,
    warnings: Vec<ParseWarning>,
}

impl<S: TagSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Parser {
            source,
            lookahead: None,
            warnings: Vec::new(),
        }
    }

    /// Parses the whole stream, returning the root dictionary and every warning.
    pub fn parse(mut self) -> (PlistMap, Vec<ParseWarning>) {
        let root = self.parse_root();
        (root, self.warnings)
    }

    fn next(&mut self) -> Option<TagRecord> {
        self.lookahead.take().or_else(|| self.source.next_tag())
    }

    fn push_back(&mut self, tag: TagRecord) {
        debug_assert!(self.lookahead.is_none(), "lookahead slot already taken");
        self.lookahead = Some(tag);
    }

    fn warn(&mut self, line: usize, kind: ParseWarningKind) {
        tracing::warn!(line, "{}", kind);
        self.warnings.push(ParseWarning { line, kind });
    }

    fn parse_root(&mut self) -> PlistMap {
        let mut root = PlistMap::new();
        let mut open_plist = false;

        while let Some(tag) = self.next() {
            match tag.name.as_str() {
                // Version attributes are not checked.
                "plist" => open_plist = !tag.self_closing && tag.value.is_none(),
                "/plist" => return root,
                "dict" => {
                    let dict = self.dict_from(&tag);
                    root.extend(dict);
                }
                _ => self.warn(
                    tag.line,
                    ParseWarningKind::UnexpectedTag {
                        tag: tag.name,
                        context: Context::Root,
                    },
                ),
            }
        }

        if open_plist {
            let line = self.source.line();
            self.warn(
                line,
                ParseWarningKind::MissingClosingTag {
                    context: Context::Root,
                },
            );
        }
        root
    }

    fn dict_from(&mut self, tag: &TagRecord) -> PlistMap {
        if tag.self_closing || tag.value.is_some() {
            PlistMap::new()
        } else {
            self.parse_dict()
        }
    }

    fn array_from(&mut self, tag: &TagRecord) -> Vec<Value> {
        if tag.self_closing || tag.value.is_some() {
            Vec::new()
        } else {
            self.parse_array()
        }
    }

    fn parse_dict(&mut self) -> PlistMap {
        let mut map = PlistMap::new();
        let mut pending_key: Option<(String, usize)> = None;

        while let Some(tag) = self.next() {
            match tag.name.as_str() {
                "key" => {
                    let key = unescape(tag.value.as_deref().unwrap_or_default());
                    if let Some((key, line)) = pending_key.replace((key, tag.line)) {
                        self.warn(line, ParseWarningKind::DanglingKey { key });
                    }
                }
                "/dict" => {
                    if let Some((key, line)) = pending_key.take() {
                        self.warn(line, ParseWarningKind::DanglingKey { key });
                    }
                    return map;
                }
                "/plist" => {
                    self.warn(
                        tag.line,
                        ParseWarningKind::MissingClosingTag {
                            context: Context::Dict,
                        },
                    );
                    self.push_back(tag);
                    return map;
                }
                _ => {
                    let line = tag.line;
                    let name = tag.name.clone();
                    let raw = tag.value.clone();
                    match self.read_value(tag) {
                        Read::Value(value) => match pending_key.take() {
                            Some((key, _)) => {
                                map.insert(key, value);
                            }
                            None => self.warn(line, ParseWarningKind::MissingKey { tag: name, value: raw }),
                        },
                        Read::Dropped => pending_key = None,
                        // An unknown tag in value position still uses up the key.
                        Read::NotAValue(tag) => {
                            pending_key = None;
                            self.warn(
                                tag.line,
                                ParseWarningKind::UnexpectedTag {
                                    tag: tag.name,
                                    context: Context::Dict,
                                },
                            );
                        }
                    }
                }
            }
        }

        let line = self.source.line();
        self.warn(
            line,
            ParseWarningKind::MissingClosingTag {
                context: Context::Dict,
            },
        );
        map
    }

    fn parse_array(&mut self) -> Vec<Value> {
        let mut list = Vec::new();

        while let Some(tag) = self.next() {
            match tag.name.as_str() {
                "/array" => return list,
                "key" | "/dict" | "/plist" => {
                    self.warn(
                        tag.line,
                        ParseWarningKind::MissingClosingTag {
                            context: Context::Array,
                        },
                    );
                    self.push_back(tag);
                    return list;
                }
                _ => match self.read_value(tag) {
                    Read::Value(value) => list.push(value),
                    Read::Dropped => {}
                    Read::NotAValue(tag) => self.warn(
                        tag.line,
                        ParseWarningKind::UnexpectedTag {
                            tag: tag.name,
                            context: Context::Array,
                        },
                    ),
                },
            }
        }

        let line = self.source.line();
        self.warn(
            line,
            ParseWarningKind::MissingClosingTag {
                context: Context::Array,
            },
        );
        list
    }

    fn read_value(&mut self, tag: TagRecord) -> Read {
        let text = tag.value.as_deref().unwrap_or_default();
        match tag.name.as_str() {
            "string" => Read::Value(Value::Str(unescape(text))),
            "integer" => match text.trim().parse::<i32>() {
                Ok(i) => Read::Value(Value::Int(i)),
                Err(_) => self.malformed(&tag, text),
            },
            "real" => match decode_real(text) {
                Ok(r) => Read::Value(Value::Real(r)),
                Err(_) => self.malformed(&tag, text),
            },
            "true" => Read::Value(Value::Bool(true)),
            "false" => Read::Value(Value::Bool(false)),
            "dict" => Read::Value(Value::Dict(self.dict_from(&tag))),
            "array" => Read::Value(Value::List(self.array_from(&tag))),
            _ => Read::NotAValue(tag),
        }
    }

    fn malformed(&mut self, tag: &TagRecord, text: &str) -> Read {
        self.warn(
            tag.line,
            ParseWarningKind::MalformedScalar {
                tag: tag.name.clone(),
                text: text.to_string(),
            },
        );
        Read::Dropped
    }
}

/// Deserializes a `T` out of a value tree.
///
/// # Examples
///
/// ```rust
/// use bitplist::{from_value, plist};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Probe { id: i32, offset: f64 }
///
/// let probe: Probe = from_value(plist!({"id": 4, "offset": -0.5})).unwrap();
/// assert_eq!(probe, Probe { id: 4, offset: -0.5 });
/// ```
///
/// # Errors
///
/// Returns an error if the tree's shape does not match `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: de::DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: PlistMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::Str(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

/// Enums are stored as a bare string (unit variants) or a single-entry dict.
struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::Str(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::List(list)) => visitor.visit_seq(SeqDeserializer::new(list)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Dict(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Dict(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::List(list) => visitor.visit_seq(SeqDeserializer::new(list)),
            Value::Str(s) => visitor.visit_string(s),
            Value::Int(i) => visitor.visit_i32(i),
            Value::Real(r) => visitor.visit_f64(r),
            Value::Bool(b) => visitor.visit_bool(b),
        }
    }

    // Absent keys are the only way to spell `None`.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Str(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Dict(map) if map.len() == 1 => {
                let Some((variant, value)) = map.into_iter().next() else {
                    return Err(Error::custom("expected single-entry dict for enum"));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(Error::custom(format!(
                "expected string or single-entry dict for enum, found {}",
                other.type_name()
            ))),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagReader;
    use serde::Deserialize;

    fn parse_str(input: &str) -> (PlistMap, Vec<ParseWarning>) {
        Parser::new(TagReader::new(input)).parse()
    }

    #[test]
    fn test_scalars() {
        let (dict, warnings) = parse_str(
            "<plist><dict>\
             <key>s</key><string>a &lt; b</string>\
             <key>i</key><integer>-7</integer>\
             <key>r</key><real>4607182418800017408L</real>\
             <key>t</key><true/>\
             <key>f</key><false/>\
             </dict></plist>",
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(dict.get("s"), Some(&Value::from("a < b")));
        assert_eq!(dict.get("i"), Some(&Value::Int(-7)));
        assert_eq!(dict.get("r"), Some(&Value::Real(1.0)));
        assert_eq!(dict.get("t"), Some(&Value::Bool(true)));
        assert_eq!(dict.get("f"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_nested_and_empty_containers() {
        let (dict, warnings) = parse_str(
            "<dict><key>outer</key><dict><key>list</key><array><array/><dict/><integer>1</integer></array></dict>\
             <key>e</key><array></array></dict>",
        );
        assert!(warnings.is_empty());
        let list = dict
            .get("outer")
            .and_then(|v| v.get("list"))
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], Value::List(vec![]));
        assert_eq!(list[1], Value::Dict(PlistMap::new()));
        assert_eq!(dict.get("e"), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_value_without_key_is_dropped() {
        let (dict, warnings) = parse_str("<dict><string>orphan</string></dict>");
        assert!(dict.is_empty());
        assert_eq!(
            warnings,
            vec![ParseWarning {
                line: 1,
                kind: ParseWarningKind::MissingKey {
                    tag: "string".to_string(),
                    value: Some("orphan".to_string()),
                },
            }]
        );
    }

    #[test]
    fn test_array_closed_by_enclosing_tag() {
        let (dict, warnings) = parse_str(
            "<dict><key>xs</key><array><integer>1</integer><integer>2</integer>\n<key>y</key><true/></dict>",
        );
        assert_eq!(
            dict.get("xs"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(dict.get("y"), Some(&Value::Bool(true)));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 2);
        assert_eq!(
            warnings[0].kind,
            ParseWarningKind::MissingClosingTag {
                context: Context::Array
            }
        );
    }

    #[test]
    fn test_array_closed_by_dict_end() {
        let (dict, warnings) =
            parse_str("<dict><key>xs</key><array><false/></dict><key>late</key>");
        assert_eq!(dict.get("xs"), Some(&Value::List(vec![Value::Bool(false)])));
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[1].kind,
            ParseWarningKind::UnexpectedTag {
                tag: "key".to_string(),
                context: Context::Root
            }
        );
    }

    #[test]
    fn test_stream_ends_inside_frames() {
        let (dict, warnings) = parse_str("<dict><key>a</key><array><integer>5</integer>");
        assert_eq!(dict.get("a"), Some(&Value::List(vec![Value::Int(5)])));
        let contexts: Vec<_> = warnings
            .iter()
            .map(|w| match &w.kind {
                ParseWarningKind::MissingClosingTag { context } => *context,
                other => panic!("unexpected warning {other:?}"),
            })
            .collect();
        assert_eq!(contexts, vec![Context::Array, Context::Dict]);
    }

    #[test]
    fn test_dict_closed_by_plist_end() {
        let (dict, warnings) =
            parse_str("<plist><dict><key>a</key><integer>1</integer></plist>");
        assert_eq!(dict.get("a"), Some(&Value::Int(1)));
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].kind,
            ParseWarningKind::MissingClosingTag {
                context: Context::Dict
            }
        );
    }

    #[test]
    fn test_malformed_scalars_are_dropped() {
        let (dict, warnings) = parse_str(
            "<dict><key>big</key><integer>3000000000</integer>\
             <key>bad</key><real>1.2.3</real>\
             <key>ok</key><integer>1</integer></dict>",
        );
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("ok"), Some(&Value::Int(1)));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].to_string().contains("3000000000"));
    }

    #[test]
    fn test_unknown_tags_skipped() {
        let (dict, warnings) = parse_str(
            "<plist><junk/><dict><key>d</key><date>2020</date><key>n</key><integer>2</integer></dict></plist>",
        );
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("n"), Some(&Value::Int(2)));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_dangling_key() {
        let (dict, warnings) =
            parse_str("<dict><key>a</key><key>b</key><integer>1</integer><key>c</key></dict>");
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("b"), Some(&Value::Int(1)));
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            &warnings[0].kind,
            ParseWarningKind::DanglingKey { key } if key == "a"
        ));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let (dict, _) = parse_str(
            "<dict><key>k</key><integer>1</integer><key>k</key><integer>2</integer></dict>",
        );
        assert_eq!(dict.get("k"), Some(&Value::Int(2)));
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Mode {
        Idle,
        Running { step: i32 },
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct State {
        name: String,
        temps: Vec<f64>,
        mode: Mode,
        last: Mode,
        note: Option<String>,
    }

    #[test]
    fn test_from_value() {
        let value = crate::plist!({
            "name": "run-1",
            "temps": [1.5, 2.5],
            "mode": "Idle",
            "last": {"Running": {"step": 9}}
        });
        let state: State = from_value(value).unwrap();
        assert_eq!(
            state,
            State {
                name: "run-1".to_string(),
                temps: vec![1.5, 2.5],
                mode: Mode::Idle,
                last: Mode::Running { step: 9 },
                note: None,
            }
        );
    }

    #[test]
    fn test_from_value_type_error() {
        let result: Result<Vec<i32>> = from_value(Value::from("nope"));
        assert!(result.is_err());
    }
}
