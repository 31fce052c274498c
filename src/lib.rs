//! # bitplist
//!
//! A property-list dialect for checkpointing numerical state with bit-for-bit
//! fidelity, plus a structural differ for validating runs against a reference.
//!
//! ## What is different from plist?
//!
//! The markup is the familiar `dict`/`array`/`key`/`string`/`integer`/`real`
//! element set, but `real` payloads are written as the signed 64-bit integer
//! holding the double's IEEE-754 bit pattern, followed by `L`:
//!
//! ```text
//! <real>4607182418800017408L</real>   <!-- 1.0 -->
//! ```
//!
//! Decimal payloads from older files are still accepted. See [`format`] for the
//! full wire format.
//!
//! ## Key Features
//!
//! - **Bit-exact doubles**: NaN payloads, signed zeros and subnormals survive a round trip
//! - **Recovering parser**: damaged files yield a best-effort tree plus warnings, never an error
//! - **Structural differ**: classifies mismatches as rounding noise or real divergence,
//!   with rate-limited diagnostics
//! - **Serde bridge**: any `T: Serialize` becomes a document and back
//!
//! ## Quick Start
//!
//! ```rust
//! use bitplist::{from_str, to_string};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct State {
//!     step: u32,
//!     dt: f64,
//!     positions: Vec<f64>,
//! }
//!
//! let state = State { step: 12, dt: 0.1, positions: vec![0.1 + 0.2, -0.0] };
//! let text = to_string(&state).unwrap();
//! let back: State = from_str(&text).unwrap();
//!
//! assert_eq!(back.positions[0].to_bits(), (0.1f64 + 0.2).to_bits());
//! assert!(back.positions[1].is_sign_negative());
//! ```
//!
//! ### Working with Trees
//!
//! ```rust
//! use bitplist::{encode_value, parse, plist, Value};
//!
//! let tree = plist!({"solver": "rk4", "tolerances": [1e-6, 1e-9]});
//! let text = bitplist::encode_document(tree.as_dict().unwrap(), &Default::default());
//!
//! let back = parse(&text);
//! assert_eq!(Value::Dict(back), tree);
//! assert_eq!(encode_value("n", &Value::from(3)), "<key>n</key><integer>3</integer>");
//! ```
//!
//! ### Validating a Run
//!
//! ```rust
//! use bitplist::{diff, parse};
//! use std::collections::HashSet;
//!
//! let reference = parse("<dict><key>x</key><real>4607182418800017408L</real></dict>");
//! let candidate = parse("<dict><key>x</key><real>1.0</real></dict>");
//! assert_eq!(diff(&reference, &candidate, &HashSet::new()), 0);
//! ```
//!
//! ## Logging
//!
//! Parser warnings and differ diagnostics go through [`tracing`]; install any
//! subscriber to see them.

pub mod de;
pub mod diff;
pub mod error;
pub mod escape;
pub mod format;
pub mod macros;
pub mod map;
pub mod options;
pub mod real;
pub mod ser;
pub mod tag;
pub mod value;

pub use de::{from_value, Context, ParseWarning, ParseWarningKind, Parser};
pub use diff::{diff, DiffReport, Differ, Issue, IssueKind};
pub use error::{Error, Result};
pub use map::PlistMap;
pub use options::{DiffOptions, EncodeOptions};
pub use real::{decode_real, encode_real};
pub use ser::{encode, encode_document, encode_value, to_value, ValueSerializer};
pub use tag::{TagReader, TagRecord, TagSource};
pub use value::Value;

use serde::{de::DeserializeOwned, Serialize};
use std::io;

/// Parses a document into its root dictionary.
///
/// Never fails: malformed input produces a best-effort tree, and every
/// anomaly is logged as a `tracing` warning.
///
/// # Examples
///
/// ```rust
/// use bitplist::parse;
///
/// let dict = parse("<plist version=\"1.0\"><dict><key>on</key><true/></dict></plist>");
/// assert_eq!(dict.get("on").and_then(|v| v.as_bool()), Some(true));
///
/// assert!(parse("not markup at all").is_empty());
/// ```
#[must_use]
pub fn parse(text: &str) -> PlistMap {
    parse_with_diagnostics(text).0
}

/// Parses a document, also returning every recovered anomaly.
#[must_use]
pub fn parse_with_diagnostics(text: &str) -> (PlistMap, Vec<ParseWarning>) {
    parse_tags(TagReader::new(text))
}

/// Parses a pre-tokenized tag stream.
///
/// # Examples
///
/// ```rust
/// use bitplist::{parse_tags, TagRecord};
///
/// let tags = vec![
///     TagRecord::open("dict"),
///     TagRecord::leaf("key", "n"),
///     TagRecord::leaf("integer", "7"),
///     TagRecord::close("dict"),
/// ];
/// let (dict, warnings) = parse_tags(tags.into_iter());
/// assert_eq!(dict.get("n").and_then(|v| v.as_i32()), Some(7));
/// assert!(warnings.is_empty());
/// ```
pub fn parse_tags<S: TagSource>(source: S) -> (PlistMap, Vec<ParseWarning>) {
    Parser::new(source).parse()
}

/// Serialize any `T: Serialize` to a compact document.
///
/// The value must serialize to a map or struct, since documents are rooted
/// at a dictionary.
///
/// # Examples
///
/// ```rust
/// use bitplist::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: f64, y: f64 }
///
/// let text = to_string(&Point { x: 1.0, y: 0.0 }).unwrap();
/// assert_eq!(
///     text,
///     "<plist version=\"1.0\"><dict><key>x</key><real>4607182418800017408L</real>\
///      <key>y</key><real>0L</real></dict></plist>"
/// );
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented, or is not a dictionary.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a document with one tag per line.
///
/// # Errors
///
/// Returns an error if the value cannot be represented, or is not a dictionary.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::pretty())
}

/// Serialize any `T: Serialize` to a document with custom layout.
///
/// # Errors
///
/// Returns an error if the value cannot be represented, or is not a dictionary.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: &EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    match to_value(value)? {
        Value::Dict(map) => Ok(encode_document(&map, options)),
        other => Err(Error::unsupported_type(&format!(
            "document root must be a dict, found {}",
            other.type_name()
        ))),
    }
}

/// Serialize any `T: Serialize` to a writer.
///
/// # Examples
///
/// ```rust
/// use bitplist::{plist, to_writer};
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &plist!({"n": 1})).unwrap();
/// assert!(buffer.starts_with(b"<plist"));
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, &EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a writer with custom layout.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: &EncodeOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Deserialize an instance of type `T` from document text.
///
/// Parsing itself recovers from damage (see [`parse`]); errors only come
/// from a tree whose shape does not fit `T`.
///
/// # Examples
///
/// ```rust
/// use bitplist::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let text = "<dict><key>x</key><integer>1</integer><key>y</key><integer>2</integer></dict>";
/// let point: Point = from_str(text).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the parsed tree cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(text: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(Value::Dict(parse(text)))
}

/// Deserialize an instance of type `T` from an I/O stream.
///
/// # Errors
///
/// Returns an error if reading fails, or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&text)
}

/// Deserialize an instance of type `T` from UTF-8 bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, or cannot be
/// deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = std::str::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))?;
    from_str(text)
}
