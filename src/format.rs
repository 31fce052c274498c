//! Wire format reference
//!
//! This module documents the markup read by [`parse`](crate::parse) and
//! written by [`encode_document`](crate::encode_document).
//!
//! # Overview
//!
//! A document is a tree of six value kinds rooted at a dictionary. The element
//! names follow the classic XML property list, but the dialect is not
//! interchangeable with it: doubles are stored as bit patterns, there are no
//! `date` or `data` elements, and integers are 32-bit.
//!
//! ```text
//! <plist version="1.0">
//! <dict>
//!   <key>step</key>
//!   <integer>1200</integer>
//!   <key>dt</key>
//!   <real>4591870180066957722L</real>
//!   <key>cells</key>
//!   <array>
//!     <dict>
//!       <key>alive</key>
//!       <true/>
//!     </dict>
//!   </array>
//! </dict>
//! </plist>
//! ```
//!
//! # Grammar
//!
//! ```text
//! document := [ "<plist" attrs ">" ] dict [ "</plist>" ]
//! dict     := "<dict>" ( key value )* "</dict>" | "<dict/>"
//! array    := "<array>" value* "</array>" | "<array/>"
//! key      := "<key>" text "</key>"
//! value    := dict | array | string | integer | real | "<true/>" | "<false/>"
//! string   := "<string>" text "</string>"
//! integer  := "<integer>" [-]digits "</integer>"
//! real     := "<real>" ( [-]digits "L" | decimal ) "</real>"
//! ```
//!
//! Whitespace between tags is insignificant. The `<?xml ...?>` prolog,
//! `<!DOCTYPE ...>` and comments may appear anywhere and are skipped. Attributes
//! on `plist` are accepted and ignored. A document may hold several root
//! dictionaries; their entries merge, later keys overwriting earlier ones.
//!
//! ## Values
//!
//! | Kind | Element | Rust |
//! |------|---------|------|
//! | Dictionary | `dict` | [`Value::Dict`](crate::Value::Dict) |
//! | Array | `array` | [`Value::List`](crate::Value::List) |
//! | String | `string` | [`Value::Str`](crate::Value::Str) |
//! | Integer | `integer` | [`Value::Int`](crate::Value::Int), `i32` |
//! | Real | `real` | [`Value::Real`](crate::Value::Real), `f64` |
//! | Boolean | `true` / `false` | [`Value::Bool`](crate::Value::Bool) |
//!
//! ## Reals
//!
//! The payload is the signed decimal of `f64::to_bits() as i64`, followed by `L`.
//! Every double, including NaN payloads, `-0.0`, infinities and subnormals,
//! round-trips exactly.
//!
//! | Value | Payload |
//! |-------|---------|
//! | `0.0` | `0L` |
//! | `-0.0` | `-9223372036854775808L` |
//! | `1.0` | `4607182418800017408L` |
//! | `-1.0` | `-4616189618054758400L` |
//! | `f64::INFINITY` | `9218868437227405312L` |
//!
//! Payloads without the `L` are parsed as ordinary decimals. The encoder never
//! produces them; they exist for documents written before the bit-pattern
//! encoding.
//!
//! ## Text
//!
//! `string` and `key` payloads escape `&`, `<`, `>`, `"` and `'` as named
//! references and every non-ASCII character as `&#N;`, so encoded documents are
//! pure ASCII. Readers also accept hexadecimal references (`&#x3B1;`) and a
//! fixed set of HTML named references; unknown references are kept verbatim.
//! Whitespace inside payloads is significant and preserved.
//!
//! ## Empty containers
//!
//! `<dict/>`, `<dict></dict>`, `<array/>` and `<array></array>` are all
//! empty. The encoder writes the paired form.
//!
//! # Recovery
//!
//! Parsing never fails. Anomalies are reported as
//! [`ParseWarning`](crate::ParseWarning)s:
//!
//! | Input | Result |
//! |-------|--------|
//! | Stream ends inside a `dict` or `array` | Container closed with what was read |
//! | `key`, `/dict` or `/plist` inside an `array` | Array closed, tag handed to the enclosing frame |
//! | `/plist` inside a `dict` | Dict closed, tag handed to the enclosing frame |
//! | Value without a preceding `key` | Value dropped |
//! | Two `key`s in a row, or a `key` before `</dict>` | Earlier key dropped |
//! | Unknown element (`date`, `data`, ...) | Skipped; a pending key is dropped with it |
//! | Unparsable `integer` or `real` | Entry dropped |
//! | Text outside leaf elements | Ignored |
//!
//! Duplicate keys keep the last value.
