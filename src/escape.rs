//! Markup escaping for `key` and `string` payloads.
//!
//! Encoding replaces the five reserved markup characters with their named
//! references and writes every non-ASCII code point as a decimal character
//! reference, so encoded documents are pure ASCII. Decoding accepts decimal
//! (`&#233;`) and hexadecimal (`&#xE9;`) references plus a fixed table of named
//! references. Unknown or malformed references are kept verbatim.
//!
//! ```rust
//! use bitplist::escape::{escape, unescape};
//!
//! assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
//! assert_eq!(escape("café"), "caf&#233;");
//! assert_eq!(unescape("caf&eacute; &amp; &#x2603;"), "café & \u{2603}");
//! ```

/// Named references recognized when decoding.
const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("copy", '\u{00A9}'),
    ("reg", '\u{00AE}'),
    ("deg", '\u{00B0}'),
    ("plusmn", '\u{00B1}'),
    ("micro", '\u{00B5}'),
    ("middot", '\u{00B7}'),
    ("times", '\u{00D7}'),
    ("divide", '\u{00F7}'),
    ("auml", '\u{00E4}'),
    ("ouml", '\u{00F6}'),
    ("uuml", '\u{00FC}'),
    ("Auml", '\u{00C4}'),
    ("Ouml", '\u{00D6}'),
    ("Uuml", '\u{00DC}'),
    ("szlig", '\u{00DF}'),
    ("eacute", '\u{00E9}'),
    ("egrave", '\u{00E8}'),
    ("agrave", '\u{00E0}'),
    ("ccedil", '\u{00E7}'),
    ("alpha", '\u{03B1}'),
    ("beta", '\u{03B2}'),
    ("gamma", '\u{03B3}'),
    ("delta", '\u{03B4}'),
    ("mu", '\u{03BC}'),
    ("pi", '\u{03C0}'),
    ("sigma", '\u{03C3}'),
    ("hellip", '\u{2026}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
];

/// Longest entity body worth scanning for before giving up on a `&`.
const MAX_REFERENCE_LEN: usize = 10;

/// Escapes `text` for use between markup tags.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_ascii() => out.push(c),
            c => {
                out.push_str("&#");
                out.push_str(&(c as u32).to_string());
                out.push(';');
            }
        }
    }
    out
}

/// Reverses [`escape`], also accepting hexadecimal and named references.
#[must_use]
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail
            .find(';')
            .filter(|&end| end <= MAX_REFERENCE_LEN)
            .and_then(|end| resolve_reference(&tail[..end]).map(|ch| (ch, end)))
        {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_REFERENCES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, ch)| *ch)
}
