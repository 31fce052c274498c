//! Tag stream: the lexical layer underneath the parser.
//!
//! The parser never looks at characters. It pulls [`TagRecord`]s from a
//! [`TagSource`], and [`TagReader`] is the source for markup text. The reader
//! folds leaf elements into a single record, so `<key>mass</key>` arrives as
//! one `key` record carrying the text `mass`, while containers arrive as
//! separate `dict` and `/dict` records.
//!
//! ```rust
//! use bitplist::tag::{TagReader, TagSource};
//!
//! let mut reader = TagReader::new("<dict>\n  <key>n</key><integer>3</integer>\n</dict>");
//! let names: Vec<_> = std::iter::from_fn(|| reader.next_tag())
//!     .map(|tag| (tag.name, tag.value, tag.line))
//!     .collect();
//!
//! assert_eq!(names[0], ("dict".to_string(), None, 1));
//! assert_eq!(names[1], ("key".to_string(), Some("n".to_string()), 2));
//! assert_eq!(names[3], ("/dict".to_string(), None, 3));
//! ```
//!
//! Processing instructions (`<?xml ...?>`), declarations (`<!DOCTYPE ...>`)
//! and comments are skipped. Whitespace between tags is insignificant.

/// One lexical tag, as consumed by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRecord {
    /// Element name; closing tags carry a leading `/` (`"/dict"`).
    pub name: String,
    /// Raw (still escaped) text of a folded leaf element.
    pub value: Option<String>,
    /// Raw attribute text, e.g. `version="1.0"`.
    pub attributes: Option<String>,
    /// `true` for `<name/>`.
    pub self_closing: bool,
    /// 1-based source line where the tag starts; 0 when unknown.
    pub line: usize,
}

impl TagRecord {
    /// An opening tag such as `<dict>`.
    pub fn open(name: &str) -> Self {
        TagRecord {
            name: name.to_string(),
            value: None,
            attributes: None,
            self_closing: false,
            line: 0,
        }
    }

    /// A closing tag such as `</dict>`.
    pub fn close(name: &str) -> Self {
        TagRecord::open(&format!("/{}", name))
    }

    /// A folded leaf element such as `<integer>3</integer>`.
    pub fn leaf(name: &str, value: &str) -> Self {
        TagRecord {
            value: Some(value.to_string()),
            ..TagRecord::open(name)
        }
    }

    /// A self-closing tag such as `<true/>`.
    pub fn empty(name: &str) -> Self {
        TagRecord {
            self_closing: true,
            ..TagRecord::open(name)
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.name.starts_with('/')
    }
}

/// A pull-style stream of tags.
///
/// Lookahead is the consumer's business: the parser keeps its own one-slot
/// buffer, so implementations only ever move forward.
pub trait TagSource {
    /// Returns the next tag, or `None` once the stream is exhausted.
    fn next_tag(&mut self) -> Option<TagRecord>;

    /// Line the stream is currently positioned at, for diagnostics.
    fn line(&self) -> usize;
}

impl TagSource for std::vec::IntoIter<TagRecord> {
    fn next_tag(&mut self) -> Option<TagRecord> {
        self.next()
    }

    fn line(&self) -> usize {
        self.as_slice().first().map_or(0, |tag| tag.line)
    }
}

/// Tokenizes markup text into [`TagRecord`]s.
pub struct TagReader<'a> {
    input: &'a str,
    position: usize,
    line: usize,
}

impl<'a> TagReader<'a> {
    pub fn new(input: &'a str) -> Self {
        TagReader {
            input,
            position: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Moves forward `len` bytes, counting newlines on the way.
    fn advance(&mut self, len: usize) {
        let end = (self.position + len).min(self.input.len());
        self.line += self.input[self.position..end]
            .bytes()
            .filter(|&b| b == b'\n')
            .count();
        self.position = end;
    }

    /// Skips past `terminator`, or to the end of input if it never appears.
    fn skip_past(&mut self, terminator: &str) {
        match self.rest().find(terminator) {
            Some(idx) => self.advance(idx + terminator.len()),
            None => {
                tracing::debug!(line = self.line, "unterminated markup construct, expected {terminator:?}");
                self.advance(self.rest().len());
            }
        }
    }

    /// Skips character data up to the next `<`.
    fn skip_text(&mut self) {
        let rest = self.rest();
        let len = rest.find('<').unwrap_or(rest.len());
        let text = &rest[..len];
        if !text.trim().is_empty() {
            tracing::debug!(line = self.line, text = text.trim(), "discarding text outside a leaf element");
        }
        self.advance(len);
    }

    /// If `rest` starts with `</name>` (whitespace allowed before `>`), returns its length.
    fn closing_tag_len(rest: &str, name: &str) -> Option<usize> {
        let after_name = rest.strip_prefix("</")?.strip_prefix(name)?;
        let trimmed = after_name.trim_start();
        trimmed.starts_with('>').then(|| {
            rest.len() - trimmed.len() + 1
        })
    }

    fn read_element(&mut self, line: usize) -> Option<TagRecord> {
        let rest = self.rest();
        let Some(gt) = rest.find('>') else {
            tracing::debug!(line, "unterminated tag at end of input");
            self.advance(rest.len());
            return None;
        };
        let body = rest[1..gt].trim();
        self.advance(gt + 1);

        if let Some(closing) = body.strip_prefix('/') {
            return Some(TagRecord::close(closing.trim()).with_line(line));
        }

        let (body, self_closing) = match body.strip_suffix('/') {
            Some(inner) => (inner.trim_end(), true),
            None => (body, false),
        };
        let (name, attributes) = match body.find(char::is_whitespace) {
            Some(split) => (&body[..split], Some(body[split..].trim().to_string())),
            None => (body, None),
        };

        let mut record = TagRecord {
            name: name.to_string(),
            value: None,
            attributes: attributes.filter(|a| !a.is_empty()),
            self_closing,
            line,
        };
        if self_closing {
            return Some(record);
        }

        // Fold `<name>text</name>` into one record.
        let rest = self.rest();
        if let Some(lt) = rest.find('<') {
            if let Some(close_len) = Self::closing_tag_len(&rest[lt..], name) {
                record.value = Some(rest[..lt].to_string());
                self.advance(lt + close_len);
            }
        }
        Some(record)
    }
}

impl TagSource for TagReader<'_> {
    fn next_tag(&mut self) -> Option<TagRecord> {
        loop {
            self.skip_text();
            if self.at_end() {
                return None;
            }

            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->");
            } else if rest.starts_with("<?") {
                self.skip_past("?>");
            } else if rest.starts_with("<!") {
                self.skip_past(">");
            } else {
                let line = self.line;
                return self.read_element(line);
            }
        }
    }

    fn line(&self) -> usize {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Vec<TagRecord> {
        let mut reader = TagReader::new(input);
        std::iter::from_fn(|| reader.next_tag()).collect()
    }

    #[test]
    fn test_folds_leaf_elements() {
        let tags = read_all("<key>a</key><string>x &amp; y</string>");
        assert_eq!(
            tags,
            vec![
                TagRecord::leaf("key", "a").with_line(1),
                TagRecord::leaf("string", "x &amp; y").with_line(1),
            ]
        );
    }

    #[test]
    fn test_containers_are_not_folded() {
        let tags = read_all("<array><integer>1</integer></array>");
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["array", "integer", "/array"]);
    }

    #[test]
    fn test_empty_leaf_has_empty_value() {
        let tags = read_all("<string></string><dict>\n</dict>");
        assert_eq!(tags[0].value.as_deref(), Some(""));
        assert_eq!(tags[1].name, "dict");
        assert_eq!(tags[1].value.as_deref(), Some("\n"));
    }

    #[test]
    fn test_self_closing_and_attributes() {
        let tags = read_all("<plist version=\"1.0\"><true/><dict />");
        assert_eq!(tags[0].name, "plist");
        assert_eq!(tags[0].attributes.as_deref(), Some("version=\"1.0\""));
        assert!(!tags[0].self_closing);
        assert_eq!(tags[1], TagRecord::empty("true").with_line(1));
        assert_eq!(tags[2], TagRecord::empty("dict").with_line(1));
    }

    #[test]
    fn test_skips_prolog_doctype_and_comments() {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE plist>\n<!-- saved state -->\n<plist></plist>";
        let tags = read_all(input);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "plist");
        assert_eq!(tags[0].value.as_deref(), Some(""));
        assert_eq!(tags[0].line, 4);
    }

    #[test]
    fn test_line_numbers() {
        let tags = read_all("<dict>\n<key>a</key>\n\n<true/>\n</dict>");
        let lines: Vec<_> = tags.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_unterminated_tag_ends_stream() {
        let tags = read_all("<dict><key>a</key><str");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_closing_tag_with_trailing_space() {
        let tags = read_all("<key>a</key ><true/>");
        assert_eq!(tags[0], TagRecord::leaf("key", "a").with_line(1));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_vec_source() {
        let mut source = vec![TagRecord::open("dict").with_line(7)].into_iter();
        assert_eq!(source.line(), 7);
        assert!(source.next_tag().is_some());
        assert!(source.next_tag().is_none());
    }
}
