//! Configuration for encoding and diffing.
//!
//! - [`EncodeOptions`]: output layout for the encoder
//! - [`DiffOptions`]: strictness and diagnostic volume for the differ
//!
//! ## Examples
//!
//! ```rust
//! use bitplist::{DiffOptions, EncodeOptions};
//!
//! let encode = EncodeOptions::pretty().with_indent(4);
//! let diff = DiffOptions::new().with_fail_fast(true).with_max_repeats(3);
//! assert!(encode.pretty);
//! assert_eq!(diff.max_repeats, 3);
//! ```

/// Layout options for the encoder.
///
/// Layout only affects whitespace between tags; `string` and `key` payloads
/// are never reformatted, so every layout parses back to the same tree.
///
/// # Examples
///
/// ```rust
/// use bitplist::EncodeOptions;
///
/// // Default compact document with the plist wrapper
/// let options = EncodeOptions::new();
/// assert!(options.header);
///
/// // Bare fragment, one tag per line
/// let options = EncodeOptions::pretty().with_header(false);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOptions {
    pub indent: usize,
    pub pretty: bool,
    /// Wrap documents in `<plist version="1.0">`.
    pub header: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            indent: 2,
            pretty: false,
            header: true,
        }
    }
}

impl EncodeOptions {
    /// Creates default options (compact, 2-space indent when pretty, plist wrapper on).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for one-tag-per-line output.
    #[must_use]
    pub fn pretty() -> Self {
        EncodeOptions {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Enables or disables the `<plist>` document wrapper.
    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }
}

/// Options for [`Differ`](crate::Differ).
///
/// # Examples
///
/// ```rust
/// use bitplist::DiffOptions;
///
/// let options = DiffOptions::default();
/// assert!(!options.fail_fast);
/// assert_eq!(options.max_repeats, 5);
/// assert_eq!(options.significant_digits, 12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DiffOptions {
    /// Stop at the first recorded issue.
    pub fail_fast: bool,
    /// Messages of one kind under one container emitted before suppression kicks in.
    pub max_repeats: usize,
    /// Precision used to classify real mismatches as rounding noise.
    pub significant_digits: i32,
    /// Log diagnostics at `info` instead of `debug`.
    pub verbose: bool,
    /// Accept keys that exist only in the reference.
    pub allow_reference_only_keys: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            fail_fast: false,
            max_repeats: 5,
            significant_digits: 12,
            verbose: false,
            allow_reference_only_keys: false,
        }
    }
}

impl DiffOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn with_max_repeats(mut self, max_repeats: usize) -> Self {
        self.max_repeats = max_repeats;
        self
    }

    #[must_use]
    pub fn with_significant_digits(mut self, digits: i32) -> Self {
        self.significant_digits = digits;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Treats the candidate as a subset of the reference.
    #[must_use]
    pub fn with_reference_only_keys(mut self, allow: bool) -> Self {
        self.allow_reference_only_keys = allow;
        self
    }
}
