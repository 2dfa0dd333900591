// Decoder error handling

use std::fmt;

use crate::disassembler::Token;

/// Number of raw bytes shown around a failure point.
pub const CONTEXT_BYTES: usize = 25;

/// Which grammar position a rejected tag byte was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContext {
    /// Expected `attr_ubyte` / `attr_uint16` after a value
    AttributeId,
    /// Attribute number with no table entry
    AttributeCode,
    /// Expected a `ubyte` / `uint16` size tag inside an array
    ArraySize,
    /// Expected an operator tag after an attribute list
    Operator,
}

impl fmt::Display for TagContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TagContext::AttributeId => "attribute id tag",
            TagContext::AttributeCode => "attribute number",
            TagContext::ArraySize => "array size tag",
            TagContext::Operator => "operator tag",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised while decoding a stream.
///
/// Every offset is a file offset: the position in the original input,
/// including any preamble bytes skipped before the stream header.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No `HP-PCL XL` stream header anywhere in the input
    MissingStreamHeader,
    /// Binding byte is neither `(` nor `)`
    MalformedBinding { offset: usize, found: u8 },
    /// Tag or attribute number that cannot be resolved in its context
    ProtocolViolation {
        offset: usize,
        code: u16,
        context: TagContext,
    },
    /// Vendor data length attribute carried a value of the wrong type
    TypeMismatch {
        offset: usize,
        attribute: &'static str,
        expected: &'static str,
        found: String,
    },
    /// Vendor payload requested without a data length in the same list
    MissingRequiredAttribute {
        offset: usize,
        operator: &'static str,
        attribute: &'static str,
    },
    /// Buffer exhausted while `needed` more bytes were required
    UnexpectedEndOfStream { offset: usize, needed: usize },
}

impl DecodeError {
    /// File offset the error refers to, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::MissingStreamHeader => None,
            DecodeError::MalformedBinding { offset, .. }
            | DecodeError::ProtocolViolation { offset, .. }
            | DecodeError::TypeMismatch { offset, .. }
            | DecodeError::MissingRequiredAttribute { offset, .. }
            | DecodeError::UnexpectedEndOfStream { offset, .. } => Some(*offset),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::MissingStreamHeader => {
                write!(f, "No PCL XL stream header found")
            }
            DecodeError::MalformedBinding { offset, found } => {
                write!(
                    f,
                    "Unsupported binding {:#04x} at offset {:#010x}",
                    found, offset
                )
            }
            DecodeError::ProtocolViolation {
                offset,
                code,
                context,
            } => {
                write!(
                    f,
                    "Unknown {} {:#04x} at offset {:#010x}",
                    context, code, offset
                )
            }
            DecodeError::TypeMismatch {
                offset,
                attribute,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Type mismatch for {} at offset {:#010x}: expected {}, found {}",
                    attribute, offset, expected, found
                )
            }
            DecodeError::MissingRequiredAttribute {
                offset,
                operator,
                attribute,
            } => {
                write!(
                    f,
                    "{} at offset {:#010x} requires a preceding {} attribute",
                    operator, offset, attribute
                )
            }
            DecodeError::UnexpectedEndOfStream { offset, needed } => {
                write!(
                    f,
                    "Unexpected end of stream at offset {:#010x} ({} more bytes needed)",
                    offset, needed
                )
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// A fatal decode error together with what was decoded before it.
#[derive(Debug, Clone)]
pub struct DecodeFailure {
    pub error: DecodeError,
    /// Tokens emitted before the failure, including the unfinished step
    pub tokens: Vec<Token>,
    /// File offset of the first context byte
    pub context_offset: usize,
    /// Raw bytes leading up to and including the failure point
    pub context: Vec<u8>,
}

impl DecodeFailure {
    /// Build a failure report, taking context bytes from `data`.
    ///
    /// `base_offset` is the file offset of `data[0]`.
    pub fn new(error: DecodeError, tokens: Vec<Token>, data: &[u8], base_offset: usize) -> Self {
        let position = error
            .offset()
            .map(|offset| offset.saturating_sub(base_offset))
            .unwrap_or(0);
        let (start, context) = context_window(data, position);
        DecodeFailure {
            error,
            tokens,
            context_offset: base_offset + start,
            context,
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.context.is_empty() {
            write!(f, "\n  bytes from {:#010x}:", self.context_offset)?;
            for byte in &self.context {
                write!(f, " {:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for DecodeFailure {}

/// Up to `CONTEXT_BYTES` bytes ending at (and including) `position`.
pub fn context_window(data: &[u8], position: usize) -> (usize, Vec<u8>) {
    let end = (position + 1).min(data.len());
    let start = end.saturating_sub(CONTEXT_BYTES);
    (start, data[start..end].to_vec())
}
