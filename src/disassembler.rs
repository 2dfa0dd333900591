use crate::attribute::{self, Attribute};
use crate::cursor::{Cursor, Interrupt};
use crate::error::{DecodeError, DecodeFailure, TagContext};
use crate::header::{self, StreamHeader};
use crate::payload::{self, Payload};
use crate::tag_tables::{self, POP_GS, PUSH_GS};
use log::{debug, warn};

/// An operator tag and where it sat in the stream
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub tag: u8,
    pub name: &'static str,
    /// File offset where the operator's attribute list began
    pub file_offset: usize,
    /// File offset of the tag byte itself
    pub tag_offset: usize,
    /// Graphics state nesting level the operator runs at
    pub level: i32,
    /// 1-based position among counted operators; `None` for embedded data
    pub position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Attribute(Attribute),
    Operator(Operator),
    Payload(Payload),
    /// Universal exit sequence; always the last token of a session
    JobEnd { file_offset: usize },
}

/// Outcome of one driver step
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Attributes, the operator, and its payload if it carries one
    MoreTokens(Vec<Token>),
    TerminatedByMarker(Token),
    /// Ran out of bytes. `at_boundary` is true when no part of a further
    /// operator had been read.
    UnexpectedEndOfStream {
        offset: usize,
        needed: usize,
        at_boundary: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum DriverState {
    Scanning,
    Terminated(Token),
    Exhausted {
        offset: usize,
        needed: usize,
        at_boundary: bool,
    },
    Failed(DecodeError),
}

/// State threaded through the decode of one stream
pub struct DecodeSession<'a> {
    pub(crate) cursor: Cursor<'a>,
    /// `VUDataLength` of the current attribute list, consumed by VendorUnique
    pub(crate) vendor_length: Option<u32>,
    header: StreamHeader,
    stream: &'a [u8],
    base: usize,
    level: i32,
    position: u32,
    state: DriverState,
    partial: Vec<Token>,
}

impl<'a> DecodeSession<'a> {
    /// Locate the stream inside `data`, skipping any preamble, and open it
    pub fn open(data: &'a [u8]) -> Result<Self, DecodeError> {
        let start = header::locate_stream(data)?;
        Self::new(&data[start..], start)
    }

    /// Open a stream that begins at its header; `base` is its offset in the file
    pub fn new(stream: &'a [u8], base: usize) -> Result<Self, DecodeError> {
        let header = StreamHeader::parse(stream, base)?;
        let mut cursor = Cursor::new(stream, header.binding, base);
        cursor.set_position(header.length);

        debug!(
            "PXL_SESSION: {} bytes, binding {:?}, operators from {:#x}",
            stream.len(),
            header.binding,
            cursor.file_offset()
        );

        Ok(DecodeSession {
            cursor,
            vendor_length: None,
            header,
            stream,
            base,
            level: 0,
            position: 0,
            state: DriverState::Scanning,
            partial: Vec::new(),
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn into_header(self) -> StreamHeader {
        self.header
    }

    /// Current graphics state nesting level; not clamped at zero
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Number of counted operators decoded so far
    pub fn operator_count(&self) -> u32 {
        self.position
    }

    pub fn file_offset(&self) -> usize {
        self.cursor.file_offset()
    }

    pub fn is_finished(&self) -> bool {
        self.state != DriverState::Scanning
    }

    /// Tokens of the step that was interrupted by the terminal outcome
    pub fn partial_tokens(&self) -> &[Token] {
        &self.partial
    }

    /// Build a failure report with context bytes from this stream
    pub fn failure(&self, error: DecodeError, tokens: Vec<Token>) -> DecodeFailure {
        DecodeFailure::new(error, tokens, self.stream, self.base)
    }

    /// Decode one operator sequence.
    ///
    /// Once a terminal outcome has been reached every further call
    /// returns it again.
    pub fn step(&mut self) -> Result<Step, DecodeError> {
        match &self.state {
            DriverState::Scanning => {}
            DriverState::Terminated(token) => return Ok(Step::TerminatedByMarker(token.clone())),
            DriverState::Exhausted {
                offset,
                needed,
                at_boundary,
            } => {
                return Ok(Step::UnexpectedEndOfStream {
                    offset: *offset,
                    needed: *needed,
                    at_boundary: *at_boundary,
                })
            }
            DriverState::Failed(error) => return Err(error.clone()),
        }

        self.cursor.skip_whitespace();
        let at_boundary = self.cursor.is_at_end();
        let mut tokens = Vec::new();

        match self.decode_sequence(&mut tokens) {
            Ok(()) => Ok(Step::MoreTokens(tokens)),
            Err(Interrupt::JobEnd { offset }) => {
                debug!("PXL_SESSION: job end at {:#x}", offset);
                self.cursor.consume_job_end();
                let token = Token::JobEnd {
                    file_offset: offset,
                };
                self.partial = tokens;
                self.state = DriverState::Terminated(token.clone());
                Ok(Step::TerminatedByMarker(token))
            }
            Err(Interrupt::Fault(DecodeError::UnexpectedEndOfStream { offset, needed })) => {
                warn!(
                    "PXL_SESSION: stream ended at {:#x} without a job end marker",
                    offset
                );
                self.partial = tokens;
                self.state = DriverState::Exhausted {
                    offset,
                    needed,
                    at_boundary,
                };
                Ok(Step::UnexpectedEndOfStream {
                    offset,
                    needed,
                    at_boundary,
                })
            }
            Err(Interrupt::Fault(error)) => {
                warn!("PXL_SESSION: {}", error);
                self.partial = tokens;
                self.state = DriverState::Failed(error.clone());
                Err(error)
            }
        }
    }

    fn decode_sequence(&mut self, tokens: &mut Vec<Token>) -> Result<(), Interrupt> {
        let file_offset = self.cursor.file_offset();
        attribute::parse_attribute_list(self, tokens)?;

        self.cursor.skip_whitespace();
        let tag_offset = self.cursor.file_offset();
        let tag = self.cursor.peek_tag()?;
        let def = tag_tables::lookup_operator(tag).ok_or(DecodeError::ProtocolViolation {
            offset: tag_offset,
            code: tag as u16,
            context: TagContext::Operator,
        })?;
        self.cursor.read_u8()?;

        if tag == POP_GS {
            self.level -= 1;
        }
        let position = if def.counted {
            self.position += 1;
            Some(self.position)
        } else {
            None
        };

        debug!(
            "PXL_OPERATOR: {} tag={:#04x} offset={:#x} level={}",
            def.name, tag, file_offset, self.level
        );
        tokens.push(Token::Operator(Operator {
            tag,
            name: def.name,
            file_offset,
            tag_offset,
            level: self.level,
            position,
        }));

        if tag == PUSH_GS {
            self.level += 1;
        }

        if let Some(source) = def.payload {
            let payload = payload::read_payload(self, source, def.name, tag_offset)?;
            tokens.push(Token::Payload(payload));
        }
        Ok(())
    }
}

/// A fully decoded stream
pub struct Disassembly {
    pub header: StreamHeader,
    /// Every token in stream order, ending with `Token::JobEnd`
    pub tokens: Vec<Token>,
}

impl Disassembly {
    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Operator(op) => Some(op),
            _ => None,
        })
    }
}

/// Decode a whole file image: preamble, header and operators up to the job end.
///
/// Running out of bytes before the job-end marker is a failure, even at an
/// operator boundary.
pub fn disassemble(data: &[u8]) -> Result<Disassembly, DecodeFailure> {
    let mut session =
        DecodeSession::open(data).map_err(|e| DecodeFailure::new(e, Vec::new(), data, 0))?;
    let mut tokens = Vec::new();

    loop {
        match session.step() {
            Ok(Step::MoreTokens(mut step)) => tokens.append(&mut step),
            Ok(Step::TerminatedByMarker(token)) => {
                tokens.extend(session.partial_tokens().iter().cloned());
                tokens.push(token);
                break;
            }
            Ok(Step::UnexpectedEndOfStream { offset, needed, .. }) => {
                tokens.extend(session.partial_tokens().iter().cloned());
                let error = DecodeError::UnexpectedEndOfStream { offset, needed };
                return Err(session.failure(error, tokens));
            }
            Err(error) => {
                tokens.extend(session.partial_tokens().iter().cloned());
                return Err(session.failure(error, tokens));
            }
        }
    }

    Ok(Disassembly {
        header: session.into_header(),
        tokens,
    })
}
