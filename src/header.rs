use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::cursor::Binding;
use crate::error::DecodeError;
use log::debug;

/// Text that follows the binding byte in every stream header
pub const STREAM_MARKER: &[u8] = b" HP-PCL XL;";

/// Length of any preamble (PJL or other text) before the stream header.
pub fn locate_stream(data: &[u8]) -> Result<usize, DecodeError> {
    let marker = data
        .windows(STREAM_MARKER.len())
        .position(|w| w == STREAM_MARKER)
        .ok_or(DecodeError::MissingStreamHeader)?;
    if marker == 0 {
        return Err(DecodeError::MalformedBinding {
            offset: 0,
            found: b' ',
        });
    }
    debug!("PXL_HEADER: stream header at {:#x}", marker - 1);
    Ok(marker - 1)
}

/// The `<binding> HP-PCL XL;<protocol>;<revision>` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct StreamHeader {
    pub binding: Binding,
    pub protocol: String,
    pub revision: String,
    pub comment: Option<String>,
    /// Bytes up to and including the terminating line feed
    pub length: usize,
}

impl StreamHeader {
    /// Parse the header at the start of `stream`; `base` is its file offset.
    pub fn parse(stream: &[u8], base: usize) -> Result<StreamHeader, DecodeError> {
        let marker = *stream
            .first()
            .ok_or(DecodeError::UnexpectedEndOfStream {
                offset: base,
                needed: 1,
            })?;
        let binding = Binding::from_marker(marker).ok_or(DecodeError::MalformedBinding {
            offset: base,
            found: marker,
        })?;

        let newline = stream
            .iter()
            .position(|b| *b == b'\n')
            .ok_or(DecodeError::UnexpectedEndOfStream {
                offset: base + stream.len(),
                needed: 1,
            })?;

        let line = String::from_utf8_lossy(&stream[1..newline]);
        let line = line.trim_end_matches('\r').trim_start();
        if !line.starts_with("HP-PCL XL") {
            return Err(DecodeError::MissingStreamHeader);
        }

        let mut fields = line.splitn(4, ';').skip(1);
        let protocol = fields.next().unwrap_or("").trim().to_string();
        let revision = fields.next().unwrap_or("").trim().to_string();
        let comment = fields.next().map(|c| c.to_string());

        debug!(
            "PXL_HEADER: binding={:?} protocol={} revision={}",
            binding, protocol, revision
        );

        Ok(StreamHeader {
            binding,
            protocol,
            revision,
            comment,
            length: newline + 1,
        })
    }
}

impl Display for StreamHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "` HP-PCL XL;{};{}", self.protocol, self.revision)
    }
}
