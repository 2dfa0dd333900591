use crate::cursor::Interrupt;
use crate::disassembler::DecodeSession;
use crate::error::DecodeError;
use crate::tag_tables::{PayloadSource, VENDOR_LENGTH_ATTRIBUTE};
use log::debug;

/// Raw data block that followed a payload-bearing operator
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub source: PayloadSource,
    pub bytes: Vec<u8>,
    /// File offset of the first data byte
    pub file_offset: usize,
    /// NUL bytes skipped after the data
    pub padding: usize,
}

impl Payload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Consume the data block for an operator whose tag was just read.
///
/// `operator_offset` is the file offset of that tag, used for error reports.
pub fn read_payload(
    session: &mut DecodeSession,
    source: PayloadSource,
    operator: &'static str,
    operator_offset: usize,
) -> Result<Payload, Interrupt> {
    let length = match source {
        PayloadSource::InlineUInt32 => session.cursor.read_u32()? as usize,
        PayloadSource::InlineUByte => session.cursor.read_u8()? as usize,
        PayloadSource::VendorLength => {
            session
                .vendor_length
                .take()
                .ok_or(DecodeError::MissingRequiredAttribute {
                    offset: operator_offset,
                    operator,
                    attribute: VENDOR_LENGTH_ATTRIBUTE,
                })? as usize
        }
    };

    let file_offset = session.cursor.file_offset();
    let bytes = session.cursor.read_bytes(length)?.to_vec();
    let padding = session.cursor.skip_null_padding();

    debug!(
        "PXL_PAYLOAD: {} bytes for {} at {:#x} (+{} padding)",
        length, operator, file_offset, padding
    );

    Ok(Payload {
        source,
        bytes,
        file_offset,
        padding,
    })
}
