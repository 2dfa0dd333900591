use crate::cursor::{Cursor, Interrupt};
use crate::disassembler::{DecodeSession, Token};
use crate::error::{DecodeError, TagContext};
use crate::tag_tables::{self, ATTR_UBYTE, ATTR_UINT16, VENDOR_LENGTH_ATTRIBUTE};
use crate::value::{self, ElementType, Number, Value};
use log::trace;

/// One `value attribute-id` pair of an attribute list
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub code: u16,
    pub name: &'static str,
    pub value: Value,
    /// Symbolic name for enumerated scalar values
    pub enum_label: Option<&'static str>,
    /// File offset of the value's data-type tag
    pub file_offset: usize,
}

/// Parse zero or more attributes, pushing each onto `tokens` as it completes.
///
/// The list ends at the first byte that is not a data-type tag. The vendor
/// length slot only ever holds a value from the list being parsed.
pub fn parse_attribute_list(
    session: &mut DecodeSession,
    tokens: &mut Vec<Token>,
) -> Result<usize, Interrupt> {
    session.vendor_length = None;
    let mut count = 0;

    loop {
        session.cursor.skip_whitespace();
        let file_offset = session.cursor.file_offset();
        let shape = match tag_tables::lookup_data_type(session.cursor.peek_tag()?) {
            Some(shape) => shape,
            None => break,
        };
        session.cursor.read_u8()?;
        let value = value::decode_value(&mut session.cursor, shape)?;

        session.cursor.skip_whitespace();
        let (code, name) = parse_attribute_id(&mut session.cursor)?;

        if name == VENDOR_LENGTH_ATTRIBUTE {
            match &value {
                Value::Scalar(Number::UInt32(length)) => session.vendor_length = Some(*length),
                other => {
                    return Err(DecodeError::TypeMismatch {
                        offset: file_offset,
                        attribute: name,
                        expected: ElementType::UInt32.name(),
                        found: other.shape().to_string(),
                    }
                    .into())
                }
            }
        }

        let enum_label = value
            .scalar()
            .and_then(|n| n.as_u32())
            .and_then(|v| tag_tables::lookup_enum_label(name, v));

        trace!(
            "PXL_ATTRIBUTE: {} ({}) = {:?} at {:#x}",
            name,
            code,
            value,
            file_offset
        );
        tokens.push(Token::Attribute(Attribute {
            code,
            name,
            value,
            enum_label,
            file_offset,
        }));
        count += 1;
    }

    Ok(count)
}

/// Read an attribute id tag and resolve its number.
///
/// On an unknown number the cursor is left on the number itself.
fn parse_attribute_id(cursor: &mut Cursor) -> Result<(u16, &'static str), Interrupt> {
    let tag_offset = cursor.file_offset();
    let tag = cursor.peek_tag()?;
    if tag != ATTR_UBYTE && tag != ATTR_UINT16 {
        return Err(DecodeError::ProtocolViolation {
            offset: tag_offset,
            code: tag as u16,
            context: TagContext::AttributeId,
        }
        .into());
    }
    cursor.read_u8()?;

    let code_position = cursor.position();
    let code_offset = cursor.file_offset();
    let code = if tag == ATTR_UBYTE {
        cursor.read_u8()? as u16
    } else {
        cursor.read_u16()?
    };

    match tag_tables::lookup_attribute(code) {
        Some(name) => Ok((code, name)),
        None => {
            cursor.set_position(code_position);
            Err(DecodeError::ProtocolViolation {
                offset: code_offset,
                code,
                context: TagContext::AttributeCode,
            }
            .into())
        }
    }
}
