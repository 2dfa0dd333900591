use crate::cursor::{Cursor, Interrupt};
use crate::error::{DecodeError, TagContext};
use crate::tag_tables;
use log::trace;
use std::fmt::{Display, Error, Formatter};

/// Numeric element types of the data-type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    UByte,
    UInt16,
    UInt32,
    SInt16,
    SInt32,
    Real32,
}

impl ElementType {
    /// Element type from the low three bits of a data-type tag
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ElementType::UByte),
            1 => Some(ElementType::UInt16),
            2 => Some(ElementType::UInt32),
            3 => Some(ElementType::SInt16),
            4 => Some(ElementType::SInt32),
            5 => Some(ElementType::Real32),
            _ => None,
        }
    }

    /// Size in bytes of one element
    pub fn width(&self) -> usize {
        match self {
            ElementType::UByte => 1,
            ElementType::UInt16 | ElementType::SInt16 => 2,
            ElementType::UInt32 | ElementType::SInt32 | ElementType::Real32 => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::UByte => "ubyte",
            ElementType::UInt16 => "uint16",
            ElementType::UInt32 => "uint32",
            ElementType::SInt16 => "sint16",
            ElementType::SInt32 => "sint32",
            ElementType::Real32 => "real32",
        }
    }
}

/// Value shapes selected by the leading data-type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Scalar(ElementType),
    /// Two elements (`_xy`)
    Pair(ElementType),
    /// Four elements (`_box`)
    Quad(ElementType),
    /// Counted elements; the count precedes the data
    Array(ElementType),
}

impl ValueShape {
    pub fn element_type(&self) -> ElementType {
        match self {
            ValueShape::Scalar(t)
            | ValueShape::Pair(t)
            | ValueShape::Quad(t)
            | ValueShape::Array(t) => *t,
        }
    }
}

impl Display for ValueShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let suffix = match self {
            ValueShape::Scalar(_) => "",
            ValueShape::Pair(_) => "_xy",
            ValueShape::Quad(_) => "_box",
            ValueShape::Array(_) => "_array",
        };
        write!(f, "{}{}", self.element_type().name(), suffix)
    }
}

/// A single decoded element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    UByte(u8),
    UInt16(u16),
    UInt32(u32),
    SInt16(i16),
    SInt32(i32),
    Real32(f32),
}

impl Number {
    pub fn element_type(&self) -> ElementType {
        match self {
            Number::UByte(_) => ElementType::UByte,
            Number::UInt16(_) => ElementType::UInt16,
            Number::UInt32(_) => ElementType::UInt32,
            Number::SInt16(_) => ElementType::SInt16,
            Number::SInt32(_) => ElementType::SInt32,
            Number::Real32(_) => ElementType::Real32,
        }
    }

    /// Non-negative integral value, used for enumeration and length lookups
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Number::UByte(v) => Some(v as u32),
            Number::UInt16(v) => Some(v as u32),
            Number::UInt32(v) => Some(v),
            Number::SInt16(v) => u32::try_from(v).ok(),
            Number::SInt32(v) => u32::try_from(v).ok(),
            Number::Real32(_) => None,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Number::UByte(v) => write!(f, "{}", v),
            Number::UInt16(v) => write!(f, "{}", v),
            Number::UInt32(v) => write!(f, "{}", v),
            Number::SInt16(v) => write!(f, "{}", v),
            Number::SInt32(v) => write!(f, "{}", v),
            Number::Real32(v) => write!(f, "{:.6}", v),
        }
    }
}

/// Decoded array operand
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element: ElementType,
    /// Type of the count that preceded the elements (ubyte or uint16)
    pub count_type: ElementType,
    pub items: Vec<Number>,
    /// Raw element bytes, kept for byte arrays only
    pub raw: Option<Vec<u8>>,
    /// File offset of the first element byte
    pub data_offset: usize,
}

/// A decoded attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Number),
    Pair([Number; 2]),
    Quad([Number; 4]),
    Array(ArrayValue),
}

impl Value {
    pub fn shape(&self) -> ValueShape {
        match self {
            Value::Scalar(n) => ValueShape::Scalar(n.element_type()),
            Value::Pair(p) => ValueShape::Pair(p[0].element_type()),
            Value::Quad(q) => ValueShape::Quad(q[0].element_type()),
            Value::Array(a) => ValueShape::Array(a.element),
        }
    }

    pub fn scalar(&self) -> Option<Number> {
        match self {
            Value::Scalar(n) => Some(*n),
            _ => None,
        }
    }
}

/// Decode the operand for `shape`; the shape tag itself has already been consumed.
pub fn decode_value(cursor: &mut Cursor, shape: ValueShape) -> Result<Value, Interrupt> {
    let value = match shape {
        ValueShape::Scalar(t) => Value::Scalar(cursor.read_fixed(t)?),
        ValueShape::Pair(t) => Value::Pair([cursor.read_fixed(t)?, cursor.read_fixed(t)?]),
        ValueShape::Quad(t) => Value::Quad([
            cursor.read_fixed(t)?,
            cursor.read_fixed(t)?,
            cursor.read_fixed(t)?,
            cursor.read_fixed(t)?,
        ]),
        ValueShape::Array(t) => Value::Array(decode_array(cursor, t)?),
    };
    trace!("PXL_VALUE: {} at {:#x}", shape, cursor.file_offset());
    Ok(value)
}

fn decode_array(cursor: &mut Cursor, element: ElementType) -> Result<ArrayValue, Interrupt> {
    // A second, independent data-type tag gives the width of the count
    let size_offset = cursor.file_offset();
    let size_tag = cursor.peek_tag()?;
    let count_type = match tag_tables::lookup_data_type(size_tag) {
        Some(ValueShape::Scalar(t @ ElementType::UByte))
        | Some(ValueShape::Scalar(t @ ElementType::UInt16)) => t,
        _ => {
            return Err(DecodeError::ProtocolViolation {
                offset: size_offset,
                code: size_tag as u16,
                context: TagContext::ArraySize,
            }
            .into())
        }
    };
    cursor.read_u8()?;

    let count = cursor.read_fixed(count_type)?.as_u32().unwrap_or(0) as usize;

    let data_offset = cursor.file_offset();
    if element == ElementType::UByte {
        let raw = cursor.read_scanned_bytes(count)?.to_vec();
        let items = raw.iter().map(|b| Number::UByte(*b)).collect();
        return Ok(ArrayValue {
            element,
            count_type,
            items,
            raw: Some(raw),
            data_offset,
        });
    }

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(cursor.read_fixed(element)?);
    }
    Ok(ArrayValue {
        element,
        count_type,
        items,
        raw: None,
        data_offset,
    })
}
