use crate::error::DecodeError;
use crate::tag_tables::UEL;
use crate::value::{ElementType, Number};
use log::trace;

/// Stream byte order, selected by the first byte of the stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// `(`: binary, low byte first
    LittleEndian,
    /// `)`: binary, high byte first
    BigEndian,
}

impl Binding {
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            b'(' => Some(Binding::LittleEndian),
            b')' => Some(Binding::BigEndian),
            _ => None,
        }
    }

    pub fn marker(&self) -> u8 {
        match self {
            Binding::LittleEndian => b'(',
            Binding::BigEndian => b')',
        }
    }
}

/// Why a read did not produce a value
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// The job-end sequence starts at `offset`
    JobEnd { offset: usize },
    Fault(DecodeError),
}

impl From<DecodeError> for Interrupt {
    fn from(error: DecodeError) -> Self {
        Interrupt::Fault(error)
    }
}

/// Read position over one PCL XL stream.
///
/// `data` starts at the stream header; `base` is the number of preamble
/// bytes that preceded it in the file, so `file_offset()` always reports
/// positions in the original input.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    binding: Binding,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], binding: Binding, base: usize) -> Self {
        Cursor {
            data,
            pos: 0,
            base,
            binding,
        }
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// Offset into the stream buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Offset into the original file
    pub fn file_offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// True when the job-end escape sequence starts at the read position
    pub fn at_job_end(&self) -> bool {
        self.data[self.pos..].starts_with(UEL)
    }

    /// Step over the job-end sequence after it has been reported
    pub fn consume_job_end(&mut self) {
        if self.at_job_end() {
            self.pos += UEL.len();
        }
    }

    fn check_job_end(&self) -> Result<(), Interrupt> {
        if self.at_job_end() {
            trace!("PXL_CURSOR: job end at {:#x}", self.file_offset());
            return Err(Interrupt::JobEnd {
                offset: self.file_offset(),
            });
        }
        Ok(())
    }

    /// Stream position of a job-end sequence starting within the next `len` bytes
    fn job_end_within(&self, len: usize) -> Option<usize> {
        let end = self.pos.saturating_add(len).min(self.data.len());
        (self.pos..end).find(|&i| self.data[i..].starts_with(UEL))
    }

    /// Interrupt a read of `len` bytes that would run into a job-end
    /// sequence. The cursor is moved onto the sequence.
    fn stop_at_job_end(&mut self, len: usize) -> Result<(), Interrupt> {
        if let Some(marker) = self.job_end_within(len) {
            self.pos = marker;
            trace!("PXL_CURSOR: job end at {:#x}", self.file_offset());
            return Err(Interrupt::JobEnd {
                offset: self.file_offset(),
            });
        }
        Ok(())
    }

    fn end_of_stream(&self, needed: usize) -> Interrupt {
        Interrupt::Fault(DecodeError::UnexpectedEndOfStream {
            offset: self.file_offset(),
            needed,
        })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], Interrupt> {
        self.stop_at_job_end(N)?;
        if self.remaining() < N {
            return Err(self.end_of_stream(N - self.remaining()));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(bytes)
    }

    /// Look at the next tag byte without consuming it
    pub fn peek_tag(&self) -> Result<u8, Interrupt> {
        self.check_job_end()?;
        match self.data.get(self.pos) {
            Some(byte) => Ok(*byte),
            None => Err(self.end_of_stream(1)),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, Interrupt> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, Interrupt> {
        let bytes = self.take::<2>()?;
        Ok(match self.binding {
            Binding::LittleEndian => u16::from_le_bytes(bytes),
            Binding::BigEndian => u16::from_be_bytes(bytes),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32, Interrupt> {
        let bytes = self.take::<4>()?;
        Ok(match self.binding {
            Binding::LittleEndian => u32::from_le_bytes(bytes),
            Binding::BigEndian => u32::from_be_bytes(bytes),
        })
    }

    /// Read one element of `element_type` in the stream's byte order
    pub fn read_fixed(&mut self, element_type: ElementType) -> Result<Number, Interrupt> {
        Ok(match element_type {
            ElementType::UByte => Number::UByte(self.read_u8()?),
            ElementType::UInt16 => Number::UInt16(self.read_u16()?),
            ElementType::UInt32 => Number::UInt32(self.read_u32()?),
            ElementType::SInt16 => Number::SInt16(self.read_u16()? as i16),
            ElementType::SInt32 => Number::SInt32(self.read_u32()? as i32),
            ElementType::Real32 => Number::Real32(f32::from_bits(self.read_u32()?)),
        })
    }

    /// Raw block of `len` bytes. Block contents are opaque, so no job-end check.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Interrupt> {
        if self.remaining() < len {
            return Err(self.end_of_stream(len - self.remaining()));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Block of `len` bytes that is still part of the operator grammar,
    /// such as byte array elements; stops at a job-end sequence inside it
    pub fn read_scanned_bytes(&mut self, len: usize) -> Result<&'a [u8], Interrupt> {
        self.stop_at_job_end(len)?;
        self.read_bytes(len)
    }

    /// Skip NUL padding; returns how many bytes were skipped
    pub fn skip_null_padding(&mut self) -> usize {
        let start = self.pos;
        while self.data.get(self.pos) == Some(&0x00) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Skip the white space bytes allowed between tags
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        while let Some(byte) = self.data.get(self.pos) {
            match byte {
                0x00 | 0x09..=0x0d | 0x20 => self.pos += 1,
                _ => break,
            }
        }
        self.pos - start
    }
}
