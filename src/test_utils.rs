// Builder for synthetic PCL XL streams used by the unit tests
use crate::cursor::Binding;
use crate::tag_tables::{ATTR_UBYTE, ATTR_UINT16, EMBEDDED_DATA, EMBEDDED_DATA_BYTE, UEL};

pub struct StreamBuilder {
    binding: Binding,
    preamble: Vec<u8>,
    header: Vec<u8>,
    body: Vec<u8>,
}

impl StreamBuilder {
    pub fn new(binding: Binding) -> Self {
        let mut header = vec![binding.marker()];
        header.extend_from_slice(b" HP-PCL XL;2;0;Comment test stream\r\n");
        Self {
            binding,
            preamble: Vec::new(),
            header,
            body: Vec::new(),
        }
    }

    pub fn big_endian() -> Self {
        Self::new(Binding::BigEndian)
    }

    pub fn little_endian() -> Self {
        Self::new(Binding::LittleEndian)
    }

    pub fn preamble(mut self, bytes: &[u8]) -> Self {
        self.preamble.extend_from_slice(bytes);
        self
    }

    /// Offset the next body byte will have in the built file
    pub fn offset(&self) -> usize {
        self.preamble.len() + self.header.len() + self.body.len()
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    fn push_u16(&mut self, v: u16) {
        match self.binding {
            Binding::LittleEndian => self.body.extend_from_slice(&v.to_le_bytes()),
            Binding::BigEndian => self.body.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn push_u32(&mut self, v: u32) {
        match self.binding {
            Binding::LittleEndian => self.body.extend_from_slice(&v.to_le_bytes()),
            Binding::BigEndian => self.body.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub fn attribute_id(mut self, code: u16) -> Self {
        if code < 0x100 {
            self.body.push(ATTR_UBYTE);
            self.body.push(code as u8);
        } else {
            self.body.push(ATTR_UINT16);
            self.push_u16(code);
        }
        self
    }

    pub fn ubyte(mut self, v: u8, attr: u16) -> Self {
        self.body.extend_from_slice(&[0xc0, v]);
        self.attribute_id(attr)
    }

    pub fn uint16(mut self, v: u16, attr: u16) -> Self {
        self.body.push(0xc1);
        self.push_u16(v);
        self.attribute_id(attr)
    }

    pub fn uint32(mut self, v: u32, attr: u16) -> Self {
        self.body.push(0xc2);
        self.push_u32(v);
        self.attribute_id(attr)
    }

    pub fn sint16(mut self, v: i16, attr: u16) -> Self {
        self.body.push(0xc3);
        self.push_u16(v as u16);
        self.attribute_id(attr)
    }

    pub fn real32(mut self, v: f32, attr: u16) -> Self {
        self.body.push(0xc5);
        self.push_u32(v.to_bits());
        self.attribute_id(attr)
    }

    pub fn uint16_xy(mut self, x: u16, y: u16, attr: u16) -> Self {
        self.body.push(0xd1);
        self.push_u16(x);
        self.push_u16(y);
        self.attribute_id(attr)
    }

    pub fn sint16_box(mut self, b: [i16; 4], attr: u16) -> Self {
        self.body.push(0xe3);
        for v in b {
            self.push_u16(v as u16);
        }
        self.attribute_id(attr)
    }

    pub fn ubyte_array(mut self, bytes: &[u8], attr: u16) -> Self {
        self.body.push(0xc8);
        if bytes.len() < 0x100 {
            self.body.extend_from_slice(&[0xc0, bytes.len() as u8]);
        } else {
            self.body.push(0xc1);
            self.push_u16(bytes.len() as u16);
        }
        self.body.extend_from_slice(bytes);
        self.attribute_id(attr)
    }

    pub fn uint16_array(mut self, items: &[u16], attr: u16) -> Self {
        self.body.extend_from_slice(&[0xc9, 0xc0, items.len() as u8]);
        for v in items {
            self.push_u16(*v);
        }
        self.attribute_id(attr)
    }

    pub fn operator(mut self, tag: u8) -> Self {
        self.body.push(tag);
        self
    }

    pub fn embedded_data(mut self, data: &[u8]) -> Self {
        self.body.push(EMBEDDED_DATA);
        self.push_u32(data.len() as u32);
        self.body.extend_from_slice(data);
        self
    }

    pub fn embedded_data_byte(mut self, data: &[u8]) -> Self {
        self.body.push(EMBEDDED_DATA_BYTE);
        self.body.push(data.len() as u8);
        self.body.extend_from_slice(data);
        self
    }

    pub fn job_end(mut self) -> Self {
        self.body.extend_from_slice(UEL);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = self.preamble;
        data.extend_from_slice(&self.header);
        data.extend_from_slice(&self.body);
        data
    }
}
