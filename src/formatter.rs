use std::fmt::Write as _;
use std::io::{self, Write};

use crate::attribute::Attribute;
use crate::config::OutputOptions;
use crate::disassembler::{Operator, Token};
use crate::header::StreamHeader;
use crate::payload::Payload;
use crate::tag_tables;
use crate::value::{ArrayValue, ElementType, Number, Value};

/// Text written for the job-end marker
pub const JOB_END_TEXT: &str = "string* \\x1B%-12345X";

/// Renders decoded tokens as a PCL XL ASCII style listing
pub struct Listing {
    options: OutputOptions,
}

impl Listing {
    pub fn new(options: OutputOptions) -> Self {
        Listing { options }
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    pub fn render_header(&self, header: &StreamHeader) -> String {
        format!("{}\n", header)
    }

    /// Render the tokens of one driver step.
    ///
    /// Attributes are held back until their operator arrives; attributes
    /// left over at the end (a truncated step) are flushed on their own line.
    pub fn render_step(&self, tokens: &[Token]) -> String {
        let mut output = String::new();
        let mut pending: Vec<&Attribute> = Vec::new();
        let mut level = 0;

        for token in tokens {
            match token {
                Token::Attribute(attr) => pending.push(attr),
                Token::Operator(op) => {
                    level = op.level;
                    output.push_str(&self.render_operator(op, &pending));
                    pending.clear();
                }
                Token::Payload(payload) => {
                    output.push_str(&self.render_payload(payload, level));
                }
                Token::JobEnd { .. } => {
                    if !pending.is_empty() {
                        output.push_str(&self.render_attribute_line(&pending, level));
                        pending.clear();
                    }
                    let _ = writeln!(output, "{}", JOB_END_TEXT);
                }
            }
        }

        if !pending.is_empty() {
            output.push_str(&self.render_attribute_line(&pending, level));
        }
        output
    }

    fn indent(&self, level: i32) -> String {
        " ".repeat(level.max(0) as usize * self.options.indent_width)
    }

    fn render_operator(&self, op: &Operator, attributes: &[&Attribute]) -> String {
        let mut output = String::new();
        let indent = self.indent(op.level);

        let _ = write!(output, "\n{}//", indent);
        match op.position {
            Some(position) => {
                let _ = write!(output, " Operator Position: {}", position);
            }
            None => output.push_str(" Data Block"),
        }
        if self.options.show_offsets {
            let _ = write!(
                output,
                " File Offset: {} ({:#x})",
                op.file_offset, op.file_offset
            );
        }
        let _ = writeln!(output, " Tag: 0x{:02x} Level: {}", op.tag, op.level);

        output.push_str(&indent);
        for attr in attributes {
            let _ = write!(output, "{} ", self.render_attribute(attr));
        }
        let _ = writeln!(output, "{}", op.name);

        for attr in attributes {
            if let Some(dump) = self.binary_array_dump(attr, op.level) {
                output.push_str(&dump);
            }
        }
        output
    }

    fn render_attribute_line(&self, attributes: &[&Attribute], level: i32) -> String {
        let rendered: Vec<String> = attributes
            .iter()
            .map(|attr| self.render_attribute(attr))
            .collect();
        format!("{}{}\n", self.indent(level), rendered.join(" "))
    }

    /// `<type> <value> <name>`, the ASCII form of one attribute
    pub fn render_attribute(&self, attr: &Attribute) -> String {
        let shape = attr.value.shape();
        let value = match (&attr.value, attr.enum_label) {
            (Value::Scalar(_), Some(label)) if self.options.enum_labels => label.to_string(),
            (Value::Scalar(n), _) => n.to_string(),
            (Value::Pair(p), _) => join_numbers(p),
            (Value::Quad(q), _) => join_numbers(q),
            (Value::Array(array), _) => self.render_array(array),
        };
        format!("{} {} {}", shape, value, attr.name)
    }

    fn render_array(&self, array: &ArrayValue) -> String {
        if let Some(raw) = &array.raw {
            if self.options.text_arrays && is_text(raw) {
                return format!("\"{}\"", String::from_utf8_lossy(raw));
            }
            if self.options.dump_hex && !raw.is_empty() {
                return format!("[ {} bytes ]", raw.len());
            }
        }
        if array.items.is_empty() {
            return "[ ]".to_string();
        }
        format!("[ {} ]", join_numbers(&array.items))
    }

    fn binary_array_dump(&self, attr: &Attribute, level: i32) -> Option<String> {
        let (raw, data_offset) = match &attr.value {
            Value::Array(ArrayValue {
                element: ElementType::UByte,
                raw: Some(raw),
                data_offset,
                ..
            }) if !raw.is_empty() => (raw.as_slice(), *data_offset),
            _ => return None,
        };
        if !self.options.dump_hex || (self.options.text_arrays && is_text(raw)) {
            return None;
        }
        Some(self.hex_dump(raw, data_offset, level))
    }

    fn render_payload(&self, payload: &Payload, level: i32) -> String {
        if self.options.dump_hex && !payload.is_empty() {
            return self.hex_dump(&payload.bytes, payload.file_offset, level);
        }
        let mut output = format!("{}// {} bytes of data", self.indent(level), payload.len());
        if self.options.show_offsets {
            let _ = write!(output, " at {:#x}", payload.file_offset);
        }
        output.push('\n');
        output
    }

    /// Offset-addressed hex and ASCII rows, `dump_width` bytes per row
    pub fn hex_dump(&self, bytes: &[u8], file_offset: usize, level: i32) -> String {
        let mut output = String::new();
        let indent = self.indent(level);
        let width = self.options.dump_width.max(1);
        let shown = match self.options.max_dump_bytes {
            Some(max) => bytes.len().min(max),
            None => bytes.len(),
        };

        for (row, chunk) in bytes[..shown].chunks(width).enumerate() {
            let _ = write!(output, "{}{:08x}: ", indent, file_offset + row * width);
            for i in 0..width {
                match chunk.get(i) {
                    Some(b) => {
                        let _ = write!(output, "{:02x} ", b);
                    }
                    None => output.push_str("   "),
                }
            }
            output.push('|');
            for b in chunk {
                output.push(if is_printable(*b) { *b as char } else { '.' });
            }
            output.push_str("|\n");
        }

        if shown < bytes.len() {
            let _ = writeln!(output, "{}... {} more bytes", indent, bytes.len() - shown);
        }
        output
    }
}

impl Default for Listing {
    fn default() -> Self {
        Listing::new(OutputOptions::default())
    }
}

fn join_numbers(numbers: &[Number]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_printable(b: u8) -> bool {
    (0x20..0x7f).contains(&b)
}

fn is_text(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(|b| is_printable(*b) && *b != b'"')
}

/// Listing of every operator, attribute and enumeration the decoder knows
pub fn render_tables() -> String {
    let mut output = String::new();

    let _ = writeln!(output, "// Operators");
    for op in tag_tables::operators() {
        let _ = write!(output, "0x{:02x} {}", op.tag, op.name);
        if !op.counted {
            output.push_str(" (data block)");
        }
        output.push('\n');
    }

    let _ = writeln!(output, "\n// Attributes");
    for (code, name) in tag_tables::attributes() {
        let _ = write!(output, "{:3} {}", code, name);
        if let Some(labels) = tag_tables::enum_labels(name) {
            output.push(':');
            for (value, label) in labels {
                let _ = write!(output, " {}={}", label, value);
            }
        }
        output.push('\n');
    }
    output
}

/// Failure to deliver output to the sink
#[derive(Debug)]
pub enum SinkError {
    /// The reader went away; stop writing without reporting an error
    Closed,
    Io(io::Error),
}

impl From<io::Error> for SinkError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::BrokenPipe => SinkError::Closed,
            _ => SinkError::Io(error),
        }
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SinkError::Closed => write!(f, "Output closed by reader"),
            SinkError::Io(e) => write!(f, "Write failed: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

pub fn write_output<W: Write>(out: &mut W, text: &str) -> Result<(), SinkError> {
    out.write_all(text.as_bytes())?;
    Ok(())
}
