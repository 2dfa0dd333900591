#[cfg(test)]
mod tests {
    use crate::cursor::Binding;
    use crate::disassembler::{disassemble, DecodeSession, Step, Token};
    use crate::error::{DecodeError, TagContext};
    use crate::tag_tables::{PayloadSource, POP_GS, PUSH_GS, UEL, VENDOR_UNIQUE};
    use crate::test_utils::StreamBuilder;
    use crate::value::{Number, Value};

    use test_log::test;

    const MEASURE: u16 = 134;
    const UNITS_PER_MEASURE: u16 = 137;
    const COLOR_SPACE: u16 = 3;
    const FONT_NAME: u16 = 168;
    const VU_DATA_LENGTH: u16 = 146;

    const BEGIN_SESSION: u8 = 0x41;
    const END_SESSION: u8 = 0x42;
    const BEGIN_PAGE: u8 = 0x43;
    const SET_COLOR_SPACE: u8 = 0x6a;
    const READ_IMAGE: u8 = 0xb1;

    fn operators(tokens: &[Token]) -> Vec<(&'static str, usize, i32, Option<u32>)> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Operator(op) => Some((op.name, op.file_offset, op.level, op.position)),
                _ => None,
            })
            .collect()
    }

    fn attributes(tokens: &[Token]) -> Vec<(&'static str, Value)> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Attribute(attr) => Some((attr.name, attr.value.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_operator_offsets_are_attribute_list_starts() {
        let b = StreamBuilder::little_endian();
        let first = b.offset();
        let b = b
            .ubyte(0, MEASURE)
            .uint16_xy(600, 600, UNITS_PER_MEASURE)
            .operator(BEGIN_SESSION);
        let second = b.offset();
        let b = b.operator(BEGIN_PAGE);
        let third = b.offset();
        let data = b
            .ubyte(2, COLOR_SPACE)
            .operator(SET_COLOR_SPACE)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        let ops = operators(&result.tokens);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].1, first);
        assert_eq!(ops[1].1, second);
        assert_eq!(ops[2].1, third);
        assert_eq!(ops[2].3, Some(3));
        assert!(matches!(result.tokens.last(), Some(Token::JobEnd { .. })));
    }

    #[test]
    fn test_offsets_include_preamble() {
        let preamble = b"\x1b%-12345X@PJL ENTER LANGUAGE=PCLXL\r\n";
        let b = StreamBuilder::big_endian().preamble(preamble);
        let start = b.offset();
        let data = b.operator(BEGIN_SESSION).job_end().build();

        // the leading UEL belongs to the preamble, not the stream
        let result = disassemble(&data).unwrap();
        let ops = operators(&result.tokens);
        assert_eq!(ops, vec![("BeginSession", start, 0, Some(1))]);
        assert_eq!(
            result.tokens.last(),
            Some(&Token::JobEnd {
                file_offset: start + 1
            })
        );
    }

    #[test]
    fn test_binding_selects_byte_order() {
        let raw = [0xc2, 0x01, 0x00, 0x00, 0x00, 0xf8, 0x8f];

        let le = StreamBuilder::little_endian()
            .raw(&raw)
            .operator(BEGIN_SESSION)
            .job_end()
            .build();
        let be = StreamBuilder::big_endian()
            .raw(&raw)
            .operator(BEGIN_SESSION)
            .job_end()
            .build();

        let le = disassemble(&le).unwrap();
        let be = disassemble(&be).unwrap();
        assert_eq!(le.header.binding, Binding::LittleEndian);
        assert_eq!(
            attributes(&le.tokens)[0].1,
            Value::Scalar(Number::UInt32(1))
        );
        assert_eq!(
            attributes(&be.tokens)[0].1,
            Value::Scalar(Number::UInt32(16777216))
        );
    }

    #[test]
    fn test_ubyte_array_framing() {
        let b = StreamBuilder::little_endian();
        let array_start = b.offset();
        let data = b
            .raw(&[0xc8, 0xc0, 0x03, 0x0a, 0x0b, 0x0c, 0xf8, 0xa8])
            .operator(0x6f)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        match &result.tokens[0] {
            Token::Attribute(attr) => {
                assert_eq!(attr.name, "FontName");
                assert_eq!(attr.file_offset, array_start);
                match &attr.value {
                    Value::Array(array) => {
                        assert_eq!(
                            array.items,
                            vec![Number::UByte(10), Number::UByte(11), Number::UByte(12)]
                        );
                        // shape tag, size tag, count
                        assert_eq!(array.data_offset, array_start + 3);
                    }
                    other => panic!("expected array, got {:?}", other),
                }
            }
            other => panic!("expected attribute, got {:?}", other),
        }
        // SetFont starts right after the attribute id
        let ops = operators(&result.tokens);
        assert_eq!(ops[0].0, "SetFont");
    }

    #[test]
    fn test_text_array_and_uint16_array() {
        let data = StreamBuilder::big_endian()
            .ubyte_array(b"Courier", FONT_NAME)
            .uint16_array(&[1, 300], 172)
            .operator(0x6f)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        let attrs = attributes(&result.tokens);
        assert_eq!(attrs.len(), 2);
        match &attrs[1].1 {
            Value::Array(array) => {
                assert_eq!(array.items, vec![Number::UInt16(1), Number::UInt16(300)]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_vendor_payload_uses_data_length() {
        let data = StreamBuilder::little_endian()
            .uint32(4, VU_DATA_LENGTH)
            .operator(VENDOR_UNIQUE)
            .raw(&[0xde, 0xad, 0xbe, 0xef])
            .operator(END_SESSION)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        let payload = result
            .tokens
            .iter()
            .find_map(|t| match t {
                Token::Payload(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(payload.source, PayloadSource::VendorLength);
        assert_eq!(payload.bytes, vec![0xde, 0xad, 0xbe, 0xef]);

        let names: Vec<_> = operators(&result.tokens).iter().map(|o| o.0).collect();
        assert_eq!(names, vec!["VendorUnique", "EndSession"]);
    }

    #[test]
    fn test_vendor_payload_requires_data_length() {
        let b = StreamBuilder::little_endian();
        let op_offset = b.offset();
        let data = b
            .operator(VENDOR_UNIQUE)
            .raw(&[1, 2, 3, 4])
            .job_end()
            .build();

        let failure = disassemble(&data).err().unwrap();
        assert_eq!(
            failure.error,
            DecodeError::MissingRequiredAttribute {
                offset: op_offset,
                operator: "VendorUnique",
                attribute: "VUDataLength",
            }
        );
        // the operator token was emitted before the payload failed
        assert_eq!(operators(&failure.tokens).len(), 1);
    }

    #[test]
    fn test_data_length_does_not_carry_to_later_lists() {
        let data = StreamBuilder::little_endian()
            .uint32(4, VU_DATA_LENGTH)
            .operator(BEGIN_SESSION)
            .operator(VENDOR_UNIQUE)
            .raw(&[1, 2, 3, 4])
            .job_end()
            .build();

        let failure = disassemble(&data).err().unwrap();
        assert!(matches!(
            failure.error,
            DecodeError::MissingRequiredAttribute { .. }
        ));
    }

    #[test]
    fn test_data_length_must_be_uint32() {
        let b = StreamBuilder::little_endian();
        let value_offset = b.offset();
        let data = b
            .uint16(4, VU_DATA_LENGTH)
            .operator(VENDOR_UNIQUE)
            .raw(&[1, 2, 3, 4])
            .job_end()
            .build();

        let failure = disassemble(&data).err().unwrap();
        assert_eq!(
            failure.error,
            DecodeError::TypeMismatch {
                offset: value_offset,
                attribute: "VUDataLength",
                expected: "uint32",
                found: "uint16".to_string(),
            }
        );
    }

    #[test]
    fn test_job_end_inside_attribute_list() {
        // a second attribute whose uint16 value is cut off by the UEL
        let b = StreamBuilder::big_endian().ubyte(0, MEASURE).raw(&[0xc1]);
        let uel_offset = b.offset();
        let data = b.job_end().build();

        let mut session = DecodeSession::open(&data).unwrap();
        let step = session.step().unwrap();
        assert_eq!(
            step,
            Step::TerminatedByMarker(Token::JobEnd {
                file_offset: uel_offset
            })
        );
        assert_eq!(attributes(session.partial_tokens()).len(), 1);

        let result = disassemble(&data).unwrap();
        assert!(operators(&result.tokens).is_empty());
        assert_eq!(attributes(&result.tokens).len(), 1);
    }

    #[test]
    fn test_job_end_before_attribute_id() {
        let data = StreamBuilder::little_endian()
            .raw(&[0xc0, 0x05])
            .job_end()
            .build();

        let mut session = DecodeSession::open(&data).unwrap();
        assert!(matches!(
            session.step(),
            Ok(Step::TerminatedByMarker(Token::JobEnd { .. }))
        ));
        assert!(session.is_finished());
    }

    #[test]
    fn test_job_end_inside_attribute_value() {
        // uint16 value with one byte present; the UEL starts at the second
        let b = StreamBuilder::little_endian()
            .ubyte(0, MEASURE)
            .raw(&[0xc1, 0x05]);
        let uel_offset = b.offset();
        let data = b.job_end().build();

        let mut session = DecodeSession::open(&data).unwrap();
        assert_eq!(
            session.step().unwrap(),
            Step::TerminatedByMarker(Token::JobEnd {
                file_offset: uel_offset
            })
        );
        assert_eq!(session.file_offset(), data.len());

        let result = disassemble(&data).unwrap();
        assert_eq!(attributes(&result.tokens).len(), 1);
        assert_eq!(
            result.tokens.last(),
            Some(&Token::JobEnd {
                file_offset: uel_offset
            })
        );
    }

    #[test]
    fn test_job_end_inside_byte_array() {
        // ubyte array announcing ten elements, UEL after the count
        let b = StreamBuilder::big_endian().raw(&[0xc8, 0xc0, 0x0a]);
        let uel_offset = b.offset();
        let data = b.job_end().build();

        let mut session = DecodeSession::open(&data).unwrap();
        assert_eq!(
            session.step().unwrap(),
            Step::TerminatedByMarker(Token::JobEnd {
                file_offset: uel_offset
            })
        );

        // marker part way through the element bytes
        let b = StreamBuilder::big_endian().raw(&[0xc8, 0xc0, 0x04, b'A', b'B']);
        let uel_offset = b.offset();
        let result = disassemble(&b.job_end().build()).unwrap();
        assert_eq!(
            result.tokens,
            vec![Token::JobEnd {
                file_offset: uel_offset
            }]
        );
    }

    #[test]
    fn test_terminal_outcome_repeats() {
        let data = StreamBuilder::little_endian()
            .operator(BEGIN_SESSION)
            .job_end()
            .build();

        let mut session = DecodeSession::open(&data).unwrap();
        assert!(matches!(session.step(), Ok(Step::MoreTokens(_))));
        let end = session.step().unwrap();
        assert!(matches!(end, Step::TerminatedByMarker(_)));
        assert_eq!(session.step().unwrap(), end);
        assert_eq!(session.step().unwrap(), end);
    }

    #[test]
    fn test_push_pop_levels() {
        let data = StreamBuilder::little_endian()
            .operator(PUSH_GS)
            .operator(PUSH_GS)
            .operator(SET_COLOR_SPACE)
            .operator(POP_GS)
            .operator(POP_GS)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        let levels: Vec<_> = operators(&result.tokens)
            .iter()
            .map(|o| (o.0, o.2))
            .collect();
        assert_eq!(
            levels,
            vec![
                ("PushGS", 0),
                ("PushGS", 1),
                ("SetColorSpace", 2),
                ("PopGS", 1),
                ("PopGS", 0),
            ]
        );
    }

    #[test]
    fn test_unbalanced_pop_goes_negative() {
        let data = StreamBuilder::little_endian()
            .operator(POP_GS)
            .job_end()
            .build();
        let mut session = DecodeSession::open(&data).unwrap();
        session.step().unwrap();
        assert_eq!(session.level(), -1);
    }

    #[test]
    fn test_unknown_operator() {
        let b = StreamBuilder::little_endian().operator(BEGIN_SESSION);
        let bad = b.offset();
        let data = b.operator(0x4a).operator(END_SESSION).job_end().build();

        let mut session = DecodeSession::open(&data).unwrap();
        assert!(matches!(session.step(), Ok(Step::MoreTokens(_))));
        let error = session.step().unwrap_err();
        assert_eq!(
            error,
            DecodeError::ProtocolViolation {
                offset: bad,
                code: 0x4a,
                context: TagContext::Operator,
            }
        );
        // still on the unresolved byte
        assert_eq!(session.file_offset(), bad);
        assert_eq!(session.step().unwrap_err(), error);
        assert_eq!(session.operator_count(), 1);
    }

    #[test]
    fn test_unknown_attribute_number() {
        let b = StreamBuilder::big_endian().raw(&[0xc0, 0x01, 0xf8]);
        let code_offset = b.offset();
        let data = b.raw(&[0xfe]).operator(BEGIN_SESSION).job_end().build();

        let failure = disassemble(&data).err().unwrap();
        assert_eq!(
            failure.error,
            DecodeError::ProtocolViolation {
                offset: code_offset,
                code: 0xfe,
                context: TagContext::AttributeCode,
            }
        );
        assert_eq!(*failure.context.last().unwrap(), 0xfe);
    }

    #[test]
    fn test_uint16_attribute_id() {
        let data = StreamBuilder::big_endian()
            .raw(&[0xc0, 0x00, 0xf9, 0x00, 0x86])
            .operator(BEGIN_SESSION)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        match &result.tokens[0] {
            Token::Attribute(attr) => {
                assert_eq!(attr.code, MEASURE);
                assert_eq!(attr.enum_label, Some("eInch"));
            }
            other => panic!("expected attribute, got {:?}", other),
        }
    }

    #[test]
    fn test_value_without_attribute_id() {
        let b = StreamBuilder::little_endian().raw(&[0xc0, 0x01]);
        let bad = b.offset();
        let data = b.operator(BEGIN_SESSION).job_end().build();

        let failure = disassemble(&data).err().unwrap();
        assert_eq!(
            failure.error,
            DecodeError::ProtocolViolation {
                offset: bad,
                code: BEGIN_SESSION as u16,
                context: TagContext::AttributeId,
            }
        );
    }

    #[test]
    fn test_embedded_data_is_not_counted() {
        let data = StreamBuilder::little_endian()
            .operator(READ_IMAGE)
            .embedded_data(&[1, 2, 3])
            .raw(&[0x00, 0x00])
            .operator(READ_IMAGE)
            .embedded_data_byte(&[4, 5])
            .operator(END_SESSION)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        let positions: Vec<_> = operators(&result.tokens)
            .iter()
            .map(|o| (o.0, o.3))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("ReadImage", Some(1)),
                ("embedded_data", None),
                ("ReadImage", Some(2)),
                ("embedded_data_byte", None),
                ("EndSession", Some(3)),
            ]
        );

        let payloads: Vec<_> = result
            .tokens
            .iter()
            .filter_map(|t| match t {
                Token::Payload(p) => Some((p.bytes.clone(), p.padding)),
                _ => None,
            })
            .collect();
        assert_eq!(payloads, vec![(vec![1, 2, 3], 2), (vec![4, 5], 0)]);
    }

    #[test]
    fn test_payload_bytes_are_not_scanned_for_job_end() {
        let data = StreamBuilder::little_endian()
            .embedded_data(UEL)
            .operator(END_SESSION)
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        assert_eq!(operators(&result.tokens).len(), 2);
    }

    #[test]
    fn test_whitespace_between_tags() {
        let data = StreamBuilder::little_endian()
            .raw(&[0xc0, 0x00, b' ', 0xf8, 0x86, b'\r', b'\n'])
            .operator(BEGIN_SESSION)
            .raw(b"\n")
            .job_end()
            .build();

        let result = disassemble(&data).unwrap();
        assert_eq!(attributes(&result.tokens).len(), 1);
        assert_eq!(operators(&result.tokens).len(), 1);
    }

    #[test]
    fn test_end_of_stream_at_boundary() {
        let b = StreamBuilder::little_endian().operator(BEGIN_SESSION);
        let end = b.offset();
        let data = b.build();

        let mut session = DecodeSession::open(&data).unwrap();
        assert!(matches!(session.step(), Ok(Step::MoreTokens(_))));
        assert_eq!(
            session.step().unwrap(),
            Step::UnexpectedEndOfStream {
                offset: end,
                needed: 1,
                at_boundary: true,
            }
        );

        // unmarked end of data is still a failure
        let failure = disassemble(&data).err().unwrap();
        assert!(matches!(
            failure.error,
            DecodeError::UnexpectedEndOfStream { .. }
        ));
        assert_eq!(operators(&failure.tokens).len(), 1);
    }

    #[test]
    fn test_end_of_stream_inside_value() {
        let data = StreamBuilder::big_endian().raw(&[0xc2, 0x00, 0x01]).build();

        let mut session = DecodeSession::open(&data).unwrap();
        match session.step().unwrap() {
            Step::UnexpectedEndOfStream {
                needed,
                at_boundary,
                ..
            } => {
                assert_eq!(needed, 2);
                assert!(!at_boundary);
            }
            other => panic!("expected end of stream, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_header() {
        let failure = disassemble(b"@PJL ENTER LANGUAGE=PCL\r\n").err().unwrap();
        assert_eq!(failure.error, DecodeError::MissingStreamHeader);
    }

    mod properties {
        use super::{
            attributes, operators, BEGIN_PAGE, BEGIN_SESSION, FONT_NAME, READ_IMAGE,
            SET_COLOR_SPACE, UNITS_PER_MEASURE,
        };
        use crate::disassembler::{disassemble, DecodeSession, Step};
        use crate::tag_tables::{POP_GS, PUSH_GS};
        use crate::test_utils::StreamBuilder;
        use crate::value::{Number, Value};
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Sequence {
            Bare,
            Scalar(u16),
            Pair(u16, u16),
            Text(Vec<u8>),
            Data(Vec<u8>),
        }

        fn sequence() -> impl Strategy<Value = Sequence> {
            prop_oneof![
                Just(Sequence::Bare),
                any::<u16>().prop_map(Sequence::Scalar),
                (any::<u16>(), any::<u16>()).prop_map(|(x, y)| Sequence::Pair(x, y)),
                proptest::collection::vec(0x41u8..0x5a, 1..40).prop_map(Sequence::Text),
                proptest::collection::vec(1u8..=255, 0..300).prop_map(Sequence::Data),
            ]
        }

        fn append(b: StreamBuilder, seq: &Sequence) -> StreamBuilder {
            match seq {
                Sequence::Bare => b.operator(BEGIN_PAGE),
                Sequence::Scalar(v) => b.uint16(*v, 99).operator(0xb0),
                Sequence::Pair(x, y) => b.uint16_xy(*x, *y, UNITS_PER_MEASURE).operator(0x6b),
                Sequence::Text(t) => b.ubyte_array(t, FONT_NAME).operator(0x6f),
                Sequence::Data(d) => b.operator(READ_IMAGE).embedded_data(d),
            }
        }

        proptest! {
            #[test]
            fn counted_operators_start_where_their_bytes_start(
                seqs in proptest::collection::vec(sequence(), 1..20),
                little in any::<bool>(),
            ) {
                let mut b = if little {
                    StreamBuilder::little_endian()
                } else {
                    StreamBuilder::big_endian()
                };
                let mut expected = Vec::new();
                for seq in &seqs {
                    expected.push(b.offset());
                    b = append(b, seq);
                }
                let data = b.job_end().build();

                let result = disassemble(&data).unwrap();
                let offsets: Vec<usize> = operators(&result.tokens)
                    .iter()
                    .filter(|o| o.3.is_some())
                    .map(|o| o.1)
                    .collect();
                prop_assert_eq!(offsets, expected);
            }

            #[test]
            fn uint32_values_follow_binding(value in any::<u32>()) {
                let bytes = value.to_le_bytes();
                let raw = [0xc2, bytes[0], bytes[1], bytes[2], bytes[3], 0xf8, 0x8f];

                let le = StreamBuilder::little_endian().raw(&raw).operator(BEGIN_SESSION).job_end().build();
                let be = StreamBuilder::big_endian().raw(&raw).operator(BEGIN_SESSION).job_end().build();

                let le = disassemble(&le).unwrap();
                let be = disassemble(&be).unwrap();
                prop_assert_eq!(&attributes(&le.tokens)[0].1, &Value::Scalar(Number::UInt32(value)));
                prop_assert_eq!(
                    &attributes(&be.tokens)[0].1,
                    &Value::Scalar(Number::UInt32(value.swap_bytes()))
                );
            }

            #[test]
            fn ubyte_values_ignore_binding(value in any::<u8>()) {
                let raw = [0xc0, value, 0xf8, 0x8f];
                let le = StreamBuilder::little_endian().raw(&raw).operator(BEGIN_SESSION).job_end().build();
                let be = StreamBuilder::big_endian().raw(&raw).operator(BEGIN_SESSION).job_end().build();
                prop_assert_eq!(
                    attributes(&disassemble(&le).unwrap().tokens),
                    attributes(&disassemble(&be).unwrap().tokens)
                );
            }

            #[test]
            fn balanced_push_pop_returns_to_start(depths in proptest::collection::vec(1usize..6, 1..8)) {
                let mut b = StreamBuilder::little_endian();
                for depth in &depths {
                    for _ in 0..*depth {
                        b = b.operator(PUSH_GS);
                    }
                    b = b.operator(SET_COLOR_SPACE);
                    for _ in 0..*depth {
                        b = b.operator(POP_GS);
                    }
                }
                let data = b.job_end().build();

                let mut session = DecodeSession::open(&data).unwrap();
                let mut stack = Vec::new();
                loop {
                    match session.step().unwrap() {
                        Step::MoreTokens(tokens) => {
                            for (name, _, level, _) in operators(&tokens) {
                                match name {
                                    "PushGS" => stack.push(level),
                                    "PopGS" => prop_assert_eq!(Some(level), stack.pop()),
                                    _ => {}
                                }
                            }
                        }
                        Step::TerminatedByMarker(_) => break,
                        other => panic!("unexpected step {:?}", other),
                    }
                }
                prop_assert!(stack.is_empty());
                prop_assert_eq!(session.level(), 0);
            }
        }
    }
}
