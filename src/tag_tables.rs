use crate::value::{ElementType, ValueShape};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Universal Exit Language sequence that ends the job
pub const UEL: &[u8] = b"\x1b%-12345X";

/// Attribute id follows as one byte
pub const ATTR_UBYTE: u8 = 0xf8;
/// Attribute id follows as a uint16 in stream byte order
pub const ATTR_UINT16: u8 = 0xf9;
/// Data block with a uint32 length prefix
pub const EMBEDDED_DATA: u8 = 0xfa;
/// Data block with a ubyte length prefix
pub const EMBEDDED_DATA_BYTE: u8 = 0xfb;

pub const POP_GS: u8 = 0x60;
pub const PUSH_GS: u8 = 0x61;
pub const VENDOR_UNIQUE: u8 = 0x46;

/// Attribute whose value sizes the VendorUnique data block
pub const VENDOR_LENGTH_ATTRIBUTE: &str = "VUDataLength";

/// Where a payload-bearing operator finds its data length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// uint32 immediately before the data
    InlineUInt32,
    /// ubyte immediately before the data
    InlineUByte,
    /// Cached `VUDataLength` attribute of the same attribute list
    VendorLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDef {
    pub tag: u8,
    pub name: &'static str,
    /// Payload read immediately after the tag, if any
    pub payload: Option<PayloadSource>,
    /// Pseudo-operators (embedded data) do not advance the operator position
    pub counted: bool,
}

const OPERATORS: &[(u8, &str)] = &[
    (0x41, "BeginSession"),
    (0x42, "EndSession"),
    (0x43, "BeginPage"),
    (0x44, "EndPage"),
    (0x46, "VendorUnique"),
    (0x47, "Comment"),
    (0x48, "OpenDataSource"),
    (0x49, "CloseDataSource"),
    (0x4f, "BeginFontHeader"),
    (0x50, "ReadFontHeader"),
    (0x51, "EndFontHeader"),
    (0x52, "BeginChar"),
    (0x53, "ReadChar"),
    (0x54, "EndChar"),
    (0x55, "RemoveFont"),
    (0x56, "SetCharAttributes"),
    (0x5b, "BeginStream"),
    (0x5c, "ReadStream"),
    (0x5d, "EndStream"),
    (0x5e, "ExecStream"),
    (0x5f, "RemoveStream"),
    (0x60, "PopGS"),
    (0x61, "PushGS"),
    (0x62, "SetClipReplace"),
    (0x63, "SetBrushSource"),
    (0x64, "SetCharAngle"),
    (0x65, "SetCharScale"),
    (0x66, "SetCharShear"),
    (0x67, "SetClipIntersect"),
    (0x68, "SetClipRectangle"),
    (0x69, "SetClipToPage"),
    (0x6a, "SetColorSpace"),
    (0x6b, "SetCursor"),
    (0x6c, "SetCursorRel"),
    (0x6d, "SetHalftoneMethod"),
    (0x6e, "SetFillMode"),
    (0x6f, "SetFont"),
    (0x70, "SetLineDash"),
    (0x71, "SetLineCap"),
    (0x72, "SetLineJoin"),
    (0x73, "SetMiterLimit"),
    (0x74, "SetPageDefaultCTM"),
    (0x75, "SetPageOrigin"),
    (0x76, "SetPageRotation"),
    (0x77, "SetPageScale"),
    (0x78, "SetPaintTxMode"),
    (0x79, "SetPenSource"),
    (0x7a, "SetPenWidth"),
    (0x7b, "SetROP"),
    (0x7c, "SetSourceTxMode"),
    (0x7d, "SetCharBoldValue"),
    (0x7f, "SetClipMode"),
    (0x80, "SetPathToClip"),
    (0x81, "SetCharSubMode"),
    (0x84, "CloseSubPath"),
    (0x85, "NewPath"),
    (0x86, "PaintPath"),
    (0x91, "ArcPath"),
    (0x93, "BezierPath"),
    (0x95, "BezierRelPath"),
    (0x96, "Chord"),
    (0x97, "ChordPath"),
    (0x98, "Ellipse"),
    (0x99, "EllipsePath"),
    (0x9b, "LinePath"),
    (0x9d, "LineRelPath"),
    (0x9e, "Pie"),
    (0x9f, "PiePath"),
    (0xa0, "Rectangle"),
    (0xa1, "RectanglePath"),
    (0xa2, "RoundRectangle"),
    (0xa3, "RoundRectanglePath"),
    (0xa8, "Text"),
    (0xa9, "TextPath"),
    (0xb0, "BeginImage"),
    (0xb1, "ReadImage"),
    (0xb2, "EndImage"),
    (0xb3, "BeginRastPattern"),
    (0xb4, "ReadRastPattern"),
    (0xb5, "EndRastPattern"),
    (0xb6, "BeginScan"),
    (0xb8, "EndScan"),
    (0xb9, "ScanLineRel"),
    (0xbf, "PassThrough"),
];

// Attribute numbers, see the PCL XL attribute appendix
const ATTRIBUTES: &[(u16, &str)] = &[
    (2, "PaletteDepth"),
    (3, "ColorSpace"),
    (4, "NullBrush"),
    (5, "NullPen"),
    (6, "PaletteData"),
    (8, "PatternSelectID"),
    (9, "GrayLevel"),
    (11, "RGBColor"),
    (12, "PatternOrigin"),
    (13, "NewDestinationSize"),
    (14, "PrimaryArray"),
    (15, "PrimaryDepth"),
    (17, "ColorimetricColorSpace"),
    (18, "XYChromaticities"),
    (19, "WhiteReferencePoint"),
    (20, "CRGBMinMax"),
    (21, "GammaGain"),
    (33, "DeviceMatrix"),
    (34, "DitherMatrixDataType"),
    (35, "DitherOrigin"),
    (36, "MediaDestination"),
    (37, "MediaSize"),
    (38, "MediaSource"),
    (39, "MediaType"),
    (40, "Orientation"),
    (41, "PageAngle"),
    (42, "PageOrigin"),
    (43, "PageScale"),
    (44, "ROP3"),
    (45, "TxMode"),
    (47, "CustomMediaSize"),
    (48, "CustomMediaSizeUnits"),
    (49, "PageCopies"),
    (50, "DitherMatrixSize"),
    (51, "DitherMatrixDepth"),
    (52, "SimplexPageMode"),
    (53, "DuplexPageMode"),
    (54, "DuplexPageSide"),
    (65, "ArcDirection"),
    (66, "BoundingBox"),
    (67, "DashOffset"),
    (68, "EllipseDimension"),
    (69, "EndPoint"),
    (70, "FillMode"),
    (71, "LineCapStyle"),
    (72, "LineJoinStyle"),
    (73, "MiterLength"),
    (74, "LineDashStyle"),
    (75, "PenWidth"),
    (76, "Point"),
    (77, "NumberOfPoints"),
    (78, "SolidLine"),
    (79, "StartPoint"),
    (80, "PointType"),
    (81, "ControlPoint1"),
    (82, "ControlPoint2"),
    (83, "ClipRegion"),
    (84, "ClipMode"),
    (98, "ColorDepth"),
    (99, "BlockHeight"),
    (100, "ColorMapping"),
    (101, "CompressMode"),
    (102, "DestinationBox"),
    (103, "DestinationSize"),
    (104, "PatternPersistence"),
    (105, "PatternDefineID"),
    (107, "SourceHeight"),
    (108, "SourceWidth"),
    (109, "StartLine"),
    (110, "PadBytesMultiple"),
    (111, "BlockByteLength"),
    (115, "NumberOfScanLines"),
    (129, "CommentData"),
    (130, "DataOrg"),
    (134, "Measure"),
    (136, "SourceType"),
    (137, "UnitsPerMeasure"),
    (139, "StreamName"),
    (140, "StreamDataLength"),
    (143, "ErrorReport"),
    (145, "VUExtension"),
    (146, "VUDataLength"),
    (147, "VUAttr1"),
    (148, "VUAttr2"),
    (149, "VUAttr3"),
    (161, "CharAngle"),
    (162, "CharCode"),
    (163, "CharDataSize"),
    (164, "CharScale"),
    (165, "CharShear"),
    (166, "CharSize"),
    (167, "FontHeaderLength"),
    (168, "FontName"),
    (169, "FontFormat"),
    (170, "SymbolSet"),
    (171, "TextData"),
    (172, "CharSubModeArray"),
    (173, "WritingMode"),
    (175, "XSpacingData"),
    (176, "YSpacingData"),
    (177, "CharBoldValue"),
];

// Enumeration label sets: (set name, [(value, label)])
const ENUMERATIONS: &[(&str, &[(u32, &str)])] = &[
    ("ArcDirection", &[(0, "eClockWise"), (1, "eCounterClockWise")]),
    ("ClipMode", &[(0, "eNonZeroWinding"), (1, "eEvenOdd")]),
    ("ClipRegion", &[(0, "eInterior"), (1, "eExterior")]),
    ("ColorDepth", &[(0, "e1Bit"), (1, "e4Bit"), (2, "e8Bit")]),
    ("ColorMapping", &[(0, "eDirectPixel"), (1, "eIndexedPixel")]),
    ("ColorSpace", &[(1, "eGray"), (2, "eRGB"), (6, "eSRGB")]),
    (
        "CompressMode",
        &[
            (0, "eNoCompression"),
            (1, "eRLECompression"),
            (2, "eJPEGCompression"),
            (3, "eDeltaRowCompression"),
        ],
    ),
    ("DataOrg", &[(0, "eBinaryHighByteFirst"), (1, "eBinaryLowByteFirst")]),
    ("DataSource", &[(0, "eDefault")]),
    (
        "DataType",
        &[(0, "eUByte"), (1, "eSByte"), (2, "eUInt16"), (3, "eSInt16")],
    ),
    ("DitherMatrix", &[(0, "eDeviceBest")]),
    (
        "DuplexPageMode",
        &[(0, "eDuplexHorizontalBinding"), (1, "eDuplexVerticalBinding")],
    ),
    ("DuplexPageSide", &[(0, "eFrontMediaSide"), (1, "eBackMediaSide")]),
    (
        "ErrorReport",
        &[
            (0, "eNoReporting"),
            (1, "eBackChannel"),
            (2, "eErrorPage"),
            (3, "eBackChAndErrPage"),
            (4, "eNWBackChannel"),
            (5, "eNWErrorPage"),
            (6, "eNWBackChAndErrPage"),
        ],
    ),
    ("FillMode", &[(0, "eNonZeroWinding"), (1, "eEvenOdd")]),
    (
        "LineCap",
        &[
            (0, "eButtCap"),
            (1, "eRoundCap"),
            (2, "eSquareCap"),
            (3, "eTriangleCap"),
        ],
    ),
    (
        "LineJoin",
        &[
            (0, "eMiterJoin"),
            (1, "eRoundJoin"),
            (2, "eBevelJoin"),
            (3, "eNoJoin"),
        ],
    ),
    (
        "Measure",
        &[(0, "eInch"), (1, "eMillimeter"), (2, "eTenthsOfAMillimeter")],
    ),
    (
        "MediaDestination",
        &[
            (0, "eDefaultDestination"),
            (1, "eFaceDownBin"),
            (2, "eFaceUpBin"),
            (3, "eJobOffsetBin"),
        ],
    ),
    (
        "MediaSize",
        &[
            (0, "eLetterPaper"),
            (1, "eLegalPaper"),
            (2, "eA4Paper"),
            (3, "eExecPaper"),
            (4, "eLedgerPaper"),
            (5, "eA3Paper"),
            (6, "eCOM10Envelope"),
            (7, "eMonarchEnvelope"),
            (8, "eC5Envelope"),
            (9, "eDLEnvelope"),
            (10, "eJB4Paper"),
            (11, "eJB5Paper"),
            (12, "eB5Envelope"),
            (13, "eB5Paper"),
            (14, "eJPostcard"),
            (15, "eJDoublePostcard"),
            (16, "eA5Paper"),
            (17, "eA6Paper"),
            (18, "eJB6Paper"),
        ],
    ),
    (
        "MediaSource",
        &[
            (0, "eDefaultSource"),
            (1, "eAutoSelect"),
            (2, "eManualFeed"),
            (3, "eMultiPurposeTray"),
            (4, "eUpperCassette"),
            (5, "eLowerCassette"),
            (6, "eEnvelopeTray"),
            (7, "eThirdCassette"),
        ],
    ),
    (
        "Orientation",
        &[
            (0, "ePortraitOrientation"),
            (1, "eLandscapeOrientation"),
            (2, "eReversePortrait"),
            (3, "eReverseLandscape"),
        ],
    ),
    (
        "PatternPersistence",
        &[(0, "eTempPattern"), (1, "ePagePattern"), (2, "eSessionPattern")],
    ),
    ("SimplexPageMode", &[(0, "eSimplexFrontSide")]),
    ("TxMode", &[(0, "eOpaque"), (1, "eTransparent")]),
    ("WritingMode", &[(0, "eHorizontal"), (1, "eVertical")]),
];

// Enumerated attributes and the label set each one uses
const ENUMERATED_ATTRIBUTES: &[(&str, &str)] = &[
    ("ArcDirection", "ArcDirection"),
    ("ClipMode", "ClipMode"),
    ("ClipRegion", "ClipRegion"),
    ("ColorDepth", "ColorDepth"),
    ("ColorMapping", "ColorMapping"),
    ("ColorSpace", "ColorSpace"),
    ("CompressMode", "CompressMode"),
    ("CustomMediaSizeUnits", "Measure"),
    ("DataOrg", "DataOrg"),
    ("DeviceMatrix", "DitherMatrix"),
    ("DitherMatrixDataType", "DataType"),
    ("DitherMatrixDepth", "ColorDepth"),
    ("DuplexPageMode", "DuplexPageMode"),
    ("DuplexPageSide", "DuplexPageSide"),
    ("ErrorReport", "ErrorReport"),
    ("FillMode", "FillMode"),
    ("LineCapStyle", "LineCap"),
    ("LineJoinStyle", "LineJoin"),
    ("Measure", "Measure"),
    ("MediaDestination", "MediaDestination"),
    ("MediaSize", "MediaSize"),
    ("MediaSource", "MediaSource"),
    ("Orientation", "Orientation"),
    ("PaletteDepth", "ColorDepth"),
    ("PatternPersistence", "PatternPersistence"),
    ("PointType", "DataType"),
    ("PrimaryDepth", "ColorDepth"),
    ("SimplexPageMode", "SimplexPageMode"),
    ("SourceType", "DataSource"),
    ("TxMode", "TxMode"),
    ("WritingMode", "WritingMode"),
];

lazy_static! {
    pub static ref OPERATOR_TABLE: HashMap<u8, OperatorDef> = {
        let mut m = HashMap::new();
        for &(tag, name) in OPERATORS {
            let payload = if tag == VENDOR_UNIQUE {
                Some(PayloadSource::VendorLength)
            } else {
                None
            };
            m.insert(tag, OperatorDef { tag, name, payload, counted: true });
        }
        m.insert(
            EMBEDDED_DATA,
            OperatorDef {
                tag: EMBEDDED_DATA,
                name: "embedded_data",
                payload: Some(PayloadSource::InlineUInt32),
                counted: false,
            },
        );
        m.insert(
            EMBEDDED_DATA_BYTE,
            OperatorDef {
                tag: EMBEDDED_DATA_BYTE,
                name: "embedded_data_byte",
                payload: Some(PayloadSource::InlineUByte),
                counted: false,
            },
        );
        m
    };
    pub static ref ATTRIBUTE_TABLE: HashMap<u16, &'static str> =
        ATTRIBUTES.iter().copied().collect();
    pub static ref LABEL_SETS: HashMap<&'static str, IndexMap<u32, &'static str>> = {
        let mut m = HashMap::new();
        for &(set, labels) in ENUMERATIONS {
            m.insert(set, labels.iter().copied().collect::<IndexMap<_, _>>());
        }
        m
    };
    pub static ref ATTRIBUTE_ENUMERATIONS: HashMap<&'static str, &'static str> =
        ENUMERATED_ATTRIBUTES.iter().copied().collect();
}

/// Value shape for a data-type tag, `None` when `tag` is not one
pub fn lookup_data_type(tag: u8) -> Option<ValueShape> {
    let element = ElementType::from_code(tag & 0x07)?;
    match tag & 0xf8 {
        0xc0 => Some(ValueShape::Scalar(element)),
        0xc8 => Some(ValueShape::Array(element)),
        0xd0 => Some(ValueShape::Pair(element)),
        0xe0 => Some(ValueShape::Quad(element)),
        _ => None,
    }
}

pub fn lookup_operator(tag: u8) -> Option<&'static OperatorDef> {
    OPERATOR_TABLE.get(&tag)
}

pub fn lookup_attribute(code: u16) -> Option<&'static str> {
    ATTRIBUTE_TABLE.get(&code).copied()
}

/// Label set used by an enumerated attribute
pub fn enum_labels(attribute: &str) -> Option<&'static IndexMap<u32, &'static str>> {
    let set = ATTRIBUTE_ENUMERATIONS.get(attribute)?;
    LABEL_SETS.get(set)
}

/// Symbolic name of an enumerated attribute value, if known
pub fn lookup_enum_label(attribute: &str, value: u32) -> Option<&'static str> {
    enum_labels(attribute)?.get(&value).copied()
}

/// Operators sorted by tag
pub fn operators() -> Vec<&'static OperatorDef> {
    let mut ops: Vec<_> = OPERATOR_TABLE.values().collect();
    ops.sort_by_key(|op| op.tag);
    ops
}

/// Attributes sorted by number
pub fn attributes() -> Vec<(u16, &'static str)> {
    let mut attrs: Vec<_> = ATTRIBUTE_TABLE.iter().map(|(k, v)| (*k, *v)).collect();
    attrs.sort_by_key(|(code, _)| *code);
    attrs
}
