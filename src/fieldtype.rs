use bstr::{BString, ByteSlice};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::cigar::CIGAR;
use crate::error::{GfaError, GfaResult};
use crate::gfa::Orientation;

/// A GFA2 position: an offset, optionally marked with `$` when it
/// coincides with the end of the segment.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct Position {
    pub value: usize,
    pub last: bool,
}

impl Position {
    pub fn new(value: usize, last: bool) -> Self {
        Position { value, last }
    }

    pub fn parse(input: &[u8]) -> Option<Self> {
        let (digits, last) = match input.split_last() {
            Some((&b'$', head)) => (head, true),
            _ => (input, false),
        };
        let value = digits.to_str().ok()?.parse().ok()?;
        Some(Position { value, last })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)?;
        if self.last {
            write!(f, "$")?;
        }
        Ok(())
    }
}

/// The closed set of positional-field datatypes. Each tag knows how
/// to validate a raw byte string, decode it into a [`FieldValue`],
/// and print the canonical form back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    SegmentName,
    Sequence,
    Integer,
    Float,
    String,
    Orientation,
    Cigar,
    Alignment,
    AlignmentList,
    ByteArray,
    NumericArray,
    Json,
    Position,
    IdentifierGfa2,
    IdentifierListGfa2,
    OptionalIdentifierGfa2,
    Comment,
    Generic,
    Char,
}

/// Native values produced by [`FieldType::decode`]. `Placeholder`
/// stands for `*` wherever the format allows it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Name(BString),
    Seq(BString),
    Int(i64),
    Float(f32),
    Str(BString),
    Orient(Orientation),
    Cigar(CIGAR),
    AlignmentList(Vec<Option<CIGAR>>),
    Pos(Position),
    Char(u8),
    Placeholder,
}

impl FieldValue {
    /// Canonical string form, parseable back by [`FieldType::decode`].
    pub fn encode(&self) -> BString {
        use FieldValue::*;
        match self {
            Name(s) | Seq(s) | Str(s) => s.clone(),
            Int(i) => i.to_string().into(),
            Float(x) => x.to_string().into(),
            Orient(o) => o.to_string().into(),
            Cigar(cg) => cg.to_string().into(),
            AlignmentList(cigars) => {
                let mut out = BString::from("");
                for (i, cg) in cigars.iter().enumerate() {
                    if i != 0 {
                        out.push(b',');
                    }
                    match cg {
                        Some(cg) => out.extend_from_slice(cg.to_string().as_bytes()),
                        None => out.push(b'*'),
                    }
                }
                out
            }
            Pos(p) => p.to_string().into(),
            Char(c) => vec![*c].into(),
            Placeholder => "*".into(),
        }
    }
}

lazy_static! {
    static ref RE_SEGMENT_NAME: Regex =
        Regex::new(r"(?-u)^[!-)+-<>-~][!-~]*$").unwrap();
    static ref RE_SEQUENCE: Regex =
        Regex::new(r"(?-u)^(\*|[A-Za-z=.]+)$").unwrap();
    static ref RE_INTEGER: Regex = Regex::new(r"(?-u)^[-+]?[0-9]+$").unwrap();
    static ref RE_FLOAT: Regex =
        Regex::new(r"(?-u)^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").unwrap();
    static ref RE_STRING: Regex = Regex::new(r"(?-u)^[ !-~]+$").unwrap();
    static ref RE_ORIENTATION: Regex = Regex::new(r"(?-u)^[+-]$").unwrap();
    static ref RE_CIGAR: Regex =
        Regex::new(r"(?-u)^(\*|([0-9]+[MIDNSHPX=])+)$").unwrap();
    static ref RE_TRACE: Regex =
        Regex::new(r"(?-u)^[0-9]+(,[0-9]+)*$").unwrap();
    static ref RE_CIGAR_LIST: Regex =
        Regex::new(r"(?-u)^(\*|([0-9]+[MIDNSHPX=])+)(,(\*|([0-9]+[MIDNSHPX=])+))*$")
            .unwrap();
    static ref RE_BYTE_ARRAY: Regex = Regex::new(r"(?-u)^[0-9A-F]+$").unwrap();
    static ref RE_NUMERIC_ARRAY: Regex = Regex::new(
        r"(?-u)^([cCsSiI](,[-+]?[0-9]+)+|f(,[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?)+)$"
    )
    .unwrap();
    static ref RE_POSITION: Regex = Regex::new(r"(?-u)^[0-9]+\$?$").unwrap();
    static ref RE_IDENTIFIER_GFA2: Regex = Regex::new(r"(?-u)^[!-~]+$").unwrap();
    static ref RE_IDENTIFIER_LIST_GFA2: Regex =
        Regex::new(r"(?-u)^[!-~]+( [!-~]+)*$").unwrap();
    static ref RE_OPT_IDENTIFIER_GFA2: Regex =
        Regex::new(r"(?-u)^(\*|[!-~]+)$").unwrap();
    static ref RE_CHAR: Regex = Regex::new(r"(?-u)^[!-~]$").unwrap();
}

impl FieldType {
    /// Check a raw field against this datatype without decoding it.
    pub fn validate(&self, raw: &[u8]) -> GfaResult<()> {
        use FieldType::*;
        let ok = match self {
            SegmentName => RE_SEGMENT_NAME.is_match(raw),
            Sequence => RE_SEQUENCE.is_match(raw),
            Integer => RE_INTEGER.is_match(raw),
            Float => RE_FLOAT.is_match(raw),
            String => RE_STRING.is_match(raw),
            Orientation => RE_ORIENTATION.is_match(raw),
            Cigar => RE_CIGAR.is_match(raw),
            Alignment => {
                raw == b"*" || RE_CIGAR.is_match(raw) || RE_TRACE.is_match(raw)
            }
            AlignmentList => RE_CIGAR_LIST.is_match(raw),
            ByteArray => RE_BYTE_ARRAY.is_match(raw) && raw.len() % 2 == 0,
            NumericArray => RE_NUMERIC_ARRAY.is_match(raw),
            Json => serde_json::from_slice::<serde_json::Value>(raw).is_ok(),
            Position => RE_POSITION.is_match(raw),
            IdentifierGfa2 => RE_IDENTIFIER_GFA2.is_match(raw),
            IdentifierListGfa2 => RE_IDENTIFIER_LIST_GFA2.is_match(raw),
            OptionalIdentifierGfa2 => RE_OPT_IDENTIFIER_GFA2.is_match(raw),
            Comment => !raw.contains_str(b"\n"),
            Generic => !raw.contains_str(b"\n") && !raw.contains_str(b"\t"),
            Char => RE_CHAR.is_match(raw),
        };
        if ok {
            Ok(())
        } else {
            Err(GfaError::Format(format!(
                "{:?} is not a valid {:?} field",
                raw.as_bstr(),
                self
            )))
        }
    }

    /// Decode a raw field into its native value. Placeholder-capable
    /// datatypes decode `*` to [`FieldValue::Placeholder`].
    pub fn decode(&self, raw: &[u8]) -> GfaResult<FieldValue> {
        use FieldType::*;
        self.validate(raw)?;
        let value = match self {
            SegmentName | IdentifierGfa2 | IdentifierListGfa2 => {
                FieldValue::Name(raw.into())
            }
            OptionalIdentifierGfa2 => {
                if raw == b"*" {
                    FieldValue::Placeholder
                } else {
                    FieldValue::Name(raw.into())
                }
            }
            Sequence => {
                if raw == b"*" {
                    FieldValue::Placeholder
                } else {
                    FieldValue::Seq(raw.into())
                }
            }
            Integer => {
                FieldValue::Int(std::str::from_utf8(raw)?.parse().map_err(|_| {
                    GfaError::Format(format!(
                        "{:?} out of integer range",
                        raw.as_bstr()
                    ))
                })?)
            }
            Float => {
                FieldValue::Float(std::str::from_utf8(raw)?.parse().map_err(
                    |_| {
                        GfaError::Format(format!(
                            "{:?} out of float range",
                            raw.as_bstr()
                        ))
                    },
                )?)
            }
            String | NumericArray | ByteArray | Comment | Generic => {
                FieldValue::Str(raw.into())
            }
            Json => FieldValue::Str(raw.into()),
            Orientation => FieldValue::Orient(
                crate::gfa::Orientation::from_bytes_plus_minus(raw).ok_or_else(
                    || GfaError::Format("orientation was not + or -".into()),
                )?,
            ),
            Cigar | Alignment => {
                if raw == b"*" {
                    FieldValue::Placeholder
                } else if let Some(cg) = CIGAR::from_bytestring(raw) {
                    FieldValue::Cigar(cg)
                } else {
                    // GFA2 trace alignments are kept as strings
                    FieldValue::Str(raw.into())
                }
            }
            AlignmentList => FieldValue::AlignmentList(
                raw.split_str(b",")
                    .map(|part| {
                        if part == b"*" {
                            None
                        } else {
                            CIGAR::from_bytestring(part)
                        }
                    })
                    .collect(),
            ),
            Position => FieldValue::Pos(
                crate::fieldtype::Position::parse(raw).ok_or_else(|| {
                    GfaError::Format(format!(
                        "{:?} is not a valid position",
                        raw.as_bstr()
                    ))
                })?,
            ),
            Char => FieldValue::Char(raw[0]),
        };
        Ok(value)
    }
}

/// A positional field in a record schema: its name and datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub datatype: FieldType,
}

impl FieldDef {
    pub const fn new(name: &'static str, datatype: FieldType) -> Self {
        FieldDef { name, datatype }
    }
}
