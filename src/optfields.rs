use bstr::{BString, ByteSlice};

use lazy_static::lazy_static;
use regex::bytes::Regex;

use serde::{Deserialize, Serialize};

use crate::error::{GfaError, GfaResult};
use crate::parser::ParseFieldError;

/// These type aliases are useful for configuring the parsers, as the
/// type of the optional field container must be given when creating a
/// GFAParser or GFA object.
pub type OptionalFields = Vec<OptField>;
pub type NoOptionalFields = ();

/// Tags whose datatype is fixed by the GFA specification (plus the
/// `cn`/`or` tags used by the copy-number machinery). A tag listed
/// here parsed with another type character is a type error under
/// strict validation.
pub const PREDEFINED_TAGS: &[([u8; 2], u8)] = &[
    (*b"LN", b'i'),
    (*b"RC", b'i'),
    (*b"KC", b'i'),
    (*b"FC", b'i'),
    (*b"MQ", b'i'),
    (*b"NM", b'i'),
    (*b"TS", b'i'),
    (*b"SH", b'H'),
    (*b"ID", b'Z'),
    (*b"UR", b'Z'),
    (*b"VN", b'Z'),
    (*b"cn", b'i'),
    (*b"or", b'Z'),
];

pub fn predefined_type(tag: &[u8]) -> Option<u8> {
    PREDEFINED_TAGS
        .iter()
        .find(|(t, _)| t == tag)
        .map(|(_, ty)| *ty)
}

/// An optional field a la SAM. Identified by its tag, which is any
/// two characters matching [A-Za-z][A-Za-z0-9].
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OptField {
    pub tag: [u8; 2],
    pub value: OptFieldVal,
}

/// enum for representing each of the optional field types. The `B`
/// array type ignores the size modifiers, always holding i64 or f32,
/// but keeps the subtype character so a record round-trips.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum OptFieldVal {
    A(u8),
    Int(i64),
    Float(f32),
    Z(BString),
    J(BString),
    H(Vec<u8>),
    BInt(u8, Vec<i64>),
    BFloat(Vec<f32>),
}

impl OptFieldVal {
    /// The `<type>` character this value serializes under.
    pub fn type_char(&self) -> u8 {
        use OptFieldVal::*;
        match self {
            A(_) => b'A',
            Int(_) => b'i',
            Float(_) => b'f',
            Z(_) => b'Z',
            J(_) => b'J',
            H(_) => b'H',
            BInt(..) | BFloat(_) => b'B',
        }
    }
}

lazy_static! {
    static ref RE_TAG: Regex = Regex::new(r"(?-u)^[A-Za-z][A-Za-z0-9]$").unwrap();
    static ref RE_CHAR: Regex = Regex::new(r"(?-u)^[!-~]$").unwrap();
    static ref RE_INT: Regex = Regex::new(r"(?-u)^[-+]?[0-9]+$").unwrap();
    static ref RE_FLOAT: Regex =
        Regex::new(r"(?-u)^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").unwrap();
    static ref RE_STRING: Regex = Regex::new(r"(?-u)^[ !-~]*$").unwrap();
    static ref RE_BYTES: Regex = Regex::new(r"(?-u)^[0-9A-F]+$").unwrap();
    static ref RE_USER_TAG: Regex = Regex::new(r"(?-u)^[a-z][a-z]$").unwrap();
    static ref RE_B_ARRAY: Regex = Regex::new(
        r"(?-u)^([cCsSiI],?[-+]?[0-9]+(,[-+]?[0-9]+)*|f,?[-+]?[0-9.eE+-]+(,[-+]?[0-9.eE+-]+)*)$"
    )
    .unwrap();
}

impl OptField {
    /// Panics if the provided tag doesn't match the regex
    /// [A-Za-z][A-Za-z0-9].
    pub fn tag(t: &[u8]) -> [u8; 2] {
        assert_eq!(t.len(), 2);
        assert!(t[0].is_ascii_alphabetic());
        assert!(t[1].is_ascii_alphanumeric());
        [t[0], t[1]]
    }

    /// Create a new OptField from a tag name and a value, panicking
    /// if the provided tag doesn't fulfill the requirements of
    /// OptField::tag().
    pub fn new(tag: &[u8], value: OptFieldVal) -> Self {
        let tag = OptField::tag(tag);
        OptField { tag, value }
    }

    /// Parses an optional field from a bytestring in the format
    /// <TAG>:<TYPE>:<VALUE>, returning None on any mismatch.
    pub fn parse(input: &[u8]) -> Option<Self> {
        Self::parse_result(input).ok()
    }

    /// Strict variant of [`OptField::parse`].
    pub fn parse_result(input: &[u8]) -> Result<Self, ParseFieldError> {
        use OptFieldVal::*;

        let bad = || ParseFieldError::InvalidField("optional field");

        let o_tag = input.get(0..2).ok_or_else(bad)?;
        if !RE_TAG.is_match(o_tag) {
            return Err(bad());
        }
        if input.get(2) != Some(&b':') || input.get(4) != Some(&b':') {
            return Err(bad());
        }
        let o_type = *input.get(3).ok_or_else(bad)?;
        let o_contents = input.get(5..).ok_or_else(bad)?;

        let o_val = match o_type {
            b'A' if RE_CHAR.is_match(o_contents) => A(o_contents[0]),
            b'i' if RE_INT.is_match(o_contents) => Int(o_contents
                .to_str()
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(bad)?),
            b'f' if RE_FLOAT.is_match(o_contents) => Float(
                o_contents
                    .to_str()
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(bad)?,
            ),
            b'Z' if RE_STRING.is_match(o_contents) => Z(o_contents.into()),
            b'J' if RE_STRING.is_match(o_contents) => J(o_contents.into()),
            b'H' if RE_BYTES.is_match(o_contents)
                && o_contents.len() % 2 == 0 =>
            {
                let mut bytes = Vec::with_capacity(o_contents.len() / 2);
                for pair in o_contents.chunks(2) {
                    let hi = (pair[0] as char).to_digit(16).ok_or_else(bad)?;
                    let lo = (pair[1] as char).to_digit(16).ok_or_else(bad)?;
                    bytes.push(((hi << 4) | lo) as u8);
                }
                H(bytes)
            }
            b'B' if RE_B_ARRAY.is_match(o_contents) => {
                let subtype = o_contents[0];
                let rest = o_contents[1..]
                    .split_str(b",")
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| s.to_str().ok());
                if subtype == b'f' {
                    BFloat(rest.filter_map(|s| s.parse().ok()).collect())
                } else {
                    BInt(subtype, rest.filter_map(|s| s.parse().ok()).collect())
                }
            }
            _ => return Err(bad()),
        };

        Ok(Self::new(o_tag, o_val))
    }
}

macro_rules! get_variant {
    ($from:ident, ref $var:path) => {
        if let $var(x) = &$from.value {
            Some(&x)
        } else {
            None
        }
    };
    ($from:ident, copy $var:path) => {
        if let $var(x) = $from.value {
            Some(x)
        } else {
            None
        }
    };
}

// Generate a function with name `$fn` for getting contents of variant
// `$var`, returning an Option containing `$out` or `&$out`. `$op` can
// be `ref` or `copy`: if it's `ref`, a reference to the value is
// returned, if it's `copy`, the value is dereferenced and an owned
// copy is returned.
macro_rules! get_opt_field_val {
    ($(#[$meta:meta])* $var:path, $op:tt $out:ty, $fn:ident) => {
        $(#[$meta])*
        pub fn $fn(&self) -> Option<$out> {
            get_variant!(self, $op $var)
        }
    };
}

impl OptField {
    get_opt_field_val!(
        /// If this field contains a single character, return it.
        OptFieldVal::A,      copy   u8,  get_char);

    get_opt_field_val!(
        /// If this field contains a single integer, return it.
        OptFieldVal::Int,    copy  i64,  get_int);

    get_opt_field_val!(
        /// If this field contains a single float, return it.
        OptFieldVal::Float,  copy  f32,  get_float);

    get_opt_field_val!(
        /// If this field contains a string, return a slice of it.
        OptFieldVal::Z,      ref &BString, get_string);

    get_opt_field_val!(
        /// If this field contains a JSON string, return a slice of it.
        OptFieldVal::J,      ref &BString, get_json);

    get_opt_field_val!(
        /// If this field contains a byte array, return a slice of it.
        OptFieldVal::H,      ref &Vec<u8>, get_byte_array);

    get_opt_field_val!(
        /// If this field contains an array of floats, return a slice of it.
        OptFieldVal::BFloat, ref &Vec<f32>, get_float_array);

    /// If this field contains an array of integers, return a slice of it.
    pub fn get_int_array(&self) -> Option<&[i64]> {
        if let OptFieldVal::BInt(_, x) = &self.value {
            Some(x)
        } else {
            None
        }
    }
}

/// The Display implementation produces spec-compliant strings in the
/// <TAG>:<TYPE>:<VALUE> format, and can be parsed back using
/// OptField::parse().
impl std::fmt::Display for OptField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use OptFieldVal::*;

        write!(f, "{}{}:", char::from(self.tag[0]), char::from(self.tag[1]))?;

        match &self.value {
            A(x) => write!(f, "A:{}", char::from(*x)),
            Int(x) => write!(f, "i:{}", x),
            Float(x) => write!(f, "f:{}", x),
            Z(x) => write!(f, "Z:{}", x),
            J(x) => write!(f, "J:{}", x),
            H(x) => {
                write!(f, "H:")?;
                for a in x {
                    write!(f, "{:02X}", a)?
                }
                Ok(())
            }
            BInt(subtype, x) => {
                write!(f, "B:{}", char::from(*subtype))?;
                for a in x.iter() {
                    write!(f, ",{}", a)?
                }
                Ok(())
            }
            BFloat(x) => {
                write!(f, "B:f")?;
                for a in x.iter() {
                    write!(f, ",{}", a)?
                }
                Ok(())
            }
        }
    }
}

/// Infer the narrowest tag type character matching a raw value's
/// surface form: integer before float, numeric-array before string,
/// byte-array for even-length hex, JSON for bracketed objects.
pub fn auto_type(value: &[u8]) -> u8 {
    if RE_INT.is_match(value) {
        b'i'
    } else if RE_FLOAT.is_match(value) {
        b'f'
    } else if RE_B_ARRAY.is_match(value) {
        b'B'
    } else if RE_BYTES.is_match(value) && value.len() % 2 == 0 {
        b'H'
    } else if (value.starts_with(b"{") || value.starts_with(b"["))
        && serde_json::from_slice::<serde_json::Value>(value).is_ok()
    {
        b'J'
    } else {
        b'Z'
    }
}

/// Check the GFA tag rules over a parsed tag set: no duplicates,
/// predefined tags carry their predefined type, any other tag is a
/// two-character lowercase user tag.
pub fn validate_tags(fields: &[OptField]) -> GfaResult<()> {
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.tag == field.tag) {
            return Err(GfaError::Inconsistency(format!(
                "duplicated tag {}",
                field.tag.as_bstr()
            )));
        }
        match predefined_type(&field.tag) {
            Some(ty) => {
                if field.value.type_char() != ty {
                    return Err(GfaError::Type(format!(
                        "tag {} must have type {}, found {}",
                        field.tag.as_bstr(),
                        char::from(ty),
                        char::from(field.value.type_char())
                    )));
                }
            }
            None => {
                if !RE_USER_TAG.is_match(&field.tag) {
                    return Err(GfaError::Format(format!(
                        "{} is not a predefined tag nor a two-character \
                         lowercase user tag",
                        field.tag.as_bstr()
                    )));
                }
            }
        }
    }
    Ok(())
}

/// The OptFields trait describes how to parse, store, and query
/// optional fields. Each of the GFA line types and the GFA struct
/// itself are generic over the optional fields, so the choice of
/// OptFields implementor can impact memory usage, which optional
/// fields are parsed, and possibly more in the future
pub trait OptFields: Sized + Default + Clone {
    /// Return the optional field with the given tag, if it exists.
    fn get_field(&self, tag: &[u8]) -> Option<&OptField>;

    /// Return a slice over all optional fields.
    fn fields(&self) -> &[OptField];

    /// Replace the field with the same tag, or append.
    fn set_field(&mut self, field: OptField);

    /// Remove and return the field with the given tag.
    fn remove_field(&mut self, tag: &[u8]) -> Option<OptField>;

    /// Given an iterator over bytestrings, each expected to hold one
    /// optional field (in the <TAG>:<TYPE>:<VALUE> format), parse
    /// them as optional fields to create a collection.
    fn parse<T>(input: T) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<[u8]>;

    /// The integer payload of a tag, if present with type `i`.
    fn get_tag_int(&self, tag: &[u8]) -> Option<i64> {
        self.get_field(tag).and_then(OptField::get_int)
    }

    /// Like [`OptFields::get_tag_int`], but a missing tag is an
    /// error.
    fn get_tag_int_req(&self, tag: &[u8]) -> GfaResult<i64> {
        self.get_tag_int(tag).ok_or_else(|| {
            GfaError::NotFound(format!("tag {}", tag.as_bstr()))
        })
    }

    /// Set an integer tag, replacing any existing value.
    fn set_tag_int(&mut self, tag: &[u8], value: i64) {
        self.set_field(OptField::new(tag, OptFieldVal::Int(value)));
    }

    /// Create a tag from a raw value whose type is chosen by
    /// [`auto_type`].
    fn set_tag_auto(&mut self, tag: &[u8], value: &[u8]) {
        let ty = auto_type(value);
        let mut raw = Vec::with_capacity(value.len() + 5);
        raw.extend_from_slice(tag);
        raw.push(b':');
        raw.push(ty);
        raw.push(b':');
        raw.extend_from_slice(value);
        if let Some(field) = OptField::parse(&raw) {
            self.set_field(field);
        }
    }
}

/// This implementation is useful for performance if we don't actually
/// need any optional fields. () takes up zero space, and all
/// methods are no-ops.
impl OptFields for () {
    fn get_field(&self, _: &[u8]) -> Option<&OptField> {
        None
    }

    fn fields(&self) -> &[OptField] {
        &[]
    }

    fn set_field(&mut self, _: OptField) {}

    fn remove_field(&mut self, _: &[u8]) -> Option<OptField> {
        None
    }

    fn parse<T>(_input: T) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<[u8]>,
    {
    }
}

/// Stores all the optional fields in a vector. `get_field` simply
/// uses std::iter::Iterator::find(), but as there are only a
/// relatively small number of optional fields in practice, it should
/// be efficient enough.
impl OptFields for Vec<OptField> {
    fn get_field(&self, tag: &[u8]) -> Option<&OptField> {
        self.iter().find(|o| o.tag == tag)
    }

    fn fields(&self) -> &[OptField] {
        self.as_slice()
    }

    fn set_field(&mut self, field: OptField) {
        match self.iter_mut().find(|o| o.tag == field.tag) {
            Some(slot) => *slot = field,
            None => self.push(field),
        }
    }

    fn remove_field(&mut self, tag: &[u8]) -> Option<OptField> {
        let ix = self.iter().position(|o| o.tag == tag)?;
        Some(self.remove(ix))
    }

    fn parse<T>(input: T) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<[u8]>,
    {
        input
            .into_iter()
            .filter_map(|f| OptField::parse(f.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print_roundtrip() {
        for raw in [
            "LN:i:123",
            "RC:i:-5",
            "UR:Z:http://test.com/",
            "IJ:A:x",
            "AB:B:I,1,2,3,52124",
            "SH:H:AACCFF05",
            "zz:f:0.5",
            "kv:J:{\"a\":1}",
        ] {
            let field = OptField::parse(raw.as_bytes())
                .unwrap_or_else(|| panic!("failed to parse {}", raw));
            assert_eq!(field.to_string(), raw);
        }
    }

    #[test]
    fn byte_array_is_decoded_pairwise() {
        let field = OptField::parse(b"SH:H:AACCFF05").unwrap();
        assert_eq!(
            field.get_byte_array().unwrap().as_slice(),
            &[0xAA, 0xCC, 0xFF, 0x05]
        );
    }

    #[test]
    fn malformed_fields_are_rejected() {
        assert!(OptField::parse(b"L:i:1").is_none());
        assert!(OptField::parse(b"LN:i:one").is_none());
        assert!(OptField::parse(b"LN;i;1").is_none());
        assert!(OptField::parse(b"SH:H:AAC").is_none());
        assert!(OptField::parse(b"AB:B:x,1").is_none());
    }

    #[test]
    fn auto_type_narrowest_first() {
        assert_eq!(auto_type(b"12"), b'i');
        assert_eq!(auto_type(b"-12"), b'i');
        assert_eq!(auto_type(b"1.5"), b'f');
        assert_eq!(auto_type(b"I,1,2"), b'B');
        assert_eq!(auto_type(b"AACC"), b'H');
        assert_eq!(auto_type(br#"{"k":1}"#), b'J');
        assert_eq!(auto_type(b"hello"), b'Z');
    }

    #[test]
    fn tag_rule_validation() {
        let ok = vec![
            OptField::new(b"LN", OptFieldVal::Int(4)),
            OptField::new(b"xy", OptFieldVal::Z("v".into())),
        ];
        assert!(validate_tags(&ok).is_ok());

        let dup = vec![
            OptField::new(b"LN", OptFieldVal::Int(4)),
            OptField::new(b"LN", OptFieldVal::Int(5)),
        ];
        assert!(matches!(
            validate_tags(&dup),
            Err(GfaError::Inconsistency(_))
        ));

        let wrong_ty = vec![OptField::new(b"LN", OptFieldVal::Z("4".into()))];
        assert!(matches!(validate_tags(&wrong_ty), Err(GfaError::Type(_))));

        let bad_user = vec![OptField::new(b"XY", OptFieldVal::Int(1))];
        assert!(matches!(validate_tags(&bad_user), Err(GfaError::Format(_))));
    }

    #[test]
    fn set_and_remove() {
        let mut fields: OptionalFields = Vec::new();
        fields.set_tag_int(b"RC", 50);
        fields.set_tag_int(b"RC", 25);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get_tag_int(b"RC"), Some(25));
        assert!(matches!(
            fields.get_tag_int_req(b"KC"),
            Err(GfaError::NotFound(_))
        ));
        fields.set_tag_auto(b"or", b"X");
        assert_eq!(
            fields.get_field(b"or").and_then(OptField::get_string),
            Some(&BString::from("X"))
        );
        assert!(fields.remove_field(b"RC").is_some());
        assert_eq!(fields.get_tag_int(b"RC"), None);
    }
}
