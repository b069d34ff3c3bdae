pub mod orientation;

pub use orientation::Orientation;

use bstr::{BString, ByteSlice};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GfaError, GfaResult};
use crate::fieldtype::{FieldDef, FieldType, FieldValue};
use crate::optfields::*;
use crate::parser::ParseFieldError;
use crate::sequence;

/// Trait for the types that can be parsed and used as segment IDs;
/// will probably only be usize and BString.
pub trait SegmentId: Sized + Default {
    const ERROR: ParseFieldError;

    fn parse_id(input: &[u8]) -> Option<Self>;

    #[inline]
    fn parse_next<I>(mut input: I) -> Result<Self, ParseFieldError>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let next = input.next().ok_or(ParseFieldError::MissingFields)?;
        Self::parse_id(next.as_ref()).ok_or(Self::ERROR)
    }

    fn display(&self) -> String;
}

impl SegmentId for usize {
    const ERROR: ParseFieldError = ParseFieldError::UintIdError;

    #[inline]
    fn parse_id(input: &[u8]) -> Option<Self> {
        input.to_str().ok()?.parse::<usize>().ok()
    }

    #[inline]
    fn display(&self) -> String {
        self.to_string()
    }
}

impl SegmentId for BString {
    const ERROR: ParseFieldError = ParseFieldError::Utf8Error;

    #[inline]
    fn parse_id(input: &[u8]) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"(?-u)^[!-)+-<>-~][!-~]*$").unwrap();
        }
        if RE.is_match(input) {
            Some(BString::from(input))
        } else {
            None
        }
    }

    #[inline]
    fn display(&self) -> String {
        self.to_string()
    }
}

/// Access to the positional-field schema shared by all records of a
/// type, plus generic get/set by schema field name. The schema is the
/// sole authority on field names, datatypes, and which fields
/// reference other records.
pub trait RecordSchema {
    /// The single-character record-type code.
    const CODE: u8;

    fn schema() -> &'static [FieldDef];

    /// Value of a positional field, by schema name.
    fn positional(&self, field: &str) -> Option<FieldValue>;

    /// Replace a positional field. Fails with a type error when the
    /// value does not fit the schema datatype.
    fn set_positional(&mut self, field: &str, value: FieldValue)
        -> GfaResult<()>;

    /// Schema names whose values name other records.
    fn reference_fields() -> &'static [&'static str] {
        &[]
    }

    /// The positional field carrying the record's identity, if any.
    fn name_field() -> Option<&'static str> {
        None
    }
}

fn type_mismatch(field: &str) -> GfaError {
    GfaError::Type(format!("value does not fit field {}", field))
}

/// Simple representation of a parsed GFA1 file, using a Vec<T> to
/// store each separate GFA line type.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct GFA<N, T: OptFields> {
    pub header: Header<T>,
    pub segments: Vec<Segment<N, T>>,
    pub links: Vec<Link<N, T>>,
    pub containments: Vec<Containment<N, T>>,
    pub paths: Vec<Path<N, T>>,
}

impl<N, T: OptFields> GFA<N, T> {
    /// Insert a GFA line (wrapped in the Line enum) into an existing
    /// GFA. Simply pushes it into the corresponding Vec in the GFA,
    /// or replaces the header, so there's no deduplication or sorting
    /// taking place.
    pub fn insert_line(&mut self, line: Line<N, T>) {
        use Line::*;
        match line {
            Header(h) => self.header = h,
            Segment(s) => self.segments.push(s),
            Link(s) => self.links.push(s),
            Containment(s) => self.containments.push(s),
            Path(s) => self.paths.push(s),
        }
    }
}

impl<N: SegmentId, T: OptFields> GFA<N, T> {
    pub fn new() -> Self {
        Default::default()
    }
}

/// Consume a GFA object to produce an iterator over all the lines
/// contained within. The iterator first produces all segments, then
/// links, then containments, and finally paths.
pub fn gfa_into_iter<N, T: OptFields>(
    gfa: GFA<N, T>,
) -> impl Iterator<Item = Line<N, T>> {
    use Line::*;
    let segs = gfa.segments.into_iter().map(Segment);
    let links = gfa.links.into_iter().map(Link);
    let conts = gfa.containments.into_iter().map(Containment);
    let paths = gfa.paths.into_iter().map(Path);

    segs.chain(links).chain(conts).chain(paths)
}

/// Enum containing the different kinds of GFA1 lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<N, T: OptFields> {
    Header(Header<T>),
    Segment(Segment<N, T>),
    Link(Link<N, T>),
    Containment(Containment<N, T>),
    Path(Path<N, T>),
}

/// The header line of a GFA graph
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header<T: OptFields> {
    pub version: Option<BString>,
    pub optional: T,
}

/// A segment in a GFA graph. Generic over the name type, but
/// the editing layer always uses N = BString.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment<N, T: OptFields> {
    pub name: N,
    pub sequence: BString,
    pub optional: T,
}

impl<T: OptFields> Segment<BString, T> {
    pub fn new(name: &[u8], sequence: &[u8]) -> Self {
        Segment {
            name: BString::from(name),
            sequence: BString::from(sequence),
            optional: Default::default(),
        }
    }

    /// Segment length: the `LN` tag when present, the sequence length
    /// otherwise, `None` when the sequence is the placeholder.
    pub fn length(&self) -> Option<i64> {
        self.optional
            .get_tag_int(b"LN")
            .or_else(|| sequence::len_of(self.sequence.as_bstr()).map(|l| l as i64))
    }

    pub fn validate(&self) -> GfaResult<()> {
        FieldType::SegmentName.validate(&self.name)?;
        FieldType::Sequence.validate(&self.sequence)?;
        if let (Some(ln), Some(len)) = (
            self.optional.get_tag_int(b"LN"),
            sequence::len_of(self.sequence.as_bstr()),
        ) {
            if ln != len as i64 {
                return Err(GfaError::Inconsistency(format!(
                    "segment {}: LN is {} but the sequence has length {}",
                    self.name, ln, len
                )));
            }
        }
        validate_tags(self.optional.fields())
    }
}

const SEGMENT_SCHEMA: &[FieldDef] = &[
    FieldDef::new("name", FieldType::SegmentName),
    FieldDef::new("sequence", FieldType::Sequence),
];

impl<T: OptFields> RecordSchema for Segment<BString, T> {
    const CODE: u8 = b'S';

    fn schema() -> &'static [FieldDef] {
        SEGMENT_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "name" => Some(FieldValue::Name(self.name.clone())),
            "sequence" => {
                if sequence::is_placeholder(&self.sequence) {
                    Some(FieldValue::Placeholder)
                } else {
                    Some(FieldValue::Seq(self.sequence.clone()))
                }
            }
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("name", FieldValue::Name(n)) => self.name = n,
            ("sequence", FieldValue::Seq(s)) => self.sequence = s,
            ("sequence", FieldValue::Placeholder) => {
                self.sequence = sequence::PLACEHOLDER.into()
            }
            _ => return Err(type_mismatch(field)),
        }
        Ok(())
    }

    fn name_field() -> Option<&'static str> {
        Some("name")
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link<N, T: OptFields> {
    pub from_segment: N,
    pub from_orient: Orientation,
    pub to_segment: N,
    pub to_orient: Orientation,
    pub overlap: BString,
    pub optional: T,
}

impl<T: OptFields> Link<BString, T> {
    pub fn new(
        from_segment: &[u8],
        from_orient: Orientation,
        to_segment: &[u8],
        to_orient: Orientation,
        overlap: &[u8],
    ) -> Link<BString, T> {
        Link {
            from_segment: from_segment.into(),
            from_orient,
            to_segment: to_segment.into(),
            to_orient,
            overlap: overlap.into(),
            optional: Default::default(),
        }
    }

    /// A link is circular when it connects a segment with itself.
    pub fn is_circular(&self) -> bool {
        self.from_segment == self.to_segment
    }

    pub fn validate(&self) -> GfaResult<()> {
        FieldType::SegmentName.validate(&self.from_segment)?;
        FieldType::SegmentName.validate(&self.to_segment)?;
        FieldType::Cigar.validate(&self.overlap)?;
        validate_tags(self.optional.fields())
    }
}

const LINK_SCHEMA: &[FieldDef] = &[
    FieldDef::new("from_segment", FieldType::SegmentName),
    FieldDef::new("from_orient", FieldType::Orientation),
    FieldDef::new("to_segment", FieldType::SegmentName),
    FieldDef::new("to_orient", FieldType::Orientation),
    FieldDef::new("overlap", FieldType::Cigar),
];

impl<T: OptFields> RecordSchema for Link<BString, T> {
    const CODE: u8 = b'L';

    fn schema() -> &'static [FieldDef] {
        LINK_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "from_segment" => Some(FieldValue::Name(self.from_segment.clone())),
            "from_orient" => Some(FieldValue::Orient(self.from_orient)),
            "to_segment" => Some(FieldValue::Name(self.to_segment.clone())),
            "to_orient" => Some(FieldValue::Orient(self.to_orient)),
            "overlap" => {
                if self.overlap == "*" {
                    Some(FieldValue::Placeholder)
                } else {
                    crate::cigar::CIGAR::from_bytestring(&self.overlap)
                        .map(FieldValue::Cigar)
                }
            }
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("from_segment", FieldValue::Name(n)) => self.from_segment = n,
            ("to_segment", FieldValue::Name(n)) => self.to_segment = n,
            ("from_orient", FieldValue::Orient(o)) => self.from_orient = o,
            ("to_orient", FieldValue::Orient(o)) => self.to_orient = o,
            ("overlap", FieldValue::Cigar(cg)) => {
                self.overlap = cg.to_string().into()
            }
            ("overlap", FieldValue::Placeholder) => self.overlap = "*".into(),
            _ => return Err(type_mismatch(field)),
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["from_segment", "to_segment"]
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Containment<N, T: OptFields> {
    pub container_name: N,
    pub container_orient: Orientation,
    pub contained_name: N,
    pub contained_orient: Orientation,
    pub pos: usize,
    pub overlap: BString,
    pub optional: T,
}

impl<T: OptFields> Containment<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        FieldType::SegmentName.validate(&self.container_name)?;
        FieldType::SegmentName.validate(&self.contained_name)?;
        FieldType::Cigar.validate(&self.overlap)?;
        validate_tags(self.optional.fields())
    }
}

const CONTAINMENT_SCHEMA: &[FieldDef] = &[
    FieldDef::new("container_name", FieldType::SegmentName),
    FieldDef::new("container_orient", FieldType::Orientation),
    FieldDef::new("contained_name", FieldType::SegmentName),
    FieldDef::new("contained_orient", FieldType::Orientation),
    FieldDef::new("pos", FieldType::Integer),
    FieldDef::new("overlap", FieldType::Cigar),
];

impl<T: OptFields> RecordSchema for Containment<BString, T> {
    const CODE: u8 = b'C';

    fn schema() -> &'static [FieldDef] {
        CONTAINMENT_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "container_name" => {
                Some(FieldValue::Name(self.container_name.clone()))
            }
            "container_orient" => Some(FieldValue::Orient(self.container_orient)),
            "contained_name" => {
                Some(FieldValue::Name(self.contained_name.clone()))
            }
            "contained_orient" => Some(FieldValue::Orient(self.contained_orient)),
            "pos" => Some(FieldValue::Int(self.pos as i64)),
            "overlap" => {
                if self.overlap == "*" {
                    Some(FieldValue::Placeholder)
                } else {
                    crate::cigar::CIGAR::from_bytestring(&self.overlap)
                        .map(FieldValue::Cigar)
                }
            }
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("container_name", FieldValue::Name(n)) => self.container_name = n,
            ("contained_name", FieldValue::Name(n)) => self.contained_name = n,
            ("container_orient", FieldValue::Orient(o)) => {
                self.container_orient = o
            }
            ("contained_orient", FieldValue::Orient(o)) => {
                self.contained_orient = o
            }
            ("pos", FieldValue::Int(p)) if p >= 0 => self.pos = p as usize,
            ("overlap", FieldValue::Cigar(cg)) => {
                self.overlap = cg.to_string().into()
            }
            ("overlap", FieldValue::Placeholder) => self.overlap = "*".into(),
            _ => return Err(type_mismatch(field)),
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["container_name", "contained_name"]
    }
}

/// A GFA1 path. The step list is kept parsed, since renaming and
/// merging rewrite steps in place.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path<N, T: OptFields> {
    pub path_name: BString,
    pub segment_names: Vec<(N, Orientation)>,
    pub overlaps: Vec<Option<crate::cigar::CIGAR>>,
    pub optional: T,
}

impl<N: SegmentId, T: OptFields> Path<N, T> {
    pub fn new(
        path_name: BString,
        segment_names: Vec<(N, Orientation)>,
        overlaps: Vec<Option<crate::cigar::CIGAR>>,
        optional: T,
    ) -> Self {
        Path {
            path_name,
            segment_names,
            overlaps,
            optional,
        }
    }

    /// Parses (and copies!) a segment ID in the path segment list
    pub fn parse_step(input: &[u8]) -> Option<(N, Orientation)> {
        use Orientation::*;
        let last = input.len().checked_sub(1)?;
        let orient = match input[last] {
            b'+' => Forward,
            b'-' => Backward,
            _ => return None,
        };
        let id = N::parse_id(&input[..last])?;
        Some((id, orient))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(N, Orientation)> {
        self.segment_names.iter()
    }
}

impl<T: OptFields> Path<BString, T> {
    /// The step list in its textual `name+,name-` form.
    pub fn steps_bstring(&self) -> BString {
        let mut out = BString::from("");
        for (i, (name, orient)) in self.segment_names.iter().enumerate() {
            if i != 0 {
                out.push(b',');
            }
            out.extend_from_slice(name);
            out.push(orient.plus_minus_as_byte());
        }
        out
    }

    pub fn validate(&self) -> GfaResult<()> {
        FieldType::SegmentName.validate(&self.path_name)?;
        if self.segment_names.is_empty() {
            return Err(GfaError::Inconsistency(format!(
                "path {} has an empty step list",
                self.path_name
            )));
        }
        for (name, _) in self.segment_names.iter() {
            FieldType::SegmentName.validate(name)?;
        }
        let star = self.overlaps.len() == 1 && self.overlaps[0].is_none();
        if !star && self.overlaps.len() + 1 != self.segment_names.len() {
            return Err(GfaError::Inconsistency(format!(
                "path {}: {} overlaps for {} steps",
                self.path_name,
                self.overlaps.len(),
                self.segment_names.len()
            )));
        }
        validate_tags(self.optional.fields())
    }
}

const PATH_SCHEMA: &[FieldDef] = &[
    FieldDef::new("path_name", FieldType::SegmentName),
    FieldDef::new("segment_names", FieldType::Generic),
    FieldDef::new("overlaps", FieldType::AlignmentList),
];

impl<T: OptFields> RecordSchema for Path<BString, T> {
    const CODE: u8 = b'P';

    fn schema() -> &'static [FieldDef] {
        PATH_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "path_name" => Some(FieldValue::Name(self.path_name.clone())),
            "segment_names" => Some(FieldValue::Str(self.steps_bstring())),
            "overlaps" => Some(FieldValue::AlignmentList(self.overlaps.clone())),
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("path_name", FieldValue::Name(n)) => self.path_name = n,
            ("segment_names", FieldValue::Str(steps)) => {
                let parsed: Option<Vec<_>> =
                    steps.split_str(b",").map(Self::parse_step).collect();
                self.segment_names = parsed.ok_or_else(|| {
                    GfaError::Format("invalid path step list".into())
                })?;
            }
            ("overlaps", FieldValue::AlignmentList(o)) => self.overlaps = o,
            _ => return Err(type_mismatch(field)),
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["segment_names"]
    }

    fn name_field() -> Option<&'static str> {
        Some("path_name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_iter() {
        use Orientation::*;
        let path: Path<BString, ()> = Path::new(
            "14".into(),
            vec![
                ("11".into(), Forward),
                ("12".into(), Backward),
                ("13".into(), Forward),
            ],
            vec![
                crate::cigar::CIGAR::from_bytestring(b"4M"),
                crate::cigar::CIGAR::from_bytestring(b"5M"),
            ],
            (),
        );
        let mut path_iter = path.iter();
        assert_eq!(Some(&("11".into(), Forward)), path_iter.next());
        assert_eq!(Some(&("12".into(), Backward)), path_iter.next());
        assert_eq!(Some(&("13".into(), Forward)), path_iter.next());
        assert_eq!(None, path_iter.next());
        assert_eq!(path.steps_bstring(), BString::from("11+,12-,13+"));
    }

    #[test]
    fn segment_schema_access() {
        let mut seg: Segment<BString, OptionalFields> =
            Segment::new(b"A", b"ACGT");
        assert_eq!(
            seg.positional("name"),
            Some(FieldValue::Name("A".into()))
        );
        seg.set_positional("sequence", FieldValue::Seq("TTTT".into()))
            .unwrap();
        assert_eq!(seg.sequence, BString::from("TTTT"));
        assert!(seg
            .set_positional("name", FieldValue::Int(3))
            .is_err());
    }

    #[test]
    fn segment_ln_invariant() {
        let mut seg: Segment<BString, OptionalFields> =
            Segment::new(b"A", b"ACGT");
        seg.optional.set_tag_int(b"LN", 4);
        assert!(seg.validate().is_ok());
        seg.optional.set_tag_int(b"LN", 5);
        assert!(matches!(
            seg.validate(),
            Err(GfaError::Inconsistency(_))
        ));
    }

    #[test]
    fn path_overlap_count_invariant() {
        let mk = |overlaps| -> Path<BString, ()> {
            Path::new(
                "p".into(),
                vec![
                    ("a".into(), Orientation::Forward),
                    ("b".into(), Orientation::Forward),
                ],
                overlaps,
                (),
            )
        };
        assert!(mk(vec![crate::cigar::CIGAR::from_bytestring(b"2M")])
            .validate()
            .is_ok());
        assert!(mk(vec![None]).validate().is_ok());
        assert!(mk(vec![
            crate::cigar::CIGAR::from_bytestring(b"2M"),
            crate::cigar::CIGAR::from_bytestring(b"2M")
        ])
        .validate()
        .is_err());
    }
}
