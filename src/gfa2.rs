use bstr::{BString, ByteSlice};
use serde::{Deserialize, Serialize};

use crate::error::{GfaError, GfaResult};
use crate::fieldtype::{FieldDef, FieldType, FieldValue, Position};
use crate::gfa::{Orientation, RecordSchema};
use crate::optfields::*;
use crate::sequence;

/// An identifier together with the orientation it is referenced in,
/// e.g. `sid1` of an E line.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oriented<N> {
    pub id: N,
    pub orient: Orientation,
}

impl<N> Oriented<N> {
    pub fn new(id: N, orient: Orientation) -> Self {
        Oriented { id, orient }
    }
}

impl Oriented<BString> {
    /// Parse a `<id><+|-> ` reference.
    pub fn parse(input: &[u8]) -> Option<Self> {
        let last = input.len().checked_sub(1)?;
        let orient = Orientation::from_bytes_plus_minus(&input[last..])?;
        if last == 0 {
            return None;
        }
        Some(Oriented::new(input[..last].into(), orient))
    }
}

impl<N: std::fmt::Display> std::fmt::Display for Oriented<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.id, self.orient)
    }
}

/// Per-record identifiers may be the placeholder `*`, in which case
/// the record is anonymous.
pub type OptionalId<N> = Option<N>;

fn validate_opt_id(id: &OptionalId<BString>) -> GfaResult<()> {
    match id {
        Some(id) => FieldType::IdentifierGfa2.validate(id),
        None => Ok(()),
    }
}

/// A GFA2 segment: `S <sid> <slen> <sequence>`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment2<N, T: OptFields> {
    pub name: N,
    pub slen: i64,
    pub sequence: BString,
    pub optional: T,
}

impl<T: OptFields> Segment2<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        FieldType::IdentifierGfa2.validate(&self.name)?;
        FieldType::Sequence.validate(&self.sequence)?;
        if let Some(len) = sequence::len_of(self.sequence.as_bstr()) {
            if self.slen != len as i64 {
                return Err(GfaError::Inconsistency(format!(
                    "segment {}: slen is {} but the sequence has length {}",
                    self.name, self.slen, len
                )));
            }
        }
        validate_tags(self.optional.fields())
    }
}

const SEGMENT2_SCHEMA: &[FieldDef] = &[
    FieldDef::new("sid", FieldType::IdentifierGfa2),
    FieldDef::new("slen", FieldType::Integer),
    FieldDef::new("sequence", FieldType::Sequence),
];

impl<T: OptFields> RecordSchema for Segment2<BString, T> {
    const CODE: u8 = b'S';

    fn schema() -> &'static [FieldDef] {
        SEGMENT2_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "sid" => Some(FieldValue::Name(self.name.clone())),
            "slen" => Some(FieldValue::Int(self.slen)),
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
            ("sid", FieldValue::Name(n)) => self.name = n,
            ("slen", FieldValue::Int(l)) => self.slen = l,
            ("sequence", FieldValue::Seq(s)) => self.sequence = s,
            ("sequence", FieldValue::Placeholder) => {
                self.sequence = sequence::PLACEHOLDER.into()
            }
            _ => {
                return Err(GfaError::Type(format!(
                    "value does not fit field {}",
                    field
                )))
            }
        }
        Ok(())
    }

    fn name_field() -> Option<&'static str> {
        Some("sid")
    }
}

/// A GFA2 edge: `E <eid> <sid1> <sid2> <beg1> <end1> <beg2> <end2>
/// <alignment>`. Generalizes both links and containments.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<N, T: OptFields> {
    pub id: OptionalId<N>,
    pub sid1: Oriented<N>,
    pub sid2: Oriented<N>,
    pub beg1: Position,
    pub end1: Position,
    pub beg2: Position,
    pub end2: Position,
    pub alignment: BString,
    pub optional: T,
}

impl<T: OptFields> Edge<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        validate_opt_id(&self.id)?;
        FieldType::IdentifierGfa2.validate(&self.sid1.id)?;
        FieldType::IdentifierGfa2.validate(&self.sid2.id)?;
        FieldType::Alignment.validate(&self.alignment)?;
        for (beg, end) in [(&self.beg1, &self.end1), (&self.beg2, &self.end2)] {
            if beg.value > end.value {
                return Err(GfaError::Inconsistency(format!(
                    "edge range {}..{} is reversed",
                    beg, end
                )));
            }
        }
        validate_tags(self.optional.fields())
    }
}

const EDGE_SCHEMA: &[FieldDef] = &[
    FieldDef::new("eid", FieldType::OptionalIdentifierGfa2),
    FieldDef::new("sid1", FieldType::IdentifierGfa2),
    FieldDef::new("sid2", FieldType::IdentifierGfa2),
    FieldDef::new("beg1", FieldType::Position),
    FieldDef::new("end1", FieldType::Position),
    FieldDef::new("beg2", FieldType::Position),
    FieldDef::new("end2", FieldType::Position),
    FieldDef::new("alignment", FieldType::Alignment),
];

impl<T: OptFields> RecordSchema for Edge<BString, T> {
    const CODE: u8 = b'E';

    fn schema() -> &'static [FieldDef] {
        EDGE_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "eid" => Some(match &self.id {
                Some(id) => FieldValue::Name(id.clone()),
                None => FieldValue::Placeholder,
            }),
            "sid1" => Some(FieldValue::Str(self.sid1.to_string().into())),
            "sid2" => Some(FieldValue::Str(self.sid2.to_string().into())),
            "beg1" => Some(FieldValue::Pos(self.beg1)),
            "end1" => Some(FieldValue::Pos(self.end1)),
            "beg2" => Some(FieldValue::Pos(self.beg2)),
            "end2" => Some(FieldValue::Pos(self.end2)),
            "alignment" => Some(if self.alignment == "*" {
                FieldValue::Placeholder
            } else {
                FieldValue::Str(self.alignment.clone())
            }),
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("eid", FieldValue::Name(n)) => self.id = Some(n),
            ("eid", FieldValue::Placeholder) => self.id = None,
            ("beg1", FieldValue::Pos(p)) => self.beg1 = p,
            ("end1", FieldValue::Pos(p)) => self.end1 = p,
            ("beg2", FieldValue::Pos(p)) => self.beg2 = p,
            ("end2", FieldValue::Pos(p)) => self.end2 = p,
            ("alignment", FieldValue::Str(a)) => self.alignment = a,
            ("alignment", FieldValue::Placeholder) => self.alignment = "*".into(),
            (side @ ("sid1" | "sid2"), FieldValue::Str(s)) => {
                let oriented = Oriented::parse(&s).ok_or_else(|| {
                    GfaError::Format("invalid oriented reference".into())
                })?;
                if side == "sid1" {
                    self.sid1 = oriented;
                } else {
                    self.sid2 = oriented;
                }
            }
            _ => {
                return Err(GfaError::Type(format!(
                    "value does not fit field {}",
                    field
                )))
            }
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["sid1", "sid2"]
    }

    fn name_field() -> Option<&'static str> {
        Some("eid")
    }
}

/// A GFA2 fragment: `F <sid> <external> <s_beg> <s_end> <f_beg>
/// <f_end> <alignment>`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment<N, T: OptFields> {
    pub sid: N,
    pub external: Oriented<N>,
    pub s_beg: Position,
    pub s_end: Position,
    pub f_beg: Position,
    pub f_end: Position,
    pub alignment: BString,
    pub optional: T,
}

impl<T: OptFields> Fragment<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        FieldType::IdentifierGfa2.validate(&self.sid)?;
        FieldType::IdentifierGfa2.validate(&self.external.id)?;
        FieldType::Alignment.validate(&self.alignment)?;
        validate_tags(self.optional.fields())
    }
}

const FRAGMENT_SCHEMA: &[FieldDef] = &[
    FieldDef::new("sid", FieldType::IdentifierGfa2),
    FieldDef::new("external", FieldType::IdentifierGfa2),
    FieldDef::new("s_beg", FieldType::Position),
    FieldDef::new("s_end", FieldType::Position),
    FieldDef::new("f_beg", FieldType::Position),
    FieldDef::new("f_end", FieldType::Position),
    FieldDef::new("alignment", FieldType::Alignment),
];

impl<T: OptFields> RecordSchema for Fragment<BString, T> {
    const CODE: u8 = b'F';

    fn schema() -> &'static [FieldDef] {
        FRAGMENT_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "sid" => Some(FieldValue::Name(self.sid.clone())),
            "external" => Some(FieldValue::Str(self.external.to_string().into())),
            "s_beg" => Some(FieldValue::Pos(self.s_beg)),
            "s_end" => Some(FieldValue::Pos(self.s_end)),
            "f_beg" => Some(FieldValue::Pos(self.f_beg)),
            "f_end" => Some(FieldValue::Pos(self.f_end)),
            "alignment" => Some(if self.alignment == "*" {
                FieldValue::Placeholder
            } else {
                FieldValue::Str(self.alignment.clone())
            }),
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("sid", FieldValue::Name(n)) => self.sid = n,
            ("external", FieldValue::Str(s)) => {
                self.external = Oriented::parse(&s).ok_or_else(|| {
                    GfaError::Format("invalid oriented reference".into())
                })?;
            }
            ("s_beg", FieldValue::Pos(p)) => self.s_beg = p,
            ("s_end", FieldValue::Pos(p)) => self.s_end = p,
            ("f_beg", FieldValue::Pos(p)) => self.f_beg = p,
            ("f_end", FieldValue::Pos(p)) => self.f_end = p,
            ("alignment", FieldValue::Str(a)) => self.alignment = a,
            ("alignment", FieldValue::Placeholder) => self.alignment = "*".into(),
            _ => {
                return Err(GfaError::Type(format!(
                    "value does not fit field {}",
                    field
                )))
            }
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["sid"]
    }
}

/// A GFA2 gap: `G <gid> <sid1> <sid2> <dist> <var>`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap<N, T: OptFields> {
    pub id: OptionalId<N>,
    pub sid1: Oriented<N>,
    pub sid2: Oriented<N>,
    pub dist: i64,
    pub var: Option<i64>,
    pub optional: T,
}

impl<T: OptFields> Gap<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        validate_opt_id(&self.id)?;
        FieldType::IdentifierGfa2.validate(&self.sid1.id)?;
        FieldType::IdentifierGfa2.validate(&self.sid2.id)?;
        validate_tags(self.optional.fields())
    }
}

const GAP_SCHEMA: &[FieldDef] = &[
    FieldDef::new("gid", FieldType::OptionalIdentifierGfa2),
    FieldDef::new("sid1", FieldType::IdentifierGfa2),
    FieldDef::new("sid2", FieldType::IdentifierGfa2),
    FieldDef::new("dist", FieldType::Integer),
    FieldDef::new("var", FieldType::Integer),
];

impl<T: OptFields> RecordSchema for Gap<BString, T> {
    const CODE: u8 = b'G';

    fn schema() -> &'static [FieldDef] {
        GAP_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "gid" => Some(match &self.id {
                Some(id) => FieldValue::Name(id.clone()),
                None => FieldValue::Placeholder,
            }),
            "sid1" => Some(FieldValue::Str(self.sid1.to_string().into())),
            "sid2" => Some(FieldValue::Str(self.sid2.to_string().into())),
            "dist" => Some(FieldValue::Int(self.dist)),
            "var" => Some(match self.var {
                Some(v) => FieldValue::Int(v),
                None => FieldValue::Placeholder,
            }),
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("gid", FieldValue::Name(n)) => self.id = Some(n),
            ("gid", FieldValue::Placeholder) => self.id = None,
            ("dist", FieldValue::Int(d)) => self.dist = d,
            ("var", FieldValue::Int(v)) => self.var = Some(v),
            ("var", FieldValue::Placeholder) => self.var = None,
            (side @ ("sid1" | "sid2"), FieldValue::Str(s)) => {
                let oriented = Oriented::parse(&s).ok_or_else(|| {
                    GfaError::Format("invalid oriented reference".into())
                })?;
                if side == "sid1" {
                    self.sid1 = oriented;
                } else {
                    self.sid2 = oriented;
                }
            }
            _ => {
                return Err(GfaError::Type(format!(
                    "value does not fit field {}",
                    field
                )))
            }
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["sid1", "sid2"]
    }

    fn name_field() -> Option<&'static str> {
        Some("gid")
    }
}

/// An ordered group: `O <oid> <ref>[ <ref>]*` with oriented members.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupO<N, T: OptFields> {
    pub id: OptionalId<N>,
    pub items: Vec<Oriented<N>>,
    pub optional: T,
}

impl<T: OptFields> GroupO<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        validate_opt_id(&self.id)?;
        if self.items.is_empty() {
            return Err(GfaError::Inconsistency(
                "ordered group with no members".into(),
            ));
        }
        for item in self.items.iter() {
            FieldType::IdentifierGfa2.validate(&item.id)?;
        }
        validate_tags(self.optional.fields())
    }
}

const GROUP_O_SCHEMA: &[FieldDef] = &[
    FieldDef::new("oid", FieldType::OptionalIdentifierGfa2),
    FieldDef::new("items", FieldType::IdentifierListGfa2),
];

impl<T: OptFields> RecordSchema for GroupO<BString, T> {
    const CODE: u8 = b'O';

    fn schema() -> &'static [FieldDef] {
        GROUP_O_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "oid" => Some(match &self.id {
                Some(id) => FieldValue::Name(id.clone()),
                None => FieldValue::Placeholder,
            }),
            "items" => {
                let mut out = BString::from("");
                for (i, item) in self.items.iter().enumerate() {
                    if i != 0 {
                        out.push(b' ');
                    }
                    out.extend_from_slice(item.to_string().as_bytes());
                }
                Some(FieldValue::Str(out))
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
            ("oid", FieldValue::Name(n)) => self.id = Some(n),
            ("oid", FieldValue::Placeholder) => self.id = None,
            ("items", FieldValue::Str(s)) => {
                let parsed: Option<Vec<_>> =
                    s.split_str(b" ").map(Oriented::parse).collect();
                self.items = parsed.ok_or_else(|| {
                    GfaError::Format("invalid oriented reference list".into())
                })?;
            }
            _ => {
                return Err(GfaError::Type(format!(
                    "value does not fit field {}",
                    field
                )))
            }
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["items"]
    }

    fn name_field() -> Option<&'static str> {
        Some("oid")
    }
}

/// An unordered group: `U <uid> <id>[ <id>]*`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupU<N, T: OptFields> {
    pub id: OptionalId<N>,
    pub items: Vec<N>,
    pub optional: T,
}

impl<T: OptFields> GroupU<BString, T> {
    pub fn validate(&self) -> GfaResult<()> {
        validate_opt_id(&self.id)?;
        if self.items.is_empty() {
            return Err(GfaError::Inconsistency(
                "unordered group with no members".into(),
            ));
        }
        for item in self.items.iter() {
            FieldType::IdentifierGfa2.validate(item)?;
        }
        validate_tags(self.optional.fields())
    }
}

const GROUP_U_SCHEMA: &[FieldDef] = &[
    FieldDef::new("uid", FieldType::OptionalIdentifierGfa2),
    FieldDef::new("items", FieldType::IdentifierListGfa2),
];

impl<T: OptFields> RecordSchema for GroupU<BString, T> {
    const CODE: u8 = b'U';

    fn schema() -> &'static [FieldDef] {
        GROUP_U_SCHEMA
    }

    fn positional(&self, field: &str) -> Option<FieldValue> {
        match field {
            "uid" => Some(match &self.id {
                Some(id) => FieldValue::Name(id.clone()),
                None => FieldValue::Placeholder,
            }),
            "items" => Some(FieldValue::Str(bstr::join(" ", &self.items).into())),
            _ => None,
        }
    }

    fn set_positional(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> GfaResult<()> {
        match (field, value) {
            ("uid", FieldValue::Name(n)) => self.id = Some(n),
            ("uid", FieldValue::Placeholder) => self.id = None,
            ("items", FieldValue::Str(s)) => {
                self.items =
                    s.split_str(b" ").map(BString::from).collect::<Vec<_>>();
            }
            _ => {
                return Err(GfaError::Type(format!(
                    "value does not fit field {}",
                    field
                )))
            }
        }
        Ok(())
    }

    fn reference_fields() -> &'static [&'static str] {
        &["items"]
    }

    fn name_field() -> Option<&'static str> {
        Some("uid")
    }
}

/// A `#` comment line; the text after the record code is kept
/// verbatim.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub content: BString,
}

/// Any other single-uppercase-letter record type; its fields are kept
/// unparsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRecord {
    pub code: u8,
    pub fields: Vec<BString>,
}

/// Enum containing the different kinds of GFA2 lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Line2<N, T: OptFields> {
    Header(crate::gfa::Header<T>),
    Segment(Segment2<N, T>),
    Edge(Edge<N, T>),
    Fragment(Fragment<N, T>),
    Gap(Gap<N, T>),
    GroupO(GroupO<N, T>),
    GroupU(GroupU<N, T>),
    Comment(Comment),
    Custom(CustomRecord),
}

/// Simple representation of a parsed GFA2 file, one Vec per record
/// type, in input order within each type.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct GFA2<N, T: OptFields> {
    pub header: crate::gfa::Header<T>,
    pub segments: Vec<Segment2<N, T>>,
    pub edges: Vec<Edge<N, T>>,
    pub fragments: Vec<Fragment<N, T>>,
    pub gaps: Vec<Gap<N, T>>,
    pub o_groups: Vec<GroupO<N, T>>,
    pub u_groups: Vec<GroupU<N, T>>,
    pub comments: Vec<Comment>,
    pub custom: Vec<CustomRecord>,
}

impl<N, T: OptFields> GFA2<N, T> {
    pub fn new() -> Self
    where
        N: Default,
    {
        Default::default()
    }

    pub fn insert_line(&mut self, line: Line2<N, T>) {
        use Line2::*;
        match line {
            Header(h) => self.header = h,
            Segment(s) => self.segments.push(s),
            Edge(e) => self.edges.push(e),
            Fragment(f) => self.fragments.push(f),
            Gap(g) => self.gaps.push(g),
            GroupO(o) => self.o_groups.push(o),
            GroupU(u) => self.u_groups.push(u),
            Comment(c) => self.comments.push(c),
            Custom(c) => self.custom.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oriented_parse_and_print() {
        let o = Oriented::parse(b"seg1+").unwrap();
        assert_eq!(o.id, BString::from("seg1"));
        assert_eq!(o.orient, Orientation::Forward);
        assert_eq!(o.to_string(), "seg1+");
        assert!(Oriented::parse(b"+").is_none());
        assert!(Oriented::parse(b"seg1").is_none());
    }

    #[test]
    fn edge_range_invariant() {
        let mut edge: Edge<BString, ()> = Edge {
            id: Some("e1".into()),
            sid1: Oriented::new("a".into(), Orientation::Forward),
            sid2: Oriented::new("b".into(), Orientation::Backward),
            beg1: Position::new(0, false),
            end1: Position::new(10, true),
            beg2: Position::new(0, false),
            end2: Position::new(10, false),
            alignment: "10M".into(),
            optional: (),
        };
        assert!(edge.validate().is_ok());
        edge.beg1 = Position::new(20, false);
        assert!(edge.validate().is_err());
    }

    #[test]
    fn segment2_slen_invariant() {
        let seg: Segment2<BString, ()> = Segment2 {
            name: "s".into(),
            slen: 3,
            sequence: "ACGT".into(),
            optional: (),
        };
        assert!(seg.validate().is_err());
        let ok: Segment2<BString, ()> = Segment2 {
            name: "s".into(),
            slen: 4,
            sequence: "*".into(),
            optional: (),
        };
        // placeholder sequences leave slen unconstrained
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn group_schema_access() {
        let group: GroupO<BString, ()> = GroupO {
            id: Some("o1".into()),
            items: vec![
                Oriented::new("a".into(), Orientation::Forward),
                Oriented::new("b".into(), Orientation::Backward),
            ],
            optional: (),
        };
        assert_eq!(
            group.positional("items"),
            Some(FieldValue::Str("a+ b-".into()))
        );
    }
}
