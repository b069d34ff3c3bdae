pub mod error;

pub use self::error::{
    GFAFieldResult, GFAResult, ParseError, ParseFieldError, ParserTolerance,
};

use bstr::{BStr, BString, ByteSlice};
use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::fieldtype::{FieldDef, Position};
use crate::gfa::*;
use crate::gfa2::*;
use crate::optfields::*;

/// Builder struct for GFAParsers
#[derive(Debug, Clone)]
pub struct GFAParserBuilder {
    pub segments: bool,
    pub links: bool,
    pub containments: bool,
    pub paths: bool,
    pub tolerance: ParserTolerance,
    pub validation: bool,
}

impl GFAParserBuilder {
    /// Parse no GFA lines, useful if you only want to parse one line type.
    pub fn none() -> Self {
        GFAParserBuilder {
            segments: false,
            links: false,
            containments: false,
            paths: false,
            tolerance: Default::default(),
            validation: false,
        }
    }

    /// Parse all GFA lines.
    pub fn all() -> Self {
        GFAParserBuilder {
            segments: true,
            links: true,
            containments: true,
            paths: true,
            tolerance: Default::default(),
            validation: false,
        }
    }

    pub fn ignore_errors(mut self) -> Self {
        self.tolerance = ParserTolerance::IgnoreAll;
        self
    }

    pub fn ignore_safe_errors(mut self) -> Self {
        self.tolerance = ParserTolerance::Safe;
        self
    }

    pub fn pedantic_errors(mut self) -> Self {
        self.tolerance = ParserTolerance::Pedantic;
        self
    }

    /// Check every positional field against its schema datatype and
    /// enforce the tag rules while parsing.
    pub fn validating(mut self) -> Self {
        self.validation = true;
        self
    }

    pub fn build<N: SegmentId, T: OptFields>(self) -> GFAParser<N, T> {
        GFAParser {
            segments: self.segments,
            links: self.links,
            containments: self.containments,
            paths: self.paths,
            tolerance: self.tolerance,
            validation: self.validation,
            _optional_fields: std::marker::PhantomData,
            _segment_names: std::marker::PhantomData,
        }
    }

    pub fn build_usize_id<T: OptFields>(self) -> GFAParser<usize, T> {
        self.build()
    }

    pub fn build_bstr_id<T: OptFields>(self) -> GFAParser<BString, T> {
        self.build()
    }

    pub fn build_gfa2<T: OptFields>(self) -> GFA2Parser<T> {
        GFA2Parser {
            tolerance: self.tolerance,
            validation: self.validation,
            _optional_fields: std::marker::PhantomData,
        }
    }
}

pub struct GFAParser<N: SegmentId, T: OptFields> {
    segments: bool,
    links: bool,
    containments: bool,
    paths: bool,
    tolerance: ParserTolerance,
    validation: bool,
    _optional_fields: std::marker::PhantomData<T>,
    _segment_names: std::marker::PhantomData<N>,
}

impl<N: SegmentId, T: OptFields> Default for GFAParser<N, T> {
    fn default() -> Self {
        let config = GFAParserBuilder::all();
        config.build()
    }
}

impl<N: SegmentId, T: OptFields> GFAParser<N, T> {
    /// Create a new GFAParser that will parse all four GFA line
    /// types, and use the optional fields parser and storage `T`.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn parse_gfa_line(&self, bytes: &[u8]) -> GFAResult<Line<N, T>> {
        let line: &BStr = bytes.trim().as_ref();
        if line.is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let fields: Vec<&[u8]> = line.split_str(b"\t").collect();
        let hdr = fields[0];

        let invalid_line =
            |e: ParseFieldError| ParseError::invalid_line(e, bytes);

        if self.validation {
            validate_line(hdr, &fields[1..])?;
        }

        let rest = fields[1..].iter();
        let line = match hdr {
            b"H" => Header::parse_line(rest).map(Header::wrap),
            b"S" if self.segments => {
                Segment::parse_line(rest).map(Segment::wrap)
            }
            b"L" if self.links => Link::parse_line(rest).map(Link::wrap),
            b"C" if self.containments => {
                Containment::parse_line(rest).map(Containment::wrap)
            }
            b"P" if self.paths => Path::parse_line(rest).map(Path::wrap),
            b"E" | b"F" | b"G" | b"O" | b"U" => {
                return Err(ParseError::WrongVersion(
                    String::from_utf8_lossy(line).into_owned(),
                ))
            }
            _ => return Err(ParseError::UnknownLineType),
        }
        .map_err(invalid_line)?;
        Ok(line)
    }

    pub fn parse_lines<I>(&self, lines: I) -> GFAResult<GFA<N, T>>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let mut gfa = GFA::new();

        for line in lines {
            match self.parse_gfa_line(line.as_ref()) {
                Ok(parsed) => gfa.insert_line(parsed),
                Err(err) if err.can_safely_continue(&self.tolerance) => (),
                Err(err) => return Err(err),
            };
        }

        Ok(gfa)
    }

    pub fn parse_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<GFA<N, T>, ParseError> {
        use {
            bstr::io::BufReadExt,
            std::{fs::File, io::BufReader},
        };

        let file = File::open(path)?;
        let lines = BufReader::new(file).byte_lines();

        let mut gfa = GFA::new();

        for line in lines {
            let line = line?;
            match self.parse_gfa_line(line.as_ref()) {
                Ok(parsed) => gfa.insert_line(parsed),
                Err(err) if err.can_safely_continue(&self.tolerance) => (),
                Err(err) => return Err(err),
            };
        }

        Ok(gfa)
    }
}

/// Check the positional fields of a line against its record-type
/// schema, and the remaining fields against the tag rules.
fn validate_line(hdr: &[u8], fields: &[&[u8]]) -> GFAResult<()> {
    let schema: &[FieldDef] = match hdr {
        b"H" => &[],
        b"S" => Segment::<BString, ()>::schema(),
        b"L" => Link::<BString, ()>::schema(),
        b"C" => Containment::<BString, ()>::schema(),
        b"P" => Path::<BString, ()>::schema(),
        _ => return Ok(()),
    };
    validate_positionals(schema, fields)?;
    validate_tag_fields(&fields[schema.len()..])
}

fn validate_positionals(
    schema: &[FieldDef],
    fields: &[&[u8]],
) -> GFAResult<()> {
    if fields.len() < schema.len() {
        return Err(ParseError::InvalidRecord(format!(
            "{} positional fields, expected {}",
            fields.len(),
            schema.len()
        )));
    }
    for (def, raw) in schema.iter().zip(fields.iter()) {
        def.datatype
            .validate(raw)
            .map_err(|e| ParseError::InvalidRecord(e.to_string()))?;
    }
    Ok(())
}

fn validate_tag_fields(fields: &[&[u8]]) -> GFAResult<()> {
    let mut parsed = Vec::with_capacity(fields.len());
    for raw in fields {
        parsed.push(
            OptField::parse_result(raw)
                .map_err(|e| ParseError::InvalidRecord(e.to_string()))?,
        );
    }
    validate_tags(&parsed).map_err(|e| ParseError::InvalidRecord(e.to_string()))
}

fn next_field<I, P>(mut input: I) -> GFAFieldResult<P>
where
    I: Iterator<Item = P>,
    P: AsRef<[u8]>,
{
    input.next().ok_or(ParseFieldError::MissingFields)
}

fn parse_orientation<I>(mut input: I) -> GFAFieldResult<Orientation>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    let next = next_field(&mut input)?;
    let parsed = Orientation::from_bytes_plus_minus(next.as_ref());
    Orientation::parse_error(parsed)
}

impl<T: OptFields> Header<T> {
    #[inline]
    fn wrap<N: SegmentId>(self) -> Line<N, T> {
        Line::Header(self)
    }

    #[inline]
    fn wrap2<N: SegmentId>(self) -> Line2<N, T> {
        Line2::Header(self)
    }

    fn parse_line<I>(input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let fields: Vec<_> = input.collect();
        let mut version = None;
        let mut rest = &fields[..];

        if let Some(first) = fields.first() {
            if let Some(opt) = OptField::parse(first.as_ref()) {
                if opt.tag == *b"VN" {
                    if let crate::optfields::OptFieldVal::Z(v) = opt.value {
                        version = Some(v);
                        rest = &fields[1..];
                    }
                }
            }
        }

        let optional = T::parse(rest.iter().map(|f| f.as_ref()));

        Ok(Header { version, optional })
    }
}

fn parse_sequence<I>(input: &mut I) -> GFAFieldResult<BString>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    lazy_static! {
        static ref RE: Regex = Regex::new(r"(?-u)^(\*|[A-Za-z=.]+)$").unwrap();
    }

    let next = next_field(input)?;
    if RE.is_match(next.as_ref()) {
        Ok(BString::from(next.as_ref()))
    } else {
        Err(ParseFieldError::InvalidField("Sequence"))
    }
}

impl<N: SegmentId, T: OptFields> Segment<N, T> {
    #[inline]
    fn wrap(self) -> Line<N, T> {
        Line::Segment(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let name = N::parse_next(&mut input)?;
        let sequence = parse_sequence(&mut input)?;
        let optional = T::parse(input);
        Ok(Segment {
            name,
            sequence,
            optional,
        })
    }
}

impl<N: SegmentId, T: OptFields> Link<N, T> {
    #[inline]
    fn wrap(self) -> Line<N, T> {
        Line::Link(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let from_segment = N::parse_next(&mut input)?;
        let from_orient = parse_orientation(&mut input)?;
        let to_segment = N::parse_next(&mut input)?;
        let to_orient = parse_orientation(&mut input)?;

        let overlap = next_field(&mut input)?.as_ref().into();

        let optional = T::parse(input);
        Ok(Link {
            from_segment,
            from_orient,
            to_segment,
            to_orient,
            overlap,
            optional,
        })
    }
}

impl<N: SegmentId, T: OptFields> Containment<N, T> {
    #[inline]
    fn wrap(self) -> Line<N, T> {
        Line::Containment(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let container_name = N::parse_next(&mut input)?;
        let container_orient = parse_orientation(&mut input)?;

        let contained_name = N::parse_next(&mut input)?;
        let contained_orient = parse_orientation(&mut input)?;

        let pos = next_field(&mut input)?;
        let pos = pos.as_ref().to_str()?.parse()?;

        let overlap = next_field(&mut input)?.as_ref().into();

        let optional = T::parse(input);

        Ok(Containment {
            container_name,
            container_orient,
            contained_name,
            contained_orient,
            overlap,
            pos,
            optional,
        })
    }
}

impl<N: SegmentId, T: OptFields> Path<N, T> {
    #[inline]
    fn wrap(self) -> Line<N, T> {
        Line::Path(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        // The path name is restricted like a segment name
        let path_name = BString::parse_next(&mut input)?;

        let segment_names = next_field(&mut input)?
            .as_ref()
            .split_str(b",")
            .map(Self::parse_step)
            .collect::<Option<Vec<_>>>()
            .ok_or(ParseFieldError::InvalidField("Path segment list"))?;

        let overlaps = next_field(&mut input)?
            .as_ref()
            .split_str(b",")
            .map(|bs| {
                if bs == b"*" {
                    None
                } else {
                    crate::cigar::CIGAR::from_bytestring(bs)
                }
            })
            .collect();

        let optional = T::parse(input);

        Ok(Path::new(path_name, segment_names, overlaps, optional))
    }
}

/// Parser for GFA2 lines. Unlike the GFA1 parser it always parses
/// every record type, including comments and custom records, and its
/// identifiers are always byte strings.
pub struct GFA2Parser<T: OptFields> {
    tolerance: ParserTolerance,
    validation: bool,
    _optional_fields: std::marker::PhantomData<T>,
}

impl<T: OptFields> Default for GFA2Parser<T> {
    fn default() -> Self {
        GFAParserBuilder::all().build_gfa2()
    }
}

impl<T: OptFields> GFA2Parser<T> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn parse_gfa2_line(&self, bytes: &[u8]) -> GFAResult<Line2<BString, T>> {
        let line: &BStr = bytes.trim_end().as_ref();
        if line.is_empty() {
            return Err(ParseError::EmptyLine);
        }

        if let Some(content) = line.strip_prefix(b"#") {
            return Ok(Line2::Comment(Comment {
                content: content.into(),
            }));
        }

        let fields: Vec<&[u8]> = line.split_str(b"\t").collect();
        let hdr = fields[0];

        let invalid_line =
            |e: ParseFieldError| ParseError::invalid_line(e, bytes);

        if self.validation {
            validate_line2(hdr, &fields[1..])?;
        }

        let rest = fields[1..].iter();
        let line = match hdr {
            b"H" => Header::parse_line(rest).map(Header::wrap2),
            b"S" => Segment2::parse_line(rest).map(Segment2::wrap2),
            b"E" => Edge::parse_line(rest).map(Edge::wrap2),
            b"F" => Fragment::parse_line(rest).map(Fragment::wrap2),
            b"G" => Gap::parse_line(rest).map(Gap::wrap2),
            b"O" => GroupO::parse_line(rest).map(GroupO::wrap2),
            b"U" => GroupU::parse_line(rest).map(GroupU::wrap2),
            b"L" | b"C" | b"P" => {
                return Err(ParseError::WrongVersion(
                    String::from_utf8_lossy(line).into_owned(),
                ))
            }
            [code] if code.is_ascii_uppercase() => {
                return Ok(Line2::Custom(CustomRecord {
                    code: *code,
                    fields: fields[1..].iter().map(|f| BString::from(*f)).collect(),
                }))
            }
            _ => return Err(ParseError::UnknownLineType),
        }
        .map_err(invalid_line)?;
        Ok(line)
    }

    pub fn parse_lines<I>(&self, lines: I) -> GFAResult<GFA2<BString, T>>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let mut gfa = GFA2::new();

        for line in lines {
            match self.parse_gfa2_line(line.as_ref()) {
                Ok(parsed) => gfa.insert_line(parsed),
                Err(err) if err.can_safely_continue(&self.tolerance) => (),
                Err(err) => return Err(err),
            };
        }

        Ok(gfa)
    }

    pub fn parse_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<GFA2<BString, T>, ParseError> {
        use {
            bstr::io::BufReadExt,
            std::{fs::File, io::BufReader},
        };

        let file = File::open(path)?;
        let lines = BufReader::new(file).byte_lines();

        let mut gfa = GFA2::new();

        for line in lines {
            let line = line?;
            match self.parse_gfa2_line(line.as_ref()) {
                Ok(parsed) => gfa.insert_line(parsed),
                Err(err) if err.can_safely_continue(&self.tolerance) => (),
                Err(err) => return Err(err),
            };
        }

        Ok(gfa)
    }
}

fn validate_line2(hdr: &[u8], fields: &[&[u8]]) -> GFAResult<()> {
    let schema: &[FieldDef] = match hdr {
        b"H" => &[],
        b"S" => Segment2::<BString, ()>::schema(),
        b"E" => Edge::<BString, ()>::schema(),
        b"F" => Fragment::<BString, ()>::schema(),
        b"G" => Gap::<BString, ()>::schema(),
        b"O" => GroupO::<BString, ()>::schema(),
        b"U" => GroupU::<BString, ()>::schema(),
        _ => return Ok(()),
    };
    // groups put all their members in one whitespace-joined field
    validate_positionals(schema, fields)?;
    validate_tag_fields(&fields[schema.len()..])
}

fn parse_optional_id<I>(input: &mut I) -> GFAFieldResult<Option<BString>>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    let next = next_field(input)?;
    if next.as_ref() == b"*" {
        Ok(None)
    } else if !next.as_ref().is_empty() {
        Ok(Some(next.as_ref().into()))
    } else {
        Err(ParseFieldError::InvalidField("identifier"))
    }
}

fn parse_oriented<I>(input: &mut I) -> GFAFieldResult<Oriented<BString>>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    let next = next_field(input)?;
    Oriented::parse(next.as_ref())
        .ok_or(ParseFieldError::InvalidField("oriented reference"))
}

fn parse_position<I>(input: &mut I) -> GFAFieldResult<Position>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    let next = next_field(input)?;
    Position::parse(next.as_ref())
        .ok_or(ParseFieldError::InvalidField("position"))
}

impl<T: OptFields> Segment2<BString, T> {
    #[inline]
    fn wrap2(self) -> Line2<BString, T> {
        Line2::Segment(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let name = next_field(&mut input)?.as_ref().into();
        let slen = next_field(&mut input)?.as_ref().to_str()?.parse()?;
        let sequence = parse_sequence(&mut input)?;
        let optional = T::parse(input);
        Ok(Segment2 {
            name,
            slen,
            sequence,
            optional,
        })
    }
}

impl<T: OptFields> Edge<BString, T> {
    #[inline]
    fn wrap2(self) -> Line2<BString, T> {
        Line2::Edge(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let id = parse_optional_id(&mut input)?;
        let sid1 = parse_oriented(&mut input)?;
        let sid2 = parse_oriented(&mut input)?;
        let beg1 = parse_position(&mut input)?;
        let end1 = parse_position(&mut input)?;
        let beg2 = parse_position(&mut input)?;
        let end2 = parse_position(&mut input)?;
        let alignment = next_field(&mut input)?.as_ref().into();
        let optional = T::parse(input);
        Ok(Edge {
            id,
            sid1,
            sid2,
            beg1,
            end1,
            beg2,
            end2,
            alignment,
            optional,
        })
    }
}

impl<T: OptFields> Fragment<BString, T> {
    #[inline]
    fn wrap2(self) -> Line2<BString, T> {
        Line2::Fragment(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let sid = next_field(&mut input)?.as_ref().into();
        let external = parse_oriented(&mut input)?;
        let s_beg = parse_position(&mut input)?;
        let s_end = parse_position(&mut input)?;
        let f_beg = parse_position(&mut input)?;
        let f_end = parse_position(&mut input)?;
        let alignment = next_field(&mut input)?.as_ref().into();
        let optional = T::parse(input);
        Ok(Fragment {
            sid,
            external,
            s_beg,
            s_end,
            f_beg,
            f_end,
            alignment,
            optional,
        })
    }
}

impl<T: OptFields> Gap<BString, T> {
    #[inline]
    fn wrap2(self) -> Line2<BString, T> {
        Line2::Gap(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let id = parse_optional_id(&mut input)?;
        let sid1 = parse_oriented(&mut input)?;
        let sid2 = parse_oriented(&mut input)?;
        let dist = next_field(&mut input)?.as_ref().to_str()?.parse()?;
        let var_raw = next_field(&mut input)?;
        let var = if var_raw.as_ref() == b"*" {
            None
        } else {
            Some(var_raw.as_ref().to_str()?.parse()?)
        };
        let optional = T::parse(input);
        Ok(Gap {
            id,
            sid1,
            sid2,
            dist,
            var,
            optional,
        })
    }
}

impl<T: OptFields> GroupO<BString, T> {
    #[inline]
    fn wrap2(self) -> Line2<BString, T> {
        Line2::GroupO(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let id = parse_optional_id(&mut input)?;
        let items = next_field(&mut input)?
            .as_ref()
            .split_str(b" ")
            .map(Oriented::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or(ParseFieldError::InvalidField("group member list"))?;
        let optional = T::parse(input);
        Ok(GroupO {
            id,
            items,
            optional,
        })
    }
}

impl<T: OptFields> GroupU<BString, T> {
    #[inline]
    fn wrap2(self) -> Line2<BString, T> {
        Line2::GroupU(self)
    }

    #[inline]
    fn parse_line<I>(mut input: I) -> GFAFieldResult<Self>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
    {
        let id = parse_optional_id(&mut input)?;
        let items = next_field(&mut input)?
            .as_ref()
            .split_str(b" ")
            .map(|s| {
                if s.is_empty() {
                    None
                } else {
                    Some(BString::from(s))
                }
            })
            .collect::<Option<Vec<_>>>()
            .ok_or(ParseFieldError::InvalidField("group member list"))?;
        let optional = T::parse(input);
        Ok(GroupU {
            id,
            items,
            optional,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::Orientation;

    #[test]
    fn can_parse_header() {
        let hdr = b"VN:Z:1.0";
        let hdr_ = Header {
            version: Some("1.0".into()),
            optional: (),
        };

        let result: GFAFieldResult<Header<()>> =
            Header::parse_line([hdr].iter());

        match result {
            Err(_) => {
                panic!("Error parsing header");
            }
            Ok(h) => assert_eq!(h, hdr_),
        }
    }

    #[test]
    fn bare_header_has_no_version() {
        let fields: Vec<&[u8]> = Vec::new();
        let h: Header<()> = Header::parse_line(fields.iter()).unwrap();
        assert_eq!(h.version, None);
    }

    #[test]
    fn can_parse_link() {
        let link = "11	+	12	-	4M";
        let link_: Link<BString, ()> = Link {
            from_segment: "11".into(),
            from_orient: Orientation::Forward,
            to_segment: "12".into(),
            to_orient: Orientation::Backward,
            overlap: "4M".into(),
            optional: (),
        };

        let fields = link.split_terminator('\t');
        let result = Link::parse_line(fields);

        match result {
            Err(_) => {
                panic!("Error parsing link");
            }
            Ok(l) => assert_eq!(l, link_),
        }
    }

    #[test]
    fn can_parse_containment() {
        let cont = "1\t-\t2\t+\t110\t100M";

        let cont_: Containment<BString, _> = Containment {
            container_name: "1".into(),
            container_orient: Orientation::Backward,
            contained_name: "2".into(),
            contained_orient: Orientation::Forward,
            overlap: "100M".into(),
            pos: 110,
            optional: (),
        };

        let fields = cont.split_terminator('\t');
        let result = Containment::parse_line(fields);
        match result {
            Err(_) => {
                panic!("Error parsing containment");
            }
            Ok(c) => assert_eq!(c, cont_),
        }
    }

    #[test]
    fn can_parse_path() {
        let path = "14\t11+,12-,13+\t4M,5M";

        let path_: Path<BString, ()> = Path::new(
            "14".into(),
            vec![
                ("11".into(), Orientation::Forward),
                ("12".into(), Orientation::Backward),
                ("13".into(), Orientation::Forward),
            ],
            vec![
                crate::cigar::CIGAR::from_bytestring(b"4M"),
                crate::cigar::CIGAR::from_bytestring(b"5M"),
            ],
            (),
        );

        let fields = path.split_terminator('\t');

        let result = Path::parse_line(fields);

        match result {
            Err(_) => {
                panic!("Error parsing path");
            }
            Ok(p) => assert_eq!(p, path_),
        }
    }

    #[test]
    fn can_parse_gfa_lines() {
        let input = b"H\tVN:Z:1.0
S\t1\tCAAATAAG
S\t2\tA
S\t3\tG
L\t1\t+\t2\t+\t0M
L\t1\t+\t3\t+\t0M
P\t14\t1+,2+\t8M";

        let parser: GFAParser<BString, ()> = GFAParser::new();
        let gfa = parser.parse_lines(input.split(|&b| b == b'\n')).unwrap();

        assert_eq!(gfa.segments.len(), 3);
        assert_eq!(gfa.links.len(), 2);
        assert_eq!(gfa.paths.len(), 1);
        assert_eq!(gfa.header.version, Some("1.0".into()));
    }

    #[test]
    fn gfa2_line_in_gfa1_is_a_version_error() {
        let parser: GFAParser<BString, ()> = GFAParser::new();
        let err = parser
            .parse_gfa_line(b"E\t*\tA+\tB+\t0\t5\t0\t5\t5M")
            .unwrap_err();
        assert!(matches!(err, ParseError::WrongVersion(_)));
    }

    #[test]
    fn gfa_usize_parser_can_fail() {
        let parser: GFAParser<usize, ()> = GFAParser::new();
        let err = parser.parse_gfa_line(b"S\tnotanumber\tACGT").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidLine(ParseFieldError::UintIdError, _)
        ));
    }

    #[test]
    fn segment_parser() {
        use crate::optfields::OptFieldVal::*;
        let name = "11";
        let seq = "ACCTT";
        let segment_bytes = "11\tACCTT\tLN:i:123\tSH:H:AACCFF05\tRC:i:123\tUR:Z:http://test.com/\tIJ:A:x\tAB:B:I,1,2,3,52124";
        let fields = segment_bytes.split_terminator('\t');

        let optional_fields: Vec<_> = vec![
            OptField::new(b"LN", Int(123)),
            OptField::new(b"SH", H(vec![0xAA, 0xCC, 0xFF, 0x05])),
            OptField::new(b"RC", Int(123)),
            OptField::new(b"UR", Z(BString::from("http://test.com/"))),
            OptField::new(b"IJ", A(b'x')),
            OptField::new(b"AB", BInt(b'I', vec![1, 2, 3, 52124])),
        ]
        .into_iter()
        .collect();

        let segment_1: GFAFieldResult<Segment<BString, ()>> =
            Segment::parse_line(fields.clone());

        assert!(segment_1.is_ok());
        assert_eq!(
            Segment {
                name: BString::from(name),
                sequence: BString::from(seq),
                optional: ()
            },
            segment_1.unwrap(),
        );

        let segment_2: Segment<BString, OptionalFields> =
            Segment::parse_line(fields).unwrap();

        assert_eq!(segment_2.name, name);
        assert_eq!(segment_2.sequence, seq);
        assert_eq!(segment_2.optional, optional_fields);
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let strict: GFAParser<BString, OptionalFields> =
            GFAParserBuilder::all().validating().build();
        assert!(strict.parse_gfa_line(b"S\tA\tACGT\tLN:i:4").is_ok());
        assert!(matches!(
            strict.parse_gfa_line(b"S\tA\tAC GT"),
            Err(ParseError::InvalidRecord(_))
        ));
        assert!(matches!(
            strict.parse_gfa_line(b"S\tA\tACGT\tLN:Z:4"),
            Err(ParseError::InvalidRecord(_))
        ));
        assert!(matches!(
            strict.parse_gfa_line(b"S\tA\tACGT\tLN:i:4\tLN:i:5"),
            Err(ParseError::InvalidRecord(_))
        ));

        let lenient: GFAParser<BString, OptionalFields> = GFAParser::new();
        assert!(lenient.parse_gfa_line(b"S\tA\tACGT\tLN:Z:4").is_ok());
    }

    #[test]
    fn gfa2_parser_round() {
        let parser: GFA2Parser<OptionalFields> = GFA2Parser::new();

        let seg = parser.parse_gfa2_line(b"S\tA\t4\tACGT").unwrap();
        assert!(matches!(seg, Line2::Segment(_)));

        let edge = parser
            .parse_gfa2_line(b"E\t*\tA+\tB-\t0\t4$\t0\t4\t4M")
            .unwrap();
        match edge {
            Line2::Edge(e) => {
                assert_eq!(e.id, None);
                assert_eq!(e.sid1.id, BString::from("A"));
                assert_eq!(e.sid2.orient, Orientation::Backward);
                assert!(e.end1.last);
            }
            _ => panic!("expected an edge"),
        }

        let group = parser.parse_gfa2_line(b"O\to1\ta+ b- c+").unwrap();
        match group {
            Line2::GroupO(o) => assert_eq!(o.items.len(), 3),
            _ => panic!("expected an ordered group"),
        }

        let comment = parser.parse_gfa2_line(b"# hello").unwrap();
        match comment {
            Line2::Comment(c) => assert_eq!(c.content, BString::from(" hello")),
            _ => panic!("expected a comment"),
        }

        let custom = parser.parse_gfa2_line(b"X\tfoo\tbar").unwrap();
        match custom {
            Line2::Custom(c) => {
                assert_eq!(c.code, b'X');
                assert_eq!(c.fields.len(), 2);
            }
            _ => panic!("expected a custom record"),
        }

        let wrong = parser.parse_gfa2_line(b"L\tA\t+\tB\t+\t4M");
        assert!(matches!(wrong, Err(ParseError::WrongVersion(_))));
    }
}
