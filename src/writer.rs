use std::fmt;

use crate::gfa::{Containment, Header, Link, Path, Segment, GFA};
use crate::gfa2::{
    Comment, CustomRecord, Edge, Fragment, Gap, GroupO, GroupU, Segment2, GFA2,
};
use crate::graph::Graph;
use crate::optfields::OptFields;

fn write_tags<T: OptFields>(
    optional: &T,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    for field in optional.fields() {
        write!(f, "\t{}", field)?;
    }
    Ok(())
}

impl<T: OptFields> fmt::Display for Header<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H")?;
        if let Some(version) = &self.version {
            write!(f, "\tVN:Z:{}", version)?;
        }
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Segment<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S\t{}\t{}", self.name, self.sequence)?;
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Link<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L\t{}\t{}\t{}\t{}\t{}",
            self.from_segment,
            self.from_orient,
            self.to_segment,
            self.to_orient,
            self.overlap
        )?;
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Containment<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C\t{}\t{}\t{}\t{}\t{}\t{}",
            self.container_name,
            self.container_orient,
            self.contained_name,
            self.contained_orient,
            self.pos,
            self.overlap
        )?;
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Path<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P\t{}\t", self.path_name)?;
        for (i, (name, orient)) in self.segment_names.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{}{}", name, orient)?;
        }
        write!(f, "\t")?;
        if self.overlaps.is_empty() {
            write!(f, "*")?;
        }
        for (i, overlap) in self.overlaps.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            match overlap {
                Some(cigar) => write!(f, "{}", cigar)?,
                None => write!(f, "*")?,
            }
        }
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Segment2<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S\t{}\t{}\t{}", self.name, self.slen, self.sequence)?;
        write_tags(&self.optional, f)
    }
}

fn write_opt_id<N: fmt::Display>(
    id: &Option<N>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match id {
        Some(id) => write!(f, "{}", id),
        None => write!(f, "*"),
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Edge<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E\t")?;
        write_opt_id(&self.id, f)?;
        write!(
            f,
            "\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.sid1,
            self.sid2,
            self.beg1,
            self.end1,
            self.beg2,
            self.end2,
            self.alignment
        )?;
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Fragment<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "F\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.sid,
            self.external,
            self.s_beg,
            self.s_end,
            self.f_beg,
            self.f_end,
            self.alignment
        )?;
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for Gap<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G\t")?;
        write_opt_id(&self.id, f)?;
        write!(f, "\t{}\t{}\t{}\t", self.sid1, self.sid2, self.dist)?;
        match self.var {
            Some(var) => write!(f, "{}", var)?,
            None => write!(f, "*")?,
        }
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for GroupO<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O\t")?;
        write_opt_id(&self.id, f)?;
        write!(f, "\t")?;
        for (i, item) in self.items.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", item)?;
        }
        write_tags(&self.optional, f)
    }
}

impl<N: fmt::Display, T: OptFields> fmt::Display for GroupU<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U\t")?;
        write_opt_id(&self.id, f)?;
        write!(f, "\t")?;
        for (i, item) in self.items.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", item)?;
        }
        write_tags(&self.optional, f)
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.content)
    }
}

impl fmt::Display for CustomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.code))?;
        for field in self.fields.iter() {
            write!(f, "\t{}", field)?;
        }
        Ok(())
    }
}

/// Write a parsed GFA1 holder: header first, then segments, links,
/// containments, and paths, each in input order.
pub fn write_gfa<N: fmt::Display, T: OptFields, U: fmt::Write>(
    gfa: &GFA<N, T>,
    stream: &mut U,
) -> fmt::Result {
    writeln!(stream, "{}", gfa.header)?;
    for segment in gfa.segments.iter() {
        writeln!(stream, "{}", segment)?;
    }
    for link in gfa.links.iter() {
        writeln!(stream, "{}", link)?;
    }
    for containment in gfa.containments.iter() {
        writeln!(stream, "{}", containment)?;
    }
    for path in gfa.paths.iter() {
        writeln!(stream, "{}", path)?;
    }
    Ok(())
}

pub fn gfa_string<N: fmt::Display, T: OptFields>(gfa: &GFA<N, T>) -> String {
    let mut result = String::new();
    write_gfa(gfa, &mut result).expect("error writing GFA to string");
    result
}

/// Write a graph container: the header first, then every record type
/// in insertion order. Virtual segments are placeholders, not
/// records, and are skipped.
pub fn write_graph<U: fmt::Write>(graph: &Graph, stream: &mut U) -> fmt::Result {
    writeln!(stream, "{}", graph.header)?;
    for segment in graph.segments() {
        writeln!(stream, "{}", segment)?;
    }
    for (_, link) in graph.links() {
        writeln!(stream, "{}", link)?;
    }
    for (_, containment) in graph.containments() {
        writeln!(stream, "{}", containment)?;
    }
    for (_, path) in graph.paths() {
        writeln!(stream, "{}", path)?;
    }
    Ok(())
}

pub fn graph_string(graph: &Graph) -> String {
    let mut result = String::new();
    write_graph(graph, &mut result).expect("error writing graph to string");
    result
}

/// Write a parsed GFA2 holder, record types in the order segments,
/// edges, fragments, gaps, groups, comments, custom records.
pub fn write_gfa2<N: fmt::Display, T: OptFields, U: fmt::Write>(
    gfa: &GFA2<N, T>,
    stream: &mut U,
) -> fmt::Result {
    writeln!(stream, "{}", gfa.header)?;
    for segment in gfa.segments.iter() {
        writeln!(stream, "{}", segment)?;
    }
    for edge in gfa.edges.iter() {
        writeln!(stream, "{}", edge)?;
    }
    for fragment in gfa.fragments.iter() {
        writeln!(stream, "{}", fragment)?;
    }
    for gap in gfa.gaps.iter() {
        writeln!(stream, "{}", gap)?;
    }
    for group in gfa.o_groups.iter() {
        writeln!(stream, "{}", group)?;
    }
    for group in gfa.u_groups.iter() {
        writeln!(stream, "{}", group)?;
    }
    for comment in gfa.comments.iter() {
        writeln!(stream, "{}", comment)?;
    }
    for custom in gfa.custom.iter() {
        writeln!(stream, "{}", custom)?;
    }
    Ok(())
}

pub fn gfa2_string<N: fmt::Display, T: OptFields>(gfa: &GFA2<N, T>) -> String {
    let mut result = String::new();
    write_gfa2(gfa, &mut result).expect("error writing GFA2 to string");
    result
}

impl Graph {
    /// The graph as GFA1 text, header first, records in insertion
    /// order.
    pub fn to_gfa_string(&self) -> String {
        graph_string(self)
    }

    pub fn to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> std::io::Result<()> {
        use std::io::Write;
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        file.write_all(self.to_gfa_string().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::Orientation;
    use crate::optfields::{OptField, OptFieldVal};
    use bstr::BString;

    #[test]
    fn print_segment() {
        let mut segment: Segment<BString, Vec<OptField>> =
            Segment::new(b"seg1", b"GCCCTA");
        assert_eq!(segment.to_string(), "S\tseg1\tGCCCTA");
        segment.optional.push(OptField::new(b"LN", OptFieldVal::Int(6)));
        assert_eq!(segment.to_string(), "S\tseg1\tGCCCTA\tLN:i:6");
    }

    #[test]
    fn print_link() {
        let link: Link<BString, ()> = Link::new(
            b"13",
            Orientation::Forward,
            b"552",
            Orientation::Backward,
            b"0M",
        );
        assert_eq!(link.to_string(), "L\t13\t+\t552\t-\t0M");
    }

    #[test]
    fn print_path() {
        let path: Path<BString, ()> = Path::new(
            "path1".into(),
            vec![
                ("13".into(), Orientation::Forward),
                ("51".into(), Orientation::Backward),
                ("241".into(), Orientation::Forward),
            ],
            vec![
                crate::cigar::CIGAR::from_bytestring(b"8M"),
                crate::cigar::CIGAR::from_bytestring(b"1M"),
                crate::cigar::CIGAR::from_bytestring(b"3M"),
            ],
            (),
        );
        assert_eq!(path.to_string(), "P\tpath1\t13+,51-,241+\t8M,1M,3M");
    }

    #[test]
    fn graph_round_trips() {
        let text = "H\tVN:Z:1.0\nS\tA\tACGT\tLN:i:4\nS\tB\tTT\nL\tA\t+\tB\t+\t2M\n";
        let graph = Graph::read_string(text.as_bytes(), true).unwrap();
        assert_eq!(graph.to_gfa_string(), text);

        // and the round trip is a fixed point
        let again = Graph::read_string(graph.to_gfa_string().as_bytes(), true)
            .unwrap();
        assert_eq!(again.to_gfa_string(), text);
    }

    #[test]
    fn gfa2_round_trips() {
        let text = "H\tVN:Z:2.0\nS\tA\t4\tACGT\nE\t*\tA+\tB-\t0\t4$\t0\t4\t4M\nO\to1\tA+ B-\n# note\n";
        let parser: crate::parser::GFA2Parser<Vec<OptField>> =
            crate::parser::GFA2Parser::new();
        let gfa = parser
            .parse_lines(text.as_bytes().split(|&b| b == b'\n'))
            .unwrap();
        assert_eq!(gfa2_string(&gfa), text);
    }
}
