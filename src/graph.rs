pub mod edit;
pub mod segment_end;
pub mod traverse;

pub use edit::{LinksDistribution, MultiplyOptions};
pub use segment_end::{End, LinkSide, SegmentEnd};
pub use traverse::{Connectivity, MergeOptions, MergedName};

use std::collections::HashMap;

use bstr::{BString, ByteSlice};
use log::debug;

use crate::error::{GfaError, GfaResult};
use crate::gfa::{Containment, Header, Line, Link, Path, Segment};
use crate::optfields::OptionalFields;
use crate::parser::{GFAParser, GFAParserBuilder, ParserTolerance};

pub type GraphSegment = Segment<BString, OptionalFields>;
pub type GraphLink = Link<BString, OptionalFields>;
pub type GraphContainment = Containment<BString, OptionalFields>;
pub type GraphPath = Path<BString, OptionalFields>;
pub type GraphLine = Line<BString, OptionalFields>;

pub type LinkIx = usize;
pub type ContainmentIx = usize;
pub type PathIx = usize;

/// A slot in the segment arena. Forward references produce `Virtual`
/// slots carrying only the identifier; the later real definition is
/// promoted in place, so the arena index and every by-name reference
/// stay valid.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSlot {
    Real(GraphSegment),
    Virtual(BString),
}

impl SegmentSlot {
    pub fn name(&self) -> &BString {
        match self {
            SegmentSlot::Real(s) => &s.name,
            SegmentSlot::Virtual(name) => name,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, SegmentSlot::Virtual(_))
    }

    pub fn real(&self) -> Option<&GraphSegment> {
        match self {
            SegmentSlot::Real(s) => Some(s),
            SegmentSlot::Virtual(_) => None,
        }
    }
}

/// The mutable in-memory GFA1 graph: per-type arenas, name tables,
/// and the segment-end connectivity index, kept in sync by every
/// mutation. Record insertion order is stable and drives
/// serialization.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    pub header: Header<OptionalFields>,
    segments: Vec<Option<SegmentSlot>>,
    links: Vec<Option<GraphLink>>,
    containments: Vec<Option<GraphContainment>>,
    paths: Vec<Option<GraphPath>>,
    segment_ids: HashMap<BString, usize>,
    path_ids: HashMap<BString, PathIx>,
    end_links: HashMap<SegmentEnd, Vec<LinkIx>>,
    seg_containments: HashMap<BString, Vec<ContainmentIx>>,
    seg_paths: HashMap<BString, Vec<PathIx>>,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    /// The version declared in the header, if any.
    pub fn version(&self) -> Option<&BString> {
        self.header.version.as_ref()
    }

    /// Insert a parsed line, updating every index. A failed insert
    /// leaves the graph unchanged.
    pub fn add_line(&mut self, line: GraphLine) -> GfaResult<()> {
        match line {
            Line::Header(h) => {
                if let Some(version) = &h.version {
                    if version.starts_with(b"2") {
                        return Err(GfaError::Version(format!(
                            "GFA{} header in a GFA1 graph",
                            version
                        )));
                    }
                }
                self.header = h;
                Ok(())
            }
            Line::Segment(s) => self.add_segment(s),
            Line::Link(l) => self.add_link(l).map(|_| ()),
            Line::Containment(c) => self.add_containment(c).map(|_| ()),
            Line::Path(p) => self.add_path(p),
        }
    }

    /// Insert a segment. A virtual slot with the same name is
    /// promoted in place; a real one is an identity collision.
    pub fn add_segment(&mut self, segment: GraphSegment) -> GfaResult<()> {
        if let Some(&ix) = self.segment_ids.get(&segment.name) {
            let slot = self.segments[ix]
                .as_mut()
                .expect("name table points at a deleted segment");
            if slot.is_virtual() {
                debug!("promoting virtual segment {}", segment.name);
                *slot = SegmentSlot::Real(segment);
                return Ok(());
            }
            return Err(GfaError::NotUnique(segment.name.to_string()));
        }
        if self.path_ids.contains_key(&segment.name) {
            return Err(GfaError::NotUnique(segment.name.to_string()));
        }
        self.segment_ids
            .insert(segment.name.clone(), self.segments.len());
        self.segments.push(Some(SegmentSlot::Real(segment)));
        Ok(())
    }

    /// Make sure a referenced name resolves to a slot, creating a
    /// virtual segment for a forward reference.
    fn ensure_segment(&mut self, name: &BString) {
        if !self.segment_ids.contains_key(name) {
            debug!("forward reference to {}, creating virtual segment", name);
            self.segment_ids.insert(name.clone(), self.segments.len());
            self.segments
                .push(Some(SegmentSlot::Virtual(name.clone())));
        }
    }

    pub fn add_link(&mut self, link: GraphLink) -> GfaResult<LinkIx> {
        self.ensure_segment(&link.from_segment);
        self.ensure_segment(&link.to_segment);

        let ix = self.links.len();
        let from_end = link.from_end();
        let to_end = link.to_end();

        self.end_links.entry(from_end.clone()).or_default().push(ix);
        if to_end != from_end {
            self.end_links.entry(to_end).or_default().push(ix);
        }
        self.links.push(Some(link));
        Ok(ix)
    }

    pub fn add_containment(
        &mut self,
        containment: GraphContainment,
    ) -> GfaResult<ContainmentIx> {
        self.ensure_segment(&containment.container_name);
        self.ensure_segment(&containment.contained_name);

        let ix = self.containments.len();
        self.seg_containments
            .entry(containment.container_name.clone())
            .or_default()
            .push(ix);
        if containment.contained_name != containment.container_name {
            self.seg_containments
                .entry(containment.contained_name.clone())
                .or_default()
                .push(ix);
        }
        self.containments.push(Some(containment));
        Ok(ix)
    }

    pub fn add_path(&mut self, path: GraphPath) -> GfaResult<()> {
        if self.path_ids.contains_key(&path.path_name)
            || self.segment_ids.contains_key(&path.path_name)
        {
            return Err(GfaError::NotUnique(path.path_name.to_string()));
        }
        path.validate()?;

        let names: Vec<BString> = path
            .segment_names
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        for name in names.iter() {
            self.ensure_segment(name);
        }

        let ix = self.paths.len();
        self.path_ids.insert(path.path_name.clone(), ix);
        for name in names {
            let list = self.seg_paths.entry(name).or_default();
            if !list.contains(&ix) {
                list.push(ix);
            }
        }
        self.paths.push(Some(path));
        Ok(())
    }

    /// The slot holding `name`, real or virtual.
    pub fn segment(&self, name: &[u8]) -> Option<&SegmentSlot> {
        let &ix = self.segment_ids.get(name.as_bstr())?;
        self.segments[ix].as_ref()
    }

    /// The real segment called `name`; a missing or virtual segment
    /// is an error.
    pub fn segment_req(&self, name: &[u8]) -> GfaResult<&GraphSegment> {
        self.segment(name)
            .and_then(SegmentSlot::real)
            .ok_or_else(|| GfaError::NotFound(format!("segment {:?}", name.as_bstr())))
    }

    /// Mutable access to a real segment. Mutating a virtual segment
    /// is an unsupported operation.
    pub fn segment_mut(&mut self, name: &[u8]) -> GfaResult<&mut GraphSegment> {
        let &ix = self
            .segment_ids
            .get(name.as_bstr())
            .ok_or_else(|| GfaError::NotFound(format!("segment {:?}", name.as_bstr())))?;
        match self.segments[ix].as_mut() {
            Some(SegmentSlot::Real(s)) => Ok(s),
            Some(SegmentSlot::Virtual(_)) => Err(GfaError::Runtime(format!(
                "cannot mutate virtual segment {:?}",
                name.as_bstr()
            ))),
            None => Err(GfaError::NotFound(format!("segment {:?}", name.as_bstr()))),
        }
    }

    pub fn has_segment(&self, name: &[u8]) -> bool {
        self.segment_ids.contains_key(name.as_bstr())
    }

    /// Real segments in insertion order.
    pub fn segments(&self) -> impl Iterator<Item = &GraphSegment> {
        self.segments
            .iter()
            .filter_map(|slot| slot.as_ref().and_then(SegmentSlot::real))
    }

    /// All segment slots in insertion order, virtual ones included.
    pub fn segment_slots(&self) -> impl Iterator<Item = &SegmentSlot> {
        self.segments.iter().filter_map(|slot| slot.as_ref())
    }

    /// Segment names in insertion order.
    pub fn segment_names(&self) -> Vec<BString> {
        self.segment_slots().map(|s| s.name().clone()).collect()
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn link(&self, ix: LinkIx) -> Option<&GraphLink> {
        self.links.get(ix)?.as_ref()
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkIx, &GraphLink)> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(ix, l)| l.as_ref().map(|l| (ix, l)))
    }

    pub fn link_count(&self) -> usize {
        self.links.iter().flatten().count()
    }

    /// Links incident to a segment end, in insertion order. The view
    /// is a snapshot: any mutation of the graph invalidates it.
    pub fn links_of(&self, end: &SegmentEnd) -> &[LinkIx] {
        self.end_links
            .get(end)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn degree(&self, end: &SegmentEnd) -> usize {
        self.links_of(end).len()
    }

    /// All links touching either end of a segment, deduplicated (a
    /// self-link shows up in both end lists but is listed once).
    pub fn links_of_segment(&self, name: &[u8]) -> Vec<LinkIx> {
        let mut out = Vec::new();
        for end in [End::B, End::E] {
            for &ix in self.links_of(&SegmentEnd::new(name, end)) {
                if !out.contains(&ix) {
                    out.push(ix);
                }
            }
        }
        out
    }

    pub fn containment(&self, ix: ContainmentIx) -> Option<&GraphContainment> {
        self.containments.get(ix)?.as_ref()
    }

    pub fn containments(
        &self,
    ) -> impl Iterator<Item = (ContainmentIx, &GraphContainment)> {
        self.containments
            .iter()
            .enumerate()
            .filter_map(|(ix, c)| c.as_ref().map(|c| (ix, c)))
    }

    pub fn containments_of(&self, name: &[u8]) -> &[ContainmentIx] {
        self.seg_containments
            .get(name.as_bstr())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn path(&self, ix: PathIx) -> Option<&GraphPath> {
        self.paths.get(ix)?.as_ref()
    }

    pub fn path_by_name(&self, name: &[u8]) -> Option<&GraphPath> {
        let &ix = self.path_ids.get(name.as_bstr())?;
        self.path(ix)
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathIx, &GraphPath)> {
        self.paths
            .iter()
            .enumerate()
            .filter_map(|(ix, p)| p.as_ref().map(|p| (ix, p)))
    }

    /// Paths whose step list mentions the segment.
    pub fn paths_with(&self, name: &[u8]) -> &[PathIx] {
        self.seg_paths
            .get(name.as_bstr())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_path(&self, name: &[u8]) -> bool {
        self.path_ids.contains_key(name.as_bstr())
    }

    /// Remove a link from the graph and from both slots of the
    /// connectivity index.
    pub fn delete_link(&mut self, ix: LinkIx) -> GfaResult<()> {
        let link = self
            .links
            .get_mut(ix)
            .and_then(Option::take)
            .ok_or_else(|| GfaError::NotFound(format!("link {}", ix)))?;
        for end in [link.from_end(), link.to_end()] {
            if let Some(list) = self.end_links.get_mut(&end) {
                list.retain(|&l| l != ix);
                if list.is_empty() {
                    self.end_links.remove(&end);
                }
            }
        }
        Ok(())
    }

    pub fn delete_containment(&mut self, ix: ContainmentIx) -> GfaResult<()> {
        let containment = self
            .containments
            .get_mut(ix)
            .and_then(Option::take)
            .ok_or_else(|| GfaError::NotFound(format!("containment {}", ix)))?;
        for name in [containment.container_name, containment.contained_name] {
            if let Some(list) = self.seg_containments.get_mut(&name) {
                list.retain(|&c| c != ix);
                if list.is_empty() {
                    self.seg_containments.remove(&name);
                }
            }
        }
        Ok(())
    }

    pub fn delete_path(&mut self, ix: PathIx) -> GfaResult<()> {
        let path = self
            .paths
            .get_mut(ix)
            .and_then(Option::take)
            .ok_or_else(|| GfaError::NotFound(format!("path {}", ix)))?;
        self.path_ids.remove(&path.path_name);
        for (name, _) in path.segment_names {
            if let Some(list) = self.seg_paths.get_mut(&name) {
                list.retain(|&p| p != ix);
                if list.is_empty() {
                    self.seg_paths.remove(&name);
                }
            }
        }
        Ok(())
    }

    /// Delete a segment and cascade: every link and containment
    /// mentioning it is removed, every path stepping through it is
    /// removed.
    pub fn delete_segment(&mut self, name: &[u8]) -> GfaResult<()> {
        let ix = *self
            .segment_ids
            .get(name.as_bstr())
            .ok_or_else(|| GfaError::NotFound(format!("segment {:?}", name.as_bstr())))?;

        for link_ix in self.links_of_segment(name) {
            self.delete_link(link_ix)?;
        }
        for cont_ix in self.containments_of(name).to_vec() {
            self.delete_containment(cont_ix)?;
        }
        for path_ix in self.paths_with(name).to_vec() {
            self.delete_path(path_ix)?;
        }

        self.seg_containments.remove(name.as_bstr());
        self.seg_paths.remove(name.as_bstr());
        self.end_links.remove(&SegmentEnd::new(name, End::B));
        self.end_links.remove(&SegmentEnd::new(name, End::E));
        self.segment_ids.remove(name.as_bstr());
        self.segments[ix] = None;
        Ok(())
    }

    /// Build a graph from a parsed GFA holder; forward references
    /// are irrelevant here since segments are inserted first.
    pub fn from_gfa(gfa: crate::gfa::GFA<BString, OptionalFields>) -> GfaResult<Self> {
        let mut graph = Graph::new();
        graph.header = gfa.header.clone();
        for line in crate::gfa::gfa_into_iter(gfa) {
            graph.add_line(line)?;
        }
        Ok(graph)
    }

    /// Parse a graph from GFA1 text, promoting forward references.
    /// With `validate` set, every record is checked against its
    /// schema and the record-level invariants before insertion.
    pub fn read_string(text: &[u8], validate: bool) -> GfaResult<Self> {
        let mut builder = GFAParserBuilder::all();
        if validate {
            builder = builder.validating();
        }
        let parser: GFAParser<BString, OptionalFields> = builder.build();
        let tolerance = ParserTolerance::Safe;

        let mut graph = Graph::new();
        for line in text.split_str(b"\n") {
            match parser.parse_gfa_line(line) {
                Ok(parsed) => {
                    if validate {
                        validate_record(&parsed)?;
                    }
                    graph.add_line(parsed)?;
                }
                Err(err) if err.can_safely_continue(&tolerance) => (),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(graph)
    }

    /// Read a graph from a GFA1 file, one line at a time.
    pub fn read_file<P: AsRef<std::path::Path>>(
        path: P,
        validate: bool,
    ) -> GfaResult<Self> {
        let text = std::fs::read(path)?;
        Self::read_string(&text, validate)
    }
}

fn validate_record(line: &GraphLine) -> GfaResult<()> {
    match line {
        Line::Header(_) => Ok(()),
        Line::Segment(s) => s.validate(),
        Line::Link(l) => l.validate(),
        Line::Containment(c) => c.validate(),
        Line::Path(p) => p.validate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::Orientation;
    use crate::optfields::OptFields;

    fn graph_1() -> Graph {
        Graph::read_string(
            b"H\tVN:Z:1.0\nS\tA\tACGT\tLN:i:4\nS\tB\tTT\nL\tA\t+\tB\t+\t2M\n",
            true,
        )
        .unwrap()
    }

    #[test]
    fn build_and_query() {
        let g = graph_1();
        assert_eq!(g.segment_count(), 2);
        assert_eq!(g.link_count(), 1);
        assert_eq!(
            g.segment_req(b"A").unwrap().optional.get_tag_int(b"LN"),
            Some(4)
        );
        assert_eq!(g.links_of(&SegmentEnd::new(b"A", End::E)).len(), 1);
        assert_eq!(g.links_of(&SegmentEnd::new(b"B", End::B)).len(), 1);
        assert_eq!(g.links_of(&SegmentEnd::new(b"A", End::B)).len(), 0);
    }

    #[test]
    fn delete_cascades() {
        let mut g = graph_1();
        g.delete_segment(b"A").unwrap();
        assert_eq!(g.segment_count(), 1);
        assert_eq!(g.link_count(), 0);
        assert!(g.segment(b"A").is_none());
        assert!(g.links_of(&SegmentEnd::new(b"B", End::B)).is_empty());
    }

    #[test]
    fn duplicate_segment_is_rejected() {
        let mut g = graph_1();
        let err = g.add_segment(crate::gfa::Segment::new(b"A", b"C"));
        assert!(matches!(err, Err(GfaError::NotUnique(_))));
        // and the graph is unchanged
        assert_eq!(g.segment_req(b"A").unwrap().sequence, "ACGT");
    }

    #[test]
    fn forward_reference_promotion() {
        let g = Graph::read_string(
            b"L\ta\t+\tb\t+\t*\nS\ta\tACGT\nS\tb\tTTTT\n",
            false,
        )
        .unwrap();
        assert_eq!(g.segment_count(), 2);
        assert!(!g.segment(b"a").unwrap().is_virtual());
        assert!(!g.segment(b"b").unwrap().is_virtual());
        assert_eq!(g.links_of(&SegmentEnd::new(b"a", End::E)).len(), 1);
        assert_eq!(g.links_of(&SegmentEnd::new(b"b", End::B)).len(), 1);
        // exactly one record per identifier
        assert_eq!(g.segment_names(), vec![BString::from("a"), "b".into()]);
    }

    #[test]
    fn virtual_segments_reject_mutation() {
        let mut g =
            Graph::read_string(b"L\ta\t+\tb\t+\t*\nS\ta\tACGT\n", false)
                .unwrap();
        assert!(g.segment(b"b").unwrap().is_virtual());
        assert!(matches!(
            g.segment_mut(b"b"),
            Err(GfaError::Runtime(_))
        ));
        assert!(matches!(g.segment_req(b"b"), Err(GfaError::NotFound(_))));
    }

    #[test]
    fn path_indexing() {
        let g = Graph::read_string(
            b"S\tA\tACGT\nS\tB\tTT\nP\tp1\tA+,B-\t2M\n",
            true,
        )
        .unwrap();
        assert_eq!(g.paths_with(b"A").len(), 1);
        assert_eq!(g.paths_with(b"B").len(), 1);
        let path = g.path_by_name(b"p1").unwrap();
        assert_eq!(path.segment_names[1], ("B".into(), Orientation::Backward));
    }

    #[test]
    fn path_name_collision_with_segment() {
        let mut g = graph_1();
        let path: GraphPath = crate::gfa::Path::new(
            "A".into(),
            vec![("B".into(), Orientation::Forward)],
            vec![None],
            Vec::new(),
        );
        assert!(matches!(g.add_path(path), Err(GfaError::NotUnique(_))));
    }

    #[test]
    fn self_link_is_indexed_once_per_end() {
        let g = Graph::read_string(
            b"S\tA\tACGT\nL\tA\t+\tA\t+\t*\n",
            false,
        )
        .unwrap();
        // A+ -> A+ attaches at (A,E) and (A,B)
        assert_eq!(g.links_of(&SegmentEnd::new(b"A", End::E)).len(), 1);
        assert_eq!(g.links_of(&SegmentEnd::new(b"A", End::B)).len(), 1);
        assert_eq!(g.links_of_segment(b"A").len(), 1);

        let g2 = Graph::read_string(
            b"S\tA\tACGT\nL\tA\t+\tA\t-\t*\n",
            false,
        )
        .unwrap();
        // A+ -> A- folds back onto (A,E): indexed once
        assert_eq!(g2.links_of(&SegmentEnd::new(b"A", End::E)).len(), 1);
        assert_eq!(g2.links_of(&SegmentEnd::new(b"A", End::B)).len(), 0);
    }

    #[test]
    fn gfa2_header_is_a_version_error() {
        let err = Graph::read_string(b"H\tVN:Z:2.0\nS\tA\t4\tACGT\n", false);
        assert!(matches!(err, Err(GfaError::Version(_))));
    }
}
