use std::collections::HashSet;

use bstr::{BString, ByteSlice};
use log::{debug, info};

use crate::cigar::CIGAR;
use crate::error::{GfaError, GfaResult};
use crate::optfields::OptFields;
use crate::sequence;

use super::edit::COUNT_TAGS;
use super::{End, Graph, GraphLink, GraphSegment, LinkIx, SegmentEnd};

/// Per-end degree classifier: 0, 1, or the sentinel `M` for anything
/// higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Zero,
    One,
    Many,
}

impl From<usize> for Connectivity {
    fn from(degree: usize) -> Self {
        match degree {
            0 => Connectivity::Zero,
            1 => Connectivity::One,
            _ => Connectivity::Many,
        }
    }
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sym = match self {
            Connectivity::Zero => '0',
            Connectivity::One => '1',
            Connectivity::Many => 'M',
        };
        write!(f, "{}", sym)
    }
}

/// Naming policy for segments produced by linear-path merging.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum MergedName {
    /// Concatenate the original names with `_`.
    #[default]
    Joined,
    /// Pick the first unused `merged1`, `merged2`, ...
    Short,
    /// Use the given name.
    Name(BString),
}

#[derive(Debug, Default, Clone)]
pub struct MergeOptions {
    pub merged_name: MergedName,
    /// Scale the summed count tags down by the merged length over
    /// the total pre-cut length.
    pub cut_counts: bool,
}

impl Graph {
    /// The connectivity symbol of a segment: degree class at the B
    /// end, then at the E end.
    pub fn connectivity(&self, name: &[u8]) -> (Connectivity, Connectivity) {
        (
            self.degree(&SegmentEnd::new(name, End::B)).into(),
            self.degree(&SegmentEnd::new(name, End::E)).into(),
        )
    }

    /// An internal junction has exactly one link at each end.
    pub fn is_internal(&self, name: &[u8]) -> bool {
        self.connectivity(name) == (Connectivity::One, Connectivity::One)
    }

    /// The maximal linear path through `seed`, as the ordered list of
    /// segment-ends the walk leaves each segment through. `None`
    /// when the seed is not part of any chain of length >= 2.
    pub fn linear_path(&self, seed: &[u8]) -> Option<Vec<SegmentEnd>> {
        let mut exclude = HashSet::new();
        let path = self.linear_path_with(seed, &mut exclude);
        if path.len() < 2 {
            None
        } else {
            Some(path)
        }
    }

    fn linear_path_with(
        &self,
        seed: &[u8],
        exclude: &mut HashSet<BString>,
    ) -> Vec<SegmentEnd> {
        exclude.insert(seed.into());
        let left = self.walk_linear(&SegmentEnd::new(seed, End::B), exclude);
        let right = self.walk_linear(&SegmentEnd::new(seed, End::E), exclude);

        let mut path = Vec::with_capacity(left.len() + right.len() + 1);
        // the left walk ran outward; flip it into path order
        for element in left.iter().rev() {
            path.push(element.inverted());
        }
        path.push(SegmentEnd::new(seed, End::E));
        path.extend(right);
        path
    }

    /// Walk outward from a segment end while the chain stays
    /// unambiguous: each step follows the only link at the current
    /// end, and the next segment must be entered through an end of
    /// degree one. Returns the segments passed, each with the end
    /// the walk left it through.
    fn walk_linear(
        &self,
        start: &SegmentEnd,
        exclude: &mut HashSet<BString>,
    ) -> Vec<SegmentEnd> {
        let mut out = Vec::new();
        let mut current = start.clone();
        loop {
            let links = self.links_of(&current);
            if links.len() != 1 {
                break;
            }
            let link = match self.link(links[0]) {
                Some(l) => l,
                None => break,
            };
            let entry = match link.other_end(&current) {
                Some(e) => e,
                None => break,
            };
            // a revisit means the chain closed on itself
            if exclude.contains(&entry.name) {
                break;
            }
            if self.degree(&entry) != 1 {
                break;
            }
            if self
                .segment(&entry.name)
                .map_or(true, |slot| slot.is_virtual())
            {
                break;
            }
            let next = entry.inverted();
            exclude.insert(next.name.clone());
            out.push(next.clone());
            current = next;
        }
        out
    }

    /// Every maximal linear path, each exactly once, in insertion
    /// order of the seed segments.
    pub fn linear_paths(&self) -> Vec<Vec<SegmentEnd>> {
        let mut exclude = HashSet::new();
        let mut out = Vec::new();
        for slot in self.segment_slots() {
            if slot.is_virtual() {
                continue;
            }
            let name = slot.name().clone();
            if exclude.contains(&name) {
                continue;
            }
            let path = self.linear_path_with(&name, &mut exclude);
            if path.len() >= 2 {
                out.push(path);
            }
        }
        out
    }

    /// Merge the segments of a linear path into one: sequences are
    /// concatenated (reverse-complemented where the path traverses a
    /// segment backwards) with overlap cuts removed, counts are
    /// aggregated, boundary links are reattached, and the original
    /// segments are deleted. Only `*` and single-`M` overlaps can be
    /// collapsed.
    pub fn merge_linear_path(
        &mut self,
        path: &[SegmentEnd],
        opts: &MergeOptions,
    ) -> GfaResult<BString> {
        if path.len() < 2 {
            return Err(GfaError::Argument(
                "a linear path needs at least two segments".into(),
            ));
        }

        let (joins, cuts) = self.path_joins(path)?;

        let mut collapsed = false;
        let mut seqbuf = BString::from("");
        let mut ln_known = true;
        let mut ln_sum: i64 = 0;
        let mut total_cut: i64 = 0;
        let mut count_sums: [Option<i64>; 3] = [None; 3];

        for (i, element) in path.iter().enumerate() {
            let seg = self.segment_req(&element.name)?;
            let reversed = element.end == End::B;
            let cut = if i == 0 { 0 } else { cuts[i - 1] };
            total_cut += cut;

            if sequence::is_placeholder(&seg.sequence) {
                collapsed = true;
            } else if !collapsed {
                let part = if reversed {
                    sequence::rev_comp(seg.sequence.as_bstr())
                } else {
                    seg.sequence.clone()
                };
                let cut = (cut as usize).min(part.len());
                seqbuf.extend_from_slice(&part[cut..]);
            }

            match seg.length() {
                Some(len) => ln_sum += len - cut,
                None => ln_known = false,
            }
            for (sum, tag) in count_sums.iter_mut().zip(COUNT_TAGS) {
                if let Some(v) = seg.optional.get_tag_int(tag) {
                    *sum = Some(sum.unwrap_or(0) + v);
                }
            }
        }

        let merged_name = match &opts.merged_name {
            MergedName::Name(name) => name.clone(),
            MergedName::Joined => {
                let names: Vec<&[u8]> =
                    path.iter().map(|e| e.name.as_slice()).collect();
                bstr::join("_", names).into()
            }
            MergedName::Short => self.next_short_name(),
        };

        // the merged record starts as a clone of the first element,
        // so tags other than LN and the counts carry over
        let mut merged: GraphSegment =
            self.segment_req(&path[0].name)?.clone();
        merged.name = merged_name.clone();
        merged.sequence = if collapsed {
            sequence::PLACEHOLDER.into()
        } else {
            seqbuf
        };
        merged.optional.remove_field(b"LN");
        for tag in COUNT_TAGS {
            merged.optional.remove_field(tag);
        }
        if ln_known {
            merged.optional.set_tag_int(b"LN", ln_sum);
            for (sum, tag) in count_sums.iter().zip(COUNT_TAGS) {
                if let Some(v) = sum {
                    let scaled = if opts.cut_counts && ln_sum + total_cut > 0 {
                        ((*v as f64 * ln_sum as f64)
                            / (ln_sum + total_cut) as f64)
                            as i64
                    } else {
                        *v
                    };
                    merged.optional.set_tag_int(tag, scaled);
                }
            }
        }

        // reattach boundary links to the merged segment before the
        // cascade removes the originals
        let first_outer = path[0].inverted();
        let last_outer = path[path.len() - 1].clone();
        let merged_b = SegmentEnd::new(&merged_name, End::B);
        let merged_e = SegmentEnd::new(&merged_name, End::E);

        let mut seen: Vec<LinkIx> = joins;
        let mut new_links: Vec<GraphLink> = Vec::new();
        for outer in [&first_outer, &last_outer] {
            for &lix in self.links_of(outer) {
                if seen.contains(&lix) {
                    continue;
                }
                seen.push(lix);
                let link = self.link(lix).expect("stale link index");
                let mut clone = link.clone();
                for side in link.sides_at(&first_outer) {
                    clone.set_endpoint(side, &merged_b);
                }
                for side in link.sides_at(&last_outer) {
                    clone.set_endpoint(side, &merged_e);
                }
                new_links.push(clone);
            }
        }

        self.add_segment(merged)?;
        for link in new_links {
            self.add_link(link)?;
        }
        for element in path {
            self.delete_segment(&element.name)?;
        }

        info!("merged {} segments into {}", path.len(), merged_name);
        Ok(merged_name)
    }

    /// Find every maximal linear path and merge it. Returns the
    /// number of merges performed.
    pub fn merge_linear_paths(&mut self, opts: &MergeOptions) -> GfaResult<usize> {
        let paths = self.linear_paths();
        let count = paths.len();
        for path in paths.iter() {
            self.merge_linear_path(path, opts)?;
        }
        Ok(count)
    }

    /// The joining link of each consecutive pair in a path, plus the
    /// overlap cut it implies: 0 for `*`, the length of a single `M`
    /// operation otherwise. Any other overlap shape cannot be
    /// collapsed.
    fn path_joins(
        &self,
        path: &[SegmentEnd],
    ) -> GfaResult<(Vec<LinkIx>, Vec<i64>)> {
        let mut joins = Vec::with_capacity(path.len() - 1);
        let mut cuts = Vec::with_capacity(path.len() - 1);
        for window in path.windows(2) {
            let prev = &window[0];
            let entry = window[1].inverted();
            let lix = self
                .links_of(prev)
                .iter()
                .copied()
                .find(|&ix| {
                    self.link(ix).map_or(false, |l| {
                        l.other_end(prev).as_ref() == Some(&entry)
                    })
                })
                .ok_or_else(|| {
                    GfaError::Inconsistency(format!(
                        "no link joins {} to {}",
                        prev, entry
                    ))
                })?;
            let link = self.link(lix).expect("stale link index");
            let cut = if link.overlap == "*" {
                0
            } else {
                let cigar =
                    CIGAR::from_bytestring(&link.overlap).ok_or_else(|| {
                        GfaError::Format(format!(
                            "unparseable overlap {}",
                            link.overlap
                        ))
                    })?;
                cigar.as_single_match().ok_or_else(|| {
                    GfaError::Runtime(format!(
                        "cannot merge across overlap {}: only overlaps of \
                         the form <N>M or * are supported",
                        link.overlap
                    ))
                })? as i64
            };
            joins.push(lix);
            cuts.push(cut);
        }
        Ok((joins, cuts))
    }

    fn next_short_name(&self) -> BString {
        for i in 1.. {
            let candidate: BString = format!("merged{}", i).into();
            if !self.has_segment(&candidate) && !self.has_path(&candidate) {
                return candidate;
            }
        }
        unreachable!()
    }

    /// Segment names reachable from `start`, optionally masking one
    /// link or one segment out of the graph.
    fn reachable(
        &self,
        start: &BString,
        skip_link: Option<LinkIx>,
        skip_segment: Option<&BString>,
    ) -> HashSet<BString> {
        let mut seen: HashSet<BString> = HashSet::new();
        let mut stack = vec![start.clone()];
        while let Some(name) = stack.pop() {
            if skip_segment == Some(&name) || !seen.insert(name.clone()) {
                continue;
            }
            for end in [End::B, End::E] {
                for &lix in self.links_of(&SegmentEnd::new(&name, end)) {
                    if skip_link == Some(lix) {
                        continue;
                    }
                    let link = self.link(lix).expect("stale link index");
                    for other in [&link.from_segment, &link.to_segment] {
                        if !seen.contains(other) && skip_segment != Some(other)
                        {
                            stack.push(other.clone());
                        }
                    }
                }
            }
        }
        seen
    }

    /// A link is a cut when removing it disconnects its component.
    /// Circular links never are.
    pub fn is_cut_link(&self, ix: LinkIx) -> GfaResult<bool> {
        let link = self
            .link(ix)
            .ok_or_else(|| GfaError::NotFound(format!("link {}", ix)))?;
        if link.is_circular() {
            return Ok(false);
        }
        let reach = self.reachable(&link.from_segment, Some(ix), None);
        Ok(!reach.contains(&link.to_segment))
    }

    /// A segment is a cut when removing it disconnects the rest of
    /// its component.
    pub fn is_cut_segment(&self, name: &[u8]) -> GfaResult<bool> {
        if self.segment(name).is_none() {
            return Err(GfaError::NotFound(format!(
                "segment {:?}",
                name.as_bstr()
            )));
        }
        let bdeg = self.degree(&SegmentEnd::new(name, End::B));
        let edeg = self.degree(&SegmentEnd::new(name, End::E));
        if (bdeg == 0 && edeg <= 1) || (edeg == 0 && bdeg <= 1) {
            return Ok(false);
        }

        let name: BString = name.into();
        let mut neighbors: Vec<BString> = Vec::new();
        for end in [End::B, End::E] {
            for &lix in self.links_of(&SegmentEnd::new(&name, end)) {
                let link = self.link(lix).expect("stale link index");
                for other in [&link.from_segment, &link.to_segment] {
                    if *other != name && !neighbors.contains(other) {
                        neighbors.push(other.clone());
                    }
                }
            }
        }
        if neighbors.len() < 2 {
            return Ok(false);
        }
        let reach = self.reachable(&neighbors[0], None, Some(&name));
        Ok(!neighbors.iter().all(|n| reach.contains(n)))
    }

    /// The connected component containing `name`, in segment
    /// insertion order.
    pub fn segment_connected_component(&self, name: &[u8]) -> Vec<BString> {
        let start: BString = name.into();
        let comp = self.reachable(&start, None, None);
        self.segment_names()
            .into_iter()
            .filter(|n| comp.contains(n))
            .collect()
    }

    /// Partition of all segment names into connected components,
    /// ordered by first appearance.
    pub fn connected_components(&self) -> Vec<Vec<BString>> {
        let mut assigned: HashSet<BString> = HashSet::new();
        let mut out = Vec::new();
        for name in self.segment_names() {
            if assigned.contains(&name) {
                continue;
            }
            let comp = self.segment_connected_component(&name);
            for member in comp.iter() {
                assigned.insert(member.clone());
            }
            out.push(comp);
        }
        out
    }

    /// Split the graph into one graph per connected component. A
    /// record lands in a component when every segment it references
    /// belongs to it.
    pub fn split_connected_components(&self) -> GfaResult<Vec<Graph>> {
        let mut out = Vec::new();
        for comp in self.connected_components() {
            let members: HashSet<&BString> = comp.iter().collect();
            let mut part = Graph::new();
            part.header = self.header.clone();

            for seg in self.segments() {
                if members.contains(&seg.name) {
                    part.add_segment(seg.clone())?;
                }
            }
            for (_, link) in self.links() {
                if members.contains(&link.from_segment)
                    && members.contains(&link.to_segment)
                {
                    part.add_link(link.clone())?;
                }
            }
            for (_, cont) in self.containments() {
                if members.contains(&cont.container_name)
                    && members.contains(&cont.contained_name)
                {
                    part.add_containment(cont.clone())?;
                }
            }
            for (_, path) in self.paths() {
                if path
                    .segment_names
                    .iter()
                    .all(|(name, _)| members.contains(name))
                {
                    part.add_path(path.clone())?;
                }
            }
            out.push(part);
        }
        Ok(out)
    }

    /// For a segment whose two ends see the same pair of neighbors,
    /// keep one link per neighbor partition per end, pairing the
    /// partitions across ends by signature. When either end does not
    /// partition into exactly two neighbor groups the graph is left
    /// untouched; this mirrors the original tool, which silently does
    /// nothing for more than two partitions.
    pub fn select_random_orientation(
        &mut self,
        name: &[u8],
    ) -> GfaResult<usize> {
        if self.segment(name).is_none() {
            return Err(GfaError::NotFound(format!(
                "segment {:?}",
                name.as_bstr()
            )));
        }

        let partition = |g: &Graph, end: End| -> Vec<(BString, Vec<LinkIx>)> {
            let key = SegmentEnd::new(name, end);
            let mut parts: Vec<(BString, Vec<LinkIx>)> = Vec::new();
            for &lix in g.links_of(&key) {
                let link = g.link(lix).expect("stale link index");
                let neighbor = match link.other_end(&key) {
                    Some(other) => other.name,
                    None => continue,
                };
                match parts.iter_mut().find(|(sig, _)| *sig == neighbor) {
                    Some((_, ids)) => ids.push(lix),
                    None => parts.push((neighbor, vec![lix])),
                }
            }
            parts
        };

        let pb = partition(self, End::B);
        let mut pe = partition(self, End::E);
        if pb.len() != 2 || pe.len() != 2 {
            debug!(
                "select_random_orientation: {} has {}/{} partitions, no-op",
                name.as_bstr(),
                pb.len(),
                pe.len()
            );
            return Ok(0);
        }

        // pair the partitions across ends, reversing on mismatch
        if pb[0].0 != pe[0].0 && pb[0].0 == pe[1].0 {
            pe.swap(0, 1);
        }

        let mut deleted = 0;
        for (_, ids) in pb.into_iter().chain(pe) {
            for &lix in &ids[1..] {
                self.delete_link(lix)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// For an internal junction, delete any direct neighbor-to-
    /// neighbor link attached at an end contradicting the orientation
    /// the junction implies.
    pub fn enforce_internal_links(&mut self, name: &[u8]) -> GfaResult<usize> {
        let b_key = SegmentEnd::new(name, End::B);
        let e_key = SegmentEnd::new(name, End::E);
        if self.degree(&b_key) != 1 || self.degree(&e_key) != 1 {
            return Ok(0);
        }
        let nb = self
            .link(self.links_of(&b_key)[0])
            .and_then(|l| l.other_end(&b_key))
            .ok_or_else(|| GfaError::Inconsistency("broken link index".into()))?;
        let ne = self
            .link(self.links_of(&e_key)[0])
            .and_then(|l| l.other_end(&e_key))
            .ok_or_else(|| GfaError::Inconsistency("broken link index".into()))?;

        let mut deleted = 0;
        for (near, far) in [(nb.clone(), ne.clone()), (ne, nb)] {
            for lix in self.links_of(&near).to_vec() {
                let link = match self.link(lix) {
                    Some(l) => l,
                    None => continue,
                };
                let other = match link.other_end(&near) {
                    Some(o) => o,
                    None => continue,
                };
                if other.name == far.name && other.end != far.end {
                    debug!(
                        "internal junction {}: dropping contradictory link",
                        name.as_bstr()
                    );
                    self.delete_link(lix)?;
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edit::MultiplyOptions;

    fn chain() -> Graph {
        Graph::read_string(
            b"S\tA\tACGTAC\tLN:i:6\nS\tB\tGTACGG\tLN:i:6\nS\tC\tCGGAAA\tLN:i:6\nL\tA\t+\tB\t+\t4M\nL\tB\t+\tC\t+\t3M\n",
            true,
        )
        .unwrap()
    }

    fn two_triangles() -> Graph {
        // two triangles joined by the bridge c-d
        Graph::read_string(
            b"S\ta\t*\nS\tb\t*\nS\tc\t*\nS\td\t*\nS\te\t*\nS\tf\t*\n\
L\ta\t+\tb\t+\t*\nL\tb\t+\tc\t+\t*\nL\tc\t+\ta\t-\t*\n\
L\td\t+\te\t+\t*\nL\te\t+\tf\t+\t*\nL\tf\t+\td\t-\t*\n\
L\tc\t+\td\t+\t*\n",
            false,
        )
        .unwrap()
    }

    #[test]
    fn connectivity_symbols() {
        let g = chain();
        use Connectivity::*;
        assert_eq!(g.connectivity(b"A"), (Zero, One));
        assert_eq!(g.connectivity(b"B"), (One, One));
        assert_eq!(g.connectivity(b"C"), (One, Zero));
        assert!(g.is_internal(b"B"));
    }

    #[test]
    fn linear_path_through_chain() {
        let g = chain();
        let path = g.linear_path(b"B").unwrap();
        assert_eq!(
            path,
            vec![
                SegmentEnd::new(b"A", End::E),
                SegmentEnd::new(b"B", End::E),
                SegmentEnd::new(b"C", End::E),
            ]
        );
        // all three seeds give the same maximal path
        assert_eq!(g.linear_path(b"A").unwrap(), path);
        assert_eq!(g.linear_paths().len(), 1);
    }

    #[test]
    fn linear_path_stops_at_junctions() {
        let mut g = chain();
        // a second link at B's E end makes the B-C join ambiguous
        g.add_link(crate::gfa::Link::new(
            b"B",
            crate::gfa::Orientation::Forward,
            b"A",
            crate::gfa::Orientation::Forward,
            b"*",
        ))
        .unwrap();
        let paths = g.linear_paths();
        assert!(paths.iter().all(|p| p.len() < 3));
    }

    #[test]
    fn merge_chain_concatenates() {
        let mut g = chain();
        let merged = g.merge_linear_paths(&MergeOptions::default()).unwrap();
        assert_eq!(merged, 1);

        let seg = g.segment_req(b"A_B_C").unwrap();
        assert_eq!(seg.sequence, "ACGTACGGAAA");
        assert_eq!(seg.optional.get_tag_int(b"LN"), Some(11));
        assert!(g.segment(b"A").is_none());
        assert!(g.segment(b"B").is_none());
        assert!(g.segment(b"C").is_none());
        assert_eq!(g.segment_count(), 1);
        assert_eq!(g.link_count(), 0);
        // idempotence: nothing left to merge
        assert!(g.linear_paths().is_empty());
    }

    #[test]
    fn merge_reverse_complements_backwards_segments() {
        // B enters through its E end: path is A+ then B-
        let mut g = Graph::read_string(
            b"S\tA\tACGT\tLN:i:4\nS\tB\tTTAC\tLN:i:4\nL\tA\t+\tB\t-\t2M\n",
            true,
        )
        .unwrap();
        let path = g.linear_path(b"A").unwrap();
        assert_eq!(
            path,
            vec![SegmentEnd::new(b"A", End::E), SegmentEnd::new(b"B", End::B)]
        );
        let name = g
            .merge_linear_path(&path, &MergeOptions::default())
            .unwrap();
        let seg = g.segment_req(&name).unwrap();
        // revcomp(TTAC) = GTAA, cut 2 -> AA
        assert_eq!(seg.sequence, "ACGTAA");
        assert_eq!(seg.optional.get_tag_int(b"LN"), Some(6));
    }

    #[test]
    fn merge_collapses_placeholder_and_sums_counts() {
        let mut g = Graph::read_string(
            b"S\tA\t*\tLN:i:10\tRC:i:30\nS\tB\t*\tLN:i:10\tRC:i:50\nL\tA\t+\tB\t+\t*\n",
            true,
        )
        .unwrap();
        let path = g.linear_path(b"A").unwrap();
        let name = g
            .merge_linear_path(&path, &MergeOptions::default())
            .unwrap();
        let seg = g.segment_req(&name).unwrap();
        assert_eq!(seg.sequence, "*");
        assert_eq!(seg.optional.get_tag_int(b"LN"), Some(20));
        assert_eq!(seg.optional.get_tag_int(b"RC"), Some(80));
    }

    #[test]
    fn merge_scales_counts_when_cutting() {
        let mut g = Graph::read_string(
            b"S\tA\tACGTAC\tLN:i:6\tKC:i:60\nS\tB\tGTACGG\tLN:i:6\tKC:i:60\nL\tA\t+\tB\t+\t4M\n",
            true,
        )
        .unwrap();
        let path = g.linear_path(b"A").unwrap();
        let opts = MergeOptions {
            merged_name: MergedName::Short,
            cut_counts: true,
        };
        let name = g.merge_linear_path(&path, &opts).unwrap();
        assert_eq!(name, BString::from("merged1"));
        let seg = g.segment_req(b"merged1").unwrap();
        assert_eq!(seg.optional.get_tag_int(b"LN"), Some(8));
        // 120 scaled by 8/12
        assert_eq!(seg.optional.get_tag_int(b"KC"), Some(80));
    }

    #[test]
    fn merge_rejects_non_match_overlaps() {
        let mut g = Graph::read_string(
            b"S\tA\tACGTAC\nS\tB\tGTACGG\nL\tA\t+\tB\t+\t2M1I1M\n",
            true,
        )
        .unwrap();
        let path = g.linear_path(b"A").unwrap();
        let err = g.merge_linear_path(&path, &MergeOptions::default());
        assert!(matches!(err, Err(GfaError::Runtime(_))));
    }

    #[test]
    fn merge_reconnects_boundary_links() {
        // chain A-B with junction segments on both sides
        let mut g = Graph::read_string(
            b"S\tJ1\t*\nS\tJ2\t*\nS\tA\tACGT\tLN:i:4\nS\tB\tTTTT\tLN:i:4\n\
L\tJ1\t+\tA\t+\t*\nL\tJ2\t+\tA\t+\t*\nL\tA\t+\tB\t+\t*\nL\tB\t+\tJ1\t+\t*\nL\tB\t+\tJ2\t+\t*\n",
            false,
        )
        .unwrap();
        let path = vec![
            SegmentEnd::new(b"A", End::E),
            SegmentEnd::new(b"B", End::E),
        ];
        let name = g
            .merge_linear_path(&path, &MergeOptions::default())
            .unwrap();
        assert_eq!(name, BString::from("A_B"));
        assert_eq!(g.degree(&SegmentEnd::new(b"A_B", End::B)), 2);
        assert_eq!(g.degree(&SegmentEnd::new(b"A_B", End::E)), 2);
        assert_eq!(g.degree(&SegmentEnd::new(b"J1", End::E)), 1);
        // the flipped boundary keeps its orientation geometry
        assert_eq!(g.link_count(), 4);
    }

    #[test]
    fn cut_links_in_bridged_triangles() {
        let g = two_triangles();
        for (ix, link) in g.links() {
            let is_bridge =
                link.from_segment == "c" && link.to_segment == "d";
            assert_eq!(g.is_cut_link(ix).unwrap(), is_bridge);
        }
    }

    #[test]
    fn cut_segments_in_bridged_triangles() {
        let g = two_triangles();
        // the bridge endpoints are cut segments, the rest are not
        for name in [b"a", b"b", b"e", b"f"] {
            assert!(!g.is_cut_segment(name).unwrap());
        }
        assert!(g.is_cut_segment(b"c").unwrap());
        assert!(g.is_cut_segment(b"d").unwrap());
    }

    #[test]
    fn circular_links_are_never_cuts() {
        let g = Graph::read_string(
            b"S\tA\tACGT\nL\tA\t+\tA\t+\t*\n",
            false,
        )
        .unwrap();
        let (ix, _) = g.links().next().unwrap();
        assert!(!g.is_cut_link(ix).unwrap());
    }

    #[test]
    fn components_and_split() {
        let g = two_triangles();
        assert_eq!(g.connected_components().len(), 1);

        let disconnected = Graph::read_string(
            b"S\tA\tACGT\nS\tB\tTT\nS\tC\tGG\nL\tA\t+\tB\t+\t*\n",
            false,
        )
        .unwrap();
        let comps = disconnected.connected_components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0], vec![BString::from("A"), "B".into()]);
        assert_eq!(comps[1], vec![BString::from("C")]);

        let parts = disconnected.split_connected_components().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].segment_count(), 2);
        assert_eq!(parts[0].link_count(), 1);
        assert_eq!(parts[1].segment_count(), 1);
    }

    #[test]
    fn merging_preserves_components() {
        let mut g = chain();
        let before = g.connected_components().len();
        g.merge_linear_paths(&MergeOptions::default()).unwrap();
        assert_eq!(g.connected_components().len(), before);
    }

    #[test]
    fn multiply_then_merge_roundtrip() {
        // multiplying the middle of a chain and merging again keeps
        // the component count stable
        let mut g = chain();
        g.multiply(b"B", 2, &MultiplyOptions::default()).unwrap();
        assert_eq!(g.connected_components().len(), 1);
        assert!(g.linear_paths().is_empty());
    }

    #[test]
    fn random_orientation_prunes_paired_partitions() {
        // X sees a and b on both ends, twice each
        let mut g = Graph::read_string(
            b"S\ta\t*\nS\tb\t*\nS\tX\t*\n\
L\ta\t+\tX\t+\t*\nL\tb\t+\tX\t+\t*\nL\ta\t-\tX\t+\t*\nL\tb\t-\tX\t+\t*\n\
L\tX\t+\ta\t+\t*\nL\tX\t+\tb\t+\t*\n",
            false,
        )
        .unwrap();
        assert_eq!(g.degree(&SegmentEnd::new(b"X", End::B)), 4);
        let deleted = g.select_random_orientation(b"X").unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(g.degree(&SegmentEnd::new(b"X", End::B)), 2);
        assert_eq!(g.degree(&SegmentEnd::new(b"X", End::E)), 2);
    }

    #[test]
    fn random_orientation_noop_beyond_two_partitions() {
        let mut g = Graph::read_string(
            b"S\ta\t*\nS\tb\t*\nS\tc\t*\nS\tX\t*\n\
L\ta\t+\tX\t+\t*\nL\tb\t+\tX\t+\t*\nL\tc\t+\tX\t+\t*\n\
L\tX\t+\ta\t+\t*\nL\tX\t+\tb\t+\t*\n",
            false,
        )
        .unwrap();
        let before = g.link_count();
        assert_eq!(g.select_random_orientation(b"X").unwrap(), 0);
        assert_eq!(g.link_count(), before);
    }

    #[test]
    fn internal_link_enforcement() {
        // j joins a:E and b:B; a direct link a:E -> b:E contradicts it
        let mut g = Graph::read_string(
            b"S\ta\t*\nS\tb\t*\nS\tj\t*\n\
L\ta\t+\tj\t+\t*\nL\tj\t+\tb\t+\t*\nL\ta\t+\tb\t-\t*\n",
            false,
        )
        .unwrap();
        let deleted = g.enforce_internal_links(b"j").unwrap();
        assert_eq!(deleted, 1);
        // the consistent geometry would have been a:E -> b:B
        assert_eq!(g.link_count(), 2);
    }
}
