use bstr::{BString, ByteSlice};
use log::{debug, info, warn};

use crate::error::{GfaError, GfaResult};
use crate::optfields::{OptField, OptFieldVal, OptFields};

use super::{End, Graph, SegmentEnd, SegmentSlot};

/// The count tags divided and summed by multiplication and merging.
pub const COUNT_TAGS: [&[u8; 2]; 3] = [b"KC", b"RC", b"FC"];

/// Whether and how `multiply` partitions the incident links of the
/// original segment among the copies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LinksDistribution {
    /// Keep every copy fully connected.
    #[default]
    Off,
    /// Pick the end with [`Graph::select_distribute_end`].
    Auto,
    /// Like `Auto`, but only distribute when one end's degree equals
    /// the multiplicity.
    Equal,
    /// Distribute at the given end.
    End(End),
}

#[derive(Debug, Default, Clone)]
pub struct MultiplyOptions {
    /// Names for the copies; generated from the original name when
    /// absent. Must hold exactly `factor - 1` entries.
    pub copy_names: Option<Vec<BString>>,
    pub distribute: LinksDistribution,
}

fn divide_counts<T: OptFields>(fields: &mut T, factor: usize) {
    for tag in COUNT_TAGS {
        if let Some(v) = fields.get_tag_int(tag) {
            fields.set_tag_int(tag, v / factor as i64);
        }
    }
}

/// Lexicographic successor of a lowercase suffix: a → b, z → aa,
/// az → ba, zz → aaa.
fn bump_suffix(suffix: &mut Vec<u8>) {
    for i in (0..suffix.len()).rev() {
        if suffix[i] < b'z' {
            suffix[i] += 1;
            return;
        }
        suffix[i] = b'a';
    }
    suffix.insert(0, b'a');
}

impl Graph {
    /// Rename a segment, updating its record, the name table, every
    /// link and containment endpoint, every path step, and the
    /// connectivity-index keys. Fails when `new` collides with an
    /// existing segment or path name.
    pub fn rename(&mut self, old: &[u8], new: &[u8]) -> GfaResult<()> {
        let old: BString = old.into();
        let new: BString = new.into();

        let ix = *self.segment_ids.get(&old).ok_or_else(|| {
            GfaError::NotFound(format!("segment {:?}", old))
        })?;
        if self.segment_ids.contains_key(&new) || self.path_ids.contains_key(&new)
        {
            return Err(GfaError::NotUnique(new.to_string()));
        }

        match self.segments[ix].as_mut() {
            Some(SegmentSlot::Real(s)) => s.name = new.clone(),
            Some(SegmentSlot::Virtual(name)) => *name = new.clone(),
            None => unreachable!("name table points at a deleted segment"),
        }
        self.segment_ids.remove(&old);
        self.segment_ids.insert(new.clone(), ix);

        for end in [End::B, End::E] {
            let old_key = SegmentEnd::new(&old, end);
            if let Some(ids) = self.end_links.remove(&old_key) {
                for &lix in &ids {
                    let link = self.links[lix]
                        .as_mut()
                        .expect("link index points at a deleted link");
                    if link.from_segment == old {
                        link.from_segment = new.clone();
                    }
                    if link.to_segment == old {
                        link.to_segment = new.clone();
                    }
                }
                self.end_links.insert(SegmentEnd::new(&new, end), ids);
            }
        }

        if let Some(ids) = self.seg_containments.remove(&old) {
            for &cix in &ids {
                let cont = self.containments[cix]
                    .as_mut()
                    .expect("containment index points at a deleted record");
                if cont.container_name == old {
                    cont.container_name = new.clone();
                }
                if cont.contained_name == old {
                    cont.contained_name = new.clone();
                }
            }
            self.seg_containments.insert(new.clone(), ids);
        }

        if let Some(ids) = self.seg_paths.remove(&old) {
            for &pix in &ids {
                let path = self.paths[pix]
                    .as_mut()
                    .expect("path index points at a deleted path");
                for (name, _) in path.segment_names.iter_mut() {
                    if *name == old {
                        *name = new.clone();
                    }
                }
            }
            self.seg_paths.insert(new.clone(), ids);
        }

        debug!("renamed segment {} to {}", old, new);
        Ok(())
    }

    /// Multiply a segment: factor 0 deletes it, 1 is a no-op, and
    /// `f >= 2` creates `f - 1` copies with all incident links cloned
    /// onto each copy and the `KC`/`RC`/`FC` tags of the segment and
    /// its links divided by `f`. Returns the copy names.
    pub fn multiply(
        &mut self,
        name: &[u8],
        factor: usize,
        opts: &MultiplyOptions,
    ) -> GfaResult<Vec<BString>> {
        let name: BString = name.into();
        match factor {
            0 => {
                info!("multiplying {} by 0: deleting it", name);
                self.delete_segment(&name)?;
                return Ok(Vec::new());
            }
            1 => return Ok(Vec::new()),
            _ => (),
        }

        self.segment_req(&name)?;

        let copy_names = match &opts.copy_names {
            Some(names) => {
                if names.len() != factor - 1 {
                    return Err(GfaError::Argument(format!(
                        "{} copy names given, factor {} needs {}",
                        names.len(),
                        factor,
                        factor - 1
                    )));
                }
                for copy in names {
                    if self.has_segment(copy) || self.has_path(copy) {
                        return Err(GfaError::NotUnique(copy.to_string()));
                    }
                }
                names.clone()
            }
            None => self.auto_copy_names(&name, factor - 1),
        };

        // every incident link exactly once, so a circular self-link
        // is divided a single time
        let incident = self.links_of_segment(&name);

        divide_counts(&mut self.segment_mut(&name)?.optional, factor);
        for &lix in &incident {
            let link = self.links[lix]
                .as_mut()
                .expect("link index points at a deleted link");
            divide_counts(&mut link.optional, factor);
        }

        for copy in &copy_names {
            let mut clone = self.segment_req(&name)?.clone();
            clone.name = copy.clone();
            if clone.optional.get_field(b"or").is_none() {
                clone
                    .optional
                    .set_field(OptField::new(b"or", OptFieldVal::Z(name.clone())));
            }
            self.add_segment(clone)?;

            for &lix in &incident {
                let mut link = self
                    .link(lix)
                    .expect("link index points at a deleted link")
                    .clone();
                if link.from_segment == name {
                    link.from_segment = copy.clone();
                }
                if link.to_segment == name {
                    link.to_segment = copy.clone();
                }
                self.add_link(link)?;
            }
        }

        let end = match opts.distribute {
            LinksDistribution::Off => None,
            LinksDistribution::End(end) => Some(end),
            LinksDistribution::Auto => {
                self.select_distribute_end(&name, factor, false)
            }
            LinksDistribution::Equal => {
                self.select_distribute_end(&name, factor, true)
            }
        };
        if let Some(end) = end {
            self.distribute_links(&name, &copy_names, end, factor);
        }

        info!(
            "multiplied {} by {}, copies: {:?}",
            name,
            factor,
            copy_names.iter().map(|c| c.to_string()).collect::<Vec<_>>()
        );
        Ok(copy_names)
    }

    /// Generate copy names from `name + "a"`, bumping the suffix to
    /// its lexicographic successor until unique among segments,
    /// paths, and the names already chosen.
    fn auto_copy_names(&self, name: &BString, count: usize) -> Vec<BString> {
        let mut chosen: Vec<BString> = Vec::with_capacity(count);
        let mut suffix: Vec<u8> = vec![b'a'];
        while chosen.len() < count {
            let mut candidate = name.clone();
            candidate.extend_from_slice(&suffix);
            if !self.has_segment(&candidate)
                && !self.has_path(&candidate)
                && !chosen.contains(&candidate)
            {
                chosen.push(candidate);
            }
            bump_suffix(&mut suffix);
        }
        chosen
    }

    /// Choose the end whose links to distribute among the copies of
    /// a multiplied segment, preferring an end whose degree matches
    /// the multiplicity exactly.
    pub fn select_distribute_end(
        &self,
        name: &[u8],
        factor: usize,
        equal_only: bool,
    ) -> Option<End> {
        let bsize = self.degree(&SegmentEnd::new(name, End::B));
        let esize = self.degree(&SegmentEnd::new(name, End::E));

        if esize == factor {
            return Some(End::E);
        }
        if bsize == factor {
            return Some(End::B);
        }
        if equal_only {
            return None;
        }
        if esize < 2 && bsize < 2 {
            return None;
        }
        if esize < 2 {
            return Some(End::B);
        }
        if bsize < 2 {
            return Some(End::E);
        }
        if esize < factor {
            if bsize <= esize {
                return Some(End::E);
            }
            if bsize < factor {
                return Some(End::B);
            }
            return Some(End::E);
        }
        if bsize < factor {
            return Some(End::B);
        }
        if bsize <= esize {
            Some(End::B)
        } else {
            Some(End::E)
        }
    }

    /// Partition the links at one end of a multiplied segment among
    /// the siblings (original plus copies): the i-th sibling retains
    /// the links whose far-side signatures fall in a sliding window
    /// of width `degree - factor + 1`; everything else at that end is
    /// deleted.
    fn distribute_links(
        &mut self,
        name: &BString,
        copies: &[BString],
        end: End,
        factor: usize,
    ) {
        let original_end = SegmentEnd::new(name, end);
        let link_ids = self.links_of(&original_end).to_vec();
        let signatures: Vec<BString> = link_ids
            .iter()
            .map(|&ix| {
                let link = self.link(ix).expect("stale link index");
                link.other_end(&original_end)
                    .expect("indexed link does not touch its key end")
                    .to_string()
                    .into()
            })
            .collect();
        let diff = link_ids.len().saturating_sub(factor);

        let mut siblings: Vec<&BString> = Vec::with_capacity(factor);
        siblings.push(name);
        siblings.extend(copies.iter());

        for (i, sibling) in siblings.into_iter().enumerate() {
            let start = i.min(signatures.len());
            let stop = (i + diff + 1).min(signatures.len());
            let retained = &signatures[start..stop];

            let sibling_end = SegmentEnd::new(sibling, end);
            for lix in self.links_of(&sibling_end).to_vec() {
                let link = match self.link(lix) {
                    Some(l) => l,
                    None => continue,
                };
                let signature: BString = match link.other_end(&sibling_end) {
                    Some(other) => other.to_string().into(),
                    None => continue,
                };
                if !retained.contains(&signature) {
                    debug!(
                        "distribution drops link {} at {}",
                        lix, sibling_end
                    );
                    let _ = self.delete_link(lix);
                }
            }
        }
    }

    /// Coverage of a segment under the given count tag: count / LN.
    pub fn segment_coverage(
        &self,
        name: &[u8],
        count_tag: &[u8],
    ) -> Option<f64> {
        let seg = self.segment(name)?.real()?;
        let count = seg.optional.get_tag_int(count_tag)?;
        let len = seg.length()?;
        if len <= 0 {
            return None;
        }
        Some(count as f64 / len as f64)
    }

    /// Delete every segment whose coverage falls below `mincov`.
    /// Segments with no usable coverage data are left alone. Returns
    /// the deleted names.
    pub fn remove_low_coverage_segments(
        &mut self,
        mincov: f64,
        count_tag: &[u8],
    ) -> GfaResult<Vec<BString>> {
        let mut doomed = Vec::new();
        for seg in self.segments() {
            match self.segment_coverage(&seg.name, count_tag) {
                Some(cov) if cov < mincov => doomed.push(seg.name.clone()),
                Some(_) => (),
                None => warn!(
                    "segment {} has no {} coverage, keeping it",
                    seg.name,
                    count_tag.as_bstr()
                ),
            }
        }
        info!(
            "pruning {} segments below coverage {}",
            doomed.len(),
            mincov
        );
        for name in &doomed {
            self.delete_segment(name)?;
        }
        Ok(doomed)
    }

    /// Set the `cn` tag of every segment to its coverage divided by
    /// the single-copy coverage, rounded. Fails when any segment
    /// lacks the count tag or a usable length.
    pub fn compute_copy_numbers(
        &mut self,
        single_copy_coverage: f64,
        count_tag: &[u8],
    ) -> GfaResult<()> {
        if single_copy_coverage <= 0.0 {
            return Err(GfaError::Argument(format!(
                "single-copy coverage must be positive, got {}",
                single_copy_coverage
            )));
        }
        let names: Vec<BString> =
            self.segments().map(|s| s.name.clone()).collect();
        for name in names {
            let cov =
                self.segment_coverage(&name, count_tag).ok_or_else(|| {
                    GfaError::NotFound(format!(
                        "segment {} has no {} coverage",
                        name,
                        count_tag.as_bstr()
                    ))
                })?;
            let cn = (cov / single_copy_coverage).round().max(0.0) as i64;
            self.segment_mut(&name)?.optional.set_tag_int(b"cn", cn);
        }
        Ok(())
    }

    /// Multiply every segment by its `cn` tag, in ascending-`cn`
    /// order: 0 deletes, 1 keeps, higher values duplicate with the
    /// requested link distribution.
    pub fn apply_copy_numbers(
        &mut self,
        distribute: LinksDistribution,
    ) -> GfaResult<()> {
        let mut with_cn: Vec<(i64, BString)> = Vec::new();
        for seg in self.segments() {
            let cn = seg.optional.get_tag_int(b"cn").ok_or_else(|| {
                GfaError::NotFound(format!("segment {} has no cn tag", seg.name))
            })?;
            with_cn.push((cn, seg.name.clone()));
        }
        with_cn.sort_by_key(|(cn, _)| *cn);

        let opts = MultiplyOptions {
            copy_names: None,
            distribute,
        };
        for (cn, name) in with_cn {
            self.multiply(&name, cn.max(0) as usize, &opts)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphPath;

    fn multiply_graph() -> Graph {
        // X carries two links at its E end
        Graph::read_string(
            b"S\tX\t*\tLN:i:100\tRC:i:50\nS\tN1\t*\tLN:i:10\nS\tN2\t*\tLN:i:10\nL\tX\t+\tN1\t+\t*\nL\tX\t+\tN2\t+\t*\n",
            true,
        )
        .unwrap()
    }

    #[test]
    fn rename_cascades_everywhere() {
        let mut g = Graph::read_string(
            b"S\tA\tACGT\nS\tB\tTT\nL\tA\t+\tB\t+\t2M\nC\tA\t+\tB\t+\t1\t2M\nP\tp\tA+,B-\t2M\n",
            true,
        )
        .unwrap();
        g.rename(b"A", b"Z").unwrap();

        assert!(g.segment(b"A").is_none());
        assert!(g.segment(b"Z").is_some());
        let (_, link) = g.links().next().unwrap();
        assert_eq!(link.from_segment, "Z");
        let (_, cont) = g.containments().next().unwrap();
        assert_eq!(cont.container_name, "Z");
        let path = g.path_by_name(b"p").unwrap();
        assert_eq!(path.segment_names[0].0, "Z");
        // orientation preserved
        assert_eq!(path.segment_names[0].1, crate::gfa::Orientation::Forward);
        assert_eq!(g.links_of(&SegmentEnd::new(b"Z", End::E)).len(), 1);
        assert!(g.links_of(&SegmentEnd::new(b"A", End::E)).is_empty());
    }

    #[test]
    fn rename_roundtrip_is_identity() {
        let text = b"S\tA\tACGT\nS\tB\tTT\nL\tA\t+\tB\t+\t2M\n";
        let mut g = Graph::read_string(text, true).unwrap();
        let before = crate::writer::graph_string(&g);
        g.rename(b"A", b"tmp").unwrap();
        g.rename(b"tmp", b"A").unwrap();
        assert_eq!(crate::writer::graph_string(&g), before);
    }

    #[test]
    fn rename_collision_fails() {
        let mut g = multiply_graph();
        assert!(matches!(
            g.rename(b"X", b"N1"),
            Err(GfaError::NotUnique(_))
        ));
    }

    #[test]
    fn multiply_divides_counts_and_clones_links() {
        let mut g = multiply_graph();
        let copies = g.multiply(b"X", 2, &MultiplyOptions::default()).unwrap();
        assert_eq!(copies, vec![BString::from("Xa")]);

        for name in [b"X".as_slice(), b"Xa"] {
            let seg = g.segment_req(name).unwrap();
            assert_eq!(seg.optional.get_tag_int(b"RC"), Some(25));
            assert_eq!(g.links_of(&SegmentEnd::new(name, End::E)).len(), 2);
        }
        assert_eq!(g.segment_req(b"Xa").unwrap().optional.get_field(b"or")
            .and_then(OptField::get_string), Some(&BString::from("X")));
        // the neighbors now see both X and Xa
        assert_eq!(g.links_of(&SegmentEnd::new(b"N1", End::B)).len(), 2);
        assert_eq!(g.link_count(), 4);
    }

    #[test]
    fn multiply_zero_deletes_and_one_is_noop() {
        let mut g = multiply_graph();
        g.multiply(b"X", 1, &MultiplyOptions::default()).unwrap();
        assert_eq!(g.segment_count(), 3);
        g.multiply(b"X", 0, &MultiplyOptions::default()).unwrap();
        assert!(g.segment(b"X").is_none());
        assert_eq!(g.link_count(), 0);
    }

    #[test]
    fn multiply_explicit_names_are_validated() {
        let mut g = multiply_graph();
        let opts = MultiplyOptions {
            copy_names: Some(vec!["N1".into()]),
            distribute: LinksDistribution::Off,
        };
        assert!(matches!(
            g.multiply(b"X", 2, &opts),
            Err(GfaError::NotUnique(_))
        ));
        let opts = MultiplyOptions {
            copy_names: Some(vec!["Y1".into(), "Y2".into()]),
            distribute: LinksDistribution::Off,
        };
        assert!(matches!(
            g.multiply(b"X", 2, &opts),
            Err(GfaError::Argument(_))
        ));
    }

    #[test]
    fn auto_names_skip_taken_ones() {
        let mut g = multiply_graph();
        g.add_segment(crate::gfa::Segment::new(b"Xa", b"*")).unwrap();
        let copies = g.multiply(b"X", 3, &MultiplyOptions::default()).unwrap();
        assert_eq!(copies, vec![BString::from("Xb"), "Xc".into()]);
    }

    #[test]
    fn suffix_bumping() {
        let mut s = vec![b'a'];
        bump_suffix(&mut s);
        assert_eq!(s, b"b");
        let mut s = vec![b'z'];
        bump_suffix(&mut s);
        assert_eq!(s, b"aa");
        let mut s = b"az".to_vec();
        bump_suffix(&mut s);
        assert_eq!(s, b"ba");
    }

    #[test]
    fn self_link_counts_divided_once() {
        let mut g = Graph::read_string(
            b"S\tX\tACGT\tRC:i:40\nL\tX\t+\tX\t+\t*\tRC:i:40\n",
            true,
        )
        .unwrap();
        g.multiply(b"X", 2, &MultiplyOptions::default()).unwrap();
        let links: Vec<_> = g.links().collect();
        // original self-link divided exactly once
        assert_eq!(links[0].1.optional.get_tag_int(b"RC"), Some(20));
        // the copy's self-link points at the copy on both sides
        let copy_link = links
            .iter()
            .find(|(_, l)| l.from_segment == "Xa")
            .map(|(_, l)| l)
            .unwrap();
        assert_eq!(copy_link.to_segment, "Xa");
    }

    #[test]
    fn distribute_equal_degree_partitions_links() {
        let mut g = multiply_graph();
        let opts = MultiplyOptions {
            copy_names: None,
            distribute: LinksDistribution::Auto,
        };
        g.multiply(b"X", 2, &opts).unwrap();
        // degree(E) == factor, so each sibling keeps exactly one link
        assert_eq!(g.links_of(&SegmentEnd::new(b"X", End::E)).len(), 1);
        assert_eq!(g.links_of(&SegmentEnd::new(b"Xa", End::E)).len(), 1);
        let x_other = g
            .link(g.links_of(&SegmentEnd::new(b"X", End::E))[0])
            .unwrap()
            .other_end(&SegmentEnd::new(b"X", End::E))
            .unwrap();
        let xa_other = g
            .link(g.links_of(&SegmentEnd::new(b"Xa", End::E))[0])
            .unwrap()
            .other_end(&SegmentEnd::new(b"Xa", End::E))
            .unwrap();
        // and they keep different neighbors
        assert_ne!(x_other, xa_other);
    }

    #[test]
    fn select_end_heuristics() {
        let g = multiply_graph();
        // E has degree 2, B has degree 0
        assert_eq!(g.select_distribute_end(b"X", 2, false), Some(End::E));
        assert_eq!(g.select_distribute_end(b"X", 2, true), Some(End::E));
        assert_eq!(g.select_distribute_end(b"X", 3, true), None);
        assert_eq!(g.select_distribute_end(b"X", 3, false), Some(End::E));
        // no links at all on N1 besides its B side single link
        assert_eq!(g.select_distribute_end(b"N1", 3, false), None);
    }

    #[test]
    fn low_coverage_prune() {
        let mut g = Graph::read_string(
            b"S\tA\t*\tLN:i:100\tRC:i:1000\nS\tB\t*\tLN:i:100\tRC:i:10\nL\tA\t+\tB\t+\t*\n",
            true,
        )
        .unwrap();
        let gone = g.remove_low_coverage_segments(1.0, b"RC").unwrap();
        assert_eq!(gone, vec![BString::from("B")]);
        assert_eq!(g.segment_count(), 1);
        assert_eq!(g.link_count(), 0);
    }

    #[test]
    fn copy_numbers_compute_and_apply() {
        let mut g = Graph::read_string(
            b"S\tA\t*\tLN:i:100\tRC:i:1000\nS\tB\t*\tLN:i:100\tRC:i:2100\nS\tC\t*\tLN:i:100\tRC:i:10\n",
            true,
        )
        .unwrap();
        g.compute_copy_numbers(10.0, b"RC").unwrap();
        let cn = |g: &Graph, n: &[u8]| {
            g.segment_req(n).unwrap().optional.get_tag_int(b"cn").unwrap()
        };
        assert_eq!(cn(&g, b"A"), 1);
        assert_eq!(cn(&g, b"B"), 2);
        assert_eq!(cn(&g, b"C"), 0);

        g.apply_copy_numbers(LinksDistribution::Off).unwrap();
        assert!(g.segment(b"C").is_none());
        assert!(g.segment(b"A").is_some());
        assert!(g.segment(b"Ba").is_some());
        assert_eq!(g.segment_count(), 3);
    }

    #[test]
    fn failed_multiply_leaves_graph_unchanged() {
        let mut g = multiply_graph();
        let before = crate::writer::graph_string(&g);
        let opts = MultiplyOptions {
            copy_names: Some(vec!["N1".into()]),
            distribute: LinksDistribution::Off,
        };
        assert!(g.multiply(b"X", 2, &opts).is_err());
        assert_eq!(crate::writer::graph_string(&g), before);
    }

    #[test]
    fn paths_survive_by_name_after_multiply() {
        let mut g = Graph::read_string(
            b"S\tA\tACGT\nS\tB\tTT\nL\tA\t+\tB\t+\t2M\nP\tp\tA+,B+\t2M\n",
            true,
        )
        .unwrap();
        g.multiply(b"A", 2, &MultiplyOptions::default()).unwrap();
        let path: &GraphPath = g.path_by_name(b"p").unwrap();
        // the path still walks the original
        assert_eq!(path.segment_names[0].0, "A");
    }
}
