use bstr::{BStr, BString};
use serde::{Deserialize, Serialize};

use crate::gfa::{Link, Orientation};
use crate::optfields::OptFields;

/// One of the two attachment sites of a segment: `B` is the 5' side
/// of the forward orientation, `E` the 3' side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum End {
    B,
    E,
}

impl End {
    pub fn other(&self) -> End {
        match self {
            End::B => End::E,
            End::E => End::B,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            End::B => 'B',
            End::E => 'E',
        }
    }
}

impl std::fmt::Display for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A segment name plus an end symbol; the key type of the
/// connectivity index.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SegmentEnd {
    pub name: BString,
    pub end: End,
}

impl SegmentEnd {
    pub fn new(name: &[u8], end: End) -> Self {
        SegmentEnd {
            name: name.into(),
            end,
        }
    }

    /// The other end of the same segment.
    pub fn inverted(&self) -> Self {
        SegmentEnd {
            name: self.name.clone(),
            end: self.end.other(),
        }
    }

    pub fn name_ref(&self) -> &BStr {
        self.name.as_ref()
    }
}

impl std::fmt::Display for SegmentEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.end)
    }
}

/// Which endpoint of a link a segment-end sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    From,
    To,
}

impl<T: OptFields> Link<BString, T> {
    /// The segment end the `from` endpoint attaches to: the E end
    /// when read forward, the B end when read in reverse.
    pub fn from_end(&self) -> SegmentEnd {
        let end = match self.from_orient {
            Orientation::Forward => End::E,
            Orientation::Backward => End::B,
        };
        SegmentEnd::new(&self.from_segment, end)
    }

    /// The segment end the `to` endpoint attaches to: the B end when
    /// read forward, the E end when read in reverse.
    pub fn to_end(&self) -> SegmentEnd {
        let end = match self.to_orient {
            Orientation::Forward => End::B,
            Orientation::Backward => End::E,
        };
        SegmentEnd::new(&self.to_segment, end)
    }

    /// Given one attachment site of this link, the site on the other
    /// side. `None` when the link does not touch `end` at all.
    pub fn other_end(&self, end: &SegmentEnd) -> Option<SegmentEnd> {
        if self.from_end() == *end {
            Some(self.to_end())
        } else if self.to_end() == *end {
            Some(self.from_end())
        } else {
            None
        }
    }

    /// The link sides attached at the given segment end (both, for a
    /// self-link folding back onto the same end).
    pub fn sides_at(&self, end: &SegmentEnd) -> Vec<LinkSide> {
        let mut sides = Vec::with_capacity(1);
        if self.from_end() == *end {
            sides.push(LinkSide::From);
        }
        if self.to_end() == *end {
            sides.push(LinkSide::To);
        }
        sides
    }

    /// Reattach one endpoint of this link to another segment end,
    /// rewriting the name and orientation together.
    pub fn set_endpoint(&mut self, side: LinkSide, end: &SegmentEnd) {
        match side {
            LinkSide::From => {
                self.from_segment = end.name.clone();
                self.from_orient = match end.end {
                    End::E => Orientation::Forward,
                    End::B => Orientation::Backward,
                };
            }
            LinkSide::To => {
                self.to_segment = end.name.clone();
                self.to_orient = match end.end {
                    End::B => Orientation::Forward,
                    End::E => Orientation::Backward,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(
        from: &str,
        fo: Orientation,
        to: &str,
        to_: Orientation,
    ) -> Link<BString, ()> {
        Link::new(from.as_bytes(), fo, to.as_bytes(), to_, b"*")
    }

    #[test]
    fn endpoint_geometry() {
        use Orientation::*;
        let l = link("A", Forward, "B", Forward);
        assert_eq!(l.from_end(), SegmentEnd::new(b"A", End::E));
        assert_eq!(l.to_end(), SegmentEnd::new(b"B", End::B));

        let l = link("A", Backward, "B", Backward);
        assert_eq!(l.from_end(), SegmentEnd::new(b"A", End::B));
        assert_eq!(l.to_end(), SegmentEnd::new(b"B", End::E));
    }

    #[test]
    fn other_end_works_for_self_links() {
        use Orientation::*;
        let l = link("A", Forward, "A", Forward);
        let e = SegmentEnd::new(b"A", End::E);
        assert_eq!(l.other_end(&e), Some(SegmentEnd::new(b"A", End::B)));
        assert_eq!(
            l.other_end(&SegmentEnd::new(b"B", End::B)),
            None
        );
    }

    #[test]
    fn reattach_endpoint() {
        use Orientation::*;
        let mut l = link("A", Forward, "B", Forward);
        l.set_endpoint(LinkSide::From, &SegmentEnd::new(b"M", End::B));
        assert_eq!(l.from_segment, BString::from("M"));
        assert_eq!(l.from_orient, Backward);
        assert_eq!(l.from_end(), SegmentEnd::new(b"M", End::B));
    }
}
