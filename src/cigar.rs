use bytemuck::{Contiguous, Pod, Zeroable};

use nom::{bytes::complete::*, IResult};

use serde::{Deserialize, Serialize};

#[repr(u8)]
#[derive(
    Contiguous,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum CIGAROp {
    M = 0,
    I = 1,
    D = 2,
    N = 3,
    S = 4,
    H = 5,
    P = 6,
    E = 7,
    X = 8,
}

impl CIGAROp {
    fn from_u8_byte(value: u8) -> Option<Self> {
        Self::from_integer(value)
    }

    fn to_u8_char(self) -> u8 {
        use CIGAROp::*;
        match self {
            M => b'M',
            I => b'I',
            D => b'D',
            N => b'N',
            S => b'S',
            H => b'H',
            P => b'P',
            E => b'=',
            X => b'X',
        }
    }

    fn from_u8_char(byte: u8) -> Option<CIGAROp> {
        use CIGAROp::*;
        match byte {
            b'M' => Some(M),
            b'I' => Some(I),
            b'D' => Some(D),
            b'N' => Some(N),
            b'S' => Some(S),
            b'H' => Some(H),
            b'P' => Some(P),
            b'=' => Some(E),
            b'X' => Some(X),
            _ => None,
        }
    }

    #[inline]
    pub fn is_match_or_mismatch(&self) -> bool {
        use CIGAROp::*;
        matches!(self, M | E | X)
    }
}

impl std::fmt::Display for CIGAROp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sym = char::from(self.to_u8_char());
        write!(f, "{}", sym)
    }
}

impl std::str::FromStr for CIGAROp {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.as_bytes()
            .first()
            .cloned()
            .and_then(CIGAROp::from_u8_char)
            .ok_or("Could not parse CIGAR operation")
    }
}

/// A memory-efficient representation of a single CIGAR op + length, as
/// a u32.
#[repr(transparent)]
#[derive(
    Zeroable,
    Pod,
    Debug,
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
pub struct CIGARPair(u32);

#[allow(clippy::len_without_is_empty)]
impl CIGARPair {
    pub fn new(len: u32, op: CIGAROp) -> Option<Self> {
        if len < (1 << 28) {
            Some(CIGARPair((len << 4) | (op as u32)))
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.0 >> 4
    }

    #[inline]
    pub fn op(&self) -> CIGAROp {
        let op = (self.0 & 0xF) as u8;
        CIGAROp::from_u8_byte(op).unwrap()
    }

    pub fn into_pair(&self) -> (u32, CIGAROp) {
        (self.len(), self.op())
    }

    pub fn from_pair((len, op): (u32, CIGAROp)) -> Self {
        CIGARPair((len << 4) | (op.into_integer()) as u32)
    }
}

impl std::fmt::Display for CIGARPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.len(), self.op())
    }
}

/// A CIGAR string as a sequence of packed (length, op) pairs. The
/// graph layer treats overlaps as opaque syntax; the only structural
/// case it ever inspects is [`CIGAR::as_single_match`].
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct CIGAR(pub Vec<CIGARPair>);

impl CIGAR {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, CIGAROp)>,
    {
        CIGAR(pairs.into_iter().map(CIGARPair::from_pair).collect())
    }

    fn parse_op_cmd(input: &[u8]) -> IResult<&[u8], CIGAROp> {
        use nom::{branch::alt, combinator::map};
        use CIGAROp::*;
        alt((
            map(tag("M"), |_| M),
            map(tag("I"), |_| I),
            map(tag("D"), |_| D),
            map(tag("N"), |_| N),
            map(tag("S"), |_| S),
            map(tag("H"), |_| H),
            map(tag("P"), |_| P),
            map(tag("="), |_| E),
            map(tag("X"), |_| X),
        ))(input)
    }

    pub(crate) fn parser_bytestring(i: &[u8]) -> IResult<&[u8], Self> {
        use nom::{
            character::complete::digit1, combinator::map, multi::many1,
            sequence::pair,
        };
        map(
            many1(map(
                pair(
                    map(digit1, |bs: &[u8]| {
                        let s = unsafe { std::str::from_utf8_unchecked(bs) };
                        s.parse::<u32>().unwrap()
                    }),
                    Self::parse_op_cmd,
                ),
                CIGARPair::from_pair,
            )),
            CIGAR,
        )(i)
    }

    /// Parse a CIGAR object from an ASCII byte slice; the entire
    /// slice must be consumed.
    pub fn from_bytestring(i: &[u8]) -> Option<Self> {
        match Self::parser_bytestring(i) {
            Ok((rest, cg)) if rest.is_empty() => Some(cg),
            _ => None,
        }
    }

    /// Total length over all operations.
    pub fn len(&self) -> usize {
        self.0.iter().fold(0, |s, pair| s + pair.len() as usize)
    }

    /// is_empty corresponds to whether or not the contained vector is
    /// empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, CIGAROp)> + '_ {
        self.0.iter().map(CIGARPair::into_pair)
    }

    /// If this CIGAR consists of exactly one `M` operation, return
    /// its length. This is the only overlap shape the linear-path
    /// merger can collapse.
    pub fn as_single_match(&self) -> Option<u32> {
        match self.0.as_slice() {
            [pair] if pair.op() == CIGAROp::M => Some(pair.len()),
            _ => None,
        }
    }
}

impl std::fmt::Display for CIGAR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for pair in self.0.iter() {
            let (len, op) = pair.into_pair();
            write!(f, "{}{}", len, op)?
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cigar_display() {
        let input = b"20M12D3M4N9S10H5P11=9X";
        let input_str = std::str::from_utf8(input).unwrap();
        let cigar = CIGAR::from_bytestring(input).unwrap();
        assert_eq!(input_str, cigar.to_string());
    }

    #[test]
    fn cigar_parser_bytestring() {
        use CIGAROp::*;

        let cigar = CIGAR::from_bytestring(b"20M12D3M").unwrap();
        assert_eq!(CIGAR::from_pairs(vec![(20, M), (12, D), (3, M)]), cigar);
        assert_eq!(cigar.len(), 35);

        // trailing garbage and missing counts are rejected
        assert!(CIGAR::from_bytestring(b"20M12D93  X").is_none());
        assert!(CIGAR::from_bytestring(b"M20").is_none());
        assert!(CIGAR::from_bytestring(b"20").is_none());
        assert!(CIGAR::from_bytestring(b"").is_none());
    }

    #[test]
    fn single_match_collapse() {
        assert_eq!(
            CIGAR::from_bytestring(b"4M").unwrap().as_single_match(),
            Some(4)
        );
        assert_eq!(
            CIGAR::from_bytestring(b"0M").unwrap().as_single_match(),
            Some(0)
        );
        assert_eq!(
            CIGAR::from_bytestring(b"4I").unwrap().as_single_match(),
            None
        );
        assert_eq!(
            CIGAR::from_bytestring(b"2M2M").unwrap().as_single_match(),
            None
        );
    }
}
