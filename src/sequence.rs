use bstr::{BStr, BString};

/// The placeholder used by GFA for an unspecified sequence.
pub const PLACEHOLDER: &[u8] = b"*";

pub fn is_placeholder(seq: &[u8]) -> bool {
    seq == PLACEHOLDER
}

/// Complement of a single IUPAC nucleotide code. `=` and `.` map to
/// themselves; case is preserved. Returns `None` for bytes outside
/// the sequence alphabet.
pub fn complement(base: u8) -> Option<u8> {
    let comp = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'U' => b'A',
        b'R' => b'Y',
        b'Y' => b'R',
        b'S' => b'S',
        b'W' => b'W',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'N' => b'N',
        b'=' => b'=',
        b'.' => b'.',
        _ => return None,
    };
    if base.is_ascii_lowercase() {
        Some(comp.to_ascii_lowercase())
    } else {
        Some(comp)
    }
}

/// Reverse complement of a sequence. The placeholder `*` is its own
/// reverse complement. Bytes with no defined complement are kept
/// as-is, so the result always has the same length as the input.
pub fn rev_comp(seq: &BStr) -> BString {
    if is_placeholder(seq) {
        return BString::from(PLACEHOLDER);
    }
    seq.iter()
        .rev()
        .map(|&b| complement(b).unwrap_or(b))
        .collect::<Vec<u8>>()
        .into()
}

/// Sequence length for `LN` accounting: `None` for the placeholder.
pub fn len_of(seq: &BStr) -> Option<usize> {
    if is_placeholder(seq) {
        None
    } else {
        Some(seq.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::ByteSlice;

    #[test]
    fn revcomp_plain() {
        assert_eq!(rev_comp(b"ACGT".as_bstr()), BString::from("ACGT"));
        assert_eq!(rev_comp(b"ACCA".as_bstr()), BString::from("TGGT"));
    }

    #[test]
    fn revcomp_iupac_and_case() {
        assert_eq!(rev_comp(b"acgtRYKM".as_bstr()), BString::from("KMRYacgt"));
        assert_eq!(rev_comp(b"BDHVN=.".as_bstr()), BString::from(".=NBDHV"));
    }

    #[test]
    fn revcomp_placeholder() {
        assert_eq!(rev_comp(b"*".as_bstr()), BString::from("*"));
        assert_eq!(len_of(b"*".as_bstr()), None);
        assert_eq!(len_of(b"ACGT".as_bstr()), Some(4));
    }
}
