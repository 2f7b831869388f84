//! Row-mask kernels.
//!
//! A `Mask` holds one bit per row, true where the row is a member. All binary
//! kernels require operands of equal length; callers validate lengths at the
//! public boundary, so a mismatch here is a logic error and only checked with
//! `debug_assert!`.

use bitvec::prelude::*;

/// One bit per row.
pub type Mask = BitVec<usize, Lsb0>;

/// A mask of `len` rows, all set.
pub fn all(len: usize) -> Mask {
    BitVec::repeat(true, len)
}

/// A mask of `len` rows, none set.
pub fn none(len: usize) -> Mask {
    BitVec::repeat(false, len)
}

pub fn from_bools(bits: &[bool]) -> Mask {
    bits.iter().copied().collect()
}

/// `target &= other`, in place.
pub fn and_assign(target: &mut Mask, other: &Mask) {
    debug_assert_eq!(target.len(), other.len());
    for (mut bit, keep) in target.iter_mut().zip(other.iter().by_vals()) {
        *bit &= keep;
    }
}

/// `target |= other`, in place.
pub fn or_assign(target: &mut Mask, other: &Mask) {
    debug_assert_eq!(target.len(), other.len());
    for (mut bit, add) in target.iter_mut().zip(other.iter().by_vals()) {
        *bit |= add;
    }
}

pub fn not(mask: &Mask) -> Mask {
    mask.iter().by_vals().map(|bit| !bit).collect()
}

/// Keeps the bits of `mask` at the rows selected by `rows`, in row order.
/// The result has `rows.count_ones()` bits.
pub fn gather(mask: &Mask, rows: &Mask) -> Mask {
    debug_assert_eq!(mask.len(), rows.len());
    rows.iter_ones().map(|row| mask[row]).collect()
}

/// Appends `tail` after `head`.
pub fn concat(head: &Mask, tail: &Mask) -> Mask {
    let mut out = Mask::with_capacity(head.len() + tail.len());
    out.extend_from_bitslice(head.as_bitslice());
    out.extend_from_bitslice(tail.as_bitslice());
    out
}

/// Row numbers of the set bits, ascending.
pub fn indices(mask: &Mask) -> Vec<usize> {
    mask.iter_ones().collect()
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_or_not() {
        let mut a = from_bools(&[true, true, false, false]);
        let b = from_bools(&[true, false, true, false]);

        let mut both = a.clone();
        and_assign(&mut both, &b);
        assert_eq!(indices(&both), vec![0]);

        or_assign(&mut a, &b);
        assert_eq!(indices(&a), vec![0, 1, 2]);

        assert_eq!(indices(&not(&a)), vec![3]);
    }

    #[test]
    fn test_gather_keeps_row_order() {
        let mask = from_bools(&[true, false, true, true, false]);
        let rows = from_bools(&[false, true, true, false, true]);
        assert_eq!(gather(&mask, &rows), from_bools(&[false, true, false]));
    }

    #[test]
    fn test_concat() {
        let head = from_bools(&[true, false]);
        let tail = from_bools(&[false, false, true]);
        let joined = concat(&head, &tail);
        assert_eq!(joined.len(), 5);
        assert_eq!(indices(&joined), vec![0, 4]);
    }

    #[test]
    fn test_all_none_counts() {
        assert_eq!(all(70).count_ones(), 70);
        assert_eq!(none(70).count_ones(), 0);
        assert!(all(0).is_empty());
    }
}
