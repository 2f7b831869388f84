//! This module contains the bulk mask construction kernel.
//!
//! Given a set of row-index lists and a target length, it produces one boolean
//! mask per list, true exactly at the listed rows. It is the hot path of every
//! dense-to-sparse label conversion: a field with `k` unique labels turns into
//! `k` index lists, and this kernel turns them into `k` masks in one call.
//!
//! All indices are validated in a single pass over the consolidated input
//! before any output is allocated, so a failure never leaves partial output.
//! This module is PURE RUST and has no knowledge of labels or fields.

use num_traits::ToPrimitive;

use crate::error::LabelFrameError;
use crate::kernels::mask::{self, Mask};

//==================================================================================
// 1. Private Core Logic
//==================================================================================

/// Converts a caller-supplied target length into a mask length.
/// It must be a single, positive, integral value.
fn validate_target_len<N: ToPrimitive>(target_len: N) -> Result<usize, LabelFrameError> {
    let as_float = target_len.to_f64().ok_or_else(|| {
        LabelFrameError::TypeMismatch("target length is not representable as a number".to_string())
    })?;
    if !as_float.is_finite() || as_float.fract() != 0.0 || as_float < 1.0 {
        return Err(LabelFrameError::TypeMismatch(format!(
            "target length must be a positive integer, got {}",
            as_float
        )));
    }
    target_len.to_usize().ok_or_else(|| {
        LabelFrameError::TypeMismatch(format!("target length {} does not fit in usize", as_float))
    })
}

/// Checks that every index of every list is in `[0, len)`.
fn validate_indices<L: AsRef<[u64]>>(lists: &[L], len: usize) -> Result<(), LabelFrameError> {
    let bound = len as u64;
    for list in lists {
        if let Some(&bad) = list.as_ref().iter().find(|&&index| index >= bound) {
            return Err(LabelFrameError::InvalidIndex { index: bad, len });
        }
    }
    Ok(())
}

/// Fills a zeroed mask from an already-validated index list.
#[inline]
fn fill(indices: &[u64], len: usize) -> Mask {
    let mut out = mask::none(len);
    for &index in indices {
        out.set(index as usize, true);
    }
    out
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Builds one mask of length `target_len` per index list.
///
/// # Errors
/// * `TypeMismatch` if `target_len` is not a positive integer.
/// * `InvalidIndex` if any index is `>= target_len`.
pub fn assign_true<L, N>(index_lists: &[L], target_len: N) -> Result<Vec<Mask>, LabelFrameError>
where
    L: AsRef<[u64]>,
    N: ToPrimitive,
{
    let len = validate_target_len(target_len)?;
    validate_indices(index_lists, len)?;

    log_metric!("event" = "assign_true", "lists" = index_lists.len(), "len" = len);

    Ok(index_lists
        .iter()
        .map(|list| fill(list.as_ref(), len))
        .collect())
}

/// Like `assign_true`, but every list carries its own target length.
pub fn assign_true_each<L, N>(requests: &[(L, N)]) -> Result<Vec<Mask>, LabelFrameError>
where
    L: AsRef<[u64]>,
    N: ToPrimitive + Copy,
{
    // Validate everything first; nothing is allocated until the whole batch is known good.
    let mut lens = Vec::with_capacity(requests.len());
    for (list, target_len) in requests {
        let len = validate_target_len(*target_len)?;
        validate_indices(std::slice::from_ref(list), len)?;
        lens.push(len);
    }

    Ok(requests
        .iter()
        .zip(lens)
        .map(|((list, _), len)| fill(list.as_ref(), len))
        .collect())
}

/// The single-list path. Used when masks are built one label at a time.
pub fn assign_true_one<N: ToPrimitive>(indices: &[u64], target_len: N) -> Result<Mask, LabelFrameError> {
    let len = validate_target_len(target_len)?;
    validate_indices(std::slice::from_ref(&indices), len)?;
    Ok(fill(indices, len))
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_true_basic() {
        let lists = vec![vec![0u64, 2], vec![1u64], vec![]];
        let masks = assign_true(&lists, 3usize).unwrap();
        assert_eq!(masks.len(), 3);
        assert_eq!(mask::indices(&masks[0]), vec![0, 2]);
        assert_eq!(mask::indices(&masks[1]), vec![1]);
        assert_eq!(masks[2].count_ones(), 0);
        assert!(masks.iter().all(|m| m.len() == 3));
    }

    #[test]
    fn test_float_target_len_accepted_when_integral() {
        let masks = assign_true(&[vec![4u64]], 5.0f64).unwrap();
        assert_eq!(mask::indices(&masks[0]), vec![4]);
    }

    #[test]
    fn test_bad_target_len() {
        let lists = vec![vec![0u64]];
        for bad in [0.0f64, -3.0, 2.5, f64::NAN] {
            let result = assign_true(&lists, bad);
            assert!(
                matches!(result, Err(LabelFrameError::TypeMismatch(_))),
                "target length {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let lists = vec![vec![0u64, 1], vec![3u64]];
        let result = assign_true(&lists, 3u32);
        assert!(matches!(
            result,
            Err(LabelFrameError::InvalidIndex { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_each_uses_its_own_length() {
        let requests = vec![(vec![0u64], 1usize), (vec![0u64, 5], 6usize)];
        let masks = assign_true_each(&requests).unwrap();
        assert_eq!(masks[0].len(), 1);
        assert_eq!(masks[1].len(), 6);
        assert_eq!(mask::indices(&masks[1]), vec![0, 5]);

        let bad = vec![(vec![0u64], 1usize), (vec![9u64], 2usize)];
        assert!(matches!(
            assign_true_each(&bad),
            Err(LabelFrameError::InvalidIndex { index: 9, len: 2 })
        ));
    }

    #[test]
    fn test_one_matches_batched() {
        let indices = vec![1u64, 3, 4];
        let single = assign_true_one(&indices, 6usize).unwrap();
        let batched = assign_true(&[indices], 6usize).unwrap();
        assert_eq!(single, batched[0]);
    }
}
