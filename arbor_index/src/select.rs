// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quickselect over index arrays.

/// Partially sort `indices` so that `indices[k]` refers to the `k`-th smallest
/// key.
///
/// Afterwards every entry before `k` has a key no greater than
/// `keys[indices[k]]`, and every entry after `k` has a key no smaller. Keys
/// are read through the indices; the key slice itself is never reordered.
/// Runs in expected linear time using a median-of-three pivot.
///
/// Does nothing if `k` is out of range.
///
/// ```
/// use arbor_index::partial_index_sort;
///
/// let keys = [5.0_f32, 1.0, 4.0, 2.0, 3.0];
/// let mut idx = [0_usize, 1, 2, 3, 4];
/// partial_index_sort(2, &keys, &mut idx);
/// assert_eq!(keys[idx[2]], 3.0);
/// ```
pub fn partial_index_sort(k: usize, keys: &[f32], indices: &mut [usize]) {
    if k >= indices.len() {
        return;
    }
    let key = |i: usize| keys[i];
    let mut lo = 0;
    let mut hi = indices.len() - 1;
    while lo < hi {
        // Median of three moves the pivot to `hi`.
        let mid = lo + (hi - lo) / 2;
        if key(indices[mid]) < key(indices[lo]) {
            indices.swap(mid, lo);
        }
        if key(indices[hi]) < key(indices[lo]) {
            indices.swap(hi, lo);
        }
        if key(indices[mid]) < key(indices[hi]) {
            indices.swap(mid, hi);
        }
        let pivot = key(indices[hi]);

        let mut store = lo;
        for i in lo..hi {
            if key(indices[i]) < pivot {
                indices.swap(i, store);
                store += 1;
            }
        }
        indices.swap(store, hi);

        // Entries equal to the pivot are grouped next to it, so long runs of
        // duplicate keys still shrink the range.
        let mut eq_end = store;
        for i in (store + 1)..=hi {
            if key(indices[i]) == pivot {
                eq_end += 1;
                indices.swap(i, eq_end);
            }
        }

        if k < store {
            hi = store - 1;
        } else if k > eq_end {
            lo = eq_end + 1;
        } else {
            return;
        }
    }
}
