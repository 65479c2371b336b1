//! Scans over one level's coordinates within a sorted sub-range.

/// Distinct values of a sorted slice, ascending.
///
/// # Panics
/// Panics if an element is smaller than its predecessor. The slice is
/// never sorted here; ordering is the caller's obligation.
pub fn unique_entries(coords: &[usize]) -> Vec<usize> {
    let mut unique = Vec::new();
    let Some((&first, rest)) = coords.split_first() else {
        return unique;
    };

    let mut curr = first;
    unique.push(curr);
    for &next in rest {
        assert!(next >= curr, "unique_entries: coordinates not sorted ({} after {})", next, curr);
        if next > curr {
            curr = next;
            unique.push(curr);
        }
    }
    unique
}

/// End of the run of `value` starting at `begin`, bounded by `end`.
/// Only scans forward; a run that does not start at `begin` is empty.
#[inline]
pub(crate) fn run_end(level_coords: &[usize], begin: usize, end: usize, value: usize) -> usize {
    let mut cend = begin;
    while cend < end && level_coords[cend] == value {
        cend += 1;
    }
    cend
}

/// Runs of equal values in `level_coords[begin..end]` whose length is
/// maximal, as `(begin, end)` pairs in order of appearance.
pub(crate) fn longest_runs(level_coords: &[usize], begin: usize, end: usize) -> Vec<(usize, usize)> {
    let mut best = 0;
    let mut runs = Vec::new();

    let mut cbegin = begin;
    while cbegin < end {
        let cend = run_end(level_coords, cbegin, end, level_coords[cbegin]);
        let len = cend - cbegin;
        if len > best {
            best = len;
            runs.clear();
            runs.push((cbegin, cend));
        } else if len == best {
            runs.push((cbegin, cend));
        }
        cbegin = cend;
    }
    runs
}
