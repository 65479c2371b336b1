use crate::segment::{longest_runs, unique_entries};

/// Capacity every segment of `fixed_level` must be padded to.
///
/// Follows, level by level, the coordinate values that occur most often
/// (all of them on ties) and returns the largest number of distinct
/// `fixed_level` coordinates found below them. This is not an exhaustive
/// search: a less frequent ancestor with a wider subtree is not visited,
/// so adversarial inputs can yield a smaller capacity than the true
/// maximum.
///
/// `coordinates` holds one sorted sequence per dimension.
pub fn find_max_fixed_value(coordinates: &[Vec<usize>], fixed_level: usize) -> usize {
    let nnz = coordinates.first().map_or(0, Vec::len);
    max_fixed_value(coordinates, fixed_level, 0, 0, nnz)
}

fn max_fixed_value(
    coordinates: &[Vec<usize>],
    fixed_level: usize,
    i: usize,
    begin: usize,
    end: usize,
) -> usize {
    if i == coordinates.len() {
        return end - begin;
    }
    if i == fixed_level {
        return unique_entries(&coordinates[i][begin..end]).len();
    }

    longest_runs(&coordinates[i], begin, end)
        .into_iter()
        .map(|(cbegin, cend)| max_fixed_value(coordinates, fixed_level, i + 1, cbegin, cend))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_at_outermost_level() {
        let coords = vec![vec![0, 0, 2, 5], vec![1, 3, 0, 0]];
        assert_eq!(find_max_fixed_value(&coords, 0), 3);
    }

    #[test]
    fn capacity_of_widest_row() {
        // row 0: cols {0,1,2}, row 1: col {1}
        let coords = vec![vec![0, 0, 0, 1], vec![0, 1, 2, 1]];
        assert_eq!(find_max_fixed_value(&coords, 1), 3);
    }

    #[test]
    fn capacity_explores_tied_rows() {
        // rows 0 and 2 tie with two entries each; row 2 is the widest
        let coords = vec![vec![0, 0, 1, 2, 2], vec![4, 4, 0, 1, 3]];
        assert_eq!(find_max_fixed_value(&coords, 1), 2);

        let coords = vec![
            vec![0, 0, 1, 1],
            vec![0, 0, 0, 1],
            vec![3, 3, 0, 0],
        ];
        // level 0 ties rows 0 and 1; row 0 has one distinct column (0),
        // row 1 has two ({0,1})
        assert_eq!(find_max_fixed_value(&coords, 1), 2);
    }

    #[test]
    fn capacity_of_empty_coordinates() {
        let coords: Vec<Vec<usize>> = vec![vec![], vec![]];
        assert_eq!(find_max_fixed_value(&coords, 0), 0);
        assert_eq!(find_max_fixed_value(&coords, 1), 0);
    }

    #[test]
    fn capacity_counts_coordinates_past_last_level() {
        let coords = vec![vec![0, 0, 1]];
        assert_eq!(max_fixed_value(&coords, 5, 1, 0, 2), 2);
    }

    #[test]
    fn capacity_follows_most_frequent_ancestor_only() {
        // i=0 has one column holding 3 distinct k values (3 entries);
        // i=1 has 4 entries split over two columns of 2 distinct k each.
        // Only i=1 is followed, so the capacity is 2 rather than 3.
        let coords = vec![
            vec![0, 0, 0, 1, 1, 1, 1],
            vec![0, 0, 0, 0, 0, 1, 1],
            vec![0, 1, 2, 0, 1, 0, 1],
        ];
        assert_eq!(find_max_fixed_value(&coords, 2), 2);
    }
}
