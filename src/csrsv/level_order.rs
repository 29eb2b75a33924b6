use crate::algebra::SpInt;
use crate::device::device_alloc;
use crate::SparseError;

/// Stable counting sort of rows by dependency level.
///
/// `done[row]` holds the level of `row` plus one, as left behind by the
/// analysis kernel, and `rows_per_level` the inclusive scan of the
/// number of rows on each level.   Rows of one level keep their
/// relative order, so the result depends only on the sparsity pattern.
pub(crate) fn build_row_map(done: &[i32], rows_per_level: &[SpInt]) -> Result<Vec<SpInt>, SparseError> {
    let mut row_map = device_alloc(done.len(), 0 as SpInt)?;
    let mut filled = device_alloc(rows_per_level.len(), 0usize)?;

    for (row, &d) in done.iter().enumerate() {
        if d < 1 || d as usize > rows_per_level.len() {
            return Err(SparseError::Internal(format!(
                "row {} has no valid dependency level",
                row
            )));
        }
        let level = (d - 1) as usize;
        let start = match level {
            0 => 0,
            _ => rows_per_level[level - 1] as usize,
        };
        row_map[start + filled[level]] = row as SpInt;
        filled[level] += 1;
    }

    Ok(row_map)
}

#[test]
fn test_build_row_map() {
    // levels 0 1 0 2 1
    let done = [1, 2, 1, 3, 2];
    let rows_per_level = [2, 4, 5];
    let row_map = build_row_map(&done, &rows_per_level).unwrap();
    assert_eq!(row_map, vec![0, 2, 1, 4, 3]);

    // a single level keeps natural order
    let row_map = build_row_map(&[1; 4], &[4]).unwrap();
    assert_eq!(row_map, vec![0, 1, 2, 3]);

    assert!(build_row_map(&[1, 0], &[1]).is_err());
}
