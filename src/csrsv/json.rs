use super::TriangularAnalysis;
use itertools::Itertools;
use std::io::Write;
use std::{fs::File, io, io::Read};

impl TriangularAnalysis {
    /// Write the analysis to `file` as JSON.   The recorded zero pivot
    /// is per-solve state and is not saved.
    pub fn save_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let json = serde_json::to_string(self)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Read an analysis written by [`save_to_file`](Self::save_to_file).
    ///
    /// The loaded analysis is only valid for the sparsity pattern it was
    /// built from; it is checked for internal consistency only.
    pub fn load_from_file(file: &mut File) -> Result<Self, io::Error> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let analysis: TriangularAnalysis = serde_json::from_str(&buffer)?;

        if !analysis.is_consistent() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "inconsistent triangular analysis",
            ));
        }
        analysis.arm_zero_pivot(analysis.structural_zero_pivot);
        Ok(analysis)
    }

    fn is_consistent(&self) -> bool {
        let m = self.m;
        if self.diag_index.len() != m
            || self.row_map.len() != m
            || self.rows_per_level.len() != self.max_depth
        {
            return false;
        }

        // every level holds at least one row and the last one ends at m
        let levels_ok = self.rows_per_level.first().map_or(true, |&r| r > 0)
            && self.rows_per_level.windows(2).all(|w| w[0] < w[1])
            && self.rows_per_level.last().map_or(m == 0, |&r| r as usize == m);

        // each row is scheduled exactly once
        let mut seen = vec![false; m];
        let is_permutation = self.row_map.iter().all(|&r| {
            r >= 0 && (r as usize) < m && !std::mem::replace(&mut seen[r as usize], true)
        });

        // diagonal positions lie in disjoint row ranges, so they increase
        // with the row
        let diag_ok = self.diag_index.iter().flatten().all(|&p| p < self.nnz)
            && self.diag_index.iter().flatten().tuple_windows().all(|(a, b)| a < b);

        let pivot_ok = self
            .structural_zero_pivot
            .map_or(true, |r| r < m && self.diag_index[r].is_none());

        levels_ok && is_permutation && diag_ok && pivot_ok
    }
}

#[test]
fn test_json_io() {
    use crate::algebra::*;
    use crate::device::*;
    use crate::timers::Timers;
    use std::io::{Seek, SeekFrom};

    let A = CsrMatrix::from_dense_rows(&[
        vec![2., 0., 0.],
        vec![1., 3., 0.],
        vec![0., 1., 4.],
    ]);
    let descr = MatDescr::default();
    let view = A.view(&descr);

    let handle = Handle::new(HandleSettings::default()).unwrap();
    let mut ws = Workspace::with_size(super::buffer_size::workspace_size(3, A.nnz())).unwrap();
    let analysis = super::analysis::analyze(
        &handle,
        &view,
        FillMode::Lower,
        &mut ws,
        &mut Timers::default(),
    )
    .unwrap();

    let mut file = tempfile::tempfile().unwrap();
    analysis.save_to_file(&mut file).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    let analysis2 = TriangularAnalysis::load_from_file(&mut file).unwrap();
    assert_eq!(analysis.row_map(), analysis2.row_map());
    assert_eq!(analysis.rows_per_level(), analysis2.rows_per_level());
    assert_eq!(analysis.diag_index(), analysis2.diag_index());
    assert_eq!(analysis2.zero_pivot(), None);
}

#[test]
fn test_json_rejects_inconsistent_analysis() {
    use crate::algebra::*;
    use crate::device::*;
    use crate::timers::Timers;
    use std::io::{Seek, SeekFrom};

    let A = CsrMatrix::from_dense_rows(&[
        vec![2., 0., 0.],
        vec![1., 3., 0.],
        vec![0., 1., 4.],
    ]);
    let descr = MatDescr::default();
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let mut ws = Workspace::with_size(super::buffer_size::workspace_size(3, A.nnz())).unwrap();
    let analysis = super::analysis::analyze(
        &handle,
        &A.view(&descr),
        FillMode::Lower,
        &mut ws,
        &mut Timers::default(),
    )
    .unwrap();
    let good = serde_json::to_value(&analysis).unwrap();

    let edits: [(&str, serde_json::Value); 4] = [
        // row 0 twice and row 2 never
        ("row_map", serde_json::json!([0, 1, 0])),
        // diagonal of row 0 placed after the one of row 1
        ("diag_index", serde_json::json!([2, 0, 4])),
        // an empty level
        ("rows_per_level", serde_json::json!([1, 1, 3])),
        // row 1 has a diagonal
        ("structural_zero_pivot", serde_json::json!(1)),
    ];

    for (field, value) in edits {
        let mut bad = good.clone();
        bad[field] = value;

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(bad.to_string().as_bytes()).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let err = TriangularAnalysis::load_from_file(&mut file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData, "{}", field);
    }
}
