#![allow(non_snake_case)]

use super::*;
use crate::algebra::*;
use crate::device::*;
use crate::timers::Timers;
use std::sync::Arc;

fn test_handle(threads: u32) -> Handle {
    let settings = HandleSettingsBuilder::default()
        .max_threads(threads)
        .spin_limit(1 << 32)
        .build()
        .unwrap();
    Handle::new(settings).unwrap()
}

fn workspace_for<T: FloatT>(A: &CsrMatrixView<T>) -> Workspace {
    Workspace::with_size(workspace_size(A.m as usize, A.nnz as usize)).unwrap()
}

// deterministic pseudo random pattern generator
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

// banded triangle with random fill and a dominant diagonal
fn random_triangle(m: usize, band: usize, fill_mode: FillMode, seed: u64) -> CsrMatrix<f64> {
    let mut rng = Lcg(seed);
    let mut rows = vec![vec![0.; m]; m];
    for (i, row) in rows.iter_mut().enumerate() {
        row[i] = 4. + (rng.next() % 7) as f64;
        for j in i.saturating_sub(band)..(i + band + 1).min(m) {
            if fill_mode.is_dependency(i, j) && rng.next() % 100 < 20 {
                row[j] = 1. + (rng.next() % 3) as f64;
            }
        }
    }
    CsrMatrix::from_dense_rows(&rows)
}

fn run_analysis(handle: &Handle, A: &CsrMatrixView<f64>) -> TriangularAnalysis {
    let mut ws = workspace_for(A);
    analyze(handle, A, A.descr.fill_mode, &mut ws, &mut Timers::default()).unwrap()
}

// every dependency of a row appears earlier in row_map, on a lower level
fn assert_topological(analysis: &TriangularAnalysis, A: &CsrMatrix<f64>, fill_mode: FillMode) {
    let m = A.m;
    let mut level = vec![usize::MAX; m];
    for k in 0..analysis.max_depth() {
        for &row in analysis.level(k).unwrap() {
            assert_eq!(level[row as usize], usize::MAX);
            level[row as usize] = k;
        }
    }
    assert!(level.iter().all(|&l| l != usize::MAX));

    let mut position = vec![0; m];
    for (p, &row) in analysis.row_map().iter().enumerate() {
        position[row as usize] = p;
    }

    for row in 0..m {
        for j in A.row_range(row) {
            let col = A.colval[j] as usize;
            if fill_mode.is_dependency(row, col) {
                assert!(position[col] < position[row]);
                assert!(level[col] < level[row]);
            }
        }
    }
}

#[test]
fn test_levels_of_chain() {
    // every row depends on the previous one
    let A = CsrMatrix::from_dense_rows(&[
        vec![2., 0., 0., 0.],
        vec![1., 3., 0., 0.],
        vec![0., 1., 4., 0.],
        vec![0., 0., 1., 5.],
    ]);
    let descr = MatDescr::default();
    let analysis = run_analysis(&test_handle(2), &A.view(&descr));

    assert_eq!(analysis.max_depth(), 4);
    assert_eq!(analysis.rows_per_level(), &[1, 2, 3, 4]);
    assert_eq!(analysis.row_map(), &[0, 1, 2, 3]);
    assert_eq!(analysis.diag_index(), &[Some(0), Some(2), Some(4), Some(6)]);
    assert_eq!(analysis.max_row_nnz(), 2);
    assert_eq!(analysis.structural_zero_pivot(), None);
}

#[test]
fn test_levels_group_independent_rows() {
    //[ 1  .  .  . ]
    //[ 1  1  .  . ]
    //[ .  .  1  . ]
    //[ .  1  1  1 ]
    let A = CsrMatrix::from_dense_rows(&[
        vec![1., 0., 0., 0.],
        vec![1., 1., 0., 0.],
        vec![0., 0., 1., 0.],
        vec![0., 1., 1., 1.],
    ]);
    let descr = MatDescr::default();
    let analysis = run_analysis(&test_handle(3), &A.view(&descr));

    assert_eq!(analysis.max_depth(), 3);
    assert_eq!(analysis.rows_per_level(), &[2, 3, 4]);
    assert_eq!(analysis.row_map(), &[0, 2, 1, 3]);
    assert_eq!(analysis.level(0), Some(&[0, 2][..]));
    assert_eq!(analysis.level(2), Some(&[3][..]));
    assert_eq!(analysis.level(3), None);
    assert_eq!(analysis.max_row_nnz(), 3);
}

#[test]
fn test_upper_levels() {
    // transpose of the chain above: row 3 first
    let A = CsrMatrix::from_dense_rows(&[
        vec![2., 1., 0., 0.],
        vec![0., 3., 1., 0.],
        vec![0., 0., 4., 1.],
        vec![0., 0., 0., 5.],
    ]);
    let descr = MatDescr::default().with_fill_mode(FillMode::Upper);
    let analysis = run_analysis(&test_handle(2), &A.view(&descr));

    assert_eq!(analysis.fill_mode(), FillMode::Upper);
    assert_eq!(analysis.max_depth(), 4);
    assert_eq!(analysis.row_map(), &[3, 2, 1, 0]);
    assert_eq!(analysis.diag_index(), &[Some(0), Some(2), Some(4), Some(6)]);
}

#[test]
fn test_analysis_deterministic_and_topological() {
    for fill_mode in [FillMode::Lower, FillMode::Upper] {
        let A = random_triangle(600, 25, fill_mode, 17);
        let descr = MatDescr::default().with_fill_mode(fill_mode);
        let view = A.view(&descr);

        let first = run_analysis(&test_handle(4), &view);
        assert_topological(&first, &A, fill_mode);

        for threads in [1, 3, 8] {
            let again = run_analysis(&test_handle(threads), &view);
            assert_eq!(first.row_map(), again.row_map());
            assert_eq!(first.rows_per_level(), again.rows_per_level());
            assert_eq!(first.max_depth(), again.max_depth());
            assert_eq!(first.diag_index(), again.diag_index());
            assert_eq!(first.max_row_nnz(), again.max_row_nnz());
        }
    }
}

#[test]
fn test_analysis_ignores_opposite_triangle() {
    let A = random_triangle(50, 5, FillMode::Lower, 3);
    let full = CsrMatrix::from_dense_rows(
        &(0..A.m)
            .map(|i| {
                (0..A.m)
                    .map(|j| match A.get_entry((i, j)) {
                        Some(v) => v,
                        None if j == i + 1 => 7.,
                        None => 0.,
                    })
                    .collect()
            })
            .collect::<Vec<_>>(),
    );
    let descr = MatDescr::default();
    let handle = test_handle(2);

    let tri = run_analysis(&handle, &A.view(&descr));
    let both = run_analysis(&handle, &full.view(&descr));
    assert_eq!(tri.row_map(), both.row_map());
    assert_eq!(tri.max_depth(), both.max_depth());
}

#[test]
fn test_structural_zero_pivot() {
    //row 2 has no diagonal
    let A = CsrMatrix::from_dense_rows(&[
        vec![1., 0., 0., 0.],
        vec![1., 1., 0., 0.],
        vec![0., 1., 0., 0.],
        vec![0., 0., 1., 1.],
    ]);
    let descr = MatDescr::default();
    let analysis = run_analysis(&test_handle(2), &A.view(&descr));

    assert_eq!(analysis.diag_index()[2], None);
    assert_eq!(analysis.structural_zero_pivot(), Some(2));
    assert_eq!(analysis.zero_pivot(), Some(2));
}

#[test]
fn test_bad_column_index() {
    let A = CsrMatrix::new(
        2,
        2,
        vec![0, 1, 3],
        vec![0, 0, 5],
        vec![1., 1., 1.],
        IndexBase::Zero,
    );
    let descr = MatDescr::default();
    let view = A.view(&descr);
    let mut ws = workspace_for(&view);
    let result = analyze(
        &test_handle(1),
        &view,
        FillMode::Lower,
        &mut ws,
        &mut Timers::default(),
    );
    assert_eq!(result.err(), Some(crate::SparseError::InvalidValue("csr_col_ind")));
}

#[test]
fn test_reuse_and_force_policies() {
    let A = random_triangle(200, 10, FillMode::Upper, 5);
    let descr = MatDescr::default().with_fill_mode(FillMode::Upper);
    let view = A.view(&descr);
    let handle = test_handle(4);
    let op = Operation::NonTranspose;
    let mut ws = workspace_for(&view);

    // reuse with nothing stored builds the same analysis as force
    let mut info_reuse = MatInfo::new();
    let mut info_force = MatInfo::new();
    csrsv_analysis(&handle, op, &view, &mut info_reuse, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();
    csrsv_analysis(&handle, op, &view, &mut info_force, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();

    let a = info_reuse.analysis(AnalysisSlot::CsrsvUpper).unwrap().clone();
    let b = info_force.analysis(AnalysisSlot::CsrsvUpper).unwrap().clone();
    assert_eq!(a.row_map(), b.row_map());
    assert_eq!(a.diag_index(), b.diag_index());
    assert!(info_reuse.analysis(AnalysisSlot::CsrsvLower).is_none());

    // a second reuse keeps the stored analysis, force replaces it
    csrsv_analysis(&handle, op, &view, &mut info_reuse, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();
    assert!(Arc::ptr_eq(&a, info_reuse.analysis(AnalysisSlot::CsrsvUpper).unwrap()));

    csrsv_analysis(&handle, op, &view, &mut info_reuse, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
    assert!(!Arc::ptr_eq(&a, info_reuse.analysis(AnalysisSlot::CsrsvUpper).unwrap()));
}

#[test]
fn test_lower_reuse_shares_ilu0_analysis() {
    let A = random_triangle(100, 8, FillMode::Lower, 11);
    let descr = MatDescr::default();
    let view = A.view(&descr);
    let handle = test_handle(2);
    let op = Operation::NonTranspose;
    let mut ws = workspace_for(&view);

    let mut info = MatInfo::new();
    let ilu0 = Arc::new(run_analysis(&handle, &view));
    info.insert(AnalysisSlot::Csrilu0, Arc::clone(&ilu0)).unwrap();
    drop(ilu0);

    csrsv_analysis(&handle, op, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();
    assert!(info.is_shared(AnalysisSlot::CsrsvLower));
    assert!(Arc::ptr_eq(
        info.analysis(AnalysisSlot::CsrsvLower).unwrap(),
        info.analysis(AnalysisSlot::Csrilu0).unwrap()
    ));

    // releasing one holder leaves the other intact
    assert!(info.release(AnalysisSlot::Csrilu0));
    assert!(!info.is_shared(AnalysisSlot::CsrsvLower));
    assert!(info.analysis(AnalysisSlot::CsrsvLower).is_some());

    // force never shares
    info.alias(AnalysisSlot::CsrsvLower, AnalysisSlot::Csrilu0).unwrap();
    csrsv_analysis(&handle, op, &view, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
    assert!(!info.is_shared(AnalysisSlot::CsrsvLower));
}

#[test]
fn test_alias_checks_fill_mode() {
    let A = random_triangle(20, 3, FillMode::Lower, 2);
    let descr = MatDescr::default();
    let analysis = Arc::new(run_analysis(&test_handle(1), &A.view(&descr)));

    let mut info = MatInfo::new();
    assert_eq!(
        info.alias(AnalysisSlot::CsrsvLower, AnalysisSlot::Csrilu0),
        Err(crate::SparseError::InvalidPointer("info"))
    );
    assert_eq!(
        info.insert(AnalysisSlot::CsrsvUpper, Arc::clone(&analysis)),
        Err(crate::SparseError::InvalidValue("fill_mode"))
    );
    info.insert(AnalysisSlot::CsrsvLower, analysis).unwrap();
    assert_eq!(
        info.alias(AnalysisSlot::CsrsvLower, AnalysisSlot::CsrsvUpper),
        Err(crate::SparseError::InvalidValue("fill_mode"))
    );
}

#[test]
fn test_spin_limit_on_mismatched_analysis() {
    // rows of P are independent, so its row_map is [0, 1].   Solving
    // with B, where row 0 waits on row 1, can never finish on a single
    // worker.
    let P = CsrMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![1., 1., 1.], IndexBase::Zero);
    let B = CsrMatrix::new(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![1., 1., 1.], IndexBase::Zero);
    let descr = MatDescr::default().with_fill_mode(FillMode::Upper);

    let settings = HandleSettingsBuilder::default()
        .max_threads(1)
        .spin_limit(1000)
        .build()
        .unwrap();
    let handle = Handle::new(settings).unwrap();
    let op = Operation::NonTranspose;

    let Pv = P.view(&descr);
    let mut ws = workspace_for(&Pv);
    let mut info = MatInfo::new();
    csrsv_analysis(&handle, op, &Pv, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
    assert_eq!(info.analysis(AnalysisSlot::CsrsvUpper).unwrap().row_map(), &[0, 1]);

    let mut y = [0.; 2];
    let result = csrsv_solve(&handle, op, &1., &B.view(&descr), &info, &[1., 1.], &mut y, SolvePolicy::Auto, &mut ws);
    assert_eq!(
        result,
        Err(crate::SparseError::SpinLimitExceeded { row: 1, spins: 1000 })
    );
}

#[test]
fn test_stale_diagonal_positions_rejected() {
    // same m and nnz, but the diagonal of row 1 sits at position 2 in P
    // and at position 1 in Q
    let P = CsrMatrix::new(3, 3, vec![0, 1, 3, 4], vec![0, 0, 1, 2], vec![1., 1., 2., 3.], IndexBase::Zero);
    let Q = CsrMatrix::new(3, 3, vec![0, 1, 2, 4], vec![0, 1, 0, 2], vec![1., 2., 1., 3.], IndexBase::Zero);
    let descr = MatDescr::default();
    let handle = test_handle(2);
    let op = Operation::NonTranspose;

    let Pv = P.view(&descr);
    let mut ws = workspace_for(&Pv);
    let mut info = MatInfo::new();
    csrsv_analysis(&handle, op, &Pv, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
    assert_eq!(info.analysis(AnalysisSlot::CsrsvLower).unwrap().diag_index(), &[Some(0), Some(2), Some(3)]);

    let mut y = [0.; 3];
    let result = csrsv_solve(&handle, op, &1., &Q.view(&descr), &info, &[1.; 3], &mut y, SolvePolicy::Auto, &mut ws);
    assert_eq!(result, Err(crate::SparseError::InvalidValue("info")));

    // the check does not depend on the diagonal type
    let unit = descr.with_diag_type(DiagType::Unit);
    let result = csrsv_solve(&handle, op, &1., &Q.view(&unit), &info, &[1.; 3], &mut y, SolvePolicy::Auto, &mut ws);
    assert_eq!(result, Err(crate::SparseError::InvalidValue("info")));
}
