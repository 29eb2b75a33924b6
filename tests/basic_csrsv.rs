#![allow(non_snake_case)]

use csrtri::{algebra::*, csrsv::*, device::*};

fn lower_4x4() -> CsrMatrix<f64> {
    CsrMatrix::from_dense_rows(&[
        vec![2., 0., 0., 0.],
        vec![1., 3., 0., 0.],
        vec![0., 1., 4., 0.],
        vec![0., 0., 1., 5.],
    ])
}

fn solve_with(
    handle: &Handle,
    A: &CsrMatrix<f64>,
    descr: &MatDescr,
    alpha: f64,
    x: &[f64],
) -> (Vec<f64>, Option<usize>) {
    let op = Operation::NonTranspose;
    let (m, nnz) = (A.m as SpInt, A.nnz() as SpInt);
    let bytes = csrsv_buffer_size(handle, op, m, nnz, descr).unwrap();
    let mut ws = Workspace::with_size(bytes).unwrap();
    let mut info = MatInfo::new();

    let view = A.view(descr);
    csrsv_analysis(handle, op, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();

    let mut y = vec![0.; A.m];
    let pivot = csrsv_solve(handle, op, &alpha, &view, &info, x, &mut y, SolvePolicy::Auto, &mut ws).unwrap();
    (y, pivot)
}

fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() <= tol, "{:?} != {:?}", a, b);
    }
}

#[test]
fn test_lower_forward_substitution() {
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let A = lower_4x4();

    let (y, pivot) = solve_with(&handle, &A, &MatDescr::default(), 1., &[1.; 4]);

    assert_eq!(pivot, None);
    assert_close(&y, &[0.5, 1. / 6., 5. / 24., 19. / 120.], 1e-14);
    assert_close(&y, &[0.5, 0.1667, 0.2083, 0.1583], 1e-4);
}

#[test]
fn test_one_based_matches_zero_based() {
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let A0 = lower_4x4();
    let A1 = A0.to_base(IndexBase::One);
    let x = [1., -2., 3., 0.5];

    let (y0, _) = solve_with(&handle, &A0, &MatDescr::default(), 1., &x);
    let descr1 = MatDescr::default().with_index_base(IndexBase::One);
    let (y1, _) = solve_with(&handle, &A1, &descr1, 1., &x);

    assert_eq!(y0, y1);
}

#[test]
fn test_upper_backward_substitution() {
    let handle = Handle::new(HandleSettings::default()).unwrap();

    // full matrix: the solve only touches the upper triangle
    let A = CsrMatrix::from_dense_rows(&[
        vec![2., 1., 0.],
        vec![7., 4., 2.],
        vec![9., 8., 1.],
    ]);
    let descr = MatDescr::default().with_fill_mode(FillMode::Upper);

    let (y, pivot) = solve_with(&handle, &A, &descr, 1., &[3., 6., 1.]);

    // y2 = 1, y1 = (6 - 2) / 4 = 1, y0 = (3 - 1) / 2 = 1
    assert_eq!(pivot, None);
    assert_close(&y, &[1., 1., 1.], 1e-15);
}

#[test]
fn test_unit_diagonal_ignores_stored_values() {
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let A = lower_4x4();
    let descr = MatDescr::default().with_diag_type(DiagType::Unit);

    let (y, pivot) = solve_with(&handle, &A, &descr, 1., &[1.; 4]);

    assert_eq!(pivot, None);
    assert_close(&y, &[1., 0., 1., 0.], 1e-15);
}

#[test]
fn test_alpha_scaling_and_pointer_mode() {
    let mut handle = Handle::new(HandleSettings::default()).unwrap();
    let A = lower_4x4();
    let descr = MatDescr::default();
    let x = [1.; 4];

    let (y1, _) = solve_with(&handle, &A, &descr, 1., &x);
    let (y3, _) = solve_with(&handle, &A, &descr, 3., &x);
    let scaled: Vec<f64> = y1.iter().map(|v| 3. * v).collect();
    assert_close(&y3, &scaled, 1e-14);

    handle.set_pointer_mode(PointerMode::Device);
    assert_eq!(handle.pointer_mode(), PointerMode::Device);
    let (yd, _) = solve_with(&handle, &A, &descr, 3., &x);
    assert_eq!(yd, y3);
}

#[test]
fn test_repeated_solves_share_one_analysis() {
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let A = lower_4x4();
    let descr = MatDescr::default();
    let op = Operation::NonTranspose;
    let view = A.view(&descr);

    let bytes = csrsv_buffer_size(&handle, op, 4, 7, &descr).unwrap();
    let mut ws = Workspace::with_size(bytes).unwrap();
    let mut info = MatInfo::new();
    csrsv_analysis(&handle, op, &view, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();

    let analysis = info.analysis(AnalysisSlot::CsrsvLower).unwrap();
    assert_eq!(analysis.max_depth(), 4);
    assert_eq!(analysis.row_map(), &[0, 1, 2, 3]);

    for k in 0..3 {
        let x = vec![k as f64; 4];
        let mut y = vec![0.; 4];
        csrsv_solve(&handle, op, &1., &view, &info, &x, &mut y, SolvePolicy::Auto, &mut ws).unwrap();
        let mut Ay = vec![0.; 4];
        A.gemv(&mut Ay, &y);
        assert_close(&Ay, &x, 1e-14);
    }

    csrsv_clear(&handle, &descr, &mut info).unwrap();
    assert!(info.analysis(AnalysisSlot::CsrsvLower).is_none());
}

#[test]
fn test_single_precision() {
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let rows: Vec<Vec<f32>> = vec![vec![2., 0.], vec![1., 4.]];
    let A = CsrMatrix::from_dense_rows(&rows);
    let descr = MatDescr::default();
    let op = Operation::NonTranspose;
    let view = A.view(&descr);

    let mut ws = Workspace::with_size(csrsv_buffer_size(&handle, op, 2, 3, &descr).unwrap()).unwrap();
    let mut info = MatInfo::new();
    csrsv_analysis(&handle, op, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();

    let mut y = [0f32; 2];
    csrsv_solve(&handle, op, &1f32, &view, &info, &[2., 5.], &mut y, SolvePolicy::Auto, &mut ws).unwrap();
    assert_eq!(y, [1., 1.]);
}
