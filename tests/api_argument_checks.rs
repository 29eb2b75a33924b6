#![allow(non_snake_case)]

use csrtri::{algebra::*, csrsv::*, device::*, SparseError};

const OP: Operation = Operation::NonTranspose;

fn test_matrix() -> CsrMatrix<f64> {
    CsrMatrix::from_dense_rows(&[vec![2., 0., 0.], vec![1., 3., 0.], vec![0., 1., 4.]])
}

fn test_handle() -> Handle {
    Handle::new(HandleSettings::default()).unwrap()
}

fn big_workspace() -> Workspace {
    Workspace::with_size(1 << 16).unwrap()
}

#[test]
fn test_buffer_size_checks() {
    let handle = test_handle();
    let descr = MatDescr::default();

    assert_eq!(
        csrsv_buffer_size(&handle, OP, -1, 3, &descr),
        Err(SparseError::InvalidSize("m"))
    );
    assert_eq!(
        csrsv_buffer_size(&handle, OP, 3, -1, &descr),
        Err(SparseError::InvalidSize("nnz"))
    );
    assert_eq!(
        csrsv_buffer_size(&handle, Operation::Transpose, 3, 5, &descr),
        Err(SparseError::NotImplemented("trans"))
    );
    assert_eq!(
        csrsv_buffer_size(&handle, OP, 3, 5, &descr.with_matrix_type(MatrixType::Symmetric)),
        Err(SparseError::NotImplemented("matrix_type"))
    );

    // degenerate sizes still need a few bytes
    assert_eq!(csrsv_buffer_size(&handle, OP, 0, 0, &descr), Ok(4));
    assert_eq!(csrsv_buffer_size(&handle, OP, 7, 0, &descr), Ok(4));

    let small = csrsv_buffer_size(&handle, OP, 10, 30, &descr).unwrap();
    let large = csrsv_buffer_size(&handle, OP, 10_000, 30_000, &descr).unwrap();
    assert!(small > 4);
    assert!(large > small);
    assert_eq!(small % 256, 0);
}

#[test]
fn test_analysis_checks() {
    let handle = test_handle();
    let descr = MatDescr::default();
    let A = test_matrix();
    let mut info = MatInfo::new();

    // workspace too short
    let mut ws = Workspace::with_size(4).unwrap();
    assert_eq!(
        csrsv_analysis(&handle, OP, &A.view(&descr), &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidPointer("temp_buffer"))
    );

    let mut ws = big_workspace();
    assert_eq!(
        csrsv_analysis(&handle, Operation::ConjugateTranspose, &A.view(&descr), &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws),
        Err(SparseError::NotImplemented("trans"))
    );

    // a negative size never reaches the arrays
    let view = CsrMatrixView::new(-3, 5, &descr, &A.nzval, &A.rowptr, &A.colval);
    assert_eq!(
        csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidSize("m"))
    );

    // row offsets shorter than m + 1
    let view = CsrMatrixView::new(3, 5, &descr, &A.nzval, &A.rowptr[..3], &A.colval);
    assert_eq!(
        csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidPointer("csr_row_ptr"))
    );

    // nothing stored after failed calls
    assert!(info.analysis(AnalysisSlot::CsrsvLower).is_none());
}

#[test]
fn test_solve_checks() {
    let handle = test_handle();
    let descr = MatDescr::default();
    let A = test_matrix();
    let view = A.view(&descr);
    let mut ws = big_workspace();
    let mut info = MatInfo::new();
    let x = [1.; 3];
    let mut y = [0.; 3];

    // solve before analysis
    assert_eq!(
        csrsv_solve(&handle, OP, &1., &view, &info, &x, &mut y, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidPointer("info"))
    );
    assert_eq!(
        csrsv_zero_pivot(&handle, &descr, &info),
        Err(SparseError::InvalidPointer("info"))
    );

    csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();

    assert_eq!(
        csrsv_solve(&handle, OP, &1., &view, &info, &x[..2], &mut y, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidPointer("x"))
    );
    assert_eq!(
        csrsv_solve(&handle, OP, &1., &view, &info, &x, &mut y[..1], SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidPointer("y"))
    );
    assert_eq!(
        csrsv_solve(&handle, Operation::Transpose, &1., &view, &info, &x, &mut y, SolvePolicy::Auto, &mut ws),
        Err(SparseError::NotImplemented("trans"))
    );

    // the upper triangle has not been analysed
    let upper = descr.with_fill_mode(FillMode::Upper);
    assert_eq!(
        csrsv_solve(&handle, OP, &1., &A.view(&upper), &info, &x, &mut y, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidPointer("info"))
    );

    // an analysis of a different pattern is rejected
    let B = CsrMatrix::<f64>::identity(3);
    assert_eq!(
        csrsv_solve(&handle, OP, &1., &B.view(&descr), &info, &x, &mut y, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidValue("info"))
    );

    assert_eq!(y, [0.; 3]);
}

#[test]
fn test_degenerate_sizes() {
    let handle = test_handle();
    let descr = MatDescr::default();
    let mut ws = Workspace::with_size(csrsv_buffer_size(&handle, OP, 0, 0, &descr).unwrap()).unwrap();
    let mut info = MatInfo::new();

    // no rows
    let view = CsrMatrixView::<f64>::new(0, 0, &descr, &[], &[0], &[]);
    csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
    let mut y: [f64; 0] = [];
    assert_eq!(
        csrsv_solve(&handle, OP, &1., &view, &info, &[], &mut y, SolvePolicy::Auto, &mut ws),
        Ok(None)
    );

    // rows but no entries leave y untouched
    let view = CsrMatrixView::<f64>::new(3, 0, &descr, &[], &[0, 0, 0, 0], &[]);
    csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Force, SolvePolicy::Auto, &mut ws).unwrap();
    let mut y = [7.; 3];
    assert_eq!(
        csrsv_solve(&handle, OP, &1., &view, &info, &[1.; 3], &mut y, SolvePolicy::Auto, &mut ws),
        Ok(None)
    );
    assert_eq!(y, [7.; 3]);
    assert!(info.analysis(AnalysisSlot::CsrsvLower).is_none());
}

#[test]
fn test_handle_checks() {
    let descr = MatDescr::default();
    let A = test_matrix();
    let view = A.view(&descr);
    let mut ws = big_workspace();
    let mut info = MatInfo::new();

    // widths other than 32 and 64 are rejected at launch
    let settings = HandleSettingsBuilder::default()
        .wavefront_size(16)
        .build()
        .unwrap();
    let handle = Handle::new(settings).unwrap();
    assert_eq!(
        csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws),
        Err(SparseError::ArchMismatch(16))
    );

    // 32 wide wavefronts give the same answer as 64 wide ones
    let settings = HandleSettingsBuilder::default()
        .wavefront_size(32)
        .build()
        .unwrap();
    let handle = Handle::new(settings).unwrap();
    csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();
    let mut y = [0.; 3];
    csrsv_solve(&handle, OP, &1., &view, &info, &[2., 4., 5.], &mut y, SolvePolicy::Auto, &mut ws).unwrap();
    assert_eq!(y, [1., 1., 1.]);

    let mut handle = test_handle();
    handle.destroy();
    assert!(!handle.is_active());
    assert_eq!(
        csrsv_buffer_size(&handle, OP, 3, 5, &descr),
        Err(SparseError::InvalidHandle)
    );
    assert_eq!(
        csrsv_analysis(&handle, OP, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws),
        Err(SparseError::InvalidHandle)
    );
    assert_eq!(
        csrsv_clear(&handle, &descr, &mut info),
        Err(SparseError::InvalidHandle)
    );
}
