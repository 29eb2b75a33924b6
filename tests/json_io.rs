#![allow(non_snake_case)]

#[cfg(feature = "serde")]
#[test]
fn test_json_io() {
    use csrtri::{algebra::*, csrsv::*, device::*};
    use std::io::{Seek, SeekFrom};
    use std::sync::Arc;

    let A = CsrMatrix::from_dense_rows(&[
        vec![4., 1., 0., 0.],
        vec![1., 4., 1., 0.],
        vec![0., 1., 4., 1.],
        vec![0., 0., 1., 4.],
    ]);
    let descr = MatDescr::default().with_fill_mode(FillMode::Upper);
    let op = Operation::NonTranspose;
    let view = A.view(&descr);

    let handle = Handle::new(HandleSettings::default()).unwrap();
    let bytes = csrsv_buffer_size(&handle, op, 4, 10, &descr).unwrap();
    let mut ws = Workspace::with_size(bytes).unwrap();
    let mut info = MatInfo::new();
    csrsv_analysis(&handle, op, &view, &mut info, AnalysisPolicy::Reuse, SolvePolicy::Auto, &mut ws).unwrap();

    let x = [1., 2., 3., 4.];
    let mut y = [0.; 4];
    csrsv_solve(&handle, op, &1., &view, &info, &x, &mut y, SolvePolicy::Auto, &mut ws).unwrap();

    // write the analysis to a file
    let mut file = tempfile::tempfile().unwrap();
    let analysis = info.analysis(AnalysisSlot::CsrsvUpper).unwrap();
    analysis.save_to_file(&mut file).unwrap();

    // read it back into a fresh info and solve again
    file.seek(SeekFrom::Start(0)).unwrap();
    let loaded = TriangularAnalysis::load_from_file(&mut file).unwrap();
    assert_eq!(loaded.row_map(), analysis.row_map());
    assert_eq!(loaded.fill_mode(), FillMode::Upper);

    let loaded = Arc::new(loaded);
    let mut info2 = MatInfo::new();
    assert!(info2.insert(AnalysisSlot::CsrsvLower, Arc::clone(&loaded)).is_err());
    info2.insert(AnalysisSlot::CsrsvUpper, loaded).unwrap();

    let mut y2 = [0.; 4];
    csrsv_solve(&handle, op, &1., &view, &info2, &x, &mut y2, SolvePolicy::Auto, &mut ws).unwrap();
    assert_eq!(y, y2);
}
