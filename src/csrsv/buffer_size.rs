use crate::device::{WorkspaceLayout, DEGENERATE_BYTES};

/// Bytes of workspace needed by analysis and solve over `m` rows and
/// `nnz` stored entries.
///
/// The result is never zero, so callers may always allocate and pass a
/// workspace regardless of problem size.
pub(crate) fn workspace_size(m: usize, nnz: usize) -> usize {
    if m == 0 || nnz == 0 {
        return DEGENERATE_BYTES;
    }
    WorkspaceLayout::new(m).total
}

#[test]
fn test_workspace_size() {
    assert_eq!(workspace_size(0, 10), 4);
    assert_eq!(workspace_size(10, 0), 4);

    // three slots, two padded row arrays, one scan slot
    assert_eq!(workspace_size(1, 1), 768 + 1024 + 1024 + 256);
    assert_eq!(workspace_size(256, 1000), workspace_size(1, 1));
    assert_eq!(workspace_size(257, 1000), 768 + 2048 + 2048 + 256);

    // the scan scratch grows with m
    let m = 300_000;
    let rows = 4 * 300_032;
    assert_eq!(workspace_size(m, m), 768 + 2 * rows + 1280);
}
