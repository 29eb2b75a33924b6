use super::factor::{factorize, Pattern};
use crate::algebra::*;
use crate::csrsv::*;
use crate::device::*;
use crate::timers::*;
use crate::SparseError;

/// Bytes of [`Workspace`] required by [`csrilu0_analysis`] and
/// [`csrilu0`].
pub fn csrilu0_buffer_size(
    handle: &Handle,
    m: SpInt,
    nnz: SpInt,
    descr: &MatDescr,
) -> Result<usize, SparseError> {
    handle.device()?;
    handle.log_trace(format_args!("csrilu0_buffer_size: m={}, nnz={}", m, nnz));

    check_matrix_type(descr)?;
    let (m, nnz) = check_sizes(m, nnz)?;
    Ok(workspace_size(m, nnz))
}

/// Dependency analysis of the lower triangle of `A` for [`csrilu0`].
///
/// The descriptor's fill mode and diagonal type are not used: the
/// factorization always depends on the lower triangle and always uses
/// the stored diagonal.   The analysis is stored in the
/// [`AnalysisSlot::Csrilu0`] slot of `info`, where a later lower
/// triangular [`csrsv_analysis`] can share it.
pub fn csrilu0_analysis<T: FloatT>(
    handle: &Handle,
    A: &CsrMatrixView<T>,
    info: &mut MatInfo,
    analysis: AnalysisPolicy,
    solve: SolvePolicy,
    ws: &mut Workspace,
) -> Result<(), SparseError> {
    handle.device()?;
    handle.log_trace(format_args!(
        "csrilu0_analysis: m={}, nnz={}, base={:?}, analysis={}, solve={}",
        A.m, A.nnz, A.descr.index_base, analysis, solve
    ));

    A.check_type()?;
    let (m, nnz) = A.check_shape()?;
    check_workspace(ws, m, nnz)?;

    if m == 0 || nnz == 0 {
        return Ok(());
    }

    let mut timers = Timers::default();
    let built;
    timeit! {timers => "csrilu0_analysis"; {
        built = info.get_or_build(AnalysisSlot::Csrilu0, analysis, &[], (m, nnz), || {
            analyze(handle, A, FillMode::Lower, ws, &mut timers)
        })?;
    }}
    print_analysis_summary(handle, "csrilu0_analysis", &built, &timers);

    Ok(())
}

/// Incomplete LU factorization with zero fill, in place on `csr_val`.
///
/// Requires a prior [`csrilu0_analysis`] and column indices sorted
/// within each row.   On return the strict lower triangle holds the
/// unit lower factor and the upper triangle, diagonal included, holds
/// the upper factor.   Returns the lowest zero pivot, if any.
#[allow(clippy::too_many_arguments)]
pub fn csrilu0<T: FloatT>(
    handle: &Handle,
    m: SpInt,
    nnz: SpInt,
    descr: &MatDescr,
    csr_val: &mut [T],
    csr_row_ptr: &[SpInt],
    csr_col_ind: &[SpInt],
    info: &MatInfo,
    policy: SolvePolicy,
    ws: &mut Workspace,
) -> Result<Option<usize>, SparseError> {
    handle.device()?;
    handle.log_trace(format_args!(
        "csrilu0: m={}, nnz={}, base={:?}, solve={}",
        m, nnz, descr.index_base, policy
    ));

    let (m, nnz) = {
        let A = CsrMatrixView::new(m, nnz, descr, &*csr_val, csr_row_ptr, csr_col_ind);
        A.check_type()?;
        A.check_shape()?
    };
    check_workspace(ws, m, nnz)?;

    if m == 0 || nnz == 0 {
        return Ok(None);
    }

    let analysis = info
        .analysis(AnalysisSlot::Csrilu0)
        .ok_or(SparseError::InvalidPointer("info"))?;
    if !analysis.is_compatible(FillMode::Lower, m, nnz) {
        return Err(SparseError::InvalidValue("info"));
    }

    let pattern = Pattern {
        row_ptr: csr_row_ptr,
        col_ind: csr_col_ind,
        base: descr.index_base.offset(),
    };

    let mut timers = Timers::default();
    timeit! {timers => "csrilu0"; {
        factorize(handle, analysis, &pattern, &mut csr_val[..nnz], ws)?;
    }}

    let zero_pivot = analysis.zero_pivot();
    handle.log_block(|out| {
        match zero_pivot {
            Some(row) => writeln!(out, "csrilu0: zero pivot at row {}", row)?,
            None => writeln!(out, "csrilu0: no zero pivot")?,
        }
        timers.print(out)
    });

    Ok(zero_pivot)
}

/// Zero pivot recorded by the last [`csrilu0`] call.
pub fn csrilu0_zero_pivot(handle: &Handle, info: &MatInfo) -> Result<Option<usize>, SparseError> {
    handle.device()?;
    handle.log_trace(format_args!("csrilu0_zero_pivot"));

    let analysis = info
        .analysis(AnalysisSlot::Csrilu0)
        .ok_or(SparseError::InvalidPointer("info"))?;
    Ok(analysis.zero_pivot())
}

/// Release the incomplete LU analysis.   A lower triangular solve
/// sharing it keeps its copy.
pub fn csrilu0_clear(handle: &Handle, info: &mut MatInfo) -> Result<(), SparseError> {
    handle.device()?;
    handle.log_trace(format_args!("csrilu0_clear"));

    info.release(AnalysisSlot::Csrilu0);
    Ok(())
}
