use super::analysis::analyze;
use super::buffer_size::workspace_size;
use super::solve::{solve, ScalarArg};
use super::*;
use crate::algebra::*;
use crate::device::*;
use crate::timers::*;
use crate::SparseError;
use std::sync::Arc;

pub(crate) fn check_operation(trans: Operation) -> Result<(), SparseError> {
    match trans {
        Operation::NonTranspose => Ok(()),
        _ => Err(SparseError::NotImplemented("trans")),
    }
}

pub(crate) fn check_workspace(ws: &Workspace, m: usize, nnz: usize) -> Result<(), SparseError> {
    if ws.bytes() < workspace_size(m, nnz) {
        return Err(SparseError::InvalidPointer("temp_buffer"));
    }
    Ok(())
}

pub(crate) fn print_analysis_summary(
    handle: &Handle,
    routine: &str,
    analysis: &TriangularAnalysis,
    timers: &Timers,
) {
    handle.log_block(|out| {
        writeln!(out, "{} summary", routine)?;
        writeln!(out, "  fill mode       = {:?}", analysis.fill_mode())?;
        writeln!(out, "  rows            = {}", analysis.m())?;
        writeln!(out, "  max depth       = {}", analysis.max_depth())?;
        writeln!(out, "  total spin      = {}", analysis.total_spin())?;
        writeln!(out, "  max row nnz     = {}", analysis.max_row_nnz())?;
        match analysis.structural_zero_pivot() {
            Some(row) => writeln!(out, "  zero pivot      = {}", row)?,
            None => writeln!(out, "  zero pivot      = none")?,
        }
        writeln!(out, "  time            = {:?}", timers.total_time())?;
        timers.print(out)
    });
}

/// Bytes of [`Workspace`] required by [`csrsv_analysis`] and
/// [`csrsv_solve`] for an `m` row matrix with `nnz` stored entries.
///
/// Degenerate problems still report a small nonzero size.
pub fn csrsv_buffer_size(
    handle: &Handle,
    trans: Operation,
    m: SpInt,
    nnz: SpInt,
    descr: &MatDescr,
) -> Result<usize, SparseError> {
    handle.device()?;
    handle.log_trace(format_args!(
        "csrsv_buffer_size: trans={:?}, m={}, nnz={}",
        trans, m, nnz
    ));

    check_matrix_type(descr)?;
    check_operation(trans)?;
    let (m, nnz) = check_sizes(m, nnz)?;

    Ok(workspace_size(m, nnz))
}

/// Dependency analysis of the triangle selected by `A.descr.fill_mode`.
///
/// The result is stored in `info` and consumed by [`csrsv_solve`].
/// With [`AnalysisPolicy::Reuse`] an existing analysis of the same
/// triangle is kept, and a lower triangular analysis may be shared
/// with an existing incomplete LU analysis of the same matrix.
#[allow(clippy::too_many_arguments)]
pub fn csrsv_analysis<T: FloatT>(
    handle: &Handle,
    trans: Operation,
    A: &CsrMatrixView<T>,
    info: &mut MatInfo,
    analysis: AnalysisPolicy,
    solve: SolvePolicy,
    ws: &mut Workspace,
) -> Result<(), SparseError> {
    handle.device()?;
    handle.log_trace(format_args!(
        "csrsv_analysis: trans={:?}, m={}, nnz={}, fill={:?}, base={:?}, analysis={}, solve={}",
        trans, A.m, A.nnz, A.descr.fill_mode, A.descr.index_base, analysis, solve
    ));

    A.check_type()?;
    check_operation(trans)?;
    let (m, nnz) = A.check_shape()?;
    check_workspace(ws, m, nnz)?;

    if m == 0 || nnz == 0 {
        return Ok(());
    }

    let fill_mode = A.descr.fill_mode;
    let slot = AnalysisSlot::csrsv(fill_mode);
    let crossover: &[AnalysisSlot] = match fill_mode {
        FillMode::Lower => &[AnalysisSlot::Csrilu0],
        FillMode::Upper => &[],
    };

    let mut timers = Timers::default();
    let built;
    timeit! {timers => "csrsv_analysis"; {
        built = info.get_or_build(slot, analysis, crossover, (m, nnz), || {
            analyze(handle, A, fill_mode, ws, &mut timers)
        })?;
    }}

    if info.is_shared(slot) {
        handle.log_trace(format_args!("csrsv_analysis: sharing analysis of {:?}", slot));
    }
    print_analysis_summary(handle, "csrsv_analysis", &built, &timers);

    Ok(())
}

/// Solve `op(A) y = alpha x` using the analysis stored in `info`.
///
/// Returns the zero pivot of the solve, if any.   A zero pivot is the
/// row of a numerically zero diagonal entry, or of a missing one when
/// the diagonal is not unit.   Its row of `y` is left unscaled and the
/// other rows are still computed.
///
/// Matrices with no rows or no entries return immediately without
/// touching `y`.
#[allow(clippy::too_many_arguments)]
pub fn csrsv_solve<T: FloatT>(
    handle: &Handle,
    trans: Operation,
    alpha: &T,
    A: &CsrMatrixView<T>,
    info: &MatInfo,
    x: &[T],
    y: &mut [T],
    policy: SolvePolicy,
    ws: &mut Workspace,
) -> Result<Option<usize>, SparseError> {
    handle.device()?;
    match handle.pointer_mode() {
        PointerMode::Host => handle.log_trace(format_args!(
            "csrsv_solve: trans={:?}, m={}, nnz={}, alpha={}, fill={:?}, diag={:?}, solve={}",
            trans, A.m, A.nnz, alpha, A.descr.fill_mode, A.descr.diag_type, policy
        )),
        PointerMode::Device => handle.log_trace(format_args!(
            "csrsv_solve: trans={:?}, m={}, nnz={}, alpha=<device>, fill={:?}, diag={:?}, solve={}",
            trans, A.m, A.nnz, A.descr.fill_mode, A.descr.diag_type, policy
        )),
    }

    A.check_type()?;
    check_operation(trans)?;
    let (m, nnz) = A.check_shape()?;
    if x.len() < m {
        return Err(SparseError::InvalidPointer("x"));
    }
    if y.len() < m {
        return Err(SparseError::InvalidPointer("y"));
    }
    check_workspace(ws, m, nnz)?;

    if m == 0 || nnz == 0 {
        return Ok(None);
    }

    let fill_mode = A.descr.fill_mode;
    let analysis: &Arc<TriangularAnalysis> = info
        .analysis(AnalysisSlot::csrsv(fill_mode))
        .ok_or(SparseError::InvalidPointer("info"))?;
    if !analysis.is_compatible(fill_mode, m, nnz) {
        return Err(SparseError::InvalidValue("info"));
    }

    let alpha = ScalarArg::new(alpha, handle.pointer_mode());

    let mut timers = Timers::default();
    timeit! {timers => "csrsv_solve"; {
        solve(handle, analysis, A, alpha, x, y, ws)?;
    }}

    let zero_pivot = analysis.zero_pivot();
    handle.log_block(|out| {
        match zero_pivot {
            Some(row) => writeln!(out, "csrsv_solve: zero pivot at row {}", row)?,
            None => writeln!(out, "csrsv_solve: no zero pivot")?,
        }
        timers.print(out)
    });

    Ok(zero_pivot)
}

/// Zero pivot recorded by the last solve over the triangle selected by
/// `descr.fill_mode`.
pub fn csrsv_zero_pivot(
    handle: &Handle,
    descr: &MatDescr,
    info: &MatInfo,
) -> Result<Option<usize>, SparseError> {
    handle.device()?;
    handle.log_trace(format_args!(
        "csrsv_zero_pivot: fill={:?}",
        descr.fill_mode
    ));

    let analysis = info
        .analysis(AnalysisSlot::csrsv(descr.fill_mode))
        .ok_or(SparseError::InvalidPointer("info"))?;
    Ok(analysis.zero_pivot())
}

/// Release the analysis of the triangle selected by `descr.fill_mode`.
/// A shared analysis survives until its last holder releases it.
pub fn csrsv_clear(handle: &Handle, descr: &MatDescr, info: &mut MatInfo) -> Result<(), SparseError> {
    handle.device()?;
    handle.log_trace(format_args!("csrsv_clear: fill={:?}", descr.fill_mode));

    info.release(AnalysisSlot::csrsv(descr.fill_mode));
    Ok(())
}
