use super::AnalysisPolicy;
use crate::algebra::{FillMode, SpInt};
use crate::SparseError;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// sentinel for "no zero pivot"
const NO_PIVOT: i32 = i32::MAX;

fn no_pivot() -> AtomicI32 {
    AtomicI32::new(NO_PIVOT)
}

/// Dependency analysis of a triangular sparsity pattern.
///
/// Built once by an analysis routine and read-only afterwards, apart
/// from the zero pivot which every solve re-arms and updates.   The
/// analysis refers to positions in the `col_ind`/`values` arrays of the
/// matrix it was built from, and is only meaningful for that pattern.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangularAnalysis {
    pub(crate) fill_mode: FillMode,
    pub(crate) m: usize,
    pub(crate) nnz: usize,
    pub(crate) diag_index: Vec<Option<usize>>,
    pub(crate) rows_per_level: Vec<SpInt>,
    pub(crate) row_map: Vec<SpInt>,
    pub(crate) max_depth: usize,
    pub(crate) total_spin: u64,
    pub(crate) max_row_nnz: usize,
    pub(crate) structural_zero_pivot: Option<usize>,
    #[cfg_attr(feature = "serde", serde(skip, default = "no_pivot"))]
    zero_pivot: AtomicI32,
}

impl TriangularAnalysis {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        fill_mode: FillMode,
        m: usize,
        nnz: usize,
        diag_index: Vec<Option<usize>>,
        rows_per_level: Vec<SpInt>,
        row_map: Vec<SpInt>,
        total_spin: u64,
        max_row_nnz: usize,
        structural_zero_pivot: Option<usize>,
    ) -> Self {
        let max_depth = rows_per_level.len();
        let analysis = Self {
            fill_mode,
            m,
            nnz,
            diag_index,
            rows_per_level,
            row_map,
            max_depth,
            total_spin,
            max_row_nnz,
            structural_zero_pivot,
            zero_pivot: no_pivot(),
        };
        analysis.arm_zero_pivot(structural_zero_pivot);
        analysis
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Zero-based position of each row's diagonal entry, if stored
    pub fn diag_index(&self) -> &[Option<usize>] {
        &self.diag_index
    }

    /// Cumulative row counts per level.   Level `k` holds the rows
    /// `row_map[rows_per_level[k-1]..rows_per_level[k]]`.
    pub fn rows_per_level(&self) -> &[SpInt] {
        &self.rows_per_level
    }

    /// Zero-based rows ordered by dependency level, in increasing row
    /// order within each level.
    pub fn row_map(&self) -> &[SpInt] {
        &self.row_map
    }

    /// Number of dependency levels
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Dependency polls observed by the analysis kernel
    pub fn total_spin(&self) -> u64 {
        self.total_spin
    }

    /// Largest number of stored entries in any row
    pub fn max_row_nnz(&self) -> usize {
        self.max_row_nnz
    }

    /// Lowest row with no stored diagonal entry
    pub fn structural_zero_pivot(&self) -> Option<usize> {
        self.structural_zero_pivot
    }

    /// Zero pivot recorded by the most recent solve or factorization
    pub fn zero_pivot(&self) -> Option<usize> {
        match self.zero_pivot.load(Ordering::Acquire) {
            NO_PIVOT => None,
            row => Some(row as usize),
        }
    }

    /// Rows of dependency level `level`, or `None` past the deepest level
    pub fn level(&self, level: usize) -> Option<&[SpInt]> {
        let stop = *self.rows_per_level.get(level)? as usize;
        let start = match level {
            0 => 0,
            _ => self.rows_per_level[level - 1] as usize,
        };
        self.row_map.get(start..stop)
    }

    pub(crate) fn arm_zero_pivot(&self, row: Option<usize>) {
        let value = row.map_or(NO_PIVOT, |r| r as i32);
        self.zero_pivot.store(value, Ordering::Release);
    }

    /// Record `row` unless another zero pivot is already recorded.
    pub(crate) fn record_zero_pivot(&self, row: usize) {
        let _ = self.zero_pivot.compare_exchange(
            NO_PIVOT,
            row as i32,
            Ordering::AcqRel,
            Ordering::Relaxed,
        );
    }

    /// Record `row` if it is lower than the zero pivot already recorded.
    pub(crate) fn lower_zero_pivot(&self, row: usize) {
        self.zero_pivot.fetch_min(row as i32, Ordering::AcqRel);
    }

    /// True if `self` was built from a pattern of the same dimensions
    /// and can stand in for an analysis of `fill_mode`.
    pub(crate) fn is_compatible(&self, fill_mode: FillMode, m: usize, nnz: usize) -> bool {
        self.fill_mode == fill_mode && self.m == m && self.nnz == nnz
    }
}

/// Storage location of an analysis within a [`MatInfo`].
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum AnalysisSlot {
    /// Lower triangular solve
    CsrsvLower,
    /// Upper triangular solve
    CsrsvUpper,
    /// Incomplete LU factorization
    Csrilu0,
}

impl AnalysisSlot {
    /// Fill mode of every analysis stored in this slot
    pub fn fill_mode(&self) -> FillMode {
        match self {
            AnalysisSlot::CsrsvUpper => FillMode::Upper,
            AnalysisSlot::CsrsvLower | AnalysisSlot::Csrilu0 => FillMode::Lower,
        }
    }

    pub(crate) fn csrsv(fill_mode: FillMode) -> Self {
        match fill_mode {
            FillMode::Lower => AnalysisSlot::CsrsvLower,
            FillMode::Upper => AnalysisSlot::CsrsvUpper,
        }
    }
}

/// Analyses attached to one matrix.
///
/// Each slot holds a reference counted [`TriangularAnalysis`].   A slot
/// may share its analysis with another slot, in which case the analysis
/// is freed only once both slots have been released.
#[derive(Debug, Default)]
pub struct MatInfo {
    csrsv_lower: Option<Arc<TriangularAnalysis>>,
    csrsv_upper: Option<Arc<TriangularAnalysis>>,
    csrilu0: Option<Arc<TriangularAnalysis>>,
}

impl MatInfo {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, slot: AnalysisSlot) -> &Option<Arc<TriangularAnalysis>> {
        match slot {
            AnalysisSlot::CsrsvLower => &self.csrsv_lower,
            AnalysisSlot::CsrsvUpper => &self.csrsv_upper,
            AnalysisSlot::Csrilu0 => &self.csrilu0,
        }
    }

    fn slot_mut(&mut self, slot: AnalysisSlot) -> &mut Option<Arc<TriangularAnalysis>> {
        match slot {
            AnalysisSlot::CsrsvLower => &mut self.csrsv_lower,
            AnalysisSlot::CsrsvUpper => &mut self.csrsv_upper,
            AnalysisSlot::Csrilu0 => &mut self.csrilu0,
        }
    }

    /// The analysis stored in `slot`, if any
    pub fn analysis(&self, slot: AnalysisSlot) -> Option<&Arc<TriangularAnalysis>> {
        self.slot(slot).as_ref()
    }

    /// Store `analysis` in `slot`, replacing whatever was there.
    pub fn insert(
        &mut self,
        slot: AnalysisSlot,
        analysis: Arc<TriangularAnalysis>,
    ) -> Result<(), SparseError> {
        if analysis.fill_mode != slot.fill_mode() {
            return Err(SparseError::InvalidValue("fill_mode"));
        }
        *self.slot_mut(slot) = Some(analysis);
        Ok(())
    }

    /// Make `dst` share the analysis stored in `src`.
    pub fn alias(&mut self, src: AnalysisSlot, dst: AnalysisSlot) -> Result<(), SparseError> {
        let analysis = self
            .analysis(src)
            .cloned()
            .ok_or(SparseError::InvalidPointer("info"))?;
        self.insert(dst, analysis)
    }

    /// Drop this slot's hold on its analysis.   Returns true if a slot
    /// was occupied.
    pub fn release(&mut self, slot: AnalysisSlot) -> bool {
        self.slot_mut(slot).take().is_some()
    }

    /// True if the analysis in `slot` is also held elsewhere
    pub fn is_shared(&self, slot: AnalysisSlot) -> bool {
        self.analysis(slot)
            .map_or(false, |a| Arc::strong_count(a) > 1)
    }

    /// Return the analysis for `slot` according to `policy`, building it
    /// with `build` when nothing usable is stored.
    ///
    /// With [`AnalysisPolicy::Reuse`] an occupied slot is returned as is.
    /// An empty slot is filled by sharing the first compatible analysis
    /// found in `crossover` before resorting to `build`.
    pub(crate) fn get_or_build<F>(
        &mut self,
        slot: AnalysisSlot,
        policy: AnalysisPolicy,
        crossover: &[AnalysisSlot],
        (m, nnz): (usize, usize),
        build: F,
    ) -> Result<Arc<TriangularAnalysis>, SparseError>
    where
        F: FnOnce() -> Result<TriangularAnalysis, SparseError>,
    {
        if policy == AnalysisPolicy::Reuse {
            if let Some(existing) = self.analysis(slot) {
                return Ok(Arc::clone(existing));
            }
            let found = crossover
                .iter()
                .filter_map(|&s| self.analysis(s))
                .find(|a| a.is_compatible(slot.fill_mode(), m, nnz))
                .cloned();
            if let Some(shared) = found {
                *self.slot_mut(slot) = Some(Arc::clone(&shared));
                return Ok(shared);
            }
        }

        // an analysis from a failed build must not survive
        self.release(slot);
        let analysis = Arc::new(build()?);
        *self.slot_mut(slot) = Some(Arc::clone(&analysis));
        Ok(analysis)
    }
}
