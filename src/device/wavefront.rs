/// Largest wavefront width supported by the kernels
pub(crate) const MAX_WAVEFRONT: usize = 64;

/// Per-lane accumulators of one wavefront.
///
/// Entries of a row are dealt round-robin to the lanes and combined
/// with a fixed reduction tree, so the result of a row never depends on
/// how the launch was scheduled.
pub(crate) struct Wavefront<T> {
    lanes: [T; MAX_WAVEFRONT],
    width: usize,
}

impl<T: Copy> Wavefront<T> {
    /// `width` must be a power of two no larger than [`MAX_WAVEFRONT`].
    #[inline]
    pub(crate) fn new(width: usize, init: T) -> Self {
        debug_assert!(width.is_power_of_two() && width <= MAX_WAVEFRONT);
        Self {
            lanes: [init; MAX_WAVEFRONT],
            width,
        }
    }

    /// Fold `value` into the lane owning the `k`-th entry of a row.
    #[inline]
    pub(crate) fn accumulate<F>(&mut self, k: usize, value: T, op: F)
    where
        F: Fn(T, T) -> T,
    {
        let lane = &mut self.lanes[k % self.width];
        *lane = op(*lane, value);
    }

    /// Tree reduction over the lanes
    #[inline]
    pub(crate) fn reduce<F>(mut self, op: F) -> T
    where
        F: Fn(T, T) -> T,
    {
        let mut width = self.width;
        while width > 1 {
            width /= 2;
            for i in 0..width {
                self.lanes[i] = op(self.lanes[i], self.lanes[i + width]);
            }
        }
        self.lanes[0]
    }
}

#[test]
fn test_wavefront_reduce() {
    for width in [32, 64] {
        let mut wf = Wavefront::new(width, 0i64);
        for k in 0..1000 {
            wf.accumulate(k, k as i64, |a, b| a + b);
        }
        assert_eq!(wf.reduce(|a, b| a + b), 999 * 1000 / 2);

        let mut wf = Wavefront::new(width, 0);
        for (k, v) in [3, 9, 4, 1].into_iter().enumerate() {
            wf.accumulate(k, v, i32::max);
        }
        assert_eq!(wf.reduce(i32::max), 9);
    }
}
