//! Device-wide inclusive prefix sum.
//!
//! The scan runs in three passes over fixed-size tiles: per-tile totals,
//! an exclusive scan of the tile totals, then a per-tile scan seeded with
//! the tile's offset.   Callers must query the scratch requirement with
//! [`inclusive_sum_buffer_size`] and never assume a fixed size.

use super::Handle;
use crate::SparseError;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI32, Ordering};

const SCAN_TILE: usize = 1024;
const SCAN_ALIGN: usize = 256;

fn num_tiles(n: usize) -> usize {
    (n + SCAN_TILE - 1) / SCAN_TILE
}

/// Bytes of scratch required by [`inclusive_sum`] over `n` elements.
pub fn inclusive_sum_buffer_size(n: usize) -> usize {
    let bytes = num_tiles(n) * std::mem::size_of::<i32>();
    ((bytes.max(1) - 1) / SCAN_ALIGN + 1) * SCAN_ALIGN
}

/// In place inclusive prefix sum of `data`, using `scratch` for tile totals.
pub(crate) fn inclusive_sum(
    handle: &Handle,
    data: &[AtomicI32],
    scratch: &[AtomicI32],
) -> Result<(), SparseError> {
    let tiles = num_tiles(data.len());
    if tiles == 0 {
        return Ok(());
    }
    if scratch.len() < tiles {
        return Err(SparseError::InvalidPointer("temp_buffer"));
    }
    let partials = &scratch[..tiles];
    let pool = handle.device()?;

    pool.install(|| {
        // 1. tile totals
        data.par_chunks(SCAN_TILE)
            .zip(partials.par_iter())
            .for_each(|(tile, total)| {
                let sum = tile.iter().map(|v| v.load(Ordering::Relaxed)).sum();
                total.store(sum, Ordering::Relaxed);
            });

        // 2. exclusive scan of the totals.  There are few enough
        // tiles that a single worker handles this pass.
        let mut acc = 0;
        for total in partials {
            let t = total.load(Ordering::Relaxed);
            total.store(acc, Ordering::Relaxed);
            acc += t;
        }

        // 3. scan within each tile, seeded by the tile offset
        data.par_chunks(SCAN_TILE)
            .zip(partials.par_iter())
            .for_each(|(tile, offset)| {
                let mut acc = offset.load(Ordering::Relaxed);
                for v in tile {
                    acc += v.load(Ordering::Relaxed);
                    v.store(acc, Ordering::Relaxed);
                }
            });
    });

    Ok(())
}

#[test]
fn test_inclusive_sum_buffer_size() {
    assert_eq!(inclusive_sum_buffer_size(0), 256);
    assert_eq!(inclusive_sum_buffer_size(1), 256);
    assert_eq!(inclusive_sum_buffer_size(64 * SCAN_TILE), 256);
    assert_eq!(inclusive_sum_buffer_size(64 * SCAN_TILE + 1), 512);
}

#[test]
fn test_inclusive_sum_multiple_tiles() {
    let handle = Handle::new(Default::default()).unwrap();
    let n = 3 * SCAN_TILE + 17;
    let data: Vec<AtomicI32> = (0..n).map(|i| AtomicI32::new((i % 3) as i32)).collect();
    let scratch: Vec<AtomicI32> = (0..num_tiles(n)).map(|_| AtomicI32::new(0)).collect();

    inclusive_sum(&handle, &data, &scratch).unwrap();

    let mut expected = 0;
    for (i, v) in data.iter().enumerate() {
        expected += (i % 3) as i32;
        assert_eq!(v.load(Ordering::Relaxed), expected);
    }
}
