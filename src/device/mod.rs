//! Host realisation of the accelerator: execution handle, kernel
//! launches, device memory and the synchronisation primitives shared by
//! the triangular kernels.

mod alloc;
mod handle;
mod scan;
mod settings;
mod shared;
mod sync;
mod wavefront;
mod workspace;

pub use handle::*;
pub use scan::inclusive_sum_buffer_size;
pub use settings::*;
pub use workspace::Workspace;

pub(crate) use alloc::*;
pub(crate) use scan::inclusive_sum;
pub(crate) use shared::*;
pub(crate) use sync::*;
pub(crate) use wavefront::*;
pub(crate) use workspace::{WorkspaceLayout, DEGENERATE_BYTES};
