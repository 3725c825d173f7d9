//! Operations on the grey values of an object: background propagation,
//! value-table provisioning and grey fill.
//!
//! Wrapper delegation and per-plane recursion are bounded by
//! [`MAX_OBJECT_DEPTH`].

mod background;
mod fill;
mod provision;

pub use background::{get_background, set_background};
pub use fill::grey_set_value;
pub use provision::{ensure_value_table, minimal_grey_type};

use crate::error::{Result, WlzError};
use crate::object::{Object, PlaneDomain, VoxelRef};

/// Deepest wrapper/plane nesting the recursive operations will follow.
pub const MAX_OBJECT_DEPTH: usize = 64;

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_OBJECT_DEPTH {
        return Err(WlzError::NestingTooDeep {
            max: MAX_OBJECT_DEPTH,
        });
    }
    Ok(())
}

/// Call `f` with a transient 2D view of every plane that has both a domain and a
/// value table. Each view is dropped before the next plane is visited.
fn for_each_plane_view(
    planes: &PlaneDomain,
    voxel: &VoxelRef,
    mut f: impl FnMut(&Object) -> Result<()>,
) -> Result<()> {
    for index in 0..planes.plane_count() {
        let view = {
            let voxel = voxel.borrow();
            match (planes.plane(index), voxel.plane(index)) {
                (Some(domain), Some(table)) => Object::plane_view(domain, Some(table)),
                _ => continue,
            }
        };
        f(&view)?;
    }
    Ok(())
}
