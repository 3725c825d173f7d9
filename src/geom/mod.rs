//! 2D geometry: primitives, displacement meshes and mesh warping.

mod core;
mod mesh;
mod mesh_xml;
mod warp;

pub use core::{Affine2, BBox2, Tolerance, Vec2};
pub use mesh::{MeshElement, MeshNode, MeshTransform};
pub use mesh_xml::{mesh_from_xml, mesh_to_xml};
pub use warp::{
    Interpolation, WarpDiagnostics, WarpOptions, apply_mesh_transform,
    apply_mesh_transform_with_diagnostics,
};

#[cfg(test)]
mod tests;
