#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Sparse image objects: interval-coded 2D domains, plane stacks and the grey
//! value tables attached to them.
//!
//! Objects share their domains and value tables through reference-counted
//! handles. The [`values`] operations propagate background values, provision
//! value tables and fill samples; [`geom`] warps 2D objects through
//! displacement meshes; [`pipeline`] runs those operations over a stream of
//! objects.
//!
//! The crate logs through the [`log`] facade and installs no logger itself.

pub mod alloc;
pub mod error;
pub mod geom;
pub mod object;
pub mod pipeline;
pub mod values;

pub use alloc::ExtVector;
pub use error::{Result, WlzError};
pub use geom::{Interpolation, MeshTransform, WarpOptions, apply_mesh_transform};
pub use object::{
    Domain, GreyType, GreyValue, IntervalDomain, Object, ObjectKind, PlaneDomain, ValueTable,
    ValueTableType, Values, VoxelValues,
};
pub use pipeline::{
    GreySetValueConfig, MeshTransformConfig, ObjectSink, ObjectSource, run_grey_set_value,
    run_mesh_transform,
};
pub use values::{
    MAX_OBJECT_DEPTH, ensure_value_table, get_background, grey_set_value, minimal_grey_type,
    set_background,
};
