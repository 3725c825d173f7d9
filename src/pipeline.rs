//! Per-object stream drivers.
//!
//! Objects are read from an [`ObjectSource`] one at a time, processed and
//! written to an [`ObjectSink`]. The first error stops the stream; objects
//! written before it stay written.

use std::collections::VecDeque;

use crate::error::Result;
use crate::geom::{Interpolation, MeshTransform, WarpOptions, apply_mesh_transform};
use crate::object::{GreyValue, Object, ObjectKind, TableKind, ValueTableType};
use crate::values::{ensure_value_table, grey_set_value, minimal_grey_type};

/// Supplier of objects. `Ok(None)` marks the end of the stream; a decode
/// failure is an `Err`.
pub trait ObjectSource {
    /// # Errors
    /// Whatever error the underlying reader reports.
    fn read_object(&mut self) -> Result<Option<Object>>;
}

/// Consumer of processed objects.
pub trait ObjectSink {
    /// # Errors
    /// Whatever error the underlying writer reports.
    fn write_object(&mut self, obj: &Object) -> Result<()>;
}

impl ObjectSource for VecDeque<Object> {
    fn read_object(&mut self) -> Result<Option<Object>> {
        Ok(self.pop_front())
    }
}

impl ObjectSink for Vec<Object> {
    fn write_object(&mut self, obj: &Object) -> Result<()> {
        self.try_reserve(1)?;
        self.push(obj.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grey set value
// ─────────────────────────────────────────────────────────────────────────────

/// Options for [`run_grey_set_value`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GreySetValueConfig {
    /// Value written to every sample.
    pub value: f64,
}

impl GreySetValueConfig {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self { value }
    }

    #[must_use]
    pub const fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

/// Give every 2D and 3D object a ragged table of the narrowest grey type that
/// holds `config.value` (background zero) and fill it with that value. Other
/// objects are passed through. Returns the number of objects written.
///
/// # Errors
/// The first error from the source, provisioning, filling or the sink.
pub fn run_grey_set_value(
    source: &mut impl ObjectSource,
    sink: &mut impl ObjectSink,
    config: &GreySetValueConfig,
) -> Result<usize> {
    let (grey, value) = minimal_grey_type(config.value);
    let table_type = ValueTableType::new(TableKind::Ragged, grey);
    let background = GreyValue::zero(grey);
    log::debug!("grey set value {value:?} using {table_type:?}");

    let mut count = 0;
    while let Some(mut obj) = source.read_object()? {
        match obj.kind() {
            ObjectKind::Domain2D | ObjectKind::Domain3D => {
                ensure_value_table(&mut obj, table_type, background)?;
                grey_set_value(&obj, value)?;
            }
            kind => log::warn!("object {count}: passing {kind:?} object through unchanged"),
        }
        sink.write_object(&obj)?;
        count += 1;
    }
    log::debug!("grey set value: wrote {count} objects");
    Ok(count)
}

// ─────────────────────────────────────────────────────────────────────────────
// Mesh transform
// ─────────────────────────────────────────────────────────────────────────────

/// Options for [`run_mesh_transform`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshTransformConfig {
    /// Invert the mesh before warping.
    pub inverse: bool,
    pub warp: WarpOptions,
}

impl MeshTransformConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    #[must_use]
    pub const fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.warp = self.warp.interpolation(interpolation);
        self
    }

    #[must_use]
    pub const fn warp(mut self, warp: WarpOptions) -> Self {
        self.warp = warp;
        self
    }
}

/// Warp every 2D object through `mesh`; other objects are passed through.
/// With `config.inverse` the mesh is inverted in place first. Returns the
/// number of objects written.
///
/// # Errors
/// `NullParam` if inversion is requested for a mesh without nodes, otherwise
/// the first error from the source, the warp or the sink.
pub fn run_mesh_transform(
    source: &mut impl ObjectSource,
    sink: &mut impl ObjectSink,
    mesh: &mut MeshTransform,
    config: &MeshTransformConfig,
) -> Result<usize> {
    if config.inverse {
        mesh.invert()?;
    }

    let mut count = 0;
    while let Some(obj) = source.read_object()? {
        if obj.kind() == ObjectKind::Domain2D {
            let warped = apply_mesh_transform(&obj, mesh, config.warp)?;
            sink.write_object(&warped)?;
        } else {
            log::warn!(
                "object {count}: passing {:?} object through unchanged",
                obj.kind()
            );
            sink.write_object(&obj)?;
        }
        count += 1;
    }
    log::debug!("mesh transform: wrote {count} objects");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::error::WlzError;
    use crate::object::{GreyType, IntervalDomain, Rect};

    /// Yields its objects, then a decode error.
    struct FailingSource(VecDeque<Object>);

    impl ObjectSource for FailingSource {
        fn read_object(&mut self) -> Result<Option<Object>> {
            match self.0.pop_front() {
                Some(obj) => Ok(Some(obj)),
                None => Err(WlzError::Codec("truncated object".to_owned())),
            }
        }
    }

    fn square_object() -> Object {
        Object::new_2d(
            Rc::new(IntervalDomain::from_rect(Rect::new(0, 1, 0, 1)).unwrap()),
            None,
        )
    }

    #[test]
    fn test_config_builders() {
        let config = GreySetValueConfig::default().value(3.5);
        assert!((config.value - 3.5).abs() < f64::EPSILON);

        let config = MeshTransformConfig::new()
            .inverse(true)
            .interpolation(Interpolation::Linear);
        assert!(config.inverse);
        assert_eq!(config.warp.interpolation, Interpolation::Linear);
    }

    #[test]
    fn test_grey_set_value_stream() {
        let mut source: VecDeque<Object> = VecDeque::from([square_object(), Object::Empty]);
        let mut sink: Vec<Object> = Vec::new();
        let count = run_grey_set_value(&mut source, &mut sink, &GreySetValueConfig::new(-4.0)).unwrap();
        assert_eq!(count, 2);

        let table = sink[0].table().unwrap().borrow();
        assert_eq!(table.grey_type(), GreyType::Short);
        assert_eq!(table.background(), GreyValue::Short(0));
        assert_eq!(table.get(1, 1), Some(GreyValue::Short(-4)));
        assert!(matches!(sink[1], Object::Empty));
    }

    #[test]
    fn test_read_error_halts_stream() {
        let mut source = FailingSource(VecDeque::from([square_object()]));
        let mut sink: Vec<Object> = Vec::new();
        let err = run_grey_set_value(&mut source, &mut sink, &GreySetValueConfig::new(1.0)).unwrap_err();
        assert!(matches!(err, WlzError::Codec(_)));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_inverse_of_null_mesh_fails() {
        let mut source: VecDeque<Object> = VecDeque::new();
        let mut sink: Vec<Object> = Vec::new();
        let mut mesh = MeshTransform::new();
        let config = MeshTransformConfig::new().inverse(true);
        assert_eq!(
            run_mesh_transform(&mut source, &mut sink, &mut mesh, &config),
            Err(WlzError::NullParam("mesh nodes"))
        );
    }
}
