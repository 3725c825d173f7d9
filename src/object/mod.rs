//! The composite object model: domains, value tables and the objects that pair them.
//!
//! Domains and values are held through `Rc` handles. Cloning an [`Object`] shares
//! its domain and values ("assign"); dropping it releases the shares ("free"). The
//! underlying structures are released when the last share goes.

mod domain;
mod grey;
mod table;

use std::rc::Rc;

pub use domain::{Domain, Interval, IntervalDomain, PlaneDomain, Rect};
pub use grey::{GreyBuffer, GreyType, GreyValue, convert_pixel, rgba_channels, rgba_pack};
pub use table::{
    IntervalTable, RaggedTable, RectTable, TableHeader, TableKind, TableRef, ValueTable,
    ValueTableType, Values, VoxelRef, VoxelValues, table_ref, voxel_ref,
};

use crate::error::{Result, WlzError};
use crate::geom::Affine2;

/// Object-kind tag of an [`Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Domain2D,
    Domain3D,
    Transform,
    Empty,
}

/// Top-level image object.
///
/// The variant fields are public so that decoders can represent whatever they
/// read; the `new_*` constructors only build well-formed objects.
#[derive(Debug, Clone, Default)]
pub enum Object {
    #[default]
    Empty,
    Domain2D {
        domain: Option<Domain>,
        values: Option<Values>,
    },
    Domain3D {
        domain: Option<Domain>,
        values: Option<Values>,
    },
    /// A transformed view of `inner`; its effective values are the inner object's.
    Transform {
        transform: Affine2,
        inner: Option<Rc<Object>>,
    },
}

impl Object {
    /// A 2D object over an interval domain, optionally with a value table.
    #[must_use]
    pub fn new_2d(domain: Rc<IntervalDomain>, values: Option<TableRef>) -> Self {
        Self::Domain2D {
            domain: Some(Domain::Interval(domain)),
            values: values.map(Values::Table),
        }
    }

    /// A 3D object over a plane domain, optionally with voxel values.
    ///
    /// # Errors
    /// `InvalidParam` if the voxel stack's plane range differs from the domain's.
    pub fn new_3d(domain: Rc<PlaneDomain>, values: Option<VoxelRef>) -> Result<Self> {
        if let Some(voxel) = &values {
            let voxel = voxel.borrow();
            if voxel.plane1() != domain.plane1() || voxel.lastpl() != domain.lastpl() {
                return Err(WlzError::InvalidParam("voxel plane range differs from domain"));
            }
        }
        Ok(Self::Domain3D {
            domain: Some(Domain::Planes(domain)),
            values: values.map(Values::Voxel),
        })
    }

    #[must_use]
    pub fn new_transform(transform: Affine2, inner: Rc<Object>) -> Self {
        Self::Transform {
            transform,
            inner: Some(inner),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Empty => ObjectKind::Empty,
            Self::Domain2D { .. } => ObjectKind::Domain2D,
            Self::Domain3D { .. } => ObjectKind::Domain3D,
            Self::Transform { .. } => ObjectKind::Transform,
        }
    }

    #[must_use]
    pub const fn domain(&self) -> Option<&Domain> {
        match self {
            Self::Domain2D { domain, .. } | Self::Domain3D { domain, .. } => domain.as_ref(),
            Self::Empty | Self::Transform { .. } => None,
        }
    }

    #[must_use]
    pub const fn values(&self) -> Option<&Values> {
        match self {
            Self::Domain2D { values, .. } | Self::Domain3D { values, .. } => values.as_ref(),
            Self::Empty | Self::Transform { .. } => None,
        }
    }

    /// The value table of a 2D object, if it has one.
    #[must_use]
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Self::Domain2D { values, .. } => values.as_ref().and_then(Values::as_table),
            _ => None,
        }
    }

    /// Transient 2D view of one plane. It shares the plane's handles and releases
    /// only its own shares when dropped.
    pub(crate) fn plane_view(domain: &Domain, table: Option<&TableRef>) -> Self {
        Self::Domain2D {
            domain: Some(domain.clone()),
            values: table.map(|t| Values::Table(Rc::clone(t))),
        }
    }
}
