//! Reading and writing the background value of an object.

use crate::error::{Result, WlzError};
use crate::object::{GreyValue, Object, Values};

use super::{check_depth, for_each_plane_view};

/// Background value of `obj`.
///
/// Empty objects and objects without values report integer zero. Transform
/// wrappers report their inner object's background; a 3D object reports the
/// stack-level background, not that of any plane.
///
/// # Errors
/// `DomainNull` if the object has no domain, `PlaneDomainTypeMismatch` or
/// `ValueTableTypeMismatch` for a malformed object, `ValuesNull` for a wrapper
/// without an inner object, `NestingTooDeep` past the nesting limit.
pub fn get_background(obj: &Object) -> Result<GreyValue> {
    get_at_depth(obj, 0)
}

fn get_at_depth(obj: &Object, depth: usize) -> Result<GreyValue> {
    check_depth(depth)?;
    match obj {
        Object::Empty => Ok(GreyValue::default()),
        Object::Transform { inner, .. } => {
            let inner = inner.as_deref().ok_or(WlzError::ValuesNull)?;
            get_at_depth(inner, depth + 1)
        }
        Object::Domain2D { domain, values } => {
            domain.as_ref().ok_or(WlzError::DomainNull)?;
            match values {
                None => Ok(GreyValue::default()),
                Some(Values::Table(table)) => Ok(table.borrow().background()),
                Some(Values::Voxel(_)) => Err(WlzError::ValueTableTypeMismatch),
            }
        }
        Object::Domain3D { domain, values } => {
            let domain = domain.as_ref().ok_or(WlzError::DomainNull)?;
            if domain.as_planes().is_none() {
                return Err(WlzError::PlaneDomainTypeMismatch);
            }
            match values {
                None => Ok(GreyValue::default()),
                Some(Values::Voxel(voxel)) => Ok(voxel.borrow().background()),
                Some(Values::Table(_)) => Err(WlzError::ValueTableTypeMismatch),
            }
        }
    }
}

/// Set the background value of `obj`, converted to the grey type of its values.
///
/// For a 3D object every plane with both a domain and a table is updated
/// through a transient single-plane view, then the stack-level background is
/// stored. Objects without values are left unchanged.
///
/// # Errors
/// `InvalidGreyType` for a bit value, otherwise as [`get_background`].
pub fn set_background(obj: &Object, value: GreyValue) -> Result<()> {
    set_at_depth(obj, value, 0)
}

fn set_at_depth(obj: &Object, value: GreyValue, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let (domain, values) = match obj {
        Object::Empty => return Ok(()),
        Object::Transform { inner, .. } => {
            let inner = inner.as_deref().ok_or(WlzError::ValuesNull)?;
            return set_at_depth(inner, value, depth + 1);
        }
        Object::Domain2D { domain, values } | Object::Domain3D { domain, values } => {
            (domain, values)
        }
    };
    let domain = domain.as_ref().ok_or(WlzError::DomainNull)?;
    let Some(values) = values else {
        return Ok(());
    };
    if !value.grey_type().is_storable() {
        return Err(WlzError::InvalidGreyType(value.grey_type().name()));
    }

    if let Object::Domain3D { .. } = obj {
        let planes = domain
            .as_planes()
            .ok_or(WlzError::PlaneDomainTypeMismatch)?;
        let voxel = values.as_voxel().ok_or(WlzError::ValueTableTypeMismatch)?;
        let converted = value.convert(voxel.borrow().grey_type())?;
        for_each_plane_view(planes, voxel, |view| {
            set_at_depth(view, converted, depth + 1)
        })?;
        voxel.borrow_mut().set_background(converted);
        log::trace!("set 3D background to {converted:?}");
        return Ok(());
    }
    let table = values.as_table().ok_or(WlzError::ValueTableTypeMismatch)?;
    table.borrow_mut().set_background(value)
}
