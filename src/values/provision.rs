//! Choosing a value-table encoding and attaching it to objects.

use std::rc::Rc;

use crate::error::{Result, WlzError};
use crate::object::{
    Domain, GreyType, GreyValue, Object, Values, ValueTable, ValueTableType, VoxelValues,
    table_ref, voxel_ref,
};

/// Narrowest grey type that holds `value` exactly, with `value` in that type.
///
/// Integers within `i32` range map to the first of ubyte, short or int that can
/// hold them; anything else is double.
#[must_use]
pub fn minimal_grey_type(value: f64) -> (GreyType, GreyValue) {
    let rounded = value.round();
    let is_integer = (value - rounded).abs() < f64::EPSILON
        && rounded >= f64::from(i32::MIN)
        && rounded <= f64::from(i32::MAX);
    if !is_integer {
        return (GreyType::Double, GreyValue::Double(value));
    }
    #[allow(clippy::cast_possible_truncation)]
    let int = rounded as i32;
    if let Ok(v) = u8::try_from(int) {
        (GreyType::UByte, GreyValue::UByte(v))
    } else if let Ok(v) = i16::try_from(int) {
        (GreyType::Short, GreyValue::Short(v))
    } else {
        (GreyType::Int, GreyValue::Int(int))
    }
}

/// Make sure `obj` carries value tables of `table_type`.
///
/// A 2D object without a table, or with a table of another type, gets a new
/// table over its whole domain. A 3D object gets a voxel stack if it has none,
/// then every plane with a non-empty domain gets a new table where its own is
/// missing or of another type. Planes without a domain get no table. New
/// tables start out filled with `background`.
///
/// Planes are provisioned in order; if one fails, the planes before it keep
/// their new tables.
///
/// # Errors
/// `UnsupportedObjectKind` for empty and transform objects, `DomainNull`,
/// `DomainTypeMismatch`/`PlaneDomainTypeMismatch` for the wrong domain variant,
/// `ValueTableTypeMismatch` for the wrong values variant, `InvalidGreyType`
/// for a bit table type, `AllocationError` on allocation failure.
pub fn ensure_value_table(
    obj: &mut Object,
    table_type: ValueTableType,
    background: GreyValue,
) -> Result<()> {
    let kind = obj.kind();
    match obj {
        Object::Empty | Object::Transform { .. } => Err(WlzError::UnsupportedObjectKind(kind)),
        Object::Domain2D { domain, values } => {
            let domain = domain.as_ref().ok_or(WlzError::DomainNull)?;
            let current = match values {
                None => None,
                Some(Values::Table(table)) => Some(table.borrow().table_type()),
                Some(Values::Voxel(_)) => return Err(WlzError::ValueTableTypeMismatch),
            };
            if current == Some(table_type) {
                return Ok(());
            }
            let table = new_table(&Object::plane_view(domain, None), table_type, background)?;
            *values = Some(Values::Table(table_ref(table)));
            log::debug!("attached {table_type:?} table to 2D object (was {current:?})");
            Ok(())
        }
        Object::Domain3D { domain, values } => {
            let planes = domain
                .as_ref()
                .ok_or(WlzError::DomainNull)?
                .as_planes()
                .ok_or(WlzError::PlaneDomainTypeMismatch)?;
            let voxel = match values {
                Some(Values::Voxel(voxel)) => Rc::clone(voxel),
                Some(Values::Table(_)) => return Err(WlzError::ValueTableTypeMismatch),
                None => {
                    let stack = voxel_ref(VoxelValues::new(
                        planes.plane1(),
                        planes.lastpl(),
                        background.convert(table_type.grey)?,
                    )?);
                    *values = Some(Values::Voxel(Rc::clone(&stack)));
                    log::debug!(
                        "attached voxel stack over planes {}..={}",
                        planes.plane1(),
                        planes.lastpl()
                    );
                    stack
                }
            };

            let mut replaced = 0;
            for index in 0..planes.plane_count() {
                let Some(plane) = planes.plane(index).filter(|d| !d.is_empty()) else {
                    continue;
                };
                let current = voxel
                    .borrow()
                    .plane(index)
                    .map(|table| table.borrow().table_type());
                if current == Some(table_type) {
                    continue;
                }
                let view = Object::plane_view(plane, None);
                let table = new_table(&view, table_type, background)?;
                voxel.borrow_mut().set_plane(index, Some(table_ref(table)))?;
                log::trace!("plane {index}: attached {table_type:?} table (was {current:?})");
                replaced += 1;
            }
            log::debug!("provisioned {replaced} plane tables of {table_type:?}");
            Ok(())
        }
    }
}

/// A fresh table over the domain of a 2D object.
fn new_table(view: &Object, table_type: ValueTableType, background: GreyValue) -> Result<ValueTable> {
    match view.domain() {
        Some(Domain::Interval(domain)) => ValueTable::new(table_type, background, domain),
        Some(_) => Err(WlzError::DomainTypeMismatch),
        None => Err(WlzError::DomainNull),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{IntervalDomain, PlaneDomain, Rect, TableKind};

    fn square() -> Rc<IntervalDomain> {
        Rc::new(IntervalDomain::from_rect(Rect::new(0, 3, 0, 3)).unwrap())
    }

    fn ragged(grey: GreyType) -> ValueTableType {
        ValueTableType::new(TableKind::Ragged, grey)
    }

    #[test]
    fn test_minimal_grey_type() {
        assert_eq!(minimal_grey_type(0.0), (GreyType::UByte, GreyValue::UByte(0)));
        assert_eq!(minimal_grey_type(255.0), (GreyType::UByte, GreyValue::UByte(255)));
        assert_eq!(minimal_grey_type(256.0), (GreyType::Short, GreyValue::Short(256)));
        assert_eq!(minimal_grey_type(-1.0), (GreyType::Short, GreyValue::Short(-1)));
        assert_eq!(minimal_grey_type(100_000.0), (GreyType::Int, GreyValue::Int(100_000)));
        assert_eq!(minimal_grey_type(128.5), (GreyType::Double, GreyValue::Double(128.5)));
        assert_eq!(minimal_grey_type(3e10).0, GreyType::Double);
        assert_eq!(minimal_grey_type(f64::NAN).0, GreyType::Double);
    }

    #[test]
    fn test_2d_attach_then_replace() {
        let mut obj = Object::new_2d(square(), None);
        ensure_value_table(&mut obj, ragged(GreyType::UByte), GreyValue::UByte(0)).unwrap();
        let first = Rc::clone(obj.table().unwrap());
        assert_eq!(first.borrow().table_type(), ragged(GreyType::UByte));
        assert_eq!(first.borrow().background(), GreyValue::UByte(0));

        // same type keeps the table
        ensure_value_table(&mut obj, ragged(GreyType::UByte), GreyValue::UByte(9)).unwrap();
        assert!(Rc::ptr_eq(&first, obj.table().unwrap()));

        ensure_value_table(&mut obj, ragged(GreyType::Short), GreyValue::Int(5)).unwrap();
        let second = obj.table().unwrap().borrow();
        assert_eq!(second.table_type(), ragged(GreyType::Short));
        assert_eq!(second.background(), GreyValue::Short(5));
        assert_eq!(second.get(2, 2), Some(GreyValue::Short(5)));
        drop(second);
        assert_eq!(Rc::strong_count(&first), 1);
    }

    #[test]
    fn test_2d_errors() {
        let mut empty = Object::Empty;
        assert_eq!(
            ensure_value_table(&mut empty, ragged(GreyType::Int), GreyValue::Int(0)),
            Err(WlzError::UnsupportedObjectKind(crate::object::ObjectKind::Empty))
        );

        let mut no_domain = Object::Domain2D {
            domain: None,
            values: None,
        };
        assert_eq!(
            ensure_value_table(&mut no_domain, ragged(GreyType::Int), GreyValue::Int(0)),
            Err(WlzError::DomainNull)
        );

        let mut planar = Object::Domain2D {
            domain: Some(Domain::from(PlaneDomain::new(0, 0).unwrap())),
            values: None,
        };
        assert_eq!(
            ensure_value_table(&mut planar, ragged(GreyType::Int), GreyValue::Int(0)),
            Err(WlzError::DomainTypeMismatch)
        );

        let mut obj = Object::new_2d(square(), None);
        assert_eq!(
            ensure_value_table(&mut obj, ragged(GreyType::Bit), GreyValue::Int(0)),
            Err(WlzError::InvalidGreyType("bit"))
        );
        assert!(obj.values().is_none());
    }

    #[test]
    fn test_3d_creates_stack_and_plane_tables() {
        let planes = Rc::new(
            PlaneDomain::from_planes(
                2,
                vec![
                    Some(Domain::Interval(square())),
                    None,
                    Some(Domain::Empty),
                    Some(Domain::Interval(square())),
                ],
            )
            .unwrap(),
        );
        let mut obj = Object::new_3d(planes, None).unwrap();
        ensure_value_table(&mut obj, ragged(GreyType::Short), GreyValue::Int(-2)).unwrap();

        let voxel = obj.values().and_then(Values::as_voxel).unwrap().borrow();
        assert_eq!(voxel.plane1(), 2);
        assert_eq!(voxel.lastpl(), 5);
        assert_eq!(voxel.background(), GreyValue::Short(-2));
        assert!(voxel.plane(0).is_some());
        assert!(voxel.plane(1).is_none());
        assert!(voxel.plane(2).is_none());
        let table = voxel.plane(3).unwrap().borrow();
        assert_eq!(table.table_type(), ragged(GreyType::Short));
        assert_eq!(table.get(0, 0), Some(GreyValue::Short(-2)));
    }

    #[test]
    fn test_3d_replaces_only_mismatched_planes() {
        let planes = Rc::new(
            PlaneDomain::from_planes(
                0,
                vec![Some(Domain::Interval(square())), Some(Domain::Interval(square()))],
            )
            .unwrap(),
        );
        let mut obj = Object::new_3d(planes, None).unwrap();
        ensure_value_table(&mut obj, ragged(GreyType::UByte), GreyValue::UByte(0)).unwrap();

        let voxel = Rc::clone(obj.values().and_then(Values::as_voxel).unwrap());
        let kept = Rc::clone(voxel.borrow().plane(1).unwrap());
        let stale = ValueTable::new(
            ValueTableType::new(TableKind::Rectangular, GreyType::UByte),
            GreyValue::UByte(0),
            &square(),
        )
        .unwrap();
        voxel.borrow_mut().set_plane(0, Some(table_ref(stale))).unwrap();

        ensure_value_table(&mut obj, ragged(GreyType::UByte), GreyValue::UByte(0)).unwrap();
        let voxel = voxel.borrow();
        assert_eq!(
            voxel.plane(0).unwrap().borrow().table_type(),
            ragged(GreyType::UByte)
        );
        assert!(Rc::ptr_eq(&kept, voxel.plane(1).unwrap()));
    }

    #[test]
    fn test_3d_errors() {
        let mut wrong_domain = Object::Domain3D {
            domain: Some(Domain::Interval(square())),
            values: None,
        };
        assert_eq!(
            ensure_value_table(&mut wrong_domain, ragged(GreyType::Int), GreyValue::Int(0)),
            Err(WlzError::PlaneDomainTypeMismatch)
        );

        let planes = Rc::new(PlaneDomain::new(0, 1).unwrap());
        let table = ValueTable::new(ragged(GreyType::Int), GreyValue::Int(0), &square()).unwrap();
        let mut wrong_values = Object::Domain3D {
            domain: Some(Domain::Planes(planes)),
            values: Some(Values::Table(table_ref(table))),
        };
        assert_eq!(
            ensure_value_table(&mut wrong_values, ragged(GreyType::Int), GreyValue::Int(0)),
            Err(WlzError::ValueTableTypeMismatch)
        );
    }

    #[test]
    fn test_3d_partial_progress_is_kept() {
        let mut inner = PlaneDomain::new(0, 0).unwrap();
        inner.set_plane(0, Some(Domain::Interval(square()))).unwrap();
        let planes = Rc::new(
            PlaneDomain::from_planes(
                0,
                vec![
                    Some(Domain::Interval(square())),
                    Some(Domain::from(inner)),
                    Some(Domain::Interval(square())),
                ],
            )
            .unwrap(),
        );
        let mut obj = Object::new_3d(planes, None).unwrap();
        let err = ensure_value_table(&mut obj, ragged(GreyType::Int), GreyValue::Int(0));
        assert_eq!(err, Err(WlzError::DomainTypeMismatch));

        let voxel = obj.values().and_then(Values::as_voxel).unwrap().borrow();
        assert!(voxel.plane(0).is_some());
        assert!(voxel.plane(1).is_none());
        assert!(voxel.plane(2).is_none());
    }
}
