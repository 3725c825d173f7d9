//! Setting every stored sample of an object to one value.

use crate::error::{Result, WlzError};
use crate::object::{GreyValue, Object, Values};

use super::{check_depth, for_each_plane_view};

/// Set every stored sample of `obj` to `value`, converted to each table's grey
/// type. Backgrounds are left alone.
///
/// Objects without values are left unchanged; transform wrappers fill their
/// inner object; 3D objects fill every plane that has both a domain and a table.
///
/// # Errors
/// `InvalidGreyType` for a bit value, `DomainNull`, `PlaneDomainTypeMismatch`
/// or `ValueTableTypeMismatch` for a malformed object, `ValuesNull` for a
/// wrapper without an inner object, `NestingTooDeep` past the nesting limit.
pub fn grey_set_value(obj: &Object, value: GreyValue) -> Result<()> {
    fill_at_depth(obj, value, 0)
}

fn fill_at_depth(obj: &Object, value: GreyValue, depth: usize) -> Result<()> {
    check_depth(depth)?;
    match obj {
        Object::Empty => Ok(()),
        Object::Transform { inner, .. } => {
            let inner = inner.as_deref().ok_or(WlzError::ValuesNull)?;
            fill_at_depth(inner, value, depth + 1)
        }
        Object::Domain2D { domain, values } => {
            domain.as_ref().ok_or(WlzError::DomainNull)?;
            match values {
                None => Ok(()),
                Some(Values::Table(table)) => table.borrow_mut().fill(value),
                Some(Values::Voxel(_)) => Err(WlzError::ValueTableTypeMismatch),
            }
        }
        Object::Domain3D { domain, values } => {
            let planes = domain
                .as_ref()
                .ok_or(WlzError::DomainNull)?
                .as_planes()
                .ok_or(WlzError::PlaneDomainTypeMismatch)?;
            let voxel = match values {
                None => return Ok(()),
                Some(Values::Voxel(voxel)) => voxel,
                Some(Values::Table(_)) => return Err(WlzError::ValueTableTypeMismatch),
            };
            if !value.grey_type().is_storable() {
                return Err(WlzError::InvalidGreyType(value.grey_type().name()));
            }
            for_each_plane_view(planes, voxel, |view| fill_at_depth(view, value, depth + 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::geom::Affine2;
    use crate::object::{
        Domain, GreyType, IntervalDomain, PlaneDomain, Rect, TableKind, ValueTable,
        ValueTableType, VoxelValues, table_ref, voxel_ref,
    };

    fn square() -> Rc<IntervalDomain> {
        Rc::new(IntervalDomain::from_rect(Rect::new(1, 2, 1, 2)).unwrap())
    }

    fn table(kind: TableKind, grey: GreyType) -> ValueTable {
        ValueTable::new(ValueTableType::new(kind, grey), GreyValue::Int(0), &square()).unwrap()
    }

    #[test]
    fn test_fill_2d_keeps_background() {
        let obj = Object::new_2d(square(), Some(table_ref(table(TableKind::Interval, GreyType::Float))));
        grey_set_value(&obj, GreyValue::Int(7)).unwrap();
        let t = obj.table().unwrap().borrow();
        assert_eq!(t.get(1, 1), Some(GreyValue::Float(7.0)));
        assert_eq!(t.get(2, 2), Some(GreyValue::Float(7.0)));
        assert_eq!(t.background(), GreyValue::Float(0.0));
    }

    #[test]
    fn test_fill_through_transform() {
        let inner = Rc::new(Object::new_2d(
            square(),
            Some(table_ref(table(TableKind::Rectangular, GreyType::UByte))),
        ));
        let wrapped = Object::new_transform(Affine2::scale(2.0, 2.0), Rc::clone(&inner));
        grey_set_value(&wrapped, GreyValue::Double(300.0)).unwrap();
        assert_eq!(inner.table().unwrap().borrow().get(1, 2), Some(GreyValue::UByte(255)));
    }

    #[test]
    fn test_fill_3d_planes() {
        let planes = Rc::new(
            PlaneDomain::from_planes(0, vec![Some(Domain::Interval(square())), None]).unwrap(),
        );
        let filled = table_ref(table(TableKind::Ragged, GreyType::Short));
        let orphan = table_ref(table(TableKind::Ragged, GreyType::Short));
        let mut voxel = VoxelValues::new(0, 1, GreyValue::Short(0)).unwrap();
        voxel.set_plane(0, Some(Rc::clone(&filled))).unwrap();
        voxel.set_plane(1, Some(Rc::clone(&orphan))).unwrap();
        let obj = Object::new_3d(planes, Some(voxel_ref(voxel))).unwrap();

        grey_set_value(&obj, GreyValue::Int(-9)).unwrap();
        assert_eq!(filled.borrow().get(2, 1), Some(GreyValue::Short(-9)));
        assert_eq!(orphan.borrow().get(2, 1), Some(GreyValue::Short(0)));
        assert_eq!(Rc::strong_count(&filled), 2);
    }

    #[test]
    fn test_fill_errors() {
        let obj = Object::new_2d(square(), Some(table_ref(table(TableKind::Ragged, GreyType::Int))));
        assert_eq!(
            grey_set_value(&obj, GreyValue::Bit(1)),
            Err(WlzError::InvalidGreyType("bit"))
        );
        assert_eq!(grey_set_value(&Object::Empty, GreyValue::Int(1)), Ok(()));
        assert_eq!(grey_set_value(&Object::new_2d(square(), None), GreyValue::Int(1)), Ok(()));
    }
}
