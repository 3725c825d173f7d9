//! Value tables: the grey-value encodings attached to 2D domains, and the
//! per-plane voxel stack attached to plane domains.

use std::cell::RefCell;
use std::rc::Rc;

use crate::alloc::ExtVector;
use crate::error::{Result, WlzError};

use super::domain::{IntervalDomain, Rect, span};
use super::grey::{GreyBuffer, GreyType, GreyValue};

const PLANE_BLOCK_SIZE: usize = 16;

/// Storage layout of a value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// One run of samples per line, from the line's first to last domain column.
    Ragged,
    /// A dense block over the bounding rectangle.
    Rectangular,
    /// One run of samples per domain interval.
    Interval,
}

/// Type tag of a value table: its layout together with its grey type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueTableType {
    pub kind: TableKind,
    pub grey: GreyType,
}

impl ValueTableType {
    #[must_use]
    pub const fn new(kind: TableKind, grey: GreyType) -> Self {
        Self { kind, grey }
    }
}

/// Fields every table variant carries.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    table_type: ValueTableType,
    background: GreyValue,
    bbox: Rect,
}

impl TableHeader {
    fn new(table_type: ValueTableType, background: GreyValue, bbox: Rect) -> Result<Self> {
        if !table_type.grey.is_storable() {
            return Err(WlzError::InvalidGreyType(table_type.grey.name()));
        }
        Ok(Self {
            table_type,
            background: background.convert(table_type.grey)?,
            bbox,
        })
    }

    fn filled_buffer(&self, len: usize) -> Result<GreyBuffer> {
        GreyBuffer::filled(self.background, len)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ValueRun {
    kol1: i32,
    values: GreyBuffer,
}

impl ValueRun {
    fn index_of(&self, kol: i32) -> Option<usize> {
        let offset = span(self.kol1, kol).checked_sub(1)?;
        (offset < self.values.len()).then_some(offset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaggedTable {
    header: TableHeader,
    lines: Vec<Option<ValueRun>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectTable {
    header: TableHeader,
    values: GreyBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTable {
    header: TableHeader,
    lines: Vec<Vec<ValueRun>>,
}

/// Closed set of value-table encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTable {
    Ragged(RaggedTable),
    Rectangular(RectTable),
    Interval(IntervalTable),
}

impl ValueTable {
    /// Allocate a table of `table_type` over `domain`, every sample set to `background`.
    ///
    /// # Errors
    /// `InvalidGreyType` for a bit table or background, `AllocationError` on
    /// allocation failure.
    pub fn new(
        table_type: ValueTableType,
        background: GreyValue,
        domain: &IntervalDomain,
    ) -> Result<Self> {
        let bbox = domain.bbox();
        let header = TableHeader::new(table_type, background, bbox)?;
        let table = match table_type.kind {
            TableKind::Ragged => {
                let mut lines = Vec::new();
                lines.try_reserve_exact(bbox.height())?;
                for line in bbox.line1..=bbox.lastln {
                    let mut runs = domain.line_intervals(line);
                    let run = match runs.next() {
                        Some(first) => {
                            let last = runs.last().unwrap_or(first);
                            Some(ValueRun {
                                kol1: first.left,
                                values: header.filled_buffer(span(first.left, last.right))?,
                            })
                        }
                        None => None,
                    };
                    lines.push(run);
                }
                Self::Ragged(RaggedTable { header, lines })
            }
            TableKind::Rectangular => {
                let values = header.filled_buffer(bbox.width() * bbox.height())?;
                Self::Rectangular(RectTable { header, values })
            }
            TableKind::Interval => {
                let mut lines = Vec::new();
                lines.try_reserve_exact(bbox.height())?;
                for line in bbox.line1..=bbox.lastln {
                    let runs = domain
                        .line_intervals(line)
                        .map(|iv| {
                            Ok(ValueRun {
                                kol1: iv.left,
                                values: header.filled_buffer(iv.width())?,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    lines.push(runs);
                }
                Self::Interval(IntervalTable { header, lines })
            }
        };
        Ok(table)
    }

    fn header(&self) -> &TableHeader {
        match self {
            Self::Ragged(t) => &t.header,
            Self::Rectangular(t) => &t.header,
            Self::Interval(t) => &t.header,
        }
    }

    fn header_mut(&mut self) -> &mut TableHeader {
        match self {
            Self::Ragged(t) => &mut t.header,
            Self::Rectangular(t) => &mut t.header,
            Self::Interval(t) => &mut t.header,
        }
    }

    #[must_use]
    pub fn table_type(&self) -> ValueTableType {
        self.header().table_type
    }

    #[must_use]
    pub fn grey_type(&self) -> GreyType {
        self.header().table_type.grey
    }

    #[must_use]
    pub fn background(&self) -> GreyValue {
        self.header().background
    }

    #[must_use]
    pub fn bbox(&self) -> Rect {
        self.header().bbox
    }

    /// Store a new background, converted to the table's grey type.
    ///
    /// # Errors
    /// `InvalidGreyType` if the value cannot be converted.
    pub fn set_background(&mut self, value: GreyValue) -> Result<()> {
        let converted = value.convert(self.grey_type())?;
        self.header_mut().background = converted;
        Ok(())
    }

    /// The explicitly stored sample at `(line, kol)`, if the table holds one.
    #[must_use]
    pub fn get(&self, line: i32, kol: i32) -> Option<GreyValue> {
        let (buffer, index) = self.locate(line, kol)?;
        buffer.get(index)
    }

    /// The stored sample at `(line, kol)`, or the background.
    #[must_use]
    pub fn value_at(&self, line: i32, kol: i32) -> GreyValue {
        self.get(line, kol).unwrap_or_else(|| self.background())
    }

    /// Store a sample at `(line, kol)`. Returns `false` if the table holds no
    /// sample there.
    ///
    /// # Errors
    /// `InvalidGreyType` if the value cannot be converted.
    pub fn set(&mut self, line: i32, kol: i32, value: GreyValue) -> Result<bool> {
        match self.locate_mut(line, kol) {
            Some((buffer, index)) => buffer.set(index, value),
            None => Ok(false),
        }
    }

    /// Set every stored sample, converted to the table's grey type.
    ///
    /// # Errors
    /// `InvalidGreyType` if the value cannot be converted.
    pub fn fill(&mut self, value: GreyValue) -> Result<()> {
        match self {
            Self::Ragged(t) => t
                .lines
                .iter_mut()
                .flatten()
                .try_for_each(|run| run.values.fill(value)),
            Self::Rectangular(t) => t.values.fill(value),
            Self::Interval(t) => t
                .lines
                .iter_mut()
                .flatten()
                .try_for_each(|run| run.values.fill(value)),
        }
    }

    fn locate(&self, line: i32, kol: i32) -> Option<(&GreyBuffer, usize)> {
        let bbox = self.bbox();
        if !bbox.contains(line, kol) {
            return None;
        }
        let row = span(bbox.line1, line) - 1;
        match self {
            Self::Ragged(t) => {
                let run = t.lines.get(row)?.as_ref()?;
                Some((&run.values, run.index_of(kol)?))
            }
            Self::Rectangular(t) => {
                let index = row * bbox.width() + span(bbox.kol1, kol) - 1;
                Some((&t.values, index))
            }
            Self::Interval(t) => t
                .lines
                .get(row)?
                .iter()
                .find_map(|run| run.index_of(kol).map(|i| (&run.values, i))),
        }
    }

    fn locate_mut(&mut self, line: i32, kol: i32) -> Option<(&mut GreyBuffer, usize)> {
        let bbox = self.bbox();
        if !bbox.contains(line, kol) {
            return None;
        }
        let row = span(bbox.line1, line) - 1;
        match self {
            Self::Ragged(t) => {
                let run = t.lines.get_mut(row)?.as_mut()?;
                let index = run.index_of(kol)?;
                Some((&mut run.values, index))
            }
            Self::Rectangular(t) => {
                let index = row * bbox.width() + span(bbox.kol1, kol) - 1;
                Some((&mut t.values, index))
            }
            Self::Interval(t) => t.lines.get_mut(row)?.iter_mut().find_map(|run| {
                let index = run.index_of(kol)?;
                Some((&mut run.values, index))
            }),
        }
    }
}

/// Shared, mutable handle on a value table.
pub type TableRef = Rc<RefCell<ValueTable>>;

/// Shared, mutable handle on a voxel value stack.
pub type VoxelRef = Rc<RefCell<VoxelValues>>;

#[must_use]
pub fn table_ref(table: ValueTable) -> TableRef {
    Rc::new(RefCell::new(table))
}

#[must_use]
pub fn voxel_ref(values: VoxelValues) -> VoxelRef {
    Rc::new(RefCell::new(values))
}

/// Per-plane value tables for a plane domain, plus one stack-level background.
#[derive(Debug)]
pub struct VoxelValues {
    plane1: i32,
    lastpl: i32,
    background: GreyValue,
    planes: ExtVector<Option<TableRef>>,
}

impl VoxelValues {
    /// A stack over `plane1..=lastpl` with no plane tables.
    ///
    /// # Errors
    /// `InvalidParam` if `lastpl < plane1`, `InvalidGreyType` for a bit background.
    pub fn new(plane1: i32, lastpl: i32, background: GreyValue) -> Result<Self> {
        let count = span(plane1, lastpl);
        if count == 0 {
            return Err(WlzError::InvalidParam("last plane precedes first plane"));
        }
        if !background.grey_type().is_storable() {
            return Err(WlzError::InvalidGreyType(background.grey_type().name()));
        }
        Ok(Self {
            plane1,
            lastpl,
            background,
            planes: ExtVector::new(count, PLANE_BLOCK_SIZE)?,
        })
    }

    #[must_use]
    pub const fn plane1(&self) -> i32 {
        self.plane1
    }

    #[must_use]
    pub const fn lastpl(&self) -> i32 {
        self.lastpl
    }

    #[must_use]
    pub fn plane_count(&self) -> usize {
        span(self.plane1, self.lastpl)
    }

    #[must_use]
    pub const fn background(&self) -> GreyValue {
        self.background
    }

    /// Grey type the stack-level background is held in.
    #[must_use]
    pub const fn grey_type(&self) -> GreyType {
        self.background.grey_type()
    }

    /// Replace the stack-level background as given, without conversion.
    pub fn set_background(&mut self, value: GreyValue) {
        self.background = value;
    }

    /// Table of the plane at `index` (relative to `plane1`), if present.
    #[must_use]
    pub fn plane(&self, index: usize) -> Option<&TableRef> {
        if index >= self.plane_count() {
            return None;
        }
        self.planes.item_get(index).and_then(Option::as_ref)
    }

    /// # Errors
    /// `InvalidRange` if `index` is outside the plane range.
    pub fn set_plane(&mut self, index: usize, table: Option<TableRef>) -> Result<()> {
        let count = self.plane_count();
        let slot = self
            .planes
            .item_get_mut(index)
            .filter(|_| index < count)
            .ok_or(WlzError::InvalidRange {
                first: index,
                last: count - 1,
            })?;
        *slot = table;
        Ok(())
    }
}

/// Shared handle on the values attached to an object.
#[derive(Debug, Clone)]
pub enum Values {
    Table(TableRef),
    Voxel(VoxelRef),
}

impl Values {
    #[must_use]
    pub const fn as_table(&self) -> Option<&TableRef> {
        match self {
            Self::Table(table) => Some(table),
            Self::Voxel(_) => None,
        }
    }

    #[must_use]
    pub const fn as_voxel(&self) -> Option<&VoxelRef> {
        match self {
            Self::Voxel(voxel) => Some(voxel),
            Self::Table(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::domain::Interval;

    fn two_runs() -> IntervalDomain {
        IntervalDomain::from_runs(&[
            (10, Interval::new(2, 3)),
            (10, Interval::new(6, 7)),
            (12, Interval::new(4, 4)),
        ])
        .unwrap()
    }

    fn table(kind: TableKind) -> ValueTable {
        ValueTable::new(
            ValueTableType::new(kind, GreyType::Short),
            GreyValue::Int(-3),
            &two_runs(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_converts_background() {
        let t = table(TableKind::Ragged);
        assert_eq!(t.background(), GreyValue::Short(-3));
        assert_eq!(t.grey_type(), GreyType::Short);
        assert_eq!(t.bbox(), Rect::new(10, 12, 2, 7));
    }

    #[test]
    fn test_layouts_store_different_extents() {
        let ragged = table(TableKind::Ragged);
        // ragged lines span the gap between intervals
        assert_eq!(ragged.get(10, 5), Some(GreyValue::Short(-3)));
        assert_eq!(ragged.get(11, 4), None);

        let rect = table(TableKind::Rectangular);
        assert_eq!(rect.get(11, 4), Some(GreyValue::Short(-3)));

        let interval = table(TableKind::Interval);
        assert_eq!(interval.get(10, 5), None);
        assert_eq!(interval.get(10, 6), Some(GreyValue::Short(-3)));
        assert_eq!(interval.get(9, 6), None);
    }

    #[test]
    fn test_set_and_value_at() {
        for kind in [TableKind::Ragged, TableKind::Rectangular, TableKind::Interval] {
            let mut t = table(kind);
            assert!(t.set(12, 4, GreyValue::Double(41.6)).unwrap());
            assert_eq!(t.get(12, 4), Some(GreyValue::Short(42)));
            assert!(!t.set(20, 4, GreyValue::Short(1)).unwrap());
            assert_eq!(t.value_at(20, 4), GreyValue::Short(-3));
        }
    }

    #[test]
    fn test_fill_and_set_background() {
        let mut t = table(TableKind::Interval);
        t.fill(GreyValue::UByte(8)).unwrap();
        assert_eq!(t.get(10, 7), Some(GreyValue::Short(8)));
        assert_eq!(t.background(), GreyValue::Short(-3));

        t.set_background(GreyValue::Double(2.4)).unwrap();
        assert_eq!(t.background(), GreyValue::Short(2));
        assert!(t.set_background(GreyValue::Bit(1)).is_err());
    }

    #[test]
    fn test_bit_table_rejected() {
        let err = ValueTable::new(
            ValueTableType::new(TableKind::Ragged, GreyType::Bit),
            GreyValue::UByte(0),
            &two_runs(),
        )
        .unwrap_err();
        assert_eq!(err, WlzError::InvalidGreyType("bit"));
    }

    #[test]
    fn test_voxel_values_planes() {
        let mut voxel = VoxelValues::new(0, 2, GreyValue::UByte(1)).unwrap();
        assert_eq!(voxel.plane_count(), 3);
        assert!(voxel.plane(1).is_none());

        voxel.set_plane(1, Some(table_ref(table(TableKind::Ragged)))).unwrap();
        assert!(voxel.plane(1).is_some());
        assert!(voxel.set_plane(3, None).is_err());
        assert!(VoxelValues::new(2, 0, GreyValue::UByte(0)).is_err());
    }
}
