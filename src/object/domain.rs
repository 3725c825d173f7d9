//! Spatial domains: interval-coded 2D regions, plane stacks and the closed
//! [`Domain`] variant set.

use std::cell::RefCell;
use std::rc::Rc;

use crate::alloc::ExtVector;
use crate::error::{Result, WlzError};
use crate::geom::MeshTransform;

const INTERVAL_BLOCK_SIZE: usize = 256;
const PLANE_BLOCK_SIZE: usize = 16;

/// Inclusive bounding rectangle in line (row) / column coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub line1: i32,
    pub lastln: i32,
    pub kol1: i32,
    pub lastkl: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(line1: i32, lastln: i32, kol1: i32, lastkl: i32) -> Self {
        Self {
            line1,
            lastln,
            kol1,
            lastkl,
        }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.line1 <= self.lastln && self.kol1 <= self.lastkl
    }

    #[must_use]
    pub fn width(self) -> usize {
        span(self.kol1, self.lastkl)
    }

    #[must_use]
    pub fn height(self) -> usize {
        span(self.line1, self.lastln)
    }

    #[must_use]
    pub const fn contains(self, line: i32, kol: i32) -> bool {
        line >= self.line1 && line <= self.lastln && kol >= self.kol1 && kol <= self.lastkl
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            self.line1.min(other.line1),
            self.lastln.max(other.lastln),
            self.kol1.min(other.kol1),
            self.lastkl.max(other.lastkl),
        )
    }
}

/// Number of integer positions in `first..=last`, zero for an inverted range.
#[must_use]
pub(crate) fn span(first: i32, last: i32) -> usize {
    usize::try_from(i64::from(last) - i64::from(first) + 1).unwrap_or(0)
}

/// A run of columns `left..=right` on one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval {
    pub left: i32,
    pub right: i32,
}

impl Interval {
    #[must_use]
    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    #[must_use]
    pub fn width(self) -> usize {
        span(self.left, self.right)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LineRuns {
    first: usize,
    count: usize,
}

/// 2D domain coded as per-line interval runs.
///
/// All intervals live in one [`ExtVector`] pool; each line of the bounding box
/// records where its runs start in the pool and how many there are.
#[derive(Debug)]
pub struct IntervalDomain {
    bbox: Rect,
    lines: Vec<LineRuns>,
    intervals: ExtVector<Interval>,
    interval_count: usize,
}

impl IntervalDomain {
    /// A domain covering every pixel of `rect`.
    ///
    /// # Errors
    /// `InvalidParam` for an inverted rectangle, `AllocationError` on allocation failure.
    pub fn from_rect(rect: Rect) -> Result<Self> {
        if !rect.is_valid() {
            return Err(WlzError::InvalidParam("rectangle is inverted"));
        }
        let runs: Vec<(i32, Interval)> = (rect.line1..=rect.lastln)
            .map(|line| (line, Interval::new(rect.kol1, rect.lastkl)))
            .collect();
        Self::from_runs(&runs)
    }

    /// Build a domain from `(line, interval)` runs.
    ///
    /// Runs must be ordered by line, then by column, and must not overlap.
    ///
    /// # Errors
    /// `InvalidParam` if the runs are empty, unordered, overlapping or inverted.
    pub fn from_runs(runs: &[(i32, Interval)]) -> Result<Self> {
        let (Some(&(line1, _)), Some(&(lastln, _))) = (runs.first(), runs.last()) else {
            return Err(WlzError::InvalidParam("interval domain needs at least one run"));
        };

        let mut kol1 = i32::MAX;
        let mut lastkl = i32::MIN;
        let mut previous: Option<(i32, Interval)> = None;
        for &(line, interval) in runs {
            if interval.left > interval.right {
                return Err(WlzError::InvalidParam("interval is inverted"));
            }
            if let Some((prev_line, prev)) = previous {
                let ordered = line > prev_line || (line == prev_line && interval.left > prev.right);
                if !ordered {
                    return Err(WlzError::InvalidParam("intervals are unordered or overlap"));
                }
            }
            kol1 = kol1.min(interval.left);
            lastkl = lastkl.max(interval.right);
            previous = Some((line, interval));
        }

        let bbox = Rect::new(line1, lastln, kol1, lastkl);
        let mut lines = Vec::new();
        lines.try_reserve_exact(bbox.height())?;
        lines.resize(bbox.height(), LineRuns::default());

        let mut intervals = ExtVector::new(runs.len(), INTERVAL_BLOCK_SIZE)?;
        for (index, &(line, interval)) in runs.iter().enumerate() {
            *intervals.extend_and_get_mut(index)? = interval;
            let entry = &mut lines[span(line1, line) - 1];
            if entry.count == 0 {
                entry.first = index;
            }
            entry.count += 1;
        }

        Ok(Self {
            bbox,
            lines,
            intervals,
            interval_count: runs.len(),
        })
    }

    #[must_use]
    pub const fn bbox(&self) -> Rect {
        self.bbox
    }

    #[must_use]
    pub const fn interval_count(&self) -> usize {
        self.interval_count
    }

    /// Runs on `line`, in column order. Empty for lines outside the bounding box.
    pub fn line_intervals(&self, line: i32) -> impl Iterator<Item = Interval> + '_ {
        let runs = if line < self.bbox.line1 || line > self.bbox.lastln {
            LineRuns::default()
        } else {
            self.lines[span(self.bbox.line1, line) - 1]
        };
        (runs.first..runs.first + runs.count).filter_map(|i| self.intervals.item_get(i).copied())
    }

    /// Every run of the domain as `(line, interval)`, line by line.
    pub fn intervals(&self) -> impl Iterator<Item = (i32, Interval)> + '_ {
        (self.bbox.line1..=self.bbox.lastln)
            .flat_map(move |line| self.line_intervals(line).map(move |iv| (line, iv)))
    }

    #[must_use]
    pub fn contains(&self, line: i32, kol: i32) -> bool {
        self.line_intervals(line)
            .any(|iv| kol >= iv.left && kol <= iv.right)
    }

    /// Number of pixels in the domain.
    #[must_use]
    pub fn area(&self) -> usize {
        self.intervals().map(|(_, iv)| iv.width()).sum()
    }
}

/// Stack of per-plane domains over the contiguous range `plane1..=lastpl`.
#[derive(Debug)]
pub struct PlaneDomain {
    plane1: i32,
    lastpl: i32,
    domains: ExtVector<Option<Domain>>,
}

impl PlaneDomain {
    /// A stack with every plane absent.
    ///
    /// # Errors
    /// `InvalidParam` if `lastpl < plane1`.
    pub fn new(plane1: i32, lastpl: i32) -> Result<Self> {
        let count = span(plane1, lastpl);
        if count == 0 {
            return Err(WlzError::InvalidParam("last plane precedes first plane"));
        }
        Ok(Self {
            plane1,
            lastpl,
            domains: ExtVector::new(count, PLANE_BLOCK_SIZE)?,
        })
    }

    /// A stack starting at `plane1` with one entry per plane.
    ///
    /// # Errors
    /// `InvalidParam` if `planes` is empty or the last plane number overflows.
    pub fn from_planes(plane1: i32, planes: Vec<Option<Domain>>) -> Result<Self> {
        let last_offset = i32::try_from(planes.len())
            .map_err(|_| WlzError::InvalidParam("too many planes"))?
            - 1;
        let lastpl = plane1
            .checked_add(last_offset)
            .ok_or(WlzError::InvalidParam("plane range exceeds i32"))?;
        let mut stack = Self::new(plane1, lastpl)?;
        for (index, plane) in planes.into_iter().enumerate() {
            stack.set_plane(index, plane)?;
        }
        Ok(stack)
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

    /// Domain of the plane at `index` (relative to `plane1`), if present.
    #[must_use]
    pub fn plane(&self, index: usize) -> Option<&Domain> {
        if index >= self.plane_count() {
            return None;
        }
        self.domains.item_get(index).and_then(Option::as_ref)
    }

    /// # Errors
    /// `InvalidRange` if `index` is outside the plane range.
    pub fn set_plane(&mut self, index: usize, domain: Option<Domain>) -> Result<()> {
        let count = self.plane_count();
        if index >= count {
            return Err(WlzError::InvalidRange {
                first: index,
                last: count.saturating_sub(1),
            });
        }
        let slot = self
            .domains
            .item_get_mut(index)
            .ok_or(WlzError::InvalidRange {
                first: index,
                last: count - 1,
            })?;
        *slot = domain;
        Ok(())
    }

    /// Bounding rectangle over all interval planes.
    #[must_use]
    pub fn bbox(&self) -> Option<Rect> {
        (0..self.plane_count())
            .filter_map(|i| self.plane(i).and_then(Domain::as_interval))
            .map(|d| d.bbox())
            .reduce(Rect::union)
    }
}

/// Shared handle on one of the spatial domain encodings.
#[derive(Debug, Clone)]
pub enum Domain {
    Interval(Rc<IntervalDomain>),
    Planes(Rc<PlaneDomain>),
    Mesh(Rc<RefCell<MeshTransform>>),
    Empty,
}

impl Domain {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub const fn as_interval(&self) -> Option<&Rc<IntervalDomain>> {
        match self {
            Self::Interval(domain) => Some(domain),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_planes(&self) -> Option<&Rc<PlaneDomain>> {
        match self {
            Self::Planes(domain) => Some(domain),
            _ => None,
        }
    }
}

impl From<IntervalDomain> for Domain {
    fn from(domain: IntervalDomain) -> Self {
        Self::Interval(Rc::new(domain))
    }
}

impl From<PlaneDomain> for Domain {
    fn from(domain: PlaneDomain) -> Self {
        Self::Planes(Rc::new(domain))
    }
}
