//! Warping 2D objects through a displacement mesh.
//!
//! Every pixel covered by the displaced mesh is located in a displaced element,
//! mapped back to the element's rest position through its barycentric weights and
//! kept when that source position falls inside the source domain. Grey values
//! are resampled from the source table.

use std::rc::Rc;

use crate::error::{Result, WlzError};
use crate::object::{
    GreyType, GreyValue, Interval, IntervalDomain, Object, TableKind, Values, ValueTable,
    ValueTableType, rgba_channels, rgba_pack, table_ref,
};

use super::{BBox2, MeshTransform, Tolerance, Vec2};

/// Upper bound on the pixels a single warp may visit.
const MAX_WARP_PIXELS: u64 = 1 << 30;

/// Grey-value resampling used when warping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Value of the source pixel nearest to the mapped position.
    #[default]
    Nearest,
    /// Bilinear blend of the four surrounding source pixels.
    Linear,
}

/// Options for [`apply_mesh_transform`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WarpOptions {
    pub interpolation: Interpolation,
    /// Slack allowed when testing whether a pixel lies in an element.
    pub tolerance: Tolerance,
}

impl WarpOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[must_use]
    pub const fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Counters reported by a warp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarpDiagnostics {
    pub elements_used: usize,
    /// Elements skipped because their displaced triangle has no area.
    pub degenerate_elements: usize,
    pub pixels_visited: usize,
    pub pixels_covered: usize,
}

struct WarpElement {
    rest: [Vec2; 3],
    displaced: [Vec2; 3],
    bounds: BBox2,
}

impl WarpElement {
    /// Barycentric weights of `p` in the displaced triangle, if `p` lies inside.
    fn weights(&self, p: Vec2, tol: Tolerance) -> Option<[f64; 3]> {
        if !self.bounds.contains_point(p, tol) {
            return None;
        }
        let [a, b, c] = self.displaced;
        let v0 = b - a;
        let v1 = c - a;
        let v2 = p - a;
        let denom = v0.perp_dot(v1);
        if denom.abs() <= Tolerance::ZERO_AREA.eps {
            return None;
        }
        let v = v2.perp_dot(v1) / denom;
        let w = v0.perp_dot(v2) / denom;
        let weights = [1.0 - v - w, v, w];
        weights.iter().all(|&x| x >= -tol.eps).then_some(weights)
    }

    fn source(&self, weights: [f64; 3]) -> Vec2 {
        self.rest[0] * weights[0] + self.rest[1] * weights[1] + self.rest[2] * weights[2]
    }
}

/// Warp a 2D object through `mesh`.
///
/// Returns an empty object when no pixel of the result lies in the source
/// domain, and a domain-only object when the source has no values.
///
/// # Errors
/// `TransformError` for anything but a 2D domain object or a mesh without usable
/// elements, `DomainNull`/`DomainTypeMismatch` for a malformed source domain,
/// `ValueTableTypeMismatch` if the source carries voxel values.
pub fn apply_mesh_transform(
    obj: &Object,
    mesh: &MeshTransform,
    options: WarpOptions,
) -> Result<Object> {
    apply_mesh_transform_with_diagnostics(obj, mesh, options).map(|(warped, _)| warped)
}

/// [`apply_mesh_transform`] that also reports what the warp did.
///
/// # Errors
/// As [`apply_mesh_transform`].
pub fn apply_mesh_transform_with_diagnostics(
    obj: &Object,
    mesh: &MeshTransform,
    options: WarpOptions,
) -> Result<(Object, WarpDiagnostics)> {
    let (domain, table) = match obj {
        Object::Domain2D { domain, values } => {
            let domain = domain
                .as_ref()
                .ok_or(WlzError::DomainNull)?
                .as_interval()
                .ok_or(WlzError::DomainTypeMismatch)?;
            let table = match values {
                None => None,
                Some(Values::Table(table)) => Some(table),
                Some(Values::Voxel(_)) => return Err(WlzError::ValueTableTypeMismatch),
            };
            (domain, table)
        }
        other => {
            return Err(WlzError::TransformError(format!(
                "cannot warp a {:?} object",
                other.kind()
            )));
        }
    };

    let mut diagnostics = WarpDiagnostics::default();
    let elements = warp_elements(mesh, options.tolerance, &mut diagnostics);
    let bounds = elements
        .iter()
        .map(|e| e.bounds)
        .reduce(|a, b| a.expand_point(b.min).expand_point(b.max))
        .ok_or_else(|| WlzError::TransformError("mesh has no usable elements".to_owned()))?;

    let line1 = pixel_coord(bounds.min.y.floor())?;
    let lastln = pixel_coord(bounds.max.y.ceil())?;
    let kol1 = pixel_coord(bounds.min.x.floor())?;
    let lastkl = pixel_coord(bounds.max.x.ceil())?;
    let rows = i64::from(lastln) - i64::from(line1) + 1;
    let cols = i64::from(lastkl) - i64::from(kol1) + 1;
    if rows
        .checked_mul(cols)
        .is_none_or(|pixels| pixels.unsigned_abs() > MAX_WARP_PIXELS)
    {
        return Err(WlzError::TransformError(format!(
            "displaced mesh spans {rows} x {cols} pixels"
        )));
    }

    let source_table = table.map(|t| t.borrow());
    let mut runs: Vec<(i32, Interval)> = Vec::new();
    let mut samples: Vec<GreyValue> = Vec::new();
    let mut hint = 0;
    for line in line1..=lastln {
        let mut open: Option<Interval> = None;
        for kol in kol1..=lastkl {
            diagnostics.pixels_visited += 1;
            let p = Vec2::new(f64::from(kol), f64::from(line));
            let hit = locate(&elements, p, options.tolerance, &mut hint)
                .map(|(element, weights)| element.source(weights))
                .and_then(|src| nearest_pixel(src).map(|pixel| (src, pixel)))
                .filter(|&(_, (l, k))| domain.contains(l, k));

            let Some((src, pixel)) = hit else {
                if let Some(interval) = open.take() {
                    runs.push((line, interval));
                }
                continue;
            };
            diagnostics.pixels_covered += 1;
            if let Some(table) = &source_table {
                samples.push(sample(table, domain, src, pixel, options.interpolation)?);
            }
            match &mut open {
                Some(interval) => interval.right = kol,
                None => open = Some(Interval::new(kol, kol)),
            }
        }
        if let Some(interval) = open {
            runs.push((line, interval));
        }
    }

    if runs.is_empty() {
        log::debug!("mesh warp produced no pixels");
        return Ok((Object::Empty, diagnostics));
    }
    let warped_domain = Rc::new(IntervalDomain::from_runs(&runs)?);
    let values = match &source_table {
        None => None,
        Some(table) => {
            let mut warped = ValueTable::new(
                ValueTableType::new(TableKind::Ragged, table.grey_type()),
                table.background(),
                &warped_domain,
            )?;
            let pixels = warped_domain
                .intervals()
                .flat_map(|(line, iv)| (iv.left..=iv.right).map(move |kol| (line, kol)));
            for ((line, kol), value) in pixels.zip(samples) {
                warped.set(line, kol, value)?;
            }
            Some(table_ref(warped))
        }
    };
    log::debug!(
        "mesh warp: {} of {} pixels covered by {} elements",
        diagnostics.pixels_covered,
        diagnostics.pixels_visited,
        diagnostics.elements_used
    );
    Ok((Object::new_2d(warped_domain, values), diagnostics))
}

fn warp_elements(
    mesh: &MeshTransform,
    tol: Tolerance,
    diagnostics: &mut WarpDiagnostics,
) -> Vec<WarpElement> {
    let mut elements = Vec::with_capacity(mesh.element_count());
    for element in mesh.elements() {
        let Some((rest, displaced)) = mesh.element_triangles(element) else {
            continue;
        };
        let area = (displaced[1] - displaced[0]).perp_dot(displaced[2] - displaced[0]);
        if area.abs() <= Tolerance::ZERO_AREA.eps {
            diagnostics.degenerate_elements += 1;
            continue;
        }
        if let Some(bounds) = BBox2::from_points(displaced) {
            elements.push(WarpElement {
                rest,
                displaced,
                bounds: BBox2 {
                    min: bounds.min - Vec2::new(tol.eps, tol.eps),
                    max: bounds.max + Vec2::new(tol.eps, tol.eps),
                },
            });
        }
    }
    diagnostics.elements_used = elements.len();
    elements
}

/// Find the element containing `p`, trying the last hit first.
fn locate<'a>(
    elements: &'a [WarpElement],
    p: Vec2,
    tol: Tolerance,
    hint: &mut usize,
) -> Option<(&'a WarpElement, [f64; 3])> {
    let cached = elements
        .get(*hint)
        .and_then(|e| e.weights(p, tol).map(|w| (e, w)));
    if cached.is_some() {
        return cached;
    }
    let (index, element, weights) = elements
        .iter()
        .enumerate()
        .find_map(|(i, e)| e.weights(p, tol).map(|w| (i, e, w)))?;
    *hint = index;
    Some((element, weights))
}

fn pixel_coord(v: f64) -> Result<i32> {
    to_i32(v).ok_or_else(|| WlzError::TransformError(format!("coordinate {v} is out of range")))
}

#[allow(clippy::cast_possible_truncation)]
fn to_i32(v: f64) -> Option<i32> {
    (v.is_finite() && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX)).then_some(v as i32)
}

/// `(line, kol)` of the pixel nearest to `p`.
fn nearest_pixel(p: Vec2) -> Option<(i32, i32)> {
    Some((to_i32(p.y.round())?, to_i32(p.x.round())?))
}

fn sample(
    table: &ValueTable,
    domain: &IntervalDomain,
    src: Vec2,
    (line, kol): (i32, i32),
    interpolation: Interpolation,
) -> Result<GreyValue> {
    let at = |l: i32, k: i32| {
        if domain.contains(l, k) {
            table.value_at(l, k)
        } else {
            table.background()
        }
    };
    match interpolation {
        Interpolation::Nearest => Ok(at(line, kol)),
        Interpolation::Linear => {
            let (Some(l0), Some(k0)) = (to_i32(src.y.floor()), to_i32(src.x.floor())) else {
                return Ok(at(line, kol));
            };
            let fy = src.y - src.y.floor();
            let fx = src.x - src.x.floor();
            let l1 = l0.saturating_add(1);
            let k1 = k0.saturating_add(1);
            let values = [at(l0, k0), at(l0, k1), at(l1, k0), at(l1, k1)];
            let weights = [
                (1.0 - fx) * (1.0 - fy),
                fx * (1.0 - fy),
                (1.0 - fx) * fy,
                fx * fy,
            ];
            blend(values, weights, table.grey_type())
        }
    }
}

fn blend(values: [GreyValue; 4], weights: [f64; 4], grey: GreyType) -> Result<GreyValue> {
    if grey != GreyType::Rgba {
        let sum: f64 = values.iter().zip(weights).map(|(v, w)| v.to_f64() * w).sum();
        return GreyValue::Double(sum).convert(grey);
    }
    let mut acc = [0.0_f64; 4];
    for (value, w) in values.iter().zip(weights) {
        let GreyValue::Rgba(packed) = value.convert(GreyType::Rgba)? else {
            continue;
        };
        for (channel, c) in acc.iter_mut().zip(rgba_channels(packed)) {
            *channel += w * f64::from(c);
        }
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let [r, g, b, a] = acc.map(|c| c.round().clamp(0.0, 255.0) as u8);
    Ok(GreyValue::Rgba(rgba_pack(r, g, b, a)))
}
