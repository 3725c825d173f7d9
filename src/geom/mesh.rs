//! Triangulated displacement meshes.
//!
//! Each node carries a rest position and a displacement; the displaced mesh is
//! the rest mesh with every node moved by its displacement. Elements are node
//! index triples.

use crate::alloc::ExtVector;
use crate::error::{Result, WlzError};

use super::{BBox2, Tolerance, Vec2};

const NODE_BLOCK_SIZE: usize = 256;

/// A mesh node: rest position plus displacement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshNode {
    pub position: Vec2,
    pub displacement: Vec2,
}

impl MeshNode {
    #[must_use]
    pub const fn new(position: Vec2, displacement: Vec2) -> Self {
        Self {
            position,
            displacement,
        }
    }

    /// Position after displacement.
    #[must_use]
    pub fn displaced(self) -> Vec2 {
        self.position + self.displacement
    }
}

/// Triangle element referring to three mesh nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshElement {
    pub nodes: [usize; 3],
}

/// Displacement mesh used to warp 2D objects.
///
/// The node array is allocated on the first node insertion; a mesh without it
/// is a null mesh that cannot be inverted.
#[derive(Debug, Default)]
pub struct MeshTransform {
    nodes: Option<ExtVector<MeshNode>>,
    node_count: usize,
    elements: Vec<MeshElement>,
}

impl MeshTransform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its index.
    ///
    /// # Errors
    /// `InvalidParam` for a non-finite node, `AllocationError` on allocation failure.
    pub fn add_node(&mut self, node: MeshNode) -> Result<usize> {
        if !node.position.is_finite() || !node.displacement.is_finite() {
            return Err(WlzError::InvalidParam("mesh node is not finite"));
        }
        let nodes = match self.nodes.take() {
            Some(nodes) => nodes,
            None => ExtVector::new(0, NODE_BLOCK_SIZE)?,
        };
        let nodes = self.nodes.insert(nodes);
        let index = self.node_count;
        *nodes.extend_and_get_mut(index)? = node;
        self.node_count += 1;
        Ok(index)
    }

    /// Append a triangle element, returning its index.
    ///
    /// # Errors
    /// `InvalidParam` if the element names a node that does not exist.
    pub fn add_element(&mut self, nodes: [usize; 3]) -> Result<usize> {
        if nodes.iter().any(|&n| n >= self.node_count) {
            return Err(WlzError::InvalidParam("element refers to a missing node"));
        }
        self.elements.try_reserve(1)?;
        self.elements.push(MeshElement { nodes });
        Ok(self.elements.len() - 1)
    }

    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&MeshNode> {
        if index >= self.node_count {
            return None;
        }
        self.nodes.as_ref()?.item_get(index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MeshNode> + '_ {
        let count = self.node_count;
        self.nodes
            .iter()
            .flat_map(move |nodes| nodes.iter().take(count))
    }

    #[must_use]
    pub fn elements(&self) -> &[MeshElement] {
        &self.elements
    }

    /// Rest and displaced corners of an element.
    #[must_use]
    pub fn element_triangles(&self, element: &MeshElement) -> Option<([Vec2; 3], [Vec2; 3])> {
        let mut rest = [Vec2::ZERO; 3];
        let mut displaced = [Vec2::ZERO; 3];
        for (k, &n) in element.nodes.iter().enumerate() {
            let node = self.node(n)?;
            rest[k] = node.position;
            displaced[k] = node.displaced();
        }
        Some((rest, displaced))
    }

    /// Bounds of the displaced node positions.
    #[must_use]
    pub fn displaced_bounds(&self) -> Option<BBox2> {
        BBox2::from_points(self.nodes().map(|n| n.displaced()))
    }

    /// Invert the mesh in place: every node moves to its displaced position and
    /// its displacement is negated, so the mesh maps the warped image back.
    ///
    /// # Errors
    /// `NullParam` if the mesh has no node array.
    pub fn invert(&mut self) -> Result<()> {
        let count = self.node_count;
        let nodes = self.nodes.as_mut().ok_or(WlzError::NullParam("mesh nodes"))?;
        for index in 0..count {
            if let Some(node) = nodes.item_get_mut(index) {
                node.position = node.position + node.displacement;
                node.displacement = -node.displacement;
            }
        }
        log::trace!("inverted mesh transform with {count} nodes");
        Ok(())
    }

    /// Delaunay mesh over `positions` with the matching `displacements`.
    ///
    /// # Errors
    /// `InvalidParam` if the slices differ in length or hold non-finite points,
    /// `TransformError` if the points do not span a triangle.
    pub fn from_points(positions: &[Vec2], displacements: &[Vec2]) -> Result<Self> {
        if positions.len() != displacements.len() {
            return Err(WlzError::InvalidParam(
                "position and displacement counts differ",
            ));
        }
        if positions.len() < 3 {
            return Err(WlzError::TransformError(format!(
                "need at least 3 points, got {}",
                positions.len()
            )));
        }

        let mut mesh = Self::new();
        for (&position, &displacement) in positions.iter().zip(displacements) {
            mesh.add_node(MeshNode::new(position, displacement))?;
        }

        let points: Vec<delaunator::Point> = positions
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&points);
        for tri in triangulation.triangles.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]];
            let area = (positions[b] - positions[a]).perp_dot(positions[c] - positions[a]);
            if area.abs() > Tolerance::ZERO_AREA.eps {
                mesh.add_element([a, b, c])?;
            }
        }
        if mesh.elements.is_empty() {
            return Err(WlzError::TransformError("points are collinear".to_owned()));
        }
        log::debug!(
            "built mesh transform: {} nodes, {} elements",
            mesh.node_count,
            mesh.elements.len()
        );
        Ok(mesh)
    }
}
