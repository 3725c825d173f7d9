//! XML form of a mesh transform.
//!
//! ```xml
//! <meshTransform>
//!   <node x="0" y="0" dx="1.5" dy="0"/>
//!   ...
//!   <element n0="0" n1="1" n2="2"/>
//! </meshTransform>
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{MeshNode, MeshTransform, Vec2};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "meshTransform")]
struct MeshDocument {
    #[serde(rename = "node", default)]
    nodes: Vec<NodeRecord>,
    #[serde(rename = "element", default)]
    elements: Vec<ElementRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(rename = "@x")]
    x: f64,
    #[serde(rename = "@y")]
    y: f64,
    #[serde(rename = "@dx")]
    dx: f64,
    #[serde(rename = "@dy")]
    dy: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ElementRecord {
    #[serde(rename = "@n0")]
    n0: usize,
    #[serde(rename = "@n1")]
    n1: usize,
    #[serde(rename = "@n2")]
    n2: usize,
}

/// Serialize `mesh` to XML.
///
/// # Errors
/// `Codec` if the writer fails.
pub fn mesh_to_xml(mesh: &MeshTransform) -> Result<String> {
    let document = MeshDocument {
        nodes: mesh
            .nodes()
            .map(|n| NodeRecord {
                x: n.position.x,
                y: n.position.y,
                dx: n.displacement.x,
                dy: n.displacement.y,
            })
            .collect(),
        elements: mesh
            .elements()
            .iter()
            .map(|e| ElementRecord {
                n0: e.nodes[0],
                n1: e.nodes[1],
                n2: e.nodes[2],
            })
            .collect(),
    };
    Ok(quick_xml::se::to_string(&document)?)
}

/// Parse a mesh transform from XML.
///
/// # Errors
/// `Codec` for malformed XML, `InvalidParam` for non-finite nodes or elements
/// that refer to missing nodes.
pub fn mesh_from_xml(xml: &str) -> Result<MeshTransform> {
    let document: MeshDocument = quick_xml::de::from_str(xml)?;
    let mut mesh = MeshTransform::new();
    for n in &document.nodes {
        mesh.add_node(MeshNode::new(Vec2::new(n.x, n.y), Vec2::new(n.dx, n.dy)))?;
    }
    for e in &document.elements {
        mesh.add_element([e.n0, e.n1, e.n2])?;
    }
    log::debug!(
        "decoded mesh transform: {} nodes, {} elements",
        mesh.node_count(),
        mesh.element_count()
    );
    Ok(mesh)
}
