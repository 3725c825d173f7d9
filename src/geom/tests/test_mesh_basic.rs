//! Tests for mesh transform construction, inversion and the XML codec.

use crate::error::WlzError;
use crate::geom::{MeshNode, MeshTransform, Tolerance, Vec2, mesh_from_xml, mesh_to_xml};

// ============================================================================
// Test mesh factories
// ============================================================================

/// Unit square split into two triangles, every node displaced by `d`.
fn create_square_mesh(d: Vec2) -> MeshTransform {
    let mut mesh = MeshTransform::new();
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        mesh.add_node(MeshNode::new(Vec2::new(x, y), d)).unwrap();
    }
    mesh.add_element([0, 1, 2]).unwrap();
    mesh.add_element([0, 2, 3]).unwrap();
    mesh
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_add_nodes_and_elements() {
    let mesh = create_square_mesh(Vec2::new(0.5, -0.25));
    assert_eq!(mesh.node_count(), 4);
    assert_eq!(mesh.element_count(), 2);
    assert_eq!(mesh.node(2).unwrap().displaced(), Vec2::new(1.5, 0.75));
    assert!(mesh.node(4).is_none());
    assert_eq!(mesh.nodes().count(), 4);

    let bounds = mesh.displaced_bounds().unwrap();
    assert_eq!(bounds.min, Vec2::new(0.5, -0.25));
    assert_eq!(bounds.max, Vec2::new(1.5, 0.75));
}

#[test]
fn test_add_element_rejects_missing_node() {
    let mut mesh = create_square_mesh(Vec2::ZERO);
    let err = mesh.add_element([0, 1, 4]).unwrap_err();
    assert!(matches!(err, WlzError::InvalidParam(_)));
    assert_eq!(mesh.element_count(), 2);
}

#[test]
fn test_add_node_rejects_non_finite() {
    let mut mesh = MeshTransform::new();
    let node = MeshNode::new(Vec2::new(f64::NAN, 0.0), Vec2::ZERO);
    assert!(mesh.add_node(node).is_err());
    assert_eq!(mesh.node_count(), 0);
}

// ============================================================================
// Inversion
// ============================================================================

#[test]
fn test_invert_moves_nodes_and_negates_displacement() {
    let mut mesh = create_square_mesh(Vec2::new(2.0, 1.0));
    mesh.invert().unwrap();
    let node = mesh.node(1).unwrap();
    assert_eq!(node.position, Vec2::new(3.0, 1.0));
    assert_eq!(node.displacement, Vec2::new(-2.0, -1.0));
    assert_eq!(node.displaced(), Vec2::new(1.0, 0.0));
}

#[test]
fn test_invert_twice_restores_mesh() {
    let mut mesh = create_square_mesh(Vec2::new(0.3, -1.7));
    let before: Vec<MeshNode> = mesh.nodes().copied().collect();
    mesh.invert().unwrap();
    mesh.invert().unwrap();
    let tol = Tolerance::DEFAULT;
    for (a, b) in before.iter().zip(mesh.nodes()) {
        assert!(tol.approx_eq_vec2(a.position, b.position));
        assert!(tol.approx_eq_vec2(a.displacement, b.displacement));
    }
}

#[test]
fn test_invert_without_nodes_is_null_param() {
    let mut mesh = MeshTransform::new();
    assert_eq!(mesh.invert(), Err(WlzError::NullParam("mesh nodes")));
}

// ============================================================================
// Delaunay construction
// ============================================================================

#[test]
fn test_from_points_triangulates_square() {
    let positions = [
        Vec2::new(0.0, 0.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(0.0, 4.0),
    ];
    let displacements = [Vec2::new(1.0, 0.0); 4];
    let mesh = MeshTransform::from_points(&positions, &displacements).unwrap();
    assert_eq!(mesh.node_count(), 4);
    assert_eq!(mesh.element_count(), 2);
    for element in mesh.elements() {
        assert!(element.nodes.iter().all(|&n| n < 4));
    }
}

#[test]
fn test_from_points_rejects_bad_input() {
    let line = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
    let err = MeshTransform::from_points(&line, &[Vec2::ZERO; 3]).unwrap_err();
    assert!(matches!(err, WlzError::TransformError(_)));

    let err = MeshTransform::from_points(&line, &[Vec2::ZERO; 2]).unwrap_err();
    assert!(matches!(err, WlzError::InvalidParam(_)));

    let err = MeshTransform::from_points(&line[..2], &[Vec2::ZERO; 2]).unwrap_err();
    assert!(matches!(err, WlzError::TransformError(_)));
}

// ============================================================================
// XML codec
// ============================================================================

#[test]
fn test_xml_roundtrip() {
    let mesh = create_square_mesh(Vec2::new(0.25, -3.5));
    let xml = mesh_to_xml(&mesh).unwrap();
    assert!(xml.starts_with("<meshTransform"));

    let decoded = mesh_from_xml(&xml).unwrap();
    assert_eq!(decoded.node_count(), mesh.node_count());
    assert_eq!(decoded.elements(), mesh.elements());
    for (a, b) in mesh.nodes().zip(decoded.nodes()) {
        assert_eq!(a, b);
    }
}

#[test]
fn test_xml_decode_hand_written() {
    let xml = r#"<meshTransform>
        <node x="0" y="0" dx="1" dy="0"/>
        <node x="2" y="0" dx="1" dy="0"/>
        <node x="0" y="2" dx="1" dy="0.5"/>
        <element n0="0" n1="1" n2="2"/>
    </meshTransform>"#;
    let mesh = mesh_from_xml(xml).unwrap();
    assert_eq!(mesh.node_count(), 3);
    assert_eq!(mesh.element_count(), 1);
    assert_eq!(mesh.node(2).unwrap().displacement, Vec2::new(1.0, 0.5));
}

#[test]
fn test_xml_decode_errors() {
    let xml = r#"<meshTransform>
        <node x="0" y="0" dx="0" dy="0"/>
        <element n0="0" n1="1" n2="2"/>
    </meshTransform>"#;
    assert!(matches!(mesh_from_xml(xml), Err(WlzError::InvalidParam(_))));

    let xml = r#"<meshTransform><node x="zero" y="0" dx="0" dy="0"/></meshTransform>"#;
    assert!(matches!(mesh_from_xml(xml), Err(WlzError::Codec(_))));
}
