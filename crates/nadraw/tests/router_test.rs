use nadraw::geom::{Point, angle, distance, normalize_angle, point};
use nadraw::{
    BusShape, Diagnostic, Diagram, DiagramParameters, EdgeGeometry, EdgeSymbol, Side,
};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn load_basic() -> Diagram {
    let path = workspace_root().join("fixtures").join("nad").join("basic.json");
    let text = std::fs::read_to_string(&path).expect("read fixture");
    Diagram::from_json_str(&text).expect("valid metadata")
}

fn geometry<'a>(diagram: &'a Diagram, id: &str) -> &'a EdgeGeometry {
    diagram
        .edge_geometry(id)
        .expect("known edge")
        .unwrap_or_else(|| panic!("edge {id} was not routed"))
}

fn assert_close(actual: Point, expected: Point) {
    assert!(
        distance(actual, expected) < 1e-9,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn parallel_bundle_forks_symmetrically() {
    let d = load_basic();
    let first = geometry(&d, "20");
    let last = geometry(&d, "22");
    let a = first.fork_offset.expect("outer edge is forked");
    let b = last.fork_offset.expect("outer edge is forked");
    assert!((a + b).abs() < 1e-12, "offsets {a} and {b} are not symmetric");
    assert!((b - PI / 6.0).abs() < 1e-12);

    // Edge 22 runs from node 1 to node 0, so its node-0 end is side Two.
    let out_a = first.half(Side::One).expect("side 1").departure_angle();
    let out_b = last.half(Side::Two).expect("side 2").departure_angle();
    assert!((out_a - PI / 6.0).abs() < 1e-9, "{out_a}");
    assert!((out_b + PI / 6.0).abs() < 1e-9, "{out_b}");
}

#[test]
fn middle_edge_of_odd_bundle_is_straight() {
    let d = load_basic();
    let middle = geometry(&d, "21");
    assert_eq!(middle.fork_offset, None);
    let half1 = middle.half1.as_ref().expect("side 1");
    let half2 = middle.half2.as_ref().expect("side 2");
    assert_eq!(half1.points.len(), 2);
    // Outer ring of a two-bus node: 2 × 30 − 2.5.
    assert_close(half1.start(), point(57.5, 0.0));
    assert_close(half2.start(), point(272.5, 0.0));
    assert_close(half1.end(), point(165.0, 0.0));
    assert_eq!(half1.end(), half2.end());
}

#[test]
fn transformer_halves_stop_short_of_the_middle() {
    let d = load_basic();
    let g = geometry(&d, "24");
    let half1 = g.half1.as_ref().expect("side 1");
    let half2 = g.half2.as_ref().expect("side 2");
    assert_close(half1.end(), point(0.0, 120.0));
    assert_close(half2.end(), point(0.0, 180.0));
    let Some(EdgeSymbol::Transformer { windings, radius }) = &g.symbol else {
        panic!("expected a transformer symbol, got {:?}", g.symbol);
    };
    assert_eq!(*radius, 20.0);
    assert_close(windings[0], point(0.0, 140.0));
    assert_close(windings[1], point(0.0, 160.0));
}

#[test]
fn hvdc_carries_a_converter_station() {
    let d = load_basic();
    let g = geometry(&d, "29");
    let Some(EdgeSymbol::ConverterStation { from, to }) = &g.symbol else {
        panic!("expected a converter station, got {:?}", g.symbol);
    };
    assert!((distance(*from, *to) - 70.0).abs() < 1e-9);
}

#[test]
fn dangling_line_ends_on_its_boundary_node() {
    let d = load_basic();
    let g = geometry(&d, "30");
    let Some(EdgeSymbol::Boundary { center, path }) = &g.symbol else {
        panic!("expected a boundary symbol, got {:?}", g.symbol);
    };
    assert_eq!(*center, point(-200.0, 250.0));
    assert!(path.starts_with('M'));
    assert_eq!(g.half2.as_ref().expect("side 2").start(), point(-200.0, 250.0));
}

#[test]
fn three_winding_legs_are_evenly_spread() {
    let d = load_basic();
    let center = point(150.0, 250.0);
    let mut leg_angles = Vec::new();
    for id in ["26", "27", "28"] {
        let g = geometry(&d, id);
        assert!(g.half2.is_none(), "leg {id} has no side 2");
        let half1 = g.half1.as_ref().expect("side 1");
        assert!((distance(half1.end(), center) - 32.0).abs() < 1e-9);
        let Some(EdgeSymbol::ThreeWindingLeg { winding, radius }) = &g.symbol else {
            panic!("expected a winding on leg {id}");
        };
        assert!((distance(*winding, center) - (32.0 - radius)).abs() < 1e-9);
        leg_angles.push(nadraw::geom::angle(center, half1.end()));
    }
    for i in 0..3 {
        for j in (i + 1)..3 {
            let gap = normalize_angle(leg_angles[i] - leg_angles[j]).abs();
            assert!((gap - 2.0 * PI / 3.0).abs() < 1e-9, "legs {i},{j}: {gap}");
        }
    }
}

fn assert_angle(actual: f64, expected: f64) {
    assert!(
        normalize_angle(actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn leg_angle(diagram: &Diagram, id: &str, center: Point) -> f64 {
    angle(center, geometry(diagram, id).half1.as_ref().expect("side 1").end())
}

#[test]
fn leg_after_the_closest_pair_keeps_its_direction() {
    let d = load_basic();
    let center = point(150.0, 250.0);
    // Legs towards nodes 3 and 2 are the closest pair; the leg towards node 1 comes next.
    let lead = angle(center, point(300.0, 0.0));
    assert_angle(leg_angle(&d, "26", center), lead);
    assert_angle(leg_angle(&d, "27", center), lead + 2.0 * PI / 3.0);
    assert_angle(leg_angle(&d, "28", center), lead + 4.0 * PI / 3.0);
}

#[test]
fn two_leg_transformer_leads_with_the_second_leg() {
    let d = Diagram::from_json_str(
        r#"{
          "nodes": [
            { "svgId": "a", "x": 100.0, "y": 0.0 },
            { "svgId": "b", "x": 0.0, "y": 100.0 },
            { "svgId": "t", "x": 0.0, "y": 0.0, "fictitious": true }
          ],
          "busNodes": [
            { "svgId": "a0", "nbNeighbours": 0, "index": 0, "vlNode": "a" },
            { "svgId": "b0", "nbNeighbours": 0, "index": 0, "vlNode": "b" }
          ],
          "edges": [
            { "svgId": "e1", "type": "ThreeWtEdge", "node1": "a", "node2": "t", "busNode1": "a0" },
            { "svgId": "e2", "type": "ThreeWtEdge", "node1": "b", "node2": "t", "busNode1": "b0" }
          ]
        }"#,
    )
    .expect("valid metadata");
    let center = point(0.0, 0.0);
    // Sorted legs: e1 at 0, e2 at π/2. The tightest gap ends on e2, which leads.
    assert_angle(leg_angle(&d, "e2", center), PI / 2.0);
    assert_angle(leg_angle(&d, "e1", center), PI / 2.0 + 2.0 * PI / 3.0);
    assert!(d.diagnostics().is_empty());
}

#[test]
fn zero_loop_aperture_falls_back_to_the_default() {
    let d = Diagram::from_json_str(
        r#"{
          "nodes": [
            { "svgId": "a", "x": 0.0, "y": 0.0 },
            { "svgId": "b", "x": 200.0, "y": 0.0 },
            { "svgId": "c", "x": 0.0, "y": 200.0 }
          ],
          "busNodes": [
            { "svgId": "a0", "nbNeighbours": 0, "index": 0, "vlNode": "a" },
            { "svgId": "b0", "nbNeighbours": 0, "index": 0, "vlNode": "b" },
            { "svgId": "c0", "nbNeighbours": 0, "index": 0, "vlNode": "c" }
          ],
          "edges": [
            { "svgId": "ab", "type": "LineEdge", "node1": "a", "node2": "b", "busNode1": "a0", "busNode2": "b0" },
            { "svgId": "ac", "type": "LineEdge", "node1": "a", "node2": "c", "busNode1": "a0", "busNode2": "c0" },
            { "svgId": "aa", "type": "LineEdge", "node1": "a", "node2": "a", "busNode1": "a0", "busNode2": "a0" }
          ],
          "svgParameters": { "loopEdgesAperture": 0, "edgesForkAperture": 0 }
        }"#,
    )
    .expect("valid metadata");
    assert_eq!(d.parameters().loop_edges_aperture, 60.0);
    let g = geometry(&d, "aa");
    let opening = normalize_angle(
        g.half2.as_ref().expect("side 2").departure_angle()
            - g.half1.as_ref().expect("side 1").departure_angle(),
    );
    assert!((opening - PI / 3.0).abs() < 1e-9, "{opening}");

    // Parameters set directly bypass the config filter; the loop is still placed.
    let params = DiagramParameters {
        loop_edges_aperture: 0.0,
        ..DiagramParameters::default()
    };
    let d = Diagram::with_parameters(d.metadata().clone(), params);
    let g = geometry(&d, "aa");
    let half1 = g.half1.as_ref().expect("side 1");
    assert!(half1.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
}

#[test]
fn edge_angle_reads_the_routed_halves() {
    let d = load_basic();
    let first = geometry(&d, "20");
    assert_eq!(
        d.edge_angle("20", Side::One).expect("known edge"),
        Some(first.half1.as_ref().expect("side 1").departure_angle())
    );
    assert_eq!(d.edge_angle("26", Side::Two).expect("known edge"), None);
    assert_eq!(d.edge_angle("33", Side::One).expect("known edge"), None);
    assert!(d.edge_angle("nope", Side::One).is_err());
    for entry in d.edge_angles() {
        assert_eq!(
            d.edge_angle(&entry.edge_id, entry.side).expect("known edge"),
            Some(entry.angle)
        );
    }
}

#[test]
fn bend_points_split_at_half_length() {
    let d = load_basic();
    let g = geometry(&d, "31");
    let half1 = g.half1.as_ref().expect("side 1");
    let half2 = g.half2.as_ref().expect("side 2");
    assert_close(half1.end(), point(300.0, 285.0));
    assert!(half2.points.contains(&point(300.0, 300.0)));
    assert!((half1.departure_angle() - PI / 2.0).abs() < 1e-12);
}

#[test]
fn self_loop_halves_open_by_the_loop_aperture() {
    let d = load_basic();
    let g = geometry(&d, "25");
    let half1 = g.half1.as_ref().expect("side 1");
    let half2 = g.half2.as_ref().expect("side 2");
    assert_eq!(half1.points.len(), 4);
    assert_eq!(half2.points.len(), 4);
    let opening = normalize_angle(half2.departure_angle() - half1.departure_angle());
    assert!((opening - PI / 3.0).abs() < 1e-9, "{opening}");
    assert!(matches!(g.symbol, Some(EdgeSymbol::Transformer { .. })));
}

#[test]
fn unknown_bus_side_starts_outside_the_node() {
    let d = load_basic();
    let g = geometry(&d, "32");
    let vl3 = d.node_position("2").expect("node 2");
    let start = g.half1.as_ref().expect("side 1").start();
    // Node radius 30 plus the unknown-bus extra radius.
    assert!((distance(start, vl3) - 40.0).abs() < 1e-9);
    assert!(matches!(g.symbol, Some(EdgeSymbol::PhaseShifter { .. })));
}

#[test]
fn undrawable_edges_are_reported_and_skipped() {
    let d = load_basic();
    assert!(d.edge_geometry("33").expect("known edge").is_none());
    assert!(d.edge_geometry("34").expect("known edge").is_none());
    assert!(d.diagnostics().contains(&Diagnostic::UnknownEdgeKind {
        edge_id: "33".to_string(),
        kind: "SwitchEdge".to_string(),
    }));
    assert!(d.diagnostics().contains(&Diagnostic::MissingMetadata {
        edge_id: "34".to_string(),
        reference: "99".to_string(),
    }));
    assert_eq!(d.diagnostics().len(), 2);
}

#[test]
fn rings_are_cut_by_lower_bus_edges() {
    let d = load_basic();
    assert!(matches!(
        d.bus_shape("10").expect("bus 10"),
        Some(BusShape::Circle { .. })
    ));
    // Edges 20 and 23 leave from bus 10 and cross bus 11.
    let Some(BusShape::Annulus { path }) = d.bus_shape("11").expect("bus 11") else {
        panic!("bus 11 should be an annulus");
    };
    assert_eq!(path.matches('Z').count(), 2);
}

#[test]
fn label_connector_starts_on_the_node_outline() {
    let d = load_basic();
    let g = d
        .text_node_geometry("40")
        .expect("text 40")
        .expect("routed label");
    assert_eq!(g.position, point(100.0, -40.0));
    assert_eq!(g.connector[1], point(100.0, -20.0));
    // Two-bus node: display radius 60.
    assert!((distance(g.connector[0], point(0.0, 0.0)) - 60.0).abs() < 1e-9);
}
