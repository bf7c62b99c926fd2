use nadraw::geom::point;
use nadraw::{BusShape, Diagnostic, Diagram, DragTarget, EdgeSymbol, PointerOutcome};
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

fn assert_matches_batch(diagram: &Diagram) {
    let batch = Diagram::new(diagram.metadata().clone());
    assert_eq!(diagram.snapshot(), batch.snapshot());
    assert_eq!(diagram.edge_angles(), batch.edge_angles());
}

#[test]
fn incremental_redraw_matches_batch_after_each_move() {
    let mut d = load_basic();
    let moves = [
        ("2", point(-395.1338734, -352.76892014)),
        ("3", point(40.0, 360.5)),
        ("0", point(-20.004, 15.996)),
        ("4", point(180.0, 200.0)),
        ("5", point(-260.0, 330.0)),
        ("1", point(310.0, 90.0)),
    ];
    for (id, to) in moves {
        d.move_node(id, to).expect("known node");
        assert_matches_batch(&d);
    }
}

fn assert_finite(diagram: &Diagram) {
    let snapshot = diagram.snapshot();
    for (id, g) in &snapshot.edges {
        for half in [&g.half1, &g.half2].into_iter().flatten() {
            assert!(
                half.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()),
                "edge {id}: {:?}",
                half.points
            );
        }
        match &g.symbol {
            Some(EdgeSymbol::Boundary { path, .. }) => assert!(!path.contains("NaN"), "edge {id}"),
            Some(EdgeSymbol::Transformer { windings, .. } | EdgeSymbol::PhaseShifter { windings, .. }) => {
                assert!(windings.iter().all(|p| p.x.is_finite() && p.y.is_finite()), "edge {id}");
            }
            _ => {}
        }
    }
    for (id, bus) in &snapshot.buses {
        if let BusShape::Annulus { path } = bus {
            assert!(!path.contains("NaN") && !path.contains("inf"), "bus {id}: {path}");
        }
    }
    for (id, text) in &snapshot.text_nodes {
        assert!(
            text.connector.iter().all(|p| p.x.is_finite() && p.y.is_finite()),
            "text {id}"
        );
    }
}

#[test]
fn dragging_onto_a_neighbour_reports_a_degenerate_edge() {
    let mut d = load_basic();
    d.pointer_down(DragTarget::Node("1".to_string()), point(300.0, 0.0))
        .expect("known node");
    d.pointer_move(point(0.0, 0.0)).expect("move");
    assert!(matches!(d.pointer_up(), Some(PointerOutcome::NodeMoved(_))));
    assert_eq!(d.node_position("1").expect("node"), point(0.0, 0.0));

    // The parallel bundle between nodes 0 and 1 reports on its first edge.
    let degenerate = Diagnostic::DegenerateEdge {
        edge_id: "20".to_string(),
    };
    assert!(d.diagnostics().contains(&degenerate));
    assert_finite(&d);
    assert_matches_batch(&d);

    let batch = Diagram::new(d.metadata().clone());
    assert!(batch.diagnostics().contains(&degenerate));
}

#[test]
fn move_only_touches_the_moved_node_neighbourhood() {
    let mut d = load_basic();
    let before = d.snapshot();
    // Node 5 is the boundary end of dangling line 30 only; the self-loop 25 on the other end is
    // re-slotted around the new angle.
    let report = d.move_node("5", point(-250.0, 260.0)).expect("known node");
    assert_eq!(report.edges, vec!["30".to_string(), "25".to_string()]);
    // Node 3 owns three buses; their rings are rebuilt.
    assert_eq!(
        report.buses,
        vec!["14".to_string(), "15".to_string(), "16".to_string()]
    );

    let after = d.snapshot();
    for (id, geometry) in &before.edges {
        if id != "30" && id != "25" {
            assert_eq!(Some(geometry), after.edges.get(id), "edge {id} changed");
        }
    }
}

#[test]
fn drag_stores_rounded_position_and_reports_origin() {
    let mut d = load_basic();
    d.pointer_down(DragTarget::Node("2".to_string()), point(-452.59, -274.01))
        .expect("known node");
    assert!(!d.is_dragging());
    let report = d
        .pointer_move(point(-395.1338734, -352.76892014))
        .expect("move")
        .expect("drag in progress");
    assert!(report.edges.iter().any(|e| e == "23"));
    assert!(d.is_dragging());

    let Some(PointerOutcome::NodeMoved(moved)) = d.pointer_up() else {
        panic!("expected a move event");
    };
    assert_eq!(moved.id, "2");
    assert_eq!(moved.equipment_id, "VL3");
    assert_eq!((moved.x, moved.y), (-395.13, -352.77));
    assert_eq!((moved.x_orig, moved.y_orig), (-452.59, -274.01));
    assert_eq!(d.node_position("2").expect("node"), point(-395.13, -352.77));
    assert!(!d.is_dragging());
    assert_matches_batch(&d);
}

#[test]
fn press_without_move_selects() {
    let mut d = load_basic();
    d.pointer_down(DragTarget::Node("0".to_string()), point(3.0, 4.0))
        .expect("known node");
    let Some(PointerOutcome::Selected(sel)) = d.pointer_up() else {
        panic!("expected a selection");
    };
    assert_eq!(sel.id, "0");
    assert_eq!(sel.equipment_id, "VL1");
    assert_eq!(d.node_position("0").expect("node"), point(0.0, 0.0));
}

#[test]
fn pointer_events_without_press_are_ignored() {
    let mut d = load_basic();
    assert!(d.pointer_move(point(1.0, 1.0)).expect("move").is_none());
    assert!(d.pointer_up().is_none());
    assert!(d.pointer_leave().is_none());
}

#[test]
fn grab_offset_is_kept_during_drag() {
    let mut d = load_basic();
    // Grabbed 10px right of the center.
    d.pointer_down(DragTarget::Node("1".to_string()), point(310.0, 0.0))
        .expect("known node");
    d.pointer_move(point(410.0, 50.0)).expect("move");
    assert_eq!(d.node_position("1").expect("node"), point(400.0, 50.0));
}

#[test]
fn leaving_the_canvas_commits_the_drag() {
    let mut d = load_basic();
    d.pointer_down(DragTarget::Node("3".to_string()), point(0.0, 300.0))
        .expect("known node");
    d.pointer_move(point(20.0, 320.0)).expect("move");
    let Some(PointerOutcome::NodeMoved(moved)) = d.pointer_leave() else {
        panic!("expected the drag to be committed");
    };
    assert_eq!((moved.x, moved.y), (20.0, 320.0));
    assert!(!d.is_dragging());
}

#[test]
fn text_node_drag_updates_shifts_and_connector() {
    let mut d = load_basic();
    d.pointer_down(DragTarget::TextNode("40".to_string()), point(100.0, -40.0))
        .expect("known text node");
    d.pointer_move(point(-200.0, 0.0)).expect("move");
    let Some(PointerOutcome::TextNodeMoved(moved)) = d.pointer_up() else {
        panic!("expected a text move event");
    };
    assert_eq!(moved.vl_node_id, "0");
    assert_eq!((moved.shift_x, moved.shift_y), (-200.0, 0.0));
    assert_eq!((moved.shift_x_orig, moved.shift_y_orig), (100.0, -40.0));
    // Label now sits left of the node: anchor on the middle of its right side.
    assert_eq!(
        (moved.connection_shift_x, moved.connection_shift_y),
        (100.0, 20.0)
    );
    assert_eq!(
        (moved.connection_shift_x_orig, moved.connection_shift_y_orig),
        (0.0, 20.0)
    );

    let g = d
        .text_node_geometry("40")
        .expect("text 40")
        .expect("routed label");
    assert_eq!(g.position, point(-200.0, 0.0));
    assert_eq!(g.connector[1], point(-100.0, 20.0));
    assert_matches_batch(&d);
}

#[test]
fn moving_a_node_carries_its_label() {
    let mut d = load_basic();
    let report = d.move_node("2", point(-400.0, -300.0)).expect("known node");
    assert_eq!(report.text_nodes, vec!["41".to_string()]);
    let g = d
        .text_node_geometry("41")
        .expect("text 41")
        .expect("routed label");
    assert_eq!(g.position, point(-550.0, -360.0));
}

#[test]
fn unknown_ids_are_errors() {
    let mut d = load_basic();
    assert!(matches!(
        d.move_node("nope", point(0.0, 0.0)),
        Err(nadraw::Error::UnknownNode { .. })
    ));
    assert!(matches!(
        d.pointer_down(DragTarget::TextNode("nope".to_string()), point(0.0, 0.0)),
        Err(nadraw::Error::UnknownTextNode { .. })
    ));
}
