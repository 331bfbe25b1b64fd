use rigtwin_pose_core::{
    capture_pose, restore_pose, NodeId, PoseRecord, RuleTable, SceneDesc, SceneGraph, SceneTree,
    SequenceCfg, SkipReason, TelemetrySnapshot, TwinDriver, TwinEvent,
};
use rigtwin_telemetry::json::parse_sequence;

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn machines() -> RuleTable {
    let text = rigtwin_test_fixtures::rules::json("machines").expect("machines fixture");
    RuleTable::from_json_str(&text).expect("machines rule table")
}

fn scene(name: &str) -> (SceneTree, NodeId) {
    let desc: SceneDesc = rigtwin_test_fixtures::scenes::load(name).expect("scene fixture");
    SceneTree::from_desc(&desc).expect("scene builds")
}

fn frames(name: &str) -> Vec<TelemetrySnapshot> {
    let text = rigtwin_test_fixtures::telemetry::json(name).expect("telemetry fixture");
    parse_sequence(&text).expect("telemetry parses")
}

fn assert_poses_close(a: &[PoseRecord], b: &[PoseRecord]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_eq!(x.node_name, y.node_name);
        for (u, v) in [
            (x.rotation.x, y.rotation.x),
            (x.rotation.y, y.rotation.y),
            (x.rotation.z, y.rotation.z),
            (x.position.x, y.position.x),
            (x.position.y, y.position.y),
            (x.position.z, y.position.z),
        ] {
            approx(u, v, 1e-9);
        }
        for (u, v) in x.world_matrix.iter().zip(y.world_matrix.iter()) {
            approx(*u, *v, 1e-9);
        }
    }
}

#[test]
fn arm6_apply_maps_sign_unit_and_offset() {
    let table = machines();
    let (mut tree, root) = scene("arm6");
    let sweep = frames("arm6-sweep");

    let report = rigtwin_pose_core::apply_pose(&mut tree, root, table.require("arm6").unwrap(), &sweep[1]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.writes.len(), 6);

    let rot = |name: &str| tree.transform(tree.find_node(root, name).unwrap()).unwrap().rotation;
    approx(rot("base").y, 90f64.to_radians(), 1e-12);
    approx(rot("shoulder").z, -15f64.to_radians(), 1e-12);
    approx(rot("elbow").z, -30f64.to_radians() + std::f64::consts::FRAC_PI_2, 1e-12);
    approx(rot("wrist2").z, 45f64.to_radians(), 1e-12);
    assert_eq!(rot("wrist3").x, 0.5);
}

#[test]
fn arm6_capture_follows_declared_hierarchy_and_restores_onto_copy() {
    let table = machines();
    let (mut tree, root) = scene("arm6");
    let pristine = tree.clone();
    let sweep = frames("arm6-sweep");

    rigtwin_pose_core::apply_pose(&mut tree, root, table.require("arm6").unwrap(), &sweep[2]);
    let captured = capture_pose(&tree, root);
    let names: Vec<&str> = captured.iter().map(|r| r.node_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["base", "shoulder", "elbow", "wrist1", "wrist2", "wrist3"]
    );

    let mut copy = pristine;
    let restored = restore_pose(&mut copy, root, &captured);
    assert_eq!(restored.restored.len(), 6);
    assert!(restored.missing.is_empty());
    assert_poses_close(&capture_pose(&copy, root), &captured);
}

#[test]
fn arm6_sequence_converges_to_last_frame() {
    let table = machines();
    let (mut tree, root) = scene("arm6");
    let (mut expected, _) = scene("arm6");
    let sweep = frames("arm6-sweep");
    let rules = table.require("arm6").unwrap();
    rigtwin_pose_core::apply_pose(&mut expected, root, rules, &sweep[3]);

    let mut driver = TwinDriver::default().with_rules(table.clone());
    driver.apply_pose_archetype(&mut tree, root, "arm6", &sweep[0]).unwrap();
    let id = driver
        .play_sequence_archetype(root, "arm6", sweep, Some(SequenceCfg::new(100.0)))
        .unwrap();

    let mut steps = 0;
    for _ in 0..8 {
        let out = driver.update(100.0, &mut tree);
        steps += out
            .events
            .iter()
            .filter(|e| matches!(e, TwinEvent::SequenceStep { sequence, .. } if *sequence == id))
            .count();
    }
    assert_eq!(steps, 3);
    assert!(driver.interpolator().is_empty());
    assert_poses_close(&capture_pose(&tree, root), &capture_pose(&expected, root));
}

#[test]
fn gantry_mixed_frames_resolve_or_skip() {
    let table = machines();
    let rules = table.require("gantry").unwrap();
    let (mut tree, root) = scene("gantry");
    let mixed = frames("gantry-mixed");

    let report = rigtwin_pose_core::apply_pose(&mut tree, root, rules, &mixed[1]);
    assert!(report.skipped.is_empty());
    let t = |tree: &SceneTree, name: &str| *tree.transform(tree.find_node(root, name).unwrap()).unwrap();
    assert_eq!(t(&tree, "carriage").position.x, 120.5);
    assert_eq!(t(&tree, "bridge").position.z, -40.0);
    assert_eq!(t(&tree, "spindle").position.y, -9.75);
    approx(t(&tree, "head").rotation.y, 45f64.to_radians(), 1e-12);

    let report = rigtwin_pose_core::apply_pose(&mut tree, root, rules, &mixed[3]);
    assert_eq!(report.writes.len(), 1);
    assert_eq!(t(&tree, "carriage").position.x, 200.0);
    let reasons: Vec<(String, SkipReason)> = report
        .skipped
        .iter()
        .map(|s| (s.node_name.clone(), s.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("bridge".to_string(), SkipReason::MissingTelemetryPath),
            ("spindle".to_string(), SkipReason::MissingTelemetryPath),
            ("head".to_string(), SkipReason::InvalidNumericValue),
        ]
    );
    // skipped joints keep their previous pose
    assert_eq!(t(&tree, "bridge").position.z, -40.0);
}

#[test]
fn gantry_capture_without_hierarchy_walks_whole_model() {
    let (tree, root) = scene("gantry");
    let names: Vec<String> = capture_pose(&tree, root)
        .into_iter()
        .map(|r| r.node_name)
        .collect();
    assert_eq!(
        names,
        vec!["gantry", "frame", "bridge", "carriage", "spindle", "head"]
    );
}

#[test]
fn two_models_with_shared_joint_names_stay_separate() {
    let desc: SceneDesc = rigtwin_test_fixtures::scenes::load("arm6").unwrap();
    let mut tree = SceneTree::new();
    let left = tree.instantiate(&desc, None).unwrap();
    let right = tree.instantiate(&desc, None).unwrap();
    let table = machines();
    let sweep = frames("arm6-sweep");

    rigtwin_pose_core::apply_pose(&mut tree, left, table.require("arm6").unwrap(), &sweep[2]);
    let base_left = tree.find_node(left, "base").unwrap();
    let base_right = tree.find_node(right, "base").unwrap();
    assert_ne!(base_left, base_right);
    approx(tree.transform(base_left).unwrap().rotation.y, std::f64::consts::PI, 1e-12);
    assert_eq!(tree.transform(base_right).unwrap().rotation.y, 0.0);
}
