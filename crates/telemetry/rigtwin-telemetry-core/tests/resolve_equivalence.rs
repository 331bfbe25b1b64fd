use rigtwin_telemetry::{
    json::{parse_sequence, sequence_from_value},
    resolve, DataPath, ResolveError, TelemetrySnapshot,
};

fn paths(keys: &[&str]) -> Vec<DataPath> {
    keys.iter().map(|k| DataPath::parse(k).unwrap()).collect()
}

#[test]
fn flattened_fixture_resolves_like_nested_fixture() {
    let nested = parse_sequence(&rigtwin_test_fixtures::telemetry::json("arm6-sweep").unwrap())
        .expect("nested sweep parses");
    let flat = parse_sequence(&rigtwin_test_fixtures::telemetry::json("arm6-sweep-flat").unwrap())
        .expect("flat sweep parses");
    assert_eq!(nested.len(), flat.len());

    let keys = paths(&[
        "root.joints.j1",
        "root.joints.j2",
        "root.joints.j3",
        "root.joints.j4",
        "root.joints.j5",
        "root.joints.j6",
    ]);
    for (n, f) in nested.iter().zip(flat.iter()) {
        for p in &keys {
            assert_eq!(resolve(n, p), resolve(f, p), "path {p}");
        }
    }
}

#[test]
fn flatten_preserves_resolution_for_every_leaf() {
    let value: serde_json::Value = serde_json::json!({
        "robot": {
            "arm": { "j1": 12.5, "j2": -3 },
            "gripper.width": 0.04,
            "tool": { "tcp": { "x": 1, "y": 2 } }
        },
        "mode": "7",
        "enabled": true,
        "list": [1, { "inner": 9 }]
    });
    let nested: TelemetrySnapshot = serde_json::from_value(value).unwrap();
    let flat = nested.flatten();

    for p in paths(&[
        "root.robot.arm.j1",
        "root.robot.arm.j2",
        "root.robot.gripper.width",
        "root.robot.tool.tcp.x",
        "root.robot.tool.tcp.y",
        "root.mode",
        "root.enabled",
        "root.list.0",
        "root.list.1.inner",
        "root.robot.missing",
        "root.robot.arm",
    ]) {
        assert_eq!(resolve(&flat, &p).ok(), resolve(&nested, &p).ok(), "path {p}");
    }
}

#[test]
fn mixed_representation_frames() {
    let frames =
        parse_sequence(&rigtwin_test_fixtures::telemetry::json("gantry-mixed").unwrap()).unwrap();
    let x = DataPath::parse("root.axes.x").unwrap();
    let z = DataPath::parse("root.axes.z").unwrap();
    let c = DataPath::parse("root.head.c").unwrap();

    assert_eq!(resolve(&frames[1], &x), Ok(120.5));
    assert_eq!(resolve(&frames[1], &z), Ok(-10.0));
    assert_eq!(resolve(&frames[1], &c), Ok(45.0));
    assert_eq!(resolve(&frames[2], &x), Ok(200.0));
    assert_eq!(resolve(&frames[2], &z), Ok(-25.0));
    assert_eq!(resolve(&frames[2], &c), Ok(90.0));

    assert!(matches!(
        resolve(&frames[3], &z),
        Err(ResolveError::MissingTelemetryPath { .. })
    ));
    assert!(matches!(
        resolve(&frames[3], &c),
        Err(ResolveError::InvalidNumericValue { found: "null", .. })
    ));
}

#[test]
fn envelope_without_frames_is_single_snapshot() {
    let seq = sequence_from_value(serde_json::json!({"joints": {"j1": 1}})).unwrap();
    assert_eq!(seq.len(), 1);
}
