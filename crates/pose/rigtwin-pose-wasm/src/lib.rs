use js_sys::JSON;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use rigtwin_pose_core::{
    Config, NodeId, NodeTransform, PoseRecord, RuleTable, SceneDesc, SceneGraph, SceneTree,
    SequenceCfg, SequenceId, TaskId, TwinDriver,
};
use rigtwin_telemetry::json::{parse_sequence, parse_snapshot};
use rigtwin_telemetry::TelemetrySnapshot;

/// A driver plus the in-memory scene it poses. Hosts mirror `update` changes
/// onto their own renderer.
#[wasm_bindgen]
pub struct RigTwin {
    driver: TwinDriver,
    scene: SceneTree,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

// The core JSON parsers take text, so objects go through JSON.stringify.
fn stringify(label: &str, value: &JsValue) -> Result<String, JsError> {
    if jsvalue_is_undefined_or_null(value) {
        return Err(JsError::new(&format!("{label}: value is null/undefined")));
    }
    JSON::stringify(value)
        .map_err(|e| JsError::new(&format!("{label} stringify error: {:?}", e)))?
        .as_string()
        .ok_or_else(|| JsError::new(&format!("{label}: stringify produced non-string")))
}

fn snapshot(label: &str, value: &JsValue) -> Result<TelemetrySnapshot, JsError> {
    parse_snapshot(&stringify(label, value)?)
        .map_err(|e| JsError::new(&format!("{label} parse error: {e}")))
}

fn to_js<T: Serialize>(label: &str, value: &T) -> Result<JsValue, JsError> {
    swb::to_value(value).map_err(|e| JsError::new(&format!("{label} error: {e}")))
}

#[wasm_bindgen]
impl RigTwin {
    /// Create a driver with an empty scene. Pass a config object or undefined/null for defaults.
    /// Example:
    ///   new RigTwin({ default_duration_ms: 250 })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<RigTwin, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(RigTwin {
            driver: TwinDriver::new(cfg).map_err(|e| JsError::new(&format!("config error: {e}")))?,
            scene: SceneTree::new(),
        })
    }

    /// Replace the rule table (`{ archetype: [rule, ...] }`). Returns the archetype count.
    #[wasm_bindgen(js_name = load_rules)]
    pub fn load_rules(&mut self, rules: JsValue) -> Result<u32, JsError> {
        let table = RuleTable::from_json_str(&stringify("load_rules", &rules)?)
            .map_err(|e| JsError::new(&format!("load_rules: {e}")))?;
        let count = table.len() as u32;
        self.driver.set_rules(table);
        Ok(count)
    }

    /// Add one node. `transform` is optional `{ position, rotation, scale }`. Returns its NodeId.
    #[wasm_bindgen(js_name = add_node)]
    pub fn add_node(
        &mut self,
        name: String,
        parent: Option<u32>,
        transform: JsValue,
    ) -> Result<u32, JsError> {
        let transform: NodeTransform = if jsvalue_is_undefined_or_null(&transform) {
            NodeTransform::default()
        } else {
            swb::from_value(transform)
                .map_err(|e| JsError::new(&format!("add_node transform error: {e}")))?
        };
        self.scene
            .add_node(name, parent.map(NodeId), transform)
            .map(|id| id.0)
            .map_err(|e| JsError::new(&format!("add_node: {e}")))
    }

    /// Add a whole model from a scene description. Returns the model root's NodeId.
    #[wasm_bindgen(js_name = load_model)]
    pub fn load_model(&mut self, desc: JsValue, parent: Option<u32>) -> Result<u32, JsError> {
        let desc: SceneDesc =
            swb::from_value(desc).map_err(|e| JsError::new(&format!("load_model parse error: {e}")))?;
        self.scene
            .instantiate(&desc, parent.map(NodeId))
            .map(|id| id.0)
            .map_err(|e| JsError::new(&format!("load_model: {e}")))
    }

    /// Declare the ordered joint names captured for the model at `root`.
    #[wasm_bindgen(js_name = set_hierarchy)]
    pub fn set_hierarchy(&mut self, root: u32, names: Vec<String>) -> Result<(), JsError> {
        self.scene
            .set_hierarchy(NodeId(root), names)
            .map_err(|e| JsError::new(&format!("set_hierarchy: {e}")))
    }

    /// Snap the model at `root` to `snapshot`. Returns `{ writes, skipped }`.
    #[wasm_bindgen(js_name = apply_pose)]
    pub fn apply_pose(
        &mut self,
        root: u32,
        archetype: String,
        snapshot_json: JsValue,
    ) -> Result<JsValue, JsError> {
        let snap = snapshot("apply_pose", &snapshot_json)?;
        let report = self
            .driver
            .apply_pose_archetype(&mut self.scene, NodeId(root), &archetype, &snap)
            .map_err(|e| JsError::new(&format!("apply_pose: {e}")))?;
        to_js("apply_pose report", &report)
    }

    /// Schedule tweens from `prev` to `cur`. Returns `{ scheduled, skipped, unchanged }`.
    #[wasm_bindgen]
    pub fn twin(
        &mut self,
        root: u32,
        archetype: String,
        prev_json: JsValue,
        cur_json: JsValue,
        duration_ms: Option<f64>,
    ) -> Result<JsValue, JsError> {
        let prev = snapshot("twin prev", &prev_json)?;
        let cur = snapshot("twin cur", &cur_json)?;
        let report = self
            .driver
            .twin_archetype(&self.scene, NodeId(root), &archetype, &prev, &cur, duration_ms)
            .map_err(|e| JsError::new(&format!("twin: {e}")))?;
        to_js("twin report", &report)
    }

    /// Start chained playback. `frames` is an array or `{ frames: [...] }`; `cfg` is optional
    /// `{ cadence_ms, duration_ms? }`. Returns a SequenceId (u32).
    #[wasm_bindgen(js_name = play_sequence)]
    pub fn play_sequence(
        &mut self,
        root: u32,
        archetype: String,
        frames: JsValue,
        cfg: JsValue,
    ) -> Result<u32, JsError> {
        let frames = parse_sequence(&stringify("play_sequence", &frames)?)
            .map_err(|e| JsError::new(&format!("play_sequence parse error: {e}")))?;
        let cfg: Option<SequenceCfg> = if jsvalue_is_undefined_or_null(&cfg) {
            None
        } else {
            Some(
                swb::from_value(cfg)
                    .map_err(|e| JsError::new(&format!("sequence cfg error: {e}")))?,
            )
        };
        self.driver
            .play_sequence_archetype(NodeId(root), &archetype, frames, cfg)
            .map(|id| id.0)
            .map_err(|e| JsError::new(&format!("play_sequence: {e}")))
    }

    #[wasm_bindgen(js_name = cancel_sequence)]
    pub fn cancel_sequence(&mut self, id: u32) -> bool {
        self.driver.cancel_sequence(SequenceId(id))
    }

    #[wasm_bindgen(js_name = cancel_task)]
    pub fn cancel_task(&mut self, id: u32) -> bool {
        self.driver.cancel_task(TaskId(id))
    }

    /// Advance by `dt_ms` milliseconds. Returns Outputs `{ changes, events }`.
    #[wasm_bindgen]
    pub fn update(&mut self, dt_ms: f64) -> Result<JsValue, JsError> {
        let out = self.driver.update(dt_ms, &mut self.scene);
        to_js("outputs", out)
    }

    /// Capture the model at `root` as an array of pose records.
    #[wasm_bindgen(js_name = capture_pose)]
    pub fn capture_pose(&self, root: u32) -> Result<JsValue, JsError> {
        let records = self.driver.capture_pose(&self.scene, NodeId(root));
        to_js("capture_pose", &records)
    }

    /// Write captured records back onto the model at `root`. Returns `{ restored, missing }`.
    #[wasm_bindgen(js_name = restore_pose)]
    pub fn restore_pose(&mut self, root: u32, records: JsValue) -> Result<JsValue, JsError> {
        let records: Vec<PoseRecord> = swb::from_value(records)
            .map_err(|e| JsError::new(&format!("restore_pose parse error: {e}")))?;
        let report = self
            .driver
            .restore_pose(&mut self.scene, NodeId(root), &records);
        to_js("restore_pose report", &report)
    }

    #[wasm_bindgen(js_name = find_node)]
    pub fn find_node(&self, root: u32, name: String) -> Option<u32> {
        self.scene.find_node(NodeId(root), &name).map(|id| id.0)
    }

    /// Local transform of `name` under `root`, or null when absent.
    #[wasm_bindgen(js_name = node_transform)]
    pub fn node_transform(&self, root: u32, name: String) -> Result<JsValue, JsError> {
        match self
            .scene
            .find_node(NodeId(root), &name)
            .and_then(|id| self.scene.transform(id))
        {
            Some(t) => to_js("node_transform", t),
            None => Ok(JsValue::NULL),
        }
    }

    /// Column-major world matrix of `name` under `root`.
    #[wasm_bindgen(js_name = world_matrix)]
    pub fn world_matrix(&self, root: u32, name: String) -> Option<Vec<f64>> {
        let id = self.scene.find_node(NodeId(root), &name)?;
        self.scene.world_matrix(id).map(|m| m.to_vec())
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
