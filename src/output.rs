//! Output records for the host editor.
//!
//! These structs are serialized to JSON and handed to the front-end, which
//! moves its node items to `positions` and keeps `state` as the new graph state.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::layout::{apply_layout, LayoutConfig, LayoutReport};
use crate::state::{GraphState, Point};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub kind: &'static str,
    pub message: String,
}

impl From<&Error> for ErrorInfo {
    fn from(e: &Error) -> Self {
        Self { kind: e.kind(), message: e.to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutOutput {
    /// Input state with every node's `gui_state.pos` filled in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<GraphState>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub positions: BTreeMap<String, Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LayoutReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LayoutOutput {
    pub fn from_error(e: &Error) -> Self {
        Self { error: Some(e.into()), ..Self::default() }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": { "kind": "encode", "message": e.to_string() } }).to_string()
        })
    }
}

/// Lay out a JSON graph state. `config_json` may be absent or blank for defaults.
pub fn layout_state_json(state_json: &str, config_json: Option<&str>) -> LayoutOutput {
    run_layout(state_json, config_json).unwrap_or_else(|e| {
        warn!(error = %e, "layout request rejected");
        LayoutOutput::from_error(&e)
    })
}

fn run_layout(state_json: &str, config_json: Option<&str>) -> Result<LayoutOutput> {
    let mut state = GraphState::from_json(state_json)?;
    let cfg = match config_json {
        Some(c) if !c.trim().is_empty() => LayoutConfig::from_json(c)?,
        _ => LayoutConfig::default(),
    };

    let report = apply_layout(&mut state, &cfg);
    let positions = state
        .nodes
        .keys()
        .filter_map(|name| state.position(name).map(|p| (name.clone(), p)))
        .collect();

    Ok(LayoutOutput { state: Some(state), positions, report: Some(report), error: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_layout_state_json_fills_positions() {
        let input = json!({
            "nodes": { "in": {}, "mid": {}, "out": {} },
            "connects": [
                [["in", "outputs", "x"], ["mid", "inputs", "x"]],
                [["mid", "outputs", "y"], ["out", "inputs", "y"]],
            ],
            "anchors": { "in": "input", "out": "output" },
        });

        let out = layout_state_json(&input.to_string(), None);
        assert!(out.error.is_none());
        assert_eq!(out.positions.len(), 3);

        let json: Value = serde_json::from_str(&out.to_json()).unwrap();
        assert_eq!(json["state"]["gui_state"]["in"]["pos"], json!([0.0, 0.0]));
        assert_eq!(json["report"]["anchored_clusters"], json!(1));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_bad_state_reports_error() {
        let out = layout_state_json("not json", None);
        let err = out.error.as_ref().expect("error expected");
        assert_eq!(err.kind, "invalid_state");
        assert!(out.state.is_none());

        let json: Value = serde_json::from_str(&out.to_json()).unwrap();
        assert_eq!(json["error"]["kind"], json!("invalid_state"));
        assert!(json.get("positions").is_none());
    }

    #[test]
    fn test_bad_config_reports_error() {
        let out = layout_state_json("{}", Some("{\"max_iterations\": \"many\"}"));
        assert_eq!(out.error.map(|e| e.kind), Some("invalid_config"));
    }

    #[test]
    fn test_blank_config_means_defaults() {
        let out = layout_state_json(r#"{ "nodes": { "solo": {} } }"#, Some("  "));
        assert!(out.error.is_none());
        assert_eq!(out.positions["solo"], Point::new(0.0, 0.0));
    }
}
