//! Graph-state record exchanged with the external graph model.
//!
//! The layout engine reads `nodes`, `connects` and `anchors`, and writes only
//! `gui_state[..].pos`. Everything else is carried through untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A 2D canvas coordinate. Serialized as `[x, y]`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// One side of a connection: `[node, component, terminal, ...]` on the wire.
///
/// The address elements below the node are kept as given and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Endpoint {
    pub node: String,
    /// Address below the node, e.g. `["outputs", "image"]`.
    pub path: Vec<String>,
}

impl Endpoint {
    pub fn new<I, S>(node: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { node: node.into(), path: path.into_iter().map(Into::into).collect() }
    }

    /// Terminal name as the editor keys it, e.g. `inputs/image`.
    pub fn port(&self) -> String {
        self.path.join("/")
    }
}

impl From<Vec<String>> for Endpoint {
    fn from(parts: Vec<String>) -> Self {
        let mut parts = parts.into_iter();
        let node = parts.next().unwrap_or_default();
        Self { node, path: parts.collect() }
    }
}

impl From<Endpoint> for Vec<String> {
    fn from(e: Endpoint) -> Self {
        let mut out = Vec::with_capacity(e.path.len() + 1);
        out.push(e.node);
        out.extend(e.path);
        out
    }
}

/// A directed connection from an output terminal to an input terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Endpoint, Endpoint)", into = "(Endpoint, Endpoint)")]
pub struct Connection {
    pub source: Endpoint,
    pub target: Endpoint,
}

impl From<(Endpoint, Endpoint)> for Connection {
    fn from((source, target): (Endpoint, Endpoint)) -> Self {
        Self { source, target }
    }
}

impl From<Connection> for (Endpoint, Endpoint) {
    fn from(c: Connection) -> Self {
        (c.source, c.target)
    }
}

/// How a connection curve is drawn into an input terminal.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineShape {
    Line,
    #[default]
    Cubic,
}

impl LineShape {
    pub fn toggle(self) -> Self {
        match self {
            LineShape::Line => LineShape::Cubic,
            LineShape::Cubic => LineShape::Line,
        }
    }
}

/// Per-node editor record.
///
/// `pos` is written by the layout engine and by explicit position edits;
/// `linestyle` belongs to the editor and is never touched by layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuiState {
    #[serde(default)]
    pub pos: Option<Point>,
    /// Input terminal name -> curve shape.
    #[serde(default)]
    pub linestyle: BTreeMap<String, LineShape>,
}

impl GuiState {
    pub fn line_shape(&self, terminal: &str) -> LineShape {
        self.linestyle.get(terminal).copied().unwrap_or_default()
    }

    /// Flip the curve shape of an input terminal and return the new shape.
    pub fn toggle_line_shape(&mut self, terminal: &str) -> LineShape {
        let shape = self.line_shape(terminal).toggle();
        self.linestyle.insert(terminal.to_string(), shape);
        shape
    }
}

/// Which boundary column an anchor node belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorRole {
    /// Left column: where data enters the graph.
    #[serde(alias = "left")]
    Input,
    /// Right column: where data leaves the graph.
    #[serde(alias = "right")]
    Output,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    /// Node name -> node parameters (opaque here).
    #[serde(default)]
    pub nodes: BTreeMap<String, Value>,
    #[serde(default)]
    pub connects: Vec<Connection>,
    #[serde(default)]
    pub gui_state: BTreeMap<String, GuiState>,
    #[serde(default)]
    pub anchors: BTreeMap<String, AnchorRole>,
    /// Fields owned by the graph model that layout does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphState {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(Error::InvalidState)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Encode)
    }

    pub fn add_node(&mut self, name: impl Into<String>) -> &mut Self {
        self.nodes.entry(name.into()).or_insert_with(|| Value::Object(Map::new()));
        self
    }

    pub fn add_anchor(&mut self, name: impl Into<String>, role: AnchorRole) -> &mut Self {
        let name = name.into();
        self.add_node(name.clone());
        self.anchors.insert(name, role);
        self
    }

    pub fn connect(&mut self, source: Endpoint, target: Endpoint) -> &mut Self {
        self.connects.push(Connection { source, target });
        self
    }

    /// Stored position of a node, if it has one.
    pub fn position(&self, name: &str) -> Option<Point> {
        self.gui_state.get(name).and_then(|g| g.pos)
    }

    /// Node names in the order the editor instantiates their items:
    /// by x position, unpositioned nodes last, ties broken by name.
    pub fn nodes_by_x(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_by(|a, b| {
            let xa = self.position(a).map(|p| p.x).unwrap_or(f64::INFINITY);
            let xb = self.position(b).map(|p| p.x).unwrap_or(f64::INFINITY);
            xa.total_cmp(&xb).then_with(|| a.cmp(b))
        });
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_addresses_strip_to_node() {
        let state: GraphState = serde_json::from_value(json!({
            "nodes": { "cam": {}, "env/observations": {} },
            "connects": [[["cam", "outputs", "image"], ["env/observations", "inputs", "image"]]],
        }))
        .unwrap();

        let c = &state.connects[0];
        assert_eq!(c.source.node, "cam");
        assert_eq!(c.source.port(), "outputs/image");
        assert_eq!(c.target.node, "env/observations");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let input = json!({
            "nodes": { "a": { "rate": 10 } },
            "backend": "single_process",
            "gui_state": { "a": { "pos": [1.0, 2.0], "linestyle": { "in": "line" } } },
        });
        let state: GraphState = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(state.extra.get("backend"), Some(&json!("single_process")));
        assert_eq!(state.position("a"), Some(Point::new(1.0, 2.0)));

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["backend"], input["backend"]);
        assert_eq!(back["gui_state"]["a"]["pos"], json!([1.0, 2.0]));
        assert_eq!(back["nodes"]["a"]["rate"], json!(10));
    }

    #[test]
    fn test_connection_addresses_are_written_back_verbatim() {
        let connects = json!([[["a", "outputs", "x/y"], ["b", "inputs", "z"]], [["c"], ["b"]]]);
        let parsed: Vec<Connection> = serde_json::from_value(connects.clone()).unwrap();

        assert_eq!(parsed[0].source.path, vec!["outputs", "x/y"]);
        assert_eq!(parsed[0].source.port(), "outputs/x/y");
        assert!(parsed[1].source.path.is_empty());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), connects);
    }

    #[test]
    fn test_anchor_role_aliases() {
        let anchors: BTreeMap<String, AnchorRole> =
            serde_json::from_value(json!({ "a": "left", "b": "output" })).unwrap();
        assert_eq!(anchors["a"], AnchorRole::Input);
        assert_eq!(anchors["b"], AnchorRole::Output);
    }

    #[test]
    fn test_line_shape_defaults_to_cubic_and_toggles() {
        let mut gui = GuiState::default();
        assert_eq!(gui.line_shape("image"), LineShape::Cubic);
        assert_eq!(gui.toggle_line_shape("image"), LineShape::Line);
        assert_eq!(gui.line_shape("image"), LineShape::Line);
        assert_eq!(gui.toggle_line_shape("image"), LineShape::Cubic);
    }

    #[test]
    fn test_nodes_by_x_puts_unpositioned_last() {
        let mut state = GraphState::default();
        state.add_node("c").add_node("a").add_node("b");
        state.gui_state.entry("c".into()).or_default().pos = Some(Point::new(-5.0, 0.0));
        state.gui_state.entry("b".into()).or_default().pos = Some(Point::new(10.0, 0.0));

        assert_eq!(state.nodes_by_x(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_invalid_state_is_an_error() {
        assert!(matches!(GraphState::from_json("{\"connects\": 3}"), Err(Error::InvalidState(_))));
    }
}
