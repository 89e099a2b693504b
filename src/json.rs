// CrossMin - Rust library for point-set embedding optimisation
//            by straight-line crossing minimisation
// Copyright (C) 2024 - the CrossMin developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Instance I/O in the GDC 2024 live-challenge JSON format.
//!
//! An instance carries `nodes`, `edges` and `points`; node and point ids
//! must densely occupy `0..n`. Saving rewrites only the node positions,
//! so unknown top-level keys pass through untouched.
//!
//! More information regarding the format:
//! <https://mozart.diei.unipg.it/gdcontest/2024/live/>.

use std::fs;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::embedding::{Embedding, Point};
use crate::graph::{Edge, Graph, Vertex};

/// Bounding box extent assumed when the instance omits `width`/`height`.
const DEFAULT_EXTENT: i64 = 1_000_000;

/// An error while reading, validating, or writing an instance.
#[derive(Debug, Display, Error, From)]
#[non_exhaustive]
pub enum InstanceError {
    /// The file could not be read or written.
    #[display("IO error: {_0}")]
    #[from]
    Io(std::io::Error),
    /// The JSON payload did not parse.
    #[display("invalid instance: {_0}")]
    #[from]
    Parse(serde_json::Error),
    /// An id lies outside the dense range.
    #[display("{kind} id {id} outside the dense range 0..{len}")]
    IdOutOfRange {
        kind: &'static str,
        id: usize,
        len: usize,
    },
    /// An id occurs twice.
    #[display("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: usize },
    /// An id of the dense range has no entry.
    #[display("missing {kind} id {id}")]
    MissingId { kind: &'static str, id: usize },
    /// An edge references an unknown vertex or is a self-loop.
    #[display("invalid edge between {source} and {target}")]
    BadEdge {
        #[error(ignore)]
        source: usize,
        target: usize,
    },
    /// Saving was requested before an instance was loaded.
    #[display("no instance loaded")]
    NoInstance,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonNode {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonEdge {
    pub source: usize,
    pub target: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonPoint {
    pub id: usize,
    pub x: i64,
    pub y: i64,
}

/// A parsed instance file. Unknown top-level keys are carried through
/// unchanged so a rewritten file stays a valid submission.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    pub nodes: Vec<JsonNode>,
    pub edges: Vec<JsonEdge>,
    pub points: Vec<JsonPoint>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Parses an instance from its JSON text.
pub fn parse_instance(data: &str) -> Result<JsonInstance, InstanceError> {
    Ok(serde_json::from_str(data)?)
}

/// Reads an instance file.
pub fn read_instance(path: &Path) -> Result<JsonInstance, InstanceError> {
    let data = fs::read_to_string(path)?;
    parse_instance(&data)
}

/// Writes an instance file, pretty-printed.
pub fn write_instance(instance: &JsonInstance, path: &Path) -> Result<(), InstanceError> {
    let data = serde_json::to_string_pretty(instance)?;
    fs::write(path, data)?;
    Ok(())
}

/// Collects `(id, item)` pairs into a dense id-indexed vector.
fn dense<T>(
    kind: &'static str,
    len: usize,
    items: impl Iterator<Item = (usize, T)>,
) -> Result<Vec<T>, InstanceError> {
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (id, item) in items {
        if id >= len {
            return Err(InstanceError::IdOutOfRange { kind, id, len });
        }
        if slots[id].is_some() {
            return Err(InstanceError::DuplicateId { kind, id });
        }
        slots[id] = Some(item);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(id, slot)| slot.ok_or(InstanceError::MissingId { kind, id }))
        .collect()
}

impl JsonInstance {
    /// Builds the embedding this instance describes.
    pub fn to_embedding(&self) -> Result<Embedding, InstanceError> {
        let points = dense(
            "point",
            self.points.len(),
            self.points.iter().map(|p| (p.id, Point::new(p.id, p.x, p.y))),
        )?;
        let vertices = dense(
            "node",
            self.nodes.len(),
            self.nodes.iter().map(|n| (n.id, Vertex::new(n.id, n.x, n.y))),
        )?;

        let mut edges = Vec::with_capacity(self.edges.len());
        for (id, edge) in self.edges.iter().enumerate() {
            if edge.source == edge.target
                || edge.source >= vertices.len()
                || edge.target >= vertices.len()
            {
                return Err(InstanceError::BadEdge {
                    source: edge.source,
                    target: edge.target,
                });
            }
            edges.push(Edge {
                id,
                a: edge.source,
                b: edge.target,
            });
        }

        let width = self.width.unwrap_or(DEFAULT_EXTENT);
        let height = self.height.unwrap_or(DEFAULT_EXTENT);
        Ok(Embedding::new(
            Graph::new(vertices, edges),
            points,
            width,
            height,
        ))
    }

    /// A copy with `nodes` rewritten to the embedding's positions.
    pub fn with_positions(&self, emb: &Embedding) -> JsonInstance {
        let mut out = self.clone();
        out.nodes = emb
            .gamma
            .vertices
            .iter()
            .map(|v| JsonNode {
                id: v.id,
                x: v.pos.x,
                y: v.pos.y,
            })
            .collect();
        out
    }
}

/// Directory adapter for instance files.
///
/// The output directory is created on construction. `load` keeps the raw
/// instance around so `save` can rewrite only the node positions.
#[derive(Debug, Clone)]
pub struct Io {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    source: Option<JsonInstance>,
}

impl Io {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Result<Io, InstanceError> {
        fs::create_dir_all(&output_dir)?;
        Ok(Io {
            input_dir,
            output_dir,
            source: None,
        })
    }

    /// Loads an instance file from the input directory.
    pub fn load(&mut self, name: &str) -> Result<Embedding, InstanceError> {
        let instance = read_instance(&self.input_dir.join(name))?;
        let emb = instance.to_embedding()?;
        self.source = Some(instance);
        Ok(emb)
    }

    /// Saves the embedding under `name` in the output directory.
    pub fn save(&self, emb: &Embedding, name: &str) -> Result<(), InstanceError> {
        let source = self.source.as_ref().ok_or(InstanceError::NoInstance)?;
        write_instance(&source.with_positions(emb), &self.output_dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const TRIANGLE: &str = r#"{
        "width": 10,
        "height": 10,
        "nodes": [
            {"id": 0, "x": 0, "y": 0},
            {"id": 1, "x": 10, "y": 0},
            {"id": 2, "x": 5, "y": 10}
        ],
        "edges": [
            {"source": 0, "target": 1},
            {"source": 1, "target": 2},
            {"source": 0, "target": 2}
        ],
        "points": [
            {"id": 0, "x": 0, "y": 0},
            {"id": 1, "x": 10, "y": 0},
            {"id": 2, "x": 5, "y": 10}
        ],
        "comment": "kept verbatim"
    }"#;

    #[fixture]
    fn triangle() -> JsonInstance {
        parse_instance(TRIANGLE).unwrap()
    }

    #[rstest]
    fn parses_and_builds(triangle: JsonInstance) {
        let emb = triangle.to_embedding().unwrap();
        assert_eq!(emb.gamma.vertices.len(), 3);
        assert_eq!(emb.gamma.edges.len(), 3);
        assert_eq!(emb.points.len(), 3);
        assert_eq!(emb.width, 10);
        assert_eq!(emb.height, 10);
        assert_eq!(emb.penalty, 3);
        // Edge ids follow file order.
        assert_eq!(emb.gamma.edge(1).a, 1);
        assert_eq!(emb.gamma.edge(1).b, 2);
    }

    #[test]
    fn missing_extent_defaults_to_a_million() {
        let data = r#"{"nodes": [{"id": 0, "x": 1, "y": 2}], "edges": [],
                       "points": [{"id": 0, "x": 1, "y": 2}]}"#;
        let emb = parse_instance(data).unwrap().to_embedding().unwrap();
        assert_eq!(emb.width, 1_000_000);
        assert_eq!(emb.height, 1_000_000);
    }

    #[rstest]
    fn round_trip_preserves_everything(triangle: JsonInstance) {
        let mut emb = triangle.to_embedding().unwrap();
        emb.move_to_point(0, 1);
        emb.move_to_point(1, 0);
        emb.move_to_point(2, 2);

        let written = serde_json::to_string_pretty(&triangle.with_positions(&emb)).unwrap();
        let reread = parse_instance(&written).unwrap();

        assert_eq!(reread.points, triangle.points);
        assert_eq!(reread.edges, triangle.edges);
        assert_eq!(reread.other.get("comment"), triangle.other.get("comment"));

        let emb2 = reread.to_embedding().unwrap();
        for (a, b) in emb.gamma.vertices.iter().zip(emb2.gamma.vertices.iter()) {
            assert_eq!(a.pos, b.pos);
        }
    }

    #[rstest]
    #[case::duplicate(r#"{"nodes": [{"id": 0, "x": 0, "y": 0}, {"id": 0, "x": 1, "y": 1}],
                          "edges": [], "points": [{"id": 0, "x": 0, "y": 0},
                          {"id": 1, "x": 1, "y": 1}]}"#)]
    #[case::out_of_range(r#"{"nodes": [{"id": 5, "x": 0, "y": 0}], "edges": [],
                             "points": [{"id": 0, "x": 0, "y": 0}]}"#)]
    #[case::self_loop(r#"{"nodes": [{"id": 0, "x": 0, "y": 0}],
                          "edges": [{"source": 0, "target": 0}],
                          "points": [{"id": 0, "x": 0, "y": 0}]}"#)]
    fn invalid_instances_are_rejected(#[case] data: &str) {
        assert!(parse_instance(data).unwrap().to_embedding().is_err());
    }

    #[test]
    fn unparsable_payload_is_an_error() {
        assert!(parse_instance("{ nope").is_err());
    }
}
