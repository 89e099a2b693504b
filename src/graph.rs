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

//! The drawing: vertices with positions, undirected edges, adjacency.
//!
//! The graph is immutable after construction. Only vertex positions,
//! occupancy, temperatures, and ignored flags ever change during
//! optimisation.

use rand::Rng;

use crate::geometry::Position;

/// A graph vertex together with its drawing state.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: usize,
    pub deg: usize,
    pub pos: Position,

    /// Id of the occupied point, if any.
    pub occupied_point: Option<usize>,

    /// Excludes the vertex from incremental scoring while set.
    pub ignored: bool,

    /// Tracked temperature, the summed up crossing penalties.
    pub temp: i64,
}

impl Vertex {
    pub fn new(id: usize, x: f64, y: f64) -> Vertex {
        Vertex {
            id,
            deg: 0,
            pos: Position::new(x, y),
            occupied_point: None,
            ignored: false,
            temp: 0,
        }
    }

    pub fn move_to_pos(&mut self, pos: Position) {
        self.pos = pos;
    }

    pub fn is_occupying(&self) -> bool {
        self.occupied_point.is_some()
    }
}

/// An undirected edge between two vertex ids.
///
/// Equality is set-equality on the endpoints, so the two orientations of
/// an edge compare equal.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Edge {
    pub id: usize,
    pub a: usize,
    pub b: usize,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Edge) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// A drawing of a simple graph: vertex and edge sequences indexed by id,
/// plus the adjacency tables built once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,

    /// Max degree of a vertex.
    pub max_deg: usize,

    adjacency_matrix: Vec<Vec<Option<usize>>>,
    adjacency_list: Vec<Vec<usize>>,
}

impl Graph {
    /// Builds the adjacency tables and degrees for a fixed vertex and
    /// edge set. Edge endpoints must be valid vertex ids.
    pub fn new(mut vertices: Vec<Vertex>, edges: Vec<Edge>) -> Graph {
        let n = vertices.len();
        let mut adjacency_matrix = vec![vec![None; n]; n];
        let mut adjacency_list = vec![Vec::new(); n];
        let mut max_deg = 0;

        for edge in &edges {
            vertices[edge.a].deg += 1;
            vertices[edge.b].deg += 1;
            max_deg = max_deg.max(vertices[edge.a].deg).max(vertices[edge.b].deg);

            adjacency_matrix[edge.a][edge.b] = Some(edge.id);
            adjacency_matrix[edge.b][edge.a] = Some(edge.id);
            adjacency_list[edge.a].push(edge.b);
            adjacency_list[edge.b].push(edge.a);
        }

        Graph {
            vertices,
            edges,
            max_deg,
            adjacency_matrix,
            adjacency_list,
        }
    }

    pub fn vertex(&self, vertex_id: usize) -> &Vertex {
        &self.vertices[vertex_id]
    }

    pub fn vertex_mut(&mut self, vertex_id: usize) -> &mut Vertex {
        &mut self.vertices[vertex_id]
    }

    pub fn edge(&self, edge_id: usize) -> &Edge {
        &self.edges[edge_id]
    }

    /// Id of the edge joining `a` and `b`, if present.
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency_matrix[a][b]
    }

    /// Ids of the neighbours of `vertex_id`.
    pub fn neighbours(&self, vertex_id: usize) -> &[usize] {
        &self.adjacency_list[vertex_id]
    }

    pub fn exists_vertex(&self, vertex_id: usize) -> bool {
        vertex_id < self.vertices.len()
    }

    pub fn exists_edge(&self, a: usize, b: usize) -> bool {
        // Considered graphs are simple
        if a == b {
            return false;
        }

        if !self.exists_vertex(a) || !self.exists_vertex(b) {
            return false;
        }

        self.adjacency_matrix[a][b].is_some()
    }

    /// Samples a vertex id, weighted by `temp^exp`.
    ///
    /// `exp == 0` samples uniformly. A total weight below 1 (all
    /// temperatures cold) falls back to the uniform distribution.
    pub fn random_vertex(&self, rng: &mut impl Rng, exp: i32) -> usize {
        if exp == 0 {
            return rng.gen_range(0..self.vertices.len());
        }

        let mut glob_temp: i64 = 0;
        for vertex in &self.vertices {
            glob_temp += (vertex.temp as f64).powi(exp) as i64;
        }

        // Generates zero division otherwise
        if glob_temp < 1 {
            return self.random_vertex(rng, 0);
        }

        let mut val = rng.gen_range(0..glob_temp);
        for vertex in &self.vertices {
            val -= (vertex.temp as f64).powi(exp) as i64;
            if val < 0 {
                return vertex.id;
            }
        }

        // Fallback case is the uniform distribution
        self.random_vertex(rng, 0)
    }
}
