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

//! The mutable point-set embedding and its tracked crossing score.
//!
//! An [`Embedding`] binds the vertices of a drawing to a fixed point set
//! and keeps the total crossing score either by full O(|E|²) evaluation
//! ([`Embedding::score`]) or incrementally through the tracker
//! ([`Embedding::lazy_score`]), which re-measures only the edges incident
//! to a moved vertex.

use itertools::Itertools;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::geometry::{self, Position};
use crate::graph::{Edge, Graph};

/// A grid point of the instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub id: usize,
    pub pos: Position,

    /// Id of the occupying vertex, if any.
    pub occupier: Option<usize>,
}

impl Point {
    pub fn new(id: usize, x: i64, y: i64) -> Point {
        Point {
            id,
            pos: Position::new(x as f64, y as f64),
            occupier: None,
        }
    }

    pub fn release(&mut self) {
        self.occupier = None;
    }

    pub fn occupy(&mut self, vertex_id: usize) {
        self.occupier = Some(vertex_id);
    }

    pub fn is_occupied(&self) -> bool {
        self.occupier.is_some()
    }
}

/// A point-set embedding: a drawing whose vertices live on a fixed set of
/// integer grid points.
///
/// `Clone` performs the full copy including the static adjacency and
/// milieu tables; the strategy loops instead clone once and then call
/// [`Embedding::fast_copy_from`] per iteration.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub width: i64,
    pub height: i64,

    /// The drawing this embedding decorates.
    pub gamma: Graph,

    pub points: Vec<Point>,

    /// Weight of a degenerate crossing, |V|.
    pub penalty: i64,

    // Reverse access from an integer coordinate to its point.
    coordinates: FxHashMap<(i64, i64), usize>,

    // Per point, the max_deg nearest other points in ascending
    // (distance, id) order.
    milieu: Vec<Vec<usize>>,

    // Currently tracked score.
    score_tracker: i64,

    // Is the tracker initialized?
    tracker_ready: bool,
}

/// Ids of the `n` points nearest to `point`, ascending by `(distance, id)`.
fn nearest_ids(points: &[Point], point: &Point, n: usize) -> Vec<usize> {
    let mut by_dist: Vec<(f64, usize)> = points
        .iter()
        .filter(|other| other.id != point.id)
        .map(|other| (geometry::dist(point.pos, other.pos), other.id))
        .collect();
    by_dist.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    by_dist.into_iter().take(n).map(|(_, id)| id).collect()
}

impl Embedding {
    /// Decorates a drawing with a point set, precomputing the coordinate
    /// map and the milieu of every point.
    pub fn new(gamma: Graph, points: Vec<Point>, width: i64, height: i64) -> Embedding {
        let mut coordinates = FxHashMap::default();
        let mut milieu = vec![Vec::new(); points.len()];
        for point in &points {
            coordinates.insert((point.pos.x as i64, point.pos.y as i64), point.id);
            milieu[point.id] = nearest_ids(&points, point, gamma.max_deg);
        }
        let penalty = gamma.vertices.len() as i64;

        Embedding {
            width,
            height,
            gamma,
            points,
            penalty,
            coordinates,
            milieu,
            score_tracker: 0,
            tracker_ready: false,
        }
    }

    /// Copies only the dynamic state of `other`, reusing allocations.
    ///
    /// The adjacency and milieu tables are identical across copies of one
    /// instance and are left untouched, keeping this O(|V|+|E|+|P|).
    pub fn fast_copy_from(&mut self, other: &Embedding) {
        self.points.clone_from(&other.points);
        self.gamma.vertices.clone_from(&other.gamma.vertices);
        self.gamma.edges.clone_from(&other.gamma.edges);
        self.score_tracker = other.score_tracker;
        self.tracker_ready = other.tracker_ready;
    }

    /// Moves a vertex to an arbitrary position. Occupancy and tracker are
    /// not maintained; force-directed layouts recompute both later.
    pub fn move_to_pos(&mut self, vertex_id: usize, pos: Position) {
        self.gamma.vertex_mut(vertex_id).move_to_pos(pos);
    }

    /// Binds a vertex to a point, releasing the previously occupied point
    /// if it still names this vertex as its occupier.
    pub fn move_to_point(&mut self, vertex_id: usize, point_id: usize) {
        self.points[point_id].occupy(vertex_id);

        if let Some(old_id) = self.gamma.vertex(vertex_id).occupied_point {
            if old_id != point_id && self.points[old_id].occupier == Some(vertex_id) {
                self.points[old_id].release();
            }
        }

        let pos = self.points[point_id].pos;
        self.move_to_pos(vertex_id, pos);
        self.gamma.vertex_mut(vertex_id).occupied_point = Some(point_id);
    }

    /// [`Embedding::move_to_point`] with the score tracker maintained.
    pub fn tracked_move_to_point(&mut self, vertex_id: usize, point_id: usize) {
        self.prepare_tracker();
        if self.gamma.vertex(vertex_id).occupied_point == Some(point_id) {
            return;
        }

        let old_score = self.pen(vertex_id, -1);
        self.move_to_point(vertex_id, point_id);
        let new_score = self.pen(vertex_id, 1);

        self.score_tracker += new_score - old_score;
    }

    /// Moves a vertex onto a point's position, ignoring occupancy.
    pub fn ruthless_move_to_point(&mut self, vertex_id: usize, point_id: usize) {
        let pos = self.points[point_id].pos;
        self.move_to_pos(vertex_id, pos);
    }

    /// [`Embedding::ruthless_move_to_point`] with the tracker maintained.
    pub fn tracked_ruthless_move_to_point(&mut self, vertex_id: usize, point_id: usize) {
        self.prepare_tracker();

        let old_score = self.pen(vertex_id, -1);
        self.ruthless_move_to_point(vertex_id, point_id);
        let new_score = self.pen(vertex_id, 1);

        self.score_tracker += new_score - old_score;
    }

    /// Exchanges the points two vertices occupy.
    ///
    /// If only one of the two is bound, its point is handed to the other
    /// vertex and the displaced one keeps its position unbound.
    pub fn exchange_points(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        match (
            self.gamma.vertex(a).occupied_point,
            self.gamma.vertex(b).occupied_point,
        ) {
            (Some(a_point), Some(b_point)) => {
                self.points[a_point].release();
                self.move_to_point(b, a_point);
                self.move_to_point(a, b_point);
            }
            (None, Some(b_point)) => {
                self.move_to_point(a, b_point);
                self.gamma.vertex_mut(b).occupied_point = None;
            }
            (Some(a_point), None) => {
                self.move_to_point(b, a_point);
                self.gamma.vertex_mut(a).occupied_point = None;
            }
            (None, None) => {}
        }
    }

    /// [`Embedding::exchange_points`] with the tracker maintained.
    ///
    /// While one endpoint is measured, the other is marked ignored so the
    /// crossing mass between the pair is not counted twice.
    pub fn tracked_exchange_points(&mut self, a: usize, b: usize) {
        self.prepare_tracker();
        if a == b {
            return;
        }

        self.gamma.vertex_mut(b).ignored = true;
        let a_old = self.pen(a, -1);
        self.gamma.vertex_mut(b).ignored = false;
        let b_old = self.pen(b, -1);

        self.exchange_points(a, b);

        self.gamma.vertex_mut(b).ignored = true;
        let a_new = self.pen(a, 1);
        self.gamma.vertex_mut(b).ignored = false;
        let b_new = self.pen(b, 1);

        self.score_tracker += a_new - a_old;
        self.score_tracker += b_new - b_old;
    }

    /// Moves the vertex to the point when free, otherwise exchanges
    /// points with the occupier.
    pub fn move_or_swap(&mut self, vertex_id: usize, point_id: usize) {
        match self.points[point_id].occupier {
            Some(occupier) => self.exchange_points(vertex_id, occupier),
            None => self.move_to_point(vertex_id, point_id),
        }
    }

    /// [`Embedding::move_or_swap`] with the tracker maintained.
    pub fn tracked_move_or_swap(&mut self, vertex_id: usize, point_id: usize) {
        match self.points[point_id].occupier {
            Some(occupier) => self.tracked_exchange_points(vertex_id, occupier),
            None => self.tracked_move_to_point(vertex_id, point_id),
        }
    }

    pub fn point(&self, point_id: usize) -> &Point {
        &self.points[point_id]
    }

    /// Uniformly random point id.
    pub fn random_point(&self, rng: &mut impl Rng) -> usize {
        rng.gen_range(0..self.points.len())
    }

    /// The point sitting on an integer coordinate, if any.
    pub fn point_on_pos(&self, pos: Position) -> Option<usize> {
        self.coordinates.get(&(pos.x as i64, pos.y as i64)).copied()
    }

    /// The `n` nearest points to `point_id`, served from the milieu cache
    /// whenever it suffices.
    pub fn n_nearest_points(&self, point_id: usize, n: usize) -> Vec<usize> {
        if n <= self.gamma.max_deg {
            return self.milieu[point_id][..n].to_vec();
        }
        nearest_ids(&self.points, &self.points[point_id], n)
    }

    /// The embedding's total score over all unordered edge pairs.
    pub fn score(&self) -> i64 {
        self.gamma
            .edges
            .iter()
            .tuple_combinations()
            .map(|(a, b)| self.cross(a, b))
            .sum()
    }

    /// The tracked score, preparing the tracker at the first call.
    pub fn lazy_score(&mut self) -> i64 {
        self.prepare_tracker();
        self.score_tracker
    }

    pub fn tracker_ready(&self) -> bool {
        self.tracker_ready
    }

    /// Crossing contribution of an edge pair.
    fn cross(&self, a: &Edge, b: &Edge) -> i64 {
        if a == b {
            return 0;
        }
        geometry::eval_segments(
            self.gamma.vertex(a.a).pos,
            self.gamma.vertex(a.b).pos,
            self.gamma.vertex(b.a).pos,
            self.gamma.vertex(b.b).pos,
            self.penalty,
        )
    }

    /// Initialises the tracked score and the vertex temperatures.
    /// Idempotent. Pairs touching ignored vertices are skipped.
    pub fn prepare_tracker(&mut self) {
        if self.tracker_ready {
            return;
        }
        self.score_tracker = 0;

        for i in 0..self.gamma.edges.len() {
            let a = self.gamma.edges[i];
            if self.gamma.vertex(a.a).ignored || self.gamma.vertex(a.b).ignored {
                continue;
            }

            for j in (i + 1)..self.gamma.edges.len() {
                let b = self.gamma.edges[j];
                if self.gamma.vertex(b.a).ignored || self.gamma.vertex(b.b).ignored {
                    continue;
                }

                // Crossings feed the tracker and all four temperatures.
                let c = self.cross(&a, &b);
                self.score_tracker += c;
                self.bump_temps(&a, &b, c);
            }
        }

        self.tracker_ready = true;
    }

    /// Crossing mass on the edges incident to `vertex_id`, applied to the
    /// endpoint temperatures with the given sign.
    ///
    /// Called with -1 before a tracked mutation and +1 after it; the
    /// difference is the tracker delta.
    fn pen(&mut self, vertex_id: usize, sign: i64) -> i64 {
        let mut score = 0;
        let neighbours = self.gamma.neighbours(vertex_id).to_vec();

        for &neighbour in &neighbours {
            let Some(a_id) = self.gamma.edge_between(vertex_id, neighbour) else {
                continue;
            };
            let a = self.gamma.edges[a_id];
            if self.gamma.vertex(a.a).ignored || self.gamma.vertex(a.b).ignored {
                continue;
            }

            for b_id in 0..self.gamma.edges.len() {
                let b = self.gamma.edges[b_id];
                if self.gamma.vertex(b.a).ignored || self.gamma.vertex(b.b).ignored {
                    continue;
                }

                // Pairs of incident edges are measured in the second sweep.
                if b.a == vertex_id || b.b == vertex_id {
                    continue;
                }

                let c = self.cross(&a, &b);
                self.bump_temps(&a, &b, sign * c);
                score += c;
            }
        }

        // Unordered pairs of incident edges, each counted once.
        for i in 0..neighbours.len() {
            let Some(a_id) = self.gamma.edge_between(vertex_id, neighbours[i]) else {
                continue;
            };
            let a = self.gamma.edges[a_id];
            if self.gamma.vertex(a.a).ignored || self.gamma.vertex(a.b).ignored {
                continue;
            }

            for &other in neighbours.iter().skip(i + 1) {
                let Some(b_id) = self.gamma.edge_between(vertex_id, other) else {
                    continue;
                };
                let b = self.gamma.edges[b_id];
                if self.gamma.vertex(b.a).ignored || self.gamma.vertex(b.b).ignored {
                    continue;
                }

                let c = self.cross(&a, &b);
                self.bump_temps(&a, &b, sign * c);
                score += c;
            }
        }

        score
    }

    fn bump_temps(&mut self, a: &Edge, b: &Edge, delta: i64) {
        self.gamma.vertex_mut(a.a).temp += delta;
        self.gamma.vertex_mut(a.b).temp += delta;
        self.gamma.vertex_mut(b.a).temp += delta;
        self.gamma.vertex_mut(b.b).temp += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::dist;
    use crate::graph::Vertex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Grid of points, vertices without edges unless given.
    fn embedding(n_vertices: usize, grid: usize, edges: Vec<(usize, usize)>) -> Embedding {
        let vertices = (0..n_vertices).map(|id| Vertex::new(id, 0.0, 0.0)).collect();
        let edges = edges
            .into_iter()
            .enumerate()
            .map(|(id, (a, b))| Edge { id, a, b })
            .collect();
        let mut points = Vec::new();
        for y in 0..grid {
            for x in 0..grid {
                points.push(Point::new(points.len(), x as i64 * 10, y as i64 * 10));
            }
        }
        Embedding::new(Graph::new(vertices, edges), points, 100, 100)
    }

    fn assert_occupancy_consistent(emb: &Embedding) {
        for vertex in &emb.gamma.vertices {
            if let Some(point_id) = vertex.occupied_point {
                assert_eq!(emb.points[point_id].occupier, Some(vertex.id));
                assert_eq!(vertex.pos, emb.points[point_id].pos);
            }
        }
        for point in &emb.points {
            if let Some(vertex_id) = point.occupier {
                assert_eq!(emb.gamma.vertex(vertex_id).occupied_point, Some(point.id));
            }
        }
    }

    #[test]
    fn penalty_is_vertex_count() {
        let emb = embedding(4, 3, vec![(0, 1)]);
        assert_eq!(emb.penalty, 4);
    }

    #[test]
    fn milieu_matches_sorted_distances() {
        let emb = embedding(4, 3, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
        let max_deg = emb.gamma.max_deg;
        for point in &emb.points {
            let cached = emb.n_nearest_points(point.id, max_deg);
            assert_eq!(cached.len(), max_deg);

            let mut expected: Vec<(f64, usize)> = emb
                .points
                .iter()
                .filter(|other| other.id != point.id)
                .map(|other| (dist(point.pos, other.pos), other.id))
                .collect();
            expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let expected: Vec<usize> = expected.into_iter().take(max_deg).map(|(_, id)| id).collect();
            assert_eq!(cached, expected);
        }
    }

    #[test]
    fn nearest_points_beyond_cache_are_recomputed() {
        let emb = embedding(3, 3, vec![(0, 1)]);
        let nearest = emb.n_nearest_points(0, 5);
        assert_eq!(nearest.len(), 5);
        // Ascending distance with id tie-break.
        for pair in nearest.windows(2) {
            let d0 = dist(emb.point(0).pos, emb.point(pair[0]).pos);
            let d1 = dist(emb.point(0).pos, emb.point(pair[1]).pos);
            assert!(d0 < d1 || (d0 == d1 && pair[0] < pair[1]));
        }
    }

    #[test]
    fn move_binds_and_releases() {
        let mut emb = embedding(2, 2, vec![(0, 1)]);
        emb.move_to_point(0, 0);
        assert_occupancy_consistent(&emb);
        assert_eq!(emb.point(0).occupier, Some(0));

        emb.move_to_point(0, 3);
        assert_occupancy_consistent(&emb);
        assert!(!emb.point(0).is_occupied());
        assert_eq!(emb.gamma.vertex(0).occupied_point, Some(3));
    }

    #[test]
    fn move_to_own_point_is_identity() {
        let mut emb = embedding(2, 2, vec![(0, 1)]);
        emb.move_to_point(0, 1);
        let before = emb.clone();
        emb.move_to_point(0, 1);
        assert_eq!(before.gamma.vertices, emb.gamma.vertices);
        assert_eq!(before.points, emb.points);
    }

    #[test]
    fn exchange_twice_is_identity() {
        let mut emb = embedding(2, 2, vec![(0, 1)]);
        emb.move_to_point(0, 0);
        emb.move_to_point(1, 3);
        let before = emb.clone();

        emb.exchange_points(0, 1);
        assert_occupancy_consistent(&emb);
        assert_eq!(emb.gamma.vertex(0).occupied_point, Some(3));
        assert_eq!(emb.gamma.vertex(1).occupied_point, Some(0));

        emb.exchange_points(0, 1);
        assert_eq!(before.gamma.vertices, emb.gamma.vertices);
        assert_eq!(before.points, emb.points);
    }

    #[test]
    fn exchange_with_unbound_vertex_hands_over_the_point() {
        let mut emb = embedding(2, 2, vec![(0, 1)]);
        emb.move_to_point(1, 2);
        emb.exchange_points(0, 1);
        assert_eq!(emb.gamma.vertex(0).occupied_point, Some(2));
        assert_eq!(emb.gamma.vertex(1).occupied_point, None);
        assert_occupancy_consistent(&emb);
    }

    #[test]
    fn ruthless_move_leaves_occupancy_alone() {
        let mut emb = embedding(2, 2, vec![(0, 1)]);
        emb.move_to_point(0, 0);
        emb.ruthless_move_to_point(0, 3);
        assert_eq!(emb.gamma.vertex(0).pos, emb.point(3).pos);
        assert_eq!(emb.gamma.vertex(0).occupied_point, Some(0));
        assert_eq!(emb.point(0).occupier, Some(0));
        assert!(!emb.point(3).is_occupied());
    }

    #[test]
    fn move_or_swap_picks_the_right_primitive() {
        let mut emb = embedding(2, 2, vec![(0, 1)]);
        emb.move_to_point(0, 0);
        emb.move_or_swap(1, 2);
        assert_eq!(emb.gamma.vertex(1).occupied_point, Some(2));

        emb.move_or_swap(0, 2);
        assert_eq!(emb.gamma.vertex(0).occupied_point, Some(2));
        assert_eq!(emb.gamma.vertex(1).occupied_point, Some(0));
        assert_occupancy_consistent(&emb);
    }

    /// K4 laid out on a line produces only degenerate crossings.
    #[test]
    fn collinear_clique_scores_in_penalties() {
        let mut emb = embedding(4, 4, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        // Points 0..4 are the first grid row, all on y = 0.
        for v in 0..4 {
            emb.move_to_point(v, v);
        }
        let score = emb.score();
        assert!(score > 0);
        assert_eq!(score % emb.penalty, 0);
    }

    #[test]
    fn tracker_matches_full_score_after_preparation() {
        let mut emb = embedding(4, 4, vec![(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
        for v in 0..4 {
            emb.move_to_point(v, v * 3);
        }
        assert_eq!(emb.lazy_score(), emb.score());
        assert!(emb.tracker_ready());
    }

    #[test]
    fn tracked_moves_keep_tracker_parity() {
        let mut emb = embedding(5, 4, vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)]);
        for v in 0..5 {
            emb.move_to_point(v, v);
        }
        emb.prepare_tracker();

        emb.tracked_move_to_point(0, 9);
        assert_eq!(emb.lazy_score(), emb.score());

        emb.tracked_move_or_swap(1, 9); // occupied: swap
        assert_eq!(emb.lazy_score(), emb.score());

        emb.tracked_move_or_swap(2, 12); // free: move
        assert_eq!(emb.lazy_score(), emb.score());

        emb.tracked_exchange_points(3, 4);
        assert_eq!(emb.lazy_score(), emb.score());
        assert_occupancy_consistent(&emb);
    }

    /// Long random walk of tracked mutations against the from-scratch score.
    #[test]
    fn tracker_parity_under_random_walk() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 12;
        let mut edges = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                if rng.gen_bool(0.3) {
                    edges.push((a, b));
                }
            }
        }
        let mut emb = embedding(n, 5, edges);
        for v in 0..n {
            emb.move_to_point(v, 2 * v);
        }
        emb.prepare_tracker();

        for step in 0..60 {
            let vertex = rng.gen_range(0..n);
            let point = rng.gen_range(0..emb.points.len());
            if step % 3 == 0 {
                let other = rng.gen_range(0..n);
                emb.tracked_exchange_points(vertex, other);
            } else {
                emb.tracked_move_or_swap(vertex, point);
            }
            assert_eq!(emb.lazy_score(), emb.score(), "diverged at step {step}");
        }
        assert_occupancy_consistent(&emb);
    }

    #[test]
    fn fast_copy_transfers_dynamic_state_only() {
        let mut a = embedding(3, 3, vec![(0, 1), (1, 2)]);
        let mut b = a.clone();

        a.move_to_point(0, 0);
        a.move_to_point(1, 4);
        a.move_to_point(2, 8);
        let tracked = a.lazy_score();

        b.fast_copy_from(&a);
        assert_eq!(b.gamma.vertices, a.gamma.vertices);
        assert_eq!(b.points, a.points);
        assert!(b.tracker_ready());
        assert_eq!(b.lazy_score(), tracked);
    }

    #[test]
    fn coordinates_resolve_points() {
        let emb = embedding(2, 3, vec![(0, 1)]);
        assert_eq!(emb.point_on_pos(Position::new(10.0, 20.0)), Some(7));
        assert_eq!(emb.point_on_pos(Position::new(5.0, 5.0)), None);
    }
}
