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

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FdaConfig;
use crate::embedding::Embedding;
use crate::geometry::{self, Position, EPS};
use crate::strategy::{Executor, Strategy, StrategyError};

/// The closed set of force kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceModel {
    /// Eades' spring embedder.
    Spring,
    /// Fruchterman-Reingold.
    FruchtermanReingold,
}

/// Iterative force simulation ending in a min-max normalised layout.
///
/// The result is a layout, not an embedding: vertices end at fractional
/// coordinates and a later strategy snaps them onto points.
#[derive(Debug)]
pub struct ForceDirected {
    model: ForceModel,
    rng: StdRng,
}

impl ForceDirected {
    pub fn new(model: ForceModel) -> ForceDirected {
        ForceDirected {
            model,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seed(&mut self, seed: u64) -> &mut ForceDirected {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Repulsion acting on `a`, pushing away from `b`.
    fn repel(&mut self, emb: &Embedding, conf: &FdaConfig, a: Position, b: Position) -> (f64, f64) {
        let dist = geometry::dist(a, b);

        // Avoids that vertices are freezing at a shared position.
        if dist < EPS {
            return self.jitter(emb);
        }

        let (dx, dy) = (a.x - b.x, a.y - b.y);
        match self.model {
            ForceModel::Spring => {
                let repl = conf.spring.repl;
                ((repl / (dist * dist)) * (dx / dist), (repl / (dist * dist)) * (dy / dist))
            }
            ForceModel::FruchtermanReingold => {
                let len = conf.fruchtrhein.len;
                ((len * len / dist) * (dx / dist), (len * len / dist) * (dy / dist))
            }
        }
    }

    /// Attraction acting on `a`, pulling towards `b`.
    fn attract(&mut self, emb: &Embedding, conf: &FdaConfig, a: Position, b: Position) -> (f64, f64) {
        let dist = geometry::dist(b, a);
        if dist < EPS {
            return (0.0, 0.0);
        }

        let (dx, dy) = (b.x - a.x, b.y - a.y);
        match self.model {
            ForceModel::Spring => {
                let (repel_x, repel_y) = self.repel(emb, conf, a, b);
                let scale = conf.spring.attr * (dist / conf.spring.len).ln();
                (scale * (dx / dist) - repel_x, scale * (dy / dist) - repel_y)
            }
            ForceModel::FruchtermanReingold => {
                let len = conf.fruchtrhein.len;
                ((dist * dist / len) * (dx / dist), (dist * dist / len) * (dy / dist))
            }
        }
    }

    /// Applies the temperature to a summed force.
    fn cool(&self, conf: &FdaConfig, force: (f64, f64), temp: f64) -> (f64, f64) {
        match self.model {
            ForceModel::Spring => (force.0 * temp, force.1 * temp),
            ForceModel::FruchtermanReingold => {
                let max_len = temp * conf.fruchtrhein.len * 2.0;
                let norm = geometry::len(force.0, force.1);
                if norm > max_len {
                    ((force.0 / norm) * max_len, (force.1 / norm) * max_len)
                } else {
                    force
                }
            }
        }
    }

    /// Random kick for coincident vertices, signed by the coordinate
    /// parities of a random point.
    fn jitter(&mut self, emb: &Embedding) -> (f64, f64) {
        let point = emb.point(self.rng.gen_range(0..emb.points.len()));
        let x_sign = if (point.pos.x as i64) % 2 == 0 { 1.0 } else { -1.0 };
        let y_sign = if (point.pos.y as i64) % 2 == 0 { 1.0 } else { -1.0 };
        (x_sign * emb.width as f64, y_sign * emb.height as f64)
    }
}

impl Strategy for ForceDirected {
    fn name(&self) -> &'static str {
        match self.model {
            ForceModel::Spring => "ForceDirected[spring]",
            ForceModel::FruchtermanReingold => "ForceDirected[fr]",
        }
    }

    fn run(&mut self, exec: &mut Executor) -> Result<(), StrategyError> {
        let conf: FdaConfig = exec.load_config("FDA.json")?;

        let mut temp = 1.0;
        let mut curr_iter = 0;
        let mut max_force = conf.max_diff + 1.0;

        // All forces of one iteration compute against this snapshot.
        let mut snapshot = exec.emb.clone();

        while curr_iter < conf.max_iter && max_force > conf.max_diff {
            max_force = f64::MIN_POSITIVE;
            snapshot.fast_copy_from(&exec.emb);

            for vertex in 0..snapshot.gamma.vertices.len() {
                let pos = snapshot.gamma.vertex(vertex).pos;
                let mut force = (0.0, 0.0);

                for other in 0..snapshot.gamma.vertices.len() {
                    if other == vertex {
                        continue;
                    }
                    let other_pos = snapshot.gamma.vertex(other).pos;

                    let (repel_x, repel_y) = self.repel(&snapshot, &conf, pos, other_pos);
                    force.0 += repel_x;
                    force.1 += repel_y;

                    if snapshot.gamma.exists_edge(vertex, other) {
                        let (attract_x, attract_y) =
                            self.attract(&snapshot, &conf, pos, other_pos);
                        force.0 += attract_x;
                        force.1 += attract_y;
                    }
                }

                let force = self.cool(&conf, force, temp);
                let norm = geometry::len(force.0, force.1);
                if max_force < norm {
                    max_force = norm;
                }

                exec.emb
                    .move_to_pos(vertex, Position::new(pos.x + force.0, pos.y + force.1));
            }

            temp *= conf.cool;
            curr_iter += 1;
        }

        normalize(&mut exec.emb);
        Ok(())
    }
}

/// Min-max normalisation of the layout into `[0,width] x [0,height]`.
/// A degenerate axis collapses to 0.
fn normalize(emb: &mut Embedding) {
    if emb.gamma.vertices.is_empty() {
        return;
    }

    let root = emb.gamma.vertex(0).pos;
    let (mut min_x, mut max_x) = (root.x, root.x);
    let (mut min_y, mut max_y) = (root.y, root.y);

    for vertex in &emb.gamma.vertices {
        if vertex.pos.x < min_x {
            min_x = vertex.pos.x;
        }
        if vertex.pos.x > max_x {
            max_x = vertex.pos.x;
        }
        if vertex.pos.y < min_y {
            min_y = vertex.pos.y;
        }
        if vertex.pos.y > max_y {
            max_y = vertex.pos.y;
        }
    }

    for vertex in 0..emb.gamma.vertices.len() {
        let mut pos = emb.gamma.vertex(vertex).pos;

        pos.x = if max_x != min_x {
            // Scales x coordinates to the interval [0, width]
            (pos.x - min_x) * (emb.width as f64 / (max_x - min_x))
        } else {
            0.0
        };

        pos.y = if max_y != min_y {
            // Scales y coordinates to the interval [0, height]
            (pos.y - min_y) * (emb.height as f64 / (max_y - min_y))
        } else {
            0.0
        };

        emb.move_to_pos(vertex, pos);
    }
}
