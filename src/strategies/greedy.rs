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

use std::thread;

use crate::config::GreedyConfig;
use crate::embedding::Embedding;
use crate::geometry;
use crate::strategy::{Executor, Strategy, StrategyError};

/// Binds every vertex to a nearby free point.
///
/// The fast variant assigns vertices in id order, the slow variant always
/// assembles the globally closest free pair. With both enabled they race
/// on independent clones and the lower tracked score wins.
#[derive(Debug, Default)]
pub struct Greedy;

impl Strategy for Greedy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn run(&mut self, exec: &mut Executor) -> Result<(), StrategyError> {
        let conf: GreedyConfig = exec.load_config("greedy.json")?;

        if conf.use_slow && !conf.use_fast {
            slow_assignment(&mut exec.emb);
            return Ok(());
        }
        if conf.use_fast && !conf.use_slow {
            fast_assignment(&mut exec.emb);
            return Ok(());
        }

        let mut fast_emb = exec.emb.clone();
        let mut slow_emb = exec.emb.clone();

        thread::scope(|scope| {
            let fast = scope.spawn(|| fast_assignment(&mut fast_emb));
            let slow = scope.spawn(|| slow_assignment(&mut slow_emb));
            let _ = fast.join();
            let _ = slow.join();
        });

        exec.emb = if fast_emb.lazy_score() < slow_emb.lazy_score() {
            fast_emb
        } else {
            slow_emb
        };
        Ok(())
    }
}

/// Binds each vertex, in id order, to the nearest still-free point.
fn fast_assignment(emb: &mut Embedding) {
    for vertex_id in 0..emb.gamma.vertices.len() {
        let pos = emb.gamma.vertex(vertex_id).pos;
        let mut min_dist = f64::MAX;
        let mut closest = None;

        // Find the closest unoccupied point
        for point in &emb.points {
            if !point.is_occupied() {
                let dist = geometry::dist(pos, point.pos);
                if dist < min_dist {
                    min_dist = dist;
                    closest = Some(point.id);
                }
            }
        }

        if let Some(closest) = closest {
            emb.move_to_point(vertex_id, closest);
        }
    }
}

/// Repeatedly assembles the globally closest pair of an unassigned vertex
/// and a free point.
fn slow_assignment(emb: &mut Embedding) {
    let mut assigned = 0;
    while assigned < emb.gamma.vertices.len() {
        let mut min_dist = f64::MAX;
        let mut assign = None;

        for vertex in &emb.gamma.vertices {
            if vertex.is_occupying() {
                continue;
            }
            for point in &emb.points {
                if point.is_occupied() {
                    continue;
                }
                let dist = geometry::dist(vertex.pos, point.pos);
                if dist < min_dist {
                    min_dist = dist;
                    assign = Some((vertex.id, point.id));
                }
            }
        }

        match assign {
            Some((vertex_id, point_id)) => {
                emb.move_to_point(vertex_id, point_id);
                assigned += 1;
            }
            None => break,
        }
    }
}
