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

use crate::config::BruteforceConfig;
use crate::strategy::{Executor, Strategy, StrategyError};
use crate::util::VariationIterator;

/// Enumerates every injective vertex-to-point assignment in lexicographic
/// order, keeping the best drawing seen.
///
/// Assumes |P| >= |V|, as the instance format guarantees. Terminates on
/// exhaustion or when the time budget closes.
#[derive(Debug, Default)]
pub struct Bruteforce;

impl Strategy for Bruteforce {
    fn name(&self) -> &'static str {
        "Bruteforce"
    }

    fn run(&mut self, exec: &mut Executor) -> Result<(), StrategyError> {
        let conf: BruteforceConfig = exec.load_config("bruteforce.json")?;

        let c_vertices = exec.emb.gamma.vertices.len();
        let c_points = exec.emb.points.len();
        let mut variations = VariationIterator::new(c_vertices, c_points);

        // Normalise occupancy, then seed vertex i on point i.
        for i in 0..c_vertices {
            if let Some(occupier) = exec.emb.point(i).occupier {
                exec.emb.move_to_point(occupier, occupier);
            }
            exec.emb.move_to_point(i, i);
        }

        let mut min_score = exec.emb.lazy_score();
        let mut min_emb = exec.emb.clone();

        while variations.has_next && exec.in_time() {
            let variation = variations.next();

            let score = if conf.use_tracker {
                // Rearrange with tracked scoring
                for vertex in 0..c_vertices {
                    let target = variation[vertex];
                    if exec.emb.gamma.vertex(vertex).pos != exec.emb.point(target).pos {
                        exec.emb.tracked_ruthless_move_to_point(vertex, target);
                    }
                }
                exec.emb.lazy_score()
            } else {
                // Rearrange with naive scoring
                for vertex in 0..c_vertices {
                    exec.emb.ruthless_move_to_point(vertex, variation[vertex]);
                }
                exec.emb.score()
            };

            if score < min_score {
                min_emb.fast_copy_from(&exec.emb);
                min_score = score;
                exec.save(score, &min_emb, 3)?;
            }

            exec.c_iter += 1;
        }

        exec.emb.fast_copy_from(&min_emb);
        Ok(())
    }
}
