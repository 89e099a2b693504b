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
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::SaConfig;
use crate::embedding::Embedding;
use crate::strategy::{Executor, Strategy, StrategyError};

/// Neighbourhood move applied per inner tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbourhood {
    /// Weighted-random vertex to a uniformly random point.
    Walk,
    /// Rebuild the rosette around a weighted-random vertex.
    Rebuild,
    /// Rebuild until progress stalls, then walk for good.
    Hybrid,
}

/// Temperature schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooling {
    Exponential,
    Linear,
}

/// Metropolis annealing with restart-to-best outer loops.
///
/// Each outer round resets the working embedding to the best known one
/// and anneals for `loopTime` seconds; rounds repeat until the executor's
/// wall-clock budget closes.
#[derive(Debug)]
pub struct SimulatedAnnealing {
    neighbourhood: Neighbourhood,
    cooling: Cooling,
    rng: StdRng,

    // Outer restarts since the best score improved.
    last_improvement: u64,

    // Latched once the hybrid move switches to walking.
    walk_latched: bool,
}

impl SimulatedAnnealing {
    pub fn new(neighbourhood: Neighbourhood, cooling: Cooling) -> SimulatedAnnealing {
        SimulatedAnnealing {
            neighbourhood,
            cooling,
            rng: StdRng::from_entropy(),
            last_improvement: 0,
            walk_latched: false,
        }
    }

    pub fn seed(&mut self, seed: u64) -> &mut SimulatedAnnealing {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn cool(&self, conf: &SaConfig, temp: f64, iter: u64) -> f64 {
        match self.cooling {
            Cooling::Exponential => temp * conf.exponential.base,
            Cooling::Linear => conf.init_temp - conf.linear.factor * iter as f64,
        }
    }

    fn refactor(&mut self, conf: &SaConfig, emb: &mut Embedding) {
        match self.neighbourhood {
            Neighbourhood::Walk => self.random_walk(conf, emb),
            Neighbourhood::Rebuild => self.rebuild_neighbourhood(conf, emb),
            Neighbourhood::Hybrid => {
                // Walk for good once the switch is latched.
                if self.walk_latched {
                    self.random_walk(conf, emb);
                    return;
                }

                // Latch after two minutes without a best improvement.
                let tolerance = (120.0 / conf.loop_time).ceil();
                if self.last_improvement as f64 >= tolerance {
                    self.walk_latched = true;
                }
                self.rebuild_neighbourhood(conf, emb);
            }
        }
    }

    fn random_walk(&mut self, conf: &SaConfig, emb: &mut Embedding) {
        let vertex = emb.gamma.random_vertex(&mut self.rng, conf.distrib_exp as i32);
        let point = emb.random_point(&mut self.rng);
        emb.tracked_move_or_swap(vertex, point);
    }

    fn rebuild_neighbourhood(&mut self, conf: &SaConfig, emb: &mut Embedding) {
        let vertex = emb.gamma.random_vertex(&mut self.rng, conf.distrib_exp as i32);

        // No rosette without a centre point yet.
        let Some(occupied) = emb.gamma.vertex(vertex).occupied_point else {
            let point = emb.random_point(&mut self.rng);
            emb.tracked_move_or_swap(vertex, point);
            return;
        };

        let mut neighbours = emb.gamma.neighbours(vertex).to_vec();
        let mut nearest = emb.n_nearest_points(occupied, emb.gamma.vertex(vertex).deg);

        neighbours.push(vertex);
        nearest.push(occupied);
        nearest.shuffle(&mut self.rng);

        // Allow points in a far distance
        let prob_far = conf.rebuild_neighbours.choose_far;
        for (i, &neighbour) in neighbours.iter().enumerate() {
            if (self.rng.gen_range(0..100) as f64) < prob_far * 100.0 {
                let point = emb.random_point(&mut self.rng);
                emb.tracked_move_or_swap(neighbour, point);
            } else {
                emb.tracked_move_or_swap(neighbour, nearest[i]);
            }
        }
    }
}

impl Strategy for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        match self.neighbourhood {
            Neighbourhood::Walk => "SimulatedAnnealing[walk]",
            Neighbourhood::Rebuild => "SimulatedAnnealing[rebuild]",
            Neighbourhood::Hybrid => "SimulatedAnnealing[hybrid]",
        }
    }

    fn run(&mut self, exec: &mut Executor) -> Result<(), StrategyError> {
        let conf: SaConfig = exec.load_config("SA.json")?;

        self.last_improvement = 0;
        self.walk_latched = false;

        let mut min_emb = exec.emb.clone();
        let mut copy = exec.emb.clone();
        let mut min_score = min_emb.lazy_score();

        while exec.in_time() {
            let mut curr_iter: u64 = 0;
            let mut temp = conf.init_temp;
            exec.emb.fast_copy_from(&min_emb);

            let start = exec.consumed_secs();
            while ((exec.consumed_secs() - start) as f64) < conf.loop_time && exec.in_time() {
                copy.fast_copy_from(&exec.emb);
                self.refactor(&conf, &mut copy);

                let new_score = copy.lazy_score();
                let old_score = exec.emb.lazy_score();
                let prob = (((old_score - new_score) as f64) / temp).exp() * 100.0;

                if new_score < old_score {
                    exec.emb.fast_copy_from(&copy);

                    if new_score < min_score {
                        min_score = new_score;
                        min_emb.fast_copy_from(&copy);

                        self.last_improvement = 0;
                        exec.save(min_score, &min_emb, 2)?;
                    }
                } else if (self.rng.gen_range(0..100) as f64) <= prob {
                    exec.emb.fast_copy_from(&copy);
                }

                curr_iter += 1;
                exec.c_iter += 1;

                temp = self.cool(&conf, temp, curr_iter);
            }

            self.last_improvement += 1;
        }

        exec.emb.fast_copy_from(&min_emb);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{parse_instance, Io};
    use std::fs;
    use std::path::PathBuf;

    fn sa_config() -> SaConfig {
        SaConfig {
            init_temp: 1.0,
            distrib_exp: 2.0,
            loop_time: 1.0,
            exponential: crate::config::ExponentialCooling { base: 0.995 },
            linear: crate::config::LinearCooling { factor: 0.01 },
            rebuild_neighbours: crate::config::RebuildNeighbours { choose_far: 0.1 },
        }
    }

    /// K5 on a grid: non-planar, so scores stay positive, and every
    /// tracked move must keep the tracker honest.
    fn k5() -> Embedding {
        let data = r#"{
            "width": 10, "height": 10,
            "nodes": [{"id": 0, "x": 0, "y": 0}, {"id": 1, "x": 10, "y": 0},
                      {"id": 2, "x": 10, "y": 10}, {"id": 3, "x": 0, "y": 10},
                      {"id": 4, "x": 5, "y": 5}],
            "edges": [{"source": 0, "target": 1}, {"source": 0, "target": 2},
                      {"source": 0, "target": 3}, {"source": 0, "target": 4},
                      {"source": 1, "target": 2}, {"source": 1, "target": 3},
                      {"source": 1, "target": 4}, {"source": 2, "target": 3},
                      {"source": 2, "target": 4}, {"source": 3, "target": 4}],
            "points": [{"id": 0, "x": 0, "y": 0}, {"id": 1, "x": 10, "y": 0},
                       {"id": 2, "x": 10, "y": 10}, {"id": 3, "x": 0, "y": 10},
                       {"id": 4, "x": 5, "y": 5}, {"id": 5, "x": 3, "y": 7},
                       {"id": 6, "x": 7, "y": 3}]
        }"#;
        let mut emb = parse_instance(data).unwrap().to_embedding().unwrap();
        for v in 0..5 {
            emb.move_to_point(v, v);
        }
        emb
    }

    #[test]
    fn walk_keeps_tracker_parity() {
        let mut emb = k5();
        emb.prepare_tracker();
        let conf = sa_config();
        let mut sa = SimulatedAnnealing::new(Neighbourhood::Walk, Cooling::Exponential);
        sa.seed(5);

        for _ in 0..40 {
            sa.random_walk(&conf, &mut emb);
            assert_eq!(emb.lazy_score(), emb.score());
        }
    }

    #[test]
    fn rebuild_keeps_tracker_parity() {
        let mut emb = k5();
        emb.prepare_tracker();
        let conf = sa_config();
        let mut sa = SimulatedAnnealing::new(Neighbourhood::Rebuild, Cooling::Exponential);
        sa.seed(5);

        for _ in 0..20 {
            sa.rebuild_neighbourhood(&conf, &mut emb);
            assert_eq!(emb.lazy_score(), emb.score());
        }
    }

    #[test]
    fn rebuild_without_binding_degrades_to_a_walk() {
        let data = r#"{
            "nodes": [{"id": 0, "x": 1, "y": 1}, {"id": 1, "x": 2, "y": 2}],
            "edges": [{"source": 0, "target": 1}],
            "points": [{"id": 0, "x": 0, "y": 0}, {"id": 1, "x": 4, "y": 4},
                       {"id": 2, "x": 0, "y": 4}]
        }"#;
        let mut emb = parse_instance(data).unwrap().to_embedding().unwrap();
        emb.prepare_tracker();

        let conf = sa_config();
        let mut sa = SimulatedAnnealing::new(Neighbourhood::Rebuild, Cooling::Exponential);
        sa.seed(1);
        sa.rebuild_neighbourhood(&conf, &mut emb);

        // Exactly one vertex got a point out of the fallback move.
        let bound = emb
            .gamma
            .vertices
            .iter()
            .filter(|v| v.is_occupying())
            .count();
        assert_eq!(bound, 1);
        assert_eq!(emb.lazy_score(), emb.score());
    }

    #[test]
    fn cooling_schedules() {
        let conf = sa_config();
        let exp = SimulatedAnnealing::new(Neighbourhood::Walk, Cooling::Exponential);
        assert_eq!(exp.cool(&conf, 100.0, 17), 99.5);

        let lin = SimulatedAnnealing::new(Neighbourhood::Walk, Cooling::Linear);
        assert_eq!(lin.cool(&conf, 100.0, 10), 1.0 - 0.01 * 10.0);
    }

    #[test]
    fn hybrid_latches_after_stalling() {
        let mut emb = k5();
        emb.prepare_tracker();
        let conf = sa_config();

        let mut sa = SimulatedAnnealing::new(Neighbourhood::Hybrid, Cooling::Exponential);
        sa.seed(5);

        sa.refactor(&conf, &mut emb);
        assert!(!sa.walk_latched);

        // 120 / loopTime restarts without improvement trip the switch.
        sa.last_improvement = 120;
        sa.refactor(&conf, &mut emb);
        assert!(sa.walk_latched);
        assert_eq!(emb.lazy_score(), emb.score());
    }

    #[test]
    fn closed_budget_returns_the_input() {
        let dir = std::env::temp_dir().join(format!("crossmin-sa-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let io = Io::new(dir.clone(), dir).unwrap();
        let conf_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");

        let mut exec = Executor::from_embedding("k5", k5(), io, conf_dir);
        exec.max_time = 0;
        let before_score = exec.emb.score();

        let mut sa = SimulatedAnnealing::new(Neighbourhood::Walk, Cooling::Exponential);
        sa.seed(5);
        sa.run(&mut exec).unwrap();

        assert_eq!(exec.emb.score(), before_score);
        assert_eq!(exec.c_iter, 0);
    }
}
