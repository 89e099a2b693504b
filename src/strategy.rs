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

//! The strategy interface and the executor driving strategy sequences.

use std::collections::BinaryHeap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use derive_more::{Display, Error, From};

use crate::config::{self, ConfigError};
use crate::embedding::Embedding;
use crate::json::{InstanceError, Io};
use crate::util::pretty_time;

/// An error escalated out of a strategy run.
#[derive(Debug, Display, Error, From)]
#[non_exhaustive]
pub enum StrategyError {
    /// A strategy configuration could not be loaded.
    #[display("{_0}")]
    Config(ConfigError),
    /// Persisting or loading a drawing failed.
    #[display("{_0}")]
    Instance(InstanceError),
}

/// An optimisation pass over the executor's embedding.
///
/// Strategies mutate `exec.emb` in place; the executor logs and persists
/// the result after each run.
pub trait Strategy: std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn run(&mut self, exec: &mut Executor) -> Result<(), StrategyError>;
}

/// Drives strategies over one loaded instance under a wall-clock budget.
pub struct Executor {
    /// Instance name, keying every persisted drawing.
    pub name: String,

    pub emb: Embedding,
    pub io: Io,

    /// Directory holding the per-strategy config files.
    pub conf_dir: PathBuf,

    /// Maximal time consumption in minutes.
    pub max_time: u64,

    /// Iterations executed by the strategies run so far.
    pub c_iter: u64,

    init_time: Instant,
    interim_scores: BinaryHeap<i64>,
}

impl Executor {
    /// Loads `file_name` through `io` and prepares an executor for it.
    pub fn new(file_name: &str, mut io: Io, conf_dir: PathBuf) -> Result<Executor, InstanceError> {
        let emb = io.load(file_name)?;
        let path = Path::new(file_name);
        let name = if path.extension().is_some_and(|ext| ext == "json") {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.to_string())
        } else {
            file_name.to_string()
        };
        Ok(Executor::from_embedding(name, emb, io, conf_dir))
    }

    /// Wraps an already-built embedding.
    pub fn from_embedding(
        name: impl Into<String>,
        emb: Embedding,
        io: Io,
        conf_dir: PathBuf,
    ) -> Executor {
        Executor {
            name: name.into(),
            emb,
            io,
            conf_dir,
            max_time: 50,
            c_iter: 0,
            init_time: Instant::now(),
            interim_scores: BinaryHeap::new(),
        }
    }

    /// Runs one strategy, reports, and persists the final drawing.
    pub fn run(&mut self, strategy: &mut dyn Strategy) -> Result<(), StrategyError> {
        strategy.run(self)?;
        let score = self.emb.score();

        {
            // One held lock, so parallel workers report legibly.
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Finished execution of {} for {}.",
                strategy.name(),
                self.name
            );
            let _ = write!(
                out,
                "Time: {}, Score: {}",
                pretty_time(self.consumed_millis()),
                score
            );
            if self.c_iter > 0 {
                let _ = write!(out, ", Executions: {}", self.c_iter);
            }
            let _ = writeln!(out);
            let _ = writeln!(out);
        }

        // Only keep the final drawing
        self.prune_interim(0);
        self.interim_scores.push(score);
        self.io
            .save(&self.emb, &format!("{}-{}.json", self.name, score))?;
        Ok(())
    }

    /// Persists an interim drawing, keeping only the `keep_old` best
    /// previous results.
    pub fn save(
        &mut self,
        score: i64,
        emb: &Embedding,
        keep_old: usize,
    ) -> Result<(), InstanceError> {
        self.prune_interim(keep_old);
        self.interim_scores.push(score);
        self.io.save(emb, &format!("{}-{}.json", self.name, score))
    }

    /// Pops the worst retained scores and deletes their files, best
    /// effort.
    fn prune_interim(&mut self, keep: usize) {
        while self.interim_scores.len() > keep {
            if let Some(worst) = self.interim_scores.pop() {
                let file = format!("{}-{}.json", self.name, worst);
                let _ = std::fs::remove_file(self.io.output_dir.join(file));
            }
        }
    }

    /// Is the wall-clock budget still open?
    pub fn in_time(&self) -> bool {
        self.init_time.elapsed() < Duration::from_secs(self.max_time * 60)
    }

    /// Milliseconds since initialisation.
    pub fn consumed_millis(&self) -> u128 {
        self.init_time.elapsed().as_millis()
    }

    /// Whole seconds since initialisation.
    pub fn consumed_secs(&self) -> u64 {
        self.init_time.elapsed().as_secs()
    }

    /// Reads a strategy config from the executor's config directory.
    pub fn load_config<T: serde::de::DeserializeOwned>(
        &self,
        file: &str,
    ) -> Result<T, ConfigError> {
        config::load_config(&self.conf_dir, file)
    }
}
