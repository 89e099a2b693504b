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

//! Per-strategy configuration records, one JSON file per strategy.
//!
//! Field names mirror the config files (`useTracker`, `maxIter`, ...), so
//! a config directory is interchangeable between solver builds.

use std::path::Path;

use derive_more::{Display, Error};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// An error while loading a strategy configuration.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// The config file is absent or unreadable.
    #[display("missing config {file}: {source}")]
    Missing {
        file: String,
        source: std::io::Error,
    },
    /// The config file did not parse.
    #[display("invalid config {file}: {source}")]
    Invalid {
        file: String,
        source: serde_json::Error,
    },
}

/// Reads `<dir>/<file>` into a config record.
pub fn load_config<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ConfigError> {
    let data = std::fs::read_to_string(dir.join(file)).map_err(|source| ConfigError::Missing {
        file: file.to_string(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Invalid {
        file: file.to_string(),
        source,
    })
}

/// `bruteforce.json`.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct BruteforceConfig {
    #[serde(rename = "useTracker")]
    pub use_tracker: bool,
}

/// `greedy.json`.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct GreedyConfig {
    #[serde(rename = "useFast")]
    pub use_fast: bool,
    #[serde(rename = "useSlow")]
    pub use_slow: bool,
}

/// `FDA.json`.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct FdaConfig {
    #[serde(rename = "maxIter")]
    pub max_iter: u64,
    #[serde(rename = "maxDiff")]
    pub max_diff: f64,
    pub cool: f64,
    pub spring: SpringConfig,
    pub fruchtrhein: FruchtermanReingoldConfig,
}

/// Kernel constants of the Eades spring embedder.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct SpringConfig {
    pub repl: f64,
    pub attr: f64,
    pub len: f64,
}

/// Kernel constants of Fruchterman-Reingold.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct FruchtermanReingoldConfig {
    pub len: f64,
}

/// `SA.json`.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct SaConfig {
    #[serde(rename = "initTemp")]
    pub init_temp: f64,
    #[serde(rename = "distribExp")]
    pub distrib_exp: f64,
    #[serde(rename = "loopTime")]
    pub loop_time: f64,
    pub exponential: ExponentialCooling,
    pub linear: LinearCooling,
    #[serde(rename = "rebuild-neighbours")]
    pub rebuild_neighbours: RebuildNeighbours,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ExponentialCooling {
    pub base: f64,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct LinearCooling {
    pub factor: f64,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct RebuildNeighbours {
    #[serde(rename = "chooseFar")]
    pub choose_far: f64,
}
