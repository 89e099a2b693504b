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

//! The metaheuristic strategy family.

mod analysis;
mod annealing;
mod bruteforce;
mod force_directed;
mod greedy;

pub use analysis::Analysis;
pub use annealing::{Cooling, Neighbourhood, SimulatedAnnealing};
pub use bruteforce::Bruteforce;
pub use force_directed::{ForceDirected, ForceModel};
pub use greedy::Greedy;
