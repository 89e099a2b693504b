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

use std::io::Write;

use crate::strategy::{Executor, Strategy, StrategyError};

/// Reports instance statistics. The embedding is left untouched.
#[derive(Debug, Default)]
pub struct Analysis;

impl Strategy for Analysis {
    fn name(&self) -> &'static str {
        "Analysis"
    }

    fn run(&mut self, exec: &mut Executor) -> Result<(), StrategyError> {
        let emb = &exec.emb;

        let mut min_deg = usize::MAX;
        let mut max_deg = 0;
        let mut sum_deg = 0;
        for vertex in &emb.gamma.vertices {
            min_deg = min_deg.min(vertex.deg);
            max_deg = max_deg.max(vertex.deg);
            sum_deg += vertex.deg;
        }
        if emb.gamma.vertices.is_empty() {
            min_deg = 0;
        }
        let avg_deg = sum_deg as f64 / emb.gamma.vertices.len().max(1) as f64;

        // One held lock for the whole report.
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out);
        let _ = writeln!(out, "Analysis report of {}", exec.name);
        let _ = writeln!(out, "|V| = {}", emb.gamma.vertices.len());
        let _ = writeln!(out, "|E| = {}", emb.gamma.edges.len());
        let _ = writeln!(out, "|P| = {}", emb.points.len());
        let _ = writeln!(out, "minDegree = {min_deg}");
        let _ = writeln!(out, "maxDegree = {max_deg}");
        let _ = writeln!(out, "avgDegree = {avg_deg}");
        let _ = writeln!(out, "size = {}x{}", emb.width, emb.height);
        let _ = writeln!(out);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{parse_instance, Io};
    use std::path::PathBuf;

    #[test]
    fn analysis_does_not_mutate() {
        let data = r#"{
            "nodes": [{"id": 0, "x": 0, "y": 0}, {"id": 1, "x": 5, "y": 5}],
            "edges": [{"source": 0, "target": 1}],
            "points": [{"id": 0, "x": 0, "y": 0}, {"id": 1, "x": 5, "y": 5}]
        }"#;
        let emb = parse_instance(data).unwrap().to_embedding().unwrap();

        let dir = std::env::temp_dir().join(format!("crossmin-analysis-{}", std::process::id()));
        let io = Io::new(dir.clone(), dir.clone()).unwrap();
        let mut exec = Executor::from_embedding("probe", emb, io, PathBuf::new());

        let before = exec.emb.clone();
        Analysis.run(&mut exec).unwrap();
        assert_eq!(before.gamma.vertices, exec.emb.gamma.vertices);
        assert_eq!(before.points, exec.emb.points);
    }
}
