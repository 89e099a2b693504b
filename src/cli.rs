//! The CrossMin command line interface.

use std::path::{Path, PathBuf};
use std::thread;

use clap::Parser;
use derive_more::{Display, Error, From};

use crate::config::ConfigError;
use crate::json::{InstanceError, Io};
use crate::strategies::{
    Analysis, Bruteforce, Cooling, ForceDirected, ForceModel, Greedy, Neighbourhood,
    SimulatedAnnealing,
};
use crate::strategy::{Executor, Strategy, StrategyError};

/// CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "crossmin", version)]
#[command(about = "Minimising crossings in point-set embeddings")]
pub struct Cli {
    /// Input directory or file path
    #[arg(short = 'i', long = "inputPath")]
    pub input_path: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "outputPath")]
    pub output_path: PathBuf,

    /// Config directory
    #[arg(short = 'c', long = "configPath", default_value = "../config/")]
    pub config_path: PathBuf,

    /// Sequence of strategies to be applied (+-separated)
    #[arg(short = 's', long = "strategy")]
    pub strategy: String,

    /// Enable multiple file mode
    #[arg(short = 'm', long = "multiple")]
    pub multiple: bool,

    /// Maximal time limit in minutes
    #[arg(short = 't', long = "time", default_value_t = 50)]
    pub time: u64,
}

/// Error type for the CLI.
#[derive(Debug, Display, Error, From)]
pub enum CliError {
    /// Error reading or writing an instance.
    #[display("{_0}")]
    #[from]
    Instance(InstanceError),
    /// Error loading a strategy configuration.
    #[display("{_0}")]
    #[from]
    Config(ConfigError),
    /// Error escalated out of a strategy run.
    #[display("{_0}")]
    #[from]
    Strategy(StrategyError),
    /// The strategy sequence names an unimplemented token.
    #[display("unrecognised strategy: {token}")]
    UnknownStrategy { token: String },
    /// One or more workers failed in multiple file mode.
    #[display("{failed} worker(s) failed")]
    Workers { failed: usize },
}

/// Builds the strategy named by a lowercased token.
fn strategy_for(token: &str) -> Result<Box<dyn Strategy>, CliError> {
    match token {
        "bruteforce" => Ok(Box::new(Bruteforce)),
        "greedy" => Ok(Box::new(Greedy)),
        "analysis" => Ok(Box::new(Analysis)),
        "fda[fr]" => Ok(Box::new(ForceDirected::new(ForceModel::FruchtermanReingold))),
        "fda[spring]" => Ok(Box::new(ForceDirected::new(ForceModel::Spring))),
        "sa[walk]" => Ok(Box::new(SimulatedAnnealing::new(
            Neighbourhood::Walk,
            Cooling::Exponential,
        ))),
        "sa[rebuild]" => Ok(Box::new(SimulatedAnnealing::new(
            Neighbourhood::Rebuild,
            Cooling::Exponential,
        ))),
        "sa[hybrid]" => Ok(Box::new(SimulatedAnnealing::new(
            Neighbourhood::Hybrid,
            Cooling::Exponential,
        ))),
        _ => Err(CliError::UnknownStrategy {
            token: token.to_string(),
        }),
    }
}

/// Runs the configured strategy sequence on one executor.
fn process(exec: &mut Executor, cli: &Cli) -> Result<(), CliError> {
    exec.max_time = cli.time;

    let seq = cli.strategy.to_lowercase();
    for token in seq.split('+') {
        let mut strategy = strategy_for(token)?;
        exec.run(strategy.as_mut())?;
    }
    Ok(())
}

impl Cli {
    pub fn run(self) -> Result<(), CliError> {
        if self.multiple {
            self.run_multiple()
        } else {
            self.run_single()
        }
    }

    /// Single file mode: the input path names one instance, processed on
    /// the calling thread.
    fn run_single(&self) -> Result<(), CliError> {
        let file_name = self
            .input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let input_dir = self
            .input_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let io = Io::new(input_dir, self.output_path.clone())?;
        let mut exec = Executor::new(&file_name, io, self.config_path.clone())?;
        process(&mut exec, self)?;

        println!();
        println!("All threads terminated successfully.");
        println!();
        Ok(())
    }

    /// Multiple file mode: every `.json` in the input directory gets its
    /// own worker thread. Workers surface their own fatal errors and the
    /// peers continue.
    fn run_multiple(&self) -> Result<(), CliError> {
        let io = Io::new(self.input_path.clone(), self.output_path.clone())?;

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.input_path).map_err(InstanceError::from)? {
            let path = entry.map_err(InstanceError::from)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(name) = path.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }

        let mut failed = 0;
        thread::scope(|scope| {
            let mut workers = Vec::new();
            for name in &names {
                let io = io.clone();
                workers.push(scope.spawn(move || -> Result<(), CliError> {
                    let mut exec = Executor::new(name, io, self.config_path.clone())?;
                    process(&mut exec, self)
                }));
            }

            for worker in workers {
                match worker.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        eprintln!("{err}");
                        failed += 1;
                    }
                    Err(_) => {
                        eprintln!("worker thread panicked");
                        failed += 1;
                    }
                }
            }
        });

        if failed > 0 {
            return Err(CliError::Workers { failed });
        }

        println!();
        println!("All threads terminated successfully.");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_token_resolves() {
        for token in [
            "bruteforce",
            "greedy",
            "analysis",
            "fda[fr]",
            "fda[spring]",
            "sa[walk]",
            "sa[rebuild]",
            "sa[hybrid]",
        ] {
            assert!(strategy_for(token).is_ok(), "token {token} did not resolve");
        }
    }

    #[test]
    fn unknown_tokens_are_fatal() {
        let err = strategy_for("sa[warp]").unwrap_err();
        assert!(matches!(err, CliError::UnknownStrategy { .. }));
    }

    #[test]
    fn sequences_are_lowercased_before_lookup() {
        // Parsing itself happens in process(); mimic its normalisation.
        let seq = "FDA[Spring]+Greedy".to_lowercase();
        for token in seq.split('+') {
            assert!(strategy_for(token).is_ok());
        }
    }
}
