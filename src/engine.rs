//! Adapter for the external binary-integer-programming engine.
//!
//! The formulation side only produces variables, an objective and a list of
//! constraints; this module owns the engine configuration (wall-clock limit,
//! relative gap, worker threads, log verbosity) and the interpretation of the
//! engine's terminal outcome. An infeasible model or a run without incumbent
//! is a hard error here, so extraction can rely on a complete assignment.

use std::time::Instant;

use good_lp::{
    default_solver, Constraint, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel,
};
use log::info;

use crate::Error;

/// Bounded run configuration for one solver invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Wall-clock limit in seconds
    pub time_limit: f64,
    /// Relative optimality gap at which an incumbent is accepted
    pub mip_gap: f64,
    /// Worker thread hint for the engine; 0 means one per CPU core
    pub threads: u32,
    /// Forward engine progress output to the console
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            time_limit: 120.0,
            mip_gap: 0.1,
            threads: 4,
            verbose: true,
        }
    }
}

impl RunConfig {
    pub fn effective_threads(&self) -> u32 {
        if self.threads == 0 {
            num_cpus::get() as u32
        } else {
            self.threads
        }
    }

    /// One-line description of the outcome contract, recorded with every
    /// schedule produced under this configuration. The engine hands back any
    /// incumbent within the configured gap, so a proven optimum and a
    /// gap-bound solution are deliberately not told apart downstream.
    pub fn status_line(&self) -> String {
        format!(
            "usable incumbent (optimal or within {:.0}% gap, {:.0}s limit, {} threads)",
            self.mip_gap * 100.0,
            self.time_limit,
            self.effective_threads()
        )
    }
}

/// Hand the assembled problem to the engine and wait for a terminal status.
///
/// Returns the full variable assignment of the incumbent. Both "proven
/// optimal" and "feasible within the configured gap" count as usable;
/// infeasibility and engine termination without any incumbent surface as the
/// distinct [`Error::Infeasible`] and [`Error::NoIncumbent`] conditions.
pub fn run(
    vars: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    config: &RunConfig,
) -> Result<impl Solution, Error> {
    let started = Instant::now();
    info!(
        "Invoking the MILP engine with {} constraints (limit {:.0}s, rel. gap {:.0}%, {} threads)",
        constraints.len(),
        config.time_limit,
        config.mip_gap * 100.0,
        config.effective_threads()
    );

    let mut model = vars
        .maximise(objective)
        .using(default_solver)
        .set_option("time_limit", config.time_limit)
        .set_option("mip_rel_gap", config.mip_gap)
        .set_option("threads", config.effective_threads() as i32)
        .set_option("output_flag", config.verbose);
    for constraint in constraints {
        model.add_constraint(constraint);
    }

    match model.solve() {
        Ok(solution) => {
            info!("Engine returned a usable incumbent after {:.2?}", started.elapsed());
            Ok(solution)
        }
        Err(ResolutionError::Infeasible) => Err(Error::Infeasible),
        Err(other) => Err(Error::NoIncumbent(other.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_matches_the_run_contract() {
        let config = RunConfig::default();
        assert_eq!(config.time_limit, 120.0);
        assert_eq!(config.mip_gap, 0.1);
        assert_eq!(config.threads, 4);
        assert!(config.verbose);
    }

    #[test]
    fn zero_threads_falls_back_to_core_count() {
        let config = RunConfig {
            threads: 0,
            ..RunConfig::default()
        };
        assert!(config.effective_threads() >= 1);
    }
}
