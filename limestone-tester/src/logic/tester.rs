use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::seeds::SeedInfo;
use crate::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub share_code: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    /// Run `scenario` once per compatible seed. Share-code seeds only run
    /// scenarios on the tier they encode.
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let tier = scenario.plan.difficulty;
        seeds
            .iter()
            .filter(|seed| seed.matches_tier(tier))
            .map(|seed| {
                if self.tester.verbose() {
                    println!(
                        "🧪 Testing scenario: {} (tier: {} seed: {})",
                        scenario.name.bright_white(),
                        tier,
                        seed.seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let iterations = iterations.max(1);
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed.seed, iterations);

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed: seed.seed,
            share_code: seed.share_code_for(scenario.plan.difficulty),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let verbose = self.tester.verbose();
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = self.tester.run_plan(plan, iteration_seed);

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_rounds(&summary);
                failures.push(format!(
                    "Iteration {} (tier {}, strategy {}, seed {}, rounds {}, '{}'): {} | {}",
                    i + 1,
                    summary.difficulty,
                    summary.strategy.label(),
                    summary.seed,
                    summary.outcomes.len(),
                    summary.ending_message(),
                    err,
                    context
                ));
                if verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                    println!("     ↳ Seed {} | Rounds: {}", summary.seed, context);
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);
                if verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) {} strategy:{}",
                        i + 1,
                        iterations,
                        summary.ending_message(),
                        summary.strategy.label()
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    plan.expectations
        .iter()
        .find_map(|expectation| expectation.evaluate(summary).err())
        .map(|err| format!("{err:#}"))
}

/// Last three rounds, newest first.
fn summarize_rounds(summary: &SimulationSummary) -> String {
    if summary.outcomes.is_empty() {
        return "no rounds recorded".to_string();
    }
    summary
        .outcomes
        .iter()
        .rev()
        .take(3)
        .map(|outcome| {
            let distance = outcome
                .distance_m
                .map_or_else(|| "skipped".to_string(), |d| format!("{d:.0}m"));
            format!(
                "round {} ({}): {} pts, {}, {} hints",
                outcome.round, outcome.landmark.id, outcome.score, distance, outcome.hints_used
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis.into_iter().map(Duration::from_millis).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::GuessStrategy;
    use limestone_game::Difficulty;

    fn scenario(plan: SimulationPlan) -> TestScenario {
        TestScenario::new("fixture", "fixture scenario", plan)
    }

    #[test]
    fn passing_scenario_counts_every_iteration() {
        let tester = LogicTester::new(GameTester::try_new(false).unwrap());
        let plan = SimulationPlan::new(Difficulty::Easy, GuessStrategy::Perfect).with_expectation(
            |summary: &SimulationSummary| {
                anyhow::ensure!(summary.metrics.score == 25_000, "score {}", summary.metrics.score);
                Ok(())
            },
        );
        let results = tester.run_scenario(&scenario(plan), &[SeedInfo::from_numeric(5)], 3);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.passed);
        assert_eq!(result.iterations_run, 3);
        assert_eq!(result.successful_iterations, 3);
        assert_eq!(result.performance_data.len(), 3);
        assert!(result.share_code.starts_with("EZ-"));
    }

    #[test]
    fn failing_expectation_is_reported_with_context() {
        let tester = LogicTester::new(GameTester::try_new(false).unwrap());
        let plan = SimulationPlan::new(Difficulty::Easy, GuessStrategy::Skipper).with_expectation(
            |summary: &SimulationSummary| {
                anyhow::ensure!(summary.metrics.score > 0, "skipper scored nothing");
                Ok(())
            },
        );
        let results = tester.run_scenario(&scenario(plan), &[SeedInfo::from_numeric(1)], 2);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("skipper scored nothing"));
        assert!(result.failures[0].contains("skipped"));
    }

    #[test]
    fn share_code_seeds_only_run_their_tier() {
        let tester = LogicTester::new(GameTester::try_new(false).unwrap());
        let (tier, seed) = limestone_game::decode_to_seed("HD-GRANT01").unwrap();
        let seeds = [SeedInfo::from_share_code(seed, tier, "HD-GRANT01".to_string())];
        let easy = scenario(SimulationPlan::new(Difficulty::Easy, GuessStrategy::Perfect));
        assert!(tester.run_scenario(&easy, &seeds, 1).is_empty());
        let hard = scenario(SimulationPlan::new(Difficulty::Hard, GuessStrategy::Perfect));
        let results = tester.run_scenario(&hard, &seeds, 1);
        assert_eq!(results[0].share_code, "HD-GRANT01");
    }

    #[test]
    fn scenario_result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1,
            share_code: "MD-GRANT01".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(12));
    }
}
