use anyhow::{Context, Result, ensure};
use std::collections::BTreeMap;

use crate::logic::game_tester::{GameTester, PlayabilityMetrics, SimulationPlan, SimulationSummary};
use crate::logic::policy::GuessStrategy;
use crate::logic::seeds::SeedInfo;
use limestone_game::Difficulty;
use limestone_game::constants::MAX_ROUND_SCORE;

/// Every tier crossed with every strategy.
fn playability_matrix() -> Vec<(Difficulty, GuessStrategy)> {
    Difficulty::ALL
        .into_iter()
        .flat_map(|tier| GuessStrategy::ALL.into_iter().map(move |s| (tier, s)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct PlayabilityRecord {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub strategy: GuessStrategy,
    pub seed_code: String,
    pub seed_value: u64,
    pub metrics: PlayabilityMetrics,
}

#[derive(Debug, Clone)]
pub struct PlayabilityAggregate {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub strategy: GuessStrategy,
    pub iterations: usize,
    pub mean_score: f64,
    pub std_score: f64,
    pub min_score: u32,
    pub max_score: u32,
    pub mean_accuracy: f64,
    pub mean_avg_distance: f64,
    pub mean_hints: f64,
    pub skip_rate: f64,
    pub perfect_round_rate: f64,
}

pub fn run_playability_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
) -> Result<Vec<PlayabilityRecord>> {
    let iterations = iterations.max(1);
    let matrix = playability_matrix();
    let mut records = Vec::with_capacity(seeds.len() * matrix.len() * iterations);

    for (difficulty, strategy) in matrix {
        for seed in seeds.iter().filter(|seed| seed.matches_tier(difficulty)) {
            for iteration in 0..iterations {
                let iteration_seed =
                    seed.seed.wrapping_add(u64::try_from(iteration).unwrap_or(0));
                let plan = SimulationPlan::new(difficulty, strategy)
                    .with_expectation(session_completed_expectation);
                // Fresh anti-repeat memory so a seed always replays the same landmarks.
                let summary = tester.isolated().run_plan(&plan, iteration_seed);
                let context = format!(
                    "Playability expectation failed for tier {difficulty}, strategy {strategy}, seed {} (iteration {})",
                    seed.seed,
                    iteration + 1
                );
                for expectation in &plan.expectations {
                    expectation
                        .evaluate(&summary)
                        .with_context(|| context.clone())?;
                }

                records.push(PlayabilityRecord {
                    scenario_name: scenario_label(difficulty, strategy),
                    difficulty,
                    strategy,
                    seed_code: seed.share_code_for(difficulty),
                    seed_value: iteration_seed,
                    metrics: summary.metrics,
                });
            }
        }
    }

    Ok(records)
}

fn scenario_label(difficulty: Difficulty, strategy: GuessStrategy) -> String {
    let tier = match difficulty {
        Difficulty::Easy => "Easy",
        Difficulty::Medium => "Medium",
        Difficulty::Hard => "Hard",
    };
    format!("{tier} - {strategy}")
}

fn session_completed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.started, "session did not start");
    let result = summary
        .summary
        .as_ref()
        .context("session finished without a summary")?;
    ensure!(
        result.rounds_played == result.total_rounds,
        "played {} of {} rounds",
        result.rounds_played,
        result.total_rounds
    );
    ensure!(result.accuracy <= 100, "accuracy {} over 100", result.accuracy);
    Ok(())
}

pub fn aggregate_playability(records: &[PlayabilityRecord]) -> Vec<PlayabilityAggregate> {
    let mut aggregates: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    for record in records {
        aggregates
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(&record.metrics);
    }
    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// Checks that hold for any landmark set: perfect play maxes out, skipping
/// scores nothing, and every other strategy lands between the two.
pub fn validate_playability_targets(
    aggregates: &[PlayabilityAggregate],
    records: &[PlayabilityRecord],
) -> Result<()> {
    for record in records {
        let m = &record.metrics;
        match record.strategy {
            GuessStrategy::Perfect => {
                ensure!(
                    m.score == MAX_ROUND_SCORE * m.rounds_played && m.accuracy == 100,
                    "{} seed {}: perfect play scored {} at {}% accuracy",
                    record.scenario_name,
                    record.seed_code,
                    m.score,
                    m.accuracy
                );
            }
            GuessStrategy::Skipper => {
                ensure!(
                    m.score == 0 && m.skipped == m.rounds_played,
                    "{} seed {}: skipping scored {}",
                    record.scenario_name,
                    record.seed_code,
                    m.score
                );
            }
            _ => {}
        }
    }

    for tier in Difficulty::ALL {
        let in_tier: Vec<&PlayabilityAggregate> =
            aggregates.iter().filter(|a| a.difficulty == tier).collect();
        let mean_of = |strategy| {
            in_tier
                .iter()
                .find(|a| a.strategy == strategy)
                .map(|a| a.mean_score)
        };
        let (Some(best), Some(worst)) = (
            mean_of(GuessStrategy::Perfect),
            mean_of(GuessStrategy::Skipper),
        ) else {
            continue;
        };
        for aggregate in &in_tier {
            ensure!(
                aggregate.mean_score <= best && aggregate.mean_score >= worst,
                "{} mean score {:.0} falls outside [{worst:.0}, {best:.0}]",
                aggregate.scenario_name,
                aggregate.mean_score
            );
        }
    }
    Ok(())
}

struct AggregateBuilder {
    scenario_name: String,
    difficulty: Difficulty,
    strategy: GuessStrategy,
    iterations: u32,
    stats_score: RunningStats,
    min_score: u32,
    max_score: u32,
    accuracy_sum: f64,
    distance_sum: f64,
    hints_sum: u32,
    skipped_sum: u32,
    perfect_sum: u32,
    rounds_sum: u32,
}

impl AggregateBuilder {
    fn new(record: &PlayabilityRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            difficulty: record.difficulty,
            strategy: record.strategy,
            iterations: 0,
            stats_score: RunningStats::default(),
            min_score: u32::MAX,
            max_score: 0,
            accuracy_sum: 0.0,
            distance_sum: 0.0,
            hints_sum: 0,
            skipped_sum: 0,
            perfect_sum: 0,
            rounds_sum: 0,
        }
    }

    fn ingest(&mut self, metrics: &PlayabilityMetrics) {
        self.iterations += 1;
        self.stats_score.add(f64::from(metrics.score));
        self.min_score = self.min_score.min(metrics.score);
        self.max_score = self.max_score.max(metrics.score);
        self.accuracy_sum += f64::from(metrics.accuracy);
        self.distance_sum += metrics.avg_distance;
        self.hints_sum = self.hints_sum.saturating_add(metrics.hints_used);
        self.skipped_sum = self.skipped_sum.saturating_add(metrics.skipped);
        self.perfect_sum = self.perfect_sum.saturating_add(metrics.perfect_rounds);
        self.rounds_sum = self.rounds_sum.saturating_add(metrics.rounds_played);
    }

    fn finish(self) -> PlayabilityAggregate {
        let denom = f64::from(self.iterations.max(1));
        let rounds = f64::from(self.rounds_sum.max(1));
        PlayabilityAggregate {
            scenario_name: self.scenario_name,
            difficulty: self.difficulty,
            strategy: self.strategy,
            iterations: usize::try_from(self.iterations).unwrap_or(usize::MAX),
            mean_score: self.stats_score.mean(),
            std_score: self.stats_score.std_dev(),
            min_score: if self.iterations == 0 { 0 } else { self.min_score },
            max_score: self.max_score,
            mean_accuracy: self.accuracy_sum / denom,
            mean_avg_distance: self.distance_sum / denom,
            mean_hints: f64::from(self.hints_sum) / denom,
            skip_rate: f64::from(self.skipped_sum) / rounds,
            perfect_round_rate: f64::from(self.perfect_sum) / rounds,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}
