use anyhow::{Context, Result, ensure};
use limestone_game::constants::{HINT_PENALTY, MAX_ROUND_SCORE, MIN_GUESS_SCORE};
use limestone_game::{
    Difficulty, EventLog, GameConfig, GameEngine, GameEvent, JsonFileScoreStore, LandmarkCatalog,
    LeaderboardClient, MemoryLeaderboard, MemoryScoreStore, NoopObserver, ScoreStore, SessionEngine, SessionPhase, decode_to_seed,
    distance_meters, encode_friendly, parse_seed, round_score, score_for_distance,
};
use std::collections::HashSet;

use super::TestScenario;
use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::policy::GuessStrategy;

pub fn build(key: &str) -> Option<TestScenario> {
    let scenario = match key {
        "smoke" => TestScenario::new(
            "Smoke",
            "Noisy medium session completes with consistent totals and events",
            plan(Difficulty::Medium, GuessStrategy::Noisy).with_expectation(smoke_expectation),
        ),
        "perfect-run" => TestScenario::new(
            "Perfect Run",
            "Exact guesses on hard score the maximum",
            plan(Difficulty::Hard, GuessStrategy::Perfect).with_expectation(perfect_expectation),
        ),
        "hint-penalty" => TestScenario::new(
            "Hint Penalty",
            "Every revealed hint costs its penalty",
            plan(Difficulty::Medium, GuessStrategy::Hinter).with_expectation(hint_expectation),
        ),
        "skip-everything" => TestScenario::new(
            "Skip Everything",
            "Skipped rounds score zero but still count towards averages",
            plan(Difficulty::Easy, GuessStrategy::Skipper).with_expectation(skip_expectation),
        ),
        "share-code-roundtrip" => TestScenario::new(
            "Share Code Roundtrip",
            "Share codes decode, re-encode, and start sessions on their tier",
            plan(Difficulty::Medium, GuessStrategy::Sharp).with_expectation(share_code_expectation),
        ),
        "deterministic-sessions" => TestScenario::new(
            "Deterministic Sessions",
            "Same seed and fresh catalog replay the same session",
            plan(Difficulty::Medium, GuessStrategy::Noisy)
                .with_expectation(deterministic_expectation),
        ),
        "anti-repeat" => TestScenario::new(
            "Anti Repeat",
            "No landmark repeats inside a session",
            plan(Difficulty::Medium, GuessStrategy::Perfect)
                .with_expectation(anti_repeat_expectation),
        ),
        "guard-rails" => TestScenario::new(
            "Guard Rails",
            "Out-of-phase calls are ignored",
            plan(Difficulty::Easy, GuessStrategy::Perfect).with_expectation(guard_rail_expectation),
        ),
        "scoring-curve" => TestScenario::new(
            "Scoring Curve",
            "Wild guesses follow the distance curve",
            plan(Difficulty::Medium, GuessStrategy::Wild).with_expectation(scoring_curve_expectation),
        ),
        "best-score-persistence" => TestScenario::new(
            "Best Score Persistence",
            "New bests persist and lower scores leave them alone",
            plan(Difficulty::Easy, GuessStrategy::Sharp).with_expectation(best_score_expectation),
        ),
        "leaderboard-roundtrip" => TestScenario::new(
            "Leaderboard Roundtrip",
            "Finished sessions submit to a room board and rank correctly",
            plan(Difficulty::Easy, GuessStrategy::Sharp).with_expectation(leaderboard_expectation),
        ),
        _ => return None,
    };
    Some(scenario)
}

const fn plan(difficulty: Difficulty, strategy: GuessStrategy) -> SimulationPlan {
    SimulationPlan::new(difficulty, strategy)
}

fn finished(summary: &SimulationSummary) -> Result<&limestone_game::SessionSummary> {
    ensure!(summary.started, "session did not start");
    summary
        .summary
        .as_ref()
        .context("session has no summary")
}

fn count_events(summary: &SimulationSummary, predicate: impl Fn(&GameEvent) -> bool) -> usize {
    summary.events.iter().filter(|event| predicate(event)).count()
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = finished(summary)?;
    ensure!(result.total_rounds == 10, "medium should have 10 rounds");
    ensure!(
        result.rounds_played == result.total_rounds,
        "played {} of {}",
        result.rounds_played,
        result.total_rounds
    );
    let sum = summary
        .outcomes
        .iter()
        .fold(0_u32, |acc, outcome| acc + outcome.score);
    ensure!(sum == result.score, "round scores sum to {sum}, summary says {}", result.score);
    let rounds = summary.outcomes.len();
    ensure!(
        count_events(summary, |e| matches!(e, GameEvent::RoundStarted { .. })) == rounds,
        "one round_started per round"
    );
    ensure!(
        count_events(summary, |e| matches!(e, GameEvent::PhotoReady { .. })) == rounds,
        "one photo per round"
    );
    ensure!(
        count_events(summary, |e| matches!(e, GameEvent::SessionFinished(_))) == 1,
        "session_finished fires once"
    );
    ensure!(
        matches!(summary.events.last(), Some(GameEvent::SessionFinished(_))),
        "session_finished is the last notification"
    );
    Ok(())
}

fn perfect_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = finished(summary)?;
    ensure!(result.score == MAX_ROUND_SCORE * 15, "perfect hard run scored {}", result.score);
    ensure!(result.accuracy == 100, "accuracy {}", result.accuracy);
    ensure!(result.avg_distance < 1e-6, "avg distance {}", result.avg_distance);
    ensure!(summary.metrics.perfect_rounds == 15, "every round should be perfect");
    ensure!(
        result.share_text().contains("75,000"),
        "share text should carry the grouped score"
    );
    Ok(())
}

fn hint_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = finished(summary)?;
    let mut total_hints = 0;
    for outcome in &summary.outcomes {
        ensure!(
            outcome.hints_used == outcome.landmark.hints.len(),
            "round {} used {} of {} hints",
            outcome.round,
            outcome.hints_used,
            outcome.landmark.hints.len()
        );
        let distance = outcome.distance_m.context("hinter never skips")?;
        let penalty = HINT_PENALTY * u32::try_from(outcome.hints_used)?;
        let expected = round_score(distance, penalty);
        ensure!(
            outcome.score == expected,
            "round {} scored {}, expected {expected}",
            outcome.round,
            outcome.score
        );
        total_hints += outcome.hints_used;
    }
    ensure!(
        result.hints_used as usize == total_hints,
        "summary counts {} hints, log has {total_hints}",
        result.hints_used
    );
    ensure!(
        count_events(summary, |e| matches!(e, GameEvent::HintRevealed(_))) == total_hints,
        "one hint_revealed per hint"
    );
    Ok(())
}

fn skip_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = finished(summary)?;
    ensure!(result.score == 0, "skipping scored {}", result.score);
    ensure!(result.skipped == result.total_rounds, "skipped {}", result.skipped);
    ensure!(result.accuracy == 0, "accuracy {}", result.accuracy);
    ensure!(result.avg_distance.abs() < f64::EPSILON, "avg distance {}", result.avg_distance);
    ensure!(
        count_events(summary, |e| matches!(e, GameEvent::RoundSkipped { .. }))
            == summary.outcomes.len(),
        "one round_skipped per round"
    );
    ensure!(
        count_events(summary, |e| matches!(e, GameEvent::GuessResolved { .. })) == 0,
        "skips must not resolve guesses"
    );
    Ok(())
}

fn share_code_expectation(summary: &SimulationSummary) -> Result<()> {
    let code = encode_friendly(summary.difficulty, summary.seed);
    let (tier, seed) = decode_to_seed(&code).with_context(|| format!("{code} did not decode"))?;
    ensure!(tier == summary.difficulty, "{code} decoded to tier {tier}");
    ensure!(encode_friendly(tier, seed) == code, "{code} did not re-encode");
    ensure!(
        parse_seed(&code.to_lowercase()) == Some((Some(tier), seed)),
        "lowercase code should parse"
    );
    ensure!(
        parse_seed(&summary.seed.to_string()) == Some((None, summary.seed)),
        "decimal seed should parse"
    );

    let engine = GameEngine::with_catalog(
        LandmarkCatalog::kingston(),
        GameConfig::default(),
        MemoryScoreStore::default(),
    );
    let session = engine
        .start_seeded(&code, Difficulty::Easy, "share", NoopObserver)
        .with_context(|| format!("{code} should start a session"))?;
    ensure!(session.seed() == seed, "session seed differs from decoded seed");
    ensure!(
        session.state().difficulty == tier,
        "code tier should win over the fallback"
    );
    ensure!(
        engine
            .start_seeded("not a seed", Difficulty::Easy, "share", NoopObserver)
            .is_none(),
        "garbage seeds must not start sessions"
    );
    Ok(())
}

fn deterministic_expectation(summary: &SimulationSummary) -> Result<()> {
    let tester = GameTester::try_new(false)?;
    let replay_plan = SimulationPlan::new(summary.difficulty, summary.strategy);
    let first = tester.isolated().run_plan(&replay_plan, summary.seed);
    let second = tester.isolated().run_plan(&replay_plan, summary.seed);
    let ids = |run: &SimulationSummary| {
        run.outcomes
            .iter()
            .map(|o| o.landmark.id.clone())
            .collect::<Vec<_>>()
    };
    ensure!(ids(&first) == ids(&second), "landmark order differs between replays");
    ensure!(
        first.metrics == second.metrics,
        "replays scored {} and {}",
        first.metrics.score,
        second.metrics.score
    );
    ensure!(first.events == second.events, "event streams differ between replays");
    Ok(())
}

fn anti_repeat_expectation(summary: &SimulationSummary) -> Result<()> {
    finished(summary)?;
    let mut seen = HashSet::new();
    for outcome in &summary.outcomes {
        ensure!(
            seen.insert(outcome.landmark.id.as_str()),
            "{} repeated in round {}",
            outcome.landmark.id,
            outcome.round
        );
        ensure!(
            outcome.landmark.difficulty == summary.difficulty,
            "{} is not a {} landmark",
            outcome.landmark.id,
            summary.difficulty
        );
    }
    Ok(())
}

fn guard_rail_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.actions == summary.outcomes.len(),
        "perfect play should take one action per round"
    );
    let sample = summary.outcomes.first().cloned().context("no rounds played")?;

    let mut session = SessionEngine::new(
        LandmarkCatalog::kingston(),
        summary.seed,
        EventLog::default(),
        MemoryScoreStore::default(),
    );
    ensure!(session.request_hint().is_none(), "hint before start");
    ensure!(session.submit_guess(44.23, -76.49).is_none(), "guess before start");
    ensure!(session.skip_round().is_none(), "skip before start");
    ensure!(session.record_round_result(sample.clone()).is_none(), "result before start");
    ensure!(session.finish_session().is_none(), "finish before start");
    ensure!(session.phase() == SessionPhase::Configuring, "still configuring");
    ensure!(session.observer().events().is_empty(), "no events before start");

    ensure!(session.start_session(Difficulty::Easy, "guard"), "start");
    ensure!(
        session.submit_guess(f64::NAN, f64::NAN).is_none(),
        "non-finite guess resolved a round"
    );
    ensure!(session.state().log.is_empty(), "non-finite guess was logged");
    let early = session.finish_session().context("early finish")?;
    ensure!(early.rounds_played == 0, "nothing played yet");
    ensure!(session.submit_guess(44.23, -76.49).is_none(), "guess after finish");
    ensure!(session.record_round_result(sample).is_none(), "result after finish");
    ensure!(
        session.finish_session().as_ref() == Some(&early),
        "finish is idempotent"
    );
    session.reset_to_menu();
    ensure!(!session.snapshot().is_playing, "menu is not playing");
    Ok(())
}

fn scoring_curve_expectation(summary: &SimulationSummary) -> Result<()> {
    finished(summary)?;
    for outcome in &summary.outcomes {
        let guess = outcome.guess.context("wild never skips")?;
        let distance = outcome.distance_m.context("guess without distance")?;
        let expected = distance_meters(guess.lat, guess.lon, outcome.landmark.lat, outcome.landmark.lon);
        ensure!(
            (distance - expected).abs() < 1e-6,
            "round {} distance {distance} != {expected}",
            outcome.round
        );
        ensure!(
            outcome.score == score_for_distance(distance),
            "round {} scored {} at {distance:.0}m",
            outcome.round,
            outcome.score
        );
        ensure!(
            (MIN_GUESS_SCORE..=MAX_ROUND_SCORE).contains(&outcome.score),
            "score {} out of range",
            outcome.score
        );
    }

    for (distance, expected) in [
        (0.0, 5_000),
        (10.0, 5_000),
        (50.0, 4_500),
        (100.0, 3_500),
        (200.0, 2_500),
        (500.0, 1_500),
        (1_800.0, 100),
        (25_000.0, 100),
    ] {
        let actual = score_for_distance(distance);
        ensure!(actual == expected, "{distance}m scored {actual}, expected {expected}");
    }
    let mut previous = MAX_ROUND_SCORE;
    for step in 0..=400_u32 {
        let score = score_for_distance(f64::from(step) * 5.0);
        ensure!(score <= previous, "curve rises at {}m", step * 5);
        previous = score;
    }
    Ok(())
}

fn leaderboard_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = finished(summary)?;
    let board = MemoryLeaderboard::default();
    let client = LeaderboardClient::new(board.clone());
    ensure!(client.submit_summary("Limestone", result), "submission refused");
    ensure!(
        client.submit("LIMESTONE", "floor", 0.0),
        "zero score refused"
    );
    ensure!(!client.submit("", "nobody", 1.0), "empty room accepted");

    let top = client.top("limestone");
    ensure!(board.len() == 2, "expected two rows, found {}", board.len());
    let first = top.first().context("empty board")?;
    ensure!(
        first.score == result.score,
        "top score {} != session score {}",
        first.score,
        result.score
    );
    ensure!(first.room == "limestone", "room not lowercased");
    ensure!(
        top.windows(2).all(|w| w[0].score >= w[1].score),
        "board not sorted"
    );
    ensure!(
        LeaderboardClient::<MemoryLeaderboard>::default().top("limestone").is_empty(),
        "disabled client returned rows"
    );
    Ok(())
}

fn best_score_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = finished(summary)?;
    let announced = summary.events.iter().find_map(|event| match event {
        GameEvent::PersonalBestUpdated { best } => Some(*best),
        _ => None,
    });
    match announced {
        Some(best) => ensure!(
            result.is_new_best && best == result.score,
            "personal best event disagrees with summary"
        ),
        None => ensure!(!result.is_new_best, "new best without an event"),
    }
    ensure!(result.best_score >= result.score, "best below current score");

    let path = std::env::temp_dir().join(format!(
        "limestone-best-{}-{}.json",
        std::process::id(),
        summary.seed
    ));
    let _ = std::fs::remove_file(&path);
    let store = JsonFileScoreStore::new(&path);
    let catalog = LandmarkCatalog::kingston();

    let mut strong = SessionEngine::new(catalog.clone(), summary.seed, NoopObserver, store.clone());
    ensure!(strong.start_session(Difficulty::Easy, "best"), "start");
    while let Some(target) = strong.current_landmark().map(|l| (l.lat, l.lon)) {
        strong.submit_guess(target.0, target.1);
    }
    let first = strong.summary().cloned().context("strong session summary")?;
    ensure!(first.is_new_best, "first perfect run is a new best");

    let mut weak = SessionEngine::new(catalog, summary.seed, NoopObserver, store.clone());
    ensure!(weak.start_session(Difficulty::Easy, "best"), "start");
    while weak.skip_round().is_some() {}
    let second = weak.summary().cloned().context("weak session summary")?;
    ensure!(!second.is_new_best, "zero score cannot beat {}", first.score);
    ensure!(second.best_score == first.score, "best should carry over");

    let stored = store.load_best()?;
    let _ = std::fs::remove_file(&path);
    ensure!(stored == Some(first.score), "stored best {stored:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::SCENARIO_KEYS;

    #[test]
    fn every_scenario_passes_on_bundled_landmarks() {
        let tester = GameTester::try_new(false).unwrap();
        for key in SCENARIO_KEYS {
            let scenario = build(key).unwrap();
            for seed in [1_u64, 1337] {
                let run = tester.run_plan(&scenario.plan, seed);
                for expectation in &scenario.plan.expectations {
                    expectation
                        .evaluate(&run)
                        .unwrap_or_else(|err| panic!("{key} seed {seed}: {err:#}"));
                }
            }
        }
    }

    #[test]
    fn skip_expectation_rejects_scoring_runs() {
        let tester = GameTester::try_new(false).unwrap();
        let run = tester.run_plan(&plan(Difficulty::Easy, GuessStrategy::Perfect), 3);
        assert!(skip_expectation(&run).is_err());
    }
}
