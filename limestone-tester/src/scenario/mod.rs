pub mod catalog;

use crate::logic::SimulationPlan;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, description: &'static str, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            description,
            plan,
        }
    }
}

/// Keys accepted by `--scenarios`, in run order.
pub const SCENARIO_KEYS: &[&str] = &[
    "smoke",
    "perfect-run",
    "hint-penalty",
    "skip-everything",
    "share-code-roundtrip",
    "deterministic-sessions",
    "anti-repeat",
    "guard-rails",
    "scoring-curve",
    "best-score-persistence",
    "leaderboard-roundtrip",
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    catalog::build(&name.trim().to_lowercase())
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIO_KEYS
        .iter()
        .filter_map(|key| catalog::build(key).map(|scenario| (*key, scenario.description)))
        .collect()
}

/// Replace `all` with every known scenario, keeping other names in order.
pub fn expand_scenarios(names: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for name in names {
        if name.eq_ignore_ascii_case("all") {
            for key in SCENARIO_KEYS {
                if !expanded.iter().any(|existing| existing == key) {
                    expanded.push((*key).to_string());
                }
            }
        } else if !expanded.contains(name) {
            expanded.push(name.clone());
        }
    }
    expanded
}
