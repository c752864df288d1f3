use anyhow::{Context, Result, bail};
use limestone_game::seed::WORD_LIST;
use limestone_game::{Difficulty, decode_to_seed, encode_friendly};
use std::collections::HashMap;

/// Seed plus the share code and tier it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub tier: Option<Difficulty>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            tier: None,
        }
    }

    #[must_use]
    pub const fn from_share_code(seed: u64, tier: Difficulty, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            tier: Some(tier),
        }
    }

    /// Share-code seeds only run on the tier they encode.
    #[must_use]
    pub fn matches_tier(&self, tier: Difficulty) -> bool {
        self.tier.is_none_or(|source| source == tier)
    }

    #[must_use]
    pub fn share_code_for(&self, tier: Difficulty) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.tier)
            && source == tier
        {
            return code.clone();
        }
        encode_friendly(tier, self.seed)
    }
}

/// Resolve CLI seed tokens: integers, share codes, or `all` for every
/// share code of every tier.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }
        if let Some((tier, seed)) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(seed, tier, token.to_uppercase()));
            continue;
        }
        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(all_share_code_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<Difficulty>), usize> = HashMap::new();
    for info in pending {
        let key = (info.seed, info.tier);
        match index.get(&key).and_then(|&i| deduped.get_mut(i)) {
            Some(existing) => {
                if existing.code.is_none() && info.code.is_some() {
                    *existing = info;
                }
            }
            None => {
                index.insert(key, deduped.len());
                deduped.push(info);
            }
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }
    Ok(deduped)
}

fn all_share_code_seeds() -> Result<Vec<SeedInfo>> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100 * Difficulty::ALL.len());
    for word in WORD_LIST {
        for suffix in 0..100 {
            for tag in ["EZ", "MD", "HD"] {
                let code = format!("{tag}-{word}{suffix:02}");
                let (tier, seed) = decode_to_seed(&code)
                    .with_context(|| format!("failed to parse share code: {code}"))?;
                seeds.push(SeedInfo::from_share_code(seed, tier, code));
            }
        }
    }
    Ok(seeds)
}
