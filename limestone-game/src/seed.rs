//! Reversible share codes for seeded sessions.
//! Format: `<TIER>-<WORD><NN>`, e.g. `EZ-GRANT42`, `HD-FORTHENRY07`.

use crate::data::Difficulty;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "GRANT", "DOUGLAS", "STAUFFER", "GOODES", "GORDON", "ONTARIO", "KINGSTON", "LIMESTONE",
    "TRICOLOR", "GAELS", "SUMMERHILL", "UNION", "UNIVERSITY", "BARRIE", "ALFRED", "DIVISION",
    "PRINCESS", "BROCK", "KING", "WELLINGTON", "BAGOT", "CLERGY", "JOHNSON", "EARL", "STUART",
    "ARCH", "MARTELLO", "FORTHENRY", "CONFED", "MARKET", "WATERFRONT", "HARBOUR", "WOLFE",
    "ISLAND", "FERRY", "CATARAQUI", "RIDEAU", "BELLEVUE", "MACDONALD", "PENITENT", "TOWER",
    "CLOCK", "DOME", "CUPOLA", "QUAD", "AGNES", "ETHERINGTON", "JEFFERY", "BIOSCI", "MACKINTOSH",
    "WATSON", "KINGSTREET", "TAPROOM", "STONES", "BREWERY", "PUB", "HALL", "LIBRARY", "STADIUM",
    "ARENA", "LAKE", "SHORE", "LIGHTHOUSE", "CANNON",
];

fn tier_tag(tier: Difficulty) -> &'static str {
    match tier {
        Difficulty::Easy => "EZ",
        Difficulty::Medium => "MD",
        Difficulty::Hard => "HD",
    }
}

fn tier_from_tag(tag: &str) -> Option<Difficulty> {
    Difficulty::ALL
        .into_iter()
        .find(|tier| tier_tag(*tier).eq_ignore_ascii_case(tag.trim()))
}

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & 0x01FF) | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = u8::try_from((packed >> 9) & 0x7F).unwrap_or(0);
    (packed & 0x01FF, nn)
}

/// Hash the tier and packed word/number into a full seed whose low 16 bits
/// carry the packed value.
fn compose_seed(tier: Difficulty, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let [lo, hi] = packed.to_le_bytes();
    let mut buf = [0u8; 11];
    buf[..6].copy_from_slice(b"LIMES-");
    buf[6..8].copy_from_slice(tier_tag(tier).as_bytes());
    buf[8] = lo;
    buf[9] = hi;
    buf[10] = 0x5A;
    (fnv1a64(&buf) & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render a seed as a share code. Only the low 16 bits of `seed` are used.
#[must_use]
pub fn encode_friendly(tier: Difficulty, seed: u64) -> String {
    let packed = u16::try_from(seed & 0xFFFF).unwrap_or(0);
    let (word_index, nn) = unpack(packed);
    let word = WORD_LIST
        .get(usize::from(word_index))
        .copied()
        .unwrap_or(WORD_LIST[0]);
    format!("{}-{word}{:02}", tier_tag(tier), nn % 100)
}

/// Parse a share code into its tier and seed.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(Difficulty, u64)> {
    let (tag, rest) = code.trim().split_once('-')?;
    let tier = tier_from_tag(tag)?;
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = normalize_word(word_part);
    let index = WORD_LIST.iter().position(|w| normalize_word(w) == word)?;
    let word_index = u16::try_from(index).ok()?;
    Some((tier, compose_seed(tier, word_index, nn)))
}

/// Mint a fresh code for `tier` from arbitrary entropy.
#[must_use]
pub fn generate_code_from_entropy(tier: Difficulty, entropy: u64) -> String {
    let word_index = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_friendly(tier, compose_seed(tier, word_index, nn))
}

/// Accept either a share code or a plain decimal seed.
#[must_use]
pub fn parse_seed(input: &str) -> Option<(Option<Difficulty>, u64)> {
    let input = input.trim();
    if let Ok(seed) = input.parse::<u64>() {
        return Some((None, seed));
    }
    decode_to_seed(input).map(|(tier, seed)| (Some(tier), seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_seed_reencodes_to_same_code() {
        let (tier, seed) = decode_to_seed("EZ-GRANT42").unwrap();
        assert_eq!(tier, Difficulty::Easy);
        assert_eq!(encode_friendly(tier, seed), "EZ-GRANT42");
    }

    #[test]
    fn codes_are_case_insensitive() {
        let upper = decode_to_seed("HD-FORTHENRY07").unwrap();
        let lower = decode_to_seed("hd-fortHenry07").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.0, Difficulty::Hard);
    }

    #[test]
    fn tier_changes_the_seed() {
        let (_, easy) = decode_to_seed("EZ-KINGSTON10").unwrap();
        let (_, hard) = decode_to_seed("HD-KINGSTON10").unwrap();
        assert_ne!(easy, hard);
        assert_eq!(easy & 0xFFFF, hard & 0xFFFF);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(decode_to_seed("XX-GRANT42").is_none());
        assert!(decode_to_seed("EZ-NOTAWORD42").is_none());
        assert!(decode_to_seed("EZ-GRANT4").is_none());
        assert!(decode_to_seed("GRANT42").is_none());
        assert!(decode_to_seed("EZ-G").is_none());
    }

    #[test]
    fn generated_codes_decode() {
        for entropy in [0, 1, 0xDEAD_BEEF, u64::MAX] {
            let code = generate_code_from_entropy(Difficulty::Medium, entropy);
            assert!(code.starts_with("MD-"));
            let (tier, seed) = decode_to_seed(&code).unwrap();
            assert_eq!(tier, Difficulty::Medium);
            assert_eq!(encode_friendly(tier, seed), code);
        }
    }

    #[test]
    fn parse_seed_accepts_numbers_and_codes() {
        assert_eq!(parse_seed(" 1234 "), Some((None, 1234)));
        let (tier, _) = parse_seed("MD-TAPROOM99").unwrap();
        assert_eq!(tier, Some(Difficulty::Medium));
        assert!(parse_seed("nonsense").is_none());
    }
}
