use rand::Rng;
use uuid::Uuid;

/// Characters allowed in invite codes. 32 symbols; 0/O and 1/I are left out
/// because codes get read off screens and typed back.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 4;

pub const CHALLENGE_CODE_PREFIX: &str = "1V1-";
pub const TOURNAMENT_CODE_PREFIX: &str = "TRN-";

/// Fresh opaque id for a top-level entity.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Id of the match at (round, position) of a tournament. Deterministic so
/// that racing writers deriving the same match derive the same id, and
/// create-if-absent collapses them to one document.
pub fn match_id(tournament_id: &str, round: u32, position: u32) -> String {
    format!("{tournament_id}:r{round}m{position}")
}

/// Bracket slot label, 1-based within the round.
pub fn slot_id(round: u32, index: u32) -> String {
    format!("r{round}-m{index}")
}

pub fn challenge_code(rng: &mut impl Rng) -> String {
    format!("{CHALLENGE_CODE_PREFIX}{}", random_code(rng))
}

pub fn tournament_code(rng: &mut impl Rng) -> String {
    format!("{TOURNAMENT_CODE_PREFIX}{}", random_code(rng))
}

fn random_code(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are case-insensitive on the way in: trim and uppercase before any
/// lookup or comparison.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Whether a normalized code is `prefix` plus exactly [`CODE_LEN`] alphabet
/// characters.
pub fn is_well_formed(code: &str, prefix: &str) -> bool {
    match code.strip_prefix(prefix) {
        Some(body) => body.len() == CODE_LEN && body.bytes().all(|b| CODE_ALPHABET.contains(&b)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_codes_have_the_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let code = challenge_code(&mut rng);
            assert!(is_well_formed(&code, CHALLENGE_CODE_PREFIX), "{code}");
            let code = tournament_code(&mut rng);
            assert!(is_well_formed(&code, TOURNAMENT_CODE_PREFIX), "{code}");
        }
    }

    #[test]
    fn codes_never_use_ambiguous_characters() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let code = challenge_code(&mut rng);
            for banned in ['0', 'O', '1', 'I'] {
                assert!(!code[CHALLENGE_CODE_PREFIX.len()..].contains(banned), "{code}");
            }
        }
    }

    #[test]
    fn normalization_uppercases_and_trims() {
        assert_eq!(normalize_code("  1v1-abxy "), "1V1-ABXY");
        assert_eq!(normalize_code("trn-q2w3"), "TRN-Q2W3");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert!(!is_well_formed("1V1-AB", CHALLENGE_CODE_PREFIX));
        assert!(!is_well_formed("1V1-ABCDE", CHALLENGE_CODE_PREFIX));
        assert!(!is_well_formed("TRN-ABCD", CHALLENGE_CODE_PREFIX));
        assert!(!is_well_formed("1V1-AB0D", CHALLENGE_CODE_PREFIX));
        assert!(!is_well_formed("garbage", CHALLENGE_CODE_PREFIX));
        assert!(is_well_formed("1V1-ABCD", CHALLENGE_CODE_PREFIX));
    }

    #[test]
    fn match_ids_are_deterministic() {
        assert_eq!(match_id("t9", 2, 0), "t9:r2m0");
        assert_eq!(match_id("t9", 2, 0), match_id("t9", 2, 0));
        assert_ne!(match_id("t9", 2, 0), match_id("t9", 2, 1));
        assert_eq!(slot_id(1, 3), "r1-m3");
    }
}
