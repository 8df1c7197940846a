/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a fresh entity id (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Alphabet for family invite codes
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a family invite code
pub const INVITE_CODE_LEN: usize = 8;

/// Generate a random family invite code (8 chars, `A-Z0-9`).
///
/// Uniqueness is not guaranteed here; the store rejects collisions and
/// the caller regenerates.
pub fn invite_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user-entered invite codes (trim, upper-case)
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// One day in milliseconds
pub const DAY_MS: i64 = 86_400_000;

/// Start of the UTC day containing `millis`
pub fn day_start_millis(millis: i64) -> i64 {
    millis - millis.rem_euclid(DAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_code_shape() {
        for _ in 0..100 {
            let code = invite_code();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_invite_code("  ab12cd34 "), "AB12CD34");
    }

    #[test]
    fn day_start_truncates_to_midnight() {
        // 2024-01-01T13:45:00Z
        let t = 1_704_116_700_000;
        assert_eq!(day_start_millis(t), 1_704_067_200_000);
        assert_eq!(day_start_millis(1_704_067_200_000), 1_704_067_200_000);
        assert_eq!(day_start_millis(t + DAY_MS), 1_704_067_200_000 + DAY_MS);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
