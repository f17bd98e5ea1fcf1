use rand::Rng;

/// Length of generated invite codes.
pub const INVITE_CODE_LEN: usize = 8;

/// Alphabet for invite codes. Excludes 0/O/1/I to keep codes readable when
/// shared verbally.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a fresh invite code.
///
/// Codes are random, not checked for uniqueness at generation time; with 32
/// symbols over 8 positions a collision is an invite-space exhaustion event,
/// and the lookup path treats a duplicate match as a data-integrity error.
pub fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}
