use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every generated short code.
pub const CODE_LEN: usize = 6;

/// Generate a random 6-character alphanumeric short code.
///
/// Makes no uniqueness guarantee by itself — callers are expected to check
/// the result against the set of codes already in use and regenerate.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
