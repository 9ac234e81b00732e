//! Brute-force query key enumeration.
//!
//! The remote search is fuzzy, so exhausting every short key over the
//! alphabet covers the whole catalog.

/// Symbols allowed in emote codes' searchable prefix
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789'";

/// Length of each brute-forced key
pub const KEY_LEN: usize = 3;

/// All `KEY_LEN`-symbol strings over [`ALPHABET`], in lexicographic order
/// by alphabet position. Pure function of the two constants.
pub fn enumerate() -> Vec<String> {
    let symbols: Vec<char> = ALPHABET.chars().collect();
    let mut keys = Vec::with_capacity(symbols.len().pow(KEY_LEN as u32));

    let mut indices = [0usize; KEY_LEN];
    loop {
        keys.push(indices.iter().map(|&i| symbols[i]).collect());

        // Advance the rightmost position, carrying left; done on overflow
        let mut pos = KEY_LEN;
        loop {
            if pos == 0 {
                return keys;
            }
            pos -= 1;
            indices[pos] += 1;
            if indices[pos] < symbols.len() {
                break;
            }
            indices[pos] = 0;
        }
    }
}
