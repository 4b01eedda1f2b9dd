//! Text similarity used to grade pronunciation attempts.

/// Punctuation stripped before comparing Japanese utterances.
const STRIPPED_PUNCTUATION: &[char] = &['。', '、', '！', '？'];

/// Removes Japanese sentence punctuation and all whitespace, then lowercases.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c) && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Levenshtein distance counted in Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity in `[0, 1]`: `1 - distance / longest length`.
///
/// Inputs are expected to be normalized already (see [`normalize`]).
/// Two identical strings score 1.0, including two empty ones; one empty
/// string against a non-empty one scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let distance = levenshtein(a, b) as f64;
    let max_len = len_a.max(len_b) as f64;
    (1.0 - distance / max_len).clamp(0.0, 1.0)
}
