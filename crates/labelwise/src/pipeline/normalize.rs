/// Converts raw ingredient label text into canonical lowercase tokens.
///
/// Splits on commas, strips parenthetical content ("Water (Aqua)" becomes
/// "water"), collapses the whitespace runs the stripping leaves behind,
/// lowercases, and drops empty tokens. Total and idempotent; empty input
/// yields an empty list.
pub fn normalize_ingredients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(strip_parentheticals)
        .map(|token| {
            token
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn strip_parentheticals(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut depth = 0usize;
    for ch in token.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}
