use crate::pipeline::domain::SafetyLevel;

/// Deterministic fallback summary used whenever the semantic enhancer did
/// not supply one. Pure in (safety level, concern count).
pub(crate) fn fallback_summary(level: SafetyLevel, concern_count: usize) -> String {
    match level {
        SafetyLevel::Good if concern_count == 0 => {
            "No concerning ingredients found for your profile. Looks like a great pick!".to_string()
        }
        SafetyLevel::Good => format!(
            "Mostly compatible with your profile, with {concern_count} minor flag(s) worth a look."
        ),
        SafetyLevel::Caution => format!(
            "Use with caution: {concern_count} ingredient(s) were flagged against your profile."
        ),
        SafetyLevel::Avoid => format!(
            "Best avoided: {concern_count} ingredient(s) conflict with your profile."
        ),
    }
}
