use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::pipeline::domain::{Concern, IngredientRule, Severity, UserProfile};

pub(crate) const AVOID_CONDITION_PENALTY: i64 = 30;
pub(crate) const CAUTION_SYMPTOM_PENALTY: i64 = 15;
pub(crate) const SENSITIVITY_PENALTY: i64 = 50;

/// Outcome of the deterministic rule pass.
pub(crate) struct RulePass {
    pub concerns: Vec<Concern>,
    pub deduction: i64,
    pub category_hits: BTreeMap<String, u32>,
}

/// Applies the rule store against the profile. Every matching condition,
/// symptom, and sensitivity deducts independently; concerns are deduplicated
/// by ingredient with the first writer winning.
pub(crate) fn apply_rules(
    rules: &[IngredientRule],
    profile: &UserProfile,
    ingredients: &[String],
) -> RulePass {
    let by_name: BTreeMap<&str, &IngredientRule> = rules
        .iter()
        .map(|rule| (rule.ingredient_name.as_str(), rule))
        .collect();

    let mut concerns: Vec<Concern> = Vec::new();
    let mut deduction = 0i64;
    let mut category_hits: BTreeMap<String, u32> = BTreeMap::new();

    for ingredient in ingredients {
        let Some(rule) = by_name.get(ingredient.as_str()) else {
            continue;
        };
        let mut flagged = false;

        for condition in matches_in(&rule.avoid_for, &profile.conditions) {
            deduction += AVOID_CONDITION_PENALTY;
            flagged = true;
            push_unique(
                &mut concerns,
                Concern {
                    ingredient: ingredient.clone(),
                    reason: reason_text(rule, &format!("listed to avoid for {condition}")),
                    severity: Severity::Avoid,
                },
            );
        }

        for symptom in matches_in(&rule.caution_for, &profile.symptoms) {
            deduction += CAUTION_SYMPTOM_PENALTY;
            flagged = true;
            push_unique(
                &mut concerns,
                Concern {
                    ingredient: ingredient.clone(),
                    reason: reason_text(rule, &format!("may aggravate {symptom}")),
                    severity: Severity::Caution,
                },
            );
        }

        if profile
            .sensitivities
            .iter()
            .any(|sensitivity| sensitivity.eq_ignore_ascii_case(ingredient))
        {
            deduction += SENSITIVITY_PENALTY;
            flagged = true;
            push_unique(
                &mut concerns,
                Concern {
                    ingredient: ingredient.clone(),
                    reason: reason_text(rule, "matches one of your listed sensitivities"),
                    severity: Severity::Avoid,
                },
            );
        }

        if flagged {
            for tag in &rule.tags {
                *category_hits.entry(tag.clone()).or_insert(0) += 1;
            }
        }
    }

    RulePass {
        concerns,
        deduction,
        category_hits,
    }
}

pub(crate) fn contains_ingredient(concerns: &[Concern], ingredient: &str) -> bool {
    concerns
        .iter()
        .any(|concern| concern.ingredient.eq_ignore_ascii_case(ingredient))
}

fn matches_in(rule_set: &BTreeSet<String>, profile_set: &BTreeSet<String>) -> Vec<String> {
    rule_set
        .iter()
        .filter(|name| {
            profile_set
                .iter()
                .any(|entry| entry.eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect()
}

fn reason_text(rule: &IngredientRule, fallback: &str) -> String {
    if rule.explanation.trim().is_empty() {
        format!("{}: {fallback}", rule.ingredient_name)
    } else {
        rule.explanation.clone()
    }
}

fn push_unique(concerns: &mut Vec<Concern>, concern: Concern) {
    if !contains_ingredient(concerns, &concern.ingredient) {
        concerns.push(concern);
    }
}
