pub(crate) const HEURISTIC_PENALTY: i64 = 25;

/// Substring markers for hazardous ingredient families the rule store has
/// not (yet) captured individually. A marker appearing anywhere in a
/// normalized token counts as a hit.
const HAZARD_FAMILIES: &[(&str, &str)] = &[
    ("paraben", "preservatives"),
    ("phthalate", "plasticizers"),
    ("formaldehyde", "preservatives"),
    ("methylisothiazolinone", "preservatives"),
    ("triclosan", "antimicrobials"),
    ("toluene", "solvents"),
    ("oxybenzone", "uv filters"),
    ("coal tar", "colorants"),
    ("lead acetate", "heavy metals"),
    ("resorcinol", "dyes"),
];

pub(crate) struct FamilyHit {
    pub ingredient: String,
    pub family: &'static str,
    pub reason: String,
}

/// Scans each token against the family markers; at most one hit per token.
pub(crate) fn detect(ingredients: &[String]) -> Vec<FamilyHit> {
    let mut hits = Vec::new();
    for ingredient in ingredients {
        for (marker, family) in HAZARD_FAMILIES {
            if ingredient.contains(marker) {
                hits.push(FamilyHit {
                    ingredient: ingredient.clone(),
                    family,
                    reason: format!(
                        "Contains \"{marker}\", a marker of the {family} family commonly flagged as hazardous"
                    ),
                });
                break;
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_family_markers_anywhere_in_the_token() {
        let hits = detect(&[
            "water".to_string(),
            "methylparaben".to_string(),
            "diethyl phthalate".to_string(),
        ]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].ingredient, "methylparaben");
        assert_eq!(hits[0].family, "preservatives");
        assert_eq!(hits[1].ingredient, "diethyl phthalate");
    }

    #[test]
    fn benign_tokens_produce_no_hits() {
        let hits = detect(&["water".to_string(), "glycerin".to_string(), "fragrance".to_string()]);
        assert!(hits.is_empty());
    }
}
