//! Customer matching: a strict precedence cascade of exact identifiers,
//! then a weighted fuzzy score over every candidate record.
//!
//! Ties are broken by first-seen order (candidates iterate in insertion
//! order), so exact winners are assertable for fixed inputs.

use uuid::Uuid;

use super::similarity::{normalize_phone, ratio, token_set_ratio};
use crate::models::enums::MatchAction;
use crate::models::Customer;
use crate::pipeline::extraction::types::ExtractedCustomer;

/// Fuzzy thresholds: >= USE_EXISTING auto-selects, >= MERGE asks a human.
pub const FUZZY_USE_EXISTING: i64 = 85;
pub const FUZZY_MERGE: i64 = 70;

/// A candidate surfaced by the fuzzy pass, kept even when the final action
/// is `create_new` so the warning detector can mention near-misses.
#[derive(Debug, Clone)]
pub struct FuzzyCandidate {
    pub customer_id: Uuid,
    pub name: String,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct CustomerMatch {
    pub customer_id: Option<Uuid>,
    pub confidence: i64,
    pub action: MatchAction,
    pub best_fuzzy: Option<FuzzyCandidate>,
}

impl CustomerMatch {
    fn create_new(best_fuzzy: Option<FuzzyCandidate>) -> Self {
        Self {
            customer_id: None,
            confidence: 0,
            action: MatchAction::CreateNew,
            best_fuzzy,
        }
    }
}

fn nonempty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Match extracted customer fields against existing records.
///
/// Precedence, first hit wins:
/// 1. exact email (case-insensitive): confidence 100
/// 2. exact normalized phone: confidence 95
/// 3. exact name + company, both present on both sides: confidence 90
/// 4. exact name with no company on either side: confidence 85
/// 5. weighted fuzzy score over all candidates
pub fn match_customer(extracted: &ExtractedCustomer, candidates: &[Customer]) -> CustomerMatch {
    if candidates.is_empty() {
        // Degenerate case: nothing to match against is not an error.
        return CustomerMatch::create_new(None);
    }

    if let Some(email) = nonempty(&extracted.email) {
        for candidate in candidates {
            if candidate
                .email
                .as_deref()
                .is_some_and(|e| eq_fold(e.trim(), email))
            {
                return CustomerMatch {
                    customer_id: Some(candidate.id),
                    confidence: 100,
                    action: MatchAction::UseExisting,
                    best_fuzzy: None,
                };
            }
        }
    }

    if let Some(phone) = nonempty(&extracted.phone) {
        let normalized = normalize_phone(phone);
        if !normalized.is_empty() {
            for candidate in candidates {
                if candidate
                    .phone
                    .as_deref()
                    .is_some_and(|p| normalize_phone(p) == normalized)
                {
                    return CustomerMatch {
                        customer_id: Some(candidate.id),
                        confidence: 95,
                        action: MatchAction::UseExisting,
                        best_fuzzy: None,
                    };
                }
            }
        }
    }

    let extracted_name = nonempty(&extracted.name);
    let extracted_company = nonempty(&extracted.company);

    if let (Some(name), Some(company)) = (extracted_name, extracted_company) {
        for candidate in candidates {
            let candidate_company = candidate.company.as_deref().map(str::trim).filter(|c| !c.is_empty());
            if eq_fold(&candidate.name, name)
                && candidate_company.is_some_and(|c| eq_fold(c, company))
            {
                return CustomerMatch {
                    customer_id: Some(candidate.id),
                    confidence: 90,
                    action: MatchAction::UseExisting,
                    best_fuzzy: None,
                };
            }
        }
    }

    if let Some(name) = extracted_name {
        if extracted_company.is_none() {
            for candidate in candidates {
                let candidate_has_company = candidate
                    .company
                    .as_deref()
                    .is_some_and(|c| !c.trim().is_empty());
                if !candidate_has_company && eq_fold(&candidate.name, name) {
                    return CustomerMatch {
                        customer_id: Some(candidate.id),
                        confidence: 85,
                        action: MatchAction::UseExisting,
                        best_fuzzy: None,
                    };
                }
            }
        }
    }

    fuzzy_pass(extracted, candidates)
}

/// Weighted fuzzy score: 0.4·name + 0.2·company + 0.3·address (token-set)
/// + 0.1·phone. A term only participates when both sides carry the field;
/// the score is normalized by the weight actually included.
fn fuzzy_pass(extracted: &ExtractedCustomer, candidates: &[Customer]) -> CustomerMatch {
    let mut best: Option<FuzzyCandidate> = None;

    for candidate in candidates {
        let score = fuzzy_score(extracted, candidate);
        let is_better = best.as_ref().map_or(true, |b| score > b.score);
        if is_better {
            best = Some(FuzzyCandidate {
                customer_id: candidate.id,
                name: candidate.name.clone(),
                score,
            });
        }
    }

    let best = match best {
        Some(b) => b,
        None => return CustomerMatch::create_new(None),
    };

    if best.score >= FUZZY_USE_EXISTING {
        CustomerMatch {
            customer_id: Some(best.customer_id),
            confidence: best.score,
            action: MatchAction::UseExisting,
            best_fuzzy: Some(best),
        }
    } else if best.score >= FUZZY_MERGE {
        CustomerMatch {
            customer_id: Some(best.customer_id),
            confidence: best.score,
            action: MatchAction::Merge,
            best_fuzzy: Some(best),
        }
    } else {
        CustomerMatch::create_new(Some(best))
    }
}

fn fuzzy_score(extracted: &ExtractedCustomer, candidate: &Customer) -> i64 {
    let mut weighted = 0.0_f64;
    let mut total_weight = 0.0_f64;

    if let Some(name) = nonempty(&extracted.name) {
        weighted += 0.4 * f64::from(ratio(name, &candidate.name));
        total_weight += 0.4;
    }

    if let (Some(a), Some(b)) = (nonempty(&extracted.company), candidate.company.as_deref()) {
        if !b.trim().is_empty() {
            weighted += 0.2 * f64::from(ratio(a, b));
            total_weight += 0.2;
        }
    }

    if let (Some(a), Some(b)) = (nonempty(&extracted.address), candidate.address.as_deref()) {
        if !b.trim().is_empty() {
            weighted += 0.3 * f64::from(token_set_ratio(a, b));
            total_weight += 0.3;
        }
    }

    if let (Some(a), Some(b)) = (nonempty(&extracted.phone), candidate.phone.as_deref()) {
        let (na, nb) = (normalize_phone(a), normalize_phone(b));
        if !na.is_empty() && !nb.is_empty() {
            weighted += 0.1 * f64::from(ratio(&na, &nb));
            total_weight += 0.1;
        }
    }

    if total_weight == 0.0 {
        return 0;
    }
    (weighted / total_weight).round() as i64
}
