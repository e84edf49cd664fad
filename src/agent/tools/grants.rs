//! Grant agent: rubric scoring, document checks, application feedback.

use serde::{Deserialize, Serialize};

use crate::agent::context::ToolContext;
use crate::agent::heuristics::round2;
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::error::Result;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "scoreGrant",
                ToolCategory::Grants,
                "Score a grant application for impact, feasibility, and SDG9 alignment.",
            ),
            score_grant,
        )
        .register(
            ToolSpec::new(
                "verifyDocs",
                ToolCategory::Grants,
                "Check if required documents are present for a grant application.",
            ),
            verify_docs,
        )
        .register(
            ToolSpec::new(
                "suggestImprovements",
                ToolCategory::Grants,
                "Suggest edits that strengthen a weak grant application.",
            ),
            suggest_improvements,
        );
}

const BASE_SCORE: f64 = 0.40;
const IMPACT_KEYWORDS: &[&str] = &[
    "elderly", "homeless", "community", "women", "youth", "smallholder", "food security",
];
const FEASIBILITY_KEYWORDS: &[&str] = &["cold", "cool", "storage", "solar", "insulated", "equipment"];
const INFRASTRUCTURE_CATEGORIES: &[&str] = &[
    "cold storage", "storage", "logistics", "equipment", "infrastructure", "processing", "irrigation",
];
const IMPACT_AREAS: &[&str] = &[
    "access", "innovation", "infrastructure", "inclusion", "sustainability", "resilience",
];
const SMALL_GRANT_CAP_USD: f64 = 50_000.0;

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantApplication {
    pub applicant: String,
    pub purpose: String,
    #[serde(default, rename = "amountUSD")]
    pub amount_usd: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub impact_areas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantBreakdown {
    pub base: f64,
    pub impact: f64,
    pub feasibility: f64,
    pub alignment: f64,
    pub impact_areas: f64,
}

#[derive(Debug, Serialize)]
pub struct GrantScore {
    pub applicant: String,
    pub purpose: String,
    pub score: f64,
    pub recommendation: &'static str,
    pub rationale: Vec<String>,
    pub breakdown: GrantBreakdown,
}

pub fn recommendation(score: f64) -> &'static str {
    if score >= 0.75 {
        "fund"
    } else if score >= 0.5 {
        "review"
    } else {
        "decline"
    }
}

pub fn score_grant(_ctx: &ToolContext, args: GrantApplication) -> Result<GrantScore> {
    let text = format!("{} {}", args.applicant, args.purpose).to_lowercase();
    let purpose = args.purpose.to_lowercase();
    let category = args.category.as_deref().unwrap_or("").to_lowercase();
    let mut rationale = Vec::new();

    let impact = if mentions_any(&text, IMPACT_KEYWORDS) {
        rationale.push("Serves an underserved community".to_string());
        0.15
    } else {
        0.0
    };

    let mut feasibility = 0.0;
    if mentions_any(&purpose, FEASIBILITY_KEYWORDS) {
        feasibility += 0.10;
        rationale.push("Concrete spoilage-reduction equipment".to_string());
    }
    if args.amount_usd.is_some_and(|a| a > 0.0 && a <= SMALL_GRANT_CAP_USD) {
        feasibility += 0.05;
        rationale.push("Request size is deliverable".to_string());
    }

    let alignment = if !category.is_empty() && mentions_any(&category, INFRASTRUCTURE_CATEGORIES) {
        rationale.push(format!("Category '{}' aligns with SDG9 infrastructure", category));
        0.15
    } else {
        0.0
    };

    let mut recognised: Vec<String> = args
        .impact_areas
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| IMPACT_AREAS.contains(&a.as_str()))
        .collect();
    recognised.sort();
    recognised.dedup();
    let areas = 0.05 * recognised.len() as f64;
    if !recognised.is_empty() {
        rationale.push(format!("Impact areas: {}", recognised.join(", ")));
    }

    let score = round2((BASE_SCORE + impact + feasibility + alignment + areas).clamp(0.0, 1.0));
    if rationale.is_empty() {
        rationale.push("No strong impact or feasibility signals".to_string());
    }

    Ok(GrantScore {
        applicant: args.applicant,
        purpose: args.purpose,
        score,
        recommendation: recommendation(score),
        rationale,
        breakdown: GrantBreakdown {
            base: BASE_SCORE,
            impact,
            feasibility: round2(feasibility),
            alignment,
            impact_areas: round2(areas),
        },
    })
}

/// Required document and the words that satisfy it
const REQUIRED_DOCS: &[(&'static str, &'static [&'static str])] = &[
    ("id", &["id", "identity", "passport"]),
    ("budget", &["budget"]),
    ("proposal", &["proposal", "plan"]),
    ("bank", &["bank"]),
];

#[derive(Debug, Deserialize)]
pub struct VerifyDocsArgs {
    pub applicant: String,
    pub docs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyDocsResult {
    pub applicant: String,
    pub present: Vec<&'static str>,
    pub missing: Vec<&'static str>,
    pub complete: bool,
    pub note: String,
}

fn doc_satisfies(doc: &str, words: &[&str]) -> bool {
    doc.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

pub fn verify_docs(_ctx: &ToolContext, args: VerifyDocsArgs) -> Result<VerifyDocsResult> {
    let mut present: Vec<&'static str> = Vec::new();
    let mut missing: Vec<&'static str> = Vec::new();
    for &(name, words) in REQUIRED_DOCS {
        if args.docs.iter().any(|d| doc_satisfies(d, words)) {
            present.push(name);
        } else {
            missing.push(name);
        }
    }

    let complete = missing.is_empty();
    let note = if complete {
        "All required documents provided.".to_string()
    } else {
        format!("Missing: {}. Upload before review.", missing.join(", "))
    };

    Ok(VerifyDocsResult {
        applicant: args.applicant,
        present,
        missing,
        complete,
        note,
    })
}

#[derive(Debug, Deserialize)]
pub struct SuggestImprovementsArgs {
    pub purpose: String,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestImprovementsResult {
    pub purpose: String,
    pub suggestions: Vec<String>,
}

const METRICS_HINT: &str = "Add measurable outcomes (e.g. tonnes of spoilage avoided, farmers served).";
const BUDGET_HINT: &str = "Include an itemised budget with unit costs and co-funding.";
const TIMELINE_HINT: &str = "Add a timeline with milestones per quarter.";
const BENEFICIARY_HINT: &str = "Name the beneficiaries and how many households are reached.";
const MAINTENANCE_HINT: &str = "Explain who maintains the equipment after the grant ends.";

fn push_unique(list: &mut Vec<String>, hint: String) {
    if !list.contains(&hint) {
        list.push(hint);
    }
}

pub fn suggest_improvements(
    _ctx: &ToolContext,
    args: SuggestImprovementsArgs,
) -> Result<SuggestImprovementsResult> {
    let purpose = args.purpose.to_lowercase();
    let mut suggestions: Vec<String> = Vec::new();

    if !purpose.chars().any(|c| c.is_ascii_digit()) {
        push_unique(&mut suggestions, METRICS_HINT.to_string());
    }
    if !mentions_any(&purpose, &["budget", "$", "usd", "cost"]) {
        push_unique(&mut suggestions, BUDGET_HINT.to_string());
    }
    if !mentions_any(&purpose, &["month", "week", "year", "timeline", "phase", "quarter"]) {
        push_unique(&mut suggestions, TIMELINE_HINT.to_string());
    }
    if !mentions_any(&purpose, &["farmer", "women", "youth", "community", "household", "cooperative"]) {
        push_unique(&mut suggestions, BENEFICIARY_HINT.to_string());
    }

    for weakness in &args.weaknesses {
        let w = weakness.to_lowercase();
        let hint = if w.contains("budget") || w.contains("cost") {
            BUDGET_HINT.to_string()
        } else if w.contains("metric") || w.contains("measur") {
            METRICS_HINT.to_string()
        } else if w.contains("timeline") || w.contains("schedule") {
            TIMELINE_HINT.to_string()
        } else if w.contains("sustain") || w.contains("maint") {
            MAINTENANCE_HINT.to_string()
        } else {
            format!("Address reviewer concern: {}.", weakness.trim())
        };
        push_unique(&mut suggestions, hint);
    }

    if suggestions.is_empty() {
        suggestions.push("Application covers the core criteria; tighten the summary.".to_string());
    }

    Ok(SuggestImprovementsResult {
        purpose: args.purpose,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::empty_ctx;

    fn app(purpose: &str, amount: Option<f64>, category: Option<&str>, areas: &[&str]) -> GrantApplication {
        GrantApplication {
            applicant: "Kano Women Co-op".to_string(),
            purpose: purpose.to_string(),
            amount_usd: amount,
            category: category.map(str::to_string),
            location: Some("Kano".to_string()),
            impact_areas: areas.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_score_grant_is_clamped() {
        let (_dir, ctx) = empty_ctx();
        let out = score_grant(
            &ctx,
            app(
                "Solar cold storage for community",
                Some(20_000.0),
                Some("cold storage"),
                &["access", "innovation", "infrastructure", "inclusion", "resilience", "access"],
            ),
        )
        .unwrap();
        assert_eq!(out.score, 1.0);
        assert_eq!(out.recommendation, "fund");
        assert_eq!(out.breakdown.impact_areas, 0.25);
    }

    #[test]
    fn test_score_grant_bounds_for_sparse_input() {
        let (_dir, ctx) = empty_ctx();
        let out = score_grant(
            &ctx,
            GrantApplication {
                applicant: "X".to_string(),
                purpose: "misc".to_string(),
                amount_usd: Some(-5.0),
                category: None,
                location: None,
                impact_areas: vec!["unknown".to_string()],
            },
        )
        .unwrap();
        assert_eq!(out.score, 0.40);
        assert_eq!(out.recommendation, "decline");
        assert!((0.0..=1.0).contains(&out.score));
    }

    #[test]
    fn test_score_grant_review_band() {
        let (_dir, ctx) = empty_ctx();
        // 0.40 + 0.15 impact (women) + 0.10 storage
        let out = score_grant(&ctx, app("Storage shed", None, None, &[])).unwrap();
        assert_eq!(out.score, 0.65);
        assert_eq!(out.recommendation, "review");
    }

    #[test]
    fn test_verify_docs() {
        let (_dir, ctx) = empty_ctx();
        let out = verify_docs(
            &ctx,
            VerifyDocsArgs {
                applicant: "A".to_string(),
                docs: vec!["National ID".to_string(), "budget.pdf".to_string(), "Idea notes".to_string()],
            },
        )
        .unwrap();
        assert_eq!(out.present, vec!["id", "budget"]);
        assert_eq!(out.missing, vec!["proposal", "bank"]);
        assert!(!out.complete);

        let all = verify_docs(
            &ctx,
            VerifyDocsArgs {
                applicant: "B".to_string(),
                docs: ["passport", "Budget", "business plan", "bank letter"]
                    .map(String::from)
                    .to_vec(),
            },
        )
        .unwrap();
        assert!(all.missing.is_empty());
        assert!(all.complete);
        assert_eq!(all.note, "All required documents provided.");
    }

    #[test]
    fn test_suggest_improvements_dedupes() {
        let (_dir, ctx) = empty_ctx();
        let out = suggest_improvements(
            &ctx,
            SuggestImprovementsArgs {
                purpose: "Cold room for 40 farmers over 6 months, budget $12k".to_string(),
                weaknesses: vec!["budget unclear".to_string(), "no maintenance plan".to_string()],
            },
        )
        .unwrap();
        assert_eq!(out.suggestions, vec![BUDGET_HINT.to_string(), MAINTENANCE_HINT.to_string()]);
    }
}
