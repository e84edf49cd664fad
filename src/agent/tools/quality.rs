//! Quality agent: provisional grading, issue tracking, handling advice.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::context::{new_id, QualityIssue, ToolContext};
use crate::agent::heuristics::{is_hot_region, is_perishable, round1};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::Scalar;
use crate::error::{HarvestError, Result};

/// Safe storage moisture for grains and pulses
const GRAIN_MOISTURE_MAX: f64 = 14.0;
const GRAINS: &[&str] = &[
    "maize", "corn", "rice", "wheat", "millet", "sorghum", "teff", "barley", "beans", "groundnut",
    "soybean", "coffee",
];

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "gradeProduct",
                ToolCategory::Quality,
                "Assign a provisional grade (A/B/C) for a lot from quality attributes.",
            ),
            grade_product,
        )
        .register(
            ToolSpec::new(
                "flagIssue",
                ToolCategory::Quality,
                "Record an issue against a lot with severity for follow-up.",
            ),
            flag_issue,
        )
        .register(
            ToolSpec::new(
                "recommendHandling",
                ToolCategory::Quality,
                "Recommend drying, cooling, pickup or sorting actions for a lot.",
            ),
            recommend_handling,
        );
}

fn is_grain(crop: &str) -> bool {
    let crop = crop.to_lowercase();
    GRAINS.iter().any(|g| crop.contains(g))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAttributes {
    #[serde(default)]
    pub moisture_pct: Option<f64>,
    #[serde(default)]
    pub size_uniformity: Option<f64>,
    #[serde(default)]
    pub defects_pct: Option<f64>,
    #[serde(default)]
    pub certification: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeArgs {
    pub lot_id: Scalar,
    pub crop: String,
    #[serde(default)]
    pub attributes: QualityAttributes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub lot_id: String,
    pub crop: String,
    pub grade: &'static str,
    pub score: f64,
    pub reasons: Vec<String>,
    pub provisional: bool,
}

pub fn grade_letter(score: f64) -> &'static str {
    if score >= 85.0 {
        "A"
    } else if score >= 70.0 {
        "B"
    } else {
        "C"
    }
}

pub fn grade_product(_ctx: &ToolContext, args: GradeArgs) -> Result<GradeResult> {
    let attrs = &args.attributes;
    let mut score: f64 = 100.0;
    let mut reasons = Vec::new();

    if let Some(defects) = attrs.defects_pct.filter(|d| *d > 0.0) {
        score -= defects * 2.0;
        reasons.push(format!("{}% visible defects", defects));
    }
    if let Some(uniformity) = attrs.size_uniformity.filter(|u| *u < 80.0) {
        score -= (80.0 - uniformity) * 0.5;
        reasons.push(format!("size uniformity {}% below 80%", uniformity));
    }
    if let Some(moisture) = attrs.moisture_pct {
        if is_grain(&args.crop) && moisture > GRAIN_MOISTURE_MAX {
            score -= (moisture - GRAIN_MOISTURE_MAX) * 5.0;
            reasons.push(format!("moisture {}% above {}%", moisture, GRAIN_MOISTURE_MAX));
        }
    }
    if attrs.certification.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        score += 5.0;
        reasons.push("certified lot".to_string());
    }
    if attrs
        .notes
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains("bruis"))
    {
        score -= 5.0;
        reasons.push("bruising noted".to_string());
    }

    let score = round1(score.clamp(0.0, 100.0));
    Ok(GradeResult {
        lot_id: args.lot_id.to_string(),
        crop: args.crop,
        grade: grade_letter(score),
        score,
        reasons,
        provisional: true,
    })
}

fn default_severity() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagArgs {
    pub lot_id: Scalar,
    pub issue: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default = "default_severity")]
    pub severity: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagResult {
    pub ok: bool,
    #[serde(flatten)]
    pub issue: QualityIssue,
    pub open_issues_for_lot: usize,
}

pub fn flag_issue(ctx: &ToolContext, args: FlagArgs) -> Result<FlagResult> {
    let severity = args.severity.trim().to_lowercase();
    if !matches!(severity.as_str(), "low" | "medium" | "high") {
        return Err(HarvestError::Validation(format!(
            "severity '{}' must be low, medium or high",
            args.severity
        )));
    }

    let issue = QualityIssue {
        id: new_id("QI"),
        lot_id: args.lot_id.to_string(),
        issue: args.issue,
        detail: args.detail,
        severity,
        ts: Utc::now(),
    };
    info!(id = %issue.id, lot = %issue.lot_id, severity = %issue.severity, "quality issue flagged");
    ctx.quality_issues.push(issue.clone());

    let open = ctx
        .quality_issues
        .recent(usize::MAX, |i| i.lot_id == issue.lot_id)
        .len();
    Ok(FlagResult {
        ok: true,
        issue,
        open_issues_for_lot: open,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlingArgs {
    pub lot_id: Scalar,
    pub crop: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub attributes: QualityAttributes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlingPlan {
    pub lot_id: String,
    pub crop: String,
    pub risk: &'static str,
    pub actions: Vec<&'static str>,
    pub open_issues: Vec<QualityIssue>,
}

pub fn recommend_handling(ctx: &ToolContext, args: HandlingArgs) -> Result<HandlingPlan> {
    let lot_id = args.lot_id.to_string();
    let perishable = is_perishable(&args.crop);
    let hot = args.region.as_deref().is_some_and(is_hot_region);
    let cold = args
        .storage_type
        .as_deref()
        .is_some_and(|s| s.to_lowercase().contains("cold"));

    let mut actions = Vec::new();
    if is_grain(&args.crop)
        && args
            .attributes
            .moisture_pct
            .is_some_and(|m| m > GRAIN_MOISTURE_MAX)
    {
        actions.push("Dry to 14% moisture or below before storage.");
    }
    if perishable && !cold {
        actions.push("Cool to 10-12°C within 6 hours of harvest.");
    }
    if perishable && hot {
        actions.push("Schedule pickup before 10am to avoid heat exposure.");
    }
    if args.attributes.defects_pct.is_some_and(|d| d > 10.0) {
        actions.push("Sort and sell seconds separately; blend only within grade.");
    }

    let risk = if perishable && hot && !cold {
        "high"
    } else if actions.is_empty() {
        "low"
    } else {
        "medium"
    };
    if actions.is_empty() {
        actions.push("Standard handling; keep shaded and ventilated.");
    }

    let open_issues = ctx.quality_issues.recent(usize::MAX, |i| i.lot_id == lot_id);
    Ok(HandlingPlan {
        lot_id,
        crop: args.crop,
        risk,
        actions,
        open_issues,
    })
}
