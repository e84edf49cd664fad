//! Insights agent: KPI roll-ups over the fixture snapshot, trend heuristics,
//! SDG-9 scoring and a formatted report.

use serde::{Deserialize, Serialize};

use crate::agent::context::ToolContext;
use crate::agent::heuristics::{
    is_perishable, mean, parse_qty, pct_change, pseudo_distance, round2, std_dev,
};
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::data::{Farmer, Fixtures, Product};
use crate::error::Result;

/// Pseudo-km within which a business counts as an outlet for a farm
const NEARBY_BUSINESS_KM: u32 = 30;
const CLIMATE_ALERT_PCT: f64 = 20.0;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "summarizeKPI",
                ToolCategory::Insights,
                "Summarise marketplace activity KPIs for a period and region.",
            ),
            summarize_kpi,
        )
        .register(
            ToolSpec::new(
                "analyzeTrends",
                ToolCategory::Insights,
                "Compare a KPI against the prior-period baseline.",
            ),
            analyze_trends,
        )
        .register(
            ToolSpec::new(
                "priceTrends",
                ToolCategory::Insights,
                "Average, range and volatility of listing prices for a crop.",
            ),
            price_trends,
        )
        .register(
            ToolSpec::new(
                "climateImpact",
                ToolCategory::Insights,
                "Share of perishable listings at spoilage risk for lack of nearby buyers.",
            ),
            climate_impact,
        )
        .register(
            ToolSpec::new(
                "sdgScore",
                ToolCategory::Insights,
                "SDG-9 roll-up across access, infrastructure and innovation.",
            ),
            sdg_score,
        )
        .register(
            ToolSpec::new(
                "generateReport",
                ToolCategory::Insights,
                "Assemble a text, markdown or JSON activity report.",
            ),
            generate_report,
        );
}

fn period_7d() -> String {
    "7d".to_string()
}

fn period_30d() -> String {
    "30d".to_string()
}

fn scope_all() -> String {
    "all".to_string()
}

fn matches_region(value: Option<&str>, region: Option<&str>) -> bool {
    match region {
        None => true,
        Some(r) => value.is_some_and(|v| v.to_lowercase().contains(&r.to_lowercase())),
    }
}

fn farmers_in(farmers: Vec<Farmer>, region: Option<&str>) -> Vec<Farmer> {
    match region {
        None => farmers,
        Some(r) => farmers.into_iter().filter(|f| f.in_region(r)).collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub period: String,
    pub region: String,
    pub farmers: usize,
    pub active_listings: usize,
    pub total_qty: f64,
    pub avg_listing_price: Option<f64>,
    pub business_needs: usize,
    pub grant_positive_updates: usize,
    pub barter_ready_listings: usize,
}

impl Kpi {
    /// Snapshot of the current fixtures, optionally narrowed to a region
    pub fn collect(fixtures: &Fixtures, period: &str, region: Option<&str>) -> Self {
        let farmers = farmers_in(fixtures.farmers(), region);
        let listings: Vec<&Product> = farmers.iter().flat_map(|f| f.products.iter()).collect();

        let prices: Vec<f64> = listings.iter().filter_map(|p| p.unit_price()).collect();
        let business_needs = fixtures
            .businesses()
            .iter()
            .filter(|b| matches_region(b.location.as_deref(), region))
            .map(|b| b.responses.len())
            .sum();
        let grant_positive_updates = fixtures
            .grants()
            .iter()
            .filter(|g| matches_region(g.applicant.as_deref(), region))
            .filter(|g| g.is_progressing())
            .count();

        Self {
            period: period.to_string(),
            region: region.unwrap_or("all").to_string(),
            farmers: farmers.len(),
            active_listings: listings.iter().filter(|p| !p.is_sold()).count(),
            total_qty: round2(listings.iter().map(|p| parse_qty(&p.quantity_text())).sum()),
            avg_listing_price: mean(&prices).map(round2).filter(|v| *v != 0.0),
            business_needs,
            grant_positive_updates,
            barter_ready_listings: listings
                .iter()
                .filter(|p| p.barter == Some(true) || p.is_available())
                .count(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Activity snapshot: {} farmers, {} active listings ({} units total). Avg price ~ {}. \
             {} open business needs; {} grants progressing.",
            self.farmers,
            self.active_listings,
            self.total_qty,
            price_label(self.avg_listing_price),
            self.business_needs,
            self.grant_positive_updates,
        )
    }
}

fn price_label(price: Option<f64>) -> String {
    price.map_or_else(|| "n/a".to_string(), |p| p.to_string())
}

#[derive(Debug, Deserialize)]
pub struct KpiArgs {
    #[serde(default = "period_7d")]
    pub period: String,
    #[serde(default = "scope_all")]
    pub scope: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KpiSummary {
    pub summary: String,
    pub scope: String,
    pub kpi: Kpi,
}

pub fn summarize_kpi(ctx: &ToolContext, args: KpiArgs) -> Result<KpiSummary> {
    let region = args.region.as_deref().filter(|r| !r.is_empty());
    let kpi = Kpi::collect(&ctx.fixtures, &args.period, region);
    Ok(KpiSummary {
        summary: kpi.summary(),
        scope: args.scope,
        kpi,
    })
}

#[derive(Debug, Deserialize)]
pub struct TrendArgs {
    pub metric: String,
    #[serde(default = "period_7d")]
    pub period: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub metric: String,
    pub period: String,
    pub region: String,
    pub current: f64,
    pub prior: f64,
    pub change_pct: f64,
    pub direction: &'static str,
}

/// Current value of a named KPI; unknown names read active listings
pub fn metric_value(kpi: &Kpi, metric: &str) -> f64 {
    match metric.to_lowercase().as_str() {
        "matchrate" => {
            if kpi.business_needs > 0 && kpi.active_listings > 0 {
                round2((kpi.active_listings as f64 / kpi.business_needs as f64).min(1.0))
            } else {
                0.0
            }
        }
        "avgprice" => kpi.avg_listing_price.unwrap_or(0.0),
        "grantapprovals" => kpi.grant_positive_updates as f64,
        "barterlistings" => kpi.barter_ready_listings as f64,
        _ => kpi.active_listings as f64,
    }
}

pub fn direction(change_pct: f64) -> &'static str {
    if change_pct > 5.0 {
        "up"
    } else if change_pct < -5.0 {
        "down"
    } else {
        "flat"
    }
}

pub fn analyze_trends(ctx: &ToolContext, args: TrendArgs) -> Result<TrendResult> {
    let region = args.region.as_deref().filter(|r| !r.is_empty());
    let kpi = Kpi::collect(&ctx.fixtures, &args.period, region);
    let current = metric_value(&kpi, &args.metric);
    // no history is kept; the prior period is modelled as 90% of today
    let baseline = current * 0.9;
    let change_pct = round2(pct_change(current, baseline));

    Ok(TrendResult {
        metric: args.metric,
        period: args.period,
        region: kpi.region,
        current,
        prior: round2(baseline),
        change_pct,
        direction: direction(change_pct),
    })
}

#[derive(Debug, Deserialize)]
pub struct PriceTrendArgs {
    pub crop: String,
    #[serde(default = "period_30d")]
    pub period: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTrendResult {
    pub crop: String,
    pub period: String,
    pub region: String,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub volatility: f64,
    pub samples: usize,
}

pub fn price_trends(ctx: &ToolContext, args: PriceTrendArgs) -> Result<PriceTrendResult> {
    let region = args.region.as_deref().filter(|r| !r.is_empty());
    let crop = args.crop.to_lowercase();
    let farmers = farmers_in(ctx.fixtures.farmers(), region);
    let prices: Vec<f64> = farmers
        .iter()
        .flat_map(|f| f.products.iter())
        .filter(|p| p.name_contains(&crop))
        .filter_map(Product::unit_price)
        .collect();

    Ok(PriceTrendResult {
        crop: args.crop,
        period: args.period,
        region: region.unwrap_or("all").to_string(),
        avg_price: mean(&prices).map(round2),
        min_price: prices.iter().copied().min_by(f64::total_cmp),
        max_price: prices.iter().copied().max_by(f64::total_cmp),
        volatility: std_dev(&prices).map(round2).unwrap_or(0.0),
        samples: prices.len(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ClimateArgs {
    #[serde(default = "period_7d")]
    pub period: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateResult {
    pub period: String,
    pub region: String,
    pub at_risk_percent: f64,
    pub at_risk_listings: usize,
    pub open_listings: usize,
    pub note: &'static str,
}

pub fn climate_impact(ctx: &ToolContext, args: ClimateArgs) -> Result<ClimateResult> {
    let region = args.region.as_deref().filter(|r| !r.is_empty());
    let farmers = farmers_in(ctx.fixtures.farmers(), region);
    let businesses = ctx.fixtures.businesses();

    let mut open = 0;
    let mut at_risk = 0;
    for farmer in &farmers {
        let farm_loc = farmer.display_location();
        let near_outlet = businesses.iter().any(|b| {
            pseudo_distance(&farm_loc, b.location.as_deref().unwrap_or("")) <= NEARBY_BUSINESS_KM
        });
        for product in farmer.products.iter().filter(|p| !p.is_sold()) {
            open += 1;
            if is_perishable(product.display_name()) && !near_outlet {
                at_risk += 1;
            }
        }
    }

    let pct = if open > 0 {
        round2(at_risk as f64 / open as f64 * 100.0)
    } else {
        0.0
    };
    Ok(ClimateResult {
        period: args.period,
        region: region.unwrap_or("all").to_string(),
        at_risk_percent: pct,
        at_risk_listings: at_risk,
        open_listings: open,
        note: if pct > CLIMATE_ALERT_PCT {
            "Consider advancing pickups and enabling cold storage."
        } else {
            "Risk appears manageable."
        },
    })
}

fn default_dimensions() -> Vec<String> {
    vec![
        "access".to_string(),
        "infrastructure".to_string(),
        "innovation".to_string(),
    ]
}

#[derive(Debug, Deserialize)]
pub struct SdgArgs {
    #[serde(default = "period_30d")]
    pub period: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SdgBreakdown {
    pub access: f64,
    pub infrastructure: f64,
    pub innovation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SdgResult {
    pub period: String,
    pub dimensions: Vec<String>,
    pub score: f64,
    pub breakdown: SdgBreakdown,
}

/// Map KPIs onto 0..=100 subscores and average the requested ones
pub fn sdg_from_kpi(kpi: &Kpi, period: &str, dimensions: Vec<String>) -> SdgResult {
    let breakdown = SdgBreakdown {
        access: (kpi.active_listings as f64 * 2.0).min(100.0),
        infrastructure: (kpi.grant_positive_updates as f64 * 20.0).min(100.0),
        innovation: (kpi.barter_ready_listings as f64 * 5.0).min(100.0),
    };
    let wanted: Vec<String> = dimensions.iter().map(|d| d.to_lowercase()).collect();
    let has = |d: &str| wanted.iter().any(|w| w == d);
    let mut parts = Vec::new();
    if has("access") {
        parts.push(breakdown.access);
    }
    if has("infrastructure") {
        parts.push(breakdown.infrastructure);
    }
    if has("innovation") {
        parts.push(breakdown.innovation);
    }

    SdgResult {
        period: period.to_string(),
        dimensions,
        score: mean(&parts).map(round2).unwrap_or(0.0),
        breakdown,
    }
}

pub fn sdg_score(ctx: &ToolContext, args: SdgArgs) -> Result<SdgResult> {
    let kpi = Kpi::collect(&ctx.fixtures, &args.period, None);
    Ok(sdg_from_kpi(&kpi, &args.period, args.dimensions))
}

fn default_format() -> String {
    "markdown".to_string()
}

fn default_sections() -> Vec<String> {
    ["summary", "kpis", "highlights", "recs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_audience() -> String {
    "exec".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ReportArgs {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
    #[serde(default = "default_audience")]
    pub audience: String,
}

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub audience: String,
    pub summary: String,
    pub kpi: Kpi,
    pub highlights: Vec<String>,
    pub recommendations: Vec<&'static str>,
    pub sdg: SdgResult,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Text(String),
    Json(Box<JsonReport>),
}

const RECOMMENDATIONS: [&str; 3] = [
    "Enable co-op aggregation for small lots to meet buyer volumes.",
    "Advance pickup windows for perishables in regions with higher risk.",
    "Target grants toward cold storage and first-mile logistics.",
];

pub fn generate_report(ctx: &ToolContext, args: ReportArgs) -> Result<Report> {
    let kpi = Kpi::collect(&ctx.fixtures, "7d", None);
    let summary = kpi.summary();
    let avg_price = metric_value(&kpi, "avgprice");
    let change = round2(pct_change(avg_price, avg_price * 0.9));
    let sdg = sdg_from_kpi(&Kpi::collect(&ctx.fixtures, "30d", None), "30d", default_dimensions());

    let highlights = vec![
        format!(
            "Match potential: ~{} buyer needs vs {} active listings.",
            kpi.business_needs, kpi.active_listings
        ),
        format!("Avg price change: {}% ({}).", change, direction(change)),
        format!("SDG-9 score: {} / 100 (Access/Infra/Innovation).", sdg.score),
    ];

    let format = args.format.to_lowercase();
    if format == "json" {
        return Ok(Report::Json(Box::new(JsonReport {
            audience: args.audience,
            summary,
            kpi,
            highlights,
            recommendations: RECOMMENDATIONS.to_vec(),
            sdg,
        })));
    }

    let wants = |s: &str| args.sections.iter().any(|x| x.eq_ignore_ascii_case(s));
    let mut blocks = Vec::new();
    if wants("summary") {
        blocks.push(format!("**Executive Summary**\n{}\n", summary));
    }
    if wants("kpis") {
        blocks.push(format!(
            "**KPIs (7d)**\n- Farmers: {}\n- Active listings: {}\n- Total qty: {}\n- Avg price: {}\n- Buyer needs: {}\n- Grants progressing: {}\n",
            kpi.farmers,
            kpi.active_listings,
            kpi.total_qty,
            price_label(kpi.avg_listing_price),
            kpi.business_needs,
            kpi.grant_positive_updates,
        ));
    }
    if wants("highlights") {
        blocks.push(format!("**Highlights**\n- {}\n", highlights.join("\n- ")));
    }
    if wants("recs") {
        blocks.push(format!("**Recommendations**\n- {}\n", RECOMMENDATIONS.join("\n- ")));
    }
    if wants("sdg") {
        blocks.push(format!("**SDG-9**\nScore: {} / 100", sdg.score));
    }

    let body = blocks.join("\n");
    Ok(Report::Text(if format == "markdown" {
        body
    } else {
        body.replace("**", "")
    }))
}
