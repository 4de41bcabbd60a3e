use ecogep_core::config::ConfigSource;
use ecogep_core::models::coefficients::CategoryEntry;
use ecogep_core::models::{Headline, ServiceKind, ValuationReport};
use serde::Serialize;
use tabled::Tabled;

/// One row of the full coefficient table
#[derive(Debug, Tabled)]
pub struct CoefficientRow {
    #[tabled(rename = "类别")]
    pub category: &'static str,
    #[tabled(rename = "食物生产")]
    pub food_production: String,
    #[tabled(rename = "原料生产")]
    pub raw_material: String,
    #[tabled(rename = "水资源供给")]
    pub water_supply: String,
    #[tabled(rename = "气体调节")]
    pub gas_regulation: String,
    #[tabled(rename = "气候调节")]
    pub climate_regulation: String,
    #[tabled(rename = "净化环境")]
    pub environmental_purification: String,
    #[tabled(rename = "水文调节")]
    pub hydrological_regulation: String,
    #[tabled(rename = "土壤保持")]
    pub soil_conservation: String,
    #[tabled(rename = "维持养分循环")]
    pub nutrient_cycling: String,
    #[tabled(rename = "生物多样性")]
    pub biodiversity: String,
    #[tabled(rename = "美学景观")]
    pub aesthetic_landscape: String,
    #[tabled(rename = "合计")]
    pub total: String,
}

impl From<&CategoryEntry> for CoefficientRow {
    fn from(entry: &CategoryEntry) -> Self {
        let c = &entry.coefficients;
        Self {
            category: entry.category,
            food_production: factor(c.food_production),
            raw_material: factor(c.raw_material),
            water_supply: factor(c.water_supply),
            gas_regulation: factor(c.gas_regulation),
            climate_regulation: factor(c.climate_regulation),
            environmental_purification: factor(c.environmental_purification),
            hydrological_regulation: factor(c.hydrological_regulation),
            soil_conservation: factor(c.soil_conservation),
            nutrient_cycling: factor(c.nutrient_cycling),
            biodiversity: factor(c.biodiversity),
            aesthetic_landscape: factor(c.aesthetic_landscape),
            total: factor(c.total()),
        }
    }
}

/// One service of a single category
#[derive(Debug, Tabled)]
pub struct ServiceRow {
    #[tabled(rename = "Service")]
    pub label: &'static str,
    #[tabled(rename = "English")]
    pub english: &'static str,
    #[tabled(rename = "Factor")]
    pub factor: String,
}

impl ServiceRow {
    pub fn for_entry(entry: &CategoryEntry) -> Vec<Self> {
        ServiceKind::ALL
            .iter()
            .map(|service| Self {
                label: service.label(),
                english: service.english_name(),
                factor: factor(entry.coefficients.get(*service)),
            })
            .collect()
    }
}

/// Output for table command
#[derive(Debug, Serialize)]
pub struct TableOutput {
    pub rows: Vec<TableEntryOutput>,
}

#[derive(Debug, Serialize)]
pub struct TableEntryOutput {
    pub land_class: &'static str,
    #[serde(flatten)]
    pub entry: CategoryEntry,
    pub total: f64,
}

impl From<&CategoryEntry> for TableEntryOutput {
    fn from(entry: &CategoryEntry) -> Self {
        Self {
            land_class: entry.land_class(),
            entry: *entry,
            total: entry.coefficients.total(),
        }
    }
}

/// Breakdown line of a report
#[derive(Debug, Tabled)]
pub struct BreakdownRow {
    #[tabled(rename = "服务")]
    pub service: String,
    #[tabled(rename = "价值")]
    pub value: String,
}

/// Output for assess command
#[derive(Debug, Serialize)]
pub struct AssessOutput<'a> {
    pub headline: Headline,
    pub loss_display: String,
    pub breakdown_series: Vec<(String, f64)>,
    pub report: &'a ValuationReport,
}

impl<'a> From<&'a ValuationReport> for AssessOutput<'a> {
    fn from(report: &'a ValuationReport) -> Self {
        Self {
            headline: report.headline(),
            loss_display: report.loss_display(),
            breakdown_series: report.breakdown_series(),
            report,
        }
    }
}

/// One configuration value with its source
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source", display_with = "display_source")]
    pub source: ConfigSource,
}

fn display_source(source: &ConfigSource) -> String {
    format!("{:?}", source)
}

fn factor(value: f64) -> String {
    format!("{:.2}", value)
}
