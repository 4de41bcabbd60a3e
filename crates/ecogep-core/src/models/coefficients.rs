//! Ecosystem service equivalent-factor table (Xie Gaodi, 2015).
//!
//! One row per secondary land-cover category, one column per ecosystem
//! service. Values are dimensionless equivalent factors relative to the
//! grain-production value of one hectare of average farmland. Rows and
//! columns keep the order of the published table.

use serde::Serialize;

/// The eleven ecosystem services of the table, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    FoodProduction,
    RawMaterial,
    WaterSupply,
    GasRegulation,
    ClimateRegulation,
    EnvironmentalPurification,
    HydrologicalRegulation,
    SoilConservation,
    NutrientCycling,
    Biodiversity,
    AestheticLandscape,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 11] = [
        ServiceKind::FoodProduction,
        ServiceKind::RawMaterial,
        ServiceKind::WaterSupply,
        ServiceKind::GasRegulation,
        ServiceKind::ClimateRegulation,
        ServiceKind::EnvironmentalPurification,
        ServiceKind::HydrologicalRegulation,
        ServiceKind::SoilConservation,
        ServiceKind::NutrientCycling,
        ServiceKind::Biodiversity,
        ServiceKind::AestheticLandscape,
    ];

    /// Column heading as printed in the source table
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::FoodProduction => "食物生产",
            ServiceKind::RawMaterial => "原料生产",
            ServiceKind::WaterSupply => "水资源供给",
            ServiceKind::GasRegulation => "气体调节",
            ServiceKind::ClimateRegulation => "气候调节",
            ServiceKind::EnvironmentalPurification => "净化环境",
            ServiceKind::HydrologicalRegulation => "水文调节",
            ServiceKind::SoilConservation => "土壤保持",
            ServiceKind::NutrientCycling => "维持养分循环",
            ServiceKind::Biodiversity => "生物多样性",
            ServiceKind::AestheticLandscape => "美学景观",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            ServiceKind::FoodProduction => "food production",
            ServiceKind::RawMaterial => "raw material",
            ServiceKind::WaterSupply => "water supply",
            ServiceKind::GasRegulation => "gas regulation",
            ServiceKind::ClimateRegulation => "climate regulation",
            ServiceKind::EnvironmentalPurification => "environmental purification",
            ServiceKind::HydrologicalRegulation => "hydrological regulation",
            ServiceKind::SoilConservation => "soil conservation",
            ServiceKind::NutrientCycling => "nutrient cycling",
            ServiceKind::Biodiversity => "biodiversity",
            ServiceKind::AestheticLandscape => "aesthetic landscape",
        }
    }

    /// Column position in the table
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Equivalent factors of one land-cover category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServiceCoefficients {
    pub food_production: f64,
    pub raw_material: f64,
    pub water_supply: f64,
    pub gas_regulation: f64,
    pub climate_regulation: f64,
    pub environmental_purification: f64,
    pub hydrological_regulation: f64,
    pub soil_conservation: f64,
    pub nutrient_cycling: f64,
    pub biodiversity: f64,
    pub aesthetic_landscape: f64,
}

impl ServiceCoefficients {
    const fn from_row(v: [f64; 11]) -> Self {
        Self {
            food_production: v[0],
            raw_material: v[1],
            water_supply: v[2],
            gas_regulation: v[3],
            climate_regulation: v[4],
            environmental_purification: v[5],
            hydrological_regulation: v[6],
            soil_conservation: v[7],
            nutrient_cycling: v[8],
            biodiversity: v[9],
            aesthetic_landscape: v[10],
        }
    }

    pub fn get(&self, service: ServiceKind) -> f64 {
        match service {
            ServiceKind::FoodProduction => self.food_production,
            ServiceKind::RawMaterial => self.raw_material,
            ServiceKind::WaterSupply => self.water_supply,
            ServiceKind::GasRegulation => self.gas_regulation,
            ServiceKind::ClimateRegulation => self.climate_regulation,
            ServiceKind::EnvironmentalPurification => self.environmental_purification,
            ServiceKind::HydrologicalRegulation => self.hydrological_regulation,
            ServiceKind::SoilConservation => self.soil_conservation,
            ServiceKind::NutrientCycling => self.nutrient_cycling,
            ServiceKind::Biodiversity => self.biodiversity,
            ServiceKind::AestheticLandscape => self.aesthetic_landscape,
        }
    }

    /// All eleven factors in column order
    pub fn values(&self) -> [f64; 11] {
        ServiceKind::ALL.map(|service| self.get(service))
    }

    /// Sum of the eleven factors (negative water supply of paddy fields included)
    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }
}

/// A named row of the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub category: &'static str,
    pub coefficients: ServiceCoefficients,
}

impl CategoryEntry {
    /// Primary land class, e.g. "森林" for "阔叶林 (森林)"
    pub fn land_class(&self) -> &'static str {
        land_class(self.category)
    }
}

const fn entry(category: &'static str, row: [f64; 11]) -> CategoryEntry {
    CategoryEntry { category, coefficients: ServiceCoefficients::from_row(row) }
}

static ENTRIES: [CategoryEntry; 14] = [
    entry("旱地 (农田)", [0.85, 0.40, 0.02, 0.67, 0.36, 0.10, 0.27, 1.03, 0.12, 0.13, 0.06]),
    entry("水田 (农田)", [1.36, 0.09, -2.63, 1.11, 0.57, 0.17, 2.72, 0.01, 0.19, 0.21, 0.09]),
    entry("针叶林 (森林)", [0.22, 0.52, 0.27, 1.70, 5.07, 1.49, 3.34, 2.06, 0.16, 1.88, 0.82]),
    entry("针阔混交 (森林)", [0.31, 0.71, 0.37, 2.35, 7.03, 1.99, 3.51, 2.86, 0.22, 2.60, 1.14]),
    entry("阔叶林 (森林)", [0.29, 0.66, 0.34, 2.17, 6.50, 1.93, 4.74, 2.65, 0.20, 2.41, 1.06]),
    entry("灌木林 (森林)", [0.19, 0.43, 0.22, 1.41, 4.23, 1.28, 3.35, 1.72, 0.13, 1.57, 0.69]),
    entry("草原 (草地)", [0.10, 0.14, 0.08, 0.51, 1.34, 0.44, 0.98, 0.62, 0.05, 0.56, 0.25]),
    entry("灌草丛 (草地)", [0.38, 0.56, 0.31, 1.97, 5.21, 1.72, 3.82, 2.40, 0.18, 2.18, 0.96]),
    entry("草甸 (草地)", [0.22, 0.33, 0.18, 1.14, 3.02, 1.00, 2.21, 1.39, 0.11, 1.27, 0.56]),
    entry("湿地 (湿地)", [0.51, 0.50, 2.59, 1.90, 3.60, 3.60, 24.23, 2.31, 0.18, 7.87, 4.73]),
    entry("荒漠 (荒漠)", [0.01, 0.03, 0.02, 0.11, 0.10, 0.31, 0.21, 0.13, 0.01, 0.12, 0.05]),
    entry("裸地 (荒漠)", [0.00, 0.00, 0.00, 0.02, 0.00, 0.10, 0.03, 0.02, 0.00, 0.02, 0.01]),
    entry("水系 (水域)", [0.80, 0.23, 8.29, 0.77, 2.29, 5.55, 102.24, 0.93, 0.07, 2.55, 1.89]),
    entry("冰川积雪 (水域)", [0.00, 0.00, 2.16, 0.18, 0.54, 0.16, 7.13, 0.00, 0.00, 0.01, 0.09]),
];

/// Read-only view over the published table
#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientTable;

impl CoefficientTable {
    pub fn new() -> Self {
        Self
    }

    /// Factors for a category, matched on the exact row label
    pub fn lookup(&self, category: &str) -> Option<&'static ServiceCoefficients> {
        ENTRIES
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| &entry.coefficients)
    }

    /// Rows in table order
    pub fn iter(&self) -> impl Iterator<Item = &'static CategoryEntry> {
        ENTRIES.iter()
    }

    pub fn categories(&self) -> impl Iterator<Item = &'static str> {
        ENTRIES.iter().map(|entry| entry.category)
    }

    /// Rows whose primary land class matches, e.g. every "森林" row
    pub fn by_land_class<'a>(
        &self,
        class: &'a str,
    ) -> impl Iterator<Item = &'static CategoryEntry> + 'a {
        ENTRIES.iter().filter(move |entry| entry.land_class() == class)
    }

    pub fn len(&self) -> usize {
        ENTRIES.len()
    }

    pub fn is_empty(&self) -> bool {
        ENTRIES.is_empty()
    }
}

/// Extract the parenthesised primary class from a row label
pub fn land_class(category: &str) -> &str {
    category
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(class, _)| class.trim())
        .unwrap_or(category)
}
