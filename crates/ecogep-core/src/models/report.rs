//! Typed view over the model's JSON valuation reply.
//!
//! The schema is requested from the model in prose only, so every field is
//! optional on the wire. Construction never fails on a JSON object: missing
//! fields take the documented defaults and mistyped fields are coerced where
//! the intent is unambiguous (`"85"` for a score) or defaulted otherwise.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use super::money::{format_loss, format_money, parse_amount};

pub const DEFAULT_ECOSYSTEM_NAME: &str = "未知";
pub const DEFAULT_FORMULA: &str = "V = S × E × K";
pub const DEFAULT_S_EXPLAIN: &str = "默认标准单位1公顷";
pub const DEFAULT_E_EXPLAIN: &str = "参考谢高地标准";
pub const DEFAULT_K_EXPLAIN: &str = "根据长势修正";
pub const DEFAULT_SCENARIO: &str = "开发模拟";
pub const DEFAULT_CHAIN: &str = "推导中...";
pub const DEFAULT_SUGGESTION_TITLE: &str = "保护建议";

/// Parsed valuation of one photographed parcel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationReport {
    pub meta: Meta,
    pub visual_evidence: Vec<String>,
    pub calculation_process: CalculationProcess,
    /// Number or decorated string; see [`format_money`]
    pub total_value: Value,
    /// Service category -> amount, in the order the model listed them
    pub breakdown: IndexMap<String, Value>,
    pub simulation: Simulation,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip)]
    raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub ecosystem_name: String,
    /// Conventionally 0-100; not clamped
    pub health_score: i64,
    /// Tons of carbon sequestered per year
    pub carbon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationProcess {
    pub formula: String,
    pub param_explanation: ParamExplanation,
    pub math_detail: String,
}

/// Why the model chose each term of V = S × E × K
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamExplanation {
    #[serde(rename = "S_explain")]
    pub area: String,
    #[serde(rename = "E_explain")]
    pub coefficient: String,
    #[serde(rename = "K_explain")]
    pub correction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub scenario: String,
    pub loss_value: Value,
    pub chain_of_consequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub content: String,
}

/// The four headline metrics, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub ecosystem_name: String,
    pub health_score: i64,
    pub carbon: f64,
    pub total_value: String,
}

impl ValuationReport {
    /// Build the typed view over a reply object. Non-object input yields a
    /// report made entirely of defaults.
    pub fn from_value(raw: Value) -> Self {
        let meta = object(&raw, "meta");
        let calc = object(&raw, "calculation_process");
        let params = calc.and_then(|c| object(c, "param_explanation"));
        let sim = object(&raw, "simulation");

        Self {
            meta: Meta {
                ecosystem_name: text(get(meta, "ecosystem_name"), DEFAULT_ECOSYSTEM_NAME),
                health_score: integer(get(meta, "health_score")),
                carbon: float(get(meta, "carbon")),
            },
            visual_evidence: strings(field(&raw, "visual_evidence")),
            calculation_process: CalculationProcess {
                formula: text(get(calc, "formula"), DEFAULT_FORMULA),
                param_explanation: ParamExplanation {
                    area: text(get(params, "S_explain"), DEFAULT_S_EXPLAIN),
                    coefficient: text(get(params, "E_explain"), DEFAULT_E_EXPLAIN),
                    correction: text(get(params, "K_explain"), DEFAULT_K_EXPLAIN),
                },
                math_detail: text(get(calc, "math_detail"), ""),
            },
            total_value: amount(field(&raw, "total_value")),
            breakdown: breakdown(field(&raw, "breakdown")),
            simulation: Simulation {
                scenario: text(get(sim, "scenario"), DEFAULT_SCENARIO),
                loss_value: amount(get(sim, "loss_value")),
                chain_of_consequence: text(get(sim, "chain_of_consequence"), DEFAULT_CHAIN),
            },
            suggestions: suggestions(field(&raw, "suggestions")),
            raw,
        }
    }

    /// The reply object exactly as the model sent it
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Compact JSON of the original reply, used as follow-up context.
    /// Non-ASCII text is kept as-is.
    pub fn context_json(&self) -> String {
        self.raw.to_string()
    }

    pub fn headline(&self) -> Headline {
        Headline {
            ecosystem_name: self.meta.ecosystem_name.clone(),
            health_score: self.meta.health_score,
            carbon: self.meta.carbon,
            total_value: format_money(&self.total_value),
        }
    }

    pub fn total_value_display(&self) -> String {
        format_money(&self.total_value)
    }

    pub fn loss_display(&self) -> String {
        format_loss(&self.simulation.loss_value)
    }

    /// `(label, amount)` pairs for a radar chart. Entries without a numeric
    /// amount are left out.
    pub fn breakdown_series(&self) -> Vec<(String, f64)> {
        self.breakdown
            .iter()
            .filter_map(|(label, value)| match parse_amount(value) {
                Some(amount) => Some((label.clone(), amount)),
                None => {
                    tracing::debug!(label = %label, "Skipping non-numeric breakdown entry");
                    None
                }
            })
            .collect()
    }
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn get<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    parent.and_then(|p| field(p, key))
}

fn object<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    field(value, key).filter(|v| v.is_object())
}

fn text(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        None => default.to_string(),
        Some(other) => {
            tracing::debug!(value = %other, "Expected text field, using default");
            default.to_string()
        }
    }
}

fn float(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| float(value).round() as i64),
        Some(Value::String(_)) => float(value).round() as i64,
        _ => 0,
    }
}

fn amount(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or_else(|| json!(0))
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn breakdown(value: Option<&Value>) -> IndexMap<String, Value> {
    match value {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => IndexMap::new(),
    }
}

fn suggestions(value: Option<&Value>) -> Vec<Suggestion> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => Some(Suggestion {
                title: text(field(item, "title"), DEFAULT_SUGGESTION_TITLE),
                content: text(field(item, "content"), ""),
            }),
            Value::String(s) => Some(Suggestion {
                title: DEFAULT_SUGGESTION_TITLE.to_string(),
                content: s.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let report = ValuationReport::from_value(json!({}));
        assert_eq!(report.meta.ecosystem_name, DEFAULT_ECOSYSTEM_NAME);
        assert_eq!(report.meta.health_score, 0);
        assert_eq!(report.meta.carbon, 0.0);
        assert_eq!(report.total_value, json!(0));
        assert!(report.breakdown.is_empty());
        assert!(report.visual_evidence.is_empty());
        assert!(report.suggestions.is_empty());
        assert_eq!(report.calculation_process.param_explanation.area, DEFAULT_S_EXPLAIN);
        assert_eq!(report.simulation.chain_of_consequence, DEFAULT_CHAIN);
        assert_eq!(report.loss_display(), "-¥0");
    }

    #[test]
    fn test_type_coercion() {
        let report = ValuationReport::from_value(json!({
            "meta": {"ecosystem_name": 42, "health_score": "85", "carbon": "15.5"},
            "visual_evidence": "单条线索",
        }));
        assert_eq!(report.meta.ecosystem_name, "42");
        assert_eq!(report.meta.health_score, 85);
        assert_eq!(report.meta.carbon, 15.5);
        assert_eq!(report.visual_evidence, vec!["单条线索".to_string()]);

        let rounded = ValuationReport::from_value(json!({"meta": {"health_score": 85.6}}));
        assert_eq!(rounded.meta.health_score, 86);
    }

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mistyped_text_is_quiet_at_info_level() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();

        let report = tracing::subscriber::with_default(subscriber, || {
            ValuationReport::from_value(json!({
                "meta": {"ecosystem_name": ["森林"]},
                "simulation": {"scenario": {"name": "砍伐"}},
            }))
        });

        assert_eq!(report.meta.ecosystem_name, DEFAULT_ECOSYSTEM_NAME);
        assert_eq!(report.simulation.scenario, DEFAULT_SCENARIO);
        assert!(log.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_shapes_fall_back() {
        let report = ValuationReport::from_value(json!({
            "meta": "森林",
            "breakdown": [1, 2, 3],
            "suggestions": [{"content": "补植"}, "加强巡护", 7],
        }));
        assert_eq!(report.meta.ecosystem_name, DEFAULT_ECOSYSTEM_NAME);
        assert!(report.breakdown.is_empty());
        assert_eq!(report.suggestions.len(), 2);
        assert_eq!(report.suggestions[0].title, DEFAULT_SUGGESTION_TITLE);
        assert_eq!(report.suggestions[1].content, "加强巡护");
    }

    #[test]
    fn test_breakdown_series_keeps_order_and_skips_text() {
        let report = ValuationReport::from_value(json!({
            "breakdown": {"供给服务": 5000, "调节服务": "¥25,000", "文化服务": "较高", "支持服务": 10000}
        }));
        let series = report.breakdown_series();
        let labels: Vec<_> = series.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["供给服务", "调节服务", "支持服务"]);
        assert_eq!(series[1].1, 25000.0);
    }

    #[test]
    fn test_headline_and_context() {
        let raw = json!({
            "meta": {"ecosystem_name": "阔叶林", "health_score": 85, "carbon": 120.5},
            "total_value": "50000元",
            "extra": "kept"
        });
        let report = ValuationReport::from_value(raw.clone());
        let headline = report.headline();
        assert_eq!(headline.total_value, "¥50,000");
        assert_eq!(headline.health_score, 85);

        let context: Value = serde_json::from_str(&report.context_json()).unwrap();
        assert_eq!(context, raw);
        assert!(report.context_json().contains("阔叶林"));
    }
}
