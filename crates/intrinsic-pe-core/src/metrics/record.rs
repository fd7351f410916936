use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::{Amount, Multiple, Rate};
use crate::units::{is_not_found_sentinel, parse_amount, parse_percentage, parse_ratio};
use crate::ValuationResult;

// ---------------------------------------------------------------------------
// Raw record, as delivered by a metrics provider
// ---------------------------------------------------------------------------

/// A field as reported by the data source: a JSON number, or text that is
/// either numeric or a "not found" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(serde_json::Number),
    Text(String),
}

impl RawField {
    pub fn text(s: impl Into<String>) -> Self {
        RawField::Text(s.into())
    }

    fn as_text(&self) -> String {
        match self {
            RawField::Number(n) => n.to_string(),
            RawField::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Reporting window of a growth figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthPeriod {
    #[serde(rename = "10yr")]
    TenYears,
    #[serde(rename = "5yr")]
    FiveYears,
    #[serde(rename = "3yr")]
    ThreeYears,
    #[serde(rename = "TTM")]
    TrailingTwelveMonths,
}

impl GrowthPeriod {
    pub const ALL: [GrowthPeriod; 4] = [
        GrowthPeriod::TenYears,
        GrowthPeriod::FiveYears,
        GrowthPeriod::ThreeYears,
        GrowthPeriod::TrailingTwelveMonths,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GrowthPeriod::TenYears => "10 Years",
            GrowthPeriod::FiveYears => "5 Years",
            GrowthPeriod::ThreeYears => "3 Years",
            GrowthPeriod::TrailingTwelveMonths => "TTM",
        }
    }
}

impl FromStr for GrowthPeriod {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "").as_str() {
            "10yr" | "10yrs" | "10years" => Ok(GrowthPeriod::TenYears),
            "5yr" | "5yrs" | "5years" => Ok(GrowthPeriod::FiveYears),
            "3yr" | "3yrs" | "3years" => Ok(GrowthPeriod::ThreeYears),
            "ttm" => Ok(GrowthPeriod::TrailingTwelveMonths),
            _ => Err(ValuationError::parse(
                "growth.period",
                s,
                "expected one of 10yr, 5yr, 3yr, TTM",
            )),
        }
    }
}

/// One row of the compounded growth table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGrowthRow {
    pub period: GrowthPeriod,
    #[serde(default)]
    pub sales_growth_pct: Option<RawField>,
    #[serde(default)]
    pub profit_growth_pct: Option<RawField>,
}

/// Fundamentals of one company as extracted by the data source.
///
/// Every field may carry a sentinel string instead of a value; missing or
/// `null` JSON fields are treated the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMetrics {
    pub company_name: String,
    #[serde(default)]
    pub current_pe: Option<RawField>,
    #[serde(default)]
    pub nse_symbol: Option<String>,
    #[serde(default)]
    pub market_cap_raw: Option<RawField>,
    #[serde(default)]
    pub net_profit_raw: Option<RawField>,
    #[serde(default)]
    pub median_roce: Option<RawField>,
    #[serde(default)]
    pub growth: Vec<RawGrowthRow>,
}

// ---------------------------------------------------------------------------
// Typed record
// ---------------------------------------------------------------------------

/// A value that the data source either supplied or reported as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric<T> {
    Available { value: T },
    Missing { sentinel: String },
}

impl<T: Clone> Metric<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Available { value } => Some(value),
            Metric::Missing { .. } => None,
        }
    }

    /// The value, or a `MissingInput` error naming the field.
    pub fn require(&self, field: &str) -> ValuationResult<T> {
        match self {
            Metric::Available { value } => Ok(value.clone()),
            Metric::Missing { sentinel } => Err(ValuationError::MissingInput {
                field: field.to_string(),
                sentinel: sentinel.clone(),
            }),
        }
    }
}

/// A field that could not be converted, kept so the rest of the record survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    /// Raw text as supplied
    pub value: String,
    pub reason: String,
}

/// Parsed growth table row; rates are fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthRow {
    pub period: GrowthPeriod,
    pub label: String,
    pub sales_growth: Option<Metric<Rate>>,
    pub profit_growth: Option<Metric<Rate>>,
}

/// Parsed market figures. Unparseable fields hold `None` and are listed in
/// `field_errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub company_name: String,
    pub nse_symbol: Metric<String>,
    pub current_pe: Option<Metric<Multiple>>,
    pub market_cap_raw: String,
    pub market_cap: Option<Metric<Amount>>,
    pub net_profit_raw: String,
    pub net_profit: Option<Metric<Amount>>,
    /// Median ROCE as reported, in percent
    pub median_roce_pct: Option<Metric<Decimal>>,
    pub growth: Vec<GrowthRow>,
    pub field_errors: Vec<FieldError>,
}

impl MetricsRecord {
    /// Convert every field independently; one bad field never discards the others.
    pub fn from_raw(raw: &RawMetrics) -> Self {
        let mut errors = Vec::new();

        let nse_symbol = match raw.nse_symbol.as_deref() {
            Some(s) if !is_not_found_sentinel(s) => Metric::Available {
                value: s.trim().to_string(),
            },
            Some(s) => Metric::Missing {
                sentinel: s.to_string(),
            },
            None => missing_placeholder(),
        };

        let current_pe = convert(&mut errors, "current_pe", raw.current_pe.as_ref(), |s| {
            parse_ratio("current_pe", s)
        });
        let market_cap = convert(&mut errors, "market_cap", raw.market_cap_raw.as_ref(), |s| {
            parse_amount(s)
        });
        let net_profit = convert(&mut errors, "net_profit", raw.net_profit_raw.as_ref(), |s| {
            parse_amount(s)
        });
        let median_roce_pct = convert(&mut errors, "median_roce", raw.median_roce.as_ref(), |s| {
            parse_ratio("median_roce", s)
        });

        let growth = raw
            .growth
            .iter()
            .map(|row| {
                let sales_field = format!("growth.{}.sales", row.period.label());
                let profit_field = format!("growth.{}.profit", row.period.label());
                GrowthRow {
                    period: row.period,
                    label: row.period.label().to_string(),
                    sales_growth: convert(&mut errors, &sales_field, row.sales_growth_pct.as_ref(), |s| {
                        parse_percentage(&sales_field, s)
                    }),
                    profit_growth: convert(
                        &mut errors,
                        &profit_field,
                        row.profit_growth_pct.as_ref(),
                        |s| parse_percentage(&profit_field, s),
                    ),
                }
            })
            .collect();

        for e in &errors {
            tracing::warn!(field = %e.field, value = %e.value, reason = %e.reason, "metrics field could not be parsed");
        }

        MetricsRecord {
            company_name: raw.company_name.trim().to_string(),
            nse_symbol,
            current_pe,
            market_cap_raw: display_raw(raw.market_cap_raw.as_ref()),
            market_cap,
            net_profit_raw: display_raw(raw.net_profit_raw.as_ref()),
            net_profit,
            median_roce_pct,
            growth,
            field_errors: errors,
        }
    }

    /// Names of fields the data source reported as missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if matches!(self.current_pe, Some(Metric::Missing { .. })) {
            out.push("current_pe");
        }
        if matches!(self.market_cap, Some(Metric::Missing { .. })) {
            out.push("market_cap");
        }
        if matches!(self.net_profit, Some(Metric::Missing { .. })) {
            out.push("net_profit");
        }
        if matches!(self.median_roce_pct, Some(Metric::Missing { .. })) {
            out.push("median_roce");
        }
        if matches!(self.nse_symbol, Metric::Missing { .. }) {
            out.push("nse_symbol");
        }
        out
    }

    /// Look up a field that must be present and numeric.
    ///
    /// Sentinels become `MissingInput`; unparseable fields are reported
    /// as a `Parse` error carrying the recorded message.
    pub fn require<T: Clone>(&self, field: &str, metric: &Option<Metric<T>>) -> ValuationResult<T> {
        match metric {
            Some(m) => m.require(field),
            None => {
                let err = match self.field_errors.iter().find(|e| e.field == field) {
                    Some(e) => ValuationError::parse(field, e.value.clone(), e.reason.clone()),
                    None => ValuationError::parse(field, "", "unparseable"),
                };
                Err(err)
            }
        }
    }
}

fn missing_placeholder<T>() -> Metric<T> {
    Metric::Missing {
        sentinel: String::new(),
    }
}

fn display_raw(field: Option<&RawField>) -> String {
    field.map(RawField::to_string).unwrap_or_default()
}

fn convert<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    raw: Option<&RawField>,
    parse: impl FnOnce(&str) -> ValuationResult<T>,
) -> Option<Metric<T>> {
    let text = match raw {
        None => return Some(missing_placeholder()),
        Some(r) => r.as_text(),
    };
    if is_not_found_sentinel(&text) {
        return Some(Metric::Missing { sentinel: text });
    }
    match parse(&text) {
        Ok(value) => Some(Metric::Available { value }),
        Err(e) => {
            let reason = match e {
                ValuationError::Parse { reason, .. } => reason,
                other => other.to_string(),
            };
            errors.push(FieldError {
                field: field.to_string(),
                value: text,
                reason,
            });
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
