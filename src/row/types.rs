//! Flattened spreadsheet row.

use std::fmt;

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Sentinel written when an outcome has no price.
pub const NOT_AVAILABLE: &str = "N/A";

/// Price column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceCell {
    /// A price in [0, 1].
    Price(Decimal),
    /// No price data for this poll.
    Unavailable,
}

impl fmt::Display for PriceCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceCell::Price(p) => write!(f, "{p}"),
            PriceCell::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// One cell of a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Free text.
    Text(String),
    /// Boolean flag.
    Flag(bool),
    /// Numeric price, serialized as a JSON number.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    Number(Decimal),
}

impl From<PriceCell> for CellValue {
    fn from(cell: PriceCell) -> Self {
        match cell {
            PriceCell::Price(p) => CellValue::Number(p),
            PriceCell::Unavailable => CellValue::Text(NOT_AVAILABLE.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Flag(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// One poll's worth of market data, ready for a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    /// When the row was built.
    pub timestamp: OffsetDateTime,
    /// Market question.
    pub market_title: String,
    /// Market slug.
    pub market_slug: String,
    /// Condition ID.
    pub condition_id: String,
    /// Category label.
    pub category: String,
    /// End date as reported upstream.
    pub end_date: String,
    /// Whether the market is active.
    pub active: bool,
    /// Whether the market is closed.
    pub closed: bool,
    /// `(outcome, price)` pairs in outcome order.
    pub prices: Vec<(String, PriceCell)>,
}

impl PriceRow {
    /// Fixed leading columns, before the per-outcome prices.
    pub const BASE_COLUMNS: [&'static str; 8] = [
        "timestamp",
        "market_title",
        "market_slug",
        "condition_id",
        "category",
        "end_date",
        "active",
        "closed",
    ];

    /// Column name for an outcome's price.
    pub fn price_column(outcome: &str) -> String {
        format!("{outcome}_price")
    }

    /// RFC 3339 timestamp string.
    pub fn timestamp_string(&self) -> String {
        self.timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string())
    }

    /// Column names in order.
    pub fn headers(&self) -> Vec<String> {
        Self::BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.prices.iter().map(|(o, _)| Self::price_column(o)))
            .collect()
    }

    /// Cell values in column order.
    pub fn values(&self) -> Vec<CellValue> {
        let mut values = vec![
            CellValue::Text(self.timestamp_string()),
            CellValue::Text(self.market_title.clone()),
            CellValue::Text(self.market_slug.clone()),
            CellValue::Text(self.condition_id.clone()),
            CellValue::Text(self.category.clone()),
            CellValue::Text(self.end_date.clone()),
            CellValue::Flag(self.active),
            CellValue::Flag(self.closed),
        ];
        values.extend(self.prices.iter().map(|(_, p)| CellValue::from(*p)));
        values
    }

    /// `(column, value)` pairs in order.
    pub fn columns(&self) -> Vec<(String, CellValue)> {
        self.headers().into_iter().zip(self.values()).collect()
    }

    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<CellValue> {
        self.columns()
            .into_iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// One-line JSON object with keys in column order.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Same row with the timestamp cleared, for comparing polls.
    pub fn without_timestamp(&self) -> Self {
        Self {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            ..self.clone()
        }
    }
}

/// Serializes as a flat object keyed by column name, in column order.
impl Serialize for PriceRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns = self.columns();
        let mut map = serializer.serialize_map(Some(columns.len()))?;
        for (name, value) in &columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn row() -> PriceRow {
        PriceRow {
            timestamp: datetime!(2026-10-19 12:00:00 UTC),
            market_title: "Will it rain?".to_string(),
            market_slug: "will-it-rain".to_string(),
            condition_id: "0xabc".to_string(),
            category: "Weather".to_string(),
            end_date: "2026-12-31".to_string(),
            active: true,
            closed: false,
            prices: vec![
                ("Yes".to_string(), PriceCell::Price(dec!(0.5))),
                ("No".to_string(), PriceCell::Unavailable),
            ],
        }
    }

    #[test]
    fn headers_follow_base_then_outcomes() {
        let headers = row().headers();
        assert_eq!(headers.len(), 10);
        assert_eq!(headers[0], "timestamp");
        assert_eq!(headers[7], "closed");
        assert_eq!(headers[8], "Yes_price");
        assert_eq!(headers[9], "No_price");
    }

    #[test]
    fn values_line_up_with_headers() {
        let row = row();
        assert_eq!(row.values().len(), row.headers().len());
        assert_eq!(
            row.get("timestamp"),
            Some(CellValue::Text("2026-10-19T12:00:00Z".to_string()))
        );
        assert_eq!(row.get("active"), Some(CellValue::Flag(true)));
        assert_eq!(row.get("Yes_price"), Some(CellValue::Number(dec!(0.5))));
        assert_eq!(row.get("No_price"), Some(CellValue::Text("N/A".to_string())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn json_line_keeps_column_order() {
        let line = row().to_json_line().unwrap();
        assert!(line.starts_with("{\"timestamp\":\"2026-10-19T12:00:00Z\",\"market_title\""));
        assert!(line.ends_with("\"Yes_price\":0.5,\"No_price\":\"N/A\"}"));

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["closed"], serde_json::Value::Bool(false));
    }

    #[test]
    fn serializes_as_flat_object_of_columns() {
        let row = row();
        let value = serde_json::to_value(&row).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), row.headers().len());
        assert_eq!(object["market_slug"], "will-it-rain");
        assert_eq!(object["Yes_price"], serde_json::json!(0.5));
        assert_eq!(object["No_price"], "N/A");
    }

    #[test]
    fn cells_display_for_sheets() {
        assert_eq!(PriceCell::Unavailable.to_string(), "N/A");
        assert_eq!(CellValue::Flag(false).to_string(), "FALSE");
        assert_eq!(CellValue::Number(dec!(0.5)).to_string(), "0.5");
    }

    #[test]
    fn without_timestamp_only_clears_timestamp() {
        let a = row();
        let mut b = row();
        b.timestamp = datetime!(2030-01-01 00:00:00 UTC);
        assert_ne!(a, b);
        assert_eq!(a.without_timestamp(), b.without_timestamp());
    }
}
