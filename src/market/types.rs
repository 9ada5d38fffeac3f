//! Market, event and price-listing payloads from the Gamma and CLOB APIs.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Outcome name used when a token does not declare one.
pub const UNKNOWN_OUTCOME: &str = "Unknown";

/// Market record from the Gamma API.
///
/// Every field is optional upstream; defaults are applied when a row is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Market slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Condition ID shared with the CLOB API.
    #[serde(default, rename = "conditionId", alias = "condition_id")]
    pub condition_id: Option<String>,
    /// Market question (title).
    #[serde(default)]
    pub question: Option<String>,
    /// Category label.
    #[serde(default)]
    pub category: Option<String>,
    /// End date, ISO formatted.
    #[serde(default, rename = "endDateIso", alias = "end_date_iso")]
    pub end_date: Option<String>,
    /// End timestamp; Gamma sends it alongside `endDateIso`.
    #[serde(default, rename = "endDate")]
    pub end_date_time: Option<String>,
    /// Whether the market is active.
    #[serde(default)]
    pub active: Option<bool>,
    /// Whether the market is closed.
    #[serde(default)]
    pub closed: Option<bool>,
    /// Embedded outcome tokens.
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
    /// Outcome names; Gamma sends these as a JSON-encoded string.
    #[serde(default, deserialize_with = "string_or_list")]
    pub outcomes: Option<Vec<String>>,
}

impl Market {
    /// `endDateIso`, else `endDate`.
    pub fn end_date(&self) -> Option<&str> {
        self.end_date
            .as_deref()
            .or(self.end_date_time.as_deref())
    }

    /// Distinct outcome names in payload order.
    ///
    /// Embedded tokens take precedence over the `outcomes` list.
    pub fn outcome_names(&self) -> Vec<String> {
        let names: Vec<&str> = match &self.tokens {
            Some(tokens) if !tokens.is_empty() => {
                tokens.iter().map(Token::outcome_name).collect()
            }
            _ => self
                .outcomes
                .iter()
                .flatten()
                .map(String::as_str)
                .collect(),
        };

        let mut distinct: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !distinct.iter().any(|n| n == name) {
                distinct.push(name.to_string());
            }
        }
        distinct
    }
}

/// Outcome token embedded in a market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// CLOB token ID.
    #[serde(default)]
    pub token_id: Option<String>,
    /// Outcome label, e.g. "Yes".
    #[serde(default)]
    pub outcome: Option<String>,
    /// Price reported by the API. Not used for rows.
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl Token {
    /// Outcome label, or "Unknown".
    pub fn outcome_name(&self) -> &str {
        self.outcome.as_deref().unwrap_or(UNKNOWN_OUTCOME)
    }
}

/// Event record from the Gamma API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Event slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Event title.
    #[serde(default)]
    pub title: Option<String>,
}

/// Market entry in the CLOB `/markets` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClobMarket {
    /// Condition ID.
    #[serde(default)]
    pub condition_id: Option<String>,
    /// Market slug.
    #[serde(default)]
    pub market_slug: Option<String>,
    /// Outcome tokens.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// Body of the CLOB `/markets` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClobMarketsPage {
    /// Markets on this page.
    #[serde(default)]
    pub data: Vec<ClobMarket>,
    /// Cursor for the next page. Not followed.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Per-outcome prices in outcome order, one entry per outcome name.
pub type OutcomePrices = Vec<(String, Decimal)>;

/// Accept `["Yes","No"]`, `"[\"Yes\",\"No\"]"` or null.
fn string_or_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Encoded(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::List(list)) => Ok(Some(list)),
        Some(Raw::Encoded(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Encoded(s)) => serde_json::from_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gamma_market_parses_camel_case_fields() {
        let market: Market = serde_json::from_value(serde_json::json!({
            "slug": "will-it-rain",
            "question": "Will it rain?",
            "conditionId": "0xabc",
            "category": "Weather",
            "endDateIso": "2026-12-31",
            "active": true,
            "closed": false,
            "outcomes": "[\"Yes\", \"No\"]"
        }))
        .unwrap();

        assert_eq!(market.slug.as_deref(), Some("will-it-rain"));
        assert_eq!(market.condition_id.as_deref(), Some("0xabc"));
        assert_eq!(market.end_date.as_deref(), Some("2026-12-31"));
        assert_eq!(market.active, Some(true));
        assert_eq!(market.outcome_names(), vec!["Yes", "No"]);
    }

    #[test]
    fn snake_case_aliases_are_accepted() {
        let market: Market = serde_json::from_value(serde_json::json!({
            "slug": "m",
            "condition_id": "0x1",
            "end_date_iso": "2026-01-01T00:00:00Z",
            "outcomes": ["Up", "Down"]
        }))
        .unwrap();

        assert_eq!(market.slug.as_deref(), Some("m"));
        assert_eq!(market.condition_id.as_deref(), Some("0x1"));
        assert_eq!(market.end_date.as_deref(), Some("2026-01-01T00:00:00Z"));
        assert_eq!(market.outcome_names(), vec!["Up", "Down"]);
    }

    #[test]
    fn both_end_date_fields_are_kept() {
        let market: Market = serde_json::from_value(serde_json::json!({
            "endDate": "2026-12-31T12:00:00Z",
            "endDateIso": "2026-12-31"
        }))
        .unwrap();
        assert_eq!(market.end_date(), Some("2026-12-31"));

        let market: Market =
            serde_json::from_value(serde_json::json!({ "endDate": "2026-12-31T12:00:00Z" }))
                .unwrap();
        assert_eq!(market.end_date(), Some("2026-12-31T12:00:00Z"));
    }

    #[test]
    fn outcome_names_are_distinct() {
        let market = Market {
            tokens: Some(vec![Token::default(), Token::default()]),
            ..Market::default()
        };
        assert_eq!(market.outcome_names(), vec!["Unknown"]);

        let market = Market {
            outcomes: Some(vec!["Yes".to_string(), "No".to_string(), "Yes".to_string()]),
            ..Market::default()
        };
        assert_eq!(market.outcome_names(), vec!["Yes", "No"]);
    }

    #[test]
    fn tokens_take_precedence_over_outcomes() {
        let market = Market {
            tokens: Some(vec![
                Token {
                    outcome: Some("Trump".to_string()),
                    ..Token::default()
                },
                Token::default(),
            ]),
            outcomes: Some(vec!["Yes".to_string(), "No".to_string()]),
            ..Market::default()
        };

        assert_eq!(market.outcome_names(), vec!["Trump", "Unknown"]);
    }

    #[test]
    fn empty_payload_has_no_outcomes() {
        let market: Market = serde_json::from_str("{}").unwrap();
        assert_eq!(market, Market::default());
        assert!(market.outcome_names().is_empty());
    }

    #[test]
    fn clob_page_parses_tokens() {
        let page: ClobMarketsPage = serde_json::from_value(serde_json::json!({
            "data": [{
                "condition_id": "0xabc",
                "tokens": [
                    {"token_id": "1", "outcome": "Yes", "price": "0.73"},
                    {"token_id": "2", "outcome": "No", "price": "0.27"}
                ]
            }],
            "next_cursor": "MTAw"
        }))
        .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].tokens[0].price, Some(dec!(0.73)));
        assert_eq!(page.data[0].tokens[1].outcome_name(), "No");
    }
}
