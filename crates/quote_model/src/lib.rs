use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: String,
    pub short_name: String,
}

/// One entry of a multi-symbol quote response. Exactly one variant per
/// requested symbol; the containing list always matches the request list in
/// length and order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuoteResult {
    Quote(Quote),
    Failure { symbol: String, error: String },
}

impl QuoteResult {
    pub fn symbol(&self) -> &str {
        match self {
            QuoteResult::Quote(quote) => &quote.symbol,
            QuoteResult::Failure { symbol, .. } => symbol,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, QuoteResult::Failure { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Raw daily point as returned by the provider, before reshaping. A `None`
/// close marks a day the provider listed without a usable closing price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClose {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Upstream failure classification. `Display` carries the full detail for
/// logging; `client_message` is the only text allowed across the request
/// boundary.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport-level failure reaching the provider.
    #[error("upstream request failed: {0}")]
    Http(String),

    /// Response arrived but could not be decoded into the expected shape.
    #[error("malformed upstream response: {0}")]
    Decode(String),

    /// The provider does not know the symbol.
    #[error("symbol not found: {0}")]
    NotFound(String),

    /// The provider knows the symbol but returned no usable data.
    #[error("no data for symbol: {0}")]
    NoData(String),
}

impl SourceError {
    /// Classified message with no upstream internals, URLs or payloads.
    pub fn client_message(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "upstream request failed",
            SourceError::Decode(_) => "malformed upstream response",
            SourceError::NotFound(_) => "symbol not found",
            SourceError::NoData(_) => "no data available",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_result_serializes_flat_success() {
        let result = QuoteResult::Quote(Quote {
            symbol: "GOOG".to_string(),
            price: 180.5,
            change: -1.25,
            change_percent: -0.69,
            currency: "USD".to_string(),
            short_name: "Alphabet Inc.".to_string(),
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["symbol"], "GOOG");
        assert_eq!(json["price"], 180.5);
        assert_eq!(json["changePercent"], -0.69);
        assert_eq!(json["shortName"], "Alphabet Inc.");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn quote_result_serializes_failure() {
        let result = QuoteResult::Failure {
            symbol: "NOPE".to_string(),
            error: "Failed: symbol not found".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["symbol"], "NOPE");
        assert_eq!(json["error"], "Failed: symbol not found");
        assert!(json.get("price").is_none());
    }

    #[test]
    fn client_message_has_no_internals() {
        let err = SourceError::Http("error sending request for url (http://127.0.0.1:1)".to_string());
        assert_eq!(err.client_message(), "upstream request failed");
        assert!(!err.client_message().contains("127.0.0.1"));
    }
}
