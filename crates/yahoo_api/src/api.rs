use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use log::debug;
use quote_core::QuoteSource;
use quote_model::{Quote, RawClose, SourceError};
use serde::Deserialize;

const YAHOO_BASE_API_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuoteJSON {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Vec<QuoteRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRow {
    symbol: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    currency: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartJSON {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Clone)]
pub struct YahooAPI {
    base_url: &'static str,
    client: reqwest::Client,
}

impl YahooAPI {
    pub fn new() -> Self {
        return YahooAPI {
            base_url: YAHOO_BASE_API_URL,
            client: reqwest::Client::new(),
        };
    }
}

impl Default for YahooAPI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for YahooAPI {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, SourceError> {
        let url = format!("{}/v7/finance/quote?symbols={}", self.base_url, symbol);

        debug!("get_quote | url: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        let json = response
            .json::<YahooQuoteJSON>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        parse_quote(json, symbol)
    }

    async fn get_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawClose>, SourceError> {
        // start-of-day .. start-of-next-day keeps both endpoints inclusive
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url, symbol, period1, period2
        );

        debug!("get_daily_closes | url: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        let json = response
            .json::<YahooChartJSON>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        parse_chart(json, symbol)
    }
}

fn parse_quote(json: YahooQuoteJSON, symbol: &str) -> Result<Quote, SourceError> {
    let row = json
        .quote_response
        .result
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::NotFound(symbol.to_string()))?;

    let price = row
        .regular_market_price
        .ok_or_else(|| SourceError::NoData(symbol.to_string()))?;

    Ok(Quote {
        symbol: row.symbol.unwrap_or_else(|| symbol.to_string()),
        price,
        change: row.regular_market_change.unwrap_or_default(),
        change_percent: row.regular_market_change_percent.unwrap_or_default(),
        currency: row.currency.unwrap_or_default(),
        short_name: row.short_name.unwrap_or_else(|| symbol.to_string()),
    })
}

fn parse_chart(json: YahooChartJSON, symbol: &str) -> Result<Vec<RawClose>, SourceError> {
    if let Some(error) = &json.chart.error {
        if !error.is_null() {
            return Err(SourceError::NotFound(symbol.to_string()));
        }
    }

    let result = json
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| SourceError::NoData(symbol.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|quote| quote.close)
        .unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let Some(datetime) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };
        points.push(RawClose {
            date: datetime.date_naive(),
            close,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chart_keeps_null_closes_as_none() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1709251200, 1709337600, 1709424000],
                    "indicators": {"quote": [{"close": [5.0, null, 7.0]}]}
                }],
                "error": null
            }
        }"#;
        let json: YahooChartJSON = serde_json::from_str(raw).unwrap();
        let points = parse_chart(json, "GC=F").unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].close, Some(5.0));
        assert_eq!(points[1].close, None);
        assert_eq!(points[2].close, Some(7.0));
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn parse_chart_upstream_error_is_not_found() {
        let raw = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        }"#;
        let json: YahooChartJSON = serde_json::from_str(raw).unwrap();
        let result = parse_chart(json, "NOPE");

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn parse_quote_maps_market_fields() {
        let raw = r#"{
            "quoteResponse": {
                "result": [{
                    "symbol": "GOOG",
                    "regularMarketPrice": 180.5,
                    "regularMarketChange": -1.25,
                    "regularMarketChangePercent": -0.69,
                    "currency": "USD",
                    "shortName": "Alphabet Inc."
                }],
                "error": null
            }
        }"#;
        let json: YahooQuoteJSON = serde_json::from_str(raw).unwrap();
        let quote = parse_quote(json, "GOOG").unwrap();

        assert_eq!(quote.price, 180.5);
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.short_name, "Alphabet Inc.");
    }

    #[test]
    fn parse_quote_missing_price_is_no_data() {
        let raw = r#"{
            "quoteResponse": {
                "result": [{"symbol": "GOOG"}],
                "error": null
            }
        }"#;
        let json: YahooQuoteJSON = serde_json::from_str(raw).unwrap();
        let result = parse_quote(json, "GOOG");

        assert!(matches!(result, Err(SourceError::NoData(_))));
    }

    #[test]
    fn parse_quote_empty_result_is_not_found() {
        let raw = r#"{"quoteResponse": {"result": [], "error": null}}"#;
        let json: YahooQuoteJSON = serde_json::from_str(raw).unwrap();
        let result = parse_quote(json, "NOPE");

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }
}
