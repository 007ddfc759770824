use async_trait::async_trait;
use chrono::NaiveDate;
use quote_model::{Quote, RawClose, SourceError};

/// Market-data provider seam. One call per symbol; each call may fail
/// independently. Retry policy, if any, lives behind this trait.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Current price and day change for a single symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, SourceError>;

    /// Daily closes for `symbol` between `start` and `end`, both inclusive.
    /// Order is not guaranteed and closes may be missing per day.
    async fn get_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawClose>, SourceError>;
}
