use chrono::Months;
use log::debug;
use quote_model::{HistoryPoint, SourceError};

use crate::source::QuoteSource;

/// Lookback window for history requests, in calendar months.
const LOOKBACK_MONTHS: u32 = 1;

/// Fetches the close-price series for one symbol over the last calendar
/// month, both endpoints inclusive. The window is computed here, per call,
/// so repeated calls slide it forward.
///
/// Points without a close are dropped and the series is sorted ascending by
/// date. An empty `Ok` series is a valid outcome (no trading days in range)
/// and is distinct from `Err`.
pub async fn fetch_history<S: QuoteSource>(
    source: &S,
    symbol: &str,
) -> Result<Vec<HistoryPoint>, SourceError> {
    let end = chrono::Local::now().date_naive();
    let start = end.checked_sub_months(Months::new(LOOKBACK_MONTHS)).unwrap_or(end);

    debug!("fetch_history | symbol: {} | window: {} .. {}", symbol, start, end);

    let raw = source.get_daily_closes(symbol, start, end).await?;

    let mut points: Vec<HistoryPoint> = raw
        .into_iter()
        .filter_map(|point| {
            point.close.map(|close| HistoryPoint {
                date: point.date,
                close,
            })
        })
        .collect();
    points.sort_by_key(|point| point.date);

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use quote_model::{Quote, RawClose};
    use std::sync::Mutex;

    struct MockSource {
        response: Result<Vec<RawClose>, SourceError>,
        windows: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    impl MockSource {
        fn with_points(points: Vec<RawClose>) -> Self {
            MockSource {
                response: Ok(points),
                windows: Mutex::new(vec![]),
            }
        }

        fn failing() -> Self {
            MockSource {
                response: Err(SourceError::Http("timed out".to_string())),
                windows: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for MockSource {
        async fn get_quote(&self, symbol: &str) -> Result<Quote, SourceError> {
            Err(SourceError::NotFound(symbol.to_string()))
        }

        async fn get_daily_closes(
            &self,
            _symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<RawClose>, SourceError> {
            self.windows.lock().unwrap().push((start, end));
            match &self.response {
                Ok(points) => Ok(points.clone()),
                Err(SourceError::Http(msg)) => Err(SourceError::Http(msg.clone())),
                Err(_) => unreachable!(),
            }
        }
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
    }

    #[tokio::test]
    async fn sorts_ascending_and_drops_null_closes() {
        let source = MockSource::with_points(vec![
            RawClose { date: day(3), close: Some(5.0) },
            RawClose { date: day(1), close: None },
            RawClose { date: day(2), close: Some(7.0) },
        ]);
        let series = fetch_history(&source, "GC=F").await.unwrap();

        assert_eq!(
            series,
            vec![
                HistoryPoint { date: day(2), close: 7.0 },
                HistoryPoint { date: day(3), close: 5.0 },
            ]
        );
    }

    #[tokio::test]
    async fn empty_series_is_ok_not_error() {
        let source = MockSource::with_points(vec![]);
        let series = fetch_history(&source, "GC=F").await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn adapter_failure_surfaces_as_error() {
        let source = MockSource::failing();
        let result = fetch_history(&source, "GC=F").await;
        assert!(matches!(result, Err(SourceError::Http(_))));
    }

    #[tokio::test]
    async fn window_spans_one_month_ending_today() {
        let source = MockSource::with_points(vec![]);
        fetch_history(&source, "GC=F").await.unwrap();

        let windows = source.windows.lock().unwrap();
        let (start, end) = windows[0];
        assert_eq!(end, chrono::Local::now().date_naive());
        assert_eq!(start, end.checked_sub_months(Months::new(1)).unwrap());
    }
}
