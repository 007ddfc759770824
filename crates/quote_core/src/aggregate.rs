use futures::future::join_all;
use log::warn;
use quote_model::QuoteResult;

use crate::source::QuoteSource;

/// Fetches quotes for every symbol concurrently and returns one result per
/// input, in input order. A failed call becomes a `Failure` entry for that
/// symbol only; it cannot cancel or delay the other calls. No retries.
pub async fn fetch_quotes<S: QuoteSource>(source: &S, symbols: &[String]) -> Vec<QuoteResult> {
    let calls = symbols.iter().map(|symbol| async move {
        match source.get_quote(symbol).await {
            Ok(mut quote) => {
                // result[i] must name input[i] even if the provider
                // normalizes the symbol
                quote.symbol = symbol.clone();
                QuoteResult::Quote(quote)
            }
            Err(err) => {
                warn!("fetch_quotes | symbol: {} | {}", symbol, err);
                QuoteResult::Failure {
                    symbol: symbol.clone(),
                    error: format!("Failed: {}", err.client_message()),
                }
            }
        }
    });
    join_all(calls).await
}
