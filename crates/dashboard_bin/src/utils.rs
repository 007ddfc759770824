use asset_cache::RequestMode;

pub fn sanitize_symbol(symbol: String) -> String {
    return symbol
        .chars()
        .take(20)
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '=' | '^'))
        .collect::<String>()
        .to_uppercase();
}

/// `None` means the parameter was absent (caller falls back to the default
/// set); `Some(vec![])` means it was present but held no usable symbols.
pub fn parse_symbols(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    Some(
        raw.split(',')
            .map(|part| sanitize_symbol(part.to_string()))
            .filter(|symbol| !symbol.is_empty())
            .collect(),
    )
}

pub fn request_mode(accept: Option<&str>) -> RequestMode {
    match accept {
        Some(value) if value.contains("text/html") => RequestMode::Navigate,
        _ => RequestMode::Asset,
    }
}
