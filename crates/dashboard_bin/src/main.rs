use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, Responder, get, http::header, middleware::Logger,
    web,
};
use asset_cache::{AssetCacheManager, CacheStorage, OriginFetcher};
use dotenvy::dotenv;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::{env, process::exit, sync::Arc};
use yahoo_api::api::YahooAPI;

mod utils;

const DEFAULT_SYMBOLS: [&str; 9] = [
    "GC=F", "SI=F", "GBPUSD=X", "NATP.L", "SMGB.L", "EQQQ.L", "GOOG", "PLTR", "NVDA",
];

const ASSET_MANIFEST: [&str; 8] = [
    "/",
    "/index.html",
    "/style.css",
    "/app.js",
    "/icon-192.png",
    "/icon-512.png",
    "https://cdn.jsdelivr.net/npm/chart.js",
    "https://fonts.googleapis.com/css2?family=Outfit:wght@300;400;600;700&display=swap",
];

const SHELL_ASSET: &str = "/index.html";

#[derive(Serialize)]
struct HealthcheckResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct QuotesQuery {
    symbols: Option<String>,
}

#[get("/api/quotes")]
async fn get_quotes(query: web::Query<QuotesQuery>, api: web::Data<YahooAPI>) -> impl Responder {
    let symbols = match utils::parse_symbols(query.symbols.as_deref()) {
        Some(symbols) => symbols,
        None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
    };
    let results = quote_core::aggregate::fetch_quotes(api.get_ref(), &symbols).await;
    HttpResponse::Ok().json(results)
}

#[get("/api/history/{symbol}")]
async fn get_history(symbol: web::Path<String>, api: web::Data<YahooAPI>) -> impl Responder {
    let sanitized_symbol = utils::sanitize_symbol(symbol.to_string());
    match quote_core::history::fetch_history(api.get_ref(), &sanitized_symbol).await {
        Ok(series) => HttpResponse::Ok().json(series),
        Err(e) => {
            error!("get_history | symbol: {} | {}", sanitized_symbol, e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: format!("Failed to fetch history: {}", e.client_message()),
            })
        }
    }
}

#[get("/healthcheck")]
async fn healthcheck() -> impl Responder {
    web::Json(HealthcheckResponse {
        status: "ok".to_string(),
    })
}

async fn serve_asset(
    req: HttpRequest,
    cache: web::Data<AssetCacheManager<OriginFetcher>>,
) -> impl Responder {
    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let mode = utils::request_mode(accept);

    match cache.intercept(req.path(), mode).await {
        Ok(asset) => HttpResponse::Ok()
            .content_type(asset.content_type)
            .body(asset.body),
        Err(e) => {
            error!("serve_asset | path: {} | {}", req.path(), e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "asset unavailable".to_string(),
            })
        }
    }
}

struct Config {
    workers: usize,
    asset_origin: String,
    cache_version: String,
}

impl Config {
    fn new() -> Result<Config, Box<dyn std::error::Error>> {
        dotenv().ok();

        let mut workers: usize = env::var("DASHBOARD_WORKERS")?.parse()?;
        let mut asset_origin = env::var("DASHBOARD_ASSET_ORIGIN")?;
        let mut cache_version = env::var("DASHBOARD_CACHE_VERSION")?;

        if workers == 0 {
            workers = 1;
        }

        if asset_origin.trim().is_empty() {
            asset_origin = "http://localhost:8000".to_string();
        }

        if cache_version.trim().is_empty() {
            cache_version = "quote-dash-v1".to_string();
        }

        let config = Config {
            workers,
            asset_origin,
            cache_version,
        };
        Ok(config)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not create config: {}", e);
            exit(1);
        }
    };

    let storage = Arc::new(CacheStorage::new());
    let fetcher = OriginFetcher::new(&config.asset_origin);
    let cache = AssetCacheManager::new(
        &config.cache_version,
        ASSET_MANIFEST.iter().map(|s| s.to_string()).collect(),
        SHELL_ASSET,
        storage,
        fetcher,
    );

    // install must fully resolve before this version may activate
    if let Err(e) = cache.install().await {
        error!("Asset cache install failed: {}", e);
        exit(1);
    }
    if let Err(e) = cache.activate().await {
        error!("Asset cache activate failed: {}", e);
        exit(1);
    }
    info!("Asset cache serving version {}", cache.version());

    let yahoo_api = web::Data::new(YahooAPI::new());
    let cache = web::Data::new(cache);

    HttpServer::new(move || {
        App::new()
            .app_data(yahoo_api.clone())
            .app_data(cache.clone())
            .service(healthcheck)
            .service(get_quotes)
            .service(get_history)
            .default_service(web::to(serve_asset))
            .wrap(Logger::default())
    })
    .bind(("0.0.0.0", 8080))?
    .workers(config.workers)
    .run()
    .await
}
