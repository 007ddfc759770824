use serde::Deserialize;
use thiserror::Error;

const DEFAULT_URL: &str = "http://localhost:8080/healthcheck";

#[derive(Error, Debug)]
enum HealthcheckError {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Status code != 200 or dashboard not healthy")]
    NotOk,
}

#[derive(Debug, Deserialize)]
struct StatusJSON {
    status: String,
}

fn main() -> Result<(), HealthcheckError> {
    let url =
        std::env::var("DASHBOARD_HEALTHCHECK_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());

    let res = reqwest::blocking::get(url)?;
    if res.status() != 200 {
        return Err(HealthcheckError::NotOk);
    }
    let body: StatusJSON = res.json::<StatusJSON>()?;
    if body.status != "ok" {
        return Err(HealthcheckError::NotOk);
    }
    Ok(())
}
