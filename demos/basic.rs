use std::time::Duration;

use outbound_http::{ClientOptions, FormValues, HttpClient};
use reqwest::header::HeaderMap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("DEMO_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());

    let http = HttpClient::new(
        ClientOptions::new()
            .with_retry_times(2)
            .with_retry_backoff(Duration::from_millis(200))
            .with_timeout(Duration::from_secs(5))
            .with_default_header(),
    )?;

    let params = FormValues::from([("lang", "rust")]);
    let response = http
        .get(&format!("{base}/get"), Some(&params), HeaderMap::new())
        .await?;
    println!("GET {} -> {}", response.url(), response.status());

    let response = http
        .post_json(
            &format!("{base}/post"),
            &serde_json::json!({ "name": "demo" }),
            HeaderMap::new(),
        )
        .await?;
    println!("POST -> {}", response.status());
    println!("{}", response.text().await?);

    Ok(())
}
