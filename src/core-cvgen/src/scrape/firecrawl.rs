use std::time::Duration;

use async_trait::async_trait;
use data_model_cvgen::models::JobPosting;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::ScrapeError;
use crate::scrape::Scraper;

pub const DEFAULT_API_URL: &str = "https://api.firecrawl.dev";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct FirecrawlConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl FirecrawlConfig {
    /// Reads `FIRECRAWL_API_KEY` (required), `FIRECRAWL_API_URL` and `SCRAPER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ScrapeError> {
        let api_key = std::env::var("FIRECRAWL_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ScrapeError::Config("FIRECRAWL_API_KEY must be set".to_string()))?;
        let api_url = std::env::var("FIRECRAWL_API_URL").ok();
        let timeout_secs = std::env::var("SCRAPER_TIMEOUT_SECS").ok();
        Self::from_parts(api_key, api_url.as_deref(), timeout_secs.as_deref())
    }

    fn from_parts(api_key: String, api_url: Option<&str>, timeout_secs: Option<&str>) -> Result<Self, ScrapeError> {
        let api_url = api_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = match timeout_secs.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t
                .parse::<u64>()
                .map_err(|e| ScrapeError::Config(format!("SCRAPER_TIMEOUT_SECS is not a number ({}): {}", t, e)))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            api_key,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Scrapes postings with Firecrawl's LLM extraction.
pub struct FirecrawlScraper {
    client: Client,
    config: FirecrawlConfig,
}

impl FirecrawlScraper {
    pub fn new(config: FirecrawlConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ScrapeError> {
        Self::new(FirecrawlConfig::from_env()?)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/scrape", self.config.api_url)
    }
}

#[async_trait]
impl Scraper for FirecrawlScraper {
    async fn extract(&self, url: &Url) -> Result<JobPosting, ScrapeError> {
        tracing::debug!("Scraping {} via {}", url, self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&scrape_request_body(url))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_scrape_response(status, &body)
    }
}

/// The fields Firecrawl is asked to extract, as JSON schema.
pub fn job_extract_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "job_title": { "type": "string", "description": "The title of the job position" },
            "company_name": { "type": "string", "description": "The name of the company offering the job" },
            "location": { "type": "string", "description": "The location of the job" },
            "job_description": { "type": "string", "description": "A brief description of the job" },
            "requirements": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of job requirements"
            },
            "salary_range": { "type": "string", "description": "The salary range for the position, if available" }
        },
        "required": ["job_title", "company_name", "location", "job_description", "requirements"]
    })
}

fn scrape_request_body(url: &Url) -> Value {
    json!({
        "url": url.as_str(),
        "formats": ["extract"],
        "extract": { "schema": job_extract_schema() }
    })
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    #[serde(default)]
    extract: Option<Value>,
}

/// Interprets a raw Firecrawl scrape response.
pub fn parse_scrape_response(status: u16, body: &str) -> Result<JobPosting, ScrapeError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ScrapeResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(ScrapeError::Api { status, message });
    }

    let response: ScrapeResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(ScrapeError::Unsuccessful(
            response.error.unwrap_or_else(|| "no error message".to_string()),
        ));
    }

    let extract = match response.data.and_then(|d| d.extract) {
        Some(Value::Object(mut fields)) => {
            // The extractor reports absent fields as null; treat them as missing.
            fields.retain(|_, v| !v.is_null());
            Value::Object(fields)
        }
        Some(Value::Null) | None => return Err(ScrapeError::MissingExtract),
        Some(other) => other,
    };

    let posting: JobPosting = serde_json::from_value(extract)?;
    let missing = posting.missing_fields();
    if !missing.is_empty() {
        return Err(ScrapeError::Incomplete(missing));
    }
    Ok(posting)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_successful_extract() {
        let body = json!({
            "success": true,
            "data": {
                "extract": {
                    "job_title": "Engineer",
                    "company_name": "Example Corp",
                    "location": "Paris, France",
                    "job_description": "Build backend services.",
                    "requirements": ["Python", "AWS"],
                    "salary_range": null
                },
                "metadata": { "statusCode": 200 }
            }
        });
        let posting = parse_scrape_response(200, &body.to_string()).unwrap();
        assert_eq!(posting.job_title, "Engineer");
        assert_eq!(posting.requirements, vec!["Python", "AWS"]);
        assert_eq!(posting.salary_range, None);
    }

    #[test]
    fn test_parse_http_error_uses_api_message() {
        let body = json!({ "success": false, "error": "Insufficient credits" });
        match parse_scrape_response(402, &body.to_string()) {
            Err(ScrapeError::Api { status, message }) => {
                assert_eq!(status, 402);
                assert_eq!(message, "Insufficient credits");
            }
            other => panic!("unexpected: {:?}", other),
        }

        match parse_scrape_response(502, "Bad Gateway") {
            Err(ScrapeError::Api { message, .. }) => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unsuccessful_or_empty() {
        let body = json!({ "success": false, "error": "blocked by robots.txt" });
        assert!(matches!(
            parse_scrape_response(200, &body.to_string()),
            Err(ScrapeError::Unsuccessful(msg)) if msg == "blocked by robots.txt"
        ));

        let body = json!({ "success": true, "data": { "markdown": "# Engineer" } });
        assert!(matches!(
            parse_scrape_response(200, &body.to_string()),
            Err(ScrapeError::MissingExtract)
        ));

        assert!(matches!(
            parse_scrape_response(200, "<html>"),
            Err(ScrapeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_incomplete_posting() {
        let body = json!({
            "success": true,
            "data": { "extract": { "job_title": "Engineer", "job_description": "" } }
        });
        assert!(matches!(
            parse_scrape_response(200, &body.to_string()),
            Err(ScrapeError::Incomplete(fields)) if fields == vec!["job_description"]
        ));

        let body = json!({
            "success": true,
            "data": { "extract": { "job_title": "Engineer", "requirements": "Python" } }
        });
        assert!(matches!(
            parse_scrape_response(200, &body.to_string()),
            Err(ScrapeError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let url = Url::parse("https://example.com/job/123").unwrap();
        let body = scrape_request_body(&url);
        assert_eq!(body["url"], "https://example.com/job/123");
        assert_eq!(body["formats"], json!(["extract"]));
        assert_eq!(body["extract"]["schema"]["properties"]["job_title"]["type"], "string");
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config = FirecrawlConfig::from_parts("key".to_string(), None, None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let config = FirecrawlConfig::from_parts("key".to_string(), Some("http://localhost:3002/"), Some("5")).unwrap();
        assert_eq!(config.api_url, "http://localhost:3002");
        assert_eq!(config.timeout, Duration::from_secs(5));

        assert!(matches!(
            FirecrawlConfig::from_parts("key".to_string(), None, Some("soon")),
            Err(ScrapeError::Config(_))
        ));
    }

    #[cfg(has_firecrawl_key)]
    #[tokio::test]
    async fn test_extract_live() {
        let scraper = FirecrawlScraper::from_env().unwrap();
        let url = Url::parse("https://www.rust-lang.org/").unwrap();
        // Not a posting: anything but a transport or configuration failure is acceptable.
        match scraper.extract(&url).await {
            Ok(posting) => println!("Scraped: {:?}", posting),
            Err(ScrapeError::Http(e)) => panic!("transport error: {}", e),
            Err(ScrapeError::Config(e)) => panic!("config error: {}", e),
            Err(e) => println!("Scrape rejected: {}", e),
        }
    }
}
