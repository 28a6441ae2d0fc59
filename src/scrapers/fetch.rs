use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// One interaction performed on a page before its content is captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionStep {
    /// Click an element. When `optional`, a missing element is not an error.
    Click {
        selector: String,
        timeout: Duration,
        optional: bool,
    },
    /// Pick `value` in a `<select>`. When `optional`, a value the select
    /// does not offer is logged and the form is submitted without it.
    SelectOption {
        selector: String,
        value: String,
        optional: bool,
    },
    /// Press Enter inside an input and wait for the resulting navigation
    SubmitWithEnter { selector: String },
    /// Block until an element matching `selector` is present
    WaitForSelector { selector: String, timeout: Duration },
}

/// A document to retrieve, optionally after driving the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub steps: Vec<InteractionStep>,
    /// Also capture a PNG of the final page, where the fetcher renders pages
    pub capture_screenshot: bool,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            steps: Vec::new(),
            capture_screenshot: false,
        }
    }

    pub fn with_step(mut self, step: InteractionStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_screenshot(mut self) -> Self {
        self.capture_screenshot = true;
        self
    }
}

/// Final page state returned by [`DocumentFetcher::fetch_page`]
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub html: String,
    pub screenshot: Option<Vec<u8>>,
}

/// Capability to turn a [`FetchRequest`] into a document body
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;

    /// Fetch the document along with a screenshot, if one was requested and
    /// the fetcher can take it. Non-rendering fetchers return the HTML only.
    async fn fetch_page(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        Ok(FetchedPage {
            html: self.fetch(request).await?,
            screenshot: None,
        })
    }
}

/// Plain HTTP fetcher for static listing pages
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        if !request.steps.is_empty() {
            return Err(FetchError::Unsupported(
                "page interaction over plain HTTP".to_string(),
            ));
        }

        debug!("Fetching URL: {}", request.url);

        let response = self.client.get(&request.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                    what: "response".to_string(),
                }
            } else {
                FetchError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", request.url, response.status());
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().await?;
        debug!("Downloaded {} bytes of HTML", html.len());
        Ok(html)
    }
}
