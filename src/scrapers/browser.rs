use crate::error::FetchError;
use crate::scrapers::fetch::{DocumentFetcher, FetchRequest, FetchedPage, InteractionStep};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::seq::IndexedRandom;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// Pause after each form interaction
const INTERACTION_PAUSE: Duration = Duration::from_secs(1);

/// Headless Chrome fetcher for pages that need form interaction.
///
/// Every request gets its own browser process, released when the request
/// finishes, whichever way it finishes.
pub struct ChromeFetcher {
    headless: bool,
    navigation_timeout: Duration,
}

impl ChromeFetcher {
    pub fn new(headless: bool, navigation_timeout: Duration) -> Self {
        Self {
            headless,
            navigation_timeout,
        }
    }
}

#[async_trait]
impl DocumentFetcher for ChromeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        self.fetch_page(request).await.map(|page| page.html)
    }

    async fn fetch_page(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let request = request.clone();
        let headless = self.headless;
        let navigation_timeout = self.navigation_timeout;

        tokio::task::spawn_blocking(move || {
            let session = BrowserSession::launch(headless, navigation_timeout)?;
            session.run(&request)
        })
        .await
        .map_err(|e| FetchError::Task(e.to_string()))?
    }
}

/// A browser process scoped to one fetch. Dropping `browser` kills Chrome.
struct BrowserSession {
    browser: Browser,
    navigation_timeout: Duration,
}

impl BrowserSession {
    fn launch(headless: bool, navigation_timeout: Duration) -> Result<Self, FetchError> {
        debug!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .idle_browser_timeout(navigation_timeout * 3)
            .build()
            .context("Failed to build launch options")
            .map_err(FetchError::Browser)?;

        let browser = Browser::new(options)
            .context("Failed to launch Chrome browser")
            .map_err(FetchError::Browser)?;

        Ok(Self {
            browser,
            navigation_timeout,
        })
    }

    fn run(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let tab = self.browser.new_tab().map_err(FetchError::Browser)?;
        tab.set_default_timeout(self.navigation_timeout);
        tab.set_user_agent(pick_user_agent(), None, None)
            .map_err(FetchError::Browser)?;

        tab.navigate_to(&request.url)
            .and_then(|tab| tab.wait_until_navigated())
            .with_context(|| format!("Navigation to {} failed", request.url))
            .map_err(FetchError::Browser)?;

        for step in &request.steps {
            perform(&tab, &request.url, step)?;
        }

        let html = tab.get_content().map_err(FetchError::Browser)?;
        let screenshot = if request.capture_screenshot {
            capture_screenshot(&tab)
        } else {
            None
        };

        Ok(FetchedPage { html, screenshot })
    }
}

/// A failed capture only costs the debug artifact, never the page
fn capture_screenshot(tab: &Tab) -> Option<Vec<u8>> {
    info!("Capturing screenshot...");
    match tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true) {
        Ok(png) => Some(png),
        Err(e) => {
            warn!("Could not capture screenshot: {:#}", e);
            None
        }
    }
}

fn perform(tab: &Tab, url: &str, step: &InteractionStep) -> Result<(), FetchError> {
    let timeout = |what: &str| FetchError::Timeout {
        url: url.to_string(),
        what: what.to_string(),
    };

    match step {
        InteractionStep::Click {
            selector,
            timeout: wait,
            optional,
        } => match tab.wait_for_element_with_custom_timeout(selector, *wait) {
            Ok(element) => {
                info!("Clicking {}", selector);
                element.click().map_err(FetchError::Browser)?;
            }
            Err(_) if *optional => debug!("{} not present, skipping click", selector),
            Err(_) => return Err(timeout(selector)),
        },
        InteractionStep::SelectOption {
            selector,
            value,
            optional,
        } => {
            match select_option(tab, selector, value) {
                Ok(()) => {}
                Err(e) if *optional => warn!("Leaving {} unset: {}", selector, e),
                Err(e) => return Err(e),
            }
            thread::sleep(INTERACTION_PAUSE);
        }
        InteractionStep::SubmitWithEnter { selector } => {
            let input = tab
                .wait_for_element(selector)
                .map_err(|_| timeout(selector))?;
            input.click().map_err(FetchError::Browser)?;
            tab.press_key("Enter").map_err(FetchError::Browser)?;
            thread::sleep(INTERACTION_PAUSE);
            tab.wait_until_navigated()
                .context("Navigation after form submission failed")
                .map_err(FetchError::Browser)?;
            info!("Navigation successful. URL is now: {}", tab.get_url());
        }
        InteractionStep::WaitForSelector {
            selector,
            timeout: wait,
        } => {
            tab.wait_for_element_with_custom_timeout(selector, *wait)
                .map_err(|_| timeout(selector))?;
        }
    }

    Ok(())
}

/// Set a `<select>` value through the DOM and fire `change` so the page's own handlers run
fn select_option(tab: &Tab, selector: &str, value: &str) -> Result<(), FetchError> {
    let quoted_selector = serde_json::to_string(selector)
        .map_err(|e| FetchError::Browser(e.into()))?;
    let quoted_value =
        serde_json::to_string(value).map_err(|e| FetchError::Browser(e.into()))?;

    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.value = {val};
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return el.value === {val};
        }})()"#,
        sel = quoted_selector,
        val = quoted_value
    );

    let result = tab.evaluate(&script, false).map_err(FetchError::Browser)?;
    match result.value {
        Some(serde_json::Value::Bool(true)) => {
            debug!("Selected {} in {}", value, selector);
            Ok(())
        }
        _ => Err(FetchError::Browser(anyhow!(
            "could not select {value:?} in {selector}"
        ))),
    }
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}
