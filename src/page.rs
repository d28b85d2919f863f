use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page as CrPage;
use serde::Deserialize;
use tracing::debug;

use crate::element::Element;
use crate::error::{BrowserError, Result};
use crate::session::FormPage;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Snapshot of the document used while waiting for navigations.
#[derive(Debug, Deserialize)]
struct DocumentState {
    href: String,
    ready: String,
}

impl DocumentState {
    fn dom_loaded(&self) -> bool {
        matches!(self.ready.as_str(), "interactive" | "complete")
    }
}

/// Wrapper around a chromiumoxide Page exposing the form interactions.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self { inner, default_timeout }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Navigate to `url` and wait for its DOM content, not for every
    /// subresource.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        let response = self
            .inner
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        if let Some(error) = &response.result.error_text {
            return Err(BrowserError::Navigation(format!("{url}: {error}")));
        }
        self.wait_for_document(url_path(url)).await
    }

    /// Poll until the document at `path` has finished parsing.
    ///
    /// Evaluation errors while a navigation is in flight count as "not yet".
    pub async fn wait_for_document(&self, path: &str) -> Result<()> {
        poll_until(self.default_timeout, || async {
            match self.document_state().await {
                Ok(state) => url_path(&state.href) == path && state.dom_loaded(),
                Err(_) => false,
            }
        })
        .await
        .map_err(|_| BrowserError::Timeout(format!("url path {path}")))
    }

    async fn document_state(&self) -> Result<DocumentState> {
        let json: String = self
            .eval("JSON.stringify({ href: location.href, ready: document.readyState })")
            .await?;
        serde_json::from_str(&json).map_err(|e| BrowserError::Js(e.to_string()))
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Replace the value of an input or textarea and fire `input`/`change`.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let selector_js = to_js(selector)?;
        let value_js = to_js(value)?;
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector_js});
                if (!el) return JSON.stringify(null);
                el.focus();
                el.value = {value_js};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return JSON.stringify(el.value);
            }})()
            "#,
        );
        let json: String = self.eval(js).await?;
        let assigned: Option<String> =
            serde_json::from_str(&json).map_err(|e| BrowserError::Js(e.to_string()))?;
        match assigned {
            None => Err(BrowserError::ElementNotFound(selector.to_string())),
            Some(actual) if value_accepted(value, &actual) => Ok(()),
            Some(_) => Err(BrowserError::Js(format!(
                "{selector} rejected value {value_js}"
            ))),
        }
    }

    /// Check a checkbox or radio button, leaving it alone if already checked.
    pub async fn check(&self, selector: &str) -> Result<()> {
        let selector_js = to_js(selector)?;
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector_js});
                if (!el) return 'missing';
                if (!el.checked) el.click();
                return el.checked ? 'ok' : 'unchecked';
            }})()
            "#,
        );
        match self.eval::<String>(js).await?.as_str() {
            "ok" => Ok(()),
            "missing" => Err(BrowserError::ElementNotFound(selector.to_string())),
            _ => Err(BrowserError::Js(format!("{selector} did not become checked"))),
        }
    }

    /// Click the element at `xpath` and, at the same time, wait for the page
    /// to land on `path`.
    pub async fn click_and_wait_for_path(&self, xpath: &str, path: &str) -> Result<()> {
        let el = self.find_by_xpath(xpath).await?;
        tokio::try_join!(self.wait_for_document(path), el.click())?;
        Ok(())
    }

    // ── Observations ────────────────────────────────────────────────

    /// Text content of the first element matching `selector`.
    pub async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        let selector_js = to_js(selector)?;
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector_js});
                return JSON.stringify(el ? el.textContent : null);
            }})()
            "#,
        );
        let json: String = self.eval(js).await?;
        serde_json::from_str(&json).map_err(|e| BrowserError::Js(e.to_string()))
    }

    // ── Element Queries ─────────────────────────────────────────────

    /// Find an element matching the given XPath expression.
    pub async fn find_by_xpath(&self, xpath: &str) -> Result<Element> {
        let el = self
            .inner
            .find_xpath(xpath)
            .await
            .map_err(|e| BrowserError::ElementNotFound(format!("{xpath}: {e}")))?;
        Ok(Element::new(el))
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: impl Into<String>) -> Result<T> {
        self.inner
            .evaluate(js.into())
            .await
            .map_err(|e| BrowserError::Js(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::Js(e.to_string()))
    }
}

#[async_trait]
impl FormPage for Page {
    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        Page::fill(self, selector, value).await
    }

    async fn check(&self, selector: &str) -> Result<()> {
        Page::check(self, selector).await
    }

    async fn submit_and_wait(&self, button_xpath: &str, result_path: &str) -> Result<()> {
        self.click_and_wait_for_path(button_xpath, result_path).await
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        Page::text_content(self, selector).await
    }
}

/// Whether a control kept an assigned value. Browsers sanitise some values
/// (textareas fold CR/CRLF, single-line inputs drop line breaks, email inputs
/// trim), so only a non-blank value that was cleared counts as refused, as a
/// malformed time on a `type="time"` input is.
fn value_accepted(requested: &str, actual: &str) -> bool {
    !actual.is_empty() || requested.trim().is_empty()
}

/// Run `ready` every [`POLL_INTERVAL`] until it returns true. The deadline
/// also bounds each call to `ready`, so a hung evaluation cannot stretch it.
async fn poll_until<F, Fut>(
    timeout: Duration,
    mut ready: F,
) -> std::result::Result<(), tokio::time::error::Elapsed>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(timeout, async {
        while !ready().await {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
}

fn to_js(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| BrowserError::Js(e.to_string()))
}

/// Path component of `url`, without query or fragment. URLs without an
/// authority (`about:blank`) are returned whole.
pub(crate) fn url_path(url: &str) -> &str {
    let Some((_, rest)) = url.split_once("://") else {
        return url;
    };
    let path = match rest.find('/') {
        Some(i) => &rest[i..],
        None => return "/",
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
