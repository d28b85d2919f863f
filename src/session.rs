//! The browser capabilities the order flow relies on.
//!
//! [`crate::HeadlessBrowser`] and [`crate::Page`] implement these on top of
//! chromiumoxide; the order flow itself only sees the traits.

use async_trait::async_trait;

use crate::error::Result;

/// Starts one isolated browser session.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: FormSession;

    async fn launch(&self) -> Result<Self::Session>;
}

/// An exclusively owned browser session.
#[async_trait]
pub trait FormSession: Send + Sync {
    type Page: FormPage;

    /// Open a page and navigate it to `url`, returning once the DOM is ready.
    async fn open(&self, url: &str) -> Result<Self::Page>;

    /// Release the session. Called exactly once per launched session.
    async fn close(self) -> Result<()>;
}

/// Interactions with the loaded form page.
#[async_trait]
pub trait FormPage: Send + Sync {
    /// Replace the value of the input or textarea matching `selector`.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Check the checkbox or radio button matching `selector`. Checking an
    /// already checked element is a no-op.
    async fn check(&self, selector: &str) -> Result<()>;

    /// Click the element matching `button_xpath` while waiting for the page
    /// to arrive at `result_path`. Both must complete.
    async fn submit_and_wait(&self, button_xpath: &str, result_path: &str) -> Result<()>;

    /// Text content of the first element matching `selector`, or `None` if
    /// there is no such element.
    async fn text_content(&self, selector: &str) -> Result<Option<String>>;
}
