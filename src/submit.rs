//! Filling and posting the httpbin pizza order form.
//!
//! The flow is strictly sequential: validate the request, launch a browser,
//! open the form, fill it, submit it, read the echoed JSON, close the
//! browser. Once a browser has been launched it is closed exactly once,
//! whatever happens in between.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::{BrowserError, ExtractionError, OrderError};
use crate::order::{OrderRequest, OrderResponse, PizzaSize, Topping};
use crate::session::{FormPage, FormSession, Launcher};

pub const FORM_URL: &str = "https://httpbin.org/forms/post";
/// Path httpbin redirects the form post to.
pub const RESULT_PATH: &str = "/post";
/// The form's only button is identified by its label.
pub const SUBMIT_BUTTON_XPATH: &str = "//form//button[normalize-space(.)='Submit order']";
/// httpbin renders the echoed request inside a `<pre>`.
pub const RESPONSE_SELECTOR: &str = "pre";

const NAME_SELECTOR: &str = r#"input[name="custname"]"#;
const TEL_SELECTOR: &str = r#"input[name="custtel"]"#;
const EMAIL_SELECTOR: &str = r#"input[name="custemail"]"#;
const DELIVERY_SELECTOR: &str = r#"input[name="delivery"]"#;
const COMMENTS_SELECTOR: &str = r#"textarea[name="comments"]"#;

/// Submit an order using a browser configured from the environment.
pub async fn submit_order(request: &OrderRequest) -> Result<OrderResponse, OrderError> {
    OrderClient::new(BrowserConfig::from_env())
        .submit(request)
        .await
}

/// Submits orders through a fixed [`Launcher`].
pub struct OrderClient<L = BrowserConfig> {
    launcher: L,
}

impl OrderClient<BrowserConfig> {
    pub fn new(config: BrowserConfig) -> Self {
        Self { launcher: config }
    }
}

impl<L: Launcher> OrderClient<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    pub async fn submit(&self, request: &OrderRequest) -> Result<OrderResponse, OrderError> {
        submit_order_with(&self.launcher, request).await
    }
}

/// Validate `request`, then run the whole browser flow on a session from
/// `launcher`.
///
/// Validation failures return before anything is launched. Failing to close
/// the session is logged and never masks the submission's own result.
pub async fn submit_order_with<L: Launcher>(
    launcher: &L,
    request: &OrderRequest,
) -> Result<OrderResponse, OrderError> {
    request.validate()?;

    info!(
        size = ?request.size,
        toppings = request.topping.len(),
        comments = request.comments().is_some(),
        "submitting order"
    );
    let session = launcher.launch().await?;

    let outcome = fill_and_submit(&session, request).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close browser session");
    }

    match &outcome {
        Ok(response) => info!(url = response.url().unwrap_or_default(), "order submitted"),
        Err(e) => warn!(error = %e, "order submission failed"),
    }
    outcome
}

async fn fill_and_submit<S: FormSession>(
    session: &S,
    request: &OrderRequest,
) -> Result<OrderResponse, OrderError> {
    let page = session.open(FORM_URL).await?;
    fill_form(&page, request).await?;

    debug!("submitting form");
    page.submit_and_wait(SUBMIT_BUTTON_XPATH, RESULT_PATH).await?;

    let content = page.text_content(RESPONSE_SELECTOR).await?;
    Ok(extract_response(content.as_deref())?)
}

/// Fill every field of the form, in page order.
pub async fn fill_form<P: FormPage>(page: &P, request: &OrderRequest) -> Result<(), BrowserError> {
    debug!("filling contact fields");
    page.fill(NAME_SELECTOR, &request.custname).await?;
    page.fill(TEL_SELECTOR, &request.custtel).await?;
    page.fill(EMAIL_SELECTOR, &request.custemail).await?;

    if let Some(size) = request.size {
        debug!(size = size.as_str(), "choosing size");
        page.check(&size_selector(size)).await?;
    }

    for topping in &request.topping {
        debug!(topping = topping.as_str(), "adding topping");
        page.check(&topping_selector(*topping)).await?;
    }

    page.fill(DELIVERY_SELECTOR, &request.delivery).await?;

    if let Some(comments) = request.comments() {
        page.fill(COMMENTS_SELECTOR, comments).await?;
    }
    Ok(())
}

pub fn size_selector(size: PizzaSize) -> String {
    format!(r#"input[type="radio"][name="size"][value="{}"]"#, size.as_str())
}

pub fn topping_selector(topping: Topping) -> String {
    format!(
        r#"input[type="checkbox"][name="topping"][value="{}"]"#,
        topping.as_str()
    )
}

/// Parse the text of the result page's `<pre>` into an [`OrderResponse`].
///
/// Only the top level is checked: it must be a JSON object.
pub fn extract_response(content: Option<&str>) -> Result<OrderResponse, ExtractionError> {
    let content = content
        .filter(|c| !c.is_empty())
        .ok_or(ExtractionError::NoContent)?;

    match serde_json::from_str(content)? {
        Value::Object(map) => Ok(OrderResponse::new(map)),
        other => Err(ExtractionError::UnexpectedStructure(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
