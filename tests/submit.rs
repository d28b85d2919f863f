use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pizza_order::{
    submit_order_with, BrowserError, ExtractionError, FormPage, FormSession, Launcher,
    OrderClient, OrderError, OrderRequest, PizzaSize, Topping,
};
use serde_json::{json, Value};

/// What the fake result page shows.
#[derive(Clone)]
enum Content {
    /// httpbin-style echo of whatever was filled in.
    Echo,
    Fixed(Option<&'static str>),
}

#[derive(Clone)]
struct Script {
    fail_launch: bool,
    fail_open: bool,
    missing_selector: Option<String>,
    fail_submit: bool,
    fail_close: bool,
    content: Content,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_launch: false,
            fail_open: false,
            missing_selector: None,
            fail_submit: false,
            fail_close: false,
            content: Content::Echo,
        }
    }
}

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

struct FakeLauncher {
    script: Script,
    log: Log,
}

impl FakeLauncher {
    fn new(script: Script) -> Self {
        Self {
            script,
            log: Log::default(),
        }
    }
}

struct FakeSession {
    script: Script,
    log: Log,
}

struct FakePage {
    script: Script,
    log: Log,
    form: Mutex<BTreeMap<String, Vec<String>>>,
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> pizza_order::Result<FakeSession> {
        self.log.push("launch");
        if self.script.fail_launch {
            return Err(BrowserError::Launch("no chrome binary".into()));
        }
        Ok(FakeSession {
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }
}

#[async_trait]
impl FormSession for FakeSession {
    type Page = FakePage;

    async fn open(&self, url: &str) -> pizza_order::Result<FakePage> {
        self.log.push(format!("open {url}"));
        if self.script.fail_open {
            return Err(BrowserError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        Ok(FakePage {
            script: self.script.clone(),
            log: self.log.clone(),
            form: Mutex::new(BTreeMap::new()),
        })
    }

    async fn close(self) -> pizza_order::Result<()> {
        self.log.push("close");
        if self.script.fail_close {
            return Err(BrowserError::Js("target crashed".into()));
        }
        Ok(())
    }
}

/// Pull `attr="..."` out of a CSS attribute selector.
fn attr<'a>(selector: &'a str, name: &str) -> Option<&'a str> {
    let start = selector.find(&format!("[{name}=\""))? + name.len() + 3;
    let len = selector[start..].find('"')?;
    Some(&selector[start..start + len])
}

impl FakePage {
    fn element(&self, selector: &str) -> pizza_order::Result<String> {
        if self.script.missing_selector.as_deref() == Some(selector) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        attr(selector, "name")
            .map(str::to_string)
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }

    fn echo(&self) -> String {
        let form: serde_json::Map<String, Value> = self
            .form
            .lock()
            .unwrap()
            .iter()
            .map(|(name, values)| {
                let value = match values.as_slice() {
                    [single] => json!(single),
                    many => json!(many),
                };
                (name.clone(), value)
            })
            .collect();
        json!({
            "args": {},
            "data": "",
            "files": {},
            "form": form,
            "headers": { "Host": "httpbin.org" },
            "json": null,
            "origin": "198.51.100.1",
            "url": "https://httpbin.org/post"
        })
        .to_string()
    }
}

#[async_trait]
impl FormPage for FakePage {
    async fn fill(&self, selector: &str, value: &str) -> pizza_order::Result<()> {
        let name = self.element(selector)?;
        self.log.push(format!("fill {name}"));
        self.form
            .lock()
            .unwrap()
            .insert(name, vec![value.to_string()]);
        Ok(())
    }

    async fn check(&self, selector: &str) -> pizza_order::Result<()> {
        let name = self.element(selector)?;
        let value = attr(selector, "value").unwrap_or("on").to_string();
        self.log.push(format!("check {name}={value}"));
        let mut form = self.form.lock().unwrap();
        let values = form.entry(name).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
        Ok(())
    }

    async fn submit_and_wait(&self, _button_xpath: &str, result_path: &str) -> pizza_order::Result<()> {
        self.log.push(format!("submit {result_path}"));
        if self.script.fail_submit {
            return Err(BrowserError::Timeout(format!("url path {result_path}")));
        }
        Ok(())
    }

    async fn text_content(&self, selector: &str) -> pizza_order::Result<Option<String>> {
        self.log.push(format!("read {selector}"));
        Ok(match &self.script.content {
            Content::Echo => Some(self.echo()),
            Content::Fixed(text) => text.map(str::to_string),
        })
    }
}

fn valid_request() -> OrderRequest {
    OrderRequest::new(
        "Test User",
        "123-456-7890",
        "test@example.com",
        PizzaSize::Medium,
        "12:00",
    )
    .with_topping(Topping::Cheese)
    .with_topping(Topping::Bacon)
    .with_comments("Leave at the door")
}

#[tokio::test]
async fn submits_form_in_page_order() {
    let launcher = FakeLauncher::new(Script::default());
    let request = valid_request();

    let response = submit_order_with(&launcher, &request)
        .await
        .expect("submission should succeed");

    assert_eq!(
        launcher.log.entries(),
        [
            "launch",
            "open https://httpbin.org/forms/post",
            "fill custname",
            "fill custtel",
            "fill custemail",
            "check size=medium",
            "check topping=cheese",
            "check topping=bacon",
            "fill delivery",
            "fill comments",
            "submit /post",
            "read pre",
            "close",
        ]
    );

    assert_eq!(response.form_value("custname"), Some("Test User"));
    assert_eq!(response.form_value("size"), Some("medium"));
    assert!(response.form_values("topping").contains(&"cheese"));
    assert!(response.headers().is_some());
    assert!(response.url().unwrap().contains("httpbin.org"));
    assert!(response.unechoed_fields(&request).is_empty());
}

#[tokio::test]
async fn optional_fields_are_skipped_when_absent() {
    let launcher = FakeLauncher::new(Script::default());
    let request = OrderRequest::new("A", "1", "a@b.c", PizzaSize::Large, "20:00").with_comments("");

    let response = submit_order_with(&launcher, &request).await.unwrap();

    let entries = launcher.log.entries();
    assert!(!entries.iter().any(|e| e.starts_with("check topping")));
    assert!(!entries.iter().any(|e| e == "fill comments"));
    assert!(response.form_value("comments").is_none());
}

#[tokio::test]
async fn repeated_toppings_do_not_error() {
    let launcher = FakeLauncher::new(Script::default());
    let request = valid_request().with_topping(Topping::Cheese);

    let response = submit_order_with(&launcher, &request).await.unwrap();

    assert_eq!(launcher.log.count("check topping=cheese"), 2);
    assert_eq!(response.form_values("topping"), ["cheese", "bacon"]);
}

#[tokio::test]
async fn missing_fields_fail_before_launch() {
    let strip: [(&str, fn(&mut OrderRequest)); 5] = [
        ("custname", |r| r.custname.clear()),
        ("custtel", |r| r.custtel.clear()),
        ("custemail", |r| r.custemail.clear()),
        ("size", |r| r.size = None),
        ("delivery", |r| r.delivery.clear()),
    ];

    for (field, strip) in strip {
        let launcher = FakeLauncher::new(Script::default());
        let mut request = valid_request();
        strip(&mut request);

        match submit_order_with(&launcher, &request).await {
            Err(OrderError::MissingField(missing)) => assert_eq!(missing, field),
            other => panic!("{field}: unexpected {other:?}"),
        }
        assert!(launcher.log.entries().is_empty(), "{field}: browser was touched");
    }
}

#[tokio::test]
async fn missing_field_from_json_request() {
    let launcher = FakeLauncher::new(Script::default());
    let request: OrderRequest = serde_json::from_value(json!({
        "custname": "",
        "custtel": "123-456-7890",
        "custemail": "test@example.com",
        "size": "large",
        "delivery": "20:00"
    }))
    .unwrap();

    let err = submit_order_with(&launcher, &request).await.unwrap_err();

    assert_eq!(err.to_string(), "Missing required field: custname");
    assert!(launcher.log.entries().is_empty());
}

#[tokio::test]
async fn launch_failure_is_a_submission_error() {
    let launcher = FakeLauncher::new(Script {
        fail_launch: true,
        ..Script::default()
    });

    let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

    assert!(err.is_submission());
    assert_eq!(
        err.to_string(),
        "Failed to submit order: Browser launch failed: no chrome binary"
    );
    assert_eq!(launcher.log.entries(), ["launch"]);
}

#[tokio::test]
async fn navigation_failure_closes_session() {
    let launcher = FakeLauncher::new(Script {
        fail_open: true,
        ..Script::default()
    });

    let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

    assert!(err.is_submission());
    assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    assert_eq!(launcher.log.count("close"), 1);
}

#[tokio::test]
async fn missing_element_stops_the_sequence() {
    let launcher = FakeLauncher::new(Script {
        missing_selector: Some(
            r#"input[type="checkbox"][name="topping"][value="bacon"]"#.to_string(),
        ),
        ..Script::default()
    });

    let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

    assert!(err.is_submission());
    assert!(err.to_string().starts_with("Failed to submit order: Element not found"));
    let entries = launcher.log.entries();
    assert!(!entries.iter().any(|e| e.starts_with("submit")));
    assert_eq!(entries.last().map(String::as_str), Some("close"));
    assert_eq!(launcher.log.count("close"), 1);
}

#[tokio::test]
async fn result_page_timeout_is_a_submission_error() {
    let launcher = FakeLauncher::new(Script {
        fail_submit: true,
        ..Script::default()
    });

    let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

    assert!(matches!(err, OrderError::Submission(BrowserError::Timeout(_))));
    assert!(!launcher.log.entries().iter().any(|e| e.starts_with("read")));
    assert_eq!(launcher.log.count("close"), 1);
}

#[tokio::test]
async fn missing_response_content() {
    for content in [None, Some("")] {
        let launcher = FakeLauncher::new(Script {
            content: Content::Fixed(content),
            ..Script::default()
        });

        let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

        assert!(matches!(err, OrderError::Extraction(ExtractionError::NoContent)));
        assert_eq!(
            err.to_string(),
            "Failed to submit order: no response content found"
        );
        assert_eq!(launcher.log.count("close"), 1);
    }
}

#[tokio::test]
async fn unparseable_response_content() {
    let launcher = FakeLauncher::new(Script {
        content: Content::Fixed(Some("{\"form\": ")),
        ..Script::default()
    });

    let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

    assert!(matches!(err, OrderError::Extraction(ExtractionError::InvalidJson(_))));
    assert!(err.to_string().contains("failed to parse response JSON: EOF"), "{err}");
    assert_eq!(launcher.log.count("close"), 1);
}

#[tokio::test]
async fn non_object_response_content() {
    for content in ["[]", "\"ok\"", "null", "7"] {
        let launcher = FakeLauncher::new(Script {
            content: Content::Fixed(Some(content)),
            ..Script::default()
        });

        let err = submit_order_with(&launcher, &valid_request()).await.unwrap_err();

        assert!(
            matches!(err, OrderError::Extraction(ExtractionError::UnexpectedStructure(_))),
            "{content}: {err:?}"
        );
        assert_eq!(launcher.log.count("close"), 1);
    }
}

#[tokio::test]
async fn close_failure_does_not_mask_result() {
    let launcher = FakeLauncher::new(Script {
        fail_close: true,
        ..Script::default()
    });

    let response = submit_order_with(&launcher, &valid_request()).await.unwrap();

    assert_eq!(response.form_value("custemail"), Some("test@example.com"));
    assert_eq!(launcher.log.count("close"), 1);
}

#[tokio::test]
async fn client_uses_its_launcher() {
    let client = OrderClient::with_launcher(FakeLauncher::new(Script::default()));

    let response = client.submit(&valid_request()).await.unwrap();

    assert_eq!(response.form_value("delivery"), Some("12:00"));
}
