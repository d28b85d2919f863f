//! Order request and echoed response types.

use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::OrderError;

/// Pizza size, matching the `size` radio group values on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PizzaSize {
    Small,
    Medium,
    Large,
}

impl PizzaSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Topping, matching the `topping` checkbox group values on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topping {
    Bacon,
    Cheese,
    Onion,
    Mushroom,
}

impl Topping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bacon => "bacon",
            Self::Cheese => "cheese",
            Self::Onion => "onion",
            Self::Mushroom => "mushroom",
        }
    }
}

/// A pizza order as entered on the form.
///
/// Absent or `null` string fields deserialize as empty so that [`OrderRequest::validate`]
/// reports them by name instead of serde failing on the first one it meets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub custname: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub custtel: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub custemail: String,
    #[serde(deserialize_with = "empty_size_as_none")]
    pub size: Option<PizzaSize>,
    pub topping: Vec<Topping>,
    #[serde(deserialize_with = "null_as_empty")]
    pub delivery: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn empty_size_as_none<'de, D>(deserializer: D) -> Result<Option<PizzaSize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => PizzaSize::deserialize(s.into_deserializer()).map(Some),
    }
}

impl OrderRequest {
    pub fn new(
        custname: impl Into<String>,
        custtel: impl Into<String>,
        custemail: impl Into<String>,
        size: PizzaSize,
        delivery: impl Into<String>,
    ) -> Self {
        Self {
            custname: custname.into(),
            custtel: custtel.into(),
            custemail: custemail.into(),
            size: Some(size),
            topping: Vec::new(),
            delivery: delivery.into(),
            comments: None,
        }
    }

    pub fn with_topping(mut self, topping: Topping) -> Self {
        self.topping.push(topping);
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Check the required fields in form order and report the first one
    /// that is missing or empty. Toppings and comments are optional.
    pub fn validate(&self) -> Result<(), OrderError> {
        let checks = [
            ("custname", !self.custname.is_empty()),
            ("custtel", !self.custtel.is_empty()),
            ("custemail", !self.custemail.is_empty()),
            ("size", self.size.is_some()),
            ("delivery", !self.delivery.is_empty()),
        ];
        match checks.iter().find(|(_, present)| !present) {
            Some((field, _)) => Err(OrderError::MissingField(*field)),
            None => Ok(()),
        }
    }

    /// Comments worth typing into the form, if any.
    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref().filter(|c| !c.is_empty())
    }
}

/// The JSON document httpbin echoes back after the form is posted.
///
/// Only the parts read by this crate get accessors; everything else stays in
/// the underlying map untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderResponse(Map<String, Value>);

impl OrderResponse {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The echoed form fields.
    pub fn form(&self) -> Option<&Map<String, Value>> {
        self.0.get("form").and_then(Value::as_object)
    }

    /// First value of a form field. httpbin sends a single value as a string
    /// and repeated values as an array.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form_values(key).into_iter().next()
    }

    /// Every value of a form field.
    pub fn form_values(&self, key: &str) -> Vec<&str> {
        match self.form().and_then(|form| form.get(key)) {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    pub fn origin(&self) -> Option<&str> {
        self.0.get("origin").and_then(Value::as_str)
    }

    pub fn headers(&self) -> Option<&Map<String, Value>> {
        self.0.get("headers").and_then(Value::as_object)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Names of submitted fields whose value is not echoed under `form`.
    pub fn unechoed_fields(&self, request: &OrderRequest) -> Vec<&'static str> {
        let mut missing = Vec::new();

        let text_fields = [
            ("custname", request.custname.as_str()),
            ("custtel", request.custtel.as_str()),
            ("custemail", request.custemail.as_str()),
            ("delivery", request.delivery.as_str()),
        ];
        for (key, expected) in text_fields {
            if !expected.is_empty() && self.form_value(key) != Some(expected) {
                missing.push(key);
            }
        }

        if let Some(size) = request.size {
            if self.form_value("size") != Some(size.as_str()) {
                missing.push("size");
            }
        }

        let toppings = self.form_values("topping");
        if request
            .topping
            .iter()
            .any(|t| !toppings.contains(&t.as_str()))
        {
            missing.push("topping");
        }

        // Browsers submit textarea line breaks as CRLF.
        if let Some(comments) = request.comments() {
            let echoed = self.form_value("comments").map(fold_line_breaks);
            if echoed != Some(fold_line_breaks(comments)) {
                missing.push("comments");
            }
        }

        missing
    }
}

/// Fold CRLF and lone CR to LF, as a textarea does with its value.
pub(crate) fn fold_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
