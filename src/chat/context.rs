//! Farming context inferred from chat messages.
//!
//! A `ChatContext` accumulates what the farmer has told the assistant so far
//! (where they are, which cultivar they grow, how many kilograms they have).
//! Extraction never mutates the prior context; callers store the returned
//! value back into the session.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::ChatData;

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)location(?:\s+is)?\s+([a-zA-Z\s]+)").expect("location regex")
});

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)type(?:\s+is)?\s+([a-zA-Z\s]+)").expect("type regex"));

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)(?:\s*kg|\s*kilos|\s*kilograms)").expect("quantity regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub location: Option<String>,
    pub banana_type: Option<String>,
    /// Kilograms.
    pub quantity: Option<u32>,
}

/// Names a single context field, e.g. when the user dismisses a context chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextField {
    Location,
    BananaType,
    Quantity,
}

impl ChatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.banana_type.is_none() && self.quantity.is_none()
    }

    pub fn clear(&mut self, field: ContextField) {
        match field {
            ContextField::Location => self.location = None,
            ContextField::BananaType => self.banana_type = None,
            ContextField::Quantity => self.quantity = None,
        }
    }

    /// Applies the fields the chatbot echoed back in its response data.
    ///
    /// Missing or blank echoes keep the current value.
    pub fn merge_response(&self, data: &ChatData) -> ChatContext {
        ChatContext {
            location: non_blank(data.location.as_deref()).or_else(|| self.location.clone()),
            banana_type: non_blank(data.banana_type.as_deref())
                .or_else(|| self.banana_type.clone()),
            quantity: data.quantity_kg().or(self.quantity),
        }
    }
}

/// Derives context from `text`, falling back to `prior` for every field the
/// message does not mention.
pub fn extract_context(text: &str, prior: &ChatContext) -> ChatContext {
    ChatContext {
        location: capture_words(&LOCATION_RE, text).or_else(|| prior.location.clone()),
        banana_type: capture_words(&TYPE_RE, text).or_else(|| prior.banana_type.clone()),
        quantity: capture_quantity(text).or(prior.quantity),
    }
}

fn capture_words(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    non_blank(caps.get(1).map(|m| m.as_str()))
}

fn capture_quantity(text: &str) -> Option<u32> {
    QUANTITY_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
