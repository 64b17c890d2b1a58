//! Augments outgoing chat messages with the known farming context.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::chat::context::ChatContext;

static EXPLICIT_FIELDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)location|type|quantity").expect("explicit fields regex"));

/// Values sent to the price model for fields the farmer has not mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDefaults {
    pub location: String,
    pub banana_type: String,
    /// Kilograms.
    pub quantity: u32,
}

impl Default for PriceDefaults {
    fn default() -> Self {
        Self {
            location: "Colombo".into(),
            banana_type: "ambul".into(),
            quantity: 5,
        }
    }
}

/// Calendar features the price model expects alongside location and cultivar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    /// 1-12
    pub month: u32,
    /// `ceil(day_of_month / 7)`, 1-5
    pub week_of_month: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u32,
    pub day_of_month: u32,
}

impl CalendarFields {
    /// Calendar fields of `now` in its own time zone.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let day_of_month = now.day();
        Self {
            month: now.month(),
            week_of_month: day_of_month.div_ceil(7),
            day_of_week: now.weekday().num_days_from_sunday(),
            day_of_month,
        }
    }
}

/// True when the message asks about prices or costs.
pub fn is_price_query(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("price") || lower.contains("cost")
}

/// Builds the payload sent to the chatbot for `raw_message`, using the
/// reference [`PriceDefaults`].
pub fn format_message_with_context<Tz: TimeZone>(
    raw_message: &str,
    context: &ChatContext,
    now: &DateTime<Tz>,
) -> String {
    format_message_with_defaults(raw_message, context, now, &PriceDefaults::default())
}

/// Builds the payload sent to the chatbot for `raw_message`.
///
/// Messages that already spell out `location`, `type` or `quantity` are sent
/// as typed. Price questions get every field the price model requires, with
/// `defaults` filling the gaps. Anything else gets a short summary of the
/// known context and no defaults.
pub fn format_message_with_defaults<Tz: TimeZone>(
    raw_message: &str,
    context: &ChatContext,
    now: &DateTime<Tz>,
    defaults: &PriceDefaults,
) -> String {
    if EXPLICIT_FIELDS_RE.is_match(raw_message) {
        return raw_message.to_string();
    }

    if is_price_query(raw_message) {
        let calendar = CalendarFields::at(now);
        return format!(
            "{raw_message}. I need a price prediction with the following details: \
             location={}, banana_type={}, quantity={}, month={}, week_of_month={}, \
             day_of_week={}, day_of_month={}, include_all_features=true",
            context.location.as_deref().unwrap_or(&defaults.location),
            context
                .banana_type
                .as_deref()
                .unwrap_or(&defaults.banana_type),
            context.quantity.unwrap_or(defaults.quantity),
            calendar.month,
            calendar.week_of_month,
            calendar.day_of_week,
            calendar.day_of_month,
        );
    }

    let mut details = Vec::new();
    if let Some(location) = &context.location {
        details.push(format!("My location is {location}"));
    }
    if let Some(banana_type) = &context.banana_type {
        details.push(format!("I'm growing {banana_type} bananas"));
    }
    if let Some(quantity) = context.quantity {
        details.push(format!("I have {quantity} kg"));
    }

    if details.is_empty() {
        raw_message.to_string()
    } else {
        format!("{raw_message}. Context: {}", details.join(". "))
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn context_strategy() -> impl Strategy<Value = ChatContext> {
        (
            proptest::option::of("[A-Za-z]{1,12}"),
            proptest::option::of("[A-Za-z]{1,12}"),
            proptest::option::of(any::<u32>()),
        )
            .prop_map(|(location, banana_type, quantity)| ChatContext {
                location,
                banana_type,
                quantity,
            })
    }

    /// Text that is neither a price question nor names a context field.
    fn plain_text() -> impl Strategy<Value = String> {
        "[a-zA-Z ,.?!']{0,60}".prop_filter("mentions a keyword", |text| {
            let lower = text.to_lowercase();
            !["location", "type", "quantity", "price", "cost"]
                .iter()
                .any(|keyword| lower.contains(keyword))
        })
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    proptest! {
        #[test]
        fn explicit_fields_pass_through(
            prefix in "[a-z ]{0,20}",
            keyword in prop::sample::select(vec!["location", "Type", "QUANTITY"]),
            suffix in "[a-z0-9 ]{0,20}",
            context in context_strategy(),
            secs in 0i64..4_102_444_800,
        ) {
            let raw = format!("{prefix}{keyword}{suffix}");
            prop_assert_eq!(format_message_with_context(&raw, &context, &at(secs)), raw);
        }

        #[test]
        fn empty_context_leaves_plain_text_alone(
            text in plain_text(),
            secs in 0i64..4_102_444_800,
        ) {
            prop_assert_eq!(
                format_message_with_context(&text, &ChatContext::new(), &at(secs)),
                text
            );
        }

        #[test]
        fn price_queries_are_augmented_once(
            text in plain_text(),
            keyword in prop::sample::select(vec!["price", "Cost"]),
            context in context_strategy(),
            secs in 0i64..4_102_444_800,
        ) {
            let raw = format!("{text} {keyword}");
            let now = at(secs);
            let once = format_message_with_context(&raw, &context, &now);
            prop_assert!(once.starts_with(&raw));
            prop_assert_eq!(once.matches("include_all_features=true").count(), 1);
            prop_assert_eq!(format_message_with_context(&once, &context, &now), once);
        }
    }
}
