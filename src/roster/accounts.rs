//! Account records, as returned by the accounts endpoint.
//!
//! Contact fields for optional integrations (Telegram, Discord, Matrix) and the
//! referral flag are gated on capabilities of the same name, so they only
//! become searchable once that integration is enabled.

use crate::fields::{FieldRegistry, QueryType};
use crate::model::{unix_seconds, FieldValue, Item};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const DEFAULT_SORT_FIELD: &str = "name";

/// Columns the accounts table can be sorted by.
pub const SORT_COLUMNS: &[&str] = &["name", "email", "last_active", "expiry"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub notify_email: bool,
    #[serde(with = "unix_seconds")]
    pub last_active: Option<DateTime<Utc>>,
    pub admin: bool,
    #[serde(with = "unix_seconds")]
    pub expiry: Option<DateTime<Utc>>,
    pub disabled: bool,
    pub telegram: String,
    pub notify_telegram: bool,
    pub discord: String,
    pub discord_id: String,
    pub notify_discord: bool,
    pub matrix: String,
    pub notify_matrix: bool,
    pub label: String,
    pub accounts_admin: bool,
    pub referrals_enabled: bool,
}

impl Item for Account {
    fn key(&self) -> &str {
        &self.id
    }

    fn searchable_text(&self) -> Vec<Cow<'_, str>> {
        [
            &self.id,
            &self.name,
            &self.label,
            &self.email,
            &self.discord,
            &self.matrix,
            &self.telegram,
        ]
        .into_iter()
        .filter(|text| !text.is_empty())
        .map(|text| Cow::Borrowed(text.as_str()))
        .collect()
    }
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

/// Searchable fields of an account. Gated fields start disabled.
pub fn registry() -> FieldRegistry<Account> {
    FieldRegistry::new()
        .register(
            "id",
            QueryType::new("ID", "id").string().hidden(),
            |a: &Account| text(&a.id),
        )
        .register(
            "name",
            QueryType::new("Username", "name")
                .describe("Account username")
                .string(),
            |a: &Account| text(&a.name),
        )
        .register(
            "label",
            QueryType::new("Label", "label")
                .describe("Label or note attached to the account")
                .bool()
                .string(),
            |a: &Account| text(&a.label),
        )
        .register(
            "email",
            QueryType::new("Email", "email")
                .describe("Email address")
                .bool()
                .string(),
            |a: &Account| text(&a.email),
        )
        .register(
            "notify_email",
            QueryType::new("Email notifications", "notify_email").bool(),
            |a: &Account| FieldValue::Bool(a.notify_email),
        )
        .register(
            "admin",
            QueryType::new("Admin", "admin")
                .describe("Has server admin rights")
                .bool(),
            |a: &Account| FieldValue::Bool(a.admin),
        )
        .register(
            "accounts_admin",
            QueryType::new("Accounts admin", "accounts_admin")
                .describe("May manage other accounts")
                .bool(),
            |a: &Account| FieldValue::Bool(a.accounts_admin),
        )
        .register(
            "disabled",
            QueryType::new("Disabled", "disabled").bool(),
            |a: &Account| FieldValue::Bool(a.disabled),
        )
        .register(
            "telegram",
            QueryType::new("Telegram", "telegram")
                .bool()
                .string()
                .depends_on("telegram"),
            |a: &Account| text(&a.telegram),
        )
        .register(
            "notify_telegram",
            QueryType::new("Telegram notifications", "notify_telegram")
                .bool()
                .depends_on("telegram"),
            |a: &Account| FieldValue::Bool(a.notify_telegram),
        )
        .register(
            "discord",
            QueryType::new("Discord", "discord")
                .bool()
                .string()
                .depends_on("discord"),
            |a: &Account| text(&a.discord),
        )
        .register(
            "discord_id",
            QueryType::new("Discord ID", "discord_id")
                .string()
                .depends_on("discord")
                .hidden(),
            |a: &Account| text(&a.discord_id),
        )
        .register(
            "notify_discord",
            QueryType::new("Discord notifications", "notify_discord")
                .bool()
                .depends_on("discord"),
            |a: &Account| FieldValue::Bool(a.notify_discord),
        )
        .register(
            "matrix",
            QueryType::new("Matrix", "matrix")
                .bool()
                .string()
                .depends_on("matrix"),
            |a: &Account| text(&a.matrix),
        )
        .register(
            "notify_matrix",
            QueryType::new("Matrix notifications", "notify_matrix")
                .bool()
                .depends_on("matrix"),
            |a: &Account| FieldValue::Bool(a.notify_matrix),
        )
        .register(
            "referrals_enabled",
            QueryType::new("Referrals", "referrals_enabled")
                .describe("May create referral invites")
                .bool()
                .depends_on("referrals"),
            |a: &Account| FieldValue::Bool(a.referrals_enabled),
        )
        .register(
            "last_active",
            QueryType::new("Last active", "last_active")
                .describe("Time of the last login; false if never")
                .bool()
                .date(),
            |a: &Account| FieldValue::Time(a.last_active),
        )
        .register(
            "expiry",
            QueryType::new("Expiry", "expiry")
                .describe("When the account expires; false if never")
                .bool()
                .date(),
            |a: &Account| FieldValue::Time(a.expiry),
        )
}
