//! Activity-log records.
//!
//! Activity types are not searched as `type:creation`. Each type is its own
//! boolean field instead (`accountCreation:true`), which matches records of
//! that type, while `false` matches every other type.
//!
//! The generated [`Activity::title`] is what the log shows and what plain
//! search terms hit locally. The backend has no notion of it, so the `title`
//! field is local-only.

use crate::fields::{FieldRegistry, QueryType};
use crate::model::{unix_seconds, FieldValue, Item};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

pub const DEFAULT_SORT_FIELD: &str = "time";

/// Columns the activity log can be sorted by. Newest first by default.
pub const SORT_COLUMNS: &[&str] = &["time"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    Creation,
    Deletion,
    Disabled,
    Enabled,
    ContactLinked,
    ContactUnlinked,
    ChangePassword,
    ResetPassword,
    CreateInvite,
    DeleteInvite,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ActivityType {
    /// The boolean search field that selects this type.
    pub fn field(self) -> Option<&'static str> {
        Some(match self {
            ActivityType::Creation => "accountCreation",
            ActivityType::Deletion => "accountDeletion",
            ActivityType::Disabled => "accountDisabled",
            ActivityType::Enabled => "accountEnabled",
            ActivityType::ContactLinked => "contactLinked",
            ActivityType::ContactUnlinked => "contactUnlinked",
            ActivityType::ChangePassword => "passwordChange",
            ActivityType::ResetPassword => "passwordReset",
            ActivityType::CreateInvite => "inviteCreated",
            ActivityType::DeleteInvite => "inviteDeleted",
            ActivityType::Unknown => return None,
        })
    }
}

/// Who caused an activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    User,
    Admin,
    Daemon,
    #[default]
    #[serde(other)]
    Anon,
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivitySource::User => "user",
            ActivitySource::Admin => "admin",
            ActivitySource::Anon => "anon",
            ActivitySource::Daemon => "daemon",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub user_id: String,
    pub username: String,
    pub source_type: ActivitySource,
    pub source: String,
    pub source_username: String,
    pub invite_code: String,
    pub value: String,
    #[serde(with = "unix_seconds")]
    pub time: Option<DateTime<Utc>>,
    pub ip: String,
}

impl Activity {
    /// Whether `source` names an account.
    pub fn source_is_user(&self) -> bool {
        matches!(
            self.source_type,
            ActivitySource::User | ActivitySource::Admin
        ) && !self.source.is_empty()
    }

    /// Source kind, followed by the source account's name when there is one.
    pub fn actor(&self) -> String {
        let mut actor = self.source_type.to_string();
        if self.source_is_user() && !self.source_username.is_empty() {
            actor.push(' ');
            actor.push_str(&self.source_username);
        }
        actor
    }

    /// Name of the admin account behind an action on someone else's account.
    /// Empty for creations and for actions users took themselves.
    pub fn referrer(&self) -> &str {
        if self.kind == ActivityType::Creation
            || self.source_type == ActivitySource::User
            || !self.source_is_user()
        {
            return "";
        }
        &self.source_username
    }

    /// Both account names an activity mentions.
    pub fn mentioned_users(&self) -> String {
        match (self.username.is_empty(), self.source_username.is_empty()) {
            (false, false) => format!("{} {}", self.username, self.source_username),
            (false, true) => self.username.clone(),
            (true, false) => self.source_username.clone(),
            (true, true) => String::new(),
        }
    }

    /// One-line description shown in the log.
    pub fn title(&self) -> String {
        let user = if self.username.is_empty() {
            "unknown account"
        } else {
            self.username.as_str()
        };
        let by = match self.source_type {
            ActivitySource::Admin if !self.source_username.is_empty() => {
                format!(" by {}", self.source_username)
            }
            ActivitySource::Daemon => " automatically".to_string(),
            _ => String::new(),
        };
        match self.kind {
            ActivityType::Creation if self.source_type == ActivitySource::User => {
                if self.invite_code.is_empty() {
                    format!("{user} created their account")
                } else {
                    format!("{user} signed up with invite {}", self.invite_code)
                }
            }
            ActivityType::Creation => format!("Account {user} created{by}"),
            ActivityType::Deletion => format!("Account {user} deleted{by}"),
            ActivityType::Disabled => format!("Account {user} disabled{by}"),
            ActivityType::Enabled => format!("Account {user} enabled{by}"),
            ActivityType::ContactLinked => format!("{user} linked {}", self.value),
            ActivityType::ContactUnlinked => format!("{user} unlinked {}", self.value),
            ActivityType::ChangePassword => format!("{user} changed their password{by}"),
            ActivityType::ResetPassword => format!("{user} reset their password"),
            ActivityType::CreateInvite => format!("Invite {} created{by}", self.invite_code),
            ActivityType::DeleteInvite => format!("Invite {} deleted{by}", self.invite_code),
            ActivityType::Unknown => "Unknown activity".to_string(),
        }
    }
}

impl Item for Activity {
    fn key(&self) -> &str {
        &self.id
    }

    fn searchable_text(&self) -> Vec<Cow<'_, str>> {
        let mut text: Vec<Cow<'_, str>> = [
            &self.id,
            &self.user_id,
            &self.username,
            &self.source,
            &self.source_username,
            &self.invite_code,
            &self.value,
            &self.ip,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| Cow::Borrowed(s.as_str()))
        .collect();
        text.push(Cow::Owned(self.title()));
        text
    }
}

fn type_field(
    registry: FieldRegistry<Activity>,
    kind: ActivityType,
    name: &'static str,
) -> FieldRegistry<Activity> {
    let key = kind.field().unwrap_or("unknown");
    registry.register(
        key,
        QueryType::new(name, key).bool(),
        move |a: &Activity| FieldValue::Bool(a.kind == kind),
    )
}

/// Searchable fields of an activity record.
pub fn registry() -> FieldRegistry<Activity> {
    let types = [
        (ActivityType::Creation, "Account creation"),
        (ActivityType::Deletion, "Account deletion"),
        (ActivityType::Disabled, "Account disabled"),
        (ActivityType::Enabled, "Account enabled"),
        (ActivityType::ContactLinked, "Contact linked"),
        (ActivityType::ContactUnlinked, "Contact unlinked"),
        (ActivityType::ChangePassword, "Password change"),
        (ActivityType::ResetPassword, "Password reset"),
        (ActivityType::CreateInvite, "Invite created"),
        (ActivityType::DeleteInvite, "Invite deleted"),
    ];
    let registry = types
        .into_iter()
        .fold(FieldRegistry::new(), |reg, (kind, name)| {
            type_field(reg, kind, name)
        });

    registry
        .register(
            "actor",
            QueryType::new("Actor", "actor")
                .describe("user, admin, anon or daemon, plus the account name")
                .string(),
            |a: &Activity| FieldValue::Text(a.actor()),
        )
        .register(
            "referrer",
            QueryType::new("Referrer", "referrer").string(),
            |a: &Activity| FieldValue::Text(a.referrer().to_string()),
        )
        .register(
            "mentionedUsers",
            QueryType::new("Mentioned users", "mentionedUsers")
                .describe("Any account named in the record")
                .string(),
            |a: &Activity| FieldValue::Text(a.mentioned_users()),
        )
        .register(
            "title",
            QueryType::new("Title", "title").string().local_only(),
            |a: &Activity| FieldValue::Text(a.title()),
        )
        .register(
            "ip",
            QueryType::new("IP address", "ip").string().hidden(),
            |a: &Activity| FieldValue::Text(a.ip.clone()),
        )
        .register(
            "time",
            QueryType::new("Date", "time").date(),
            |a: &Activity| FieldValue::Time(a.time),
        )
}
