//! Typed predicates, their filter chips and their transport form.

use super::date::PartialDate;
use crate::fields::{Accessor, Field, FieldRegistry, QueryType};
use crate::model::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Comparison operator of a predicate. Only dates use anything but `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lower,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    Greater,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Operator::Lower),
            '=' => Some(Operator::Equal),
            '>' => Some(Operator::Greater),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Lower => '<',
            Operator::Equal => '=',
            Operator::Greater => '>',
        }
    }

    /// Whether a subject ordered `ordering` against the target satisfies this operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        matches!(
            (self, ordering),
            (Operator::Lower, Ordering::Less)
                | (Operator::Equal, Ordering::Equal)
                | (Operator::Greater, Ordering::Greater)
        )
    }

    fn date_prefix(self) -> &'static str {
        match self {
            Operator::Lower => "before ",
            Operator::Equal => "",
            Operator::Greater => "after ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryClass {
    Bool,
    String,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Text(String),
    Date(PartialDate),
}

/// Transport form of one predicate, as sent to the paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub class: QueryClass,
    pub field: String,
    pub operator: Operator,
    pub value: QueryValue,
}

/// The condition a query applies to its field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field truthiness equals the literal.
    Bool(bool),
    /// Field text contains the (lower-cased) literal.
    Text(String),
    /// Field timestamp, masked to the given components, compares with the operator.
    Date {
        operator: Operator,
        date: PartialDate,
    },
}

impl Predicate {
    pub fn class(&self) -> QueryClass {
        match self {
            Predicate::Bool(_) => QueryClass::Bool,
            Predicate::Text(_) => QueryClass::String,
            Predicate::Date { .. } => QueryClass::Date,
        }
    }

    pub fn compare(&self, value: &FieldValue) -> bool {
        match self {
            Predicate::Bool(expected) => value.is_truthy() == *expected,
            Predicate::Text(needle) => value.as_search_text().contains(needle.as_str()),
            Predicate::Date { operator, date } => value
                .as_time()
                .and_then(|subject| date.compare(subject))
                .is_some_and(|ordering| operator.accepts(ordering)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipTone {
    Positive,
    Critical,
    Neutral,
}

/// User-facing representation of one active predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    /// Field key the chip filters on.
    pub field: String,
    /// Display name of the field.
    pub label: String,
    pub text: String,
    pub tone: ChipTone,
    /// Byte range of the source token in the search text. Empty for queries
    /// rebuilt from a descriptor.
    pub span: Range<usize>,
}

impl FilterChip {
    /// Builds the chip for `predicate`. `source` is the value text as the user
    /// typed it, operator excluded.
    pub fn new(
        field: &str,
        query_type: &QueryType,
        predicate: &Predicate,
        source: &str,
        span: Range<usize>,
    ) -> Self {
        let (text, tone) = match predicate {
            Predicate::Bool(true) => ("true".to_string(), ChipTone::Positive),
            Predicate::Bool(false) => ("false".to_string(), ChipTone::Critical),
            Predicate::Text(value) => (format!("\"{value}\""), ChipTone::Neutral),
            Predicate::Date { operator, .. } => (
                format!("{}{}", operator.date_prefix(), source),
                ChipTone::Neutral,
            ),
        };
        Self {
            field: field.to_string(),
            label: query_type.name.to_string(),
            text,
            tone,
            span,
        }
    }
}

impl fmt::Display for FilterChip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.text)
    }
}

/// A predicate bound to the accessor of its field.
pub struct Query<T> {
    field: &'static str,
    query_type: QueryType,
    predicate: Predicate,
    accessor: Accessor<T>,
    chip: FilterChip,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field,
            query_type: self.query_type,
            predicate: self.predicate.clone(),
            accessor: Rc::clone(&self.accessor),
            chip: self.chip.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("field", &self.field)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

impl<T> Query<T> {
    pub fn new(field: &Field<T>, predicate: Predicate, source: &str, span: Range<usize>) -> Self {
        let chip = FilterChip::new(field.key, &field.query_type, &predicate, source, span);
        Self {
            field: field.key,
            query_type: field.query_type,
            predicate,
            accessor: field.accessor(),
            chip,
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn is_local_only(&self) -> bool {
        self.query_type.local_only
    }

    pub fn chip(&self) -> &FilterChip {
        &self.chip
    }

    pub fn compare(&self, value: &FieldValue) -> bool {
        self.predicate.compare(value)
    }

    pub fn compare_item(&self, item: &T) -> bool {
        self.compare(&(self.accessor)(item))
    }

    /// The transport form, or `None` when the backend cannot evaluate the field.
    pub fn as_dto(&self) -> Option<QueryDescriptor> {
        if self.query_type.local_only {
            return None;
        }
        let (operator, value) = match &self.predicate {
            Predicate::Bool(v) => (Operator::Equal, QueryValue::Bool(*v)),
            Predicate::Text(v) => (Operator::Equal, QueryValue::Text(v.clone())),
            Predicate::Date { operator, date } => (*operator, QueryValue::Date(*date)),
        };
        Some(QueryDescriptor {
            class: self.predicate.class(),
            field: self.field.to_string(),
            operator,
            value,
        })
    }

    /// Rebuilds a query from its transport form.
    ///
    /// Returns `None` for unknown, unavailable or local-only fields, for a class
    /// the field does not accept, and for values that do not match the class.
    pub fn from_dto(dto: &QueryDescriptor, registry: &FieldRegistry<T>) -> Option<Self> {
        let field = registry.lookup(&dto.field)?;
        let qt = &field.query_type;
        if qt.local_only {
            return None;
        }
        let (predicate, source) = match (dto.class, &dto.value) {
            (QueryClass::Bool, QueryValue::Bool(v)) if qt.bool => {
                (Predicate::Bool(*v), v.to_string())
            }
            (QueryClass::String, QueryValue::Text(v)) if qt.string => {
                let v = v.to_lowercase();
                (Predicate::Text(v.clone()), v)
            }
            (QueryClass::Date, QueryValue::Date(date)) if qt.date && date.is_valid() => (
                Predicate::Date {
                    operator: dto.operator,
                    date: *date,
                },
                describe_date(date),
            ),
            _ => return None,
        };
        Some(Self::new(field, predicate, &source, 0..0))
    }
}

fn describe_date(date: &PartialDate) -> String {
    let mut parts = Vec::new();
    if let Some(y) = date.year {
        parts.push(format!("year {y}"));
    }
    if let Some(m) = date.month {
        parts.push(format!("month {m}"));
    }
    if let Some(d) = date.day {
        parts.push(format!("day {d}"));
    }
    match (date.hour, date.minute) {
        (Some(h), Some(m)) => parts.push(format!("{h:02}:{m:02}")),
        (Some(h), None) => parts.push(format!("hour {h}")),
        (None, Some(m)) => parts.push(format!("minute {m}")),
        (None, None) => {}
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    struct User {
        name: String,
        email: String,
        admin: bool,
        last_active: Option<DateTime<Utc>>,
    }

    fn registry() -> FieldRegistry<User> {
        FieldRegistry::new()
            .register("name", QueryType::new("Name", "name").string(), |u: &User| {
                FieldValue::Text(u.name.clone())
            })
            .register(
                "email",
                QueryType::new("Email", "email").bool().string(),
                |u: &User| FieldValue::Text(u.email.clone()),
            )
            .register("admin", QueryType::new("Admin", "admin").bool(), |u: &User| {
                FieldValue::Bool(u.admin)
            })
            .register(
                "last_active",
                QueryType::new("Last Active", "last_active").bool().date(),
                |u: &User| FieldValue::Time(u.last_active),
            )
            .register(
                "title",
                QueryType::new("Title", "title").string().local_only(),
                |u: &User| FieldValue::Text(format!("{} did a thing", u.name)),
            )
    }

    fn alice() -> User {
        User {
            name: "Alice".into(),
            email: "alice@example.org".into(),
            admin: true,
            last_active: Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()),
        }
    }

    fn bob() -> User {
        User {
            name: "Bob".into(),
            email: String::new(),
            admin: false,
            last_active: None,
        }
    }

    fn query(reg: &FieldRegistry<User>, key: &str, predicate: Predicate) -> Query<User> {
        Query::new(reg.get(key).unwrap(), predicate, "", 0..0)
    }

    #[test]
    fn bool_predicate_uses_truthiness() {
        let reg = registry();
        let has_email = query(&reg, "email", Predicate::Bool(true));
        assert!(has_email.compare_item(&alice()));
        assert!(!has_email.compare_item(&bob()));

        let not_admin = query(&reg, "admin", Predicate::Bool(false));
        assert!(not_admin.compare_item(&bob()));
    }

    #[test]
    fn text_predicate_is_case_insensitive_substring() {
        let reg = registry();
        let q = query(&reg, "name", Predicate::Text("ali".into()));
        assert!(q.compare_item(&alice()));
        assert!(!q.compare_item(&bob()));
    }

    #[test]
    fn date_predicate_never_matches_unset_time() {
        let reg = registry();
        let q = query(
            &reg,
            "last_active",
            Predicate::Date {
                operator: Operator::Lower,
                date: PartialDate::parse("2030").unwrap(),
            },
        );
        assert!(q.compare_item(&alice()));
        assert!(!q.compare_item(&bob()));
    }

    #[test]
    fn local_only_has_no_dto() {
        let reg = registry();
        let q = query(&reg, "title", Predicate::Text("thing".into()));
        assert!(q.as_dto().is_none());
        assert!(q.compare_item(&bob()));
    }

    #[test]
    fn dto_round_trip_preserves_evaluation() {
        let reg = registry();
        let predicates = vec![
            ("admin", Predicate::Bool(true)),
            ("email", Predicate::Bool(false)),
            ("name", Predicate::Text("b".into())),
            (
                "last_active",
                Predicate::Date {
                    operator: Operator::Equal,
                    date: PartialDate::parse("march").unwrap(),
                },
            ),
            (
                "last_active",
                Predicate::Date {
                    operator: Operator::Greater,
                    date: PartialDate::parse("2024-01-01").unwrap().with_offset(60),
                },
            ),
        ];
        for (key, predicate) in predicates {
            let original = query(&reg, key, predicate);
            let dto = original.as_dto().unwrap();
            let json = serde_json::to_string(&dto).unwrap();
            let decoded: QueryDescriptor = serde_json::from_str(&json).unwrap();
            let rebuilt = Query::from_dto(&decoded, &reg).unwrap();
            for user in [alice(), bob()] {
                assert_eq!(original.compare_item(&user), rebuilt.compare_item(&user));
            }
        }
    }

    #[test]
    fn from_dto_rejects_mismatches() {
        let reg = registry();
        let wrong_class = QueryDescriptor {
            class: QueryClass::Date,
            field: "name".into(),
            operator: Operator::Equal,
            value: QueryValue::Text("x".into()),
        };
        assert!(Query::from_dto(&wrong_class, &reg).is_none());

        let unknown = QueryDescriptor {
            class: QueryClass::Bool,
            field: "nope".into(),
            operator: Operator::Equal,
            value: QueryValue::Bool(true),
        };
        assert!(Query::from_dto(&unknown, &reg).is_none());
    }

    #[test]
    fn descriptor_wire_shape() {
        let reg = registry();
        let q = query(
            &reg,
            "last_active",
            Predicate::Date {
                operator: Operator::Greater,
                date: PartialDate::parse("2024").unwrap(),
            },
        );
        let json = serde_json::to_value(q.as_dto().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "class": "date",
                "field": "last_active",
                "operator": ">",
                "value": {"year": 2024}
            })
        );
    }

    #[test]
    fn chips_carry_tone_and_text() {
        let reg = registry();
        let chip = query(&reg, "admin", Predicate::Bool(false)).chip().clone();
        assert_eq!(chip.tone, ChipTone::Critical);
        assert_eq!(chip.to_string(), "Admin: false");

        let field = reg.get("last_active").unwrap();
        let date = Query::new(
            field,
            Predicate::Date {
                operator: Operator::Lower,
                date: PartialDate::parse("2024").unwrap(),
            },
            "2024",
            3..20,
        );
        assert_eq!(date.chip().text, "before 2024");
        assert_eq!(date.chip().span, 3..20);
    }
}
