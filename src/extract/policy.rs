//! Name-keyed extraction policies and series keys.

use crate::utils::config::{KEY_SEPARATOR, PARTIAL_SUFFIX};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Identifier of one extracted series: `name`, `name:field` or
/// `name:field:partial`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SeriesKey(String);

impl SeriesKey {
    /// Key for a flat series
    pub fn flat(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Key for one decomposed field
    pub fn field(name: &str, field: &str) -> Self {
        Self(format!("{name}{KEY_SEPARATOR}{field}"))
    }

    /// Key for the first-element projection of a sequence field
    pub fn partial(name: &str, field: &str) -> Self {
        Self(format!("{name}{KEY_SEPARATOR}{field}{KEY_SEPARATOR}{PARTIAL_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SeriesKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How one payload field becomes a series
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// `decompose`: the field's value is the row
    Whole(String),
    /// `decompose_first`: the first element of a sequence field is the row.
    /// Later elements are dropped.
    First(String),
}

impl FieldRule {
    pub fn field(&self) -> &str {
        match self {
            FieldRule::Whole(field) | FieldRule::First(field) => field,
        }
    }

    pub fn series_key(&self, name: &str) -> SeriesKey {
        match self {
            FieldRule::Whole(field) => SeriesKey::field(name, field),
            FieldRule::First(field) => SeriesKey::partial(name, field),
        }
    }
}

/// Extraction mode for one event name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventPolicy {
    /// The whole `data` mapping is one series keyed by the event name
    #[default]
    Flat,
    /// Each rule emits its own series
    Decompose(Vec<FieldRule>),
}

impl EventPolicy {
    /// `decompose(fields)`; a repeated field keeps its first rule
    pub fn decompose<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventPolicy::Decompose(unique_rules(fields, FieldRule::Whole))
    }

    /// `decompose_first(fields)`; a repeated field keeps its first rule
    pub fn decompose_first<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventPolicy::Decompose(unique_rules(fields, FieldRule::First))
    }

    /// Switch the named fields to first-element projection, adding any that
    /// are not listed yet.
    ///
    /// `EventPolicy::decompose(["header", "frames"]).with_first(["frames"])`
    /// yields `X:header` and `X:frames:partial`.
    pub fn with_first<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rules = match self {
            EventPolicy::Flat => Vec::new(),
            EventPolicy::Decompose(rules) => rules,
        };
        for field in fields {
            let field = field.into();
            match rules.iter_mut().find(|r| r.field() == field) {
                Some(rule) => *rule = FieldRule::First(field),
                None => rules.push(FieldRule::First(field)),
            }
        }
        EventPolicy::Decompose(rules)
    }
}

/// One rule per distinct field, in first-seen order
fn unique_rules<I, S>(fields: I, rule: fn(String) -> FieldRule) -> Vec<FieldRule>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut rules: Vec<FieldRule> = Vec::new();
    for field in fields {
        let field = field.into();
        if rules.iter().all(|r| r.field() != field) {
            rules.push(rule(field));
        }
    }
    rules
}

/// Registered policies keyed by event name, with a default for the rest.
///
/// Resolution is total: every name maps to exactly one policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<String, EventPolicy>,
    default: EventPolicy,
}

impl PolicyTable {
    /// Empty table; every name resolves to `Flat`
    pub fn new() -> Self {
        Self::default()
    }

    /// Policies for the packet events a QUIC qlog tracer emits
    pub fn qlog_defaults() -> Self {
        let packet = EventPolicy::decompose(["header"]).with_first(["frames"]);
        let mut table = Self::new();
        for name in [
            "transport:packet_sent",
            "transport:packet_received",
            "recovery:packet_lost",
        ] {
            table.register(name, packet.clone());
        }
        table
    }

    pub fn register(&mut self, name: impl Into<String>, policy: EventPolicy) -> &mut Self {
        self.policies.insert(name.into(), policy);
        self
    }

    pub fn with(mut self, name: impl Into<String>, policy: EventPolicy) -> Self {
        self.register(name, policy);
        self
    }

    pub fn set_default(&mut self, policy: EventPolicy) {
        self.default = policy;
    }

    pub fn resolve(&self, name: &str) -> &EventPolicy {
        self.policies.get(name).unwrap_or(&self.default)
    }

    /// Registered policies sorted by event name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventPolicy)> + '_ {
        let mut entries: Vec<(&str, &EventPolicy)> =
            self.policies.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
