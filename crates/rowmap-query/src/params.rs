//! Parameter binding for raw SQL.
//!
//! Raw queries may mix `:name` markers and `?` markers. Binding happens in two
//! passes:
//!
//! 1. every `:name` marker with a matching named parameter is replaced by the
//!    quoted value, and that parameter is consumed;
//! 2. the parameters left over (positional ones and named ones that matched no
//!    marker) fill the `?` markers strictly left to right, in the order they
//!    were added.
//!
//! Markers are only recognized in the caller's SQL text, never inside a value
//! that was already substituted.

use regex::Regex;
use rowmap_core::Value;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Key of a raw query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Matches a `:name` marker.
    Named(String),
    /// Fills the next `?` marker.
    Positional(usize),
}

/// Ordered parameters for a raw query.
///
/// # Example
///
/// ```
/// use rowmap_query::Params;
///
/// let params = Params::new().named("x", 5_i64).positional(7_i64);
/// let sql = params.bind("WHERE a=:x AND b=?", |v| rowmap_core::quote_literal(v));
/// assert_eq!(sql, "WHERE a=5 AND b=7");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, Value)>,
    positional: usize,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter for the `:key` marker.
    ///
    /// Markers are ASCII letters, digits and `_`. A key with any other
    /// character (`user.id`) can never match a marker and fills the next `?`
    /// instead.
    pub fn named(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push_named(key, value);
        self
    }

    /// Add a parameter for the next `?` marker.
    pub fn positional(mut self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    pub fn push_named(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if !is_marker_name(&key) {
            tracing::warn!(key = %key, "Parameter name cannot appear as a :marker");
        }
        self.entries.push((ParamKey::Named(key), value.into()));
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.entries
            .push((ParamKey::Positional(self.positional), value.into()));
        self.positional += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Substitute the parameters into `sql`, rendering each value with `quote`.
    pub fn bind<Q>(&self, sql: &str, quote: Q) -> String
    where
        Q: Fn(&Value) -> String,
    {
        if self.entries.is_empty() {
            return sql.to_string();
        }

        // Later entries with the same name win.
        let named: HashMap<&str, &Value> = self
            .entries
            .iter()
            .filter_map(|(key, value)| match key {
                ParamKey::Named(name) => Some((name.as_str(), value)),
                ParamKey::Positional(_) => None,
            })
            .collect();

        let (segments, used) = substitute_named(sql, &named, &quote);

        let mut remaining = self.entries.iter().filter_map(|(key, value)| match key {
            ParamKey::Named(name) if used.contains(name.as_str()) => None,
            _ => Some(value),
        });

        let mut out = String::with_capacity(sql.len());
        let mut unfilled = 0usize;
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(&text),
                Segment::Sql(text) => {
                    for ch in text.chars() {
                        if ch == '?' {
                            if let Some(value) = remaining.next() {
                                out.push_str(&quote(value));
                                continue;
                            }
                            unfilled += 1;
                        }
                        out.push(ch);
                    }
                }
            }
        }

        let surplus = remaining.count();
        if surplus > 0 {
            tracing::warn!(surplus, "More query parameters than markers; extras ignored");
        }
        if unfilled > 0 {
            tracing::debug!(unfilled, "Positional markers left without a parameter");
        }

        out
    }
}

enum Segment {
    Sql(String),
    Literal(String),
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":([A-Za-z0-9_]+)").expect("static marker pattern"))
}

fn is_marker_name(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn substitute_named<'p, Q>(
    sql: &str,
    named: &HashMap<&'p str, &Value>,
    quote: &Q,
) -> (Vec<Segment>, HashSet<&'p str>)
where
    Q: Fn(&Value) -> String,
{
    let mut segments = Vec::new();
    let mut used = HashSet::new();
    if named.is_empty() {
        segments.push(Segment::Sql(sql.to_string()));
        return (segments, used);
    }

    let mut last = 0;
    for caps in marker_pattern().captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // `::type` casts are not markers.
        if whole.start() > 0 && sql.as_bytes()[whole.start() - 1] == b':' {
            continue;
        }
        let Some((&key, value)) = named.get_key_value(name.as_str()) else {
            continue;
        };
        segments.push(Segment::Sql(sql[last..whole.start()].to_string()));
        segments.push(Segment::Literal(quote(value)));
        used.insert(key);
        last = whole.end();
    }
    segments.push(Segment::Sql(sql[last..].to_string()));

    (segments, used)
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    /// Collect named parameters.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.push_named(key, value);
        }
        params
    }
}
