//! Owned RDF statements and the lookup helpers catalog parsing needs.
//!
//! Documents cross component boundaries as [`Graph`] values. Nothing here holds
//! a reference into a store; every graph handed out is a copy.

pub mod turtle;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::vocab::{rdf, xsd};

/// Object position of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    Iri { iri: String },
    Blank { id: String },
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri { iri: iri.into() }
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::Blank { id: id.into() }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn datetime(value: DateTime<Utc>) -> Self {
        Term::Literal {
            value: value.to_rfc3339_opts(SecondsFormat::Millis, true),
            datatype: Some(xsd::DATE_TIME.to_string()),
            language: None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri { iri } => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Key used to look the term up as a subject: the IRI, or `_:id` for blank nodes.
    pub fn node_key(&self) -> Option<String> {
        match self {
            Term::Iri { iri } => Some(iri.clone()),
            Term::Blank { id } => Some(format!("_:{id}")),
            Term::Literal { .. } => None,
        }
    }
}

/// One subject/predicate/object triple. Blank subjects are spelled `_:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    pub subject: String,
    pub predicate: String,
    pub object: Term,
}

impl Statement {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

/// A document's statements, deduplicated, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    statements: Vec<Statement>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Insert a statement; returns false if it was already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        if self.statements.contains(&statement) {
            return false;
        }
        self.statements.push(statement);
        true
    }

    pub fn add(&mut self, subject: &str, predicate: &str, object: Term) -> &mut Self {
        self.insert(Statement::new(subject, predicate, object));
        self
    }

    pub fn add_iri(&mut self, subject: &str, predicate: &str, iri: &str) -> &mut Self {
        self.add(subject, predicate, Term::iri(iri))
    }

    /// Add a plain literal, skipping empty values.
    pub fn add_literal(&mut self, subject: &str, predicate: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.add(subject, predicate, Term::literal(value));
        }
        self
    }

    pub fn extend(&mut self, other: Graph) {
        for statement in other.statements {
            self.insert(statement);
        }
    }

    /// Drop every statement about `subject`.
    pub fn remove_subject(&mut self, subject: &str) {
        self.statements.retain(|s| s.subject != subject);
    }

    pub fn has_subject(&self, subject: &str) -> bool {
        self.statements.iter().any(|s| s.subject == subject)
    }

    /// Distinct subjects in first-appearance order.
    pub fn subjects(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for statement in &self.statements {
            if !seen.contains(&statement.subject.as_str()) {
                seen.push(&statement.subject);
            }
        }
        seen
    }

    pub fn objects(&self, subject: &str, predicate: &str) -> Vec<&Term> {
        self.statements
            .iter()
            .filter(|s| s.subject == subject && s.predicate == predicate)
            .map(|s| &s.object)
            .collect()
    }

    /// Objects of `predicate` on any subject.
    pub fn objects_any(&self, predicate: &str) -> Vec<&Term> {
        self.statements
            .iter()
            .filter(|s| s.predicate == predicate)
            .map(|s| &s.object)
            .collect()
    }

    pub fn iris(&self, subject: &str, predicate: &str) -> Vec<&str> {
        self.objects(subject, predicate)
            .into_iter()
            .filter_map(Term::as_iri)
            .collect()
    }

    pub fn first_iri(&self, subject: &str, predicate: &str) -> Option<&str> {
        self.objects(subject, predicate)
            .into_iter()
            .find_map(Term::as_iri)
    }

    /// First node reference (IRI or blank node key) of a predicate.
    pub fn first_node(&self, subject: &str, predicate: &str) -> Option<String> {
        self.objects(subject, predicate)
            .into_iter()
            .find(|t| !matches!(t, Term::Literal { .. }))
            .and_then(Term::node_key)
    }

    /// First non-empty literal, preferring one without a language tag.
    pub fn first_literal(&self, subject: &str, predicate: &str) -> Option<&str> {
        let mut tagged = None;
        for term in self.objects(subject, predicate) {
            if let Term::Literal {
                value, language, ..
            } = term
            {
                if value.is_empty() {
                    continue;
                }
                if language.is_none() {
                    return Some(value);
                }
                tagged.get_or_insert(value.as_str());
            }
        }
        tagged
    }

    /// Literal if present, else an IRI.
    pub fn first_value(&self, subject: &str, predicate: &str) -> Option<&str> {
        self.first_literal(subject, predicate)
            .or_else(|| self.first_iri(subject, predicate))
    }

    pub fn first_datetime(&self, subject: &str, predicate: &str) -> Option<DateTime<Utc>> {
        self.objects(subject, predicate)
            .into_iter()
            .filter_map(Term::as_literal)
            .find_map(parse_datetime)
    }

    pub fn has_type(&self, subject: &str, class: &str) -> bool {
        self.objects(subject, rdf::TYPE)
            .into_iter()
            .any(|t| t.as_iri() == Some(class))
    }

    /// Subjects typed with any of `classes`, in first-appearance order.
    pub fn subjects_of_type(&self, classes: &[&str]) -> Vec<&str> {
        self.subjects()
            .into_iter()
            .filter(|subject| classes.iter().any(|class| self.has_type(subject, class)))
            .collect()
    }
}

impl FromIterator<Statement> for Graph {
    fn from_iter<T: IntoIterator<Item = Statement>>(iter: T) -> Self {
        let mut graph = Graph::new();
        for statement in iter {
            graph.insert(statement);
        }
        graph
    }
}

/// Parse an `xsd:dateTime` (or bare date) literal.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
