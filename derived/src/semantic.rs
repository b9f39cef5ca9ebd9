use crate::error::{DeriveError, DeriveResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Reserved subject/object token naming the input document
pub const SOURCE_TOKEN: &str = "source";

/// Leading character that marks an attribute as private
pub const PRIVATE_MARKER: char = '_';

/// Whether an attribute name is private (excluded from results)
pub fn is_private(name: &str) -> bool {
    name.starts_with(PRIVATE_MARKER)
}

/// Where a sentence operand comes from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reference {
    /// The input document
    Source,
    /// The value of another sentence in the same set
    Attribute(String),
    /// A constant carried by the definition
    Literal(Value),
}

impl Reference {
    pub fn attribute(name: impl Into<String>) -> Self {
        Reference::Attribute(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Reference::Literal(value.into())
    }

    /// Name of the referenced attribute, if this is an attribute reference
    pub fn as_attribute(&self) -> Option<&str> {
        match self {
            Reference::Attribute(name) => Some(name),
            _ => None,
        }
    }

    /// Classify a raw operand from tabular or JSON input
    ///
    /// The source token wins, then declared attribute names, and anything
    /// else is a literal.
    pub fn classify(raw: Value, declared: &HashSet<&str>) -> Self {
        match raw {
            Value::String(text) if text == SOURCE_TOKEN => Reference::Source,
            Value::String(text) if declared.contains(text.as_str()) => Reference::Attribute(text),
            other => Reference::Literal(other),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Source => write!(f, "{}", SOURCE_TOKEN),
            Reference::Attribute(name) => write!(f, "{}", name),
            Reference::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// One subject-verb-object definition of a named attribute
///
/// A sentence with an `action` is a trigger: once its value is exactly
/// `true`, the action is dispatched with the named `params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub name: String,
    pub subject: Reference,
    pub verb: String,
    pub object: Option<Reference>,
    pub action: Option<String>,
    pub params: Vec<String>,
}

impl Sentence {
    pub fn new(name: impl Into<String>, subject: Reference, verb: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject,
            verb: verb.into(),
            object: None,
            action: None,
            params: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: Reference) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_action<I, S>(mut self, action: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action = Some(action.into());
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_private(&self) -> bool {
        is_private(&self.name)
    }

    pub fn is_trigger(&self) -> bool {
        self.action.is_some()
    }

    /// Attributes that must be resolved before this sentence can be evaluated
    ///
    /// Trigger params are not included: they are read after evaluation.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        std::iter::once(&self.subject)
            .chain(self.object.as_ref())
            .filter_map(Reference::as_attribute)
    }
}

/// An ordered, validated collection of sentences with unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceSet {
    sentences: Vec<Sentence>,
    index: HashMap<String, usize>,
}

impl SentenceSet {
    /// Build a set, rejecting duplicate names, references to undeclared
    /// attributes and params without an action
    pub fn new(sentences: Vec<Sentence>) -> DeriveResult<Self> {
        let mut index = HashMap::with_capacity(sentences.len());
        for (position, sentence) in sentences.iter().enumerate() {
            if sentence.name.trim().is_empty() {
                return Err(DeriveError::invalid(
                    &sentence.name,
                    "attribute name must not be empty",
                ));
            }
            if index.insert(sentence.name.clone(), position).is_some() {
                return Err(DeriveError::invalid(
                    &sentence.name,
                    "attribute is defined more than once",
                ));
            }
        }

        for sentence in &sentences {
            for reference in sentence.dependencies().chain(sentence.params.iter().map(String::as_str)) {
                if !index.contains_key(reference) {
                    return Err(DeriveError::UnknownReference {
                        sentence: sentence.name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
            if !sentence.params.is_empty() && sentence.action.is_none() {
                return Err(DeriveError::invalid(
                    &sentence.name,
                    "params are specified without an action",
                ));
            }
        }

        Ok(Self { sentences, index })
    }

    /// Build a set from raw records, classifying every operand against the
    /// names the records declare
    pub fn from_records(records: Vec<SentenceRecord>) -> DeriveResult<Self> {
        Self::new(records_to_sentences(records, &HashSet::new()))
    }

    pub fn get(&self, name: &str) -> Option<&Sentence> {
        self.index.get(name).map(|&position| &self.sentences[position])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn at(&self, position: usize) -> &Sentence {
        &self.sentences[position]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sentence> {
        self.sentences.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(|s| s.name.as_str())
    }

    /// Sentences carrying an action, in declaration order
    pub fn triggers(&self) -> impl Iterator<Item = &Sentence> {
        self.sentences.iter().filter(|s| s.is_trigger())
    }

    pub fn into_sentences(self) -> Vec<Sentence> {
        self.sentences
    }
}

impl<'a> IntoIterator for &'a SentenceSet {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}

/// Classify records against their own names plus `known`, names already
/// declared elsewhere
pub(crate) fn records_to_sentences(
    records: Vec<SentenceRecord>,
    known: &HashSet<String>,
) -> Vec<Sentence> {
    let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
    let declared: HashSet<&str> = names
        .iter()
        .map(String::as_str)
        .chain(known.iter().map(String::as_str))
        .collect();
    records
        .into_iter()
        .map(|record| record.into_sentence(&declared))
        .collect()
}

/// A sentence as written in tabular or JSON input, before its operands are
/// classified
///
/// Accepts the `attr`/`obj` column names as aliases and params either as a
/// list or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SentenceRecord {
    #[serde(alias = "attr")]
    pub name: String,
    pub subject: String,
    pub verb: String,
    #[serde(default, alias = "obj", skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_params",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub params: Vec<String>,
}

impl SentenceRecord {
    pub fn new(
        name: impl Into<String>,
        subject: impl Into<String>,
        verb: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            verb: verb.into(),
            object: None,
            action: None,
            params: Vec::new(),
        }
    }

    pub fn object(mut self, object: impl Into<Value>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn action<I, S>(mut self, action: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action = Some(action.into());
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    fn into_sentence(self, declared: &HashSet<&str>) -> Sentence {
        let object = match self.object {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) if text.trim().is_empty() => None,
            Some(raw) => Some(Reference::classify(raw, declared)),
        };
        let action = self
            .action
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Sentence {
            name: self.name.trim().to_string(),
            subject: Reference::classify(Value::String(self.subject.trim().to_string()), declared),
            verb: self.verb.trim().to_string(),
            object,
            action,
            params: self.params,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParamsField {
    Joined(String),
    List(Vec<String>),
}

/// Split a comma-separated params cell, dropping blank entries
pub fn split_params(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_params<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ParamsField>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ParamsField::Joined(joined)) => split_params(&joined),
        Some(ParamsField::List(list)) => list
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
    })
}
