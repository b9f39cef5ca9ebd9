//! Evaluation context for resolving one sentence set against one document
//!
//! Holds the memoized value and resolution status of every sentence. The
//! context outlives a failed evaluation, so callers can inspect what was
//! resolved before the failure.

use crate::semantic::SentenceSet;
use serde_json::Value;

/// Resolution status of one sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unstarted,
    InProgress,
    Done,
}

pub struct EvaluationContext<'a> {
    /// Sentences being evaluated
    pub sentences: &'a SentenceSet,

    /// The input document every `source` reference resolves to
    pub document: &'a Value,

    /// Memoized values, indexed by declaration position
    values: Vec<Option<Value>>,

    status: Vec<Status>,

    /// Number of verb applications performed so far
    evaluations: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(sentences: &'a SentenceSet, document: &'a Value) -> Self {
        Self {
            sentences,
            document,
            values: vec![None; sentences.len()],
            status: vec![Status::Unstarted; sentences.len()],
            evaluations: 0,
        }
    }

    /// Memoized value of a resolved sentence
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.sentences
            .position(name)
            .and_then(|position| self.values[position].as_ref())
    }

    pub fn status(&self, name: &str) -> Option<Status> {
        self.sentences
            .position(name)
            .map(|position| self.status[position])
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.status(name) == Some(Status::Done)
    }

    /// How many sentences have been evaluated by applying their verb
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Resolved sentences and their values, in declaration order
    pub fn resolved(&self) -> impl Iterator<Item = (&'a str, &Value)> + '_ {
        let sentences = self.sentences;
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(position, value)| {
                value
                    .as_ref()
                    .map(|value| (sentences.at(position).name.as_str(), value))
            })
    }

    pub(crate) fn status_at(&self, position: usize) -> Status {
        self.status[position]
    }

    pub(crate) fn begin(&mut self, position: usize) {
        self.status[position] = Status::InProgress;
    }

    pub(crate) fn abandon(&mut self, position: usize) {
        if self.status[position] == Status::InProgress {
            self.status[position] = Status::Unstarted;
        }
    }

    pub(crate) fn finish(&mut self, position: usize, value: Value) {
        self.values[position] = Some(value);
        self.status[position] = Status::Done;
        self.evaluations += 1;
    }
}
