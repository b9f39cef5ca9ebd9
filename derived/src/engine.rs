use crate::analysis;
use crate::error::DeriveResult;
use crate::evaluator::context::EvaluationContext;
use crate::evaluator::triggers::{self, EventHandler};
use crate::evaluator::Evaluator;
use crate::query::{QueryAdapter, QueryBackend, QueryLanguage};
use crate::response::{Derived, RuleResults, TriggerOutcome};
use crate::semantic::{records_to_sentences, Sentence, SentenceRecord, SentenceSet};
use crate::{ResourceLimits, Validator};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// The derived-attributes engine.
///
/// Holds one validated sentence set and evaluates it against any number of
/// documents. Evaluation takes `&self` and keeps all per-run state in a fresh
/// context, so one engine can serve concurrent callers.
#[derive(Debug, Default)]
pub struct Engine {
    sentences: SentenceSet,
    queries: QueryAdapter,
    validator: Validator,
    limits: ResourceLimits,
    reference_date: Option<NaiveDate>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine holding the given records
    pub fn from_records(records: Vec<SentenceRecord>) -> DeriveResult<Self> {
        let mut engine = Self::new();
        engine.add_records(records)?;
        Ok(engine)
    }

    /// Create an engine with custom resource limits
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Replace the backend of one path language
    ///
    /// Sentences added afterwards are checked against the new backend.
    pub fn with_backend(mut self, language: QueryLanguage, backend: Box<dyn QueryBackend>) -> Self {
        self.queries = self.queries.with_backend(language, backend);
        self
    }

    /// Fix the date the day-window verbs measure from (defaults to today)
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Get the current resource limits
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn sentences(&self) -> &SentenceSet {
        &self.sentences
    }

    /// Add sentences to the engine
    ///
    /// The combined set is validated as a whole; on failure the engine keeps
    /// its previous sentences.
    pub fn add_sentences(&mut self, sentences: Vec<Sentence>) -> DeriveResult<()> {
        let mut all: Vec<Sentence> = self.sentences.iter().cloned().collect();
        all.extend(sentences);
        let combined = SentenceSet::new(all)?;
        self.validator.validate(&combined, &self.queries, &self.limits)?;
        debug!(sentences = combined.len(), "sentences added");
        self.sentences = combined;
        Ok(())
    }

    /// Add raw records, classifying their operands against every name
    /// declared so far
    pub fn add_records(&mut self, records: Vec<SentenceRecord>) -> DeriveResult<()> {
        let known: HashSet<String> = self.sentences.names().map(str::to_string).collect();
        self.add_sentences(records_to_sentences(records, &known))
    }

    /// Names in the order they resolve
    pub fn evaluation_order(&self) -> DeriveResult<Vec<&str>> {
        analysis::evaluation_order(&self.sentences)
    }

    /// Evaluator bound to this engine's backends and limits
    pub fn evaluator(&self) -> Evaluator<'_> {
        let today = self
            .reference_date
            .unwrap_or_else(|| Local::now().date_naive());
        Evaluator::new(&self.queries, &self.limits, today)
    }

    /// Derive every public attribute from a document
    pub fn derive(&self, document: &Value) -> DeriveResult<Derived> {
        let mut context = EvaluationContext::new(&self.sentences, document);
        self.evaluator().evaluate(&mut context)
    }

    /// Derive attributes and keep only the boolean ones
    pub fn derive_rules(&self, document: &Value) -> DeriveResult<RuleResults> {
        Ok(RuleResults::from_derived(&self.derive(document)?))
    }

    /// Derive attributes, then dispatch the action of every trigger that fired
    pub fn derive_triggers<H>(&self, document: &Value, handler: &mut H) -> DeriveResult<TriggerOutcome>
    where
        H: EventHandler + ?Sized,
    {
        let mut context = EvaluationContext::new(&self.sentences, document);
        let attributes = self.evaluator().evaluate(&mut context)?;
        let actions = triggers::dispatch(&context, handler)?;
        Ok(TriggerOutcome {
            attributes,
            actions,
        })
    }
}
