use crate::evaluator::context::EvaluationContext;
use crate::semantic::is_private;
use serde::Serialize;
use serde_json::{Map, Value};

/// Public attributes derived from one document
///
/// Keys follow declaration order; private attributes are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Derived {
    values: Map<String, Value>,
}

impl Derived {
    pub(crate) fn collect(context: &EvaluationContext<'_>) -> Self {
        let values = context
            .resolved()
            .filter(|(name, _)| !is_private(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.values.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl<'a> IntoIterator for &'a Derived {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Outcome of one rule: a public sentence whose value is a boolean
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    pub name: String,
    pub passed: bool,
}

/// Rule outcomes in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleResults {
    results: Vec<RuleResult>,
}

impl RuleResults {
    pub(crate) fn from_derived(derived: &Derived) -> Self {
        let results = derived
            .iter()
            .filter_map(|(name, value)| {
                value.as_bool().map(|passed| RuleResult {
                    name: name.clone(),
                    passed,
                })
            })
            .collect();
        Self { results }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.results
            .iter()
            .find(|result| result.name == name)
            .map(|result| result.passed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }
}

impl<'a> IntoIterator for &'a RuleResults {
    type Item = &'a RuleResult;
    type IntoIter = std::slice::Iter<'a, RuleResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// One dispatched action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    /// The trigger sentence that fired
    pub sentence: String,
    pub action: String,
    pub params: Map<String, Value>,
}

/// Derived attributes plus the actions dispatched for them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerOutcome {
    pub attributes: Derived,
    pub actions: Vec<ActionRecord>,
}
