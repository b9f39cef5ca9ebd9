use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use derived::verbs::{Aggregate, Arity, Comparison, Logical};
use derived::{ActionRecord, Derived, RuleResults, Verb};
use serde_json::Value;

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    fn table(headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(
            headers
                .iter()
                .map(|h| Cell::new(h).set_alignment(CellAlignment::Left))
                .collect::<Vec<_>>(),
        ));
        table
    }

    pub fn format_attributes(&self, derived: &Derived) -> String {
        if derived.is_empty() {
            return "No public attributes\n".to_string();
        }
        let mut table = Self::table(&["Attribute", "Value"]);
        for (name, value) in derived {
            table.add_row(Row::from(vec![name.clone(), display_value(value)]));
        }
        format!("{}\n", table)
    }

    pub fn format_rules(&self, rules: &RuleResults) -> String {
        if rules.is_empty() {
            return "No rules\n".to_string();
        }
        let mut table = Self::table(&["Rule", "Result"]);
        for rule in rules.iter() {
            let outcome = if rule.passed { "pass" } else { "fail" };
            table.add_row(Row::from(vec![rule.name.as_str(), outcome]));
        }
        format!(
            "{}\n{} passed, {} failed\n",
            table,
            rules.passed(),
            rules.failed()
        )
    }

    /// One JSON object per line, so the output can be piped into other tools
    pub fn format_action(&self, action: &ActionRecord) -> String {
        serde_json::json!({
            "trigger": action.sentence,
            "action": action.action,
            "params": action.params,
        })
        .to_string()
    }

    pub fn format_order(&self, order: &[&str]) -> String {
        let mut table = Self::table(&["#", "Attribute"]);
        for (position, name) in order.iter().enumerate() {
            table.add_row(Row::from(vec![(position + 1).to_string(), name.to_string()]));
        }
        format!("{}\n", table)
    }

    pub fn format_verbs(&self) -> String {
        let mut table = Self::table(&["Verb", "Object", "Description"]);
        for (name, verb) in Verb::all() {
            let object = match verb.arity() {
                Arity::Unary => "-",
                Arity::Binary => match verb.query_language() {
                    Some(_) => "expression",
                    None => "required",
                },
            };
            table.add_row(Row::from(vec![
                name.to_string(),
                object.to_string(),
                describe(&verb),
            ]));
        }
        format!("{}\n", table)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn aggregate_name(aggregate: &Aggregate) -> &'static str {
    match aggregate {
        Aggregate::Len => "length",
        Aggregate::Sum => "sum",
        Aggregate::Min => "minimum",
        Aggregate::Max => "maximum",
        Aggregate::Mean => "mean",
        Aggregate::Median => "median",
    }
}

fn describe(verb: &Verb) -> String {
    match verb {
        Verb::Compare(Comparison::GreaterThan) => "subject is greater than object".to_string(),
        Verb::Compare(Comparison::LessThan) => "subject is less than object".to_string(),
        Verb::Compare(Comparison::Equal) => "subject equals object, numerically when possible".to_string(),
        Verb::Compare(Comparison::NotEqual) => "subject differs from object".to_string(),
        Verb::Identity { negated: false } => "subject and object are the same value".to_string(),
        Verb::Identity { negated: true } => "subject and object are different values".to_string(),
        Verb::Logic(Logical::And) => "both operands are truthy".to_string(),
        Verb::Logic(Logical::Or) => "either operand is truthy".to_string(),
        Verb::Aggregate(aggregate) => format!("{} of the subject list", aggregate_name(aggregate)),
        Verb::ListDivide => "element-wise division of two lists".to_string(),
        Verb::WithinLastDays => "subject date is within the last N days".to_string(),
        Verb::ListWithinLastDays => "subject dates within the last N days".to_string(),
        Verb::Parse(language) => format!("single {} match", language),
        Verb::ParseList(language, None) => format!("every {} match", language),
        Verb::ParseList(language, Some(aggregate)) => {
            format!("{} of every {} match", aggregate_name(aggregate), language)
        }
    }
}
