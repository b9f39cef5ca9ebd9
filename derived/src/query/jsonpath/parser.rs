use super::{ArithmeticOp, Comparison, Filter, Operand, Path, Query, Root, Segment, Selector};
use crate::query::{syntax_error, unescape, QueryError};
use crate::value::{parse_number, Numeric};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;
use serde_json::Value;

#[derive(Parser)]
#[grammar = "src/query/jsonpath/jsonpath.pest"]
struct JsonPathParser;

/// Parse a JSONPath expression
pub fn parse(expression: &str) -> Result<Query, QueryError> {
    let mut pairs = JsonPathParser::parse(Rule::query, expression).map_err(syntax_error)?;
    let query = pairs
        .next()
        .ok_or_else(|| QueryError::Syntax("empty expression".to_string()))?;
    let sum = query
        .into_inner()
        .find(|p| p.as_rule() == Rule::sum)
        .ok_or_else(|| QueryError::Syntax("empty expression".to_string()))?;
    parse_sum(sum)
}

fn unexpected(pair: &Pair<Rule>) -> QueryError {
    QueryError::Syntax(format!(
        "unexpected '{}' at column {}",
        pair.as_str(),
        pair.as_span().start() + 1
    ))
}

fn parse_sum(pair: Pair<Rule>) -> Result<Query, QueryError> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| QueryError::Syntax("missing operand".to_string()))?;
    let mut left = parse_product(first)?;
    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "+" => ArithmeticOp::Add,
            "-" => ArithmeticOp::Subtract,
            _ => return Err(unexpected(&op)),
        };
        let right = inner
            .next()
            .ok_or_else(|| QueryError::Syntax("missing right operand".to_string()))?;
        left = Query::Arithmetic(Box::new(left), op, Box::new(parse_product(right)?));
    }
    Ok(left)
}

fn parse_product(pair: Pair<Rule>) -> Result<Query, QueryError> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| QueryError::Syntax("missing operand".to_string()))?;
    let mut left = parse_operand(first)?;
    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "*" => ArithmeticOp::Multiply,
            "/" => ArithmeticOp::Divide,
            _ => return Err(unexpected(&op)),
        };
        let right = inner
            .next()
            .ok_or_else(|| QueryError::Syntax("missing right operand".to_string()))?;
        left = Query::Arithmetic(Box::new(left), op, Box::new(parse_operand(right)?));
    }
    Ok(left)
}

fn parse_operand(pair: Pair<Rule>) -> Result<Query, QueryError> {
    match pair.as_rule() {
        Rule::path => Ok(Query::Path(parse_path(pair)?)),
        Rule::number => parse_number(pair.as_str())
            .map(Query::Number)
            .ok_or_else(|| unexpected(&pair)),
        Rule::sum => parse_sum(pair),
        _ => Err(unexpected(&pair)),
    }
}

fn parse_path(pair: Pair<Rule>) -> Result<Path, QueryError> {
    let mut root = Root::Document;
    let mut segments = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::root => {
                root = if part.as_str() == "@" {
                    Root::Current
                } else {
                    Root::Document
                };
            }
            Rule::bare_name => {
                root = Root::Current;
                segments.push(Segment::Child(Selector::Name(part.as_str().to_string())));
            }
            _ => segments.push(parse_segment(part)?),
        }
    }
    Ok(Path { root, segments })
}

fn parse_segment(pair: Pair<Rule>) -> Result<Segment, QueryError> {
    match pair.as_rule() {
        Rule::child => Ok(Segment::Child(parse_selector(first_inner(pair)?)?)),
        Rule::descendant => Ok(Segment::Descendant(parse_selector(first_inner(pair)?)?)),
        Rule::subscript => Ok(Segment::Child(parse_selector(pair)?)),
        _ => Err(unexpected(&pair)),
    }
}

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, QueryError> {
    let error = unexpected(&pair);
    pair.into_inner().next().ok_or(error)
}

fn parse_selector(pair: Pair<Rule>) -> Result<Selector, QueryError> {
    match pair.as_rule() {
        Rule::subscript => parse_selector(first_inner(pair)?),
        Rule::wildcard => Ok(Selector::Wildcard),
        Rule::name => Ok(Selector::Name(pair.as_str().to_string())),
        Rule::quoted => Ok(Selector::Name(parse_quoted(pair)?)),
        Rule::index => Ok(Selector::Index(parse_int(first_inner(pair)?)?)),
        Rule::slice => parse_slice(pair),
        Rule::union_list => {
            let mut items = pair
                .into_inner()
                .map(parse_selector)
                .collect::<Result<Vec<_>, _>>()?;
            if items.len() == 1 {
                Ok(items.remove(0))
            } else {
                Ok(Selector::Union(items))
            }
        }
        Rule::filter => Ok(Selector::Filter(Box::new(parse_filter(first_inner(pair)?)?))),
        _ => Err(unexpected(&pair)),
    }
}

fn parse_int(pair: Pair<Rule>) -> Result<i64, QueryError> {
    pair.as_str().parse().map_err(|_| unexpected(&pair))
}

fn parse_slice(pair: Pair<Rule>) -> Result<Selector, QueryError> {
    let (mut start, mut end, mut step) = (None, None, None);
    for bound in pair.into_inner() {
        let rule = bound.as_rule();
        let value = Some(parse_int(first_inner(bound)?)?);
        match rule {
            Rule::slice_start => start = value,
            Rule::slice_end => end = value,
            _ => step = value,
        }
    }
    Ok(Selector::Slice { start, end, step })
}

fn parse_quoted(pair: Pair<Rule>) -> Result<String, QueryError> {
    unescape(first_inner(pair)?.as_str())
}

fn parse_filter(pair: Pair<Rule>) -> Result<Filter, QueryError> {
    match pair.as_rule() {
        Rule::filter_or | Rule::filter_and => {
            let is_or = pair.as_rule() == Rule::filter_or;
            let mut operands = pair
                .into_inner()
                .filter(|p| !matches!(p.as_rule(), Rule::or_kw | Rule::and_kw))
                .map(parse_filter);
            let mut left = operands
                .next()
                .ok_or_else(|| QueryError::Syntax("empty filter".to_string()))??;
            for right in operands {
                left = if is_or {
                    Filter::Or(Box::new(left), Box::new(right?))
                } else {
                    Filter::And(Box::new(left), Box::new(right?))
                };
            }
            Ok(left)
        }
        Rule::negation => Ok(Filter::Not(Box::new(parse_filter(first_inner(pair)?)?))),
        Rule::existence => Ok(Filter::Exists(parse_path(first_inner(pair)?)?)),
        Rule::comparison => {
            let mut inner = pair.into_inner();
            let (Some(left), Some(op), Some(right)) = (inner.next(), inner.next(), inner.next()) else {
                return Err(QueryError::Syntax("incomplete comparison".to_string()));
            };
            let op = match op.as_str() {
                "==" | "=" => Comparison::Equal,
                "!=" => Comparison::NotEqual,
                "<" => Comparison::Less,
                "<=" => Comparison::LessOrEqual,
                ">" => Comparison::Greater,
                ">=" => Comparison::GreaterOrEqual,
                _ => return Err(unexpected(&op)),
            };
            Ok(Filter::Compare(parse_filter_operand(left)?, op, parse_filter_operand(right)?))
        }
        Rule::match_test => {
            let mut inner = pair.into_inner();
            let (Some(left), Some(pattern)) = (inner.next(), inner.next()) else {
                return Err(QueryError::Syntax("incomplete regex match".to_string()));
            };
            let body = first_inner(pattern)?;
            let source = match body.as_rule() {
                Rule::quoted => parse_quoted(body)?,
                _ => body.as_str().replace("\\/", "/"),
            };
            let regex = Regex::new(&source)
                .map_err(|e| QueryError::Syntax(format!("invalid regex '{}': {}", source, e)))?;
            Ok(Filter::Matches(parse_filter_operand(left)?, regex))
        }
        _ => Err(unexpected(&pair)),
    }
}

fn parse_filter_operand(pair: Pair<Rule>) -> Result<Operand, QueryError> {
    let literal = match pair.as_rule() {
        Rule::relative_path => return Ok(Operand::Path(parse_path(pair)?)),
        Rule::number => parse_number(pair.as_str())
            .map(Numeric::into_value)
            .ok_or_else(|| unexpected(&pair))?,
        Rule::string => Value::String(parse_quoted(first_inner(pair)?)?),
        Rule::boolean => Value::Bool(pair.as_str() == "true"),
        Rule::null => Value::Null,
        _ => return Err(unexpected(&pair)),
    };
    Ok(Operand::Literal(literal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(expression: &str) -> Path {
        match parse(expression) {
            Ok(Query::Path(path)) => path,
            other => panic!("expected a path, got {:?}", other),
        }
    }

    #[test]
    fn test_segments() {
        let parsed = path("$.store..price");
        assert_eq!(parsed.root, Root::Document);
        assert!(matches!(&parsed.segments[0], Segment::Child(Selector::Name(n)) if n == "store"));
        assert!(matches!(&parsed.segments[1], Segment::Descendant(Selector::Name(n)) if n == "price"));
    }

    #[test]
    fn test_subscripts() {
        let parsed = path("$.items[-1]['a b'][1:5:2][0, 2][*]");
        assert!(matches!(parsed.segments[1], Segment::Child(Selector::Index(-1))));
        assert!(matches!(&parsed.segments[2], Segment::Child(Selector::Name(n)) if n == "a b"));
        assert!(matches!(
            parsed.segments[3],
            Segment::Child(Selector::Slice {
                start: Some(1),
                end: Some(5),
                step: Some(2)
            })
        ));
        assert!(matches!(&parsed.segments[4], Segment::Child(Selector::Union(items)) if items.len() == 2));
        assert!(matches!(parsed.segments[5], Segment::Child(Selector::Wildcard)));
    }

    #[test]
    fn test_filters_accept_bare_names_and_keywords() {
        let parsed = path("$.people[?age >= 18 and name =~ /^A/]");
        let Segment::Child(Selector::Filter(filter)) = &parsed.segments[1] else {
            panic!("expected a filter");
        };
        let Filter::And(left, right) = filter.as_ref() else {
            panic!("expected a conjunction, got {:?}", filter);
        };
        assert!(matches!(
            left.as_ref(),
            Filter::Compare(Operand::Path(Path { root: Root::Current, .. }), Comparison::GreaterOrEqual, Operand::Literal(_))
        ));
        assert!(matches!(right.as_ref(), Filter::Matches(..)));
    }

    #[test]
    fn test_arithmetic_precedence() {
        let Ok(Query::Arithmetic(left, ArithmeticOp::Add, right)) = parse("$.a + $.b * 2") else {
            panic!("expected an addition");
        };
        assert!(matches!(*left, Query::Path(_)));
        assert!(matches!(*right, Query::Arithmetic(_, ArithmeticOp::Multiply, _)));
    }

    #[test]
    fn test_dashes_inside_names() {
        let parsed = path("$.vendor-name");
        assert!(matches!(&parsed.segments[0], Segment::Child(Selector::Name(n)) if n == "vendor-name"));
        for expression in ["$.a - $.b", "$.a-$.b", "$.a-2", "$.a-(1)"] {
            assert!(
                matches!(parse(expression), Ok(Query::Arithmetic(_, ArithmeticOp::Subtract, _))),
                "{expression} should subtract"
            );
        }
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for expression in ["", "$.", "$[", "a.b", "$.a +", "$[?]", "$.a[?b =~ /(/]"] {
            assert!(parse(expression).is_err(), "{expression} should not parse");
        }
    }
}
