use super::{BinaryOp, Node, Step};
use crate::query::{syntax_error, unescape, QueryError};
use crate::value::parse_number;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use serde_json::Value;

#[derive(Parser)]
#[grammar = "src/query/jsonata/jsonata.pest"]
struct JsonataParser;

/// Parse a JSONata expression
pub fn parse(expression: &str) -> Result<Node, QueryError> {
    let mut pairs = JsonataParser::parse(Rule::program, expression).map_err(syntax_error)?;
    let program = pairs
        .next()
        .ok_or_else(|| QueryError::Syntax("empty expression".to_string()))?;
    let expr = program
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| QueryError::Syntax("empty expression".to_string()))?;
    parse_node(expr)
}

fn unexpected(pair: &Pair<Rule>) -> QueryError {
    QueryError::Syntax(format!(
        "unexpected '{}' at column {}",
        pair.as_str(),
        pair.as_span().start() + 1
    ))
}

fn missing(what: &str) -> QueryError {
    QueryError::Syntax(format!("missing {}", what))
}

fn parse_node(pair: Pair<Rule>) -> Result<Node, QueryError> {
    match pair.as_rule() {
        Rule::expr => {
            let mut inner = pair.into_inner();
            let condition = parse_node(inner.next().ok_or_else(|| missing("expression"))?)?;
            match inner.next() {
                None => Ok(condition),
                Some(then) => {
                    let otherwise = inner.next().map(parse_node).transpose()?;
                    Ok(Node::Condition(
                        Box::new(condition),
                        Box::new(parse_node(then)?),
                        otherwise.map(Box::new),
                    ))
                }
            }
        }
        Rule::disjunction | Rule::conjunction => {
            let is_or = pair.as_rule() == Rule::disjunction;
            let mut operands = pair
                .into_inner()
                .filter(|p| !matches!(p.as_rule(), Rule::or_kw | Rule::and_kw))
                .map(parse_node);
            let mut left = operands.next().ok_or_else(|| missing("operand"))??;
            for right in operands {
                let (l, r) = (Box::new(left), Box::new(right?));
                left = if is_or { Node::Or(l, r) } else { Node::And(l, r) };
            }
            Ok(left)
        }
        Rule::comparison | Rule::concat | Rule::additive | Rule::multiplicative => {
            let is_concat = pair.as_rule() == Rule::concat;
            let mut inner = pair.into_inner();
            let mut left = parse_node(inner.next().ok_or_else(|| missing("operand"))?)?;
            while let Some(next) = inner.next() {
                let (op, right) = if is_concat {
                    (BinaryOp::Concat, next)
                } else {
                    let op = binary_op(&next)?;
                    (op, inner.next().ok_or_else(|| missing("right operand"))?)
                };
                left = Node::Binary(Box::new(left), op, Box::new(parse_node(right)?));
            }
            Ok(left)
        }
        Rule::unary => {
            let mut negations = 0;
            let mut operand = None;
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::negate => negations += 1,
                    _ => operand = Some(parse_node(part)?),
                }
            }
            let mut node = operand.ok_or_else(|| missing("operand"))?;
            for _ in 0..negations {
                node = Node::Negate(Box::new(node));
            }
            Ok(node)
        }
        Rule::path => {
            let mut steps = pair
                .into_inner()
                .map(parse_step)
                .collect::<Result<Vec<_>, _>>()?;
            let navigational = |node: &Node| {
                matches!(node, Node::Field(_) | Node::Wildcard | Node::Descendants)
            };
            if steps.len() == 1 && steps[0].predicates.is_empty() && !navigational(&steps[0].node) {
                Ok(steps.remove(0).node)
            } else {
                Ok(Node::Path(steps))
            }
        }
        Rule::function_call => {
            let mut inner = pair.into_inner();
            let name = inner.next().ok_or_else(|| missing("function name"))?;
            let name = name.as_str().trim_start_matches('$').to_string();
            let args = inner.map(parse_node).collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Function(name, args))
        }
        Rule::root_var => Ok(Node::Root),
        Rule::context_var => Ok(Node::Context),
        Rule::array => Ok(Node::Array(
            pair.into_inner().map(parse_node).collect::<Result<_, _>>()?,
        )),
        Rule::block => Ok(Node::Block(
            pair.into_inner().map(parse_node).collect::<Result<_, _>>()?,
        )),
        Rule::descendants => Ok(Node::Descendants),
        Rule::wildcard => Ok(Node::Wildcard),
        Rule::field => {
            let name = pair.into_inner().next().ok_or_else(|| missing("field name"))?;
            Ok(Node::Field(name.as_str().to_string()))
        }
        Rule::number => parse_number(pair.as_str())
            .map(|n| Node::Literal(n.into_value()))
            .ok_or_else(|| unexpected(&pair)),
        Rule::string => {
            let body = pair.into_inner().next().ok_or_else(|| missing("string body"))?;
            Ok(Node::Literal(Value::String(unescape(body.as_str())?)))
        }
        Rule::boolean => Ok(Node::Literal(Value::Bool(pair.as_str() == "true"))),
        Rule::null => Ok(Node::Literal(Value::Null)),
        _ => Err(unexpected(&pair)),
    }
}

fn parse_step(pair: Pair<Rule>) -> Result<Step, QueryError> {
    let mut inner = pair.into_inner();
    let node = parse_node(inner.next().ok_or_else(|| missing("path step"))?)?;
    let predicates = inner
        .map(|predicate| match predicate.into_inner().next() {
            Some(expr) => parse_node(expr),
            // `[]` keeps the sequence as is
            None => Ok(Node::Literal(Value::Bool(true))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Step { node, predicates })
}

fn binary_op(pair: &Pair<Rule>) -> Result<BinaryOp, QueryError> {
    Ok(match pair.as_str() {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Subtract,
        "*" => BinaryOp::Multiply,
        "/" => BinaryOp::Divide,
        "%" => BinaryOp::Modulo,
        "=" => BinaryOp::Equal,
        "!=" => BinaryOp::NotEqual,
        "<" => BinaryOp::Less,
        "<=" => BinaryOp::LessOrEqual,
        ">" => BinaryOp::Greater,
        ">=" => BinaryOp::GreaterOrEqual,
        "in" => BinaryOp::In,
        _ => return Err(unexpected(pair)),
    })
}
