//! Operator registry
//!
//! Comparison, arithmetic and logical operators shared by `operator/eval`,
//! `operator/compare` and `action/ifElse` conditions.

use serde_json::{Number, Value as JsonValue};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Not,
    NotNot,
    Rem,
    Add,
    Sub,
    Mul,
    Div,
    Increment,
    Decrement,
    And,
    Or,
    Contains,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => Operator::Eq,
            "!=" => Operator::NotEq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "!" => Operator::Not,
            "!!" => Operator::NotNot,
            "%" => Operator::Rem,
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "++" => Operator::Increment,
            "--" => Operator::Decrement,
            "&&" => Operator::And,
            "||" => Operator::Or,
            "~" => Operator::Contains,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Not => "!",
            Operator::NotNot => "!!",
            Operator::Rem => "%",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Increment => "++",
            Operator::Decrement => "--",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Contains => "~",
        }
    }

    /// Number of operands the operator reads
    pub fn arity(self) -> usize {
        match self {
            Operator::Not | Operator::NotNot | Operator::Increment | Operator::Decrement => 1,
            _ => 2,
        }
    }

    pub fn apply(self, values: &[JsonValue]) -> Result<JsonValue, String> {
        if values.len() < self.arity() {
            return Err(format!(
                "operator '{}' expects {} operand(s), got {}",
                self.symbol(),
                self.arity(),
                values.len()
            ));
        }

        let a = &values[0];
        let b = values.get(1).unwrap_or(&JsonValue::Null);

        let result = match self {
            Operator::Eq => JsonValue::Bool(loose_eq(a, b)),
            Operator::NotEq => JsonValue::Bool(!loose_eq(a, b)),
            Operator::Gt => JsonValue::Bool(order(a, b, self)? == Ordering::Greater),
            Operator::Gte => JsonValue::Bool(order(a, b, self)? != Ordering::Less),
            Operator::Lt => JsonValue::Bool(order(a, b, self)? == Ordering::Less),
            Operator::Lte => JsonValue::Bool(order(a, b, self)? != Ordering::Greater),
            Operator::Not => JsonValue::Bool(!is_truthy(a)),
            Operator::NotNot => JsonValue::Bool(is_truthy(a)),
            Operator::And => JsonValue::Bool(is_truthy(a) && is_truthy(b)),
            Operator::Or => JsonValue::Bool(is_truthy(a) || is_truthy(b)),
            Operator::Add => match (a, b) {
                (JsonValue::String(_), _) | (_, JsonValue::String(_)) => {
                    JsonValue::String(format!("{}{}", display(a), display(b)))
                }
                _ => number(num(a, self)? + num(b, self)?),
            },
            Operator::Sub => number(num(a, self)? - num(b, self)?),
            Operator::Mul => number(num(a, self)? * num(b, self)?),
            Operator::Div => {
                let divisor = num(b, self)?;
                if divisor == 0.0 {
                    return Err("division by zero".to_string());
                }
                number(num(a, self)? / divisor)
            }
            Operator::Rem => {
                let divisor = num(b, self)?;
                if divisor == 0.0 {
                    return Err("remainder by zero".to_string());
                }
                number(num(a, self)? % divisor)
            }
            Operator::Increment => number(num(a, self)? + 1.0),
            Operator::Decrement => number(num(a, self)? - 1.0),
            Operator::Contains => JsonValue::Bool(contains(a, b)),
        };

        Ok(result)
    }
}

/// Evaluate an operator by symbol
pub fn eval(symbol: &str, values: &[JsonValue]) -> Result<JsonValue, String> {
    let op = Operator::from_symbol(symbol).ok_or_else(|| format!("unknown operator '{}'", symbol))?;
    op.apply(values)
}

/// Fold `[value, "&&" | "||", value, ...]` strictly left to right
///
/// No precedence: `a || b && c` is `(a || b) && c`.
pub fn compare(items: &[JsonValue]) -> Result<bool, String> {
    let Some(first) = items.first() else {
        return Err("nothing to compare".to_string());
    };

    let mut acc = is_truthy(first);
    let mut rest = items[1..].iter();
    while let Some(token) = rest.next() {
        let op = match token.as_str() {
            Some("&&") => Operator::And,
            Some("||") => Operator::Or,
            _ => return Err(format!("expected '&&' or '||', got {}", token)),
        };
        let Some(next) = rest.next() else {
            return Err(format!("'{}' has no right-hand operand", op.symbol()));
        };
        acc = match op {
            Operator::And => acc && is_truthy(next),
            _ => acc || is_truthy(next),
        };
    }

    Ok(acc)
}

pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Structural equality with numbers compared by value (1 == 1.0)
fn loose_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn order(a: &JsonValue, b: &JsonValue, op: Operator) -> Result<Ordering, String> {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .ok_or_else(|| "numbers are not comparable".to_string()),
        (JsonValue::String(x), JsonValue::String(y)) => Ok(x.cmp(y)),
        _ => Err(format!(
            "operator '{}' cannot compare {} and {}",
            op.symbol(),
            a,
            b
        )),
    }
}

fn num(value: &JsonValue, op: Operator) -> Result<f64, String> {
    match value {
        JsonValue::Number(n) => n.as_f64().ok_or_else(|| "number out of range".to_string()),
        JsonValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null => Ok(0.0),
        _ => Err(format!("operator '{}' expects numbers, got {}", op.symbol(), value)),
    }
}

/// Integral results come back as JSON integers
fn number(value: f64) -> JsonValue {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        JsonValue::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn display(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn contains(haystack: &JsonValue, needle: &JsonValue) -> bool {
    match haystack {
        JsonValue::String(s) => needle.as_str().map(|n| s.contains(n)).unwrap_or(false),
        JsonValue::Array(arr) => arr.iter().any(|item| loose_eq(item, needle)),
        JsonValue::Object(obj) => needle.as_str().map(|k| obj.contains_key(k)).unwrap_or(false),
        _ => false,
    }
}
