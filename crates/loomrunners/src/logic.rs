use async_trait::async_trait;
use loomcore::{NodeRunner, Record, RecordExt, RunContext, RunnerError};
use serde_json::{json, Value};
use tracing::debug;

/// Evaluates a configured condition over the merged inputs and returns a
/// boolean branch decision.
///
/// Condition grammar: `field`, `field exists`, or `field <op> value` with
/// ops `==`, `!=`, `>`, `>=`, `<`, `<=`, `contains`. Missing fields
/// evaluate falsy; a condition never raises on absent input.
pub struct LogicRunner;

#[async_trait]
impl NodeRunner for LogicRunner {
    async fn run(
        &self,
        config: &Record,
        inputs: Record,
        _ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        let condition = config.str_or("condition", "");
        let result = evaluate(condition, &inputs);
        debug!(condition, result, "condition evaluated");

        let mut output = Record::new();
        output.insert("result".to_string(), json!(result));
        output.insert(
            "branch".to_string(),
            json!(if result { "true" } else { "false" }),
        );
        Ok(output)
    }
}

fn evaluate(condition: &str, inputs: &Record) -> bool {
    // Whitespace-tolerant: consecutive spaces between tokens are fine.
    let tokens: Vec<&str> = condition.split_whitespace().collect();

    match tokens.as_slice() {
        [] => true,
        [field] => inputs.truthy(field),
        [field, "exists"] => inputs.has(field),
        [_, _] => false,
        [field, op, rest @ ..] => {
            let lhs = match inputs.get(*field) {
                Some(v) => v,
                None => return false,
            };
            compare(lhs, op, &parse_literal(&rest.join(" ")))
        }
    }
}

/// Interpret the right-hand side as JSON where possible, else as a bare
/// string (so `status == success` works without quotes).
fn parse_literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn compare(lhs: &Value, op: &str, rhs: &Value) -> bool {
    match op {
        "==" => loose_eq(lhs, rhs),
        "!=" => !loose_eq(lhs, rhs),
        ">" | ">=" | "<" | "<=" => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(l), Some(r)) => match op {
                ">" => l > r,
                ">=" => l >= r,
                "<" => l < r,
                _ => l <= r,
            },
            _ => false,
        },
        "contains" => match (lhs, rhs) {
            (Value::String(l), Value::String(r)) => l.contains(r.as_str()),
            (Value::Array(l), r) => l.iter().any(|item| loose_eq(item, r)),
            _ => false,
        },
        _ => false,
    }
}

/// Equality that tolerates string/number representation differences coming
/// off the wire.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    if lhs == rhs {
        return true;
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> Record {
        let mut r = Record::new();
        r.insert("score".into(), json!(0.8));
        r.insert("status".into(), json!("success"));
        r.insert("tags".into(), json!(["alpha", "beta"]));
        r.insert("matched".into(), json!(true));
        r
    }

    #[test]
    fn comparison_operators() {
        let i = inputs();
        assert!(evaluate("score > 0.5", &i));
        assert!(!evaluate("score > 0.9", &i));
        assert!(evaluate("score <= 0.8", &i));
        assert!(evaluate("status == success", &i));
        assert!(evaluate("status != failure", &i));
        assert!(evaluate("matched == true", &i));
    }

    #[test]
    fn contains_and_exists() {
        let i = inputs();
        assert!(evaluate("status contains succ", &i));
        assert!(evaluate("tags contains alpha", &i));
        assert!(!evaluate("tags contains gamma", &i));
        assert!(evaluate("score exists", &i));
        assert!(!evaluate("missing exists", &i));
    }

    #[test]
    fn missing_fields_are_falsy_not_errors() {
        let i = inputs();
        assert!(!evaluate("missing == 1", &i));
        assert!(!evaluate("missing", &i));
        assert!(evaluate("matched", &i));
    }

    #[test]
    fn empty_condition_defaults_true() {
        assert!(evaluate("", &inputs()));
        assert!(evaluate("   ", &inputs()));
    }

    #[test]
    fn consecutive_spaces_between_tokens_are_tolerated() {
        let i = inputs();
        assert!(evaluate("score  >  0.5", &i));
        assert!(evaluate("status ==   success", &i));
        assert!(evaluate("score   exists", &i));
        assert!(!evaluate("score >", &i));
    }

    #[tokio::test]
    async fn emits_result_and_branch_tag() {
        let mut config = Record::new();
        config.insert("condition".into(), json!("score > 0.5"));
        let ctx = RunContext {
            execution_id: "e".into(),
            node_id: "l1".into(),
            label: "Branch".into(),
        };
        let output = LogicRunner.run(&config, inputs(), &ctx).await.unwrap();
        assert_eq!(output["result"], json!(true));
        assert_eq!(output["branch"], json!("true"));
    }
}
