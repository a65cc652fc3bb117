/// Arithmetic Tools
///
/// `add` and `subtract` take two numbers `a` and `b` and return
/// `{"result": <value>}`. Integral results are rendered as JSON integers.

use serde_json::Value;
use tracing::info;

use crate::core::error::{RegistryError, ToolError};
use crate::core::registry::{InputShape, ToolArguments, ToolDescriptor, ToolRegistry};

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Register `add` and `subtract`.
pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        ToolDescriptor {
            name: "add".to_string(),
            description: "Add two numbers.".to_string(),
            input_shape: InputShape::empty()
                .number("a", "First number")
                .number("b", "Second number"),
        },
        Box::new(|args: &ToolArguments| binary_op("add", '+', args, |a, b| a + b)),
    )?;

    registry.register(
        ToolDescriptor {
            name: "subtract".to_string(),
            description: "Subtract the second number from the first.".to_string(),
            input_shape: InputShape::empty()
                .number("a", "First number (minuend)")
                .number("b", "Second number (subtrahend)"),
        },
        Box::new(|args: &ToolArguments| binary_op("subtract", '-', args, |a, b| a - b)),
    )?;

    Ok(())
}

fn binary_op(
    tool: &str,
    symbol: char,
    args: &ToolArguments,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Value, ToolError> {
    let a = args.number("a")?;
    let b = args.number("b")?;
    let result = number_value(op(a, b))?;

    info!(tool, "{} {} {} = {}", a, symbol, b, result);
    Ok(serde_json::json!({ "result": result }))
}

/// Convert an f64 into a JSON number, preferring the integer form.
///
/// Non-finite values have no JSON representation and are reported as errors.
pub fn number_value(n: f64) -> Result<Value, ToolError> {
    if !n.is_finite() {
        return Err(ToolError::Execution(format!(
            "result is not a finite number: {}",
            n
        )));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Ok(Value::from(n as i64))
    } else {
        Ok(Value::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    fn run(name: &str, args: Value) -> Result<Value, ToolError> {
        let registry = registry();
        let tool = registry.resolve(name).unwrap();
        let args = tool.validate(&args)?;
        tool.invoke(&args)
    }

    #[test]
    fn add_integers() {
        assert_eq!(run("add", json!({ "a": 5, "b": 3 })).unwrap(), json!({ "result": 8 }));
    }

    #[test]
    fn subtract_integers() {
        assert_eq!(
            run("subtract", json!({ "a": 5, "b": 3 })).unwrap(),
            json!({ "result": 2 })
        );
        assert_eq!(
            run("subtract", json!({ "a": 3, "b": 5 })).unwrap(),
            json!({ "result": -2 })
        );
    }

    #[test]
    fn fractional_operands() {
        assert_eq!(
            run("add", json!({ "a": 0.5, "b": 0.25 })).unwrap(),
            json!({ "result": 0.75 })
        );
        assert_eq!(
            run("subtract", json!({ "a": 1.5, "b": 0.25 })).unwrap(),
            json!({ "result": 1.25 })
        );
    }

    #[test]
    fn results_match_native_arithmetic() {
        let pairs = [(1.0, 2.0), (-7.5, 3.25), (1e10, -1e10), (0.1, 0.2), (-0.0, 0.0)];
        for (a, b) in pairs {
            let sum = run("add", json!({ "a": a, "b": b })).unwrap();
            assert_eq!(sum["result"].as_f64().unwrap(), a + b);
            let diff = run("subtract", json!({ "a": a, "b": b })).unwrap();
            assert_eq!(diff["result"].as_f64().unwrap(), a - b);
        }
    }

    #[test]
    fn overflow_is_an_execution_error() {
        let err = run("add", json!({ "a": f64::MAX, "b": f64::MAX })).unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }

    #[test]
    fn non_numeric_arguments_fail_validation() {
        let err = run("add", json!({ "a": "5", "b": 3 })).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        let err = run("subtract", json!({ "a": 5 })).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[test]
    fn number_value_prefers_integers() {
        assert_eq!(number_value(8.0).unwrap(), json!(8));
        assert_eq!(number_value(-0.0).unwrap(), json!(0));
        assert_eq!(number_value(2.5).unwrap(), json!(2.5));
        assert_eq!(number_value(1e300).unwrap(), json!(1e300));
        assert!(number_value(f64::NAN).is_err());
    }
}
