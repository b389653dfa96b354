//! Readiness probing.
//!
//! Pages opt into explicit readiness by exposing a boolean expression
//! (`window.prerenderReady` by default). The probe reads that expression and
//! classifies the result into a three-variant signal so "declared not ready"
//! and "signal absent" never blur together.

use serde_json::Value;

use crate::error::Result;
use crate::session::Session;

/// Tri-state readiness signal read from the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The page explicitly declared itself ready.
    Ready,
    /// The page implements the signal and says it is still loading.
    NotReady,
    /// The page does not implement the signal at all.
    Unknown,
}

/// Evaluates the readiness expression against a live session. Read-only; the
/// only failure mode is an unresponsive session, which propagates.
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    expression: String,
}

impl ReadinessProber {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    pub async fn probe(&self, session: &mut Box<dyn Session>) -> Result<Readiness> {
        let value = session.evaluate(&self.expression).await?;
        Ok(classify(&value))
    }
}

/// Maps the evaluated expression value onto the signal. Only explicit
/// booleans count; everything else means the page never set the flag.
pub fn classify(value: &Value) -> Readiness {
    match value {
        Value::Bool(true) => Readiness::Ready,
        Value::Bool(false) => Readiness::NotReady,
        _ => Readiness::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_true_is_ready() {
        assert_eq!(classify(&json!(true)), Readiness::Ready);
    }

    #[test]
    fn explicit_false_is_not_ready() {
        assert_eq!(classify(&json!(false)), Readiness::NotReady);
    }

    #[test]
    fn absent_signal_is_unknown() {
        assert_eq!(classify(&Value::Null), Readiness::Unknown);
    }

    #[test]
    fn non_boolean_values_are_unknown() {
        assert_eq!(classify(&json!("true")), Readiness::Unknown);
        assert_eq!(classify(&json!(1)), Readiness::Unknown);
        assert_eq!(classify(&json!({"ready": true})), Readiness::Unknown);
    }
}
