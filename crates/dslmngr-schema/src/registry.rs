use std::collections::HashMap;

use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::policy::ArgPolicy;
use crate::validator::validate_args;

/// Compiled argument validators keyed by object type and method.
///
/// Objects of the same type (every `dsl.line.<n>`) share one entry.
#[derive(Default)]
pub struct PolicyRegistry {
    validators: HashMap<(String, String), Validator>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register the policy of `object_type.method`.
    pub fn register(&mut self, object_type: &str, method: &str, policy: &ArgPolicy) -> Result<()> {
        let compiled = jsonschema::validator_for(&policy.to_schema()).map_err(|err| {
            SchemaError::CompileFailed {
                key: key(object_type, method),
                message: err.to_string(),
            }
        })?;

        debug!(object_type, method, "argument policy registered");
        self.validators
            .insert((object_type.to_string(), method.to_string()), compiled);
        Ok(())
    }

    /// Validate call arguments. `null` is treated as an empty table; a
    /// method without a registered policy accepts nothing.
    pub fn validate(&self, object_type: &str, method: &str, args: &Value) -> Result<()> {
        let lookup = (object_type.to_string(), method.to_string());
        let validator = self
            .validators
            .get(&lookup)
            .ok_or_else(|| SchemaError::NoPolicy(key(object_type, method)))?;

        let empty = Value::Object(Map::new());
        let args = if args.is_null() { &empty } else { args };
        validate_args(&key(object_type, method), args, validator)
    }
}

fn key(object_type: &str, method: &str) -> String {
    format!("{object_type}.{method}")
}
