use serde_json::{Map, Value};

use crate::types::{json_type_name, DispatchError, ParamSpec, ToolDescriptor};

impl ToolDescriptor {
    /// Validate `args` against the descriptor's parameter tree and apply
    /// defaults for absent optional parameters.
    ///
    /// Checks run per parameter: presence for required parameters, then
    /// the type tag, then enumerated/bounds constraints. Unknown extra
    /// arguments pass through unvalidated. Returns the bound argument
    /// object handed to the handler.
    pub fn bind_arguments(&self, args: &Value) -> Result<Value, DispatchError> {
        let mut bound = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => {
                return Err(DispatchError::TypeMismatch {
                    name: "arguments".into(),
                    expected: "object",
                    found: json_type_name(other),
                })
            }
        };
        bind_into(self.params(), &mut bound)?;
        Ok(Value::Object(bound))
    }
}

fn bind_into(specs: &[ParamSpec], bound: &mut Map<String, Value>) -> Result<(), DispatchError> {
    for spec in specs {
        let Some(value) = bound.get(&spec.name) else {
            if spec.required {
                return Err(DispatchError::MissingArgument(spec.name.clone()));
            }
            if let Some(default) = &spec.default {
                bound.insert(spec.name.clone(), default.clone());
            }
            continue;
        };

        if !spec.kind.matches(value) {
            return Err(DispatchError::TypeMismatch {
                name: spec.name.clone(),
                expected: spec.kind.name(),
                found: json_type_name(value),
            });
        }

        if let Some(choices) = &spec.choices {
            if !choices.contains(value) {
                return Err(DispatchError::ConstraintViolation {
                    name: spec.name.clone(),
                    reason: format!("value {value} is not an allowed choice"),
                });
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = spec.minimum {
                if number < min {
                    return Err(DispatchError::ConstraintViolation {
                        name: spec.name.clone(),
                        reason: format!("value {number} is below the minimum {min}"),
                    });
                }
            }
            if let Some(max) = spec.maximum {
                if number > max {
                    return Err(DispatchError::ConstraintViolation {
                        name: spec.name.clone(),
                        reason: format!("value {number} is above the maximum {max}"),
                    });
                }
            }
        }

        if !spec.properties.is_empty() {
            if let Some(Value::Object(inner)) = bound.get_mut(&spec.name) {
                bind_into(&spec.properties, inner)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamSpec;
    use serde_json::json;

    fn echo_descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "echo",
            "echoes a message",
            vec![ParamSpec::string("message").required()],
        )
    }

    #[test]
    fn test_required_present() {
        let bound = echo_descriptor()
            .bind_arguments(&json!({"message": "hi"}))
            .unwrap();
        assert_eq!(bound["message"], "hi");
    }

    #[test]
    fn test_required_missing() {
        let err = echo_descriptor().bind_arguments(&json!({})).unwrap_err();
        assert!(matches!(err, DispatchError::MissingArgument(name) if name == "message"));
    }

    #[test]
    fn test_null_arguments_treated_as_empty() {
        let descriptor =
            ToolDescriptor::new("noop", "no parameters", vec![ParamSpec::string("tag")]);
        let bound = descriptor.bind_arguments(&Value::Null).unwrap();
        assert_eq!(bound, json!({}));
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = echo_descriptor()
            .bind_arguments(&json!(["not", "an", "object"]))
            .unwrap_err();
        assert!(matches!(err, DispatchError::TypeMismatch { expected: "object", .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = echo_descriptor()
            .bind_arguments(&json!({"message": 7}))
            .unwrap_err();
        assert_eq!(err.to_string(), "argument 'message': expected string, got number");
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let descriptor = ToolDescriptor::new(
            "page",
            "pagination",
            vec![ParamSpec::integer("limit").required()],
        );
        assert!(descriptor.bind_arguments(&json!({"limit": 10})).is_ok());
        let err = descriptor.bind_arguments(&json!({"limit": 10.5})).unwrap_err();
        assert!(matches!(err, DispatchError::TypeMismatch { .. }));
    }

    #[test]
    fn test_enum_constraint() {
        let descriptor = ToolDescriptor::new(
            "calculate",
            "arithmetic",
            vec![ParamSpec::string("operation")
                .required()
                .one_of(vec![json!("add"), json!("subtract")])],
        );
        assert!(descriptor.bind_arguments(&json!({"operation": "add"})).is_ok());
        let err = descriptor
            .bind_arguments(&json!({"operation": "modulo"}))
            .unwrap_err();
        assert!(matches!(err, DispatchError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_bounds_constraints() {
        let descriptor = ToolDescriptor::new(
            "page",
            "pagination",
            vec![ParamSpec::integer("limit").minimum(1.0).maximum(100.0)],
        );
        assert!(descriptor.bind_arguments(&json!({"limit": 50})).is_ok());
        let low = descriptor.bind_arguments(&json!({"limit": 0})).unwrap_err();
        assert!(low.to_string().contains("below the minimum"));
        let high = descriptor.bind_arguments(&json!({"limit": 500})).unwrap_err();
        assert!(high.to_string().contains("above the maximum"));
    }

    #[test]
    fn test_default_applied_when_absent() {
        let descriptor = ToolDescriptor::new(
            "query",
            "sql",
            vec![
                ParamSpec::string("sql").required(),
                ParamSpec::integer("limit").default_value(json!(100)),
            ],
        );
        let bound = descriptor.bind_arguments(&json!({"sql": "select 1"})).unwrap();
        assert_eq!(bound["limit"], 100);
    }

    #[test]
    fn test_default_not_applied_when_present() {
        let descriptor = ToolDescriptor::new(
            "query",
            "sql",
            vec![ParamSpec::integer("limit").default_value(json!(100))],
        );
        let bound = descriptor.bind_arguments(&json!({"limit": 5})).unwrap();
        assert_eq!(bound["limit"], 5);
    }

    #[test]
    fn test_unknown_extras_pass_through() {
        let bound = echo_descriptor()
            .bind_arguments(&json!({"message": "hi", "trace": true}))
            .unwrap();
        assert_eq!(bound["trace"], true);
    }

    #[test]
    fn test_nested_object_validation() {
        let descriptor = ToolDescriptor::new(
            "configure",
            "nested options",
            vec![ParamSpec::object(
                "options",
                vec![
                    ParamSpec::boolean("verbose").required(),
                    ParamSpec::integer("retries").default_value(json!(3)),
                ],
            )
            .required()],
        );

        let bound = descriptor
            .bind_arguments(&json!({"options": {"verbose": true}}))
            .unwrap();
        assert_eq!(bound["options"]["retries"], 3);

        let err = descriptor
            .bind_arguments(&json!({"options": {}}))
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingArgument(name) if name == "verbose"));

        let err = descriptor
            .bind_arguments(&json!({"options": "verbose"}))
            .unwrap_err();
        assert!(matches!(err, DispatchError::TypeMismatch { .. }));
    }
}
