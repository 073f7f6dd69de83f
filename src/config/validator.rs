use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::{EngineSettings, RateLimitConfig, ServerSettings, Settings};
use crate::domain::{Endpoint, ResponseWrapper, Schema};
use crate::engine::generators::GeneratorRegistry;

/// Upper bound for `engine.max_depth`; resolution recurses once per level.
pub const MAX_DEPTH_LIMIT: usize = 256;
/// Upper bound for `engine.max_items`.
pub const MAX_ITEMS_LIMIT: usize = 100_000;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// Structural checks on loaded configuration. Reference cycles, dangling
/// references and unknown generators are deliberately left to the engine,
/// which reports them per request.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&settings.server, &mut errors);
        Self::validate_engine(&settings.engine, &mut errors);
        if let Some(rate_limit) = &settings.rate_limit {
            Self::validate_rate_limit(rate_limit, &mut errors);
        }
        Self::validate_schemas(&settings.schemas, &mut errors);
        Self::validate_endpoints(&settings.endpoints, &mut errors);
        Self::validate_wrappers(&settings.response_wrappers, &mut errors);
        Self::warn_unresolvable(settings);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings, errors: &mut Vec<ValidationError>) {
        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }
    }

    fn validate_engine(engine: &EngineSettings, errors: &mut Vec<ValidationError>) {
        if engine.max_depth == 0 || engine.max_depth > MAX_DEPTH_LIMIT {
            errors.push(ValidationError::InvalidValue {
                field: "engine.max_depth".to_string(),
                reason: format!("must be between 1 and {}", MAX_DEPTH_LIMIT),
            });
        }
        if engine.max_items == 0 || engine.max_items > MAX_ITEMS_LIMIT {
            errors.push(ValidationError::InvalidValue {
                field: "engine.max_items".to_string(),
                reason: format!("must be between 1 and {}", MAX_ITEMS_LIMIT),
            });
        }
        if engine.placeholder.is_empty() {
            errors.push(ValidationError::MissingField("engine.placeholder".to_string()));
        }
        if engine.default_project.is_empty() {
            errors.push(ValidationError::MissingField(
                "engine.default_project".to_string(),
            ));
        }
    }

    fn validate_rate_limit(rate_limit: &RateLimitConfig, errors: &mut Vec<ValidationError>) {
        if !rate_limit.enabled {
            return;
        }
        if rate_limit.requests_per_second == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "rate_limit.requests_per_second".to_string(),
                reason: "Rate must be greater than 0".to_string(),
            });
        }
        if rate_limit.burst_size == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "rate_limit.burst_size".to_string(),
                reason: "Burst size must be greater than 0".to_string(),
            });
        }
    }

    fn validate_schemas(schemas: &[Schema], errors: &mut Vec<ValidationError>) {
        let mut seen_ids = HashMap::new();

        for (idx, schema) in schemas.iter().enumerate() {
            if schema.id.is_empty() {
                errors.push(ValidationError::MissingField(format!("schemas[{}].id", idx)));
            }
            if let Some(prev_idx) = seen_ids.insert(&schema.id, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Schema id '{}' appears at indices {} and {}",
                    schema.id, prev_idx, idx
                )));
            }

            let mut field_names = HashSet::new();
            for (field_idx, field) in schema.fields.iter().enumerate() {
                if field.name.is_empty() {
                    errors.push(ValidationError::MissingField(format!(
                        "schemas[{}].fields[{}].name",
                        idx, field_idx
                    )));
                } else if !field_names.insert(field.name.as_str()) {
                    errors.push(ValidationError::Duplicate(format!(
                        "Field '{}' appears more than once in schema '{}'",
                        field.name, schema.id
                    )));
                }
            }
        }
    }

    fn validate_endpoints(endpoints: &[Endpoint], errors: &mut Vec<ValidationError>) {
        let mut seen_ids = HashMap::new();
        let mut seen_routes = HashMap::new();

        for (idx, endpoint) in endpoints.iter().enumerate() {
            if endpoint.id.is_empty() {
                errors.push(ValidationError::MissingField(format!("endpoints[{}].id", idx)));
            }
            if let Some(prev_idx) = seen_ids.insert(&endpoint.id, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Endpoint id '{}' appears at indices {} and {}",
                    endpoint.id, prev_idx, idx
                )));
            }

            let route = (
                endpoint.project_id.as_str(),
                endpoint.method,
                crate::adapters::store::normalize_path(&endpoint.path),
            );
            if let Some(prev_idx) = seen_routes.insert(route, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Route {} {} in project '{}' appears at indices {} and {}",
                    endpoint.method, endpoint.path, endpoint.project_id, prev_idx, idx
                )));
            }

            if endpoint.schema_id.is_empty() {
                errors.push(ValidationError::MissingField(format!(
                    "endpoints[{}].schema_id",
                    idx
                )));
            }

            if let Some(status) = endpoint.status {
                if !(200..300).contains(&status) {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("endpoints[{}].status", idx),
                        reason: format!("{} is not a 2xx status code", status),
                    });
                }
            }
        }
    }

    fn validate_wrappers(wrappers: &[ResponseWrapper], errors: &mut Vec<ValidationError>) {
        let mut seen_ids = HashMap::new();
        for (idx, wrapper) in wrappers.iter().enumerate() {
            if wrapper.id.is_empty() {
                errors.push(ValidationError::MissingField(format!(
                    "response_wrappers[{}].id",
                    idx
                )));
            }
            if let Some(prev_idx) = seen_ids.insert(&wrapper.id, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Response wrapper id '{}' appears at indices {} and {}",
                    wrapper.id, prev_idx, idx
                )));
            }
        }
    }

    /// Log references that will fail at request time without rejecting the config.
    fn warn_unresolvable(settings: &Settings) {
        let schema_ids: HashSet<&str> = settings.schemas.iter().map(|s| s.id.as_str()).collect();
        let wrapper_ids: HashSet<&str> = settings
            .response_wrappers
            .iter()
            .map(|w| w.id.as_str())
            .collect();
        let registry = GeneratorRegistry::new();

        for schema in &settings.schemas {
            for field in &schema.fields {
                if let Some(target) = field.referenced_schema() {
                    if !schema_ids.contains(target) {
                        tracing::warn!(
                            "Field '{}.{}' references unknown schema '{}'",
                            schema.id,
                            field.name,
                            target
                        );
                    }
                }
                if let Some(generator) = leaf_generator(field) {
                    if !registry.contains(generator) {
                        tracing::warn!(
                            "Field '{}.{}' uses unknown generator '{}'",
                            schema.id,
                            field.name,
                            generator
                        );
                    }
                }
            }
        }

        for endpoint in &settings.endpoints {
            if !schema_ids.contains(endpoint.schema_id.as_str()) {
                tracing::warn!(
                    "Endpoint '{}' references unknown schema '{}'",
                    endpoint.id,
                    endpoint.schema_id
                );
            }
            if let Some(wrapper_id) = &endpoint.wrapper_id {
                if !wrapper_ids.contains(wrapper_id.as_str()) {
                    tracing::warn!(
                        "Endpoint '{}' references unknown response wrapper '{}'",
                        endpoint.id,
                        wrapper_id
                    );
                }
            }
        }
    }
}

fn leaf_generator(field: &crate::domain::SchemaField) -> Option<&str> {
    use crate::domain::{ArrayElement, FieldKind};
    match &field.kind {
        FieldKind::Primitive { faker } => Some(&faker.generator),
        FieldKind::Array { array } => match &array.element {
            ArrayElement::Primitive { faker } => Some(&faker.generator),
            ArrayElement::Object { .. } => None,
        },
        FieldKind::Object { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FakerType, HttpMethod, SchemaField};

    fn settings() -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            engine: EngineSettings::default(),
            rate_limit: None,
            schemas: vec![Schema::new(
                "user",
                vec![SchemaField::primitive("id", FakerType::new("integer"))],
            )],
            endpoints: vec![Endpoint {
                id: "get-user".to_string(),
                project_id: "default".to_string(),
                method: HttpMethod::Get,
                path: "/users".to_string(),
                schema_id: "user".to_string(),
                wrapper_id: None,
                status: None,
            }],
            response_wrappers: vec![],
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(ConfigValidator::validate(&settings()).is_ok());
    }

    #[test]
    fn test_invalid_server_and_engine() {
        let mut s = settings();
        s.server.port = 0;
        s.server.host.clear();
        s.engine.max_depth = 0;
        s.engine.placeholder.clear();
        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_max_items_bounds() {
        let mut s = settings();
        s.engine.max_items = 0;
        assert_eq!(ConfigValidator::validate(&s).unwrap_err().len(), 1);
        s.engine.max_items = MAX_ITEMS_LIMIT + 1;
        assert_eq!(ConfigValidator::validate(&s).unwrap_err().len(), 1);
        s.engine.max_items = MAX_ITEMS_LIMIT;
        assert!(ConfigValidator::validate(&s).is_ok());
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let mut s = settings();
        s.rate_limit = Some(RateLimitConfig {
            enabled: true,
            requests_per_second: 0,
            burst_size: 0,
        });
        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            ValidationError::InvalidValue { field, .. } if field.starts_with("rate_limit.")
        )));

        s.rate_limit = Some(RateLimitConfig {
            enabled: false,
            requests_per_second: 0,
            burst_size: 0,
        });
        assert!(ConfigValidator::validate(&s).is_ok());
    }

    #[test]
    fn test_duplicate_field_names() {
        let mut s = settings();
        s.schemas[0]
            .fields
            .push(SchemaField::primitive("id", FakerType::new("uuid")));
        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert!(matches!(errors[0], ValidationError::Duplicate(_)));
    }

    #[test]
    fn test_duplicate_routes_after_normalization() {
        let mut s = settings();
        let mut dup = s.endpoints[0].clone();
        dup.id = "get-user-2".to_string();
        dup.path = "users/".to_string();
        s.endpoints.push(dup);
        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Route GET"));
    }

    #[test]
    fn test_non_2xx_status_rejected() {
        let mut s = settings();
        s.endpoints[0].status = Some(404);
        assert!(ConfigValidator::validate(&s).is_err());
        s.endpoints[0].status = Some(201);
        assert!(ConfigValidator::validate(&s).is_ok());
    }

    #[test]
    fn test_cycles_and_dangling_refs_are_not_config_errors() {
        let mut s = settings();
        s.schemas.push(Schema::new("a", vec![SchemaField::object("b", "b")]));
        s.schemas.push(Schema::new("b", vec![SchemaField::object("a", "a")]));
        s.schemas.push(Schema::new("c", vec![SchemaField::object("gone", "missing")]));
        assert!(ConfigValidator::validate(&s).is_ok());
    }
}
