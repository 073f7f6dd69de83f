//! Core domain types and ports.
//!
//! Everything the engine consumes is defined here: schemas and their
//! fields, endpoints, response wrappers, and the read-only [`MockStore`]
//! port the persistence collaborator implements.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod error;

pub use error::MockError;

pub type ProjectId = String;
pub type SchemaId = String;
pub type EndpointId = String;
pub type WrapperId = String;

/// Project used when neither the definition nor the request names one.
pub const DEFAULT_PROJECT: &str = "default";

pub(crate) fn default_project() -> ProjectId {
    DEFAULT_PROJECT.to_string()
}

/// HTTP methods an endpoint can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unsupported HTTP method '{}'", other)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// A generator binding for a primitive leaf: registry id plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakerType {
    pub generator: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl FakerType {
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: Value) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }
}

/// How many elements an array field produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCount {
    Fixed(usize),
    Range { min: usize, max: usize },
}

impl Default for ItemCount {
    fn default() -> Self {
        ItemCount::Range { min: 1, max: 3 }
    }
}

/// Element shape of an array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArrayElement {
    Primitive {
        #[serde(rename = "faker_type")]
        faker: FakerType,
    },
    Object {
        #[serde(rename = "object_schema")]
        schema: SchemaId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub element: ArrayElement,
    #[serde(default)]
    pub count: ItemCount,
}

/// The three shapes a field can take. Exactly one payload exists per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Primitive {
        #[serde(rename = "faker_type")]
        faker: FakerType,
    },
    Object {
        #[serde(rename = "object_type")]
        schema: SchemaId,
    },
    Array {
        #[serde(rename = "array_type")]
        array: ArrayType,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl SchemaField {
    pub fn primitive(name: &str, faker: FakerType) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Primitive { faker },
        }
    }

    pub fn object(name: &str, schema: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Object {
                schema: schema.to_string(),
            },
        }
    }

    pub fn array(name: &str, element: ArrayElement, count: ItemCount) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Array {
                array: ArrayType { element, count },
            },
        }
    }

    /// Schema this field points at, if any.
    pub fn referenced_schema(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Object { schema } => Some(schema),
            FieldKind::Array {
                array:
                    ArrayType {
                        element: ArrayElement::Object { schema },
                        ..
                    },
            } => Some(schema),
            _ => None,
        }
    }
}

/// A named, ordered set of fields describing one JSON object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: SchemaId,
    #[serde(default = "default_project")]
    pub project_id: ProjectId,
    #[serde(default)]
    pub name: String,
    /// Bumped by the store whenever the definition changes.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(id: &str, fields: Vec<SchemaField>) -> Self {
        Self {
            id: id.to_string(),
            project_id: default_project(),
            name: id.to_string(),
            version: 0,
            fields,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EndpointId,
    #[serde(default = "default_project")]
    pub project_id: ProjectId,
    pub method: HttpMethod,
    pub path: String,
    pub schema_id: SchemaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper_id: Option<WrapperId>,
    /// Success status code; 200 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// A JSON envelope with a single placeholder where the payload goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseWrapper {
    pub id: WrapperId,
    #[serde(default = "default_project")]
    pub project_id: ProjectId,
    #[serde(default)]
    pub name: String,
    pub json: String,
}

/// Read interface over persisted definitions. Lookups are synchronous and
/// return immutable snapshots.
pub trait MockStore: Send + Sync {
    fn get_endpoint(
        &self,
        project_id: &str,
        method: HttpMethod,
        path: &str,
    ) -> Option<Arc<Endpoint>>;

    fn get_schema(&self, schema_id: &str) -> Option<Arc<Schema>>;

    fn get_response_wrapper(&self, wrapper_id: &str) -> Option<Arc<ResponseWrapper>>;

    /// Current version of a schema, used to validate cached resolutions.
    fn schema_version(&self, schema_id: &str) -> Option<u64> {
        self.get_schema(schema_id).map(|s| s.version)
    }
}

/// An already-authorized request for mock data.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub project_id: ProjectId,
    pub method: HttpMethod,
    pub path: String,
    /// Fixed seed for reproducible output; fresh entropy when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[async_trait]
pub trait MockPort: Send + Sync {
    async fn handle(&self, request: MockRequest) -> Result<MockResponse, MockError>;
}
