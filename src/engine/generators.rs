//! Generator registry.
//!
//! A closed mapping from generator id to a descriptor carrying the output
//! kind, the accepted parameters and a pure function over a caller-supplied
//! random source. Unknown ids and bad parameters fail instead of falling
//! back to some default value.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use fake::faker::address::en::{CityName, CountryName, PostCode, StateAbbr, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name, Title};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use super::FieldPath;
use crate::domain::MockError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeneratorError {
    #[error("Unknown generator '{generator}'")]
    Unknown { generator: String },

    #[error("Invalid parameters for generator '{generator}': {reason}")]
    InvalidParams { generator: String, reason: String },
}

impl GeneratorError {
    /// Attach the field location the failing generator was bound to.
    pub fn at(self, path: &FieldPath) -> MockError {
        match self {
            GeneratorError::Unknown { generator } => MockError::UnknownGenerator {
                generator,
                path: path.to_string(),
            },
            GeneratorError::InvalidParams { generator, reason } => {
                MockError::InvalidGeneratorParams {
                    generator,
                    reason,
                    path: path.to_string(),
                }
            }
        }
    }
}

/// JSON type a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    /// ISO-8601 date or date-time string.
    Date,
    /// Whatever the configuration supplies (enum, constant).
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Integer,
    Number,
    String,
    List,
    Any,
}

impl ParamKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::Integer => value.is_i64(),
            ParamKind::Number => value.is_number(),
            ParamKind::String => value.is_string(),
            ParamKind::List => value.is_array(),
            ParamKind::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

const fn optional(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
    }
}

const fn required(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
    }
}

/// Parameters that already passed [`GeneratorDescriptor::validate`].
pub struct GeneratorParams<'a>(&'a Map<String, Value>);

impl<'a> GeneratorParams<'a> {
    fn int(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    fn uint(&self, name: &str, default: usize) -> Result<usize, String> {
        match self.0.get(name) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| format!("'{}' must be a non-negative integer", name)),
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    fn string(&self, name: &str) -> Option<&'a str> {
        self.0.get(name).and_then(Value::as_str)
    }

    fn list(&self, name: &str) -> Option<&'a Vec<Value>> {
        self.0.get(name).and_then(Value::as_array)
    }

    fn value(&self, name: &str) -> Option<&'a Value> {
        self.0.get(name)
    }
}

pub type GenerateFn = fn(&GeneratorParams<'_>, &mut dyn RngCore) -> Result<Value, String>;

pub struct GeneratorDescriptor {
    pub id: &'static str,
    pub output: PrimitiveKind,
    pub params: &'static [ParamSpec],
    generate: GenerateFn,
}

impl GeneratorDescriptor {
    /// Check parameter names, presence and JSON types against the declaration.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<(), String> {
        for name in params.keys() {
            if !self.params.iter().any(|p| p.name == name) {
                return Err(format!("unknown parameter '{}'", name));
            }
        }
        for spec in self.params {
            match params.get(spec.name) {
                None if spec.required => {
                    return Err(format!("missing required parameter '{}'", spec.name))
                }
                Some(value) if !spec.kind.accepts(value) => {
                    return Err(format!(
                        "parameter '{}' must be of type {:?}",
                        spec.name, spec.kind
                    ))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Serializable view of a descriptor for listing.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorInfo {
    pub id: &'static str,
    pub output: PrimitiveKind,
    pub params: Vec<ParamSpec>,
}

pub struct GeneratorRegistry {
    generators: BTreeMap<&'static str, GeneratorDescriptor>,
}

impl GeneratorRegistry {
    /// Registry populated with every built-in generator.
    pub fn new() -> Self {
        let mut registry = Self {
            generators: BTreeMap::new(),
        };
        for descriptor in builtin_generators() {
            registry.generators.insert(descriptor.id, descriptor);
        }
        registry
    }

    pub fn contains(&self, id: &str) -> bool {
        self.generators.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&GeneratorDescriptor> {
        self.generators.get(id)
    }

    pub fn list(&self) -> Vec<GeneratorInfo> {
        self.generators
            .values()
            .map(|d| GeneratorInfo {
                id: d.id,
                output: d.output,
                params: d.params.to_vec(),
            })
            .collect()
    }

    /// Produce one value. Output depends only on the params and the state of `rng`.
    pub fn generate(
        &self,
        id: &str,
        params: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GeneratorError> {
        let descriptor = self.get(id).ok_or_else(|| GeneratorError::Unknown {
            generator: id.to_string(),
        })?;
        let invalid = |reason: String| GeneratorError::InvalidParams {
            generator: id.to_string(),
            reason,
        };
        descriptor.validate(params).map_err(invalid)?;
        (descriptor.generate)(&GeneratorParams(params), rng).map_err(invalid)
    }

    /// Like [`generate`](Self::generate) but owns its random source: a fixed
    /// seed gives reproducible output, `None` draws from entropy.
    pub fn generate_seeded(
        &self,
        id: &str,
        params: &Map<String, Value>,
        seed: Option<u64>,
    ) -> Result<Value, GeneratorError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate(id, params, &mut rng)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! faker_string {
    ($id:literal, $faker:expr) => {
        GeneratorDescriptor {
            id: $id,
            output: PrimitiveKind::String,
            params: &[],
            generate: |_, rng| Ok(json!($faker.fake_with_rng::<String, _>(rng))),
        }
    };
}

const INTEGER_PARAMS: &[ParamSpec] = &[
    optional("min", ParamKind::Integer),
    optional("max", ParamKind::Integer),
];
const FLOAT_PARAMS: &[ParamSpec] = &[
    optional("min", ParamKind::Number),
    optional("max", ParamKind::Number),
    optional("precision", ParamKind::Integer),
];
const BOOLEAN_PARAMS: &[ParamSpec] = &[optional("ratio", ParamKind::Number)];
const SENTENCE_PARAMS: &[ParamSpec] = &[
    optional("min_words", ParamKind::Integer),
    optional("max_words", ParamKind::Integer),
];
const PARAGRAPH_PARAMS: &[ParamSpec] = &[
    optional("min_sentences", ParamKind::Integer),
    optional("max_sentences", ParamKind::Integer),
];
const DATE_PARAMS: &[ParamSpec] = &[
    optional("from", ParamKind::String),
    optional("to", ParamKind::String),
];
const PATTERN_PARAMS: &[ParamSpec] = &[required("pattern", ParamKind::String)];
const ENUM_PARAMS: &[ParamSpec] = &[required("values", ParamKind::List)];
const CONSTANT_PARAMS: &[ParamSpec] = &[required("value", ParamKind::Any)];

/// Upper bound for word and sentence counts of the text generators.
pub const MAX_TEXT_COUNT: usize = 1000;

fn builtin_generators() -> Vec<GeneratorDescriptor> {
    vec![
        // Numbers
        GeneratorDescriptor {
            id: "integer",
            output: PrimitiveKind::Integer,
            params: INTEGER_PARAMS,
            generate: gen_integer,
        },
        GeneratorDescriptor {
            id: "float",
            output: PrimitiveKind::Number,
            params: FLOAT_PARAMS,
            generate: gen_float,
        },
        GeneratorDescriptor {
            id: "boolean",
            output: PrimitiveKind::Boolean,
            params: BOOLEAN_PARAMS,
            generate: gen_boolean,
        },
        // Identifiers
        GeneratorDescriptor {
            id: "uuid",
            output: PrimitiveKind::String,
            params: &[],
            generate: |_, rng| {
                let bytes: [u8; 16] = rng.gen();
                Ok(json!(uuid::Builder::from_random_bytes(bytes)
                    .into_uuid()
                    .to_string()))
            },
        },
        // Personal
        faker_string!("firstName", FirstName()),
        faker_string!("lastName", LastName()),
        faker_string!("fullName", Name()),
        faker_string!("title", Title()),
        faker_string!("username", Username()),
        // Contact
        faker_string!("email", SafeEmail()),
        faker_string!("phone", PhoneNumber()),
        // Address
        faker_string!("streetAddress", StreetName()),
        faker_string!("city", CityName()),
        faker_string!("state", StateAbbr()),
        faker_string!("country", CountryName()),
        faker_string!("postalCode", PostCode()),
        faker_string!("companyName", CompanyName()),
        // Text
        faker_string!("word", Word()),
        GeneratorDescriptor {
            id: "sentence",
            output: PrimitiveKind::String,
            params: SENTENCE_PARAMS,
            generate: |params, rng| {
                let (min, max) = count_range(params, "min_words", "max_words", 3, 10)?;
                Ok(json!(Sentence(min..max + 1).fake_with_rng::<String, _>(rng)))
            },
        },
        GeneratorDescriptor {
            id: "paragraph",
            output: PrimitiveKind::String,
            params: PARAGRAPH_PARAMS,
            generate: |params, rng| {
                let (min, max) = count_range(params, "min_sentences", "max_sentences", 1, 3)?;
                Ok(json!(Paragraph(min..max + 1).fake_with_rng::<String, _>(rng)))
            },
        },
        // Dates
        GeneratorDescriptor {
            id: "date",
            output: PrimitiveKind::Date,
            params: DATE_PARAMS,
            generate: gen_date,
        },
        GeneratorDescriptor {
            id: "dateTime",
            output: PrimitiveKind::Date,
            params: DATE_PARAMS,
            generate: gen_date_time,
        },
        // Special
        GeneratorDescriptor {
            id: "pattern",
            output: PrimitiveKind::String,
            params: PATTERN_PARAMS,
            generate: |params, rng| {
                let pattern = params.string("pattern").unwrap_or_default();
                Ok(json!(generate_from_pattern(pattern, rng)))
            },
        },
        GeneratorDescriptor {
            id: "enum",
            output: PrimitiveKind::Any,
            params: ENUM_PARAMS,
            generate: |params, rng| {
                let values = params.list("values").map(Vec::as_slice).unwrap_or_default();
                values
                    .choose(rng)
                    .cloned()
                    .ok_or_else(|| "'values' must not be empty".to_string())
            },
        },
        GeneratorDescriptor {
            id: "constant",
            output: PrimitiveKind::Any,
            params: CONSTANT_PARAMS,
            generate: |params, _| Ok(params.value("value").cloned().unwrap_or(Value::Null)),
        },
    ]
}

fn gen_integer(params: &GeneratorParams<'_>, rng: &mut dyn RngCore) -> Result<Value, String> {
    let min = params.int("min").unwrap_or(0);
    let max = params.int("max").unwrap_or(100);
    if min > max {
        return Err(format!("min ({}) must not exceed max ({})", min, max));
    }
    Ok(json!(rng.gen_range(min..=max)))
}

fn gen_float(params: &GeneratorParams<'_>, rng: &mut dyn RngCore) -> Result<Value, String> {
    let min = params.number("min").unwrap_or(0.0);
    let max = params.number("max").unwrap_or(100.0);
    if !min.is_finite() || !max.is_finite() {
        return Err("min and max must be finite".to_string());
    }
    if min > max {
        return Err(format!("min ({}) must not exceed max ({})", min, max));
    }
    if !(max - min).is_finite() {
        return Err(format!("range {}..{} is too wide", min, max));
    }
    let mut value = rng.gen_range(min..=max);
    if let Some(precision) = params.int("precision") {
        if !(0..=12).contains(&precision) {
            return Err(format!("precision ({}) must be between 0 and 12", precision));
        }
        let factor = 10f64.powi(precision as i32);
        value = ((value * factor).round() / factor).clamp(min, max);
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| format!("generated non-finite number {}", value))
}

fn gen_boolean(params: &GeneratorParams<'_>, rng: &mut dyn RngCore) -> Result<Value, String> {
    let ratio = params.number("ratio").unwrap_or(0.5);
    if !(0.0..=1.0).contains(&ratio) {
        return Err(format!("ratio ({}) must be between 0 and 1", ratio));
    }
    Ok(json!(rng.gen_bool(ratio)))
}

fn count_range(
    params: &GeneratorParams<'_>,
    min_key: &str,
    max_key: &str,
    default_min: usize,
    default_max: usize,
) -> Result<(usize, usize), String> {
    let min = params.uint(min_key, default_min)?;
    let max = params.uint(max_key, default_max.max(min))?;
    if max > MAX_TEXT_COUNT {
        return Err(format!(
            "{} ({}) must not exceed {}",
            max_key, max, MAX_TEXT_COUNT
        ));
    }
    if min > max {
        return Err(format!(
            "{} ({}) must not exceed {} ({})",
            min_key, min, max_key, max
        ));
    }
    Ok((min, max))
}

fn gen_date(params: &GeneratorParams<'_>, rng: &mut dyn RngCore) -> Result<Value, String> {
    let parse = |key: &str, default: &str| {
        let raw = params.string(key).unwrap_or(default);
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", key, e))
    };
    let from = parse("from", "2000-01-01")?;
    let to = parse("to", "2030-12-31")?;
    if from > to {
        return Err(format!("from ({}) must not be after to ({})", from, to));
    }
    let offset = rng.gen_range(0..=(to - from).num_days());
    let date = from + chrono::Duration::days(offset);
    Ok(json!(date.format("%Y-%m-%d").to_string()))
}

fn gen_date_time(params: &GeneratorParams<'_>, rng: &mut dyn RngCore) -> Result<Value, String> {
    let parse = |key: &str, default: &str| {
        let raw = params.string(key).unwrap_or(default);
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("'{}' is not an RFC 3339 timestamp: {}", key, e))
    };
    let from = parse("from", "2000-01-01T00:00:00Z")?;
    let to = parse("to", "2030-12-31T23:59:59Z")?;
    if from > to {
        return Err(format!("from ({}) must not be after to ({})", from, to));
    }
    let secs = rng.gen_range(from.timestamp()..=to.timestamp());
    let generated = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| format!("timestamp {} out of range", secs))?;
    Ok(json!(generated.to_rfc3339_opts(SecondsFormat::Secs, true)))
}

/// `#` becomes a digit, `?` a lowercase letter, `*` either; everything else is copied.
fn generate_from_pattern(pattern: &str, rng: &mut dyn RngCore) -> String {
    let mut result = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '#' => result.push(char::from(b'0' + rng.gen_range(0..10u8))),
            '?' => result.push(char::from(rng.gen_range(b'a'..=b'z'))),
            '*' => {
                if rng.gen_bool(0.5) {
                    result.push(char::from(b'0' + rng.gen_range(0..10u8)))
                } else {
                    result.push(char::from(rng.gen_range(b'a'..=b'z')))
                }
            }
            _ => result.push(c),
        }
    }
    result
}
