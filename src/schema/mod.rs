//! Declarative collection schemas.
//!
//! A `ValidatedCollectionSpec` describes the structural rule a document
//! collection enforces: which fields are required, the BSON type of each
//! declared field, and optional length/size bounds. The spec is built once at
//! startup through `SpecBuilder`, then translated into MongoDB's `$jsonSchema`
//! validator syntax by `to_json_schema` and applied by [`bootstrap`].
//!
//! `check` evaluates a document against the same rule locally, which lets
//! callers reject bad records before a round trip and lets tests exercise the
//! rule without a running store.

pub mod bootstrap;
pub mod users;

use std::collections::HashSet;
use std::fmt;

use mongodb::bson::{doc, Bson, Document};

pub use bootstrap::{
    bootstrap_collection, ensure_validated_collection, AdminCommandRunner, CollectionCreationError,
    CollectionOutcome, CommandFailure,
};
pub use users::users_collection_spec;

/// BSON type tags supported by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsonType {
    String,
    Bool,
    Array,
    Date,
}

impl BsonType {
    /// The `bsonType` alias understood by MongoDB.
    pub fn as_str(self) -> &'static str {
        match self {
            BsonType::String => "string",
            BsonType::Bool => "bool",
            BsonType::Array => "array",
            BsonType::Date => "date",
        }
    }

    fn matches(self, value: &Bson) -> bool {
        matches!(
            (self, value),
            (BsonType::String, Bson::String(_))
                | (BsonType::Bool, Bson::Boolean(_))
                | (BsonType::Array, Bson::Array(_))
                | (BsonType::Date, Bson::DateTime(_))
        )
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the BSON type of a value, as MongoDB reports it.
fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::DateTime(_) => "date",
        Bson::ObjectId(_) => "objectId",
        Bson::Decimal128(_) => "decimal",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        _ => "other",
    }
}

/// Type tag and bounds for one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConstraint {
    bson_type: BsonType,
    min_length: Option<u32>,
    max_length: Option<u32>,
    max_items: Option<u32>,
    description: Option<String>,
}

impl FieldConstraint {
    fn of(bson_type: BsonType) -> Self {
        Self {
            bson_type,
            min_length: None,
            max_length: None,
            max_items: None,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::of(BsonType::String)
    }

    pub fn bool() -> Self {
        Self::of(BsonType::Bool)
    }

    pub fn array() -> Self {
        Self::of(BsonType::Array)
    }

    pub fn date() -> Self {
        Self::of(BsonType::Date)
    }

    pub fn min_length(mut self, min: u32) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: u32) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn max_items(mut self, max: u32) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn bson_type(&self) -> BsonType {
        self.bson_type
    }

    pub fn min_length_bound(&self) -> Option<u32> {
        self.min_length
    }

    pub fn max_length_bound(&self) -> Option<u32> {
        self.max_length
    }

    pub fn max_items_bound(&self) -> Option<u32> {
        self.max_items
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn to_document(&self) -> Document {
        let mut rule = doc! { "bsonType": self.bson_type.as_str() };
        if let Some(min) = self.min_length {
            rule.insert("minLength", bound_to_bson(min));
        }
        if let Some(max) = self.max_length {
            rule.insert("maxLength", bound_to_bson(max));
        }
        if let Some(max) = self.max_items {
            rule.insert("maxItems", bound_to_bson(max));
        }
        if let Some(description) = &self.description {
            rule.insert("description", description.as_str());
        }
        rule
    }

    fn check(&self, field: &str, value: &Bson, violations: &mut Vec<Violation>) {
        if !self.bson_type.matches(value) {
            violations.push(Violation::TypeMismatch {
                field: field.to_string(),
                expected: self.bson_type,
                found: bson_type_name(value),
            });
            return;
        }

        match value {
            Bson::String(s) => {
                // $jsonSchema counts code points, not bytes
                let len = s.chars().count();
                if let Some(min) = self.min_length {
                    if len < min as usize {
                        violations.push(Violation::TooShort {
                            field: field.to_string(),
                            min,
                            actual: len,
                        });
                    }
                }
                if let Some(max) = self.max_length {
                    if len > max as usize {
                        violations.push(Violation::TooLong {
                            field: field.to_string(),
                            max,
                            actual: len,
                        });
                    }
                }
            }
            Bson::Array(items) => {
                if let Some(max) = self.max_items {
                    if items.len() > max as usize {
                        violations.push(Violation::TooManyItems {
                            field: field.to_string(),
                            max,
                            actual: items.len(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

fn bound_to_bson(bound: u32) -> Bson {
    // Bounds above i32::MAX are meaningless for a document capped at 16 MiB
    Bson::Int32(i32::try_from(bound).unwrap_or(i32::MAX))
}

/// A single reason a document fails the collection rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingField(String),
    TypeMismatch {
        field: String,
        expected: BsonType,
        found: &'static str,
    },
    TooShort {
        field: String,
        min: u32,
        actual: usize,
    },
    TooLong {
        field: String,
        max: u32,
        actual: usize,
    },
    TooManyItems {
        field: String,
        max: u32,
        actual: usize,
    },
    UnexpectedField(String),
}

impl Violation {
    /// The field the violation is about.
    pub fn field(&self) -> &str {
        match self {
            Violation::MissingField(field) | Violation::UnexpectedField(field) => field,
            Violation::TypeMismatch { field, .. }
            | Violation::TooShort { field, .. }
            | Violation::TooLong { field, .. }
            | Violation::TooManyItems { field, .. } => field,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingField(field) => write!(f, "'{field}' is required"),
            Violation::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "'{field}' must be {expected}, found {found}"),
            Violation::TooShort { field, min, actual } => {
                write!(f, "'{field}' needs at least {min} characters, has {actual}")
            }
            Violation::TooLong { field, max, actual } => {
                write!(f, "'{field}' allows at most {max} characters, has {actual}")
            }
            Violation::TooManyItems { field, max, actual } => {
                write!(f, "'{field}' allows at most {max} items, has {actual}")
            }
            Violation::UnexpectedField(field) => write!(f, "'{field}' is not a declared field"),
        }
    }
}

/// Errors raised while building a collection spec.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Collection name must not be empty")]
    EmptyName,

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Required field '{0}' has no declared constraint")]
    UndeclaredRequired(String),

    #[error("Field '{field}' has minLength {min} greater than maxLength {max}")]
    InvertedBounds { field: String, min: u32, max: u32 },

    #[error("Field '{field}' is {bson_type} and cannot carry {bound}")]
    BoundNotApplicable {
        field: String,
        bson_type: BsonType,
        bound: &'static str,
    },
}

/// Immutable description of a validated collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollectionSpec {
    name: String,
    required: Vec<String>,
    properties: Vec<(String, FieldConstraint)>,
    additional_properties: bool,
}

impl ValidatedCollectionSpec {
    pub fn builder(name: impl Into<String>) -> SpecBuilder {
        SpecBuilder {
            name: name.into(),
            required: Vec::new(),
            properties: Vec::new(),
            additional_properties: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn additional_properties(&self) -> bool {
        self.additional_properties
    }

    /// Looks up the constraint declared for `field`.
    pub fn constraint(&self, field: &str) -> Option<&FieldConstraint> {
        self.properties
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, constraint)| constraint)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// Translates the spec into the body of a `$jsonSchema` validator.
    pub fn to_json_schema(&self) -> Document {
        let mut properties = Document::new();
        for (name, constraint) in &self.properties {
            properties.insert(name.clone(), constraint.to_document());
        }

        doc! {
            "bsonType": "object",
            "required": self.required.clone(),
            "additionalProperties": self.additional_properties,
            "properties": properties,
        }
    }

    /// The `create` administrative command that installs this collection.
    pub fn create_command(&self) -> Document {
        doc! {
            "create": self.name.as_str(),
            "validator": { "$jsonSchema": self.to_json_schema() },
        }
    }

    /// Evaluates `record` against the rule and collects every violation.
    pub fn check(&self, record: &Document) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();

        for field in &self.required {
            if !record.contains_key(field) {
                violations.push(Violation::MissingField(field.clone()));
            }
        }

        for (field, value) in record {
            match self.constraint(field) {
                Some(constraint) => constraint.check(field, value, &mut violations),
                None if !self.additional_properties => {
                    violations.push(Violation::UnexpectedField(field.clone()));
                }
                None => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Builder for [`ValidatedCollectionSpec`]; `build` enforces consistency.
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    name: String,
    required: Vec<String>,
    properties: Vec<(String, FieldConstraint)>,
    additional_properties: bool,
}

impl SpecBuilder {
    pub fn require<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn field(mut self, name: impl Into<String>, constraint: FieldConstraint) -> Self {
        self.properties.push((name.into(), constraint));
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    pub fn build(self) -> Result<ValidatedCollectionSpec, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let mut seen = HashSet::new();
        for (name, constraint) in &self.properties {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField(name.clone()));
            }
            validate_bounds(name, constraint)?;
        }

        let mut required = Vec::with_capacity(self.required.len());
        for field in self.required {
            if !seen.contains(field.as_str()) {
                return Err(SchemaError::UndeclaredRequired(field));
            }
            if !required.contains(&field) {
                required.push(field);
            }
        }

        Ok(ValidatedCollectionSpec {
            name: self.name,
            required,
            properties: self.properties,
            additional_properties: self.additional_properties,
        })
    }
}

fn validate_bounds(field: &str, constraint: &FieldConstraint) -> Result<(), SchemaError> {
    let not_applicable = |bound| SchemaError::BoundNotApplicable {
        field: field.to_string(),
        bson_type: constraint.bson_type,
        bound,
    };

    if constraint.bson_type != BsonType::String {
        if constraint.min_length.is_some() {
            return Err(not_applicable("minLength"));
        }
        if constraint.max_length.is_some() {
            return Err(not_applicable("maxLength"));
        }
    }
    if constraint.bson_type != BsonType::Array && constraint.max_items.is_some() {
        return Err(not_applicable("maxItems"));
    }
    if let (Some(min), Some(max)) = (constraint.min_length, constraint.max_length) {
        if min > max {
            return Err(SchemaError::InvertedBounds {
                field: field.to_string(),
                min,
                max,
            });
        }
    }
    Ok(())
}
