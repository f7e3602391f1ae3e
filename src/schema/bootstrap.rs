//! Applying a collection spec to a live document store.
//!
//! `ensure_validated_collection` sends a single `create` command carrying the
//! `$jsonSchema` validator and reports what happened as a `Result`. The
//! connection manager calls `bootstrap_collection` instead, which logs the
//! result and folds it into a `CollectionOutcome`: schema bootstrap failures
//! never stop the service and are never retried.
//!
//! A repeated startup makes the `create` fail with `NamespaceExists`. That case
//! is told apart from other failures in the error type, but it is still logged
//! at error level because the store does not say whether the existing
//! collection carries the same validator.

use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::error::ErrorKind;
use mongodb::Database;

use super::ValidatedCollectionSpec;

/// Server error code returned when the target namespace already exists.
pub const NAMESPACE_EXISTS_CODE: i32 = 48;

/// Failure reported by the store for an administrative command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Server error code, absent for client-side or transport failures.
    pub code: Option<i32>,
    pub message: String,
}

impl From<mongodb::error::Error> for CommandFailure {
    fn from(err: mongodb::error::Error) -> Self {
        let code = match err.kind.as_ref() {
            ErrorKind::Command(command) => Some(command.code),
            _ => None,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

/// Surface for running administrative commands against a document store.
#[async_trait]
pub trait AdminCommandRunner: Send + Sync {
    async fn run_admin_command(&self, command: Document) -> Result<(), CommandFailure>;
}

#[async_trait]
impl AdminCommandRunner for Database {
    async fn run_admin_command(&self, command: Document) -> Result<(), CommandFailure> {
        self.run_command(command).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CollectionCreationError {
    #[error("Collection '{collection}' already exists: {message}")]
    AlreadyExists { collection: String, message: String },

    #[error("Error creating {collection} collection: {message}")]
    Failed {
        collection: String,
        code: Option<i32>,
        message: String,
    },
}

impl CollectionCreationError {
    fn from_failure(collection: &str, failure: CommandFailure) -> Self {
        match failure.code {
            Some(NAMESPACE_EXISTS_CODE) => CollectionCreationError::AlreadyExists {
                collection: collection.to_string(),
                message: failure.message,
            },
            code => CollectionCreationError::Failed {
                collection: collection.to_string(),
                code,
                message: failure.message,
            },
        }
    }
}

/// What a bootstrap attempt left behind, after logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Created,
    AlreadyExists,
    Failed(CollectionCreationError),
}

impl CollectionOutcome {
    /// Whether the collection is known to exist after the attempt.
    pub fn collection_exists(&self) -> bool {
        !matches!(self, CollectionOutcome::Failed(_))
    }
}

/// Creates the collection described by `spec` with its validator enforced.
///
/// Issues exactly one `create` command and never retries.
pub async fn ensure_validated_collection<R>(
    store: &R,
    spec: &ValidatedCollectionSpec,
) -> Result<(), CollectionCreationError>
where
    R: AdminCommandRunner + ?Sized,
{
    store
        .run_admin_command(spec.create_command())
        .await
        .map_err(|failure| CollectionCreationError::from_failure(spec.name(), failure))
}

/// Runs `ensure_validated_collection`, logs the result and swallows failures.
pub async fn bootstrap_collection<R>(store: &R, spec: &ValidatedCollectionSpec) -> CollectionOutcome
where
    R: AdminCommandRunner + ?Sized,
{
    match ensure_validated_collection(store, spec).await {
        Ok(()) => {
            tracing::info!(
                collection = %spec.name(),
                "{} collection created with schema validation",
                spec.name()
            );
            CollectionOutcome::Created
        }
        Err(err @ CollectionCreationError::AlreadyExists { .. }) => {
            tracing::error!(
                collection = %spec.name(),
                already_exists = true,
                "Error creating {} collection: {}",
                spec.name(),
                err
            );
            CollectionOutcome::AlreadyExists
        }
        Err(err) => {
            tracing::error!(
                collection = %spec.name(),
                already_exists = false,
                "Error creating {} collection: {}",
                spec.name(),
                err
            );
            CollectionOutcome::Failed(err)
        }
    }
}
