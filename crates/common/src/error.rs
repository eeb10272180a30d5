use thiserror::Error;

/// Title shown for every import rejection, whatever the underlying cause.
pub const INVALID_BLUEPRINT_TITLE: &str = "Not a valid blueprint";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Mutually exclusive customizations: {0}")]
    MutuallyExclusiveCustomization(String),

    #[error("Unrecognized blueprint dialect: {0}")]
    UnrecognizedDialect(String),

    #[error("Subscription precondition failed: {0}")]
    SubscriptionPrecondition(String),

    #[error("Unknown image type: {0}")]
    UnknownImageType(String),

    #[error("Invalid upload options: {0}")]
    InvalidUploadOptions(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Collaborator request failed: {0}")]
    Collaborator(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error rejects a blueprint import as a whole.
    pub fn is_import_rejection(&self) -> bool {
        matches!(
            self,
            Error::MalformedDocument(_)
                | Error::MutuallyExclusiveCustomization(_)
                | Error::UnrecognizedDialect(_)
        )
    }

    /// Short, user-facing title for this error
    pub fn title(&self) -> &'static str {
        match self {
            Error::MalformedDocument(_)
            | Error::MutuallyExclusiveCustomization(_)
            | Error::UnrecognizedDialect(_) => INVALID_BLUEPRINT_TITLE,
            Error::SubscriptionPrecondition(_) => "Registration is incomplete",
            Error::UnknownImageType(_) | Error::InvalidUploadOptions(_) => {
                "Blueprint cannot be edited"
            }
            Error::Validation(_) => "Blueprint is invalid",
            Error::Collaborator(_) => "Request failed",
            Error::JsonSerialization(_) | Error::Other(_) => "Unexpected error",
        }
    }

    /// Longer description derived from the underlying payload
    pub fn detail(&self) -> String {
        match self {
            Error::MalformedDocument(d)
            | Error::MutuallyExclusiveCustomization(d)
            | Error::UnrecognizedDialect(d)
            | Error::SubscriptionPrecondition(d)
            | Error::UnknownImageType(d)
            | Error::InvalidUploadOptions(d)
            | Error::Validation(d)
            | Error::Collaborator(d) => d.clone(),
            Error::JsonSerialization(e) => e.to_string(),
            Error::Other(e) => format!("{:#}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
