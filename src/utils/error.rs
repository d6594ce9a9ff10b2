use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Port or module '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("'{name}' references undeclared '{reference}'")]
    UnresolvedReference { name: String, reference: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidArgument {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cyclic module dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Registry,
    Dependency,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BuildError {
    pub fn invalid(field: &str, value: &str, reason: impl Into<String>) -> Self {
        BuildError::InvalidArgument {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BuildError::DuplicateName { .. }
            | BuildError::UnresolvedReference { .. }
            | BuildError::InvalidArgument { .. } => ErrorCategory::Registry,
            BuildError::CyclicDependency { .. } => ErrorCategory::Dependency,
            BuildError::ConfigError { .. } => ErrorCategory::Configuration,
            BuildError::IoError(_) | BuildError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// Every build error aborts the build; severity only picks the exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Registry | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Dependency => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BuildError::DuplicateName { name } => {
                format!("The name '{}' is used by more than one port or module", name)
            }
            BuildError::UnresolvedReference { name, reference } => format!(
                "'{}' needs '{}', which has not been declared",
                name, reference
            ),
            BuildError::InvalidArgument { field, reason, .. } => {
                format!("Bad value for {}: {}", field, reason)
            }
            BuildError::CyclicDependency { cycle } => {
                format!("Modules depend on each other in a loop: {}", cycle.join(" -> "))
            }
            BuildError::ConfigError { message, .. } => {
                format!("The build file could not be read: {}", message)
            }
            BuildError::IoError(e) => format!("File system error: {}", e),
            BuildError::SerializationError(e) => format!("Could not write the manifest: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BuildError::DuplicateName { .. } => "Give every port and module a unique name",
            BuildError::UnresolvedReference { .. } => {
                "Declare lower asyn ports in [[lower_ports]] and FINS ports before anything that uses them"
            }
            BuildError::InvalidArgument { .. } => {
                "Use non-empty names and addresses without spaces or quotes"
            }
            BuildError::CyclicDependency { .. } => "Remove one of the dependency edges in the loop",
            BuildError::ConfigError { .. } => "Check the TOML syntax and the field names",
            BuildError::IoError(_) => "Check that the output directory is writable",
            BuildError::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
