use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectsError {
    #[error("Invalid UUID.")]
    NotFound,

    #[error("{message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ProjectsError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProjectsError::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ProjectsError::Storage {
            message: message.into(),
        }
    }
}

impl From<diesel::result::Error> for ProjectsError {
    fn from(err: diesel::result::Error) -> Self {
        ProjectsError::Storage {
            message: format!("Database error: {}", err),
        }
    }
}

impl From<std::io::Error> for ProjectsError {
    fn from(err: std::io::Error) -> Self {
        ProjectsError::Config {
            message: err.to_string(),
        }
    }
}
