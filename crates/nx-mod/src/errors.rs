use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid title id: {value}")]
    #[diagnostic(
        code(title::invalid_id),
        help("Title ids are 16 hexadecimal digits, e.g. 0100000000001234")
    )]
    InvalidTitleId { value: String },

    #[error("Base container not found: {path}")]
    #[diagnostic(
        code(container::not_found),
        help("Pass the path to the title's base content container file")
    )]
    BaseContainerNotFound { path: PathBuf },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn invalid_title_id(value: impl Into<String>) -> Self {
        Self::InvalidTitleId {
            value: value.into(),
        }
    }

    pub fn base_container_not_found(path: PathBuf) -> Self {
        Self::BaseContainerNotFound { path }
    }
}
