use crate::logging::codes::{self, Code};
use crate::registry::{CompilationReport, RegistryError};

/// Pipeline processing errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file extension: expected .otc.toml, found {path}")]
    InvalidExtension { path: String },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("File is empty: {path}")]
    EmptyFile { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("Script rejected: {0}")]
    Script(#[from] RegistryError),

    #[error("Mapping '{id}' failed to compile with {} error(s)", failure_count(.reports))]
    Compilation {
        id: String,
        reports: Vec<CompilationReport>,
    },
}

fn failure_count(reports: &[CompilationReport]) -> usize {
    reports.iter().filter(|r| !r.success).count()
}

impl PipelineError {
    pub fn io(path: &str, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            Self::InvalidExtension { .. } => codes::file_processing::INVALID_EXTENSION,
            Self::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            Self::EmptyFile { .. } => codes::file_processing::EMPTY_FILE,
            Self::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            Self::Io { .. } => codes::file_processing::IO_ERROR,
            Self::Script(e) => e.error_code(),
            Self::Compilation { .. } => codes::registry::INVALID_SCRIPT,
        }
    }

    /// Failure reports of a script that parsed but did not compile
    pub fn reports(&self) -> &[CompilationReport] {
        match self {
            Self::Compilation { reports, .. } => reports,
            _ => &[],
        }
    }
}
