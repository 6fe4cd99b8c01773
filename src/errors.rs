use std::fmt;

#[derive(Debug, Clone)]
pub enum ExporterError {
    DuplicateMetric(String),
    InvalidConfiguration(String),
    InvalidState(String),
    ValueCoercion(String),
    CollectorFailed(String),
    Registry(String),
    Encoding(String),
}

impl ExporterError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExporterError::DuplicateMetric(_) => "E001",
            ExporterError::InvalidConfiguration(_) => "E002",
            ExporterError::InvalidState(_) => "E003",
            ExporterError::ValueCoercion(_) => "E004",
            ExporterError::CollectorFailed(_) => "E005",
            ExporterError::Registry(_) => "E006",
            ExporterError::Encoding(_) => "E007",
        }
    }

    /// Human readable error type name
    pub fn error_type(&self) -> &'static str {
        match self {
            ExporterError::DuplicateMetric(_) => "Duplicate Metric",
            ExporterError::InvalidConfiguration(_) => "Invalid Configuration",
            ExporterError::InvalidState(_) => "Invalid State",
            ExporterError::ValueCoercion(_) => "Value Coercion Error",
            ExporterError::CollectorFailed(_) => "Deferred Collector Failed",
            ExporterError::Registry(_) => "Registry Error",
            ExporterError::Encoding(_) => "Encoding Error",
        }
    }

    /// Error details
    pub fn message(&self) -> &str {
        match self {
            ExporterError::DuplicateMetric(msg) => msg,
            ExporterError::InvalidConfiguration(msg) => msg,
            ExporterError::InvalidState(msg) => msg,
            ExporterError::ValueCoercion(msg) => msg,
            ExporterError::CollectorFailed(msg) => msg,
            ExporterError::Registry(msg) => msg,
            ExporterError::Encoding(msg) => msg,
        }
    }

    /// Coloured output for the server binary
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ExporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ExporterError {}

impl ExporterError {
    pub fn duplicate_metric<T: Into<String>>(msg: T) -> Self {
        ExporterError::DuplicateMetric(msg.into())
    }

    pub fn invalid_configuration<T: Into<String>>(msg: T) -> Self {
        ExporterError::InvalidConfiguration(msg.into())
    }

    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        ExporterError::InvalidState(msg.into())
    }

    pub fn value_coercion<T: Into<String>>(msg: T) -> Self {
        ExporterError::ValueCoercion(msg.into())
    }

    pub fn collector_failed<T: Into<String>>(msg: T) -> Self {
        ExporterError::CollectorFailed(msg.into())
    }

    pub fn registry<T: Into<String>>(msg: T) -> Self {
        ExporterError::Registry(msg.into())
    }

    pub fn encoding<T: Into<String>>(msg: T) -> Self {
        ExporterError::Encoding(msg.into())
    }
}

impl From<prometheus::Error> for ExporterError {
    fn from(err: prometheus::Error) -> Self {
        match err {
            prometheus::Error::AlreadyReg => {
                ExporterError::DuplicateMetric("collector already registered".to_string())
            }
            other => ExporterError::Registry(other.to_string()),
        }
    }
}

impl From<std::string::FromUtf8Error> for ExporterError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ExporterError::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
