use serde::Serialize;

/// All application errors, categorized by domain.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ── Core ──
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Price history unavailable: {0}")]
    DataUnavailable(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    // ── Data / Import ──
    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("Failed to write file: {0}")]
    FileWrite(String),

    #[error("CSV parse error at row {row}: {message}")]
    CsvParseError { row: usize, message: String },

    // ── Configuration ──
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Serialization ──
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Wrap any error into `DataUnavailable` with a short context prefix.
    ///
    /// Providers use this so every failure to obtain a usable series reaches the
    /// caller as the same kind, whatever actually went wrong underneath.
    pub fn unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::DataUnavailable(format!("{}: {}", context, err))
    }
}

/// Serializable error response for JSON output.
#[derive(Debug, Serialize, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::DataUnavailable(_) => "DATA_UNAVAILABLE",
            AppError::DivisionByZero(_) => "DIVISION_BY_ZERO",
            AppError::FileRead(_) => "FILE_READ",
            AppError::FileWrite(_) => "FILE_WRITE",
            AppError::CsvParseError { .. } => "CSV_PARSE_ERROR",
            AppError::InvalidConfig(_) => "INVALID_CONFIG",
            AppError::Serialization(_) => "SERIALIZATION",
        };
        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let response = ErrorResponse::from(self);
        response.serialize(serializer)
    }
}

// ── Conversions from external errors ──

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileRead(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        let row = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        AppError::CsvParseError {
            row,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::DivisionByZero("nothing bought".into());
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "DIVISION_BY_ZERO");
        assert_eq!(resp.message, "Division by zero: nothing bought");
    }

    #[test]
    fn test_serializes_as_response() {
        let err = AppError::InvalidInput("price must be > 0".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_INPUT");
        assert_eq!(json["message"], "Invalid input: price must be > 0");
    }

    #[test]
    fn test_unavailable_wraps_context() {
        let err = AppError::unavailable("bitcoin", "no such file");
        assert!(matches!(err, AppError::DataUnavailable(ref m) if m == "bitcoin: no such file"));
    }
}
