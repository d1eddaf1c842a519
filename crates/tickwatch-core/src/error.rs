use std::path::PathBuf;

use thiserror::Error;

/// Validation errors raised while building domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter, digit or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of yahoo, google, marketwatch, boursorama")]
    InvalidSource { value: String },

    #[error("setting '{name}' has invalid value '{value}'")]
    InvalidSetting { name: &'static str, value: String },
}

/// Errors raised while loading the instrument configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Classification of a failed price lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    SourceUnavailable,
    NoDataFound,
    ParseFailure,
    AllSourcesExhausted,
}

/// Recoverable price acquisition failure.
///
/// None of these variants is fatal: every one of them degrades to a missing
/// price for the affected symbol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{origin} unavailable: {reason}")]
    SourceUnavailable { origin: &'static str, reason: String },

    #[error("{origin} returned no price data: {reason}")]
    NoDataFound { origin: &'static str, reason: String },

    #[error("{origin} price text '{text}' is not numeric")]
    ParseFailure { origin: &'static str, text: String },

    #[error("all {attempts} source attempt(s) failed for {symbol}")]
    AllSourcesExhausted { symbol: String, attempts: usize },
}

impl FetchError {
    pub fn unavailable(origin: &'static str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            origin,
            reason: reason.into(),
        }
    }

    pub fn no_data(origin: &'static str, reason: impl Into<String>) -> Self {
        Self::NoDataFound {
            origin,
            reason: reason.into(),
        }
    }

    pub fn parse_failure(origin: &'static str, text: impl Into<String>) -> Self {
        Self::ParseFailure {
            origin,
            text: text.into(),
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::SourceUnavailable { .. } => FetchErrorKind::SourceUnavailable,
            Self::NoDataFound { .. } => FetchErrorKind::NoDataFound,
            Self::ParseFailure { .. } => FetchErrorKind::ParseFailure,
            Self::AllSourcesExhausted { .. } => FetchErrorKind::AllSourcesExhausted,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind() {
            FetchErrorKind::SourceUnavailable => "fetch.source_unavailable",
            FetchErrorKind::NoDataFound => "fetch.no_data_found",
            FetchErrorKind::ParseFailure => "fetch.parse_failure",
            FetchErrorKind::AllSourcesExhausted => "fetch.all_sources_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_codes_follow_kind() {
        let error = FetchError::unavailable("marketwatch", "status 503");
        assert_eq!(error.kind(), FetchErrorKind::SourceUnavailable);
        assert_eq!(error.code(), "fetch.source_unavailable");
        assert_eq!(error.to_string(), "marketwatch unavailable: status 503");

        let error = FetchError::parse_failure("boursorama", "n/a");
        assert_eq!(error.code(), "fetch.parse_failure");
    }
}
