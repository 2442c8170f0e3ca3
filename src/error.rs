use thiserror::Error;

/// Errors that can occur while loading categories or searching recipes
#[derive(Error, Debug)]
pub enum SearchError {
    /// Missing credential or invalid settings; fatal, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single upstream source failed (HTTP status, payload error code or transport)
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// No category id was available to query
    #[error("No category available to search")]
    NoCategory,

    /// The operation was superseded or aborted by its cancellation token
    #[error("Search was cancelled")]
    Cancelled,

    /// Failed to load layered configuration
    #[error("Configuration load error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl SearchError {
    pub fn upstream(message: impl Into<String>) -> Self {
        SearchError::Upstream {
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }

    /// Single message shown to the user when a search fails as a whole
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Upstream { message } => {
                format!("Could not load recipes. Please try again later. ({})", message)
            }
            SearchError::NoCategory => "Please select a category to search.".to_string(),
            SearchError::Configuration(_) | SearchError::ConfigError(_) => {
                "The recipe service is not configured.".to_string()
            }
            SearchError::Cancelled => String::new(),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_is_displayed() {
        let err = SearchError::upstream("wrong_parameter");
        assert_eq!(err.to_string(), "Upstream error: wrong_parameter");
        assert!(err.user_message().contains("wrong_parameter"));
    }

    #[test]
    fn test_cancelled_has_no_user_message() {
        let err = SearchError::Cancelled;
        assert!(err.is_cancelled());
        assert!(err.user_message().is_empty());
        assert!(!SearchError::NoCategory.is_cancelled());
    }
}
