//! Typed errors for the ingestion pipeline and the game store.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of a populate run. Extraction and normalization never fail, so
/// every variant belongs to the fetch or persistence stage.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("Failed to parse JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No games found in the fetched data")]
    NoData,
    #[error("Failed to persist games: {0}")]
    Persistence(#[source] StoreError),
}

impl IngestError {
    pub fn fetch(url: &str, source: impl Into<BoxError>) -> Self {
        Self::Fetch {
            url: url.to_string(),
            source: source.into(),
        }
    }

    /// True for the "nothing to ingest" outcome, as opposed to a failed attempt.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A row violated a column constraint (length, not-null, enum).
    #[error("constraint violation on {field}: {message}")]
    Constraint { field: String, message: String },
    #[error("could not decode stored row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn constraint(field: &str, message: impl Into<String>) -> Self {
        Self::Constraint {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_parse_messages_name_the_url() {
        let err = IngestError::fetch("https://feeds.test/ios.json", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to fetch https://feeds.test/ios.json: connection refused"
        );

        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = IngestError::Parse {
            url: "https://feeds.test/android.json".into(),
            source,
        };
        assert!(err
            .to_string()
            .starts_with("Failed to parse JSON from https://feeds.test/android.json: "));
    }

    #[test]
    fn only_no_data_is_flagged_as_empty_run() {
        assert!(IngestError::NoData.is_no_data());
        let persist = IngestError::Persistence(StoreError::constraint("name", "too long"));
        assert!(!persist.is_no_data());
    }
}
