//! Record sources for the fetch layer.
//!
//! The only asynchronous boundary of the map view: records are fetched from
//! the backend API or read from a JSON file, then handed to
//! [`build_entities`](crate::data::records::build_entities) synchronously.

use crate::data::records::{parse_records, RawLocationRecord};
use crate::traits::RecordSource;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(feature = "http")]
pub use http::HttpRecordSource;

/// Reads a records payload from a local JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<RawLocationRecord>> {
        log::debug!("reading records from {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let records = parse_records(&raw)?;
        log::info!("loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(feature = "http")]
mod http {
    use super::*;
    use crate::core::config::FetchConfig;
    use crate::MapError;

    /// Fetches records from the backend's record listing endpoint
    #[derive(Debug, Clone)]
    pub struct HttpRecordSource {
        client: reqwest::Client,
        url: String,
    }

    impl HttpRecordSource {
        pub fn new(config: &FetchConfig) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?;
            Ok(Self {
                client,
                url: config.records_url(),
            })
        }
    }

    #[async_trait]
    impl RecordSource for HttpRecordSource {
        async fn fetch(&self) -> Result<Vec<RawLocationRecord>> {
            log::debug!("fetching records from {}", self.url);
            let response = self.client.get(&self.url).send().await?;

            let status = response.status();
            if !status.is_success() {
                log::warn!("record fetch from {} failed with {}", self.url, status);
                return Err(MapError::Source(format!("HTTP error! status: {}", status)));
            }

            let body = response.text().await?;
            let records = parse_records(&body)?;
            log::info!("fetched {} records from {}", records.len(), self.url);
            Ok(records)
        }

        fn describe(&self) -> String {
            self.url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_source_reads_envelope() {
        let path = std::env::temp_dir().join(format!("hikemap-records-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"{ "mountains": [ { "code": "1", "name": "관악산", "location": "서울 관악구", "center": [37.44, 126.96] } ] }"#,
        )
        .await
        .unwrap();

        let source = JsonFileSource::new(&path);
        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name(), "관악산");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        assert!(matches!(source.fetch().await, Err(crate::MapError::Io(_))));
    }
}
