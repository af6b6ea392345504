use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use super::graph::Dataset;

/// Where a dataset document comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
    Inline(String),
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
            Self::Inline(_) => "inline dataset".to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads the raw dataset text. Parsing never fails afterwards; see
/// [`Dataset::from_json_str`].
pub fn fetch_text(source: &DataSource) -> Result<String, FetchError> {
    match source {
        DataSource::Url(url) => {
            let request_error = |source| FetchError::Request {
                url: url.clone(),
                source,
            };
            let client = reqwest::blocking::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .map_err(request_error)?;
            let response = client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .map_err(request_error)?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            response.text().map_err(request_error)
        }
        DataSource::File(path) => std::fs::read_to_string(path).map_err(|source| FetchError::Read {
            path: path.clone(),
            source,
        }),
        DataSource::Inline(text) => Ok(text.clone()),
    }
}

pub fn fetch_dataset(source: &DataSource) -> Result<Dataset, FetchError> {
    let text = fetch_text(source)?;
    let dataset = Dataset::from_json_str(&text);
    info!(
        source = %source.describe(),
        nodes = dataset.node_count(),
        "dataset fetched"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_inline_and_file_sources() {
        let inline = DataSource::Inline(r#"{"nodes":[{"id":"a"}]}"#.to_owned());
        assert_eq!(fetch_dataset(&inline).unwrap().node_count(), 1);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"nodes":[{{"id":"a"}},{{"id":"b"}}]}}"#).unwrap();
        let source = DataSource::File(file.path().to_path_buf());
        assert_eq!(fetch_dataset(&source).unwrap().node_count(), 2);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let source = DataSource::File(PathBuf::from("/definitely/not/here.json"));
        assert!(matches!(fetch_dataset(&source), Err(FetchError::Read { .. })));
    }
}
