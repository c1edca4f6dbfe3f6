//! Trace source normalization
//!
//! Every way a host can hand over a trace ends up as a `serde_json::Value`
//! fed to [`super::load`]. Read and decode failures are reported as
//! [`VisualizerError::MalformedTrace`] except for local I/O errors.

use crate::errors::{Result, VisualizerError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value as Json;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const DATA_URI_PREFIX: &str = "data:application/json;base64,";
const FILE_URL_PREFIX: &str = "file://";

/// Where a trace payload comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TraceSource {
    /// Path to a JSON file; `-` reads standard input
    File(PathBuf),
    /// `data:application/json;base64,...`
    DataUri(String),
    /// Raw JSON text
    Json(String),
    /// Already-parsed payload
    Value(Json),
}

impl TraceSource {
    /// Classify a command-line argument
    ///
    /// Data-URIs and inline JSON (leading `{` or `[`) are recognized by shape;
    /// anything else is a path, with an optional `file://` prefix.
    pub fn from_arg(arg: &str) -> Self {
        let trimmed = arg.trim_start();
        if trimmed.starts_with("data:") {
            TraceSource::DataUri(arg.to_string())
        } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
            TraceSource::Json(arg.to_string())
        } else {
            let path = arg.strip_prefix(FILE_URL_PREFIX).unwrap_or(arg);
            TraceSource::File(PathBuf::from(path))
        }
    }

    /// Read and parse the payload
    pub fn into_value(self) -> Result<Json> {
        match self {
            TraceSource::Value(value) => Ok(value),
            TraceSource::Json(text) => parse_json(&text),
            TraceSource::DataUri(uri) => {
                let text = decode_data_uri(&uri)?;
                parse_json(&text)
            }
            TraceSource::File(path) => {
                let text = read_path(&path)?;
                debug!(path = %path.display(), bytes = text.len(), "read trace file");
                parse_json(&text)
            }
        }
    }
}

fn read_path(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(fs::read_to_string(path)?)
}

fn parse_json(text: &str) -> Result<Json> {
    serde_json::from_str(text)
        .map_err(|e| VisualizerError::malformed(format!("invalid JSON: {}", e)))
}

/// Decode the base64 body of a JSON data-URI into text
pub fn decode_data_uri(uri: &str) -> Result<String> {
    let body = uri
        .trim()
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| {
            VisualizerError::malformed(format!(
                "data-URI must start with `{}`",
                DATA_URI_PREFIX
            ))
        })?;

    let bytes = STANDARD
        .decode(body.trim())
        .map_err(|e| VisualizerError::malformed(format!("invalid base64 payload: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|_| VisualizerError::malformed("data-URI payload is not valid UTF-8"))
}

/// Encode JSON text as a data-URI, the inverse of [`decode_data_uri`]
pub fn encode_data_uri(json: &str) -> String {
    format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(json))
}

impl From<&str> for TraceSource {
    fn from(arg: &str) -> Self {
        TraceSource::from_arg(arg)
    }
}

impl From<String> for TraceSource {
    fn from(arg: String) -> Self {
        TraceSource::from_arg(&arg)
    }
}

impl From<Json> for TraceSource {
    fn from(value: Json) -> Self {
        TraceSource::Value(value)
    }
}

impl From<PathBuf> for TraceSource {
    fn from(path: PathBuf) -> Self {
        TraceSource::File(path)
    }
}

impl From<&Path> for TraceSource {
    fn from(path: &Path) -> Self {
        TraceSource::File(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_arg_classifies_shapes() {
        assert!(matches!(
            TraceSource::from_arg("data:application/json;base64,e30="),
            TraceSource::DataUri(_)
        ));
        assert!(matches!(TraceSource::from_arg("[1]"), TraceSource::Json(_)));
        assert_eq!(
            TraceSource::from_arg("file:///tmp/t.json"),
            TraceSource::File(PathBuf::from("/tmp/t.json"))
        );
        assert_eq!(
            TraceSource::from_arg("trace.json"),
            TraceSource::File(PathBuf::from("trace.json"))
        );
    }

    #[test]
    fn test_data_uri_decodes() {
        let uri = encode_data_uri(r#"{"trace":[]}"#);
        let value = TraceSource::DataUri(uri).into_value().unwrap();
        assert_eq!(value, json!({ "trace": [] }));
    }

    #[test]
    fn test_bad_data_uri_is_malformed() {
        let err = TraceSource::DataUri("data:text/plain,hi".into())
            .into_value()
            .unwrap_err();
        assert!(matches!(err, VisualizerError::MalformedTrace { .. }));

        let err = TraceSource::DataUri(format!("{}@@@", DATA_URI_PREFIX))
            .into_value()
            .unwrap_err();
        assert!(matches!(err, VisualizerError::MalformedTrace { .. }));
    }

    #[test]
    fn test_invalid_json_text_is_malformed() {
        let err = TraceSource::Json("{ not json".into()).into_value().unwrap_err();
        assert!(matches!(err, VisualizerError::MalformedTrace { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TraceSource::File(PathBuf::from("/definitely/not/here.json"))
            .into_value()
            .unwrap_err();
        assert!(matches!(err, VisualizerError::Io(_)));
    }
}
