//! Converter and service configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

/// Row element name used when none is configured.
pub const DEFAULT_ROW_TAG: &str = "item";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Local name of the element whose occurrences each become one CSV record.
    pub row_tag: String,

    /// Capacity of the buffered reader placed in front of the XML input.
    pub read_buffer_bytes: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            row_tag: DEFAULT_ROW_TAG.to_string(),
            read_buffer_bytes: 64 * 1024,
        }
    }
}

impl ConvertConfig {
    /// Set the row tag. Blank values keep the current tag.
    pub fn with_row_tag(mut self, tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() {
            self.row_tag = tag.to_string();
        }
        self
    }

    pub fn with_read_buffer_bytes(mut self, bytes: usize) -> Self {
        // BufReader with zero capacity would never make progress
        self.read_buffer_bytes = bytes.max(1);
        self
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `XML2CSV_ROW_TAG`: row element name
    /// - `XML2CSV_READ_BUFFER_BYTES`: input buffer capacity
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("XML2CSV_ROW_TAG") {
            cfg = cfg.with_row_tag(s);
        }

        if let Ok(s) = std::env::var("XML2CSV_READ_BUFFER_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg = cfg.with_read_buffer_bytes(v);
            }
        }

        cfg
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Interface to listen on.
    pub host: String,

    pub port: u16,

    /// Launch the platform browser at the upload page once listening.
    pub open_browser: bool,

    /// Upper bound on a single multipart upload.
    pub max_upload_bytes: usize,

    /// Row tag applied when a request leaves the `rowTag` field blank.
    pub default_row_tag: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            open_browser: false,
            max_upload_bytes: 256 * 1024 * 1024, // 256 MiB
            default_row_tag: DEFAULT_ROW_TAG.to_string(),
        }
    }
}

impl ServeConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `XML2CSV_HOST`: listen interface
    /// - `XML2CSV_PORT`: listen port
    /// - `XML2CSV_OPEN_BROWSER`: `1`/`true` to open the browser on start
    /// - `XML2CSV_MAX_UPLOAD_BYTES`: upload size limit
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("XML2CSV_HOST") {
            if !s.trim().is_empty() {
                cfg.host = s.trim().to_string();
            }
        }

        if let Ok(s) = std::env::var("XML2CSV_PORT") {
            if let Ok(v) = s.parse::<u16>() {
                cfg.port = v;
            }
        }

        if let Ok(s) = std::env::var("XML2CSV_OPEN_BROWSER") {
            cfg.open_browser = matches!(s.trim(), "1" | "true" | "yes");
        }

        if let Ok(s) = std::env::var("XML2CSV_MAX_UPLOAD_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_upload_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("XML2CSV_ROW_TAG") {
            if !s.trim().is_empty() {
                cfg.default_row_tag = s.trim().to_string();
            }
        }

        cfg
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL a local browser should open.
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Conversion settings for one request; `row_tag` may be blank.
    pub fn convert_config(&self, row_tag: &str) -> ConvertConfig {
        ConvertConfig::default()
            .with_row_tag(&self.default_row_tag)
            .with_row_tag(row_tag)
    }
}
