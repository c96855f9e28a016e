use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which kind of data to pull out of the rendered page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Item pages of a listing (wire name `manga`).
    #[default]
    #[serde(rename = "manga")]
    Listing,
    /// Chapter pages of a series.
    Chapters,
    /// Page images of a chapter reader.
    Images,
}

impl Mode {
    /// The name used on the wire (`type=` parameter, error messages, snapshot files).
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Listing => "manga",
            Mode::Chapters => "chapters",
            Mode::Images => "images",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manga" => Ok(Mode::Listing),
            "chapters" => Ok(Mode::Chapters),
            "images" => Ok(Mode::Images),
            other => Err(AppError::UnsupportedMode(other.to_string())),
        }
    }
}

/// One validated fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub target_url: String,
    pub mode: Mode,
}

impl FetchRequest {
    /// Validate raw request parameters.
    ///
    /// A missing or blank `url` is [`AppError::MissingUrl`]; an absent `type`
    /// falls back to [`Mode::Listing`].
    pub fn parse(url: Option<&str>, mode: Option<&str>) -> Result<Self, AppError> {
        let target_url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(AppError::MissingUrl)?;

        let mode = match mode.map(str::trim).filter(|m| !m.is_empty()) {
            Some(raw) => raw.parse()?,
            None => Mode::default(),
        };

        Ok(Self {
            target_url: target_url.to_string(),
            mode,
        })
    }
}

/// A `{title, url}` pair from listing or chapters mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub url: String,
}

/// The data extracted for one request, serialized as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    Entries(Vec<Entry>),
    Images(Vec<String>),
}

impl ExtractionResult {
    pub fn len(&self) -> usize {
        match self {
            ExtractionResult::Entries(entries) => entries.len(),
            ExtractionResult::Images(urls) => urls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A successful workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub result: ExtractionResult,
    /// The load-more cap was reached while a control was still on the page.
    pub truncated: bool,
}

/// What the browser reported after loading the target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// HTTP status of the main document, if a response was received.
    pub status: Option<u16>,
    /// URL the page ended up on after redirects.
    pub final_url: Option<String>,
}

impl NavigationOutcome {
    /// Convert the outcome into an error when the target did not serve the page.
    pub fn ensure_ok(&self) -> Result<(), AppError> {
        match self.status {
            Some(status) if status >= 400 => Err(AppError::NavigationFailed(format!(
                "Request failed with status {status}"
            ))),
            Some(_) => Ok(()),
            None => Err(AppError::NavigationFailed(
                "Request failed with no response".to_string(),
            )),
        }
    }
}
