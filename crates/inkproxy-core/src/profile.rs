//! Selector sets for the target site.
//!
//! Every selector list is an ordered fallback chain: earlier entries win.
//! The defaults describe the one site shape this proxy was built for; all of
//! them are plain data so a deployment can swap them without code changes.

use serde::{Deserialize, Serialize};

use crate::models::Mode;

/// How to turn matching anchors into `{title, url}` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledLinkRule {
    /// Anchors to collect; also the selector the workflow waits for.
    pub link_selector: String,
    /// A kept URL must contain this path fragment.
    pub required_path: String,
    /// Title candidates looked up inside the anchor, in priority order.
    pub title_selectors: Vec<String>,
    /// Title used when nothing else yields text. Entries with it are dropped.
    pub placeholder: String,
}

/// How to collect image URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRule {
    /// Images to collect; also the selector the workflow waits for.
    pub selector: String,
    /// A kept URL must contain this path fragment.
    pub required_path: String,
}

/// All selectors the workflow needs for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub listing: TitledLinkRule,
    pub chapters: TitledLinkRule,
    pub images: ImageRule,
    /// "Load more" controls on chapter pages, in priority order.
    pub load_more_selectors: Vec<String>,
}

impl SiteProfile {
    /// The selector whose appearance means `mode`'s content has rendered.
    pub fn wait_selector(&self, mode: Mode) -> &str {
        match mode {
            Mode::Listing => &self.listing.link_selector,
            Mode::Chapters => &self.chapters.link_selector,
            Mode::Images => &self.images.selector,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            listing: TitledLinkRule {
                link_selector: r#"a[href*="/manga/"]"#.to_string(),
                required_path: "/manga/".to_string(),
                title_selectors: strings(&[
                    ".card-title",
                    ".manga-title",
                    ".item-title",
                    ".title",
                    "h3",
                    "h2",
                ]),
                placeholder: "Unknown Manga".to_string(),
            },
            chapters: TitledLinkRule {
                link_selector: r#"a[href*="/chapters/"]"#.to_string(),
                required_path: "/chapters/".to_string(),
                title_selectors: strings(&[".chapter-title", ".chapter-number", "span", "a"]),
                placeholder: "Unknown Chapter".to_string(),
            },
            images: ImageRule {
                selector: r#"img[src*="/file/mangap/"], img[data-src*="/file/mangap/"]"#
                    .to_string(),
                required_path: "/file/mangap/".to_string(),
            },
            load_more_selectors: strings(&[
                "button.load-more",
                "a.load-more",
                r#"[class*="load-more"]"#,
                ".btn-more",
                ".pagination a",
            ]),
        }
    }
}
