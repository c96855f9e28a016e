//! Selector-based extraction over rendered page markup.
//!
//! The workflow captures the fully rendered DOM once the expected elements
//! are present and hands it here, so every filtering rule can be exercised
//! against plain HTML fixtures.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::AppError;
use crate::models::Entry;
use crate::profile::{ImageRule, TitledLinkRule};

fn parse_selector(raw: &str) -> Result<Selector, AppError> {
    Selector::parse(raw).map_err(|e| AppError::ConfigError(format!("Invalid selector '{raw}': {e}")))
}

/// Resolve an attribute value the way the DOM's `href`/`src` properties do.
///
/// Values that cannot be resolved are returned unchanged.
fn resolve(base: Option<&Url>, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let resolved = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    resolved.map(String::from).unwrap_or_else(|_| raw.to_string())
}

fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Title for one anchor: first candidate with text, then the anchor's own
/// text, then `placeholder`.
fn resolve_title(anchor: ElementRef<'_>, candidates: &[Selector], placeholder: &str) -> String {
    candidates
        .iter()
        .filter_map(|sel| anchor.select(sel).next())
        .map(trimmed_text)
        .find(|text| !text.is_empty())
        .or_else(|| Some(trimmed_text(anchor)).filter(|text| !text.is_empty()))
        .unwrap_or_else(|| placeholder.to_string())
}

/// Collect `{title, url}` entries from every anchor matching `rule`.
///
/// Entries keep document order. An entry is dropped when its URL is empty,
/// lacks `rule.required_path`, was already kept, or its title fell back to
/// the placeholder.
pub fn extract_titled_links(
    html: &str,
    base: Option<&Url>,
    rule: &TitledLinkRule,
) -> Result<Vec<Entry>, AppError> {
    let links = parse_selector(&rule.link_selector)?;
    let candidates = rule
        .title_selectors
        .iter()
        .map(|raw| parse_selector(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for anchor in document.select(&links) {
        let url = resolve(base, anchor.value().attr("href").unwrap_or_default());
        let title = resolve_title(anchor, &candidates, &rule.placeholder);

        if url.is_empty()
            || !url.contains(&rule.required_path)
            || title == rule.placeholder
            || seen.contains(&url)
        {
            continue;
        }

        seen.insert(url.clone());
        entries.push(Entry { title, url });
    }

    Ok(entries)
}

/// Collect image URLs from every element matching `rule`.
///
/// `src` is preferred, `data-src` is the fallback. Duplicates are kept.
pub fn extract_images(
    html: &str,
    base: Option<&Url>,
    rule: &ImageRule,
) -> Result<Vec<String>, AppError> {
    let images = parse_selector(&rule.selector)?;
    let document = Html::parse_document(html);

    let urls = document
        .select(&images)
        .filter_map(|img| {
            let attrs = img.value();
            let raw = attrs
                .attr("src")
                .filter(|src| !src.trim().is_empty())
                .or_else(|| attrs.attr("data-src"))?;
            Some(resolve(base, raw))
        })
        .filter(|src| !src.is_empty() && src.contains(&rule.required_path))
        .collect();

    Ok(urls)
}
