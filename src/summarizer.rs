//! AI enrichment of feed entries: a short summary plus a location.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::geo::{assign_country, canonical_country};
use crate::llm::generate_llm_response;
use crate::news::{Enrichment, FeedEntry};
use crate::prompts::{enrichment_prompt, MAX_SUMMARY_CHARS};
use crate::rss::truncate_chars;
use crate::{LLMParams, TARGET_LLM_REQUEST};

static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object regex"));

/// Field names accepted by the line-based fallback, lowercased.
const SUMMARY_KEYS: &[&str] = &["summary", "요약"];
const COUNTRY_KEYS: &[&str] = &["country", "국가"];
const REGION_KEYS: &[&str] = &["region", "지역"];
const CITY_KEYS: &[&str] = &["city", "도시"];

/// Models sometimes answer `null` instead of an empty string.
#[derive(Debug, Deserialize)]
struct LenientEnrichment {
    summary: Option<String>,
    country: Option<String>,
    region: Option<String>,
    city: Option<String>,
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn from_json(text: &str) -> Option<Enrichment> {
    let object = JSON_OBJECT_RE.find(text)?;
    let parsed: LenientEnrichment = serde_json::from_str(object.as_str()).ok()?;
    Some(Enrichment {
        summary: clean(parsed.summary),
        country: clean(parsed.country),
        region: clean(parsed.region),
        city: clean(parsed.city),
    })
}

fn from_lines(text: &str) -> Option<Enrichment> {
    let mut enrichment = Enrichment::default();
    let mut found = false;

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*']).trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches('*').to_lowercase();
        let value = value.trim().trim_matches('"').to_string();

        let slot = if SUMMARY_KEYS.contains(&key.as_str()) {
            &mut enrichment.summary
        } else if COUNTRY_KEYS.contains(&key.as_str()) {
            &mut enrichment.country
        } else if REGION_KEYS.contains(&key.as_str()) {
            &mut enrichment.region
        } else if CITY_KEYS.contains(&key.as_str()) {
            &mut enrichment.city
        } else {
            continue;
        };
        if slot.is_empty() {
            *slot = value;
            found = true;
        }
    }

    found.then_some(enrichment)
}

/// Reads a model answer: the first `{...}` object if it parses, otherwise
/// `Summary:` / `Country:` style lines.
///
/// The summary is cut to the allowed length and the country is normalised
/// onto the place tables.
pub fn parse_enrichment(text: &str) -> Option<Enrichment> {
    let mut enrichment = from_json(text).or_else(|| from_lines(text))?;
    enrichment.summary = truncate_chars(&enrichment.summary, MAX_SUMMARY_CHARS);
    enrichment.country = canonical_country(&enrichment.country);
    Some(enrichment)
}

/// Enrichment used when no model answer is available: no summary, and the
/// country guessed from the feed and its source.
pub fn fallback_enrichment(entry: &FeedEntry) -> Enrichment {
    Enrichment {
        country: assign_country(Some(&entry.feed_country), Some(&entry.source)),
        ..Default::default()
    }
}

/// Summarizes and locates one entry.
///
/// Never fails: without a configured model, or when the call or parsing
/// fails, [`fallback_enrichment`] is returned.
pub async fn enrich(entry: &FeedEntry, params: Option<&LLMParams>, language: &str) -> Enrichment {
    let Some(params) = params else {
        return fallback_enrichment(entry);
    };

    let prompt = enrichment_prompt(
        &entry.title,
        entry.description.as_deref(),
        Some(&entry.source),
        language,
    );

    let Some(response) = generate_llm_response(&prompt, params).await else {
        return fallback_enrichment(entry);
    };

    match parse_enrichment(&response) {
        Some(enrichment) => {
            debug!(target: TARGET_LLM_REQUEST, "Enriched '{}': {:?}", entry.title, enrichment);
            enrichment
        }
        None => {
            warn!(target: TARGET_LLM_REQUEST, "Could not parse enrichment for '{}': {}", entry.title, response);
            fallback_enrichment(entry)
        }
    }
}
