// prompts.rs

use crate::rss::truncate_chars;

/// Longest description excerpt sent to the model.
pub const MAX_PROMPT_DESCRIPTION_CHARS: usize = 500;
/// Longest one-line summary we ask for, in characters.
pub const MAX_SUMMARY_CHARS: usize = 50;

/// Asks for a one-line summary and the most specific location of a news item,
/// answered as a single JSON object.
pub fn enrichment_prompt(
    title: &str,
    description: Option<&str>,
    source: Option<&str>,
    language: &str,
) -> String {
    let description = description
        .map(|d| truncate_chars(d.trim(), MAX_PROMPT_DESCRIPTION_CHARS))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "(no description)".to_string());
    let source = source
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(unknown source)");

    format!(
        "Analyze the following news item.

Title: {title}
Content: {description}
Source: {source}

Reply with only a JSON object in this exact format, with no other explanation:
{{
  \"summary\": \"a one-line summary in {language}, at most {max} characters\",
  \"country\": \"the English name of the country where the news takes place, or \\\"global\\\" if it is not tied to one country\",
  \"region\": \"the state, province or region if one is clearly named, otherwise an empty string\",
  \"city\": \"the city if one is clearly named, otherwise an empty string\"
}}",
        max = MAX_SUMMARY_CHARS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrichment_prompt_contents() {
        let long = "x".repeat(800);
        let prompt = enrichment_prompt("Quake hits Osaka", Some(&long), Some("NHK"), "Korean");
        assert!(prompt.contains("Title: Quake hits Osaka"));
        assert!(prompt.contains("Source: NHK"));
        assert!(prompt.contains("in Korean, at most 50 characters"));
        assert!(prompt.contains(&"x".repeat(500)));
        assert!(!prompt.contains(&"x".repeat(501)));
        assert!(prompt.contains("\"city\""));
    }

    #[test]
    fn test_enrichment_prompt_placeholders() {
        let prompt = enrichment_prompt("Headline", None, Some("  "), "English");
        assert!(prompt.contains("Content: (no description)"));
        assert!(prompt.contains("Source: (unknown source)"));
    }
}
