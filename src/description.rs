use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One generated product description as returned by the service.
///
/// `highlights` and `generated_description` are required; the two optional
/// fields may be missing or `null` in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDescription {
    pub generated_description: String,
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_description: Option<String>,
}

/// Display model for one result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptionCard<'a> {
    /// 1-based position in the result list ("Description 1", ...).
    pub number: usize,
    pub text: &'a str,
    pub highlights: &'a [String],
    /// Only set when the service suggested a non-empty range.
    pub price_range: Option<&'a str>,
    pub original: Option<&'a str>,
}

impl<'a> DescriptionCard<'a> {
    fn new(index: usize, desc: &'a GeneratedDescription) -> Self {
        Self {
            number: index + 1,
            text: &desc.generated_description,
            highlights: &desc.highlights,
            price_range: non_empty(desc.suggested_price_range.as_deref()),
            original: non_empty(desc.original_description.as_deref()),
        }
    }

    /// Card heading, e.g. `Description 2`.
    pub fn title(&self) -> String {
        format!("Description {}", self.number)
    }

    /// Plain-text rendering used by the CLI.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title());
        let _ = writeln!(out, "{}", self.text);
        if let Some(original) = self.original {
            let _ = writeln!(out, "Original: {original}");
        }
        let _ = writeln!(out, "Key Highlights:");
        for highlight in self.highlights {
            let _ = writeln!(out, "  • {highlight}");
        }
        if let Some(price) = self.price_range {
            let _ = writeln!(out, "Suggested Price Range: {price}");
        }
        out
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Lazily turn a result list into display cards.
///
/// The iterator is `Clone`, so a renderer can walk it more than once
/// (egui repaints every frame). An empty list yields no cards.
pub fn cards(results: &[GeneratedDescription]) -> impl Iterator<Item = DescriptionCard<'_>> + Clone {
    results
        .iter()
        .enumerate()
        .map(|(i, desc)| DescriptionCard::new(i, desc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(text: &str, highlights: &[&str], price: Option<&str>) -> GeneratedDescription {
        GeneratedDescription {
            generated_description: text.to_string(),
            highlights: highlights.iter().map(|h| h.to_string()).collect(),
            suggested_price_range: price.map(String::from),
            original_description: None,
        }
    }

    #[test]
    fn parse_minimal_response() {
        let json = r#"[
            {"generated_description": "A", "highlights": ["x", "y"]},
            {"generated_description": "B", "highlights": ["z"]}
        ]"#;
        let parsed: Vec<GeneratedDescription> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].highlights, vec!["x", "y"]);
        assert!(parsed[1].suggested_price_range.is_none());
        assert!(parsed[1].original_description.is_none());
    }

    #[test]
    fn parse_null_optionals() {
        let json = r#"{
            "generated_description": "A",
            "highlights": [],
            "suggested_price_range": null,
            "original_description": null
        }"#;
        let parsed: GeneratedDescription = serde_json::from_str(json).unwrap();
        assert!(parsed.suggested_price_range.is_none());
    }

    #[test]
    fn parse_missing_highlights_fails() {
        let json = r#"{"generated_description": "A"}"#;
        assert!(serde_json::from_str::<GeneratedDescription>(json).is_err());
    }

    #[test]
    fn cards_preserve_order_and_count() {
        let results = vec![
            desc("first", &["a"], None),
            desc("second", &["b", "c"], Some("$10-$20")),
            desc("third", &[], None),
        ];
        let rendered: Vec<_> = cards(&results).collect();
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0].text, "first");
        assert_eq!(rendered[1].number, 2);
        assert_eq!(rendered[1].highlights, ["b", "c"]);
        assert_eq!(rendered[1].price_range, Some("$10-$20"));
        assert_eq!(rendered[2].title(), "Description 3");
    }

    #[test]
    fn cards_are_restartable() {
        let results = vec![desc("a", &[], None), desc("b", &[], None)];
        let iter = cards(&results);
        assert_eq!(iter.clone().count(), 2);
        assert_eq!(iter.map(|c| c.text).collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn cards_empty() {
        assert_eq!(cards(&[]).count(), 0);
    }

    #[test]
    fn render_without_price_line() {
        let results = vec![desc("Sleek lamp", &["brass", "dimmable"], None)];
        let text = cards(&results).next().unwrap().render_text();
        assert!(text.contains("Sleek lamp"));
        assert!(text.contains("  • brass\n  • dimmable"));
        assert!(!text.contains("Suggested Price Range"));
    }

    #[test]
    fn render_with_price_line() {
        let results = vec![desc("Watch", &["steel"], Some("Premium Product"))];
        let text = cards(&results).next().unwrap().render_text();
        assert!(text.ends_with("Suggested Price Range: Premium Product\n"));
    }

    #[test]
    fn empty_price_is_hidden() {
        let results = vec![desc("Mug", &[], Some(""))];
        assert!(cards(&results).next().unwrap().price_range.is_none());
    }

    #[test]
    fn whitespace_price_is_shown() {
        let results = vec![desc("Mug", &[], Some("   "))];
        let card = cards(&results).next().unwrap();
        assert_eq!(card.price_range, Some("   "));
        assert!(card.render_text().contains("Suggested Price Range:    \n"));
    }

    #[test]
    fn original_description_shown_when_present() {
        let mut d = desc("New copy", &[], None);
        d.original_description = Some("Old copy".into());
        let results = vec![d];
        let card = cards(&results).next().unwrap();
        assert_eq!(card.original, Some("Old copy"));
        assert!(card.render_text().contains("Original: Old copy"));
    }
}
