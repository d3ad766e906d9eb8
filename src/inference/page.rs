use scraper::{ElementRef, Html};

/// A product page parsed once per check. Detectors share the DOM for
/// element-level rules and the lowercased raw markup for whole-page scans
/// (keywords in attributes or embedded scripts still count).
pub struct ParsedPage {
    dom: Html,
    raw_lower: String,
}

impl ParsedPage {
    pub fn parse(markup: &str) -> Self {
        Self {
            dom: Html::parse_document(markup),
            raw_lower: markup.to_lowercase(),
        }
    }

    pub fn dom(&self) -> &Html {
        &self.dom
    }

    /// Case-insensitive whole-page containment check.
    pub fn contains(&self, phrase: &str) -> bool {
        self.raw_lower.contains(phrase)
    }
}

/// Visible text of an element, whitespace-joined and trimmed.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortens matched text for evidence and log lines.
pub fn snippet(text: &str) -> String {
    const MAX_CHARS: usize = 80;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}…", head)
    }
}
