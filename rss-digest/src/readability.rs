use interfaces::ReadableExtractor;
use scraper::{Html, Selector};

/// Containers tried in order before falling back to `<body>`.
const CONTENT_SELECTORS: [&str; 4] = ["article", "main", r#"[role="main"]"#, ".content"];

const CHROME_SELECTOR: &str = "nav, header, footer, aside, script, style, form, iframe, noscript";

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Default readability extraction. Looks for the main content container of
/// a page and strips navigation chrome from it; a heuristic, not a full
/// readability scorer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Readability;

impl Readability {
    pub fn new() -> Self {
        Self
    }
}

impl ReadableExtractor for Readability {
    fn extract(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);

        let container = CONTENT_SELECTORS
            .iter()
            .chain(std::iter::once(&"body"))
            .filter_map(|sel| Selector::parse(sel).ok())
            .find_map(|sel| doc.select(&sel).next().map(|el| el.inner_html()))?;

        let cleaned = strip_chrome(&container);
        if cleaned.trim().is_empty() {
            None
        } else {
            Some(cleaned.trim().to_string())
        }
    }
}

/// Remove chrome elements, except those holding a heading: article pages
/// commonly wrap their headline in `<header>`.
fn strip_chrome(html: &str) -> String {
    let (Ok(chrome), Ok(heading)) = (
        Selector::parse(CHROME_SELECTOR),
        Selector::parse(HEADING_SELECTOR),
    ) else {
        return html.to_string();
    };

    let fragment = Html::parse_fragment(html);
    let mut result = fragment.root_element().inner_html();
    for el in fragment.select(&chrome) {
        if el.select(&heading).next().is_some() {
            continue;
        }
        result = result.replacen(&el.html(), "", 1);
    }
    result
}
