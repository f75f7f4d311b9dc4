//! Best-effort structured extraction from a job page. All fields optional.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Structured fields pulled from one job page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
}

impl ExtractedJob {
    /// Concatenation of all extracted fields, fed to the classifier.
    pub fn text(&self) -> String {
        [
            &self.title,
            &self.company,
            &self.location,
            &self.description,
            &self.summary,
        ]
        .iter()
        .filter_map(|field| field.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

const SUMMARY_MAX_CHARS: usize = 400;

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First element whose class attribute contains any of the given tokens.
fn find_by_class<'a>(document: &'a Html, tokens: &[&str]) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("[class]").ok()?;
    document.select(&selector).find(|element| {
        element
            .value()
            .attr("class")
            .map(|class| {
                let class = class.to_lowercase();
                tokens.iter().any(|token| class.contains(token))
            })
            .unwrap_or(false)
    })
}

fn extract_title(document: &Html) -> Option<String> {
    select_first(document, "title")
        .map(element_text)
        .and_then(non_empty)
        .or_else(|| {
            select_first(document, "h1")
                .map(element_text)
                .and_then(non_empty)
        })
}

fn extract_company(document: &Html) -> Option<String> {
    select_first(document, r#"meta[property="og:site_name"]"#)
        .and_then(|meta| meta.value().attr("content"))
        .map(clean_text)
        .and_then(non_empty)
        .or_else(|| {
            find_by_class(document, &["company", "employer"])
                .map(element_text)
                .and_then(non_empty)
        })
}

fn extract_location(document: &Html) -> Option<String> {
    find_by_class(document, &["location"])
        .map(element_text)
        .and_then(non_empty)
}

/// Readable body text: headings, paragraphs and list items, skipping
/// script/style/nav boilerplate by construction.
fn readable_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1, h2, h3, h4, h5, h6, p, li").ok()?;
    let joined = document
        .select(&selector)
        .map(element_text)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(clean_text(&joined))
}

fn extract_description(document: &Html) -> Option<String> {
    for selector in ["main", "article"] {
        if let Some(main) = select_first(document, selector) {
            if let Some(text) = non_empty(element_text(main)) {
                return Some(text);
            }
        }
    }
    readable_text(document)
}

fn summarize(description: &str) -> String {
    let chars: Vec<char> = description.chars().collect();
    if chars.len() > SUMMARY_MAX_CHARS {
        let truncated: String = chars[..SUMMARY_MAX_CHARS].iter().collect();
        format!("{truncated}…")
    } else {
        description.to_string()
    }
}

/// Extract structured fields from a job page's HTML.
pub fn extract(html: &str) -> ExtractedJob {
    let document = Html::parse_document(html);

    let description = extract_description(&document);
    let summary = description.as_deref().map(summarize);

    ExtractedJob {
        title: extract_title(&document),
        company: extract_company(&document),
        location: extract_location(&document),
        description,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Backend Developer - Acme</title>
            <meta property="og:site_name" content="Acme Corp" />
          </head>
          <body>
            <nav><a href="/">home</a></nav>
            <h1>Backend Developer</h1>
            <span class="job-location">Tel Aviv</span>
            <main>
              <p>Build and ship backend services.</p>
              <p>Requirements: 3+ years of experience.</p>
            </main>
          </body>
        </html>
    "#;

    #[test]
    fn extracts_all_fields() {
        let job = extract(PAGE);
        assert_eq!(job.title.as_deref(), Some("Backend Developer - Acme"));
        assert_eq!(job.company.as_deref(), Some("Acme Corp"));
        assert_eq!(job.location.as_deref(), Some("Tel Aviv"));
        let description = job.description.unwrap();
        assert!(description.contains("Build and ship backend services."));
    }

    #[test]
    fn falls_back_to_h1_when_title_missing() {
        let html = "<html><body><h1>SRE Position</h1><p>On call.</p></body></html>";
        let job = extract(html);
        assert_eq!(job.title.as_deref(), Some("SRE Position"));
    }

    #[test]
    fn summary_truncates_long_descriptions() {
        let long = format!(
            "<html><body><main><p>{}</p></main></body></html>",
            "word ".repeat(200)
        );
        let job = extract(&long);
        let summary = job.summary.unwrap();
        assert!(summary.chars().count() <= SUMMARY_MAX_CHARS + 1);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn short_description_is_its_own_summary() {
        let html = "<html><body><main><p>Short blurb.</p></main></body></html>";
        let job = extract(html);
        assert_eq!(job.summary, job.description);
    }

    #[test]
    fn missing_fields_are_none() {
        let job = extract("<html><body></body></html>");
        assert!(job.title.is_none());
        assert!(job.company.is_none());
        assert!(job.location.is_none());
    }

    #[test]
    fn text_blob_joins_available_fields() {
        let job = extract(PAGE);
        let text = job.text();
        assert!(text.contains("Backend Developer"));
        assert!(text.contains("Tel Aviv"));
    }
}
