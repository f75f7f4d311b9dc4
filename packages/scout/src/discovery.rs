//! Job-link discovery: scan a listing page's anchors for URLs that look
//! like individual job postings.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

fn job_link_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)/careers/.*job").unwrap(),
            Regex::new(r"(?i)/jobs/").unwrap(),
            Regex::new(r"(?i)/positions/").unwrap(),
        ]
    })
}

/// Scan `html` for anchors whose href resembles a job posting, resolved
/// against `base_url`. Duplicates are dropped, first-seen order preserved.
pub fn discover_job_links(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let base = Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !job_link_patterns().iter().any(|p| p.is_match(href)) {
            continue;
        }
        let Some(resolved) = resolve(base.as_ref(), base_url, href) else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}

fn resolve(base: Option<&Url>, base_raw: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(base) = base {
        return base.join(href).ok().map(|u| u.to_string());
    }
    // Base did not parse as a URL; fall back to naive joining.
    let trimmed = base_raw.trim_end_matches('/');
    if href.starts_with('/') {
        Some(format!("{trimmed}{href}"))
    } else {
        Some(format!("{trimmed}/{href}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_links_matching_job_patterns() {
        let html = r#"
            <html><body>
                <a href="/jobs/backend-dev">Backend</a>
                <a href="/about">About us</a>
                <a href="/careers/senior-job-123">Senior</a>
                <a href="/positions/sre">SRE</a>
            </body></html>
        "#;
        let links = discover_job_links(html, "https://example.com");
        assert_eq!(
            links,
            vec![
                "https://example.com/jobs/backend-dev",
                "https://example.com/careers/senior-job-123",
                "https://example.com/positions/sre",
            ]
        );
    }

    #[test]
    fn duplicates_are_dropped_preserving_first_seen_order() {
        let html = r#"
            <html><body>
                <a href="/jobs/one">One</a>
                <a href="/jobs/two">Two</a>
                <a href="/jobs/one">One again</a>
            </body></html>
        "#;
        let links = discover_job_links(html, "https://example.com");
        assert_eq!(
            links,
            vec![
                "https://example.com/jobs/one",
                "https://example.com/jobs/two",
            ]
        );
    }

    #[test]
    fn absolute_hrefs_pass_through_unchanged() {
        let html = r#"<a href="https://boards.example.org/jobs/42">ext</a>"#;
        let links = discover_job_links(html, "https://example.com/careers");
        assert_eq!(links, vec!["https://boards.example.org/jobs/42"]);
    }

    #[test]
    fn non_job_links_are_ignored() {
        let html = r#"
            <a href="/blog/post">blog</a>
            <a href="/contact">contact</a>
        "#;
        assert!(discover_job_links(html, "https://example.com").is_empty());
    }

    #[test]
    fn pattern_match_is_case_insensitive() {
        let html = r#"<a href="/Jobs/dev">dev</a>"#;
        let links = discover_job_links(html, "https://example.com");
        assert_eq!(links, vec!["https://example.com/Jobs/dev"]);
    }
}
