// src/fetch/pagination.rs

use scraper::{Html, Selector};
use tracing::{debug, trace};

use crate::error::ParseError;

/// Finds page links inside a listing's pagination control.
#[derive(Debug, Clone)]
pub struct PaginationDiscoverer {
    control: Selector,
    link: Selector,
}

impl Default for PaginationDiscoverer {
    fn default() -> Self {
        Self {
            control: Selector::parse("ul.pagination").expect("static selector"),
            link: Selector::parse("a[href]").expect("static selector"),
        }
    }
}

impl PaginationDiscoverer {
    pub fn new(control_selector: &str) -> Result<Self, ParseError> {
        let control = Selector::parse(control_selector).map_err(|e| {
            ParseError::new(format!("selector '{}': {:?}", control_selector, e))
        })?;
        Ok(Self {
            control,
            ..Self::default()
        })
    }

    /// Every `href` in the first pagination control, in document order,
    /// minus the previous/next arrows. No control means no links.
    pub fn discover(&self, landing: &str) -> Vec<String> {
        let doc = Html::parse_document(landing);
        let Some(control) = doc.select(&self.control).next() else {
            debug!("no pagination control on landing page");
            return Vec::new();
        };

        control
            .select(&self.link)
            .filter(|a| !is_relative_nav(a.value().attr("aria-label")))
            .filter_map(|a| a.value().attr("href"))
            .inspect(|href| trace!(href, "page link"))
            .map(str::to_string)
            .collect()
    }
}

/// Arrow links carry `aria-label="Previous"` / `"Next"`; page numbers don't.
fn is_relative_nav(label: Option<&str>) -> bool {
    let Some(label) = label else {
        return false;
    };
    let label = label.trim().to_ascii_lowercase();
    label.starts_with("prev") || label.starts_with("next")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"
        <html><body>
            <table class="table"><tr><th>Team Name</th></tr></table>
            <ul class="pagination">
                <li><a href="/pages/forms/?page_num=1" aria-label="Previous">&laquo;</a></li>
                <li><a href="/pages/forms/?page_num=1">1</a></li>
                <li><a href="/pages/forms/?page_num=2">2</a></li>
                <li><a href="https://www.scrapethissite.com/pages/forms/?page_num=3">3</a></li>
                <li><a href="/pages/forms/?page_num=2" aria-label="Next">&raquo;</a></li>
            </ul>
        </body></html>
    "#;

    #[test]
    fn keeps_numbered_links_in_order() {
        let urls = PaginationDiscoverer::default().discover(LANDING);
        assert_eq!(
            urls,
            vec![
                "/pages/forms/?page_num=1",
                "/pages/forms/?page_num=2",
                "https://www.scrapethissite.com/pages/forms/?page_num=3",
            ]
        );
    }

    #[test]
    fn plain_pagination_list() {
        let html = r#"
        <html>
            <ul class="pagination">
                <li><a href="/pages/forms/?page=1">1</a></li>
                <li><a href="/pages/forms/?page=2">2</a></li>
                <li><a href="/pages/forms/?page=3">3</a></li>
            </ul>
        </html>
        "#;
        let urls = PaginationDiscoverer::default().discover(html);
        assert_eq!(
            urls,
            vec!["/pages/forms/?page=1", "/pages/forms/?page=2", "/pages/forms/?page=3"]
        );
    }

    #[test]
    fn link_text_does_not_decide_exclusion() {
        // "Next" as text without a label is a real page link.
        let html = r#"<ul class="pagination">
            <li><a href="?p=1">Next</a></li>
            <li><a href="?p=2" aria-label="Page 2">2</a></li>
            <li><a aria-label="next page" href="?p=2">&raquo;</a></li>
        </ul>"#;
        let urls = PaginationDiscoverer::default().discover(html);
        assert_eq!(urls, vec!["?p=1", "?p=2"]);
    }

    #[test]
    fn links_outside_the_control_are_ignored() {
        let html = r#"<a href="/home">Home</a>
            <ul class="pagination"><li><a href="?p=1">1</a></li><li><a>no href</a></li></ul>
            <a href="?p=9">9</a>"#;
        assert_eq!(PaginationDiscoverer::default().discover(html), vec!["?p=1"]);
    }

    #[test]
    fn missing_control_yields_nothing() {
        let d = PaginationDiscoverer::default();
        assert!(d.discover("<html><body><p>no pages</p></body></html>").is_empty());
        assert!(d.discover("<<<not html at all").is_empty());
        assert!(d.discover("").is_empty());
    }

    #[test]
    fn custom_control_selector() {
        let d = PaginationDiscoverer::new("nav#pages").unwrap();
        let html = r#"<nav id="pages"><a href="a.html">1</a><a href="b.html">2</a></nav>"#;
        assert_eq!(d.discover(html), vec!["a.html", "b.html"]);
        assert!(PaginationDiscoverer::new("nav[").is_err());
    }
}
