//! HTML parser for extracting product records from a result page
//!
//! Each result node is read through four independent lookups (title, price,
//! rating, link). A lookup that finds nothing yields `None`; whether the node
//! becomes a record is decided only after all four have run.

use crate::config::SelectorConfig;
use crate::record::{PageBatch, ProductRecord};
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors plus the origin used to absolutize product links
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    result_item: Selector,
    title: Selector,
    price: Selector,
    rating: Selector,
    link: Selector,
    origin: Url,
}

impl RecordExtractor {
    /// Compiles the configured selectors
    ///
    /// # Example
    ///
    /// ```no_run
    /// use listing_harvest::config::SelectorConfig;
    /// use listing_harvest::crawler::RecordExtractor;
    ///
    /// let extractor = RecordExtractor::new(&SelectorConfig::default(), "https://www.amazon.com").unwrap();
    /// let batch = extractor.extract("<html><body></body></html>");
    /// assert!(batch.is_empty());
    /// ```
    pub fn new(selectors: &SelectorConfig, origin: &str) -> ConfigResult<Self> {
        Ok(Self {
            result_item: compile(&selectors.result_item)?,
            title: compile(&selectors.title)?,
            price: compile(&selectors.price)?,
            rating: compile(&selectors.rating)?,
            link: compile(&selectors.link)?,
            origin: Url::parse(origin)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site origin '{}': {}", origin, e)))?,
        })
    }

    /// Extracts every valid product record from a page
    ///
    /// Never fails: a page without a results container, a CAPTCHA page or a
    /// page past the last result all produce an empty batch.
    pub fn extract(&self, html: &str) -> PageBatch {
        let document = Html::parse_document(html);
        let mut batch = Vec::new();

        for (index, node) in document.select(&self.result_item).enumerate() {
            match self.extract_node(node) {
                Some(record) => batch.push(record),
                None => {
                    tracing::trace!("Skipping result node {}: missing required field", index);
                }
            }
        }

        batch
    }

    fn extract_node(&self, node: ElementRef<'_>) -> Option<ProductRecord> {
        let title = all_text(node, &self.title);
        let price = first_text(node, &self.price);
        let rating = all_text(node, &self.rating);
        let url = self.link_url(node);

        ProductRecord::from_fields(title, price, rating, url)
    }

    /// Reads the first matching anchor's `href` and resolves it against the origin
    ///
    /// Absolute, root-relative, protocol-relative and path-relative links all
    /// resolve; anything that does not end up as http(s) is dropped.
    fn link_url(&self, node: ElementRef<'_>) -> Option<String> {
        let href = node
            .select(&self.link)
            .next()?
            .value()
            .attr("href")?
            .trim();

        if href.is_empty() {
            return None;
        }

        let resolved = self.origin.join(href).ok()?;
        matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
    }
}

fn compile(raw: &str) -> ConfigResult<Selector> {
    Selector::parse(raw).map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", raw, e)))
}

/// Text of all matches concatenated, trimmed; `None` if nothing matched
fn all_text(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let mut matched = false;
    let mut text = String::new();

    for element in node.select(selector) {
        matched = true;
        text.extend(element.text());
    }

    matched.then(|| text.trim().to_string())
}

/// Text of the first match, trimmed
fn first_text(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    node.select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.example.com";

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(&SelectorConfig::default(), ORIGIN).unwrap()
    }

    fn result_item(title: &str, price: &str, rating: &str, href: Option<&str>) -> String {
        let anchor = match href {
            Some(h) => format!(r#"<a href="{}"><span>{}</span></a>"#, h, title),
            None => format!("<a><span>{}</span></a>", title),
        };
        let price = if price.is_empty() {
            String::new()
        } else {
            format!(
                r#"<span class="a-price"><span class="a-offscreen">{}</span><span aria-hidden="true">{}</span></span>"#,
                price, price
            )
        };
        let rating = if rating.is_empty() {
            String::new()
        } else {
            format!(
                r#"<div class="a-row"><span class="a-icon-alt">{}</span></div>"#,
                rating
            )
        };
        format!(
            r#"<div class="s-result-item"><h2>{}</h2>{}{}</div>"#,
            anchor, price, rating
        )
    }

    fn page(items: &[String]) -> String {
        format!(
            r#"<html><body><div class="s-main-slot">{}</div></body></html>"#,
            items.concat()
        )
    }

    #[test]
    fn test_extracts_complete_record() {
        let html = page(&[result_item(
            "Laptop X",
            "$999.00",
            "4.5 out of 5 stars",
            Some("/dp/ABC"),
        )]);

        let batch = extractor().extract(&html);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Laptop X");
        assert_eq!(batch[0].price, "$999.00");
        assert_eq!(batch[0].rating, "4.5 out of 5 stars");
        assert_eq!(batch[0].url, "https://www.example.com/dp/ABC");
    }

    #[test]
    fn test_takes_first_offscreen_price() {
        let item = r#"<div class="s-result-item"><h2><a href="/dp/A"><span>A</span></a></h2>
            <span class="a-price"><span class="a-offscreen">$10.00</span></span>
            <span class="a-price"><span class="a-offscreen">$12.00</span></span></div>"#;
        let batch = extractor().extract(&page(&[item.to_string()]));
        assert_eq!(batch[0].price, "$10.00");
    }

    #[test]
    fn test_missing_rating_still_included() {
        let html = page(&[result_item("Laptop X", "$999.00", "", Some("/dp/ABC"))]);
        let batch = extractor().extract(&html);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].rating, "");
    }

    #[test]
    fn test_nodes_missing_required_fields_are_skipped() {
        let html = page(&[
            result_item("", "$1.00", "", Some("/dp/NO-TITLE")),
            result_item("No price", "", "", Some("/dp/NO-PRICE")),
            result_item("No link", "$2.00", "", None),
            result_item("Blank link", "$3.00", "", Some("   ")),
            result_item("Kept", "$4.00", "", Some("/dp/KEPT")),
        ]);

        let batch = extractor().extract(&html);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Kept");
    }

    #[test]
    fn test_whitespace_only_title_is_skipped() {
        let html = page(&[result_item("   \n  ", "$1.00", "", Some("/dp/A"))]);
        assert!(extractor().extract(&html).is_empty());
    }

    #[test]
    fn test_empty_when_no_results_container() {
        let html = r#"<html><body><form action="/errors/validateCaptcha"></form></body></html>"#;
        assert!(extractor().extract(html).is_empty());
    }

    #[test]
    fn test_empty_when_container_has_no_items() {
        let html = r#"<html><body><div class="s-main-slot"><div class="ad"></div></div></body></html>"#;
        assert!(extractor().extract(html).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn test_absolute_href_kept_and_relative_href_prefixed() {
        let html = page(&[
            result_item("Abs", "$1", "", Some("https://cdn.example.org/dp/X")),
            result_item("Rel", "$1", "", Some("dp/Y")),
            result_item("Proto", "$1", "", Some("//www.example.com/dp/Z")),
        ]);
        let batch = extractor().extract(&html);
        assert_eq!(batch[0].url, "https://cdn.example.org/dp/X");
        assert_eq!(batch[1].url, "https://www.example.com/dp/Y");
        assert_eq!(batch[2].url, "https://www.example.com/dp/Z");
    }

    #[test]
    fn test_non_http_href_is_skipped() {
        let html = page(&[
            result_item("Script", "$1", "", Some("javascript:void(0)")),
            result_item("Mail", "$1", "", Some("mailto:sales@example.com")),
        ]);
        assert!(extractor().extract(&html).is_empty());
    }

    #[test]
    fn test_origin_trailing_slash_is_ignored() {
        let extractor =
            RecordExtractor::new(&SelectorConfig::default(), "https://www.example.com/").unwrap();
        let html = page(&[result_item("A", "$1", "", Some("/dp/A"))]);
        assert_eq!(extractor.extract(&html)[0].url, "https://www.example.com/dp/A");
    }

    #[test]
    fn test_items_outside_main_slot_are_ignored() {
        let html = format!(
            r#"<html><body>{}<div class="s-main-slot">{}</div></body></html>"#,
            result_item("Outside", "$1", "", Some("/dp/OUT")),
            result_item("Inside", "$2", "", Some("/dp/IN")),
        );
        let batch = extractor().extract(&html);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Inside");
    }

    #[test]
    fn test_preserves_document_order() {
        let html = page(&[
            result_item("First", "$1", "", Some("/dp/1")),
            result_item("Second", "$2", "", Some("/dp/2")),
            result_item("Third", "$3", "", Some("/dp/3")),
        ]);
        let titles: Vec<_> = extractor()
            .extract(&html)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let mut selectors = SelectorConfig::default();
        selectors.title = "h2 >> [".to_string();
        assert!(matches!(
            RecordExtractor::new(&selectors, ORIGIN),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_invalid_origin_is_config_error() {
        assert!(matches!(
            RecordExtractor::new(&SelectorConfig::default(), "not a url"),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
