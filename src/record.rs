//! Product record types shared by the crawler, storage and API layers

use serde::Serialize;

/// A product extracted from one search-result node
///
/// `title`, `price` and `url` are required; `rating` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub title: String,
    pub price: String,
    pub rating: String,
    pub url: String,
}

impl ProductRecord {
    /// Builds a record from the outcome of the four field lookups
    ///
    /// Returns `None` unless title, price and url are all present and
    /// non-empty after trimming. A missing rating becomes an empty string.
    pub fn from_fields(
        title: Option<String>,
        price: Option<String>,
        rating: Option<String>,
        url: Option<String>,
    ) -> Option<Self> {
        let title = non_empty(title)?;
        let price = non_empty(price)?;
        let url = non_empty(url)?;
        let rating = rating.map(|r| r.trim().to_string()).unwrap_or_default();

        Some(Self {
            title,
            price,
            rating,
            url,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// All valid records extracted from a single page, in document order
pub type PageBatch = Vec<ProductRecord>;

/// A product record as persisted by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub title: String,
    pub price: String,
    pub rating: String,
    pub url: String,
}

impl StoredRecord {
    /// Returns the record without its store-assigned id
    pub fn to_product(&self) -> ProductRecord {
        ProductRecord {
            title: self.title.clone(),
            price: self.price.clone(),
            rating: self.rating.clone(),
            url: self.url.clone(),
        }
    }
}
