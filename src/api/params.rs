use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::models::bookmark::BookmarkQuery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Normal,
    Reverse,
}

/// Raw query string of the bookmark pages; `searchTag` may repeat.
#[derive(Debug, Default, Deserialize)]
pub struct RawSearchParams {
    pub page: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
    #[serde(default, rename = "searchTag")]
    pub search_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub page: u64,
    pub order: Order,
    pub search: String,
    pub search_tags: Vec<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            page: 1,
            order: Order::Normal,
            search: String::new(),
            search_tags: Vec::new(),
        }
    }
}

impl TryFrom<RawSearchParams> for SearchParams {
    type Error = ApiError;

    fn try_from(raw: RawSearchParams) -> Result<Self, Self::Error> {
        let mut params = Self::default();

        if let Some(page) = raw.page.filter(|p| !p.is_empty()) {
            params.page = page
                .parse::<u64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| ApiError::validation(format!("Invalid page: {page}")))?;
        }

        if let Some(order) = raw.order.filter(|o| !o.is_empty()) {
            params.order = match order.as_str() {
                "normal" => Order::Normal,
                "reverse" => Order::Reverse,
                _ => return Err(ApiError::validation(format!("Invalid order: {order}"))),
            };
        }

        params.search = raw.search.unwrap_or_default();
        params.search_tags = raw.search_tags;

        Ok(params)
    }
}

impl SearchParams {
    #[must_use]
    pub fn with_page(&self, page: u64) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Percent-encoded query string with a leading `?`, or empty when every
    /// parameter has its default value.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());

        if self.page != 1 {
            serializer.append_pair("page", &self.page.to_string());
        }
        if self.order == Order::Reverse {
            serializer.append_pair("order", "reverse");
        }
        if !self.search.is_empty() {
            serializer.append_pair("search", &self.search);
        }
        for tag in &self.search_tags {
            serializer.append_pair("searchTag", tag);
        }

        let encoded = serializer.finish();
        if encoded.is_empty() {
            encoded
        } else {
            format!("?{encoded}")
        }
    }

    /// # Errors
    ///
    /// Pages whose offset does not fit a SQLite integer are a validation error.
    pub fn to_query(&self, page_size: u64) -> Result<BookmarkQuery, ApiError> {
        let offset = (self.page - 1)
            .checked_mul(page_size)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| ApiError::validation(format!("Invalid page: {}", self.page)))?;

        Ok(BookmarkQuery {
            reverse: self.order == Order::Reverse,
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
            tags: self.search_tags.clone(),
            limit: Some(page_size),
            offset,
        })
    }
}
