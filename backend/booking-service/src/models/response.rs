use serde::{Deserialize, Serialize};

/// Envelope for every successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Success without a payload, e.g. after a delete.
    pub fn done(message: impl Into<String>) -> Self {
        Self::ok(message, serde_json::Value::Null)
    }
}

/// `?page=` query, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self, per_page: i64) -> i64 {
        self.page().saturating_sub(1).saturating_mul(per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: PageQuery, per_page: i64, total: i64) -> Self {
        let page = query.page();
        Self {
            items,
            page,
            per_page,
            total,
            has_more: page.saturating_mul(per_page) < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_clamps_to_first_page() {
        assert_eq!(PageQuery { page: None }.offset(20), 0);
        assert_eq!(PageQuery { page: Some(0) }.offset(20), 0);
        assert_eq!(PageQuery { page: Some(-3) }.page(), 1);
        assert_eq!(PageQuery { page: Some(3) }.offset(10), 20);
    }

    #[test]
    fn test_huge_page_saturates() {
        let query = PageQuery {
            page: Some(i64::MAX),
        };
        assert_eq!(query.offset(20), i64::MAX);
        let page = Page::<i32>::new(Vec::new(), query, 20, 5);
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_has_more() {
        let page = Page::new(vec![1, 2], PageQuery { page: Some(1) }, 2, 5);
        assert!(page.has_more);
        let last = Page::new(vec![5], PageQuery { page: Some(3) }, 2, 5);
        assert!(!last.has_more);
    }
}
