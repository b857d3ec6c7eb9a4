use crate::core::error::FieldError;
use crate::models::ListProfilesQuery;

/// A validated, 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Resolve query parameters against the configured defaults
    pub fn from_query(
        query: ListProfilesQuery,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Result<Self, Vec<FieldError>> {
        let page = query.page.unwrap_or(1);
        let page_size = query.page_size.unwrap_or(default_page_size);
        let mut errors = Vec::new();

        if page == 0 {
            errors.push(FieldError::new("page", "must be at least 1"));
        }
        if page_size == 0 || page_size > max_page_size {
            errors.push(FieldError::new(
                "pageSize",
                format!("must be between 1 and {}", max_page_size),
            ));
        }

        if errors.is_empty() {
            Ok(Self { page, page_size })
        } else {
            Err(errors)
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let page = PageRequest::from_query(ListProfilesQuery::default(), 10, 100).unwrap();
        assert_eq!(page, PageRequest { page: 1, page_size: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let query = ListProfilesQuery { page: Some(3), page_size: Some(10) };
        let page = PageRequest::from_query(query, 10, 100).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(21), 3);
        assert_eq!(page.total_pages(30), 3);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let query = ListProfilesQuery { page: Some(0), page_size: Some(500) };
        let errors = PageRequest::from_query(query, 10, 100).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
