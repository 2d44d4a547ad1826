use serde::{Deserialize, Serialize};

/// One page of a larger, ordered result set. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page: page.max(1),
            per_page,
            total,
        }
    }

    /// Last page number; an empty result set still has page 1.
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    /// 1-based position of the first item on this page.
    pub fn from(&self) -> Option<u64> {
        (!self.items.is_empty()).then(|| (self.page - 1) * self.per_page + 1)
    }

    /// 1-based position of the last item on this page.
    pub fn to(&self) -> Option<u64> {
        self.from().map(|from| from + self.items.len() as u64 - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_for_partial_last_page() {
        let page = Page::new(vec![1, 2, 3, 4, 5], 2, 20, 25);

        assert_eq!(page.last_page(), 2);
        assert_eq!(page.from(), Some(21));
        assert_eq!(page.to(), Some(25));
    }

    #[test]
    fn empty_result_set() {
        let page: Page<u8> = Page::new(vec![], 1, 20, 0);

        assert_eq!(page.last_page(), 1);
        assert_eq!(page.from(), None);
        assert_eq!(page.to(), None);
    }
}
