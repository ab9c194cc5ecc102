use serde::Deserialize;

use crate::error::Error;

mod account;
mod friend_request;
mod user;

pub use account::Account;
pub use account::Profile;
pub use friend_request::FriendRequest;
pub use friend_request::PendingRequest;
pub use user::User;

pub const PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 10;

#[derive(Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// A validated window into an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn from_query(query: &PageQuery) -> Result<Self, Error> {
        let number = query.page.unwrap_or(1);

        if number < 1 {
            return Err(Error::NotFound("Invalid page.".to_string()));
        }

        let size = match query.page_size {
            Some(size) if size > 0 => size.min(MAX_PAGE_SIZE),
            _ => PAGE_SIZE,
        };

        // Offset has to fit in an i64
        if (number - 1).checked_mul(size).is_none() {
            return Err(Error::NotFound("Invalid page.".to_string()));
        }

        Ok(Self { number, size })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    /// Anything past the first page must hold at least one item
    pub fn check<T>(&self, items: Vec<T>) -> Result<Vec<T>, Error> {
        if items.is_empty() && self.number > 1 {
            return Err(Error::NotFound("Invalid page.".to_string()));
        }

        Ok(items)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_capped() {
        let page = Page::from_query(&PageQuery {
            page: None,
            page_size: Some(500),
        })
        .unwrap();

        assert_eq!(page.size, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn zero_page_size_falls_back_to_default() {
        let page = Page::from_query(&PageQuery {
            page: Some(3),
            page_size: Some(0),
        })
        .unwrap();

        assert_eq!(page.size, PAGE_SIZE);
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn page_zero_is_invalid() {
        let result = Page::from_query(&PageQuery {
            page: Some(0),
            page_size: None,
        });

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn page_with_unrepresentable_offset_is_invalid() {
        let result = Page::from_query(&PageQuery {
            page: Some(i64::MAX),
            page_size: None,
        });

        assert!(matches!(result, Err(Error::NotFound(_))));

        let last_fitting = Page::from_query(&PageQuery {
            page: Some(i64::MAX / PAGE_SIZE + 1),
            page_size: None,
        })
        .unwrap();
        assert!(last_fitting.offset() > 0);
    }

    #[test]
    fn empty_first_page_is_fine_but_later_ones_are_not() {
        assert!(Page::default().check(Vec::<i64>::new()).is_ok());

        let second = Page { number: 2, size: 10 };
        assert!(matches!(
            second.check(Vec::<i64>::new()),
            Err(Error::NotFound(_))
        ));
    }
}
