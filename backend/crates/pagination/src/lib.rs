//! Offset pagination primitives shared by listing endpoints.
//!
//! [`PageRequest`] validates the zero-based page index and the page size a
//! caller asks for, and translates them into the offset/limit pair storage
//! adapters understand. [`Page`] is the envelope returned to callers: the
//! total row count joined with the rows of one page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page index used when the caller does not supply one.
pub const DEFAULT_PAGE_INDEX: u32 = 0;
/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validation errors raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// A page must hold at least one row.
    #[error("page size must be greater than zero")]
    ZeroSize,
    /// The requested size exceeds [`MAX_PAGE_SIZE`].
    #[error("page size must not exceed {max}, got {requested}")]
    SizeTooLarge {
        /// Size supplied by the caller.
        requested: u32,
        /// Configured upper bound.
        max: u32,
    },
}

/// Validated zero-based page selection.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(2, 10).expect("valid page");
/// assert_eq!(request.offset(), 20);
/// assert_eq!(request.limit(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "PageRequestDto", into = "PageRequestDto")]
pub struct PageRequest {
    index: u32,
    size: u32,
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `size` is zero or larger than
    /// [`MAX_PAGE_SIZE`].
    pub const fn new(index: u32, size: u32) -> Result<Self, PageRequestError> {
        if size == 0 {
            return Err(PageRequestError::ZeroSize);
        }
        if size > MAX_PAGE_SIZE {
            return Err(PageRequestError::SizeTooLarge {
                requested: size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { index, size })
    }

    /// Zero-based page index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Number of rows per page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of rows preceding this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.index as u64 * self.size as u64
    }

    /// Maximum number of rows on this page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            index: DEFAULT_PAGE_INDEX,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRequestDto {
    index: u32,
    size: u32,
}

impl From<PageRequest> for PageRequestDto {
    fn from(value: PageRequest) -> Self {
        Self {
            index: value.index,
            size: value.size,
        }
    }
}

impl TryFrom<PageRequestDto> for PageRequest {
    type Error = PageRequestError;

    fn try_from(value: PageRequestDto) -> Result<Self, Self::Error> {
        Self::new(value.index, value.size)
    }
}

/// One page of rows joined with the total row count.
///
/// # Examples
/// ```
/// use pagination::Page;
///
/// let page = Page::new(2, vec!["a", "b"]);
/// assert_eq!(page.total(), 2);
/// assert_eq!(page.items().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    total: u64,
    items: Vec<T>,
}

impl<T> Page<T> {
    /// Join a total count with the rows of one page.
    #[must_use]
    pub const fn new(total: u64, items: Vec<T>) -> Self {
        Self { total, items }
    }

    /// An empty page reporting zero rows.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    /// Total rows across every page.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Rows on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Split the page into its total and rows.
    #[must_use]
    pub fn into_parts(self) -> (u64, Vec<T>) {
        (self.total, self.items)
    }
}
