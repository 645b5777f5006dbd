pub mod dashboard;
pub mod document_lifecycle;
pub mod documents;
pub mod inventory;
pub mod reference;
pub mod totals;

use sea_orm::{EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db::DbPool, errors::ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A validated page request; `page` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// `limit` is expected to be clamped to the configured bounds already.
    pub fn new(page: Option<u64>, limit: u64) -> Result<Self, ServiceError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "page must be 1 or greater".to_string(),
            ));
        }
        Ok(Self {
            page,
            limit: limit.max(1),
        })
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Runs `select` as a page query.
pub(crate) async fn fetch_page<E>(
    db: &DbPool,
    select: Select<E>,
    request: PageRequest,
) -> Result<Page<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    let paginator = select.paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.page - 1).await?;
    Ok(Page {
        items,
        total,
        page: request.page,
        limit: request.limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_is_rejected() {
        assert!(PageRequest::new(Some(0), 20).is_err());
        assert_eq!(PageRequest::new(None, 0).unwrap(), PageRequest { page: 1, limit: 1 });
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::<u8> {
            items: vec![],
            total: 41,
            page: 1,
            limit: 20,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
