//! Paging engine and the list views built on it.

use std::sync::Arc;

use objtracker_core::{
    query::{Page, PageMeta, Projection, Window},
    schema::{migrations, pods, vmis},
    StoreError, StoreResult, TabularSource,
};

/// `per_page` value that disables paging.
pub const NO_PAGING: i64 = -1;

/// Validated paging request. `page` is 1-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Paging {
    page: i64,
    per_page: i64,
    offset: i64,
}

impl Paging {
    pub fn new(page: i64, per_page: i64) -> StoreResult<Self> {
        if per_page == 0 {
            return Err(StoreError::Validation("perPage must not be 0".to_string()));
        }

        if per_page < NO_PAGING {
            return Err(StoreError::Validation(format!(
                "perPage must be positive or {NO_PAGING}, got {per_page}"
            )));
        }

        if page <= 0 {
            return Err(StoreError::Validation(format!(
                "page must be 1 or greater, got {page}"
            )));
        }

        let offset = if per_page == NO_PAGING {
            0
        } else {
            (page - 1)
                .checked_mul(per_page)
                .ok_or_else(|| StoreError::Validation(format!("page {page} is out of range")))?
        };

        Ok(Self {
            page,
            per_page,
            offset,
        })
    }

    pub fn window(&self) -> Option<Window> {
        if self.per_page == NO_PAGING {
            return None;
        }

        Some(Window {
            offset: self.offset,
            limit: self.per_page,
        })
    }

    pub fn total_pages(&self, total_rows: u64) -> u64 {
        if self.per_page == NO_PAGING {
            return 1;
        }

        let per_page = self.per_page as u64;
        let mut total_pages = total_rows / per_page;
        if total_rows % per_page > 0 {
            total_pages += 1;
        }

        total_pages
    }

    pub fn meta(&self, total_rows: u64) -> PageMeta {
        PageMeta {
            page: self.page,
            per_page: self.per_page,
            total_row_count: total_rows,
            total_pages: self.total_pages(total_rows),
        }
    }
}

/// Selects migrations of one vmi, by name within a namespace.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VmiReference {
    pub name: String,
    pub namespace: String,
}

pub struct QueryService {
    pub source: Arc<dyn TabularSource>,
}

impl QueryService {
    /// Runs `projection` and returns one page of it with the paging metadata.
    #[tracing::instrument(name = "service::query::execute", skip(self, projection))]
    pub async fn execute(
        &self,
        projection: &Projection,
        page: i64,
        per_page: i64,
    ) -> StoreResult<Page> {
        let paging = Paging::new(page, per_page)?;

        let total_rows = self.source.count(projection).await?;
        let data = self.source.fetch(projection, paging.window()).await?;

        tracing::debug!(total_rows, returned = data.len(), "page fetched");

        Ok(Page {
            data,
            meta: paging.meta(total_rows),
        })
    }

    pub async fn list_pods(&self, page: i64, per_page: i64) -> StoreResult<Page> {
        let projection = Projection::new(pods::TABLE, &pods::LIST_COLUMNS)
            .order_by(&[pods::CREATION_TIME, pods::UUID]);

        self.execute(&projection, page, per_page).await
    }

    pub async fn list_vmis(&self, page: i64, per_page: i64) -> StoreResult<Page> {
        let projection = Projection::new(vmis::TABLE, &vmis::LIST_COLUMNS)
            .order_by(&[vmis::CREATION_TIME, vmis::UUID]);

        self.execute(&projection, page, per_page).await
    }

    pub async fn list_migrations(
        &self,
        page: i64,
        per_page: i64,
        vmi: Option<&VmiReference>,
    ) -> StoreResult<Page> {
        let mut projection = Projection::new(migrations::TABLE, &migrations::LIST_COLUMNS)
            .order_by(&[migrations::CREATION_TIME, migrations::UUID]);

        if let Some(vmi) = vmi.filter(|vmi| !vmi.name.is_empty()) {
            projection = projection
                .filter(migrations::VMI_NAME, vmi.name.as_str())
                .filter(migrations::NAMESPACE, vmi.namespace.as_str());
        }

        self.execute(&projection, page, per_page).await
    }
}
