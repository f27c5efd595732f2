use objtracker_core::StoreError;

pub(crate) fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::PoolTimedOut => {
            StoreError::Connectivity("timed out acquiring a connection".to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
            StoreError::Connectivity(error.to_string())
        }
        error => StoreError::Backend(error.to_string()),
    }
}

pub(crate) fn map_migrate_error(error: sqlx::migrate::MigrateError) -> StoreError {
    match error {
        sqlx::migrate::MigrateError::Execute(error) => map_sqlx_error(error),
        error => StoreError::Backend(error.to_string()),
    }
}
