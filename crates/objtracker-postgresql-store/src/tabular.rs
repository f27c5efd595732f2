use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, PgPool, Postgres, Row, TypeInfo};
use std::sync::Arc;
use std::time::Duration;

use objtracker_core::{
    query::{Filter, Projection, Record, Value, Window},
    timestamp, with_deadline, StoreResult, TabularSource,
};

use crate::error::map_sqlx_error;

/// Renders `projection` as a SELECT. Column and table names come from the
/// fixed schema; every filter value becomes a numbered parameter. Returns the
/// statement and the number of parameters it uses.
fn select_sql(projection: &Projection) -> (String, usize) {
    let columns = projection
        .columns
        .iter()
        .map(|column| format!("{} AS \"{}\"", column.name, column.label))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("SELECT {columns} FROM {}", projection.table.name());

    let mut parameters = 0;
    let predicates = projection
        .filters
        .iter()
        .map(|filter| match filter.value {
            Value::Null => format!("{} IS NULL", filter.column.name),
            _ => {
                parameters += 1;
                format!("{} = ${parameters}", filter.column.name)
            }
        })
        .collect::<Vec<_>>();

    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }

    if !projection.order_by.is_empty() {
        let order_by = projection
            .order_by
            .iter()
            .map(|column| format!("{} ASC", column.name))
            .collect::<Vec<_>>()
            .join(", ");

        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by);
    }

    (sql, parameters)
}

fn bind_filters<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    filters: &'q [Filter],
) -> Query<'q, Postgres, PgArguments> {
    for filter in filters {
        query = match &filter.value {
            Value::Null => query,
            Value::Bool(flag) => query.bind(*flag),
            Value::Number(number) => query.bind(*number),
            Value::Text(text) => query.bind(text.as_str()),
        };
    }

    query
}

fn decode_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|number| Value::Number(number.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|number| Value::Number(number.into())),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::Number),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|instant| Value::Text(timestamp::canonical(&instant))),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)?
            .map(|json| Value::Text(json.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::Text(String::from_utf8_lossy(&bytes).into_owned())),
        _ => row.try_get::<Option<String>, _>(index)?.map(Value::Text),
    };

    Ok(value.unwrap_or(Value::Null))
}

fn decode_record(row: &PgRow) -> Result<Record, sqlx::Error> {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_value(row, column.ordinal(), column.type_info().name())?;
            Ok((column.name().to_string(), value))
        })
        .collect()
}

#[derive(Debug)]
pub struct RelationalTabularSource {
    pub(crate) db: Arc<PgPool>,
    pub(crate) deadline: Duration,
}

#[async_trait]
impl TabularSource for RelationalTabularSource {
    #[tracing::instrument(name = "relational::tabular::count", skip_all)]
    async fn count(&self, projection: &Projection) -> StoreResult<u64> {
        let (sql, _) = select_sql(projection);
        let count_sql = format!("SELECT count(*) AS total FROM ({sql}) AS tmp");

        with_deadline("relational::tabular::count", self.deadline, async {
            let row = bind_filters(sqlx::query(&count_sql), &projection.filters)
                .fetch_one(&*self.db)
                .await
                .map_err(map_sqlx_error)?;

            let total: i64 = row.try_get(0).map_err(map_sqlx_error)?;

            Ok(total.max(0) as u64)
        })
        .await
    }

    #[tracing::instrument(name = "relational::tabular::fetch", skip_all)]
    async fn fetch(
        &self,
        projection: &Projection,
        window: Option<Window>,
    ) -> StoreResult<Vec<Record>> {
        let (mut sql, parameters) = select_sql(projection);
        if window.is_some() {
            sql.push_str(&format!(
                " LIMIT ${} OFFSET ${}",
                parameters + 1,
                parameters + 2
            ));
        }

        with_deadline("relational::tabular::fetch", self.deadline, async {
            let mut query = bind_filters(sqlx::query(&sql), &projection.filters);
            if let Some(window) = window {
                query = query.bind(window.limit).bind(window.offset);
            }

            let rows = query.fetch_all(&*self.db).await.map_err(map_sqlx_error)?;

            rows.iter()
                .map(decode_record)
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sqlx_error)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use objtracker_core::schema::{migrations, pods};

    use super::*;

    #[test]
    fn test_select_sql_binds_filters() {
        let columns = [migrations::NAME, migrations::VMI_NAME];
        let projection = Projection::new(migrations::TABLE, &columns)
            .filter(migrations::VMI_NAME, "vmi-a")
            .filter(migrations::NAMESPACE, "ns")
            .filter(migrations::END_TIMESTAMP, Value::Null)
            .order_by(&[migrations::CREATION_TIME, migrations::UUID]);

        let (sql, parameters) = select_sql(&projection);

        assert_eq!(
            sql,
            "SELECT name AS \"name\", vmi_name AS \"vmiName\" FROM vmimigrations \
             WHERE vmi_name = $1 AND namespace = $2 AND end_timestamp IS NULL \
             ORDER BY creation_time ASC, uuid ASC"
        );
        assert_eq!(parameters, 2);
    }

    #[test]
    fn test_select_sql_without_filters() {
        let projection = Projection::new(pods::TABLE, &[pods::UUID]);

        let (sql, parameters) = select_sql(&projection);

        assert_eq!(sql, "SELECT uuid AS \"uuid\" FROM pods");
        assert_eq!(parameters, 0);
    }

    #[cfg(feature = "pg-tests")]
    #[tokio::test]
    async fn test_fetch_filtered_records() {
        use objtracker_core::{test::get_migration_fixture, Persistence};

        let store = crate::postgresql::tests::ensure_store().await;
        let vmi_name = format!("vmi-{}", uuid::Uuid::new_v4());

        let mut migration =
            get_migration_fixture(Some(&format!("migration-{}", uuid::Uuid::new_v4())));
        migration.vmi_name = vmi_name.clone();
        store.migrations().upsert(&migration).await.unwrap();

        let projection = Projection::new(migrations::TABLE, &migrations::LIST_COLUMNS)
            .filter(migrations::VMI_NAME, vmi_name.as_str())
            .order_by(&[migrations::CREATION_TIME, migrations::UUID]);
        let tabular = store.tabular();

        assert_eq!(tabular.count(&projection).await.unwrap(), 1);

        let records = tabular
            .fetch(&projection, Some(Window { offset: 0, limit: 10 }))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["uuid"], Value::Text(migration.uuid.clone()));
        assert_eq!(records[0]["completed"], Value::Bool(false));
        assert_eq!(records[0]["endTimestamp"], Value::Null);
        assert_eq!(
            records[0]["creationTime"],
            Value::Text(timestamp::canonical(&migration.creation_time))
        );
    }
}
