//! Generic paginated repository over a [`RecordStore`].

use std::future::Future;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt, PageRequest, Paginated};
use domain::{Record, COLUMN_ID, COLUMN_UPDATED_AT};

use super::aggregate::{group_average, AggregateStat};
use super::state::CollectionState;
use crate::store::{Filter, Join, RecordStore, Row, SelectQuery, SortSpec};

/// What varies between entities: table, join, default order, mutability.
#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub name: &'static str,
    pub join: Option<Join>,
    pub default_sort: SortSpec,
    /// Refresh `updated_at` on every update
    pub timestamped: bool,
    /// Append-only entities reject update and delete
    pub mutable: bool,
}

impl EntityConfig {
    pub fn new(name: &'static str, default_sort: SortSpec) -> Self {
        Self {
            name,
            join: None,
            default_sort,
            timestamped: true,
            mutable: true,
        }
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.join = Some(join);
        self
    }

    pub fn append_only(mut self) -> Self {
        self.timestamped = false;
        self.mutable = false;
        self
    }
}

/// Typed list parameters of one entity.
pub trait EntityQuery {
    fn filter(&self) -> Filter;
}

pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    config: EntityConfig,
    state: CollectionState<T>,
}

impl<T> Repository<T>
where
    T: Record + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(store: Arc<dyn RecordStore>, config: EntityConfig) -> Self {
        Self {
            store,
            config,
            state: CollectionState::new(),
        }
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// Last fetched page with loading and error flags.
    pub fn state(&self) -> &CollectionState<T> {
        &self.state
    }

    /// Fetch one page of records matching every condition of `filter`.
    pub async fn list(&self, filter: Filter, sort: SortSpec, page: PageRequest) -> AppResult<Paginated<T>> {
        self.track(async {
            let query = self.select().filter(filter).order_by(sort);
            let set = self.store.select(&query, Some(page.range())).await?;

            let mut data = decode_rows(set.rows)?;
            data.truncate(page.page_size() as usize);
            debug!(
                entity = self.config.name,
                page = page.page(),
                rows = data.len(),
                total = set.total,
                "Listed records"
            );

            self.state.replace(data.clone()).await;
            Ok(Paginated::new(data, &page, set.total))
        })
        .await
    }

    /// List with the entity's typed query and default order.
    pub async fn find<Q: EntityQuery>(&self, query: &Q, page: PageRequest) -> AppResult<Paginated<T>> {
        self.list(query.filter(), self.config.default_sort.clone(), page)
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<T> {
        self.track(async { decode(self.fetch(id).await?.ok_or_not_found()?) })
            .await
    }

    /// Insert a record and return it as stored, with generated id and timestamps.
    pub async fn create<F: Serialize + Sync>(&self, form: &F) -> AppResult<T> {
        self.track(async {
            let row = self.store.insert(self.config.name, to_row(form)?).await?;
            let record: T = decode(row)?;
            info!(entity = self.config.name, id = %record.id(), "Created record");

            self.state.mark_stale().await;
            Ok(record)
        })
        .await
    }

    /// Apply the fields present in `patch`.
    pub async fn update<P: Serialize + Sync>(&self, id: Uuid, patch: &P) -> AppResult<T> {
        self.track(async {
            self.ensure_mutable()?;

            let mut row = to_row(patch)?;
            row.remove(COLUMN_ID);
            if self.config.timestamped {
                row.insert(COLUMN_UPDATED_AT.to_string(), Value::String(timestamp()));
            }

            let row = self
                .store
                .update(self.config.name, id, row)
                .await?
                .ok_or_not_found()?;
            // The returned row has no joined data; read it back the way `get` does.
            let row = match self.config.join {
                Some(_) => self.fetch(id).await?.unwrap_or(row),
                None => row,
            };
            let record: T = decode(row)?;
            info!(entity = self.config.name, %id, "Updated record");

            self.state.upsert(&record).await;
            Ok(record)
        })
        .await
    }

    /// Delete by id. Deleting an absent id succeeds.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.track(async {
            self.ensure_mutable()?;

            let removed = self.store.delete(self.config.name, id).await?;
            if removed == 0 {
                debug!(entity = self.config.name, %id, "Delete of absent record");
            } else {
                info!(entity = self.config.name, %id, "Deleted record");
            }

            self.state.evict(id).await;
            Ok(())
        })
        .await
    }

    /// Average `value_field` per distinct `group_field` over every matching row.
    pub async fn aggregate(
        &self,
        group_field: &str,
        value_field: &str,
        filter: Filter,
    ) -> AppResult<Vec<AggregateStat>> {
        self.track(async {
            let query = SelectQuery::new(self.config.name)
                .columns(&[group_field, value_field])
                .filter(filter);
            let set = self.store.select(&query, None).await?;
            group_average(&set.rows, group_field, value_field)
        })
        .await
    }

    fn select(&self) -> SelectQuery {
        SelectQuery::new(self.config.name).join(self.config.join.clone())
    }

    /// Read one row by primary key, with the configured join.
    async fn fetch(&self, id: Uuid) -> AppResult<Option<Row>> {
        let query = self.select().filter(Filter::new().eq_id(COLUMN_ID, id));
        let set = self.store.select(&query, None).await?;
        Ok(set.rows.into_iter().next())
    }

    fn ensure_mutable(&self) -> AppResult<()> {
        if self.config.mutable {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Records of '{}' cannot be modified",
                self.config.name
            )))
        }
    }

    /// Run one operation with loading and error flags maintained.
    async fn track<R>(&self, operation: impl Future<Output = AppResult<R>>) -> AppResult<R> {
        let _in_flight = self.state.begin().await;
        let result = operation.await;
        if let Err(err) = &result {
            self.state.fail(err.to_string()).await;
        }
        result
    }
}

fn to_row<S: Serialize>(value: &S) -> AppResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::internal(format!("Expected an object, got {}", other))),
    }
}

fn decode<T: DeserializeOwned>(row: Row) -> AppResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> AppResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockRecordStore, RowSet, StoreError};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Note {
        id: Uuid,
        text: String,
    }

    impl Record for Note {
        fn id(&self) -> Uuid {
            self.id
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct LinkedNote {
        id: Uuid,
        text: String,
        people: Option<Value>,
    }

    impl Record for LinkedNote {
        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn repo(store: MockRecordStore, config: EntityConfig) -> Repository<Note> {
        Repository::new(Arc::new(store), config)
    }

    fn notes() -> EntityConfig {
        EntityConfig::new("notes", SortSpec::desc("created_at"))
    }

    #[tokio::test]
    async fn test_list_passes_range_and_total() {
        let id = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store
            .expect_select()
            .withf(|query, range| {
                query.entity == "notes"
                    && query.sort == Some(SortSpec::desc("created_at"))
                    && *range == Some(common::RowRange { from: 10, to: 19 })
            })
            .returning(move |_, _| {
                Ok(RowSet {
                    rows: vec![row(json!({"id": id, "text": "hi"}))],
                    total: 11,
                })
            });

        let repo = repo(store, notes());
        let page = repo
            .list(Filter::new(), SortSpec::desc("created_at"), PageRequest::new(2, 10).unwrap())
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.total, 11);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(repo.state().items().await, page.data);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_and_sets_error() {
        let mut store = MockRecordStore::new();
        store
            .expect_select()
            .returning(|_, _| Err(StoreError::query("connection reset")));

        let repo = repo(store, notes());
        let result = repo.get(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::Store(_))));
        assert!(repo.state().error().await.is_some());
        assert!(!repo.state().is_loading());
    }

    #[tokio::test]
    async fn test_get_without_rows_is_not_found() {
        let mut store = MockRecordStore::new();
        store.expect_select().returning(|_, _| Ok(RowSet::default()));

        let repo = repo(store, notes());
        assert!(matches!(repo.get(Uuid::new_v4()).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_sets_updated_at_and_drops_id() {
        let id = Uuid::new_v4();
        let mut store = MockRecordStore::new();
        store
            .expect_update()
            .withf(move |entity, target, patch| {
                entity == "notes"
                    && *target == id
                    && !patch.contains_key("id")
                    && patch.get("text") == Some(&json!("new"))
                    && patch.get("updated_at").is_some_and(Value::is_string)
            })
            .returning(move |_, _, _| Ok(Some(row(json!({"id": id, "text": "new"})))));

        let repo = repo(store, notes());
        let note = repo
            .update(id, &json!({"id": Uuid::new_v4(), "text": "new"}))
            .await
            .unwrap();

        assert_eq!(note.text, "new");
    }

    #[tokio::test]
    async fn test_update_of_joined_entity_reads_back_and_keeps_cache_join() {
        let id = Uuid::new_v4();
        let joined = move |text: &str| {
            row(json!({"id": id, "text": text, "people": {"name": "Ann"}}))
        };
        let listed = joined("old");
        let refreshed = joined("new");

        let mut store = MockRecordStore::new();
        let mut reads = mockall::Sequence::new();
        store
            .expect_select()
            .times(1)
            .in_sequence(&mut reads)
            .returning(move |_, _| Ok(RowSet { rows: vec![listed.clone()], total: 1 }));
        store
            .expect_update()
            .returning(move |_, _, _| Ok(Some(row(json!({"id": id, "text": "new"})))));
        store
            .expect_select()
            .times(1)
            .in_sequence(&mut reads)
            .withf(move |query, range| {
                query.join.is_some()
                    && query.filter == Filter::new().eq_id(COLUMN_ID, id)
                    && range.is_none()
            })
            .returning(move |_, _| Ok(RowSet { rows: vec![refreshed.clone()], total: 1 }));

        let repo: Repository<LinkedNote> = Repository::new(
            Arc::new(store),
            notes().with_join(Join::new("people", "person_id").columns(&["name"])),
        );
        repo.list(Filter::new(), SortSpec::desc("created_at"), PageRequest::default())
            .await
            .unwrap();

        let note = repo.update(id, &json!({"text": "new"})).await.unwrap();

        assert_eq!(note.people, Some(json!({"name": "Ann"})));
        let cached = repo.state().items().await;
        assert_eq!(cached[0].text, "new");
        assert!(cached[0].people.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let mut store = MockRecordStore::new();
        store.expect_update().returning(|_, _, _| Ok(None));

        let repo = repo(store, notes());
        let result = repo.update(Uuid::new_v4(), &json!({"text": "x"})).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_constraint_on_create_is_validation() {
        let mut store = MockRecordStore::new();
        store
            .expect_insert()
            .returning(|_, _| Err(StoreError::constraint("duplicate key value")));

        let repo = repo(store, notes());
        let result = repo.create(&json!({"text": "x"})).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_absent_id_succeeds() {
        let mut store = MockRecordStore::new();
        store.expect_delete().times(1).returning(|_, _| Ok(0));

        let repo = repo(store, notes());
        assert!(repo.delete(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_append_only_rejects_mutation_without_store_call() {
        let store = MockRecordStore::new();
        let repo = repo(store, notes().append_only());

        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            repo.update(Uuid::new_v4(), &json!({"text": "x"})).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_aggregate_selects_only_the_two_columns() {
        let mut store = MockRecordStore::new();
        store
            .expect_select()
            .withf(|query, range| {
                query.columns == vec!["subject".to_string(), "score".to_string()]
                    && query.join.is_none()
                    && range.is_none()
            })
            .returning(|_, _| {
                Ok(RowSet {
                    rows: vec![row(json!({"subject": "math", "score": 80}))],
                    total: 1,
                })
            });

        let repo = repo(store, notes());
        let stats = repo.aggregate("subject", "score", Filter::new()).await.unwrap();
        assert_eq!(stats[0].count, 1);
    }
}
