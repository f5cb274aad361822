//! In-memory store.
//!
//! Behaves like the PostgreSQL backend for everything repositories observe:
//! server-assigned `id` and timestamps, NOT NULL and UNIQUE checks,
//! case-insensitive LIKE patterns, NULLs sorting after every value, stable
//! ordering of ties and inclusive row ranges.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use common::RowRange;

use super::error::{StoreError, StoreResult};
use super::query::{Condition, Direction, Filter, Join, Row, RowSet, SelectQuery};
use super::RecordStore;

const ID: &str = "id";

/// Table definition for the in-memory store.
#[derive(Debug, Clone)]
pub struct TableSpec {
    name: String,
    required: Vec<String>,
    unique: Vec<String>,
    timestamps: bool,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            unique: Vec::new(),
            timestamps: false,
        }
    }

    /// Columns that must be present and non-null
    pub fn required(mut self, columns: &[&str]) -> Self {
        self.required = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Columns whose non-null values must be distinct
    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Fill `created_at` and `updated_at` on insert
    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }
}

struct Table {
    layout: TableSpec,
    rows: Vec<Row>,
}

impl Table {
    fn check_constraints(&self, row: &Row, skip_index: Option<usize>) -> StoreResult<()> {
        for column in &self.layout.required {
            if row.get(column).map_or(true, Value::is_null) {
                return Err(StoreError::constraint(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    column, self.layout.name
                )));
            }
        }

        let unique = std::iter::once(ID).chain(self.layout.unique.iter().map(String::as_str));
        for column in unique {
            let Some(value) = row.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let duplicate = self
                .rows
                .iter()
                .enumerate()
                .any(|(i, existing)| Some(i) != skip_index && existing.get(column) == Some(value));
            if duplicate {
                return Err(StoreError::constraint(format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    self.layout.name, column
                )));
            }
        }

        Ok(())
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        let id = id.to_string();
        self.rows
            .iter()
            .position(|row| row.get(ID).and_then(Value::as_str) == Some(id.as_str()))
    }
}

/// Store backed by process memory, used by tests and local runs.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStore {
    pub fn with_tables(specs: impl IntoIterator<Item = TableSpec>) -> Self {
        let tables = specs
            .into_iter()
            .map(|layout| (layout.name.clone(), Table { layout, rows: Vec::new() }))
            .collect();

        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn missing_relation(entity: &str) -> StoreError {
    StoreError::query(format!("relation \"{}\" does not exist", entity))
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn select(&self, query: &SelectQuery, range: Option<RowRange>) -> StoreResult<RowSet> {
        let tables = self.tables.read().await;
        let table = tables.get(&query.entity).ok_or_else(|| missing_relation(&query.entity))?;

        let predicates = compile(&query.filter)?;
        let mut matched: Vec<&Row> = table
            .rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .collect();

        if let Some(sort) = &query.sort {
            // sort_by is stable, so ties keep insertion order
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
                match sort.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let total = matched.len() as u64;
        let (skip, take) = match range {
            Some(range) => (range.from as usize, range.limit() as usize),
            None => (0, matched.len()),
        };

        let joined = match &query.join {
            Some(join) => Some((
                join,
                tables.get(&join.entity).ok_or_else(|| missing_relation(&join.entity))?,
            )),
            None => None,
        };

        let rows = matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| {
                let mut out = project(row, &query.columns);
                if let Some((join, target)) = joined {
                    out.insert(join.entity.clone(), lookup(row, join, target));
                }
                out
            })
            .collect();

        Ok(RowSet { rows, total })
    }

    async fn insert(&self, entity: &str, mut row: Row) -> StoreResult<Row> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(entity).ok_or_else(|| missing_relation(entity))?;

        if row.get(ID).map_or(true, Value::is_null) {
            row.insert(ID.to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if table.layout.timestamps {
            let stamp = now();
            row.entry("created_at").or_insert_with(|| stamp.clone());
            row.entry("updated_at").or_insert(stamp);
        }

        table.check_constraints(&row, None)?;
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, entity: &str, id: Uuid, patch: Row) -> StoreResult<Option<Row>> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(entity).ok_or_else(|| missing_relation(entity))?;

        let Some(index) = table.position(id) else {
            return Ok(None);
        };

        let mut updated = table.rows[index].clone();
        for (column, value) in patch {
            if column != ID {
                updated.insert(column, value);
            }
        }

        table.check_constraints(&updated, Some(index))?;
        table.rows[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, entity: &str, id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(entity).ok_or_else(|| missing_relation(entity))?;

        match table.position(id) {
            Some(index) => {
                table.rows.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

enum Predicate<'a> {
    Equals { field: &'a str, value: &'a Value },
    Text { field: &'a str, text: String },
    Matches { fields: Vec<&'a str>, regex: Regex },
}

impl Predicate<'_> {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Equals { field, value } => values_equal(row.get(*field), value),
            Predicate::Text { field, text } => {
                row.get(*field).and_then(as_text).as_deref() == Some(text.as_str())
            }
            Predicate::Matches { fields, regex } => fields.iter().any(|field| {
                row.get(*field)
                    .and_then(as_text)
                    .is_some_and(|text| regex.is_match(&text))
            }),
        }
    }
}

fn compile(filter: &Filter) -> StoreResult<Vec<Predicate<'_>>> {
    filter
        .conditions()
        .iter()
        .map(|condition| -> StoreResult<Predicate<'_>> {
            Ok(match condition {
                Condition::Equals { field, value } => Predicate::Equals { field, value },
                Condition::EqualsId { field, id } => Predicate::Text {
                    field,
                    text: id.to_string(),
                },
                Condition::Pattern { field, pattern } => Predicate::Matches {
                    fields: vec![field.as_str()],
                    regex: like_to_regex(pattern)?,
                },
                Condition::AnyPattern { fields, pattern } => Predicate::Matches {
                    fields: fields.iter().map(String::as_str).collect(),
                    regex: like_to_regex(pattern)?,
                },
            })
        })
        .collect()
}

/// Translate an ILIKE pattern into an anchored, case-insensitive regex.
fn like_to_regex(pattern: &str) -> StoreResult<Regex> {
    let mut source = String::from("(?is)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    source.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');

    Regex::new(&source).map_err(|e| StoreError::query(format!("invalid pattern {:?}: {}", pattern, e)))
}

/// Text rendering of a column, as a `::text` cast would produce. NULL has none.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn values_equal(column: Option<&Value>, expected: &Value) -> bool {
    let column = column.unwrap_or(&Value::Null);
    match (column, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (column, Value::String(expected)) => as_text(column).as_deref() == Some(expected.as_str()),
        (column, expected) => column == expected,
    }
}

/// Ordering used for sorting: NULL (or missing) sorts after every value.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => match (instant(x), instant(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => as_text(x).cmp(&as_text(y)),
    }
}

/// RFC 3339 timestamps compare by instant, whatever their fractional precision.
fn instant(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text).ok().map(|t| t.with_timezone(&Utc))
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn lookup(row: &Row, join: &Join, target: &Table) -> Value {
    let Some(key) = row.get(&join.local_key).filter(|v| !v.is_null()) else {
        return Value::Null;
    };
    target
        .rows
        .iter()
        .find(|candidate| candidate.get(&join.foreign_key) == Some(key))
        .map(|found| Value::Object(project(found, &join.columns)))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn store() -> InMemoryStore {
        InMemoryStore::with_tables([
            TableSpec::new("people").timestamps().required(&["name"]).unique(&["code"]),
            TableSpec::new("pets"),
        ])
    }

    #[test]
    fn test_like_pattern_is_case_insensitive_substring() {
        let regex = like_to_regex("%3a%").unwrap();
        assert!(regex.is_match("Class 3A"));
        assert!(!regex.is_match("Class 3B"));
    }

    #[test]
    fn test_like_pattern_escapes_and_single_char() {
        assert!(like_to_regex("a_c").unwrap().is_match("abc"));
        assert!(!like_to_regex("a\\_c").unwrap().is_match("abc"));
        assert!(like_to_regex("a\\_c").unwrap().is_match("a_c"));
        assert!(like_to_regex("1.5").unwrap().is_match("1.5"));
        assert!(!like_to_regex("1.5").unwrap().is_match("125"));
    }

    #[test]
    fn test_nulls_sort_last() {
        let null = Value::Null;
        let one = json!(1);
        assert_eq!(compare_values(Some(&null), Some(&one)), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&one)), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
    }

    #[test]
    fn test_timestamps_order_by_instant() {
        let whole = json!("2024-05-01T08:00:00Z");
        let half = json!("2024-05-01T08:00:00.5Z");
        let later = json!("2024-05-01T08:00:01Z");

        assert_eq!(compare_values(Some(&whole), Some(&half)), Ordering::Less);
        assert_eq!(compare_values(Some(&half), Some(&later)), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("S2")), Some(&json!("S10"))), Ordering::Greater);
    }

    #[tokio::test]
    async fn test_id_filter_matches_uuid_column() {
        let store = store();
        let owner = store
            .insert("people", row(json!({"name": "Ann", "code": "A1"})))
            .await
            .unwrap();
        store
            .insert("people", row(json!({"name": "Bob", "code": "B1"})))
            .await
            .unwrap();
        let id: Uuid = owner["id"].as_str().unwrap().parse().unwrap();

        let query = SelectQuery::new("people").filter(Filter::new().eq_id("id", id));
        let set = store.select(&query, None).await.unwrap();

        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0]["name"], json!("Ann"));
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = store();
        let stored = store
            .insert("people", row(json!({"name": "Ann", "code": "A1"})))
            .await
            .unwrap();

        assert!(stored.get("id").and_then(Value::as_str).is_some());
        assert!(stored.contains_key("created_at"));
        assert_eq!(stored.get("created_at"), stored.get("updated_at"));
    }

    #[tokio::test]
    async fn test_insert_rejects_null_and_duplicates() {
        let store = store();
        let missing = store.insert("people", row(json!({"code": "A1"}))).await;
        assert!(matches!(missing, Err(StoreError::Constraint(_))));

        store
            .insert("people", row(json!({"name": "Ann", "code": "A1"})))
            .await
            .unwrap();
        let duplicate = store
            .insert("people", row(json!({"name": "Bob", "code": "A1"})))
            .await;
        assert!(matches!(duplicate, Err(StoreError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_unknown_relation_is_query_error() {
        let store = store();
        let result = store.select(&SelectQuery::new("ghosts"), None).await;
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn test_select_range_and_total() {
        let store = store();
        for i in 0..5 {
            store
                .insert("pets", row(json!({"name": format!("pet{}", i), "age": i})))
                .await
                .unwrap();
        }

        let query = SelectQuery::new("pets").order_by(super::super::SortSpec::desc("age"));
        let set = store
            .select(&query, Some(RowRange { from: 1, to: 2 }))
            .await
            .unwrap();

        assert_eq!(set.total, 5);
        let ages: Vec<_> = set.rows.iter().map(|r| r["age"].clone()).collect();
        assert_eq!(ages, vec![json!(3), json!(2)]);
    }

    #[tokio::test]
    async fn test_join_nests_selected_columns() {
        let store = store();
        let owner = store
            .insert("people", row(json!({"name": "Ann", "code": "A1"})))
            .await
            .unwrap();
        store
            .insert("pets", row(json!({"name": "Rex", "owner_id": owner["id"].clone()})))
            .await
            .unwrap();
        store
            .insert("pets", row(json!({"name": "Stray", "owner_id": null})))
            .await
            .unwrap();

        let query = SelectQuery::new("pets")
            .join(Some(Join::new("people", "owner_id").columns(&["name"])))
            .order_by(super::super::SortSpec::asc("name"));
        let set = store.select(&query, None).await.unwrap();

        assert_eq!(set.rows[0]["people"], json!({"name": "Ann"}));
        assert_eq!(set.rows[1]["people"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_id() {
        let store = store();
        let id = Uuid::new_v4();
        assert!(store.update("pets", id, Row::new()).await.unwrap().is_none());
        assert_eq!(store.delete("pets", id).await.unwrap(), 0);
    }
}
