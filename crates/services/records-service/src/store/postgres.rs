//! PostgreSQL store over a SeaORM connection.
//!
//! Rows travel as `jsonb` in both directions: reads select `to_jsonb(t)`
//! (plus the joined object) and writes go through `jsonb_populate_record`,
//! so column types are resolved by the database, not by this layer.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, QueryResult, Statement};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use common::RowRange;

use super::error::{StoreError, StoreResult};
use super::query::{Condition, Direction, Filter, Join, Row, RowSet, SelectQuery};
use super::RecordStore;
use crate::infra::Database;

/// Alias of the queried table in generated SQL
const T: &str = "t";
/// Alias of the joined table in generated SQL
const J: &str = "j";

pub struct PgStore {
    database: Database,
}

impl PgStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn db(&self) -> &DatabaseConnection {
        self.database.connection()
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn select(&self, query: &SelectQuery, range: Option<RowRange>) -> StoreResult<RowSet> {
        let statement = select_statement(query, range)?;
        debug!(entity = %query.entity, sql = %statement.sql, "select");

        let rows = self
            .db()
            .query_all(statement)
            .await?
            .iter()
            .map(row_object)
            .collect::<StoreResult<Vec<_>>>()?;

        let total = match range {
            Some(_) => match self.db().query_one(count_statement(query)?).await? {
                Some(result) => result.try_get::<i64>("", "total")?.max(0) as u64,
                None => 0,
            },
            None => rows.len() as u64,
        };

        Ok(RowSet { rows, total })
    }

    async fn insert(&self, entity: &str, row: Row) -> StoreResult<Row> {
        let statement = insert_statement(entity, row)?;
        debug!(entity, sql = %statement.sql, "insert");

        let result = self
            .db()
            .query_one(statement)
            .await?
            .ok_or_else(|| StoreError::query(format!("insert into \"{}\" returned no row", entity)))?;
        row_object(&result)
    }

    async fn update(&self, entity: &str, id: Uuid, patch: Row) -> StoreResult<Option<Row>> {
        let statement = update_statement(entity, id, patch)?;
        debug!(entity, %id, sql = %statement.sql, "update");

        self.db()
            .query_one(statement)
            .await?
            .as_ref()
            .map(row_object)
            .transpose()
    }

    async fn delete(&self, entity: &str, id: Uuid) -> StoreResult<u64> {
        let statement = delete_statement(entity, id)?;
        debug!(entity, %id, "delete");

        let result = self.db().execute(statement).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database.ping().await?;
        Ok(())
    }
}

fn row_object(result: &QueryResult) -> StoreResult<Row> {
    match result.try_get::<Value>("", "row")? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::query(format!("expected a JSON object row, got {}", other))),
    }
}

/// SQL text plus positional parameters.
struct SqlWriter {
    sql: String,
    values: Vec<sea_orm::Value>,
}

impl SqlWriter {
    fn new() -> Self {
        Self {
            sql: String::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Register a parameter and return its placeholder
    fn bind(&mut self, value: impl Into<sea_orm::Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    fn finish(self) -> Statement {
        Statement::from_sql_and_values(DatabaseBackend::Postgres, self.sql, self.values)
    }
}

/// Quote an identifier, accepting only plain `[A-Za-z_][A-Za-z0-9_]*` names.
fn quote_ident(name: &str) -> StoreResult<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(format!("\"{}\"", name))
    } else {
        Err(StoreError::query(format!("invalid identifier {:?}", name)))
    }
}

fn column(alias: &str, name: &str) -> StoreResult<String> {
    Ok(format!("{}.{}", alias, quote_ident(name)?))
}

/// `jsonb_build_object('a', x."a", ...)`, or the whole row when no columns are listed.
fn json_object(alias: &str, columns: &[String]) -> StoreResult<String> {
    if columns.is_empty() {
        return Ok(format!("to_jsonb({})", alias));
    }
    let pairs = columns
        .iter()
        .map(|c| Ok(format!("'{}', {}", c, column(alias, c)?)))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(format!("jsonb_build_object({})", pairs.join(", ")))
}

fn join_object(join: &Join) -> StoreResult<String> {
    Ok(format!(
        "jsonb_build_object('{name}', (SELECT {object} FROM {table} AS {J} WHERE {foreign} = {local}))",
        name = join.entity,
        object = json_object(J, &join.columns)?,
        table = quote_ident(&join.entity)?,
        foreign = column(J, &join.foreign_key)?,
        local = column(T, &join.local_key)?,
    ))
}

fn push_where(writer: &mut SqlWriter, filter: &Filter) -> StoreResult<()> {
    for (i, condition) in filter.conditions().iter().enumerate() {
        writer.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(writer, condition)?;
    }
    Ok(())
}

fn push_condition(writer: &mut SqlWriter, condition: &Condition) -> StoreResult<()> {
    match condition {
        Condition::Equals { field, value } => {
            let col = column(T, field)?;
            let sql = match value {
                Value::Null => format!("{} IS NULL", col),
                Value::Bool(b) => format!("{} = {}", col, writer.bind(*b)),
                Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => format!("{} = {}", col, writer.bind(i)),
                    (None, Some(f)) => format!("{} = {}", col, writer.bind(f)),
                    _ => return Err(StoreError::query(format!("unsupported number {}", n))),
                },
                Value::String(s) => format!("{}::text = {}", col, writer.bind(s.clone())),
                other => format!("{} = {}::jsonb", col, writer.bind(other.clone())),
            };
            writer.push(&sql);
        }
        Condition::EqualsId { field, id } => {
            let sql = format!("{} = {}", column(T, field)?, writer.bind(*id));
            writer.push(&sql);
        }
        Condition::Pattern { field, pattern } => {
            let col = column(T, field)?;
            let sql = format!("{}::text ILIKE {}", col, writer.bind(pattern.clone()));
            writer.push(&sql);
        }
        Condition::AnyPattern { fields, pattern } => {
            if fields.is_empty() {
                writer.push("FALSE");
                return Ok(());
            }
            let mut parts = Vec::with_capacity(fields.len());
            for field in fields {
                let col = column(T, field)?;
                parts.push(format!("{}::text ILIKE {}", col, writer.bind(pattern.clone())));
            }
            writer.push(&format!("({})", parts.join(" OR ")));
        }
    }
    Ok(())
}

fn select_statement(query: &SelectQuery, range: Option<RowRange>) -> StoreResult<Statement> {
    let mut writer = SqlWriter::new();

    let mut projection = json_object(T, &query.columns)?;
    if let Some(join) = &query.join {
        projection = format!("{} || {}", projection, join_object(join)?);
    }
    writer.push(&format!(
        "SELECT {} AS \"row\" FROM {} AS {}",
        projection,
        quote_ident(&query.entity)?,
        T
    ));

    push_where(&mut writer, &query.filter)?;

    if let Some(sort) = &query.sort {
        let direction = match sort.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        writer.push(&format!(" ORDER BY {} {}", column(T, &sort.field)?, direction));
    }

    if let Some(range) = range {
        let limit = writer.bind(bigint(range.limit()));
        let offset = writer.bind(bigint(range.from));
        writer.push(&format!(" LIMIT {} OFFSET {}", limit, offset));
    }

    Ok(writer.finish())
}

/// LIMIT and OFFSET are BIGINT; larger values clamp to its maximum.
fn bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn count_statement(query: &SelectQuery) -> StoreResult<Statement> {
    let mut writer = SqlWriter::new();
    writer.push(&format!(
        "SELECT COUNT(*) AS \"total\" FROM {} AS {}",
        quote_ident(&query.entity)?,
        T
    ));
    push_where(&mut writer, &query.filter)?;
    Ok(writer.finish())
}

fn quoted_columns(row: &Row, alias: Option<&str>) -> StoreResult<Vec<String>> {
    row.keys()
        .map(|key| match alias {
            Some(alias) => column(alias, key),
            None => quote_ident(key),
        })
        .collect()
}

fn insert_statement(entity: &str, row: Row) -> StoreResult<Statement> {
    let table = quote_ident(entity)?;
    let mut writer = SqlWriter::new();

    if row.is_empty() {
        writer.push(&format!(
            "INSERT INTO {table} AS {T} DEFAULT VALUES RETURNING to_jsonb({T}) AS \"row\""
        ));
        return Ok(writer.finish());
    }

    let targets = quoted_columns(&row, None)?.join(", ");
    let sources = quoted_columns(&row, Some("r"))?.join(", ");
    let record = writer.bind(Value::Object(row));
    writer.push(&format!(
        "INSERT INTO {table} AS {T} ({targets}) SELECT {sources} \
         FROM jsonb_populate_record(NULL::{table}, {record}::jsonb) AS r \
         RETURNING to_jsonb({T}) AS \"row\""
    ));
    Ok(writer.finish())
}

fn update_statement(entity: &str, id: Uuid, patch: Row) -> StoreResult<Statement> {
    let table = quote_ident(entity)?;
    let id_column = column(T, "id")?;
    let mut writer = SqlWriter::new();

    if patch.is_empty() {
        let id = writer.bind(id);
        writer.push(&format!(
            "SELECT to_jsonb({T}) AS \"row\" FROM {table} AS {T} WHERE {id_column} = {id}"
        ));
        return Ok(writer.finish());
    }

    let assignments = patch
        .keys()
        .map(|key| Ok(format!("{} = {}", quote_ident(key)?, column("r", key)?)))
        .collect::<StoreResult<Vec<_>>>()?
        .join(", ");
    let record = writer.bind(Value::Object(patch));
    let id = writer.bind(id);
    writer.push(&format!(
        "UPDATE {table} AS {T} SET {assignments} \
         FROM jsonb_populate_record(NULL::{table}, {record}::jsonb) AS r \
         WHERE {id_column} = {id} RETURNING to_jsonb({T}) AS \"row\""
    ));
    Ok(writer.finish())
}

fn delete_statement(entity: &str, id: Uuid) -> StoreResult<Statement> {
    let mut writer = SqlWriter::new();
    let table = quote_ident(entity)?;
    let id = writer.bind(id);
    writer.push(&format!("DELETE FROM {} WHERE \"id\" = {}", table, id));
    Ok(writer.finish())
}
