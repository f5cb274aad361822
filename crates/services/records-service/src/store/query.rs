//! Store-neutral query description.
//!
//! A [`SelectQuery`] names an entity, the columns to return, an optional
//! one-level join, a conjunctive [`Filter`] and one [`SortSpec`]. Stores
//! translate it into their own dialect.

use serde_json::Value;
use uuid::Uuid;

/// A stored row as a JSON object keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Rows of one page plus the exact number of rows matching the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub rows: Vec<Row>,
    pub total: u64,
}

/// A single constraint on a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column equals the value. A null value matches null columns.
    Equals { field: String, value: Value },
    /// Uuid column (primary or foreign key) equals the id.
    EqualsId { field: String, id: Uuid },
    /// Column matches a case-insensitive LIKE pattern (`%` any run, `_` one char).
    Pattern { field: String, pattern: String },
    /// At least one of the columns matches the pattern.
    AnyPattern { fields: Vec<String>, pattern: String },
}

/// Conjunction of conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add an equality condition only when a value is present.
    pub fn eq_opt<V: Into<Value>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    pub fn eq_id(mut self, field: impl Into<String>, id: Uuid) -> Self {
        self.conditions.push(Condition::EqualsId {
            field: field.into(),
            id,
        });
        self
    }

    pub fn eq_id_opt(self, field: impl Into<String>, id: Option<Uuid>) -> Self {
        match id {
            Some(id) => self.eq_id(field, id),
            None => self,
        }
    }

    pub fn pattern(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.conditions.push(Condition::Pattern {
            field: field.into(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn any_pattern<I, S>(mut self, fields: I, pattern: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.push(Condition::AnyPattern {
            fields: fields.into_iter().map(Into::into).collect(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Build a pattern matching `term` anywhere in the column, escaping LIKE wildcards.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort key of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: Direction,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::Asc
    }
}

/// One level of referenced data nested under the joined entity's name.
///
/// `local_key` on the queried entity points at `foreign_key` on `entity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub entity: String,
    pub local_key: String,
    pub foreign_key: String,
    /// Columns of the joined row to include; empty means all
    pub columns: Vec<String>,
}

impl Join {
    pub fn new(entity: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            local_key: local_key.into(),
            foreign_key: "id".to_string(),
            columns: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// A read against one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub entity: String,
    /// Columns to return; empty means all
    pub columns: Vec<String>,
    pub join: Option<Join>,
    pub filter: Filter,
    pub sort: Option<SortSpec>,
}

impl SelectQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: Vec::new(),
            join: None,
            filter: Filter::new(),
            sort: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn join(mut self, join: Option<Join>) -> Self {
        self.join = join;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}
