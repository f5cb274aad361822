//! Grouped averages over a numeric column.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use common::{AppError, AppResult};

use crate::store::Row;

/// Average of one group, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStat {
    pub group_key: String,
    pub average: f64,
    pub count: u64,
}

/// Group rows by `group_field` and average `value_field` per group.
///
/// Groups appear in order of first occurrence. Rows where either column is
/// null or missing are skipped, so every returned group has `count >= 1`.
pub fn group_average(rows: &[Row], group_field: &str, value_field: &str) -> AppResult<Vec<AggregateStat>> {
    let mut order: Vec<(String, f64, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let (Some(key), Some(value)) = (group_key(row.get(group_field)), row.get(value_field)) else {
            continue;
        };
        let value = match value {
            Value::Null => continue,
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| AppError::internal(format!("Column '{}' is not numeric: {}", value_field, value)))?;

        match index.get(&key) {
            Some(&i) => {
                order[i].1 += value;
                order[i].2 += 1;
            }
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, value, 1));
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|(group_key, sum, count)| AggregateStat {
            group_key,
            average: round2(sum / count as f64),
            count,
        })
        .collect())
}

fn group_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
