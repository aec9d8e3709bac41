use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use super::row::CustomDbRow;
use crate::types::RowValues;

/// Lower-case every key of every row, descending into JSON objects and arrays.
///
/// Returns new rows; the input is untouched. Rows that shared a column-name vector keep sharing
/// the folded one.
#[must_use]
pub fn rows_keys_to_lower(rows: &[CustomDbRow]) -> Vec<CustomDbRow> {
    let mut last: Option<(Arc<Vec<String>>, Arc<Vec<String>>)> = None;
    rows.iter()
        .map(|row| {
            let names = match &last {
                Some((src, folded)) if Arc::ptr_eq(src, &row.column_names) => Arc::clone(folded),
                _ => {
                    let folded = Arc::new(
                        row.column_names
                            .iter()
                            .map(|name| name.to_lowercase())
                            .collect::<Vec<_>>(),
                    );
                    last = Some((Arc::clone(&row.column_names), Arc::clone(&folded)));
                    folded
                }
            };
            CustomDbRow::new(names, row.rows.iter().map(value_keys_to_lower).collect())
        })
        .collect()
}

fn value_keys_to_lower(value: &RowValues) -> RowValues {
    match value {
        RowValues::JSON(json) => RowValues::JSON(json_keys_to_lower(json)),
        other => other.clone(),
    }
}

/// Lower-case the keys of a JSON tree, mirroring its shape.
#[must_use]
pub fn json_keys_to_lower(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.to_lowercase(), json_keys_to_lower(v)))
                .collect::<Map<_, _>>(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(json_keys_to_lower).collect()),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folds_nested_json_keys() {
        let folded = json_keys_to_lower(&json!({
            "Outer": {"InNer": [ {"DEEP": 1}, 2 ]},
            "VALUE": "KeepCase"
        }));
        assert_eq!(
            folded,
            json!({"outer": {"inner": [ {"deep": 1}, 2 ]}, "value": "KeepCase"})
        );
    }

    #[test]
    fn folds_rows_without_touching_input() {
        let names = Arc::new(vec!["ID".to_string(), "Payload".to_string()]);
        let rows = vec![
            CustomDbRow::new(
                Arc::clone(&names),
                vec![RowValues::Int(1), RowValues::JSON(json!({"A": 1}))],
            ),
            CustomDbRow::new(Arc::clone(&names), vec![RowValues::Int(2), RowValues::Null]),
        ];
        let folded = rows_keys_to_lower(&rows);
        assert_eq!(folded[0].column_names.as_slice(), ["id", "payload"]);
        assert!(Arc::ptr_eq(&folded[0].column_names, &folded[1].column_names));
        assert_eq!(folded[0].get("payload"), Some(&RowValues::JSON(json!({"a": 1}))));
        assert_eq!(rows[0].column_names.as_slice(), ["ID", "Payload"]);
    }
}
