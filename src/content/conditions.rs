// ABOUTME: Condition and sort specifications applied to content queries
// ABOUTME: Parses field:operator keys, evaluates them against entry attributes and orders JSON values

use serde_json::Value as JsonValue;
use std::cmp::Ordering;

use super::{ContentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Is,
    Not,
    Contains,
    DoesntContain,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Exists,
    DoesntExist,
}

impl Operator {
    pub fn parse(name: &str) -> Option<Self> {
        let operator = match name {
            "is" | "equals" => Operator::Is,
            "not" | "isnt" | "not_equal" => Operator::Not,
            "contains" => Operator::Contains,
            "doesnt_contain" => Operator::DoesntContain,
            "starts_with" | "begins_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "greater_than" | "gt" => Operator::GreaterThan,
            "less_than" | "lt" => Operator::LessThan,
            "greater_than_or_equal_to" | "gte" => Operator::GreaterThanOrEqual,
            "less_than_or_equal_to" | "lte" => Operator::LessThanOrEqual,
            "exists" | "isset" => Operator::Exists,
            "doesnt_exist" | "is_empty" | "null" => Operator::DoesntExist,
            _ => return None,
        };
        Some(operator)
    }
}

/// A single `field:operator=value` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    /// Build from a `field[:operator]` key and its value; the operator defaults to `is`
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let (field, operator) = match key.split_once(':') {
            Some((field, operator)) => {
                let parsed = Operator::parse(operator).ok_or_else(|| ContentError::UnknownOperator {
                    field: field.to_string(),
                    operator: operator.to_string(),
                })?;
                (field, parsed)
            }
            None => (key, Operator::Is),
        };

        Ok(Self {
            field: field.to_string(),
            operator,
            value: value.to_string(),
        })
    }

    pub fn matches(&self, attributes: &JsonValue) -> bool {
        let actual = attributes.get(&self.field).unwrap_or(&JsonValue::Null);

        match self.operator {
            Operator::Is => value_to_string(actual) == self.value,
            Operator::Not => value_to_string(actual) != self.value,
            Operator::Contains => contains(actual, &self.value),
            Operator::DoesntContain => !contains(actual, &self.value),
            Operator::StartsWith => value_to_string(actual)
                .to_lowercase()
                .starts_with(&self.value.to_lowercase()),
            Operator::EndsWith => value_to_string(actual)
                .to_lowercase()
                .ends_with(&self.value.to_lowercase()),
            Operator::GreaterThan => compare_to(actual, &self.value) == Some(Ordering::Greater),
            Operator::LessThan => compare_to(actual, &self.value) == Some(Ordering::Less),
            Operator::GreaterThanOrEqual => matches!(
                compare_to(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::LessThanOrEqual => matches!(
                compare_to(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Exists => !is_empty(actual),
            Operator::DoesntExist => is_empty(actual),
        }
    }
}

/// One `field[:asc|desc]` component of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse_list(sort: &str) -> Result<Vec<Self>> {
        sort.split('|').map(Self::parse).collect()
    }

    fn parse(spec: &str) -> Result<Self> {
        let (field, direction) = match spec.trim().split_once(':') {
            Some((field, direction)) => (field.trim(), direction.trim().to_lowercase()),
            None => (spec.trim(), "asc".to_string()),
        };

        if field.is_empty() || field == "random" {
            return Err(ContentError::InvalidSort(spec.to_string()));
        }

        let descending = match direction.as_str() {
            "asc" => false,
            "desc" => true,
            _ => return Err(ContentError::InvalidSort(spec.to_string())),
        };

        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }

    pub fn compare(&self, a: &JsonValue, b: &JsonValue) -> Ordering {
        let null = JsonValue::Null;
        let ordering = compare_values(
            a.get(&self.field).unwrap_or(&null),
            b.get(&self.field).unwrap_or(&null),
        );
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

pub fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn contains(haystack: &JsonValue, needle: &str) -> bool {
    match haystack {
        JsonValue::Array(items) => items.iter().any(|item| value_to_string(item) == needle),
        other => value_to_string(other)
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}

fn compare_to(actual: &JsonValue, expected: &str) -> Option<Ordering> {
    if actual.is_null() {
        return None;
    }

    let actual = value_to_string(actual);
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(actual.as_str().cmp(expected)),
    }
}

/// Total order over JSON values: null first, then booleans, numbers, strings
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    fn rank(value: &JsonValue) -> u8 {
        match value {
            JsonValue::Null => 0,
            JsonValue::Bool(_) => 1,
            JsonValue::Number(_) => 2,
            JsonValue::String(_) => 3,
            JsonValue::Array(_) => 4,
            JsonValue::Object(_) => 5,
        }
    }

    match (a, b) {
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_operators() {
        let entry = json!({
            "title": "An Awesome Post",
            "author": "joe",
            "views": 120,
            "tags": ["rust", "web"],
            "summary": ""
        });

        let check = |key: &str, value: &str| Condition::parse(key, value).unwrap().matches(&entry);

        assert!(check("author", "joe"));
        assert!(check("author:is", "joe"));
        assert!(check("author:not", "ann"));
        assert!(check("title:contains", "awesome"));
        assert!(check("title:doesnt_contain", "boring"));
        assert!(check("title:starts_with", "an "));
        assert!(check("title:ends_with", "post"));
        assert!(check("views:gt", "100"));
        assert!(check("views:lt", "1000"));
        assert!(check("views:gte", "120"));
        assert!(check("views:lte", "120"));
        assert!(check("tags:contains", "rust"));
        assert!(!check("tags:contains", "ru"));
        assert!(check("author:exists", ""));
        assert!(check("summary:doesnt_exist", ""));
        assert!(check("missing:is_empty", ""));
        assert!(!check("missing:gt", "0"));
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(
            Condition::parse("title:sounds_like", "x"),
            Err(ContentError::UnknownOperator {
                field: "title".to_string(),
                operator: "sounds_like".to_string(),
            })
        );
    }

    #[test]
    fn test_sort_keys() {
        let keys = SortKey::parse_list("date:desc|title").unwrap();
        assert_eq!(
            keys,
            vec![
                SortKey {
                    field: "date".to_string(),
                    descending: true
                },
                SortKey {
                    field: "title".to_string(),
                    descending: false
                },
            ]
        );

        assert!(SortKey::parse_list("random").is_err());
        assert!(SortKey::parse_list("title:sideways").is_err());
        assert!(SortKey::parse_list("title|").is_err());
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("A")), Ordering::Greater);
        assert_eq!(compare_values(&JsonValue::Null, &json!("a")), Ordering::Less);
    }
}
