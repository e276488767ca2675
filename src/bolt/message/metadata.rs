//! Typed views over SUCCESS metadata entries.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bolt::packstream::PackStreamValue;

/// Update counters from the `stats` entry of a final SUCCESS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Nodes created
    pub nodes_created: i64,
    /// Nodes deleted
    pub nodes_deleted: i64,
    /// Relationships created
    pub relationships_created: i64,
    /// Relationships deleted
    pub relationships_deleted: i64,
    /// Properties set
    pub properties_set: i64,
    /// Labels added
    pub labels_added: i64,
    /// Labels removed
    pub labels_removed: i64,
    /// Indexes added
    pub indexes_added: i64,
    /// Indexes removed
    pub indexes_removed: i64,
    /// Constraints added
    pub constraints_added: i64,
    /// Constraints removed
    pub constraints_removed: i64,
    /// Server reported data updates
    pub contains_updates: bool,
    /// Server reported system updates
    pub contains_system_updates: bool,
}

impl QueryStats {
    /// Read counters from a `stats` map. Absent counters are zero.
    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Self {
        let count = |key: &str| map.get(key).and_then(PackStreamValue::as_int).unwrap_or(0);
        let flag = |key: &str| map.get(key).and_then(PackStreamValue::as_bool).unwrap_or(false);
        Self {
            nodes_created: count("nodes-created"),
            nodes_deleted: count("nodes-deleted"),
            relationships_created: count("relationships-created"),
            relationships_deleted: count("relationships-deleted"),
            properties_set: count("properties-set"),
            labels_added: count("labels-added"),
            labels_removed: count("labels-removed"),
            indexes_added: count("indexes-added"),
            indexes_removed: count("indexes-removed"),
            constraints_added: count("constraints-added"),
            constraints_removed: count("constraints-removed"),
            contains_updates: flag("contains-updates"),
            contains_system_updates: flag("contains-system-updates"),
        }
    }

    /// Whether anything changed.
    pub fn has_updates(&self) -> bool {
        let counters = [
            self.nodes_created,
            self.nodes_deleted,
            self.relationships_created,
            self.relationships_deleted,
            self.properties_set,
            self.labels_added,
            self.labels_removed,
            self.indexes_added,
            self.indexes_removed,
            self.constraints_added,
            self.constraints_removed,
        ];
        self.contains_updates || self.contains_system_updates || counters.iter().any(|c| *c > 0)
    }
}

/// What kind of work a query did, from the `type` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    /// "r"
    ReadOnly,
    /// "rw"
    ReadWrite,
    /// "w"
    WriteOnly,
    /// "s"
    SchemaWrite,
}

impl QueryType {
    /// Parse the wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(QueryType::ReadOnly),
            "rw" => Some(QueryType::ReadWrite),
            "w" => Some(QueryType::WriteOnly),
            "s" => Some(QueryType::SchemaWrite),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(self) -> &'static str {
        match self {
            QueryType::ReadOnly => "r",
            QueryType::ReadWrite => "rw",
            QueryType::WriteOnly => "w",
            QueryType::SchemaWrite => "s",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A warning or hint attached to a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification code
    pub code: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// "WARNING", "INFORMATION", ...
    pub severity: String,
    /// Position in the query text as (line, column, offset)
    pub position: Option<(i64, i64, i64)>,
}

impl Notification {
    /// Read one entry of the `notifications` list. Entries without a code
    /// are skipped.
    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Option<Self> {
        let text = |key: &str| {
            map.get(key)
                .and_then(PackStreamValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let code = map.get("code")?.as_str()?.to_string();
        let position = map.get("position").and_then(PackStreamValue::as_map).and_then(|pos| {
            let at = |key: &str| pos.get(key).and_then(PackStreamValue::as_int);
            Some((at("line")?, at("column")?, at("offset").unwrap_or(0)))
        });
        Some(Self {
            code,
            title: text("title"),
            description: text("description"),
            severity: text("severity"),
            position,
        })
    }

    /// Read the `notifications` list of a SUCCESS.
    pub fn list_from(value: Option<&PackStreamValue>) -> Vec<Self> {
        value
            .and_then(PackStreamValue::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(PackStreamValue::as_map)
                    .filter_map(Self::from_map)
                    .collect()
            })
            .unwrap_or_default()
    }
}
