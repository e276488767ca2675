//! Result cursor and summaries.
//!
//! A [`ResultCursor`] holds the columns of the running query and at most
//! one row. The row is replaced by every `pull`, so a [`Row`] borrowed from
//! the session cannot outlive the next call on it.

use std::collections::HashMap;
use std::sync::Arc;

use super::record::Record;
use crate::bolt::message::{Notification, QueryStats, QueryType, SuccessMessage};
use crate::bolt::packstream::PackStreamError;
use crate::bolt::BoltVersion;
use crate::value::Value;

/// What the server said about itself during HELLO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Negotiated protocol version
    pub version: BoltVersion,
    /// Server agent, e.g. "Memgraph/2.14.0"
    pub agent: String,
    /// Connection id, if the server sent one
    pub connection_id: Option<String>,
}

impl ServerInfo {
    pub(crate) fn from_hello(version: BoltVersion, success: &SuccessMessage) -> Self {
        Self {
            version,
            agent: success.server().unwrap_or_default().to_string(),
            connection_id: success.connection_id().map(str::to_string),
        }
    }
}

/// Metadata of a finished result: the RUN reply merged with the final
/// PULL or DISCARD reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSummary {
    /// Every metadata entry
    pub metadata: HashMap<String, Value>,
    /// Update counters
    pub stats: QueryStats,
    /// Kind of work done
    pub query_type: Option<QueryType>,
    /// Milliseconds until the first record was available
    pub t_first: Option<i64>,
    /// Milliseconds until the last record was consumed
    pub t_last: Option<i64>,
    /// Bookmark
    pub bookmark: Option<String>,
    /// Database
    pub db: Option<String>,
    /// Warnings and hints
    pub notifications: Vec<Notification>,
}

impl ResultSummary {
    /// Build from the RUN reply and the final streaming reply.
    pub fn from_replies(run: &SuccessMessage, done: &SuccessMessage) -> Result<Self, PackStreamError> {
        let mut merged = run.metadata.clone();
        merged.extend(done.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        let merged = SuccessMessage::with_metadata(merged);

        let metadata = merged
            .metadata
            .iter()
            .map(|(k, v)| Ok((k.clone(), Value::from_packstream(v.clone())?)))
            .collect::<Result<_, PackStreamError>>()?;

        Ok(Self {
            metadata,
            stats: merged.stats().map(QueryStats::from_map).unwrap_or_default(),
            query_type: merged.query_type().and_then(QueryType::from_code),
            t_first: merged.t_first(),
            t_last: merged.t_last(),
            bookmark: merged.bookmark().map(str::to_string),
            db: merged.db().map(str::to_string),
            notifications: Notification::list_from(merged.get("notifications")),
        })
    }
}

/// A row borrowed from the cursor.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Column names.
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Number of values; always the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by column index.
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Value by column name.
    pub fn by_name(&self, column: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.values.get(index)
    }

    /// Copy the row out of the cursor.
    pub fn to_record(&self) -> Record {
        Record::new(Arc::from(self.columns), self.values.to_vec())
    }
}

/// Outcome of one `pull`.
#[derive(Debug, Clone, Copy)]
pub enum Fetch<'a> {
    /// A row is available
    Row(Row<'a>),
    /// The stream is complete
    Done(&'a ResultSummary),
}

impl<'a> Fetch<'a> {
    /// The row, if one was fetched.
    pub fn row(self) -> Option<Row<'a>> {
        match self {
            Fetch::Row(row) => Some(row),
            Fetch::Done(_) => None,
        }
    }

    /// Whether the stream is complete.
    pub fn is_done(&self) -> bool {
        matches!(self, Fetch::Done(_))
    }
}

/// Columns, the current row and, once the stream ends, the summary.
#[derive(Debug, Clone)]
pub struct ResultCursor {
    columns: Vec<String>,
    row: Option<Vec<Value>>,
    run_reply: SuccessMessage,
    summary: Option<ResultSummary>,
    qid: Option<i64>,
}

impl ResultCursor {
    pub(crate) fn new(run_reply: SuccessMessage) -> Self {
        Self {
            columns: run_reply.fields().unwrap_or_default(),
            qid: run_reply.qid(),
            row: None,
            run_reply,
            summary: None,
        }
    }

    /// Column names, fixed for the lifetime of the cursor.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The row fetched by the last `pull`, if it returned one.
    pub fn current_row(&self) -> Option<&[Value]> {
        self.row.as_deref()
    }

    /// Summary, once the stream is complete.
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    /// Query id for explicit transactions.
    pub fn qid(&self) -> Option<i64> {
        self.qid
    }

    /// Whether the stream has ended.
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    pub(crate) fn set_row(&mut self, values: Vec<Value>) -> Row<'_> {
        let values = self.row.insert(values);
        Row {
            columns: &self.columns,
            values,
        }
    }

    pub(crate) fn clear_row(&mut self) {
        self.row = None;
    }

    pub(crate) fn summarize(&self, done: &SuccessMessage) -> Result<ResultSummary, PackStreamError> {
        ResultSummary::from_replies(&self.run_reply, done)
    }

    pub(crate) fn finish(&mut self, summary: ResultSummary) -> &ResultSummary {
        self.row = None;
        self.summary.insert(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::packstream::PackStreamValue;

    fn run_reply() -> SuccessMessage {
        let mut msg = SuccessMessage::run_success(&["n", "m"]);
        msg.add("qid", 3i64);
        msg
    }

    #[test]
    fn test_cursor_row_lifecycle() {
        let mut cursor = ResultCursor::new(run_reply());
        assert_eq!(cursor.columns(), &["n".to_string(), "m".to_string()]);
        assert_eq!(cursor.qid(), Some(3));
        assert!(cursor.current_row().is_none());

        let row = cursor.set_row(vec![Value::Integer(1), Value::Null]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.by_name("n"), Some(&Value::Integer(1)));
        assert_eq!(row.get(1), Some(&Value::Null));
        assert_eq!(row.to_record().get("m"), Some(&Value::Null));
        assert_eq!(cursor.current_row().map(<[Value]>::len), Some(2));

        cursor.clear_row();
        assert!(cursor.current_row().is_none());
    }

    #[test]
    fn test_summary_merges_replies() {
        let mut done = SuccessMessage::streaming_success(false);
        done.add("type", "w");
        done.add("db", "memgraph");
        let mut stats = HashMap::new();
        stats.insert("nodes-created".to_string(), PackStreamValue::Integer(2));
        done.add("stats", stats);

        let mut cursor = ResultCursor::new(run_reply());
        let summary = cursor.summarize(&done).unwrap();
        cursor.set_row(vec![Value::Null, Value::Null]);
        assert_eq!(cursor.finish(summary.clone()), &summary);
        assert!(cursor.current_row().is_none());

        assert!(cursor.is_complete());
        assert_eq!(summary.query_type, Some(QueryType::WriteOnly));
        assert_eq!(summary.stats.nodes_created, 2);
        assert_eq!(summary.t_first, Some(0));
        assert_eq!(summary.t_last, Some(0));
        assert_eq!(summary.db.as_deref(), Some("memgraph"));
        assert_eq!(summary.metadata.get("qid"), Some(&Value::Integer(3)));
        assert!(summary.notifications.is_empty());
    }

    #[test]
    fn test_server_info() {
        let hello = SuccessMessage::hello_success("Memgraph/2.14.0", "bolt-1");
        let info = ServerInfo::from_hello(BoltVersion::V5_0, &hello);
        assert_eq!(info.agent, "Memgraph/2.14.0");
        assert_eq!(info.connection_id.as_deref(), Some("bolt-1"));
    }
}
