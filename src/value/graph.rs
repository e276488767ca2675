//! Graph entities: nodes, relationships and paths.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id
    pub id: i64,
    /// Labels in server order
    pub labels: Vec<String>,
    /// Properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt 5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Node {
    /// Create a node without an element id.
    pub fn new(id: i64, labels: Vec<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            labels,
            properties,
            element_id: None,
        }
    }

    /// Number of labels.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Label at `index`.
    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Whether the node carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Property lookup. `None` means absent; a stored null is `Some(&Value::Null)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.id)?;
        for label in &self.labels {
            write!(f, ":{}", label)?;
        }
        write!(f, ")")
    }
}

/// A relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship id
    pub id: i64,
    /// Start node id
    pub start_node_id: i64,
    /// End node id
    pub end_node_id: i64,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt 5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Start node element id (Bolt 5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_element_id: Option<String>,
    /// End node element id (Bolt 5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_node_element_id: Option<String>,
}

impl Relationship {
    /// Create a relationship without element ids.
    pub fn new(
        id: i64,
        start_node_id: i64,
        end_node_id: i64,
        rel_type: &str,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            start_node_id,
            end_node_id,
            rel_type: rel_type.to_string(),
            properties,
            element_id: None,
            start_node_element_id: None,
            end_node_element_id: None,
        }
    }

    /// Property lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})-[{}:{}]->({})",
            self.start_node_id, self.id, self.rel_type, self.end_node_id
        )
    }
}

/// A relationship without endpoints, as it appears inside a [`Path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnboundRelationship {
    /// Relationship id
    pub id: i64,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt 5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl UnboundRelationship {
    /// Create an unbound relationship without an element id.
    pub fn new(id: i64, rel_type: &str, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            rel_type: rel_type.to_string(),
            properties,
            element_id: None,
        }
    }

    /// Property lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A path through the graph.
///
/// Stored the way the server sends it: distinct nodes, distinct
/// relationships, and an index sequence of `(relationship, node)` pairs.
/// Relationship indices are 1-based; a negative index means the
/// relationship is traversed from its end node to its start node. Node
/// indices are 0-based. The path always starts at the first node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPath")]
pub struct Path {
    nodes: Vec<Node>,
    relationships: Vec<UnboundRelationship>,
    sequence: Vec<i64>,
}

impl Path {
    /// Build a path, checking that every index in `sequence` points at an
    /// existing node or relationship.
    pub fn new(
        nodes: Vec<Node>,
        relationships: Vec<UnboundRelationship>,
        sequence: Vec<i64>,
    ) -> Option<Self> {
        if nodes.is_empty() || sequence.len() % 2 != 0 {
            return None;
        }
        let valid = sequence.chunks_exact(2).all(|pair| {
            let rel = pair[0].unsigned_abs() as usize;
            let node = pair[1];
            rel >= 1 && rel <= relationships.len() && node >= 0 && (node as usize) < nodes.len()
        });
        valid.then_some(Self {
            nodes,
            relationships,
            sequence,
        })
    }

    /// A path of one node and no hops.
    pub fn single(node: Node) -> Self {
        Self {
            nodes: vec![node],
            relationships: Vec::new(),
            sequence: Vec::new(),
        }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.sequence.len() / 2
    }

    /// Whether the path has no hops.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The `index`-th node along the path, `0..=len()`.
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        if index == 0 {
            return self.nodes.first();
        }
        let node = *self.sequence.get(index.checked_mul(2)?.checked_sub(1)?)?;
        self.nodes.get(node as usize)
    }

    /// The `index`-th hop, `0..len()`, and whether it runs against the
    /// relationship's own direction.
    pub fn relationship_at(&self, index: usize) -> Option<(&UnboundRelationship, bool)> {
        let rel = *self.sequence.get(index.checked_mul(2)?)?;
        let relationship = self.relationships.get((rel.unsigned_abs() as usize).checked_sub(1)?)?;
        Some((relationship, rel < 0))
    }

    /// First node.
    pub fn start(&self) -> Option<&Node> {
        self.node_at(0)
    }

    /// Last node.
    pub fn end(&self) -> Option<&Node> {
        self.node_at(self.len())
    }

    /// Distinct nodes as sent by the server.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Distinct relationships as sent by the server.
    pub fn relationships(&self) -> &[UnboundRelationship] {
        &self.relationships
    }

    /// Raw index sequence.
    pub fn sequence(&self) -> &[i64] {
        &self.sequence
    }
}

#[derive(Deserialize)]
struct RawPath {
    nodes: Vec<Node>,
    relationships: Vec<UnboundRelationship>,
    sequence: Vec<i64>,
}

impl TryFrom<RawPath> for Path {
    type Error = &'static str;

    fn try_from(raw: RawPath) -> Result<Self, Self::Error> {
        Path::new(raw.nodes, raw.relationships, raw.sequence).ok_or("path index sequence out of range")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(start) = self.start() else {
            return write!(f, "<empty path>");
        };
        write!(f, "{}", start)?;
        for i in 0..self.len() {
            if let (Some((rel, reversed)), Some(node)) = (self.relationship_at(i), self.node_at(i + 1)) {
                if reversed {
                    write!(f, "<-[:{}]-{}", rel.rel_type, node)?;
                } else {
                    write!(f, "-[:{}]->{}", rel.rel_type, node)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64) -> Node {
        Node::new(id, vec!["Person".to_string()], HashMap::new())
    }

    fn knows(id: i64) -> UnboundRelationship {
        UnboundRelationship::new(id, "KNOWS", HashMap::new())
    }

    #[test]
    fn test_node_labels_and_properties() {
        let mut props = HashMap::new();
        props.insert("name".to_string(), Value::from("test1"));
        props.insert("gone".to_string(), Value::Null);
        let n = Node::new(1, vec!["TestLabel".to_string()], props);

        assert_eq!(n.label_count(), 1);
        assert_eq!(n.label_at(0), Some("TestLabel"));
        assert_eq!(n.label_at(1), None);
        assert!(n.has_label("TestLabel"));
        assert_eq!(n.get("gone"), Some(&Value::Null));
        assert_eq!(n.get("missing"), None);
        assert_eq!(n.to_string(), "(1:TestLabel)");
    }

    #[test]
    fn test_path_walk() {
        // (a)-[:KNOWS]->(b)<-[:KNOWS]-(c)
        let path = Path::new(vec![node(1), node(2), node(3)], vec![knows(10), knows(11)], vec![1, 1, -2, 2])
            .unwrap();

        assert_eq!(path.len(), 2);
        assert_eq!(path.node_at(0).unwrap().id, 1);
        assert_eq!(path.node_at(1).unwrap().id, 2);
        assert_eq!(path.end().unwrap().id, 3);
        assert_eq!(path.node_at(3), None);

        let (rel, reversed) = path.relationship_at(0).unwrap();
        assert_eq!((rel.id, reversed), (10, false));
        let (rel, reversed) = path.relationship_at(1).unwrap();
        assert_eq!((rel.id, reversed), (11, true));
        assert!(path.relationship_at(2).is_none());

        assert_eq!(
            path.to_string(),
            "(1:Person)-[:KNOWS]->(2:Person)<-[:KNOWS]-(3:Person)"
        );
    }

    #[test]
    fn test_path_rejects_bad_indices() {
        assert!(Path::new(vec![], vec![], vec![]).is_none());
        assert!(Path::new(vec![node(1)], vec![knows(1)], vec![1]).is_none());
        assert!(Path::new(vec![node(1), node(2)], vec![knows(1)], vec![0, 1]).is_none());
        assert!(Path::new(vec![node(1), node(2)], vec![knows(1)], vec![2, 1]).is_none());
        assert!(Path::new(vec![node(1), node(2)], vec![knows(1)], vec![1, 2]).is_none());
        assert!(Path::new(vec![node(1), node(2)], vec![knows(1)], vec![-1, -1]).is_none());
    }

    #[test]
    fn test_path_index_past_any_length() {
        let path = Path::single(node(7));
        assert!(path.node_at(usize::MAX).is_none());
        assert!(path.relationship_at(usize::MAX).is_none());
        assert!(path.node_at(usize::MAX / 2 + 1).is_none());
    }

    #[test]
    fn test_deserialized_path_is_validated() {
        let good = Path::new(vec![node(1), node(2)], vec![knows(5)], vec![-1, 1]).unwrap();
        let json = serde_json::to_string(&good).unwrap();
        assert_eq!(serde_json::from_str::<Path>(&json).unwrap(), good);

        let bad = json.replace("[-1,1]", "[-1,9]");
        assert_ne!(bad, json);
        assert!(serde_json::from_str::<Path>(&bad).is_err());
    }

    #[test]
    fn test_single_node_path() {
        let path = Path::single(node(7));
        assert!(path.is_empty());
        assert_eq!(path.start(), path.end());
    }

    #[test]
    fn test_relationship_display() {
        let rel = Relationship::new(5, 1, 12, "TestRel", HashMap::new());
        assert_eq!(rel.to_string(), "(1)-[5:TestRel]->(12)");
    }
}
