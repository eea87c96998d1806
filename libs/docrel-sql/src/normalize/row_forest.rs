// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeMap;

use crate::sql::SqlValue;

/// Index of a node in a [`RowForest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Literal(SqlValue),
    /// The primary key of the given node, known only once that node's row is inserted
    Placeholder(NodeId),
}

/// A row to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct RowNode {
    pub table: String,
    pub columns: BTreeMap<String, RowValue>,
    pub parent: Option<NodeId>,
    /// Whether some other node refers to this one through a placeholder
    pub has_dependents: bool,
}

/// Rows produced from one or more documents. A node's parent always precedes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowForest {
    nodes: Vec<RowNode>,
}

impl RowForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and mark its parent as having dependents
    pub fn push(&mut self, node: RowNode) -> NodeId {
        if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(parent.0)) {
            parent.has_dependents = true;
        }

        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Move the nodes of `other` to the end of this forest. Ids in `other` are shifted so
    /// parents and placeholders keep pointing to the same rows.
    pub fn append(&mut self, other: RowForest) {
        let offset = self.nodes.len();
        let rebase = |id: NodeId| NodeId(id.0 + offset);

        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.parent = node.parent.map(rebase);
            for value in node.columns.values_mut() {
                if let RowValue::Placeholder(id) = value {
                    *id = rebase(*id);
                }
            }
            node
        }));
    }

    pub fn get(&self, id: NodeId) -> Option<&RowNode> {
        self.nodes.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &RowNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &RowNode)> {
        self.iter().filter(move |(_, node)| node.parent == Some(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(table: &str, parent: Option<NodeId>) -> RowNode {
        let mut columns = BTreeMap::new();
        if let Some(parent) = parent {
            columns.insert("parent_id".to_string(), RowValue::Placeholder(parent));
        }
        RowNode {
            table: table.to_string(),
            columns,
            parent,
            has_dependents: false,
        }
    }

    #[test]
    fn push_marks_parents() {
        let mut forest = RowForest::new();
        let root = forest.push(node("orders", None));
        let child = forest.push(node("lines", Some(root)));

        assert!(forest.get(root).unwrap().has_dependents);
        assert!(!forest.get(child).unwrap().has_dependents);
        assert_eq!(
            forest.children(root).map(|(id, _)| id).collect::<Vec<_>>(),
            vec![child]
        );
    }

    #[test]
    fn append_rebases_ids() {
        let mut first = RowForest::new();
        first.push(node("orders", None));

        let mut second = RowForest::new();
        let root = second.push(node("orders", None));
        second.push(node("lines", Some(root)));

        first.append(second);

        assert_eq!(first.len(), 3);
        let (_, line) = first.iter().last().unwrap();
        assert_eq!(line.parent, Some(NodeId(1)));
        assert_eq!(
            line.columns["parent_id"],
            RowValue::Placeholder(NodeId(1))
        );
        assert!(first.get(NodeId(1)).unwrap().has_dependents);
        assert!(!first.get(NodeId(0)).unwrap().has_dependents);
    }
}
