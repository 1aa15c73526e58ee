/*! Arena-backed IR graph built from solc ASTs.
 *
 * Every syntax node lives in one arena slot owned by its graph. A node owns its children through
 * `NodeId` handles and refers back to its parent with a non-owning handle, so the ownership graph
 * is a forest of source-unit trees with no cycles. Children are ordered by source position, which
 * makes `traverse` yield nodes in the order they appear in the file.
 *
 * Graphs are immutable once built. Derived facts such as `state_effects` are computed on first
 * read and cached in the node's slot for the lifetime of the graph.
 */

mod builder;
mod effects;
pub mod kinds;

pub use builder::GraphBuilder;
pub use effects::StateEffects;
pub use kinds::{NodeCategory, NodeKind};

use crate::source_location::{ByteRange, LineCol, LineIndex, SourceUnitId};
use crate::{IrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    /// Yul nodes have no compiler id.
    pub(crate) ast_id: Option<i64>,
    pub(crate) unit: SourceUnitId,
    pub(crate) range: ByteRange,
    /// The compiler reported no location and none could be derived from children.
    pub(crate) unplaced: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) effects: OnceCell<StateEffects>,
}

#[derive(Debug, Clone)]
pub struct SourceUnitEntry {
    pub id: SourceUnitId,
    pub name: String,
    /// Source id assigned by the compiler, as used in `src` attributes.
    pub file_index: Option<u32>,
    pub root: NodeId,
    pub line_index: Option<LineIndex>,
}

/// A node's position resolved to 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub source_unit: String,
    pub range: ByteRange,
    pub start: LineCol,
    pub end: LineCol,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_unit, self.start)
    }
}

#[derive(Debug)]
pub struct IrGraph {
    nodes: Vec<Node>,
    units: IndexMap<String, SourceUnitEntry>,
    by_ast_id: HashMap<i64, NodeId>,
    memo_computations: Cell<u64>,
}

impl IrGraph {
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        units: IndexMap<String, SourceUnitEntry>,
        by_ast_id: HashMap<i64, NodeId>,
    ) -> Self {
        Self {
            nodes,
            units,
            by_ast_id,
            memo_computations: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { graph: self, id })
    }

    pub fn node(&self, id: NodeId) -> Result<NodeRef<'_>> {
        self.get(id).ok_or(IrError::UnknownNode(id))
    }

    pub fn by_ast_id(&self, ast_id: i64) -> Option<NodeRef<'_>> {
        self.by_ast_id.get(&ast_id).and_then(|id| self.get(*id))
    }

    pub fn source_units(&self) -> impl Iterator<Item = &SourceUnitEntry> {
        self.units.values()
    }

    pub fn source_unit(&self, name: &str) -> Result<&SourceUnitEntry> {
        self.units
            .get(name)
            .ok_or_else(|| IrError::UnknownSourceUnit(name.to_string()))
    }

    pub fn root(&self, name: &str) -> Result<NodeRef<'_>> {
        let entry = self.source_unit(name)?;
        self.node(entry.root)
    }

    /// All nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(move |i| NodeRef {
            graph: self,
            id: NodeId(i as u32),
        })
    }

    /// Pre-order walk over every source unit, in load order.
    pub fn traverse(&self) -> Traverse<'_> {
        let mut stack: Vec<NodeId> = self.units.values().map(|u| u.root).collect();
        stack.reverse();
        Traverse { graph: self, stack }
    }

    pub fn locate(&self, id: NodeId) -> Result<Location> {
        let node = self.slot(id)?;
        let entry = self.unit_entry(node.unit)?;
        let index = entry
            .line_index
            .as_ref()
            .ok_or_else(|| IrError::MissingSourceText(entry.name.clone()))?;
        let (start, end) = index.range_to_line_cols(node.range)?;
        Ok(Location {
            source_unit: entry.name.clone(),
            range: node.range,
            start,
            end,
        })
    }

    /// Number of memoized properties computed so far.
    ///
    /// A cached read does not move the counter.
    pub fn memo_computations(&self) -> u64 {
        self.memo_computations.get()
    }

    fn slot(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(IrError::UnknownNode(id))
    }

    fn unit_entry(&self, unit: SourceUnitId) -> Result<&SourceUnitEntry> {
        self.units
            .get_index(unit.0 as usize)
            .map(|(_, entry)| entry)
            .ok_or_else(|| IrError::UnknownSourceUnit(unit.to_string()))
    }
}

/// Borrowed handle to one node of a graph.
#[derive(Copy, Clone)]
pub struct NodeRef<'g> {
    graph: &'g IrGraph,
    id: NodeId,
}

impl<'g> NodeRef<'g> {
    fn slot(&self) -> &'g Node {
        &self.graph.nodes[self.id.index()]
    }

    fn wrap(&self, id: NodeId) -> NodeRef<'g> {
        NodeRef {
            graph: self.graph,
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn graph(&self) -> &'g IrGraph {
        self.graph
    }

    pub fn ast_id(&self) -> Option<i64> {
        self.slot().ast_id
    }

    pub fn kind(&self) -> &'g NodeKind {
        &self.slot().kind
    }

    pub fn range(&self) -> ByteRange {
        self.slot().range
    }

    pub fn source_unit(&self) -> &'g SourceUnitEntry {
        let unit = self.slot().unit;
        // Every slot is created while its unit is being registered.
        &self.graph.units[unit.0 as usize]
    }

    pub fn parent(&self) -> Option<NodeRef<'g>> {
        self.slot().parent.map(|id| self.wrap(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'g>> + 'g {
        let graph = self.graph;
        self.slot()
            .children
            .iter()
            .map(move |&id| NodeRef { graph, id })
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'g>> + 'g {
        let graph = self.graph;
        std::iter::successors(self.parent(), move |node| {
            node.slot().parent.map(|id| NodeRef { graph, id })
        })
    }

    /// This node followed by all its descendants, in pre-order.
    pub fn traverse(&self) -> Traverse<'g> {
        Traverse {
            graph: self.graph,
            stack: vec![self.id],
        }
    }

    pub fn enclosing_function(&self) -> Option<NodeRef<'g>> {
        self.ancestors().find(|n| {
            matches!(
                n.kind(),
                NodeKind::FunctionDefinition(_) | NodeKind::ModifierDefinition(_)
            )
        })
    }

    pub fn enclosing_contract(&self) -> Option<NodeRef<'g>> {
        self.ancestors()
            .find(|n| matches!(n.kind(), NodeKind::ContractDefinition(_)))
    }

    /// The declaration an identifier, member access or path resolves to, when
    /// that declaration is part of this graph.
    pub fn referenced_declaration(&self) -> Option<NodeRef<'g>> {
        self.kind()
            .referenced_declaration()
            .and_then(|ast_id| self.graph.by_ast_id(ast_id))
    }

    /// Chain-state effects of evaluating this subtree. Computed once per node.
    pub fn state_effects(&self) -> StateEffects {
        if let Some(effects) = self.slot().effects.get() {
            return *effects;
        }

        // A memoized node always has memoized descendants, so the walk stops there.
        let mut pending = Vec::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let node = &self.graph.nodes[id.index()];
            if node.effects.get().is_none() {
                pending.push(id);
                stack.extend(node.children.iter().copied());
            }
        }

        // Children are allocated before their parents.
        pending.sort_unstable();
        for id in pending {
            let node = self.wrap(id);
            node.slot().effects.get_or_init(|| {
                let counter = &self.graph.memo_computations;
                counter.set(counter.get() + 1);
                node.children()
                    .fold(effects::local_effects(node), |acc, child| {
                        acc | child.memoized_effects()
                    })
            });
        }
        self.memoized_effects()
    }

    fn memoized_effects(&self) -> StateEffects {
        self.slot().effects.get().copied().unwrap_or_default()
    }

    pub fn modifies_state(&self) -> bool {
        self.state_effects()
            .contains(StateEffects::MODIFIES_STATE_VAR)
    }

    /// Whether this expression denotes persistent storage, directly or through
    /// member, index and tuple access.
    pub fn is_ref_to_state_variable(&self) -> bool {
        effects::is_ref_to_state_variable(*self)
    }

    pub fn location(&self) -> Result<Location> {
        self.graph.locate(self.id)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind().name())
            .field("range", &self.range())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// Pre-order iterator over a subtree. Each call to `traverse` starts a fresh walk.
#[derive(Clone)]
pub struct Traverse<'g> {
    graph: &'g IrGraph,
    stack: Vec<NodeId>,
}

impl<'g> Iterator for Traverse<'g> {
    type Item = NodeRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.graph.nodes[id.index()];
        self.stack.extend(node.children.iter().rev().copied());
        Some(NodeRef {
            graph: self.graph,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph() -> IrGraph {
        let ast = json!({
            "id": 10, "src": "0:60:0", "nodeType": "SourceUnit", "absolutePath": "a.sol",
            "nodes": [
                {"id": 1, "src": "0:23:0", "nodeType": "PragmaDirective",
                 "literals": ["solidity", "^", "0.8", ".0"]},
                {"id": 9, "src": "24:36:0", "nodeType": "ContractDefinition", "name": "A",
                 "contractKind": "contract", "abstract": false, "baseContracts": [],
                 "linearizedBaseContracts": [9],
                 "nodes": [
                    {"id": 3, "src": "39:10:0", "nodeType": "VariableDeclaration", "name": "x",
                     "stateVariable": true, "storageLocation": "default", "visibility": "internal",
                     "constant": false, "mutability": "mutable",
                     "typeDescriptions": {"typeString": "uint256"},
                     "typeName": {"id": 2, "src": "39:7:0", "nodeType": "ElementaryTypeName",
                                  "name": "uint256"}}
                 ]}
            ]
        });
        let text = format!("{:<60}", "pragma solidity ^0.8.0;\ncontract A {\n  uint256 x;");
        let mut builder = GraphBuilder::new();
        builder.add_source_unit("a.sol", Some(0), &ast, Some(&text)).unwrap();
        builder.finish()
    }

    #[test]
    fn test_traverse_is_pre_order_and_restartable() {
        let graph = graph();
        let root = graph.root("a.sol").unwrap();

        let names: Vec<_> = root.traverse().map(|n| n.kind().name()).collect();
        assert_eq!(
            names,
            vec![
                "SourceUnit",
                "PragmaDirective",
                "ContractDefinition",
                "VariableDeclaration",
                "ElementaryTypeName",
            ]
        );
        assert_eq!(root.traverse().count(), names.len());
        assert_eq!(graph.traverse().count(), graph.len());
    }

    #[test]
    fn test_parents_and_ancestors() {
        let graph = graph();
        let ty = graph.by_ast_id(2).unwrap();

        assert_eq!(ty.parent().unwrap().ast_id(), Some(3));
        let chain: Vec<_> = ty.ancestors().filter_map(|n| n.ast_id()).collect();
        assert_eq!(chain, vec![3, 9, 10]);
        assert_eq!(ty.enclosing_contract().unwrap().ast_id(), Some(9));
        assert!(ty.enclosing_function().is_none());
        assert!(graph.root("a.sol").unwrap().parent().is_none());
    }

    #[test]
    fn test_locate_uses_line_index() {
        let graph = graph();
        let var = graph.by_ast_id(3).unwrap();
        let location = var.location().unwrap();

        assert_eq!(location.source_unit, "a.sol");
        assert_eq!(location.start, LineCol { line: 3, column: 3 });
    }

    #[test]
    fn test_unknown_lookups() {
        let graph = graph();
        assert!(graph.get(NodeId(999)).is_none());
        assert!(matches!(
            graph.node(NodeId(999)),
            Err(IrError::UnknownNode(_))
        ));
        assert!(matches!(
            graph.root("b.sol"),
            Err(IrError::UnknownSourceUnit(_))
        ));
    }
}
