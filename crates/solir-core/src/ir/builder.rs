use super::kinds::{self, NodeKind};
use super::{IrGraph, Node, NodeId, SourceUnitEntry};
use crate::ast;
use crate::source_location::{ByteRange, LineIndex, SolcSrc, SourceUnitId};
use crate::{IrError, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Accumulates source units into one graph.
///
/// Each unit is built in a single depth-first pass. A unit that fails to build
/// leaves the builder exactly as it was before the call.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    units: IndexMap<String, SourceUnitEntry>,
    by_ast_id: HashMap<i64, NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the IR for one `sources.<name>.ast` entry of a compiler response.
    ///
    /// `text` enables line/column lookups for the unit's nodes.
    pub fn add_source_unit(
        &mut self,
        name: &str,
        file_index: Option<u32>,
        json: &Value,
        text: Option<&str>,
    ) -> Result<NodeId> {
        if self.units.contains_key(name) {
            return Err(IrError::DuplicateSourceUnit(name.to_string()));
        }

        let raw = ast::SourceUnit::deserialize(serde_stacker::Deserializer::new(json)).map_err(|e| {
            IrError::ProtocolMismatch {
                unit: name.to_string(),
                message: e.to_string(),
            }
        })?;
        let line_index = text.map(LineIndex::new).transpose()?;

        let unit = SourceUnitId(self.units.len() as u32);
        let checkpoint = self.nodes.len();
        let mut pass = UnitPass {
            builder: self,
            unit,
            name,
            file_index,
        };

        match pass.source_unit(&raw) {
            Ok(root) => {
                debug!(
                    unit = name,
                    nodes = self.nodes.len() - checkpoint,
                    "built source unit"
                );
                self.units.insert(
                    name.to_string(),
                    SourceUnitEntry {
                        id: unit,
                        name: name.to_string(),
                        file_index,
                        root,
                        line_index,
                    },
                );
                Ok(root)
            }
            Err(err) => {
                self.rollback(checkpoint);
                Err(err)
            }
        }
    }

    pub fn finish(self) -> IrGraph {
        IrGraph::from_parts(self.nodes, self.units, self.by_ast_id)
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.nodes.truncate(checkpoint);
        self.by_ast_id.retain(|_, id| id.index() < checkpoint);
    }
}

struct UnitPass<'b> {
    builder: &'b mut GraphBuilder,
    unit: SourceUnitId,
    name: &'b str,
    file_index: Option<u32>,
}

impl UnitPass<'_> {
    fn mismatch(&self, message: impl Into<String>) -> IrError {
        IrError::ProtocolMismatch {
            unit: self.name.to_string(),
            message: message.into(),
        }
    }

    fn alloc(&mut self, ast_id: i64, src: &str, kind: NodeKind) -> Result<NodeId> {
        self.alloc_node(Some(ast_id), src, kind)
    }

    fn alloc_yul(&mut self, src: &str, kind: NodeKind) -> Result<NodeId> {
        self.alloc_node(None, src, kind)
    }

    /// Allocates a node whose children have already been built and threads
    /// the parent handle into each of them.
    fn alloc_node(&mut self, ast_id: Option<i64>, src: &str, kind: NodeKind) -> Result<NodeId> {
        let label = NodeLabel(kind.name(), ast_id);
        let parsed = SolcSrc::parse(src).map_err(|e| self.mismatch(format!("{}: {}", label, e)))?;
        if let (Some(expected), Some(actual)) = (self.file_index, parsed.file_index) {
            if expected != actual {
                return Err(self.mismatch(format!(
                    "{} points into source {} instead of {}",
                    label, actual, expected
                )));
            }
        }

        let mut children = kind.child_ids();
        let placed = children
            .iter()
            .map(|c| &self.builder.nodes[c.index()])
            .filter(|c| !c.unplaced)
            .map(|c| c.range)
            .reduce(|a, b| a.merge(&b));

        let (range, unplaced) = match (parsed.range, placed) {
            (Some(range), _) => (self.cover_documentation(range, &children), false),
            (None, Some(merged)) => (merged, false),
            (None, None) => (ByteRange::default(), true),
        };

        if !unplaced {
            for &child in &children {
                let node = &self.builder.nodes[child.index()];
                if node.unplaced {
                    self.place(child, range.start);
                } else if !range.contains(&node.range) {
                    return Err(self.mismatch(format!(
                        "{} at {} escapes its parent {} at {}",
                        NodeLabel(node.kind.name(), node.ast_id),
                        node.range,
                        label,
                        range
                    )));
                }
            }
        }

        let id = NodeId(self.builder.nodes.len() as u32);
        children.sort_by_key(|c| self.builder.nodes[c.index()].range.start);
        for &child in &children {
            let slot = &mut self.builder.nodes[child.index()];
            if slot.parent.is_some() {
                let shared = NodeLabel(slot.kind.name(), slot.ast_id);
                return Err(self.mismatch(format!("{} has two parents", shared)));
            }
            slot.parent = Some(id);
        }

        if let Some(ast_id) = ast_id {
            if self.builder.by_ast_id.contains_key(&ast_id) {
                return Err(self.mismatch(format!("duplicate AST id {}", ast_id)));
            }
            self.builder.by_ast_id.insert(ast_id, id);
        }

        self.builder.nodes.push(Node {
            ast_id,
            unit: self.unit,
            range,
            unplaced,
            parent: None,
            children,
            kind,
            effects: OnceCell::new(),
        });
        Ok(id)
    }

    /// Widens a declaration's range over its natspec, which solc locates just
    /// before the declaration itself.
    fn cover_documentation(&self, range: ByteRange, children: &[NodeId]) -> ByteRange {
        children
            .iter()
            .map(|c| &self.builder.nodes[c.index()])
            .filter(|c| !c.unplaced && matches!(c.kind, NodeKind::StructuredDocumentation(_)))
            .fold(range, |acc, doc| acc.merge(&doc.range))
    }

    /// Gives an unplaced subtree an empty range at `offset`.
    fn place(&mut self, id: NodeId, offset: u32) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = &mut self.builder.nodes[next.index()];
            if !node.unplaced {
                continue;
            }
            node.range = ByteRange::new(offset, offset);
            node.unplaced = false;
            stack.extend(node.children.iter().copied());
        }
    }

    fn source_unit(&mut self, raw: &ast::SourceUnit) -> Result<NodeId> {
        let nodes = raw
            .nodes
            .iter()
            .map(|part| self.source_unit_part(part))
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::SourceUnit(kinds::SourceUnit {
                absolute_path: raw.absolute_path.clone(),
                license: raw.license.clone(),
                nodes,
            }),
        )
    }

    fn source_unit_part(&mut self, part: &ast::SourceUnitPart) -> Result<NodeId> {
        match part {
            ast::SourceUnitPart::PragmaDirective(n) => self.pragma(n),
            ast::SourceUnitPart::ImportDirective(n) => self.import(n),
            ast::SourceUnitPart::ContractDefinition(n) => self.contract(n),
            ast::SourceUnitPart::StructDefinition(n) => self.struct_definition(n),
            ast::SourceUnitPart::EnumDefinition(n) => self.enum_definition(n),
            ast::SourceUnitPart::ErrorDefinition(n) => self.error_definition(n),
            ast::SourceUnitPart::EventDefinition(n) => self.event_definition(n),
            ast::SourceUnitPart::FunctionDefinition(n) => self.function(n),
            ast::SourceUnitPart::VariableDeclaration(n) => self.variable(n),
            ast::SourceUnitPart::UserDefinedValueTypeDefinition(n) => self.value_type(n),
            ast::SourceUnitPart::UsingForDirective(n) => self.using_for(n),
        }
    }

    fn contract_part(&mut self, part: &ast::ContractPart) -> Result<NodeId> {
        match part {
            ast::ContractPart::EnumDefinition(n) => self.enum_definition(n),
            ast::ContractPart::ErrorDefinition(n) => self.error_definition(n),
            ast::ContractPart::EventDefinition(n) => self.event_definition(n),
            ast::ContractPart::FunctionDefinition(n) => self.function(n),
            ast::ContractPart::ModifierDefinition(n) => self.modifier(n),
            ast::ContractPart::StructDefinition(n) => self.struct_definition(n),
            ast::ContractPart::UserDefinedValueTypeDefinition(n) => self.value_type(n),
            ast::ContractPart::UsingForDirective(n) => self.using_for(n),
            ast::ContractPart::VariableDeclaration(n) => self.variable(n),
        }
    }

    fn pragma(&mut self, raw: &ast::PragmaDirective) -> Result<NodeId> {
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::PragmaDirective(kinds::PragmaDirective {
                literals: raw.literals.clone(),
            }),
        )
    }

    fn import(&mut self, raw: &ast::ImportDirective) -> Result<NodeId> {
        let symbol_aliases = raw
            .symbol_aliases
            .iter()
            .map(|alias| {
                Ok(kinds::SymbolAlias {
                    foreign: self.identifier(&alias.foreign)?,
                    local: alias.local.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ImportDirective(kinds::ImportDirective {
                file: raw.file.clone(),
                absolute_path: raw.absolute_path.clone(),
                unit_alias: raw.unit_alias.clone(),
                imported_source_unit: raw.source_unit,
                symbol_aliases,
            }),
        )
    }

    fn contract(&mut self, raw: &ast::ContractDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let base_contracts = raw
            .base_contracts
            .iter()
            .map(|b| self.inheritance(b))
            .collect::<Result<Vec<_>>>()?;
        let nodes = raw
            .nodes
            .iter()
            .map(|part| self.contract_part(part))
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ContractDefinition(kinds::ContractDefinition {
                name: raw.name.clone(),
                contract_kind: raw.contract_kind,
                is_abstract: raw.is_abstract,
                base_contracts,
                nodes,
                documentation,
                fully_implemented: raw.fully_implemented,
                linearized_base_contracts: raw.linearized_base_contracts.clone(),
            }),
        )
    }

    fn inheritance(&mut self, raw: &ast::InheritanceSpecifier) -> Result<NodeId> {
        let base_name = self.path_reference(&raw.base_name)?;
        let arguments = self.optional_expressions(raw.arguments.as_deref())?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::InheritanceSpecifier(kinds::InheritanceSpecifier {
                base_name,
                arguments,
            }),
        )
    }

    fn path_reference(&mut self, raw: &ast::PathReference) -> Result<NodeId> {
        match raw {
            ast::PathReference::Identifier(n) => self.identifier(n),
            ast::PathReference::IdentifierPath(n) => self.identifier_path(n),
            ast::PathReference::UserDefinedTypeName(n) => self.user_defined_type_name(n),
        }
    }

    fn identifier_path(&mut self, raw: &ast::IdentifierPath) -> Result<NodeId> {
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::IdentifierPath(kinds::IdentifierPath {
                name: raw.name.clone(),
                referenced_declaration: raw.referenced_declaration,
            }),
        )
    }

    fn function(&mut self, raw: &ast::FunctionDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let parameters = self.parameter_list(&raw.parameters)?;
        let overrides = raw
            .overrides
            .as_ref()
            .map(|o| self.override_specifier(o))
            .transpose()?;
        let modifiers = raw
            .modifiers
            .iter()
            .map(|m| self.modifier_invocation(m))
            .collect::<Result<Vec<_>>>()?;
        let return_parameters = self.parameter_list(&raw.return_parameters)?;
        let body = raw.body.as_ref().map(|b| self.block(b, false)).transpose()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::FunctionDefinition(kinds::FunctionDefinition {
                name: raw.name.clone(),
                kind: raw.kind,
                state_mutability: raw.state_mutability,
                visibility: raw.visibility,
                is_virtual: raw.is_virtual,
                implemented: raw.implemented,
                modifiers,
                overrides,
                parameters,
                return_parameters,
                body,
                documentation,
                function_selector: raw.function_selector.clone(),
                base_functions: raw.base_functions.clone(),
            }),
        )
    }

    fn modifier(&mut self, raw: &ast::ModifierDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let parameters = self.parameter_list(&raw.parameters)?;
        let overrides = raw
            .overrides
            .as_ref()
            .map(|o| self.override_specifier(o))
            .transpose()?;
        let body = raw.body.as_ref().map(|b| self.block(b, false)).transpose()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ModifierDefinition(kinds::ModifierDefinition {
                name: raw.name.clone(),
                visibility: raw.visibility,
                is_virtual: raw.is_virtual,
                overrides,
                parameters,
                body,
                documentation,
            }),
        )
    }

    fn modifier_invocation(&mut self, raw: &ast::ModifierInvocation) -> Result<NodeId> {
        let modifier_name = self.path_reference(&raw.modifier_name)?;
        let arguments = self.optional_expressions(raw.arguments.as_deref())?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ModifierInvocation(kinds::ModifierInvocation {
                modifier_name,
                arguments,
                kind: raw.kind.clone(),
            }),
        )
    }

    fn override_specifier(&mut self, raw: &ast::OverrideSpecifier) -> Result<NodeId> {
        let overrides = raw
            .overrides
            .iter()
            .map(|o| self.path_reference(o))
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::OverrideSpecifier(kinds::OverrideSpecifier { overrides }),
        )
    }

    fn parameter_list(&mut self, raw: &ast::ParameterList) -> Result<NodeId> {
        let parameters = raw
            .parameters
            .iter()
            .map(|p| self.variable(p))
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ParameterList(kinds::ParameterList { parameters }),
        )
    }

    fn event_definition(&mut self, raw: &ast::EventDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let parameters = self.parameter_list(&raw.parameters)?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::EventDefinition(kinds::EventDefinition {
                name: raw.name.clone(),
                anonymous: raw.anonymous,
                parameters,
                documentation,
            }),
        )
    }

    fn error_definition(&mut self, raw: &ast::ErrorDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let parameters = self.parameter_list(&raw.parameters)?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ErrorDefinition(kinds::ErrorDefinition {
                name: raw.name.clone(),
                parameters,
                documentation,
            }),
        )
    }

    fn variable(&mut self, raw: &ast::VariableDeclaration) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let type_name = raw
            .type_name
            .as_ref()
            .map(|t| self.type_name(t))
            .transpose()?;
        let overrides = raw
            .overrides
            .as_ref()
            .map(|o| self.override_specifier(o))
            .transpose()?;
        let value = raw.value.as_ref().map(|v| self.expression(v)).transpose()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::VariableDeclaration(kinds::VariableDeclaration {
                name: raw.name.clone(),
                type_name,
                value,
                mutability: raw.effective_mutability(),
                is_state_variable: raw.state_variable,
                data_location: raw.storage_location,
                visibility: raw.visibility,
                indexed: raw.indexed.unwrap_or(false),
                overrides,
                documentation,
                type_string: raw.type_descriptions.type_string().to_string(),
            }),
        )
    }

    fn struct_definition(&mut self, raw: &ast::StructDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let members = raw
            .members
            .iter()
            .map(|m| self.variable(m))
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::StructDefinition(kinds::StructDefinition {
                name: raw.name.clone(),
                members,
                canonical_name: raw.canonical_name.clone(),
                documentation,
            }),
        )
    }

    fn enum_definition(&mut self, raw: &ast::EnumDefinition) -> Result<NodeId> {
        let documentation = self.documentation(raw.documentation.as_ref())?;
        let values = raw
            .members
            .iter()
            .map(|v| {
                self.alloc(
                    v.id,
                    &v.src,
                    NodeKind::EnumValue(kinds::EnumValue {
                        name: v.name.clone(),
                    }),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::EnumDefinition(kinds::EnumDefinition {
                name: raw.name.clone(),
                values,
                canonical_name: raw.canonical_name.clone(),
                documentation,
            }),
        )
    }

    fn value_type(&mut self, raw: &ast::UserDefinedValueTypeDefinition) -> Result<NodeId> {
        let underlying_type = self.type_name(&raw.underlying_type)?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::UserDefinedValueTypeDefinition(kinds::UserDefinedValueTypeDefinition {
                name: raw.name.clone(),
                underlying_type,
                canonical_name: raw.canonical_name.clone(),
            }),
        )
    }

    fn using_for(&mut self, raw: &ast::UsingForDirective) -> Result<NodeId> {
        let library_name = raw
            .library_name
            .as_ref()
            .map(|l| self.path_reference(l))
            .transpose()?;

        let mut functions = Vec::new();
        for entry in raw.function_list.iter().flatten() {
            let path = entry
                .function
                .as_ref()
                .or(entry.definition.as_ref())
                .ok_or_else(|| {
                    self.mismatch(format!("using-for entry in {} names no function", raw.id))
                })?;
            functions.push(kinds::UsingForFunction {
                function: self.identifier_path(path)?,
                operator: entry.operator.clone(),
            });
        }

        let type_name = raw
            .type_name
            .as_ref()
            .map(|t| self.type_name(t))
            .transpose()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::UsingForDirective(kinds::UsingForDirective {
                library_name,
                functions,
                type_name,
                global: raw.global,
            }),
        )
    }

    fn type_name(&mut self, raw: &ast::TypeName) -> Result<NodeId> {
        crate::with_stack(|| self.type_name_node(raw))
    }

    fn type_name_node(&mut self, raw: &ast::TypeName) -> Result<NodeId> {
        match raw {
            ast::TypeName::ElementaryTypeName(n) => self.elementary_type_name(n),
            ast::TypeName::UserDefinedTypeName(n) => self.user_defined_type_name(n),
            ast::TypeName::Mapping(n) => {
                let key_type = self.type_name(&n.key_type)?;
                let value_type = self.type_name(&n.value_type)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::Mapping(kinds::Mapping {
                        key_type,
                        value_type,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::TypeName::ArrayTypeName(n) => {
                let base_type = self.type_name(&n.base_type)?;
                let length = n.length.as_ref().map(|l| self.expression(l)).transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::ArrayTypeName(kinds::ArrayTypeName {
                        base_type,
                        length,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::TypeName::FunctionTypeName(n) => {
                let parameter_types = self.parameter_list(&n.parameter_types)?;
                let return_parameter_types = self.parameter_list(&n.return_parameter_types)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::FunctionTypeName(kinds::FunctionTypeName {
                        parameter_types,
                        return_parameter_types,
                        state_mutability: n.state_mutability,
                        visibility: n.visibility,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
        }
    }

    fn elementary_type_name(&mut self, raw: &ast::ElementaryTypeName) -> Result<NodeId> {
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ElementaryTypeName(kinds::ElementaryTypeName {
                name: raw.name.clone(),
                state_mutability: raw.state_mutability,
                type_string: raw.type_descriptions.type_string().to_string(),
            }),
        )
    }

    fn user_defined_type_name(&mut self, raw: &ast::UserDefinedTypeName) -> Result<NodeId> {
        let path_node = raw
            .path_node
            .as_ref()
            .map(|p| self.identifier_path(p))
            .transpose()?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::UserDefinedTypeName(kinds::UserDefinedTypeName {
                name: raw.display_name().to_string(),
                path_node,
                referenced_declaration: raw.referenced_declaration,
                type_string: raw.type_descriptions.type_string().to_string(),
            }),
        )
    }

    fn block(&mut self, raw: &ast::Block, unchecked: bool) -> Result<NodeId> {
        let statements = raw
            .statements
            .iter()
            .flatten()
            .map(|s| self.statement(s))
            .collect::<Result<Vec<_>>>()?;
        let block = kinds::Block {
            statements,
            documentation: raw.documentation.clone(),
        };
        let kind = if unchecked {
            NodeKind::UncheckedBlock(block)
        } else {
            NodeKind::Block(block)
        };
        self.alloc(raw.id, &raw.src, kind)
    }

    fn statement(&mut self, raw: &ast::Statement) -> Result<NodeId> {
        crate::with_stack(|| self.statement_node(raw))
    }

    fn statement_node(&mut self, raw: &ast::Statement) -> Result<NodeId> {
        match raw {
            ast::Statement::Block(n) => self.block(n, false),
            ast::Statement::UncheckedBlock(n) => self.block(n, true),
            ast::Statement::ExpressionStatement(n) => self.expression_statement(n),
            ast::Statement::VariableDeclarationStatement(n) => {
                let declarations = n
                    .declarations
                    .iter()
                    .map(|d| d.as_ref().map(|d| self.variable(d)).transpose())
                    .collect::<Result<Vec<_>>>()?;
                let initial_value = n
                    .initial_value
                    .as_ref()
                    .map(|v| self.expression(v))
                    .transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::VariableDeclarationStatement(kinds::VariableDeclarationStatement {
                        declarations,
                        initial_value,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::IfStatement(n) => {
                let condition = self.expression(&n.condition)?;
                let true_body = self.statement(&n.true_body)?;
                let false_body = n
                    .false_body
                    .as_ref()
                    .map(|b| self.statement(b))
                    .transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::IfStatement(kinds::IfStatement {
                        condition,
                        true_body,
                        false_body,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::ForStatement(n) => {
                let initialization = n
                    .initialization_expression
                    .as_ref()
                    .map(|s| self.statement(s))
                    .transpose()?;
                let condition = n
                    .condition
                    .as_ref()
                    .map(|c| self.expression(c))
                    .transpose()?;
                let loop_expression = n
                    .loop_expression
                    .as_ref()
                    .map(|e| self.expression_statement(e))
                    .transpose()?;
                let body = self.statement(&n.body)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::ForStatement(kinds::ForStatement {
                        initialization,
                        condition,
                        loop_expression,
                        body,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::WhileStatement(n) => {
                let condition = self.expression(&n.condition)?;
                let body = self.statement(&n.body)?;
                let kind = NodeKind::WhileStatement(kinds::LoopStatement {
                    condition,
                    body,
                    documentation: n.documentation.clone(),
                });
                self.alloc(n.id, &n.src, kind)
            }
            ast::Statement::DoWhileStatement(n) => {
                let body = self.statement(&n.body)?;
                let condition = self.expression(&n.condition)?;
                let kind = NodeKind::DoWhileStatement(kinds::LoopStatement {
                    condition,
                    body,
                    documentation: n.documentation.clone(),
                });
                self.alloc(n.id, &n.src, kind)
            }
            ast::Statement::Return(n) => {
                let expression = n
                    .expression
                    .as_ref()
                    .map(|e| self.expression(e))
                    .transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::Return(kinds::Return {
                        expression,
                        function_return_parameters: n.function_return_parameters,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::EmitStatement(n) => {
                let event_call = self.function_call(&n.event_call)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::EmitStatement(kinds::EmitStatement {
                        event_call,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::RevertStatement(n) => {
                let error_call = self.function_call(&n.error_call)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::RevertStatement(kinds::RevertStatement {
                        error_call,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::Break(n) => self.simple(n, NodeKind::Break),
            ast::Statement::Continue(n) => self.simple(n, NodeKind::Continue),
            ast::Statement::Throw(n) => self.simple(n, NodeKind::Throw),
            ast::Statement::PlaceholderStatement(n) => {
                self.simple(n, NodeKind::PlaceholderStatement)
            }
            ast::Statement::TryStatement(n) => {
                let external_call = self.expression(&n.external_call)?;
                let clauses = n
                    .clauses
                    .iter()
                    .map(|c| self.try_catch_clause(c))
                    .collect::<Result<Vec<_>>>()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::TryStatement(kinds::TryStatement {
                        external_call,
                        clauses,
                        documentation: n.documentation.clone(),
                    }),
                )
            }
            ast::Statement::InlineAssembly(n) => {
                let ast = n.ast.as_ref().map(|b| self.yul_block(b)).transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::InlineAssembly(kinds::InlineAssembly {
                        ast,
                        evm_version: n.evm_version.clone(),
                        flags: n.flags.clone(),
                        documentation: n.documentation.clone(),
                    }),
                )
            }
        }
    }

    fn documentation(
        &mut self,
        raw: Option<&ast::Documentation>,
    ) -> Result<Option<kinds::Documentation>> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let node = match raw {
            ast::Documentation::Text(_) => None,
            ast::Documentation::Structured(doc) => Some(self.alloc(
                doc.id,
                &doc.src,
                NodeKind::StructuredDocumentation(kinds::StructuredDocumentation {
                    text: doc.text.clone(),
                }),
            )?),
        };
        Ok(Some(kinds::Documentation {
            text: raw.text().to_string(),
            node,
        }))
    }

    fn yul_block(&mut self, raw: &ast::YulBlock) -> Result<NodeId> {
        let statements = raw
            .statements
            .iter()
            .map(|s| self.yul_statement(s))
            .collect::<Result<Vec<_>>>()?;
        self.alloc_yul(&raw.src, NodeKind::YulBlock(kinds::YulBlock { statements }))
    }

    fn yul_statement(&mut self, raw: &ast::YulStatement) -> Result<NodeId> {
        crate::with_stack(|| self.yul_statement_node(raw))
    }

    fn yul_statement_node(&mut self, raw: &ast::YulStatement) -> Result<NodeId> {
        match raw {
            ast::YulStatement::YulBlock(n) => self.yul_block(n),
            ast::YulStatement::YulAssignment(n) => {
                let variable_names = n
                    .variable_names
                    .iter()
                    .map(|v| self.yul_identifier(v))
                    .collect::<Result<Vec<_>>>()?;
                let value = self.yul_expression(&n.value)?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulAssignment(kinds::YulAssignment {
                        variable_names,
                        value,
                    }),
                )
            }
            ast::YulStatement::YulVariableDeclaration(n) => {
                let variables = self.yul_typed_names(&n.variables)?;
                let value = n
                    .value
                    .as_ref()
                    .map(|v| self.yul_expression(v))
                    .transpose()?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulVariableDeclaration(kinds::YulVariableDeclaration {
                        variables,
                        value,
                    }),
                )
            }
            ast::YulStatement::YulExpressionStatement(n) => {
                let expression = self.yul_expression(&n.expression)?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulExpressionStatement(kinds::YulExpressionStatement { expression }),
                )
            }
            ast::YulStatement::YulIf(n) => {
                let condition = self.yul_expression(&n.condition)?;
                let body = self.yul_block(&n.body)?;
                self.alloc_yul(&n.src, NodeKind::YulIf(kinds::YulIf { condition, body }))
            }
            ast::YulStatement::YulSwitch(n) => {
                let expression = self.yul_expression(&n.expression)?;
                let cases = n
                    .cases
                    .iter()
                    .map(|c| self.yul_case(c))
                    .collect::<Result<Vec<_>>>()?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulSwitch(kinds::YulSwitch { expression, cases }),
                )
            }
            ast::YulStatement::YulForLoop(n) => {
                let pre = self.yul_block(&n.pre)?;
                let condition = self.yul_expression(&n.condition)?;
                let post = self.yul_block(&n.post)?;
                let body = self.yul_block(&n.body)?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulForLoop(kinds::YulForLoop {
                        pre,
                        condition,
                        post,
                        body,
                    }),
                )
            }
            ast::YulStatement::YulFunctionDefinition(n) => {
                let parameters = self.yul_typed_names(&n.parameters)?;
                let return_variables = self.yul_typed_names(&n.return_variables)?;
                let body = self.yul_block(&n.body)?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulFunctionDefinition(kinds::YulFunctionDefinition {
                        name: n.name.clone(),
                        parameters,
                        return_variables,
                        body,
                    }),
                )
            }
            ast::YulStatement::YulBreak(n) => self.alloc_yul(&n.src, NodeKind::YulBreak),
            ast::YulStatement::YulContinue(n) => self.alloc_yul(&n.src, NodeKind::YulContinue),
            ast::YulStatement::YulLeave(n) => self.alloc_yul(&n.src, NodeKind::YulLeave),
        }
    }

    fn yul_case(&mut self, raw: &ast::YulCase) -> Result<NodeId> {
        let value = match &raw.value {
            ast::YulCaseValue::Literal(literal) => Some(self.yul_literal(literal)?),
            ast::YulCaseValue::Default(label) if label == "default" => None,
            ast::YulCaseValue::Default(label) => {
                return Err(self.mismatch(format!("unknown Yul case label '{}'", label)));
            }
        };
        let body = self.yul_block(&raw.body)?;
        self.alloc_yul(&raw.src, NodeKind::YulCase(kinds::YulCase { value, body }))
    }

    fn yul_typed_names(&mut self, raw: &[ast::YulTypedName]) -> Result<Vec<NodeId>> {
        raw.iter()
            .map(|t| {
                self.alloc_yul(
                    &t.src,
                    NodeKind::YulTypedName(kinds::YulTypedName {
                        name: t.name.clone(),
                        type_name: t.type_name.clone(),
                    }),
                )
            })
            .collect()
    }

    fn yul_expression(&mut self, raw: &ast::YulExpression) -> Result<NodeId> {
        crate::with_stack(|| match raw {
            ast::YulExpression::YulFunctionCall(n) => {
                let function_name = self.yul_identifier(&n.function_name)?;
                let arguments = n
                    .arguments
                    .iter()
                    .map(|a| self.yul_expression(a))
                    .collect::<Result<Vec<_>>>()?;
                self.alloc_yul(
                    &n.src,
                    NodeKind::YulFunctionCall(kinds::YulFunctionCall {
                        function_name,
                        arguments,
                    }),
                )
            }
            ast::YulExpression::YulIdentifier(n) => self.yul_identifier(n),
            ast::YulExpression::YulLiteral(n) => self.yul_literal(n),
        })
    }

    fn yul_identifier(&mut self, raw: &ast::YulIdentifier) -> Result<NodeId> {
        self.alloc_yul(
            &raw.src,
            NodeKind::YulIdentifier(kinds::YulIdentifier {
                name: raw.name.clone(),
            }),
        )
    }

    fn yul_literal(&mut self, raw: &ast::YulLiteral) -> Result<NodeId> {
        self.alloc_yul(
            &raw.src,
            NodeKind::YulLiteral(kinds::YulLiteral {
                kind: raw.kind,
                value: raw.value.clone(),
                hex_value: raw.hex_value.clone(),
                type_name: raw.type_name.clone(),
            }),
        )
    }

    fn simple(
        &mut self,
        raw: &ast::SimpleStatement,
        wrap: fn(kinds::SimpleStatement) -> NodeKind,
    ) -> Result<NodeId> {
        self.alloc(
            raw.id,
            &raw.src,
            wrap(kinds::SimpleStatement {
                documentation: raw.documentation.clone(),
            }),
        )
    }

    fn expression_statement(&mut self, raw: &ast::ExpressionStatement) -> Result<NodeId> {
        let expression = self.expression(&raw.expression)?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::ExpressionStatement(kinds::ExpressionStatement {
                expression,
                documentation: raw.documentation.clone(),
            }),
        )
    }

    fn try_catch_clause(&mut self, raw: &ast::TryCatchClause) -> Result<NodeId> {
        let parameters = raw
            .parameters
            .as_ref()
            .map(|p| self.parameter_list(p))
            .transpose()?;
        let block = self.block(&raw.block, false)?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::TryCatchClause(kinds::TryCatchClause {
                error_name: raw.error_name.clone(),
                parameters,
                block,
            }),
        )
    }

    fn optional_expressions(
        &mut self,
        raw: Option<&[ast::Expression]>,
    ) -> Result<Option<Vec<NodeId>>> {
        raw.map(|exprs| self.expressions(exprs)).transpose()
    }

    fn expressions(&mut self, raw: &[ast::Expression]) -> Result<Vec<NodeId>> {
        raw.iter().map(|e| self.expression(e)).collect()
    }

    fn function_call(&mut self, raw: &ast::FunctionCall) -> Result<NodeId> {
        let expression = self.expression(&raw.expression)?;
        let arguments = self.expressions(&raw.arguments)?;
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::FunctionCall(kinds::FunctionCall {
                kind: raw.kind,
                expression,
                arguments,
                names: raw.names.clone(),
                try_call: raw.try_call,
                type_string: raw.type_descriptions.type_string().to_string(),
            }),
        )
    }

    fn identifier(&mut self, raw: &ast::Identifier) -> Result<NodeId> {
        self.alloc(
            raw.id,
            &raw.src,
            NodeKind::Identifier(kinds::Identifier {
                name: raw.name.clone(),
                referenced_declaration: raw.referenced_declaration,
                overloaded_declarations: raw.overloaded_declarations.clone(),
                type_string: raw.type_descriptions.type_string().to_string(),
            }),
        )
    }

    fn expression(&mut self, raw: &ast::Expression) -> Result<NodeId> {
        crate::with_stack(|| self.expression_node(raw))
    }

    fn expression_node(&mut self, raw: &ast::Expression) -> Result<NodeId> {
        match raw {
            ast::Expression::Assignment(n) => {
                let left_hand_side = self.expression(&n.left_hand_side)?;
                let right_hand_side = self.expression(&n.right_hand_side)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::Assignment(kinds::Assignment {
                        operator: n.operator.clone(),
                        left_hand_side,
                        right_hand_side,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::BinaryOperation(n) => {
                let left_expression = self.expression(&n.left_expression)?;
                let right_expression = self.expression(&n.right_expression)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::BinaryOperation(kinds::BinaryOperation {
                        operator: n.operator.clone(),
                        left_expression,
                        right_expression,
                        function: n.function,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::Conditional(n) => {
                let condition = self.expression(&n.condition)?;
                let true_expression = self.expression(&n.true_expression)?;
                let false_expression = self.expression(&n.false_expression)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::Conditional(kinds::Conditional {
                        condition,
                        true_expression,
                        false_expression,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::ElementaryTypeNameExpression(n) => {
                let type_name = self.elementary_type_name(&n.type_name)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::ElementaryTypeNameExpression(kinds::ElementaryTypeNameExpression {
                        type_name,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::FunctionCall(n) => self.function_call(n),
            ast::Expression::FunctionCallOptions(n) => {
                let expression = self.expression(&n.expression)?;
                let options = self.expressions(&n.options)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::FunctionCallOptions(kinds::FunctionCallOptions {
                        expression,
                        names: n.names.clone(),
                        options,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::Identifier(n) => self.identifier(n),
            ast::Expression::IndexAccess(n) => {
                let base_expression = self.expression(&n.base_expression)?;
                let index_expression = n
                    .index_expression
                    .as_ref()
                    .map(|e| self.expression(e))
                    .transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::IndexAccess(kinds::IndexAccess {
                        base_expression,
                        index_expression,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::IndexRangeAccess(n) => {
                let base_expression = self.expression(&n.base_expression)?;
                let start_expression = n
                    .start_expression
                    .as_ref()
                    .map(|e| self.expression(e))
                    .transpose()?;
                let end_expression = n
                    .end_expression
                    .as_ref()
                    .map(|e| self.expression(e))
                    .transpose()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::IndexRangeAccess(kinds::IndexRangeAccess {
                        base_expression,
                        start_expression,
                        end_expression,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::Literal(n) => self.alloc(
                n.id,
                &n.src,
                NodeKind::Literal(kinds::Literal {
                    kind: n.kind,
                    value: n.value.clone(),
                    hex_value: n.hex_value.clone(),
                    subdenomination: n.subdenomination.clone(),
                    type_string: n.type_descriptions.type_string().to_string(),
                }),
            ),
            ast::Expression::MemberAccess(n) => {
                let expression = self.expression(&n.expression)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::MemberAccess(kinds::MemberAccess {
                        expression,
                        member_name: n.member_name.clone(),
                        referenced_declaration: n.referenced_declaration,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::NewExpression(n) => {
                let type_name = self.type_name(&n.type_name)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::NewExpression(kinds::NewExpression {
                        type_name,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::TupleExpression(n) => {
                let components = n
                    .components
                    .iter()
                    .map(|c| c.as_ref().map(|c| self.expression(c)).transpose())
                    .collect::<Result<Vec<_>>>()?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::TupleExpression(kinds::TupleExpression {
                        components,
                        is_inline_array: n.is_inline_array,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
            ast::Expression::UnaryOperation(n) => {
                let sub_expression = self.expression(&n.sub_expression)?;
                self.alloc(
                    n.id,
                    &n.src,
                    NodeKind::UnaryOperation(kinds::UnaryOperation {
                        operator: n.operator.clone(),
                        prefix: n.prefix,
                        sub_expression,
                        type_string: n.type_descriptions.type_string().to_string(),
                    }),
                )
            }
        }
    }
}

/// Names a node in protocol-mismatch messages.
struct NodeLabel(&'static str, Option<i64>);

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(id) => write!(f, "{} {}", self.0, id),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit(id: i64, src: &str, nodes: Value) -> Value {
        json!({"id": id, "src": src, "nodeType": "SourceUnit", "absolutePath": "x.sol", "nodes": nodes})
    }

    #[test]
    fn test_child_escaping_parent_is_rejected() {
        let ast = unit(
            2,
            "0:10:0",
            json!([{"id": 1, "src": "5:20:0", "nodeType": "PragmaDirective", "literals": []}]),
        );
        let mut builder = GraphBuilder::new();
        let err = builder.add_source_unit("x.sol", Some(0), &ast, None).unwrap_err();
        assert!(matches!(err, IrError::ProtocolMismatch { .. }));
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_failed_unit_leaves_builder_untouched() {
        let good = unit(
            2,
            "0:10:0",
            json!([{"id": 1, "src": "0:5:0", "nodeType": "PragmaDirective", "literals": []}]),
        );
        let bad = unit(
            4,
            "0:10:1",
            json!([{"id": 3, "src": "0:5:0", "nodeType": "PragmaDirective", "literals": []}]),
        );

        let mut builder = GraphBuilder::new();
        builder.add_source_unit("good.sol", Some(0), &good, None).unwrap();
        let err = builder.add_source_unit("bad.sol", Some(1), &bad, None).unwrap_err();
        assert!(matches!(err, IrError::ProtocolMismatch { .. }));

        let graph = builder.finish();
        assert_eq!(graph.len(), 2);
        assert!(graph.by_ast_id(3).is_none());
        assert!(graph.source_unit("bad.sol").is_err());
    }

    #[test]
    fn test_duplicate_source_unit() {
        let ast = unit(1, "0:0:0", json!([]));
        let mut builder = GraphBuilder::new();
        builder.add_source_unit("x.sol", None, &ast, None).unwrap();
        assert!(matches!(
            builder.add_source_unit("x.sol", None, &ast, None),
            Err(IrError::DuplicateSourceUnit(_))
        ));
    }

    #[test]
    fn test_malformed_src_is_protocol_mismatch() {
        let ast = unit(1, "zero:ten", json!([]));
        let mut builder = GraphBuilder::new();
        assert!(matches!(
            builder.add_source_unit("x.sol", None, &ast, None),
            Err(IrError::ProtocolMismatch { .. })
        ));
    }

    #[test]
    fn test_unlocated_leaf_is_placed_at_parent_start() {
        let ast = unit(
            5,
            "0:30:0",
            json!([{
                "id": 4, "src": "3:20:0", "nodeType": "ErrorDefinition", "name": "E",
                "parameters": {"id": 3, "src": "-1:-1:-1", "nodeType": "ParameterList", "parameters": []}
            }]),
        );
        let mut builder = GraphBuilder::new();
        builder.add_source_unit("x.sol", Some(0), &ast, None).unwrap();
        let graph = builder.finish();

        let params = graph.by_ast_id(3).unwrap();
        assert_eq!(params.range(), ByteRange::new(3, 3));
        assert_eq!(params.parent().unwrap().ast_id(), Some(4));
    }
}
