use super::NodeId;
use crate::ast::{
    ContractKind, DataLocation, FunctionCallKind, FunctionKind, LiteralKind, StateMutability,
    VariableMutability, Visibility, YulLiteralKind,
};
use num_bigint::BigUint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    SourceUnit,
    Declaration,
    TypeName,
    Statement,
    Expression,
    Meta,
    Yul,
}

/// Every syntax node kind the IR knows about.
///
/// Child links are `NodeId`s owned by this node; scalar attributes are copied
/// out of the compiler's AST.
#[derive(Debug, Clone)]
pub enum NodeKind {
    SourceUnit(SourceUnit),

    PragmaDirective(PragmaDirective),
    ImportDirective(ImportDirective),
    InheritanceSpecifier(InheritanceSpecifier),
    ModifierInvocation(ModifierInvocation),
    OverrideSpecifier(OverrideSpecifier),
    ParameterList(ParameterList),
    IdentifierPath(IdentifierPath),
    UsingForDirective(UsingForDirective),
    TryCatchClause(TryCatchClause),
    StructuredDocumentation(StructuredDocumentation),

    ContractDefinition(ContractDefinition),
    FunctionDefinition(FunctionDefinition),
    ModifierDefinition(ModifierDefinition),
    EventDefinition(EventDefinition),
    ErrorDefinition(ErrorDefinition),
    VariableDeclaration(VariableDeclaration),
    StructDefinition(StructDefinition),
    EnumDefinition(EnumDefinition),
    EnumValue(EnumValue),
    UserDefinedValueTypeDefinition(UserDefinedValueTypeDefinition),

    ElementaryTypeName(ElementaryTypeName),
    UserDefinedTypeName(UserDefinedTypeName),
    Mapping(Mapping),
    ArrayTypeName(ArrayTypeName),
    FunctionTypeName(FunctionTypeName),

    Block(Block),
    UncheckedBlock(Block),
    ExpressionStatement(ExpressionStatement),
    VariableDeclarationStatement(VariableDeclarationStatement),
    IfStatement(IfStatement),
    ForStatement(ForStatement),
    WhileStatement(LoopStatement),
    DoWhileStatement(LoopStatement),
    Return(Return),
    EmitStatement(EmitStatement),
    RevertStatement(RevertStatement),
    Break(SimpleStatement),
    Continue(SimpleStatement),
    Throw(SimpleStatement),
    PlaceholderStatement(SimpleStatement),
    TryStatement(TryStatement),
    InlineAssembly(InlineAssembly),

    Assignment(Assignment),
    BinaryOperation(BinaryOperation),
    Conditional(Conditional),
    ElementaryTypeNameExpression(ElementaryTypeNameExpression),
    FunctionCall(FunctionCall),
    FunctionCallOptions(FunctionCallOptions),
    Identifier(Identifier),
    IndexAccess(IndexAccess),
    IndexRangeAccess(IndexRangeAccess),
    Literal(Literal),
    MemberAccess(MemberAccess),
    NewExpression(NewExpression),
    TupleExpression(TupleExpression),
    UnaryOperation(UnaryOperation),

    YulBlock(YulBlock),
    YulAssignment(YulAssignment),
    YulVariableDeclaration(YulVariableDeclaration),
    YulTypedName(YulTypedName),
    YulExpressionStatement(YulExpressionStatement),
    YulIf(YulIf),
    YulSwitch(YulSwitch),
    YulCase(YulCase),
    YulForLoop(YulForLoop),
    YulFunctionDefinition(YulFunctionDefinition),
    YulBreak,
    YulContinue,
    YulLeave,
    YulFunctionCall(YulFunctionCall),
    YulIdentifier(YulIdentifier),
    YulLiteral(YulLiteral),
}

impl NodeKind {
    /// The solc `nodeType` this kind was built from.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::SourceUnit(_) => "SourceUnit",
            NodeKind::PragmaDirective(_) => "PragmaDirective",
            NodeKind::ImportDirective(_) => "ImportDirective",
            NodeKind::InheritanceSpecifier(_) => "InheritanceSpecifier",
            NodeKind::ModifierInvocation(_) => "ModifierInvocation",
            NodeKind::OverrideSpecifier(_) => "OverrideSpecifier",
            NodeKind::ParameterList(_) => "ParameterList",
            NodeKind::IdentifierPath(_) => "IdentifierPath",
            NodeKind::UsingForDirective(_) => "UsingForDirective",
            NodeKind::TryCatchClause(_) => "TryCatchClause",
            NodeKind::StructuredDocumentation(_) => "StructuredDocumentation",
            NodeKind::ContractDefinition(_) => "ContractDefinition",
            NodeKind::FunctionDefinition(_) => "FunctionDefinition",
            NodeKind::ModifierDefinition(_) => "ModifierDefinition",
            NodeKind::EventDefinition(_) => "EventDefinition",
            NodeKind::ErrorDefinition(_) => "ErrorDefinition",
            NodeKind::VariableDeclaration(_) => "VariableDeclaration",
            NodeKind::StructDefinition(_) => "StructDefinition",
            NodeKind::EnumDefinition(_) => "EnumDefinition",
            NodeKind::EnumValue(_) => "EnumValue",
            NodeKind::UserDefinedValueTypeDefinition(_) => "UserDefinedValueTypeDefinition",
            NodeKind::ElementaryTypeName(_) => "ElementaryTypeName",
            NodeKind::UserDefinedTypeName(_) => "UserDefinedTypeName",
            NodeKind::Mapping(_) => "Mapping",
            NodeKind::ArrayTypeName(_) => "ArrayTypeName",
            NodeKind::FunctionTypeName(_) => "FunctionTypeName",
            NodeKind::Block(_) => "Block",
            NodeKind::UncheckedBlock(_) => "UncheckedBlock",
            NodeKind::ExpressionStatement(_) => "ExpressionStatement",
            NodeKind::VariableDeclarationStatement(_) => "VariableDeclarationStatement",
            NodeKind::IfStatement(_) => "IfStatement",
            NodeKind::ForStatement(_) => "ForStatement",
            NodeKind::WhileStatement(_) => "WhileStatement",
            NodeKind::DoWhileStatement(_) => "DoWhileStatement",
            NodeKind::Return(_) => "Return",
            NodeKind::EmitStatement(_) => "EmitStatement",
            NodeKind::RevertStatement(_) => "RevertStatement",
            NodeKind::Break(_) => "Break",
            NodeKind::Continue(_) => "Continue",
            NodeKind::Throw(_) => "Throw",
            NodeKind::PlaceholderStatement(_) => "PlaceholderStatement",
            NodeKind::TryStatement(_) => "TryStatement",
            NodeKind::InlineAssembly(_) => "InlineAssembly",
            NodeKind::Assignment(_) => "Assignment",
            NodeKind::BinaryOperation(_) => "BinaryOperation",
            NodeKind::Conditional(_) => "Conditional",
            NodeKind::ElementaryTypeNameExpression(_) => "ElementaryTypeNameExpression",
            NodeKind::FunctionCall(_) => "FunctionCall",
            NodeKind::FunctionCallOptions(_) => "FunctionCallOptions",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::IndexAccess(_) => "IndexAccess",
            NodeKind::IndexRangeAccess(_) => "IndexRangeAccess",
            NodeKind::Literal(_) => "Literal",
            NodeKind::MemberAccess(_) => "MemberAccess",
            NodeKind::NewExpression(_) => "NewExpression",
            NodeKind::TupleExpression(_) => "TupleExpression",
            NodeKind::UnaryOperation(_) => "UnaryOperation",
            NodeKind::YulBlock(_) => "YulBlock",
            NodeKind::YulAssignment(_) => "YulAssignment",
            NodeKind::YulVariableDeclaration(_) => "YulVariableDeclaration",
            NodeKind::YulTypedName(_) => "YulTypedName",
            NodeKind::YulExpressionStatement(_) => "YulExpressionStatement",
            NodeKind::YulIf(_) => "YulIf",
            NodeKind::YulSwitch(_) => "YulSwitch",
            NodeKind::YulCase(_) => "YulCase",
            NodeKind::YulForLoop(_) => "YulForLoop",
            NodeKind::YulFunctionDefinition(_) => "YulFunctionDefinition",
            NodeKind::YulBreak => "YulBreak",
            NodeKind::YulContinue => "YulContinue",
            NodeKind::YulLeave => "YulLeave",
            NodeKind::YulFunctionCall(_) => "YulFunctionCall",
            NodeKind::YulIdentifier(_) => "YulIdentifier",
            NodeKind::YulLiteral(_) => "YulLiteral",
        }
    }

    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::SourceUnit(_) => NodeCategory::SourceUnit,

            NodeKind::PragmaDirective(_)
            | NodeKind::ImportDirective(_)
            | NodeKind::InheritanceSpecifier(_)
            | NodeKind::ModifierInvocation(_)
            | NodeKind::OverrideSpecifier(_)
            | NodeKind::ParameterList(_)
            | NodeKind::IdentifierPath(_)
            | NodeKind::UsingForDirective(_)
            | NodeKind::TryCatchClause(_)
            | NodeKind::StructuredDocumentation(_) => NodeCategory::Meta,

            NodeKind::ContractDefinition(_)
            | NodeKind::FunctionDefinition(_)
            | NodeKind::ModifierDefinition(_)
            | NodeKind::EventDefinition(_)
            | NodeKind::ErrorDefinition(_)
            | NodeKind::VariableDeclaration(_)
            | NodeKind::StructDefinition(_)
            | NodeKind::EnumDefinition(_)
            | NodeKind::EnumValue(_)
            | NodeKind::UserDefinedValueTypeDefinition(_) => NodeCategory::Declaration,

            NodeKind::ElementaryTypeName(_)
            | NodeKind::UserDefinedTypeName(_)
            | NodeKind::Mapping(_)
            | NodeKind::ArrayTypeName(_)
            | NodeKind::FunctionTypeName(_) => NodeCategory::TypeName,

            NodeKind::Block(_)
            | NodeKind::UncheckedBlock(_)
            | NodeKind::ExpressionStatement(_)
            | NodeKind::VariableDeclarationStatement(_)
            | NodeKind::IfStatement(_)
            | NodeKind::ForStatement(_)
            | NodeKind::WhileStatement(_)
            | NodeKind::DoWhileStatement(_)
            | NodeKind::Return(_)
            | NodeKind::EmitStatement(_)
            | NodeKind::RevertStatement(_)
            | NodeKind::Break(_)
            | NodeKind::Continue(_)
            | NodeKind::Throw(_)
            | NodeKind::PlaceholderStatement(_)
            | NodeKind::TryStatement(_)
            | NodeKind::InlineAssembly(_) => NodeCategory::Statement,

            NodeKind::Assignment(_)
            | NodeKind::BinaryOperation(_)
            | NodeKind::Conditional(_)
            | NodeKind::ElementaryTypeNameExpression(_)
            | NodeKind::FunctionCall(_)
            | NodeKind::FunctionCallOptions(_)
            | NodeKind::Identifier(_)
            | NodeKind::IndexAccess(_)
            | NodeKind::IndexRangeAccess(_)
            | NodeKind::Literal(_)
            | NodeKind::MemberAccess(_)
            | NodeKind::NewExpression(_)
            | NodeKind::TupleExpression(_)
            | NodeKind::UnaryOperation(_) => NodeCategory::Expression,

            NodeKind::YulBlock(_)
            | NodeKind::YulAssignment(_)
            | NodeKind::YulVariableDeclaration(_)
            | NodeKind::YulTypedName(_)
            | NodeKind::YulExpressionStatement(_)
            | NodeKind::YulIf(_)
            | NodeKind::YulSwitch(_)
            | NodeKind::YulCase(_)
            | NodeKind::YulForLoop(_)
            | NodeKind::YulFunctionDefinition(_)
            | NodeKind::YulBreak
            | NodeKind::YulContinue
            | NodeKind::YulLeave
            | NodeKind::YulFunctionCall(_)
            | NodeKind::YulIdentifier(_)
            | NodeKind::YulLiteral(_) => NodeCategory::Yul,
        }
    }

    /// Name of a declaration or name-bearing reference, if it has one.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            NodeKind::ContractDefinition(n) => Some(&n.name),
            NodeKind::FunctionDefinition(n) => Some(&n.name),
            NodeKind::ModifierDefinition(n) => Some(&n.name),
            NodeKind::EventDefinition(n) => Some(&n.name),
            NodeKind::ErrorDefinition(n) => Some(&n.name),
            NodeKind::VariableDeclaration(n) => Some(&n.name),
            NodeKind::StructDefinition(n) => Some(&n.name),
            NodeKind::EnumDefinition(n) => Some(&n.name),
            NodeKind::EnumValue(n) => Some(&n.name),
            NodeKind::UserDefinedValueTypeDefinition(n) => Some(&n.name),
            NodeKind::IdentifierPath(n) => Some(&n.name),
            NodeKind::Identifier(n) => Some(&n.name),
            NodeKind::MemberAccess(n) => Some(&n.member_name),
            NodeKind::UserDefinedTypeName(n) => Some(&n.name),
            NodeKind::ElementaryTypeName(n) => Some(&n.name),
            NodeKind::YulFunctionDefinition(n) => Some(&n.name),
            NodeKind::YulTypedName(n) => Some(&n.name),
            NodeKind::YulIdentifier(n) => Some(&n.name),
            _ => None,
        }
    }

    /// AST id of the declaration this node refers to, if any.
    pub fn referenced_declaration(&self) -> Option<i64> {
        match self {
            NodeKind::Identifier(n) => n.referenced_declaration,
            NodeKind::MemberAccess(n) => n.referenced_declaration,
            NodeKind::IdentifierPath(n) => n.referenced_declaration,
            NodeKind::UserDefinedTypeName(n) => n.referenced_declaration,
            _ => None,
        }
    }

    /// Compiler-reported type of an expression or type name.
    pub fn type_string(&self) -> Option<&str> {
        let ty = match self {
            NodeKind::VariableDeclaration(n) => &n.type_string,
            NodeKind::ElementaryTypeName(n) => &n.type_string,
            NodeKind::UserDefinedTypeName(n) => &n.type_string,
            NodeKind::Mapping(n) => &n.type_string,
            NodeKind::ArrayTypeName(n) => &n.type_string,
            NodeKind::FunctionTypeName(n) => &n.type_string,
            NodeKind::Assignment(n) => &n.type_string,
            NodeKind::BinaryOperation(n) => &n.type_string,
            NodeKind::Conditional(n) => &n.type_string,
            NodeKind::ElementaryTypeNameExpression(n) => &n.type_string,
            NodeKind::FunctionCall(n) => &n.type_string,
            NodeKind::FunctionCallOptions(n) => &n.type_string,
            NodeKind::Identifier(n) => &n.type_string,
            NodeKind::IndexAccess(n) => &n.type_string,
            NodeKind::IndexRangeAccess(n) => &n.type_string,
            NodeKind::Literal(n) => &n.type_string,
            NodeKind::MemberAccess(n) => &n.type_string,
            NodeKind::NewExpression(n) => &n.type_string,
            NodeKind::TupleExpression(n) => &n.type_string,
            NodeKind::UnaryOperation(n) => &n.type_string,
            _ => return None,
        };
        Some(ty.as_str())
    }

    /// Natspec of a declaration, with the node that carries it when the
    /// compiler emitted a structured one.
    pub fn declaration_documentation(&self) -> Option<&Documentation> {
        match self {
            NodeKind::ContractDefinition(n) => n.documentation.as_ref(),
            NodeKind::FunctionDefinition(n) => n.documentation.as_ref(),
            NodeKind::ModifierDefinition(n) => n.documentation.as_ref(),
            NodeKind::EventDefinition(n) => n.documentation.as_ref(),
            NodeKind::ErrorDefinition(n) => n.documentation.as_ref(),
            NodeKind::VariableDeclaration(n) => n.documentation.as_ref(),
            NodeKind::StructDefinition(n) => n.documentation.as_ref(),
            NodeKind::EnumDefinition(n) => n.documentation.as_ref(),
            _ => None,
        }
    }

    /// Documentation attached to declarations and statements.
    pub fn documentation(&self) -> Option<&str> {
        if let Some(doc) = self.declaration_documentation() {
            return Some(&doc.text);
        }
        let doc = match self {
            NodeKind::Block(n) | NodeKind::UncheckedBlock(n) => &n.documentation,
            NodeKind::ExpressionStatement(n) => &n.documentation,
            NodeKind::VariableDeclarationStatement(n) => &n.documentation,
            NodeKind::IfStatement(n) => &n.documentation,
            NodeKind::ForStatement(n) => &n.documentation,
            NodeKind::WhileStatement(n) | NodeKind::DoWhileStatement(n) => &n.documentation,
            NodeKind::Return(n) => &n.documentation,
            NodeKind::EmitStatement(n) => &n.documentation,
            NodeKind::RevertStatement(n) => &n.documentation,
            NodeKind::Break(n)
            | NodeKind::Continue(n)
            | NodeKind::Throw(n)
            | NodeKind::PlaceholderStatement(n) => &n.documentation,
            NodeKind::TryStatement(n) => &n.documentation,
            NodeKind::InlineAssembly(n) => &n.documentation,
            _ => return None,
        };
        doc.as_deref()
    }

    /// Handles of all owned children, in field order.
    pub fn child_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        out.extend(self.declaration_documentation().and_then(|d| d.node));
        match self {
            NodeKind::SourceUnit(n) => out.extend(&n.nodes),
            NodeKind::PragmaDirective(_) => {}
            NodeKind::ImportDirective(n) => out.extend(n.symbol_aliases.iter().map(|a| a.foreign)),
            NodeKind::InheritanceSpecifier(n) => {
                out.push(n.base_name);
                out.extend(n.arguments.iter().flatten());
            }
            NodeKind::ModifierInvocation(n) => {
                out.push(n.modifier_name);
                out.extend(n.arguments.iter().flatten());
            }
            NodeKind::OverrideSpecifier(n) => out.extend(&n.overrides),
            NodeKind::ParameterList(n) => out.extend(&n.parameters),
            NodeKind::IdentifierPath(_) => {}
            NodeKind::UsingForDirective(n) => {
                out.extend(n.library_name);
                out.extend(n.functions.iter().map(|f| f.function));
                out.extend(n.type_name);
            }
            NodeKind::TryCatchClause(n) => {
                out.extend(n.parameters);
                out.push(n.block);
            }
            NodeKind::StructuredDocumentation(_) => {}
            NodeKind::ContractDefinition(n) => {
                out.extend(&n.base_contracts);
                out.extend(&n.nodes);
            }
            NodeKind::FunctionDefinition(n) => {
                out.push(n.parameters);
                out.extend(n.overrides);
                out.extend(&n.modifiers);
                out.push(n.return_parameters);
                out.extend(n.body);
            }
            NodeKind::ModifierDefinition(n) => {
                out.push(n.parameters);
                out.extend(n.overrides);
                out.extend(n.body);
            }
            NodeKind::EventDefinition(n) => out.push(n.parameters),
            NodeKind::ErrorDefinition(n) => out.push(n.parameters),
            NodeKind::VariableDeclaration(n) => {
                out.extend(n.type_name);
                out.extend(n.overrides);
                out.extend(n.value);
            }
            NodeKind::StructDefinition(n) => out.extend(&n.members),
            NodeKind::EnumDefinition(n) => out.extend(&n.values),
            NodeKind::EnumValue(_) => {}
            NodeKind::UserDefinedValueTypeDefinition(n) => out.push(n.underlying_type),
            NodeKind::ElementaryTypeName(_) => {}
            NodeKind::UserDefinedTypeName(n) => out.extend(n.path_node),
            NodeKind::Mapping(n) => {
                out.push(n.key_type);
                out.push(n.value_type);
            }
            NodeKind::ArrayTypeName(n) => {
                out.push(n.base_type);
                out.extend(n.length);
            }
            NodeKind::FunctionTypeName(n) => {
                out.push(n.parameter_types);
                out.push(n.return_parameter_types);
            }
            NodeKind::Block(n) | NodeKind::UncheckedBlock(n) => out.extend(&n.statements),
            NodeKind::ExpressionStatement(n) => out.push(n.expression),
            NodeKind::VariableDeclarationStatement(n) => {
                out.extend(n.declarations.iter().flatten());
                out.extend(n.initial_value);
            }
            NodeKind::IfStatement(n) => {
                out.push(n.condition);
                out.push(n.true_body);
                out.extend(n.false_body);
            }
            NodeKind::ForStatement(n) => {
                out.extend(n.initialization);
                out.extend(n.condition);
                out.extend(n.loop_expression);
                out.push(n.body);
            }
            NodeKind::WhileStatement(n) => {
                out.push(n.condition);
                out.push(n.body);
            }
            NodeKind::DoWhileStatement(n) => {
                out.push(n.body);
                out.push(n.condition);
            }
            NodeKind::Return(n) => out.extend(n.expression),
            NodeKind::EmitStatement(n) => out.push(n.event_call),
            NodeKind::RevertStatement(n) => out.push(n.error_call),
            NodeKind::Break(_)
            | NodeKind::Continue(_)
            | NodeKind::Throw(_)
            | NodeKind::PlaceholderStatement(_) => {}
            NodeKind::TryStatement(n) => {
                out.push(n.external_call);
                out.extend(&n.clauses);
            }
            NodeKind::InlineAssembly(n) => out.extend(n.ast),
            NodeKind::Assignment(n) => {
                out.push(n.left_hand_side);
                out.push(n.right_hand_side);
            }
            NodeKind::BinaryOperation(n) => {
                out.push(n.left_expression);
                out.push(n.right_expression);
            }
            NodeKind::Conditional(n) => {
                out.push(n.condition);
                out.push(n.true_expression);
                out.push(n.false_expression);
            }
            NodeKind::ElementaryTypeNameExpression(n) => out.push(n.type_name),
            NodeKind::FunctionCall(n) => {
                out.push(n.expression);
                out.extend(&n.arguments);
            }
            NodeKind::FunctionCallOptions(n) => {
                out.push(n.expression);
                out.extend(&n.options);
            }
            NodeKind::Identifier(_) => {}
            NodeKind::IndexAccess(n) => {
                out.push(n.base_expression);
                out.extend(n.index_expression);
            }
            NodeKind::IndexRangeAccess(n) => {
                out.push(n.base_expression);
                out.extend(n.start_expression);
                out.extend(n.end_expression);
            }
            NodeKind::Literal(_) => {}
            NodeKind::MemberAccess(n) => out.push(n.expression),
            NodeKind::NewExpression(n) => out.push(n.type_name),
            NodeKind::TupleExpression(n) => out.extend(n.components.iter().flatten()),
            NodeKind::UnaryOperation(n) => out.push(n.sub_expression),
            NodeKind::YulBlock(n) => out.extend(&n.statements),
            NodeKind::YulAssignment(n) => {
                out.extend(&n.variable_names);
                out.push(n.value);
            }
            NodeKind::YulVariableDeclaration(n) => {
                out.extend(&n.variables);
                out.extend(n.value);
            }
            NodeKind::YulTypedName(_) => {}
            NodeKind::YulExpressionStatement(n) => out.push(n.expression),
            NodeKind::YulIf(n) => {
                out.push(n.condition);
                out.push(n.body);
            }
            NodeKind::YulSwitch(n) => {
                out.push(n.expression);
                out.extend(&n.cases);
            }
            NodeKind::YulCase(n) => {
                out.extend(n.value);
                out.push(n.body);
            }
            NodeKind::YulForLoop(n) => {
                out.push(n.pre);
                out.push(n.condition);
                out.push(n.post);
                out.push(n.body);
            }
            NodeKind::YulFunctionDefinition(n) => {
                out.extend(&n.parameters);
                out.extend(&n.return_variables);
                out.push(n.body);
            }
            NodeKind::YulBreak | NodeKind::YulContinue | NodeKind::YulLeave => {}
            NodeKind::YulFunctionCall(n) => {
                out.push(n.function_name);
                out.extend(&n.arguments);
            }
            NodeKind::YulIdentifier(_) | NodeKind::YulLiteral(_) => {}
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub absolute_path: String,
    pub license: Option<String>,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct PragmaDirective {
    pub literals: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImportDirective {
    pub file: String,
    pub absolute_path: String,
    pub unit_alias: String,
    pub imported_source_unit: Option<i64>,
    pub symbol_aliases: Vec<SymbolAlias>,
}

#[derive(Debug, Clone)]
pub struct SymbolAlias {
    pub foreign: NodeId,
    pub local: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InheritanceSpecifier {
    pub base_name: NodeId,
    pub arguments: Option<Vec<NodeId>>,
}

#[derive(Debug, Clone)]
pub struct ModifierInvocation {
    pub modifier_name: NodeId,
    pub arguments: Option<Vec<NodeId>>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OverrideSpecifier {
    pub overrides: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ParameterList {
    pub parameters: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct IdentifierPath {
    pub name: String,
    pub referenced_declaration: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UsingForDirective {
    pub library_name: Option<NodeId>,
    pub functions: Vec<UsingForFunction>,
    pub type_name: Option<NodeId>,
    pub global: bool,
}

#[derive(Debug, Clone)]
pub struct UsingForFunction {
    pub function: NodeId,
    pub operator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TryCatchClause {
    pub error_name: String,
    pub parameters: Option<NodeId>,
    pub block: NodeId,
}

/// Natspec text of a declaration.
#[derive(Debug, Clone)]
pub struct Documentation {
    pub text: String,
    /// The `StructuredDocumentation` child; older releases emit bare text only.
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct StructuredDocumentation {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ContractDefinition {
    pub name: String,
    pub contract_kind: ContractKind,
    pub is_abstract: bool,
    pub base_contracts: Vec<NodeId>,
    pub nodes: Vec<NodeId>,
    pub documentation: Option<Documentation>,
    pub fully_implemented: Option<bool>,
    pub linearized_base_contracts: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub kind: FunctionKind,
    pub state_mutability: StateMutability,
    pub visibility: Visibility,
    pub is_virtual: bool,
    pub implemented: bool,
    pub modifiers: Vec<NodeId>,
    pub overrides: Option<NodeId>,
    pub parameters: NodeId,
    pub return_parameters: NodeId,
    pub body: Option<NodeId>,
    pub documentation: Option<Documentation>,
    pub function_selector: Option<String>,
    pub base_functions: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct ModifierDefinition {
    pub name: String,
    pub visibility: Visibility,
    pub is_virtual: bool,
    pub overrides: Option<NodeId>,
    pub parameters: NodeId,
    pub body: Option<NodeId>,
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone)]
pub struct EventDefinition {
    pub name: String,
    pub anonymous: bool,
    pub parameters: NodeId,
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone)]
pub struct ErrorDefinition {
    pub name: String,
    pub parameters: NodeId,
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    pub type_name: Option<NodeId>,
    pub value: Option<NodeId>,
    pub mutability: VariableMutability,
    pub is_state_variable: bool,
    pub data_location: DataLocation,
    pub visibility: Visibility,
    pub indexed: bool,
    pub overrides: Option<NodeId>,
    pub documentation: Option<Documentation>,
    pub type_string: String,
}

impl VariableDeclaration {
    /// Whether writes through this declaration land in contract storage.
    pub fn is_persistent_storage(&self) -> bool {
        (self.is_state_variable && self.mutability == VariableMutability::Mutable)
            || (!self.is_state_variable && self.data_location == DataLocation::Storage)
    }
}

#[derive(Debug, Clone)]
pub struct StructDefinition {
    pub name: String,
    pub members: Vec<NodeId>,
    pub canonical_name: Option<String>,
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Vec<NodeId>,
    pub canonical_name: Option<String>,
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UserDefinedValueTypeDefinition {
    pub name: String,
    pub underlying_type: NodeId,
    pub canonical_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ElementaryTypeName {
    pub name: String,
    pub state_mutability: Option<StateMutability>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct UserDefinedTypeName {
    pub name: String,
    pub path_node: Option<NodeId>,
    pub referenced_declaration: Option<i64>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct Mapping {
    pub key_type: NodeId,
    pub value_type: NodeId,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct ArrayTypeName {
    pub base_type: NodeId,
    pub length: Option<NodeId>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct FunctionTypeName {
    pub parameter_types: NodeId,
    pub return_parameter_types: NodeId,
    pub state_mutability: StateMutability,
    pub visibility: Visibility,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<NodeId>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: NodeId,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarationStatement {
    /// `None` marks a skipped tuple component, as in `(, uint b) = f();`.
    pub declarations: Vec<Option<NodeId>>,
    pub initial_value: Option<NodeId>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: NodeId,
    pub true_body: NodeId,
    pub false_body: Option<NodeId>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub initialization: Option<NodeId>,
    pub condition: Option<NodeId>,
    pub loop_expression: Option<NodeId>,
    pub body: NodeId,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoopStatement {
    pub condition: NodeId,
    pub body: NodeId,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Return {
    pub expression: Option<NodeId>,
    pub function_return_parameters: Option<i64>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmitStatement {
    pub event_call: NodeId,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RevertStatement {
    pub error_call: NodeId,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SimpleStatement {
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TryStatement {
    pub external_call: NodeId,
    pub clauses: Vec<NodeId>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InlineAssembly {
    /// Root `YulBlock`; absent for releases that emit only assembly text.
    pub ast: Option<NodeId>,
    pub evm_version: Option<String>,
    pub flags: Vec<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub operator: String,
    pub left_hand_side: NodeId,
    pub right_hand_side: NodeId,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct BinaryOperation {
    pub operator: String,
    pub left_expression: NodeId,
    pub right_expression: NodeId,
    /// User-defined operator implementation, when one is bound.
    pub function: Option<i64>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct Conditional {
    pub condition: NodeId,
    pub true_expression: NodeId,
    pub false_expression: NodeId,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct ElementaryTypeNameExpression {
    pub type_name: NodeId,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub kind: FunctionCallKind,
    pub expression: NodeId,
    pub arguments: Vec<NodeId>,
    pub names: Vec<String>,
    pub try_call: bool,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct FunctionCallOptions {
    pub expression: NodeId,
    pub names: Vec<String>,
    pub options: Vec<NodeId>,
    pub type_string: String,
}

impl FunctionCallOptions {
    pub fn option(&self, name: &str) -> Option<NodeId> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.options.get(i).copied())
    }
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub referenced_declaration: Option<i64>,
    pub overloaded_declarations: Vec<i64>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct IndexAccess {
    pub base_expression: NodeId,
    pub index_expression: Option<NodeId>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct IndexRangeAccess {
    pub base_expression: NodeId,
    pub start_expression: Option<NodeId>,
    pub end_expression: Option<NodeId>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: Option<String>,
    pub hex_value: String,
    pub subdenomination: Option<String>,
    pub type_string: String,
}

impl Literal {
    /// Integer value of a number literal with its subdenomination applied.
    ///
    /// Returns `None` for non-numbers and for values that are not integral
    /// (`0.5 wei`) or use a negative exponent that does not cancel out.
    pub fn numeric_value(&self) -> Option<BigUint> {
        if self.kind != LiteralKind::Number {
            return None;
        }
        let raw: String = self.value.as_deref()?.chars().filter(|c| *c != '_').collect();

        if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            return BigUint::parse_bytes(hex.as_bytes(), 16);
        }

        let (mantissa, exponent) = match raw.find(['e', 'E']) {
            Some(pos) => (&raw[..pos], raw[pos + 1..].parse::<i64>().ok()?),
            None => (raw.as_str(), 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (mantissa, ""),
        };

        let digits = format!("{}{}", int_part, frac_part);
        let digits = if digits.is_empty() { "0" } else { digits.as_str() };
        let mut value = BigUint::parse_bytes(digits.as_bytes(), 10)?;

        value *= subdenomination_multiplier(self.subdenomination.as_deref())?;

        let scale = exponent - frac_part.len() as i64;
        let ten = BigUint::from(10u32);
        if scale >= 0 {
            value *= ten.pow(u32::try_from(scale).ok()?);
        } else {
            let divisor = ten.pow(u32::try_from(-scale).ok()?);
            if &value % &divisor != BigUint::from(0u32) {
                return None;
            }
            value /= divisor;
        }

        Some(value)
    }
}

fn subdenomination_multiplier(unit: Option<&str>) -> Option<BigUint> {
    let multiplier: u64 = match unit {
        None | Some("wei") | Some("seconds") => 1,
        Some("gwei") => 1_000_000_000,
        Some("szabo") => 1_000_000_000_000,
        Some("finney") => 1_000_000_000_000_000,
        Some("ether") => 1_000_000_000_000_000_000,
        Some("minutes") => 60,
        Some("hours") => 3_600,
        Some("days") => 86_400,
        Some("weeks") => 604_800,
        Some("years") => 31_536_000,
        Some(_) => return None,
    };
    Some(BigUint::from(multiplier))
}

#[derive(Debug, Clone)]
pub struct MemberAccess {
    pub expression: NodeId,
    pub member_name: String,
    pub referenced_declaration: Option<i64>,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct NewExpression {
    pub type_name: NodeId,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct TupleExpression {
    pub components: Vec<Option<NodeId>>,
    pub is_inline_array: bool,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct UnaryOperation {
    pub operator: String,
    pub prefix: bool,
    pub sub_expression: NodeId,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct YulBlock {
    pub statements: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct YulAssignment {
    pub variable_names: Vec<NodeId>,
    pub value: NodeId,
}

#[derive(Debug, Clone)]
pub struct YulVariableDeclaration {
    pub variables: Vec<NodeId>,
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct YulTypedName {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct YulExpressionStatement {
    pub expression: NodeId,
}

#[derive(Debug, Clone)]
pub struct YulIf {
    pub condition: NodeId,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct YulSwitch {
    pub expression: NodeId,
    pub cases: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct YulCase {
    /// `None` for the `default` case.
    pub value: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct YulForLoop {
    pub pre: NodeId,
    pub condition: NodeId,
    pub post: NodeId,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct YulFunctionDefinition {
    pub name: String,
    pub parameters: Vec<NodeId>,
    pub return_variables: Vec<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct YulFunctionCall {
    /// A `YulIdentifier` node naming a builtin or a local Yul function.
    pub function_name: NodeId,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct YulIdentifier {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct YulLiteral {
    pub kind: YulLiteralKind,
    pub value: Option<String>,
    pub hex_value: Option<String>,
    pub type_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: &str, subdenomination: Option<&str>) -> Literal {
        Literal {
            kind: LiteralKind::Number,
            value: Some(value.to_string()),
            hex_value: String::new(),
            subdenomination: subdenomination.map(str::to_string),
            type_string: String::new(),
        }
    }

    #[test]
    fn test_numeric_literal_values() {
        assert_eq!(number("42", None).numeric_value(), Some(BigUint::from(42u32)));
        assert_eq!(number("1_000", None).numeric_value(), Some(BigUint::from(1000u32)));
        assert_eq!(number("0xff", None).numeric_value(), Some(BigUint::from(255u32)));
        assert_eq!(number("2e3", None).numeric_value(), Some(BigUint::from(2000u32)));
        assert_eq!(
            number("1.5", Some("ether")).numeric_value(),
            Some(BigUint::from(1_500_000_000_000_000_000u64))
        );
        assert_eq!(number("2", Some("days")).numeric_value(), Some(BigUint::from(172_800u32)));
    }

    #[test]
    fn test_non_integral_literals_have_no_value() {
        assert_eq!(number("0.5", None).numeric_value(), None);
        assert_eq!(number("1", Some("lightyears")).numeric_value(), None);

        let string = Literal {
            kind: LiteralKind::String,
            ..number("1", None)
        };
        assert_eq!(string.numeric_value(), None);
    }
}
