use super::{
    Block, ContractKind, ContractPart, DataLocation, Documentation, Expression, FunctionKind,
    Identifier, PathReference, StateMutability, TypeDescriptions, TypeName, VariableMutability,
    Visibility,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PragmaDirective {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub literals: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDirective {
    pub id: i64,
    pub src: String,
    pub file: String,
    #[serde(default)]
    pub absolute_path: String,
    #[serde(default)]
    pub unit_alias: String,
    #[serde(default)]
    pub source_unit: Option<i64>,
    #[serde(default)]
    pub symbol_aliases: Vec<SymbolAlias>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolAlias {
    pub foreign: Identifier,
    #[serde(default)]
    pub local: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    pub contract_kind: ContractKind,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub base_contracts: Vec<InheritanceSpecifier>,
    #[serde(default)]
    pub nodes: Vec<ContractPart>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
    #[serde(default)]
    pub fully_implemented: Option<bool>,
    #[serde(default)]
    pub linearized_base_contracts: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceSpecifier {
    pub id: i64,
    pub src: String,
    pub base_name: PathReference,
    #[serde(default)]
    pub arguments: Option<Vec<Expression>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    pub kind: FunctionKind,
    pub state_mutability: StateMutability,
    pub visibility: Visibility,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub implemented: bool,
    #[serde(default)]
    pub modifiers: Vec<ModifierInvocation>,
    #[serde(default)]
    pub overrides: Option<OverrideSpecifier>,
    pub parameters: ParameterList,
    pub return_parameters: ParameterList,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
    #[serde(default)]
    pub function_selector: Option<String>,
    #[serde(default)]
    pub base_functions: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    pub visibility: Visibility,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub overrides: Option<OverrideSpecifier>,
    pub parameters: ParameterList,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierInvocation {
    pub id: i64,
    pub src: String,
    pub modifier_name: PathReference,
    #[serde(default)]
    pub arguments: Option<Vec<Expression>>,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverrideSpecifier {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub overrides: Vec<PathReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterList {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub parameters: Vec<VariableDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub anonymous: bool,
    pub parameters: ParameterList,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    pub parameters: ParameterList,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub type_name: Option<TypeName>,
    #[serde(default)]
    pub value: Option<Expression>,
    #[serde(default)]
    pub constant: bool,
    #[serde(default)]
    pub mutability: Option<VariableMutability>,
    #[serde(default)]
    pub state_variable: bool,
    pub storage_location: DataLocation,
    pub visibility: Visibility,
    #[serde(default)]
    pub indexed: Option<bool>,
    #[serde(default)]
    pub overrides: Option<OverrideSpecifier>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

impl VariableDeclaration {
    /// Releases before 0.6.5 only carry the `constant` flag.
    pub fn effective_mutability(&self) -> VariableMutability {
        match self.mutability {
            Some(mutability) => mutability,
            None if self.constant => VariableMutability::Constant,
            None => VariableMutability::Mutable,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<VariableDeclaration>,
    #[serde(default)]
    pub canonical_name: Option<String>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<EnumValue>,
    #[serde(default)]
    pub canonical_name: Option<String>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumValue {
    pub id: i64,
    pub src: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDefinedValueTypeDefinition {
    pub id: i64,
    pub src: String,
    pub name: String,
    pub underlying_type: TypeName,
    #[serde(default)]
    pub canonical_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsingForDirective {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub library_name: Option<PathReference>,
    #[serde(default)]
    pub function_list: Option<Vec<UsingForFunction>>,
    #[serde(default)]
    pub type_name: Option<TypeName>,
    #[serde(default)]
    pub global: bool,
}

/// Entry of `using {f, g as +} for T;`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsingForFunction {
    #[serde(default)]
    pub function: Option<IdentifierPath>,
    #[serde(default)]
    pub definition: Option<IdentifierPath>,
    #[serde(default)]
    pub operator: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierPath {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub referenced_declaration: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementaryTypeName {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub state_mutability: Option<StateMutability>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDefinedTypeName {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_node: Option<IdentifierPath>,
    #[serde(default)]
    pub referenced_declaration: Option<i64>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

impl UserDefinedTypeName {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.path_node.as_ref().map(|p| p.name.as_str()))
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub id: i64,
    pub src: String,
    pub key_type: Box<TypeName>,
    pub value_type: Box<TypeName>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayTypeName {
    pub id: i64,
    pub src: String,
    pub base_type: Box<TypeName>,
    #[serde(default)]
    pub length: Option<Box<Expression>>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionTypeName {
    pub id: i64,
    pub src: String,
    pub parameter_types: ParameterList,
    pub return_parameter_types: ParameterList,
    pub state_mutability: StateMutability,
    pub visibility: Visibility,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}
