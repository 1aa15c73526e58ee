/*! Typed model of the compact JSON AST emitted by solc.
 *
 * The compiler's AST is the raw material for the IR. Deserializing it into closed, tagged enums
 * up front means every shape the IR builder sees has already been checked; anything the model
 * does not recognise surfaces as a protocol mismatch instead of a half-built graph. Fields that
 * only exist in some compiler releases are optional, and unknown fields are ignored so newer
 * releases keep loading.
 */

/// Routes a recursive node type's derived `Deserialize` through a stack that
/// grows on demand. The type must derive with `#[serde(remote = "Self")]`.
macro_rules! stack_safe_deserialize {
    ($($ty:ident),* $(,)?) => {$(
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                crate::with_stack(|| $ty::deserialize(deserializer))
            }
        }
    )*};
}

pub mod declaration;
pub mod expression;
pub mod statement;
pub mod yul;

pub use declaration::*;
pub use expression::*;
pub use statement::*;
pub use yul::*;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub absolute_path: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub nodes: Vec<SourceUnitPart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum SourceUnitPart {
    PragmaDirective(PragmaDirective),
    ImportDirective(ImportDirective),
    ContractDefinition(ContractDefinition),
    StructDefinition(StructDefinition),
    EnumDefinition(EnumDefinition),
    ErrorDefinition(ErrorDefinition),
    EventDefinition(EventDefinition),
    FunctionDefinition(FunctionDefinition),
    VariableDeclaration(VariableDeclaration),
    UserDefinedValueTypeDefinition(UserDefinedValueTypeDefinition),
    UsingForDirective(UsingForDirective),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum ContractPart {
    EnumDefinition(EnumDefinition),
    ErrorDefinition(ErrorDefinition),
    EventDefinition(EventDefinition),
    FunctionDefinition(FunctionDefinition),
    ModifierDefinition(ModifierDefinition),
    StructDefinition(StructDefinition),
    UserDefinedValueTypeDefinition(UserDefinedValueTypeDefinition),
    UsingForDirective(UsingForDirective),
    VariableDeclaration(VariableDeclaration),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType", remote = "Self")]
pub enum TypeName {
    ElementaryTypeName(ElementaryTypeName),
    UserDefinedTypeName(UserDefinedTypeName),
    Mapping(Mapping),
    ArrayTypeName(ArrayTypeName),
    FunctionTypeName(FunctionTypeName),
}

stack_safe_deserialize!(TypeName);

/// A reference to a named declaration, spelled differently across releases.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum PathReference {
    Identifier(Identifier),
    IdentifierPath(IdentifierPath),
    UserDefinedTypeName(UserDefinedTypeName),
}

/// Older releases emit documentation as a bare string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Documentation {
    Text(String),
    Structured(StructuredDocumentation),
}

impl Documentation {
    pub fn text(&self) -> &str {
        match self {
            Documentation::Text(text) => text,
            Documentation::Structured(doc) => &doc.text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredDocumentation {
    pub id: i64,
    pub src: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptions {
    #[serde(default)]
    pub type_identifier: Option<String>,
    #[serde(default)]
    pub type_string: Option<String>,
}

impl TypeDescriptions {
    pub fn type_string(&self) -> &str {
        self.type_string.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    External,
    Public,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

impl StateMutability {
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionKind {
    Function,
    Constructor,
    Fallback,
    Receive,
    FreeFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLocation {
    Default,
    Storage,
    Memory,
    Calldata,
    Transient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableMutability {
    Mutable,
    Immutable,
    Constant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_unit_parts_dispatch_on_node_type() {
        let unit: SourceUnit = serde_json::from_value(json!({
            "id": 3,
            "src": "0:40:0",
            "nodeType": "SourceUnit",
            "absolutePath": "a.sol",
            "nodes": [
                {"id": 1, "src": "0:23:0", "nodeType": "PragmaDirective", "literals": ["solidity", "^", "0.8", ".0"]},
                {"id": 2, "src": "24:13:0", "nodeType": "ContractDefinition", "name": "A",
                 "contractKind": "contract", "abstract": false, "baseContracts": [], "nodes": [],
                 "linearizedBaseContracts": [2], "someFutureField": {"x": 1}}
            ]
        }))
        .unwrap();

        assert_eq!(unit.nodes.len(), 2);
        assert!(matches!(unit.nodes[0], SourceUnitPart::PragmaDirective(_)));
        match &unit.nodes[1] {
            SourceUnitPart::ContractDefinition(contract) => {
                assert_eq!(contract.name, "A");
                assert_eq!(contract.contract_kind, ContractKind::Contract);
            }
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result: Result<SourceUnitPart, _> = serde_json::from_value(json!({
            "id": 1, "src": "0:1:0", "nodeType": "NotANode"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_documentation_variants() {
        let text: Documentation = serde_json::from_value(json!("@notice hi")).unwrap();
        assert_eq!(text.text(), "@notice hi");

        let structured: Documentation = serde_json::from_value(json!({
            "id": 4, "src": "0:10:0", "nodeType": "StructuredDocumentation", "text": "@dev x"
        }))
        .unwrap();
        assert_eq!(structured.text(), "@dev x");
    }
}
