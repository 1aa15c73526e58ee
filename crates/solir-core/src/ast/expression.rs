use super::{ElementaryTypeName, TypeDescriptions, TypeName};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType", remote = "Self")]
pub enum Expression {
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
}

stack_safe_deserialize!(Expression);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub src: String,
    pub operator: String,
    pub left_hand_side: Box<Expression>,
    pub right_hand_side: Box<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryOperation {
    pub id: i64,
    pub src: String,
    pub operator: String,
    pub left_expression: Box<Expression>,
    pub right_expression: Box<Expression>,
    #[serde(default)]
    pub function: Option<i64>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    pub id: i64,
    pub src: String,
    pub condition: Box<Expression>,
    pub true_expression: Box<Expression>,
    pub false_expression: Box<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementaryTypeNameExpression {
    pub id: i64,
    pub src: String,
    pub type_name: ElementaryTypeName,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionCallKind {
    FunctionCall,
    TypeConversion,
    StructConstructorCall,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    pub id: i64,
    pub src: String,
    pub kind: FunctionCallKind,
    pub expression: Box<Expression>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub try_call: bool,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallOptions {
    pub id: i64,
    pub src: String,
    pub expression: Box<Expression>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub options: Vec<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub id: i64,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub referenced_declaration: Option<i64>,
    #[serde(default)]
    pub overloaded_declarations: Vec<i64>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexAccess {
    pub id: i64,
    pub src: String,
    pub base_expression: Box<Expression>,
    #[serde(default)]
    pub index_expression: Option<Box<Expression>>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRangeAccess {
    pub id: i64,
    pub src: String,
    pub base_expression: Box<Expression>,
    #[serde(default)]
    pub start_expression: Option<Box<Expression>>,
    #[serde(default)]
    pub end_expression: Option<Box<Expression>>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralKind {
    Bool,
    Number,
    String,
    HexString,
    UnicodeString,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Literal {
    pub id: i64,
    pub src: String,
    pub kind: LiteralKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub hex_value: String,
    #[serde(default)]
    pub subdenomination: Option<String>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAccess {
    pub id: i64,
    pub src: String,
    pub expression: Box<Expression>,
    pub member_name: String,
    #[serde(default)]
    pub referenced_declaration: Option<i64>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpression {
    pub id: i64,
    pub src: String,
    pub type_name: TypeName,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleExpression {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub components: Vec<Option<Expression>>,
    #[serde(default)]
    pub is_inline_array: bool,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnaryOperation {
    pub id: i64,
    pub src: String,
    pub operator: String,
    pub prefix: bool,
    pub sub_expression: Box<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}
