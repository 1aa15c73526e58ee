use super::{Expression, FunctionCall, ParameterList, VariableDeclaration, YulBlock};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType", remote = "Self")]
pub enum Statement {
    Block(Block),
    UncheckedBlock(Block),
    ExpressionStatement(ExpressionStatement),
    VariableDeclarationStatement(VariableDeclarationStatement),
    IfStatement(IfStatement),
    ForStatement(ForStatement),
    WhileStatement(WhileStatement),
    DoWhileStatement(WhileStatement),
    Return(Return),
    EmitStatement(EmitStatement),
    RevertStatement(RevertStatement),
    Break(SimpleStatement),
    Continue(SimpleStatement),
    Throw(SimpleStatement),
    PlaceholderStatement(SimpleStatement),
    TryStatement(TryStatement),
    InlineAssembly(InlineAssembly),
}

stack_safe_deserialize!(Statement);

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub statements: Option<Vec<Statement>>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleStatement {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionStatement {
    pub id: i64,
    pub src: String,
    pub expression: Expression,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclarationStatement {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub assignments: Vec<Option<i64>>,
    pub declarations: Vec<Option<VariableDeclaration>>,
    #[serde(default)]
    pub initial_value: Option<Expression>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfStatement {
    pub id: i64,
    pub src: String,
    pub condition: Expression,
    pub true_body: Box<Statement>,
    #[serde(default)]
    pub false_body: Option<Box<Statement>>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForStatement {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub initialization_expression: Option<Box<Statement>>,
    #[serde(default)]
    pub condition: Option<Expression>,
    #[serde(default)]
    pub loop_expression: Option<ExpressionStatement>,
    pub body: Box<Statement>,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// Shared by `while` and `do ... while` loops.
#[derive(Debug, Clone, Deserialize)]
pub struct WhileStatement {
    pub id: i64,
    pub src: String,
    pub condition: Expression,
    pub body: Box<Statement>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Return {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub expression: Option<Expression>,
    #[serde(default)]
    pub function_return_parameters: Option<i64>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitStatement {
    pub id: i64,
    pub src: String,
    pub event_call: FunctionCall,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertStatement {
    pub id: i64,
    pub src: String,
    pub error_call: FunctionCall,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryStatement {
    pub id: i64,
    pub src: String,
    pub external_call: Expression,
    #[serde(default)]
    pub clauses: Vec<TryCatchClause>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryCatchClause {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub error_name: String,
    #[serde(default)]
    pub parameters: Option<ParameterList>,
    pub block: Block,
}

/// Releases before 0.6 emit only `operations` text and no Yul AST.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineAssembly {
    pub id: i64,
    pub src: String,
    #[serde(default, rename = "AST")]
    pub ast: Option<YulBlock>,
    #[serde(default)]
    pub evm_version: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}
