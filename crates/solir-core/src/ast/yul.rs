//! Yul nodes embedded in `InlineAssembly`. They carry a `src` but no AST id.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType", remote = "Self")]
pub enum YulStatement {
    YulBlock(YulBlock),
    YulAssignment(YulAssignment),
    YulVariableDeclaration(YulVariableDeclaration),
    YulExpressionStatement(YulExpressionStatement),
    YulIf(YulIf),
    YulSwitch(YulSwitch),
    YulForLoop(YulForLoop),
    YulFunctionDefinition(YulFunctionDefinition),
    YulBreak(YulLeaf),
    YulContinue(YulLeaf),
    YulLeave(YulLeaf),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType", remote = "Self")]
pub enum YulExpression {
    YulFunctionCall(YulFunctionCall),
    YulIdentifier(YulIdentifier),
    YulLiteral(YulLiteral),
}

stack_safe_deserialize!(YulStatement, YulExpression);

#[derive(Debug, Clone, Deserialize)]
pub struct YulBlock {
    pub src: String,
    #[serde(default)]
    pub statements: Vec<YulStatement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulLeaf {
    pub src: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YulAssignment {
    pub src: String,
    pub variable_names: Vec<YulIdentifier>,
    pub value: YulExpression,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulVariableDeclaration {
    pub src: String,
    pub variables: Vec<YulTypedName>,
    #[serde(default)]
    pub value: Option<YulExpression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulTypedName {
    pub src: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulExpressionStatement {
    pub src: String,
    pub expression: YulExpression,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulIf {
    pub src: String,
    pub condition: YulExpression,
    pub body: YulBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulSwitch {
    pub src: String,
    pub expression: YulExpression,
    pub cases: Vec<YulCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulCase {
    pub src: String,
    pub value: YulCaseValue,
    pub body: YulBlock,
}

/// A case label: a literal, or the string `"default"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YulCaseValue {
    Default(String),
    Literal(YulLiteral),
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulForLoop {
    pub src: String,
    pub pre: YulBlock,
    pub condition: YulExpression,
    pub post: YulBlock,
    pub body: YulBlock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YulFunctionDefinition {
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<YulTypedName>,
    #[serde(default)]
    pub return_variables: Vec<YulTypedName>,
    pub body: YulBlock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YulFunctionCall {
    pub src: String,
    pub function_name: YulIdentifier,
    #[serde(default)]
    pub arguments: Vec<YulExpression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YulIdentifier {
    pub src: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YulLiteralKind {
    Number,
    String,
    Bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YulLiteral {
    pub src: String,
    pub kind: YulLiteralKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub hex_value: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_switch_cases_accept_default_label() {
        let stmt: YulStatement = serde_json::from_value(json!({
            "nodeType": "YulSwitch", "src": "0:60:0",
            "expression": {"nodeType": "YulIdentifier", "name": "x", "src": "7:1:0"},
            "cases": [
                {"nodeType": "YulCase", "src": "9:20:0",
                 "value": {"nodeType": "YulLiteral", "kind": "number", "value": "0", "type": "", "src": "14:1:0"},
                 "body": {"nodeType": "YulBlock", "src": "16:2:0", "statements": []}},
                {"nodeType": "YulCase", "src": "30:20:0", "value": "default",
                 "body": {"nodeType": "YulBlock", "src": "38:8:0", "statements": [
                    {"nodeType": "YulLeave", "src": "39:5:0"}
                 ]}}
            ]
        }))
        .unwrap();

        let YulStatement::YulSwitch(switch) = stmt else {
            panic!("expected a switch");
        };
        assert!(matches!(&switch.cases[0].value, YulCaseValue::Literal(l) if l.kind == YulLiteralKind::Number));
        assert!(matches!(&switch.cases[1].value, YulCaseValue::Default(d) if d == "default"));
        assert!(matches!(switch.cases[1].body.statements[0], YulStatement::YulLeave(_)));
    }

    #[test]
    fn test_unknown_yul_node_is_rejected() {
        let result: Result<YulStatement, _> =
            serde_json::from_value(json!({"nodeType": "YulGoto", "src": "0:1:0"}));
        assert!(result.is_err());
    }
}
