use super::{NodeKind, NodeRef};
use crate::ast::FunctionCallKind;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Ways evaluating a subtree can change chain state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StateEffects(u16);

impl StateEffects {
    pub const MODIFIES_STATE_VAR: StateEffects = StateEffects(1 << 0);
    pub const EMITS: StateEffects = StateEffects(1 << 1);
    pub const SENDS_ETHER: StateEffects = StateEffects(1 << 2);
    pub const DEPLOYS_CONTRACT: StateEffects = StateEffects(1 << 3);
    pub const SELFDESTRUCTS: StateEffects = StateEffects(1 << 4);
    pub const PERFORMS_CALL: StateEffects = StateEffects(1 << 5);
    pub const PERFORMS_DELEGATECALL: StateEffects = StateEffects(1 << 6);

    const NAMES: [(StateEffects, &'static str); 7] = [
        (Self::MODIFIES_STATE_VAR, "modifies-state"),
        (Self::EMITS, "emits"),
        (Self::SENDS_ETHER, "sends-ether"),
        (Self::DEPLOYS_CONTRACT, "deploys"),
        (Self::SELFDESTRUCTS, "selfdestructs"),
        (Self::PERFORMS_CALL, "calls"),
        (Self::PERFORMS_DELEGATECALL, "delegatecalls"),
    ];

    pub const fn empty() -> Self {
        StateEffects(0)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: StateEffects) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: StateEffects) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: StateEffects) {
        self.0 |= other.0;
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

impl BitOr for StateEffects {
    type Output = StateEffects;

    fn bitor(self, rhs: StateEffects) -> StateEffects {
        StateEffects(self.0 | rhs.0)
    }
}

impl BitOrAssign for StateEffects {
    fn bitor_assign(&mut self, rhs: StateEffects) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for StateEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "pure");
        }
        let names: Vec<_> = self.names().collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Effects contributed by the node itself, excluding its children.
pub(super) fn local_effects(node: NodeRef<'_>) -> StateEffects {
    match node.kind() {
        NodeKind::Assignment(a) => {
            if node.wrap(a.left_hand_side).is_ref_to_state_variable() {
                StateEffects::MODIFIES_STATE_VAR
            } else {
                StateEffects::empty()
            }
        }
        NodeKind::UnaryOperation(u) if matches!(u.operator.as_str(), "++" | "--" | "delete") => {
            if node.wrap(u.sub_expression).is_ref_to_state_variable() {
                StateEffects::MODIFIES_STATE_VAR
            } else {
                StateEffects::empty()
            }
        }
        NodeKind::FunctionCall(call) if call.kind == FunctionCallKind::FunctionCall => {
            call_effects(node.wrap(call.expression))
        }
        NodeKind::FunctionCallOptions(options) => match options.option("value") {
            Some(_) => StateEffects::SENDS_ETHER,
            None => StateEffects::empty(),
        },
        NodeKind::NewExpression(new) => {
            let created = node.wrap(new.type_name);
            if created
                .kind()
                .type_string()
                .is_some_and(|ty| ty.starts_with("contract "))
            {
                StateEffects::DEPLOYS_CONTRACT
            } else {
                StateEffects::empty()
            }
        }
        NodeKind::EmitStatement(_) => StateEffects::EMITS,
        NodeKind::YulFunctionCall(call) => match node.wrap(call.function_name).kind() {
            NodeKind::YulIdentifier(callee) => yul_builtin_effects(&callee.name),
            _ => StateEffects::empty(),
        },
        _ => StateEffects::empty(),
    }
}

/// Effects of calling `callee`, looking through `{value: ..}` options.
fn call_effects(callee: NodeRef<'_>) -> StateEffects {
    let target = match callee.kind() {
        NodeKind::FunctionCallOptions(options) => callee.wrap(options.expression),
        _ => callee,
    };

    match target.kind() {
        NodeKind::Identifier(ident) => {
            // Builtins carry negative declaration ids.
            let builtin = ident.referenced_declaration.map_or(true, |id| id < 0);
            if builtin && matches!(ident.name.as_str(), "selfdestruct" | "suicide") {
                StateEffects::SELFDESTRUCTS
            } else {
                StateEffects::empty()
            }
        }
        NodeKind::MemberAccess(member) => {
            let base = target.wrap(member.expression);
            let base_type = base.kind().type_string().unwrap_or("");
            let on_address = base_type.starts_with("address");

            match member.member_name.as_str() {
                "push" | "pop" if member.referenced_declaration.is_none() => {
                    if base.is_ref_to_state_variable() {
                        StateEffects::MODIFIES_STATE_VAR
                    } else {
                        StateEffects::empty()
                    }
                }
                "transfer" | "send" if on_address => StateEffects::SENDS_ETHER,
                "call" | "callcode" if on_address => StateEffects::PERFORMS_CALL,
                "delegatecall" if on_address => StateEffects::PERFORMS_DELEGATECALL,
                "staticcall" if on_address => StateEffects::empty(),
                _ if is_mutating_external(member.type_string.as_str()) => {
                    StateEffects::PERFORMS_CALL
                }
                _ => StateEffects::empty(),
            }
        }
        _ => StateEffects::empty(),
    }
}

/// Whether a function type string denotes an external function that may write.
fn is_mutating_external(type_string: &str) -> bool {
    type_string.starts_with("function ")
        && type_string.contains(" external")
        && !type_string.contains(" view")
        && !type_string.contains(" pure")
}

pub(super) fn is_ref_to_state_variable(mut node: NodeRef<'_>) -> bool {
    loop {
        match node.kind() {
            NodeKind::Identifier(_) => return declares_persistent_storage(node),
            NodeKind::MemberAccess(member) => {
                if declares_persistent_storage(node) {
                    return true;
                }
                node = node.wrap(member.expression);
            }
            NodeKind::IndexAccess(index) => node = node.wrap(index.base_expression),
            NodeKind::IndexRangeAccess(range) => node = node.wrap(range.base_expression),
            NodeKind::TupleExpression(tuple) => {
                return crate::with_stack(|| {
                    tuple
                        .components
                        .iter()
                        .flatten()
                        .any(|c| node.wrap(*c).is_ref_to_state_variable())
                })
            }
            _ => return false,
        }
    }
}

fn declares_persistent_storage(node: NodeRef<'_>) -> bool {
    match node.referenced_declaration().map(|d| d.kind()) {
        Some(NodeKind::VariableDeclaration(decl)) => decl.is_persistent_storage(),
        _ => false,
    }
}

/// Chain effects of a Yul builtin; user-defined Yul functions have none of their own.
fn yul_builtin_effects(name: &str) -> StateEffects {
    match name {
        "sstore" => StateEffects::MODIFIES_STATE_VAR,
        "log0" | "log1" | "log2" | "log3" | "log4" => StateEffects::EMITS,
        "call" | "callcode" => StateEffects::PERFORMS_CALL,
        "delegatecall" => StateEffects::PERFORMS_DELEGATECALL,
        "create" | "create2" => StateEffects::DEPLOYS_CONTRACT,
        "selfdestruct" => StateEffects::SELFDESTRUCTS,
        _ => StateEffects::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::GraphBuilder;
    use serde_json::json;

    #[test]
    fn test_flag_set_operations() {
        let mut effects = StateEffects::EMITS;
        assert!(!effects.contains(StateEffects::SENDS_ETHER));
        effects |= StateEffects::SENDS_ETHER;
        assert!(effects.contains(StateEffects::EMITS | StateEffects::SENDS_ETHER));
        assert!(effects.intersects(StateEffects::SENDS_ETHER | StateEffects::SELFDESTRUCTS));
        assert_eq!(effects.to_string(), "emits|sends-ether");
        assert_eq!(StateEffects::empty().to_string(), "pure");
    }

    #[test]
    fn test_yul_calls_carry_builtin_effects() {
        let text = "contract A { function f() public { assembly { sstore(0, delegatecall(gas(), 0, 0, 0, 0, 0)) pop(mload(0)) } } }";
        let ident = |name: &str, start: usize| {
            json!({"nodeType": "YulIdentifier", "name": name, "src": format!("{}:{}:0", start, name.len())})
        };
        let literal = |start: usize| {
            json!({"nodeType": "YulLiteral", "kind": "number", "value": "0", "type": "", "src": format!("{}:1:0", start)})
        };
        let delegatecall = json!({
            "nodeType": "YulFunctionCall", "src": "56:34:0",
            "functionName": ident("delegatecall", 56),
            "arguments": [
                {"nodeType": "YulFunctionCall", "src": "69:5:0", "functionName": ident("gas", 69), "arguments": []},
                literal(76), literal(79), literal(82), literal(85), literal(88)
            ]
        });
        let ast = json!({
            "id": 6, "src": format!("0:{}:0", text.len()), "nodeType": "SourceUnit", "absolutePath": "a.sol",
            "nodes": [{
                "id": 5, "src": format!("0:{}:0", text.len()), "nodeType": "ContractDefinition",
                "name": "A", "contractKind": "contract", "abstract": false, "baseContracts": [],
                "linearizedBaseContracts": [5],
                "nodes": [{
                    "id": 4, "src": "13:96:0", "nodeType": "FunctionDefinition", "name": "f",
                    "kind": "function", "stateMutability": "nonpayable", "visibility": "public",
                    "virtual": false, "implemented": true, "modifiers": [],
                    "parameters": {"id": 1, "src": "23:2:0", "nodeType": "ParameterList", "parameters": []},
                    "returnParameters": {"id": 2, "src": "33:0:0", "nodeType": "ParameterList", "parameters": []},
                    "body": {"id": 3, "src": "33:76:0", "nodeType": "Block", "statements": [{
                        "id": 7, "src": "35:72:0", "nodeType": "InlineAssembly",
                        "AST": {"nodeType": "YulBlock", "src": "44:63:0", "statements": [
                            {"nodeType": "YulExpressionStatement", "src": "46:45:0", "expression": {
                                "nodeType": "YulFunctionCall", "src": "46:45:0",
                                "functionName": ident("sstore", 46),
                                "arguments": [literal(53), delegatecall]}},
                            {"nodeType": "YulExpressionStatement", "src": "92:13:0", "expression": {
                                "nodeType": "YulFunctionCall", "src": "92:13:0",
                                "functionName": ident("pop", 92),
                                "arguments": [{"nodeType": "YulFunctionCall", "src": "96:8:0",
                                               "functionName": ident("mload", 96),
                                               "arguments": [literal(102)]}]}}
                        ]}
                    }]}
                }]
            }]
        });

        let mut builder = GraphBuilder::new();
        builder.add_source_unit("a.sol", Some(0), &ast, Some(text)).unwrap();
        let graph = builder.finish();

        let effects_of = |name: &str| {
            graph
                .iter()
                .find(|n| match n.kind() {
                    NodeKind::YulFunctionCall(call) => {
                        n.wrap(call.function_name).kind().declared_name() == Some(name)
                    }
                    _ => false,
                })
                .map(|n| n.state_effects())
                .unwrap()
        };
        assert_eq!(
            effects_of("sstore"),
            StateEffects::MODIFIES_STATE_VAR | StateEffects::PERFORMS_DELEGATECALL
        );
        assert_eq!(effects_of("delegatecall"), StateEffects::PERFORMS_DELEGATECALL);
        assert!(effects_of("pop").is_empty());

        let assembly = graph.by_ast_id(7).unwrap();
        assert_eq!(
            assembly.state_effects(),
            StateEffects::MODIFIES_STATE_VAR | StateEffects::PERFORMS_DELEGATECALL
        );
        assert!(graph.by_ast_id(4).unwrap().modifies_state());
    }

    #[test]
    fn test_external_function_types() {
        assert!(is_mutating_external(
            "function (address,uint256) external returns (bool)"
        ));
        assert!(!is_mutating_external(
            "function (address) view external returns (uint256)"
        ));
        assert!(!is_mutating_external("function (uint256) pure returns (uint256)"));
    }
}
