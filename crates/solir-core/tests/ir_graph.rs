#![recursion_limit = "256"]

use num_bigint::BigUint;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use solir_core::ir::kinds::NodeCategory;
use solir_core::{GraphBuilder, IrError, IrGraph, LineCol, NodeKind, NodeRef, StateEffects};

const OUTPUT: &str = include_str!("fixtures/vault_output.json");
const SOURCE: &str = include_str!("fixtures/vault.sol");
const COUNTER_OUTPUT: &str = include_str!("fixtures/counter_output.json");
const COUNTER_SOURCE: &str = include_str!("fixtures/counter.sol");

fn vault_ast() -> Value {
    let output: Value = serde_json::from_str(OUTPUT).unwrap();
    output["sources"]["vault.sol"]["ast"].clone()
}

fn counter_ast() -> Value {
    let output: Value = serde_json::from_str(COUNTER_OUTPUT).unwrap();
    output["sources"]["counter.sol"]["ast"].clone()
}

fn counter_graph() -> IrGraph {
    let mut builder = GraphBuilder::new();
    builder
        .add_source_unit("counter.sol", Some(0), &counter_ast(), Some(COUNTER_SOURCE))
        .unwrap();
    builder.finish()
}

/// Every JSON object carrying a `nodeType`, wherever the compiler nested it.
fn raw_node_count(ast: &Value) -> usize {
    let mut count = 0;
    let mut stack = vec![ast];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                if map.contains_key("nodeType") {
                    count += 1;
                }
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items),
            _ => {}
        }
    }
    count
}

fn vault_graph() -> IrGraph {
    let mut builder = GraphBuilder::new();
    builder
        .add_source_unit("vault.sol", Some(0), &vault_ast(), Some(SOURCE))
        .unwrap();
    builder.finish()
}

fn function<'g>(graph: &'g IrGraph, name: &str) -> NodeRef<'g> {
    graph
        .traverse()
        .find(|n| {
            matches!(n.kind(), NodeKind::FunctionDefinition(f) if f.name == name)
        })
        .unwrap()
}

#[test]
fn test_traversal_visits_every_node_once_in_source_order() {
    let graph = vault_graph();
    let root = graph.root("vault.sol").unwrap();

    let visited: Vec<_> = root.traverse().collect();
    assert_eq!(visited.len(), 73);
    assert_eq!(visited.len(), graph.len());

    let mut ids: Vec<_> = visited.iter().filter_map(|n| n.ast_id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 73);

    let starts: Vec<_> = visited.iter().map(|n| n.range().start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);

    // Walking twice yields the same sequence.
    let again: Vec<_> = root.traverse().map(|n| n.id()).collect();
    assert_eq!(again, visited.iter().map(|n| n.id()).collect::<Vec<_>>());
}

#[test]
fn test_children_nest_inside_parents() {
    let graph = vault_graph();

    for node in graph.traverse() {
        match node.parent() {
            Some(parent) => {
                assert!(parent.range().contains(&node.range()), "{:?}", node);
                assert!(parent.children().any(|c| c == node));
            }
            None => assert!(matches!(node.kind(), NodeKind::SourceUnit(_))),
        }
        assert_eq!(node.source_unit().name, "vault.sol");
    }
}

#[test]
fn test_node_categories() {
    let graph = vault_graph();
    let withdraw = function(&graph, "withdraw");

    let mut statements = 0;
    for node in withdraw.traverse() {
        if node.kind().category() == NodeCategory::Statement {
            statements += 1;
        }
    }
    // body block, declaration, two expression statements
    assert_eq!(statements, 4);
    assert_eq!(
        withdraw.kind().category(),
        NodeCategory::Declaration
    );
}

#[test]
fn test_state_effects_per_function() {
    let graph = vault_graph();

    assert_eq!(
        function(&graph, "deposit").state_effects(),
        StateEffects::MODIFIES_STATE_VAR | StateEffects::EMITS
    );
    assert_eq!(
        function(&graph, "withdraw").state_effects(),
        StateEffects::MODIFIES_STATE_VAR | StateEffects::SENDS_ETHER
    );
    assert!(function(&graph, "peek").state_effects().is_empty());
    assert!(!function(&graph, "peek").modifies_state());

    let contract = graph.by_ast_id(72).unwrap();
    assert_eq!(
        contract.state_effects(),
        StateEffects::MODIFIES_STATE_VAR | StateEffects::EMITS | StateEffects::SENDS_ETHER
    );
}

#[test]
fn test_memoized_effects_are_computed_once() {
    let graph = vault_graph();
    assert_eq!(graph.memo_computations(), 0);

    let contract = graph.by_ast_id(72).unwrap();
    let first = contract.state_effects();
    // The contract and all 70 of its descendants.
    assert_eq!(graph.memo_computations(), 71);

    assert_eq!(contract.state_effects(), first);
    function(&graph, "deposit").state_effects();
    assert_eq!(graph.memo_computations(), 71);

    graph.root("vault.sol").unwrap().state_effects();
    assert_eq!(graph.memo_computations(), 73);
}

#[test]
fn test_state_variable_references() {
    let graph = vault_graph();

    let balances_ident = graph.by_ast_id(17).unwrap();
    assert!(balances_ident.is_ref_to_state_variable());
    assert_eq!(
        balances_ident.referenced_declaration().unwrap().ast_id(),
        Some(5)
    );

    let indexed = graph.by_ast_id(20).unwrap();
    assert!(indexed.is_ref_to_state_variable());

    let local = graph.by_ast_id(46).unwrap();
    assert!(!local.is_ref_to_state_variable());

    // msg is a builtin and has no declaration in the graph
    let msg = graph.by_ast_id(18).unwrap();
    assert!(msg.referenced_declaration().is_none());
}

#[test]
fn test_navigation_and_locations() {
    let graph = vault_graph();
    let argument = graph.by_ast_id(55).unwrap();

    assert_eq!(argument.enclosing_function().unwrap().ast_id(), Some(59));
    assert_eq!(argument.enclosing_contract().unwrap().ast_id(), Some(72));

    let deposit = function(&graph, "deposit").location().unwrap();
    assert_eq!(deposit.source_unit, "vault.sol");
    assert_eq!(deposit.start, LineCol { line: 9, column: 5 });
    assert_eq!(deposit.end, LineCol { line: 12, column: 6 });
}

#[test]
fn test_literal_value_with_subdenomination() {
    let graph = vault_graph();
    match graph.by_ast_id(7).unwrap().kind() {
        NodeKind::Literal(lit) => assert_eq!(
            lit.numeric_value(),
            Some(BigUint::from(1_000_000_000_000_000_000u64))
        ),
        other => panic!("expected a literal, got {}", other.name()),
    }
}

#[test]
fn test_escaping_range_is_protocol_mismatch() {
    let mut ast = vault_ast();
    ast["nodes"][0]["src"] = json!("0:5000:0");

    let mut builder = GraphBuilder::new();
    let err = builder
        .add_source_unit("vault.sol", Some(0), &ast, Some(SOURCE))
        .unwrap_err();
    assert!(matches!(err, IrError::ProtocolMismatch { ref unit, .. } if unit == "vault.sol"));
}

#[test]
fn test_unknown_node_type_is_protocol_mismatch() {
    let mut ast = vault_ast();
    ast["nodes"][1]["nodes"][0]["nodeType"] = json!("FancyNewDeclaration");

    let mut builder = GraphBuilder::new();
    assert!(matches!(
        builder.add_source_unit("vault.sol", Some(0), &ast, None),
        Err(IrError::ProtocolMismatch { .. })
    ));
}

#[test]
fn test_location_requires_source_text() {
    let mut builder = GraphBuilder::new();
    builder
        .add_source_unit("vault.sol", Some(0), &vault_ast(), None)
        .unwrap();
    let graph = builder.finish();

    assert!(matches!(
        function(&graph, "peek").location(),
        Err(IrError::MissingSourceText(_))
    ));
}

#[test]
fn test_statement_documentation_and_yul_effects() {
    let text = "contract C { function f() public { /// @dev stop\n revert(); assembly { sstore(0, 1) } } }";
    let ast = json!({
        "id": 20, "src": format!("0:{}:0", text.len()), "nodeType": "SourceUnit",
        "absolutePath": "c.sol",
        "nodes": [{
            "id": 19, "src": format!("0:{}:0", text.len()), "nodeType": "ContractDefinition",
            "name": "C", "contractKind": "contract", "abstract": false, "baseContracts": [],
            "linearizedBaseContracts": [19],
            "nodes": [{
                "id": 18, "src": "13:74:0", "nodeType": "FunctionDefinition", "name": "f",
                "kind": "function", "stateMutability": "nonpayable", "visibility": "public",
                "virtual": false, "implemented": true, "modifiers": [],
                "parameters": {"id": 1, "src": "23:2:0", "nodeType": "ParameterList", "parameters": []},
                "returnParameters": {"id": 2, "src": "33:0:0", "nodeType": "ParameterList", "parameters": []},
                "body": {
                    "id": 17, "src": "33:54:0", "nodeType": "Block",
                    "statements": [
                        {"id": 5, "src": "50:9:0", "nodeType": "ExpressionStatement",
                         "documentation": "@dev stop",
                         "expression": {
                            "id": 4, "src": "50:8:0", "nodeType": "FunctionCall", "kind": "functionCall",
                            "arguments": [], "names": [], "tryCall": false,
                            "expression": {"id": 3, "src": "50:6:0", "nodeType": "Identifier",
                                           "name": "revert", "referencedDeclaration": -19,
                                           "overloadedDeclarations": []}
                         }},
                        {"id": 6, "src": "60:25:0", "nodeType": "InlineAssembly", "evmVersion": "paris",
                         "AST": {"nodeType": "YulBlock", "src": "70:14:0", "statements": [
                            {"nodeType": "YulExpressionStatement", "src": "72:12:0", "expression": {
                                "nodeType": "YulFunctionCall", "src": "72:12:0",
                                "functionName": {"nodeType": "YulIdentifier", "name": "sstore", "src": "72:6:0"},
                                "arguments": []}}
                         ]}}
                    ]
                }
            }]
        }]
    });

    let mut builder = GraphBuilder::new();
    builder.add_source_unit("c.sol", Some(0), &ast, Some(text)).unwrap();
    let graph = builder.finish();

    assert_eq!(graph.by_ast_id(5).unwrap().kind().documentation(), Some("@dev stop"));
    assert_eq!(
        graph.by_ast_id(6).unwrap().state_effects(),
        StateEffects::MODIFIES_STATE_VAR
    );
    assert!(graph.by_ast_id(18).unwrap().modifies_state());
}

#[test]
fn test_every_raw_node_is_visited() {
    let vault = vault_graph();
    assert_eq!(vault.traverse().count(), raw_node_count(&vault_ast()));

    let graph = counter_graph();
    let raw = raw_node_count(&counter_ast());
    assert_eq!(raw, 47);
    assert_eq!(graph.traverse().count(), raw);
    assert_eq!(graph.len(), raw);

    for node in graph.traverse() {
        if let Some(parent) = node.parent() {
            assert!(parent.range().contains(&node.range()), "{:?}", node);
        }
    }

    let yul = graph
        .traverse()
        .filter(|n| n.kind().category() == NodeCategory::Yul)
        .collect::<Vec<_>>();
    assert_eq!(yul.len(), 23);
    assert!(yul.iter().all(|n| n.ast_id().is_none()));
}

#[test]
fn test_natspec_nodes_hang_off_their_declarations() {
    let graph = counter_graph();
    let poke = function(&graph, "poke");

    let docs: Vec<_> = graph
        .traverse()
        .filter(|n| matches!(n.kind(), NodeKind::StructuredDocumentation(_)))
        .collect();
    assert_eq!(docs.len(), 4);

    let doc = graph.by_ast_id(11).unwrap();
    assert_eq!(doc.parent(), Some(poke));
    assert_eq!(
        poke.kind().documentation(),
        Some(" @dev Writes slot zero directly\n @param value New count")
    );
    assert_eq!(
        poke.kind().declaration_documentation().and_then(|d| d.node),
        Some(doc.id())
    );
    assert_eq!(doc.location().unwrap().start, LineCol { line: 13, column: 5 });

    // A documented declaration starts at its natspec.
    assert_eq!(poke.location().unwrap().start, LineCol { line: 13, column: 5 });
    assert_eq!(poke.location().unwrap().end, LineCol { line: 22, column: 6 });
}

#[test]
fn test_yul_nodes_locate_and_carry_effects() {
    let graph = counter_graph();
    let poke = function(&graph, "poke");

    let sstore = graph
        .traverse()
        .find(|n| {
            matches!(n.kind(), NodeKind::YulFunctionCall(_))
                && n.children().next().and_then(|c| c.kind().declared_name()) == Some("sstore")
        })
        .unwrap();
    assert_eq!(sstore.ast_id(), None);

    let location = graph.locate(sstore.id()).unwrap();
    assert_eq!(location.source_unit, "counter.sol");
    assert_eq!(location.start, LineCol { line: 17, column: 13 });
    assert_eq!(location.end, LineCol { line: 17, column: 38 });

    assert_eq!(sstore.enclosing_function(), Some(poke));
    let assembly = graph.by_ast_id(16).unwrap();
    assert!(sstore.ancestors().any(|a| a == assembly));

    assert_eq!(sstore.state_effects(), StateEffects::MODIFIES_STATE_VAR);
    assert_eq!(
        poke.state_effects(),
        StateEffects::MODIFIES_STATE_VAR | StateEffects::EMITS
    );
}

#[test]
fn test_deeply_nested_expression_builds() {
    let depth = 1000;
    let ident = |offset: usize| {
        json!({
            "id": 2 * offset as i64 + 10, "src": format!("{}:1:0", 4 * offset), "nodeType": "Identifier",
            "name": "a", "referencedDeclaration": 3, "overloadedDeclarations": [],
            "typeDescriptions": {"typeString": "uint256"}
        })
    };

    let mut expression = ident(0);
    for term in 1..=depth {
        expression = json!({
            "id": 2 * term as i64 + 11, "src": format!("0:{}:0", 4 * term + 1),
            "nodeType": "BinaryOperation", "operator": "+",
            "leftExpression": expression, "rightExpression": ident(term),
            "typeDescriptions": {"typeString": "uint256"}
        });
    }
    let end = 4 * depth + 1;
    let ast = json!({
        "id": 1, "src": format!("0:{}:0", end), "nodeType": "SourceUnit", "absolutePath": "deep.sol",
        "nodes": [{
            "id": 3, "src": format!("0:{}:0", end), "nodeType": "VariableDeclaration", "name": "a",
            "stateVariable": false, "storageLocation": "default", "visibility": "internal",
            "constant": true, "mutability": "constant",
            "typeDescriptions": {"typeString": "uint256"}, "value": expression
        }]
    });

    let mut builder = GraphBuilder::new();
    builder.add_source_unit("deep.sol", Some(0), &ast, None).unwrap();
    let graph = builder.finish();

    // unit, declaration, the operators and their identifiers
    assert_eq!(graph.len(), 2 + depth + depth + 1);
    assert_eq!(graph.traverse().count(), graph.len());
    let root = graph.root("deep.sol").unwrap();
    assert!(root.state_effects().is_empty());
    assert_eq!(graph.memo_computations(), graph.len() as u64);
}
