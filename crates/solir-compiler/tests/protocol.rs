use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use solir_compiler::input::{ModelCheckerEngine, ModelCheckerTarget, RevertStrings};
use solir_compiler::{
    CompileOptions, CompilerError, ContractSelector, EvmVersion, OutputKind, SolcInput,
    SourceDescriptor,
};

fn sources() -> IndexMap<String, SourceDescriptor> {
    IndexMap::from([(
        "a.sol".to_string(),
        SourceDescriptor::content("contract A {}"),
    )])
}

#[test]
fn test_options_map_to_wire_names() {
    let options = CompileOptions {
        optimizer_enabled: Some(true),
        optimizer_runs: Some(200),
        evm_version: Some(EvmVersion::Paris),
        via_ir: Some(true),
        remappings: vec!["@oz/=lib/oz/".to_string()],
        outputs: vec![OutputKind::Abi, OutputKind::EvmBytecodeObject],
        model_checker_engine: Some(ModelCheckerEngine::Chc),
        model_checker_targets: vec![ModelCheckerTarget::DivByZero],
        model_checker_timeout: Some(1000),
        revert_strings: Some(RevertStrings::Strip),
        ..CompileOptions::default()
    };
    let input = SolcInput::from_options(sources(), &options).unwrap();
    let wire = serde_json::to_value(&input).unwrap();

    assert_eq!(
        wire,
        json!({
            "language": "Solidity",
            "sources": {"a.sol": {"content": "contract A {}"}},
            "settings": {
                "remappings": ["@oz/=lib/oz/"],
                "optimizer": {"enabled": true, "runs": 200},
                "evmVersion": "paris",
                "viaIR": true,
                "debug": {"revertStrings": "strip"},
                "outputSelection": {"*": {"": ["ast"], "*": ["abi", "evm.bytecode.object"]}},
                "modelChecker": {
                    "engine": "chc",
                    "targets": ["divByZero"],
                    "timeout": 1000
                }
            }
        })
    );
}

#[test]
fn test_unknown_fields_round_trip() {
    let wire = json!({
        "language": "Yul",
        "sources": {"x.yul": {"content": "{}", "futureSourceFlag": 1}},
        "settings": {
            "optimizer": {"enabled": false, "details": {"yulDetails": {"stackAllocation": true, "shiny": "yes"}}},
            "metadata": {"appendCBOR": false, "bytecodeHash": "none"},
            "outputSelection": {"x.yul": {"Token": ["transientStorageLayout"]}},
            "eofVersion": 1
        },
        "topLevelExtension": [1, 2]
    });

    let input: SolcInput = serde_json::from_value(wire.clone()).unwrap();
    let settings = input.settings.as_ref().unwrap();
    assert_eq!(settings.extra.get("eofVersion"), Some(&json!(1)));
    assert_eq!(
        settings
            .output_selection
            .as_ref()
            .unwrap()
            .get("x.yul", &ContractSelector::Named("Token".to_string())),
        Some(&[OutputKind::Other("transientStorageLayout".to_string())][..])
    );

    let back: Value = serde_json::to_value(&input).unwrap();
    assert_eq!(back, wire);
}

#[test]
fn test_validation_before_invocation() {
    let empty = SolcInput::new(IndexMap::new());
    assert!(matches!(empty.validate(), Err(CompilerError::Validation(_))));

    let bad_remapping = CompileOptions {
        remappings: vec!["no-equals-sign".to_string()],
        ..CompileOptions::default()
    };
    assert!(SolcInput::from_options(sources(), &bad_remapping).is_err());

    let library = CompileOptions {
        libraries: IndexMap::from([(
            "a.sol".to_string(),
            IndexMap::from([(
                "Math".to_string(),
                "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4".to_string(),
            )]),
        )]),
        ..CompileOptions::default()
    };
    assert!(SolcInput::from_options(sources(), &library).is_ok());

    let both: Result<SolcInput, _> = serde_json::from_value(json!({
        "language": "Solidity",
        "sources": {"a.sol": {"content": "x", "urls": ["a.sol"]}}
    }));
    assert!(both.is_err());
}

#[test]
fn test_stop_after_parsing_selects_only_ast() {
    let options = CompileOptions {
        stop_after_parsing: true,
        outputs: vec![OutputKind::Abi],
        ..CompileOptions::default()
    };
    let input = SolcInput::from_options(sources(), &options).unwrap();
    let wire = serde_json::to_value(&input).unwrap();
    assert_eq!(wire["settings"]["stopAfter"], json!("parsing"));
    assert_eq!(
        wire["settings"]["outputSelection"],
        json!({"*": {"": ["ast"]}})
    );

    let mut forced = input.clone();
    forced
        .settings
        .as_mut()
        .unwrap()
        .output_selection
        .as_mut()
        .unwrap()
        .select("*", ContractSelector::All, [OutputKind::Abi]);
    assert!(forced.validate().is_err());
}
