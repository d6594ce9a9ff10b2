use fins_builder::domain::model::LinkManifest;
use fins_builder::{BuildConfig, BuildEngine, BuildError, LocalSink};
use std::fs;
use tempfile::TempDir;

const BUILD_FILE: &str = r#"
[build]
name = "bl01-plc"
description = "Beamline PLC gateway"

[output]
startup_script = "st-fins.cmd"

[[modules]]
id = "calc"
libraries = ["calc"]
database_definitions = ["calcSupport"]

[[lower_ports]]
name = "TS_PORT1"
description = "terminal server port 1"

[[ports]]
name = "PLC1"
kind = "udp"
address = "192.168.0.1"
simulation = "127.0.0.1"
templates = ["FINS.template"]
macros = { P = "BL01-PLC-01:" }

[[ports]]
name = "PLC2"
kind = "hostlink"
lower_port = "TS_PORT1"
templates = ["FINS.template"]
"#;

#[test]
fn test_end_to_end_build_writes_all_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = BuildConfig::from_toml_str(BUILD_FILE).unwrap();
    let context = config.build_context(Some(false)).unwrap();
    let engine = BuildEngine::new(context, LocalSink::new(output_path));

    let written = engine.run(&config).unwrap();
    assert_eq!(written.len(), 3);

    let script = fs::read_to_string(temp_dir.path().join("st-fins.cmd")).unwrap();
    let lines: Vec<&str> = script.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[1], "finsUDPInit(\"PLC1\", \"192.168.0.1\")");
    assert_eq!(lines[3], "HostlinkInterposeInit(\"TS_PORT1\")");
    assert_eq!(lines[5], "finsDEVInit(\"PLC2\", \"TS_PORT1\")");

    let substitutions =
        fs::read_to_string(temp_dir.path().join("fins.substitutions")).unwrap();
    assert!(substitutions.starts_with("file \"FINS.template\"\n"));
    assert!(substitutions.contains("pattern { P, name }"));
    assert!(substitutions.contains("{ \"BL01-PLC-01:\", \"PLC1\" }"));
    assert!(substitutions.contains("{ \"\", \"PLC2\" }"));

    let manifest: LinkManifest = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("fins-manifest.json")).unwrap(),
    )
    .unwrap();
    // calc is declared but never instantiated
    assert_eq!(manifest.modules, vec!["asyn", "FINS"]);
    assert_eq!(manifest.libraries, vec!["asyn", "FINS"]);
    assert_eq!(manifest.database_definitions, vec!["asyn", "FINS"]);
}

#[test]
fn test_simulation_build_never_mentions_real_address() {
    let config = BuildConfig::from_toml_str(BUILD_FILE).unwrap();
    let context = config.build_context(None).unwrap();
    let engine = BuildEngine::new(context, LocalSink::new(String::new()));

    let artifacts = engine.generate().unwrap();
    assert!(artifacts.startup_script.contains("finsUDPInit(\"PLC1\", \"127.0.0.1\")"));
    assert!(!artifacts.startup_script.contains("192.168.0.1"));
}

#[test]
fn test_generate_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = BuildConfig::from_toml_str(BUILD_FILE).unwrap();
    let context = config.build_context(None).unwrap();
    let engine = BuildEngine::new(
        context,
        LocalSink::new(temp_dir.path().to_str().unwrap().to_string()),
    );

    engine.generate().unwrap();
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_explicit_instantiation_and_cycles() {
    let toml_content = r#"
[build]
name = "cyclic"
instantiate = ["calc"]

[[modules]]
id = "calc"
dependencies = ["sscan"]

[[modules]]
id = "sscan"
dependencies = ["calc"]
"#;

    let config = BuildConfig::from_toml_str(toml_content).unwrap();
    let context = config.build_context(None).unwrap();
    let engine = BuildEngine::new(context, LocalSink::new(String::new()));

    match engine.generate() {
        Err(BuildError::CyclicDependency { cycle }) => {
            assert_eq!(cycle, vec!["calc", "sscan", "calc"]);
        }
        other => panic!("expected a dependency cycle, got {other:?}"),
    }
}

#[test]
fn test_hostlink_before_lower_port_declaration_is_unresolved() {
    let toml_content = r#"
[build]
name = "unresolved"

[[ports]]
name = "PLC2"
kind = "hostlink"
lower_port = "COM9"
"#;

    let config = BuildConfig::from_toml_str(toml_content).unwrap();
    assert!(matches!(
        config.build_context(None),
        Err(BuildError::UnresolvedReference { .. })
    ));
}

#[test]
fn test_quoted_macro_values_are_escaped_in_substitutions() {
    let toml_content = r#"
[build]
name = "escaped"

[[ports]]
name = "PLC1"
kind = "udp"
address = "192.168.0.1"
macros = { DESC = 'Line "A" PLC' }
"#;

    let config = BuildConfig::from_toml_str(toml_content).unwrap();
    let context = config.build_context(None).unwrap();
    let engine = BuildEngine::new(context, LocalSink::new(String::new()));

    let artifacts = engine.generate().unwrap();
    assert_eq!(
        artifacts.substitutions,
        "file \"FINS.template\"\n{\npattern { DESC, name }\n{ \"Line \\\"A\\\" PLC\", \"PLC1\" }\n}\n"
    );
}
