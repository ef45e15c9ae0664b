use pretty_assertions::assert_eq;
use select_tree::manifest::DEMO_MANIFEST;
use select_tree::{ChainManifest, Control, ControlId, ManifestError, OptionValue, TreeOptions};
use select_tree_test_utils::{option_values, within};
use std::io::Write;

const JSON_MANIFEST: &str = r#"{
    "root": "region",
    "options": { "initialValues": ["eu"], "placeholderLabel": "--" },
    "controls": [
        { "id": "region", "data-callback": "regions", "data-child": "city", "data-child-callback": "cities" },
        { "id": "city" }
    ],
    "capabilities": {
        "regions": { "options": [["Europe", "eu"], ["Asia", "as"]] },
        "cities": { "byParent": { "eu": [{ "label": "Lisbon", "value": "lis" }] } }
    }
}"#;

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_demo_manifest_drives_chain() {
    let manifest = ChainManifest::from_toml_str(DEMO_MANIFEST).unwrap();
    let (tree, controls) = manifest.instantiate();

    let handle = tree
        .attach(
            manifest.root_id(),
            TreeOptions::new().with_initial_values(["c", "2"]),
        )
        .unwrap();
    within(handle.wait_seeded()).await;

    let books = controls.get(&ControlId::new("books")).unwrap();
    assert_eq!(books.value(), OptionValue::from(2));
    assert_eq!(books.options()[2].label, "the alchemist");

    let chapters = controls.get(&ControlId::new("chapters")).unwrap();
    assert_eq!(option_values(&chapters).len(), 10);
    assert!(chapters.value().is_none());
}

#[tokio::test]
async fn test_json_manifest_from_path() {
    let file = write_temp(".json", JSON_MANIFEST);
    let manifest = ChainManifest::from_path(file.path()).unwrap();
    let (tree, controls) = manifest.instantiate();

    let handle = tree
        .attach(manifest.root_id(), manifest.options().clone())
        .unwrap();
    within(handle.wait_seeded()).await;

    let region = controls.get(&ControlId::new("region")).unwrap();
    assert_eq!(region.value(), OptionValue::from("eu"));
    assert_eq!(region.options()[0].label, "--");

    let city = controls.get(&ControlId::new("city")).unwrap();
    assert_eq!(option_values(&city), vec!["lis".to_string()]);

    region.select("as");
    within(handle.settled()).await;
    assert!(city.options().is_empty());
}

#[test]
fn test_yaml_manifest_from_path() {
    let file = write_temp(
        ".yaml",
        "root: a\ncontrol:\n  - id: a\n    callback: f\n  - id: b\ncapabilities:\n  f:\n    options: [[one, 1]]\n",
    );
    let manifest = ChainManifest::from_path(file.path()).unwrap();
    assert_eq!(manifest.root_id(), &ControlId::new("a"));
    assert_eq!(manifest.capabilities()["f"].options.len(), 1);
}

#[test]
fn test_missing_file_reports_path() {
    let err = ChainManifest::from_path("/nonexistent/select-tree/chain.toml").unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }));
    assert!(err.to_string().contains("chain.toml"));
}

#[test]
fn test_unsupported_extension() {
    let file = write_temp(".ini", "root = a");
    let err = ChainManifest::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ManifestError::UnsupportedFormat(_)));
}

#[test]
fn test_options_file() {
    let file = write_temp(".toml", "initial_values = [\"h\", 1]\n");
    let options = TreeOptions::from_path(file.path()).unwrap();
    assert_eq!(
        options.initial_values,
        vec![OptionValue::from("h"), OptionValue::from(1)]
    );
}
