//! Save/load round trips through text, binary and KDL files
//!
//! Every format must reproduce the same keys, names, types and values.

use config::{Config, Value};
use tempfile::TempDir;

/// Helper: a tree touching every value type, both key kinds and the
/// reserved APPEND/PREPEND bands
fn sample_tree() -> Config {
    let mut root = Config::new();
    root.set("root value");
    root.find("video/width").set(1920);
    root.find("video/scale").set(1.25f32);
    root.find("video/vsync").set(true);
    root.find("world/seed").set(4_000_000_000u32);
    root.find("input/jump").set(b' ');
    root.find("window/title").set("Cross \"world\"\n\tv2 # not a comment");
    root.find("key with spaces").set("grass");
    root.find("empty");

    let inventory = root.find("player/inventory");
    inventory.at(Config::APPEND).set("sword");
    inventory.at(Config::APPEND).set("shield");
    inventory.at(Config::PREPEND).set("map");
    inventory.at(12u32).set(-3);
    root
}

/// Helper: Assert both trees hold the same keys, names and values
fn assert_same_tree(original: &Config, restored: &Config) {
    assert_eq!(
        original, restored,
        "restored tree differs:\n{}\n---\n{}",
        original, restored
    );
}

#[test]
fn test_scenario_nested_int_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.cfg");

    let mut config = Config::new();
    config["a"]["b"].set(5);
    config.save(&path).unwrap();

    let loaded = Config::load(&path);
    assert_eq!(loaded["a"]["b"].integer(0), 5);
    assert_eq!(loaded["a"]["b"].value(), Value::Int(5));
}

#[test]
fn test_text_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.cfg");

    let original = sample_tree();
    original.save(&path).unwrap();

    assert_same_tree(&original, &Config::read_text_file(&path).unwrap());
    assert_same_tree(&original, &Config::load(&path));
}

#[test]
fn test_text_is_stable() {
    let original = sample_tree();
    let first = original.to_text();
    let second: Config = first.parse().unwrap();
    assert_eq!(first, second.to_text());
}

#[test]
fn test_binary_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.bin");

    let original = sample_tree();
    original.save_binary(&path).unwrap();

    let restored = Config::load_binary(&path).unwrap();
    assert_same_tree(&original, &restored);
    assert_eq!(restored.to_bytes(), original.to_bytes());
}

#[test]
fn test_appended_order_survives_roundtrip() {
    let original = sample_tree();
    let from_text: Config = original.to_text().parse().unwrap();
    let from_binary = Config::from_bytes(&original.to_bytes()).unwrap();

    for restored in [&from_text, &from_binary] {
        let items: Vec<String> = restored
            .lookup("player/inventory")
            .unwrap()
            .children()
            .map(|c| c.string(""))
            .collect();
        assert_eq!(items, vec!["map", "-3", "sword", "shield"]);
    }
}

#[test]
fn test_reloaded_list_keeps_order_when_names_are_added() {
    let original = sample_tree();
    let dir = TempDir::new().unwrap();
    let text_path = dir.path().join("list.cfg");
    let binary_path = dir.path().join("list.bin");
    original.save(&text_path).unwrap();
    original.save_binary(&binary_path).unwrap();

    for mut restored in [Config::load(&text_path), Config::load_binary(&binary_path).unwrap()] {
        let inventory = restored.find("player/inventory");
        // "x" hashes into the range APPEND hands out, "a" into PREPEND's
        inventory.at("x").set("x");
        inventory.at("a").set("a");
        inventory.at(Config::APPEND).set("bow");

        let items: Vec<String> = inventory.children().map(|c| c.string("")).collect();
        assert_eq!(items.first().map(String::as_str), Some("map"));
        assert_eq!(&items[items.len() - 3..], &["sword", "shield", "bow"]);
    }
}

#[test]
fn test_load_replaces_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.cfg");
    std::fs::write(&path, b"a = 1\nb = 2\nc = \"\xff\"\n").unwrap();

    let cfg = Config::load(&path);
    assert_eq!(cfg["a"].integer(0), 1);
    assert_eq!(cfg["b"].integer(0), 2);
    assert_eq!(cfg["c"].string(""), "\u{fffd}");
    assert!(Config::read_text_file(&path).is_ok());
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.cfg");

    let cfg = Config::load(&missing);
    assert!(cfg.is_empty());
    assert!(!cfg.exists());
    assert!(Config::read_text_file(&missing).is_err());
}

#[test]
fn test_hand_written_text() {
    let text = r#"
# engine settings
window {
    title = "Crossworld"
    width = 1280
    fullscreen = false
}
audio {
    = 1
    volume = 0.8
}
"#;
    let cfg: Config = text.parse().unwrap();
    assert_eq!(cfg["window"]["title"].string(""), "Crossworld");
    assert_eq!(cfg["window"]["width"].integer(0), 1280);
    assert!(!cfg["window"]["fullscreen"].boolean(true));
    assert_eq!(cfg["audio"].integer(0), 1);
    assert_eq!(cfg["audio"]["volume"].real(0.0), 0.8);
}

#[test]
fn test_lenient_text_skips_bad_lines() {
    let text = "good = 1\nbroken = \"unterminated\n= \nalso_good = 3\n";
    let cfg = Config::from_text(text);
    assert_eq!(cfg["good"].integer(0), 1);
    assert_eq!(cfg["also_good"].integer(0), 3);
    assert_eq!(cfg.count(), 2);
}

#[test]
fn test_kdl_file_import() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.kdl");
    std::fs::write(
        &path,
        r#"
app {
    window title="Crossworld" width=1280
    spawn 1.5 0.0 -2.0
}
"#,
    )
    .unwrap();

    let cfg = Config::from_kdl_file(&path).unwrap();
    let window = cfg.lookup("app/window").unwrap();
    assert_eq!(window["title"].string(""), "Crossworld");
    assert_eq!(window["width"].integer(0), 1280);

    let spawn: Vec<f32> = cfg
        .lookup("app/spawn")
        .unwrap()
        .children()
        .map(|c| c.real(0.0))
        .collect();
    assert_eq!(spawn, vec![1.5, 0.0, -2.0]);

    // Imported trees save like any other
    let restored: Config = cfg.to_text().parse().unwrap();
    assert_same_tree(&cfg, &restored);
}
