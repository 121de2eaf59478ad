use super::RelshConfig;
use super::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

fn toml(source: &str) -> toml::Value {
    toml::from_str(source).expect("valid toml")
}

fn workspace(file: &str, source: &str) -> ConfigLayerEntry {
    ConfigLayerEntry::new(
        ConfigLayerSource::Workspace {
            file: PathBuf::from(file),
        },
        toml(source),
    )
}

#[test]
fn options_are_overlaid_key_by_key() {
    let stack = ConfigLayerStack::new(vec![
        workspace(
            "/repo/.relsh/relsh.toml",
            "verbose = true\n[options]\npublish_path = \"a\"\ntag = \"latest\"\n",
        ),
        workspace("/repo/relsh.toml", "[options]\npublish_path = \"b\"\n"),
    ]);

    let config = stack.effective_config().expect("config");

    assert!(config.verbose);
    assert_eq!(config.options.publish_path.as_deref(), Some("b"));
    assert_eq!(config.options.get("tag"), Some(&json!("latest")));
}

#[test]
fn log_settings_keep_unset_fields() {
    let stack = ConfigLayerStack::new(vec![
        workspace(
            "/repo/.relsh/relsh.toml",
            "[log]\ntargets = [\"relsh\", \"relsh_config\"]\n",
        ),
        workspace("/repo/relsh.toml", "[log]\nlevel = \"warn\"\n"),
    ]);

    let config = stack.effective_config().expect("config");

    assert_eq!(config.log.level, "warn");
    assert_eq!(config.log.targets, vec!["relsh", "relsh_config"]);
}

#[test]
fn later_layers_win() {
    let stack = ConfigLayerStack::new(vec![
        ConfigLayerEntry::new(
            ConfigLayerSource::User {
                file: PathBuf::from("/home/me/.config/relsh/relsh.toml"),
            },
            toml("dry_run = true\nverbose = true\n"),
        ),
        ConfigLayerEntry::new(ConfigLayerSource::Runtime, toml("dry_run = false\n")),
    ]);

    let config = stack.effective_config().expect("config");
    assert!(!config.dry_run);
    assert!(config.verbose);
    assert_eq!(
        stack.last_file(),
        Some(&PathBuf::from("/home/me/.config/relsh/relsh.toml"))
    );
}

#[test]
fn empty_stack_yields_defaults() {
    let config = ConfigLayerStack::default().effective_config().expect("config");
    assert_eq!(config, RelshConfig::default());
}

#[test]
fn mistyped_layer_names_its_source() {
    let stack = ConfigLayerStack::new(vec![workspace(
        "/repo/relsh.toml",
        "dry_run = \"sometimes\"\n",
    )]);

    let err = stack.effective_config().unwrap_err();

    assert!(format!("{err:#}").contains("/repo/relsh.toml"), "{err:#}");
}

#[test]
fn empty_publish_path_is_rejected() {
    let config: RelshConfig = toml("[options]\npublish_path = \" \"\n")
        .try_into()
        .expect("config");
    assert!(config.validate().is_err());
}

#[test]
fn unknown_log_level_is_rejected() {
    let config: RelshConfig = toml("[log]\nlevel = \"loud\"\n").try_into().expect("config");
    assert!(config.validate().is_err());
}

#[test]
fn log_filter_switches_to_debug_when_verbose() {
    let config = RelshConfig::default();
    assert_eq!(config.log.filter_directive(false), "relsh=info");
    assert_eq!(config.log.filter_directive(true), "relsh=debug");
}
