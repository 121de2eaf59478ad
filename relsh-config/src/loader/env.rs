use toml::{Table, Value as TomlValue};

pub(crate) const ENV_DRY_RUN: &str = "RELSH_DRY_RUN";
pub(crate) const ENV_VERBOSE: &str = "RELSH_VERBOSE";
pub(crate) const ENV_PUBLISH_PATH: &str = "RELSH_PUBLISH_PATH";

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(variable = name, value = other, "ignoring unrecognized boolean");
            None
        }
    }
}

/// Build the environment layer from a variable lookup. Returns `None` when
/// no recognized variable is set.
pub(crate) fn environment_layer(lookup: impl Fn(&str) -> Option<String>) -> Option<TomlValue> {
    let mut table = Table::new();

    for (name, key) in [(ENV_DRY_RUN, "dry_run"), (ENV_VERBOSE, "verbose")] {
        if let Some(flag) = lookup(name).and_then(|raw| parse_flag(name, &raw)) {
            table.insert(key.to_owned(), TomlValue::Boolean(flag));
        }
    }

    if let Some(path) = lookup(ENV_PUBLISH_PATH).filter(|path| !path.trim().is_empty()) {
        let mut options = Table::new();
        options.insert("publish_path".to_owned(), TomlValue::String(path));
        table.insert("options".to_owned(), TomlValue::Table(options));
    }

    (!table.is_empty()).then_some(TomlValue::Table(table))
}

/// Highest-precedence settings, typically from command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOverrides {
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
    pub publish_path: Option<String>,
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.dry_run.is_none() && self.verbose.is_none() && self.publish_path.is_none()
    }

    pub(crate) fn to_layer(&self) -> TomlValue {
        let mut table = Table::new();
        if let Some(dry_run) = self.dry_run {
            table.insert("dry_run".to_owned(), TomlValue::Boolean(dry_run));
        }
        if let Some(verbose) = self.verbose {
            table.insert("verbose".to_owned(), TomlValue::Boolean(verbose));
        }
        if let Some(path) = &self.publish_path {
            let mut options = Table::new();
            options.insert("publish_path".to_owned(), TomlValue::String(path.clone()));
            table.insert("options".to_owned(), TomlValue::Table(options));
        }
        TomlValue::Table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn no_variables_means_no_layer() {
        assert!(environment_layer(lookup(&[])).is_none());
    }

    #[test]
    fn flags_and_publish_path_are_mapped() {
        let layer = environment_layer(lookup(&[
            (ENV_DRY_RUN, "yes"),
            (ENV_VERBOSE, "0"),
            (ENV_PUBLISH_PATH, "build/out"),
        ]));

        let expected: TomlValue = toml::from_str(
            "dry_run = true\nverbose = false\n[options]\npublish_path = \"build/out\"\n",
        )
        .unwrap();
        assert_eq!(layer, Some(expected));
    }

    #[test]
    fn garbage_flags_are_ignored() {
        assert!(environment_layer(lookup(&[(ENV_DRY_RUN, "maybe")])).is_none());
    }

    #[test]
    fn runtime_overrides_only_set_given_keys() {
        let overrides = RuntimeOverrides {
            verbose: Some(true),
            ..RuntimeOverrides::default()
        };
        let layer = overrides.to_layer();
        assert_eq!(layer.get("verbose"), Some(&TomlValue::Boolean(true)));
        assert!(layer.get("dry_run").is_none());
        assert!(RuntimeOverrides::default().is_empty());
    }
}
