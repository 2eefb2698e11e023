use crate::config::{Config, ConfigError, ConfigPaths};
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print config with secrets redacted
    #[arg(long)]
    pub print: bool,

    /// Set a config value (dotted key=value)
    #[arg(long, value_name = "key=value")]
    pub set: Vec<String>,
}

pub fn run(args: &ConfigArgs, paths: &ConfigPaths) -> Result<(), ConfigError> {
    let mut config = Config::load_or_create(paths)?;

    if !args.set.is_empty() {
        for assignment in &args.set {
            apply_set(&mut config, assignment)?;
        }
        config.validate()?;
        Config::write(paths, &config)?;
    }

    if args.print || args.set.is_empty() {
        let redacted = config.redacted();
        let output = toml::to_string_pretty(&redacted)?;
        println!("{output}");
    }

    Ok(())
}

fn apply_set(config: &mut Config, assignment: &str) -> Result<(), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::Validation("expected key=value for --set".into()))?;
    let key = key.trim();
    let value = value.trim();
    match key {
        "chunking.size" => {
            let parsed = parse_usize(value, key)?;
            if parsed == 0 {
                return Err(ConfigError::Validation(
                    "chunking.size must be greater than 0".into(),
                ));
            }
            config.chunking.size = parsed;
        }
        "chunking.overlap" => {
            config.chunking.overlap = parse_usize(value, key)?;
        }
        "chunking.context_tail" => {
            config.chunking.context_tail = parse_usize(value, key)?;
        }
        "extract.active" => {
            config.extract.active = value.to_string();
        }
        "extract.local.provider" => {
            config.extract.local.provider = value.to_string();
        }
        "extract.local.model" => {
            config.extract.local.model = value.to_string();
        }
        "extract.local.api_key" => {
            config.extract.local.api_key = value.to_string();
        }
        "extract.cloud.provider" => {
            config.extract.cloud.provider = value.to_string();
        }
        "extract.cloud.model" => {
            config.extract.cloud.model = value.to_string();
        }
        "extract.cloud.api_key" => {
            config.extract.cloud.api_key = value.to_string();
        }
        "extract.provider" => {
            set_active_value(
                key,
                &config.extract.active,
                value,
                &mut config.extract.local.provider,
                &mut config.extract.cloud.provider,
            )?;
        }
        "extract.model" => {
            set_active_value(
                key,
                &config.extract.active,
                value,
                &mut config.extract.local.model,
                &mut config.extract.cloud.model,
            )?;
        }
        "extract.api_key" => {
            set_active_value(
                key,
                &config.extract.active,
                value,
                &mut config.extract.local.api_key,
                &mut config.extract.cloud.api_key,
            )?;
        }
        "http.timeout_secs" => {
            config.http.timeout_secs = parse_u64(value, key)?;
        }
        "http.max_retries" => {
            config.http.max_retries = parse_usize(value, key)?;
        }
        "http.run_timeout_secs" => {
            config.http.run_timeout_secs = parse_u64(value, key)?;
        }
        "store.data_dir" => {
            config.store.data_dir = value.to_string();
        }
        _ => {
            return Err(ConfigError::Validation(format!(
                "unknown config key: {key}"
            )));
        }
    }
    Ok(())
}

fn set_active_value(
    label: &str,
    active: &str,
    value: &str,
    local: &mut String,
    cloud: &mut String,
) -> Result<(), ConfigError> {
    match active {
        "local" => {
            *local = value.to_string();
            Ok(())
        }
        "cloud" => {
            *cloud = value.to_string();
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "{label} cannot be set because active profile is invalid"
        ))),
    }
}

fn parse_usize(value: &str, key: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects an unsigned integer")))
}

fn parse_u64(value: &str, key: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects an unsigned integer")))
}

#[cfg(test)]
mod tests {
    use super::apply_set;
    use crate::config::Config;

    #[test]
    fn apply_set_updates_nested_keys() {
        let mut config = Config::default();
        apply_set(&mut config, "chunking.overlap=150").unwrap();
        apply_set(&mut config, "http.run_timeout_secs = 0").unwrap();
        apply_set(&mut config, "store.data_dir=/srv/recap").unwrap();
        assert_eq!(config.chunking.overlap, 150);
        assert_eq!(config.http.run_timeout_secs, 0);
        assert_eq!(config.store.data_dir, "/srv/recap");
    }

    #[test]
    fn apply_set_targets_active_profile() {
        let mut config = Config::default();
        apply_set(&mut config, "extract.model=llama3.1:8b").unwrap();
        assert_eq!(config.extract.local.model, "llama3.1:8b");

        apply_set(&mut config, "extract.active=cloud").unwrap();
        apply_set(&mut config, "extract.api_key=sk-test").unwrap();
        assert_eq!(config.extract.cloud.api_key, "sk-test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn apply_set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply_set(&mut config, "chunking.size").is_err());
        assert!(apply_set(&mut config, "chunking.size=0").is_err());
        assert!(apply_set(&mut config, "chunking.size=big").is_err());
        let err = apply_set(&mut config, "ui.theme=dark").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
    }
}
