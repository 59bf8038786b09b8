use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// REST facade over a subset of the Kubernetes API.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Args {
    /// YAML file with settings; command line flags take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Address to listen on [default: 0.0.0.0:8080]
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Path to the kubeconfig file. Inferred from the environment when absent.
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one.
    #[arg(long)]
    pub context: Option<String>,
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

// YAML specific configuration

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<SocketAddr>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub log_format: Option<LogFormat>,
}

// Resolved settings

#[derive(Debug, Eq, PartialEq)]
pub struct Settings {
    pub bind: SocketAddr,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub log_format: LogFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<FileConfig, ConfigError> {
    let path = path.as_ref();
    let mut content = String::new();
    std::fs::File::open(path)
        .and_then(|mut file| file.read_to_string(&mut content))
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_yaml(&content)
}

fn parse_yaml(content: &str) -> Result<FileConfig, ConfigError> {
    // Workaround for merge anchors.
    // https://github.com/dtolnay/serde-yaml/issues/317
    let mut yaml_value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml_value.is_null() {
        return Ok(FileConfig::default());
    }
    yaml_value.apply_merge()?;
    Ok(serde_yaml::from_value(yaml_value)?)
}

/// Command line over file over defaults.
pub fn merge(args: Args, file: FileConfig) -> Settings {
    Settings {
        bind: args
            .bind
            .or(file.bind)
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))),
        kubeconfig: args.kubeconfig.or(file.kubeconfig),
        context: args.context.or(file.context),
        log_format: args.log_format.or(file.log_format).unwrap_or_default(),
    }
}

pub fn resolve(args: Args) -> Result<Settings, ConfigError> {
    let file = match &args.config {
        Some(path) => load_from_yaml(path)?,
        None => FileConfig::default(),
    };
    Ok(merge(args, file))
}
