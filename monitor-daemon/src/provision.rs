//! Bootstrap and node provisioning.
//!
//! - [`init`]: creates the monitor and Streamr config directories, seeds the
//!   `.env` template and copies the pm2 `nodes.yml` template.
//! - [`setup_nodes`]: writes one broker JSON config per node with a fresh
//!   private key, then updates `PM2_NAMES` in `.env` and the `XX-` placeholders
//!   in `nodes.yml`.
//!
//! Existing files are never overwritten; they are reported instead.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;

use streamr_monitor_core::config::{ProvisioningConfig, expand_home};

/// `.env` template written by [`init`].
pub const ENV_TEMPLATE: &str = include_str!("../templates/env.template");

/// JSON schema reference of the broker config.
const BROKER_CONFIG_SCHEMA: &str = "http://schema.streamr.network/config-v1.schema.json";

/// Base ports of the first node; node `i` adds `i * PORT_STRIDE`.
const WEBSOCKET_BASE_PORT: u16 = 7170;
const MQTT_BASE_PORT: u16 = 1883;
const HTTP_BASE_PORT: u16 = 7171;
const PORT_STRIDE: u16 = 10;

/// Placeholder prefix in the pm2 `nodes.yml` template.
const NODES_YML_PLACEHOLDER: &str = "XX-";

const PM2_NAMES_KEY: &str = "PM2_NAMES";

/// secp256k1 group order `n`, big-endian.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Resolved filesystem locations used by provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPaths {
    /// Monitor `.env` file.
    pub env_file: PathBuf,
    /// Streamr broker config directory (node JSON files and `nodes.yml`).
    pub streamr_dir: PathBuf,
    /// Template `nodes.yml` copied by [`init`].
    pub nodes_yml_template: PathBuf,
}

impl ProvisionPaths {
    /// Resolve paths from the `[provisioning]` section (`~` expanded).
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            env_file: expand_home(&config.env_file),
            streamr_dir: expand_home(&config.streamr_config_dir),
            nodes_yml_template: expand_home(&config.nodes_yml_template),
        }
    }

    /// Directory holding the `.env` file.
    pub fn env_dir(&self) -> &Path {
        self.env_file.parent().unwrap_or_else(|| Path::new("."))
    }

    /// pm2 `nodes.yml` inside the Streamr config directory.
    pub fn nodes_yml(&self) -> PathBuf {
        self.streamr_dir.join("nodes.yml")
    }

    /// Broker config file of a node.
    pub fn node_config(&self, node_id: &str) -> PathBuf {
        self.streamr_dir.join(format!("{node_id}.json"))
    }
}

/// Outcome for a single file touched by provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    /// File was written.
    Created,
    /// File was updated in place.
    Updated,
    /// File already existed and was left untouched.
    AlreadyExists,
    /// Source (template or target) was missing; nothing was done.
    Missing,
}

/// Result of [`init`].
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    /// Directories that did not exist before.
    pub created_dirs: Vec<PathBuf>,
    /// `.env` file outcome.
    pub env_file: FileAction,
    /// `nodes.yml` outcome.
    pub nodes_yml: FileAction,
}

/// Create config directories and seed template files.
pub fn init(paths: &ProvisionPaths) -> Result<InitReport> {
    let mut created_dirs = Vec::new();
    for dir in [paths.env_dir().to_path_buf(), paths.streamr_dir.clone()] {
        if !dir.is_dir() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
            tracing::info!(path = %dir.display(), "directory created");
            created_dirs.push(dir);
        }
    }

    let env_file = if write_new(&paths.env_file, ENV_TEMPLATE)? {
        tracing::info!(path = %paths.env_file.display(), ".env template written");
        FileAction::Created
    } else {
        tracing::info!(path = %paths.env_file.display(), ".env file already exists");
        FileAction::AlreadyExists
    };

    let nodes_yml_path = paths.nodes_yml();
    let nodes_yml = if nodes_yml_path.exists() {
        tracing::info!(path = %nodes_yml_path.display(), "nodes.yml already exists");
        FileAction::AlreadyExists
    } else if paths.nodes_yml_template.is_file() {
        fs::copy(&paths.nodes_yml_template, &nodes_yml_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                paths.nodes_yml_template.display(),
                nodes_yml_path.display()
            )
        })?;
        tracing::info!(
            from = %paths.nodes_yml_template.display(),
            to = %nodes_yml_path.display(),
            "nodes.yml template copied"
        );
        FileAction::Created
    } else {
        tracing::warn!(
            template = %paths.nodes_yml_template.display(),
            "nodes.yml template not found, skipping"
        );
        FileAction::Missing
    };

    Ok(InitReport {
        created_dirs,
        env_file,
        nodes_yml,
    })
}

/// Result of [`setup_nodes`].
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    /// Node ids in order (`{server_index}-1` ..).
    pub node_ids: Vec<String>,
    /// Broker config files written.
    pub written: Vec<PathBuf>,
    /// Broker config files that already existed.
    pub skipped: Vec<PathBuf>,
    /// `.env` outcome.
    pub env_file: FileAction,
    /// `nodes.yml` outcome.
    pub nodes_yml: FileAction,
}

/// Provision `count` nodes for `server_index`.
///
/// One API key is generated per call and shared by every node written in it.
pub fn setup_nodes(paths: &ProvisionPaths, server_index: &str, count: u32) -> Result<SetupReport> {
    validate_server_index(server_index)?;
    if count == 0 {
        anyhow::bail!("node count must be at least 1");
    }
    let max_offset = u16::try_from(count - 1)
        .ok()
        .and_then(|i| i.checked_mul(PORT_STRIDE))
        .and_then(|offset| HTTP_BASE_PORT.checked_add(offset));
    if max_offset.is_none() {
        anyhow::bail!("node count {count} would exceed the port range");
    }

    fs::create_dir_all(&paths.streamr_dir).with_context(|| {
        format!("failed to create directory {}", paths.streamr_dir.display())
    })?;

    let api_key = generate_api_key();
    let mut report = SetupReport {
        node_ids: Vec::with_capacity(count as usize),
        written: Vec::new(),
        skipped: Vec::new(),
        env_file: FileAction::Missing,
        nodes_yml: FileAction::Missing,
    };

    for i in 0..count {
        let node_id = format!("{server_index}-{}", i + 1);
        // bounded by the port range check above
        let offset = (i as u16) * PORT_STRIDE;
        let path = paths.node_config(&node_id);

        let config = BrokerConfig::new(generate_private_key()?, &api_key, offset);
        if write_new(&path, &render_json(&config)?)? {
            tracing::info!(node = %node_id, path = %path.display(), "node config written");
            report.written.push(path);
        } else {
            tracing::warn!(node = %node_id, path = %path.display(), "node config already exists, left untouched");
            report.skipped.push(path);
        }
        report.node_ids.push(node_id);
    }

    report.env_file = update_env_file(&paths.env_file, &report.node_ids)?;
    report.nodes_yml = update_nodes_yml(&paths.nodes_yml(), server_index)?;

    Ok(report)
}

/// Server index ends up in file names, so it must be a plain name.
fn validate_server_index(server_index: &str) -> Result<()> {
    if server_index.trim().is_empty() {
        anyhow::bail!("server index must not be empty");
    }
    if server_index.contains('/') || server_index.contains('\\') || server_index.contains("..") {
        anyhow::bail!("server index '{server_index}' must not contain path separators or '..'");
    }
    Ok(())
}

/// Generate a random secp256k1 private key as `0x` + 64 lowercase hex digits.
///
/// Draws 32 bytes until they form a valid scalar (`0 < k < n`).
pub fn generate_private_key() -> Result<String> {
    let mut key = [0u8; 32];
    loop {
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| anyhow::anyhow!("failed to gather randomness: {}", e))?;
        if is_valid_private_key(&key) {
            return Ok(format!("0x{}", hex::encode(key)));
        }
    }
}

/// Whether the big-endian bytes form a valid secp256k1 scalar.
pub fn is_valid_private_key(key: &[u8; 32]) -> bool {
    key.iter().any(|b| *b != 0) && *key < SECP256K1_ORDER
}

/// Generate the broker API key shared by one provisioning run.
pub fn generate_api_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Serialize)]
struct EmptyObject {}

#[derive(Debug, Serialize)]
struct PortConfig {
    port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrivateKeyAuth {
    private_key: String,
}

#[derive(Debug, Serialize)]
struct ClientConfig {
    auth: PrivateKeyAuth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrokerPlugins {
    metrics: EmptyObject,
    websocket: PortConfig,
    mqtt: PortConfig,
    publish_http: EmptyObject,
    brubeck_miner: EmptyObject,
}

#[derive(Debug, Serialize)]
struct ApiAuthentication {
    keys: Vec<String>,
}

/// Broker config file written per node.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrokerConfig {
    #[serde(rename = "$schema")]
    schema: &'static str,
    client: ClientConfig,
    plugins: BrokerPlugins,
    api_authentication: ApiAuthentication,
    http_server: PortConfig,
}

impl BrokerConfig {
    fn new(private_key: String, api_key: &str, offset: u16) -> Self {
        Self {
            schema: BROKER_CONFIG_SCHEMA,
            client: ClientConfig {
                auth: PrivateKeyAuth { private_key },
            },
            plugins: BrokerPlugins {
                metrics: EmptyObject {},
                websocket: PortConfig {
                    port: WEBSOCKET_BASE_PORT + offset,
                },
                mqtt: PortConfig {
                    port: MQTT_BASE_PORT + offset,
                },
                publish_http: EmptyObject {},
                brubeck_miner: EmptyObject {},
            },
            api_authentication: ApiAuthentication {
                keys: vec![api_key.to_owned()],
            },
            http_server: PortConfig {
                port: HTTP_BASE_PORT + offset,
            },
        }
    }
}

/// Serialize as pretty JSON with 4-space indentation.
fn render_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("failed to serialize broker config")?;
    String::from_utf8(buf).context("broker config is not valid UTF-8")
}

/// Create `path` with `content` only if it does not exist yet.
///
/// Returns `false` when the file already exists.
fn write_new(path: &Path, content: &str) -> Result<bool> {
    use std::io::Write;

    let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to create {}", path.display()));
        }
    };
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

/// Replace every `PM2_NAMES` line with the new list, or append one.
pub fn replace_pm2_names(content: &str, node_ids: &[String]) -> String {
    let line = format!("{PM2_NAMES_KEY}={}", node_ids.join(","));
    let mut replaced = false;

    let mut lines: Vec<String> = content
        .lines()
        .map(|l| {
            if l.trim_start().starts_with(PM2_NAMES_KEY) {
                replaced = true;
                line.clone()
            } else {
                l.to_owned()
            }
        })
        .collect();
    if !replaced {
        lines.push(line);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn update_env_file(path: &Path, node_ids: &[String]) -> Result<FileAction> {
    let (content, action) = match fs::read_to_string(path) {
        Ok(content) => (content, FileAction::Updated),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            (ENV_TEMPLATE.to_owned(), FileAction::Created)
        }
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    fs::write(path, replace_pm2_names(&content, node_ids))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), nodes = %node_ids.join(","), "PM2_NAMES updated");
    Ok(action)
}

fn update_nodes_yml(path: &Path, server_index: &str) -> Result<FileAction> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "nodes.yml not found, skipping placeholder update");
            return Ok(FileAction::Missing);
        }
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    let updated = content.replace(NODES_YML_PLACEHOLDER, &format!("{server_index}-"));
    fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), server_index, "nodes.yml updated");
    Ok(FileAction::Updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_validity_bounds() {
        assert!(!is_valid_private_key(&[0u8; 32]));
        assert!(!is_valid_private_key(&SECP256K1_ORDER));
        assert!(!is_valid_private_key(&[0xFF; 32]));

        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(is_valid_private_key(&one));

        let mut below_order = SECP256K1_ORDER;
        below_order[31] -= 1;
        assert!(is_valid_private_key(&below_order));
    }

    #[test]
    fn test_generate_private_key_format() {
        let key = generate_private_key().unwrap();
        assert_eq!(key.len(), 66);
        assert!(key.starts_with("0x"));
        let bytes: [u8; 32] = hex::decode(&key[2..]).unwrap().try_into().unwrap();
        assert!(is_valid_private_key(&bytes));
    }

    #[test]
    fn test_replace_pm2_names_replaces_existing_line() {
        let content = "STREAM_ID=abc\nPM2_NAMES=old-1\nBROKER_NODE_PORT=7171\n";
        let ids = vec!["2-1".to_owned(), "2-2".to_owned()];
        assert_eq!(
            replace_pm2_names(content, &ids),
            "STREAM_ID=abc\nPM2_NAMES=2-1,2-2\nBROKER_NODE_PORT=7171\n"
        );
    }

    #[test]
    fn test_replace_pm2_names_appends_when_absent() {
        let ids = vec!["1-1".to_owned()];
        assert_eq!(replace_pm2_names("STREAM_ID=abc", &ids), "STREAM_ID=abc\nPM2_NAMES=1-1\n");
        assert_eq!(replace_pm2_names("", &ids), "PM2_NAMES=1-1\n");
    }

    #[test]
    fn test_broker_config_layout() {
        let config = BrokerConfig::new("0xkey".to_owned(), "api", 20);
        let json = render_json(&config).unwrap();

        // 4-space indent, declaration order kept
        assert!(json.starts_with("{\n    \"$schema\": "));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["client"]["auth"]["privateKey"], "0xkey");
        assert_eq!(value["plugins"]["websocket"]["port"], 7190);
        assert_eq!(value["plugins"]["mqtt"]["port"], 1903);
        assert_eq!(value["plugins"]["publishHttp"], serde_json::json!({}));
        assert_eq!(value["plugins"]["brubeckMiner"], serde_json::json!({}));
        assert_eq!(value["apiAuthentication"]["keys"], serde_json::json!(["api"]));
        assert_eq!(value["httpServer"]["port"], 7191);
    }

    #[test]
    fn test_server_index_validation() {
        assert!(validate_server_index("3").is_ok());
        assert!(validate_server_index("eu").is_ok());
        for bad in ["", " ", "../x", "a/b", "a\\b"] {
            assert!(validate_server_index(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
