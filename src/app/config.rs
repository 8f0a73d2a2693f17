use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notify::Urgency;

/// Default TCP port shared by sender and receiver
pub const DEFAULT_PORT: u16 = 4321;

/// 送信側設定（チャットクライアントが動くホスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Host the receiver listens on (usually the local end of an SSH forward)
    #[serde(default = "default_host")]
    pub host: String,
    /// Receiver port
    #[serde(default = "default_port")]
    pub port: u16,
    /// ソケットの代わりに使うシェルコマンド（例: `ssh laptop rnotify -`）
    #[serde(default)]
    pub command: Option<String>,
    /// Upper bound for the command transport to finish
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Upper bound for the socket connect and write
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Icon for highlights
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Icon for private messages (falls back to `icon` when empty)
    #[serde(default = "default_pm_icon")]
    pub pm_icon: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default = "default_display_time_ms")]
    pub highlight_display_time_ms: u32,
    #[serde(default = "default_display_time_ms")]
    pub private_display_time_ms: u32,
    /// Tell the user when a notification could not be sent
    #[serde(default = "default_display_errors")]
    pub display_errors: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_icon() -> String {
    "utilities-terminal".to_string()
}

fn default_pm_icon() -> String {
    "emblem-favorite".to_string()
}

fn default_display_time_ms() -> u32 {
    10_000
}

fn default_display_errors() -> bool {
    true
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            command: None,
            command_timeout_ms: default_command_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            icon: default_icon(),
            pm_icon: default_pm_icon(),
            urgency: Urgency::default(),
            highlight_display_time_ms: default_display_time_ms(),
            private_display_time_ms: default_display_time_ms(),
            display_errors: default_display_errors(),
        }
    }
}

impl SenderConfig {
    /// The command transport, if one is configured and non-blank
    pub fn command(&self) -> Option<&str> {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// 受信側設定（通知を表示するデスクトップ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Address to bind; loopback unless a tunnel needs otherwise
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Idle time after which a connection is considered fully drained
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Payloads larger than this are discarded
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// デスクトップ通知コマンド
    #[serde(default = "default_notify_command")]
    pub notify_command: String,
    /// Category passed to the notification tool
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
    /// サウンド再生コマンド
    #[serde(default = "default_sound_command")]
    pub sound_command: String,
    /// Arguments placed before the sound file
    #[serde(default = "default_sound_args")]
    pub sound_args: Vec<String>,
    #[serde(default = "default_sound_path")]
    pub sound_path: PathBuf,
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_max_payload_bytes() -> usize {
    64 * 1024
}

fn default_notify_command() -> String {
    "notify-send".to_string()
}

fn default_category() -> String {
    "IRC".to_string()
}

fn default_sound_enabled() -> bool {
    true
}

fn default_sound_command() -> String {
    "play".to_string()
}

fn default_sound_args() -> Vec<String> {
    vec!["-V0".to_string(), "-q".to_string()]
}

fn default_sound_path() -> PathBuf {
    PathBuf::from("/usr/share/sounds/purple/receive.wav")
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
            max_payload_bytes: default_max_payload_bytes(),
            notify_command: default_notify_command(),
            category: default_category(),
            sound_enabled: default_sound_enabled(),
            sound_command: default_sound_command(),
            sound_args: default_sound_args(),
            sound_path: default_sound_path(),
        }
    }
}

impl ReceiverConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// アプリケーション設定（起動時に一度だけ読み込む）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
}

impl Config {
    /// 設定ファイルから読み込み（存在しない場合はデフォルトを作成して保存）
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み（存在しない場合はデフォルトを作成して保存）
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
            Ok(config)
        } else {
            // 初回起動時はデフォルト設定をファイルに保存
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                tracing::warn!("Failed to save default config: {}", e);
            }
            Ok(config)
        }
    }

    /// 設定ファイルパスを取得
    pub fn config_path() -> Result<PathBuf> {
        let base_dirs = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))?;
        Ok(base_dirs.home_dir().join(".config/remote-notify/config.toml"))
    }

    /// 現在の設定をファイルに保存
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
