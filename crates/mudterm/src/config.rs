//! 設定檔
//!
//! 單一 JSON 檔：連線資訊、逾時設定與引擎設定。檔案不存在時使用預設值，
//! 欄位缺漏時以預設值補齊。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mudstream::{EngineConfig, TelnetConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 設定檔錯誤
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("讀取設定檔失敗: {0}")]
    Io(#[from] io::Error),

    #[error("設定檔格式錯誤: {0}")]
    Json(#[from] serde_json::Error),
}

/// 終端前端設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    pub host: String,
    pub port: u16,
    /// 連線逾時（秒）
    pub connect_timeout_secs: u64,
    /// Core.Ping 間隔（秒）
    pub keepalive_secs: u64,
    pub engine: EngineConfig,
}

impl Default for TermConfig {
    fn default() -> Self {
        let telnet = TelnetConfig::default();
        Self {
            host: "localhost".to_string(),
            port: 4000,
            connect_timeout_secs: telnet.connect_timeout.as_secs(),
            keepalive_secs: telnet.keepalive_interval.as_secs(),
            engine: EngineConfig::default(),
        }
    }
}

impl TermConfig {
    /// 預設設定檔路徑
    pub fn default_path() -> PathBuf {
        config_dir().join("config.json")
    }

    /// 從檔案載入；檔案不存在時回傳預設值
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn telnet_config(&self) -> TelnetConfig {
        TelnetConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            keepalive_interval: Duration::from_secs(self.keepalive_secs.max(1)),
            ..TelnetConfig::default()
        }
    }
}

/// 獲取設定目錄
pub fn config_dir() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("mudstream")
    } else {
        PathBuf::from(".")
    }
}
