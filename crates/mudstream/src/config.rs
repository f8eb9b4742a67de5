//! 引擎設定
//!
//! 所有欄位皆有預設值，前端可以只覆寫其中一部分

use serde::{Deserialize, Serialize};

use crate::gmcp::vitals::VitalsKeys;

/// 單一連線引擎的設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// TERMINAL-TYPE 回報的終端名稱
    pub terminal_type: String,
    /// NAWS 回報的寬度（字元格）
    pub window_width: u16,
    /// NAWS 回報的高度（字元格）
    pub window_height: u16,
    /// GMCP 協商成功後宣告的能力清單
    pub capabilities: Vec<String>,
    /// 訊息歷史上限
    pub history_capacity: usize,
    /// char.vitals 各欄位的候選鍵名（依優先順序）
    pub vitals_keys: VitalsKeys,
    /// 出現戰鬥訊息後，接下來幾行仍視為戰鬥中
    pub combat_linger_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            terminal_type: "MUDSTREAM".to_string(),
            window_width: 120,
            window_height: 40,
            capabilities: default_capabilities(),
            history_capacity: 500,
            vitals_keys: VitalsKeys::default(),
            combat_linger_lines: 6,
        }
    }
}

fn default_capabilities() -> Vec<String> {
    [
        "Char 1",
        "Char.Vitals 1",
        "Room 1",
        "Room.Info 1",
        "Room.Players 1",
        "External.Room 1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
