//! 訊息資料結構

use serde::Serialize;

/// 訊息來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// 使用者輸入的回顯
    User,
    /// 連線狀態等系統訊息
    System,
    /// 錯誤
    Error,
    /// 伺服器送來的遊戲文字
    Game,
}

/// 歷史中的一則訊息
///
/// 建立後只有在與下一行合併時才會修改 `stack_count`、`text`、`html`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub html: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Unix 毫秒
    pub timestamp: u64,
    pub is_combat: bool,
    pub dimmed_in_combat: bool,
    pub stack_id: Option<String>,
    pub stack_count: u32,
    pub is_comm: bool,
}

/// 目前時間（Unix 毫秒）
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
