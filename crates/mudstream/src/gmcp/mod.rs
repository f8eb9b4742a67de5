//! GMCP 訊息解碼
//!
//! 子協商內容的格式為 `<package> <json>`，package 名稱不分大小寫。

pub mod vitals;

use serde_json::Value;
use tracing::{debug, trace};

use self::vitals::{VitalsDelta, VitalsKeys};

/// 已辨識的 GMCP 訊息
#[derive(Debug, Clone, PartialEq)]
pub enum GmcpMessage {
    /// char.vitals
    Vitals(VitalsDelta),
    /// room.info 及其變體，原樣轉交
    RoomInfo(Value),
    /// room.players / room.chars，原樣轉交
    RoomPlayers(Value),
}

/// 以第一個空白、`{` 或 `[` 切開 package 與 JSON
pub fn split_package(text: &str) -> (&str, &str) {
    match text.find(|c: char| c.is_whitespace() || c == '{' || c == '[') {
        Some(idx) => (text[..idx].trim(), text[idx..].trim()),
        None => (text.trim(), ""),
    }
}

fn is_room_info(package: &str) -> bool {
    // 完全相符與後綴相符都導向同一個接收端
    package == "room.info" || package == "external.room.info" || package.ends_with(".room.info")
}

fn is_room_players(package: &str) -> bool {
    package == "room.players" || package == "room.chars"
}

/// 解碼 GMCP 內容（不含選項位元組）
///
/// JSON 解析失敗或未知 package 都回傳 None，不影響後續處理。
pub fn decode(payload: &[u8], keys: &VitalsKeys) -> Option<GmcpMessage> {
    let text = String::from_utf8_lossy(payload);
    let (package, json) = split_package(&text);
    let package = package.to_ascii_lowercase();

    let wanted = package == "char.vitals" || is_room_info(&package) || is_room_players(&package);
    if !wanted {
        trace!("忽略 GMCP package: {}", package);
        return None;
    }

    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            debug!("GMCP {} JSON 解析失敗: {}", package, e);
            return None;
        }
    };

    if package == "char.vitals" {
        VitalsDelta::from_json(&value, keys).map(GmcpMessage::Vitals)
    } else if is_room_info(&package) {
        Some(GmcpMessage::RoomInfo(value))
    } else {
        Some(GmcpMessage::RoomPlayers(value))
    }
}
