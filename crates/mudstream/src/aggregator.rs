//! 訊息彙整
//!
//! 連續相同堆疊鍵的訊息合併為一則並計數，其餘依序加入有上限的歷史。

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::ansi::{ansi_to_html, escape_html};
use crate::buffer::MessageHistory;
use crate::message::{current_timestamp, Message, MessageType};
use crate::stack::stack_key;

lazy_static! {
    static ref TELEPORT_KEY: Regex = Regex::new(r"key: '([^'\s<>]+)'").unwrap();
}

/// 已分類、準備加入歷史的一行
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine {
    /// 原始文字（可含顏色碼）
    pub raw: String,
    /// 純文字
    pub text: String,
    pub kind: MessageType,
    pub is_combat: bool,
    pub is_comm: bool,
    pub dimmed_in_combat: bool,
}

impl ClassifiedLine {
    /// 沒有分類旗標的訊息（系統、錯誤、使用者回顯）
    pub fn plain(text: impl Into<String>, kind: MessageType) -> Self {
        let text = text.into();
        Self {
            raw: text.clone(),
            text,
            kind,
            is_combat: false,
            is_comm: false,
            dimmed_in_combat: false,
        }
    }
}

/// 把 `key: '<token>'` 包成可互動的標記，供「存為傳送點」使用
pub fn mark_teleport_keys(html: &str) -> String {
    TELEPORT_KEY
        .replace_all(html, |caps: &Captures<'_>| {
            format!(
                "<span class=\"teleport-key\" data-key=\"{}\">{}</span>",
                &caps[1], &caps[0]
            )
        })
        .into_owned()
}

/// 訊息彙整器
#[derive(Debug, Clone)]
pub struct Aggregator {
    history: MessageHistory,
    next_id: u64,
}

impl Aggregator {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: MessageHistory::new(capacity),
            next_id: 1,
        }
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    /// 最新一則訊息
    pub fn last(&self) -> Option<&Message> {
        self.history.last()
    }

    /// 加入一行；回傳是否與前一則合併
    pub fn push(&mut self, line: ClassifiedLine) -> bool {
        let key = stack_key(&line.text);
        let stack_id = key.as_ref().map(|k| k.id());

        let merge = match (&stack_id, self.history.last()) {
            (Some(id), Some(last)) => {
                last.kind == line.kind && last.stack_id.as_deref() == Some(id.as_str())
            }
            _ => false,
        };

        if merge {
            if let (Some(key), Some(last)) = (key, self.history.last_mut()) {
                last.stack_count += 1;
                last.text = key.render(last.stack_count);
                last.html = mark_teleport_keys(&escape_html(&last.text));
                return true;
            }
        }

        let html = mark_teleport_keys(&ansi_to_html(&line.raw));
        let message = Message {
            id: self.next_id,
            html,
            text: line.text,
            kind: line.kind,
            timestamp: current_timestamp(),
            is_combat: line.is_combat,
            dimmed_in_combat: line.dimmed_in_combat,
            stack_id,
            stack_count: 1,
            is_comm: line.is_comm,
        };
        self.next_id += 1;
        self.history.push(message);
        false
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(500)
    }
}
