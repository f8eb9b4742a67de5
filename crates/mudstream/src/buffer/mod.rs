//! 訊息緩衝區模組
//!
//! 固定上限的訊息歷史，超過上限時移除最舊的訊息

use std::collections::VecDeque;

use crate::message::Message;

/// 訊息歷史
#[derive(Debug, Clone)]
pub struct MessageHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl MessageHistory {
    /// 創建新的訊息歷史
    ///
    /// # Example
    /// ```
    /// use mudstream::buffer::MessageHistory;
    ///
    /// let history = MessageHistory::new(100);
    /// assert_eq!(history.len(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// 添加訊息；已滿時先移除最舊的
    pub fn push(&mut self, message: Message) {
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// 最後一則訊息
    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn last_mut(&mut self) -> Option<&mut Message> {
        self.messages.back_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(500)
    }
}
