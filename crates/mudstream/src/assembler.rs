//! 行組裝
//!
//! 把解碼後的文字切成完整的行；沒有換行結尾的部分保留下來，通常就是提示字元。

/// 文字行緩衝
#[derive(Debug, Default, Clone)]
pub struct LineAssembler {
    buffer: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入文字，回傳所有已完成的行（包含結尾的 `\n`）
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut lines = Vec::new();
        while let Some(idx) = self.buffer.find('\n') {
            let rest = self.buffer.split_off(idx + 1);
            lines.push(std::mem::replace(&mut self.buffer, rest));
        }
        lines
    }

    /// 尚未以換行結束的部分
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
