//! UTF-8 串流解碼與命令編碼
//!
//! 傳輸層可能在多位元組字元中間切斷，解碼器必須跨呼叫保留未完成的序列。

use encoding_rs::{CoderResult, Decoder, UTF_8};

/// 保留跨呼叫狀態的 UTF-8 解碼器
pub struct TextDecoder {
    decoder: Decoder,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_without_bom_handling(),
        }
    }

    /// 解碼一段位元組；尾端不完整的序列留到下一次呼叫
    ///
    /// # Example
    /// ```
    /// use mudstream::encoding::TextDecoder;
    ///
    /// let mut decoder = TextDecoder::new();
    /// assert_eq!(decoder.decode(&[b'a', 0xC3]), "a");
    /// assert_eq!(decoder.decode(&[0xA9]), "é");
    /// ```
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut output = String::new();
        let mut input = bytes;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 4);
            output.reserve(needed);
            let (result, read, _replaced) = self.decoder.decode_to_string(input, &mut output, false);
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
        output
    }

    /// 丟棄未完成的序列（重新連線時使用）
    pub fn reset(&mut self) {
        self.decoder = UTF_8.new_decoder_without_bom_handling();
    }
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder").finish_non_exhaustive()
    }
}

/// 將命令編碼為 UTF-8 並加上 CRLF
pub fn encode_command(text: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(text.len() + 2);
    data.extend_from_slice(text.as_bytes());
    data.extend_from_slice(b"\r\n");
    data
}
