//! Telnet 位元組狀態機
//!
//! 狀態跨呼叫保存，所以任何切法送進來的位元組都會得到相同結果。

use bytes::BytesMut;
use tracing::trace;

use super::negotiator::Negotiator;
use super::protocol::{TelnetCommand, TelnetOption, IAC};
use crate::encoding::TextDecoder;

/// 狀態機狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Data,
    Iac,
    Negotiate,
    Sub,
    SubIac,
}

/// 一次 [`ParserSession::feed`] 的結果
#[derive(Debug, Default)]
pub struct Ingest {
    /// 解碼後的文字（已移除 CR）
    pub text: String,
    /// 本次完成的子協商內容，依抵達順序
    pub subnegotiations: Vec<Vec<u8>>,
    /// 需要送回伺服器的位元組
    pub replies: BytesMut,
}

/// 單一連線的協定狀態
#[derive(Debug)]
pub struct ParserSession {
    state: ParserState,
    negotiation_command: TelnetCommand,
    sub_buffer: Vec<u8>,
    decoder: TextDecoder,
    gmcp_negotiated: bool,
    negotiator: Negotiator,
}

impl ParserSession {
    pub fn new(negotiator: Negotiator) -> Self {
        Self {
            state: ParserState::Data,
            negotiation_command: TelnetCommand::Will,
            sub_buffer: Vec::new(),
            decoder: TextDecoder::new(),
            gmcp_negotiated: false,
            negotiator,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn gmcp_negotiated(&self) -> bool {
        self.gmcp_negotiated
    }

    /// 重新連線時整個重置
    pub fn reset(&mut self) {
        self.state = ParserState::Data;
        self.negotiation_command = TelnetCommand::Will;
        self.sub_buffer.clear();
        self.decoder.reset();
        self.gmcp_negotiated = false;
    }

    /// 處理一段收到的位元組
    pub fn feed(&mut self, input: &[u8]) -> Ingest {
        let mut ingest = Ingest::default();
        let mut plain = Vec::with_capacity(input.len());

        for &byte in input {
            match self.state {
                ParserState::Data => match byte {
                    IAC => self.state = ParserState::Iac,
                    b'\r' => {}
                    _ => plain.push(byte),
                },
                ParserState::Iac => match byte {
                    IAC => {
                        plain.push(IAC);
                        self.state = ParserState::Data;
                    }
                    _ => match TelnetCommand::from_byte(byte) {
                        Some(TelnetCommand::Sb) => {
                            self.sub_buffer.clear();
                            self.state = ParserState::Sub;
                        }
                        Some(cmd) if cmd.is_negotiation() => {
                            self.negotiation_command = cmd;
                            self.state = ParserState::Negotiate;
                        }
                        _ => {
                            trace!("忽略 Telnet 命令: {}", byte);
                            self.state = ParserState::Data;
                        }
                    },
                },
                ParserState::Negotiate => {
                    self.negotiator.respond(
                        self.negotiation_command,
                        TelnetOption::from_byte(byte),
                        &mut self.gmcp_negotiated,
                        &mut ingest.replies,
                    );
                    self.state = ParserState::Data;
                }
                ParserState::Sub => match byte {
                    IAC => self.state = ParserState::SubIac,
                    _ => self.sub_buffer.push(byte),
                },
                ParserState::SubIac => {
                    if byte == TelnetCommand::Se as u8 {
                        ingest.subnegotiations.push(std::mem::take(&mut self.sub_buffer));
                        self.state = ParserState::Data;
                    } else {
                        // IAC IAC 為轉義的 0xFF；其他位元組寬鬆處理
                        self.sub_buffer.push(byte);
                        self.state = ParserState::Sub;
                    }
                }
            }
        }

        if !plain.is_empty() {
            ingest.text = self.decoder.decode(&plain);
        }
        ingest
    }
}
