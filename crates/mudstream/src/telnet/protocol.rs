//! Telnet 協定常數與外送封包
//!
//! 實作 RFC 854 的基本命令，以及本引擎會送出的協商/子協商封包

use bytes::{BufMut, Bytes, BytesMut};

/// Telnet IAC (Interpret As Command) - 0xFF
pub const IAC: u8 = 255;

/// TERMINAL-TYPE 子協商：IS
pub const TTYPE_IS: u8 = 0;
/// TERMINAL-TYPE 子協商：SEND
pub const TTYPE_SEND: u8 = 1;

/// Telnet 命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetCommand {
    /// Sub-negotiation End
    Se = 240,
    /// No Operation
    Nop = 241,
    /// Go Ahead
    GoAhead = 249,
    /// Sub-negotiation Begin
    Sb = 250,
    /// Will
    Will = 251,
    /// Won't
    Wont = 252,
    /// Do
    Do = 253,
    /// Don't
    Dont = 254,
}

impl TelnetCommand {
    /// 從位元組解析 Telnet 命令；不認識的命令回傳 None
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            240 => Some(Self::Se),
            241 => Some(Self::Nop),
            249 => Some(Self::GoAhead),
            250 => Some(Self::Sb),
            251 => Some(Self::Will),
            252 => Some(Self::Wont),
            253 => Some(Self::Do),
            254 => Some(Self::Dont),
            _ => None,
        }
    }

    /// 是否為 WILL/WONT/DO/DONT 之一
    pub fn is_negotiation(self) -> bool {
        matches!(self, Self::Will | Self::Wont | Self::Do | Self::Dont)
    }
}

/// Telnet 選項
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    /// Terminal Type
    TerminalType,
    /// Window Size (NAWS)
    WindowSize,
    /// GMCP (Generic MUD Communication Protocol)
    Gmcp,
    /// 其他選項（一律拒絕）
    Other(u8),
}

impl TelnetOption {
    /// 從位元組解析 Telnet 選項
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            24 => Self::TerminalType,
            31 => Self::WindowSize,
            201 => Self::Gmcp,
            other => Self::Other(other),
        }
    }

    /// 獲取選項的位元組值
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::TerminalType => 24,
            Self::WindowSize => 31,
            Self::Gmcp => 201,
            Self::Other(b) => *b,
        }
    }
}

/// `IAC <cmd> <option>`
pub fn negotiation(cmd: TelnetCommand, option: TelnetOption) -> [u8; 3] {
    [IAC, cmd as u8, option.as_byte()]
}

/// `IAC SB <option> <payload> IAC SE`，payload 中的 0xFF 會轉義為 `IAC IAC`
pub fn subnegotiation(option: TelnetOption, payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(payload.len() + 6);
    frame.put_u8(IAC);
    frame.put_u8(TelnetCommand::Sb as u8);
    frame.put_u8(option.as_byte());
    for &b in payload {
        if b == IAC {
            frame.put_u8(IAC);
        }
        frame.put_u8(b);
    }
    frame.put_u8(IAC);
    frame.put_u8(TelnetCommand::Se as u8);
    frame.freeze()
}

/// GMCP 封包：`IAC SB 201 <package>[ <json>] IAC SE`
pub fn gmcp_frame(package: &str, json: Option<&str>) -> Bytes {
    let mut payload = String::from(package);
    if let Some(json) = json {
        payload.push(' ');
        payload.push_str(json);
    }
    subnegotiation(TelnetOption::Gmcp, payload.as_bytes())
}

/// NAWS 視窗大小封包（寬、高皆為 16-bit big-endian）
pub fn window_size_frame(width: u16, height: u16) -> Bytes {
    let mut payload = [0u8; 4];
    payload[..2].copy_from_slice(&width.to_be_bytes());
    payload[2..].copy_from_slice(&height.to_be_bytes());
    subnegotiation(TelnetOption::WindowSize, &payload)
}

/// TERMINAL-TYPE IS 回應
pub fn terminal_type_frame(name: &str) -> Bytes {
    let mut payload = Vec::with_capacity(name.len() + 1);
    payload.push(TTYPE_IS);
    payload.extend_from_slice(name.as_bytes());
    subnegotiation(TelnetOption::TerminalType, &payload)
}
