//! 子協商內容解碼
//!
//! 依第一個位元組（選項編號）分派。內容太短或不認識的選項直接丟棄。

use tracing::trace;

use super::protocol::{TelnetOption, TTYPE_SEND};

/// 完成的子協商
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subnegotiation<'a> {
    /// 伺服器要求回報終端類型
    TerminalTypeSend,
    /// GMCP 內容（不含選項位元組）
    Gmcp(&'a [u8]),
}

/// 解析 `IAC SB` 與 `IAC SE` 之間的內容
pub fn decode_subnegotiation(payload: &[u8]) -> Option<Subnegotiation<'_>> {
    let (&option, rest) = payload.split_first()?;
    match TelnetOption::from_byte(option) {
        TelnetOption::TerminalType => match rest.first() {
            Some(&TTYPE_SEND) => Some(Subnegotiation::TerminalTypeSend),
            _ => {
                trace!("忽略 TERMINAL-TYPE 子協商: {:?}", rest);
                None
            }
        },
        TelnetOption::Gmcp => Some(Subnegotiation::Gmcp(rest)),
        other => {
            trace!("忽略子協商: {:?}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_type_send() {
        assert_eq!(decode_subnegotiation(&[24, 1]), Some(Subnegotiation::TerminalTypeSend));
        assert_eq!(decode_subnegotiation(&[24, 0]), None);
        assert_eq!(decode_subnegotiation(&[24]), None);
    }

    #[test]
    fn test_gmcp_payload() {
        let payload = [&[201u8][..], b"Core.Ping"].concat();
        assert_eq!(decode_subnegotiation(&payload), Some(Subnegotiation::Gmcp(b"Core.Ping")));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert_eq!(decode_subnegotiation(&[]), None);
        assert_eq!(decode_subnegotiation(&[86, 1, 2]), None);
    }
}
