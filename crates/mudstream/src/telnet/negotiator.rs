//! 選項協商
//!
//! 只接受 TERMINAL-TYPE、NAWS、GMCP，其餘一律拒絕。所有回應都是同步寫入
//! 外送緩衝區，不會等待對方。

use bytes::{BufMut, BytesMut};
use tracing::debug;

use super::protocol::{gmcp_frame, negotiation, window_size_frame, TelnetCommand, TelnetOption};
use crate::config::EngineConfig;

/// 依設定回應 WILL/DO 的協商器
#[derive(Debug, Clone)]
pub struct Negotiator {
    window_width: u16,
    window_height: u16,
    /// 預先序列化好的能力宣告 JSON
    capabilities_json: String,
}

impl Negotiator {
    pub fn new(config: &EngineConfig) -> Self {
        let capabilities_json =
            serde_json::to_string(&config.capabilities).unwrap_or_else(|_| "[]".to_string());
        Self {
            window_width: config.window_width,
            window_height: config.window_height,
            capabilities_json,
        }
    }

    /// 處理一個 `IAC <cmd> <option>`，回應寫入 `out`
    ///
    /// `gmcp_negotiated` 屬於連線 session，確保能力宣告只送一次。
    pub fn respond(
        &self,
        cmd: TelnetCommand,
        option: TelnetOption,
        gmcp_negotiated: &mut bool,
        out: &mut BytesMut,
    ) {
        debug!("協商: {:?} {:?}", cmd, option);
        match (cmd, option) {
            (TelnetCommand::Do, TelnetOption::TerminalType) => {
                out.put_slice(&negotiation(TelnetCommand::Will, option));
            }
            (TelnetCommand::Will, TelnetOption::Gmcp) => {
                out.put_slice(&negotiation(TelnetCommand::Do, option));
                self.announce(gmcp_negotiated, out);
            }
            (TelnetCommand::Do, TelnetOption::Gmcp) => {
                out.put_slice(&negotiation(TelnetCommand::Will, option));
                self.announce(gmcp_negotiated, out);
            }
            (TelnetCommand::Do, TelnetOption::WindowSize) => {
                out.put_slice(&negotiation(TelnetCommand::Will, option));
                out.put_slice(&window_size_frame(self.window_width, self.window_height));
            }
            (TelnetCommand::Will, _) => {
                out.put_slice(&negotiation(TelnetCommand::Dont, option));
            }
            (TelnetCommand::Do, _) => {
                out.put_slice(&negotiation(TelnetCommand::Wont, option));
            }
            // WONT / DONT 不需要回應
            _ => {}
        }
    }

    fn announce(&self, gmcp_negotiated: &mut bool, out: &mut BytesMut) {
        if *gmcp_negotiated {
            return;
        }
        *gmcp_negotiated = true;
        debug!("GMCP 已啟用，送出能力宣告");
        out.put_slice(&gmcp_frame("Core.Supports.Set", Some(&self.capabilities_json)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telnet::protocol::IAC;

    fn respond(cmd: TelnetCommand, option: u8, negotiated: &mut bool) -> Vec<u8> {
        let negotiator = Negotiator::new(&EngineConfig::default());
        let mut out = BytesMut::new();
        negotiator.respond(cmd, TelnetOption::from_byte(option), negotiated, &mut out);
        out.to_vec()
    }

    #[test]
    fn test_do_terminal_type() {
        let out = respond(TelnetCommand::Do, 24, &mut false);
        assert_eq!(out, vec![IAC, 251, 24]);
    }

    #[test]
    fn test_will_gmcp_announces_once() {
        let mut negotiated = false;
        let first = respond(TelnetCommand::Will, 201, &mut negotiated);
        assert!(negotiated);
        assert_eq!(&first[..3], &[IAC, 253, 201]);
        let announcement = gmcp_frame(
            "Core.Supports.Set",
            Some(&serde_json::to_string(&EngineConfig::default().capabilities).unwrap()),
        );
        assert_eq!(&first[3..], &announcement[..]);

        let second = respond(TelnetCommand::Do, 201, &mut negotiated);
        assert_eq!(second, vec![IAC, 251, 201]);
    }

    #[test]
    fn test_do_window_size_sends_naws() {
        let out = respond(TelnetCommand::Do, 31, &mut false);
        assert_eq!(out, vec![IAC, 251, 31, IAC, 250, 31, 0, 120, 0, 40, IAC, 240]);
    }

    #[test]
    fn test_refuse_unknown_options() {
        assert_eq!(respond(TelnetCommand::Will, 1, &mut false), vec![IAC, 254, 1]);
        assert_eq!(respond(TelnetCommand::Do, 86, &mut false), vec![IAC, 252, 86]);
        // 伺服器要我們回報 TERMINAL-TYPE 是 DO；WILL TERMINAL-TYPE 則拒絕
        assert_eq!(respond(TelnetCommand::Will, 24, &mut false), vec![IAC, 254, 24]);
    }

    #[test]
    fn test_wont_dont_ignored() {
        assert!(respond(TelnetCommand::Wont, 201, &mut false).is_empty());
        assert!(respond(TelnetCommand::Dont, 24, &mut false).is_empty());
    }
}
