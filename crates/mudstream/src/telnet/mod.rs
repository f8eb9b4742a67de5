//! Telnet 協定模組
//!
//! 位元組狀態機、選項協商、子協商解碼與非同步連線

pub mod client;
pub mod negotiator;
pub mod parser;
pub mod protocol;
pub mod subneg;

pub use client::{ClientCommand, ConnectionState, DisconnectReason, TelnetClient, TelnetConfig, TelnetError};
pub use parser::{ParserSession, ParserState};
pub use protocol::{TelnetCommand, TelnetOption};
