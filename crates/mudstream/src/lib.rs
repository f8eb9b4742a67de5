//! MUD Stream Library
//!
//! 將 MUD 伺服器的位元組串流轉成結構化的遊戲事件：
//! - `telnet`: Telnet 狀態機、選項協商與非同步連線
//! - `gmcp`: GMCP 訊息與 char.vitals 部分更新
//! - `encoding`: 串流 UTF-8 解碼
//! - `capture`: stat/equipment/inventory/practice 擷取
//! - `classify`: 戰鬥、對話、提示字元判斷
//! - `trigger`: 副作用訊號
//! - `aggregator`: 重複訊息合併與訊息歷史
//! - `engine`: 每條連線一個的處理引擎

pub mod aggregator;
pub mod ansi;
pub mod assembler;
pub mod buffer;
pub mod capture;
pub mod classify;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod gmcp;
pub mod message;
pub mod sink;
pub mod stack;
pub mod telnet;
pub mod trigger;

pub use buffer::MessageHistory;
pub use config::EngineConfig;
pub use engine::Engine;
pub use message::{Message, MessageType};
pub use sink::{GameSink, NullSink, RecordingSink, SinkEvent};
pub use telnet::{ClientCommand, DisconnectReason, TelnetClient, TelnetConfig, TelnetError};
pub use trigger::{Signal, Trigger, TriggerPattern, TriggerSet};
