//! Telnet 客戶端
//!
//! 非同步連線管理：建立 TCP 連線、讀取迴圈、送出命令與定時 keepalive。
//! 協定處理全部交給 [`Engine`]，這裡只負責搬運位元組。

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::engine::Engine;
use crate::sink::GameSink;

/// Telnet 客戶端錯誤
#[derive(Debug, Error)]
pub enum TelnetError {
    #[error("無效的連線位址: {0}")]
    InvalidAddress(String),

    #[error("連線失敗: {0}")]
    ConnectionFailed(#[from] io::Error),

    #[error("連線逾時")]
    Timeout,

    #[error("未連線")]
    NotConnected,

    #[error("DNS 解析失敗: {0}")]
    DnsResolutionFailed(String),
}

/// 連線狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Telnet 客戶端配置
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// 連線逾時
    pub connect_timeout: Duration,
    /// 讀取緩衝區大小
    pub read_buffer_size: usize,
    /// Core.Ping 間隔
    pub keepalive_interval: Duration,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_buffer_size: 8192,
            keepalive_interval: Duration::from_secs(30),
        }
    }
}

/// 前端送給連線迴圈的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// 使用者輸入的一行命令
    Send(String),
    Disconnect,
}

/// 讀取迴圈結束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// 伺服器關閉連線
    ClosedByServer,
    /// 使用者要求斷線
    ClosedByUser,
    /// 命令通道已關閉（前端結束）
    CommandChannelClosed,
}

/// 連線前檢查主機與埠
pub fn validate_address(host: &str, port: u16) -> Result<String, TelnetError> {
    let host = host.trim();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(TelnetError::InvalidAddress(format!("主機名稱不正確: {:?}", host)));
    }
    if port == 0 {
        return Err(TelnetError::InvalidAddress("連接埠不可為 0".to_string()));
    }
    Ok(format!("{}:{}", host, port))
}

/// Telnet 客戶端
pub struct TelnetClient<S = TcpStream> {
    stream: S,
    config: TelnetConfig,
    state: ConnectionState,
}

impl TelnetClient<TcpStream> {
    /// 連線到 MUD 伺服器
    ///
    /// # Arguments
    /// * `host` - 主機名稱或 IP
    /// * `port` - 連接埠
    pub async fn connect(host: &str, port: u16, config: TelnetConfig) -> Result<Self, TelnetError> {
        let addr = validate_address(host, port)?;
        info!("正在連線到 {}", addr);

        // 解析主機名稱
        let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr)
            .await
            .map_err(|e| TelnetError::DnsResolutionFailed(e.to_string()))?
            .collect();

        let Some(target) = socket_addrs.first() else {
            return Err(TelnetError::DnsResolutionFailed(format!(
                "無法解析主機: {}",
                host
            )));
        };

        debug!("已解析到位址: {:?}", socket_addrs);

        let stream = timeout(config.connect_timeout, TcpStream::connect(target))
            .await
            .map_err(|_| TelnetError::Timeout)?
            .map_err(TelnetError::ConnectionFailed)?;

        // 設定 TCP 選項
        stream.set_nodelay(true)?;

        info!("已連線到 {}", addr);
        Ok(Self::from_stream(stream, config))
    }
}

impl<S> TelnetClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// 用已建立的串流建立客戶端（測試時可傳入模擬串流）
    pub fn from_stream(stream: S, config: TelnetConfig) -> Self {
        Self {
            stream,
            config,
            state: ConnectionState::Connected,
        }
    }

    /// 獲取連線狀態
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 發送原始位元組到伺服器
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), TelnetError> {
        if self.state != ConnectionState::Connected {
            return Err(TelnetError::NotConnected);
        }
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        trace!("已發送 {} bytes", data.len());
        Ok(())
    }

    /// 經由引擎送出一行命令（回顯並編碼為 UTF-8 + CRLF）
    pub async fn send_command(
        &mut self,
        engine: &mut Engine,
        sink: &mut dyn GameSink,
        text: &str,
    ) -> Result<(), TelnetError> {
        let data = engine.submit_command(text, sink);
        self.send_raw(&data).await?;
        debug!("已發送: {}", text);
        Ok(())
    }

    /// 讀取迴圈：處理伺服器資料、前端命令與 keepalive，直到斷線
    ///
    /// 開始前會重置引擎，確保新連線不帶任何舊的協定或擷取狀態。
    pub async fn run(
        &mut self,
        engine: &mut Engine,
        sink: &mut dyn GameSink,
        commands: &mut mpsc::Receiver<ClientCommand>,
    ) -> Result<DisconnectReason, TelnetError> {
        engine.reset();
        let result = self.read_loop(engine, sink, commands).await;
        self.state = ConnectionState::Disconnected;
        match &result {
            Ok(reason) => info!("連線結束: {:?}", reason),
            Err(e) => warn!("連線中斷: {}", e),
        }
        result
    }

    async fn read_loop(
        &mut self,
        engine: &mut Engine,
        sink: &mut dyn GameSink,
        commands: &mut mpsc::Receiver<ClientCommand>,
    ) -> Result<DisconnectReason, TelnetError> {
        let mut buffer = vec![0u8; self.config.read_buffer_size.max(1)];
        let period = self.config.keepalive_interval;
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = self.stream.read(&mut buffer) => {
                    let n = result?;
                    if n == 0 {
                        return Ok(DisconnectReason::ClosedByServer);
                    }
                    let replies = engine.receive(&buffer[..n], sink);
                    if !replies.is_empty() {
                        self.send_raw(&replies).await?;
                    }
                }
                command = commands.recv() => match command {
                    Some(ClientCommand::Send(text)) => {
                        self.send_command(engine, sink, &text).await?;
                    }
                    Some(ClientCommand::Disconnect) => return Ok(DisconnectReason::ClosedByUser),
                    None => return Ok(DisconnectReason::CommandChannelClosed),
                },
                _ = keepalive.tick() => {
                    trace!("送出 Core.Ping");
                    let frame = engine.keepalive_frame();
                    self.send_raw(&frame).await?;
                }
            }
        }
    }
}
