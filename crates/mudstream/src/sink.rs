//! 引擎對外的回呼介面
//!
//! 引擎本身不持有 UI 狀態，所有解析結果都透過 [`GameSink`] 送出。
//! 每個方法都有空的預設實作，接收端只需要覆寫關心的事件。

use serde_json::Value;

use crate::capture::practice::PracticeEntry;
use crate::capture::CaptureStage;
use crate::gmcp::vitals::{CharVitals, Lighting, Weather};
use crate::message::Message;
use crate::trigger::Signal;

/// 接收引擎事件的一方
pub trait GameSink {
    /// 數值欄位有更新；參數為套用後的完整狀態
    fn vitals(&mut self, _vitals: &CharVitals) {}

    /// 結構化資料計算出的戰鬥狀態
    fn combat(&mut self, _in_combat: bool) {}

    fn weather(&mut self, _weather: Weather) {}

    fn fog(&mut self, _foggy: bool) {}

    /// 光線改變時才會呼叫
    fn lighting(&mut self, _lighting: Lighting) {}

    fn room_info(&mut self, _info: &Value) {}

    fn room_players(&mut self, _players: &Value) {}

    /// 每一行解碼後的原始文字（含換行），給外部的音效/觸發比對使用
    fn line(&mut self, _line: &str) {}

    /// 新增或合併後的訊息
    fn message(&mut self, _message: &Message, _merged: bool) {}

    fn signal(&mut self, _signal: Signal) {}

    /// 擷取階段結束，附上該階段的 HTML
    fn capture_complete(&mut self, _stage: CaptureStage, _html: &str) {}

    fn practice(&mut self, _entry: &PracticeEntry) {}

    fn character_class(&mut self, _class: &str) {}
}

/// 丟棄所有事件
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl GameSink for NullSink {}

/// 記錄下來的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Vitals(CharVitals),
    Combat(bool),
    Weather(Weather),
    Fog(bool),
    Lighting(Lighting),
    RoomInfo(Value),
    RoomPlayers(Value),
    Line(String),
    Message { message: Message, merged: bool },
    Signal(Signal),
    CaptureComplete { stage: CaptureStage, html: String },
    Practice(PracticeEntry),
    CharacterClass(String),
}

/// 依序記錄所有事件，主要給測試使用
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有訊息事件（含合併）
    pub fn messages(&self) -> impl Iterator<Item = (&Message, bool)> {
        self.events.iter().filter_map(|event| match event {
            SinkEvent::Message { message, merged } => Some((message, *merged)),
            _ => None,
        })
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Signal(signal) => Some(*signal),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl GameSink for RecordingSink {
    fn vitals(&mut self, vitals: &CharVitals) {
        self.events.push(SinkEvent::Vitals(vitals.clone()));
    }

    fn combat(&mut self, in_combat: bool) {
        self.events.push(SinkEvent::Combat(in_combat));
    }

    fn weather(&mut self, weather: Weather) {
        self.events.push(SinkEvent::Weather(weather));
    }

    fn fog(&mut self, foggy: bool) {
        self.events.push(SinkEvent::Fog(foggy));
    }

    fn lighting(&mut self, lighting: Lighting) {
        self.events.push(SinkEvent::Lighting(lighting));
    }

    fn room_info(&mut self, info: &Value) {
        self.events.push(SinkEvent::RoomInfo(info.clone()));
    }

    fn room_players(&mut self, players: &Value) {
        self.events.push(SinkEvent::RoomPlayers(players.clone()));
    }

    fn line(&mut self, line: &str) {
        self.events.push(SinkEvent::Line(line.to_string()));
    }

    fn message(&mut self, message: &Message, merged: bool) {
        self.events.push(SinkEvent::Message {
            message: message.clone(),
            merged,
        });
    }

    fn signal(&mut self, signal: Signal) {
        self.events.push(SinkEvent::Signal(signal));
    }

    fn capture_complete(&mut self, stage: CaptureStage, html: &str) {
        self.events.push(SinkEvent::CaptureComplete {
            stage,
            html: html.to_string(),
        });
    }

    fn practice(&mut self, entry: &PracticeEntry) {
        self.events.push(SinkEvent::Practice(entry.clone()));
    }

    fn character_class(&mut self, class: &str) {
        self.events.push(SinkEvent::CharacterClass(class.to_string()));
    }
}
