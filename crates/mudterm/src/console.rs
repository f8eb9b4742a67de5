//! 終端輸出
//!
//! 把引擎事件印到標準輸出。合併的訊息會重新印出一次並附上次數。

use std::io::{self, Write};

use mudstream::capture::CaptureStage;
use mudstream::gmcp::vitals::{CharVitals, Lighting, Weather};
use mudstream::{GameSink, Message, MessageType, Signal};
use tracing::info;

const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// 一則訊息在終端上的樣子
pub fn render_message(message: &Message, merged: bool) -> String {
    let color = match message.kind {
        MessageType::Error => Some(RED),
        MessageType::System => Some(YELLOW),
        MessageType::User => Some(CYAN),
        MessageType::Game if message.dimmed_in_combat => Some(DIM),
        MessageType::Game => None,
    };
    let mut text = match color {
        Some(color) => format!("{}{}{}", color, message.text, RESET),
        None => message.text.clone(),
    };
    if merged {
        text.push_str(&format!(" (x{})", message.stack_count));
    }
    text
}

fn vitals_summary(vitals: &CharVitals) -> String {
    let pair = |cur: Option<i64>, max: Option<i64>| match (cur, max) {
        (Some(cur), Some(max)) => format!("{}/{}", cur, max),
        (Some(cur), None) => cur.to_string(),
        _ => "?".to_string(),
    };
    format!(
        "HP {}  MANA {}  MV {}",
        pair(vitals.hp, vitals.max_hp),
        pair(vitals.mana, vitals.max_mana),
        pair(vitals.moves, vitals.max_moves)
    )
}

/// 印到標準輸出的接收端
#[derive(Debug, Default)]
pub struct ConsoleSink {
    in_combat: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameSink for ConsoleSink {
    fn vitals(&mut self, vitals: &CharVitals) {
        info!("{}", vitals_summary(vitals));
    }

    fn combat(&mut self, in_combat: bool) {
        if in_combat != self.in_combat {
            self.in_combat = in_combat;
            info!("戰鬥狀態: {}", if in_combat { "戰鬥中" } else { "脫離戰鬥" });
        }
    }

    fn weather(&mut self, weather: Weather) {
        info!("天氣: {:?}", weather);
    }

    fn fog(&mut self, foggy: bool) {
        info!("霧: {}", foggy);
    }

    fn lighting(&mut self, lighting: Lighting) {
        info!("光線: {:?}", lighting);
    }

    fn message(&mut self, message: &Message, merged: bool) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", render_message(message, merged));
    }

    fn signal(&mut self, signal: Signal) {
        info!("訊號: {:?}", signal);
    }

    fn capture_complete(&mut self, stage: CaptureStage, html: &str) {
        info!("擷取完成 {:?}: {} 行", stage, html.split("<br>").count());
    }

    fn character_class(&mut self, class: &str) {
        info!("職業: {}", class);
    }
}
