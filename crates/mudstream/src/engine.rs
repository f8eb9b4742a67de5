//! 連線引擎
//!
//! 每條連線一個 [`Engine`]，持有所有跨資料塊的狀態（協定狀態機、vitals 記憶、
//! 擷取階段、未完成的行），並把結果送往 [`GameSink`]。
//! 所有處理都是同步的：一次 [`Engine::receive`] 會把整塊資料處理完才回傳。

use bytes::{BufMut, Bytes};
use tracing::{debug, trace};

use crate::aggregator::{Aggregator, ClassifiedLine};
use crate::ansi::strip_ansi;
use crate::assembler::LineAssembler;
use crate::buffer::MessageHistory;
use crate::capture::{CaptureEngine, CaptureOutcome};
use crate::classify::{classify_line, detect_lighting, parse_vitals_sentence, prompt_lighting};
use crate::config::EngineConfig;
use crate::encoding::encode_command;
use crate::gmcp::vitals::{CharVitals, Lighting, VitalsMemory};
use crate::gmcp::{self, GmcpMessage};
use crate::message::MessageType;
use crate::sink::GameSink;
use crate::telnet::negotiator::Negotiator;
use crate::telnet::parser::ParserSession;
use crate::telnet::protocol::{gmcp_frame, terminal_type_frame};
use crate::telnet::subneg::{decode_subnegotiation, Subnegotiation};
use crate::trigger::TriggerSet;

/// 單一連線的處理引擎
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    parser: ParserSession,
    memory: VitalsMemory,
    vitals: CharVitals,
    capture: CaptureEngine,
    assembler: LineAssembler,
    aggregator: Aggregator,
    triggers: TriggerSet,
    lighting: Option<Lighting>,
    /// 距離上一行戰鬥訊息還剩幾行仍算戰鬥中
    combat_linger: usize,
    /// 本次連線是否收過 char.vitals；收過後不再從文字解析數值
    gmcp_vitals_seen: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let parser = ParserSession::new(Negotiator::new(&config));
        let aggregator = Aggregator::new(config.history_capacity);
        Self {
            config,
            parser,
            memory: VitalsMemory::default(),
            vitals: CharVitals::default(),
            capture: CaptureEngine::new(),
            assembler: LineAssembler::new(),
            aggregator,
            triggers: TriggerSet::default(),
            lighting: None,
            combat_linger: 0,
            gmcp_vitals_seen: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn vitals(&self) -> &CharVitals {
        &self.vitals
    }

    pub fn memory(&self) -> &VitalsMemory {
        &self.memory
    }

    pub fn capture(&self) -> &CaptureEngine {
        &self.capture
    }

    pub fn history(&self) -> &MessageHistory {
        self.aggregator.history()
    }

    pub fn lighting(&self) -> Option<Lighting> {
        self.lighting
    }

    pub fn gmcp_negotiated(&self) -> bool {
        self.parser.gmcp_negotiated()
    }

    pub fn triggers_mut(&mut self) -> &mut TriggerSet {
        &mut self.triggers
    }

    /// 結構化戰鬥旗標或最近幾行內出現過戰鬥訊息
    pub fn combat_active(&self) -> bool {
        self.memory.in_combat() || self.combat_linger > 0
    }

    /// (重新)連線時呼叫：丟棄所有協定與擷取狀態，訊息歷史保留
    pub fn reset(&mut self) {
        debug!("重置連線狀態");
        self.parser.reset();
        self.memory.clear();
        self.vitals = CharVitals::default();
        self.capture.reset();
        self.assembler.clear();
        self.lighting = None;
        self.combat_linger = 0;
        self.gmcp_vitals_seen = false;
    }

    /// 處理收到的一塊位元組，回傳需要送回伺服器的資料
    pub fn receive(&mut self, data: &[u8], sink: &mut dyn GameSink) -> Bytes {
        trace!("收到 {} bytes", data.len());
        let ingest = self.parser.feed(data);
        let mut replies = ingest.replies;

        for payload in &ingest.subnegotiations {
            match decode_subnegotiation(payload) {
                Some(Subnegotiation::TerminalTypeSend) => {
                    debug!("回報終端類型 {}", self.config.terminal_type);
                    replies.put_slice(&terminal_type_frame(&self.config.terminal_type));
                }
                Some(Subnegotiation::Gmcp(body)) => self.handle_gmcp(body, sink),
                None => {}
            }
        }

        if !ingest.text.is_empty() {
            for line in self.assembler.push(&ingest.text) {
                self.process_line(&line, sink);
            }
            self.process_remainder(sink);
        }

        replies.freeze()
    }

    /// 使用者送出命令：回顯、標記擷取等待，回傳要送出的位元組
    pub fn submit_command(&mut self, command: &str, sink: &mut dyn GameSink) -> Vec<u8> {
        self.capture.note_command(command);
        if !command.trim().is_empty() {
            let class = classify_line(command);
            if class.is_combat {
                self.combat_linger = self.config.combat_linger_lines;
            }
            let mut line = ClassifiedLine::plain(command, MessageType::User);
            line.is_combat = class.is_combat;
            line.is_comm = class.is_comm;
            self.push_message(line, sink);
        }
        encode_command(command)
    }

    /// 連線狀態、錯誤等非伺服器來源的訊息
    pub fn system_message(&mut self, text: &str, kind: MessageType, sink: &mut dyn GameSink) {
        self.push_message(ClassifiedLine::plain(text, kind), sink);
    }

    /// 保持連線用的 `Core.Ping`
    pub fn keepalive_frame(&self) -> Bytes {
        gmcp_frame("Core.Ping", None)
    }

    fn handle_gmcp(&mut self, body: &[u8], sink: &mut dyn GameSink) {
        match gmcp::decode(body, &self.config.vitals_keys) {
            Some(GmcpMessage::Vitals(delta)) => {
                self.gmcp_vitals_seen = true;
                let change = self.vitals.apply(&delta, &mut self.memory);
                if change.stats {
                    sink.vitals(&self.vitals);
                }
                sink.combat(change.in_combat);
                if let Some(weather) = change.weather {
                    sink.weather(weather);
                }
                if let Some(foggy) = change.fog {
                    sink.fog(foggy);
                }
                if let Some(light) = change.light {
                    self.update_lighting(detect_lighting(&light), sink);
                }
            }
            Some(GmcpMessage::RoomInfo(info)) => sink.room_info(&info),
            Some(GmcpMessage::RoomPlayers(players)) => sink.room_players(&players),
            None => {}
        }
    }

    fn update_lighting(&mut self, lighting: Option<Lighting>, sink: &mut dyn GameSink) {
        if let Some(lighting) = lighting {
            if self.lighting != Some(lighting) {
                debug!("光線變為 {:?}", lighting);
                self.lighting = Some(lighting);
                self.vitals.light = Some(lighting);
                sink.lighting(lighting);
            }
        }
    }

    fn process_line(&mut self, line: &str, sink: &mut dyn GameSink) {
        sink.line(line);
        let raw = line.trim_end_matches('\n');
        let text = strip_ansi(raw);

        for signal in self.triggers.scan(&text) {
            sink.signal(signal);
        }
        self.update_lighting(prompt_lighting(&text), sink);

        if !self.gmcp_vitals_seen {
            if let Some(delta) = parse_vitals_sentence(&text) {
                self.vitals.apply_stats(&delta);
                sink.vitals(&self.vitals);
            }
        }

        let outcome = self.capture.process_line(raw);
        self.publish_capture(&outcome, sink);

        if text.trim().is_empty() || outcome.consumed {
            return;
        }

        let class = classify_line(&text);
        let dimmed_in_combat = !class.is_combat && !class.is_comm && self.combat_active();
        if class.is_combat {
            self.combat_linger = self.config.combat_linger_lines;
        } else {
            self.combat_linger = self.combat_linger.saturating_sub(1);
        }

        self.push_message(
            ClassifiedLine {
                raw: raw.to_string(),
                text,
                kind: MessageType::Game,
                is_combat: class.is_combat,
                is_comm: class.is_comm,
                dimmed_in_combat,
            },
            sink,
        );
    }

    /// 沒有換行結尾的提示字元只用來判斷光線；擷取要等整行完成才結束
    fn process_remainder(&mut self, sink: &mut dyn GameSink) {
        let prompt = strip_ansi(self.assembler.remainder());
        self.update_lighting(prompt_lighting(&prompt), sink);
    }

    fn publish_capture(&self, outcome: &CaptureOutcome, sink: &mut dyn GameSink) {
        if let Some(class) = &outcome.class {
            sink.character_class(class);
        }
        if let Some(entry) = &outcome.practice {
            sink.practice(entry);
        }
        if let Some(stage) = outcome.exited {
            sink.capture_complete(stage, &self.capture.html(stage));
        }
    }

    fn push_message(&mut self, line: ClassifiedLine, sink: &mut dyn GameSink) {
        let merged = self.aggregator.push(line);
        if let Some(message) = self.aggregator.last() {
            sink.message(message, merged);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureStage;
    use crate::gmcp::vitals::Weather;
    use crate::sink::{RecordingSink, SinkEvent};
    use crate::telnet::protocol::IAC;
    use crate::trigger::Signal;

    fn lighting_events(sink: &RecordingSink) -> Vec<Lighting> {
        sink.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Lighting(lighting) => Some(*lighting),
                _ => None,
            })
            .collect()
    }

    fn gmcp(text: &str) -> Vec<u8> {
        let mut bytes = vec![IAC, 250, 201];
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(&[IAC, 240]);
        bytes
    }

    #[test]
    fn test_combat_line_dims_following_plain_line() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"An orc hits you.\r\nYou see a small house.\r\n", &mut sink);

        let messages: Vec<_> = engine.history().iter().collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_combat);
        assert!(!messages[0].dimmed_in_combat);
        assert!(!messages[1].is_combat);
        assert!(messages[1].dimmed_in_combat);
        assert_eq!(sink.signals(), vec![Signal::HitFlash]);
    }

    #[test]
    fn test_combat_linger_expires() {
        let mut config = EngineConfig::default();
        config.combat_linger_lines = 1;
        let mut engine = Engine::new(config);
        let mut sink = RecordingSink::new();
        engine.receive(b"An orc hits you.\nThe sky is grey.\nThe wind blows.\n", &mut sink);
        let dimmed: Vec<_> = engine.history().iter().map(|m| m.dimmed_in_combat).collect();
        assert_eq!(dimmed, vec![false, true, false]);
    }

    #[test]
    fn test_comm_line_not_dimmed() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"An orc hits you.\nGandalf says 'run!'\n", &mut sink);
        let last = engine.history().last().unwrap();
        assert!(last.is_comm);
        assert!(!last.dimmed_in_combat);
    }

    #[test]
    fn test_wolves_stack_across_chunks() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"A black wolf has arrived from the east.\r\nA black wolf has ar", &mut sink);
        engine.receive(b"rived from the east.\r\nA black wolf has arrived from the east.\r\n", &mut sink);

        assert_eq!(engine.history().len(), 1);
        let message = engine.history().last().unwrap();
        assert_eq!(message.text, "Three black wolves have arrived from the east.");
        assert_eq!(message.stack_count, 3);
        let merged: Vec<_> = sink.messages().map(|(_, merged)| merged).collect();
        assert_eq!(merged, vec![false, true, true]);
    }

    #[test]
    fn test_inventory_capture_published() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"You are carrying:\r\n  a rusty sword\r\n*: tell someone >\r\n", &mut sink);

        let html = engine.capture().html(CaptureStage::Inventory);
        assert_eq!(html.matches("class=\"item\"").count(), 1);
        assert!(html.contains("data-noun=\"sword\""));
        assert_eq!(engine.capture().fragment_count(CaptureStage::Equipment), 0);
        assert_eq!(engine.capture().fragment_count(CaptureStage::Stat), 0);
        assert!(sink.events.iter().any(|event| matches!(
            event,
            SinkEvent::CaptureComplete { stage: CaptureStage::Inventory, .. }
        )));
    }

    #[test]
    fn test_waiting_command_consumes_listing() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        let bytes = engine.submit_command("inv", &mut sink);
        assert_eq!(bytes, b"inv\r\n");
        engine.receive(b"You are carrying:\r\na torch\r\n", &mut sink);
        engine.receive(b"* >", &mut sink);

        let texts: Vec<_> = engine.history().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["inv"]);
        assert_eq!(engine.history().last().unwrap().kind, MessageType::User);
        // 提示字元還沒收完整
        assert_eq!(engine.capture().stage(), CaptureStage::Inventory);

        engine.receive(b"\r\n", &mut sink);
        assert_eq!(engine.capture().stage(), CaptureStage::None);
        assert_eq!(engine.capture().is_waiting(), (false, false));
    }

    #[test]
    fn test_dark_prompt_ends_listing() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.submit_command("inv", &mut sink);
        engine.receive(b"You are carrying:\r\na torch\r\no W>", &mut sink);
        assert_eq!(engine.lighting(), Some(Lighting::Dark));
        engine.receive(b"\r\nA goblin arrives from the north.\r\n", &mut sink);

        let texts: Vec<_> = engine.history().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["inv", "o W>", "A goblin arrives from the north."]);
        assert_eq!(engine.capture().stage(), CaptureStage::None);
        assert_eq!(engine.capture().is_waiting(), (false, false));
    }

    #[test]
    fn test_partial_equipment_line_keeps_stage() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"You are using:\r\n<worn on head>", &mut sink);
        engine.receive(b"      a leather cap\r\n<wielded>   a dagger\r\n", &mut sink);

        assert_eq!(engine.capture().stage(), CaptureStage::Equipment);
        assert_eq!(engine.capture().fragment_count(CaptureStage::Equipment), 3);
        assert!(engine.capture().html(CaptureStage::Equipment).contains("data-noun=\"cap\""));
        assert!(!sink
            .events
            .iter()
            .any(|event| matches!(event, SinkEvent::CaptureComplete { .. })));
    }

    #[test]
    fn test_narration_fragment_keeps_lighting() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"black", &mut sink);
        engine.receive(b" smoke rises.\r\n", &mut sink);
        assert_eq!(engine.lighting(), None);
        assert!(lighting_events(&sink).is_empty());

        engine.receive(&gmcp(r#"Char.Vitals {"light": "black"}"#), &mut sink);
        assert_eq!(engine.lighting(), Some(Lighting::Dark));
    }

    /// 各種切法下都要看到的結果
    #[derive(Debug, PartialEq)]
    struct Observed {
        texts: Vec<String>,
        equipment: String,
        completed: Vec<CaptureStage>,
        lighting: Vec<Lighting>,
    }

    const SESSION: &[u8] = b"You are using:\r\n<worn on head>      a leather cap\r\n<wielded>   a dagger\r\n* W>\r\nA black wolf has arrived from the east.\r\nA black wolf has arrived from the east.\r\nblack smoke rises.\r\no W>";

    fn observe(chunks: &[&[u8]]) -> Observed {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        for chunk in chunks {
            engine.receive(chunk, &mut sink);
        }
        Observed {
            texts: engine.history().iter().map(|m| m.text.clone()).collect(),
            equipment: engine.capture().html(CaptureStage::Equipment),
            completed: sink
                .events
                .iter()
                .filter_map(|event| match event {
                    SinkEvent::CaptureComplete { stage, .. } => Some(*stage),
                    _ => None,
                })
                .collect(),
            lighting: lighting_events(&sink),
        }
    }

    #[test]
    fn test_every_split_matches_single_chunk() {
        let expected = observe(&[SESSION]);
        assert_eq!(expected.completed, vec![CaptureStage::Equipment]);
        assert_eq!(expected.lighting, vec![Lighting::Sun, Lighting::Dark]);
        assert_eq!(expected.texts.len(), 6);

        for i in 0..=SESSION.len() {
            let (head, tail) = SESSION.split_at(i);
            assert_eq!(observe(&[head, tail]), expected, "split at {}", i);
        }

        let bytes: Vec<&[u8]> = SESSION.chunks(1).collect();
        assert_eq!(observe(&bytes), expected);
    }

    #[test]
    fn test_terminal_type_request() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        let replies = engine.receive(&[IAC, 250, 24, 1, IAC, 240], &mut sink);
        let mut expected = vec![IAC, 250, 24, 0];
        expected.extend_from_slice(b"MUDSTREAM");
        expected.extend_from_slice(&[IAC, 240]);
        assert_eq!(&replies[..], &expected[..]);
    }

    #[test]
    fn test_gmcp_vitals_and_fallback_suppression() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();

        engine.receive(b"You have 45/60 hits, 10/20 mana, and 80/90 moves.\n", &mut sink);
        assert_eq!(engine.vitals().hp, Some(45));

        engine.receive(&gmcp(r#"Char.Vitals {"hp": 5, "opponent": "orc", "weather": "*"}"#), &mut sink);
        assert_eq!(engine.vitals().hp, Some(5));
        assert!(engine.combat_active());
        assert!(sink.events.contains(&SinkEvent::Combat(true)));
        assert!(sink.events.contains(&SinkEvent::Weather(Weather::HeavyRain)));

        engine.receive(b"You have 45/60 hits, 10/20 mana, and 80/90 moves.\n", &mut sink);
        assert_eq!(engine.vitals().hp, Some(5));
        assert_eq!(engine.memory().opponent.as_deref(), Some("orc"));
    }

    #[test]
    fn test_broken_gmcp_is_ignored() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(&gmcp("Char.Vitals {\"hp\": "), &mut sink);
        engine.receive(b"still here\n", &mut sink);
        assert_eq!(engine.vitals().hp, None);
        assert_eq!(engine.history().last().unwrap().text, "still here");
    }

    #[test]
    fn test_room_payloads_forwarded() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(&gmcp(r#"Room.Info {"num": 42}"#), &mut sink);
        engine.receive(&gmcp(r#"room.players [{"name": "Bob"}]"#), &mut sink);
        assert!(matches!(&sink.events[0], SinkEvent::RoomInfo(v) if v["num"] == 42));
        assert!(matches!(&sink.events[1], SinkEvent::RoomPlayers(v) if v[0]["name"] == "Bob"));
    }

    #[test]
    fn test_prompt_lighting_reported_on_change() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"\x1b[33m*\x1b[0m W>", &mut sink);
        engine.receive(b"\n* W>", &mut sink);
        engine.receive(b"\no W>", &mut sink);
        assert_eq!(lighting_events(&sink), vec![Lighting::Sun, Lighting::Dark]);
        assert_eq!(engine.lighting(), Some(Lighting::Dark));
    }

    #[test]
    fn test_practice_events() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"You have the following mage spells:\n  magic missile ...... good\n>\n", &mut sink);
        assert!(sink.events.contains(&SinkEvent::CharacterClass("mage".into())));
        assert!(sink
            .events
            .iter()
            .any(|event| matches!(event, SinkEvent::Practice(entry) if entry.score == 65)));
    }

    #[test]
    fn test_raw_lines_forwarded() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(b"one\r\n\r\ntwo", &mut sink);
        let lines: Vec<_> = sink
            .events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Line(line) => Some(line.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["one\n", "\n"]);
        // 空行不進歷史
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_reset_discards_session_state() {
        let mut engine = Engine::default();
        let mut sink = RecordingSink::new();
        engine.receive(&gmcp(r#"Char.Vitals {"opponent": "orc"}"#), &mut sink);
        engine.receive(b"You are carrying:\npartial", &mut sink);
        engine.system_message("Disconnected", MessageType::System, &mut sink);

        engine.reset();
        assert!(!engine.combat_active());
        assert_eq!(engine.memory(), &VitalsMemory::default());
        assert_eq!(engine.capture().stage(), CaptureStage::None);
        assert!(!engine.gmcp_negotiated());

        engine.receive(b" line\n", &mut sink);
        assert_eq!(engine.history().last().unwrap().text, " line");
        assert_eq!(engine.history().len(), 3);
    }

    #[test]
    fn test_keepalive_frame() {
        let engine = Engine::default();
        let mut expected = vec![IAC, 250, 201];
        expected.extend_from_slice(b"Core.Ping");
        expected.extend_from_slice(&[IAC, 240]);
        assert_eq!(&engine.keepalive_frame()[..], &expected[..]);
    }
}
