//! 畫面擷取狀態機
//!
//! 伺服器的 stat / equipment / inventory / practice 輸出是一整塊表格，
//! 進入某個階段後，後續每一行都累積成該階段的 HTML，直到出現提示字元為止。

pub mod items;
pub mod practice;

use tracing::debug;

use self::items::{dimmed_fragment, item_fragment};
use self::practice::{infer_class, parse_practice_line, PracticeEntry};
use crate::ansi::{ansi_to_html, escape_html, strip_ansi};
use crate::classify::is_prompt_like;

/// 擷取階段；同一時間只會有一個
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CaptureStage {
    #[default]
    None,
    Stat,
    Equipment,
    Inventory,
    Practice,
}

impl CaptureStage {
    /// 進入此階段的標記字串（小寫）
    fn markers(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Stat => &["ob:", "armor:", "mood:", "str:", "exp:", "level:"],
            Self::Equipment => &["you are using:"],
            Self::Inventory => &["you are carrying:"],
            Self::Practice => &[
                "you have the following",
                "you can practice the following",
                "practice sessions left",
                "skill / spell     knowledge",
            ],
        }
    }

    fn matches(self, lower: &str) -> bool {
        self.markers().iter().any(|m| lower.contains(m))
    }
}

/// 依行內容判斷要進入哪個階段
pub fn detect_stage(lower: &str) -> Option<CaptureStage> {
    [
        CaptureStage::Equipment,
        CaptureStage::Inventory,
        CaptureStage::Practice,
        CaptureStage::Stat,
    ]
    .into_iter()
    .find(|stage| stage.matches(lower))
}

/// 處理一行後的結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureOutcome {
    /// 這一行讓狀態機進入的新階段
    pub entered: Option<CaptureStage>,
    /// 這一行結束的階段
    pub exited: Option<CaptureStage>,
    /// 這一行被累積到擷取緩衝
    pub captured: bool,
    /// 使用者正在等這份清單，這一行不必再進訊息歷史
    pub consumed: bool,
    /// 進入 practice 時推斷出的職業
    pub class: Option<String>,
    /// 解析出的技能熟練度
    pub practice: Option<PracticeEntry>,
}

/// 擷取狀態與各階段的累積片段
#[derive(Debug, Clone, Default)]
pub struct CaptureEngine {
    stage: CaptureStage,
    stat: Vec<String>,
    equipment: Vec<String>,
    inventory: Vec<String>,
    practice: Vec<String>,
    practice_entries: Vec<PracticeEntry>,
    waiting_stat: bool,
    waiting_equipment: bool,
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> CaptureStage {
        self.stage
    }

    pub fn is_waiting(&self) -> (bool, bool) {
        (self.waiting_stat, self.waiting_equipment)
    }

    /// 使用者送出命令時呼叫；若是查詢清單的命令就標記等待中
    pub fn note_command(&mut self, command: &str) {
        let word = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match word.as_str() {
            "stat" | "score" | "info" => self.waiting_stat = true,
            "eq" | "equipment" | "i" | "inv" | "inventory" => self.waiting_equipment = true,
            _ => {}
        }
    }

    fn fragments(&self, stage: CaptureStage) -> &[String] {
        match stage {
            CaptureStage::None => &[],
            CaptureStage::Stat => &self.stat,
            CaptureStage::Equipment => &self.equipment,
            CaptureStage::Inventory => &self.inventory,
            CaptureStage::Practice => &self.practice,
        }
    }

    fn fragments_mut(&mut self, stage: CaptureStage) -> Option<&mut Vec<String>> {
        match stage {
            CaptureStage::None => None,
            CaptureStage::Stat => Some(&mut self.stat),
            CaptureStage::Equipment => Some(&mut self.equipment),
            CaptureStage::Inventory => Some(&mut self.inventory),
            CaptureStage::Practice => Some(&mut self.practice),
        }
    }

    /// 某階段目前累積的片段數
    pub fn fragment_count(&self, stage: CaptureStage) -> usize {
        self.fragments(stage).len()
    }

    /// 某階段的 HTML，片段以 `<br>` 連接
    pub fn html(&self, stage: CaptureStage) -> String {
        self.fragments(stage).join("<br>")
    }

    pub fn practice_entries(&self) -> &[PracticeEntry] {
        &self.practice_entries
    }

    /// 處理一行完整文字（可含顏色碼，不含換行）
    pub fn process_line(&mut self, line: &str) -> CaptureOutcome {
        let plain = strip_ansi(line);
        let lower = plain.to_lowercase();
        let mut outcome = CaptureOutcome::default();

        if let Some(stage) = detect_stage(&lower) {
            if stage != self.stage {
                self.enter(stage);
                outcome.entered = Some(stage);
                if stage == CaptureStage::Practice {
                    outcome.class = infer_class(&plain);
                }
            }
        }

        if self.stage != CaptureStage::None && is_prompt_like(&plain) && !self.stage.matches(&lower) {
            outcome.exited = Some(self.exit());
            return outcome;
        }

        let stage = self.stage;
        let fragment = match stage {
            CaptureStage::None => return outcome,
            CaptureStage::Stat => ansi_to_html(line),
            CaptureStage::Equipment | CaptureStage::Inventory => item_fragment(&plain),
            CaptureStage::Practice => match parse_practice_line(&plain) {
                Some(entry) => {
                    let fragment = format!(
                        "<span class=\"skill\" data-score=\"{}\">{}</span> {}%",
                        entry.score,
                        escape_html(&entry.name),
                        entry.score
                    );
                    self.practice_entries.push(entry.clone());
                    outcome.practice = Some(entry);
                    fragment
                }
                None => dimmed_fragment(&plain),
            },
        };
        if let Some(buffer) = self.fragments_mut(stage) {
            buffer.push(fragment);
        }
        outcome.captured = true;
        outcome.consumed = match stage {
            CaptureStage::Stat => self.waiting_stat,
            CaptureStage::Equipment | CaptureStage::Inventory => self.waiting_equipment,
            _ => false,
        };
        outcome
    }

    fn enter(&mut self, stage: CaptureStage) {
        debug!("進入擷取階段 {:?}", stage);
        if stage == CaptureStage::Practice {
            self.practice_entries.clear();
        }
        if let Some(buffer) = self.fragments_mut(stage) {
            buffer.clear();
        }
        self.stage = stage;
    }

    fn exit(&mut self) -> CaptureStage {
        let stage = std::mem::take(&mut self.stage);
        debug!("結束擷取階段 {:?}", stage);
        self.waiting_stat = false;
        self.waiting_equipment = false;
        stage
    }

    /// 重新連線時清空
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_capture_until_prompt() {
        let mut engine = CaptureEngine::new();
        let first = engine.process_line("You are carrying:");
        assert_eq!(first.entered, Some(CaptureStage::Inventory));
        assert!(first.captured);
        engine.process_line("  a rusty sword");
        let last = engine.process_line("*: tell someone >");
        assert_eq!(last.exited, Some(CaptureStage::Inventory));
        assert!(!last.captured);

        assert_eq!(engine.stage(), CaptureStage::None);
        let html = engine.html(CaptureStage::Inventory);
        assert_eq!(html.matches("class=\"item\"").count(), 1);
        assert!(html.contains("data-noun=\"sword\""));
        assert_eq!(engine.fragment_count(CaptureStage::Equipment), 0);
        assert_eq!(engine.fragment_count(CaptureStage::Stat), 0);
    }

    #[test]
    fn test_stat_lines_rendered_with_breaks() {
        let mut engine = CaptureEngine::new();
        engine.process_line("Str: 18  Int: 12");
        engine.process_line("OB: 60%, DB: 20%");
        engine.process_line("Mood: wimpy");
        assert_eq!(engine.stage(), CaptureStage::Stat);
        assert_eq!(
            engine.html(CaptureStage::Stat),
            "Str: 18  Int: 12<br>OB: 60%, DB: 20%<br>Mood: wimpy"
        );
    }

    #[test]
    fn test_prompt_with_marker_does_not_exit() {
        let mut engine = CaptureEngine::new();
        engine.process_line("Level: 12");
        let outcome = engine.process_line("* Level: 12 >");
        assert_eq!(outcome.exited, None);
        assert_eq!(engine.stage(), CaptureStage::Stat);
    }

    #[test]
    fn test_switching_stage_resets_target_buffer() {
        let mut engine = CaptureEngine::new();
        engine.process_line("You are using:");
        engine.process_line("<wielded>  a dagger");
        engine.process_line(">");
        engine.process_line("You are using:");
        engine.process_line("<worn on body>  a cloak");
        assert_eq!(engine.fragment_count(CaptureStage::Equipment), 2);
        assert!(engine.html(CaptureStage::Equipment).contains("data-noun=\"cloak\""));
        assert!(!engine.html(CaptureStage::Equipment).contains("dagger"));
    }

    #[test]
    fn test_practice_entries_and_class() {
        let mut engine = CaptureEngine::new();
        let outcome = engine.process_line("You have the following warrior skills:");
        assert_eq!(outcome.class.as_deref(), Some("warrior"));
        let outcome = engine.process_line("  kick ........ good");
        assert_eq!(outcome.practice.as_ref().map(|e| e.score), Some(65));
        engine.process_line("  bash ........ superb");
        engine.process_line(">");
        assert_eq!(engine.practice_entries().len(), 2);
        assert!(engine.html(CaptureStage::Practice).contains("65%"));
    }

    #[test]
    fn test_waiting_flag_consumes_and_clears() {
        let mut engine = CaptureEngine::new();
        engine.note_command("inv");
        assert_eq!(engine.is_waiting(), (false, true));
        assert!(engine.process_line("You are carrying:").consumed);
        assert!(engine.process_line("a torch").consumed);
        engine.process_line("> ");
        assert_eq!(engine.is_waiting(), (false, false));
        assert!(!engine.process_line("You are carrying:").consumed);
    }

    #[test]
    fn test_dark_prompt_exits() {
        let mut engine = CaptureEngine::new();
        engine.note_command("inv");
        engine.process_line("You are carrying:");
        engine.process_line("a torch");
        let outcome = engine.process_line("o W>");
        assert_eq!(outcome.exited, Some(CaptureStage::Inventory));
        assert!(!outcome.consumed);
        assert_eq!(engine.is_waiting(), (false, false));
        assert!(!engine.process_line("A goblin arrives from the north.").consumed);
    }

    #[test]
    fn test_colored_prompt_exits() {
        let mut engine = CaptureEngine::new();
        engine.process_line("You are carrying:");
        let outcome = engine.process_line("\x1b[32m*\x1b[0m W>");
        assert_eq!(outcome.exited, Some(CaptureStage::Inventory));
        assert_eq!(engine.fragment_count(CaptureStage::Inventory), 1);
    }

    #[test]
    fn test_plain_lines_ignored_without_stage() {
        let mut engine = CaptureEngine::new();
        let outcome = engine.process_line("A black wolf has arrived from the east.");
        assert_eq!(outcome, CaptureOutcome::default());
    }
}
