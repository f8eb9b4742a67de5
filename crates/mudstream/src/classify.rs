//! 文字行分類
//!
//! 全部都是對單行文字的純函式，不依賴任何可變狀態。
//! 這些規則本質上是近似判斷，只保證能辨識已知的句型。

use lazy_static::lazy_static;
use regex::Regex;

use crate::gmcp::vitals::{Lighting, VitalsDelta};

lazy_static! {
    static ref PROMPT: Regex = Regex::new(r"^(?:(?:[^A-Za-z0-9\s]|o\b).*[>:]|>)$").unwrap();
    static ref COMBAT_VERBS: Regex = Regex::new(
        r"(?i)\b(?:hit|hits|miss|misses|wound|wounds|slay|slays|kill|kills|pierce|pierces|slash|slashes|crush|crushes|pound|pounds|cleave|cleaves|stab|stabs|smite|smites|maul|mauls|bash|bashes|bite|bites|sting|stings|claw|claws|whip|whips|strike|strikes|scratch|scratches|massacre|massacres|obliterate|obliterates)\b"
    )
    .unwrap();
    static ref COMBAT_SELF: Regex = Regex::new(
        r"(?i)\b(?:you dodge|you parry|you block|your opponent|you flee|you try to flee|you are fighting|you attack|you join the fight|you panic)\b"
    )
    .unwrap();
    static ref COMBAT_ECHO: Regex =
        Regex::new(r"(?i)^(?:k|kill|f|flee|bash|kick|bs|backstab|rescue|murder|assist)(?:\s+\S+)?$").unwrap();
    static ref COMM: Regex = Regex::new(
        r"(?i)(?:\byou (?:say|tell|whisper|yell|narrate|state)\b|\b\w+ (?:says|tells|whispers|yells|narrates|states)\b)"
    )
    .unwrap();
    static ref VITALS_SENTENCE: Regex = Regex::new(
        r"(?i)(\d+)/(\d+) hits?,\s*(\d+)/(\d+) mana,?\s*and\s+(\d+)/(\d+) moves?"
    )
    .unwrap();
}

/// 提示字元的最大長度
const PROMPT_MAX_LEN: usize = 60;

/// 是否像提示字元：以符號（或暗處的 `o`）開頭、以 `>` 或 `:` 結尾的短字串
pub fn is_prompt_like(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().count() < PROMPT_MAX_LEN && PROMPT.is_match(trimmed)
}

/// 單行分類結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineClass {
    pub is_combat: bool,
    pub is_comm: bool,
}

pub fn is_comm(line: &str) -> bool {
    COMM.is_match(line)
}

pub fn is_combat(line: &str) -> bool {
    let trimmed = line.trim();
    COMBAT_VERBS.is_match(trimmed) || COMBAT_SELF.is_match(trimmed) || COMBAT_ECHO.is_match(trimmed)
}

/// 對話優先：有人「說」要殺誰不算戰鬥訊息
pub fn classify_line(line: &str) -> LineClass {
    let is_comm = is_comm(line);
    LineClass {
        is_comm,
        is_combat: !is_comm && is_combat(line),
    }
}

fn lighting_from_symbol(c: char) -> Option<Lighting> {
    match c {
        '*' => Some(Lighting::Sun),
        ')' => Some(Lighting::Moon),
        '!' => Some(Lighting::Artificial),
        'o' => Some(Lighting::Dark),
        _ => None,
    }
}

fn lighting_from_keyword(word: &str) -> Option<Lighting> {
    match word {
        "sun" | "sunny" | "day" | "daylight" | "bright" => Some(Lighting::Sun),
        "moon" | "moonlight" | "night" => Some(Lighting::Moon),
        "artificial" | "torch" | "lamp" | "lantern" | "lit" => Some(Lighting::Artificial),
        "dark" | "darkness" | "black" => Some(Lighting::Dark),
        _ => None,
    }
}

/// 從 GMCP light 值判斷光線
///
/// 符號只在單一記號或 `>` 結尾的字串開頭才算數；關鍵字只接受單一個字。
pub fn detect_lighting(text: &str) -> Option<Lighting> {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let single_token = !trimmed.contains(char::is_whitespace);

    let symbol_position = match chars.next() {
        None => true,
        Some(second) => !second.is_alphanumeric() && (single_token || trimmed.ends_with('>')),
    };
    if symbol_position {
        if let Some(lighting) = lighting_from_symbol(first) {
            return Some(lighting);
        }
    }

    if single_token {
        return lighting_from_keyword(&trimmed.to_ascii_lowercase());
    }
    None
}

/// 提示字元開頭的光線符號
///
/// 只看像提示字元的文字，也不比對關鍵字，敘述句的片段不會改變光線。
pub fn prompt_lighting(line: &str) -> Option<Lighting> {
    if !is_prompt_like(line) {
        return None;
    }
    let mut chars = line.trim().chars();
    let first = chars.next()?;
    match chars.next() {
        Some(second) if second.is_alphanumeric() => None,
        _ => lighting_from_symbol(first),
    }
}

/// 沒有 GMCP 時，從 "X/Y hits, A/B mana, and C/D moves" 句子取得數值
pub fn parse_vitals_sentence(line: &str) -> Option<VitalsDelta> {
    let caps = VITALS_SENTENCE.captures(line)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i64>().ok());
    Some(VitalsDelta {
        hp: num(1),
        max_hp: num(2),
        mana: num(3),
        max_mana: num(4),
        moves: num(5),
        max_moves: num(6),
        ..Default::default()
    })
}
