//! 技能/法術清單解析
//!
//! 支援兩種表格：點狀引線（`name ..... value`）與至少兩個空白分隔的欄位。

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref DOTTED: Regex =
        Regex::new(r"^\s*(?P<name>[A-Za-z][A-Za-z0-9' /-]*?)\s*\.{2,}\s*(?P<value>\S.*?)\s*$").unwrap();
    static ref COLUMNS: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref PERCENT: Regex = Regex::new(r"^(\d{1,3})\s*%?$").unwrap();
}

/// 熟練度文字對應的分數
const PROFICIENCY: [(&str, u32); 9] = [
    ("awful", 15),
    ("bad", 25),
    ("poor", 35),
    ("average", 45),
    ("fair", 55),
    ("good", 65),
    ("very good", 75),
    ("excellent", 85),
    ("superb", 101),
];

/// 可辨識的職業名稱
pub const CLASSES: [&str; 10] = [
    "warrior", "ranger", "mage", "cleric", "thief", "barbarian", "paladin", "druid", "bard", "necromancer",
];

/// 一筆技能熟練度
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeEntry {
    pub name: String,
    pub score: u32,
    pub class: Option<String>,
}

/// 熟練度文字或百分比轉分數
pub fn proficiency_score(value: &str) -> Option<u32> {
    let value = value.trim().to_lowercase();
    if let Some(caps) = PERCENT.captures(&value) {
        return caps[1].parse().ok();
    }
    PROFICIENCY
        .iter()
        .find(|(word, _)| *word == value)
        .map(|&(_, score)| score)
}

fn class_token(token: &str) -> Option<String> {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
    CLASSES.contains(&token.as_str()).then_some(token)
}

/// 解析清單中的一行
pub fn parse_practice_line(line: &str) -> Option<PracticeEntry> {
    if let Some(caps) = DOTTED.captures(line) {
        let mut columns = COLUMNS.split(&caps["value"]);
        let score = proficiency_score(columns.next()?)?;
        return Some(PracticeEntry {
            name: caps["name"].trim().to_string(),
            score,
            class: columns.nth(1).and_then(class_token),
        });
    }

    let columns: Vec<&str> = COLUMNS.split(line.trim()).collect();
    if columns.len() < 2 || !columns[0].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let score = proficiency_score(columns[1])?;
    Some(PracticeEntry {
        name: columns[0].to_string(),
        score,
        class: columns.get(3).and_then(|c| class_token(c)),
    })
}

/// 從清單標題推斷職業（緊鄰 "skills"/"spells" 的職業名稱）
pub fn infer_class(line: &str) -> Option<String> {
    let tokens: Vec<String> = line
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();
    for (i, token) in tokens.iter().enumerate() {
        if token != "skills" && token != "spells" {
            continue;
        }
        let before = i.checked_sub(1).and_then(|j| tokens.get(j));
        let after = tokens[i + 1..]
            .iter()
            .find(|t| !matches!(t.as_str(), "of" | "a" | "an" | "the"));
        if let Some(class) = before.into_iter().chain(after).find_map(|t| class_token(t)) {
            return Some(class);
        }
    }
    None
}
