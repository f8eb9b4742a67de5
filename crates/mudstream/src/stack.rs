//! 重複訊息合併
//!
//! 從敘述句取出堆疊鍵，並在合併時重新產生複數形式的句子，
//! 例如三次 "A black wolf has arrived from the east." 變成
//! "Three black wolves have arrived from the east."

use lazy_static::lazy_static;
use regex::{Captures, Regex};

const DIRECTION: &str =
    r"(?:northeast|northwest|southeast|southwest|north|south|east|west|up|down|above|below)";

lazy_static! {
    static ref ARRIVE: Regex = Regex::new(&format!(
        r"^(?P<subject>[A-Z][^,]*?) (?P<action>has arrived|arrives) from (?P<dir>(?:the )?{})(?P<punct>[.!]?)$",
        DIRECTION
    ))
    .unwrap();
    static ref LEAVE: Regex = Regex::new(&format!(
        r"^(?P<subject>[A-Z][^,]*?) (?P<action>leaves|has left) (?P<dir>(?:to the |the )?{})(?P<punct>[.!]?)$",
        DIRECTION
    ))
    .unwrap();
    static ref HERE: Regex = Regex::new(
        r"^(?P<subject>[A-Z][^,]*?) (?P<action>is(?: standing| resting| sleeping| sitting)?) here(?P<punct>[.!]?)$"
    )
    .unwrap();
    static ref GENERIC: Regex = Regex::new(
        r"^(?P<subject>(?:A|An|The|Some) [^,]+?) (?P<action>[a-z]+s) (?P<dir>.+?)(?P<punct>[.!]?)$"
    )
    .unwrap();
    static ref PRONOUN: Regex = Regex::new(r"(?i)\b(?:himself|herself|itself|his|her|its)\b").unwrap();
}

/// 堆疊句型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    Arrive,
    Leave,
    Here,
    Generic,
}

/// 堆疊鍵：(句型, 主詞, 動作, 方向/其餘)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackKey {
    pub kind: StackKind,
    pub subject: String,
    pub action: String,
    /// Arrive/Leave 為方向；Generic 為動詞之後的部分；Here 為空
    pub direction: String,
    punct: String,
}

impl StackKey {
    fn from_captures(kind: StackKind, caps: &Captures<'_>) -> Self {
        let get = |name: &str| caps.name(name).map(|m| m.as_str().to_string()).unwrap_or_default();
        Self {
            kind,
            subject: get("subject"),
            action: get("action"),
            direction: get("dir"),
            punct: get("punct"),
        }
    }

    /// 用於比對的識別字串
    pub fn id(&self) -> String {
        format!(
            "{:?}|{}|{}|{}",
            self.kind,
            self.subject.to_lowercase(),
            self.action.to_lowercase(),
            self.direction.to_lowercase()
        )
    }

    /// 產生合併 `count` 則後的句子
    pub fn render(&self, count: u32) -> String {
        let subject = pluralize_subject(&self.subject);
        let action = pluralize_action(&self.action);
        let body = match self.kind {
            StackKind::Arrive => format!("{} {} from {}", subject, action, self.direction),
            StackKind::Leave => format!("{} {} {}", subject, action, self.direction),
            StackKind::Here => format!("{} {} here", subject, action),
            StackKind::Generic => {
                format!("{} {} {}", subject, action, normalize_pronouns(&self.direction))
            }
        };
        format!("{} {}{}", capitalize(&cardinal(count)), body, self.punct)
    }
}

/// 依序嘗試四種句型，第一個成功者勝出
pub fn stack_key(text: &str) -> Option<StackKey> {
    let text = text.trim();
    [
        (StackKind::Arrive, &*ARRIVE),
        (StackKind::Leave, &*LEAVE),
        (StackKind::Here, &*HERE),
        (StackKind::Generic, &*GENERIC),
    ]
    .into_iter()
    .find_map(|(kind, re)| re.captures(text).map(|caps| StackKey::from_captures(kind, &caps)))
}

/// 英文基數詞；超過二十直接用數字
pub fn cardinal(n: u32) -> String {
    const WORDS: [&str; 21] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen", "twenty",
    ];
    WORDS
        .get(n as usize)
        .map(|w| w.to_string())
        .unwrap_or_else(|| n.to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// 名詞複數（含不規則變化）
pub fn pluralize_noun(word: &str) -> String {
    let lower = word.to_lowercase();
    let replace_tail = |tail: usize, with: &str| format!("{}{}", &word[..word.len() - tail], with);

    if lower == "human" {
        return format!("{}s", word);
    }
    if lower.ends_with("wolf") || lower.ends_with("elf") {
        return replace_tail(1, "ves");
    }
    if lower.ends_with("thief") {
        return replace_tail(1, "ves");
    }
    if lower.ends_with("man") {
        return replace_tail(3, "men");
    }
    if lower.ends_with("child") {
        return format!("{}ren", word);
    }
    let mut tail = lower.chars().rev();
    if let (Some('y'), Some(before)) = (tail.next(), tail.next()) {
        if !is_vowel(before) {
            return replace_tail(1, "ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| lower.ends_with(end)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// 第三人稱單數動詞轉複數
pub fn pluralize_verb(verb: &str) -> String {
    let lower = verb.to_lowercase();
    match lower.as_str() {
        "is" => return "are".to_string(),
        "has" => return "have".to_string(),
        "was" => return "were".to_string(),
        "does" => return "do".to_string(),
        "goes" => return "go".to_string(),
        _ => {}
    }
    if lower.ends_with("ss") {
        return verb.to_string();
    }
    if lower.len() > 4 && lower.ends_with("ies") {
        return format!("{}y", &verb[..verb.len() - 3]);
    }
    if ["sses", "ches", "shes", "xes", "zes"].iter().any(|end| lower.ends_with(end)) {
        return verb[..verb.len() - 2].to_string();
    }
    match verb.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => verb.to_string(),
    }
}

/// 主詞去掉冠詞後轉複數；有 "of" 的片語只變化中心名詞
fn pluralize_subject(subject: &str) -> String {
    let mut words: Vec<&str> = subject.split_whitespace().collect();
    if words
        .first()
        .is_some_and(|w| matches!(w.to_lowercase().as_str(), "a" | "an" | "the" | "some"))
    {
        words.remove(0);
    }
    let head = words
        .iter()
        .position(|w| w.eq_ignore_ascii_case("of"))
        .unwrap_or(words.len())
        .saturating_sub(1);
    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    if let Some(word) = out.get_mut(head) {
        *word = pluralize_noun(word);
    }
    out.join(" ")
}

/// 多字動作只變化第一個字（"has arrived" -> "have arrived"）
fn pluralize_action(action: &str) -> String {
    match action.split_once(' ') {
        Some((verb, rest)) => format!("{} {}", pluralize_verb(verb), rest),
        None => pluralize_verb(action),
    }
}

/// 代名詞改為複數
pub fn normalize_pronouns(text: &str) -> String {
    PRONOUN
        .replace_all(text, |caps: &Captures<'_>| {
            let word = &caps[0];
            let plural = if word.to_lowercase().ends_with("self") {
                "themselves"
            } else {
                "their"
            };
            if word.starts_with(char::is_uppercase) {
                capitalize(plural)
            } else {
                plural.to_string()
            }
        })
        .into_owned()
}
