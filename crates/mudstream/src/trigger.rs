//! Trigger（觸發器）模組
//!
//! 偵測特定句子並發出副作用訊號（移動受阻、房間無法繪製、受傷閃爍、死亡）。
//! 與戰鬥/對話分類無關，每一行都會檢查。

use regex::Regex;

/// 觸發器發出的訊號
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// 移動失敗（門關著、太累、會溺水……）
    MovementBlocked,
    /// 太暗，房間無法繪製
    RoomUnmapped,
    /// 受到傷害，短暫閃爍
    HitFlash,
    /// 死亡，啟動分段死亡動畫
    Death,
}

/// 觸發器匹配模式
#[derive(Debug, Clone)]
pub enum TriggerPattern {
    /// 純文字匹配（包含，不分大小寫）
    Contains(String),
    /// 正則表達式
    Regex(String),
}

/// 觸發器定義
#[derive(Debug, Clone)]
pub struct Trigger {
    /// 觸發器名稱
    pub name: String,
    /// 匹配模式
    pub pattern: TriggerPattern,
    /// 匹配時發出的訊號
    pub signal: Signal,
    /// 是否啟用
    pub enabled: bool,
    /// 編譯後的正則（內部使用）
    compiled_regex: Option<Regex>,
}

impl Trigger {
    /// 創建新的觸發器；`Contains` 的比對字串一律轉小寫
    pub fn new(name: impl Into<String>, pattern: TriggerPattern, signal: Signal) -> Self {
        let (pattern, compiled) = match pattern {
            TriggerPattern::Contains(s) => (TriggerPattern::Contains(s.to_lowercase()), None),
            TriggerPattern::Regex(re) => {
                let compiled = Regex::new(&re).ok();
                (TriggerPattern::Regex(re), compiled)
            }
        };
        Self {
            name: name.into(),
            pattern,
            signal,
            enabled: true,
            compiled_regex: compiled,
        }
    }

    /// `lower` 為已轉小寫的同一行，避免每個觸發器重複轉換
    fn matches(&self, line: &str, lower: &str) -> bool {
        if !self.enabled {
            return false;
        }
        match &self.pattern {
            TriggerPattern::Contains(s) => lower.contains(s.as_str()),
            TriggerPattern::Regex(_) => self
                .compiled_regex
                .as_ref()
                .is_some_and(|re| re.is_match(line)),
        }
    }
}

/// 依序檢查的觸發器集合
#[derive(Debug, Clone)]
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    /// 空集合
    pub fn empty() -> Self {
        Self {
            triggers: Vec::new(),
        }
    }

    /// 添加觸發器
    pub fn add(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    /// 獲取觸發器
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Trigger> {
        self.triggers.iter_mut().find(|t| t.name == name)
    }

    /// 檢查一行純文字，回傳不重複的訊號（依第一次出現的順序）
    pub fn scan(&self, line: &str) -> Vec<Signal> {
        let lower = line.to_lowercase();
        let mut signals = Vec::new();
        for trigger in &self.triggers {
            if trigger.matches(line, &lower) && !signals.contains(&trigger.signal) {
                signals.push(trigger.signal);
            }
        }
        signals
    }
}

impl Default for TriggerSet {
    /// 內建的觸發器
    fn default() -> Self {
        let contains = |name: &str, text: &str, signal| {
            Trigger::new(name, TriggerPattern::Contains(text.to_string()), signal)
        };
        let mut set = Self::empty();
        for (name, text) in [
            ("door_closed", "seems to be closed"),
            ("door_closed_2", "the door is closed"),
            ("no_exit", "you cannot go that way"),
            ("no_exit_2", "alas, you cannot go"),
            ("exhausted", "you are too exhausted"),
            ("exhausted_2", "you are too tired"),
            ("drowning", "you would drown"),
            ("swim", "you need to swim"),
            ("no_boat", "you need a boat"),
        ] {
            set.add(contains(name, text, Signal::MovementBlocked));
        }
        for (name, text) in [
            ("pitch_black", "it is pitch black"),
            ("too_dark", "too dark to see"),
            ("cant_see", "you can't see a thing"),
        ] {
            set.add(contains(name, text, Signal::RoomUnmapped));
        }
        set.add(Trigger::new(
            "damage",
            TriggerPattern::Regex(
                r"(?i)\b(?:hits?|wounds?|slash(?:es)?|pierces?|crush(?:es)?|bites?|stings?|claws?|pounds?|smites?|cleaves?|stabs?|mauls?|whips?|strikes?) you\b|\byou are hit\b"
                    .to_string(),
            ),
            Signal::HitFlash,
        ));
        for (name, text) in [
            ("dead", "you are dead"),
            ("killed", "you have been killed"),
            ("rip", "rest in peace"),
        ] {
            set.add(contains(name, text, Signal::Death));
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_blocked() {
        let set = TriggerSet::default();
        assert_eq!(set.scan("The door seems to be closed."), vec![Signal::MovementBlocked]);
        assert_eq!(set.scan("You are too exhausted."), vec![Signal::MovementBlocked]);
        assert_eq!(set.scan("Alas, you cannot go that way..."), vec![Signal::MovementBlocked]);
    }

    #[test]
    fn test_darkness() {
        let set = TriggerSet::default();
        assert_eq!(set.scan("It is pitch black..."), vec![Signal::RoomUnmapped]);
    }

    #[test]
    fn test_hit_flash() {
        let set = TriggerSet::default();
        assert_eq!(set.scan("An orc hits you."), vec![Signal::HitFlash]);
        assert_eq!(set.scan("The troll crushes you hard."), vec![Signal::HitFlash]);
        assert!(set.scan("You hit the orc.").is_empty());
    }

    #[test]
    fn test_death_and_dedup() {
        let set = TriggerSet::default();
        assert_eq!(
            set.scan("You are dead! You have been killed. Rest in peace."),
            vec![Signal::Death]
        );
    }

    #[test]
    fn test_disabled_trigger() {
        let mut set = TriggerSet::default();
        set.get_mut("pitch_black").unwrap().enabled = false;
        assert!(set.scan("It is pitch black...").is_empty());
    }

    #[test]
    fn test_custom_regex_trigger() {
        let mut set = TriggerSet::empty();
        set.add(Trigger::new(
            "river",
            TriggerPattern::Regex(r"^The current (?:is|looks) too strong".to_string()),
            Signal::MovementBlocked,
        ));
        assert_eq!(set.scan("The current is too strong."), vec![Signal::MovementBlocked]);
        assert!(set.scan("the current is too strong.").is_empty());
    }
}
