//! char.vitals 解析與部分更新
//!
//! 伺服器送來的 vitals 是「部分」資料：沒出現的鍵一律保留舊值。
//! position/opponent 另存在 [`VitalsMemory`]，戰鬥狀態由兩者的聯集決定。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 各數值欄位的候選鍵名，依優先順序探測
///
/// 不同伺服器對同一數值的命名不一致（例如移動力 `mp` / `mv` / `move`），
/// 第一個出現且可解析為數字的鍵勝出。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsKeys {
    pub hp: Vec<String>,
    pub max_hp: Vec<String>,
    pub mana: Vec<String>,
    pub max_mana: Vec<String>,
    pub moves: Vec<String>,
    pub max_moves: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for VitalsKeys {
    fn default() -> Self {
        Self {
            hp: keys(&["hp", "hits", "health"]),
            max_hp: keys(&["maxhp", "maxHp", "max_hp", "maxhits"]),
            mana: keys(&["mana", "sp"]),
            max_mana: keys(&["maxmana", "maxMana", "max_mana", "maxsp"]),
            moves: keys(&["mp", "mv", "move", "moves", "movement"]),
            max_moves: keys(&["maxmp", "maxmv", "maxmove", "maxMove", "maxmoves", "max_move"]),
        }
    }
}

/// 天氣狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    None,
    Cloud,
    Rain,
    HeavyRain,
}

impl Weather {
    pub fn is_precipitating(self) -> bool {
        matches!(self, Self::Rain | Self::HeavyRain)
    }

    /// 依天氣符號計算下一個狀態
    ///
    /// 空白或 null 只會結束降雨，不會把多雲改成晴天；未知符號保持不變。
    pub fn transition(self, symbol: Option<&str>) -> Weather {
        let blank = if self.is_precipitating() {
            Weather::None
        } else {
            self
        };
        match symbol {
            None => blank,
            Some("~") => Weather::Cloud,
            Some("'") | Some("\"") => Weather::Rain,
            Some("*") => Weather::HeavyRain,
            Some(s) if s.trim().is_empty() => blank,
            Some(_) => self,
        }
    }
}

/// 光線狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lighting {
    Sun,
    Moon,
    Artificial,
    Dark,
}

/// 單則 char.vitals 解碼後的差量
///
/// 外層 `Option` 表示鍵是否出現；內層 `Option` 表示值是否為 null。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VitalsDelta {
    pub hp: Option<i64>,
    pub max_hp: Option<i64>,
    pub mana: Option<i64>,
    pub max_mana: Option<i64>,
    pub moves: Option<i64>,
    pub max_moves: Option<i64>,
    pub position: Option<Option<String>>,
    pub opponent: Option<Option<String>>,
    pub weather: Option<Option<String>>,
    pub fog: Option<Option<String>>,
    pub light: Option<String>,
}

impl VitalsDelta {
    /// 從已解析的 JSON 建立差量；非物件回傳 None
    pub fn from_json(value: &Value, keys: &VitalsKeys) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            hp: first_number(obj, &keys.hp),
            max_hp: first_number(obj, &keys.max_hp),
            mana: first_number(obj, &keys.mana),
            max_mana: first_number(obj, &keys.max_mana),
            moves: first_number(obj, &keys.moves),
            max_moves: first_number(obj, &keys.max_moves),
            position: obj.get("position").map(text_value),
            opponent: obj.get("opponent").map(text_value),
            weather: obj.get("weather").map(text_value),
            fog: obj.get("fog").map(text_value),
            light: obj
                .get("light")
                .and_then(text_value)
                .filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn has_stats(&self) -> bool {
        self.hp.is_some()
            || self.max_hp.is_some()
            || self.mana.is_some()
            || self.max_mana.is_some()
            || self.moves.is_some()
            || self.max_moves.is_some()
    }
}

fn first_number(obj: &Map<String, Value>, candidates: &[String]) -> Option<i64> {
    candidates
        .iter()
        .filter_map(|key| obj.get(key))
        .find_map(number_value)
}

fn number_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        // 部分伺服器以物件表示對手
        Value::Object(obj) => obj.get("name").and_then(text_value),
        other => Some(other.to_string()),
    }
}

/// 跨訊息保存的 position/opponent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VitalsMemory {
    pub position: Option<String>,
    pub opponent: Option<String>,
}

impl VitalsMemory {
    pub fn in_combat(&self) -> bool {
        let fighting = self
            .position
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case("fighting"));
        let opponent = self.opponent.as_deref().is_some_and(|o| !o.is_empty());
        fighting || opponent
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 目前已知的角色狀態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharVitals {
    pub hp: Option<i64>,
    pub max_hp: Option<i64>,
    pub mana: Option<i64>,
    pub max_mana: Option<i64>,
    pub moves: Option<i64>,
    pub max_moves: Option<i64>,
    pub position: Option<String>,
    pub opponent: Option<String>,
    pub in_combat: bool,
    pub weather: Weather,
    pub foggy: bool,
    pub light: Option<Lighting>,
}

/// 套用差量後有哪些東西需要通知
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VitalsChange {
    pub stats: bool,
    pub in_combat: bool,
    pub weather: Option<Weather>,
    pub fog: Option<bool>,
    pub light: Option<String>,
}

impl CharVitals {
    /// 套用 char.vitals 差量
    pub fn apply(&mut self, delta: &VitalsDelta, memory: &mut VitalsMemory) -> VitalsChange {
        self.apply_stats(delta);

        if let Some(position) = &delta.position {
            memory.position = position.clone();
        }
        if let Some(opponent) = &delta.opponent {
            memory.opponent = opponent.clone();
        }
        self.position = memory.position.clone();
        self.opponent = memory.opponent.clone();
        self.in_combat = memory.in_combat();

        let weather = delta.weather.as_ref().map(|symbol| {
            self.weather = self.weather.transition(symbol.as_deref());
            self.weather
        });
        let fog = delta.fog.as_ref().map(|symbol| {
            self.foggy = matches!(symbol.as_deref(), Some("-") | Some("="));
            self.foggy
        });

        VitalsChange {
            stats: delta.has_stats(),
            in_combat: self.in_combat,
            weather,
            fog,
            light: delta.light.clone(),
        }
    }

    /// 只更新數值欄位（文字備援解析使用）
    pub fn apply_stats(&mut self, delta: &VitalsDelta) {
        fn set(field: &mut Option<i64>, value: Option<i64>) {
            if value.is_some() {
                *field = value;
            }
        }
        set(&mut self.hp, delta.hp);
        set(&mut self.max_hp, delta.max_hp);
        set(&mut self.mana, delta.mana);
        set(&mut self.max_mana, delta.max_mana);
        set(&mut self.moves, delta.moves);
        set(&mut self.max_moves, delta.max_moves);
    }
}
