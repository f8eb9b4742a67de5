//! ANSI 轉義碼處理
//!
//! 移除顏色碼，或把 SGR 顏色轉為帶 class 的 HTML 片段

/// 跳過一個 ESC 序列（ESC 已被消耗）
fn skip_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<(String, char)> {
    match chars.peek() {
        Some(&'[') => {
            chars.next();
            let mut content = String::new();
            while let Some(ch) = chars.next() {
                if ('\x40'..='\x7e').contains(&ch) {
                    return Some((content, ch));
                }
                content.push(ch);
            }
            None
        }
        Some(&'(') | Some(&')') => {
            chars.next();
            chars.next();
            None
        }
        _ => None,
    }
}

fn is_visible(c: char) -> bool {
    c >= ' ' || c == '\n' || c == '\t'
}

/// 移除 ANSI 轉義碼，只保留純文字
pub fn strip_ansi(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            skip_escape(&mut chars);
        } else if is_visible(c) {
            result.push(c);
        }
    }
    result
}

/// HTML 跳脫（保留單引號，讓後續標記可以比對 `key: '...'`）
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// SGR 狀態
#[derive(Debug, Default, Clone, PartialEq)]
struct SgrState {
    fg: Option<u16>,
    bg: Option<u16>,
    bold: bool,
}

impl SgrState {
    fn apply(&mut self, content: &str) {
        let codes: Vec<u16> = content
            .split(';')
            .map(|part| part.parse::<u16>().unwrap_or(0))
            .collect();
        let mut i = 0;
        while i < codes.len() {
            match codes[i] {
                0 => *self = Self::default(),
                1 => self.bold = true,
                22 => self.bold = false,
                code @ (30..=37 | 90..=97) => self.fg = Some(code),
                39 => self.fg = None,
                code @ (40..=47 | 100..=107) => self.bg = Some(code),
                49 => self.bg = None,
                // 256 色與 RGB：略過參數
                38 | 48 => {
                    i += match codes.get(i + 1) {
                        Some(5) => 2,
                        Some(2) => 4,
                        _ => 0,
                    };
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn classes(&self) -> Option<String> {
        let mut classes = Vec::new();
        if let Some(fg) = self.fg {
            classes.push(format!("ansi-{}", fg));
        }
        if let Some(bg) = self.bg {
            classes.push(format!("ansi-{}", bg));
        }
        if self.bold {
            classes.push("ansi-bold".to_string());
        }
        if classes.is_empty() {
            None
        } else {
            Some(classes.join(" "))
        }
    }
}

/// 將帶 ANSI 顏色的文字轉為 HTML
pub fn ansi_to_html(input: &str) -> String {
    let mut html = String::with_capacity(input.len());
    let mut state = SgrState::default();
    let mut segment = String::new();
    let mut chars = input.chars().peekable();

    let flush = |html: &mut String, segment: &mut String, state: &SgrState| {
        if segment.is_empty() {
            return;
        }
        match state.classes() {
            Some(classes) => {
                html.push_str(&format!("<span class=\"{}\">{}</span>", classes, escape_html(segment)));
            }
            None => html.push_str(&escape_html(segment)),
        }
        segment.clear();
    };

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if let Some((content, 'm')) = skip_escape(&mut chars) {
                flush(&mut html, &mut segment, &state);
                state.apply(&content);
            }
        } else if c != '\n' && is_visible(c) {
            segment.push(c);
        }
    }
    flush(&mut html, &mut segment, &state);
    html
}
