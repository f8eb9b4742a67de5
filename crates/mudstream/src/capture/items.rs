//! 裝備/物品清單的物品片段

use lazy_static::lazy_static;
use regex::Regex;

use crate::ansi::escape_html;

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"\[[^\]]*\]|\([^)]*\)|<[^>]*>").unwrap();
}

const STOPWORDS: [&str; 10] = ["a", "an", "the", "of", "in", "on", "at", "to", "some", "several"];

/// 去掉開頭的裝飾符號（保留括號，讓 `<worn on head>` 這類欄位完整顯示）
pub fn strip_decoration(line: &str) -> &str {
    line.trim_start_matches(|c: char| !c.is_alphanumeric() && !matches!(c, '<' | '[' | '('))
        .trim_end()
}

/// 物品名稱最後一個有意義的字（小寫），用於點擊後的指令
pub fn item_noun(line: &str) -> Option<String> {
    let cleaned = BRACKETED.replace_all(line, " ");
    cleaned
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|token| token.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|token| !STOPWORDS.contains(&token.as_str()))
        .last()
}

/// 清單的標題/結尾行
fn is_header_or_footer(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    lower.is_empty()
        || lower == "nothing."
        || lower.starts_with("you are carrying")
        || lower.starts_with("you are using")
}

/// 灰色純文字片段
pub fn dimmed_fragment(text: &str) -> String {
    format!("<span class=\"dim\">{}</span>", escape_html(text.trim()))
}

/// 將清單中的一行轉成 HTML 片段
pub fn item_fragment(line: &str) -> String {
    let label = strip_decoration(line);
    if is_header_or_footer(label) {
        return dimmed_fragment(line);
    }
    match item_noun(label) {
        Some(noun) => format!(
            "<span class=\"item\" data-noun=\"{}\">{}</span>",
            escape_html(&noun),
            escape_html(label)
        ),
        None => dimmed_fragment(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_noun() {
        assert_eq!(item_noun("a rusty sword").as_deref(), Some("sword"));
        assert_eq!(item_noun("<worn on head>      a leather Cap").as_deref(), Some("cap"));
        assert_eq!(item_noun("a long sword (glowing) [3]").as_deref(), Some("sword"));
        assert_eq!(item_noun("some bread of the north").as_deref(), Some("north"));
        assert_eq!(item_noun("a x").as_deref(), None);
    }

    #[test]
    fn test_strip_decoration() {
        assert_eq!(strip_decoration("  * a torch  "), "a torch");
        assert_eq!(strip_decoration("<wielded>  a dagger"), "<wielded>  a dagger");
    }

    #[test]
    fn test_item_fragment() {
        assert_eq!(
            item_fragment("  a rusty sword"),
            "<span class=\"item\" data-noun=\"sword\">a rusty sword</span>"
        );
        assert_eq!(item_fragment("You are carrying:"), "<span class=\"dim\">You are carrying:</span>");
        assert_eq!(item_fragment(" Nothing."), "<span class=\"dim\">Nothing.</span>");
    }
}
