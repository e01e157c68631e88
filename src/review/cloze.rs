//! 填空单元格的空位提取
//!
//! Cloze 内容是富文本 HTML，空位以 `<cloze index="N">…</cloze>`
//! 标记。每个不同的空位 index 对应一条独立复习记录，记录的
//! `additional_content` 即该 index 的字符串形式。

use std::sync::LazyLock;

use regex::Regex;

static CLOZE_INDEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<cloze[^>]*index="(\d+)"[^>]*>"#).expect("cloze index pattern is valid")
});

/// 按首次出现顺序提取去重后的空位键
pub fn extract_blank_keys(content: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for capture in CLOZE_INDEX_RE.captures_iter(content) {
        let key = capture[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
