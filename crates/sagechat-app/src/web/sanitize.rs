use regex::Regex;
use std::sync::OnceLock;

/// Markdown punctuation removed from everything passing through the proxy
pub const MARKDOWN_MARKS: &str = r"[`*_#>-]";

fn markdown_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MARKDOWN_MARKS).expect("valid regex"))
}

/// Strip `` ` * _ # > - `` from `text`, leaving everything else untouched
pub fn strip_markdown(text: &str) -> String {
    markdown_marks().replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exactly_the_markdown_marks() {
        assert_eq!(
            strip_markdown("# 标题\n> 引用 `code` **bold** _it_ - item"),
            " 标题\n 引用 code bold it  item"
        );
    }

    #[test]
    fn keeps_other_punctuation() {
        let text = "1. 第一步：打开 (app)! [link] + = ~ |";
        assert_eq!(strip_markdown(text), text);
    }
}
