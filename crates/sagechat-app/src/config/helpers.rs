use std::path::PathBuf;

/// Default data directory for the terminal client
pub const DEFAULT_DATA_DIR: &str = "~/.sagechat";

/// Default proxy address used by the terminal client
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000";

/// System prompt prepended to every conversation sent upstream
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"你是一个专门面向小白用户的AI助手，请遵循以下规则回答问题：

1. 内容结构：
- 开头用一句话总结回答要点
- 用生活中的类比来解释概念
- 用简单语言解释基本原理
- 最后逐步深入专业内容

2. 排版格式：
- 每个主要段落之间要空一行
- 每个新观点单独成段
- 重要概念单独成行
- 使用自然的对话语气
- 关键词可以适当强调

3. 分层结构：
第一层：类比解释
（空行）
第二层：基础概念
（空行）
第三层：深入讲解
（空行）
第四层：补充说明（如果需要）

4. 回答风格：
- 开头要有引人入胜的开场白
- 每个段落要有清晰的主题
- 结尾要有总结或延伸
- 如果内容复杂，使用序号或要点列举

5. 如果发现问题描述不清，要先确认用户的具体需求"#;

/// System prompt for the proxy, preferring a configured override
pub fn get_system_prompt(custom: Option<&str>) -> String {
    custom
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
        .to_string()
}

/// Name a transcript file can safely be written under
pub fn transcript_path(dir: &std::path::Path, file_name: &str) -> PathBuf {
    dir.join(file_name.replace(['/', '\\'], "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_falls_back_to_default() {
        assert_eq!(get_system_prompt(None), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(get_system_prompt(Some("  ")), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(get_system_prompt(Some("简短回答")), "简短回答");
    }

    #[test]
    fn default_prompt_targets_beginners() {
        assert!(DEFAULT_SYSTEM_PROMPT.starts_with("你是一个专门面向小白用户的AI助手"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("第四层：补充说明"));
    }

    #[test]
    fn transcript_path_replaces_separators() {
        let path = transcript_path(std::path::Path::new("/tmp"), "a/b.txt");
        assert_eq!(path, PathBuf::from("/tmp/a_b.txt"));
    }
}
