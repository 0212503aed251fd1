//! # CSS インライン化
//!
//! メールクライアントの多くは `<style>` ブロックを解釈しないため、
//! HTML 本文のスタイルを各要素の `style` 属性へ展開する。
//!
//! `!important` 指定は後続ルールより優先される。外部スタイルシートは取得しない。

use postflow_domain::mail::MailError;

/// CSS インライナー
#[derive(Debug, Clone, Copy, Default)]
pub struct CssInliner;

impl CssInliner {
    pub fn new() -> Self {
        Self
    }

    /// `<style>` ブロックの宣言を要素の `style` 属性に展開した HTML を返す
    pub fn inline(&self, html: &str) -> Result<String, MailError> {
        let inliner = css_inline::CSSInliner::options()
            .load_remote_stylesheets(false)
            .keep_style_tags(false)
            .build();

        inliner
            .inline(html)
            .map_err(|e| MailError::Inline(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_styleブロックの宣言がstyle属性に展開される() {
        let html = "<html><head><style>p { color: red; }</style></head><body><p>hello</p></body></html>";

        let inlined = CssInliner::new().inline(html).unwrap();

        assert!(inlined.contains("style=\"color: red"));
        assert!(!inlined.contains("<style>"));
        assert!(inlined.contains("hello"));
    }

    #[test]
    fn test_importantは後続ルールより優先される() {
        let html = "<html><head><style>p { color: red !important; } p { color: blue; }</style></head><body><p>x</p></body></html>";

        let inlined = CssInliner::new().inline(html).unwrap();

        assert!(inlined.contains("red"));
        assert!(!inlined.contains("blue"));
    }

    #[test]
    fn test_インライン化は冪等である() {
        let html = "<html><head><style>.footer { color: #999999; }</style></head><body><p class=\"footer\">x</p></body></html>";
        let inliner = CssInliner::new();

        let once = inliner.inline(html).unwrap();
        let twice = inliner.inline(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_スタイルのない本文はそのまま残る() {
        let html = "<html><head></head><body><p>plain</p></body></html>";

        let inlined = CssInliner::new().inline(html).unwrap();

        assert!(inlined.contains("<p>plain</p>"));
    }
}
