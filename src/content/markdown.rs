//! Markdown rendering with optional syntax highlighting

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::helpers::escape_html;

/// Markdown renderer
pub struct MarkdownRenderer {
    highlighter: Option<Highlighter>,
    smart_punctuation: bool,
}

struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl MarkdownRenderer {
    /// Plain renderer: no highlighting, no smart punctuation
    pub fn new() -> Self {
        Self {
            highlighter: None,
            smart_punctuation: false,
        }
    }

    /// Highlight fenced code blocks with the given syntect theme
    pub fn with_highlighting(mut self, theme: &str) -> Self {
        self.highlighter = Some(Highlighter {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        });
        self
    }

    /// Turn straight quotes, dashes and ellipses into typographic ones
    pub fn with_smart_punctuation(mut self, enabled: bool) -> Self {
        self.smart_punctuation = enabled;
        self
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        // Front-matter is split off before this point, so no metadata blocks
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;
        if self.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::new();
        match &self.highlighter {
            None => html::push_html(&mut html_output, parser),
            Some(highlighter) => {
                let events = highlight_code_blocks(parser, highlighter);
                html::push_html(&mut html_output, events.into_iter());
            }
        }

        Ok(html_output)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace code block events with pre-highlighted HTML
fn highlight_code_blocks<'a>(parser: Parser<'a>, highlighter: &Highlighter) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut in_code_block = false;
    let mut code_block_lang: Option<String> = None;
    let mut code_block_content = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                code_block_lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang
                        .split_whitespace()
                        .next()
                        .filter(|l| !l.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code_block_content.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                let highlighted =
                    highlighter.highlight(&code_block_content, code_block_lang.as_deref());
                events.push(Event::Html(CowStr::from(highlighted)));
                in_code_block = false;
                code_block_lang = None;
            }
            Event::Text(text) if in_code_block => code_block_content.push_str(&text),
            _ => events.push(event),
        }
    }

    events
}

impl Highlighter {
    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>", escape_html(code));
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(html) => format!(
                r#"<div class="highlight" data-language="{}">{}</div>"#,
                escape_html(lang),
                html
            ),
            None => format!(
                r#"<pre class="language-{lang}"><code class="language-{lang}">{}</code></pre>"#,
                escape_html(code),
                lang = escape_html(lang)
            ),
        }
    }
}
