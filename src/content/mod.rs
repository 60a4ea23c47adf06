//! Content module - markdown sourcing, front-matter and rendering

mod frontmatter;
pub mod loader;
mod markdown;
mod node;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use markdown::MarkdownRenderer;
pub use node::{
    group_by_category, group_by_tag, published_pages, published_posts, ContentNode, Term,
};
