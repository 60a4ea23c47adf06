//! List site content

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::content::{group_by_category, group_by_tag, published_posts};
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let nodes = ContentLoader::new(site).load()?;

    match content_type {
        "post" | "posts" => {
            let posts: Vec<_> = nodes.iter().filter(|n| n.is_post()).collect();
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {}{} [{}]",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    if post.draft { " (draft)" } else { "" },
                    post.source
                );
            }
        }
        "page" | "pages" => {
            let pages: Vec<_> = nodes.iter().filter(|n| !n.is_post()).collect();
            println!("Pages ({}):", pages.len());
            for page in pages {
                println!("  {} {} [{}]", page.slug, page.title, page.source);
            }
        }
        "tag" | "tags" => {
            let posts = published_posts(&nodes);
            let mut tags: Vec<_> = group_by_tag(&posts).into_values().collect();
            tags.sort_by(|a, b| b.0.count.cmp(&a.0.count));
            println!("Tags ({}):", tags.len());
            for (term, _) in tags {
                println!("  {} ({})", term.name, term.count);
            }
        }
        "category" | "categories" => {
            let posts = published_posts(&nodes);
            let mut categories: Vec<_> = group_by_category(&posts).into_values().collect();
            categories.sort_by(|a, b| b.0.count.cmp(&a.0.count));
            println!("Categories ({}):", categories.len());
            for (term, _) in categories {
                println!("  {} ({})", term.name, term.count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, tag, category",
                content_type
            );
        }
    }

    Ok(())
}
