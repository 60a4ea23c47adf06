//! Front-matter parsing

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Accept either a single string or a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

/// Front-matter data from a markdown file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub layout: Option<String>,
    pub draft: bool,
    pub description: Option<String>,
    /// Explicit URL path, used as the slug when present
    pub path: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub category: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Split front-matter from the markdown body.
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        if let Some(rest) = content.strip_prefix("---") {
            return Ok(Self::parse_yaml(content, rest));
        }

        if let Some(rest) = content.strip_prefix(";;;") {
            return Self::parse_json(rest);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml<'a>(content: &'a str, rest: &'a str) -> (Self, &'a str) {
        let rest = rest.trim_start_matches([' ', '\t']);
        let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
            // `---` followed by text on the same line is a markdown rule, not a fence
            return (FrontMatter::default(), content);
        };

        // Empty block: the closing fence directly follows the opening one
        if let Some(after) = rest.strip_prefix("---") {
            let body = after.split_once('\n').map(|(_, b)| b).unwrap_or("");
            return (FrontMatter::default(), body);
        }

        let (yaml, body) = match rest.find("\n---") {
            Some(end) => {
                let after = &rest[end + 4..];
                let body = after.split_once('\n').map(|(_, b)| b).unwrap_or("");
                (&rest[..end], body)
            }
            None => return (FrontMatter::default(), content),
        };

        if yaml.trim().is_empty() {
            return (FrontMatter::default(), body);
        }

        if !looks_like_yaml(yaml) {
            return (FrontMatter::default(), content);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml) {
            Ok(fm) => (fm, body),
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, treating as content: {}", e);
                (FrontMatter::default(), content)
            }
        }
    }

    fn parse_json(rest: &str) -> Result<(Self, &str)> {
        let end = rest
            .find(";;;")
            .ok_or_else(|| anyhow!("Unterminated JSON front-matter"))?;
        let json = rest[..end].trim();
        let body = rest[end + 3..].trim_start_matches(['\n', '\r']);

        let json = if json.starts_with('{') {
            json.to_string()
        } else {
            format!("{{{}}}", json)
        };
        let fm: FrontMatter = serde_json::from_str(&json)
            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;

        Ok((fm, body))
    }

    /// Parse the date string into a DateTime
    pub fn parse_date(&self) -> Option<DateTime<Local>> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// At least one `key: value` line, where the key is a plain identifier.
/// Rules out prose and URLs sitting between two `---` rules.
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return false;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                !key.is_empty()
                    && key
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                    && !matches!(key, "http" | "https" | "ftp")
                    && (value.is_empty() || value.starts_with(' '))
            }
            None => false,
        }
    })
}

/// Parse a date string in the formats front-matter commonly uses
pub fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim().trim_matches('"').trim_matches('\'');

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&d.and_hms_opt(0, 0, 0)?).earliest();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Serverless Patterns
date: "2017-05-01T22:40:32.169Z"
layout: post
draft: false
description: Patterns for serverless apps
tags:
  - serverless
  - aws
category: Architecture
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Serverless Patterns"));
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert!(!fm.draft);
        assert_eq!(fm.description.as_deref(), Some("Patterns for serverless apps"));
        assert_eq!(fm.tags, vec!["serverless", "aws"]);
        assert_eq!(fm.category.as_deref(), Some("Architecture"));
        assert!(remaining.trim_start().starts_with("This is the content."));
        assert_eq!(fm.parse_date().unwrap().year(), 2017);
    }

    #[test]
    fn test_single_string_tags_and_draft() {
        let content = "---\ntitle: WIP\ntags: notes\ndraft: true\n---\nBody\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["notes"]);
        assert!(fm.draft);
        assert_eq!(remaining, "Body\n");
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = ";;;\n\"title\": \"Json Post\", \"path\": \"/json/\"\n;;;\nBody here.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Json Post"));
        assert_eq!(fm.path.as_deref(), Some("/json/"));
        assert_eq!(remaining, "Body here.\n");
    }

    #[test]
    fn test_empty_frontmatter_block() {
        let (fm, remaining) = FrontMatter::parse("---\n---\nBody").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "Body");

        let (_, remaining) = FrontMatter::parse("---\r\n---\r\nBody").unwrap();
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Heading\n\nText").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "# Heading\n\nText");
    }

    #[test]
    fn test_markdown_rules_not_yaml() {
        let content = "---\n\nCheck out https://example.com and http://test.com\n\n---\nMore content.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert!(remaining.contains("https://example.com"));
    }

    #[test]
    fn test_parse_date_formats() {
        let d = parse_date_string("2016-12-31").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2016, 12, 31));
        let d = parse_date_string("2016/02/03 10:30:00").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2016, 2, 3));
        assert!(parse_date_string("yesterday").is_none());
    }
}
