//! plugin-google-analytics: injects the gtag snippet into every page

use anyhow::Result;
use serde::Deserialize;

use super::{BuildContext, Plugin};
use crate::helpers::escape_html;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyticsOptions {
    pub tracking_id: String,
    #[serde(default)]
    pub anonymize: bool,
}

pub struct AnalyticsPlugin {
    snippet: String,
}

impl AnalyticsPlugin {
    pub fn new(options: AnalyticsOptions) -> Self {
        let id = escape_html(&options.tracking_id);
        let config = if options.anonymize {
            format!("gtag('config', '{}', {{ 'anonymize_ip': true }});", id)
        } else {
            format!("gtag('config', '{}');", id)
        };
        let snippet = format!(
            concat!(
                "<script async src=\"https://www.googletagmanager.com/gtag/js?id={id}\"></script>\n",
                "<script>\n",
                "window.dataLayer = window.dataLayer || [];\n",
                "function gtag(){{dataLayer.push(arguments);}}\n",
                "gtag('js', new Date());\n",
                "{config}\n",
                "</script>\n"
            ),
            id = id,
            config = config
        );
        Self { snippet }
    }
}

impl Plugin for AnalyticsPlugin {
    fn name(&self) -> &'static str {
        "plugin-google-analytics"
    }

    fn on_page_html(&self, html: String, _ctx: &BuildContext) -> Result<String> {
        Ok(match html.find("</head>") {
            Some(pos) => format!("{}{}{}", &html[..pos], self.snippet, &html[pos..]),
            None => html,
        })
    }
}
