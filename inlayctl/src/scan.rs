//! Finds image references in HTML and Markdown documents.

use regex::Regex;

/// Extracts image references in document order.
#[derive(Debug)]
pub struct ReferenceScanner {
    html: Regex,
    markdown: Regex,
}

impl ReferenceScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            html: Regex::new(
                r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#,
            )?,
            markdown: Regex::new(
                r#"!\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#,
            )?,
        })
    }

    /// Every reference, duplicates included, in the order it appears. Each
    /// occurrence is one unit of the document's batch.
    pub fn scan(&self, document: &str) -> Vec<String> {
        let html = self.html.captures_iter(document).filter_map(|caps| {
            let src = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            Some((src.start(), decode_entities(src.as_str().trim())))
        });
        let markdown = self.markdown.captures_iter(document).filter_map(|caps| {
            let src = caps.get(1)?;
            Some((src.start(), src.as_str().to_string()))
        });

        let mut found: Vec<(usize, String)> = html
            .chain(markdown)
            .filter(|(_, src)| !src.is_empty())
            .collect();
        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, src)| src).collect()
    }
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
