//! Just enough HTML handling to feed a page to the summarizer.

use regex_lite::Regex;

/// A hyperlink found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Compiled patterns for turning a page into text and links.
pub struct HtmlCleaner {
    dropped_blocks: Regex,
    comments: Regex,
    block_breaks: Regex,
    tags: Regex,
    anchors: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

impl HtmlCleaner {
    pub fn new() -> Result<Self, regex_lite::Error> {
        Ok(Self {
            dropped_blocks: Regex::new(
                r"(?is)<(script|style|noscript|svg|head)\b[^>]*>.*?</(script|style|noscript|svg|head)\s*>",
            )?,
            comments: Regex::new(r"(?s)<!--.*?-->")?,
            block_breaks: Regex::new(
                r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|tr|table|section|article|header|footer)\b[^>]*>",
            )?,
            tags: Regex::new(r"(?s)<[^>]*>")?,
            anchors: Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a\s*>"#)?,
            spaces: Regex::new(r"[ \t\r\f]+")?,
            blank_lines: Regex::new(r"\n\s*\n+")?,
        })
    }

    /// Visible text of an HTML document, with paragraphs kept on their own lines.
    pub fn to_text(&self, html: &str) -> String {
        let text = self.dropped_blocks.replace_all(html, " ");
        let text = self.comments.replace_all(&text, " ");
        let text = self.block_breaks.replace_all(&text, "\n");
        let text = self.tags.replace_all(&text, " ");
        let text = decode_entities(&text);
        let text = self.spaces.replace_all(&text, " ");
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        self.blank_lines
            .replace_all(&lines.join("\n"), "\n\n")
            .trim()
            .to_string()
    }

    /// Absolute http(s) links in document order, first occurrence of each URL only.
    pub fn links(&self, html: &str, base: &reqwest::Url) -> Vec<Link> {
        let mut seen = std::collections::HashSet::new();
        self.anchors
            .captures_iter(html)
            .filter_map(|caps| {
                let href = decode_entities(caps.get(1)?.as_str().trim());
                let mut url = base.join(&href).ok()?;
                if !matches!(url.scheme(), "http" | "https") {
                    return None;
                }
                let inner = self.tags.replace_all(caps.get(2)?.as_str(), " ");
                let text = self
                    .spaces
                    .replace_all(&decode_entities(&inner), " ")
                    .trim()
                    .to_string();
                if text.is_empty() {
                    return None;
                }
                url.set_fragment(None);
                let url = url.to_string();
                seen.insert(url.clone()).then_some(Link { text, url })
            })
            .collect()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html><head><title>Band A</title><style>p { color: red }</style></head>
<body>
<h1>Band A</h1>
<script>var tracking = "<p>nope</p>";</script>
<p>Band A is a <b>thrash metal</b> trio from Bay&nbsp;Area &amp; beyond.</p>
<!-- hidden note -->
<p>Formed in 1987.</p>
<a href="/bands/band-a/discography">Discography</a>
<a href="https://www.metal-archives.com/bands/Band_A">Encyclopaedia Metallum</a>
<a href="#top">Back to top</a>
<a href="mailto:fan@example.org">Mail</a>
<a href="/bands/band-a/discography#latest">Discography again</a>
</body></html>"##;

    #[test]
    fn text_drops_markup_and_invisible_blocks() {
        let text = HtmlCleaner::new().unwrap().to_text(PAGE);
        assert!(text.contains("Band A is a thrash metal trio from Bay Area & beyond."));
        assert!(text.contains("Formed in 1987."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
        assert!(!text.contains("hidden note"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn links_are_absolute_and_unique() {
        let base = reqwest::Url::parse("https://bands.example.org/bands/band-a").unwrap();
        let links = HtmlCleaner::new().unwrap().links(PAGE, &base);
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://bands.example.org/bands/band-a/discography",
                "https://www.metal-archives.com/bands/Band_A",
                "https://bands.example.org/bands/band-a",
            ]
        );
        assert_eq!(links[0].text, "Discography");
    }
}
