use std::path::Path;

use crate::comic::{rfc822, Comic};
use crate::error::{FeedError, Result};

const FEED_XML: &str = include_str!("../templates/xkcd/feed.xml");
const ITEM_XML: &str = include_str!("../templates/xkcd/item.xml");
const ITEM_HTML: &str = include_str!("../templates/xkcd/item.html");

#[derive(Debug, Clone)]
pub struct Templates {
    feed: String,
    item_xml: String,
    item_html: String,
}

impl Templates {
    pub fn embedded() -> Self {
        Self {
            feed: FEED_XML.to_string(),
            item_xml: ITEM_XML.to_string(),
            item_html: ITEM_HTML.to_string(),
        }
    }

    /// Load `feed.xml`, `item.xml` and `item.html` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            feed: std::fs::read_to_string(dir.join("feed.xml"))?,
            item_xml: std::fs::read_to_string(dir.join("item.xml"))?,
            item_html: std::fs::read_to_string(dir.join("item.html"))?,
        })
    }
}

pub struct Renderer {
    templates: Templates,
    self_link: String,
}

impl Renderer {
    pub fn new(templates: Templates, self_link: impl Into<String>) -> Self {
        Self {
            templates,
            self_link: self_link.into(),
        }
    }

    /// Render a complete RSS document with one item per comic.
    pub fn render(&self, comics: &[Comic], build_date: &str) -> Result<String> {
        if comics.is_empty() {
            return Err(FeedError::NoComics);
        }

        let items = comics
            .iter()
            .map(|c| self.render_item(c))
            .collect::<Result<Vec<_>>>()?
            .join("\n");

        substitute(&self.templates.feed, |key| match key {
            "items" => Some(items.clone()),
            "buildDate" | "pubDate" => Some(escape(build_date)),
            "selfLink" => Some(escape(&self.self_link)),
            _ => None,
        })
    }

    fn render_item(&self, comic: &Comic) -> Result<String> {
        let date = rfc822(&comic.published()?);
        let num = comic.num.to_string();
        let field = |key: &str| {
            let raw = match key {
                "comic.img" => &comic.img,
                "comic.title" => &comic.title,
                "comic.alt" => &comic.alt,
                "comic.num" => &num,
                "comic.date" => &date,
                _ => return None,
            };
            Some(escape(raw))
        };

        let html = substitute(&self.templates.item_html, field)?;
        let cdata = html.trim_end().replace("]]>", "]]]]><![CDATA[>");

        let xml = substitute(&self.templates.item_xml, |key| match key {
            "htmlContent" => Some(cdata.clone()),
            other => field(other),
        })?;
        Ok(xml.trim_end().to_string())
    }
}

fn escape(value: &str) -> String {
    html_escape::encode_quoted_attribute(value).into_owned()
}

/// Replace `${dotted.key}` and `$key` placeholders using `lookup`.
///
/// `$$` yields a literal `$`. A `$` that starts neither form is copied through.
/// Substituted values are not scanned again.
pub fn substitute<F>(template: &str, mut lookup: F) -> Result<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (key, tail) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], &braced[end + 1..]),
                None => ("", after),
            }
        } else if after.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], &after[end..])
        } else {
            ("", after)
        };

        if key.is_empty() {
            out.push('$');
        } else {
            let value =
                lookup(key).ok_or_else(|| FeedError::UnknownTemplateKey(key.to_string()))?;
            out.push_str(&value);
        }
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}
