use regex::Regex;
use scraper::{Html, Selector};
use std::{borrow::Cow, collections::HashSet, sync::LazyLock};

// Every game listing on a device page opens with a header row naming the game
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<tr class="header">\s*<td class="header" colspan="\d+">\s*<a name="[^"]*">(?P<title>.+?)</a>\s*</td>\s*</tr>"#,
    )
    .expect("header pattern is valid")
});

// ...and closes with an empty spacer row
static SECTION_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<tr>\s*<td colspan="5">&nbsp;</td>\s*</tr>"#)
        .expect("section end pattern is valid")
});

/// Removes the line breaks the section markers may be split across.
pub fn flatten_page(text: &str) -> String {
    text.replace(['\r', '\n'], "")
}

/// One game's listing on a device index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameBlock<'a> {
    /// Title exactly as it appears in the header, character references included.
    pub title: &'a str,
    /// Markup between the header row and the section end row.
    pub content: &'a str,
}

impl<'a> GameBlock<'a> {
    pub fn decoded_title(&self) -> Cow<'a, str> {
        html_escape::decode_html_entities(self.title)
    }

    /// True if the title, raw or entity-decoded, is in `wanted` once case-folded.
    pub fn is_wanted(&self, wanted: &HashSet<String>) -> bool {
        wanted.contains(&self.title.to_lowercase())
            || wanted.contains(&self.decoded_title().to_lowercase())
    }

    pub fn download_links(&self) -> Vec<String> {
        download_links(self.content)
    }
}

/// Lazily walks the game blocks of a flattened device page, in page order.
#[derive(Debug, Clone)]
pub struct GameBlocks<'a> {
    text: &'a str,
    pos: usize,
}

pub fn game_blocks(text: &str) -> GameBlocks<'_> {
    GameBlocks { text, pos: 0 }
}

impl<'a> Iterator for GameBlocks<'a> {
    type Item = GameBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let header = HEADER_RE.captures_at(self.text, self.pos)?;
        let (header_end, title) = match (header.get(0), header.name("title")) {
            (Some(whole), Some(title)) => (whole.end(), title.as_str()),
            _ => return None,
        };

        match SECTION_END_RE.find_at(self.text, header_end) {
            Some(end) => {
                self.pos = end.end();
                Some(GameBlock {
                    title,
                    content: &self.text[header_end..end.start()],
                })
            }
            None => {
                // No later header can be closed either
                self.pos = self.text.len();
                None
            }
        }
    }
}

/// All `.mid` link targets inside table cells, in document order.
pub fn download_links(content: &str) -> Vec<String> {
    // Blocks are bare table rows; without the wrapper the parser drops them
    let fragment = Html::parse_fragment(&format!("<table>{}</table>", content));
    let link_selector = Selector::parse(r#"td a[href*=".mid"]"#).expect("link selector is valid");

    fragment
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}
