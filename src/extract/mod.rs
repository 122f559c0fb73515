pub mod expand;

#[cfg(test)]
mod tests;

use crate::config::ExtractRules;
use crate::results::{Block, PageContent};
use crate::utils::collapse_whitespace;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Subtrees that never contribute text, regardless of where they appear.
const ALWAYS_STRIP: &[&str] = &["script", "style", "noscript", "template"];

/// Block-level elements the typed block sequence is collected from.
const BLOCK_ELEMENTS: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, blockquote";

/// Words-per-minute divisor for the reading-time estimate.
const READING_WPM: usize = 200;

/// Extract the primary content of a rendered page.
///
/// Pure function over the page source; the heuristic inputs come from the
/// [`ExtractRules`] data table. Ordered, first-match-wins:
/// 1. the designated primary selector, if its text exceeds the threshold;
/// 2. the generic fallback selectors, in order, first past the threshold;
/// 3. the whole body with chrome elements removed.
///
/// Thin content is returned as-is; extraction never fails here.
pub fn extract(html: &str, url: &str, rules: &ExtractRules) -> PageContent {
    let doc = Html::parse_document(html);
    let block_sel = Selector::parse(BLOCK_ELEMENTS).unwrap();
    let always_skip = skip_set(&doc, ALWAYS_STRIP.iter().copied());

    let (blocks, selector) = match choose_region(&doc, rules, &always_skip) {
        Some((region, selector)) => {
            ::log::debug!("Content region matched selector {:?} for {}", selector, url);
            (blocks_within(region, &always_skip, &block_sel), Some(selector))
        }
        None => {
            ::log::debug!("No content selector matched for {}; using stripped body", url);
            let mut skip = always_skip.clone();
            skip.extend(skip_set(&doc, rules.chrome_selectors.iter().map(String::as_str)));

            let body_sel = Selector::parse("body").unwrap();
            let blocks = doc
                .select(&body_sel)
                .next()
                .map(|body| blocks_within(body, &skip, &block_sel))
                .unwrap_or_default();
            (blocks, None)
        }
    };

    let blocks = truncate_at_boilerplate(blocks, &rules.boilerplate_markers);

    let body = collapse_whitespace(
        &blocks
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join(" "),
    );
    let word_count = body.split_whitespace().count();

    PageContent {
        url: url.to_string(),
        title: title_of(&doc, url),
        description: meta_content(&doc, "description"),
        keywords: meta_content(&doc, "keywords"),
        author: meta_content(&doc, "author"),
        word_count,
        reading_minutes: word_count.div_ceil(READING_WPM),
        selector,
        body,
        blocks,
    }
}

/// Remove the tail of `text` starting at the first boilerplate marker.
///
/// Removal runs from the first match to the end of the string, not just the
/// matched span. Idempotent: stripped text contains no marker.
pub fn strip_boilerplate(text: &str, markers: &[String]) -> String {
    match first_marker_at(text, markers) {
        Some(pos) => text[..pos].trim_end().to_string(),
        None => text.to_string(),
    }
}

fn first_marker_at(text: &str, markers: &[String]) -> Option<usize> {
    markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| text.find(m.as_str()))
        .min()
}

/// Apply boilerplate truncation to the typed block sequence: the block
/// containing the first marker keeps only its leading part, and every later
/// block is dropped.
fn truncate_at_boilerplate(blocks: Vec<Block>, markers: &[String]) -> Vec<Block> {
    let mut kept = Vec::with_capacity(blocks.len());
    for block in blocks {
        match first_marker_at(block.text(), markers) {
            None => kept.push(block),
            Some(pos) => {
                let head = block.text()[..pos].trim_end().to_string();
                if !head.is_empty() {
                    kept.push(block.with_text(head));
                }
                break;
            }
        }
    }
    kept
}

/// Probe the selector-priority table; first region past the threshold wins.
fn choose_region<'a>(
    doc: &'a Html,
    rules: &ExtractRules,
    skip: &HashSet<NodeId>,
) -> Option<(ElementRef<'a>, String)> {
    let candidates =
        std::iter::once(&rules.primary_selector).chain(rules.fallback_selectors.iter());

    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            ::log::warn!("Skipping unparseable content selector {:?}", candidate);
            continue;
        };
        if let Some(region) = doc.select(&selector).next() {
            let len = text_within(region, skip).chars().count();
            if len > rules.min_text_len {
                return Some((region, candidate.clone()));
            }
            ::log::trace!(
                "Selector {:?} matched but holds only {} chars",
                candidate,
                len
            );
        }
    }
    None
}

/// Node ids of every element matching one of the given selectors.
fn skip_set<'a>(doc: &Html, selectors: impl Iterator<Item = &'a str>) -> HashSet<NodeId> {
    let mut ids = HashSet::new();
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            ::log::warn!("Skipping unparseable chrome selector {:?}", raw);
            continue;
        };
        ids.extend(doc.select(&selector).map(|e| e.id()));
    }
    ids
}

/// Collapsed text of a subtree, excluding skipped subtrees.
fn text_within(scope: ElementRef, skip: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    for node in scope.descendants() {
        if let Node::Text(text) = node.value() {
            if !is_hidden(node, scope, skip) {
                out.push_str(&text.text);
                out.push(' ');
            }
        }
    }
    collapse_whitespace(&out)
}

/// Raw text of a subtree with line structure kept (for code blocks).
fn raw_text_within(scope: ElementRef, skip: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    for node in scope.descendants() {
        if let Node::Text(text) = node.value() {
            if !is_hidden(node, scope, skip) {
                out.push_str(&text.text);
            }
        }
    }
    out.trim().to_string()
}

fn is_hidden(
    node: ego_tree::NodeRef<'_, Node>,
    scope: ElementRef,
    skip: &HashSet<NodeId>,
) -> bool {
    node.ancestors()
        .take_while(|a| a.id() != scope.id())
        .any(|a| skip.contains(&a.id()))
}

/// Collect the typed block sequence of a region, outermost match first.
///
/// A region with no block-level children degrades to a single paragraph.
fn blocks_within(scope: ElementRef, skip: &HashSet<NodeId>, block_sel: &Selector) -> Vec<Block> {
    let mut blocks = Vec::new();

    for elem in scope.select(block_sel) {
        if skip.contains(&elem.id()) {
            continue;
        }
        // Keep only the outermost block element; nested matches (a <p>
        // inside an <li>) are already covered by their ancestor's text.
        let nested = elem
            .ancestors()
            .take_while(|a| a.id() != scope.id())
            .any(|a| {
                skip.contains(&a.id())
                    || ElementRef::wrap(a).is_some_and(|e| block_sel.matches(&e))
            });
        if nested {
            continue;
        }

        let name = elem.value().name();
        let block = match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name.as_bytes()[1] - b'0';
                Block::Heading(level, text_within(elem, skip))
            }
            "pre" => Block::Code(raw_text_within(elem, skip)),
            "li" => Block::ListItem(text_within(elem, skip)),
            _ => Block::Paragraph(text_within(elem, skip)),
        };
        if !block.text().is_empty() {
            blocks.push(block);
        }
    }

    if blocks.is_empty() {
        let text = text_within(scope, skip);
        if !text.is_empty() {
            blocks.push(Block::Paragraph(text));
        }
    }

    blocks
}

/// Page title: `<title>`, else the first `<h1>`, else the last URL segment.
fn title_of(doc: &Html, url: &str) -> String {
    let title_sel = Selector::parse("title").unwrap();
    if let Some(title) = doc.select(&title_sel).next() {
        let text = collapse_whitespace(&title.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return text;
        }
    }

    let h1_sel = Selector::parse("h1").unwrap();
    if let Some(h1) = doc.select(&h1_sel).next() {
        let text = collapse_whitespace(&h1.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return text;
        }
    }

    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|s| s.filter(|s| !s.is_empty()).next_back().map(String::from))
        })
        .unwrap_or_else(|| url.to_string())
}

fn meta_content(doc: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name='{name}']")).unwrap();
    doc.select(&selector)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}
