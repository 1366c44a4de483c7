/*
 * preprocess.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Line-level preprocessing stages that run before block parsing.
 */

//! Line preprocessors.
//!
//! Preprocessors map an ordered sequence of lines to a new ordered sequence
//! of lines. They may rewrite, drop, split or inject lines freely; nothing
//! downstream may assume the output is line-for-line comparable with the
//! input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::session::{Session, StashEntry};

/// A stage in the line preprocessing chain.
pub trait Preprocessor {
    /// Name used for registration and logging.
    fn name(&self) -> &str;

    /// Transform `lines`. May record state in `session`.
    fn run(&self, session: &mut Session, lines: Vec<String>) -> Vec<String>;
}

/// Width a tab expands to.
pub const TAB_LENGTH: usize = 4;

/// Expands tabs, strips carriage returns, and blanks whitespace-only lines.
pub struct NormalizeWhitespace;

impl Preprocessor for NormalizeWhitespace {
    fn name(&self) -> &str {
        "normalize_whitespace"
    }

    fn run(&self, _session: &mut Session, lines: Vec<String>) -> Vec<String> {
        lines
            .into_iter()
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(&line);
                if line.trim().is_empty() {
                    String::new()
                } else {
                    expand_tabs(line)
                }
            })
            .collect()
    }
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_LENGTH);
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_LENGTH - column % TAB_LENGTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

static META_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ ]{0,3}(?P<key>[A-Za-z0-9_-]+):\s*(?P<value>.*)$").unwrap());
static META_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ ]{4,}(?P<value>.*)$").unwrap());

/// Removes a leading `key: value` header block and stores it in
/// [`Session::meta`].
///
/// The header ends at the first blank line, which is removed with it. A line
/// that is neither a key nor an indented continuation ends the header and
/// stays in the document.
pub struct FrontMatter;

impl Preprocessor for FrontMatter {
    fn name(&self) -> &str {
        "front_matter"
    }

    fn run(&self, session: &mut Session, lines: Vec<String>) -> Vec<String> {
        let mut consumed = 0;
        let mut current_key: Option<String> = None;

        for line in &lines {
            if line.trim().is_empty() {
                if consumed > 0 {
                    consumed += 1;
                }
                break;
            }
            if let Some(caps) = META_KEY.captures(line) {
                let key = caps["key"].to_lowercase();
                session
                    .meta
                    .insert(key.clone(), caps["value"].trim().to_string());
                current_key = Some(key);
            } else if let (Some(caps), Some(key)) = (META_CONTINUATION.captures(line), &current_key) {
                if let Some(value) = session.meta.get_mut(key) {
                    value.push('\n');
                    value.push_str(caps["value"].trim());
                }
            } else {
                break;
            }
            consumed += 1;
        }

        if consumed == 0 {
            return lines;
        }
        tracing::debug!(lines = consumed, keys = session.meta.len(), "Stripped front matter");
        lines.into_iter().skip(consumed).collect()
    }
}

static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<fence>`{3,}|~{3,})[ ]*(?P<info>[\w+#.-]*)[ ]*$").unwrap());

/// Replaces fenced code blocks with a single stash placeholder line.
///
/// The placeholder is separated from neighbouring text by blank lines so the
/// block parser always sees it as a block of its own. Unterminated fences are
/// left untouched.
pub struct FencedCode;

impl FencedCode {
    fn closing_fence(lines: &[String], open: usize, fence: &str) -> Option<usize> {
        let marker = fence.chars().next()?;
        lines.iter().enumerate().skip(open + 1).find_map(|(i, line)| {
            let trimmed = line.trim_end();
            let closes = trimmed.len() >= fence.len() && trimmed.chars().all(|c| c == marker);
            closes.then_some(i)
        })
    }
}

impl Preprocessor for FencedCode {
    fn name(&self) -> &str {
        "fenced_code"
    }

    fn run(&self, session: &mut Session, lines: Vec<String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut i = 0;
        while i < lines.len() {
            let Some(caps) = FENCE_OPEN.captures(&lines[i]) else {
                out.push(lines[i].clone());
                i += 1;
                continue;
            };
            let Some(close) = Self::closing_fence(&lines, i, &caps["fence"]) else {
                out.push(lines[i].clone());
                i += 1;
                continue;
            };

            let info = Some(caps["info"].to_string()).filter(|s| !s.is_empty());
            let code = lines[i + 1..close].join("\n");
            let placeholder = session.stash.store(StashEntry { info, code });

            if out.last().is_some_and(|prev| !prev.is_empty()) {
                out.push(String::new());
            }
            out.push(placeholder);
            if lines.get(close + 1).is_some_and(|next| !next.is_empty()) {
                out.push(String::new());
            }
            i = close + 1;
        }
        out
    }
}
