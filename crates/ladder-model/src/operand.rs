//! Operand text parsing and tag resolution helpers.
//!
//! Operands arrive as raw strings from the rung parser: a bare tag name,
//! `Tag.Member`, `Tag[3]`, `Tag[3].Member`, or a numeric literal. An operand
//! may also carry a display-only description after a `;` separator, which is
//! stripped before any resolution.

use smol_str::SmolStr;

/// A resolved view of one operand string.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandRef {
    /// Numeric constant (optionally signed, optionally decimal).
    Literal(f64),
    /// Reference to a tag, possibly with an array index and/or member.
    Tag(TagRef),
}

/// Decomposed tag reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Base tag name, without index or member suffix.
    pub base: SmolStr,
    /// Array index, if the operand was `Base[n]` or `Base[n].Member`.
    pub index: Option<u32>,
    /// Member name, if the operand was `Base.Member` or `Base[n].Member`.
    pub member: Option<SmolStr>,
}

impl TagRef {
    /// Full lookup key as the parser wrote it, description stripped.
    #[must_use]
    pub fn key(&self) -> SmolStr {
        let mut key = String::from(self.base.as_str());
        if let Some(index) = self.index {
            key.push('[');
            key.push_str(&index.to_string());
            key.push(']');
        }
        if let Some(member) = &self.member {
            key.push('.');
            key.push_str(member);
        }
        SmolStr::new(key)
    }
}

/// Strip the display-only description suffix (`; human text`) and
/// surrounding whitespace.
#[must_use]
pub fn strip_description(raw: &str) -> &str {
    match raw.split_once(';') {
        Some((head, _)) => head.trim(),
        None => raw.trim(),
    }
}

/// Base tag name with any `[index]` / `.member` suffix removed.
///
/// Used by force matching: a force on `Arr` applies to reads of `Arr[3]`.
#[must_use]
pub fn base_tag(raw: &str) -> &str {
    let stripped = strip_description(raw);
    let end = stripped
        .find(['[', '.'])
        .unwrap_or(stripped.len());
    stripped[..end].trim()
}

/// Parse one operand string into a literal or tag reference.
///
/// Anything that is not a well-formed numeric literal is treated as a tag
/// reference; resolution of an unseen tag later degrades to a default value
/// rather than an error.
#[must_use]
pub fn parse_operand(raw: &str) -> OperandRef {
    let stripped = strip_description(raw);
    if let Some(value) = parse_literal(stripped) {
        return OperandRef::Literal(value);
    }
    OperandRef::Tag(parse_tag(stripped))
}

/// Parse a numeric literal: optional sign, digits, optional decimal part.
///
/// Deliberately stricter than `f64::from_str` so that `inf`, `NaN`, and
/// exponent forms read as tag names, matching the parser's vocabulary.
#[must_use]
pub fn parse_literal(text: &str) -> Option<f64> {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    if body.is_empty() {
        return None;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    for ch in body.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    text.parse::<f64>().ok()
}

fn parse_tag(text: &str) -> TagRef {
    if let Some(open) = text.find('[') {
        let base = SmolStr::new(text[..open].trim());
        let rest = &text[open + 1..];
        if let Some(close) = rest.find(']') {
            let index = rest[..close].trim().parse::<u32>().ok();
            let tail = rest[close + 1..].trim();
            let member = tail
                .strip_prefix('.')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(SmolStr::new);
            return TagRef {
                base,
                index,
                member,
            };
        }
        // Unterminated index: keep the whole text as the base so the
        // reference still resolves to a stable default.
        return TagRef {
            base: SmolStr::new(text),
            index: None,
            member: None,
        };
    }
    match text.split_once('.') {
        Some((base, member)) if !member.trim().is_empty() => TagRef {
            base: SmolStr::new(base.trim()),
            index: None,
            member: Some(SmolStr::new(member.trim())),
        },
        _ => TagRef {
            base: SmolStr::new(text),
            index: None,
            member: None,
        },
    }
}
