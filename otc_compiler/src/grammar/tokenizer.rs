//! Chain tokenizer
//!
//! A chain is a `.`-separated list of segments. Each segment is
//!
//! ```text
//! name ( '(' TypeName ')' )? ( '[' body ']' )? ( '<K>' | '<V>' )?
//! ```
//!
//! where `body` is `*`, a literal index, an anchor form (`^`, `^*`, `*^`) or a
//! two-part map body such as `*,*`. Separators inside `<>`, `[]` and `()` do
//! not split.

use super::error::{SyntaxError, SyntaxResult};
use super::notation::{
    Anchor, MapSide, ANCHOR, COLLECTION_NOTATION, MAP_NOTATION, POST_ANCHOR, PRE_ANCHOR,
    SEGMENT_SEPARATOR,
};
use crate::config::compile_time::grammar::{
    MAX_CHAIN_LENGTH, MAX_IDENTIFIER_LENGTH, MAX_TOKENS_PER_CHAIN,
};
use crate::utils::Span;
use serde::{Deserialize, Serialize};

/// One parsed segment of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainToken {
    /// Segment text exactly as written, anchors and literal indexes included
    pub raw: String,
    /// Normalized form: `name`, `name[*]`, `name<K>`, `name<V>` or `name[*,*]`
    pub otc: String,
    pub field_name: String,
    pub index: usize,
    pub span: Span,
    pub has_collection_notation: bool,
    pub has_map_notation: bool,
    pub map_side: Option<MapSide>,
    pub anchor: Option<Anchor>,
    /// Concrete type written inline as `field(Type)`
    pub type_hint: Option<String>,
    /// Literal element index written as `field[3]`
    pub literal_index: Option<usize>,
}

impl ChainToken {
    /// Collection or map notation present
    pub fn has_notation(&self) -> bool {
        self.has_collection_notation || self.has_map_notation
    }

    pub fn is_anchored(&self) -> bool {
        self.raw.contains(ANCHOR)
    }

    pub fn is_pre_anchored(&self) -> bool {
        self.raw.contains(PRE_ANCHOR)
    }

    pub fn is_post_anchored(&self) -> bool {
        self.raw.contains(POST_ANCHOR)
    }
}

/// A chain split into raw and normalized tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedChain {
    pub chain: String,
    pub tokens: Vec<ChainToken>,
}

impl TokenizedChain {
    pub fn raw_tokens(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.raw.as_str()).collect()
    }

    pub fn otc_tokens(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.otc.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    /// Normalized chain, independent of literal indexes and anchors
    pub fn sanitized(&self) -> String {
        self.otc_tokens().join(".")
    }

    /// Normalized chain up to and including token `index`
    pub fn sanitized_prefix(&self, index: usize) -> String {
        self.tokens
            .iter()
            .take(index + 1)
            .map(|t| t.otc.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Tokens carrying collection or map notation
    pub fn collection_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.has_notation()).count()
    }

    pub fn anchor_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.anchor.is_some()).count()
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor_count() > 0
    }

    /// Index of the last token carrying collection or map notation
    pub fn last_collection_index(&self) -> Option<usize> {
        self.tokens.iter().rposition(|t| t.has_notation())
    }
}

/// Split a chain into tokens.
pub fn tokenize(chain: &str) -> SyntaxResult<TokenizedChain> {
    if chain.len() > MAX_CHAIN_LENGTH {
        return Err(SyntaxError::ChainTooLong {
            length: chain.len(),
            limit: MAX_CHAIN_LENGTH,
        });
    }
    if chain.trim().is_empty() {
        return Err(SyntaxError::empty_segment(chain, 0));
    }

    let segments = split_segments(chain)?;
    if segments.len() > MAX_TOKENS_PER_CHAIN {
        return Err(SyntaxError::TooManyTokens {
            chain: chain.to_string(),
            count: segments.len(),
            limit: MAX_TOKENS_PER_CHAIN,
        });
    }

    let tokens = segments
        .into_iter()
        .enumerate()
        .map(|(index, span)| parse_segment(chain, index, span))
        .collect::<SyntaxResult<Vec<_>>>()?;

    Ok(TokenizedChain {
        chain: chain.to_string(),
        tokens,
    })
}

fn closing_for(open: char) -> char {
    match open {
        '[' => ']',
        '<' => '>',
        _ => ')',
    }
}

/// Segment spans, splitting on separators outside of any bracket pair
fn split_segments(chain: &str) -> SyntaxResult<Vec<Span>> {
    let mut spans = Vec::new();
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut start = 0;

    for (offset, ch) in chain.char_indices() {
        match ch {
            '[' | '<' | '(' => open.push((ch, offset)),
            ']' | '>' | ')' => match open.pop() {
                Some((opener, _)) if closing_for(opener) == ch => {}
                _ => return Err(SyntaxError::unbalanced(chain, ch, offset)),
            },
            SEGMENT_SEPARATOR if open.is_empty() => {
                if offset == start {
                    return Err(SyntaxError::empty_segment(chain, offset));
                }
                spans.push(Span::new(start, offset));
                start = offset + 1;
            }
            _ => {}
        }
    }

    if let Some((opener, offset)) = open.first() {
        return Err(SyntaxError::unbalanced(chain, *opener, *offset));
    }
    if start >= chain.len() {
        return Err(SyntaxError::empty_segment(chain, start));
    }
    spans.push(Span::new(start, chain.len()));
    Ok(spans)
}

fn parse_segment(chain: &str, index: usize, span: Span) -> SyntaxResult<ChainToken> {
    let segment = &chain[span.start..span.end];

    let name_len = segment
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(segment.len());
    let field_name = &segment[..name_len];

    if field_name.is_empty() {
        let first = segment.chars().next().unwrap_or(' ');
        return Err(match first {
            ANCHOR => SyntaxError::misplaced_marker(
                chain,
                "^",
                "anchors belong inside a collection bracket",
                Span::at(span.start),
            ),
            '<' | '[' | '(' => SyntaxError::misplaced_marker(
                chain,
                &first.to_string(),
                "notation must follow a field name",
                Span::at(span.start),
            ),
            _ => SyntaxError::invalid_identifier(chain, segment, span),
        });
    }
    if field_name.starts_with(|c: char| c.is_ascii_digit())
        || field_name.len() > MAX_IDENTIFIER_LENGTH
    {
        return Err(SyntaxError::invalid_identifier(chain, segment, span));
    }

    let mut type_hint = None;
    let mut bracket: Option<(&str, Span)> = None;
    let mut marker: Option<(MapSide, Span)> = None;
    let mut cursor = name_len;

    while cursor < segment.len() {
        let rest = &segment[cursor..];
        let at = span.start + cursor;
        let first = rest.chars().next().unwrap_or(' ');

        match first {
            '(' | '[' | '<' => {
                let close = closing_for(first);
                let end = rest
                    .find(close)
                    .ok_or_else(|| SyntaxError::unbalanced(chain, first, at))?;
                let body = &rest[1..end];
                let part_span = Span::new(at, at + end + 1);

                match first {
                    '(' => {
                        if type_hint.is_some() || bracket.is_some() || marker.is_some() {
                            return Err(SyntaxError::misplaced_marker(
                                chain,
                                &rest[..=end],
                                "a type hint must directly follow the field name",
                                part_span,
                            ));
                        }
                        let hint = body.trim();
                        if hint.is_empty() {
                            return Err(SyntaxError::invalid_identifier(chain, segment, part_span));
                        }
                        type_hint = Some(hint.to_string());
                    }
                    '[' => {
                        if bracket.is_some() {
                            return Err(SyntaxError::misplaced_marker(
                                chain,
                                &rest[..=end],
                                "a segment takes a single bracket",
                                part_span,
                            ));
                        }
                        if marker.is_some() {
                            return Err(SyntaxError::misplaced_marker(
                                chain,
                                &rest[..=end],
                                "the bracket must precede the key/value marker",
                                part_span,
                            ));
                        }
                        bracket = Some((body, part_span));
                    }
                    _ => {
                        let text = &rest[..=end];
                        let side = MapSide::from_marker(text).ok_or_else(|| {
                            SyntaxError::misplaced_marker(
                                chain,
                                text,
                                "unknown marker, expected <K> or <V>",
                                part_span,
                            )
                        })?;
                        if marker.is_some() {
                            return Err(SyntaxError::misplaced_marker(
                                chain,
                                text,
                                "a segment takes a single key/value marker",
                                part_span,
                            ));
                        }
                        marker = Some((side, part_span));
                    }
                }
                cursor += end + 1;
            }
            ANCHOR => {
                return Err(SyntaxError::misplaced_marker(
                    chain,
                    "^",
                    "anchors belong inside a collection bracket",
                    Span::at(at),
                ))
            }
            _ => return Err(SyntaxError::invalid_identifier(chain, segment, span)),
        }
    }

    let mut has_collection_notation = false;
    let mut has_map_notation = marker.is_some();
    let mut anchor = None;
    let mut literal_index = None;

    if let Some((body, bracket_span)) = bracket {
        let body = body.trim();
        if let Some((left, right)) = body.split_once(',') {
            if left.trim().is_empty() || right.trim().is_empty() || right.contains(',') {
                return Err(SyntaxError::misplaced_marker(
                    chain,
                    &format!("[{}]", body),
                    "map notation takes exactly two parts",
                    bracket_span,
                ));
            }
            // Kept on the token; resolution rejects it against the map field
            if let Some(part) = [left, right].into_iter().find(|p| p.contains(ANCHOR)) {
                anchor = Some(Anchor::from_bracket_body(part.trim()).ok_or_else(|| {
                    SyntaxError::misplaced_marker(
                        chain,
                        part.trim(),
                        "expected ^, ^* or *^",
                        bracket_span,
                    )
                })?);
            }
            has_map_notation = true;
        } else if body == "*" {
            has_collection_notation = true;
        } else if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
            has_collection_notation = true;
            literal_index = body.parse().ok();
        } else if let Some(parsed) = Anchor::from_bracket_body(body) {
            has_collection_notation = true;
            anchor = Some(parsed);
        } else {
            let reason = if body.contains(ANCHOR) {
                "expected [^], [^*] or [*^]"
            } else {
                "expected '*', an index, an anchor or a two-part map body"
            };
            return Err(SyntaxError::misplaced_marker(
                chain,
                &format!("[{}]", body),
                reason,
                bracket_span,
            ));
        }
    }

    if let Some((side, marker_span)) = marker {
        if has_collection_notation {
            return Err(SyntaxError::misplaced_marker(
                chain,
                side.marker(),
                "key/value markers need map notation, not collection notation",
                marker_span,
            ));
        }
    }

    let map_side = marker.map(|(side, _)| side);
    let otc = match (has_collection_notation, has_map_notation, map_side) {
        (true, _, _) => format!("{}{}", field_name, COLLECTION_NOTATION),
        (_, true, Some(side)) => format!("{}{}", field_name, side.marker()),
        (_, true, None) => format!("{}{}", field_name, MAP_NOTATION),
        _ => field_name.to_string(),
    };

    Ok(ChainToken {
        raw: segment.to_string(),
        otc,
        field_name: field_name.to_string(),
        index,
        span,
        has_collection_notation,
        has_map_notation,
        map_side,
        anchor,
        type_hint,
        literal_index,
    })
}
