//! # Content Negotiation
//!
//! The final handler offers exactly two representations, HTML and plain
//! text, and asks a [`Negotiate`] implementation which one the client
//! prefers. Anything undecided falls back to plain text.
//!
//! [`Accept`] is the implementation used for real requests: it reads the
//! `Accept` header and picks HTML only when the client asks for it
//! explicitly.

use axum::http::{header::ACCEPT, HeaderMap};

/// A representation the final handler can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Html,
    Text,
}

impl MediaKind {
    /// Candidates offered to the negotiator, in preference order.
    pub const CANDIDATES: [MediaKind; 2] = [MediaKind::Html, MediaKind::Text];

    /// Bare media type, without parameters.
    pub fn media_type(self) -> &'static str {
        match self {
            MediaKind::Html => "text/html",
            MediaKind::Text => "text/plain",
        }
    }

    /// Full `Content-Type` header value.
    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Html => "text/html; charset=utf-8",
            MediaKind::Text => "text/plain; charset=utf-8",
        }
    }
}

/// Capability that picks the preferred representation from a candidate
/// list, or `None` when nothing is acceptable or the choice is ambiguous.
pub trait Negotiate {
    fn preferred(&self, candidates: &[MediaKind]) -> Option<MediaKind>;
}

/// Negotiated kind for the final response; plain text when undecided.
pub fn negotiate<N: Negotiate + ?Sized>(negotiator: &N) -> MediaKind {
    negotiator
        .preferred(&MediaKind::CANDIDATES)
        .unwrap_or(MediaKind::Text)
}

/// One media range of an `Accept` header.
#[derive(Clone, Debug, PartialEq)]
struct MediaRange {
    kind: String,
    subtype: String,
    quality: f32,
}

impl MediaRange {
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let (kind, subtype) = parts.next()?.trim().split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in parts {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = value.trim().parse::<f32>().ok()?.clamp(0.0, 1.0);
                }
            }
        }

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            quality,
        })
    }

    /// Specificity of this range against `media_type`: 2 exact, 1 `type/*`,
    /// 0 `*/*`, `None` when it does not match.
    fn specificity(&self, media_type: &str) -> Option<u8> {
        let (kind, subtype) = media_type.split_once('/')?;
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", "*") => Some(0),
            (k, "*") if k == kind => Some(1),
            (k, s) if k == kind && s == subtype => Some(2),
            _ => None,
        }
    }
}

/// Parsed `Accept` request header.
///
/// # Example
/// ```
/// use final_handler::handler::negotiate::{negotiate, Accept, MediaKind};
///
/// let browser = Accept::parse("text/html,application/xhtml+xml,*/*;q=0.8");
/// assert_eq!(negotiate(&browser), MediaKind::Html);
///
/// let curl = Accept::parse("*/*");
/// assert_eq!(negotiate(&curl), MediaKind::Text);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accept {
    ranges: Vec<MediaRange>,
}

impl Accept {
    pub fn parse(header: &str) -> Self {
        Self {
            ranges: header.split(',').filter_map(MediaRange::parse).collect(),
        }
    }

    /// Reads every `Accept` header in `headers`. Missing or non-ASCII
    /// values yield an empty (undecided) preference.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ranges = headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| Self::parse(v).ranges)
            .collect();
        Self { ranges }
    }

    /// Quality and specificity of the most specific range matching `kind`.
    fn rank(&self, kind: MediaKind) -> Option<(f32, u8)> {
        self.ranges
            .iter()
            .filter_map(|r| r.specificity(kind.media_type()).map(|s| (r.quality, s)))
            .max_by_key(|(_, s)| *s)
    }
}

impl Negotiate for Accept {
    fn preferred(&self, candidates: &[MediaKind]) -> Option<MediaKind> {
        let mut best: Option<(MediaKind, f32, u8)> = None;

        for &kind in candidates {
            let Some((quality, specificity)) = self.rank(kind) else {
                continue;
            };
            if quality <= 0.0 {
                continue;
            }

            best = match best {
                None if specificity == 2 => Some((kind, quality, specificity)),
                // Wildcard matches alone never pick a representation.
                None => None,
                Some((_, q, _)) if quality > q => Some((kind, quality, specificity)),
                keep => keep,
            };
        }

        best.map(|(kind, _, _)| kind)
    }
}
