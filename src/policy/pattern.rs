// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resource path patterns.
//!
//! | Pattern | Matches |
//! |---|---|
//! | `/v1/users/me` | exactly that path |
//! | `/v1/users/:id`, `/v1/users/{id}` | one non-empty segment in that position |
//! | `/v1/*/me` | one non-empty segment in that position |
//! | `/v1/admin/*` | any path with at least one segment below `/v1/admin` |
//! | `/*` | every path except `/` |
//!
//! A single trailing slash on the request path is ignored. Matching is
//! case-sensitive.

use super::PolicyError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `:name`, `{name}` or `*`
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    /// Trailing `/*`: any non-empty remainder is accepted.
    prefix: bool,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        let invalid = |reason: &str| PolicyError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let (body, prefix) = match rest.strip_suffix("/*") {
            Some(body) => (body, true),
            None if rest == "*" => ("", true),
            None => (rest, false),
        };

        if body.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
                prefix,
            });
        }

        let segments = body
            .split('/')
            .map(|segment| parse_segment(segment).ok_or_else(|| invalid("malformed segment")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments, prefix })
    }

    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.iter().any(|p| p.is_empty()) {
            return false;
        }

        let length_ok = if self.prefix {
            parts.len() > self.segments.len()
        } else {
            parts.len() == self.segments.len()
        };

        length_ok
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| match segment {
                    Segment::Literal(lit) => lit == part,
                    Segment::Wildcard => true,
                })
    }
}

fn parse_segment(segment: &str) -> Option<Segment> {
    if segment == "*" {
        return Some(Segment::Wildcard);
    }
    if let Some(name) = segment.strip_prefix(':') {
        return is_param_name(name).then_some(Segment::Wildcard);
    }
    if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return is_param_name(name).then_some(Segment::Wildcard);
    }
    let plain = !segment.is_empty() && !segment.contains(['*', '{', '}', ':']);
    plain.then(|| Segment::Literal(segment.to_string()))
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> PathPattern {
        PathPattern::parse(raw).unwrap()
    }

    #[test]
    fn exact() {
        let pattern = p("/v1/users/me");
        assert!(pattern.matches("/v1/users/me"));
        assert!(pattern.matches("/v1/users/me/"));
        assert!(!pattern.matches("/v1/users"));
        assert!(!pattern.matches("/v1/users/me/x"));
        assert!(!pattern.matches("/V1/users/me"));
    }

    #[test]
    fn params_and_single_wildcards() {
        for raw in ["/v1/users/:id", "/v1/users/{id}"] {
            let pattern = p(raw);
            assert!(pattern.matches("/v1/users/42"), "{raw}");
            assert!(!pattern.matches("/v1/users"), "{raw}");
            assert!(!pattern.matches("/v1/users/42/posts"), "{raw}");
            assert!(!pattern.matches("/v1/users//"), "{raw}");
        }
    }

    #[test]
    fn mid_path_wildcard_spans_one_segment() {
        let pattern = p("/v1/*/me");
        assert!(pattern.matches("/v1/users/me"));
        assert!(pattern.matches("/v1/admins/me/"));
        assert!(!pattern.matches("/v1/me"));
        assert!(!pattern.matches("/v1/users/42/me"));
        assert!(!pattern.matches("/v1/users/me/x"));
    }

    #[test]
    fn trailing_wildcard_is_a_prefix() {
        let pattern = p("/v1/admin/*");
        assert!(pattern.matches("/v1/admin/policy"));
        assert!(pattern.matches("/v1/admin/policy/reload"));
        assert!(!pattern.matches("/v1/admin"));
        assert!(!pattern.matches("/v1/administrator"));
    }

    #[test]
    fn root_patterns() {
        assert!(p("/").matches("/"));
        assert!(!p("/").matches("/x"));
        assert!(p("/*").matches("/anything/at/all"));
        assert!(!p("/*").matches("/"));
    }

    #[test]
    fn malformed_paths_never_match() {
        let pattern = p("/*");
        assert!(!pattern.matches(""));
        assert!(!pattern.matches("relative"));
        assert!(!pattern.matches("/a//b"));
    }

    #[test]
    fn invalid_patterns() {
        for raw in ["", "v1/users", "/v1//users", "/v1/us*rs", "/v1/:", "/v1/{}", "/v1/{id"] {
            assert!(
                matches!(PathPattern::parse(raw), Err(PolicyError::InvalidPattern { .. })),
                "{raw:?} should be rejected"
            );
        }
    }
}
