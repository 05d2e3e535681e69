//! Path templates: the ordered segment shape of one endpoint.

use std::collections::HashSet;
use std::fmt;

use modkit_edm::TypeRef;

use crate::context::TranslateContext;
use crate::error::Error;
use crate::options::RouteOptions;
use crate::segment::{SegmentKind, SegmentTemplate};

const REF_SUFFIX: &str = "/$ref";

/// Ordered, immutable sequence of [`SegmentTemplate`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathTemplate {
    segments: Vec<SegmentTemplate>,
}

impl PathTemplate {
    #[must_use]
    pub fn new(segments: Vec<SegmentTemplate>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[SegmentTemplate] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Type yielded by the whole path: the last segment that has one.
    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        self.segments.iter().rev().find_map(SegmentTemplate::edm_type)
    }

    /// Every literal route string, in depth-first order without duplicates.
    ///
    /// Key literals attach to the preceding literal (before a trailing `/$ref`);
    /// all other literals are joined with `/`.
    #[must_use]
    pub fn templates(&self, options: &RouteOptions) -> Vec<String> {
        let per_segment: Vec<Vec<String>> =
            self.segments.iter().map(|s| s.templates(options)).collect();

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![(0usize, String::new())];
        while let Some((index, prefix)) = stack.pop() {
            let Some(literals) = per_segment.get(index) else {
                if seen.insert(prefix.clone()) {
                    out.push(prefix);
                }
                continue;
            };
            let is_key = self.segments[index].kind() == SegmentKind::Key;
            // Reverse so the first literal is expanded first.
            for literal in literals.iter().rev() {
                stack.push((index + 1, combine(&prefix, literal, is_key)));
            }
        }
        out
    }

    /// Resolve every segment in order, stopping at the first that does not match.
    ///
    /// # Errors
    /// Propagates segment errors (invalid function parameter values, alias cycles).
    pub fn translate(&self, ctx: &mut TranslateContext<'_>) -> Result<bool, Error> {
        for (position, segment) in self.segments.iter().enumerate() {
            if !segment.try_translate(ctx)? {
                tracing::debug!(
                    template = %self,
                    position,
                    kind = ?segment.kind(),
                    "Path template segment did not match"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn combine(prefix: &str, literal: &str, is_key: bool) -> String {
    if is_key {
        match prefix.strip_suffix(REF_SUFFIX) {
            Some(head) => format!("{head}{literal}{REF_SUFFIX}"),
            None => format!("{prefix}{literal}"),
        }
    } else if prefix.is_empty() {
        literal.to_owned()
    } else {
        format!("{prefix}/{literal}")
    }
}

impl FromIterator<SegmentTemplate> for PathTemplate {
    fn from_iter<I: IntoIterator<Item = SegmentTemplate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Parenthesis keys and qualified operation names.
impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.templates(&RouteOptions::canonical()).first() {
            Some(literal) => f.write_str(literal),
            None => Ok(()),
        }
    }
}
