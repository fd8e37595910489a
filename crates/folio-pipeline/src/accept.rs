// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Accept patterns: which files a tool takes.
//
// A pattern is a comma-separated list of alternatives. Each alternative is an
// exact media type (`application/pdf`), a media-type wildcard (`image/*`) or
// a file extension (`.docx`). Matching is case-insensitive. An empty pattern
// accepts everything.

use folio_core::StagedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptPattern<'a>(&'a str);

impl<'a> AcceptPattern<'a> {
    pub fn new(pattern: &'a str) -> Self {
        Self(pattern)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    fn alternatives(&self) -> impl Iterator<Item = &'a str> {
        self.0.split(',').map(str::trim).filter(|alt| !alt.is_empty())
    }

    pub fn matches(&self, file: &StagedFile) -> bool {
        let mut alternatives = self.alternatives().peekable();
        if alternatives.peek().is_none() {
            return true;
        }
        let media_type = file.media_type().to_ascii_lowercase();
        let name = file.name().to_ascii_lowercase();
        alternatives.any(|alt| {
            let alt = alt.to_ascii_lowercase();
            if alt.starts_with('.') {
                name.ends_with(&alt)
            } else if let Some(family) = alt.strip_suffix("/*") {
                media_type
                    .split_once('/')
                    .is_some_and(|(top, _)| top == family)
            } else {
                media_type == alt
            }
        })
    }
}
