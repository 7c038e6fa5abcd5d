//! Unified diff parsing.
//!
//! [`parse`] turns the text returned by the forge's diff endpoints into
//! [`DiffFile`]s with per-line old/new numbers. Lines it does not recognise are
//! dropped, so a partially malformed diff still renders what it can.

use std::iter::Peekable;
use std::str::Lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Deleted,
}

/// A single line in a diff hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
    /// Set for context and deleted lines.
    pub old_num: Option<usize>,
    /// Set for context and added lines.
    pub new_num: Option<usize>,
}

/// All changed lines of one file, in the order they appear in the diff
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffFile {
    pub old_path: String,
    pub new_path: String,
    pub lines: Vec<DiffLine>,
}

impl DiffFile {
    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Added)
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Deleted)
            .count()
    }

    pub fn is_rename(&self) -> bool {
        self.old_path != self.new_path && self.old_path != DEV_NULL && self.new_path != DEV_NULL
    }

    pub fn display_path(&self) -> String {
        if self.is_rename() {
            format!("{} → {}", self.old_path, self.new_path)
        } else if self.new_path == DEV_NULL {
            self.old_path.clone()
        } else {
            self.new_path.clone()
        }
    }
}

const DEV_NULL: &str = "/dev/null";

/// Parser state for the file currently being accumulated
struct Current {
    file: DiffFile,
    /// Started by `diff --git`; path markers are then only honoured before the first hunk.
    git_header: bool,
    in_hunk: bool,
    old_line: usize,
    new_line: usize,
    /// Lines the current hunk header still promises on each side.
    old_left: usize,
    new_left: usize,
}

impl Current {
    fn new(old_path: String, new_path: String, git_header: bool) -> Self {
        Self {
            file: DiffFile {
                old_path,
                new_path,
                lines: Vec::new(),
            },
            git_header,
            in_hunk: false,
            old_line: 0,
            new_line: 0,
            old_left: 0,
            new_left: 0,
        }
    }

    fn hunk_open(&self) -> bool {
        self.in_hunk && (self.old_left > 0 || self.new_left > 0)
    }

    fn push(&mut self, kind: LineKind, text: &str) {
        let (old_num, new_num) = match kind {
            LineKind::Added => {
                self.new_left = self.new_left.saturating_sub(1);
                self.new_line += 1;
                (None, Some(self.new_line - 1))
            }
            LineKind::Deleted => {
                self.old_left = self.old_left.saturating_sub(1);
                self.old_line += 1;
                (Some(self.old_line - 1), None)
            }
            LineKind::Context => {
                self.old_left = self.old_left.saturating_sub(1);
                self.new_left = self.new_left.saturating_sub(1);
                self.old_line += 1;
                self.new_line += 1;
                (Some(self.old_line - 1), Some(self.new_line - 1))
            }
        };
        self.file.lines.push(DiffLine {
            kind,
            text: text.to_string(),
            old_num,
            new_num,
        });
    }
}

/// Parse unified diff text into files. Empty input yields no files.
pub fn parse(text: &str) -> Vec<DiffFile> {
    let mut files = Vec::new();
    let mut current: Option<Current> = None;
    let mut lines: Peekable<Lines<'_>> = text.lines().peekable();

    while let Some(line) = lines.next() {
        // New file header: diff --git a/old b/new
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(done) = current.take() {
                files.push(done.file);
            }
            let (old_path, new_path) = split_git_header(rest);
            current = Some(Current::new(old_path, new_path, true));
            continue;
        }

        // `diff -u` output has no git header; a ---/+++ pair opens a file once
        // the previous hunk has delivered every line its header announced.
        let marker_pair = line.starts_with("--- ")
            && lines.peek().is_some_and(|next| next.starts_with("+++ "));
        let accepts_markers = match &current {
            Some(cur) if cur.git_header => !cur.in_hunk,
            Some(cur) => !cur.hunk_open(),
            None => true,
        };
        if marker_pair && accepts_markers {
            let old_path = marker_path(&line[4..]);
            let new_path = lines.next().map(|l| marker_path(&l[4..])).unwrap_or_default();
            match current.as_mut().filter(|cur| !cur.in_hunk) {
                Some(cur) => {
                    cur.file.old_path = old_path;
                    cur.file.new_path = new_path;
                }
                None => {
                    if let Some(done) = current.take() {
                        files.push(done.file);
                    }
                    current = Some(Current::new(old_path, new_path, false));
                }
            }
            continue;
        }

        let Some(cur) = current.as_mut() else {
            continue;
        };

        if !cur.in_hunk {
            // A lone path marker before the first hunk still updates its side.
            if let Some(path) = line.strip_prefix("--- ") {
                cur.file.old_path = marker_path(path);
                continue;
            }
            if let Some(path) = line.strip_prefix("+++ ") {
                cur.file.new_path = marker_path(path);
                continue;
            }
        }

        if line.starts_with("@@") {
            if let Some(((old_start, old_len), (new_start, new_len))) = parse_hunk_header(line) {
                cur.old_line = old_start;
                cur.new_line = new_start;
                cur.old_left = old_len;
                cur.new_left = new_len;
                cur.in_hunk = true;
            }
            continue;
        }

        if !cur.in_hunk {
            // index, mode, similarity and other metadata
            continue;
        }

        match line.as_bytes().first() {
            Some(b'+') => cur.push(LineKind::Added, &line[1..]),
            Some(b'-') => cur.push(LineKind::Deleted, &line[1..]),
            Some(b' ') => cur.push(LineKind::Context, &line[1..]),
            // Blank context lines lose their leading space in some pipelines.
            None => cur.push(LineKind::Context, ""),
            // `\ No newline at end of file` and anything else
            Some(_) => {}
        }
    }

    if let Some(done) = current {
        files.push(done.file);
    }
    files
}

/// Split `a/old b/new` into its two paths.
fn split_git_header(rest: &str) -> (String, String) {
    match rest.rsplit_once(" b/") {
        Some((old, new)) => {
            let old = old.strip_prefix("a/").unwrap_or(old);
            (old.to_string(), new.to_string())
        }
        None => (rest.to_string(), rest.to_string()),
    }
}

/// Path from a `---`/`+++` marker, without the `a/`/`b/` prefix or a trailing timestamp.
fn marker_path(raw: &str) -> String {
    let raw = raw.split('\t').next().unwrap_or(raw).trim_end();
    if raw == DEV_NULL {
        return raw.to_string();
    }
    raw.strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw)
        .to_string()
}

/// Parse `@@ -old_start[,len] +new_start[,len] @@` into `(start, len)` per side.
fn parse_hunk_header(line: &str) -> Option<((usize, usize), (usize, usize))> {
    let mut parts = line.strip_prefix("@@")?.split_whitespace();
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    Some((parse_range(old)?, parse_range(new)?))
}

/// `start,len` or a bare `start`, whose length is 1.
fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// One displayable row of a [`DiffDocument`]
#[derive(Debug, Clone, Copy)]
pub enum DiffRow<'a> {
    FileHeader(&'a DiffFile),
    Line(&'a DiffLine),
}

/// Parsed diff flattened into rows: a header row per file followed by its lines
#[derive(Debug, Clone, Default)]
pub struct DiffDocument {
    pub title: String,
    pub files: Vec<DiffFile>,
    file_starts: Vec<usize>,
    row_count: usize,
}

impl DiffDocument {
    pub fn new(title: impl Into<String>, files: Vec<DiffFile>) -> Self {
        let mut file_starts = Vec::with_capacity(files.len());
        let mut row_count = 0;
        for file in &files {
            file_starts.push(row_count);
            row_count += 1 + file.lines.len();
        }
        Self {
            title: title.into(),
            files,
            file_starts,
            row_count,
        }
    }

    pub fn from_text(title: impl Into<String>, text: &str) -> Self {
        Self::new(title, parse(text))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn row(&self, index: usize) -> Option<DiffRow<'_>> {
        if index >= self.row_count {
            return None;
        }
        let file_index = match self.file_starts.binary_search(&index) {
            Ok(i) => return Some(DiffRow::FileHeader(&self.files[i])),
            Err(i) => i - 1,
        };
        let offset = index - self.file_starts[file_index] - 1;
        self.files[file_index].lines.get(offset).map(DiffRow::Line)
    }

    /// Index of the file that owns `row`.
    pub fn file_at(&self, row: usize) -> Option<usize> {
        if row >= self.row_count {
            return None;
        }
        match self.file_starts.binary_search(&row) {
            Ok(i) => Some(i),
            Err(i) => Some(i - 1),
        }
    }

    pub fn next_file_row(&self, from: usize) -> Option<usize> {
        self.file_starts.iter().copied().find(|&start| start > from)
    }

    pub fn prev_file_row(&self, from: usize) -> Option<usize> {
        self.file_starts
            .iter()
            .copied()
            .rev()
            .find(|&start| start < from)
    }

    pub fn additions(&self) -> usize {
        self.files.iter().map(DiffFile::additions).sum()
    }

    pub fn deletions(&self) -> usize {
        self.files.iter().map(DiffFile::deletions).sum()
    }
}
