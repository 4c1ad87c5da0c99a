//! Canonical record of mode changes.

use std::fmt;

/// One mode delta: `+b mask`, `-o nick`, `+n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub letter: char,
    pub adding: bool,
    pub param: Option<String>,
}

impl ModeChange {
    pub fn new(letter: char, adding: bool, param: Option<&str>) -> Self {
        Self {
            letter,
            adding,
            param: param.map(str::to_string),
        }
    }
}

impl fmt::Display for ModeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.adding { '+' } else { '-' };
        match &self.param {
            Some(p) => write!(f, "{sign}{} {p}", self.letter),
            None => write!(f, "{sign}{}", self.letter),
        }
    }
}

/// The subsequence of a request that was actually applied, in order.
///
/// This is what gets broadcast, handed to `Mode` hooks and relayed to
/// linked servers; it is never re-derived by re-running validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeRecord {
    changes: Vec<ModeChange>,
}

impl ChangeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: ModeChange) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModeChange> {
        self.changes.iter()
    }

    pub fn changes(&self) -> &[ModeChange] {
        &self.changes
    }

    /// Split into MODE line arguments (`[modestring, params...]`) with at
    /// most `max_params` parameters each.
    pub fn lines(&self, max_params: usize) -> Vec<Vec<String>> {
        let max_params = max_params.max(1);
        let mut lines = Vec::new();
        let mut modes = String::new();
        let mut params: Vec<String> = Vec::new();
        let mut sign: Option<bool> = None;

        for change in &self.changes {
            if change.param.is_some() && params.len() == max_params {
                let mut line = vec![std::mem::take(&mut modes)];
                line.append(&mut params);
                lines.push(line);
                sign = None;
            }
            if sign != Some(change.adding) {
                modes.push(if change.adding { '+' } else { '-' });
                sign = Some(change.adding);
            }
            modes.push(change.letter);
            if let Some(p) = &change.param {
                params.push(p.clone());
            }
        }

        if !modes.is_empty() {
            let mut line = vec![modes];
            line.append(&mut params);
            lines.push(line);
        }
        lines
    }
}

impl FromIterator<ModeChange> for ChangeRecord {
    fn from_iter<I: IntoIterator<Item = ModeChange>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeRecord {
    type Item = &'a ModeChange;
    type IntoIter = std::slice::Iter<'a, ModeChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.lines(usize::MAX);
        if let Some(line) = lines.first() {
            f.write_str(&line.join(" "))?;
        }
        Ok(())
    }
}
