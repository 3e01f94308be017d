/// Append-only log of submitted input lines, numbered from 1.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries paired with their display index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.as_str()))
    }
}
