use crate::record::Record;

/// Materialized query result; iteration yields records in result order.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    records: Vec<Record>,
    pos: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(records: Vec<Record>) -> Self {
        Self { records, pos: 0 }
    }

    pub fn advance(&mut self) -> Option<Record> {
        let r = self.records.get(self.pos).cloned();
        if r.is_some() {
            self.pos += 1;
        }
        r
    }

    pub const fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Total number of records in the result, regardless of position.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn to_vec(self) -> Vec<Record> {
        self.records
    }
}

impl Iterator for Cursor {
    type Item = Record;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
