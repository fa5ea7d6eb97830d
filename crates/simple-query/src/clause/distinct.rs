use super::Clause;

/// `SELECT DISTINCT` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DistinctClause {
    enabled: bool,
}

impl DistinctClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Clause for DistinctClause {
    fn is_empty(&self) -> bool {
        !self.enabled
    }

    fn write_sql(&self, out: &mut String) {
        if self.enabled {
            out.push_str(" DISTINCT");
        }
    }
}
