use sea_orm::{ColumnTrait, Condition};

/// Helper for building free-text search conditions
pub struct SearchBuilder {
    conditions: Vec<Condition>,
}

impl Default for SearchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchBuilder {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Add a LIKE condition for text search
    pub fn add_like<C: ColumnTrait>(mut self, column: C, pattern: &str) -> Self {
        let pattern = pattern.trim();
        if !pattern.is_empty() {
            self.conditions
                .push(Condition::all().add(column.contains(pattern)));
        }
        self
    }

    /// Build the final condition; any column may match
    pub fn build(self) -> Option<Condition> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(
                self.conditions
                    .into_iter()
                    .fold(Condition::any(), |acc, cond| acc.add(cond)),
            )
        }
    }
}
