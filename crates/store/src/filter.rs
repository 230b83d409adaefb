use serde_json::Value;

/// A single predicate on a document
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `_id` equals the value
    Id(String),
    /// Top-level field equals the value (case-sensitive for strings)
    Eq { field: &'static str, value: Value },
    /// Numeric top-level field within inclusive bounds; a missing bound is open
    Range {
        field: &'static str,
        min: Option<i64>,
        max: Option<i64>,
    },
}

/// Conjunction of conditions. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().and(Condition::Id(id.into()))
    }

    pub fn eq(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.and(Condition::Eq {
            field,
            value: value.into(),
        })
    }

    pub fn range(self, field: &'static str, min: Option<i64>, max: Option<i64>) -> Self {
        self.and(Condition::Range { field, min, max })
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub order: Order,
}

impl Sort {
    pub fn asc(field: &'static str) -> Self {
        Self {
            field,
            order: Order::Asc,
        }
    }

    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            order: Order::Desc,
        }
    }
}
