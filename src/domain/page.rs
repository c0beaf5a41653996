use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSort {
    #[default]
    Balance,
    Expiration,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSort {
    #[default]
    Timestamp,
    Amount,
    Id,
}

/// A zero-based page request with an ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<S> {
    pub page: usize,
    pub size: usize,
    pub sort: S,
    pub direction: Direction,
}

impl<S: Default> PageRequest<S> {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: S::default(),
            direction: Direction::Asc,
        }
    }
}

impl<S: Default> Default for PageRequest<S> {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl<S> PageRequest<S> {
    pub fn sorted_by(mut self, sort: S, direction: Direction) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Sorts `items` with `cmp` in the requested direction and cuts out this page.
    pub fn apply<T, F>(&self, mut items: Vec<T>, cmp: F) -> Vec<T>
    where
        F: Fn(&T, &T) -> std::cmp::Ordering,
    {
        items.sort_by(|a, b| match self.direction {
            Direction::Asc => cmp(a, b),
            Direction::Desc => cmp(b, a),
        });
        items.into_iter().skip(self.offset()).take(self.size).collect()
    }
}
