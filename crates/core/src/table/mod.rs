//! Filtering and sorting for the admin list tables.
//!
//! Filtering is conjunctive substring matching per column; sorting is a stable
//! sort on the column text using [`locale_compare`].

mod collate;
mod columns;

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

pub use collate::locale_compare;
pub use columns::{ReportColumn, TrainingColumn, TrainingRow, UserColumn};

/// A column of some admin table.
pub trait TableColumn: Copy + Eq + fmt::Debug {
    /// Whether filtering lower-cases both sides. Date columns match verbatim.
    fn case_insensitive(self) -> bool {
        true
    }
}

/// A row that can be filtered and sorted by column.
pub trait TableRow {
    type Column: TableColumn;

    /// Text of a cell; a missing value is the empty string.
    fn cell(&self, column: Self::Column) -> Cow<'_, str>;
}

/// Substring filter bound to one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatcher<C> {
    pub column: C,
    pub needle: String,
}

impl<C: TableColumn> FieldMatcher<C> {
    #[must_use]
    pub fn new(column: C, needle: impl Into<String>) -> Self {
        Self {
            column,
            needle: needle.into(),
        }
    }

    #[must_use]
    pub fn matches<R: TableRow<Column = C>>(&self, row: &R) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let cell = row.cell(self.column);
        if self.column.case_insensitive() {
            cell.to_lowercase().contains(&self.needle.to_lowercase())
        } else {
            cell.contains(self.needle.as_str())
        }
    }
}

/// Keep rows matching every matcher, in their original order.
#[must_use]
pub fn filter_rows<R>(rows: &[R], matchers: &[FieldMatcher<R::Column>]) -> Vec<R>
where
    R: TableRow + Clone,
{
    rows.iter()
        .filter(|row| matchers.iter().all(|matcher| matcher.matches(*row)))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Stable sort by one column's text.
#[must_use]
pub fn sort_rows<R>(rows: &[R], key: R::Column, direction: SortDirection) -> Vec<R>
where
    R: TableRow + Clone,
{
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| direction.apply(locale_compare(&a.cell(key), &b.cell(key))));
    sorted
}

/// Which column a table is sorted by, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    key: C,
    direction: SortDirection,
}

impl<C: TableColumn> SortState<C> {
    #[must_use]
    pub fn new(key: C) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Header click: same column flips direction, a new column starts ascending.
    pub fn click(&mut self, key: C) {
        if self.key == key {
            self.direction = self.direction.toggled();
        } else {
            self.key = key;
            self.direction = SortDirection::Ascending;
        }
    }

    #[must_use]
    pub fn key(&self) -> C {
        self.key
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Filter inputs plus sort state of one table.
#[derive(Debug, Clone)]
pub struct TableView<C> {
    filters: Vec<FieldMatcher<C>>,
    sort: SortState<C>,
}

impl<C: TableColumn> TableView<C> {
    #[must_use]
    pub fn new(default_sort: C) -> Self {
        Self {
            filters: Vec::new(),
            sort: SortState::new(default_sort),
        }
    }

    /// Set (or clear, with an empty value) the filter for a column.
    pub fn set_filter(&mut self, column: C, value: impl Into<String>) {
        let value = value.into();
        match self.filters.iter_mut().find(|m| m.column == column) {
            Some(existing) => existing.needle = value,
            None => self.filters.push(FieldMatcher::new(column, value)),
        }
    }

    pub fn click_header(&mut self, column: C) {
        self.sort.click(column);
    }

    #[must_use]
    pub fn sort(&self) -> SortState<C> {
        self.sort
    }

    #[must_use]
    pub fn filters(&self) -> &[FieldMatcher<C>] {
        &self.filters
    }

    /// Rows as the table displays them: filtered, then sorted.
    #[must_use]
    pub fn apply<R>(&self, rows: &[R]) -> Vec<R>
    where
        R: TableRow<Column = C> + Clone,
    {
        let filtered = filter_rows(rows, &self.filters);
        sort_rows(&filtered, self.sort.key, self.sort.direction)
    }
}
