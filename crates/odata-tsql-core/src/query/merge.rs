//! `MERGE` statements and their typestate builder.

use super::model::{QueryColumn, SelectQuery, Source, TableName};
use crate::error::CompileError;

/// What a `WHEN MATCHED` / `WHEN NOT MATCHED BY SOURCE` branch does.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    /// `UPDATE SET` the listed columns.
    Update(Vec<QueryColumn>),
    /// `DELETE`.
    Delete,
}

/// Optimistic-concurrency pre-check wrapped around a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcurrencyCheck {
    /// Query selecting conflicting rows; derived from the
    /// [`ColumnRole::Concurrency`](super::ColumnRole::Concurrency) column when absent.
    pub query: Option<SelectQuery>,
    /// Message raised when a conflict is found.
    pub message: String,
}

/// A `MERGE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeQuery {
    /// SQL emitted before the statement.
    pub prolog: Option<String>,
    /// `MERGE TOP (n)`.
    pub top: Option<u64>,
    /// Target table; aliased `target` unless it has an alias.
    pub target: TableName,
    /// Source rows; a [`Source::Row`] switches parameter declarations to
    /// single-row mode.
    pub source: Source,
    /// Every column taking part; key columns build the `ON` clause.
    pub columns: Vec<QueryColumn>,
    /// `WHEN MATCHED` branch.
    pub when_matched: Option<MergeAction>,
    /// Columns written by the `WHEN NOT MATCHED BY TARGET` insert.
    pub when_not_matched_by_target: Vec<QueryColumn>,
    /// `WHEN NOT MATCHED BY SOURCE` branch.
    pub when_not_matched_by_source: Option<MergeAction>,
    /// Concurrency pre-check.
    pub concurrency: Option<ConcurrencyCheck>,
    /// Columns listed after `OUTPUT $action`.
    pub output: Vec<String>,
    /// Used by a bulk-write path, which cannot consume `OUTPUT` rows.
    pub bulk: bool,
}

impl MergeQuery {
    /// Starts a merge into `target`.
    #[must_use]
    pub fn into(target: TableName) -> MergeBuilder<NoSource> {
        MergeBuilder {
            target,
            source: NoSource,
            prolog: None,
            top: None,
            columns: Vec::new(),
            matched: None,
            insert_unmatched: false,
            by_source: None,
            concurrency: None,
            output: Vec::new(),
            bulk: false,
        }
    }

    /// Key columns, in declaration order.
    pub fn key_columns(&self) -> impl Iterator<Item = &QueryColumn> {
        self.columns.iter().filter(|c| c.is_key_column)
    }

    /// Maps an error message returned by the server to
    /// [`CompileError::ConcurrencyConflict`] when it is this merge's
    /// concurrency message.
    #[must_use]
    pub fn conflict_from(&self, server_message: &str) -> Option<CompileError> {
        let check = self.concurrency.as_ref()?;
        server_message
            .contains(check.message.as_str())
            .then(|| CompileError::ConcurrencyConflict(check.message.clone()))
    }
}

/// Marker: no source yet.
#[derive(Debug)]
pub struct NoSource;

/// Marker: source set.
#[derive(Debug)]
pub struct HasSource(Source);

/// Builds a [`MergeQuery`]; `build()` is only available once `using()` has
/// supplied the source rows.
#[derive(Debug)]
pub struct MergeBuilder<S> {
    target: TableName,
    source: S,
    prolog: Option<String>,
    top: Option<u64>,
    columns: Vec<QueryColumn>,
    matched: Option<Matched>,
    insert_unmatched: bool,
    by_source: Option<MergeAction>,
    concurrency: Option<ConcurrencyCheck>,
    output: Vec<String>,
    bulk: bool,
}

#[derive(Debug)]
enum Matched {
    Update,
    Delete,
}

// Transition: NoSource -> HasSource
impl MergeBuilder<NoSource> {
    /// Sets the source rows.
    #[must_use]
    pub fn using(self, source: Source) -> MergeBuilder<HasSource> {
        MergeBuilder {
            target: self.target,
            source: HasSource(source),
            prolog: self.prolog,
            top: self.top,
            columns: self.columns,
            matched: self.matched,
            insert_unmatched: self.insert_unmatched,
            by_source: self.by_source,
            concurrency: self.concurrency,
            output: self.output,
            bulk: self.bulk,
        }
    }
}

impl<S> MergeBuilder<S> {
    /// Sets SQL emitted before the statement.
    #[must_use]
    pub fn prolog(mut self, sql: impl Into<String>) -> Self {
        self.prolog = Some(sql.into());
        self
    }

    /// Limits the affected rows.
    #[must_use]
    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: QueryColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Updates every updatable non-key column of matched rows.
    #[must_use]
    pub fn update_when_matched(mut self) -> Self {
        self.matched = Some(Matched::Update);
        self
    }

    /// Deletes matched rows.
    #[must_use]
    pub fn delete_when_matched(mut self) -> Self {
        self.matched = Some(Matched::Delete);
        self
    }

    /// Inserts rows missing from the target.
    #[must_use]
    pub fn insert_when_not_matched(mut self) -> Self {
        self.insert_unmatched = true;
        self
    }

    /// Deletes target rows missing from the source.
    #[must_use]
    pub fn delete_when_not_matched_by_source(mut self) -> Self {
        self.by_source = Some(MergeAction::Delete);
        self
    }

    /// Updates target rows missing from the source.
    #[must_use]
    pub fn update_when_not_matched_by_source(mut self, columns: Vec<QueryColumn>) -> Self {
        self.by_source = Some(MergeAction::Update(columns));
        self
    }

    /// Raises `message` instead of merging when the concurrency column of a
    /// target row differs from the source.
    #[must_use]
    pub fn check_concurrency(mut self, message: impl Into<String>) -> Self {
        self.concurrency = Some(ConcurrencyCheck {
            query: None,
            message: message.into(),
        });
        self
    }

    /// Raises `message` instead of merging when `query` returns a row.
    #[must_use]
    pub fn check_concurrency_with(mut self, query: SelectQuery, message: impl Into<String>) -> Self {
        self.concurrency = Some(ConcurrencyCheck {
            query: Some(query),
            message: message.into(),
        });
        self
    }

    /// Appends an `OUTPUT` column (`INSERTED.[Id]`, `DELETED.[Name]`, ...).
    #[must_use]
    pub fn output(mut self, column: impl Into<String>) -> Self {
        self.output.push(column.into());
        self
    }

    /// Marks the merge as part of a bulk-write path.
    #[must_use]
    pub fn bulk(mut self) -> Self {
        self.bulk = true;
        self
    }
}

impl MergeBuilder<HasSource> {
    /// Builds the merge.
    #[must_use]
    pub fn build(self) -> MergeQuery {
        let when_matched = match self.matched {
            Some(Matched::Update) => Some(MergeAction::Update(
                self.columns
                    .iter()
                    .filter(|c| !c.is_key_column && c.role.is_updatable())
                    .cloned()
                    .collect(),
            )),
            Some(Matched::Delete) => Some(MergeAction::Delete),
            None => None,
        };
        let when_not_matched_by_target = if self.insert_unmatched {
            self.columns
                .iter()
                .filter(|c| c.role.is_insertable())
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        MergeQuery {
            prolog: self.prolog,
            top: self.top,
            target: self.target,
            source: self.source.0,
            columns: self.columns,
            when_matched,
            when_not_matched_by_target,
            when_not_matched_by_source: self.by_source,
            concurrency: self.concurrency,
            output: self.output,
            bulk: self.bulk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ColumnRole;

    fn merge() -> MergeQuery {
        MergeQuery::into(TableName::new("Orders"))
            .column(QueryColumn::new("Id").key())
            .column(QueryColumn::new("Total"))
            .column(QueryColumn::new("Version").role(ColumnRole::Concurrency))
            .column(QueryColumn::new("CreatedAt").role(ColumnRole::InsertedAt))
            .update_when_matched()
            .insert_when_not_matched()
            .check_concurrency("Orders changed")
            .using(Source::table("OrderStaging"))
            .build()
    }

    #[test]
    fn test_branch_columns() {
        let merge = merge();
        let Some(MergeAction::Update(updated)) = &merge.when_matched else {
            panic!("expected an update branch");
        };
        let names: Vec<&str> = updated.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Total"]);
        let inserted: Vec<&str> = merge
            .when_not_matched_by_target
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(inserted, vec!["Id", "Total", "CreatedAt"]);
        assert_eq!(merge.key_columns().count(), 1);
    }

    #[test]
    fn test_conflict_recognition() {
        let merge = merge();
        let err = merge
            .conflict_from("Msg 50000, Level 16: Orders changed")
            .unwrap();
        assert!(err.is_concurrency_conflict());
        assert!(merge.conflict_from("deadlock victim").is_none());
    }
}
