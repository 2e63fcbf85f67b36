//! Keyed-record ledger interface.

use async_trait::async_trait;
use reel_models::{LedgerColumn, LedgerRow, LedgerStage, NewLedgerEntry};

use crate::error::{LedgerError, LedgerResult};

/// Blank identifiers never address a row.
pub(crate) fn require_id(id: &str) -> LedgerResult<()> {
    if id.trim().is_empty() {
        return Err(LedgerError::InvalidRow("empty row id".to_string()));
    }
    Ok(())
}

/// Partial update of one row: an ordered list of column writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerUpdate {
    fields: Vec<(LedgerColumn, String)>,
}

impl LedgerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column. A later write to the same column replaces the earlier one.
    pub fn set(mut self, column: LedgerColumn, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    pub fn stage(self, stage: LedgerStage) -> Self {
        self.set(LedgerColumn::Status, stage.as_str())
    }

    pub fn fields(&self) -> &[(LedgerColumn, String)] {
        &self.fields
    }

    /// Stage written by this update, if any.
    pub fn target_stage(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| *c == LedgerColumn::Status)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply the update to an in-memory row.
    pub fn apply_to(&self, row: &mut LedgerRow) -> LedgerResult<()> {
        for (column, value) in &self.fields {
            row.set(*column, value.clone())?;
        }
        Ok(())
    }
}

/// Ledger storage, addressed by row identifier.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Prepare the store (e.g. write the header row). Idempotent.
    async fn init(&self) -> LedgerResult<()>;

    /// Every readable row, in ledger order.
    async fn all_rows(&self) -> LedgerResult<Vec<LedgerRow>>;

    /// Append fresh pending rows. Returns the assigned identifiers.
    async fn append(&self, entries: &[NewLedgerEntry]) -> LedgerResult<Vec<String>>;

    /// Write `update` to the row with identifier `id`.
    ///
    /// Returns `false` when no row has that identifier. An empty identifier
    /// is an error.
    async fn update_fields(&self, id: &str, update: &LedgerUpdate) -> LedgerResult<bool>;

    /// Row with identifier `id`, found by linear scan.
    async fn get(&self, id: &str) -> LedgerResult<Option<LedgerRow>> {
        require_id(id)?;
        Ok(self.all_rows().await?.into_iter().find(|row| row.id == id))
    }

    async fn rows_with_stage(&self, stage: LedgerStage) -> LedgerResult<Vec<LedgerRow>> {
        Ok(self
            .all_rows()
            .await?
            .into_iter()
            .filter(|row| row.status == stage)
            .collect())
    }

    /// Every prompt already in the ledger, oldest first.
    async fn past_prompts(&self) -> LedgerResult<Vec<String>> {
        Ok(self
            .all_rows()
            .await?
            .into_iter()
            .map(|row| row.prompt)
            .filter(|prompt| !prompt.trim().is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_last_write_wins() {
        let update = LedgerUpdate::new()
            .set(LedgerColumn::Error, "first")
            .stage(LedgerStage::Error)
            .set(LedgerColumn::Error, "second");

        assert_eq!(update.fields().len(), 2);
        assert_eq!(update.target_stage(), Some("error"));

        let mut row = LedgerRow::default();
        update.apply_to(&mut row).unwrap();
        assert_eq!(row.error, "second");
        assert_eq!(row.status, LedgerStage::Error);
    }
}
