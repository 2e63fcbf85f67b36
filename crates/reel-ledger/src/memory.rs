//! In-memory ledger.

use async_trait::async_trait;
use chrono::Utc;
use reel_models::{LedgerRow, NewLedgerEntry};
use tokio::sync::RwLock;

use crate::error::LedgerResult;
use crate::store::{require_id, Ledger, LedgerUpdate};

/// Ledger held in process memory. Used for dry runs and tests.
#[derive(Default)]
pub struct MemoryLedger {
    rows: RwLock<Vec<LedgerRow>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn init(&self) -> LedgerResult<()> {
        Ok(())
    }

    async fn all_rows(&self) -> LedgerResult<Vec<LedgerRow>> {
        Ok(self.rows.read().await.clone())
    }

    async fn append(&self, entries: &[NewLedgerEntry]) -> LedgerResult<Vec<String>> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();
        let mut ids = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = (rows.len() + 1).to_string();
            rows.push(LedgerRow::from_entry(id.clone(), entry, now));
            ids.push(id);
        }

        Ok(ids)
    }

    async fn update_fields(&self, id: &str, update: &LedgerUpdate) -> LedgerResult<bool> {
        require_id(id)?;
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                update.apply_to(row)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
