// AppContext - the single owner of session state
//
// Creates the language context and both stores and hands them to the TUI /
// HTTP API by reference. No globals: whoever needs state gets an AppContext.
//
// When a database is attached, every mutation is written through after the
// in-memory store has been updated. The stores themselves stay infallible;
// only the write-through can fail.

use crate::clock::Clock;
use crate::db::{self, Event};
use crate::forms::{DeliveryForm, FormError, TransactionForm};
use crate::language::{Language, LanguageContext};
use crate::logbook::{DeliveryRecord, LogbookStore, NewDelivery};
use crate::wallet::{NewTransaction, Transaction, WalletStore};
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub struct AppContext {
    pub language: LanguageContext,
    pub logbook: LogbookStore,
    pub wallet: WalletStore,
    storage: Option<Connection>,
    actor: String,
}

/// Failure of a form-driven mutation
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppContext {
    /// In-memory session; nothing survives the process
    pub fn in_memory(clock: Arc<dyn Clock>, language: Language) -> Self {
        AppContext {
            language: LanguageContext::new(language),
            logbook: LogbookStore::new(clock.clone()),
            wallet: WalletStore::new(clock),
            storage: None,
            actor: "app".to_string(),
        }
    }

    /// Session backed by an SQLite file; previously saved records are loaded
    pub fn open(path: &Path, clock: Arc<dyn Clock>, default_language: Language) -> Result<Self> {
        let conn = db::open_database(path)?;
        Self::with_connection(conn, clock, default_language)
    }

    pub fn with_connection(
        conn: Connection,
        clock: Arc<dyn Clock>,
        default_language: Language,
    ) -> Result<Self> {
        let deliveries = db::load_deliveries(&conn)?;
        let transactions = db::load_transactions(&conn)?;
        let language = db::load_language(&conn)?.unwrap_or(default_language);

        tracing::info!(
            deliveries = deliveries.len(),
            transactions = transactions.len(),
            language = %language,
            "session restored"
        );

        Ok(AppContext {
            language: LanguageContext::new(language),
            logbook: LogbookStore::with_records(clock.clone(), deliveries),
            wallet: WalletStore::with_records(clock, transactions),
            storage: Some(conn),
            actor: "app".to_string(),
        })
    }

    /// Name recorded in the audit trail for writes from this context
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    pub fn storage(&self) -> Option<&Connection> {
        self.storage.as_ref()
    }

    // ========================================================================
    // Logbook
    // ========================================================================

    pub fn record_delivery(&mut self, fields: NewDelivery) -> Result<DeliveryRecord> {
        let record = self.logbook.add_delivery(fields).clone();
        if let Some(conn) = &self.storage {
            if let Err(e) = db::save_delivery(conn, &record, &self.actor) {
                self.logbook.delete_delivery(&record.id);
                return Err(e);
            }
        }
        tracing::info!(id = %record.id, fee = record.fee, "delivery recorded");
        Ok(record)
    }

    /// Validate the form, then record it
    pub fn submit_delivery(&mut self, form: &DeliveryForm) -> Result<DeliveryRecord, SubmitError> {
        let fields = form.validate()?;
        Ok(self.record_delivery(fields)?)
    }

    /// Remove a delivery; unknown ids are a no-op
    pub fn remove_delivery(&mut self, id: &str) -> Result<Option<DeliveryRecord>> {
        if self.logbook.get(id).is_none() {
            return Ok(None);
        }
        if let Some(conn) = &self.storage {
            db::remove_delivery(conn, id, &self.actor)?;
        }
        let removed = self.logbook.delete_delivery(id);
        tracing::info!(id, "delivery removed");
        Ok(removed)
    }

    // ========================================================================
    // Wallet
    // ========================================================================

    pub fn record_transaction(&mut self, fields: NewTransaction) -> Result<Transaction> {
        let tx = self.wallet.add_transaction(fields).clone();
        if let Some(conn) = &self.storage {
            if let Err(e) = db::save_transaction(conn, &tx, &self.actor) {
                self.wallet.delete_transaction(&tx.id);
                return Err(e);
            }
        }
        tracing::info!(id = %tx.id, kind = %tx.kind, amount = tx.amount, "transaction recorded");
        Ok(tx)
    }

    pub fn submit_transaction(
        &mut self,
        form: &TransactionForm,
    ) -> Result<Transaction, SubmitError> {
        let fields = form.validate()?;
        Ok(self.record_transaction(fields)?)
    }

    pub fn remove_transaction(&mut self, id: &str) -> Result<Option<Transaction>> {
        if self.wallet.get(id).is_none() {
            return Ok(None);
        }
        if let Some(conn) = &self.storage {
            db::remove_transaction(conn, id, &self.actor)?;
        }
        let removed = self.wallet.delete_transaction(id);
        tracing::info!(id, "transaction removed");
        Ok(removed)
    }

    /// Audit trail of one delivery or transaction, newest first
    ///
    /// `entity_type` is "delivery" or "transaction". Empty without storage.
    pub fn history(&self, entity_type: &str, id: &str) -> Result<Vec<Event>> {
        match &self.storage {
            Some(conn) => db::get_events_for_entity(conn, entity_type, id),
            None => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn set_language(&mut self, language: Language) -> Result<()> {
        if let Some(conn) = &self.storage {
            db::save_language(conn, language)?;
        }
        self.language.set_language(language);
        Ok(())
    }

    pub fn toggle_language(&mut self) -> Result<Language> {
        let next = self.language.language().toggled();
        self.set_language(next)?;
        Ok(next)
    }

    /// Settings -> Clear Data. Returns (deliveries, transactions) removed.
    pub fn clear_all(&mut self) -> Result<(usize, usize)> {
        if let Some(conn) = &self.storage {
            db::clear_records(conn, &self.actor)?;
        }
        let deliveries = self.logbook.clear();
        let transactions = self.wallet.clear();
        tracing::info!(deliveries, transactions, "all records cleared");
        Ok((deliveries, transactions))
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("language", &self.language)
            .field("logbook", &self.logbook)
            .field("wallet", &self.wallet)
            .field("persistent", &self.is_persistent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::logbook::Platform;
    use crate::wallet::{Category, TransactionType};
    use chrono::{TimeZone, Utc};

    fn test_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::utc(
            Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap(),
        ))
    }

    fn persistent_context() -> AppContext {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        AppContext::with_connection(conn, test_clock(), Language::En).unwrap()
    }

    fn ahmed_form() -> DeliveryForm {
        DeliveryForm {
            customer: "Ahmed".to_string(),
            platform: Platform::Talabat,
            fee: "25".to_string(),
            area: "Dubai Marina".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_in_memory_session() {
        let mut ctx = AppContext::in_memory(test_clock(), Language::En);
        let record = ctx.submit_delivery(&ahmed_form()).unwrap();

        assert!(!ctx.is_persistent());
        assert_eq!(ctx.logbook.len(), 1);
        assert_eq!(ctx.logbook.today_earnings(), 25.0);

        assert!(ctx.remove_delivery(&record.id).unwrap().is_some());
        assert!(ctx.remove_delivery(&record.id).unwrap().is_none());
    }

    #[test]
    fn test_invalid_form_does_not_touch_store() {
        let mut ctx = AppContext::in_memory(test_clock(), Language::En);
        let form = DeliveryForm {
            fee: "0".to_string(),
            ..ahmed_form()
        };

        let err = ctx.submit_delivery(&form).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(FormError::NonPositiveAmount(_))));
        assert!(ctx.logbook.is_empty());
    }

    #[test]
    fn test_writes_go_through_to_storage() {
        let mut ctx = persistent_context();
        ctx.submit_delivery(&ahmed_form()).unwrap();
        let tx = ctx
            .submit_transaction(&TransactionForm {
                kind: TransactionType::Income,
                amount: "50".to_string(),
                category: Category::Delivery,
                description: String::new(),
            })
            .unwrap();
        ctx.set_language(Language::Ar).unwrap();

        let conn = ctx.storage().unwrap();
        assert_eq!(db::record_counts(conn).unwrap(), (1, 1));
        assert_eq!(db::load_language(conn).unwrap(), Some(Language::Ar));

        ctx.remove_transaction(&tx.id).unwrap();
        assert_eq!(db::record_counts(ctx.storage().unwrap()).unwrap(), (1, 0));
    }

    #[test]
    fn test_session_restore() {
        let mut ctx = persistent_context();
        let record = ctx.submit_delivery(&ahmed_form()).unwrap();
        ctx.toggle_language().unwrap();

        let conn = ctx.storage.take().unwrap();
        let restored = AppContext::with_connection(conn, test_clock(), Language::En).unwrap();

        assert_eq!(restored.logbook.deliveries(), &[record]);
        assert_eq!(restored.language.language(), Language::Ar);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let mut ctx = persistent_context();
        let kept = ctx.submit_delivery(&ahmed_form()).unwrap();
        let tx = ctx
            .submit_transaction(&TransactionForm {
                amount: "20".to_string(),
                ..TransactionForm::new(TransactionType::Expense)
            })
            .unwrap();

        let conn = ctx.storage().unwrap();
        conn.execute_batch("DROP TABLE deliveries; DROP TABLE transactions;")
            .unwrap();

        let err = ctx.submit_delivery(&ahmed_form()).unwrap_err();
        assert!(matches!(err, SubmitError::Storage(_)));
        assert_eq!(ctx.logbook.deliveries(), &[kept.clone()]);
        assert_eq!(ctx.logbook.today_earnings(), 25.0);

        assert!(ctx.remove_delivery(&kept.id).is_err());
        assert!(ctx.logbook.get(&kept.id).is_some());

        assert!(ctx.remove_transaction(&tx.id).is_err());
        assert_eq!(ctx.wallet.len(), 1);

        assert!(ctx.clear_all().is_err());
        assert_eq!(ctx.logbook.len(), 1);
        assert_eq!(ctx.wallet.len(), 1);
    }

    #[test]
    fn test_history_lists_audit_events() {
        let mut ctx = persistent_context();
        let record = ctx.submit_delivery(&ahmed_form()).unwrap();
        ctx.remove_delivery(&record.id).unwrap();

        let events = ctx.history("delivery", &record.id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "delivery_deleted");

        let memory = AppContext::in_memory(test_clock(), Language::En);
        assert!(memory.history("delivery", &record.id).unwrap().is_empty());
    }

    #[test]
    fn test_clear_all() {
        let mut ctx = persistent_context();
        ctx.submit_delivery(&ahmed_form()).unwrap();
        ctx.submit_delivery(&ahmed_form()).unwrap();
        ctx.submit_transaction(&TransactionForm {
            amount: "20".to_string(),
            ..TransactionForm::new(TransactionType::Expense)
        })
        .unwrap();

        assert_eq!(ctx.clear_all().unwrap(), (2, 1));
        assert!(ctx.logbook.is_empty());
        assert!(ctx.wallet.is_empty());
        assert_eq!(db::record_counts(ctx.storage().unwrap()).unwrap(), (0, 0));
    }
}
