// 💰 Wallet - income and expense ledger
//
// Same ownership rules as the logbook: the store owns its transactions,
// callers add/delete and read summaries. Summaries are recomputed on every
// call; data volumes are one driver's session.

use crate::clock::{self, Clock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// TRANSACTION TYPE & CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in
    Income,
    /// Money going out
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Categories a transaction of this type may use
    pub fn categories(&self) -> &'static [Category] {
        match self {
            TransactionType::Income => &INCOME_CATEGORIES,
            TransactionType::Expense => &EXPENSE_CATEGORIES,
        }
    }

    pub fn default_category(&self) -> Category {
        self.categories()[0]
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    // Income
    Delivery,
    Bonus,
    Tip,
    // Expense
    Fuel,
    Food,
    Maintenance,
    Toll,
    Other,
}

static INCOME_CATEGORIES: [Category; 3] = [Category::Delivery, Category::Bonus, Category::Tip];

static EXPENSE_CATEGORIES: [Category; 5] = [
    Category::Fuel,
    Category::Food,
    Category::Maintenance,
    Category::Toll,
    Category::Other,
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Delivery => "delivery",
            Category::Bonus => "bonus",
            Category::Tip => "tip",
            Category::Fuel => "fuel",
            Category::Food => "food",
            Category::Maintenance => "maintenance",
            Category::Toll => "toll",
            Category::Other => "other",
        }
    }

    /// Transaction type this category belongs to
    pub fn kind(&self) -> TransactionType {
        if INCOME_CATEGORIES.contains(self) {
            TransactionType::Income
        } else {
            TransactionType::Expense
        }
    }

    pub fn belongs_to(&self, kind: TransactionType) -> bool {
        self.kind() == kind
    }

    /// Next category of the same type (wraps)
    pub fn cycle(&self) -> Self {
        let list = self.kind().categories();
        let index = list.iter().position(|c| c == self).unwrap_or(0);
        list[(index + 1) % list.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delivery" => Ok(Category::Delivery),
            "bonus" => Ok(Category::Bonus),
            "tip" => Ok(Category::Tip),
            "fuel" => Ok(Category::Fuel),
            "food" => Ok(Category::Food),
            "maintenance" => Ok(Category::Maintenance),
            "toll" => Ok(Category::Toll),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// Fields supplied by the caller when recording a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub time: DateTime<Utc>,
}

impl Transaction {
    fn create(fields: NewTransaction, time: DateTime<Utc>) -> Self {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            kind: fields.kind,
            amount: fields.amount,
            category: fields.category,
            description: fields.description,
            time,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Amount with sign: positive for income, negative for expense
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Today-scoped wallet figures
///
/// `today_profit` is always `today_income - today_expense` and may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub today_income: f64,
    pub today_expense: f64,
    pub today_profit: f64,
    pub today_transactions: Vec<Transaction>,
}

impl WalletSummary {
    fn from_transactions(today_transactions: Vec<Transaction>) -> Self {
        let (today_income, today_expense) =
            today_transactions
                .iter()
                .fold((0.0, 0.0), |(income, expense), tx| match tx.kind {
                    TransactionType::Income => (income + tx.amount, expense),
                    TransactionType::Expense => (income, expense + tx.amount),
                });

        WalletSummary {
            today_income,
            today_expense,
            today_profit: today_income - today_expense,
            today_transactions,
        }
    }

    /// Profit as a percentage of income; None when there is no income
    pub fn profit_margin(&self) -> Option<f64> {
        if self.today_income > 0.0 {
            Some(self.today_profit / self.today_income * 100.0)
        } else {
            None
        }
    }

    /// Totals per category for today, in category order
    pub fn by_category(&self) -> BTreeMap<Category, f64> {
        let mut totals = BTreeMap::new();
        for tx in &self.today_transactions {
            *totals.entry(tx.category).or_insert(0.0) += tx.amount;
        }
        totals
    }
}

// ============================================================================
// WALLET STORE
// ============================================================================

/// Ordered collection of transactions (insertion order)
pub struct WalletStore {
    transactions: Vec<Transaction>,
    clock: Arc<dyn Clock>,
}

impl WalletStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        WalletStore {
            transactions: Vec::new(),
            clock,
        }
    }

    pub fn with_records(clock: Arc<dyn Clock>, transactions: Vec<Transaction>) -> Self {
        WalletStore {
            transactions,
            clock,
        }
    }

    /// Record a transaction with a fresh id and the current time
    pub fn add_transaction(&mut self, fields: NewTransaction) -> &Transaction {
        let tx = Transaction::create(fields, self.clock.now());
        tracing::debug!(
            id = %tx.id,
            kind = %tx.kind,
            category = %tx.category,
            amount = tx.amount,
            "transaction added"
        );
        self.transactions.push(tx);
        &self.transactions[self.transactions.len() - 1]
    }

    /// Remove by id; unknown ids are a no-op
    pub fn delete_transaction(&mut self, id: &str) -> Option<Transaction> {
        let index = self.transactions.iter().position(|t| t.id == id)?;
        let removed = self.transactions.remove(index);
        tracing::debug!(id = %removed.id, "transaction deleted");
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn today_transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        let today = self.clock.today();
        self.transactions
            .iter()
            .filter(move |t| self.clock.local_date(t.time) == today)
    }

    pub fn today_summary(&self) -> WalletSummary {
        WalletSummary::from_transactions(self.today_transactions().cloned().collect())
    }

    /// Net balance over every recorded transaction
    pub fn balance(&self) -> f64 {
        self.transactions.iter().map(Transaction::signed_amount).sum()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.transactions.len();
        self.transactions.clear();
        tracing::debug!(removed, "wallet cleared");
        removed
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new(clock::system())
    }
}

impl fmt::Debug for WalletStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletStore")
            .field("transactions", &self.transactions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn test_clock() -> FixedClock {
        FixedClock::new(
            Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap(),
            FixedOffset::east_opt(4 * 3600).unwrap(),
        )
    }

    fn income(amount: f64, category: Category) -> NewTransaction {
        NewTransaction {
            kind: TransactionType::Income,
            amount,
            category,
            description: "Talabat delivery".to_string(),
        }
    }

    fn expense(amount: f64, category: Category) -> NewTransaction {
        NewTransaction {
            kind: TransactionType::Expense,
            amount,
            category,
            description: "Gas station".to_string(),
        }
    }

    #[test]
    fn test_today_summary_example_scenario() {
        let mut wallet = WalletStore::new(Arc::new(test_clock()));
        wallet.add_transaction(income(50.0, Category::Delivery));
        wallet.add_transaction(expense(20.0, Category::Fuel));

        let summary = wallet.today_summary();

        assert_eq!(summary.today_income, 50.0);
        assert_eq!(summary.today_expense, 20.0);
        assert_eq!(summary.today_profit, 30.0);
        assert_eq!(summary.today_transactions.len(), 2);
        assert_eq!(summary.profit_margin(), Some(60.0));
    }

    #[test]
    fn test_profit_may_be_negative() {
        let mut wallet = WalletStore::new(Arc::new(test_clock()));
        wallet.add_transaction(income(15.0, Category::Tip));
        wallet.add_transaction(expense(40.0, Category::Maintenance));
        wallet.add_transaction(expense(8.0, Category::Toll));

        let summary = wallet.today_summary();

        assert_eq!(summary.today_profit, -33.0);
        assert_eq!(
            summary.today_profit,
            summary.today_income - summary.today_expense
        );
    }

    #[test]
    fn test_empty_wallet_summary() {
        let wallet = WalletStore::new(Arc::new(test_clock()));
        let summary = wallet.today_summary();

        assert_eq!(summary.today_income, 0.0);
        assert_eq!(summary.today_expense, 0.0);
        assert_eq!(summary.today_profit, 0.0);
        assert!(summary.today_transactions.is_empty());
        assert_eq!(summary.profit_margin(), None);
    }

    #[test]
    fn test_summary_only_counts_today() {
        let clock = test_clock();
        let mut wallet = WalletStore::new(Arc::new(clock.clone()));
        wallet.add_transaction(income(300.0, Category::Bonus));
        wallet.add_transaction(expense(100.0, Category::Fuel));

        clock.advance(Duration::days(1));
        wallet.add_transaction(income(45.0, Category::Delivery));

        let summary = wallet.today_summary();
        assert_eq!(summary.today_income, 45.0);
        assert_eq!(summary.today_expense, 0.0);
        assert_eq!(summary.today_profit, 45.0);
        assert_eq!(summary.today_transactions.len(), 1);

        // All-time balance still sees everything
        assert_eq!(wallet.balance(), 245.0);
    }

    #[test]
    fn test_delete_transaction_is_idempotent() {
        let mut wallet = WalletStore::new(Arc::new(test_clock()));
        let id = wallet.add_transaction(expense(20.0, Category::Food)).id.clone();
        wallet.add_transaction(income(50.0, Category::Delivery));

        assert!(wallet.delete_transaction(&id).is_some());
        assert!(wallet.delete_transaction(&id).is_none());
        assert!(wallet.delete_transaction("missing").is_none());

        assert_eq!(wallet.len(), 1);
        assert!(wallet.get(&id).is_none());
        assert_eq!(wallet.today_summary().today_expense, 0.0);
    }

    #[test]
    fn test_category_breakdown() {
        let mut wallet = WalletStore::new(Arc::new(test_clock()));
        wallet.add_transaction(expense(20.0, Category::Fuel));
        wallet.add_transaction(expense(30.0, Category::Fuel));
        wallet.add_transaction(expense(12.0, Category::Food));

        let totals = wallet.today_summary().by_category();
        assert_eq!(totals.get(&Category::Fuel), Some(&50.0));
        assert_eq!(totals.get(&Category::Food), Some(&12.0));
        assert_eq!(totals.get(&Category::Toll), None);
    }

    #[test]
    fn test_category_membership() {
        for category in TransactionType::Income.categories() {
            assert_eq!(category.kind(), TransactionType::Income);
        }
        for category in TransactionType::Expense.categories() {
            assert_eq!(category.kind(), TransactionType::Expense);
        }
        assert!(Category::Fuel.belongs_to(TransactionType::Expense));
        assert!(!Category::Fuel.belongs_to(TransactionType::Income));

        assert_eq!(Category::Tip.cycle(), Category::Delivery);
        assert_eq!(Category::Fuel.cycle(), Category::Food);
        assert_eq!(Category::Other.cycle(), Category::Fuel);
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let mut wallet = WalletStore::new(Arc::new(test_clock()));
        let tx = wallet.add_transaction(expense(20.0, Category::Fuel)).clone();

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["category"], "fuel");
        assert_eq!(json["amount"], 20.0);
    }
}
