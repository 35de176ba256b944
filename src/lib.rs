// Zimam Delivery - Core Library
// Logbook, wallet and language state shared by the TUI, CLI and API server

pub mod clock;
pub mod language;
pub mod i18n;
pub mod logbook;
pub mod wallet;
pub mod forms;
pub mod animation;
pub mod db;
pub mod app;
pub mod export;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use app::{AppContext, SubmitError};
pub use clock::{Clock, FixedClock, OffsetClock, SystemClock};
pub use config::Settings;
pub use forms::{DeliveryForm, FormError, TransactionForm};
pub use language::{Language, LanguageContext, TextDirection};
pub use logbook::{
    DeliveryFilter, DeliveryRecord, LogbookStore, LogbookSummary, NewDelivery, Platform,
    PlatformFilter,
};
pub use wallet::{
    Category, NewTransaction, Transaction, TransactionType, WalletStore, WalletSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
