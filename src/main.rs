// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zimam_delivery::export::export_to_dir;
use zimam_delivery::i18n::{self, format_amount, Text};
use zimam_delivery::{
    config, AppContext, Category, DeliveryForm, Language, Platform, Settings, TransactionForm,
    TransactionType,
};

#[derive(Parser, Debug)]
#[command(name = "zimam", version, about = "Zimam Delivery - logbook and wallet for delivery drivers")]
struct Cli {
    /// Settings file (defaults to ./zimam.toml when present)
    #[arg(short, long, env = "ZIMAM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overrides the settings file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Display language for this session (en / ar)
    #[arg(long, global = true)]
    language: Option<Language>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Print today's logbook and wallet figures
    Summary,
    /// Write deliveries.csv and transactions.csv
    Export {
        /// Target directory, overrides the settings file
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Log a completed delivery
    AddDelivery {
        #[arg(long)]
        customer: String,
        #[arg(long, default_value = "talabat")]
        platform: Platform,
        #[arg(long)]
        fee: String,
        #[arg(long)]
        area: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record income or an expense
    AddTransaction {
        #[arg(long = "type")]
        kind: TransactionType,
        #[arg(long)]
        amount: String,
        /// Defaults to the first category of the type
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete every delivery and transaction
    Clear {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.database.is_some() {
        settings.database = cli.database.clone();
    }

    let command = cli.command.unwrap_or(Command::Tui);

    // Log lines would draw over the alternate screen
    let level = if matches!(command, Command::Tui) {
        "warn"
    } else {
        settings.log_level.as_str()
    };
    config::init_tracing(level);

    let mut ctx = open_context(&settings)?;
    if let Some(language) = cli.language {
        ctx.language.set_language(language);
    }

    match command {
        Command::Tui => run_ui_mode(ctx, &settings),
        Command::Summary => {
            print_summary(&ctx);
            Ok(())
        }
        Command::Export { dir } => {
            let dir = dir.unwrap_or_else(|| settings.export_dir.clone());
            for path in export_to_dir(&dir, &ctx)? {
                println!("✓ {}", path.display());
            }
            Ok(())
        }
        Command::AddDelivery {
            customer,
            platform,
            fee,
            area,
            notes,
        } => {
            warn_if_ephemeral(&ctx);
            let form = DeliveryForm {
                customer,
                platform,
                fee,
                area,
                notes: notes.unwrap_or_default(),
            };
            let record = ctx.submit_delivery(&form)?;
            println!(
                "✓ {} • {} • {} • {}",
                record.customer,
                i18n::platform_name(record.platform, ctx.language.language()),
                record.area,
                format_amount(record.fee)
            );
            println!("  id: {}", record.id);
            Ok(())
        }
        Command::AddTransaction {
            kind,
            amount,
            category,
            description,
        } => {
            warn_if_ephemeral(&ctx);
            let form = TransactionForm {
                amount,
                category: category.unwrap_or_else(|| kind.default_category()),
                description: description.unwrap_or_default(),
                ..TransactionForm::new(kind)
            };
            let tx = ctx.submit_transaction(&form)?;
            let language = ctx.language.language();
            println!(
                "✓ {} • {} • {}",
                i18n::transaction_type_name(tx.kind, language),
                i18n::category_name(tx.category, language),
                format_amount(tx.amount)
            );
            println!("  id: {}", tx.id);
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete all records without --yes");
            }
            let (deliveries, transactions) = ctx.clear_all()?;
            println!(
                "✓ Removed {} deliveries and {} transactions",
                deliveries, transactions
            );
            Ok(())
        }
    }
}

fn open_context(settings: &Settings) -> Result<AppContext> {
    let clock = settings.clock();
    let ctx = match &settings.database {
        Some(path) => AppContext::open(path, clock, settings.language)?,
        None => AppContext::in_memory(clock, settings.language),
    };
    Ok(ctx.with_actor("cli"))
}

fn warn_if_ephemeral(ctx: &AppContext) {
    if !ctx.is_persistent() {
        tracing::warn!("no database configured; this record is discarded when the command exits");
    }
}

fn print_summary(ctx: &AppContext) {
    let t = |text| ctx.language.t(text);
    let logbook = ctx.logbook.summary();
    let wallet = ctx.wallet.today_summary();

    println!("🏍  {} • {}", t(Text::AppName), t(Text::Location));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}: {}", t(Text::TodayDeliveries), logbook.today_count);
    println!("{}: {}", t(Text::TodayEarnings), format_amount(logbook.today_earnings));
    println!();
    println!("{}: {}", t(Text::Income), format_amount(wallet.today_income));
    println!("{}: {}", t(Text::Expenses), format_amount(wallet.today_expense));
    println!("{}: {}", t(Text::Profit), format_amount(wallet.today_profit));
    if let Some(margin) = wallet.profit_margin() {
        println!("{}: {:.1}%", t(Text::ProfitMargin), margin);
    }
    println!();
    println!("{}: {}", t(Text::SavedDeliveries), ctx.logbook.len());
    println!("{}: {}", t(Text::TotalTransactions), ctx.wallet.len());
}

#[cfg(feature = "tui")]
fn run_ui_mode(ctx: AppContext, settings: &Settings) -> Result<()> {
    let mut app = ui::App::new(ctx, settings.export_dir.clone());
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_ctx: AppContext, _settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: zimam summary / zimam-server");
    std::process::exit(1);
}
