use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use venue_partners::backup::{self, Backup};
use venue_partners::csv_io;
use venue_partners::money::{format_currency, format_percentage};
use venue_partners::{
    AppConfig, FinancialFacts, PartnerInput, PartnersError, PartnersService, Proposal, ReceiptImage,
    Settings, ShareMethod, SqliteStore, WithdrawalDraft,
};

#[derive(Parser)]
#[command(name = "venue-partners", version, about = "Partner profit sharing and withdrawals for an event venue")]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (overrides the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// First-time setup of the venue settings
    Init {
        #[arg(long)]
        hall: String,
        #[arg(long, default_value = "YER")]
        currency: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        fiscal_year: Option<i32>,
    },
    /// Check administrator credentials
    Login {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
    },
    /// Manage the partner roster
    #[command(subcommand)]
    Partner(PartnerCommand),
    /// Show every partner's effective percentage and entitled share
    Allocation,
    /// Propose a withdrawal for a partner
    Withdraw(WithdrawArgs),
    /// List a partner's withdrawals
    Withdrawals { partner_id: String },
    /// Delete a withdrawal
    WithdrawalRemove { id: String },
    /// Withdrawals left behind by deleted partners
    Orphans,
    /// List the venue's employees
    Employees,
    /// Import reservations, expenses or employees from CSV
    #[command(subcommand)]
    Import(ImportCommand),
    /// Export the withdrawal ledger to CSV
    ExportLedger { path: PathBuf },
    /// Write a JSON backup of all data
    Backup { path: PathBuf },
    /// Restore all data from a JSON backup
    Restore { path: PathBuf },
    /// Financial summary of the venue
    Summary,
}

#[derive(Subcommand)]
enum PartnerCommand {
    Add(PartnerFields),
    Edit {
        id: String,
        #[command(flatten)]
        fields: PartnerFields,
    },
    Remove {
        id: String,
    },
    List,
}

#[derive(Args)]
struct PartnerFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    position: Option<String>,
    /// percentage | shares
    #[arg(long)]
    method: Option<ShareMethod>,
    /// Declared share (percentage method)
    #[arg(long)]
    percentage: Option<f64>,
    /// Total invested (percentage method)
    #[arg(long)]
    invested: Option<f64>,
    /// Number of shares (shares method)
    #[arg(long)]
    shares: Option<f64>,
    /// Value of one share (shares method)
    #[arg(long)]
    share_value: Option<f64>,
}

impl PartnerFields {
    fn apply(self, mut input: PartnerInput) -> PartnerInput {
        if let Some(name) = self.name {
            input.name = name;
        }
        if let Some(position) = self.position {
            input.position = position;
        }
        if let Some(method) = self.method {
            input.share_method = method;
        }
        input.share_percentage = self.percentage.or(input.share_percentage);
        input.total_invested = self.invested.or(input.total_invested);
        input.number_of_shares = self.shares.or(input.number_of_shares);
        input.share_value = self.share_value.or(input.share_value);
        input
    }
}

#[derive(Args)]
struct WithdrawArgs {
    partner_id: String,
    #[arg(long)]
    amount: f64,
    #[arg(long, default_value = "")]
    receipt: String,
    #[arg(long, default_value = "")]
    recipient: String,
    /// YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,
    /// Receipt image to attach
    #[arg(long)]
    receipt_image: Option<PathBuf>,
    /// Confirm an over-share withdrawal without asking
    #[arg(long)]
    yes: bool,
}

#[derive(Subcommand)]
enum ImportCommand {
    Reservations { path: PathBuf },
    Expenses { path: PathBuf },
    Employees { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(io::stderr))
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let db_path = cli.database.clone().unwrap_or_else(|| config.storage.database.clone());
    let store = SqliteStore::open(&db_path)?;
    let service = PartnersService::new(store).with_orphan_policy(config.partners.orphan_policy);

    match cli.command {
        Command::Init {
            hall,
            currency,
            user,
            password,
            fiscal_year,
        } => {
            let mut settings = Settings::new(&hall, &currency, &user, &password);
            if let Some(year) = fiscal_year {
                settings = settings.with_fiscal_year(year);
            }
            settings.save(service.store())?;
            println!("✓ Venue '{}' initialised ({}, fiscal year {})", settings.hall_name, settings.currency, settings.fiscal_year);
        }
        Command::Login { user, password } => {
            let settings = Settings::require(service.store())?;
            if !settings.authenticate(&user, &password) {
                return Err(PartnersError::InvalidCredentials.into());
            }
            println!("✓ Welcome to {}", settings.hall_name);
        }
        Command::Partner(command) => run_partner(&service, command)?,
        Command::Allocation => print_allocation(&service),
        Command::Withdraw(args) => run_withdraw(&service, args)?,
        Command::Withdrawals { partner_id } => print_withdrawals(&service, &partner_id)?,
        Command::WithdrawalRemove { id } => {
            let removed = service.remove_withdrawal(&id)?;
            println!(
                "✓ Removed withdrawal {} ({} for {})",
                removed.id,
                format_currency(removed.amount, &service.currency()),
                removed.partner_name_at_withdrawal()
            );
        }
        Command::Orphans => print_orphans(&service),
        Command::Employees => print_employees(&service),
        Command::Import(ImportCommand::Reservations { path }) => {
            let imported = csv_io::load_reservations_csv(&path)?;
            let count = imported.len();
            let total = service.import_reservations(imported)?;
            println!("✓ Imported {} reservation(s), {} total", count, total);
        }
        Command::Import(ImportCommand::Expenses { path }) => {
            let imported = csv_io::load_expenses_csv(&path)?;
            let count = imported.len();
            let total = service.import_expenses(imported)?;
            println!("✓ Imported {} expense(s), {} total", count, total);
        }
        Command::Import(ImportCommand::Employees { path }) => {
            let imported = csv_io::load_employees_csv(&path)?;
            let count = imported.len();
            let total = service.import_employees(imported)?;
            println!("✓ Imported {} employee(s), {} total", count, total);
        }
        Command::ExportLedger { path } => {
            let count = csv_io::export_withdrawals_csv(&path, service.ledger().entries())?;
            println!("✓ Exported {} withdrawal(s) to {}", count, path.display());
        }
        Command::Backup { path } => {
            let backup = backup::export(service.store())?;
            backup.write_to(&path)?;
            println!("✓ Backup written to {} ({} collections)", path.display(), backup.collections.len());
        }
        Command::Restore { path } => {
            let backup = Backup::read_from(&path)?;
            let restored = backup::restore(service.store(), &backup)?;
            println!("✓ Restored {} collection(s) from {}", restored, path.display());
        }
        Command::Summary => run_summary(&service, &config)?,
    }

    Ok(())
}

fn run_partner(service: &PartnersService<SqliteStore>, command: PartnerCommand) -> Result<()> {
    match command {
        PartnerCommand::Add(fields) => {
            let partner = service.create_partner(fields.apply(PartnerInput::default()))?;
            println!("✓ Added partner {} ({}) - id {}", partner.name, partner.stake_label(), partner.id);
        }
        PartnerCommand::Edit { id, fields } => {
            let current = service.partner(&id)?;
            let partner = service.update_partner(&id, fields.apply(current.to_input()))?;
            println!("✓ Updated partner {} ({})", partner.name, partner.stake_label());
        }
        PartnerCommand::Remove { id } => {
            let removed = service.delete_partner(&id)?;
            println!("✓ Removed partner {}", removed.name);
            let kept = service.withdrawals_for(&id).len();
            if kept > 0 {
                println!("  {} withdrawal(s) kept as history (see `orphans`)", kept);
            }
        }
        PartnerCommand::List => print_partners(service),
    }
    Ok(())
}

fn print_partners(service: &PartnersService<SqliteStore>) {
    let currency = service.currency();
    let statements = service.statements();

    if statements.is_empty() {
        println!("No partners yet. Add one with `partner add`.");
        return;
    }

    for s in &statements {
        println!("{} - {} [{}]", s.partner.name, s.partner.position, s.partner.id);
        println!("    stake:      {} ({})", s.partner.stake_label(), s.partner.share_method);
        println!("    investment: {}", format_currency(s.allocation.investment, &currency));
        println!(
            "    withdrawn:  {} in {} withdrawal(s)",
            format_currency(s.total_withdrawn, &currency),
            s.withdrawal_count
        );
    }

    if let Some(warning) = service.share_check().message() {
        println!("\n⚠️  {}", warning);
    }
}

fn print_allocation(service: &PartnersService<SqliteStore>) {
    let currency = service.currency();
    let allocation = service.allocation();

    println!("Revenue:          {}", format_currency(allocation.total_revenue, &currency));
    println!("Expenses:         {}", format_currency(allocation.total_expenses, &currency));
    println!("Net profit:       {}", format_currency(allocation.net_profit, &currency));
    println!("Total investment: {}", format_currency(allocation.total_company_investment, &currency));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for s in service.statements() {
        println!(
            "{:<24} {:>8}  share {:>20}  withdrawn {:>20}  remaining {:>20}",
            s.partner.name,
            format_percentage(s.allocation.effective_percentage),
            format_currency(s.allocation.share, &currency),
            format_currency(s.total_withdrawn, &currency),
            format_currency(s.remaining, &currency)
        );
    }
}

fn run_withdraw(service: &PartnersService<SqliteStore>, args: WithdrawArgs) -> Result<()> {
    let currency = service.currency();

    let mut draft = WithdrawalDraft::new(args.amount, &args.receipt, &args.recipient);
    if let Some(date) = &args.date {
        draft = draft.on(date);
    }
    if let Some(path) = &args.receipt_image {
        draft = draft.with_receipt(read_receipt(path)?);
    }

    let withdrawal = match service.propose_withdrawal(&args.partner_id, draft)? {
        Proposal::Admitted(withdrawal) => withdrawal,
        Proposal::NeedsConfirmation { pending, details } => {
            println!("⚠️  {}", details.message(&currency));
            if args.yes || ask_confirmation("Proceed with this withdrawal?")? {
                service.confirm_withdrawal(pending)?
            } else {
                service.cancel_withdrawal(pending);
                println!("✗ Withdrawal discarded");
                return Ok(());
            }
        }
    };

    println!(
        "✓ Recorded withdrawal {} of {} for {}",
        withdrawal.id,
        format_currency(withdrawal.amount, &currency),
        withdrawal.partner_name
    );
    Ok(())
}

fn read_receipt(path: &Path) -> Result<ReceiptImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read receipt {}", path.display()))?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    Ok(ReceiptImage::new(ReceiptImage::mime_for_extension(extension), bytes))
}

fn ask_confirmation(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_withdrawals(service: &PartnersService<SqliteStore>, partner_id: &str) -> Result<()> {
    let currency = service.currency();
    let withdrawals = service.withdrawals_for(partner_id);

    if withdrawals.is_empty() {
        // a deleted partner can still have history, so only complain if both are missing
        service.partner(partner_id)?;
        println!("No withdrawals for this partner.");
        return Ok(());
    }

    for w in &withdrawals {
        println!(
            "{}  {:>20}  receipt #{:<10} to {}{}  [{}]",
            w.date,
            format_currency(w.amount, &currency),
            w.receipt_number,
            w.recipient_name,
            if w.has_receipt() { "  📎" } else { "" },
            w.id
        );
    }
    let total: f64 = withdrawals.iter().map(|w| w.amount).sum();
    println!("Total: {}", format_currency(total, &currency));
    Ok(())
}

fn print_orphans(service: &PartnersService<SqliteStore>) {
    let currency = service.currency();
    let groups = service.orphan_groups();

    if groups.is_empty() {
        println!("No orphaned withdrawals.");
        return;
    }

    for g in groups {
        println!(
            "{} [{}]: {} withdrawal(s), {}",
            g.partner_name,
            g.partner_id,
            g.count,
            format_currency(g.total, &currency)
        );
    }
}

fn print_employees(service: &PartnersService<SqliteStore>) {
    let currency = service.currency();
    let employees = service.employees();

    if employees.is_empty() {
        println!("No employees on record.");
        return;
    }

    for e in &employees {
        println!(
            "{:<24} {:<16} {:>20}  since {}",
            e.name,
            e.position,
            format_currency(e.salary, &currency),
            e.hire_date
        );
    }
}

#[cfg(feature = "ai")]
fn run_summary(service: &PartnersService<SqliteStore>, config: &AppConfig) -> Result<()> {
    use venue_partners::summary::GeminiClient;

    let facts = collect_facts(service);
    let client = GeminiClient::new(config.summary.api_key(), &config.summary.model);
    let runtime = tokio::runtime::Runtime::new()?;
    println!("{}", runtime.block_on(client.generate(&facts)));
    Ok(())
}

#[cfg(not(feature = "ai"))]
fn run_summary(service: &PartnersService<SqliteStore>, _config: &AppConfig) -> Result<()> {
    println!("{}", venue_partners::offline_summary(&collect_facts(service)));
    Ok(())
}

fn collect_facts(service: &PartnersService<SqliteStore>) -> FinancialFacts {
    FinancialFacts::collect(
        &service.reservations(),
        &service.expenses(),
        &service.partners(),
        &service.currency(),
    )
}
