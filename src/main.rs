use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleet::config::{config_dir, init_config_dir, load_config, Config};
use fleet::error::{FleetError, Result};
use fleet::ledger::{normalize_partner, EntryForm, LedgerService, LedgerState};
use fleet::report::{
    format_money, generate_report, parse_date, ReportArchive, ReportRequest, ReportScope,
    DISPLAY_DATE_FORMAT,
};
use fleet::store::LedgerStore;
use fleet::TypstRenderer;

#[derive(Parser)]
#[command(name = "fleet")]
#[command(version, about = "Fleet trip ledger with partner PDF reports", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.fleet)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Record a trip for a partner
    Add {
        /// Partner name (case-insensitive)
        #[arg(short, long)]
        partner: String,

        /// Vehicle number
        #[arg(short = 'n', long)]
        vehicle: String,

        /// Driver name
        #[arg(short, long)]
        driver: String,

        /// Trip amount (blank is zero)
        #[arg(short, long, default_value = "")]
        amount: String,

        /// One-time incentive for the vehicle (blank is zero)
        #[arg(short, long, default_value = "")]
        incentive: String,
    },

    /// Edit a trip; fields not given keep their current value
    Edit {
        /// Partner name
        partner: String,

        /// Entry number from 'list' (1-based, per partner)
        entry: usize,

        #[arg(long)]
        vehicle: Option<String>,

        #[arg(long)]
        driver: Option<String>,

        #[arg(long)]
        amount: Option<String>,

        #[arg(long)]
        incentive: Option<String>,
    },

    /// Remove a trip
    Remove {
        /// Partner name
        partner: String,

        /// Entry number from 'list' (1-based, per partner)
        entry: usize,
    },

    /// Set a partner's commission and remarks
    Commission {
        /// Partner name
        partner: String,

        /// Commission deducted from the partner's payable amount
        commission: String,

        /// Free-form remarks printed on the report
        #[arg(short, long, default_value = "")]
        remarks: String,
    },

    /// Delete every trip, commission and remark
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// List trips grouped by partner
    List {
        /// Only show this partner
        #[arg(short, long)]
        partner: Option<String>,
    },

    /// Show ledger status
    Status,

    /// Generate a PDF report
    Report {
        /// Period start (DD/MM/YYYY or YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Period end (DD/MM/YYYY or YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Company name for the header (default: config company name)
        #[arg(long)]
        company: Option<String>,

        /// Report a single partner (no grand summary)
        #[arg(short, long)]
        partner: Option<String>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// List generated reports, newest first
    Reports {
        /// Only reports covering this date
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a generated report
    DeleteReport {
        /// Report index from 'reports' or file name
        report: String,
    },

    /// Open a generated report
    OpenReport {
        /// Report index from 'reports' or file name
        report: String,
    },

    /// Copy a generated report into another directory
    ShareReport {
        /// Report index from 'reports' or file name
        report: String,

        /// Destination directory
        #[arg(long)]
        to: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Add {
            partner,
            vehicle,
            driver,
            amount,
            incentive,
        } => {
            let mut form = EntryForm {
                partner_name: partner,
                vehicle_number: vehicle,
                driver_name: driver,
                amount,
                incentive,
            };
            cmd_add(&cfg_dir, &mut form).await
        }
        Commands::Edit {
            partner,
            entry,
            vehicle,
            driver,
            amount,
            incentive,
        } => {
            let changes = EntryChanges {
                vehicle,
                driver,
                amount,
                incentive,
            };
            cmd_edit(&cfg_dir, &partner, entry, changes).await
        }
        Commands::Remove { partner, entry } => cmd_remove(&cfg_dir, &partner, entry).await,
        Commands::Commission {
            partner,
            commission,
            remarks,
        } => cmd_commission(&cfg_dir, &partner, &commission, &remarks).await,
        Commands::Clear { yes } => cmd_clear(&cfg_dir, yes).await,
        Commands::List { partner } => cmd_list(&cfg_dir, partner.as_deref()).await,
        Commands::Status => cmd_status(&cfg_dir).await,
        Commands::Report {
            from,
            to,
            company,
            partner,
            open,
        } => cmd_report(&cfg_dir, &from, &to, company, partner, open).await,
        Commands::Reports { date } => cmd_reports(&cfg_dir, date.as_deref()),
        Commands::DeleteReport { report } => cmd_delete_report(&cfg_dir, &report),
        Commands::OpenReport { report } => cmd_open_report(&cfg_dir, &report),
        Commands::ShareReport { report, to } => cmd_share_report(&cfg_dir, &report, &to),
    }
}

/// Loaded config plus a ledger service backed by the configured data file
struct App {
    config: Config,
    service: LedgerService,
}

async fn open_app(cfg_dir: &Path) -> Result<App> {
    let config = load_config(cfg_dir)?;
    let store = LedgerStore::open(config.data_file(cfg_dir)).await?;
    Ok(App {
        config,
        service: LedgerService::load(Arc::new(store)),
    })
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    init_config_dir(cfg_dir)?;

    println!("Initialized fleet config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Record a trip:               fleet add -p <partner> -n <vehicle> -d <driver> -a <amount>");
    println!("  3. Export a report:             fleet report --from 01/10/2026 --to 31/10/2026");

    Ok(())
}

async fn cmd_add(cfg_dir: &Path, form: &mut EntryForm) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let partner = normalize_partner(&form.partner_name);
    let entry = app.service.submit(form).await?;
    let symbol = &app.config.report.currency_symbol;

    println!("Added trip for {}", partner);
    println!("  Vehicle:   {}", entry.vehicle_number);
    println!("  Driver:    {}", entry.driver_name);
    println!("  Amount:    {}", format_money(entry.amount, symbol));
    if entry.is_incentivized() {
        println!("  Incentive: {}", format_money(entry.incentive, symbol));
    }

    Ok(())
}

struct EntryChanges {
    vehicle: Option<String>,
    driver: Option<String>,
    amount: Option<String>,
    incentive: Option<String>,
}

async fn cmd_edit(cfg_dir: &Path, partner: &str, index: usize, changes: EntryChanges) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let key = normalize_partner(partner);
    let entries = app
        .service
        .partner(&key)
        .await
        .ok_or_else(|| FleetError::PartnerNotFound(key.clone()))?;
    let old = index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .ok_or_else(|| FleetError::EntryNotFound(key.clone()))?;

    let new = old.edited(
        changes.vehicle.as_deref().unwrap_or(&old.vehicle_number),
        changes.driver.as_deref().unwrap_or(&old.driver_name),
        &changes.amount.unwrap_or_else(|| old.amount.to_string()),
        &changes.incentive.unwrap_or_else(|| old.incentive.to_string()),
    )?;
    let new = app.service.edit_entry(&key, old, new).await?;

    println!("Updated trip {} for {}", index, key);
    println!("  Vehicle: {}  Driver: {}", new.vehicle_number, new.driver_name);

    Ok(())
}

async fn cmd_remove(cfg_dir: &Path, partner: &str, index: usize) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let key = normalize_partner(partner);
    let entries = app
        .service
        .partner(&key)
        .await
        .ok_or_else(|| FleetError::PartnerNotFound(key.clone()))?;
    let entry = index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .ok_or_else(|| FleetError::EntryNotFound(key.clone()))?;

    let removed = app.service.remove_entry(&key, entry).await?;
    println!(
        "Removed trip {} ({}, {}) from {}",
        index, removed.vehicle_number, removed.driver_name, key
    );
    if app.service.partner(&key).await.is_none() {
        println!("  {} has no trips left and was removed", key);
    }

    Ok(())
}

async fn cmd_commission(cfg_dir: &Path, partner: &str, commission: &str, remarks: &str) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let key = normalize_partner(partner);
    let meta = app
        .service
        .set_commission_and_remarks(&key, commission, remarks)
        .await?;

    if meta.remarks.is_empty() {
        println!("Commission updated for {}", key);
    } else {
        println!("Partner data updated for {}", key);
    }
    println!(
        "  Commission: {}",
        format_money(meta.commission, &app.config.report.currency_symbol)
    );

    Ok(())
}

async fn cmd_clear(cfg_dir: &Path, yes: bool) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    if !yes {
        println!(
            "This deletes {} trip(s). Re-run with --yes to confirm.",
            app.service.entry_count().await
        );
        return Ok(());
    }

    app.service.clear_all_data().await?;
    println!("Cleared all trips, commissions and remarks");
    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct TripRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "VEHICLE")]
    vehicle: String,
    #[tabled(rename = "DRIVER")]
    driver: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "INCENTIVE")]
    incentive: String,
}

#[derive(Tabled)]
struct ReportFileRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "FILE")]
    file: String,
    #[tabled(rename = "PERIOD")]
    period: String,
    #[tabled(rename = "WRITTEN")]
    written: String,
}

/// Append TOTAL / INCENTIVE / COMMISSION / PAYABLE rows under the AMOUNT
/// column of a rounded trip table. Falls back to plain lines when a value
/// would not fit the column.
fn add_financial_footer(table: &str, rows: &[(&str, String)]) -> String {
    let plain = || {
        let mut out = table.to_string();
        for (label, value) in rows {
            out.push_str(&format!("\n{label}: {value}"));
        }
        out
    };

    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 4 {
        return plain();
    }

    // Parse the top border to discover column widths
    let top = lines[0];
    let Some(inner) = top.strip_prefix('╭').and_then(|s| s.strip_suffix('╮')) else {
        return plain();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() != 5 {
        return plain();
    }

    // Merge columns #, VEHICLE, DRIVER into one label cell; keep AMOUNT; drop INCENTIVE
    let left_width = widths[0] + widths[1] + widths[2] + 2; // +2 for the two ┴ replaced by spaces
    let amount_width = widths[3];
    let incentive_width = widths[4];

    let fits = rows.iter().all(|(label, value)| {
        label.chars().count() + 2 <= left_width && value.chars().count() + 2 <= amount_width
    });
    if !fits {
        return plain();
    }

    // Drop the table's bottom border and start building
    let mut out = lines[..lines.len() - 1].join("\n");
    out.push('\n');

    // First separator: merge left 3 columns, keep AMOUNT, close off INCENTIVE
    out.push_str(&format!(
        "├{}┴{}┴{}┼{}┼{}╯\n",
        "─".repeat(widths[0]),
        "─".repeat(widths[1]),
        "─".repeat(widths[2]),
        "─".repeat(amount_width),
        "─".repeat(incentive_width),
    ));

    // Summary rows with separators between them
    for (idx, (label, value)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:>left$} │ {:>amount$} │\n",
            label,
            value,
            left = left_width - 2,
            amount = amount_width - 2
        ));
        if idx < rows.len() - 1 {
            out.push_str(&format!(
                "├{}┼{}┤\n",
                "─".repeat(left_width),
                "─".repeat(amount_width)
            ));
        }
    }

    // Bottom border
    out.push_str(&format!(
        "╰{}┴{}╯",
        "─".repeat(left_width),
        "─".repeat(amount_width)
    ));

    out
}

fn print_partner(state: &LedgerState, partner: &str, symbol: &str) {
    let Some(entries) = state.ledger.get(partner) else {
        return;
    };

    let rows: Vec<TripRow> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| TripRow {
            index: idx + 1,
            vehicle: e.vehicle_number.clone(),
            driver: e.driver_name.clone(),
            amount: format_money(e.amount, symbol),
            incentive: format_money(e.incentive, symbol),
        })
        .collect();

    let amount: rust_decimal::Decimal = entries.iter().map(|e| e.amount).sum();
    let incentive: rust_decimal::Decimal = entries.iter().map(|e| e.incentive).sum();
    let meta = state.meta_for(partner);
    let payable = amount + incentive - meta.commission;

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let footer = [
        ("TOTAL", format_money(amount, symbol)),
        ("(+) INCENTIVE", format_money(incentive, symbol)),
        ("(-) COMMISSION", format_money(meta.commission, symbol)),
        ("(=) PAYABLE", format_money(payable, symbol)),
    ];

    println!("Partner: {}", partner);
    println!("{}", add_financial_footer(&table, &footer));
    if !meta.remarks.is_empty() {
        println!("Remarks: {}", meta.remarks);
    }
    println!();
}

async fn cmd_list(cfg_dir: &Path, partner: Option<&str>) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let state = app.service.snapshot().await;
    let symbol = &app.config.report.currency_symbol;

    if state.ledger.is_empty() {
        println!("No trips recorded yet.");
        return Ok(());
    }

    match partner {
        Some(name) => {
            let key = normalize_partner(name);
            if !state.ledger.contains(&key) {
                return Err(FleetError::PartnerNotFound(key));
            }
            print_partner(&state, &key, symbol);
        }
        None => {
            for (name, _) in state.ledger.partners() {
                print_partner(&state, name, symbol);
            }
        }
    }

    println!(
        "Total: {} trip(s) across {} partner(s)",
        state.ledger.entry_count(),
        state.ledger.partner_count()
    );
    println!("Use the trip number with edit/remove (e.g., 'fleet remove Acme 1')");

    Ok(())
}

async fn cmd_status(cfg_dir: &Path) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let state = app.service.snapshot().await;
    let archive = ReportArchive::new(app.config.report_dir(cfg_dir));
    let reports = archive.list(None)?;

    println!("Fleet Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Company:          {}", app.config.company.name);
    println!("Data file:        {}", app.service.store().path().display());
    println!("Partners:         {}", state.ledger.partner_count());
    println!("Trips:            {}", state.ledger.entry_count());
    println!(
        "Incentivized:     {}",
        app.service.incentivized_vehicles().await.len()
    );
    println!("Reports:          {}", reports.len());

    if let Some(latest) = reports.first() {
        println!();
        println!("Latest report: {}", latest.file_name);
    }

    Ok(())
}

async fn cmd_report(
    cfg_dir: &Path,
    from: &str,
    to: &str,
    company: Option<String>,
    partner: Option<String>,
    open: bool,
) -> Result<()> {
    let app = open_app(cfg_dir).await?;
    let start = parse_date(from)?;
    let end = parse_date(to)?;

    let company = company.unwrap_or_else(|| app.config.company.name.clone());
    let scope = partner.map_or(ReportScope::All, ReportScope::Partner);
    let request = ReportRequest::new(company, start, end)
        .with_scope(scope)
        .with_currency_symbol(app.config.report.currency_symbol.clone());

    let snapshot = app.service.snapshot().await;
    let output_dir = app.config.report_dir(cfg_dir);
    let summary_request = request.clone();

    // Rendering shells out to typst; keep it off the async workers
    let pdf_path = tokio::task::spawn_blocking(move || {
        generate_report(&snapshot, &request, &output_dir, &TypstRenderer::new())
    })
    .await
    .map_err(|e| FleetError::PdfGeneration(e.to_string()))??;

    println!("Generated report");
    println!(
        "  Period: {} to {}",
        summary_request.start.format(DISPLAY_DATE_FORMAT),
        summary_request.end.format(DISPLAY_DATE_FORMAT)
    );
    println!("  Saved:  {}", pdf_path.display());

    if open {
        fleet::report::open_path(&pdf_path)?;
    }

    Ok(())
}

fn report_archive(cfg_dir: &Path) -> Result<ReportArchive> {
    let config = load_config(cfg_dir)?;
    Ok(ReportArchive::new(config.report_dir(cfg_dir)))
}

fn cmd_reports(cfg_dir: &Path, date: Option<&str>) -> Result<()> {
    let archive = report_archive(cfg_dir)?;
    let on = date.map(parse_date).transpose()?;
    let reports = archive.list(on)?;

    if reports.is_empty() {
        println!("No reports generated yet.");
        return Ok(());
    }

    let rows: Vec<ReportFileRow> = reports
        .iter()
        .enumerate()
        .map(|(idx, r)| ReportFileRow {
            index: idx + 1,
            file: r.file_name.clone(),
            period: r
                .name
                .as_ref()
                .map(|n| {
                    format!(
                        "{} - {}",
                        n.start.format(DISPLAY_DATE_FORMAT),
                        n.end.format(DISPLAY_DATE_FORMAT)
                    )
                })
                .unwrap_or_else(|| "-".to_string()),
            written: r.modified.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Total: {} report(s)", reports.len());
    println!("Use index number with open-report/share-report/delete-report (e.g., 'fleet open-report 1')");

    Ok(())
}

fn cmd_delete_report(cfg_dir: &Path, reference: &str) -> Result<()> {
    let archive = report_archive(cfg_dir)?;
    let report = archive.find(reference)?;
    archive.delete(&report)?;
    println!("Deleted {}", report.file_name);
    Ok(())
}

fn cmd_open_report(cfg_dir: &Path, reference: &str) -> Result<()> {
    let archive = report_archive(cfg_dir)?;
    let report = archive.find(reference)?;
    archive.open(&report)?;
    println!("Opened {}", report.path.display());
    Ok(())
}

fn cmd_share_report(cfg_dir: &Path, reference: &str, destination: &Path) -> Result<()> {
    let archive = report_archive(cfg_dir)?;
    let report = archive.find(reference)?;
    let copy = archive.share(&report, destination)?;
    println!("Shared {}", report.file_name);
    println!("  Copy: {}", copy.display());
    Ok(())
}
