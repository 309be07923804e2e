//! DDRP CLI - Command-line dashboard for DDRP
//!
//! Sign in, manage orders and raw materials, and compose GST invoices
//! against the DDRP backend from a terminal.

mod invoice_file;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ddrp_applications::{
    format_amount, line_total, Dashboard, Landing, Notice, NoticeBoard, NoticeLevel,
    RestoreOutcome, SessionManager, StatusFilter,
};
use ddrp_client::{ApiClientConfig, BackendClient};
use ddrp_core::{
    default_config_path, init_logging, DdrpConfig, InvoiceStatus, LoggingConfig, NewRawMaterial,
    OrderStatus, RegisterRequest, RubberType,
};
use invoice_file::InvoiceFile;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ddrp")]
#[command(about = "Orders, raw materials and GST invoices for DDRP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and keep the session for later commands
    Login {
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the stored session
    Logout,

    /// Show who is signed in
    Status,

    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        password: String,
    },

    /// Stay attached and report when the session expires
    Watch,

    /// Order management
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },

    /// Raw material inventory (admin)
    Materials {
        #[command(subcommand)]
        command: MaterialCommands,
    },

    /// GST invoices
    Invoices {
        #[command(subcommand)]
        command: InvoiceCommands,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// List orders: all of them for an admin, your own otherwise
    List {
        /// Match product, customer name or order id
        #[arg(short, long, default_value = "")]
        search: String,

        /// All, Pending, "In Production", Dispatched or Delivered
        #[arg(long, default_value = "All")]
        status: StatusFilter,
    },

    /// Place a new order
    Place {
        product: String,

        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },

    /// Move an order to another production stage (admin)
    SetStatus { id: String, status: OrderStatus },

    /// Delete an order (admin)
    Delete { id: String },

    /// Set the expected delivery date, YYYY-MM-DD (admin)
    ExpectedDelivery { id: String, date: NaiveDate },

    /// Ask the backend to flag delayed orders (admin)
    CheckDelays,
}

#[derive(Subcommand)]
enum MaterialCommands {
    List,

    /// Record a raw material batch against an order
    Add {
        #[arg(long)]
        order_id: String,

        #[arg(long)]
        batch_no: String,

        #[arg(long)]
        recipe_no: String,

        #[arg(long)]
        quantity: f64,

        #[arg(long, default_value = "Natural")]
        rubber_type: RubberType,
    },

    Consume { id: String },

    Delete { id: String },

    /// Check natural rubber consumption deadlines
    Alerts,
}

#[derive(Subcommand)]
enum InvoiceCommands {
    List,

    /// Show computed totals for an invoice file without sending it
    Preview { file: PathBuf },

    /// Create an invoice from a JSON file
    Create { file: PathBuf },

    /// Download an invoice as PDF
    Pdf {
        id: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    SetStatus { id: String, status: InvoiceStatus },

    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = DdrpConfig::load(cli.config.as_deref())?;

    let mut logging_config: LoggingConfig = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    init_logging(&logging_config).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting DDRP CLI v{}", env!("CARGO_PKG_VERSION"));

    let notices = NoticeBoard::default();
    let printer = spawn_notice_printer(notices.subscribe());

    let result = run(cli, &config, notices).await;

    // Every sender is gone once `run` returns, so the printer drains and ends
    let shown_error = printer.await.unwrap_or(false);
    if let Err(e) = result {
        if !shown_error {
            eprintln!("❌ {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Print notices as they arrive; resolves to true if any was an error
fn spawn_notice_printer(
    mut receiver: broadcast::Receiver<Notice>,
) -> tokio::task::JoinHandle<bool> {
    tokio::spawn(async move {
        let mut shown_error = false;
        loop {
            match receiver.recv().await {
                Ok(notice) => {
                    print_notice(&notice);
                    shown_error |= notice.is_error();
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Skipped {} notices", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        shown_error
    })
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Error => eprintln!("❌ {}", notice.message),
        NoticeLevel::Success => println!("✅ {}", notice.message),
        NoticeLevel::Info => println!("ℹ️  {}", notice.message),
    }
}

async fn run(cli: Cli, config: &DdrpConfig, notices: NoticeBoard) -> anyhow::Result<()> {
    let client = BackendClient::new(ApiClientConfig::from(&config.api))?;
    let session = Arc::new(SessionManager::from_settings(
        &config.session,
        Arc::new(client.clone()),
        notices.clone(),
    ));

    match cli.command {
        Commands::Login { email, password } => {
            let state = session.sign_in(&client, &email, &password).await?;
            println!(
                "✅ Signed in as {} ({})",
                email,
                state.role.as_deref().unwrap_or("unknown role")
            );
        }
        Commands::Logout => {
            session.logout().await;
            println!("👋 Signed out");
        }
        Commands::Register {
            name,
            email,
            phone,
            password,
        } => {
            let request = RegisterRequest {
                name,
                email,
                phone,
                password,
            };
            session.register(&client, &request).await?;
            println!("Run 'ddrp login {}' to sign in", request.email);
        }
        Commands::Status => {
            let outcome = session.restore().await;
            debug!(?outcome, "Session restore");
            let state = session.snapshot().await;
            match session.landing().await {
                Landing::Login => println!("Not signed in"),
                landing => println!(
                    "Signed in: role {}, user {} (home: {})",
                    state.role.as_deref().unwrap_or("-"),
                    state.user_id.as_deref().unwrap_or("-"),
                    landing
                ),
            }
        }
        Commands::Watch => handle_watch(session).await?,
        Commands::Orders { command } => {
            let mut dashboard = open_dashboard(session, client).await;
            handle_orders(&mut dashboard, command).await?;
        }
        Commands::Materials { command } => {
            let mut dashboard = open_dashboard(session, client).await;
            handle_materials(&mut dashboard, command).await?;
        }
        Commands::Invoices { command } => {
            let mut dashboard = open_dashboard(session, client).await;
            handle_invoices(&mut dashboard, command).await?;
        }
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(cli.config.as_deref(), config, show, init, validate)?,
    }

    Ok(())
}

/// Restore the stored session before any protected command
async fn open_dashboard(session: Arc<SessionManager>, client: BackendClient) -> Dashboard {
    if session.restore().await == RestoreOutcome::NoSession {
        debug!("No stored session");
    }
    Dashboard::new(session, client)
}

async fn handle_watch(session: Arc<SessionManager>) -> anyhow::Result<()> {
    let mut receiver = session.notices().subscribe();
    if session.restore().await != RestoreOutcome::Restored {
        anyhow::bail!("No active session to watch");
    }

    println!("👀 Watching session, press Ctrl+C to stop");
    let sweep = session.spawn_expiry_sweep();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = receiver.recv() => {
                if !session.is_authenticated().await {
                    break;
                }
            }
        }
    }

    sweep.abort();
    Ok(())
}

async fn handle_orders(dashboard: &mut Dashboard, command: OrderCommands) -> anyhow::Result<()> {
    match command {
        OrderCommands::List { search, status } => {
            dashboard.refresh_orders().await?;
            let orders = dashboard.filtered_orders(&search, status);
            if orders.is_empty() {
                println!("No orders found");
            }
            for order in orders {
                println!(
                    "{:<24} {:<24} {:>6}  {:<14} {:<20} {}",
                    order.id,
                    order.product,
                    order.quantity,
                    order.status,
                    order.user_name.as_deref().unwrap_or("-"),
                    order.expected_delivery_date.as_deref().unwrap_or("-")
                );
            }
        }
        OrderCommands::Place { product, quantity } => {
            dashboard.place_order(&product, quantity).await?;
        }
        OrderCommands::SetStatus { id, status } => {
            dashboard.update_order_status(&id, status).await?;
        }
        OrderCommands::Delete { id } => dashboard.delete_order(&id).await?,
        OrderCommands::ExpectedDelivery { id, date } => {
            dashboard.set_expected_delivery(&id, date).await?;
        }
        OrderCommands::CheckDelays => {
            let report = dashboard.check_delays().await?;
            print_report(&report);
        }
    }
    Ok(())
}

async fn handle_materials(
    dashboard: &mut Dashboard,
    command: MaterialCommands,
) -> anyhow::Result<()> {
    match command {
        MaterialCommands::List => {
            let materials = dashboard.refresh_raw_materials().await?;
            if materials.is_empty() {
                println!("No raw materials recorded");
            }
            for material in materials {
                println!(
                    "{:<24} order {:<24} batch {:<10} {:>8.2} kg  {:<18} {}",
                    material.id,
                    material.order_id,
                    material.batch_no,
                    material.raw_material_quantity,
                    material.rubber_type,
                    if material.is_consumed() {
                        "consumed"
                    } else {
                        "in stock"
                    }
                );
            }
        }
        MaterialCommands::Add {
            order_id,
            batch_no,
            recipe_no,
            quantity,
            rubber_type,
        } => {
            let material = NewRawMaterial {
                order_id,
                batch_no,
                recipe_no,
                raw_material_quantity: quantity,
                rubber_type,
            };
            dashboard.add_raw_material(material).await?;
        }
        MaterialCommands::Consume { id } => dashboard.consume_raw_material(&id).await?,
        MaterialCommands::Delete { id } => dashboard.delete_raw_material(&id).await?,
        MaterialCommands::Alerts => {
            let report = dashboard.check_natural_alerts().await?;
            print_report(&report);
        }
    }
    Ok(())
}

async fn handle_invoices(
    dashboard: &mut Dashboard,
    command: InvoiceCommands,
) -> anyhow::Result<()> {
    match command {
        InvoiceCommands::List => {
            let invoices = dashboard.refresh_invoices().await?;
            if invoices.is_empty() {
                println!("No invoices yet");
            }
            for invoice in invoices {
                println!(
                    "{:<24} {:<12} {:<24} {:>12}  {:<8} due {}",
                    invoice.id,
                    invoice.invoice_number,
                    invoice.customer_name,
                    format_amount(invoice.final_amount),
                    invoice.status,
                    invoice.due_date
                );
            }
        }
        InvoiceCommands::Preview { file } => {
            let editor = InvoiceFile::load(&file)?.into_editor(NoticeBoard::default());
            let totals = editor.draft().totals();
            println!("📋 Invoice preview (backend totals are authoritative)");
            for (position, line) in editor.draft().lines().iter().enumerate() {
                println!(
                    "  {}. {:<24} {:>4} x {:>10} = {:>12}",
                    position + 1,
                    line.description,
                    line.quantity,
                    format_amount(line.rate),
                    format_amount(line_total(line))
                );
            }
            println!("  Subtotal:  {:>12}", format_amount(totals.subtotal));
            println!("  Tax:       {:>12}", format_amount(totals.total_tax));
            println!("  Discount:  {:>12}", format_amount(totals.discount_amount));
            println!("  Total:     {:>12}", format_amount(totals.final_amount));
        }
        InvoiceCommands::Create { file } => {
            let notices = dashboard.session().notices().clone();
            let mut editor = InvoiceFile::load(&file)?.into_editor(notices);
            let invoice = dashboard.submit_invoice(&mut editor).await?;
            println!(
                "🧾 {} for {}: {}",
                invoice.invoice_number,
                invoice.customer_name,
                format_amount(invoice.final_amount)
            );
        }
        InvoiceCommands::Pdf { id, output } => {
            let bytes = dashboard.download_invoice_pdf(&id).await?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("invoice_{}.pdf", id)));
            tokio::fs::write(&output, bytes).await?;
            println!("📄 Saved {}", output.display());
        }
        InvoiceCommands::SetStatus { id, status } => {
            dashboard.update_invoice_status(&id, status).await?;
        }
        InvoiceCommands::Delete { id } => dashboard.delete_invoice(&id).await?,
    }
    Ok(())
}

fn print_report(report: &serde_json::Value) {
    match report {
        serde_json::Value::Null => {}
        serde_json::Value::String(text) => println!("{}", text),
        other => match serde_json::to_string_pretty(other) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", other),
        },
    }
}

fn handle_config(
    path: Option<&Path>,
    config: &DdrpConfig,
    show: bool,
    init: bool,
    validate: bool,
) -> anyhow::Result<()> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if init {
        DdrpConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {}", config_path.display());
    }

    if show {
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        // Loading already validated; report it explicitly
        config.validate()?;
        println!("✅ Configuration is valid");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_order_commands() {
        let cli = Cli::try_parse_from([
            "ddrp",
            "orders",
            "list",
            "--search",
            "gasket",
            "--status",
            "In Production",
        ])
        .unwrap();
        match cli.command {
            Commands::Orders {
                command: OrderCommands::List { search, status },
            } => {
                assert_eq!(search, "gasket");
                assert_eq!(status, StatusFilter::Only(OrderStatus::InProduction));
            }
            _ => panic!("expected orders list"),
        }

        let cli =
            Cli::try_parse_from(["ddrp", "orders", "expected-delivery", "ord-1", "2024-07-15"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Orders {
                command: OrderCommands::ExpectedDelivery { .. }
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["ddrp", "orders", "set-status", "ord-1", "Shipped"]).is_err());
        assert!(Cli::try_parse_from(["ddrp", "invoices", "set-status", "inv-1", "Paid"]).is_ok());
    }

    #[test]
    fn test_parse_material_add() {
        let cli = Cli::try_parse_from([
            "ddrp",
            "materials",
            "add",
            "--order-id",
            "ord-1",
            "--batch-no",
            "B-7",
            "--recipe-no",
            "R-2",
            "--quantity",
            "25.5",
            "--rubber-type",
            "epdm",
        ])
        .unwrap();
        match cli.command {
            Commands::Materials {
                command:
                    MaterialCommands::Add {
                        quantity,
                        rubber_type,
                        ..
                    },
            } => {
                assert_eq!(quantity, 25.5);
                assert_eq!(rubber_type, RubberType::Epdm);
            }
            _ => panic!("expected materials add"),
        }
    }

    #[test]
    fn test_config_init_writes_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        handle_config(Some(path.as_path()), &DdrpConfig::default(), false, true, true).unwrap();

        let written = DdrpConfig::from_file(&path).unwrap();
        assert_eq!(written.api.base_url, DdrpConfig::default().api.base_url);
    }
}
