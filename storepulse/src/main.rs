//! storepulse - retail analytics console
//!
//! Role-gated CLI over the storepulse analytics backend: the finance
//! query console, supplier and product-pair recommendation panels, and
//! store layout planning.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use storepulse_core::{
    authorize, login, ApiClient, Config, Dispatcher, FileTokenStore, LayoutGrid, LayoutModel,
    LayoutSnapshot, LoginOutcome, PanelOutcome, QueryMode, Role, SalesPanel, Session,
    SubmitOutcome, SupplierPanel, ZoneType,
};

#[derive(Parser, Debug)]
#[command(name = "storepulse")]
#[command(about = "Retail analytics console")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the bearer token
    Login {
        /// Account email
        email: String,
        /// Keep the token across machine restarts
        #[arg(long)]
        remember: bool,
    },
    /// Drop the stored token
    Logout,
    /// Show the logged-in user, role, and start view
    Whoami,
    /// Ask the stock assistant (finance role)
    Ask {
        /// Query mode: chatbot, anomalies, performance, forecast, risk
        #[arg(long, default_value = "chatbot")]
        mode: String,
        /// Stock exchange label, required by every mode except chatbot
        #[arg(long)]
        stock: Option<String>,
        /// Free-text question for chatbot mode
        text: Vec<String>,
    },
    /// List the stock exchange labels accepted by the typed query modes
    Stocks,
    /// List the product categories accepted by `recommend suppliers`
    Categories,
    /// Recommendation panels
    #[command(subcommand)]
    Recommend(RecommendCommand),
    /// Store layout planning
    #[command(subcommand)]
    Layout(LayoutCommand),
}

#[derive(Subcommand, Debug)]
enum RecommendCommand {
    /// Recommend suppliers for a product category (supplier management role)
    Suppliers {
        /// Product category to source for (default: first known category)
        category: Option<String>,
    },
    /// Top co-purchased product pairs (sales role)
    Products {
        /// Number of pairs to fetch (default from configuration)
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum LayoutCommand {
    /// Generate a fresh template grid for the given floor dimensions
    Generate {
        /// Floor width in meters
        #[arg(long, default_value_t = 10.0)]
        width: f64,
        /// Floor height in meters
        #[arg(long, default_value_t = 10.0)]
        height: f64,
        /// Cell edge length in meters
        #[arg(long, default_value_t = 1.0)]
        cell_size: f64,
        /// Where to save the layout (default: data dir)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Send the saved layout to the optimizer and save the result
    Optimize {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Change the zone of one cell in the saved layout
    Edit {
        row: usize,
        col: usize,
        /// Zone name, e.g. Walkway, Door, Aisle
        zone: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the saved layout
    Show {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::ensure_xdg_env();
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = storepulse_core::logging::init(&config.logging).ok();

    tracing::info!("storepulse CLI starting");

    let store = FileTokenStore::at_default_paths();
    let mut session = Session::new(store);

    match cli.command {
        Command::Login { email, remember } => {
            let password =
                rpassword::prompt_password("Password: ").context("failed to read password")?;
            let client = ApiClient::new(&config.api)?;
            match login(&client, &mut session, &email, &password, remember).await? {
                LoginOutcome::LoggedIn => {
                    let claims = session.claims();
                    let name = claims.username.as_deref().unwrap_or(email.as_str());
                    println!("Logged in as {}", name);
                    match session.role() {
                        Some(role) => println!("Role: {}", role),
                        None => println!("Role: {}", claims.role_name.as_deref().unwrap_or("-")),
                    }
                }
                LoginOutcome::Rejected { message } => bail!(message),
            }
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            let claims = session.claims();
            if !claims.is_authenticated() {
                println!("Not logged in.");
                return Ok(());
            }
            println!("User:  {}", claims.username.as_deref().unwrap_or("-"));
            println!("Email: {}", claims.email.as_deref().unwrap_or("-"));
            match claims.role() {
                Some(role) => println!("Role:  {}", role),
                None => println!(
                    "Role:  {} (unrecognized)",
                    claims.role_name.as_deref().unwrap_or("-")
                ),
            }
            let start_view = match QueryMode::default_for(claims.role()) {
                Some(mode) => format!("{} console", mode),
                None => "recommendation panel".to_string(),
            };
            println!("View:  {}", start_view);
        }
        Command::Ask { mode, stock, text } => {
            require_role(&mut session, &[Role::Finance])?;
            let mode = parse_mode(&mode)?;
            let client = api_client(&config, &session)?;
            let mut dispatcher = Dispatcher::new(client);

            if mode == QueryMode::Chatbot {
                let question = text.join(" ");
                if question.trim().is_empty() {
                    bail!("chatbot mode needs a question");
                }
                dispatcher.set_input(question);
            }

            match dispatcher.submit(mode, stock.as_deref()).await {
                SubmitOutcome::Answered => {
                    if let Some(turn) = dispatcher.turns().last() {
                        println!("{}", turn.question);
                        println!();
                        println!("{}", turn.response);
                    }
                }
                SubmitOutcome::Skipped => bail!("{} mode needs --stock", mode),
                SubmitOutcome::Busy => bail!("another query is already in flight"),
            }
        }
        Command::Stocks => {
            let client = api_client(&config, &session)?;
            for label in client.stock_exchanges().await? {
                println!("{}", label);
            }
        }
        Command::Categories => {
            let client = api_client(&config, &session)?;
            for label in client.categories().await? {
                println!("{}", label);
            }
        }
        Command::Recommend(cmd) => run_recommend(cmd, &config, &mut session).await?,
        Command::Layout(cmd) => run_layout(cmd, &config, &session).await?,
    }

    Ok(())
}

/// Bail with a login hint unless the session passes the role gate.
fn require_role(session: &mut Session<FileTokenStore>, roles: &[Role]) -> Result<()> {
    if authorize(session, roles).is_granted() {
        Ok(())
    } else {
        bail!("not authorized for this view; run `storepulse login` with a permitted account")
    }
}

fn api_client(config: &Config, session: &Session<FileTokenStore>) -> Result<ApiClient> {
    let client = ApiClient::new(&config.api)?;
    Ok(client.with_bearer(session.token()))
}

fn parse_mode(s: &str) -> Result<QueryMode> {
    match s {
        "chatbot" => Ok(QueryMode::Chatbot),
        "anomalies" => Ok(QueryMode::Anomalies),
        "performance" => Ok(QueryMode::Performance),
        "forecast" => Ok(QueryMode::Forecast),
        "risk" => Ok(QueryMode::Risk),
        other => bail!(
            "unknown query mode: {}. Use chatbot, anomalies, performance, forecast, or risk",
            other
        ),
    }
}

async fn run_recommend(
    cmd: RecommendCommand,
    config: &Config,
    session: &mut Session<FileTokenStore>,
) -> Result<()> {
    match cmd {
        RecommendCommand::Suppliers { category } => {
            require_role(session, &[Role::SupplierManagement])?;
            let client = api_client(config, session)?;

            // Without an explicit category, start from the first known
            // one, the same view a supplier manager lands on.
            let category = match category {
                Some(c) => c,
                None => {
                    let mut categories = client.categories().await?;
                    if categories.is_empty() {
                        bail!("no product categories available");
                    }
                    categories.remove(0)
                }
            };

            let mut panel = SupplierPanel::new(client, &config.recommend);

            match panel.refresh(&category).await {
                PanelOutcome::Skipped => bail!("category must not be blank"),
                PanelOutcome::Busy => bail!("a refresh is already in flight"),
                PanelOutcome::Degraded => {
                    eprintln!("warning: recommendation service unavailable");
                }
                PanelOutcome::Updated => {}
            }

            println!("Category: {}", category);
            println!(
                "{:<30} {:<15} {:>10} {:>14} {:>13}",
                "Supplier", "Country", "Avg Price", "Disputes", "Transactions"
            );
            for row in panel.rows() {
                println!(
                    "{:<30} {:<15} {:>10} {:>14} {:>13}",
                    row.supplier_name,
                    row.country,
                    row.avg_supplier_price
                        .map(|p| format!("{:.2}", p))
                        .unwrap_or_else(|| "-".to_string()),
                    row.has_disputes.as_deref().unwrap_or("-"),
                    row.number_of_transactions
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }
        RecommendCommand::Products { count } => {
            require_role(session, &[Role::Sales])?;
            let client = api_client(config, session)?;
            let mut panel = SalesPanel::new(client);
            let count = count.unwrap_or(config.recommend.product_pairs);

            match panel.refresh(count).await {
                PanelOutcome::Skipped => bail!("count must be at least 1"),
                PanelOutcome::Busy => bail!("a refresh is already in flight"),
                PanelOutcome::Degraded => {
                    eprintln!("warning: recommendation service unavailable");
                }
                PanelOutcome::Updated => {}
            }

            println!("{:<30} {:<30} {:>8}", "Product", "Pairs with", "Score");
            for row in panel.rows() {
                println!(
                    "{:<30} {:<30} {:>8}",
                    row.product1_name,
                    row.product2_name,
                    row.score
                        .map(|s| format!("{:.3}", s))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }
    }
    Ok(())
}

async fn run_layout(
    cmd: LayoutCommand,
    config: &Config,
    session: &Session<FileTokenStore>,
) -> Result<()> {
    let client = api_client(config, session)?;

    match cmd {
        LayoutCommand::Generate {
            width,
            height,
            cell_size,
            file,
        } => {
            let path = layout_path(file);
            let mut model = LayoutModel::new(client);
            model
                .generate(width, height, cell_size)
                .await
                .context("failed to generate layout template")?;
            save_snapshot(&path, &model.snapshot())?;
            print_grid(model.grid());
            println!(
                "Saved {}x{} template to {}",
                model.grid().rows(),
                model.grid().cols(),
                path.display()
            );
        }
        LayoutCommand::Optimize { file } => {
            let path = layout_path(file);
            let snapshot = load_snapshot(&path)?;
            let mut model = LayoutModel::restore(client, snapshot)?;
            model
                .optimize()
                .await
                .context("failed to optimize layout")?;
            save_snapshot(&path, &model.snapshot())?;
            print_grid(model.grid());
            println!("Saved optimized layout to {}", path.display());
        }
        LayoutCommand::Edit {
            row,
            col,
            zone,
            file,
        } => {
            let path = layout_path(file);
            let zone: ZoneType = zone.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let snapshot = load_snapshot(&path)?;
            let mut model = LayoutModel::restore(client, snapshot)?;

            if row >= model.grid().rows() || col >= model.grid().cols() {
                bail!(
                    "cell ({}, {}) is outside the {}x{} grid",
                    row,
                    col,
                    model.grid().rows(),
                    model.grid().cols()
                );
            }
            if !model.palette().contains(&zone) {
                bail!(
                    "zone {} is not available on this layout yet; optimize first",
                    zone
                );
            }

            model.edit_cell(row, col, zone);
            save_snapshot(&path, &model.snapshot())?;
            print_grid(model.grid());
        }
        LayoutCommand::Show { file } => {
            let path = layout_path(file);
            let snapshot = load_snapshot(&path)?;
            let model = LayoutModel::restore(client, snapshot)?;
            print_grid(model.grid());
        }
    }
    Ok(())
}

fn layout_path(file: Option<PathBuf>) -> PathBuf {
    file.unwrap_or_else(|| Config::data_dir().join("layout.json"))
}

fn save_snapshot(path: &PathBuf, snapshot: &LayoutSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn load_snapshot(path: &PathBuf) -> Result<LayoutSnapshot> {
    let json = std::fs::read_to_string(path).with_context(|| {
        format!(
            "no saved layout at {}; run `storepulse layout generate` first",
            path.display()
        )
    })?;
    let snapshot = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(snapshot)
}

/// Print the grid one character per cell, with a legend.
fn print_grid(grid: &LayoutGrid) {
    for row in grid.cells() {
        let line: String = row.iter().map(|cell| zone_char(cell.zone)).collect();
        println!("{}", line);
    }
    println!();
    println!(". Empty   _ Walkway  A Aisle     C Cashier  D Door");
    println!("S Staff   B Butcher  F FruitsVeg P Spices");
}

fn zone_char(zone: ZoneType) -> char {
    match zone {
        ZoneType::Empty => '.',
        ZoneType::Walkway => '_',
        ZoneType::Aisle => 'A',
        ZoneType::Cashier => 'C',
        ZoneType::Door => 'D',
        ZoneType::StaffRoom => 'S',
        ZoneType::Butcher => 'B',
        ZoneType::FruitsVeg => 'F',
        ZoneType::Spices => 'P',
    }
}
