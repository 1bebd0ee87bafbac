//! Catalog CLI - Command-line interface for the catalog admin
//!
//! Signs in against the catalog API and manages products from the terminal

use anyhow::{anyhow, Context, Result};
use catalog_applications::{
    ApplicationConfig, ApplicationError, CatalogSynchronizer, CategoryFilter, FileTokenStore,
    GuardDecision, ProductDraft, Route, RouteGuard, SessionManager,
};
use catalog_client::{RemoteBackend, MOCK_EMAIL, MOCK_PASSWORD};
use catalog_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, CatalogConfig,
    LoggingConfig, Product, RemoteMode,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Administer a product catalog from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the built-in in-memory catalog instead of the HTTP API
    #[arg(long, global = true)]
    mock: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        email: String,
        password: String,

        /// Path to continue to once signed in
        #[arg(long)]
        next: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show whether a session is active
    Status,

    /// List products
    Products {
        /// Case-insensitive text matched against name and description
        #[arg(short, long, default_value = "")]
        search: String,

        /// Category name, or "all"
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one product
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        category: String,
        #[arg(long)]
        stock: i64,
        #[arg(long)]
        image: String,
    },

    /// Update a product; omitted fields keep their current values
    Update {
        id: String,

        #[command(flatten)]
        fields: UpdateFields,
    },

    /// Delete a product
    Delete { id: String },

    /// Dashboard figures for the catalog
    Stats {
        #[arg(long)]
        json: bool,
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

#[derive(Args, Debug, Default)]
struct UpdateFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    stock: Option<i64>,
    #[arg(long)]
    image: Option<String>,
}

impl UpdateFields {
    fn apply_to(self, current: &Product) -> ProductDraft {
        let mut draft = ProductDraft::from(current);
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(stock) = self.stock {
            draft.stock = stock;
        }
        if let Some(image) = self.image {
            draft.image = image;
        }
        draft
    }
}

impl Commands {
    /// View a command corresponds to, for guarding
    fn route(&self) -> Option<Route> {
        match self {
            Commands::Products { .. } | Commands::Create { .. } => Some(Route::Products),
            Commands::Show { id, .. } | Commands::Update { id, .. } | Commands::Delete { id } => {
                Some(Route::ProductDetail(id.clone()))
            }
            Commands::Stats { .. } => Some(Route::Home),
            Commands::Login { .. } => Some(Route::SignIn),
            Commands::Logout | Commands::Status | Commands::Config { .. } => None,
        }
    }
}

/// Services shared by every command that talks to the catalog
struct App {
    session: Arc<SessionManager>,
    guard: RouteGuard,
    catalog: CatalogSynchronizer,
    mode: RemoteMode,
}

impl App {
    async fn start(config: &CatalogConfig) -> Result<Self> {
        let backend = RemoteBackend::from_config(config)
            .context("Failed to set up the catalog backend")?;

        let store = FileTokenStore::new(session_path(config));
        debug!(path = ?store.path(), "Using session storage");

        let session = Arc::new(
            SessionManager::new(backend.authenticator, Arc::new(store))
                .with_login_timeout_ms(config.timeout_ms()),
        );
        session.restore().await;

        Ok(Self {
            guard: RouteGuard::new(session.clone()),
            catalog: CatalogSynchronizer::new(
                backend.remote,
                session.clone(),
                ApplicationConfig::from(config),
            ),
            session,
            mode: config.api.mode,
        })
    }

    /// Returns false, after telling the user, when sign-in is required
    fn admit(&self, route: Route) -> bool {
        match self.guard.check(route) {
            GuardDecision::Render(_) => true,
            GuardDecision::Redirect { from, .. } => {
                println!("🔒 Sign-in required to open {}", from);
                println!(
                    "   Run `catalog login <email> <password> --next {}` to continue there.",
                    from
                );
                false
            }
        }
    }
}

/// The mock backend keeps its own session file so a mock token is never sent
/// to a real server
fn session_path(config: &CatalogConfig) -> PathBuf {
    let path = config.session_storage_path();
    match config.api.mode {
        RemoteMode::Http => path,
        RemoteMode::Mock => path.with_file_name("session.mock.json"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging(&logging_config).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting catalog CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        validate,
    } = cli.command
    {
        return handle_config(cli.config.as_ref(), show, init, validate).await;
    }

    let mut config = load_config(cli.config.as_ref())?.with_env_overrides()?;
    if cli.mock {
        config.api.mode = RemoteMode::Mock;
    }
    config.validate()?;

    let app = App::start(&config).await?;

    if let Some(route) = cli.command.route() {
        if !app.admit(route) {
            std::process::exit(2);
        }
    }

    let result = match cli.command {
        Commands::Login {
            email,
            password,
            next,
        } => handle_login(&app, &email, &password, next.as_deref()).await,
        Commands::Logout => {
            app.session.logout().await;
            println!("👋 Signed out");
            Ok(())
        }
        Commands::Status => {
            handle_status(&app);
            Ok(())
        }
        Commands::Products {
            search,
            category,
            json,
        } => handle_products(&app, &search, category, json).await,
        Commands::Show { id, json } => handle_show(&app, &id, json).await,
        Commands::Create {
            name,
            description,
            price,
            category,
            stock,
            image,
        } => {
            let draft = ProductDraft {
                name,
                description,
                price,
                category,
                stock,
                image,
            };
            handle_create(&app, &draft).await
        }
        Commands::Update { id, fields } => handle_update(&app, &id, fields).await,
        Commands::Delete { id } => handle_delete(&app, &id).await,
        Commands::Stats { json } => handle_stats(&app, json).await,
        Commands::Config { .. } => Ok(()),
    };

    result.map_err(|e| {
        println!("❌ {}", e.user_message());
        anyhow::Error::new(e)
    })
}

fn load_config(config_path: Option<&PathBuf>) -> Result<CatalogConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return Ok(CatalogConfig::from_file(path)?);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("catalog-admin").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".catalog-admin").join("config.toml")),
        Some(PathBuf::from("catalog-admin.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return Ok(CatalogConfig::from_file(path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(CatalogConfig::default())
}

/// Default location written by `config --init`
fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("catalog-admin").join("config.toml"))
        .ok_or_else(|| anyhow!("Could not determine a configuration directory"))
}

async fn handle_config(
    config_path: Option<&PathBuf>,
    show: bool,
    init: bool,
    validate: bool,
) -> Result<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        CatalogConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {:?}", path);
        println!("📝 Edit api.base_url to point at your catalog API.");
    }

    if show {
        let config = load_config(config_path)?;
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    if validate {
        let config = load_config(config_path)?;
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }
        }
    }

    if !(init || show || validate) {
        println!("Nothing to do. Use --init, --show or --validate.");
    }

    Ok(())
}

async fn handle_login(
    app: &App,
    email: &str,
    password: &str,
    next: Option<&str>,
) -> Result<(), ApplicationError> {
    log_operation_start!("login", email = %email);

    if let Err(e) = app.session.login(email, password).await {
        log_operation_error!("login", e);
        if app.mode == RemoteMode::Mock {
            println!(
                "💡 The mock catalog accepts {} / {}",
                MOCK_EMAIL, MOCK_PASSWORD
            );
        }
        return Err(e);
    }

    let from = next.map(Route::parse);
    let destination = RouteGuard::post_login_destination(from.as_ref());
    log_operation_success!("login", destination = %destination);

    println!("✅ Signed in");
    println!("➡️  Continue to {}", destination);
    Ok(())
}

fn handle_status(app: &App) {
    if app.session.is_authenticated() {
        println!("🔓 Signed in ({:?} backend)", app.mode);
    } else {
        println!("🔒 Signed out");
    }
}

async fn handle_products(
    app: &App,
    search: &str,
    category: CategoryFilter,
    json: bool,
) -> Result<(), ApplicationError> {
    log_operation_start!("list_products", search = %search, category = %category);
    app.catalog.load_all().await?;

    let products = app.catalog.filtered(search, category).await;
    log_operation_success!("list_products", count = products.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("No products match.");
        return Ok(());
    }

    println!(
        "{:<26} {:<32} {:<14} {:>10} {:>6}",
        "ID", "NAME", "CATEGORY", "PRICE", "STOCK"
    );
    for product in &products {
        println!(
            "{:<26} {:<32} {:<14} {:>10.2} {:>6}",
            product.id,
            truncate(&product.name, 32),
            product.category.label(),
            product.price,
            product.stock
        );
    }
    println!("\n{} product(s)", products.len());
    Ok(())
}

async fn handle_show(app: &App, id: &str, json: bool) -> Result<(), ApplicationError> {
    let product = app.catalog.get(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        print_product(&product);
    }
    Ok(())
}

async fn handle_create(app: &App, draft: &ProductDraft) -> Result<(), ApplicationError> {
    log_operation_start!("create_product", name = %draft.name);

    let product = app.catalog.create(draft).await.map_err(|e| {
        log_operation_error!("create_product", e);
        e
    })?;

    log_operation_success!("create_product", id = %product.id);
    println!("✅ Created {}", product.id);
    print_product(&product);
    Ok(())
}

async fn handle_update(app: &App, id: &str, fields: UpdateFields) -> Result<(), ApplicationError> {
    log_operation_start!("update_product", id = %id);

    // Updates apply to cached entries only
    app.catalog.load_all().await?;
    let current = app
        .catalog
        .cached(id)
        .await
        .ok_or_else(|| ApplicationError::not_found(format!("No product with id {}", id)))?;

    let draft = fields.apply_to(&current);
    let product = app.catalog.update(id, &draft).await.map_err(|e| {
        log_operation_error!("update_product", e, id = %id);
        e
    })?;

    log_operation_success!("update_product", id = %id);
    println!("✅ Updated {}", product.id);
    print_product(&product);
    Ok(())
}

async fn handle_delete(app: &App, id: &str) -> Result<(), ApplicationError> {
    log_operation_start!("delete_product", id = %id);

    app.catalog.delete(id).await.map_err(|e| {
        log_operation_error!("delete_product", e, id = %id);
        e
    })?;

    log_operation_success!("delete_product", id = %id);
    println!("🗑️  Deleted {}", id);
    Ok(())
}

async fn handle_stats(app: &App, json: bool) -> Result<(), ApplicationError> {
    app.catalog.load_all().await?;
    let stats = app.catalog.stats().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("📊 Catalog overview");
    println!("   Products:    {}", stats.total_products);
    println!("   Categories:  {}", stats.total_categories);
    println!("   Low stock:   {}", stats.low_stock);
    println!("   Total value: {:.2}", stats.total_value);
    Ok(())
}

fn print_product(product: &Product) {
    println!("📦 {}", product.name);
    println!("   ID:          {}", product.id);
    println!("   Category:    {}", product.category.label());
    println!("   Price:       {:.2}", product.price);
    println!("   Stock:       {}", product.stock);
    println!("   Image:       {}", product.image);
    println!("   Updated:     {}", product.updated_at.format("%Y-%m-%d %H:%M"));
    println!("   {}", product.description);
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
