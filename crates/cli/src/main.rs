//! Pebble Market CLI - drive the storefront from a terminal.
//!
//! Every command works on a browser profile: a JSON file holding the same
//! keys the web storefront keeps per visitor (cart lines, accounts, the
//! signed-in user and the catalog cache).
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! pebble-cli catalog list --limit 5
//! pebble-cli catalog show 3
//!
//! # Fill and buy a cart
//! pebble-cli cart add 1 --quantity 2 --option Size=XL
//! pebble-cli cart show
//! pebble-cli cart checkout
//!
//! # Accounts
//! pebble-cli auth signup -n "Ada Lovelace" -e ada@example.com -p Secret123
//! pebble-cli auth whoami
//! ```
//!
//! # Environment Variables
//!
//! - `PEBBLE_PROFILE` - Profile file (default: `pebble-profile.json`)
//! - `CATALOG_API_BASE` and the other `CATALOG_*` variables read by the
//!   storefront configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pebble_storefront::storage::FileStore;

mod commands;

#[derive(Parser)]
#[command(name = "pebble-cli")]
#[command(author, version, about = "Pebble Market CLI tools")]
struct Cli {
    /// Browser profile file holding the cart and accounts
    #[arg(
        short,
        long,
        global = true,
        env = "PEBBLE_PROFILE",
        default_value = "pebble-profile.json"
    )]
    profile: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage accounts
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Number of products to request (default: `CATALOG_PAGE_SIZE`)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart lines and total
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: String,

        /// Quantity to add (1-999)
        #[arg(short, long, default_value = "1")]
        quantity: String,

        /// Variation choice such as `Size=XL` (repeatable)
        #[arg(short, long = "option", value_name = "GROUP=VALUE")]
        options: Vec<String>,
    },
    /// Increase a line by one
    Inc {
        /// Product ID
        id: String,
    },
    /// Decrease a line by one (never below 1)
    Dec {
        /// Product ID
        id: String,
    },
    /// Set a line's quantity
    Set {
        /// Product ID
        id: String,
        /// New quantity
        quantity: String,
    },
    /// Remove a line
    Remove {
        /// Product ID
        id: String,
    },
    /// Empty the cart
    Clear,
    /// Place the simulated order
    Checkout,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account and sign in
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Password confirmation (default: same as password)
        #[arg(short, long)]
        confirm: Option<String>,
    },
    /// Sign in
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load .env so clap's env fallbacks see it
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::new(cli.profile);

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { limit } => commands::catalog::list(&store, limit).await?,
            CatalogAction::Show { id } => commands::catalog::show(&store, &id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&store),
            CartAction::Add {
                id,
                quantity,
                options,
            } => commands::cart::add(&store, &id, &quantity, &options).await?,
            CartAction::Inc { id } => commands::cart::increment(&store, &id)?,
            CartAction::Dec { id } => commands::cart::decrement(&store, &id)?,
            CartAction::Set { id, quantity } => commands::cart::set(&store, &id, &quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&store, &id)?,
            CartAction::Clear => commands::cart::clear(&store),
            CartAction::Checkout => commands::cart::checkout(&store)?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Signup {
                name,
                email,
                password,
                confirm,
            } => {
                let confirm = confirm.unwrap_or_else(|| password.clone());
                commands::auth::signup(&store, name, email, password, confirm)?;
            }
            AuthAction::Login { email, password } => {
                commands::auth::login(&store, email, password)?;
            }
            AuthAction::Logout => commands::auth::logout(&store),
            AuthAction::Whoami => commands::auth::whoami(&store),
        },
    }
    Ok(())
}
