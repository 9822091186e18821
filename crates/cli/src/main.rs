//! Shopfront CLI - Inspect and edit your cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart (fetches from the server when an identity exists)
//! shopfront show
//!
//! # Add two mugs at 15.00 each
//! shopfront add --product 7 --quantity 2 --price 15.00 --name Mug --image mug.png
//!
//! # Change the quantity of line 101
//! shopfront update 101 3
//!
//! # Log in; a guest cart is merged into the account
//! shopfront login --token <TOKEN>
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_URL` - Base URL of the storefront API (required)
//! - `SHOPFRONT_CACHE_DIR` - Where the cart and token are kept (default: `.shopfront`)
//! - `RUST_LOG` - Log filter (default: `shopfront_cart=info,shopfront_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use shopfront_core::{CartLineId, Money, ProductId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront cart client")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(short, long)]
        product: ProductId,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,

        /// Unit price
        #[arg(long)]
        price: Money,

        /// Variant color
        #[arg(short, long)]
        color: Option<String>,

        /// Product name shown in the cart
        #[arg(short, long)]
        name: Option<String>,

        /// Product image URL shown in the cart
        #[arg(short, long)]
        image: Option<String>,
    },
    /// Change the quantity of a cart line
    Update {
        /// Cart line ID
        line: CartLineId,

        /// New quantity (values below 1 are ignored)
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line ID
        line: CartLineId,
    },
    /// Empty the local cart without contacting the server
    Clear,
    /// Log in and merge any guest cart into the account
    Login {
        /// Bearer token issued by the storefront
        #[arg(short, long)]
        token: String,
    },
    /// Forget the stored token
    Logout,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_cart=info,shopfront_cli=info".into());

    let json_layer = cli.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!cli.log_json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    if let Err(e) = run(cli.command).await {
        tracing::error!("Command failed: {e}");
        if let Some(message) = e.user_message() {
            tracing::error!("{message}");
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), commands::CommandError> {
    let session = commands::Session::open()?;

    let result = match command {
        Commands::Show => commands::cart::show(&session).await,
        Commands::Add {
            product,
            quantity,
            price,
            color,
            name,
            image,
        } => {
            let item = commands::cart::new_item(product, quantity, price, color, name, image)?;
            commands::cart::add(&session, item).await
        }
        Commands::Update { line, quantity } => {
            commands::cart::update(&session, line, quantity).await
        }
        Commands::Remove { line } => commands::cart::remove(&session, line).await,
        Commands::Clear => {
            commands::cart::clear(&session);
            Ok(())
        }
        Commands::Login { token } => commands::auth::login(&session, token).await,
        Commands::Logout => commands::auth::logout(&session),
    };

    // a 401 during the command logs the user out; keep the stored token in step
    session.persist_identity()?;
    result
}
