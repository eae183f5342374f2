//! Storefront CLI
//!
//! Queries the catalog and exchange-rate services directly, applying the
//! same filtering, sorting and conversion rules as the HTTP server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use storefront_client::StorefrontClient;
use storefront_hex::StorefrontService;
use storefront_hex::service::ViewRequest;
use storefront_types::{ContactRequest, Direction, NewProductRequest, ProductId, ViewMode};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Storefront catalog CLI", long_about = None)]
struct Cli {
    /// Base URL of the catalog service
    #[arg(
        long,
        env = "CATALOG_API_URL",
        default_value = "http://localhost:3002/api"
    )]
    catalog_url: String,

    /// Base URL of the exchange-rate service
    #[arg(
        long,
        env = "RATES_API_URL",
        default_value = "http://localhost:3001/api"
    )]
    rates_url: String,

    /// Base URL of the contact service (defaults to the catalog URL)
    #[arg(long, env = "CONTACT_API_URL")]
    contact_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products with filters, sorting and paging
    Products {
        #[arg(long)]
        search: Option<String>,
        /// Exact category, or `all`
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_price: Option<u64>,
        #[arg(long)]
        max_price: Option<u64>,
        /// name, price, rating, stock, price-low, price-high
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        direction: Option<String>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
        /// grid or list
        #[arg(long)]
        view: Option<ViewMode>,
    },
    /// List category facets
    Facets,
    /// List products on promotion
    Promotions,
    /// Fetch the current CLP-per-USD rate
    Rate,
    /// Convert an amount between USD and CLP
    Convert {
        amount: f64,
        /// usd-to-clp or clp-to-usd
        #[arg(long, default_value = "usd-to-clp")]
        direction: Direction,
    },
    /// Product administration
    Product {
        #[command(subcommand)]
        action: ProductCommands,
    },
    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        category: String,
        /// Unit price in whole CLP
        #[arg(long)]
        price: i64,
        #[arg(long)]
        stock: i64,
        #[arg(long)]
        promotion: bool,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn load_catalog(service: &StorefrontService<StorefrontClient>) {
    let status = service.reload().await;
    if let Some(err) = status.last_error {
        eprintln!("✗ Catalog unavailable: {}", err.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = StorefrontClient::new(&cli.catalog_url, &cli.rates_url)?;
    if let Some(url) = &cli.contact_url {
        client = client.with_contact_url(url);
    }
    let service = StorefrontService::new(client);

    match cli.command {
        Commands::Products {
            search,
            category,
            min_price,
            max_price,
            sort,
            direction,
            page,
            page_size,
            view,
        } => {
            load_catalog(&service).await;
            service.refresh_rate().await;
            let view = service.catalog_view(ViewRequest {
                search,
                category,
                min_price,
                max_price,
                sort,
                direction,
                page,
                page_size,
                view,
                ..Default::default()
            })?;
            print_json(&view)?;
        }

        Commands::Facets => {
            load_catalog(&service).await;
            print_json(&service.facets())?;
        }

        Commands::Promotions => {
            load_catalog(&service).await;
            service.refresh_rate().await;
            print_json(&service.promotions())?;
        }

        Commands::Rate => {
            let state = service.refresh_rate().await;
            if let Some(err) = &state.last_error {
                eprintln!("✗ Using fallback rate: {}", err.message);
            }
            print_json(&state)?;
        }

        Commands::Convert { amount, direction } => {
            service.refresh_rate().await;
            let reference = service.convert(amount, direction)?;
            println!("{} = {}", reference.formatted_input, reference.formatted);
            println!("{}", reference.rate_line);
        }

        Commands::Product { action } => match action {
            ProductCommands::Create {
                name,
                code,
                category,
                price,
                stock,
                promotion,
            } => {
                let product = service
                    .create_product(NewProductRequest {
                        name,
                        code,
                        category,
                        price,
                        stock,
                        promotion,
                        updated_at: None,
                    })
                    .await?;
                print_json(&product)?;
            }
            ProductCommands::Delete { id } => {
                service.delete_product(ProductId::new(id)).await?;
                println!("✓ Product deleted");
            }
        },

        Commands::Contact {
            name,
            email,
            phone,
            subject,
            message,
        } => {
            service
                .submit_contact(ContactRequest {
                    name,
                    email,
                    phone,
                    subject,
                    message,
                })
                .await?;
            println!("✓ Message sent");
        }
    }

    Ok(())
}
