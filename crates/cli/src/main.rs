use clap::{Parser, Subcommand};
use catalog_core::{CoreConfig, Product, ProductService};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Product catalog maintenance CLI")]
struct Cli {
    /// Product record directory (overrides CATALOG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,
    /// Image upload directory (overrides CATALOG_UPLOAD_DIR)
    #[arg(long, global = true)]
    upload_dir: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products
    List,
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// Delete a product and its images
    Delete {
        /// Product id
        id: String,
    },
    /// Remove image files that no product references
    PruneOrphans {
        /// Only report what would be removed
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command given. Use --help for usage.");
        return Ok(());
    };

    let cfg = CoreConfig::from_env_values(
        cli.data_dir.or_else(|| std::env::var("CATALOG_DATA_DIR").ok()),
        cli.upload_dir
            .or_else(|| std::env::var("CATALOG_UPLOAD_DIR").ok()),
        std::env::var("CATALOG_MAX_FILE_SIZE").ok(),
        std::env::var("CATALOG_MAX_FILES").ok(),
    )?;
    let service = ProductService::new(Arc::new(cfg))?;

    match command {
        Commands::List => {
            let products = service.list()?;
            if products.is_empty() {
                println!("No products found.");
            } else {
                for product in products {
                    println!(
                        "ID: {}, Name: {}, Price: {}, Quantity: {}, Images: {}",
                        product.id,
                        product.product_name,
                        product.price,
                        product.quantity,
                        product.images.len()
                    );
                }
            }
        }
        Commands::Show { id } => match service.get(&id) {
            Ok(product) => print_product(&product),
            Err(e) => eprintln!("Error showing product: {}", e),
        },
        Commands::Delete { id } => match service.delete(&id) {
            Ok(warnings) => {
                println!("Deleted product: {}", id);
                for warning in warnings {
                    eprintln!("Warning: {}", warning);
                }
            }
            Err(e) => eprintln!("Error deleting product: {}", e),
        },
        Commands::PruneOrphans { dry_run: true } => {
            let orphans = service.orphaned_images()?;
            if orphans.is_empty() {
                println!("No orphaned images found.");
            }
            for path in orphans {
                println!("Would remove: {}", path.display());
            }
        }
        Commands::PruneOrphans { dry_run: false } => {
            let prune = service.prune_orphans()?;
            for path in &prune.removed {
                println!("Removed: {}", path);
            }
            for warning in &prune.warnings {
                eprintln!("Warning: {}", warning);
            }
            println!("Removed {} orphaned image(s).", prune.removed.len());
        }
    }

    Ok(())
}

fn print_product(product: &Product) {
    println!("ID: {}", product.id);
    println!("Name: {}", product.product_name);
    println!("Description: {}", product.description);
    println!("Price: {}", product.price);
    println!("Quantity: {}", product.quantity);
    println!("Created: {}", product.created_at);
    println!("Updated: {}", product.updated_at);
    println!("Images:");
    for (index, image) in product.images.iter().enumerate() {
        println!("  [{}] {}", index, image);
    }
}
