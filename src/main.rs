use clap::Parser;
use roof_estimate::{cli, config, error, interactive};
use roof_estimate::places::{AddressResolver, GooglePlacesClient};
use roof_estimate::shell::Shell;
use roof_estimate::vision::{OpenAiVisionClient, RoofAnalyzer};
use cli::{Cli, Commands};
use config::{mask_key, Config};
use error::Result;
use interactive::EstimateOptions;
use roof_estimate_common::PricePerSquare;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "roof_estimate=debug" } else { "roof_estimate=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Search { query } => {
            let resolver: Arc<dyn AddressResolver> =
                Arc::new(GooglePlacesClient::from_config(&config)?);
            interactive::run_search(resolver, &query).await?;
        }

        Commands::Estimate { address, pick, price, yes, images_dir } => {
            println!("🏠 roof-estimate - 屋根の概算見積もり\n");

            let resolver: Arc<dyn AddressResolver> =
                Arc::new(GooglePlacesClient::from_config(&config)?);
            let analyzer: Arc<dyn RoofAnalyzer> =
                Arc::new(OpenAiVisionClient::from_config(&config)?);

            let mut shell = Shell::new(
                resolver,
                analyzer,
                PricePerSquare::new(config.default_price_per_square),
                config.settle_delay(),
            );

            let options = EstimateOptions {
                address,
                pick,
                price,
                yes,
                images_dir,
            };
            interactive::run_estimate(&config, &mut shell, options).await?;

            println!("\n✅ 完了");
        }

        Commands::Config { set_google_key, set_openai_key, show } => {
            let mut config = config;
            let changed = set_google_key.is_some() || set_openai_key.is_some();

            if let Some(key) = set_google_key {
                config.google_maps_api_key = Some(key);
                println!("✔ Google Maps APIキーを設定しました");
            }
            if let Some(key) = set_openai_key {
                config.openai_api_key = Some(key);
                println!("✔ OpenAI APIキーを設定しました");
            }
            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.model);
                println!("  国制限: {}", config.country);
                println!("  ズーム: {}", config.zoom);
                println!("  画像サイズ: {}px", config.image_size);
                println!("  デバウンス: {}ms", config.debounce_ms);
                println!("  撮影待ち: {}ms", config.settle_delay_ms);
                println!("  既定単価: ${}", config.default_price_per_square);
                println!(
                    "  Google Maps APIキー: {}",
                    mask_key(config.google_maps_api_key().ok().as_deref())
                );
                println!(
                    "  OpenAI APIキー: {}",
                    mask_key(config.openai_api_key().ok().as_deref())
                );
            }
        }
    }

    Ok(())
}
