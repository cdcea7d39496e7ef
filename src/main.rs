use clap::Parser;
use xoso_etl::config::file::RegionsConfig;
use xoso_etl::config::Region;
use xoso_etl::sources::daily::{DailySource, DAILY_URL_TEMPLATE};
use xoso_etl::sources::southern::{SouthernSource, XSMN_URL, XSMT_URL};
use xoso_etl::sources::xsmb::{XsmbSource, XSMB_URL};
use xoso_etl::utils::{logger, validation::Validate};
use xoso_etl::{
    CliConfig, CsvSink, DatePolicy, EtlError, IngestEngine, MergeOutcome, Merger, Result,
    SheetStore, Source,
};

#[tokio::main]
async fn main() {
    let mut config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);
    tracing::info!("Starting xoso-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Some(path) = config.config_file.clone() {
        match RegionsConfig::from_file(&path).and_then(|file| config.apply_file(&file)) {
            Ok(()) => tracing::debug!("Loaded region settings from {}", path.display()),
            Err(e) => fail(e),
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    match config.load_credentials() {
        Ok(Some(creds)) => tracing::info!(
            "🔑 Using service account {}",
            creds.client_email().unwrap_or("<unnamed>")
        ),
        Ok(None) => tracing::debug!("No service credentials supplied"),
        Err(e) => fail(e),
    }

    match run(&config).await {
        Ok(outcome) => {
            tracing::info!("✅ Ingestion completed");
            println!(
                "✅ {}: {} new rows written ({} already present)",
                config.effective_worksheet(),
                outcome.written,
                outcome.skipped_existing
            );
        }
        Err(e) => {
            tracing::error!("❌ Ingestion failed: {}", e);
            fail(e);
        }
    }
}

fn fail(e: EtlError) -> ! {
    eprintln!("❌ {}", e);
    std::process::exit(e.exit_code());
}

async fn run(config: &CliConfig) -> Result<MergeOutcome> {
    let store = SheetStore::open(&config.store)?;
    let sink = store.worksheet(config.effective_worksheet())?;
    let merger = Merger::new(
        config.effective_strategy(),
        config.batch_size,
        config.batch_delay(),
    );
    let policy = DatePolicy::from(config.date_policy);

    match config.region {
        Region::Mb => {
            let url = config
                .source_url
                .clone()
                .unwrap_or_else(|| XSMB_URL.to_string());
            run_engine(
                XsmbSource::new(url, config.html_file.clone()),
                sink,
                merger,
                policy,
            )
            .await
        }
        Region::Mn => {
            let url = config
                .source_url
                .clone()
                .unwrap_or_else(|| XSMN_URL.to_string());
            run_engine(
                SouthernSource::xsmn(url, config.html_file.clone()),
                sink,
                merger,
                policy,
            )
            .await
        }
        Region::Mt => {
            let url = config
                .source_url
                .clone()
                .unwrap_or_else(|| XSMT_URL.to_string());
            run_engine(
                SouthernSource::xsmt(url, config.html_file.clone()),
                sink,
                merger,
                policy,
            )
            .await
        }
        Region::MbDaily => {
            let template = config
                .source_url
                .clone()
                .unwrap_or_else(|| DAILY_URL_TEMPLATE.to_string());
            let source = DailySource::new(
                template,
                config.window_days,
                config.periods,
                config.start_date()?,
                config.fetch_delay(),
            );
            run_engine(source, sink, merger, policy).await
        }
    }
}

async fn run_engine<S: Source>(
    source: S,
    sink: CsvSink,
    merger: Merger,
    policy: DatePolicy,
) -> Result<MergeOutcome> {
    IngestEngine::new(source, sink, merger, policy).run().await
}
