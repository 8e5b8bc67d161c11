use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use medtalk::cli::{commands::{Cli, Commands}, run_cli};
use medtalk::config::AppConfig;
use medtalk::llm::ProviderFactory;
use medtalk::session::SessionStore;
use medtalk::speech;
use medtalk::store::LogStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    if !matches!(command, Commands::Serve) {
        if let Err(e) = run_cli(command, cli.config).await {
            error!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting MedTalk server...");

    let config = match AppConfig::load(&cli.config).and_then(|c| c.validate().map(|_| c)) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = match LogStore::open(&config.storage) {
        Ok(store) => web::Data::new(store),
        Err(e) => {
            error!("Failed to open log directory: {}", e);
            std::process::exit(1);
        }
    };

    let llm_provider = ProviderFactory::create_default(&config);
    let speech_provider = speech::create_default(&config);
    let sessions = web::Data::new(SessionStore::new(config.chat.max_history_messages));

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(config.clone()))
            .app_data(store.clone())
            .app_data(sessions.clone())
            .app_data(web::Data::new(llm_provider.clone()))
            .app_data(web::Data::new(speech_provider.clone()))
            .configure(medtalk::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
