use std::{process, sync::Arc};

use mathcast::{
    application::{
        batch::{self, clamp_concurrency},
        error::AppError,
        render::MathRenderService,
    },
    config,
    infra::{
        engines::build_collaborators,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Batch(args) => run_batch(settings, args).await,
    }
}

fn build_service(settings: &config::Settings) -> MathRenderService {
    let collaborators = build_collaborators(&settings.engines);
    MathRenderService::new(Arc::new(settings.capabilities.clone()), collaborators)
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let service = build_service(&settings);
    let router = http::build_router(HttpState::new(service));

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "mathcast::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_batch(settings: config::Settings, args: config::BatchArgs) -> Result<(), AppError> {
    let service = build_service(&settings);
    let concurrency = clamp_concurrency(args.concurrency);

    let input = batch::read_input(args.input.as_deref()).await?;
    let entries = batch::parse_entries(&input)?;

    let output = batch::render_batch(&service, entries, concurrency).await;
    batch::write_output(args.output.as_deref(), &output).await?;

    info!(target = "mathcast::batch", "Batch finished");
    Ok(())
}
