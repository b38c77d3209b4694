mod structures;

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

use std::sync::{Mutex, MutexGuard};

use actix_web::{get, http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use askama::Template;
use clap::{command, Parser};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::structures::{
    api::MonitorClient,
    config::{Config, Settings},
    dashboard::load_dashboard,
    errors::BoardError,
    modal::{HistoryModal, PageRequest},
    view::{modal_view, DashboardView, ModalView, NO_SITES_MESSAGE},
};

#[derive(Debug, Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    dashboard: DashboardView,
    modal: Option<ModalView>,
    refresh_seconds: u64,
    no_sites_message: &'a str,
}

type SharedModal = web::Data<Mutex<HistoryModal>>;

fn lock(modal: &SharedModal) -> Result<MutexGuard<'_, HistoryModal>, BoardError> {
    modal
        .lock()
        .map_err(|_| BoardError::Other("history modal lock poisoned".to_string()))
}

fn back_to_index() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

#[get("/")]
pub async fn index_handler(
    client: web::Data<MonitorClient>,
    settings: web::Data<Settings>,
    modal: SharedModal,
) -> Result<HttpResponse, BoardError> {
    let dashboard = load_dashboard(&client, settings.strip, OffsetDateTime::now_utc()).await;
    let modal = modal_view(&*lock(&modal)?);
    let index = IndexTemplate {
        dashboard,
        modal,
        refresh_seconds: settings.refresh_seconds,
        no_sites_message: NO_SITES_MESSAGE,
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html")
        .body(index.render()?))
}

#[derive(Debug, Deserialize)]
struct OpenQuery {
    url: String,
    title: Option<String>,
}

#[get("/history/open")]
pub async fn history_open_handler(
    query: web::Query<OpenQuery>,
    client: web::Data<MonitorClient>,
    modal: SharedModal,
) -> Result<HttpResponse, BoardError> {
    let OpenQuery { url, title } = query.into_inner();
    let title = title.filter(|title| !title.is_empty()).unwrap_or_else(|| url.clone());

    let daily = match client.fetch_recent_stats(Some(&url)).await {
        Ok(mut stats) => stats.remove(&url).unwrap_or_default(),
        Err(e) => {
            warn!("Failed to load daily stats for {}: {}", url, e);
            Vec::new()
        }
    };

    let request = lock(&modal)?.open(&url, &title, &daily);
    fetch_page(&client, &modal, request).await?;
    Ok(back_to_index())
}

#[get("/history/more")]
pub async fn history_more_handler(
    client: web::Data<MonitorClient>,
    modal: SharedModal,
) -> Result<HttpResponse, BoardError> {
    let request = lock(&modal)?.load_more();
    match request {
        Some(request) => fetch_page(&client, &modal, request).await?,
        None => debug!("load more ignored, no further page"),
    }
    Ok(back_to_index())
}

#[get("/history/close")]
pub async fn history_close_handler(modal: SharedModal) -> Result<HttpResponse, BoardError> {
    let mut modal = lock(&modal)?;
    if modal.is_open() {
        info!("Closing history for {}", modal.url());
        modal.close();
    }
    Ok(back_to_index())
}

// The lock is released while the page is in flight.
async fn fetch_page(
    client: &MonitorClient,
    modal: &SharedModal,
    request: PageRequest,
) -> Result<(), BoardError> {
    let result = client
        .fetch_history_page(&request.url, request.page, request.page_size)
        .await;
    if let Err(e) = &result {
        warn!(
            "Failed to load history for {} page {} ({}): {}",
            request.url,
            request.page,
            e.kind().as_str(),
            e
        );
    }
    lock(modal)?.complete(&request, result);
    Ok(())
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// path to config file
    #[arg(long, env, default_value = "./config.yaml")]
    config_path: String,

    /// monitoring API base URL, overrides `api_url` from the config file
    #[arg(long, env)]
    api_url: Option<String>,

    /// address to listen on
    #[arg(long, env, default_value = "0.0.0.0")]
    bind: String,

    /// port to listen on
    #[arg(long, env, default_value_t = 8080)]
    port: u16,
}

#[actix_web::main]
async fn main() -> Result<(), BoardError> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    info!("Started with args: {:?}", args);

    let settings = Config::load(&args.config_path, args.api_url.as_deref())?
        .into_settings(args.api_url.as_deref())?;
    info!("Polling monitoring API at {} ({:?} strips)", settings.api_url, settings.strip);

    let client = web::Data::new(MonitorClient::new(&settings.api_url, Client::new()));
    let settings = web::Data::new(settings);
    let modal = web::Data::new(Mutex::new(HistoryModal::new()));

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(client.clone())
            .app_data(settings.clone())
            .app_data(modal.clone())
            .service(index_handler)
            .service(history_open_handler)
            .service(history_more_handler)
            .service(history_close_handler)
    })
    .bind((args.bind.as_str(), args.port))?
    .run()
    .await?)
}
