use actix_web::{web, App, HttpServer};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod password;
mod service;
mod store;
mod token;

use config::Config;
use service::AccountService;
use store::MongoUserStore;
use token::TokenService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().unwrap_or_else(|err| {
        log::error!("configuration error: {}", err);
        std::process::exit(1)
    });

    let db = db::connect(&config.database_url).await.unwrap_or_else(|err| {
        log::error!("failed to connect to MongoDB: {}", err);
        std::process::exit(1)
    });

    let store = MongoUserStore::new(&db);
    // Registration relies on this unique key to settle concurrent inserts.
    if let Err(err) = store.ensure_indexes().await {
        log::error!("failed to create user indexes: {}", err);
        std::process::exit(1);
    }

    let service = web::Data::new(AccountService::new(
        store,
        TokenService::new(&config.jwt_secret),
        token::default_ttl(),
    ));

    log::info!("listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .route("/", web::get().to(handlers::index))
            .route(
                "/auth/register",
                web::post().to(handlers::register::<MongoUserStore>),
            )
            .route(
                "/auth/login",
                web::post().to(handlers::login::<MongoUserStore>),
            )
            .route(
                "/auth/getuser",
                web::get().to(handlers::get_user::<MongoUserStore>),
            )
            .route(
                "/auth/update-profile",
                web::put().to(handlers::update_profile::<MongoUserStore>),
            )
            .route(
                "/auth/add-to-wishlist",
                web::put().to(handlers::add_to_wishlist::<MongoUserStore>),
            )
            .route(
                "/auth/remove-from-wishlist",
                web::delete().to(handlers::remove_from_wishlist::<MongoUserStore>),
            )
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
