use actix_web::{web, HttpResponse, Responder};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use serde_json::json;

use crate::error::AccountError;
use crate::models::{self, LoginInput, ProfileUpdate, RegisterInput, WishlistItem};
use crate::service::AccountService;
use crate::store::UserStore;

/// Translate a service failure into the transport response. This is the only
/// place the error taxonomy meets HTTP status codes.
fn error_response(err: AccountError) -> HttpResponse {
    match err {
        AccountError::AlreadyExists => {
            HttpResponse::BadRequest().json(json!({ "detail": "User already exists" }))
        }
        AccountError::InvalidCredentials => {
            HttpResponse::Unauthorized().json(json!({ "detail": "Invalid credentials" }))
        }
        AccountError::Unauthenticated(err) => {
            HttpResponse::Unauthorized().json(json!({ "detail": err.to_string() }))
        }
        AccountError::NotFound => {
            HttpResponse::NotFound().json(json!({ "detail": "User not found" }))
        }
        AccountError::StoreUnavailable(err) => {
            log::error!("user store error: {}", err);
            HttpResponse::ServiceUnavailable()
                .json(json!({ "detail": "Service temporarily unavailable" }))
        }
    }
}

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "account API is running" }))
}

pub async fn register<S: UserStore + 'static>(
    service: web::Data<AccountService<S>>,
    input: web::Json<RegisterInput>,
) -> HttpResponse {
    if !models::is_valid_email(&input.email) {
        return HttpResponse::BadRequest().json(json!({ "detail": "Invalid email address" }));
    }
    match service.register(&input.email, &input.password).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "User registered successfully" })),
        Err(err) => error_response(err),
    }
}

pub async fn login<S: UserStore + 'static>(
    service: web::Data<AccountService<S>>,
    input: web::Json<LoginInput>,
) -> HttpResponse {
    match service.login(&input.email, &input.password).await {
        Ok(token) => HttpResponse::Ok().json(json!({
            "token": token,
            "user": { "email": input.email },
        })),
        Err(err) => error_response(err),
    }
}

pub async fn get_user<S: UserStore + 'static>(
    service: web::Data<AccountService<S>>,
    auth: BearerAuth,
) -> HttpResponse {
    match service.get_profile(auth.token()).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(err) => error_response(err),
    }
}

pub async fn update_profile<S: UserStore + 'static>(
    service: web::Data<AccountService<S>>,
    auth: BearerAuth,
    input: web::Json<ProfileUpdate>,
) -> HttpResponse {
    if let Some(ref new_email) = input.new_email {
        if !models::is_valid_email(new_email) {
            return HttpResponse::BadRequest().json(json!({ "detail": "Invalid email address" }));
        }
    }
    match service.update_profile(auth.token(), input.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Profile updated successfully" })),
        Err(err) => error_response(err),
    }
}

pub async fn add_to_wishlist<S: UserStore + 'static>(
    service: web::Data<AccountService<S>>,
    auth: BearerAuth,
    item: web::Json<WishlistItem>,
) -> HttpResponse {
    match service.add_wishlist_item(auth.token(), &item).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Item added to wishlist" })),
        Err(err) => error_response(err),
    }
}

pub async fn remove_from_wishlist<S: UserStore + 'static>(
    service: web::Data<AccountService<S>>,
    auth: BearerAuth,
    item: web::Json<WishlistItem>,
) -> HttpResponse {
    match service.remove_wishlist_item(auth.token(), &item).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Item removed from wishlist" })),
        Err(err) => error_response(err),
    }
}
