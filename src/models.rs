use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// A user record as persisted in the `users` collection.
///
/// The digest field is stored under the `password` key; only the argon2
/// digest ever reaches the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub wishlist: Vec<WishlistItem>,
}

/// A saved wishlist entry: either a plain string or a small structured
/// object. Removal matches by value equality, so two entries compare equal
/// only when their whole content does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WishlistItem {
    Text(String),
    Record(Document),
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub new_email: Option<String>,
    pub new_password: Option<String>,
    pub wishlist: Option<Vec<WishlistItem>>,
}

/// Store-level patch derived from a [`ProfileUpdate`] after the password
/// has been hashed.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub wishlist: Option<Vec<WishlistItem>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none() && self.wishlist.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub email: String,
    pub wishlist: Vec<WishlistItem>,
}

/// Basic shape check: exactly one `@` with a non-empty local part and
/// domain, within the RFC 5321 length limit.
pub fn is_valid_email(s: &str) -> bool {
    if s.is_empty() || s.len() > 254 {
        return false;
    }
    match s.find('@') {
        Some(at) => at > 0 && at < s.len() - 1 && !s[at + 1..].contains('@'),
        None => false,
    }
}
