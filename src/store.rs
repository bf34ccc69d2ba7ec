use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::models::{User, UserPatch, WishlistItem};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a record with this email already exists")]
    AlreadyExists,
    #[error("no record for this email")]
    NotFound,
    #[error("user store unavailable: {0}")]
    Unavailable(#[from] mongodb::error::Error),
}

/// Persistence contract for user records, keyed by email.
///
/// All writes land immediately; there is no caching layer. Implementations
/// must report transport failures as [`StoreError::Unavailable`], never as
/// [`StoreError::NotFound`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new record; atomic on the unique email key, so a concurrent
    /// duplicate insert loses with [`StoreError::AlreadyExists`].
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Append `item` to the user's wishlist.
    async fn push_wishlist_item(&self, email: &str, item: &WishlistItem)
        -> Result<(), StoreError>;

    /// Remove every wishlist entry equal to `item`. Removing an item that is
    /// not present is a no-op success.
    async fn pull_wishlist_item(&self, email: &str, item: &WishlistItem)
        -> Result<(), StoreError>;

    /// Set only the fields present in `patch`, leaving the rest untouched.
    async fn update_fields(&self, email: &str, patch: UserPatch) -> Result<(), StoreError>;
}

/// MongoDB-backed [`UserStore`] over a single `users` collection.
#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        MongoUserStore {
            users: db.collection("users"),
        }
    }

    /// Create the unique index on `email` that makes registration races
    /// resolve to exactly one winner.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(index, None).await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
        ErrorKind::Command(command_err) => command_err.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = self.users.find_one(doc! { "email": email }, None).await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        match self.users.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::AlreadyExists),
            Err(err) => Err(StoreError::Unavailable(err)),
        }
    }

    async fn push_wishlist_item(
        &self,
        email: &str,
        item: &WishlistItem,
    ) -> Result<(), StoreError> {
        let item = bson::to_bson(item).map_err(mongodb::error::Error::from)?;
        let result = self
            .users
            .update_one(
                doc! { "email": email },
                doc! { "$push": { "wishlist": item } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn pull_wishlist_item(
        &self,
        email: &str,
        item: &WishlistItem,
    ) -> Result<(), StoreError> {
        let item = bson::to_bson(item).map_err(mongodb::error::Error::from)?;
        // $pull drops all matching occurrences; a match with nothing removed
        // still counts as success.
        let result = self
            .users
            .update_one(
                doc! { "email": email },
                doc! { "$pull": { "wishlist": item } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_fields(&self, email: &str, patch: UserPatch) -> Result<(), StoreError> {
        let mut set = Document::new();
        if let Some(new_email) = patch.email {
            set.insert("email", new_email);
        }
        if let Some(password_hash) = patch.password_hash {
            set.insert("password", password_hash);
        }
        if let Some(wishlist) = patch.wishlist {
            let wishlist = bson::to_bson(&wishlist).map_err(mongodb::error::Error::from)?;
            set.insert("wishlist", wishlist);
        }

        // Mongo rejects an empty $set; an all-absent patch degenerates to an
        // existence check.
        if set.is_empty() {
            return match self.find_by_email(email).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }

        let result = match self
            .users
            .update_one(doc! { "email": email }, doc! { "$set": set }, None)
            .await
        {
            Ok(result) => result,
            // An email change can collide with another record's unique key.
            Err(err) if is_duplicate_key(&err) => return Err(StoreError::AlreadyExists),
            Err(err) => return Err(StoreError::Unavailable(err)),
        };
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// In-memory [`UserStore`] mirroring the MongoDB semantics, for service and
/// handler tests. Clones share the same underlying records.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemStore {
    users: std::sync::Arc<std::sync::Mutex<Vec<User>>>,
}

#[cfg(test)]
impl MemStore {
    pub(crate) fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl UserStore for MemStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::AlreadyExists);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn push_wishlist_item(
        &self,
        email: &str,
        item: &WishlistItem,
    ) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.email == email)
            .ok_or(StoreError::NotFound)?;
        user.wishlist.push(item.clone());
        Ok(())
    }

    async fn pull_wishlist_item(
        &self,
        email: &str,
        item: &WishlistItem,
    ) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.email == email)
            .ok_or(StoreError::NotFound)?;
        user.wishlist.retain(|existing| existing != item);
        Ok(())
    }

    async fn update_fields(&self, email: &str, patch: UserPatch) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(ref new_email) = patch.email {
            if users
                .iter()
                .any(|user| user.email == *new_email && user.email != email)
            {
                return Err(StoreError::AlreadyExists);
            }
        }
        let user = users
            .iter_mut()
            .find(|user| user.email == email)
            .ok_or(StoreError::NotFound)?;
        if let Some(new_email) = patch.email {
            user.email = new_email;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(wishlist) = patch.wishlist {
            user.wishlist = wishlist;
        }
        Ok(())
    }
}
