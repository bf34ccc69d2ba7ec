use chrono::Duration;

use crate::error::AccountError;
use crate::models::{Profile, ProfileUpdate, User, UserPatch, WishlistItem};
use crate::password;
use crate::store::UserStore;
use crate::token::TokenService;

/// Orchestrates registration, login, profile retrieval, and wishlist
/// mutation over an injected [`UserStore`].
///
/// Constructed once at startup and shared across requests; holds no mutable
/// state of its own.
pub struct AccountService<S> {
    store: S,
    tokens: TokenService,
    token_ttl: Duration,
}

impl<S: UserStore> AccountService<S> {
    pub fn new(store: S, tokens: TokenService, token_ttl: Duration) -> Self {
        AccountService {
            store,
            tokens,
            token_ttl,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), AccountError> {
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AccountError::AlreadyExists);
        }
        let user = User {
            email: email.to_owned(),
            password_hash: password::hash(password),
            wishlist: Vec::new(),
        };
        // The unique index makes the insert the arbiter when two
        // registrations race past the check above.
        self.store.insert(&user).await?;
        Ok(())
    }

    /// Authenticate and issue a bearer token bound to the email.
    ///
    /// An unknown email and a wrong password both come back as
    /// `InvalidCredentials`, so callers cannot probe which addresses are
    /// registered.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => return Err(AccountError::InvalidCredentials),
        };
        if !password::verify(password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(self.tokens.issue(email, self.token_ttl))
    }

    pub async fn get_profile(&self, token: &str) -> Result<Profile, AccountError> {
        let email = self.tokens.verify(token)?;
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::NotFound)?;
        Ok(Profile {
            email: user.email,
            wishlist: user.wishlist,
        })
    }

    /// Apply the fields present in `update`; a new password is re-hashed, a
    /// wishlist replaces the stored one wholesale.
    pub async fn update_profile(
        &self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<(), AccountError> {
        let email = self.tokens.verify(token)?;
        let patch = UserPatch {
            email: update.new_email,
            password_hash: update.new_password.as_deref().map(password::hash),
            wishlist: update.wishlist,
        };
        self.store.update_fields(&email, patch).await?;
        Ok(())
    }

    pub async fn add_wishlist_item(
        &self,
        token: &str,
        item: &WishlistItem,
    ) -> Result<(), AccountError> {
        let email = self.tokens.verify(token)?;
        self.store.push_wishlist_item(&email, item).await?;
        Ok(())
    }

    pub async fn remove_wishlist_item(
        &self,
        token: &str,
        item: &WishlistItem,
    ) -> Result<(), AccountError> {
        let email = self.tokens.verify(token)?;
        self.store.pull_wishlist_item(&email, item).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use mongodb::bson::doc;

    const SECRET: &str = "service-test-secret";

    fn service() -> (AccountService<MemStore>, MemStore) {
        let store = MemStore::default();
        let service = AccountService::new(
            store.clone(),
            TokenService::new(SECRET),
            Duration::minutes(5),
        );
        (service, store)
    }

    #[actix_web::test]
    async fn register_then_login_round_trips() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();

        let token = service.login("user@example.com", "hunter2").await.unwrap();
        let profile = service.get_profile(&token).await.unwrap();
        assert_eq!(profile.email, "user@example.com");
        assert!(profile.wishlist.is_empty());
    }

    #[actix_web::test]
    async fn duplicate_registration_fails() {
        let (service, store) = service();
        service.register("user@example.com", "hunter2").await.unwrap();

        let err = service
            .register("user@example.com", "other-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists));
        assert_eq!(store.user_count(), 1);
    }

    #[actix_web::test]
    async fn login_failures_are_indistinguishable() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();

        let wrong_password = service
            .login("user@example.com", "wrong")
            .await
            .unwrap_err();
        let unknown_email = service
            .login("nobody@example.com", "hunter2")
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, AccountError::InvalidCredentials));
        assert!(matches!(unknown_email, AccountError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[actix_web::test]
    async fn profile_requires_valid_token() {
        let (service, _) = service();
        let err = service.get_profile("not.a.token").await.unwrap_err();
        assert!(matches!(err, AccountError::Unauthenticated(_)));
    }

    #[actix_web::test]
    async fn valid_token_for_missing_account_is_not_found() {
        let (service, _) = service();
        let token =
            TokenService::new(SECRET).issue("ghost@example.com", Duration::minutes(5));
        let err = service.get_profile(&token).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound));
    }

    #[actix_web::test]
    async fn wishlist_preserves_order_and_duplicates() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();
        let token = service.login("user@example.com", "hunter2").await.unwrap();

        let coin = WishlistItem::Text("BTC".to_owned());
        let note = WishlistItem::Record(doc! { "symbol": "ETH", "note": "watch" });
        service.add_wishlist_item(&token, &coin).await.unwrap();
        service.add_wishlist_item(&token, &note).await.unwrap();
        service.add_wishlist_item(&token, &coin).await.unwrap();

        let profile = service.get_profile(&token).await.unwrap();
        assert_eq!(
            profile.wishlist,
            vec![coin.clone(), note.clone(), coin.clone()]
        );
    }

    #[actix_web::test]
    async fn remove_drops_all_occurrences() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();
        let token = service.login("user@example.com", "hunter2").await.unwrap();

        let coin = WishlistItem::Text("BTC".to_owned());
        let note = WishlistItem::Record(doc! { "symbol": "ETH" });
        service.add_wishlist_item(&token, &coin).await.unwrap();
        service.add_wishlist_item(&token, &note).await.unwrap();
        service.add_wishlist_item(&token, &coin).await.unwrap();

        service.remove_wishlist_item(&token, &coin).await.unwrap();
        let profile = service.get_profile(&token).await.unwrap();
        assert_eq!(profile.wishlist, vec![note]);

        // Removing something that was never saved is a no-op success.
        service
            .remove_wishlist_item(&token, &WishlistItem::Text("DOGE".to_owned()))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn wishlist_mutation_for_missing_account_is_not_found() {
        let (service, _) = service();
        let token =
            TokenService::new(SECRET).issue("ghost@example.com", Duration::minutes(5));
        let item = WishlistItem::Text("BTC".to_owned());
        let err = service.add_wishlist_item(&token, &item).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound));
        let err = service
            .remove_wishlist_item(&token, &item)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound));
    }

    #[actix_web::test]
    async fn password_update_invalidates_the_old_one() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();
        let token = service.login("user@example.com", "hunter2").await.unwrap();

        let update = ProfileUpdate {
            new_password: Some("correct-horse".to_owned()),
            ..ProfileUpdate::default()
        };
        service.update_profile(&token, update).await.unwrap();

        let err = service.login("user@example.com", "hunter2").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
        service
            .login("user@example.com", "correct-horse")
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn email_update_moves_the_account() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();
        let token = service.login("user@example.com", "hunter2").await.unwrap();

        let update = ProfileUpdate {
            new_email: Some("renamed@example.com".to_owned()),
            ..ProfileUpdate::default()
        };
        service.update_profile(&token, update).await.unwrap();

        service
            .login("renamed@example.com", "hunter2")
            .await
            .unwrap();
        // The old token is bound to the old email, which no longer resolves.
        let err = service.get_profile(&token).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound));
    }

    #[actix_web::test]
    async fn wishlist_update_replaces_wholesale() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();
        let token = service.login("user@example.com", "hunter2").await.unwrap();
        service
            .add_wishlist_item(&token, &WishlistItem::Text("BTC".to_owned()))
            .await
            .unwrap();

        let replacement = vec![WishlistItem::Text("SOL".to_owned())];
        let update = ProfileUpdate {
            wishlist: Some(replacement.clone()),
            ..ProfileUpdate::default()
        };
        service.update_profile(&token, update).await.unwrap();

        let profile = service.get_profile(&token).await.unwrap();
        assert_eq!(profile.wishlist, replacement);
    }

    #[actix_web::test]
    async fn empty_update_still_checks_existence() {
        let (service, _) = service();
        service.register("user@example.com", "hunter2").await.unwrap();
        let token = service.login("user@example.com", "hunter2").await.unwrap();
        service
            .update_profile(&token, ProfileUpdate::default())
            .await
            .unwrap();

        let ghost =
            TokenService::new(SECRET).issue("ghost@example.com", Duration::minutes(5));
        let err = service
            .update_profile(&ghost, ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound));
    }
}
