//! Authentication entities over typed links and blobs
//!
//! Link schemas:
//! - users: `(userNumericId, USER_TYPE_TAG)`
//! - tokens: `(tokenNumericId, userNumericId)`
//! - passwords: `(passwordNumericId, userNumericId)`
//!
//! String ids live with the blobs; the numeric link endpoints are folded
//! from them with [`ident::id_to_number`]. Writes touch the two
//! substrates sequentially, never atomically: cascades log and continue
//! past partial failures, and read paths skip whatever divergence a
//! partial write left behind. Tokens and passwords found without a
//! surviving user belong to a deleted user and are never resurfaced by
//! user-scoped reads, which filter on the back-reference id.

use crate::backend::Backend;
use crate::ident;
use crate::model::{now_millis, PasswordRecord, TokenRecord, UserRecord};
use crate::stats::{AuthStats, ReconcileReport};
use crate::store::{BlobStore, LinkStore, Namespace};
use crate::{Error, Result, USER_TYPE_TAG};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{error, info, warn};

/// Bookkeeping keys owned by the records themselves; stripped from
/// caller payloads so they cannot collide on serialization
const RESERVED_KEYS: &[&str] = &["userId", "tokenId", "passwordId", "createdAt", "updatedAt"];

fn strip_reserved(mut payload: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        payload.remove(*key);
    }
    payload
}

/// Store for users, tokens, and passwords
pub struct AuthStore {
    links: LinkStore,
    blobs: BlobStore,
}

impl AuthStore {
    /// Open an auth store over the given blob root and backend
    pub fn open(root: impl AsRef<Path>, backend: Box<dyn Backend>) -> Result<Self> {
        Ok(AuthStore {
            links: LinkStore::new(backend),
            blobs: BlobStore::open(root)?,
        })
    }

    /// The underlying link client
    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    /// The underlying blob store
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    // === Users ===

    /// Create a user from an arbitrary profile payload
    pub fn create_user(&self, profile: Map<String, Value>) -> Result<UserRecord> {
        let profile = strip_reserved(profile);
        let user_id = ident::generate_id(&Value::Object(profile.clone()), "user");

        let record = UserRecord {
            user_id: user_id.clone(),
            created_at: now_millis(),
            updated_at: None,
            attrs: profile,
        };
        self.blobs
            .save(Namespace::Users, &user_id, &serde_json::to_value(&record)?)?;

        let user_num = ident::id_to_number(&user_id);
        if let Err(e) = self.links.create_link(user_num, USER_TYPE_TAG) {
            error!(%user_id, error = %e, "failed to create user link");
            return Err(e);
        }

        info!(%user_id, "user created");
        Ok(record)
    }

    /// Read a user by id; absence is `None`
    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        match self.blobs.load(Namespace::Users, user_id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Every stored user, by namespace scan
    pub fn all_users(&self) -> Result<Vec<UserRecord>> {
        let mut users = Vec::new();
        for (id, doc) in self.blobs.list(Namespace::Users)? {
            match serde_json::from_value(doc) {
                Ok(record) => users.push(record),
                Err(e) => warn!(user_id = %id, error = %e, "skipping malformed user blob"),
            }
        }
        Ok(users)
    }

    /// Merge updates over an existing user.
    ///
    /// The id is preserved and `updatedAt` stamped. Unlike plain reads, a
    /// missing user here is an error.
    pub fn update_user(
        &self,
        user_id: &str,
        updates: Map<String, Value>,
    ) -> Result<UserRecord> {
        let mut record = self
            .get_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

        for (key, value) in strip_reserved(updates) {
            record.attrs.insert(key, value);
        }
        record.updated_at = Some(now_millis());

        self.blobs
            .save(Namespace::Users, user_id, &serde_json::to_value(&record)?)?;
        info!(%user_id, "user updated");
        Ok(record)
    }

    /// Delete a user and everything that belongs to them.
    ///
    /// Dependents go first (tokens, then passwords), then the user's own
    /// link, then the blob. Partial failures are logged and the cascade
    /// continues; an interruption leaves dependents' links behind with no
    /// surviving user blob, which user-scoped reads already tolerate.
    pub fn delete_user(&self, user_id: &str) -> Result<()> {
        for token in self.user_tokens(user_id)? {
            if let Err(e) = self.delete_token(&token.token_id) {
                warn!(token_id = %token.token_id, error = %e, "failed to delete token in cascade");
            }
        }

        for password in self.user_passwords(user_id)? {
            if let Err(e) = self.delete_password(&password.password_id) {
                warn!(password_id = %password.password_id, error = %e, "failed to delete password in cascade");
            }
        }

        let user_num = ident::id_to_number(user_id);
        match self.links.all_links() {
            Ok(all) => {
                let user_link = all
                    .iter()
                    .find(|l| l.source == user_num && l.target == USER_TYPE_TAG);
                if let Some(link) = user_link {
                    if let Err(e) = self.links.delete_link(link.id) {
                        warn!(%user_id, link_id = link.id, error = %e, "failed to delete user link");
                    }
                }
            }
            Err(e) => warn!(%user_id, error = %e, "failed to enumerate links in cascade"),
        }

        if let Err(e) = self.blobs.delete(Namespace::Users, user_id) {
            warn!(%user_id, error = %e, "failed to delete user blob");
        }

        info!(%user_id, "user deleted");
        Ok(())
    }

    /// Find a user by exact username; full namespace scan
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .all_users()?
            .into_iter()
            .find(|u| u.attr_str("username") == Some(username)))
    }

    /// Find a user by exact email; full namespace scan
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .all_users()?
            .into_iter()
            .find(|u| u.attr_str("email") == Some(email)))
    }

    // === Tokens ===

    /// Create a token owned by a user
    pub fn create_token(
        &self,
        user_id: &str,
        payload: Map<String, Value>,
    ) -> Result<TokenRecord> {
        let payload = strip_reserved(payload);
        let token_id = ident::generate_id(&Value::Object(payload.clone()), "token");

        let record = TokenRecord {
            token_id: token_id.clone(),
            user_id: user_id.to_string(),
            created_at: now_millis(),
            attrs: payload,
        };
        self.blobs
            .save(Namespace::Tokens, &token_id, &serde_json::to_value(&record)?)?;

        let token_num = ident::id_to_number(&token_id);
        let user_num = ident::id_to_number(user_id);
        if let Err(e) = self.links.create_link(token_num, user_num) {
            error!(%token_id, %user_id, error = %e, "failed to create token link");
            return Err(e);
        }

        info!(%token_id, %user_id, "token created");
        Ok(record)
    }

    /// Read a token by id; absence is `None`
    pub fn get_token(&self, token_id: &str) -> Result<Option<TokenRecord>> {
        match self.blobs.load(Namespace::Tokens, token_id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Every token owned by a user, by back-reference scan
    pub fn user_tokens(&self, user_id: &str) -> Result<Vec<TokenRecord>> {
        let mut tokens = Vec::new();
        for (id, doc) in self.blobs.list(Namespace::Tokens)? {
            match serde_json::from_value::<TokenRecord>(doc) {
                Ok(record) if record.user_id == user_id => tokens.push(record),
                Ok(_) => {}
                Err(e) => warn!(token_id = %id, error = %e, "skipping malformed token blob"),
            }
        }
        Ok(tokens)
    }

    /// Find a token by exact API key; full namespace scan
    pub fn find_token_by_api_key(&self, api_key: &str) -> Result<Option<TokenRecord>> {
        for (id, doc) in self.blobs.list(Namespace::Tokens)? {
            match serde_json::from_value::<TokenRecord>(doc) {
                Ok(record) if record.attr_str("apiKey") == Some(api_key) => {
                    return Ok(Some(record))
                }
                Ok(_) => {}
                Err(e) => warn!(token_id = %id, error = %e, "skipping malformed token blob"),
            }
        }
        Ok(None)
    }

    /// Delete a token: its link (first match on the folded id), then its
    /// blob. A missing blob is tolerated.
    pub fn delete_token(&self, token_id: &str) -> Result<()> {
        let token_num = ident::id_to_number(token_id);

        let all = self.links.all_links()?;
        if let Some(link) = all.iter().find(|l| l.source == token_num) {
            self.links.delete_link(link.id)?;
        }

        if let Err(e) = self.blobs.delete(Namespace::Tokens, token_id) {
            warn!(%token_id, error = %e, "failed to delete token blob");
        }

        info!(%token_id, "token deleted");
        Ok(())
    }

    // === Passwords ===

    /// Create or replace the user's password.
    ///
    /// At most one password is active per user: every prior password pair
    /// is deleted first. Delete-then-create is sequential, not atomic; an
    /// interruption in between leaves the user with no password rather
    /// than two.
    pub fn set_password(
        &self,
        user_id: &str,
        payload: Map<String, Value>,
    ) -> Result<PasswordRecord> {
        for prior in self.user_passwords(user_id)? {
            if let Err(e) = self.delete_password(&prior.password_id) {
                warn!(password_id = %prior.password_id, error = %e, "failed to delete prior password");
            }
        }

        let payload = strip_reserved(payload);
        let password_id = ident::generate_id(&Value::Object(payload.clone()), "pwd");

        let record = PasswordRecord {
            password_id: password_id.clone(),
            user_id: user_id.to_string(),
            created_at: now_millis(),
            attrs: payload,
        };
        self.blobs.save(
            Namespace::Passwords,
            &password_id,
            &serde_json::to_value(&record)?,
        )?;

        let password_num = ident::id_to_number(&password_id);
        let user_num = ident::id_to_number(user_id);
        if let Err(e) = self.links.create_link(password_num, user_num) {
            error!(%password_id, %user_id, error = %e, "failed to create password link");
            return Err(e);
        }

        info!(%password_id, %user_id, "password set");
        Ok(record)
    }

    /// The user's active password, if any
    pub fn user_password(&self, user_id: &str) -> Result<Option<PasswordRecord>> {
        Ok(self.user_passwords(user_id)?.into_iter().next())
    }

    /// Every password entry for a user. More than one means an earlier
    /// replacement was interrupted; `set_password` clears them all.
    pub fn user_passwords(&self, user_id: &str) -> Result<Vec<PasswordRecord>> {
        let mut passwords = Vec::new();
        for (id, doc) in self.blobs.list(Namespace::Passwords)? {
            match serde_json::from_value::<PasswordRecord>(doc) {
                Ok(record) if record.user_id == user_id => passwords.push(record),
                Ok(_) => {}
                Err(e) => warn!(password_id = %id, error = %e, "skipping malformed password blob"),
            }
        }
        Ok(passwords)
    }

    /// Delete a password: its link (first match on the folded id), then
    /// its blob. A missing blob is tolerated.
    pub fn delete_password(&self, password_id: &str) -> Result<()> {
        let password_num = ident::id_to_number(password_id);

        let all = self.links.all_links()?;
        if let Some(link) = all.iter().find(|l| l.source == password_num) {
            self.links.delete_link(link.id)?;
        }

        if let Err(e) = self.blobs.delete(Namespace::Passwords, password_id) {
            warn!(%password_id, error = %e, "failed to delete password blob");
        }

        info!(%password_id, "password deleted");
        Ok(())
    }

    // === Statistics & maintenance ===

    /// Derived counts, computed on demand. The split between token and
    /// password links is an estimate: both kinds share the same link
    /// shape and only blob counts tell them apart exactly.
    pub fn stats(&self) -> Result<AuthStats> {
        let links = self.links.all_links()?;
        let user_links = links.iter().filter(|l| l.target == USER_TYPE_TAG).count() as u64;

        Ok(AuthStats {
            total_links: links.len() as u64,
            user_links,
            user_files: self.blobs.count(Namespace::Users) as u64,
            dependent_links: links.len() as u64 - user_links,
            token_files: self.blobs.count(Namespace::Tokens) as u64,
            password_files: self.blobs.count(Namespace::Passwords) as u64,
        })
    }

    /// Remove every auth link and blob
    pub fn clear(&self) -> Result<()> {
        warn!("clearing all auth data");
        self.links.clear()?;

        for namespace in [Namespace::Users, Namespace::Tokens, Namespace::Passwords] {
            if let Err(e) = self.blobs.clear(namespace) {
                warn!(namespace = namespace.dir_name(), error = %e, "failed to clear namespace");
            }
        }
        Ok(())
    }

    /// Remove dangling links (no blob folds to the link's source) and
    /// orphan blobs (no link carries the blob's folded id as source).
    ///
    /// Best-effort, like the cascades whose interruptions it repairs.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let links = self.links.all_links()?;

        let users = self.folded_ids(Namespace::Users)?;
        let tokens = self.folded_ids(Namespace::Tokens)?;
        let passwords = self.folded_ids(Namespace::Passwords)?;

        let mut report = ReconcileReport::default();

        for link in &links {
            let dangling = if link.target == USER_TYPE_TAG {
                !users.contains_key(&link.source)
            } else {
                !tokens.contains_key(&link.source) && !passwords.contains_key(&link.source)
            };

            if dangling {
                match self.links.delete_link(link.id) {
                    Ok(()) => {
                        info!(link_id = link.id, source = link.source, "removed dangling link");
                        report.removed_links += 1;
                    }
                    Err(e) => warn!(link_id = link.id, error = %e, "failed to remove dangling link"),
                }
            }
        }

        let link_sources: HashSet<u64> = links.iter().map(|l| l.source).collect();
        let namespaces = [
            (Namespace::Users, &users),
            (Namespace::Tokens, &tokens),
            (Namespace::Passwords, &passwords),
        ];
        for (namespace, folded) in namespaces {
            for (num, id) in folded {
                if !link_sources.contains(num) {
                    match self.blobs.delete(namespace, id) {
                        Ok(()) => {
                            info!(namespace = namespace.dir_name(), id = %id, "removed orphan blob");
                            report.removed_blobs += 1;
                        }
                        Err(e) => {
                            warn!(namespace = namespace.dir_name(), id = %id, error = %e, "failed to remove orphan blob")
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// Folded numeric id of every blob in a namespace, mapped back to
    /// the string id
    fn folded_ids(&self, namespace: Namespace) -> Result<HashMap<u64, String>> {
        Ok(self
            .blobs
            .list(namespace)?
            .into_iter()
            .map(|(id, _)| (ident::id_to_number(&id), id))
            .collect())
    }
}
