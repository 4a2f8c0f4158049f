//! Saved postcodes for signed-in users.

use std::sync::Arc;

use crate::error::StoreError;
use crate::lookup::PostcodeLookup;
use crate::userdata::UserDataDb;

/// Async front for [`UserDataDb`] that validates postcodes before saving.
///
/// SQLite work runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct PostcodeStore {
    db: Arc<UserDataDb>,
    lookup: PostcodeLookup,
}

impl PostcodeStore {
    pub fn new(db: UserDataDb, lookup: PostcodeLookup) -> Self {
        Self {
            db: Arc::new(db),
            lookup,
        }
    }

    /// Postcodes saved for `email`, in the order they were added.
    ///
    /// An unseen email gets an empty record and an empty list.
    pub async fn get_postcodes(&self, email: &str) -> Result<Vec<String>, StoreError> {
        let db = self.db.clone();
        let email = email.to_string();
        tokio::task::spawn_blocking(move || db.postcodes_or_create(&email)).await?
    }

    /// Validate `postcode` with the lookup service and append it, trimmed,
    /// for `email`.
    ///
    /// # Errors
    /// `StoreError::ValidationFailure` when the service does not recognise the
    /// postcode; storage is untouched in that case.
    pub async fn add_postcode(&self, email: &str, postcode: &str) -> Result<(), StoreError> {
        let postcode = postcode.trim();
        if !self.lookup.is_valid(postcode).await? {
            tracing::info!("Refusing to save unrecognised postcode {:?}", postcode);
            return Err(StoreError::ValidationFailure(postcode.to_string()));
        }

        let db = self.db.clone();
        let email = email.to_string();
        let postcode = postcode.to_string();
        tokio::task::spawn_blocking(move || db.append_postcode(&email, &postcode)).await??;
        Ok(())
    }
}
