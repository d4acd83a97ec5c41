//! Editing sessions for recipes and ingredients.
//!
//! A [`DraftSession`] owns one open editing panel. The backing document is
//! created lazily on the first edit, every later edit is written as a
//! single-field update, and closing the panel writes the whole form over
//! the stored document with merge semantics.
//!
//! Session state lives in `Cell`/`RefCell` and is never borrowed across an
//! `.await`, so several edits may be in flight at once on one task. While a
//! document is being created, further edits reach the local form but their
//! store write is dropped; the value is still written on finalize.

mod form;
mod ingredient_form;
mod recipe_form;

pub use form::{DraftForm, FormField};
pub use ingredient_form::{IngredientField, IngredientForm};
pub use recipe_form::{RecipeField, RecipeForm};

use std::cell::{Cell, RefCell};
use thiserror::Error;

use crate::db::{DocumentStore, Fields, StoreError};
use crate::identity::IdentityProvider;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftPhase {
    /// No backing document yet.
    NoDraft,
    /// An existing document is being read into the form.
    Loading,
    /// The first edit is creating the backing document.
    Creating,
    Populated(String),
    /// Finalized; no edits since.
    Saved(String),
}

/// What an autosave did with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveOutcome {
    /// Created the backing document, then wrote the field to it.
    Created(String),
    Updated(String),
    /// The form was being populated; nothing changed.
    SkippedWhileLoading,
    /// Another edit was creating the document; only the local form changed.
    DroppedDuringCreate,
}

impl AutosaveOutcome {
    pub fn draft_id(&self) -> Option<&str> {
        match self {
            AutosaveOutcome::Created(id) | AutosaveOutcome::Updated(id) => Some(id),
            _ => None,
        }
    }
}

pub struct DraftSession<S, I, F> {
    store: S,
    identity: I,
    form: RefCell<F>,
    active_id: RefCell<Option<String>>,
    loading: Cell<bool>,
    creating: Cell<bool>,
    finalized: Cell<bool>,
}

impl<S, I, F> DraftSession<S, I, F>
where
    S: DocumentStore,
    I: IdentityProvider,
    F: DraftForm,
{
    pub fn new(store: S, identity: I) -> Self {
        Self {
            store,
            identity,
            form: RefCell::new(F::default()),
            active_id: RefCell::new(None),
            loading: Cell::new(false),
            creating: Cell::new(false),
            finalized: Cell::new(false),
        }
    }

    pub fn phase(&self) -> DraftPhase {
        if self.loading.get() {
            return DraftPhase::Loading;
        }
        if self.creating.get() {
            return DraftPhase::Creating;
        }
        match self.active_id.borrow().clone() {
            None => DraftPhase::NoDraft,
            Some(id) if self.finalized.get() => DraftPhase::Saved(id),
            Some(id) => DraftPhase::Populated(id),
        }
    }

    pub fn active_id(&self) -> Option<String> {
        self.active_id.borrow().clone()
    }

    pub fn form_snapshot(&self) -> F
    where
        F: Clone,
    {
        self.form.borrow().clone()
    }

    /// Changes local form state without writing to the store. Used for
    /// values captured only on finalize, such as selection lists.
    pub fn edit_form<R>(&self, edit: impl FnOnce(&mut F) -> R) -> R {
        self.finalized.set(false);
        edit(&mut self.form.borrow_mut())
    }

    fn reset(&self, active_id: Option<String>) {
        *self.active_id.borrow_mut() = active_id;
        *self.form.borrow_mut() = F::default();
        self.loading.set(false);
        self.creating.set(false);
        self.finalized.set(false);
    }

    /// Starts a new entity. Nothing is written until the first edit.
    pub fn open_for_create(&self) {
        self.reset(None);
        tracing::debug!(kind = F::KIND, "opened for create");
    }

    /// Opens an existing document and fills the form from it.
    ///
    /// Returns `Ok(false)` when the document does not exist: the session
    /// keeps `id` as its draft and the form stays empty.
    pub async fn open_for_edit(&self, id: &str) -> Result<bool, DraftError> {
        self.reset(Some(id.to_string()));
        self.loading.set(true);

        let fetched = self.store.get(F::COLLECTION, id).await;
        self.loading.set(false);

        match fetched {
            Ok(Some(doc)) => {
                self.form.borrow_mut().populate(&doc);
                tracing::debug!(kind = F::KIND, %id, "opened for edit");
                Ok(true)
            }
            Ok(None) => {
                tracing::warn!(kind = F::KIND, %id, "document not found; form left empty");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(kind = F::KIND, %id, error = %e, "failed to load document");
                Err(e.into())
            }
        }
    }

    /// Applies one field edit locally and writes it to the backing
    /// document, creating the document on the first edit.
    pub async fn autosave_field(&self, field: F::Field) -> Result<AutosaveOutcome, DraftError> {
        if self.loading.get() {
            return Ok(AutosaveOutcome::SkippedWhileLoading);
        }

        self.form.borrow_mut().apply(&field);
        self.finalized.set(false);

        let Some(user_id) = self.identity.current_user_id() else {
            tracing::warn!(kind = F::KIND, field = field.name(), "edit while signed out");
            return Err(DraftError::NotSignedIn);
        };

        let current = self.active_id.borrow().clone();
        let (id, created) = match current {
            Some(id) => (id, false),
            None if self.creating.get() => {
                tracing::debug!(
                    kind = F::KIND,
                    field = field.name(),
                    "document creation in flight; store write dropped"
                );
                return Ok(AutosaveOutcome::DroppedDuringCreate);
            }
            None => {
                self.creating.set(true);
                let result = self
                    .store
                    .add(
                        F::COLLECTION,
                        Fields::new()
                            .set("userId", user_id)
                            .server_timestamp("createdAt")
                            .server_timestamp("updatedAt"),
                    )
                    .await;
                self.creating.set(false);

                match result {
                    Ok(id) => {
                        tracing::info!(kind = F::KIND, %id, "draft created");
                        *self.active_id.borrow_mut() = Some(id.clone());
                        (id, true)
                    }
                    Err(e) => {
                        tracing::error!(kind = F::KIND, error = %e, "failed to create draft");
                        return Err(e.into());
                    }
                }
            }
        };

        let update = Fields::new()
            .set(field.name(), field.value())
            .server_timestamp("updatedAt");
        if let Err(e) = self.store.update(F::COLLECTION, &id, update).await {
            tracing::error!(kind = F::KIND, %id, field = field.name(), error = %e, "autosave failed");
            return Err(e.into());
        }

        Ok(if created {
            AutosaveOutcome::Created(id)
        } else {
            AutosaveOutcome::Updated(id)
        })
    }

    /// Writes the full form over the stored document with merge semantics,
    /// so fields the form does not own are preserved.
    ///
    /// No-op (returning `Ok(false)`) without a draft or when nothing changed
    /// since the last finalize.
    pub async fn finalize(&self) -> Result<bool, DraftError> {
        let Some(id) = self.active_id() else {
            return Ok(false);
        };
        if self.finalized.get() {
            return Ok(false);
        }

        let existing = match self.store.get(F::COLLECTION, &id).await {
            Ok(doc) => doc.unwrap_or_default(),
            Err(e) => {
                tracing::error!(kind = F::KIND, %id, error = %e, "failed to read draft for finalize");
                return Err(e.into());
            }
        };

        let owner = self
            .identity
            .current_user_id()
            .map(str::to_string)
            .or_else(|| {
                existing
                    .get("userId")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            });
        let Some(owner) = owner else {
            tracing::warn!(kind = F::KIND, %id, "finalize while signed out");
            return Err(DraftError::NotSignedIn);
        };

        let mut fields = self.form.borrow().to_fields().set("userId", owner);
        fields = match existing.get("createdAt") {
            Some(created_at) if !created_at.is_null() => fields.set("createdAt", created_at.clone()),
            _ => fields.server_timestamp("createdAt"),
        };
        fields = fields.server_timestamp("updatedAt");

        if let Err(e) = self.store.set(F::COLLECTION, &id, fields, true).await {
            tracing::error!(kind = F::KIND, %id, error = %e, "finalize failed");
            return Err(e.into());
        }

        self.finalized.set(true);
        tracing::info!(kind = F::KIND, %id, "draft finalized");
        Ok(true)
    }

    /// Closes the panel: finalizes, then clears the form and selections.
    pub async fn close(&self) -> Result<bool, DraftError> {
        let result = self.finalize().await;
        let mut form = self.form.borrow_mut();
        form.clear_selection();
        *form = F::default();
        result
    }
}
