use serde_json::Value;
use std::fmt;

use crate::db::{Collection, Document, Fields};

/// One user-editable field together with its new value.
pub trait FormField: fmt::Debug {
    /// Stored field name.
    fn name(&self) -> &'static str;

    /// Stored representation of the value.
    fn value(&self) -> Value;
}

/// Local state of an editing panel.
pub trait DraftForm: Default {
    type Field: FormField;

    /// Collection holding the backing document.
    const COLLECTION: Collection;

    /// Short name used in log output.
    const KIND: &'static str;

    fn apply(&mut self, field: &Self::Field);

    /// Fills the form from a stored document. Absent fields take their defaults.
    fn populate(&mut self, doc: &Document);

    /// Full form state as written on finalize. Does not include ownership
    /// or timestamp fields.
    fn to_fields(&self) -> Fields;

    /// Resets the scratch selection lists consumed on finalize.
    fn clear_selection(&mut self);
}
