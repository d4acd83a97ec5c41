//! Drag-and-drop reordering with a pinned sentinel row.
//!
//! A [`ReorderList`] is reordered locally first; callers then persist a full
//! snapshot of the new order. A failed write therefore leaves the store one
//! drop behind and the next successful snapshot heals it.

mod cuisine_order;
mod group_order;

pub use cuisine_order::{CuisineOrder, FAVORITES_ROW};
pub use group_order::GroupOrder;

use std::fmt;
use thiserror::Error;

use crate::db::StoreError;

/// Which side of the hovered row a drop lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Before,
    After,
}

impl DropPosition {
    /// Before when the cursor is above the row's vertical midpoint.
    pub fn from_cursor(cursor_y: f64, row_top: f64, row_height: f64) -> Self {
        if cursor_y < row_top + row_height / 2.0 {
            DropPosition::Before
        } else {
            DropPosition::After
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropPosition::Before => write!(f, "before"),
            DropPosition::After => write!(f, "after"),
        }
    }
}

/// The fixed row of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelPolicy {
    /// Always first, e.g. the Favorites cuisine row.
    Leading(String),
    /// Always last, e.g. the Other ingredient group.
    Trailing(String),
}

impl SentinelPolicy {
    pub fn id(&self) -> &str {
        match self {
            SentinelPolicy::Leading(id) | SentinelPolicy::Trailing(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    SentinelNotDraggable,
    SameRow,
    BeforeLeadingSentinel,
    OntoTrailingSentinel,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SentinelNotDraggable => write!(f, "this row cannot be moved"),
            RejectReason::SameRow => write!(f, "a row cannot be dropped onto itself"),
            RejectReason::BeforeLeadingSentinel => {
                write!(f, "nothing can be placed before the first row")
            }
            RejectReason::OntoTrailingSentinel => {
                write!(f, "nothing can be placed around the last row")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Drop rejected: {0}")]
    Rejected(RejectReason),

    #[error("No row with id '{0}'")]
    UnknownRow(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a dropped row goes, relative to an anchor row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub anchor: String,
    pub position: DropPosition,
}

/// Row ids in display order, sentinel included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderList {
    rows: Vec<String>,
    policy: SentinelPolicy,
}

impl ReorderList {
    /// Builds the list from movable ids. Duplicates and any occurrence of
    /// the sentinel id are dropped; the sentinel is placed by the policy.
    pub fn new<I, T>(policy: SentinelPolicy, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut rows: Vec<String> = Vec::new();
        if let SentinelPolicy::Leading(id) = &policy {
            rows.push(id.clone());
        }
        for id in ids {
            let id = id.into();
            if id != policy.id() && !rows.contains(&id) {
                rows.push(id);
            }
        }
        if let SentinelPolicy::Trailing(id) = &policy {
            rows.push(id.clone());
        }
        Self { rows, policy }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn is_sentinel(&self, id: &str) -> bool {
        id == self.policy.id()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.iter().any(|r| r == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, OrderError> {
        self.rows
            .iter()
            .position(|r| r == id)
            .ok_or_else(|| OrderError::UnknownRow(id.to_string()))
    }

    /// Non-sentinel rows in order.
    pub fn movable(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(String::as_str)
            .filter(move |id| !self.is_sentinel(id))
    }

    fn first_movable(&self) -> Option<&str> {
        self.movable().next()
    }

    /// Drop indicator for a row being hovered, or `None` when no indicator
    /// is shown.
    ///
    /// Hovering the leading sentinel always means "after" it, and so does
    /// the top half of the row right below it.
    pub fn drag_over(
        &self,
        dragged: &str,
        hovered: &str,
        cursor: DropPosition,
    ) -> Option<DropPosition> {
        if dragged == hovered || !self.contains(hovered) {
            return None;
        }
        match &self.policy {
            SentinelPolicy::Leading(id) if id == hovered => Some(DropPosition::After),
            SentinelPolicy::Leading(_) if self.first_movable() == Some(hovered) => {
                Some(DropPosition::After)
            }
            SentinelPolicy::Trailing(id) if id == hovered => None,
            _ => Some(cursor),
        }
    }

    /// Validates a drop and turns it into a placement.
    pub fn resolve_drop(
        &self,
        dragged: &str,
        target: &str,
        position: DropPosition,
    ) -> Result<Placement, OrderError> {
        self.index_of(dragged)?;
        self.index_of(target)?;

        if self.is_sentinel(dragged) {
            return Err(OrderError::Rejected(RejectReason::SentinelNotDraggable));
        }
        if dragged == target {
            return Err(OrderError::Rejected(RejectReason::SameRow));
        }

        match &self.policy {
            SentinelPolicy::Leading(id) if id == target => {
                if position == DropPosition::Before {
                    return Err(OrderError::Rejected(RejectReason::BeforeLeadingSentinel));
                }
            }
            SentinelPolicy::Leading(id) => {
                // Before the first row is the slot right after the sentinel.
                if position == DropPosition::Before && self.first_movable() == Some(target) {
                    return Ok(Placement {
                        anchor: id.clone(),
                        position: DropPosition::After,
                    });
                }
            }
            SentinelPolicy::Trailing(id) if id == target => {
                return Err(OrderError::Rejected(RejectReason::OntoTrailingSentinel));
            }
            SentinelPolicy::Trailing(_) => {}
        }

        Ok(Placement {
            anchor: target.to_string(),
            position,
        })
    }

    /// Moves `dragged` next to `target`. Returns whether the order changed.
    pub fn apply_drop(
        &mut self,
        dragged: &str,
        target: &str,
        position: DropPosition,
    ) -> Result<bool, OrderError> {
        let placement = self.resolve_drop(dragged, target, position)?;
        let before = self.rows.clone();

        let from = self.index_of(dragged)?;
        let row = self.rows.remove(from);
        let anchor = self.index_of(&placement.anchor)?;
        let at = match placement.position {
            DropPosition::Before => anchor,
            DropPosition::After => anchor + 1,
        };
        self.rows.insert(at, row);

        Ok(self.rows != before)
    }

    /// Adds a row as the first movable one. Returns false if it already exists.
    pub fn insert_front(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        let at = match self.policy {
            SentinelPolicy::Leading(_) => 1,
            SentinelPolicy::Trailing(_) => 0,
        };
        self.rows.insert(at, id);
        true
    }

    /// Removes a movable row.
    pub fn remove(&mut self, id: &str) -> Result<(), OrderError> {
        if self.is_sentinel(id) {
            return Err(OrderError::Rejected(RejectReason::SentinelNotDraggable));
        }
        let at = self.index_of(id)?;
        self.rows.remove(at);
        Ok(())
    }
}
