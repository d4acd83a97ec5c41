//! Who is signed in.

/// Supplies the id that scopes every query and stamps every created document.
pub trait IdentityProvider {
    /// `None` when nobody is signed in.
    fn current_user_id(&self) -> Option<&str>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn current_user_id(&self) -> Option<&str> {
        (**self).current_user_id()
    }
}

/// Identity taken from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredUser {
    user_id: Option<String>,
}

impl ConfiguredUser {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()))
    }

    pub fn signed_out() -> Self {
        Self { user_id: None }
    }
}

impl IdentityProvider for ConfiguredUser {
    fn current_user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_user_is_signed_out() {
        assert_eq!(ConfiguredUser::new(Some("  ".into())).current_user_id(), None);
        assert_eq!(ConfiguredUser::signed_out().current_user_id(), None);
        assert_eq!(
            ConfiguredUser::signed_in("u1").current_user_id(),
            Some("u1")
        );
    }
}
