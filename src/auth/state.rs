//! Authentication state trait and macro.

use super::authenticator::Authenticator;

/// Trait for state types that can run the authentication gate.
pub trait HasAuthBackend {
    fn authenticator(&self) -> &dyn Authenticator;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard field.
///
/// The struct must have an `authenticator: Arc<dyn Authenticator>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub authenticator: Arc<dyn Authenticator>,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn authenticator(&self) -> &dyn $crate::auth::Authenticator {
                self.authenticator.as_ref()
            }
        }
    };
}
