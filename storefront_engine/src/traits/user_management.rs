use std::future::Future;

use crate::{
    db_types::{ExternalId, Role, User, UserId},
    traits::StoreError,
};

pub trait UserManagement {
    /// Registers the chat user with the given role if they are not known yet.
    ///
    /// The role of an existing user is never changed. The second value of the tuple is `true` if the user was
    /// created by this call.
    fn register_user(
        &self,
        external_id: ExternalId,
        role: Role,
    ) -> impl Future<Output = Result<(User, bool), StoreError>> + Send;

    fn fetch_user(&self, id: UserId) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    fn fetch_user_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
}
