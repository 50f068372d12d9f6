//! Roles and permissions

use chatkit_reqwest::{Dispatcher, ServiceRequest};
use chatkit_tokens::{Principal, UserIdRef};
use serde::Serialize;

use crate::{
    model::{
        CreateRoleOptions, Role, RoleScope, RoomId, RoomIdRef, UpdateRolePermissionsOptions,
        UserRole,
    },
    Error,
};

/// The `chatkit_authorizer` service
///
/// Every request is signed with the superuser token.
#[derive(Clone, Debug)]
pub struct AuthorizerService {
    dispatcher: Dispatcher,
}

impl AuthorizerService {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// The dispatcher behind this service, for requests not covered here
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// All roles of the instance
    pub async fn get_roles(&self) -> Result<Vec<Role>, Error> {
        let request = ServiceRequest::get(["roles"], Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Creates a role that applies instance-wide
    pub async fn create_global_role(&self, options: &CreateRoleOptions) -> Result<(), Error> {
        self.create_role(options, RoleScope::Global).await
    }

    /// Creates a role that applies within a room
    pub async fn create_room_role(&self, options: &CreateRoleOptions) -> Result<(), Error> {
        self.create_role(options, RoleScope::Room).await
    }

    async fn create_role(&self, options: &CreateRoleOptions, scope: RoleScope) -> Result<(), Error> {
        if options.name.is_empty() {
            return Err(Error::InvalidArgument("a name for the role is required"));
        }
        if options.permissions.is_empty() {
            return Err(Error::InvalidArgument("at least one permission for the role is required"));
        }

        #[derive(Serialize)]
        struct NewRole<'a> {
            name: &'a str,
            permissions: &'a [String],
            scope: RoleScope,
        }

        let request = ServiceRequest::post(["roles"], Principal::Superuser).json(&NewRole {
            name: &options.name,
            permissions: &options.permissions,
            scope,
        })?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Deletes a global role
    pub async fn delete_global_role(&self, role_name: &str) -> Result<(), Error> {
        self.delete_role(role_name, RoleScope::Global).await
    }

    /// Deletes a room role
    pub async fn delete_room_role(&self, role_name: &str) -> Result<(), Error> {
        self.delete_role(role_name, RoleScope::Room).await
    }

    async fn delete_role(&self, role_name: &str, scope: RoleScope) -> Result<(), Error> {
        if role_name.is_empty() {
            return Err(Error::InvalidArgument("the name of the role is required"));
        }

        let request = ServiceRequest::delete(
            ["roles", role_name, "scope", scope.as_str()],
            Principal::Superuser,
        );
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// The permissions granted by a global role
    pub async fn get_permissions_for_global_role(
        &self,
        role_name: &str,
    ) -> Result<Vec<String>, Error> {
        self.get_permissions(role_name, RoleScope::Global).await
    }

    /// The permissions granted by a room role
    pub async fn get_permissions_for_room_role(
        &self,
        role_name: &str,
    ) -> Result<Vec<String>, Error> {
        self.get_permissions(role_name, RoleScope::Room).await
    }

    async fn get_permissions(&self, role_name: &str, scope: RoleScope) -> Result<Vec<String>, Error> {
        if role_name.is_empty() {
            return Err(Error::InvalidArgument("the name of the role is required"));
        }

        let request = ServiceRequest::get(
            ["roles", role_name, "scope", scope.as_str(), "permissions"],
            Principal::Superuser,
        );
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Grants and revokes permissions of a global role
    pub async fn update_permissions_for_global_role(
        &self,
        role_name: &str,
        options: &UpdateRolePermissionsOptions,
    ) -> Result<(), Error> {
        self.update_permissions(role_name, RoleScope::Global, options)
            .await
    }

    /// Grants and revokes permissions of a room role
    pub async fn update_permissions_for_room_role(
        &self,
        role_name: &str,
        options: &UpdateRolePermissionsOptions,
    ) -> Result<(), Error> {
        self.update_permissions(role_name, RoleScope::Room, options)
            .await
    }

    async fn update_permissions(
        &self,
        role_name: &str,
        scope: RoleScope,
        options: &UpdateRolePermissionsOptions,
    ) -> Result<(), Error> {
        if role_name.is_empty() {
            return Err(Error::InvalidArgument("the name of the role is required"));
        }

        if options.is_empty() {
            return Err(Error::InvalidArgument(
                "permissions to add and permissions to remove cannot both be empty",
            ));
        }

        let request = ServiceRequest::put(
            ["roles", role_name, "scope", scope.as_str(), "permissions"],
            Principal::Superuser,
        )
        .json(options)?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// The roles assigned to a user
    pub async fn get_user_roles(&self, user_id: &UserIdRef) -> Result<Vec<Role>, Error> {
        let request =
            ServiceRequest::get(["users", user_id.as_str(), "roles"], Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Assigns a global role to a user
    pub async fn assign_global_role_to_user(
        &self,
        user_id: &UserIdRef,
        role_name: &str,
    ) -> Result<(), Error> {
        self.assign_role(user_id, role_name, None).await
    }

    /// Assigns a room role to a user within one room
    pub async fn assign_room_role_to_user(
        &self,
        user_id: &UserIdRef,
        room_id: &RoomIdRef,
        role_name: &str,
    ) -> Result<(), Error> {
        self.assign_role(user_id, role_name, Some(room_id.to_owned()))
            .await
    }

    async fn assign_role(
        &self,
        user_id: &UserIdRef,
        role_name: &str,
        room_id: Option<RoomId>,
    ) -> Result<(), Error> {
        if role_name.is_empty() {
            return Err(Error::InvalidArgument("the name of the role to assign is required"));
        }

        let request =
            ServiceRequest::put(["users", user_id.as_str(), "roles"], Principal::Superuser)
                .json(&UserRole {
                    name: role_name.to_owned(),
                    room_id,
                })?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Removes the global role of a user
    pub async fn remove_global_role_for_user(&self, user_id: &UserIdRef) -> Result<(), Error> {
        self.remove_role(user_id, None).await
    }

    /// Removes the role a user has within one room
    pub async fn remove_room_role_for_user(
        &self,
        user_id: &UserIdRef,
        room_id: &RoomIdRef,
    ) -> Result<(), Error> {
        self.remove_role(user_id, Some(room_id)).await
    }

    async fn remove_role(&self, user_id: &UserIdRef, room_id: Option<&RoomIdRef>) -> Result<(), Error> {
        let request =
            ServiceRequest::delete(["users", user_id.as_str(), "roles"], Principal::Superuser)
                .query_opt("room_id", room_id);
        Ok(self.dispatcher.send_empty(request).await?)
    }
}
