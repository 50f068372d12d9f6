//! Users, rooms, and messages

use chatkit_reqwest::{Dispatcher, ServiceRequest};
use chatkit_tokens::{Principal, UserId, UserIdRef};
use time::format_description::well_known::Rfc3339;

use crate::{
    model::{
        CreateRoomOptions, CreateUserOptions, GetRoomMessagesOptions, GetRoomsOptions,
        GetUsersOptions, Message, MessageId, MessageSent, NewMessage, NewUsers, Room, RoomIdRef,
        SendMessageOptions, UpdateRoomOptions, UpdateUserOptions, User, UserIds,
    },
    Error,
};

/// The `chatkit` service
///
/// Requests are signed with the superuser token, except where an operation
/// acts on behalf of a user.
#[derive(Clone, Debug)]
pub struct CoreService {
    dispatcher: Dispatcher,
}

impl CoreService {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// The dispatcher behind this service, for requests not covered here
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Fetches a single user
    pub async fn get_user(&self, user_id: &UserIdRef) -> Result<User, Error> {
        let request = ServiceRequest::get(["users", user_id.as_str()], Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Pages through all users, oldest first
    pub async fn get_users(&self, options: &GetUsersOptions) -> Result<Vec<User>, Error> {
        let from_ts = options
            .from_timestamp
            .map(|ts| ts.format(&Rfc3339))
            .transpose()
            .map_err(|_| Error::InvalidArgument("the timestamp cannot be expressed in RFC 3339"))?;

        let request = ServiceRequest::get(["users"], Principal::Superuser)
            .query_opt("from_ts", from_ts)
            .query_opt("limit", options.limit);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Fetches the users with the given identifiers
    pub async fn get_users_by_id(&self, user_ids: &[UserId]) -> Result<Vec<User>, Error> {
        if user_ids.is_empty() {
            return Err(Error::InvalidArgument("at least one user ID is required"));
        }

        let request = user_ids.iter().fold(
            ServiceRequest::get(["users_by_ids"], Principal::Superuser),
            |request, id| request.query("id", id),
        );
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Creates a user
    pub async fn create_user(&self, options: &CreateUserOptions) -> Result<(), Error> {
        if options.name.is_empty() {
            return Err(Error::InvalidArgument("a name for the user is required"));
        }

        let request = ServiceRequest::post(["users"], Principal::Superuser).json(options)?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Creates a batch of users in one request
    pub async fn create_users(&self, users: &[CreateUserOptions]) -> Result<(), Error> {
        if users.is_empty() {
            return Err(Error::InvalidArgument("at least one user to create is required"));
        }
        if users.iter().any(|u| u.name.is_empty()) {
            return Err(Error::InvalidArgument("a name for every user is required"));
        }

        let request = ServiceRequest::post(["batch_users"], Principal::Superuser)
            .json(&NewUsers { users })?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Updates a user, acting as that user
    pub async fn update_user(
        &self,
        user_id: &UserIdRef,
        options: &UpdateUserOptions,
    ) -> Result<(), Error> {
        let request = ServiceRequest::put(
            ["users", user_id.as_str()],
            Principal::User(user_id.to_owned()),
        )
        .json(options)?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Deletes a user
    pub async fn delete_user(&self, user_id: &UserIdRef) -> Result<(), Error> {
        let request = ServiceRequest::delete(["users", user_id.as_str()], Principal::Superuser);
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Fetches a single room, including its members
    pub async fn get_room(&self, room_id: &RoomIdRef) -> Result<Room, Error> {
        let request = ServiceRequest::get(["rooms", room_id.as_str()], Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Pages through all rooms; members are not included
    pub async fn get_rooms(&self, options: &GetRoomsOptions) -> Result<Vec<Room>, Error> {
        let request = ServiceRequest::get(["rooms"], Principal::Superuser)
            .query_opt("from_id", options.from_id.as_ref())
            .query("include_private", options.include_private);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// The rooms a user is a member of
    pub async fn get_user_rooms(&self, user_id: &UserIdRef) -> Result<Vec<Room>, Error> {
        self.rooms_for_user(user_id, false).await
    }

    /// The rooms a user could join but has not
    pub async fn get_user_joinable_rooms(&self, user_id: &UserIdRef) -> Result<Vec<Room>, Error> {
        self.rooms_for_user(user_id, true).await
    }

    async fn rooms_for_user(&self, user_id: &UserIdRef, joinable: bool) -> Result<Vec<Room>, Error> {
        let request =
            ServiceRequest::get(["users", user_id.as_str(), "rooms"], Principal::Superuser)
                .query("joinable", joinable);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Creates a room, acting as its creator
    pub async fn create_room(&self, options: &CreateRoomOptions) -> Result<Room, Error> {
        if options.name.is_empty() {
            return Err(Error::InvalidArgument("a name for the room is required"));
        }

        let request =
            ServiceRequest::post(["rooms"], Principal::User(options.creator_id.clone()))
                .json(options)?;
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Updates a room
    pub async fn update_room(
        &self,
        room_id: &RoomIdRef,
        options: &UpdateRoomOptions,
    ) -> Result<(), Error> {
        if options.is_empty() {
            return Err(Error::InvalidArgument("at least one room attribute to change is required"));
        }

        let request = ServiceRequest::put(["rooms", room_id.as_str()], Principal::Superuser)
            .json(options)?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Deletes a room
    pub async fn delete_room(&self, room_id: &RoomIdRef) -> Result<(), Error> {
        let request = ServiceRequest::delete(["rooms", room_id.as_str()], Principal::Superuser);
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Adds users to a room
    pub async fn add_users_to_room(
        &self,
        room_id: &RoomIdRef,
        user_ids: &[UserId],
    ) -> Result<(), Error> {
        self.change_members(room_id, "add", user_ids).await
    }

    /// Removes users from a room
    pub async fn remove_users_from_room(
        &self,
        room_id: &RoomIdRef,
        user_ids: &[UserId],
    ) -> Result<(), Error> {
        self.change_members(room_id, "remove", user_ids).await
    }

    async fn change_members(
        &self,
        room_id: &RoomIdRef,
        change: &str,
        user_ids: &[UserId],
    ) -> Result<(), Error> {
        if user_ids.is_empty() {
            return Err(Error::InvalidArgument("at least one user ID is required"));
        }

        let request = ServiceRequest::put(
            ["rooms", room_id.as_str(), "users", change],
            Principal::Superuser,
        )
        .json(&UserIds { user_ids })?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Sends a text message, acting as the sender
    ///
    /// Returns the identifier of the new message.
    pub async fn send_message(&self, options: &SendMessageOptions) -> Result<MessageId, Error> {
        if options.text.is_empty() {
            return Err(Error::InvalidArgument("the message text is required"));
        }

        let request = ServiceRequest::post(
            ["rooms", options.room_id.as_str(), "messages"],
            Principal::User(options.sender_id.clone()),
        )
        .json(&NewMessage {
            text: &options.text,
        })?;

        let sent: MessageSent = self.dispatcher.send_expecting(request).await?;
        tracing::debug!(message_id = sent.message_id, room_id = %options.room_id, "message sent");
        Ok(sent.message_id)
    }

    /// Pages through the messages of a room
    pub async fn get_room_messages(
        &self,
        room_id: &RoomIdRef,
        options: &GetRoomMessagesOptions,
    ) -> Result<Vec<Message>, Error> {
        let request = ServiceRequest::get(
            ["rooms", room_id.as_str(), "messages"],
            Principal::Superuser,
        )
        .query_opt("direction", options.direction)
        .query_opt("initial_id", options.initial_id)
        .query_opt("limit", options.limit);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Deletes a message
    pub async fn delete_message(
        &self,
        room_id: &RoomIdRef,
        message_id: MessageId,
    ) -> Result<(), Error> {
        let request = ServiceRequest::delete(
            [
                "rooms".to_owned(),
                room_id.as_str().to_owned(),
                "messages".to_owned(),
                message_id.to_string(),
            ],
            Principal::Superuser,
        );
        Ok(self.dispatcher.send_empty(request).await?)
    }
}
