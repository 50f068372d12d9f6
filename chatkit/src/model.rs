//! Resources exchanged with the Chatkit services

use std::fmt;

use aliri_braid::braid;
use chatkit_tokens::{EmptyIdentifier, UserId};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// The identifier of a room
#[braid(serde, validator)]
pub struct RoomId;

impl aliri_braid::Validator for RoomId {
    type Error = EmptyIdentifier;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            Err(EmptyIdentifier::new("room ID"))
        } else {
            Ok(())
        }
    }
}

/// The identifier of a message within a room
pub type MessageId = u64;

/// Some services still report room IDs as numbers
fn room_id_from_string_or_number<'de, D>(deserializer: D) -> Result<RoomId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    let raw = match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    };
    RoomId::new(raw).map_err(D::Error::custom)
}

fn opt_room_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<RoomId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "room_id_from_string_or_number")] RoomId);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}

// Users

/// A user of the instance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Link to an avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Arbitrary data attached to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
    /// When the user was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last changed
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Paging through all users
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetUsersOptions {
    /// Only users created at or after this moment
    pub from_timestamp: Option<OffsetDateTime>,
    /// Maximum number of users to return; the service defaults to 20
    pub limit: Option<u32>,
}

/// A user to be created
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateUserOptions {
    /// The new user's identifier
    pub id: UserId,
    /// Display name, must not be empty
    pub name: String,
    /// Link to an avatar image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Arbitrary data attached to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
}

impl CreateUserOptions {
    /// A user with only an identifier and a name
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar_url: None,
            custom_data: None,
        }
    }

    /// Sets the avatar URL
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Sets the custom data
    #[must_use]
    pub fn with_custom_data(mut self, custom_data: serde_json::Value) -> Self {
        self.custom_data = Some(custom_data);
        self
    }
}

/// Changes to an existing user; unset fields are left alone
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UpdateUserOptions {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Replacement custom data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
}

// Rooms

/// A room
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// The room's identifier
    pub id: RoomId,
    /// The user who created the room
    pub created_by_id: UserId,
    /// Display name
    pub name: String,
    /// Whether the room is hidden from users who are not members
    pub private: bool,
    /// Members of the room; omitted when listing all rooms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_user_ids: Option<Vec<UserId>>,
    /// Arbitrary data attached to the room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
    /// When the room was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the room was last changed
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A room to be created on behalf of its creator
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateRoomOptions {
    /// The user creating the room; the request is signed as this user
    #[serde(skip)]
    pub creator_id: UserId,
    /// Display name, must not be empty
    pub name: String,
    /// Whether the room is private
    pub private: bool,
    /// Users to add as members on creation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<UserId>,
    /// Arbitrary data attached to the room
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
}

impl CreateRoomOptions {
    /// A public room with no initial members besides its creator
    pub fn new(creator_id: UserId, name: impl Into<String>) -> Self {
        Self {
            creator_id,
            name: name.into(),
            private: false,
            user_ids: Vec::new(),
            custom_data: None,
        }
    }

    /// Makes the room private
    #[must_use]
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Adds initial members
    #[must_use]
    pub fn with_user_ids(mut self, user_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.user_ids.extend(user_ids);
        self
    }

    /// Sets the custom data
    #[must_use]
    pub fn with_custom_data(mut self, custom_data: serde_json::Value) -> Self {
        self.custom_data = Some(custom_data);
        self
    }
}

/// Paging through all rooms
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetRoomsOptions {
    /// Only rooms after this one
    pub from_id: Option<RoomId>,
    /// Whether private rooms are listed
    pub include_private: bool,
}

/// Changes to an existing room; at least one field must be set
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UpdateRoomOptions {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New privacy setting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    /// Replacement custom data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
}

impl UpdateRoomOptions {
    /// Whether no change was requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.private.is_none() && self.custom_data.is_none()
    }
}

// Messages

/// A message sent to a room
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The message's identifier
    pub id: MessageId,
    /// The sender
    pub user_id: UserId,
    /// The room the message was sent to
    #[serde(deserialize_with = "room_id_from_string_or_number")]
    pub room_id: RoomId,
    /// The message text
    pub text: String,
    /// When the message was sent
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the message was last changed
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A text message to send on behalf of a user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendMessageOptions {
    /// The room to send to
    pub room_id: RoomId,
    /// The sender; the request is signed as this user
    pub sender_id: UserId,
    /// The text, must not be empty
    pub text: String,
}

impl SendMessageOptions {
    /// A message from `sender_id` to `room_id`
    pub fn new(room_id: RoomId, sender_id: UserId, text: impl Into<String>) -> Self {
        Self {
            room_id,
            sender_id,
            text: text.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewMessage<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageSent {
    pub(crate) message_id: MessageId,
}

/// Which way to page from the initial message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards older messages
    Older,
    /// Towards newer messages
    Newer,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Older => "older",
            Self::Newer => "newer",
        })
    }
}

/// Paging through the messages of a room
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetRoomMessagesOptions {
    /// The message to start from
    pub initial_id: Option<MessageId>,
    /// Which way to page; the service defaults to older
    pub direction: Option<Direction>,
    /// Maximum number of messages to return
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserIds<'a> {
    pub(crate) user_ids: &'a [UserId],
}

#[derive(Debug, Serialize)]
pub(crate) struct NewUsers<'a> {
    pub(crate) users: &'a [CreateUserOptions],
}

// Roles

/// Whether a role applies instance-wide or within a single room
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    /// Applies everywhere
    Global,
    /// Applies within the room it is assigned for
    Room,
}

impl RoleScope {
    /// The scope as it appears in paths
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Room => "room",
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named set of permissions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// The role's name
    pub name: String,
    /// Permissions granted by the role
    pub permissions: Vec<String>,
    /// Where the role applies
    pub scope: RoleScope,
}

/// A role to be created
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateRoleOptions {
    /// The role's name, must not be empty
    pub name: String,
    /// Permissions granted, must not be empty
    pub permissions: Vec<String>,
}

impl CreateRoleOptions {
    /// A role granting `permissions`
    pub fn new<I, P>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

/// The assignment of a role to a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// The role's name
    pub name: String,
    /// The room the role applies in; absent for global roles
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_room_id_from_string_or_number"
    )]
    pub room_id: Option<RoomId>,
}

/// Permissions to grant and revoke; both lists must not be empty at once
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UpdateRolePermissionsOptions {
    /// Permissions to grant
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_permissions: Vec<String>,
    /// Permissions to revoke
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_permissions: Vec<String>,
}

impl UpdateRolePermissionsOptions {
    /// Whether no change was requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_permissions.is_empty() && self.remove_permissions.is_empty()
    }
}

// Cursors

/// The only cursor type: how far a user has read in a room
pub const READ_CURSOR_TYPE: u8 = 0;

/// How far a user has read in a room
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Always [`READ_CURSOR_TYPE`]
    pub cursor_type: u8,
    /// The room
    #[serde(deserialize_with = "room_id_from_string_or_number")]
    pub room_id: RoomId,
    /// The reader
    pub user_id: UserId,
    /// The last message read
    pub position: MessageId,
    /// When the cursor last moved
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub(crate) struct CursorPosition {
    pub(crate) position: MessageId,
}
