//! Read cursors

use chatkit_reqwest::{Dispatcher, ServiceRequest};
use chatkit_tokens::{Principal, UserIdRef};

use crate::{
    model::{Cursor, CursorPosition, MessageId, RoomIdRef, READ_CURSOR_TYPE},
    Error,
};

/// The `chatkit_cursors` service
///
/// Every request is signed with the superuser token.
#[derive(Clone, Debug)]
pub struct CursorsService {
    dispatcher: Dispatcher,
}

fn read_cursors() -> [String; 2] {
    ["cursors".to_owned(), READ_CURSOR_TYPE.to_string()]
}

impl CursorsService {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// The dispatcher behind this service, for requests not covered here
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Every read cursor of a user, one per room
    pub async fn get_user_read_cursors(&self, user_id: &UserIdRef) -> Result<Vec<Cursor>, Error> {
        let path = read_cursors()
            .into_iter()
            .chain(["users".to_owned(), user_id.as_str().to_owned()]);
        let request = ServiceRequest::get(path, Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// Moves a user's read cursor in a room
    pub async fn set_read_cursor(
        &self,
        user_id: &UserIdRef,
        room_id: &RoomIdRef,
        position: MessageId,
    ) -> Result<(), Error> {
        let request = ServiceRequest::put(Self::cursor_path(room_id, user_id), Principal::Superuser)
            .json(&CursorPosition { position })?;
        Ok(self.dispatcher.send_empty(request).await?)
    }

    /// Every read cursor in a room, one per user
    pub async fn get_read_cursors_for_room(&self, room_id: &RoomIdRef) -> Result<Vec<Cursor>, Error> {
        let path = read_cursors()
            .into_iter()
            .chain(["rooms".to_owned(), room_id.as_str().to_owned()]);
        let request = ServiceRequest::get(path, Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    /// A user's read cursor in a room
    ///
    /// Failures are reported, including a missing cursor, which the service
    /// answers with `404`.
    pub async fn get_read_cursor(
        &self,
        user_id: &UserIdRef,
        room_id: &RoomIdRef,
    ) -> Result<Cursor, Error> {
        let request = ServiceRequest::get(Self::cursor_path(room_id, user_id), Principal::Superuser);
        Ok(self.dispatcher.send_expecting(request).await?)
    }

    fn cursor_path(room_id: &RoomIdRef, user_id: &UserIdRef) -> impl Iterator<Item = String> {
        read_cursors().into_iter().chain([
            "rooms".to_owned(),
            room_id.as_str().to_owned(),
            "users".to_owned(),
            user_id.as_str().to_owned(),
        ])
    }
}
