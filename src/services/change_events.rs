//! Single publish point for row changes. Services call these after a write
//! succeeded; listing views and chat streams consume them from the feed.

use crate::{
    dao::models::{GameEntity, MessageEntity, ProfileEntity},
    state::{ChangeFeed, ChangeKind, Table},
};

/// Announce a newly scheduled game.
pub fn game_inserted(feed: &ChangeFeed, game: &GameEntity) {
    feed.publish(ChangeKind::Insert, Table::Games, Some(game), None);
}

/// Announce an edit, roster change or status change.
pub fn game_updated(feed: &ChangeFeed, previous: &GameEntity, updated: &GameEntity) {
    feed.publish(ChangeKind::Update, Table::Games, Some(updated), Some(previous));
}

/// Announce a deleted game.
pub fn game_deleted(feed: &ChangeFeed, game: &GameEntity) {
    feed.publish(ChangeKind::Delete, Table::Games, None, Some(game));
}

/// Announce a new chat message.
pub fn message_inserted(feed: &ChangeFeed, message: &MessageEntity) {
    feed.publish(ChangeKind::Insert, Table::GameMessages, Some(message), None);
}

/// Announce a created or edited profile.
pub fn profile_saved(feed: &ChangeFeed, previous: Option<&ProfileEntity>, saved: &ProfileEntity) {
    let kind = if previous.is_some() {
        ChangeKind::Update
    } else {
        ChangeKind::Insert
    };
    feed.publish(kind, Table::Profiles, Some(saved), previous);
}
