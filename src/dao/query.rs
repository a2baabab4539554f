use uuid::Uuid;

use crate::dao::models::{GameEntity, GameStatus};

/// Sort direction applied to the scheduled date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// Soonest first.
    #[default]
    Ascending,
    /// Latest first.
    Descending,
}

/// Filter-and-order selection over the games table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameQuery {
    /// Keep only games in this status.
    pub status: Option<GameStatus>,
    /// Keep only games whose roster contains this identity.
    pub participant: Option<Uuid>,
    /// Ordering on `scheduled_at`.
    pub order: DateOrder,
}

impl GameQuery {
    /// Every game, soonest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// Games still open for registration, soonest first.
    pub fn upcoming() -> Self {
        Self {
            status: Some(GameStatus::Upcoming),
            ..Self::default()
        }
    }

    /// Games the user is registered for, most recent first.
    pub fn registered(user: Uuid) -> Self {
        Self {
            participant: Some(user),
            order: DateOrder::Descending,
            ..Self::default()
        }
    }

    /// Whether `game` satisfies the filters (ordering is applied separately).
    pub fn matches(&self, game: &GameEntity) -> bool {
        self.status.is_none_or(|status| game.status == status)
            && self.participant.is_none_or(|user| game.is_registered(user))
    }

    /// Sort `games` in place according to [`GameQuery::order`].
    pub fn sort(&self, games: &mut [GameEntity]) {
        match self.order {
            DateOrder::Ascending => games.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at)),
            DateOrder::Descending => games.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at)),
        }
    }
}
