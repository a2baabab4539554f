use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::dao::{
    game_store::ArenaStore,
    models::{GameEntity, MessageEntity, ProfileEntity},
    query::{DateOrder, GameQuery},
    storage::StorageResult,
};

use super::{
    config::SupabaseConfig,
    error::{SupabaseDaoError, SupabaseResult},
    models::{
        GAMES_TABLE, GameRow, MESSAGES_TABLE, MessageRow, PROFILES_TABLE, ProfileRow, in_list,
    },
};

const REST_PREFIX: &str = "rest/v1";
const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT_REPRESENTATION: &str = "resolution=merge-duplicates,return=representation";

/// [`ArenaStore`] talking to the hosted Postgres through PostgREST.
#[derive(Clone)]
pub struct SupabaseGameStore {
    client: Client,
    base_url: Arc<str>,
    service_key: Arc<str>,
}

impl SupabaseGameStore {
    /// Build the HTTP client and check that the REST endpoint answers.
    pub async fn connect(config: SupabaseConfig) -> SupabaseResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| SupabaseDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            service_key: Arc::<str>::from(config.service_key),
        };

        store.ping().await?;
        Ok(store)
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, REST_PREFIX, table);
        self.client
            .request(method, url)
            .header("apikey", self.service_key.as_ref())
            .bearer_auth(self.service_key.as_ref())
    }

    async fn ping(&self) -> SupabaseResult<()> {
        let url = format!("{}/{}/", self.base_url, REST_PREFIX);
        let response = self
            .client
            .get(&url)
            .header("apikey", self.service_key.as_ref())
            .bearer_auth(self.service_key.as_ref())
            .send()
            .await
            .map_err(|source| SupabaseDaoError::RequestSend {
                path: url.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SupabaseDaoError::RequestStatus {
                path: url,
                status: response.status(),
                body: String::new(),
            })
        }
    }

    /// Send a prepared request and decode the returned rows.
    async fn fetch_rows<T>(&self, table: &str, builder: reqwest::RequestBuilder) -> SupabaseResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| SupabaseDaoError::RequestSend {
                path: table.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseDaoError::RequestStatus {
                path: table.to_string(),
                status,
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|source| SupabaseDaoError::DecodeResponse {
                path: table.to_string(),
                source,
            })
    }

    async fn select<T>(&self, table: &str, query: &[(&str, String)]) -> SupabaseResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, table).query(query);
        self.fetch_rows(table, builder).await
    }

    async fn insert_one<B, T>(&self, table: &str, body: &B, prefer: &str) -> SupabaseResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", prefer)
            .json(body);
        self.fetch_rows(table, builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseDaoError::EmptyRepresentation {
                path: table.to_string(),
            })
    }
}

fn game_query_params(query: &GameQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_string())];
    if let Some(status) = query.status {
        params.push(("status", format!("eq.{}", status.as_str())));
    }
    if let Some(user) = query.participant {
        params.push(("registered_players", format!("cs.{{{user}}}")));
    }
    let order = match query.order {
        DateOrder::Ascending => "date.asc",
        DateOrder::Descending => "date.desc",
    };
    params.push(("order", order.to_string()));
    params
}

impl ArenaStore for SupabaseGameStore {
    fn list_games(&self, query: GameQuery) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<GameRow>(GAMES_TABLE, &game_query_params(&query))
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<GameRow>(
                    GAMES_TABLE,
                    &[("select", "*".into()), ("id", format!("eq.{id}"))],
                )
                .await?;
            Ok(rows.into_iter().next().map(Into::into))
        })
    }

    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let row = GameRow::from(game);
            let inserted = store
                .insert_one::<_, GameRow>(GAMES_TABLE, &[row], RETURN_REPRESENTATION)
                .await?;
            Ok(inserted.into())
        })
    }

    fn update_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let id = game.id;
            let mut row = GameRow::from(game);
            row.version = i64::try_from(expected_version + 1).unwrap_or(i64::MAX);

            // The version filter turns the PATCH into a compare-and-set: a
            // concurrent writer leaves zero matching rows behind.
            let builder = store
                .request(Method::PATCH, GAMES_TABLE)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("version", format!("eq.{expected_version}")),
                ])
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&row);
            let rows = store.fetch_rows::<GameRow>(GAMES_TABLE, builder).await?;
            Ok(rows.into_iter().next().map(Into::into))
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            // game_messages.game_id references games(id) on delete cascade.
            let builder = store
                .request(Method::DELETE, GAMES_TABLE)
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", RETURN_REPRESENTATION);
            let rows = store.fetch_rows::<GameRow>(GAMES_TABLE, builder).await?;
            Ok(rows.into_iter().next().map(Into::into))
        })
    }

    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<ProfileRow>(
                    PROFILES_TABLE,
                    &[("select", "*".into()), ("id", format!("eq.{id}"))],
                )
                .await?;
            Ok(rows.into_iter().next().map(Into::into))
        })
    }

    fn find_profiles(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let rows = store
                .select::<ProfileRow>(
                    PROFILES_TABLE,
                    &[("select", "*".into()), ("id", in_list(&ids))],
                )
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<ProfileEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let row = ProfileRow::from(profile);
            let saved = store
                .insert_one::<_, ProfileRow>(PROFILES_TABLE, &[row], UPSERT_REPRESENTATION)
                .await?;
            Ok(saved.into())
        })
    }

    fn list_messages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows = store
                .select::<MessageRow>(
                    MESSAGES_TABLE,
                    &[
                        ("select", "*".into()),
                        ("game_id", format!("eq.{game_id}")),
                        ("order", "created_at.asc".into()),
                    ],
                )
                .await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    fn insert_message(
        &self,
        message: MessageEntity,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let row = MessageRow::from(message);
            let inserted = store
                .insert_one::<_, MessageRow>(MESSAGES_TABLE, &[row], RETURN_REPRESENTATION)
                .await?;
            Ok(inserted.into())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
