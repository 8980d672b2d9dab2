use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoScoreDocument, doc_id, uuid_as_binary},
};
use crate::dao::{models::ScoreEntity, score_store::ScoreStore, storage::StorageResult};

const SCORE_COLLECTION_NAME: &str = "scores";

/// Duplicate-key error raised when the stale-writer filter matched nothing
/// and the upsert collided with the existing document.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed [`ScoreStore`].
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let collection = database.collection::<mongodb::bson::Document>(SCORE_COLLECTION_NAME);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1, "updated_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_status_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "status,updated_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection(&self) -> Collection<MongoScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    /// Upsert a score document, guarded so only a strictly newer revision
    /// can replace the stored copy. The filter matches the id only while
    /// the stored revision is older; when a newer document already exists
    /// the upsert collides on `_id` and surfaces as a duplicate key, which
    /// we report as a stale write.
    async fn save(&self, score: ScoreEntity) -> MongoResult<()> {
        let match_id = score.match_id;
        let document: MongoScoreDocument = score.into();
        let attempted = document.revision;
        let collection = self.collection().await;

        let filter = doc! {
            "_id": uuid_as_binary(match_id),
            "revision": doc! { "$lt": attempted as i64 },
        };

        let outcome = collection.replace_one(filter, &document).upsert(true).await;
        match outcome {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => {
                let stored = self
                    .find(match_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|existing| existing.revision)
                    .unwrap_or(attempted);
                Err(MongoDaoError::StaleRevision {
                    match_id,
                    stored,
                    attempted,
                })
            }
            Err(source) => Err(MongoDaoError::SaveScore { match_id, source }),
        }
    }

    async fn find(&self, match_id: Uuid) -> MongoResult<Option<ScoreEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(match_id))
            .await
            .map_err(|source| MongoDaoError::LoadScore { match_id, source })?;

        Ok(document.map(Into::into))
    }

    async fn list(&self) -> MongoResult<Vec<ScoreEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoScoreDocument> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

impl ScoreStore for MongoScoreStore {
    fn save(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save(score).await.map_err(Into::into) })
    }

    fn find(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find(match_id).await.map_err(Into::into) })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
