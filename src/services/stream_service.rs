//! Server-Sent Events plumbing for the per-match score stream.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::{score::ScoreSnapshot, sse::ServerEvent},
    error::ServiceError,
    state::{MatchScoreEngine, ScoreSubscription, SharedState},
};

/// Event name carried by the initial full snapshot.
const SNAPSHOT_EVENT: &str = "score.snapshot";
/// Event name carried by every subsequent committed update.
const UPDATED_EVENT: &str = "score.updated";

/// Subscribe a viewer to one match's score feed.
pub async fn subscribe(
    state: &SharedState,
    match_id: Uuid,
) -> Result<(Arc<MatchScoreEngine>, ScoreSubscription), ServiceError> {
    let engine = state.engine(match_id).await?;
    let subscription = engine.subscribe().await;
    Ok((engine, subscription))
}

/// Convert a score subscription into an SSE response: the snapshot goes out
/// first, then every committed update, and the subscription is released once
/// the client disconnects.
pub fn to_sse_stream(
    engine: Arc<MatchScoreEngine>,
    subscription: ScoreSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    let ScoreSubscription {
        id: subscription_id,
        snapshot,
        mut receiver,
    } = subscription;

    // forwarder task: emits the snapshot, then reads from broadcast and
    // pushes into mpsc
    tokio::spawn(async move {
        if let Some(event) = snapshot_event(SNAPSHOT_EVENT, &ScoreSnapshot::from(&snapshot)) {
            if tx.send(Ok(event)).await.is_err() {
                release(&engine, subscription_id);
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(committed) => {
                            let Some(event) =
                                snapshot_event(UPDATED_EVENT, &ScoreSnapshot::from(&committed))
                            else {
                                continue;
                            };

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive;
                            // the next full snapshot catches the viewer up.
                            continue;
                        }
                    }
                }
            }
        }

        release(&engine, subscription_id);
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn release(engine: &MatchScoreEngine, subscription_id: Uuid) {
    engine.feed().unsubscribe(subscription_id);
    tracing::info!(
        match_id = %engine.match_id(),
        remaining = engine.feed().subscriber_count(),
        "score stream disconnected"
    );
}

fn snapshot_event(name: &str, payload: &ScoreSnapshot) -> Option<Event> {
    let server_event = ServerEvent::json(Some(name.to_string()), payload).ok()?;
    let mut event = Event::default().data(server_event.data);
    if let Some(event_name) = server_event.event {
        event = event.event(event_name);
    }
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::score_store::memory::InMemoryScoreStore,
        state::{AppState, ScoreCommand, score::TeamSide},
    };

    async fn state_with_match() -> (SharedState, Uuid) {
        let state = AppState::new(AppConfig::default());
        state
            .install_score_store(Arc::new(InMemoryScoreStore::new()))
            .await;
        let engine = state.create_engine(Uuid::new_v4()).await.unwrap();
        (state.clone(), engine.match_id())
    }

    #[tokio::test]
    async fn subscription_sees_updates_committed_after_its_snapshot() {
        let (state, match_id) = state_with_match().await;
        let (engine, mut subscription) = subscribe(&state, match_id).await.unwrap();

        assert_eq!(subscription.snapshot.revision, 0);

        let store = state.require_score_store().await.unwrap();
        engine.apply(ScoreCommand::Start, &store).await.unwrap();
        engine
            .apply(ScoreCommand::AddPoint(TeamSide::B), &store)
            .await
            .unwrap();

        assert_eq!(subscription.receiver.recv().await.unwrap().revision, 1);
        let second = subscription.receiver.recv().await.unwrap();
        assert_eq!(second.revision, 2);
        assert_eq!(second.team_b_score, 1);
    }

    #[tokio::test]
    async fn subscribing_to_an_unknown_match_fails() {
        let state = AppState::new(AppConfig::default());
        state
            .install_score_store(Arc::new(InMemoryScoreStore::new()))
            .await;

        let err = subscribe(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn disconnect_releases_the_subscription() {
        let (state, match_id) = state_with_match().await;
        let (engine, subscription) = subscribe(&state, match_id).await.unwrap();
        assert_eq!(engine.feed().subscriber_count(), 1);

        let sse = to_sse_stream(engine.clone(), subscription);
        drop(sse);

        // The forwarder notices the dropped response channel and releases.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.feed().subscriber_count(), 0);
    }
}
