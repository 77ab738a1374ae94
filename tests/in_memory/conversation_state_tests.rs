//! Conversation state storage tests.

use eyre::ensure;
use rstest::{fixture, rstest};
use taskmate::task::{
    adapters::memory::InMemoryConversationStateRepository,
    domain::{ConversationKey, ConversationState},
    ports::ConversationStateRepository,
};

#[fixture]
fn store() -> InMemoryConversationStateRepository {
    InMemoryConversationStateRepository::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn save_replaces_the_whole_record(
    store: InMemoryConversationStateRepository,
) -> eyre::Result<()> {
    let key = ConversationKey::new(11);
    let mut first = ConversationState::new(ConversationState::AWAITING_COMMENT);
    first.insert("task_id", "abc");
    store.save(key, &first).await?;

    let second = ConversationState::new(ConversationState::AWAITING_TASK_DESCRIPTION);
    store.save(key, &second).await?;

    let loaded = store.load(key).await?;
    ensure!(loaded == Some(second));
    ensure!(loaded.is_some_and(|state| state.get("task_id").is_none()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn users_do_not_share_state(store: InMemoryConversationStateRepository) -> eyre::Result<()> {
    let alice = ConversationKey::new(1);
    let bob = ConversationKey::new(2);
    store
        .save(alice, &ConversationState::new(ConversationState::AWAITING_DEADLINE))
        .await?;

    ensure!(store.load(bob).await?.is_none());
    ensure!(!store.clear(bob).await?);
    ensure!(store.clear(alice).await?);
    ensure!(store.load(alice).await?.is_none());
    Ok(())
}
