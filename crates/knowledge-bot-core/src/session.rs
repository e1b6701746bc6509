use crate::client::QueryClient;
use crate::conversation::{Conversation, PendingTurn};

/// Run one full submission: append the optimistic turns, wait for the
/// service, then settle the placeholder with the answer or the error turn.
///
/// Returns the settled turn, or `None` if the input was blank or a query was
/// already outstanding.
pub async fn submit_new_message(
    conversation: &mut Conversation,
    client: &QueryClient,
    input: &str,
) -> Option<PendingTurn> {
    let turn = conversation.append_user_turn(input)?;
    let question = input.trim();

    match client.query(question).await {
        Ok(response) => {
            conversation.resolve_pending(turn, response);
        }
        Err(e) => {
            tracing::warn!(error = %e, status = ?e.status(), "Query failed");
            conversation.fail_pending(turn);
        }
    }

    Some(turn)
}
