use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::{RelayError, RelayResult};
use super::models::Session;
use crate::openai::{Message, OpenAiClient, Role};

/// Runs the next turn of the chat in `session` and returns the
/// complete reply. The exchange is only recorded on success.
pub async fn chat(
    client: &OpenAiClient,
    session: &mut Session,
    user_input: &str,
) -> RelayResult<String> {
    let user_msg = Message::new(Role::User, user_input);
    let context = session.transcript.snapshot_with(&user_msg);

    let reply = client.completion(&context).await?;
    session.commit(user_input, &reply);

    Ok(reply)
}

/// Runs the next turn of the chat in `session`, sending each reply
/// fragment to `tx` as soon as it arrives. The assembled reply is
/// recorded once the stream completes.
///
/// Cancelling `cancel`, or dropping the receiving end of `tx`, stops
/// the upstream request and nothing is recorded.
pub async fn chat_stream(
    client: &OpenAiClient,
    session: &mut Session,
    user_input: &str,
    tx: &mpsc::UnboundedSender<String>,
    cancel: &CancellationToken,
) -> RelayResult<String> {
    let user_msg = Message::new(Role::User, user_input);
    let context = session.transcript.snapshot_with(&user_msg);

    let mut fragments = client.completion_stream(&context);
    let mut reply = String::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RelayError::Disconnected),
            next = fragments.next() => next,
        };
        match next {
            Some(Ok(fragment)) => {
                reply.push_str(&fragment);
                if tx.send(fragment).is_err() {
                    return Err(RelayError::Disconnected);
                }
            }
            Some(Err(e)) => return Err(e.into()),
            None => break,
        }
    }

    session.commit(user_input, &reply);
    Ok(reply)
}
