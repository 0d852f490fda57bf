use crate::{
    bot::{messages::Messages, GRANT_PERMISSION},
    slack::types::{ActionElement, Block, ButtonStyle, EphemeralMessage, Text},
};

/// Builds the message shown to `user_id` after joining `channel_id`: a greeting and a single
/// button asking for the group membership.
pub fn permission_prompt(messages: &Messages, user_id: &str, channel_id: &str) -> EphemeralMessage {
    let welcome = messages.welcome(user_id);

    EphemeralMessage {
        channel: channel_id.to_owned(),
        user: user_id.to_owned(),
        text: welcome.clone(),
        blocks: vec![
            Block::Section {
                text: Text::mrkdwn(welcome),
            },
            Block::Actions {
                elements: vec![ActionElement::Button {
                    text: Text::plain(messages.button),
                    action_id: GRANT_PERMISSION.to_owned(),
                    style: Some(ButtonStyle::Primary),
                }],
            },
        ],
    }
}
