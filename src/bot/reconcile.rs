use tracing::{debug, info};

use crate::slack::{SlackApi, SlackError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Added,
    AlreadyMember,
}

/// Makes sure `user_id` belongs to `usergroup`, adding it at the end of the current member list if
/// needed.
///
/// Slack only offers to replace the whole list, so two grants racing on the same group can lose
/// one of the additions. A failed lookup aborts before anything is written: carrying on with an
/// empty list would shrink the group down to a single member.
pub async fn grant_membership(
    slack: &dyn SlackApi,
    usergroup: &str,
    user_id: &str,
) -> Result<Grant, SlackError> {
    let mut members = slack.usergroup_members(usergroup).await?;
    debug!("existing members of {}: {:?}", usergroup, members);

    if members.iter().any(|member| member == user_id) {
        debug!("{} is already a member of {}", user_id, usergroup);
        return Ok(Grant::AlreadyMember);
    }

    members.push(user_id.to_owned());
    slack.update_usergroup_members(usergroup, &members).await?;
    info!("added {} to {}", user_id, usergroup);

    Ok(Grant::Added)
}
