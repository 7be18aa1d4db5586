//! Handing a room over to another moderator.
//!
//! The hand-over is three or four separate server calls with no rollback. A
//! failure part-way leaves what already happened in place (for example the
//! delegate added but not promoted). Re-running is safe: "already a
//! participant" and "already a moderator" (409) count as success.

use hyper::Method;
use serde_json::json;

use crate::config::settings::Credentials;
use crate::error::{Result, TalkError};
use crate::ocs::client::spreed_room_url;
use crate::talk::client::{TalkClient, http_error, require_token};
use crate::talk::types::{DelegationOutcome, Participant};

/// Position in the hand-over sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegationStep {
    Start,
    ParticipantAdded,
    Located(Participant),
    Promoted(Participant),
    LeftSelf(Participant),
    Done(Participant),
}

/// Case-insensitive identity comparison of two user ids.
pub fn same_user(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Find the attendee record of `target`, preferring real user actors.
pub fn locate_participant<'a>(
    participants: &'a [Participant],
    target: &str,
) -> Option<&'a Participant> {
    let mut matches = participants
        .iter()
        .filter(|p| same_user(&p.actor_id, target));
    let first = matches.next()?;
    if first.actor_type.is_empty() || first.actor_type == "users" {
        return Some(first);
    }
    matches
        .find(|p| p.actor_type == "users")
        .or(Some(first))
}

impl TalkClient {
    /// Make `new_moderator` a moderator of the room and, unless that is the
    /// acting user, leave the room afterwards.
    pub async fn delegate_room_moderator(
        &self,
        token: &str,
        new_moderator: &str,
    ) -> Result<DelegationOutcome> {
        let (creds, verbose) = self.require_credentials()?;
        let token = require_token(token)?;
        let target = new_moderator.trim();
        if target.is_empty() {
            return Err(TalkError::InvalidInput("delegate user id is empty".into()));
        }

        let mut step = DelegationStep::Start;
        let outcome = loop {
            step = match step {
                DelegationStep::Start => {
                    self.add_participant(&creds, verbose, token, target).await?;
                    DelegationStep::ParticipantAdded
                }
                DelegationStep::ParticipantAdded => {
                    let participants = self.fetch_participants(&creds, verbose, token).await?;
                    let found = locate_participant(&participants, target)
                        .cloned()
                        .ok_or_else(|| TalkError::ParticipantNotFound {
                            target: target.to_string(),
                        })?;
                    DelegationStep::Located(found)
                }
                DelegationStep::Located(participant) => {
                    self.promote_moderator(&creds, verbose, token, participant.attendee_id)
                        .await?;
                    DelegationStep::Promoted(participant)
                }
                DelegationStep::Promoted(participant) => {
                    if same_user(&creds.user, target) {
                        DelegationStep::Done(participant)
                    } else {
                        self.leave_room_as(&creds, verbose, token).await?;
                        DelegationStep::LeftSelf(participant)
                    }
                }
                DelegationStep::LeftSelf(participant) => break (participant, true),
                DelegationStep::Done(participant) => break (participant, false),
            };
            tracing::debug!(%token, step = ?step, "delegation step");
        };

        let (participant, left_self) = outcome;
        let delegate_name = if participant.display_name.is_empty() {
            participant.actor_id.clone()
        } else {
            participant.display_name.clone()
        };
        self.room_meta.update(token, |meta| {
            meta.delegated = true;
            meta.delegate_id = Some(participant.actor_id.clone());
            meta.delegate_name = Some(delegate_name.clone());
        });
        tracing::info!(%token, delegate = %participant.actor_id, left_self, "room delegated");

        Ok(DelegationOutcome {
            left_self,
            delegate: participant.actor_id,
            delegate_name,
            attendee_id: participant.attendee_id,
        })
    }

    /// Leave a room as the configured user. A missing room or membership (404) is fine.
    pub async fn leave_room(&self, token: &str) -> Result<()> {
        let (creds, verbose) = self.require_credentials()?;
        self.leave_room_as(&creds, verbose, require_token(token)?)
            .await
    }

    async fn add_participant(
        &self,
        creds: &Credentials,
        verbose: bool,
        token: &str,
        user: &str,
    ) -> Result<()> {
        let url = spreed_room_url(&creds.base_url, &[token, "participants"])?;
        let body = json!({ "newParticipant": user, "source": "users" });
        let resp = self.call(creds, verbose, Method::POST, url, Some(body)).await?;
        if resp.is_success() || resp.status.as_u16() == 409 {
            return Ok(());
        }
        Err(http_error("add participant", &resp))
    }

    async fn promote_moderator(
        &self,
        creds: &Credentials,
        verbose: bool,
        token: &str,
        attendee_id: i64,
    ) -> Result<()> {
        let url = spreed_room_url(&creds.base_url, &[token, "moderators"])?;
        let body = json!({ "attendeeId": attendee_id });
        let resp = self.call(creds, verbose, Method::POST, url, Some(body)).await?;
        if resp.is_success() || resp.status.as_u16() == 409 {
            return Ok(());
        }
        Err(http_error("promote moderator", &resp))
    }

    async fn leave_room_as(&self, creds: &Credentials, verbose: bool, token: &str) -> Result<()> {
        let url = spreed_room_url(&creds.base_url, &[token, "participants", "self"])?;
        let resp = self.call(creds, verbose, Method::DELETE, url, None).await?;
        if resp.is_success() || resp.status.as_u16() == 404 {
            return Ok(());
        }
        Err(http_error("leave room", &resp))
    }
}
