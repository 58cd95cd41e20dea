// server/src/chat.rs
//
// Public chat, chat commands, and the private system messages other modules
// use to tell a single player something.

use spacetimedb::{ReducerContext, Identity, Timestamp, Table};
use spacetimedb::spacetimedb_lib::ScheduleAt;
use log;
use std::time::Duration;

use crate::PrivateMessage;
use crate::private_message as PrivateMessageTableTrait;
use crate::player as PlayerTableTrait;
use crate::crab_pot::bait_reserve as BaitReserveTableTrait;

pub(crate) const SYSTEM_SENDER_NAME: &str = "SYSTEM";
const MAX_MESSAGE_LENGTH: usize = 100;

const PRIVATE_MESSAGE_CLEANUP_INTERVAL_SECS: u64 = 30;
const PRIVATE_MESSAGE_LIFETIME_MICROS: i64 = 60_000_000;

#[spacetimedb::table(name = message, public)]
#[derive(Clone, Debug)]
pub struct Message {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub sender: Identity,
    pub text: String,
    pub sent: Timestamp, // Timestamp for sorting
}

#[spacetimedb::table(name = private_message_cleanup_schedule, scheduled(cleanup_private_messages))]
#[derive(Clone)]
pub struct PrivateMessageCleanupSchedule {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub scheduled_at: ScheduleAt,
}

pub fn init_private_message_cleanup_schedule(ctx: &ReducerContext) -> Result<(), String> {
    let schedule_table = ctx.db.private_message_cleanup_schedule();
    if schedule_table.iter().count() == 0 {
        log::info!("Starting private message cleanup schedule (every {}s).", PRIVATE_MESSAGE_CLEANUP_INTERVAL_SECS);
        let interval = Duration::from_secs(PRIVATE_MESSAGE_CLEANUP_INTERVAL_SECS);
        match schedule_table.try_insert(PrivateMessageCleanupSchedule {
            id: 0,
            scheduled_at: ScheduleAt::Interval(interval.into()),
        }) {
            Ok(_) => log::info!("Private message cleanup schedule inserted."),
            Err(e) => log::error!("Failed to insert private message cleanup schedule: {}", e),
        };
    } else {
        log::debug!("Private message cleanup schedule already exists.");
    }
    Ok(())
}

/// Deletes SYSTEM notifications older than their lifetime. Clients only show them briefly.
#[spacetimedb::reducer]
pub fn cleanup_private_messages(ctx: &ReducerContext, _schedule: PrivateMessageCleanupSchedule) -> Result<(), String> {
    if ctx.sender != ctx.identity() {
        return Err("Private message cleanup can only be run by the scheduler".to_string());
    }

    let now_micros = ctx.timestamp.to_micros_since_unix_epoch();
    let messages = ctx.db.private_message();
    let expired: Vec<u64> = messages.iter()
        .filter(|message| is_expired_system_message(&message.sender_display_name, message.sent.to_micros_since_unix_epoch(), now_micros))
        .map(|message| message.id)
        .collect();

    let removed_count = expired.len();
    for id in expired {
        messages.id().delete(id);
    }
    if removed_count > 0 {
        log::trace!("Cleaned up {} old private messages", removed_count);
    }
    Ok(())
}

fn is_expired_system_message(sender_display_name: &str, sent_micros: i64, now_micros: i64) -> bool {
    sender_display_name == SYSTEM_SENDER_NAME
        && sent_micros < now_micros.saturating_sub(PRIVATE_MESSAGE_LIFETIME_MICROS)
}

/// Sends a chat message that will be visible to all players
#[spacetimedb::reducer]
pub fn send_message(ctx: &ReducerContext, text: String) -> Result<(), String> {
    if text.is_empty() {
        return Err("Message cannot be empty.".to_string());
    }
    if text.len() > MAX_MESSAGE_LENGTH { // Match client-side max length
        return Err(format!("Message too long (max {} characters).", MAX_MESSAGE_LENGTH));
    }

    let sender_id = ctx.sender;

    if text.starts_with('/') {
        let command = text.split_whitespace().next().unwrap_or_default().to_lowercase();
        match command.as_str() {
            "/bait" => {
                log::info!("[Command] Player {:?} used /bait command.", sender_id);
                let remaining = ctx.db.bait_reserve().player_identity().find(sender_id)
                    .map(|reserve| reserve.portions_remaining)
                    .unwrap_or(0);
                let reply = if remaining == 0 {
                    "You have no bait prepared.".to_string()
                } else {
                    format!("{} bait left", remaining)
                };
                send_private_notification(ctx, sender_id, reply);
                return Ok(());
            }
            "/players" => {
                log::info!("[Command] Player {:?} used /players command.", sender_id);
                let online_players_count = ctx.db.player().iter().filter(|p| p.is_online).count();
                ctx.db.message().insert(Message {
                    id: 0,
                    sender: ctx.identity(), // Module identity as sender for system messages
                    text: format!("Players Online: {}", online_players_count),
                    sent: ctx.timestamp,
                });
                return Ok(());
            }
            _ => return Err(format!("Unknown command: {}", command)),
        }
    }

    log::info!("User {} sent message: {}", sender_id, text);
    ctx.db.message().insert(Message {
        id: 0, // Auto-incremented
        sender: sender_id,
        text,
        sent: ctx.timestamp,
    });
    Ok(())
}

/// Queues a private SYSTEM message for one player. Never fails the caller.
pub(crate) fn send_private_notification(ctx: &ReducerContext, recipient: Identity, text: impl Into<String>) {
    let text = text.into();
    match ctx.db.private_message().try_insert(PrivateMessage {
        id: 0,
        recipient_identity: recipient,
        sender_display_name: SYSTEM_SENDER_NAME.to_string(),
        text,
        sent: ctx.timestamp,
    }) {
        Ok(sent) => log::debug!("Sent private message {} to {:?}: {}", sent.id, recipient, sent.text),
        Err(e) => log::error!("Failed to send private message to {:?}: {}", recipient, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000_000;

    #[test]
    fn fresh_notifications_are_kept() {
        assert!(!is_expired_system_message(SYSTEM_SENDER_NAME, NOW, NOW));
        assert!(!is_expired_system_message(SYSTEM_SENDER_NAME, NOW - PRIVATE_MESSAGE_LIFETIME_MICROS, NOW));
    }

    #[test]
    fn old_notifications_expire() {
        assert!(is_expired_system_message(SYSTEM_SENDER_NAME, NOW - PRIVATE_MESSAGE_LIFETIME_MICROS - 1, NOW));
        assert!(is_expired_system_message(SYSTEM_SENDER_NAME, 0, NOW));
    }

    #[test]
    fn only_system_messages_are_pruned() {
        assert!(!is_expired_system_message("Trader", 0, NOW));
    }
}
