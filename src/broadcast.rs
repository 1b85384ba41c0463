//! Group message fan-out
//!
//! Delivers one formatted line to every live member of a group except the
//! sender. The group's read lock is held for the whole fan-out, so
//! membership of that group cannot change mid-broadcast while other groups
//! stay unaffected.

use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::group::GroupRegistry;
use crate::protocol::format_group_message;
use crate::session::SessionRegistry;
use crate::types::Endpoint;

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients whose queue accepted the line
    pub delivered: usize,
    /// Members without a live session
    pub skipped: usize,
    /// Recipients whose queue was closed or stayed full past the timeout
    pub failed: usize,
}

pub struct Broadcaster<'a> {
    sessions: &'a SessionRegistry,
    groups: &'a GroupRegistry,
    delivery_timeout: Duration,
}

impl<'a> Broadcaster<'a> {
    pub fn new(
        sessions: &'a SessionRegistry,
        groups: &'a GroupRegistry,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            groups,
            delivery_timeout,
        }
    }

    /// Send `body` to every member of `group_name` other than the sender
    pub async fn send_group_message(
        &self,
        sender: &Endpoint,
        group_name: &str,
        body: &str,
    ) -> Result<DeliveryReport, AppError> {
        let group = self.groups.get(group_name).ok_or(AppError::GroupNotFound)?;
        let from = self
            .sessions
            .resolve_user(sender)
            .ok_or(AppError::NotLoggedIn)?
            .username;

        let line = format_group_message(&from, group_name, body);
        let mut report = DeliveryReport::default();

        let group = group.read().await;
        let mut deliveries = Vec::new();
        for member in group.members().filter(|m| *m != from) {
            let Some(outbound) = self.sessions.outbound_of(member) else {
                debug!("Skipping '{}' in '{}': no live session", member, group_name);
                report.skipped += 1;
                continue;
            };
            let line = line.clone();
            let timeout = self.delivery_timeout;
            deliveries.push(async move { (member, outbound.deliver(line, timeout).await) });
        }

        for (member, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Delivery to '{}' in '{}' failed: {}", member, group_name, e);
                    report.failed += 1;
                }
            }
        }
        drop(group);

        info!(
            "Message from '{}' to '{}': {} delivered, {} skipped, {} failed",
            from, group_name, report.delivered, report.skipped, report.failed
        );
        Ok(report)
    }
}
