//! Notification agent. Nothing leaves the process: every send is appended
//! to the shared capped log and echoed back with the contact masked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::logistics::parse_timestamp;
use crate::agent::context::{new_id, Channel, NotificationLogEntry, ScheduledNotification, ToolContext};
use crate::agent::heuristics::preview;
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::error::{HarvestError, Result};

const PREVIEW_CHARS: usize = 100;
const DEFAULT_HISTORY_LIMIT: usize = 20;

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "notify",
                ToolCategory::Notify,
                "Send a short notification to a user over app, email, or SMS.",
            ),
            notify,
        )
        .register(
            ToolSpec::new("sendEmail", ToolCategory::Notify, "Send an email notification."),
            send_email,
        )
        .register(
            ToolSpec::new("sendSMS", ToolCategory::Notify, "Send an SMS notification."),
            send_sms,
        )
        .register(
            ToolSpec::new("pushAlert", ToolCategory::Notify, "Send an in-app push alert."),
            push_alert,
        )
        .register(
            ToolSpec::new(
                "scheduleNotification",
                ToolCategory::Notify,
                "Schedule a notification for later dispatch.",
            ),
            schedule_notification,
        )
        .register(
            ToolSpec::new(
                "getNotificationHistory",
                ToolCategory::Notify,
                "Recent notifications, newest first, with contacts masked.",
            ),
            get_notification_history,
        );
}

/// `u***@domain` for emails, last four characters for anything else
pub fn mask_contact(contact: &str) -> String {
    if contact.is_empty() {
        return String::new();
    }
    if let Some((user, domain)) = contact.split_once('@') {
        let head = if user.chars().count() > 1 {
            format!("{}***", user.chars().next().unwrap_or('*'))
        } else {
            "*".to_string()
        };
        return format!("{}@{}", head, domain);
    }
    let total = contact.chars().count();
    contact
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < total { '*' } else { c })
        .collect()
}

fn parse_channel(raw: &str) -> Result<Channel> {
    Channel::parse(raw)
        .ok_or_else(|| HarvestError::Validation(format!("unknown channel '{}' (use app, email or sms)", raw)))
}

/// Echo of a logged notification
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub ok: bool,
    pub id: String,
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub preview: String,
    pub ts: DateTime<Utc>,
}

impl DeliveryReceipt {
    fn for_entry(entry: &NotificationLogEntry) -> Self {
        Self {
            ok: true,
            id: entry.id.clone(),
            channel: entry.channel,
            to: None,
            recipient: None,
            recipient_id: None,
            subject: None,
            title: None,
            preview: preview(&entry.message, PREVIEW_CHARS),
            ts: entry.ts,
        }
    }
}

fn log_sent(
    ctx: &ToolContext,
    channel: Channel,
    recipient: String,
    subject: Option<String>,
    message: String,
    tags: Vec<String>,
) -> NotificationLogEntry {
    let entry = NotificationLogEntry {
        id: new_id(channel.id_prefix()),
        channel,
        recipient,
        subject,
        message,
        tags,
        status: "sent".to_string(),
        ts: Utc::now(),
    };
    info!(id = %entry.id, channel = ?entry.channel, "notification logged");
    ctx.notifications.push(entry.clone());
    entry
}

fn default_channel() -> String {
    "app".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NotifyArgs {
    pub recipient: String,
    pub message: String,
    #[serde(default = "default_channel")]
    pub channel: String,
}

pub fn notify(ctx: &ToolContext, args: NotifyArgs) -> Result<DeliveryReceipt> {
    let channel = parse_channel(&args.channel)?;
    let entry = log_sent(ctx, channel, args.recipient, None, args.message, Vec::new());
    Ok(DeliveryReceipt {
        recipient: Some(mask_contact(&entry.recipient)),
        ..DeliveryReceipt::for_entry(&entry)
    })
}

#[derive(Debug, Deserialize)]
pub struct SendEmailArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn send_email(ctx: &ToolContext, args: SendEmailArgs) -> Result<DeliveryReceipt> {
    let entry = log_sent(ctx, Channel::Email, args.to, Some(args.subject), args.body, args.tags);
    Ok(DeliveryReceipt {
        to: Some(mask_contact(&entry.recipient)),
        subject: entry.subject.clone(),
        ..DeliveryReceipt::for_entry(&entry)
    })
}

#[derive(Debug, Deserialize)]
pub struct SendSmsArgs {
    pub to: String,
    pub message: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn send_sms(ctx: &ToolContext, args: SendSmsArgs) -> Result<DeliveryReceipt> {
    let entry = log_sent(ctx, Channel::Sms, args.to, None, args.message, args.tags);
    Ok(DeliveryReceipt {
        to: Some(mask_contact(&entry.recipient)),
        ..DeliveryReceipt::for_entry(&entry)
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushAlertArgs {
    pub recipient_id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn push_alert(ctx: &ToolContext, args: PushAlertArgs) -> Result<DeliveryReceipt> {
    let entry = log_sent(ctx, Channel::App, args.recipient_id, Some(args.title), args.message, args.tags);
    Ok(DeliveryReceipt {
        recipient_id: Some(entry.recipient.clone()),
        title: entry.subject.clone(),
        ..DeliveryReceipt::for_entry(&entry)
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleArgs {
    #[serde(default = "default_channel")]
    pub channel: String,
    pub recipient: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    pub run_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReceipt {
    pub ok: bool,
    pub id: String,
    pub channel: Channel,
    pub recipient: String,
    pub run_at: DateTime<Utc>,
    pub status: String,
}

pub fn schedule_notification(ctx: &ToolContext, args: ScheduleArgs) -> Result<ScheduleReceipt> {
    let channel = parse_channel(&args.channel)?;
    let run_at = parse_timestamp(&args.run_at).ok_or_else(|| {
        HarvestError::Validation(format!("runAt '{}' is not a recognised date/time", args.run_at))
    })?;

    let job = ScheduledNotification {
        id: new_id("SC"),
        channel,
        recipient: args.recipient,
        subject: args.subject,
        message: args.message,
        run_at,
        tags: args.tags,
        status: "scheduled".to_string(),
        ts: Utc::now(),
    };
    info!(id = %job.id, run_at = %job.run_at, "notification scheduled");
    ctx.scheduled.push(job.clone());

    Ok(ScheduleReceipt {
        ok: true,
        id: job.id,
        channel: job.channel,
        recipient: mask_contact(&job.recipient),
        run_at: job.run_at,
        status: job.status,
    })
}

fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct HistoryArgs {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub channel: Channel,
    pub recipient: String,
    pub subject: Option<String>,
    pub preview: String,
    pub tags: Vec<String>,
    pub status: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResult {
    pub count: usize,
    pub items: Vec<HistoryItem>,
}

pub fn get_notification_history(ctx: &ToolContext, args: HistoryArgs) -> Result<HistoryResult> {
    let recipient = args.recipient.filter(|r| !r.is_empty());
    let items: Vec<HistoryItem> = ctx
        .notifications
        .recent(args.limit, |n| recipient.as_deref().map_or(true, |r| n.recipient == r))
        .into_iter()
        .map(|n| HistoryItem {
            recipient: mask_contact(&n.recipient),
            preview: preview(&n.message, PREVIEW_CHARS),
            id: n.id,
            channel: n.channel,
            subject: n.subject,
            tags: n.tags,
            status: n.status,
            ts: n.ts,
        })
        .collect();

    Ok(HistoryResult {
        count: items.len(),
        items,
    })
}
