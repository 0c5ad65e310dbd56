// --------------------------------------------------
// Notification dispatch for the reminder scheduler.
//
// Two channels, both best-effort:
// - system: local desktop notification via notify-send
// - email: authenticated SMTP submission via lettre
// -------------------------------------------------

use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::process::Command;
use tracing::{error, warn};

use crate::error::Result;
use crate::logic::{Reminder, ReminderKind};
use crate::models::{NotifyConfig, NotifyMethod};

pub fn reminder_line(reminder: &Reminder) -> String {
    match reminder.kind {
        ReminderKind::DueToday => format!("DUE TODAY: {}", reminder.description),
        ReminderKind::Overdue => {
            format!("OVERDUE: {} (was due {})", reminder.description, reminder.due_date)
        }
    }
}

/// Emit one reminder through the configured channels. Transport
/// failures are logged and swallowed so the poll loop keeps running.
pub async fn dispatch(config: &NotifyConfig, reminder: &Reminder) {
    let line = reminder_line(reminder);

    if matches!(config.method, NotifyMethod::System | NotifyMethod::Both) {
        if let Err(err) = send_desktop(&line).await {
            error!("Error while sending desktop notification: {}", err);
        }
    }

    if matches!(config.method, NotifyMethod::Email | NotifyMethod::Both) {
        if !config.has_mail_credentials() {
            warn!("email notification skipped: incomplete credentials");
        } else if let Err(err) = send_email(config, &line).await {
            error!("Error while sending mail: {}", err);
        }
    }
}

async fn send_desktop(line: &str) -> Result<()> {
    let status = Command::new("notify-send")
        .arg("tasknest")
        .arg(line)
        .status()
        .await?;

    if !status.success() {
        return Err(std::io::Error::other(format!("notify-send exited with {status}")).into());
    }
    Ok(())
}

// The transport is rebuilt per send: the config can be replaced at
// runtime through the API.
async fn send_email(config: &NotifyConfig, line: &str) -> Result<()> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(config.smtp.as_str())?
        .credentials(Credentials::new(config.email.clone(), config.password.clone()))
        .build();

    let mailbox = config.email.parse()?;
    let message = Message::builder()
        .from(mailbox)
        .to(config.email.parse()?)
        .subject("tasknest reminder")
        .body(line.to_string())?;

    transport.send(message).await?;
    Ok(())
}
