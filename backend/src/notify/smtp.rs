use super::{Notification, Notifier, NotifyError};
use crate::config::SmtpSettings;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info};

/// Sends notifications through an SMTP relay using `lettre`.
pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, NotifyError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("sender {from:?}: {e}")))?;
        Ok(Self {
            from,
            transport: build_transport(settings)?,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = build_message(&self.from, notification)?;
        debug!("Sending \"{}\" to {} via SMTP", notification.subject, notification.to);
        self.transport
            .send(message)
            .await
            .map_err(|e| map_smtp_error(&e))?;
        info!("Email \"{}\" delivered to {}", notification.subject, notification.to);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

fn build_message(from: &Mailbox, notification: &Notification) -> Result<Message, NotifyError> {
    let to: Mailbox = notification
        .to
        .parse()
        .map_err(|e| NotifyError::Address(format!("recipient {:?}: {e}", notification.to)))?;

    let mut body = MultiPart::mixed().singlepart(
        SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone()),
    );
    for attachment in &notification.attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| NotifyError::Build(format!("content type {:?}: {e}", attachment.content_type)))?;
        body = body.singlepart(
            MailAttachment::new(attachment.filename.clone()).body(attachment.bytes.clone(), content_type),
        );
    }

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(&notification.subject)
        .multipart(body)
        .map_err(|e| NotifyError::Build(e.to_string()))
}

fn build_transport(settings: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
    let builder = if settings.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotifyError::Transport(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
    };

    let builder = builder.port(settings.port);
    let builder = match (&settings.username, &settings.password) {
        (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
        _ => builder,
    };
    Ok(builder.build())
}

fn map_smtp_error(error: &lettre::transport::smtp::Error) -> NotifyError {
    if error.is_transient() {
        NotifyError::Transport(format!("transient SMTP error: {error}"))
    } else if error.is_permanent() {
        NotifyError::Transport(format!("permanent SMTP error: {error}"))
    } else {
        NotifyError::Transport(format!("SMTP error: {error}"))
    }
}
