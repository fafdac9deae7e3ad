// src/share/email.rs
//! SMTP email sink. Incomplete SMTP configuration makes the tier
//! unavailable rather than panicking; this sink must never take the
//! cascade down with it.

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use crate::share::dispatch::{ShareSink, SharePayload, SinkOutcome};

const SUBJECT: &str = "REPORTE CDLT NEWS";
const ATTACHMENT_NAME: &str = "CDLT_NEWS_REPORT.png";

struct EmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

pub struct EmailSink {
    transport: Option<EmailTransport>,
    attach_image: bool,
}

impl EmailSink {
    /// Reads SMTP_HOST, SMTP_USER, SMTP_PASS, SHARE_EMAIL_FROM,
    /// SHARE_EMAIL_TO. Anything missing or unparsable disables the sink.
    pub fn from_env() -> Self {
        let transport = match Self::transport_from_env() {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::debug!(error = ?e, "email sink disabled");
                None
            }
        };
        Self {
            transport,
            attach_image: false,
        }
    }

    pub fn with_attachment(mut self, attach: bool) -> Self {
        self.attach_image = attach;
        self
    }

    fn transport_from_env() -> Result<EmailTransport> {
        let host = std::env::var("SMTP_HOST").context("SMTP_HOST missing")?;
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = std::env::var("SHARE_EMAIL_FROM").context("SHARE_EMAIL_FROM missing")?;
        let to_addr = std::env::var("SHARE_EMAIL_TO").context("SHARE_EMAIL_TO missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from: Mailbox = from_addr.parse().context("invalid SHARE_EMAIL_FROM")?;
        let to: Mailbox = to_addr.parse().context("invalid SHARE_EMAIL_TO")?;
        Ok(EmailTransport { mailer, from, to })
    }

    fn build_message(&self, transport: &EmailTransport, payload: &SharePayload<'_>) -> Result<Message> {
        let builder = Message::builder()
            .from(transport.from.clone())
            .to(transport.to.clone())
            .subject(SUBJECT);

        let msg = if let (true, Some(png)) = (self.attach_image, payload.image_png) {
            let png_type = ContentType::parse("image/png").context("png content type")?;
            builder
                .multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(payload.caption_text.to_string()))
                        .singlepart(
                            Attachment::new(ATTACHMENT_NAME.to_string())
                                .body(png.to_vec(), png_type),
                        ),
                )
                .context("build email with attachment")?
        } else {
            builder
                .header(ContentType::TEXT_PLAIN)
                .body(payload.caption_text.to_string())
                .context("build email")?
        };
        Ok(msg)
    }
}

#[async_trait::async_trait]
impl ShareSink for EmailSink {
    async fn deliver(&self, payload: &SharePayload<'_>) -> Result<SinkOutcome> {
        let Some(transport) = &self.transport else {
            return Ok(SinkOutcome::Unavailable);
        };
        if self.attach_image && payload.image_png.is_none() {
            return Ok(SinkOutcome::Unavailable);
        }

        let msg = self.build_message(transport, payload)?;
        transport.mailer.send(msg).await.context("send email")?;
        Ok(SinkOutcome::Delivered)
    }

    fn name(&self) -> &'static str {
        if self.attach_image {
            "email-rich"
        } else {
            "email-text"
        }
    }
}
