//! Order confirmation emails.
//!
//! The dispatcher validates a confirmation request, renders plain text and
//! HTML bodies with Askama, and hands the message to a [`MailTransport`].
//! Production uses [`SmtpMailer`] (lettre over SMTP); tests inject a fake.
//! Sending has no persistence side effect.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use uniformly_core::confirmation::{
    ConfirmationError, ConfirmationRequest, OrderConfirmation,
};
use uniformly_core::draft::SHIPPING_FEE;

use crate::config::{MailConfig, StorefrontConfig};

/// SMTP reply code for rejected credentials.
const SMTP_AUTH_FAILED: u16 = 535;

/// Shown with authentication failures.
pub const AUTH_HINT: &str = "If you are using Gmail, turn on 2-Step Verification, create an App \
     Password (Google Account > Security > App passwords) and set SMTP_PASS to it. Use \
     smtp.gmail.com on port 465.";

/// HTML body of the store's order notification.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a OrderConfirmation,
    delivery_charge: uniformly_core::Price,
}

/// Plain text body of the store's order notification.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order: &'a OrderConfirmation,
    delivery_charge: uniformly_core::Price,
}

/// A fully composed message.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub message_id: String,
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Failure reported by a [`MailTransport`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    /// SMTP reply code, when the server sent one.
    pub code: Option<u16>,
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.code == Some(SMTP_AUTH_FAILED) || self.message.contains("535")
    }
}

impl From<SmtpError> for TransportError {
    fn from(err: SmtpError) -> Self {
        let code = err
            .status()
            .and_then(|code| code.to_string().parse::<u16>().ok());
        Self::new(code, err.to_string())
    }
}

/// Something that can deliver a composed message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver the message.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError>;
}

/// Errors from [`NotificationDispatcher::send_order_confirmation`].
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The request failed validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ConfirmationError),

    /// No mail transport is configured.
    #[error("mail transport is not configured (set SMTP_HOST, SMTP_USER, SMTP_PASS)")]
    NotConfigured,

    /// The relay rejected the credentials.
    #[error("SMTP authentication failed: {0}")]
    Authentication(TransportError),

    /// Any other transport failure.
    #[error("failed to send email: {0}")]
    Send(TransportError),

    /// The send did not finish in time.
    #[error("sending email timed out after {0:?}")]
    Timeout(Duration),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Invalid sender or recipient address in configuration.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Failed to build the SMTP transport.
    #[error("SMTP setup failed: {0}")]
    Setup(#[from] SmtpError),
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentConfirmation {
    pub message_id: String,
}

// =============================================================================
// SMTP transport
// =============================================================================

/// SMTP transport built on lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a transport for the configured relay.
    ///
    /// Port 465 uses implicit TLS; any other port negotiates STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &MailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };
        let mailer = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = Message::builder()
            .message_id(Some(mail.message_id.clone()))
            .from(mail.from.clone())
            .to(mail.to.clone())
            .subject(mail.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html.clone()),
                    ),
            )
            .map_err(|e| TransportError::new(None, format!("failed to build message: {e}")))?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

struct Route {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
    to: Mailbox,
}

/// Sends order confirmations to the store's inbox.
#[derive(Clone)]
pub struct NotificationDispatcher {
    route: Option<Arc<Route>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    /// Build from configuration. Without mail settings the dispatcher is
    /// created unconfigured and every send fails with
    /// [`NotificationError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns error if an address is invalid or the relay cannot be set up.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, NotificationError> {
        let Some(mail) = &config.mail else {
            return Ok(Self::unconfigured(config.mail_timeout));
        };
        let transport = Arc::new(SmtpMailer::new(mail)?);
        Self::with_transport(
            transport,
            &mail.from_address,
            &mail.notify_address,
            config.mail_timeout,
        )
    }

    /// A dispatcher with no transport.
    #[must_use]
    pub const fn unconfigured(timeout: Duration) -> Self {
        Self {
            route: None,
            timeout,
        }
    }

    /// A dispatcher that delivers through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::InvalidAddress`] if either address does not parse.
    pub fn with_transport(
        transport: Arc<dyn MailTransport>,
        from: &str,
        to: &str,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let parse = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|_| NotificationError::InvalidAddress(address.to_owned()))
        };
        Ok(Self {
            route: Some(Arc::new(Route {
                transport,
                from: parse(from)?,
                to: parse(to)?,
            })),
            timeout,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.route.is_some()
    }

    /// Validate, compose, and send an order confirmation.
    ///
    /// Validation runs before the configuration check, so a bad request is
    /// reported as such even when mail is not set up.
    ///
    /// # Errors
    ///
    /// See [`NotificationError`].
    #[instrument(skip(self, request))]
    pub async fn send_order_confirmation(
        &self,
        request: ConfirmationRequest,
    ) -> Result<SentConfirmation, NotificationError> {
        let order = OrderConfirmation::validate(request)?;
        let route = self.route.as_ref().ok_or(NotificationError::NotConfigured)?;

        let mail = compose(&order, route.from.clone(), route.to.clone())?;
        let message_id = mail.message_id.clone();

        match tokio::time::timeout(self.timeout, route.transport.send(&mail)).await {
            Err(_) => Err(NotificationError::Timeout(self.timeout)),
            Ok(Err(err)) if err.is_auth_failure() => Err(NotificationError::Authentication(err)),
            Ok(Err(err)) => Err(NotificationError::Send(err)),
            Ok(Ok(())) => {
                tracing::info!(
                    message_id = %message_id,
                    items = order.lines.len(),
                    total = %order.total,
                    "Order confirmation sent"
                );
                Ok(SentConfirmation { message_id })
            }
        }
    }
}

/// Render both bodies and address the message.
fn compose(
    order: &OrderConfirmation,
    from: Mailbox,
    to: Mailbox,
) -> Result<OutgoingMail, NotificationError> {
    let html = OrderConfirmationHtml {
        order,
        delivery_charge: SHIPPING_FEE,
    }
    .render()?;
    let text = OrderConfirmationText {
        order,
        delivery_charge: SHIPPING_FEE,
    }
    .render()?;

    let domain = from.email.domain().to_owned();
    Ok(OutgoingMail {
        message_id: format!("<{}@{domain}>", Uuid::new_v4()),
        from,
        to,
        subject: order.subject(),
        text,
        html,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<OutgoingMail>>,
        pub fail_with: Option<TransportError>,
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    pub fn dispatcher(transport: Arc<RecordingTransport>) -> NotificationDispatcher {
        NotificationDispatcher::with_transport(
            transport,
            "Uniformly Orders <orders@uniformly.pk>",
            "owner@uniformly.pk",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    pub fn request(phone: &str) -> ConfirmationRequest {
        serde_json::from_value(serde_json::json!({
            "customer": { "name": "Ayesha Khan", "phone": phone, "address": "House 4, Street 9, Lahore" },
            "items": [
                { "name": "Boy • Winter • School • Shirt • Size 24", "quantity": 2, "unitPrice": 850 },
                { "name": "Boy • Winter • School • Tie", "quantity": 1, "unitPrice": 150 }
            ],
            "pricing": { "subtotal": 1850, "shipping": 250, "total": 2100 }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sends_rendered_message() {
        let transport = Arc::new(RecordingTransport::default());
        let sent = dispatcher(transport.clone())
            .send_order_confirmation(request("0300 1234567"))
            .await
            .unwrap();

        let mails = transport.sent.lock().unwrap();
        assert_eq!(mails.len(), 1);
        let mail = &mails[0];
        assert_eq!(mail.message_id, sent.message_id);
        assert!(mail.message_id.ends_with("@uniformly.pk>"));
        assert_eq!(mail.subject, "New Order from Ayesha Khan (03001234567)");
        assert_eq!(mail.to.email.to_string(), "owner@uniformly.pk");

        assert!(mail.text.contains("1. Boy • Winter • School • Shirt • Size 24 | Qty 2 | Unit Rs. 850 | Total Rs. 1,700"));
        assert!(mail.text.contains("Grand Total: Rs. 2,100"));
        assert!(mail.text.contains("Delivery charges are Rs. 250. Items will be delivered in 3 to 4 business days."));

        assert!(mail.html.contains("Rs. 1,700"));
        assert!(mail.html.contains("House 4, Street 9, Lahore"));
    }

    #[tokio::test]
    async fn test_html_body_escapes_customer_input() {
        let transport = Arc::new(RecordingTransport::default());
        let mut req = request("03001234567");
        req.customer.name = Some("<script>alert(1)</script>".into());
        dispatcher(transport.clone())
            .send_order_confirmation(req)
            .await
            .unwrap();

        let mails = transport.sent.lock().unwrap();
        assert!(!mails[0].html.contains("<script>"));
        assert!(mails[0].text.contains("<script>alert(1)</script>"));
    }

    #[tokio::test]
    async fn test_validation_runs_before_configuration_check() {
        let dispatcher = NotificationDispatcher::unconfigured(Duration::from_secs(1));
        let err = dispatcher
            .send_order_confirmation(request("1234567890"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NotificationError::Validation(ConfirmationError::InvalidPhone(_))
        ));

        let err = dispatcher
            .send_order_confirmation(request("+923001234567"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured));
    }

    #[tokio::test]
    async fn test_auth_failure_is_distinguished() {
        let transport = Arc::new(RecordingTransport {
            fail_with: Some(TransportError::new(
                Some(535),
                "permanent error (535): 5.7.8 Username and Password not accepted",
            )),
            ..Default::default()
        });
        let err = dispatcher(transport)
            .send_order_confirmation(request("03001234567"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_other_failures_are_send_errors() {
        let transport = Arc::new(RecordingTransport {
            fail_with: Some(TransportError::new(Some(421), "service not available")),
            ..Default::default()
        });
        let err = dispatcher(transport)
            .send_order_confirmation(request("03001234567"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Send(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transport_times_out() {
        let transport = Arc::new(RecordingTransport {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let err = dispatcher(transport)
            .send_order_confirmation(request("03001234567"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Timeout(_)));
    }

    #[test]
    fn test_auth_failure_detection_from_message() {
        assert!(TransportError::new(None, "535-5.7.8 Username and Password not accepted").is_auth_failure());
        assert!(!TransportError::new(Some(550), "mailbox unavailable").is_auth_failure());
    }

    #[test]
    fn test_invalid_configured_address() {
        let err = NotificationDispatcher::with_transport(
            Arc::new(RecordingTransport::default()),
            "not an address",
            "owner@uniformly.pk",
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, NotificationError::InvalidAddress(_)));
    }
}
