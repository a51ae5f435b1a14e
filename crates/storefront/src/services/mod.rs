//! Business logic services for the storefront.
//!
//! - `orders` - Checkout (cart to order) and order queries
//! - `directory` - School directory with a lookup cache
//! - `identity` - Email lookup behind the `IdentityResolver` seam
//! - `notification` - Order confirmation emails over a `MailTransport`

pub mod directory;
pub mod identity;
pub mod notification;
pub mod orders;

pub use directory::SchoolDirectory;
pub use identity::{EmailLookup, IdentityResolver};
pub use notification::{
    AUTH_HINT, MailTransport, NotificationDispatcher, NotificationError, OutgoingMail,
    SentConfirmation, SmtpMailer, TransportError,
};
pub use orders::{CheckoutError, OrderService};
