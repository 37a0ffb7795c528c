mod config;
mod credential;
mod device;
mod ticket;

pub use config::Config;
pub use credential::{Credential, CredentialsFile};
pub use device::{Device, DeviceStatus};
pub use ticket::{Ticket, TicketStatus};
