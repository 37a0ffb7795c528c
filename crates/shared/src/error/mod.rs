mod inventory;
mod release_result;
mod ticket;

pub use inventory::InventoryError;
pub use release_result::ReleaseResult;
pub use ticket::TicketError;
