mod pill;
mod queue_item;
mod ticket;

pub(crate) use pill::Pill;
pub(crate) use queue_item::PendingRequest;
pub use ticket::Ticket;
