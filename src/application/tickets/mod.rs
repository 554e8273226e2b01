//! Ticket rendering

mod pdf;

pub use pdf::{render_ticket, TicketData};
