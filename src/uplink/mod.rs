//! Network uplink to the medication log server.
//!
//! The control loop never talks HTTP.  The
//! [`QueuedUplink`](crate::adapters::uplink::QueuedUplink) adapter drops
//! records into [`channels::UPLINK_CHANNEL`]; the uploader thread in
//! [`io_task`] turns each one into a GET built by [`query`].

pub mod channels;
pub mod io_task;
pub mod query;
