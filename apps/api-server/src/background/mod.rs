//! Background work run inside the server process.

mod publish;
mod scheduler;

pub use publish::PublishScheduledPosts;
pub use scheduler::{Scheduler, SchedulerConfig};
