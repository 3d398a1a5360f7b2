//! Recent-activity lists.

mod entry;
mod events;
mod ranker;

pub use entry::{ActivityEntry, RecentDocument};
pub use events::DocumentEvents;
pub use ranker::{ActivityRanker, SweepReport};
