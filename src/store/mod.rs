// Store layer - the client's authoritative state
//
// Every slice follows the same discipline: the TUI asks a store whether a
// fetch should go out (getting back a Command to dispatch), background
// tasks report results as SyncEvents, and the store folds them in. Views
// render from here and own nothing themselves.

pub mod blogs;
pub mod cache;
pub mod circle;
pub mod milestones;
pub mod session;
pub mod timeline;

pub use blogs::BlogStore;
pub use circle::CircleStore;
pub use milestones::MilestoneStore;
pub use session::{SessionIdentity, SessionStore};
pub use timeline::{PageCursor, TimelineState, TimelineStore};
