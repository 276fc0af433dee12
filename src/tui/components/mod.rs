// Components module - reusable UI building blocks
//
// Shell components (title bar, status bar, toast) render in every view.
// Panel components own their scroll/selection state; App routes input to
// whichever is focused and renders from the stores.

pub mod blogs_panel;
pub mod circle_panel;
pub mod dashboard;
pub mod formatters;
pub mod logs_panel;
pub mod scrollbar;
pub mod status_bar;
pub mod timeline_panel;
pub mod title_bar;
pub mod toast;

pub use blogs_panel::{BlogAction, BlogsPanel};
pub use circle_panel::CirclePanel;
pub use logs_panel::LogsPanel;
pub use timeline_panel::{TimelineAction, TimelinePanel};
pub use toast::Toast;
