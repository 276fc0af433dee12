// Sync dispatcher - executes fetch commands against the REST API
//
// The TUI side decides what to fetch (stores enforce cursors, freshness
// windows, and overlap guards) and pushes Commands here. Each command runs
// in its own task so a slow timeline page never holds up a contact list,
// matching the unfenced request model: ordering is the stores' problem,
// expressed through generations, not the dispatcher's.
//
// Every rejection is caught here and reported as a failure event; nothing
// propagates upward.

use crate::api::ApiClient;
use crate::events::{Command, ReactionKind, SyncEvent};
use tokio::sync::mpsc;

/// Run the dispatcher until the command channel closes.
pub async fn run(api: ApiClient, mut commands: mpsc::Receiver<Command>, events: mpsc::Sender<SyncEvent>) {
    tracing::debug!("sync dispatcher started");
    while let Some(command) = commands.recv().await {
        let api = api.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let event = execute(&api, command).await;
            let _ = events.send(event).await;
        });
    }
    tracing::debug!("sync dispatcher shutting down");
}

/// Execute one command, folding any rejection into the failure event for
/// its slice.
async fn execute(api: &ApiClient, command: Command) -> SyncEvent {
    match command {
        Command::FetchTimelinePage {
            number,
            owner,
            page,
            generation,
        } => match api.timeline_page(owner, page).await {
            Ok(response) => SyncEvent::TimelinePage {
                number,
                generation,
                page,
                response,
            },
            Err(err) => SyncEvent::TimelineFailed {
                number,
                generation,
                error: format!("{err:#}"),
            },
        },

        Command::FetchTail {
            number,
            profile_id,
            index,
            generation,
        } => match api.timeline_tail(profile_id).await {
            Ok(subtree) => SyncEvent::PathShifted {
                number,
                generation,
                index,
                subtree,
            },
            Err(err) => SyncEvent::ShiftFailed {
                number,
                generation,
                error: format!("{err:#}"),
            },
        },

        Command::FetchCircle { list } => match list {
            crate::events::CircleList::Conversations => match api.chat_list().await {
                Ok(items) => SyncEvent::ConversationsLoaded { items },
                Err(err) => SyncEvent::CircleFailed {
                    list,
                    error: format!("{err:#}"),
                },
            },
            crate::events::CircleList::Contacts => match api.contacts().await {
                Ok(items) => SyncEvent::ContactsLoaded { list, items },
                Err(err) => SyncEvent::CircleFailed {
                    list,
                    error: format!("{err:#}"),
                },
            },
            crate::events::CircleList::CircleContacts => match api.circle_contacts().await {
                Ok(items) => SyncEvent::ContactsLoaded { list, items },
                Err(err) => SyncEvent::CircleFailed {
                    list,
                    error: format!("{err:#}"),
                },
            },
        },

        Command::FetchBlogs { kind } => match api.blogs(kind).await {
            Ok(items) => SyncEvent::BlogsLoaded { kind, items },
            Err(err) => SyncEvent::BlogsFailed {
                kind,
                error: format!("{err:#}"),
            },
        },

        Command::React {
            blog_id,
            kind,
            correlation,
        } => {
            let result = match kind {
                ReactionKind::Like => api.like_blog(blog_id).await,
                ReactionKind::Share => api.share_blog(blog_id).await,
            };
            match result {
                Ok(blog) => SyncEvent::ReactionResolved { correlation, blog },
                Err(err) => SyncEvent::ReactionFailed {
                    correlation,
                    error: format!("{err:#}"),
                },
            }
        }

        Command::FetchMilestones { user_id } => match api.milestones(user_id).await {
            Ok(items) => SyncEvent::MilestonesLoaded { items },
            Err(err) => SyncEvent::MilestonesFailed {
                error: format!("{err:#}"),
            },
        },
    }
}
