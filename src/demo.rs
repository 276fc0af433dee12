// Demo mode - synthetic events for showcasing the TUI
//
// Plays the part of the backend: seeds the circle and blog lists, drifts
// the live counters, and answers fetch commands with generated data so
// the whole sync loop (timeline paging included) works without a server.
// Deterministic (a tiny LCG drives the variation) so screenshots are
// reproducible. The task ends when the events channel closes.

use crate::api::models::{
    Blog, BlogId, BlogKind, Contact, Conversation, Milestone, ProfileId, ProfileSnapshot,
    TimelinePage,
};
use crate::events::{CircleList, Command, CounterKind, FeedStatus, SyncEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// How many ancestors the synthetic timeline pretends to have.
const DEMO_HEAD_TOTAL: usize = 12;
const DEMO_PAGE_SIZE: usize = 5;

/// Minimal deterministic generator; quality is irrelevant here.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next() % (hi - lo)
    }
}

const FIRST_NAMES: [&str; 8] = [
    "Amara", "Bola", "Chidi", "Deka", "Efe", "Folu", "Gozie", "Hauwa",
];

fn profile(id: ProfileId, depth: u32, rng: &mut Lcg) -> ProfileSnapshot {
    ProfileSnapshot {
        id,
        name: format!(
            "{} {}",
            FIRST_NAMES[(id as usize) % FIRST_NAMES.len()],
            FIRST_NAMES[(id as usize / 3 + 1) % FIRST_NAMES.len()]
        ),
        picture: None,
        children: rng.range(0, 5) as u32,
        influence: rng.range(1, 100) as u32,
        height: rng.range(1, 6) as u32,
        weight: rng.range(1, 9) as u32,
        depth,
    }
}

fn blog(id: BlogId, kind: BlogKind, rng: &mut Lcg) -> Blog {
    Blog {
        id,
        title: format!("{} update #{id}", kind.label()),
        body: None,
        author: Some(FIRST_NAMES[(id as usize) % FIRST_NAMES.len()].to_string()),
        likes: rng.range(0, 40) as u32,
        shares: rng.range(0, 12) as u32,
        created_at: None,
    }
}

/// Run the demo stream: seed the slow lists, then answer commands and
/// drift the counters until the app goes away.
pub async fn run_demo(events: mpsc::Sender<SyncEvent>, mut commands: mpsc::Receiver<Command>) {
    tracing::info!("demo stream started");
    let mut rng = Lcg(0xA60A);

    // The dashboard connects instantly in demo mode.
    let _ = events.send(SyncEvent::Feed(FeedStatus::Connected)).await;

    let mut active = rng.range(40, 90);
    let mut total = rng.range(900, 1200);
    let mut ticker = tokio::time::interval(Duration::from_secs(2));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                active = active.saturating_add_signed(rng.range(0, 7) as i64 - 3).max(1);
                total += rng.range(0, 3);

                let sent = events
                    .send(SyncEvent::Counter { kind: CounterKind::ActiveUsers, value: active })
                    .await
                    .is_ok()
                    && events
                        .send(SyncEvent::Counter { kind: CounterKind::Petitioners, value: total })
                        .await
                        .is_ok();
                if !sent {
                    break;
                }
            }

            command = commands.recv() => {
                let Some(command) = command else { break };
                let response = answer(command, &mut rng);
                if events.send(response).await.is_err() {
                    break;
                }
            }
        }
    }
    tracing::info!("demo stream ended");
}

/// Produce a plausible response for one fetch command.
fn answer(command: Command, rng: &mut Lcg) -> SyncEvent {
    match command {
        Command::FetchTimelinePage {
            number,
            owner,
            page,
            generation,
        } => {
            let start = (page as usize - 1) * DEMO_PAGE_SIZE;
            let remaining = DEMO_HEAD_TOTAL.saturating_sub(start);
            let size = remaining.min(DEMO_PAGE_SIZE);
            let results = (0..size)
                .map(|i| profile(1000 + (start + i) as u64, (start + i) as u32 + 1, rng))
                .collect();
            SyncEvent::TimelinePage {
                number,
                generation,
                page,
                response: TimelinePage {
                    results,
                    count: DEMO_HEAD_TOTAL,
                    next: (start + size < DEMO_HEAD_TOTAL)
                        .then(|| format!("/api/users/timeline/{owner}/?page={}", page + 1)),
                    load: true,
                    user_profile: (page == 1).then(|| profile(owner, 0, rng)),
                },
            }
        }

        Command::FetchTail {
            number,
            profile_id,
            index,
            generation,
        } => {
            let subtree = (0..3)
                .map(|i| profile(profile_id * 10 + i, index as u32 + i as u32, rng))
                .collect();
            SyncEvent::PathShifted {
                number,
                generation,
                index,
                subtree,
            }
        }

        Command::FetchCircle { list } => match list {
            CircleList::Conversations => SyncEvent::ConversationsLoaded {
                items: (0..6)
                    .map(|i| Conversation {
                        id: i + 1,
                        name: format!("{} Ward Group", FIRST_NAMES[i as usize % FIRST_NAMES.len()]),
                        last_message: Some("See you at the town hall".to_string()),
                        unread: (i % 3) as u32,
                        updated_at: None,
                    })
                    .collect(),
            },
            CircleList::Contacts | CircleList::CircleContacts => {
                let count = if list == CircleList::Contacts { 10 } else { 4 };
                SyncEvent::ContactsLoaded {
                    list,
                    items: (0..count)
                        .map(|i| Contact {
                            id: i + 100,
                            name: FIRST_NAMES[i as usize % FIRST_NAMES.len()].to_string(),
                            picture: None,
                            user_type: None,
                        })
                        .collect(),
                }
            }
        },

        Command::FetchBlogs { kind } => SyncEvent::BlogsLoaded {
            kind,
            items: (1..=5).map(|id| blog(id, kind, rng)).collect(),
        },

        Command::React {
            blog_id,
            kind: _,
            correlation,
        } => {
            // Echo a plausible authoritative entity back.
            let mut entity = blog(blog_id, BlogKind::News, rng);
            entity.likes += 1;
            SyncEvent::ReactionResolved {
                correlation,
                blog: entity,
            }
        }

        Command::FetchMilestones { .. } => SyncEvent::MilestonesLoaded {
            items: ["First connection added", "Circle of ten", "Petition signed"]
                .iter()
                .enumerate()
                .map(|(i, title)| Milestone {
                    id: i as u64 + 1,
                    title: title.to_string(),
                    description: None,
                    achieved_at: None,
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_pages_cover_the_total_and_then_exhaust() {
        let mut rng = Lcg(7);

        let first = answer(
            Command::FetchTimelinePage {
                number: 1,
                owner: 9,
                page: 1,
                generation: 1,
            },
            &mut rng,
        );
        let SyncEvent::TimelinePage { response, .. } = first else {
            panic!("expected a timeline page");
        };
        assert_eq!(response.results.len(), DEMO_PAGE_SIZE);
        assert!(response.next.is_some());
        assert!(response.user_profile.is_some());

        let last_page = DEMO_HEAD_TOTAL.div_ceil(DEMO_PAGE_SIZE) as u32;
        let last = answer(
            Command::FetchTimelinePage {
                number: 1,
                owner: 9,
                page: last_page,
                generation: 1,
            },
            &mut rng,
        );
        let SyncEvent::TimelinePage { response, .. } = last else {
            panic!("expected a timeline page");
        };
        assert!(response.next.is_none());
        assert!(response.user_profile.is_none());
        assert_eq!(
            response.results.len(),
            DEMO_HEAD_TOTAL - (last_page as usize - 1) * DEMO_PAGE_SIZE
        );
    }
}
