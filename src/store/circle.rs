// Circle stores: conversations, contacts, circle contacts
//
// Three freshness-gated entity lists sharing the EntityCache shape. The
// gate lives in the cache; this module just routes the three lists to
// their commands and applies results.

use crate::api::models::{Contact, Conversation};
use crate::events::{CircleList, Command};
use crate::store::cache::EntityCache;

#[derive(Debug, Default)]
pub struct CircleStore {
    pub conversations: EntityCache<Conversation>,
    pub contacts: EntityCache<Contact>,
    pub circle_contacts: EntityCache<Contact>,
}

impl CircleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fetch for one list unless it is fresh or in flight.
    pub fn fetch(&mut self, list: CircleList, force: bool) -> Option<Command> {
        let issue = match list {
            CircleList::Conversations => self.conversations.request(force),
            CircleList::Contacts => self.contacts.request(force),
            CircleList::CircleContacts => self.circle_contacts.request(force),
        };
        issue.then_some(Command::FetchCircle { list })
    }

    pub fn apply_conversations(&mut self, items: Vec<Conversation>) {
        self.conversations.apply(items);
    }

    pub fn apply_contacts(&mut self, list: CircleList, items: Vec<Contact>) {
        match list {
            CircleList::Contacts => self.contacts.apply(items),
            CircleList::CircleContacts => self.circle_contacts.apply(items),
            CircleList::Conversations => {
                tracing::debug!("contact payload tagged as conversations; dropped")
            }
        }
    }

    pub fn fetch_failed(&mut self, list: CircleList, error: String) {
        match list {
            CircleList::Conversations => self.conversations.fail(error),
            CircleList::Contacts => self.contacts.fail(error),
            CircleList::CircleContacts => self.circle_contacts.fail(error),
        }
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
        self.contacts.clear();
        self.circle_contacts.clear();
    }
}
