/// Users currently editing a document.
///
/// Always the latest JOIN/LEAVE snapshot from the server, never accumulated
/// locally. A stale snapshot delivered late wins until the next one arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    members: Vec<String>,
}

impl Presence {
    /// Replace the whole set from a comma-joined member list
    pub fn replace_from(&mut self, joined: &str) {
        self.members = joined
            .split(',')
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
