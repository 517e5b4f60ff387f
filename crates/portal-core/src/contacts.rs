//! Contact availability with the soft-pressure depletion rule: repeated
//! selection of the same contact eventually makes it unavailable for the
//! rest of the session.

use std::fmt;

use contracts::{ContactKey, ContactSnapshot, ContactStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUnavailable {
    pub key: ContactKey,
}

impl fmt::Display for ContactUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not accepting further calls",
            self.key.display_name()
        )
    }
}

impl std::error::Error for ContactUnavailable {}

#[derive(Debug, Clone)]
struct ContactEntry {
    key: ContactKey,
    status: ContactStatus,
    contact_count: u32,
}

impl ContactEntry {
    fn snapshot(&self) -> ContactSnapshot {
        ContactSnapshot {
            key: self.key,
            display_name: self.key.display_name().to_string(),
            status: self.status,
            contact_count: self.contact_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactRegistry {
    patience: u32,
    entries: Vec<ContactEntry>,
}

impl ContactRegistry {
    pub fn new(patience: u32) -> Self {
        let entries = ContactKey::ALL
            .iter()
            .map(|key| ContactEntry {
                key: *key,
                status: ContactStatus::Available,
                contact_count: 0,
            })
            .collect();

        Self { patience, entries }
    }

    /// Select a contact as the active call target. Fails without any state
    /// change once the contact is UNAVAILABLE; otherwise increments the
    /// selection count and flips the contact to UNAVAILABLE when the count
    /// reaches the patience threshold.
    pub fn select(&mut self, key: ContactKey) -> Result<ContactSnapshot, ContactUnavailable> {
        let patience = self.patience;
        let entry = self.entry_mut(key);

        if entry.status == ContactStatus::Unavailable {
            return Err(ContactUnavailable { key });
        }

        entry.contact_count += 1;
        if entry.contact_count >= patience {
            entry.status = ContactStatus::Unavailable;
        }

        Ok(entry.snapshot())
    }

    pub fn status(&self, key: ContactKey) -> ContactStatus {
        self.entry(key).status
    }

    pub fn contact_count(&self, key: ContactKey) -> u32 {
        self.entry(key).contact_count
    }

    pub fn snapshots(&self) -> Vec<ContactSnapshot> {
        self.entries.iter().map(ContactEntry::snapshot).collect()
    }

    pub fn available_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == ContactStatus::Available)
            .count()
    }

    /// Restore every contact to AVAILABLE with a zero count. Full case reset
    /// only.
    pub fn reset_all(&mut self) {
        for entry in &mut self.entries {
            entry.status = ContactStatus::Available;
            entry.contact_count = 0;
        }
    }

    fn entry(&self, key: ContactKey) -> &ContactEntry {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .expect("registry holds every contact key")
    }

    fn entry_mut(&mut self, key: ContactKey) -> &mut ContactEntry {
        self.entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .expect("registry holds every contact key")
    }
}
