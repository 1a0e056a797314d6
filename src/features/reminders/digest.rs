//! Per-owner grouping of due tasks

use crate::core::model::{Task, UserContact};
use std::collections::HashMap;

/// Tasks for one owner, before we know whether and where to send them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCandidate {
    pub owner: String,
    pub tasks: Vec<Task>,
}

/// A resolved digest: who gets it and which tasks it lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDigest {
    pub owner: String,
    pub display_name: String,
    pub email: String,
    pub tasks: Vec<Task>,
}

impl ReminderDigest {
    pub fn new(candidate: DigestCandidate, contact: UserContact) -> Self {
        ReminderDigest {
            owner: candidate.owner,
            display_name: contact.display_name,
            email: contact.email,
            tasks: candidate.tasks,
        }
    }
}

/// Partition tasks by owner.
///
/// Owners appear in order of their first task; each owner's tasks keep the
/// order they were fetched in.
pub fn group_by_owner(tasks: Vec<Task>) -> Vec<DigestCandidate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DigestCandidate> = Vec::new();

    for task in tasks {
        match index.get(&task.owner) {
            Some(&i) => groups[i].tasks.push(task),
            None => {
                index.insert(task.owner.clone(), groups.len());
                groups.push(DigestCandidate {
                    owner: task.owner.clone(),
                    tasks: vec![task],
                });
            }
        }
    }

    groups
}
