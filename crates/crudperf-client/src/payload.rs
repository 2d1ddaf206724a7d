//! Random request bodies for the todo and project endpoints.

use crudperf_core::ObjectType;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

const TITLE_LEN: usize = 10;
const DESCRIPTION_LEN: usize = 20;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    pub title: String,
    pub description: String,
    pub done_status: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectPayload {
    pub title: String,
    pub description: String,
    pub active: bool,
    pub completed: bool,
}

impl TodoPayload {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            title: format!("Performance Test {}", random_string(rng, TITLE_LEN)),
            description: format!("Description {}", random_string(rng, DESCRIPTION_LEN)),
            done_status: rng.gen(),
        }
    }

    pub fn random_update<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            title: format!("Updated {}", random_string(rng, TITLE_LEN)),
            description: format!("Updated description {}", random_string(rng, DESCRIPTION_LEN)),
            done_status: rng.gen(),
        }
    }
}

impl ProjectPayload {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            title: format!("Performance Test {}", random_string(rng, TITLE_LEN)),
            description: format!("Description {}", random_string(rng, DESCRIPTION_LEN)),
            active: rng.gen(),
            completed: rng.gen(),
        }
    }

    pub fn random_update<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            title: format!("Updated {}", random_string(rng, TITLE_LEN)),
            description: format!("Updated description {}", random_string(rng, DESCRIPTION_LEN)),
            active: rng.gen(),
            completed: rng.gen(),
        }
    }
}

/// Request body of either object type.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Payload {
    Todo(TodoPayload),
    Project(ProjectPayload),
}

impl Payload {
    /// Body for a create request.
    pub fn create(object_type: ObjectType) -> Self {
        let mut rng = rand::thread_rng();
        match object_type {
            ObjectType::Todo => Self::Todo(TodoPayload::random(&mut rng)),
            ObjectType::Project => Self::Project(ProjectPayload::random(&mut rng)),
        }
    }

    /// Body for an update request.
    pub fn update(object_type: ObjectType) -> Self {
        let mut rng = rand::thread_rng();
        match object_type {
            ObjectType::Todo => Self::Todo(TodoPayload::random_update(&mut rng)),
            ObjectType::Project => Self::Project(ProjectPayload::random_update(&mut rng)),
        }
    }
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}
