use std::{fmt::Display, future::Future, str::FromStr, time::Duration};

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::{course::UserId, error::CourseError, repository::RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

/// What an operation requires from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Manage courses and their curriculum.
    Author,
    /// Enroll and track progress.
    Learn,
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::Author => matches!(self, Role::Admin | Role::Instructor),
            Capability::Learn => true,
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        };
        f.write_str(name)
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Per-request data every use case receives: the caller, if any, and the
/// signals that stop work early.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    actor: Option<Actor>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_actor(actor: Actor) -> Self {
        Self::default().with_actor(Some(actor))
    }

    pub fn with_actor(mut self, actor: Option<Actor>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.actor
            .as_ref()
            .is_some_and(|actor| actor.role.can(capability))
    }

    pub fn require(&self, capability: Capability) -> Result<&Actor, CourseError> {
        let actor = self.actor.as_ref().ok_or(CourseError::Unauthenticated)?;
        if actor.role.can(capability) {
            Ok(actor)
        } else {
            Err(CourseError::Forbidden)
        }
    }

    /// Runs a store call unless the request is cancelled or its deadline passes first.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, CourseError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(CourseError::Cancelled { operation }),
                result = call => result.map_err(CourseError::store(operation)),
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| CourseError::Timeout { operation })?,
            None => guarded.await,
        }
    }
}
