//! Error types shared across resolution, diffing and mounting.
//!
//! Hook order violations and identity key collisions are programmer errors and
//! abort the operation that found them. Render failures are isolated per
//! subtree and bundled into [`ResolutionErrors`]. Bind failures are retried
//! once by the mount coordinator before they surface as [`MountError`].

use std::fmt;

use thiserror::Error;

use crate::component::ViewType;
use crate::hooks::HookKind;
use crate::node::ComponentPath;

#[derive(Debug, Clone, Error)]
pub enum LithoError {
    #[error(transparent)]
    HookOrderViolation(#[from] HookOrderViolation),
    #[error("identity key collision: {key} appears more than once in the {side} list")]
    IdentityKeyCollision { key: String, side: &'static str },
    #[error(transparent)]
    Resolution(#[from] ResolutionErrors),
    #[error(transparent)]
    Mount(#[from] MountError),
    #[error("resolution pass {generation} was superseded by a newer request")]
    Cancelled { generation: u64 },
    #[error("component tree has no root component")]
    NoRoot,
}

impl LithoError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LithoError::Cancelled { .. })
    }
}

/// Hooks were called in a different order or number than in the previous
/// render of the same component instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hook order violation in {path}: {detail}")]
pub struct HookOrderViolation {
    pub path: ComponentPath,
    pub detail: HookOrderDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOrderDetail {
    KindMismatch {
        index: usize,
        expected: HookKind,
        found: HookKind,
    },
    TypeMismatch {
        index: usize,
        expected: &'static str,
    },
    CountMismatch {
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for HookOrderDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOrderDetail::KindMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "hook #{index} was {expected} in the previous render but is now {found}"
            ),
            HookOrderDetail::TypeMismatch { index, expected } => {
                write!(f, "hook #{index} no longer holds a value of type {expected}")
            }
            HookOrderDetail::CountMismatch { expected, actual } => write!(
                f,
                "previous render called {expected} hook(s), this render called {actual}"
            ),
        }
    }
}

/// Error returned from [`Component::render`](crate::Component::render).
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    HookOrder(#[from] HookOrderViolation),
}

impl RenderError {
    pub fn msg(message: impl Into<String>) -> Self {
        RenderError::Failed(message.into())
    }
}

/// A single component whose render failed. Its subtree was dropped from the
/// resolved tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub path: ComponentPath,
    pub component: &'static str,
    pub message: String,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.component, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionErrors {
    pub failures: Vec<ResolutionFailure>,
}

impl ResolutionErrors {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolutionFailure> {
        self.failures.iter()
    }

    pub(crate) fn push(&mut self, failure: ResolutionFailure) {
        self.failures.push(failure);
    }

    pub(crate) fn extend(&mut self, other: ResolutionErrors) {
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for ResolutionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} component(s) failed to render", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionErrors {}

/// Failure reported by a [`MountHost`](crate::MountHost).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("failed to create a {view_type} view for {key}: {source}")]
    CreateFailed {
        key: String,
        view_type: ViewType,
        source: HostError,
    },
    #[error("failed to bind {key} to a {view_type} view after retrying: {source}")]
    BindFailed {
        key: String,
        view_type: ViewType,
        source: HostError,
    },
}

impl MountError {
    pub fn key(&self) -> &str {
        match self {
            MountError::CreateFailed { key, .. } | MountError::BindFailed { key, .. } => key,
        }
    }
}
