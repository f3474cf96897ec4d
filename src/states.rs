//! Resource state labels and poll templates.
//!
//! The control plane reports convergence through a small set of state
//! labels shared by almost every resource kind, plus task labels for
//! in-flight volume sub-operations. The pending/target sets consumed by the
//! waiter live here in one lookup keyed by resource kind and operation,
//! so drivers never carry their own label literals.

use std::fmt;

/// Label of a resource queued for creation.
pub const STATE_TO_CREATE: &str = "ToCreate";

/// Label of a resource being created.
pub const STATE_CREATING: &str = "Creating";

/// Label of a fully created resource.
pub const STATE_CREATED: &str = "Created";

/// Label of a resource queued for deletion.
pub const STATE_TO_DELETE: &str = "ToDelete";

/// Label of a resource being deleted.
pub const STATE_DELETING: &str = "Deleting";

/// Terminal label of a deleted resource.
///
/// Reached either through an explicit state report or through the waiter's
/// absence short-circuit when the control plane has already forgotten the
/// resource.
pub const STATE_DELETED: &str = "Deleted";

/// Task label of a volume being attached.
pub const TASK_ATTACHING: &str = "ATTACHING";

/// Task label of a volume being detached.
pub const TASK_DETACHING: &str = "DETACHING";

/// Task label of a volume being grown.
pub const TASK_GROWING: &str = "GROWING";

/// Task label of a volume at rest (no sub-operation in flight).
pub const TASK_NONE: &str = "";

/// The resource kinds managed by this plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A datacenter region.
    Region,
    /// A zone within a region.
    Zone,
    /// A layer-2 network.
    Network,
    /// A machine image.
    Image,
    /// An SSH keypair.
    Keypair,
    /// An instance size preset.
    Flavor,
    /// A compute instance.
    Instance,
    /// A block storage volume.
    Volume,
    /// An IAM project.
    Project,
    /// An IAM role (system or project scope).
    Role,
    /// An IAM service account (system or project scope).
    ServiceAccount,
}

impl ResourceKind {
    /// Returns the kind name used in identifiers, logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Zone => "zone",
            Self::Network => "network",
            Self::Image => "image",
            Self::Keypair => "keypair",
            Self::Flavor => "flavor",
            Self::Instance => "instance",
            Self::Volume => "volume",
            Self::Project => "project",
            Self::Role => "role",
            Self::ServiceAccount => "service account",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle operations that poll for convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Waiting for a freshly created resource to become ready.
    Create,
    /// Waiting for a deleted resource to disappear.
    Delete,
}

/// Volume sub-operations tracked through the `task` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Attaching the volume to an instance.
    Attach,
    /// Detaching the volume from its instance.
    Detach,
    /// Growing the volume.
    Grow,
}

/// The pending/target label sets for one poll.
#[derive(Debug, Clone, Copy)]
pub struct PollTemplate {
    /// Labels considered "still converging"; safe to re-poll.
    pub pending: &'static [&'static str],
    /// Labels considered "operation complete".
    pub target: &'static [&'static str],
}

/// Looks up the poll template for a lifecycle operation on a resource kind.
///
/// Projects rest in `Created` while the control plane tears them down, so
/// their deletion poll treats `Created` as pending; every other kind moves
/// through the shared `ToCreate`/`Creating` and `ToDelete`/`Deleting`
/// ladders.
#[must_use]
pub const fn poll_template(kind: ResourceKind, operation: Operation) -> PollTemplate {
    match (kind, operation) {
        (ResourceKind::Project, Operation::Delete) => PollTemplate {
            pending: &[STATE_CREATED],
            target: &[STATE_DELETED],
        },
        (_, Operation::Create) => PollTemplate {
            pending: &[STATE_TO_CREATE, STATE_CREATING],
            target: &[STATE_CREATED],
        },
        (_, Operation::Delete) => PollTemplate {
            pending: &[STATE_TO_DELETE, STATE_DELETING],
            target: &[STATE_DELETED],
        },
    }
}

/// Looks up the poll template for a volume sub-operation.
///
/// The target is the empty task label: the sub-operation is finished once
/// the control plane clears the `task` field.
#[must_use]
pub const fn task_template(action: TaskAction) -> PollTemplate {
    let pending: &'static [&'static str] = match action {
        TaskAction::Attach => &[TASK_ATTACHING],
        TaskAction::Detach => &[TASK_DETACHING],
        TaskAction::Grow => &[TASK_GROWING],
    };
    PollTemplate {
        pending,
        target: &[TASK_NONE],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_template_is_shared() {
        let volume = poll_template(ResourceKind::Volume, Operation::Create);
        assert_eq!(volume.pending, &[STATE_TO_CREATE, STATE_CREATING]);
        assert_eq!(volume.target, &[STATE_CREATED]);

        let instance = poll_template(ResourceKind::Instance, Operation::Create);
        assert_eq!(instance.pending, volume.pending);
    }

    #[test]
    fn test_project_delete_pends_on_created() {
        let template = poll_template(ResourceKind::Project, Operation::Delete);
        assert_eq!(template.pending, &[STATE_CREATED]);
        assert_eq!(template.target, &[STATE_DELETED]);
    }

    #[test]
    fn test_task_templates_target_rest_state() {
        let detach = task_template(TaskAction::Detach);
        assert_eq!(detach.pending, &[TASK_DETACHING]);
        assert_eq!(detach.target, &[TASK_NONE]);

        let grow = task_template(TaskAction::Grow);
        assert_eq!(grow.pending, &[TASK_GROWING]);
    }
}
