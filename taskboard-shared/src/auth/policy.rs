/// Ownership policy
///
/// Decides whether a principal may perform an action on a target entity.
/// The rules are fixed and flat:
///
/// | Action                                   | Allowed when                         |
/// |------------------------------------------|--------------------------------------|
/// | home, user list, user create (register)  | always                               |
/// | user update, user delete                 | authenticated and target is self     |
/// | task delete                              | authenticated and principal authored |
/// | everything else                          | authenticated                        |
///
/// A denial is not a fault: [`AuthzError`] carries the notice to show and the
/// route to redirect to, and handlers convert it into a redirect.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::policy::{authorize, Action, EntityKind, Operation, Target};
/// use taskboard_shared::auth::principal::Principal;
///
/// let john = Principal::user(1, "john");
/// let delete_task = Action::new(EntityKind::Task, Operation::Delete);
///
/// assert!(authorize(&john, delete_task, Target::Task { author_id: 1 }).is_ok());
/// assert!(authorize(&john, delete_task, Target::Task { author_id: 2 }).is_err());
/// ```

use serde::Serialize;

use super::principal::Principal;

/// Route of the user list
pub const USERS_LIST_ROUTE: &str = "/users/";

/// Route of the task list
pub const TASKS_LIST_ROUTE: &str = "/tasks/";

/// Route of the login form
pub const LOGIN_ROUTE: &str = "/login/";

/// Kind of entity an action applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// The landing page; not an entity but routed the same way
    Home,
    User,
    Status,
    Label,
    Task,
}

/// What is being done to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    List,
    View,
    Create,
    Update,
    Delete,
}

/// An (entity kind, operation) pair, e.g. `task.delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: EntityKind,
    pub operation: Operation,
}

impl Action {
    pub const fn new(kind: EntityKind, operation: Operation) -> Self {
        Self { kind, operation }
    }

    /// True for actions anyone may perform
    pub fn is_public(&self) -> bool {
        matches!(
            (self.kind, self.operation),
            (EntityKind::Home, _)
                | (EntityKind::User, Operation::List)
                | (EntityKind::User, Operation::Create)
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            EntityKind::Home => "home",
            EntityKind::User => "user",
            EntityKind::Status => "status",
            EntityKind::Label => "label",
            EntityKind::Task => "task",
        };
        let operation = match self.operation {
            Operation::List => "list",
            Operation::View => "view",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        write!(f, "{}.{}", kind, operation)
    }
}

/// The facts about the target entity the policy needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// No specific entity (lists, creation)
    None,

    /// A user account
    User { id: i64 },

    /// A task and its author
    Task { author_id: i64 },

    /// A status or label; ownership never matters for these
    Shared,
}

/// Reasons an action is denied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No authenticated principal
    #[error("authentication required")]
    AuthenticationRequired,

    /// Principal tried to change another user's account
    #[error("permission denied: not self")]
    NotSelf,

    /// Principal tried to delete a task they didn't author
    #[error("permission denied: not author")]
    NotAuthor,
}

impl AuthzError {
    /// Notice shown to the user
    pub fn notice(&self) -> &'static str {
        match self {
            AuthzError::AuthenticationRequired => "You are not logged in! Please log in.",
            AuthzError::NotSelf => "You can modify only your own account.",
            AuthzError::NotAuthor => "You can delete only your own task.",
        }
    }

    /// Route the denied request is redirected to
    pub fn redirect_to(&self) -> &'static str {
        match self {
            AuthzError::AuthenticationRequired => LOGIN_ROUTE,
            AuthzError::NotSelf => USERS_LIST_ROUTE,
            AuthzError::NotAuthor => TASKS_LIST_ROUTE,
        }
    }
}

/// Authorizes `action` on `target` for `principal`
///
/// # Errors
///
/// - `AuthenticationRequired` for any non-public action by an anonymous principal
/// - `NotSelf` for user update/delete of another account
/// - `NotAuthor` for deleting someone else's task
pub fn authorize(principal: &Principal, action: Action, target: Target) -> Result<(), AuthzError> {
    if action.is_public() {
        return Ok(());
    }

    let user_id = principal
        .user_id()
        .ok_or(AuthzError::AuthenticationRequired)?;

    match (action.kind, action.operation, target) {
        (EntityKind::User, Operation::Update | Operation::Delete, Target::User { id }) => {
            require_self(user_id, id)
        }
        (EntityKind::User, Operation::Update | Operation::Delete, _) => Err(AuthzError::NotSelf),
        (EntityKind::Task, Operation::Delete, Target::Task { author_id }) => {
            require_author(user_id, author_id)
        }
        (EntityKind::Task, Operation::Delete, _) => Err(AuthzError::NotAuthor),
        _ => Ok(()),
    }
}

/// Checks that the acting user is the target account
pub fn require_self(user_id: i64, target_user_id: i64) -> Result<(), AuthzError> {
    if user_id != target_user_id {
        return Err(AuthzError::NotSelf);
    }

    Ok(())
}

/// Checks that the acting user authored the task
pub fn require_author(user_id: i64, author_id: i64) -> Result<(), AuthzError> {
    if user_id != author_id {
        return Err(AuthzError::NotAuthor);
    }

    Ok(())
}
