//! Application services for task lifecycle orchestration.

mod conversation;
mod dispatch;
mod lifecycle;
mod statistics;

pub use conversation::{ConversationFlow, ConversationFlowError, ConversationFlowResult};
pub use dispatch::{
    DispatchError, DispatchOutcome, DispatchResult, ParseTaskActionError, TaskAction,
    TaskActionDispatcher, TaskActionRequest,
};
pub use lifecycle::{
    CreateTaskRequest, FailureKind, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService, TransitionTaskRequest,
};
pub use statistics::{ChatStatistics, format_duration};
