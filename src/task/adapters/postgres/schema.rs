//! Diesel schema for task persistence.

diesel::table! {
    /// One record per task.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Owning chat.
        chat_id -> Int8,
        /// Per-chat display number.
        task_number -> Int8,
        /// Free-text description.
        text -> Text,
        /// Creator display identity.
        #[max_length = 255]
        created_by -> Varchar,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Assignee display identity.
        #[max_length = 255]
        assigned_to -> Nullable<Varchar>,
        /// Optional due date.
        deadline -> Nullable<Date>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Start of the current in-progress interval.
        in_progress_at -> Nullable<Timestamptz>,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Seconds spent in progress over closed intervals.
        accumulated_time_seconds -> Int8,
        /// Star rating between 1 and 5.
        rating -> Nullable<Int2>,
        /// Comment objects in insertion order.
        comments -> Jsonb,
        /// Optimistic-concurrency revision.
        revision -> Int8,
    }
}

diesel::table! {
    /// Per-chat task numbering counters.
    chat_counters (chat_id) {
        /// Chat owning the counter.
        chat_id -> Int8,
        /// Last number handed out.
        count -> Int8,
    }
}

diesel::table! {
    /// Interaction state of multi-step chat flows.
    conversation_states (conversation_key) {
        /// User or chat identifier.
        conversation_key -> Int8,
        /// Interaction mode tag.
        #[max_length = 64]
        mode -> Varchar,
        /// Auxiliary data map.
        data -> Jsonb,
    }
}
