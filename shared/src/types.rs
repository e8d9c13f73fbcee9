//! Process identity used to tag log output

use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

/// Global instance identity - set once at startup
static INSTANCE_ID: OnceLock<InstanceId> = OnceLock::new();

/// Identity of one running service instance
///
/// Several instances usually serve the same store at once, so every log
/// line carries the service name plus a random per-process suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId {
    service: String,
    run: Uuid,
}

impl InstanceId {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            run: Uuid::new_v4(),
        }
    }

    /// Initialize the global instance ID; later calls return the first value
    pub fn init(service: &str) -> &'static InstanceId {
        INSTANCE_ID.get_or_init(|| InstanceId::new(service))
    }

    /// Get the global instance ID, falling back to an anonymous one when
    /// `init` was never called (unit tests, library use)
    pub fn current() -> &'static InstanceId {
        INSTANCE_ID.get_or_init(|| InstanceId::new("order-kv"))
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// First eight hex digits of the run UUID
    pub fn short_run(&self) -> String {
        self.run.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.service, self.short_run())
    }
}
