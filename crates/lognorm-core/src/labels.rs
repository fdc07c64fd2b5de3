//! Standard label keys.
//!
//! Adapters must set at least [`SOURCE`], [`JOB_NAME`], [`JOB_TYPE`],
//! [`HOST_NAME`] and [`HOST_ID`]; the remaining keys are optional and feed
//! the container/agent/host/organization/service extraction steps.

pub const SOURCE: &str = "source";
pub const JOB_NAME: &str = "job_name";
pub const JOB_TYPE: &str = "job_type";
pub const HOST_NAME: &str = "host_name";
pub const HOST_ID: &str = "host_id";

pub const TASK_GROUP: &str = "task_group";
pub const TASK_NAME: &str = "task_name";

pub const CONTAINER_ID: &str = "container_id";
pub const CONTAINER_NAME: &str = "container_name";
pub const CONTAINER_IMAGE: &str = "container_image";

pub const SERVICE_NAME: &str = "service_name";
pub const SERVICE_VERSION: &str = "service_version";
pub const SERVICE_ENVIRONMENT: &str = "service_environment";

pub const ORGANIZATION_ID: &str = "organization_id";
pub const ORGANIZATION_NAME: &str = "organization_name";

pub const AGENT_NAME: &str = "agent_name";
pub const AGENT_VERSION: &str = "agent_version";

/// Stamped by the structured passthrough strategy with its own name.
pub const USED_PATTERN: &str = "used_pattern";

/// Labels every adapter must provide.
pub const REQUIRED: [&str; 5] = [SOURCE, JOB_NAME, JOB_TYPE, HOST_NAME, HOST_ID];

/// Placeholder for required values nobody could supply.
pub const UNKNOWN: &str = "unknown";
