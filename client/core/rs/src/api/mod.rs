/// Proxied assistant operations. [CodeopenAssistantRequest][assistant::CodeopenAssistantRequest]
pub mod assistant;
/// Lifecycle operations. [CodeopenExecuteRequest][execute::CodeopenExecuteRequest]
pub mod execute;
/// Read operations. [CodeopenReadRequest][read::CodeopenReadRequest]
pub mod read;
/// Write operations. [CodeopenWriteRequest][write::CodeopenWriteRequest]
pub mod write;
