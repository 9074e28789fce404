pub mod audit;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod error;
pub mod report;

pub use audit::Recommendation;
pub use capability::{Capability, CapabilityStatus, CapabilityType};
pub use config::AuditConfig;
pub use error::AuditError;
pub use report::{
    generate_report, generate_report_at, generate_validated_report, AuditReport, TagGroupAnalysis,
};
