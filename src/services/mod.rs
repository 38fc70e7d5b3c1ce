pub mod assignment_graph;
pub mod audit_writer;
pub mod score_aggregator;

pub use assignment_graph::AssignmentGraph;
pub use audit_writer::{AuditEntry, AuditWriter};
pub use score_aggregator::ScoreBreakdown;
