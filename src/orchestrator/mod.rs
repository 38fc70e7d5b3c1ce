//! 编排层：把状态机、分数规则、分配关系与记录存储串成完整的考核流程

pub mod workflow_service;

pub use workflow_service::{
    AuthorityMarks, ClaimedMarks, CommitteeQueueView, ExternalAssignmentView, InteractionInput,
    Outcome, PortfolioInput, StatusView, TotalMarksView, WorkflowService,
};
