//! # Faculty Appraisal
//!
//! 高校教师年度考核流程引擎
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 领域模型（Models）
//! - `models/` - 职称、层级、角色、类别、状态与考核记录
//! - `models/loaders` - 从 TOML 名册加载初始记录
//!
//! ### ② 基础设施层（Infrastructure）
//! - `RecordStore` - 唯一的记录持有者，每条记录一把锁
//! - `RecordPersister` - 可替换的持久化协作方
//!
//! ### ③ 业务能力层（Services）
//! - `score_aggregator` - 分数上限与总分计算
//! - `AssignmentGraph` - 外部评审 / 院长 / 核查委员的分配关系
//! - `AuditWriter` - 写审计日志
//!
//! ### ④ 流程层（Workflow）
//! - `StatusMachine` - 状态 × 动作 × 角色的转移表与就绪检查
//! - `ActorCtx` - 操作者上下文
//!
//! ### ⑤ 编排层（Orchestration）
//! - `WorkflowService` - 授权 → 写入 → 推进 → 持久化，一次完成
//!
//! ### ⑥ 接口层（API）
//! - `api/` - 每个流程动作一个 HTTP 端点
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{WorkflowError, WorkflowResult};
pub use models::{Cadre, Category, Designation, FacultyRecord, Role, Status};
pub use orchestrator::{Outcome, WorkflowService};
pub use workflow::{Action, ActorCtx};
