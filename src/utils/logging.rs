/// 日志工具模块
///
/// 启动、名册加载等阶段的横幅输出
use tracing::{info, warn};

use crate::config::Config;

/// 记录服务启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 教师考核流程服务启动");
    info!("🌐 监听地址: {}", config.listen_addr);
    info!("📁 名册目录: {}", config.roster_folder);
    info!("📝 审计日志: {}", config.audit_log_file);
    info!("{}", "=".repeat(60));
}

/// 记录名册加载结果
///
/// # 参数
/// - `departments`: 加载到的系数量
/// - `onboarded`: 成功入职的记录数
/// - `rejected`: 被拒绝（如 ID 重复）的记录数
pub fn log_roster_loaded(departments: usize, onboarded: usize, rejected: usize) {
    if departments == 0 {
        warn!("⚠️ 没有找到名册文件，服务将以空记录启动");
        return;
    }
    info!("✓ 加载 {} 个系的名册", departments);
    info!("📋 入职记录: {} 条", onboarded);
    if rejected > 0 {
        warn!("⚠️ 跳过 {} 条记录（ID 重复）", rejected);
    }
}

/// 记录服务停止
pub fn log_shutdown() {
    info!("\n{}", "─".repeat(60));
    info!("👋 收到停止信号，服务退出");
    info!("{}", "─".repeat(60));
}
