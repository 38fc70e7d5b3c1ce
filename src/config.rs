/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 监听地址
    pub listen_addr: String,
    /// 名册 TOML 文件存放目录（每个系一个文件）
    pub roster_folder: String,
    /// 审计日志文件
    pub audit_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            roster_folder: "roster".to_string(),
            audit_log_file: "audit.log".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(default.listen_addr),
            roster_folder: std::env::var("ROSTER_FOLDER").unwrap_or(default.roster_folder),
            audit_log_file: std::env::var("AUDIT_LOG_FILE").unwrap_or(default.audit_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}
