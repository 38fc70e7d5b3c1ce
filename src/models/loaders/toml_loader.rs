use crate::models::{Cadre, Designation, FacultyRecord};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 名册中的单个教师
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// 职称原文，如 "Assistant Professor"
    pub cadre: String,
    #[serde(default = "default_designation")]
    pub designation: String,
}

fn default_designation() -> String {
    "faculty".to_string()
}

/// 一个系的名册文件
#[derive(Debug, Clone, Deserialize)]
pub struct Roster {
    pub department: String,
    #[serde(default)]
    pub faculty: Vec<RosterEntry>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl Roster {
    /// 转换为初始考核记录，职称或层级无法识别的条目会被跳过
    pub fn into_records(self) -> Vec<FacultyRecord> {
        let department = self.department;
        self.faculty
            .into_iter()
            .filter_map(|entry| {
                let Some(cadre) = Cadre::find(&entry.cadre) else {
                    tracing::warn!("无法识别职称 '{}'，跳过教师 {}", entry.cadre, entry.id);
                    return None;
                };
                let Some(designation) = Designation::find(&entry.designation) else {
                    tracing::warn!(
                        "无法识别层级 '{}'，跳过教师 {}",
                        entry.designation,
                        entry.id
                    );
                    return None;
                };
                Some(FacultyRecord::new(
                    entry.id,
                    entry.name,
                    department.clone(),
                    cadre,
                    designation,
                ))
            })
            .collect()
    }
}

/// 从 TOML 文件加载一个系的名册
pub async fn load_roster_file(toml_file_path: &Path) -> Result<Roster> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取名册文件: {}", toml_file_path.display()))?;

    let mut roster: Roster = toml::from_str(&content)
        .with_context(|| format!("无法解析名册文件: {}", toml_file_path.display()))?;

    roster.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(roster)
}

/// 从文件夹中加载所有名册文件
///
/// 单个文件解析失败只记录警告，不影响其他系。
pub async fn load_all_roster_files(folder_path: &str) -> Result<Vec<Roster>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut rosters = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_roster_file(&path).await {
                Ok(roster) => {
                    tracing::info!(
                        "成功加载 {} 名教师 (系: {})",
                        roster.faculty.len(),
                        roster.department
                    );
                    rosters.push(roster);
                }
                Err(e) => {
                    tracing::warn!("加载文件失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(rosters)
}
