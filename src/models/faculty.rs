use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Cadre, Category, Designation, Role, Status};

/// 分数类型
pub type Marks = f64;

/// 单个类别的分数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    /// 教师自评分，仅在 Pending 状态下可写
    pub claimed: Option<Marks>,
    /// 核查后的分数，覆盖自评分
    pub verified: Option<Marks>,
}

impl SectionScore {
    /// 参与汇总的分数：有核查分用核查分，否则用自评分
    pub fn effective(&self) -> Option<Marks> {
        self.verified.or(self.claimed)
    }
}

/// 档案上级评分的适用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioType {
    /// 只有院级评分
    Institute,
    /// 只有系级评分
    Department,
    /// 院级、系级都评，取平均
    #[default]
    Both,
}

impl PortfolioType {
    pub fn needs_department(self) -> bool {
        matches!(self, PortfolioType::Department | PortfolioType::Both)
    }

    pub fn needs_institute(self) -> bool {
        matches!(self, PortfolioType::Institute | PortfolioType::Both)
    }
}

/// D 类（档案）明细
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDetail {
    /// 自评分（≤60）
    pub self_awarded: Option<Marks>,
    #[serde(rename = "type")]
    pub portfolio_type: PortfolioType,
    /// 院级评分（院长，行政岗则由校长给出）
    pub institute_marks: Option<Marks>,
    /// 系级评分（系主任）
    pub department_marks: Option<Marks>,
    /// 是否担任行政职务
    pub administrative_role: bool,
}

impl PortfolioDetail {
    /// 给院级评分的角色
    pub fn institute_marker(&self) -> Role {
        if self.administrative_role {
            Role::Director
        } else {
            Role::Dean
        }
    }
}

/// 互动评价（六项，总分 100）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionScore {
    pub evaluator_id: String,
    pub evaluator_role: Role,
    pub knowledge: Marks,
    pub skills: Marks,
    pub attributes: Marks,
    pub outcomes_initiatives: Marks,
    pub self_branching: Marks,
    pub team_performance: Marks,
}

impl InteractionScore {
    /// (名称, 分数) 列表，便于逐项校验
    pub fn criteria(&self) -> [(&'static str, Marks); 6] {
        [
            ("knowledge", self.knowledge),
            ("skills", self.skills),
            ("attributes", self.attributes),
            ("outcomesInitiatives", self.outcomes_initiatives),
            ("selfBranching", self.self_branching),
            ("teamPerformance", self.team_performance),
        ]
    }
}

/// 教师考核记录
///
/// 只能由 WorkflowService 通过状态转移修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyRecord {
    pub faculty_id: String,
    pub name: String,
    pub department: String,
    pub cadre: Cadre,
    pub designation: Designation,
    pub status: Status,
    pub sections: BTreeMap<Category, SectionScore>,
    pub portfolio: PortfolioDetail,
    /// 按评价人 ID 存放
    pub interactions: BTreeMap<String, InteractionScore>,
    /// 系主任确认时记录的核查总分
    pub authority_total: Option<Marks>,
    pub updated_at: DateTime<Utc>,
}

impl FacultyRecord {
    /// 新建入职记录：Pending 状态、所有分数为空
    pub fn new(
        faculty_id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
        cadre: Cadre,
        designation: Designation,
    ) -> Self {
        let sections = Category::ALL
            .iter()
            .map(|c| (*c, SectionScore::default()))
            .collect();
        Self {
            faculty_id: faculty_id.into(),
            name: name.into(),
            department: department.into(),
            cadre,
            designation,
            status: Status::Pending,
            sections,
            portfolio: PortfolioDetail::default(),
            interactions: BTreeMap::new(),
            authority_total: None,
            updated_at: Utc::now(),
        }
    }

    pub fn section(&self, category: Category) -> SectionScore {
        self.sections.get(&category).copied().unwrap_or_default()
    }

    pub fn section_mut(&mut self, category: Category) -> &mut SectionScore {
        self.sections.entry(category).or_default()
    }

    /// 是否已有某角色写过互动评价
    pub fn has_interaction_from_role(&self, role: Role) -> bool {
        self.interactions.values().any(|s| s.evaluator_role == role)
    }
}
