use serde::{Deserialize, Serialize};

/// 职称（Cadre），决定 A/B/C 类的分数上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cadre {
    /// 教授
    Professor,
    /// 副教授
    AssociateProfessor,
    /// 助理教授
    AssistantProfessor,
}

impl Cadre {
    pub const ALL: [Cadre; 3] = [
        Cadre::Professor,
        Cadre::AssociateProfessor,
        Cadre::AssistantProfessor,
    ];

    /// 在上限表中的列下标
    pub fn index(self) -> usize {
        match self {
            Cadre::Professor => 0,
            Cadre::AssociateProfessor => 1,
            Cadre::AssistantProfessor => 2,
        }
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Cadre::Professor => "Professor",
            Cadre::AssociateProfessor => "Associate Professor",
            Cadre::AssistantProfessor => "Assistant Professor",
        }
    }

    /// 尝试从字符串解析职称（精确匹配）
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Professor" | "professor" | "Prof" => Some(Cadre::Professor),
            "AssociateProfessor" | "Associate Professor" | "associate" => {
                Some(Cadre::AssociateProfessor)
            }
            "AssistantProfessor" | "Assistant Professor" | "assistant" => {
                Some(Cadre::AssistantProfessor)
            }
            _ => None,
        }
    }

    /// 智能查找职称（支持模糊匹配）
    ///
    /// 名册里的写法五花八门（"Asst. Prof"、"assoc professor"……），
    /// 先精确匹配，再按关键字判断。
    pub fn find(s: &str) -> Option<Self> {
        if let Some(cadre) = Self::from_str(s.trim()) {
            return Some(cadre);
        }

        let s_lower = s.to_lowercase();
        if s_lower.contains("asst") || s_lower.contains("assistant") {
            return Some(Cadre::AssistantProfessor);
        }
        if s_lower.contains("assoc") {
            return Some(Cadre::AssociateProfessor);
        }
        if s_lower.contains("prof") {
            return Some(Cadre::Professor);
        }

        None
    }
}

impl std::fmt::Display for Cadre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 行政层级（Designation）
///
/// 决定由谁做互动评价，以及是否需要经过档案（D 类）上级评分阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Designation {
    /// 普通教师
    #[default]
    Faculty,
    /// 系主任
    Hod,
    /// 院长
    Dean,
}

impl Designation {
    pub fn find(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "faculty" => Some(Designation::Faculty),
            "hod" | "head" | "head of department" => Some(Designation::Hod),
            "dean" => Some(Designation::Dean),
            _ => None,
        }
    }

    /// 该层级是否需要档案上级评分（系主任 / 院长）
    pub fn needs_portfolio_marks(self) -> bool {
        !matches!(self, Designation::Faculty)
    }
}

impl std::fmt::Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Designation::Faculty => "Faculty",
            Designation::Hod => "HOD",
            Designation::Dean => "Dean",
        };
        write!(f, "{}", name)
    }
}
