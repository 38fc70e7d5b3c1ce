use serde::{Deserialize, Serialize};

/// 参与考核流程的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// 被考核教师本人
    Faculty,
    /// 同行核查委员会成员
    CommitteeMember,
    /// 系主任
    Hod,
    /// 院长
    Dean,
    /// 外部评审
    ExternalReviewer,
    /// 校长 / 主任
    Director,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Faculty,
        Role::CommitteeMember,
        Role::Hod,
        Role::Dean,
        Role::ExternalReviewer,
        Role::Director,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Faculty => "faculty",
            Role::CommitteeMember => "committee",
            Role::Hod => "hod",
            Role::Dean => "dean",
            Role::ExternalReviewer => "external",
            Role::Director => "director",
        }
    }

    /// 从请求头里的角色名解析（不区分大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "faculty" => Some(Role::Faculty),
            "committee" | "committee_member" | "verification_committee" => {
                Some(Role::CommitteeMember)
            }
            "hod" => Some(Role::Hod),
            "dean" => Some(Role::Dean),
            "external" | "external_reviewer" => Some(Role::ExternalReviewer),
            "director" => Some(Role::Director),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
