use serde::{Deserialize, Serialize};

/// 考核记录状态
///
/// 所有状态判断都基于这个封闭枚举，转移规则集中在
/// `workflow::status_machine` 的转移表里。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// 教师填写自评中
    #[default]
    Pending,
    /// 等待核查委员会核查 B 类
    VerificationPending,
    /// 等待系主任确认
    AuthorityVerificationPending,
    /// 等待互动评价
    InteractionPending,
    /// 等待系主任给档案打分
    PortfolioMarkPending,
    /// 等待院长给档案打分
    PortfolioMarkDeanPending,
    /// 已提交校长审批
    SentToDirector,
    /// 已冻结
    Done,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Pending,
        Status::VerificationPending,
        Status::AuthorityVerificationPending,
        Status::InteractionPending,
        Status::PortfolioMarkPending,
        Status::PortfolioMarkDeanPending,
        Status::SentToDirector,
        Status::Done,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done)
    }

    /// 教师已提交且尚未冻结、也未上报校长
    pub fn is_in_review_chain(self) -> bool {
        matches!(
            self,
            Status::VerificationPending
                | Status::AuthorityVerificationPending
                | Status::InteractionPending
                | Status::PortfolioMarkPending
                | Status::PortfolioMarkDeanPending
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::VerificationPending => "VerificationPending",
            Status::AuthorityVerificationPending => "AuthorityVerificationPending",
            Status::InteractionPending => "InteractionPending",
            Status::PortfolioMarkPending => "PortfolioMarkPending",
            Status::PortfolioMarkDeanPending => "PortfolioMarkDeanPending",
            Status::SentToDirector => "SentToDirector",
            Status::Done => "Done",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
