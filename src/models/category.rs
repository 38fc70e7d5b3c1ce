use serde::{Deserialize, Serialize};

/// 考核类别 A–E
///
/// A/B/C 的上限随职称变化，D（档案）和 E 固定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    C,
    D,
    E,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::A,
        Category::B,
        Category::C,
        Category::D,
        Category::E,
    ];

    /// 提交时必须填写自评分的类别（D 通过档案单独填写）
    pub const CLAIMED_ON_SUBMIT: [Category; 4] =
        [Category::A, Category::B, Category::C, Category::E];

    pub fn code(self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
            Category::D => "D",
            Category::E => "E",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
