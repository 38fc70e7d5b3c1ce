//! 分数汇总 - 业务能力层
//!
//! 纯函数：按职称上限截断各类别分数，合成档案分与总分。
//! 不持有任何状态，也不关心流程走到哪一步。
//!
//! 注意两个谓词的区别：
//! - 汇总时，缺失的分数按 0 计算；
//! - 转移就绪检查时，缺失的分数视为"未完成"（0 分是合法且完整的）。

use std::collections::BTreeMap;

use phf::phf_map;
use serde::Serialize;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{
    Cadre, Category, FacultyRecord, InteractionScore, Marks, PortfolioDetail, PortfolioType,
};

/// 总分上限，与行政级别无关
pub const GRAND_CEILING: Marks = 1000.0;
/// 档案（D 类）总分上限
pub const PORTFOLIO_CEILING: Marks = 120.0;
/// 档案自评分上限
pub const PORTFOLIO_SELF_CEILING: Marks = 60.0;
/// 档案单项上级评分上限
pub const PORTFOLIO_SUPERIOR_CEILING: Marks = 60.0;
/// E 类上限
pub const CATEGORY_E_CEILING: Marks = 50.0;
/// 互动评价总分上限
pub const INTERACTION_CEILING: Marks = 100.0;

/// A/B/C 类上限，列顺序：教授 / 副教授 / 助理教授
///
/// C 类与 A 类的排序相反：职称越低，自我发展类的权重越高。
static CADRE_CEILINGS: phf::Map<&'static str, [Marks; 3]> = phf_map! {
    "A" => [300.0, 360.0, 440.0],
    "B" => [370.0, 300.0, 210.0],
    "C" => [160.0, 170.0, 180.0],
};

/// 互动评价各项上限
static INTERACTION_CEILINGS: phf::Map<&'static str, Marks> = phf_map! {
    "knowledge" => 20.0,
    "skills" => 20.0,
    "attributes" => 10.0,
    "outcomesInitiatives" => 20.0,
    "selfBranching" => 10.0,
    "teamPerformance" => 20.0,
};

/// 类别上限
pub fn ceiling(category: Category, cadre: Cadre) -> Marks {
    match category {
        Category::D => PORTFOLIO_CEILING,
        Category::E => CATEGORY_E_CEILING,
        _ => CADRE_CEILINGS
            .get(category.code())
            .map(|row| row[cadre.index()])
            .unwrap_or(0.0),
    }
}

/// `min(上限, 分数)`，缺失按 0 计
pub fn section_total(category: Category, cadre: Cadre, value: Option<Marks>) -> Marks {
    value.unwrap_or(0.0).max(0.0).min(ceiling(category, cadre))
}

/// 档案上级评分部分
///
/// 两级都评时取平均；只评一级时直接使用该分数，不与不适用的 0 平均。
pub fn portfolio_superior(detail: &PortfolioDetail) -> Marks {
    let institute = detail.institute_marks.unwrap_or(0.0);
    let department = detail.department_marks.unwrap_or(0.0);
    match detail.portfolio_type {
        PortfolioType::Both => (institute + department) / 2.0,
        PortfolioType::Institute => institute,
        PortfolioType::Department => department,
    }
}

/// 档案总分 = min(120, 自评 + 上级评分)
pub fn portfolio_total(detail: &PortfolioDetail) -> Marks {
    let self_awarded = detail.self_awarded.unwrap_or(0.0);
    (self_awarded + portfolio_superior(detail)).min(PORTFOLIO_CEILING)
}

/// 单份互动评价的总分
pub fn interaction_total(score: &InteractionScore) -> Marks {
    score
        .criteria()
        .iter()
        .map(|(_, v)| *v)
        .sum::<Marks>()
        .min(INTERACTION_CEILING)
}

/// 计入总分的互动评价：所有已录入评价的平均分，没有评价时为 0
pub fn interaction_component(record: &FacultyRecord) -> Marks {
    if record.interactions.is_empty() {
        return 0.0;
    }
    let sum: Marks = record.interactions.values().map(interaction_total).sum();
    sum / record.interactions.len() as Marks
}

/// 总分 = min(1000, A..E + 互动评价)
pub fn grand_total(record: &FacultyRecord) -> Marks {
    breakdown(record).grand_total
}

/// 分数明细（读取投影）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub sections: BTreeMap<Category, Marks>,
    pub portfolio_total: Marks,
    pub interaction_total: Marks,
    pub grand_total: Marks,
}

/// 计算全部明细
pub fn breakdown(record: &FacultyRecord) -> ScoreBreakdown {
    let portfolio = portfolio_total(&record.portfolio);
    let sections: BTreeMap<Category, Marks> = Category::ALL
        .iter()
        .map(|&category| {
            let total = match category {
                Category::D => portfolio,
                _ => section_total(category, record.cadre, record.section(category).effective()),
            };
            (category, total)
        })
        .collect();

    let interaction = interaction_component(record);
    let grand = (sections.values().sum::<Marks>() + interaction).min(GRAND_CEILING);

    ScoreBreakdown {
        sections,
        portfolio_total: portfolio,
        interaction_total: interaction,
        grand_total: grand,
    }
}

// ========== 写入前校验 ==========

/// 校验单个分数：必须是非负有限数且不超过上限
pub fn check_marks(field: &str, value: Marks, ceiling: Marks) -> WorkflowResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(WorkflowError::NegativeMarks {
            field: field.to_string(),
            value,
        });
    }
    if value > ceiling {
        return Err(WorkflowError::CeilingExceeded {
            field: field.to_string(),
            value,
            ceiling,
        });
    }
    Ok(())
}

/// 校验自评分；D 类的自评部分上限为 60
pub fn check_claim(category: Category, cadre: Cadre, value: Marks) -> WorkflowResult<()> {
    let cap = match category {
        Category::D => PORTFOLIO_SELF_CEILING,
        _ => ceiling(category, cadre),
    };
    check_marks(category.code(), value, cap)
}

/// 校验档案上级评分
pub fn check_portfolio_mark(field: &str, value: Marks) -> WorkflowResult<()> {
    check_marks(field, value, PORTFOLIO_SUPERIOR_CEILING)
}

/// 逐项校验互动评价
pub fn check_interaction(score: &InteractionScore) -> WorkflowResult<()> {
    for (name, value) in score.criteria() {
        let cap = INTERACTION_CEILINGS.get(name).copied().unwrap_or(0.0);
        check_marks(name, value, cap)?;
    }
    Ok(())
}
