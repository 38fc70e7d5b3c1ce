//! 评审分配关系 - 业务能力层
//!
//! 维护三种关系：
//! - 外部评审 → 教师集合（一个教师最多属于一个外部评审）
//! - 外部评审 → 院长（一对一；绑定院长后，批量分配被锁定）
//! - 核查委员会成员 → 教师集合（同一系内，一个教师最多属于一个成员）
//!
//! 本结构本身不加锁，并发控制由 WorkflowService 持有的 RwLock 负责。

use std::collections::{BTreeSet, HashMap};

use crate::error::{WorkflowError, WorkflowResult};

/// 评审分配图
#[derive(Debug, Default, Clone)]
pub struct AssignmentGraph {
    external_faculty: HashMap<String, BTreeSet<String>>,
    faculty_external: HashMap<String, String>,
    dean_of_external: HashMap<String, String>,
    /// (系, 成员) → 教师集合
    committee_queue: HashMap<(String, String), BTreeSet<String>>,
    /// (系, 教师) → 成员
    faculty_committee: HashMap<(String, String), String>,
}

impl AssignmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 外部评审 ==========

    /// 批量把教师分配给外部评审
    ///
    /// 先校验全部教师，再统一写入；任何一个失败都不会产生修改。
    /// 已属于同一评审的教师视为无操作。
    pub fn assign_faculty_to_external(
        &mut self,
        external_id: &str,
        faculty_ids: &[String],
    ) -> WorkflowResult<()> {
        if let Some(dean_id) = self.dean_of_external.get(external_id) {
            return Err(WorkflowError::AssignmentLocked {
                external_id: external_id.to_string(),
                dean_id: dean_id.clone(),
            });
        }

        for faculty_id in faculty_ids {
            if let Some(holder) = self.faculty_external.get(faculty_id) {
                if holder != external_id {
                    return Err(WorkflowError::AlreadyAssigned {
                        faculty_id: faculty_id.clone(),
                        holder: holder.clone(),
                    });
                }
            }
        }

        let set = self
            .external_faculty
            .entry(external_id.to_string())
            .or_default();
        for faculty_id in faculty_ids {
            set.insert(faculty_id.clone());
            self.faculty_external
                .insert(faculty_id.clone(), external_id.to_string());
        }
        Ok(())
    }

    /// 从外部评审移除单个教师，绑定院长后仍然允许
    ///
    /// 返回是否真的移除了
    pub fn remove_faculty_from_external(&mut self, external_id: &str, faculty_id: &str) -> bool {
        if self.faculty_external.get(faculty_id).map(String::as_str) != Some(external_id) {
            return false;
        }
        self.faculty_external.remove(faculty_id);
        if let Some(set) = self.external_faculty.get_mut(external_id) {
            set.remove(faculty_id);
            if set.is_empty() {
                self.external_faculty.remove(external_id);
            }
        }
        true
    }

    /// 绑定院长（幂等，覆盖之前的院长）
    ///
    /// 返回被替换掉的院长
    pub fn assign_dean_to_external(&mut self, external_id: &str, dean_id: &str) -> Option<String> {
        self.dean_of_external
            .insert(external_id.to_string(), dean_id.to_string())
    }

    /// 解除院长绑定，恢复批量分配
    pub fn detach_dean(&mut self, external_id: &str) -> Option<String> {
        self.dean_of_external.remove(external_id)
    }

    pub fn external_of(&self, faculty_id: &str) -> Option<&str> {
        self.faculty_external.get(faculty_id).map(String::as_str)
    }

    pub fn dean_of(&self, external_id: &str) -> Option<&str> {
        self.dean_of_external.get(external_id).map(String::as_str)
    }

    pub fn faculty_of_external(&self, external_id: &str) -> Vec<String> {
        self.external_faculty
            .get(external_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    // ========== 核查委员会 ==========

    /// 把教师加入委员会成员的核查队列（按系隔离）
    pub fn assign_committee_member(
        &mut self,
        department: &str,
        member_id: &str,
        faculty_ids: &[String],
    ) -> WorkflowResult<()> {
        for faculty_id in faculty_ids {
            let key = (department.to_string(), faculty_id.clone());
            if let Some(holder) = self.faculty_committee.get(&key) {
                if holder != member_id {
                    return Err(WorkflowError::AlreadyAssigned {
                        faculty_id: faculty_id.clone(),
                        holder: holder.clone(),
                    });
                }
            }
        }

        let queue = self
            .committee_queue
            .entry((department.to_string(), member_id.to_string()))
            .or_default();
        for faculty_id in faculty_ids {
            queue.insert(faculty_id.clone());
            self.faculty_committee.insert(
                (department.to_string(), faculty_id.clone()),
                member_id.to_string(),
            );
        }
        Ok(())
    }

    pub fn remove_committee_faculty(
        &mut self,
        department: &str,
        member_id: &str,
        faculty_id: &str,
    ) -> bool {
        let key = (department.to_string(), faculty_id.to_string());
        if self.faculty_committee.get(&key).map(String::as_str) != Some(member_id) {
            return false;
        }
        self.faculty_committee.remove(&key);
        let queue_key = (department.to_string(), member_id.to_string());
        if let Some(queue) = self.committee_queue.get_mut(&queue_key) {
            queue.remove(faculty_id);
            if queue.is_empty() {
                self.committee_queue.remove(&queue_key);
            }
        }
        true
    }

    pub fn committee_member_of(&self, department: &str, faculty_id: &str) -> Option<&str> {
        self.faculty_committee
            .get(&(department.to_string(), faculty_id.to_string()))
            .map(String::as_str)
    }

    pub fn committee_queue(&self, department: &str, member_id: &str) -> Vec<String> {
        self.committee_queue
            .get(&(department.to_string(), member_id.to_string()))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
