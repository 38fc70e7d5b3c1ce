//! 记录存储 - 基础设施层
//!
//! 唯一持有 FacultyRecord 的地方，每条记录一把互斥锁。
//! 只暴露"在锁内原子地修改一条记录"的能力，不认识状态机和分数规则。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::{PersistError, WorkflowError, WorkflowResult};
use crate::models::FacultyRecord;

/// 外部持久化协作方
///
/// 实现方负责事务与重试；返回错误时，存储层不会应用这次修改。
pub trait RecordPersister: Send + Sync {
    fn persist(&self, record: &FacultyRecord) -> Result<(), PersistError>;
}

/// 内存持久化：保存最近一次成功持久化的快照
#[derive(Debug, Default)]
pub struct InMemoryPersister {
    snapshots: DashMap<String, FacultyRecord>,
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, faculty_id: &str) -> Option<FacultyRecord> {
        self.snapshots.get(faculty_id).map(|r| r.value().clone())
    }
}

impl RecordPersister for InMemoryPersister {
    fn persist(&self, record: &FacultyRecord) -> Result<(), PersistError> {
        self.snapshots
            .insert(record.faculty_id.clone(), record.clone());
        Ok(())
    }
}

/// 记录存储
///
/// 职责：
/// - 按教师 ID 持有记录，每条记录独立加锁
/// - 修改在克隆上进行，持久化成功后才替换原记录
/// - 不出现任何业务判断
pub struct RecordStore {
    records: DashMap<String, Arc<Mutex<FacultyRecord>>>,
    persister: Arc<dyn RecordPersister>,
}

impl RecordStore {
    /// 创建新的记录存储
    pub fn new(persister: Arc<dyn RecordPersister>) -> Self {
        Self {
            records: DashMap::new(),
            persister,
        }
    }

    /// 写入一条新记录（入职），ID 重复时拒绝
    pub fn insert(&self, record: FacultyRecord) -> WorkflowResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.faculty_id.clone()) {
            Entry::Occupied(_) => Err(WorkflowError::DuplicateRecord {
                faculty_id: record.faculty_id,
            }),
            Entry::Vacant(slot) => {
                self.persister.persist(&record)?;
                slot.insert(Arc::new(Mutex::new(record)));
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 取出记录的锁句柄（不持有 DashMap 的分片锁）
    fn cell(&self, faculty_id: &str) -> WorkflowResult<Arc<Mutex<FacultyRecord>>> {
        self.records
            .get(faculty_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WorkflowError::RecordNotFound {
                faculty_id: faculty_id.to_string(),
            })
    }

    /// 读取记录快照
    pub async fn snapshot(&self, faculty_id: &str) -> WorkflowResult<FacultyRecord> {
        let cell = self.cell(faculty_id)?;
        let guard = cell.lock().await;
        Ok(guard.clone())
    }

    /// 在记录锁内原子地修改一条记录
    ///
    /// 1. 加锁并克隆
    /// 2. 在克隆上执行 `mutate`
    /// 3. 持久化克隆
    /// 4. 全部成功后替换原记录
    ///
    /// 任何一步失败，原记录保持不变。
    pub async fn update<T, F>(&self, faculty_id: &str, mutate: F) -> WorkflowResult<(T, FacultyRecord)>
    where
        F: FnOnce(&mut FacultyRecord) -> WorkflowResult<T>,
    {
        let cell = self.cell(faculty_id)?;
        let mut guard = cell.lock().await;

        let mut draft = guard.clone();
        let output = mutate(&mut draft)?;
        draft.updated_at = chrono::Utc::now();
        self.persister.persist(&draft)?;

        *guard = draft.clone();
        Ok((output, draft))
    }
}
