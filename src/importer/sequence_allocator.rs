// ==========================================
// 学校设备台账 - 唯一编号整批发号
// ==========================================
// 职责: 为一批设备按 (学校, 分类) 分配连续递增的唯一编号
// 流程:
// 1. 按分类分组（组内保持输入顺序）
// 2. 每个分类查询一次水位 MAX(id_number),无记录为 0
// 3. 组内依次分配 水位+1, 水位+2, ...
// 4. 按精确三元组 (学校, 分类, 序号) 复用已存在记录,否则创建
// 说明: 学校为空时作用域退化为全局分类（水位取所有学校的最大值）;创建以三元组为键,重试幂等
// ==========================================

use crate::domain::uid::Uid;
use crate::repository::{RepositoryResult, UidRepository};
use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::debug;

/// 一台待发号设备的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidRequest {
    pub cate: String,
    pub mfg_year: Option<String>,
}

pub struct SequenceAllocator;

impl SequenceAllocator {
    /// 计算每个请求的序号（与输入顺序一一对应）,不写库
    pub fn plan(
        conn: &Connection,
        school_id: Option<i64>,
        requests: &[UidRequest],
    ) -> RepositoryResult<Vec<i64>> {
        let mut partitions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, request) in requests.iter().enumerate() {
            partitions.entry(request.cate.as_str()).or_default().push(idx);
        }

        let mut numbers = vec![0_i64; requests.len()];
        for (cate, indices) in partitions {
            let watermark = UidRepository::max_id_number_tx(conn, school_id, cate)?;
            debug!(cate = %cate, watermark, count = indices.len(), "分类水位");
            for (offset, idx) in indices.into_iter().enumerate() {
                numbers[idx] = watermark + offset as i64 + 1;
            }
        }
        Ok(numbers)
    }

    /// 整批发号并落库,返回与输入顺序对应的 Uid
    pub fn allocate(
        conn: &Connection,
        school_id: Option<i64>,
        requests: &[UidRequest],
    ) -> RepositoryResult<Vec<Uid>> {
        let numbers = Self::plan(conn, school_id, requests)?;
        Self::persist(conn, school_id, requests, &numbers)
    }

    /// 按既定序号落库: 三元组已存在则复用,否则创建
    ///
    /// 重放同一份 plan 结果不会产生重复记录
    pub fn persist(
        conn: &Connection,
        school_id: Option<i64>,
        requests: &[UidRequest],
        numbers: &[i64],
    ) -> RepositoryResult<Vec<Uid>> {
        let mut uids = Vec::with_capacity(requests.len());
        for (request, &id_number) in requests.iter().zip(numbers) {
            let uid = match UidRepository::find_tx(conn, school_id, &request.cate, id_number)? {
                Some(existing) => existing,
                None => UidRepository::insert_tx(
                    conn,
                    school_id,
                    &request.cate,
                    id_number,
                    request.mfg_year.as_deref(),
                )?,
            };
            uids.push(uid);
        }
        Ok(uids)
    }
}
