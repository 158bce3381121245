// ==========================================
// 学校设备台账 - 设备导入器实现
// ==========================================
// 职责: 整合导入流程,从原始行到数据库
// 流程: 标准化 → 维度解析 → 分类推导 → 过滤 → 整批发号 → 落库 → 批次日志
// 事务: 整批在同一事务内,严格模式中止或持久化失败时全部回滚
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::device::{NewDevice, RawDeviceRow};
use crate::domain::import::{ImportBatch, ImportOutcome, RowError};
use crate::importer::category_deriver::CategoryCodeDeriver;
use crate::importer::device_importer_trait::{
    CategoryDeriver, DeviceImporter, FileParser, RowNormalizer,
};
use crate::importer::dimension_resolver::DimensionResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::row_normalizer::DeviceRowNormalizer;
use crate::importer::sequence_allocator::{SequenceAllocator, UidRequest};
use crate::repository::{
    DeviceRepository, ImportBatchRepository, RepositoryError, SchoolRepository,
};
use chrono::{Datelike, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 已完成维度解析、等待发号的设备
struct StagedDevice {
    row_number: usize,
    device: NewDevice,
    cate: String,
}

// ==========================================
// DeviceImporterImpl - 设备导入器实现
// ==========================================
pub struct DeviceImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 数据访问（整批共享一个事务）
    conn: Arc<Mutex<Connection>>,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    row_normalizer: Box<dyn RowNormalizer>,
    category_deriver: Box<dyn CategoryDeriver>,
}

impl<C> DeviceImporterImpl<C>
where
    C: ImportConfigReader,
{
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        config: C,
        file_parser: Box<dyn FileParser>,
        row_normalizer: Box<dyn RowNormalizer>,
        category_deriver: Box<dyn CategoryDeriver>,
    ) -> Self {
        Self {
            conn,
            config,
            file_parser,
            row_normalizer,
            category_deriver,
        }
    }

    /// 使用默认组件（按扩展名解析 / 标准行规则 / 固定分类表）
    pub fn with_defaults(conn: Arc<Mutex<Connection>>, config: C) -> Self {
        Self::new(
            conn,
            config,
            Box::new(UniversalFileParser),
            Box::new(DeviceRowNormalizer),
            Box::new(CategoryCodeDeriver),
        )
    }

    fn get_conn(&self) -> ImportResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::Repository(RepositoryError::LockError(e.to_string())))
    }

    /// 整批导入（同步执行,不跨 await 持有连接锁）
    fn run_batch(
        &self,
        rows: Vec<RawDeviceRow>,
        school_id: i64,
        file_name: Option<String>,
        settings: ImportSettings,
        started: Instant,
    ) -> ImportResult<ImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = rows.len();
        info!(
            batch_id = %batch_id,
            school_id,
            total_rows,
            strict_mode = settings.strict_mode,
            "开始导入设备数据"
        );

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        if SchoolRepository::find_by_id_tx(&tx, school_id)?.is_none() {
            return Err(ImportError::SchoolNotFound(school_id));
        }

        let resolver = DimensionResolver::new(settings.default_layout);
        let mut skipped_count = 0_usize;
        let mut errors: Vec<RowError> = Vec::new();
        let mut staged: Vec<StagedDevice> = Vec::new();

        // === 步骤 1-3: 标准化 / 维度解析 / 分类推导 ===
        for row in &rows {
            let input = match self.row_normalizer.normalize(row) {
                Ok(Some(input)) => input,
                Ok(None) => {
                    skipped_count += 1;
                    continue;
                }
                Err(e) => {
                    let row_number = e.row_number().unwrap_or(row.row_number);
                    let reason = e.to_string();
                    warn!(batch_id = %batch_id, row_number, error = %reason, "行校验失败");
                    if settings.strict_mode {
                        return Err(ImportError::RowRejected {
                            row: row_number,
                            reason,
                        });
                    }
                    errors.push(RowError { row_number, reason });
                    continue;
                }
            };

            let operator = resolver.resolve_operator(
                &tx,
                input.operator_name.as_deref(),
                input.operator_position.as_deref(),
                school_id,
            )?;
            let classroom = resolver.resolve_classroom(&tx, input.room_name.as_deref(), school_id)?;
            let manage = input
                .manage_no
                .as_ref()
                .map(|m| resolver.resolve_manage_number(&tx, school_id, &m.cate, m.year, m.num))
                .transpose()?;
            let cate = self.category_deriver.resolve_uid_category(&input);

            staged.push(StagedDevice {
                row_number: input.row_number,
                cate,
                device: NewDevice {
                    school_id,
                    device_type: input.device_type,
                    manufacturer: input.manufacturer,
                    model_name: input.model_name,
                    purchase_date: input.purchase_date,
                    ip_address: input.ip_address,
                    purpose: input.purpose,
                    set_type: input.set_type,
                    note: input.note,
                    unused: false,
                    classroom_id: classroom.map(|c| c.classroom_id),
                    operator_id: operator.map(|o| o.operator_id),
                    manage_id: manage.map(|m| m.manage_id),
                    uid_id: None,
                },
            });
        }
        debug!(staged = staged.len(), skipped = skipped_count, "行处理完成");

        // === 步骤 4: 分类为空的设备不入库 ===
        let before = staged.len();
        staged.retain(|s| {
            let keep = !s.cate.trim().is_empty();
            if !keep {
                debug!(row_number = s.row_number, "分类代码为空，跳过");
            }
            keep
        });
        skipped_count += before - staged.len();

        // === 步骤 5: 整批发号 ===
        let requests: Vec<UidRequest> = staged
            .iter()
            .map(|s| UidRequest {
                cate: s.cate.clone(),
                mfg_year: s.device.purchase_date.map(|d| d.year().to_string()),
            })
            .collect();
        let uids = SequenceAllocator::allocate(&tx, Some(school_id), &requests)?;
        let devices: Vec<NewDevice> = staged
            .into_iter()
            .zip(uids)
            .map(|(s, uid)| NewDevice {
                uid_id: Some(uid.uid_id),
                ..s.device
            })
            .collect();

        // === 步骤 6: 一次性落库 ===
        let device_ids = DeviceRepository::batch_insert_tx(&tx, &devices)?;

        // === 步骤 7: 批次日志 ===
        let elapsed_time = started.elapsed();
        let errors_json = if errors.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&errors).map_err(anyhow::Error::from)?)
        };
        ImportBatchRepository::insert_tx(
            &tx,
            &ImportBatch {
                batch_id: batch_id.clone(),
                school_id,
                file_name,
                total_rows: total_rows as i32,
                imported_rows: device_ids.len() as i32,
                skipped_rows: skipped_count as i32,
                error_rows: errors.len() as i32,
                imported_at: Utc::now(),
                elapsed_ms: elapsed_time.as_millis() as i64,
                errors_json,
            },
        )?;

        tx.commit()?;

        info!(
            batch_id = %batch_id,
            imported = device_ids.len(),
            skipped = skipped_count,
            errors = errors.len(),
            elapsed_ms = elapsed_time.as_millis() as u64,
            "设备导入完成"
        );

        Ok(ImportOutcome {
            batch_id,
            imported_count: device_ids.len(),
            skipped_count,
            errors,
            device_ids,
            elapsed_time,
        })
    }
}

#[async_trait::async_trait]
impl<C> DeviceImporter for DeviceImporterImpl<C>
where
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, rows), fields(row_count = rows.len()))]
    async fn import_rows(
        &self,
        rows: Vec<RawDeviceRow>,
        school_id: i64,
    ) -> ImportResult<ImportOutcome> {
        let started = Instant::now();
        let settings = self.config.load_import_settings().await?;
        self.run_batch(rows, school_id, None, settings, started)
    }

    #[instrument(skip(self, file_path), fields(file_path = %file_path.display()))]
    async fn import_from_file(
        &self,
        file_path: &Path,
        school_id: i64,
    ) -> ImportResult<ImportOutcome> {
        let started = Instant::now();
        let settings = self.config.load_import_settings().await?;

        let rows = self.file_parser.parse_rows(file_path, settings.header_rows)?;
        info!(total_rows = rows.len(), "文件解析完成");

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        self.run_batch(rows, school_id, file_name, settings, started)
    }
}
