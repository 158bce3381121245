// ==========================================
// 学校设备台账 - 维度查找或创建
// ==========================================
// 职责: 负责人 / 教室 / 管理编号 按自然键查找,未命中则创建
// 约束: 同一自然键重复调用返回同一主键,不产生重复行
// 说明: 所有操作接受 &Connection,由导入管道放入同一事务
// ==========================================

use crate::domain::dimension::{Classroom, ClassroomLayout, ManageNumber, Operator};
use crate::repository::{
    ClassroomRepository, ManageRepository, OperatorRepository, RepositoryError, RepositoryResult,
};
use rusqlite::Connection;
use tracing::debug;

/// 查找或创建
///
/// 创建时撞上唯一索引（并发导入抢先写入同一自然键）则重新查找一次
fn find_or_create<T>(
    find: impl Fn() -> RepositoryResult<Option<T>>,
    create: impl FnOnce() -> RepositoryResult<T>,
) -> RepositoryResult<T> {
    if let Some(existing) = find()? {
        return Ok(existing);
    }
    match create() {
        Ok(created) => Ok(created),
        Err(RepositoryError::UniqueConstraintViolation(msg)) => {
            find()?.ok_or(RepositoryError::UniqueConstraintViolation(msg))
        }
        Err(e) => Err(e),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct DimensionResolver {
    default_layout: ClassroomLayout,
}

impl DimensionResolver {
    pub fn new(default_layout: ClassroomLayout) -> Self {
        Self { default_layout }
    }

    /// 负责人: 自然键 (name, position, school)
    ///
    /// name 或 position 为空时返回 None（负责人关联可选）
    pub fn resolve_operator(
        &self,
        conn: &Connection,
        name: Option<&str>,
        position: Option<&str>,
        school_id: i64,
    ) -> RepositoryResult<Option<Operator>> {
        let (name, position) = match (non_blank(name), non_blank(position)) {
            (Some(n), Some(p)) => (n, p),
            _ => return Ok(None),
        };
        let operator = find_or_create(
            || OperatorRepository::find_by_key_tx(conn, name, position, school_id),
            || {
                debug!(name = %name, position = %position, school_id, "新建负责人");
                OperatorRepository::insert_tx(conn, name, position, school_id)
            },
        )?;
        Ok(Some(operator))
    }

    /// 教室: 自然键仅为 room_name（不区分学校）
    ///
    /// 新建时使用默认平面图位置,并记录导入学校
    pub fn resolve_classroom(
        &self,
        conn: &Connection,
        room_name: Option<&str>,
        school_id: i64,
    ) -> RepositoryResult<Option<Classroom>> {
        let room_name = match non_blank(room_name) {
            Some(r) => r,
            None => return Ok(None),
        };
        let classroom = find_or_create(
            || ClassroomRepository::find_by_room_name_tx(conn, room_name),
            || {
                debug!(room_name = %room_name, school_id, "新建教室");
                ClassroomRepository::insert_tx(conn, room_name, school_id, self.default_layout)
            },
        )?;
        Ok(Some(classroom))
    }

    /// 管理编号: 自然键 (school, cate, year, num),year 为空单独成组
    pub fn resolve_manage_number(
        &self,
        conn: &Connection,
        school_id: i64,
        cate: &str,
        year: Option<i32>,
        num: i64,
    ) -> RepositoryResult<ManageNumber> {
        let cate = cate.trim();
        if cate.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "manage_cate".to_string(),
                message: "管理编号分类不能为空".to_string(),
            });
        }
        find_or_create(
            || ManageRepository::find_by_key_tx(conn, school_id, cate, year, num),
            || {
                debug!(cate = %cate, ?year, num, school_id, "新建管理编号");
                ManageRepository::insert_tx(conn, school_id, cate, year, num)
            },
        )
    }
}

impl Default for DimensionResolver {
    fn default() -> Self {
        Self::new(ClassroomLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::repository::SchoolRepository;

    fn setup() -> (Connection, i64, i64) {
        let conn = open_in_memory().unwrap();
        let a = SchoolRepository::insert_tx(&conn, "가나초등학교", None).unwrap();
        let b = SchoolRepository::insert_tx(&conn, "다라중학교", None).unwrap();
        (conn, a.school_id, b.school_id)
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_resolve_operator_idempotent() {
        let (conn, school, other) = setup();
        let resolver = DimensionResolver::default();

        let first = resolver
            .resolve_operator(&conn, Some("김철수"), Some("교사"), school)
            .unwrap()
            .unwrap();
        let second = resolver
            .resolve_operator(&conn, Some(" 김철수 "), Some("교사"), school)
            .unwrap()
            .unwrap();
        assert_eq!(first.operator_id, second.operator_id);

        // 其他学校的同名负责人是不同实体
        let elsewhere = resolver
            .resolve_operator(&conn, Some("김철수"), Some("교사"), other)
            .unwrap()
            .unwrap();
        assert_ne!(first.operator_id, elsewhere.operator_id);
        assert_eq!(count(&conn, "operator"), 2);
    }

    #[test]
    fn test_resolve_operator_requires_name_and_position() {
        let (conn, school, _) = setup();
        let resolver = DimensionResolver::default();
        assert!(resolver
            .resolve_operator(&conn, Some("김철수"), None, school)
            .unwrap()
            .is_none());
        assert!(resolver
            .resolve_operator(&conn, Some(""), Some("교사"), school)
            .unwrap()
            .is_none());
        assert_eq!(count(&conn, "operator"), 0);
    }

    #[test]
    fn test_resolve_classroom_idempotent_with_default_layout() {
        let (conn, school, other) = setup();
        let layout = ClassroomLayout {
            x: 5,
            y: 6,
            width: 70,
            height: 80,
        };
        let resolver = DimensionResolver::new(layout);

        let first = resolver
            .resolve_classroom(&conn, Some("101호"), school)
            .unwrap()
            .unwrap();
        assert_eq!(first.layout, layout);
        assert_eq!(first.school_id, Some(school));

        // 教室按 room_name 全局匹配
        let second = resolver
            .resolve_classroom(&conn, Some("101호"), other)
            .unwrap()
            .unwrap();
        assert_eq!(first.classroom_id, second.classroom_id);
        assert!(resolver.resolve_classroom(&conn, Some("  "), school).unwrap().is_none());
        assert_eq!(count(&conn, "classroom"), 1);
    }

    #[test]
    fn test_resolve_manage_number_null_year_bucket() {
        let (conn, school, _) = setup();
        let resolver = DimensionResolver::default();

        let with_year = resolver
            .resolve_manage_number(&conn, school, "DW", Some(2023), 7)
            .unwrap();
        let again = resolver
            .resolve_manage_number(&conn, school, "DW", Some(2023), 7)
            .unwrap();
        let without_year = resolver
            .resolve_manage_number(&conn, school, "DW", None, 7)
            .unwrap();
        let without_year_again = resolver
            .resolve_manage_number(&conn, school, "DW", None, 7)
            .unwrap();

        assert_eq!(with_year.manage_id, again.manage_id);
        assert_eq!(without_year.manage_id, without_year_again.manage_id);
        assert_ne!(with_year.manage_id, without_year.manage_id);
        assert_eq!(count(&conn, "manage"), 2);
    }

    #[test]
    fn test_find_or_create_recovers_from_unique_conflict() {
        let calls = std::cell::Cell::new(0);
        let result = find_or_create(
            || {
                calls.set(calls.get() + 1);
                Ok(if calls.get() > 1 { Some(42) } else { None })
            },
            || Err(RepositoryError::UniqueConstraintViolation("dup".to_string())),
        )
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.get(), 2);
    }
}
