//! 端点处理函数
//!
//! 只做三件事：解析身份与路径、反序列化请求体、调用 `WorkflowService`。

use std::sync::OnceLock;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::models::{Marks, Role};
use crate::orchestrator::{
    AuthorityMarks, ClaimedMarks, CommitteeQueueView, ExternalAssignmentView, InteractionInput,
    Outcome, PortfolioInput, StatusView, TotalMarksView,
};
use crate::workflow::ActorCtx;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_DEPARTMENT_HEADER: &str = "x-actor-department";

// ========== 身份与路径 ==========

/// 路径与身份 ID 的允许格式
pub const ID_PATTERN: &str = r"^[A-Za-z0-9_.-]{1,64}$";

fn is_valid_id(value: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(ID_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// 校验路径中的 ID
fn check_id<'a>(name: &str, value: &'a str) -> ApiResult<&'a str> {
    if is_valid_id(value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!("{} 格式不合法: {:?}", name, value)))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> ApiResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated(format!("缺少请求头 {}", name)))
}

/// 从网关注入的请求头构造操作者
pub fn actor_from(headers: &HeaderMap) -> ApiResult<ActorCtx> {
    let actor_id = header(headers, ACTOR_ID_HEADER)?;
    if !is_valid_id(actor_id) {
        return Err(ApiError::Unauthenticated(format!("操作者 ID 不合法: {:?}", actor_id)));
    }
    let role_name = header(headers, ACTOR_ROLE_HEADER)?;
    let role = Role::from_str(role_name)
        .ok_or_else(|| ApiError::Unauthenticated(format!("未知角色: {}", role_name)))?;
    let department = header(headers, ACTOR_DEPARTMENT_HEADER)?;

    Ok(ActorCtx::new(actor_id, role, department))
}

// ========== 请求体 ==========

#[derive(Debug, Deserialize)]
pub struct VerifySectionBRequest {
    #[serde(rename = "B")]
    pub b: Marks,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignExternalsRequest {
    pub external_id: String,
    pub faculty_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFacultiesRequest {
    pub member_id: String,
    pub faculty_ids: Vec<String>,
}

fn check_ids(name: &str, ids: &[String]) -> ApiResult<()> {
    if ids.is_empty() {
        return Err(ApiError::BadRequest(format!("{} 不能为空", name)));
    }
    for id in ids {
        check_id(name, id)?;
    }
    Ok(())
}

// ========== 健康检查 ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub records: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        records: state.service.record_count(),
    })
}

// ========== 记录转移 ==========

pub async fn save_claims(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(claims): Json<ClaimedMarks>,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .save_claims(&actor, check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?, claims)
        .await?;
    Ok(Json(outcome))
}

/// 可省略的 JSON 请求体：空体视为未提供，非空但无法解析时返回 400
fn optional_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("请求体无法解析: {}", e)))
}

/// 提交；请求体可省略（使用已保存的草稿）
pub async fn submit(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let claims: Option<ClaimedMarks> = optional_body(&body)?;
    let outcome = state
        .service
        .submit(
            &actor,
            check_id("dept", &dept)?,
            check_id("facultyId", &faculty_id)?,
            claims,
        )
        .await?;
    Ok(Json(outcome))
}

pub async fn verify_section_b(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<VerifySectionBRequest>,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .verify_section_b(
            &actor,
            check_id("dept", &dept)?,
            check_id("facultyId", &faculty_id)?,
            request.b,
        )
        .await?;
    Ok(Json(outcome))
}

pub async fn verify_authority(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(marks): Json<AuthorityMarks>,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .verify_authority(&actor, check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?, marks)
        .await?;
    Ok(Json(outcome))
}

pub async fn record_interaction(
    State(state): State<AppState>,
    Path((dept, faculty_id, evaluator_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(input): Json<InteractionInput>,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .record_interaction(
            &actor,
            check_id("dept", &dept)?,
            check_id("facultyId", &faculty_id)?,
            check_id("evaluatorId", &evaluator_id)?,
            input,
        )
        .await?;
    Ok(Json(outcome))
}

pub async fn mark_portfolio(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<PortfolioInput>,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .mark_portfolio(&actor, check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?, input)
        .await?;
    Ok(Json(outcome))
}

pub async fn escalate(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .escalate(&actor, check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?)
        .await?;
    Ok(Json(outcome))
}

pub async fn director_confirm(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Outcome>> {
    let actor = actor_from(&headers)?;
    let outcome = state
        .service
        .director_confirm(&actor, check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?)
        .await?;
    Ok(Json(outcome))
}

// ========== 分配关系 ==========

pub async fn assign_externals(
    State(state): State<AppState>,
    Path(dept): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AssignExternalsRequest>,
) -> ApiResult<Json<ExternalAssignmentView>> {
    let actor = actor_from(&headers)?;
    check_id("externalId", &request.external_id)?;
    check_ids("facultyIds", &request.faculty_ids)?;
    let view = state
        .service
        .assign_externals(
            &actor,
            check_id("dept", &dept)?,
            &request.external_id,
            &request.faculty_ids,
        )
        .await?;
    Ok(Json(view))
}

pub async fn remove_external_faculty(
    State(state): State<AppState>,
    Path((dept, external_id, faculty_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<ExternalAssignmentView>> {
    let actor = actor_from(&headers)?;
    let view = state
        .service
        .remove_external_faculty(
            &actor,
            check_id("dept", &dept)?,
            check_id("externalId", &external_id)?,
            check_id("facultyId", &faculty_id)?,
        )
        .await?;
    Ok(Json(view))
}

pub async fn assign_dean(
    State(state): State<AppState>,
    Path((dept, external_id, dean_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<ExternalAssignmentView>> {
    let actor = actor_from(&headers)?;
    let view = state
        .service
        .assign_dean(
            &actor,
            check_id("dept", &dept)?,
            check_id("externalId", &external_id)?,
            check_id("deanId", &dean_id)?,
        )
        .await?;
    Ok(Json(view))
}

pub async fn detach_dean(
    State(state): State<AppState>,
    Path((dept, external_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<ExternalAssignmentView>> {
    let actor = actor_from(&headers)?;
    let view = state
        .service
        .detach_dean(&actor, check_id("dept", &dept)?, check_id("externalId", &external_id)?)
        .await?;
    Ok(Json(view))
}

pub async fn assign_committee(
    State(state): State<AppState>,
    Path(dept): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AddFacultiesRequest>,
) -> ApiResult<Json<CommitteeQueueView>> {
    let actor = actor_from(&headers)?;
    check_id("memberId", &request.member_id)?;
    check_ids("facultyIds", &request.faculty_ids)?;
    let view = state
        .service
        .assign_committee(
            &actor,
            check_id("dept", &dept)?,
            &request.member_id,
            &request.faculty_ids,
        )
        .await?;
    Ok(Json(view))
}

pub async fn remove_committee_faculty(
    State(state): State<AppState>,
    Path((dept, member_id, faculty_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<CommitteeQueueView>> {
    let actor = actor_from(&headers)?;
    let view = state
        .service
        .remove_committee_faculty(
            &actor,
            check_id("dept", &dept)?,
            check_id("memberId", &member_id)?,
            check_id("facultyId", &faculty_id)?,
        )
        .await?;
    Ok(Json(view))
}

// ========== 只读 ==========

pub async fn get_status(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
) -> ApiResult<Json<StatusView>> {
    let view = state
        .service
        .status_view(check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?)
        .await?;
    Ok(Json(view))
}

pub async fn total_marks(
    State(state): State<AppState>,
    Path((dept, faculty_id)): Path<(String, String)>,
) -> ApiResult<Json<TotalMarksView>> {
    let view = state
        .service
        .total_marks(check_id("dept", &dept)?, check_id("facultyId", &faculty_id)?)
        .await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: &str, role: &str, dept: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
        map.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        map.insert(ACTOR_DEPARTMENT_HEADER, HeaderValue::from_str(dept).unwrap());
        map
    }

    #[test]
    fn test_actor_from_headers() {
        let actor = actor_from(&headers("H1", "hod", "CSE")).unwrap();
        assert_eq!(actor.actor_id, "H1");
        assert_eq!(actor.role, Role::Hod);
        assert_eq!(actor.department, "CSE");
    }

    #[test]
    fn test_actor_rejects_unknown_role_and_missing_headers() {
        assert!(matches!(
            actor_from(&headers("H1", "janitor", "CSE")),
            Err(ApiError::Unauthenticated(_))
        ));
        assert!(matches!(
            actor_from(&HeaderMap::new()),
            Err(ApiError::Unauthenticated(_))
        ));
        assert!(matches!(
            actor_from(&headers("bad id!", "hod", "CSE")),
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_optional_body() {
        let empty: Option<ClaimedMarks> = optional_body(&Bytes::new()).unwrap();
        assert!(empty.is_none());
        let blank: Option<ClaimedMarks> = optional_body(&Bytes::from_static(b" \n")).unwrap();
        assert!(blank.is_none());

        let claims: Option<ClaimedMarks> =
            optional_body(&Bytes::from_static(br#"{"A":10,"E":0}"#)).unwrap();
        let claims = claims.unwrap();
        assert_eq!(claims.a, Some(10.0));
        assert_eq!(claims.b, None);

        // 类型错误、截断都不能当作“未提供”
        for raw in [&br#"{"A":"400"}"#[..], &b"{\"A\":"[..], &b"null x"[..]] {
            let result: ApiResult<Option<ClaimedMarks>> = optional_body(&Bytes::copy_from_slice(raw));
            assert!(matches!(result, Err(ApiError::BadRequest(_))));
        }
    }

    #[test]
    fn test_check_id() {
        assert!(check_id("facultyId", "F-1.a_2").is_ok());
        assert!(check_id("facultyId", "").is_err());
        assert!(check_id("facultyId", "a b").is_err());
        assert!(check_id("facultyId", &"x".repeat(65)).is_err());
    }
}
