// Flag endpoints - submission, review, listing, stats.

use super::{ApiError, AppState};
use crate::core::actions::ModerationAction;
use crate::core::collaborators::RequestContext;
use crate::core::flags::{
    Flag, FlagError, FlagQuery, FlagSortBy, FlagStats, ReviewRequest, ReviewVerdict, SortOrder,
    SubmitFlag,
};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// WIRE DTOS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitFlagBody {
    pub reason: String,
    pub description: String,
    pub evidence: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitFlagResponse {
    pub flag_id: u64,
    pub status: String,
    pub priority: String,
    pub auto_hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListFlagsParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub reason: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub status: String,
    pub review_notes: Option<String>,
    pub priority: Option<String>,
}

/// A flag as returned to admin tooling, with the read-time projections.
#[derive(Debug, Serialize)]
pub struct FlagSummary {
    #[serde(flatten)]
    pub flag: Flag,
    pub days_since_reported: i64,
    pub is_overdue: bool,
}

impl FlagSummary {
    fn project(flag: Flag, now: DateTime<Utc>) -> Self {
        let days_since_reported = flag.days_since_reported(now);
        let is_overdue = flag.is_overdue(now);
        Self {
            flag,
            days_since_reported,
            is_overdue,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionSummary {
    pub id: u64,
    pub action_type: String,
    pub severity: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub flag: FlagSummary,
    pub action: Option<ActionSummary>,
}

#[derive(Debug, Serialize)]
pub struct FlagListResponse {
    pub flags: Vec<FlagSummary>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn submit_flag(
    State(state): State<AppState>,
    Path(content_id): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<SubmitFlagBody>,
) -> Result<(StatusCode, Json<SubmitFlagResponse>), ApiError> {
    let reporter_id = caller_id(&headers)?;
    let ctx = request_context(&headers, &method, &uri);

    let reason = body
        .reason
        .parse()
        .map_err(|e: String| FlagError::ValidationFailed(e))?;

    let flag = state
        .flags
        .submit_flag(
            reporter_id,
            content_id,
            SubmitFlag {
                reason,
                description: body.description,
                evidence: body.evidence,
            },
            &ctx,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitFlagResponse {
            flag_id: flag.id,
            status: flag.status.as_str().to_string(),
            priority: flag.priority.as_str().to_string(),
            auto_hidden: flag.is_auto_hidden,
        }),
    ))
}

pub async fn list_flags(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListFlagsParams>,
) -> Result<Json<FlagListResponse>, ApiError> {
    let caller = caller_id(&headers)?;
    let query = parse_query(&params)?;
    let (page, limit) = (query.page, query.limit);

    let result = state.flags.list_flags(caller, query).await?;

    let now = Utc::now();
    Ok(Json(FlagListResponse {
        flags: result
            .flags
            .into_iter()
            .map(|f| FlagSummary::project(f, now))
            .collect(),
        total: result.total,
        page,
        limit,
    }))
}

pub async fn get_flag(
    State(state): State<AppState>,
    Path(flag_id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<FlagSummary>, ApiError> {
    let caller = caller_id(&headers)?;
    let flag = state.flags.get_flag(caller, flag_id).await?;
    Ok(Json(FlagSummary::project(flag, Utc::now())))
}

pub async fn flag_actions(
    State(state): State<AppState>,
    Path(flag_id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Vec<ModerationAction>>, ApiError> {
    let caller = caller_id(&headers)?;
    let actions = state.flags.flag_actions(caller, flag_id).await?;
    Ok(Json(actions))
}

pub async fn review_flag(
    State(state): State<AppState>,
    Path(flag_id): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let reviewer_id = caller_id(&headers)?;
    let ctx = request_context(&headers, &method, &uri);

    let verdict = parse_verdict(&body.status)?;
    let priority_override = body
        .priority
        .as_deref()
        .map(|p| p.parse().map_err(|e: String| FlagError::ValidationFailed(e)))
        .transpose()?;

    let result = state
        .flags
        .review_flag(
            reviewer_id,
            flag_id,
            ReviewRequest {
                verdict,
                review_notes: body.review_notes,
                priority_override,
            },
            &ctx,
        )
        .await?;

    Ok(Json(ReviewResponse {
        flag: FlagSummary::project(result.flag, Utc::now()),
        action: result.action.map(|a| ActionSummary {
            id: a.id,
            action_type: a.action_type.as_str().to_string(),
            severity: a.severity.as_str().to_string(),
        }),
    }))
}

pub async fn flag_stats(State(state): State<AppState>) -> Result<Json<FlagStats>, ApiError> {
    Ok(Json(state.flags.stats().await?))
}

pub async fn health() -> &'static str {
    "OK"
}

// ============================================================================
// PARSING HELPERS
// ============================================================================

const MAX_PAGE_SIZE: u32 = 100;

/// Caller identity, injected by the authenticating gateway.
fn caller_id(headers: &HeaderMap) -> Result<u64, FlagError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or(FlagError::Unauthenticated)
}

fn request_context(headers: &HeaderMap, method: &Method, uri: &Uri) -> RequestContext {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    RequestContext {
        ip,
        user_agent,
        endpoint: uri.path().to_string(),
        method: method.to_string(),
    }
}

fn parse_verdict(status: &str) -> Result<ReviewVerdict, FlagError> {
    match status {
        "APPROVED" => Ok(ReviewVerdict::Approved),
        "REJECTED" => Ok(ReviewVerdict::Rejected),
        "ESCALATED" => Ok(ReviewVerdict::Escalated),
        other => Err(FlagError::ValidationFailed(format!(
            "invalid review status: {other}"
        ))),
    }
}

fn parse_query(params: &ListFlagsParams) -> Result<FlagQuery, FlagError> {
    let invalid = |e: String| FlagError::ValidationFailed(e);

    let sort_by = match params.sort_by.as_deref() {
        None | Some("created_at") => FlagSortBy::CreatedAt,
        Some("severity_score") => FlagSortBy::SeverityScore,
        Some(other) => return Err(invalid(format!("unknown sort_by: {other}"))),
    };
    let sort_order = match params.sort_order.as_deref() {
        None | Some("desc") => SortOrder::Desc,
        Some("asc") => SortOrder::Asc,
        Some(other) => return Err(invalid(format!("unknown sort_order: {other}"))),
    };

    Ok(FlagQuery {
        status: params
            .status
            .as_deref()
            .map(|s| s.parse().map_err(invalid))
            .transpose()?,
        priority: params
            .priority
            .as_deref()
            .map(|p| p.parse().map_err(invalid))
            .transpose()?,
        reason: params
            .reason
            .as_deref()
            .map(|r| r.parse().map_err(invalid))
            .transpose()?,
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        sort_by,
        sort_order,
    })
}
