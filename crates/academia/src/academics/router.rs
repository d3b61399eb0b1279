use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::conditions;
use super::domain::{Action, EnrollmentId, MovementDraft, PlanId, RuleSpec, SpaceId};
use super::repository::{AcademicRecordStore, CorrelativityStore, RepositoryError};
use super::service::{
    AcademicService, AcademicServiceError, AdmissionUpdate, NewEnrollment, NewStudent,
};

type SharedService<S, C> = Arc<AcademicService<S, C>>;

/// Router exposing eligibility, rule editing, data entry and dashboards.
pub fn academic_router<S, C>(service: SharedService<S, C>) -> Router
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    Router::new()
        .route("/api/v1/academics/conditions", get(conditions_handler::<S, C>))
        .route(
            "/api/v1/academics/eligibility",
            post(eligibility_handler::<S, C>),
        )
        .route(
            "/api/v1/academics/plans/:plan/spaces/:space/correlativities",
            get(rules_handler::<S, C>).put(sync_handler::<S, C>),
        )
        .route("/api/v1/academics/movements", post(movement_handler::<S, C>))
        .route("/api/v1/academics/students", post(student_handler::<S, C>))
        .route("/api/v1/academics/enrollments", post(enroll_handler::<S, C>))
        .route(
            "/api/v1/academics/enrollments/:enrollment/documents",
            put(documents_handler::<S, C>),
        )
        .route(
            "/api/v1/academics/enrollments/:enrollment/registrations",
            post(registration_handler::<S, C>),
        )
        .route(
            "/api/v1/academics/enrollments/:enrollment/eligibility",
            get(plan_eligibility_handler::<S, C>),
        )
        .route(
            "/api/v1/academics/enrollments/:enrollment/kpis",
            get(kpis_handler::<S, C>),
        )
        .route(
            "/api/v1/academics/enrollments/:enrollment/record-card",
            get(record_card_handler::<S, C>),
        )
        .with_state(service)
}

fn error_response(error: AcademicServiceError) -> Response {
    let status = match &error {
        AcademicServiceError::NotFound(_)
        | AcademicServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AcademicServiceError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        error if error.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = match &error {
        AcademicServiceError::Ineligible(report) => json!({
            "error": error.to_string(),
            "eligibility": report,
        }),
        _ => json!({ "error": error.to_string() }),
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "academic request failed");
    }
    (status, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionsQuery {
    #[serde(default)]
    format: Option<String>,
}

pub(crate) async fn conditions_handler<S, C>(
    State(_service): State<SharedService<S, C>>,
    Query(query): Query<ConditionsQuery>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    let raw = query.format.unwrap_or_default();
    let format = conditions::normalize_format(&raw);
    let payload = json!({
        "format": format,
        "format_label": format.label(),
        "conditions": conditions::catalog(format),
        "final_conditions": conditions::final_conditions(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityRequest {
    enrollment_id: EnrollmentId,
    space_id: SpaceId,
    action: Action,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

pub(crate) async fn eligibility_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    axum::Json(request): axum::Json<EligibilityRequest>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.evaluate(
        request.enrollment_id,
        request.space_id,
        request.action,
        request.as_of,
    ) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RulesQuery {
    #[serde(default)]
    action: Option<Action>,
}

pub(crate) async fn rules_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path((plan, space)): Path<(u64, u64)>,
    Query(query): Query<RulesQuery>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.get_rules(PlanId(plan), SpaceId(space), query.action) {
        Ok(rules) => (StatusCode::OK, axum::Json(json!({ "rules": rules }))).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncRequest {
    rules: Vec<RuleSpec>,
}

pub(crate) async fn sync_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path((plan, space)): Path<(u64, u64)>,
    axum::Json(request): axum::Json<SyncRequest>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    let (plan, space) = (PlanId(plan), SpaceId(space));
    let result = service
        .synchronize(plan, space, request.rules)
        .and_then(|summary| Ok((summary, service.get_rules(plan, space, None)?)));
    match result {
        Ok((summary, rules)) => {
            let payload = json!({
                "inserted": summary.inserted,
                "deleted": summary.deleted,
                "rules": rules,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn movement_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    axum::Json(draft): axum::Json<MovementDraft>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.record_movement(draft) {
        Ok(movement) => (StatusCode::CREATED, axum::Json(movement)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    axum::Json(request): axum::Json<NewStudent>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.register_student(request) {
        Ok(student) => (StatusCode::CREATED, axum::Json(student)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enroll_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    axum::Json(request): axum::Json<NewEnrollment>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.enroll(request) {
        Ok(enrollment) => (StatusCode::CREATED, axum::Json(enrollment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn documents_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(enrollment): Path<u64>,
    axum::Json(update): axum::Json<AdmissionUpdate>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.update_documents(EnrollmentId(enrollment), update) {
        Ok(enrollment) => (StatusCode::OK, axum::Json(enrollment)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationRequest {
    space_id: SpaceId,
    academic_year: u16,
    #[serde(default)]
    date: Option<NaiveDate>,
}

pub(crate) async fn registration_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(enrollment): Path<u64>,
    axum::Json(request): axum::Json<RegistrationRequest>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    let date = request
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    match service.register_course(
        EnrollmentId(enrollment),
        request.space_id,
        request.academic_year,
        date,
    ) {
        Ok(registration) => (StatusCode::CREATED, axum::Json(registration)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanEligibilityQuery {
    #[serde(default)]
    action: Option<Action>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

pub(crate) async fn plan_eligibility_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(enrollment): Path<u64>,
    Query(query): Query<PlanEligibilityQuery>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    let action = query.action.unwrap_or(Action::TakeCourse);
    match service.eligible_spaces(EnrollmentId(enrollment), action, query.as_of) {
        Ok(spaces) => {
            let payload = json!({ "action": action, "spaces": spaces });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct KpisQuery {
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

pub(crate) async fn kpis_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(enrollment): Path<u64>,
    Query(query): Query<KpisQuery>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.kpis(EnrollmentId(enrollment), query.as_of) {
        Ok(kpis) => (StatusCode::OK, axum::Json(kpis)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_card_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(enrollment): Path<u64>,
) -> Response
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    match service.record_card(EnrollmentId(enrollment)) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}
