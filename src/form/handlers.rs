use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use uuid::Uuid;

use super::models::{
    FormView, LocateResponse, ReverseQuery, ShareResponse, UploadImageRequest, ValidationFailure,
};
use super::multipart_parser::MultipartParser;
use super::workflow::{self, LocateError, SubmissionOutcome, Submission, SubmitError, SubmitMode};
use super::FormSession;
use crate::dispatch::PDF_MIME;
use crate::geo::{AddressLookupError, AddressResult, Position, PositionReport};
use crate::report::ReportFields;
use crate::state::AppState;
use crate::status::messages;
use crate::ErrorResponse;

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<FormSession>, HttpResponse> {
    state.session(&id).await.ok_or_else(|| {
        HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
            "Form session {} not found",
            id
        )))
    })
}

fn pdf_attachment(submission: Submission, outcome: &str) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response
        .content_type(PDF_MIME)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(submission.file.filename.clone())],
        })
        .insert_header(("X-Report-Outcome", outcome))
        .insert_header(("X-Report-Status-Kind", submission.status.kind.as_str()));
    if submission.warning.is_some() {
        response.insert_header(("X-Report-Image-Skipped", "true"));
    }
    response.body(submission.file.bytes)
}

fn submit_error_response(error: SubmitError) -> HttpResponse {
    match error {
        SubmitError::InFlight => {
            HttpResponse::Conflict().json(ErrorResponse::conflict(messages::SUBMISSION_IN_FLIGHT))
        }
        SubmitError::Validation(errors) => HttpResponse::BadRequest().json(ValidationFailure {
            error: ErrorResponse::bad_request(messages::REQUIRED_FIELDS),
            invalid_fields: errors.errors().to_vec(),
        }),
        SubmitError::Pdf(e) => {
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
        SubmitError::Save(e) => {
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/forms",
    tag = "Report Form",
    responses(
        (status = 201, description = "Empty form opened", body = FormView)
    )
)]
pub async fn create_form(state: web::Data<AppState>) -> impl Responder {
    let session = state.create_session().await;
    HttpResponse::Created().json(session.view())
}

#[utoipa::path(
    get,
    path = "/api/forms/{id}",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    responses(
        (status = 200, description = "Current form state", body = FormView),
        (status = 404, description = "Form session not found", body = ErrorResponse)
    )
)]
pub async fn get_form(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match find_session(&state, path.into_inner()).await {
        Ok(session) => HttpResponse::Ok().json(session.view()),
        Err(response) => response,
    }
}

#[utoipa::path(
    put,
    path = "/api/forms/{id}/fields",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    request_body = ReportFields,
    responses(
        (status = 200, description = "Fields replaced", body = FormView),
        (status = 404, description = "Form session not found", body = ErrorResponse)
    )
)]
pub async fn update_fields(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    fields: web::Json<ReportFields>,
) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    session.set_fields(fields.into_inner());
    HttpResponse::Ok().json(session.view())
}

#[utoipa::path(
    post,
    path = "/api/forms/{id}/image",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    request_body(content = UploadImageRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image held and preview shown", body = FormView),
        (status = 400, description = "Not an image; the control was cleared", body = ErrorResponse),
        (status = 404, description = "Form session not found", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse)
    )
)]
pub async fn upload_image(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let parsed =
        match MultipartParser::parse_image_multipart(payload, state.config.max_upload_bytes).await {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Session {}: image upload rejected: {}", session.id(), e);
                return HttpResponse::from(e);
            }
        };

    match session.select_image(state.previews.as_ref(), parsed.upload, parsed.source) {
        Ok(()) => HttpResponse::Ok().json(session.view()),
        Err(e) => {
            log::warn!("Session {}: {}", session.id(), e);
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(messages::INVALID_IMAGE))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/forms/{id}/image",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    responses(
        (status = 200, description = "Image released", body = FormView),
        (status = 404, description = "Form session not found", body = ErrorResponse)
    )
)]
pub async fn remove_image(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    session.clear_image(state.previews.as_ref());
    HttpResponse::Ok().json(session.view())
}

#[utoipa::path(
    post,
    path = "/api/forms/{id}/reset",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    responses(
        (status = 200, description = "Form emptied", body = FormView),
        (status = 404, description = "Form session not found", body = ErrorResponse)
    )
)]
pub async fn reset_form(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    session.reset(state.previews.as_ref());
    HttpResponse::Ok().json(session.view())
}

#[utoipa::path(
    post,
    path = "/api/forms/{id}/submit",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Required fields missing", body = ValidationFailure),
        (status = 404, description = "Form session not found", body = ErrorResponse),
        (status = 409, description = "Submission already in progress", body = ErrorResponse),
        (status = 500, description = "Report could not be produced", body = ErrorResponse)
    )
)]
pub async fn submit_form(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match workflow::submit(&session, &state.builder, &state.dispatcher, SubmitMode::Save).await {
        Ok(submission) => pdf_attachment(submission, "saved"),
        Err(e) => submit_error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/forms/{id}/share",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    responses(
        (status = 200, description = "Report shared (JSON), or saved as a fallback (PDF attachment)", body = ShareResponse),
        (status = 400, description = "Required fields missing", body = ValidationFailure),
        (status = 404, description = "Form session not found", body = ErrorResponse),
        (status = 409, description = "Submission already in progress", body = ErrorResponse),
        (status = 500, description = "Report could not be produced", body = ErrorResponse)
    )
)]
pub async fn share_form(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let submission = match workflow::submit(
        &session,
        &state.builder,
        &state.dispatcher,
        SubmitMode::ShareOrSave,
    )
    .await
    {
        Ok(submission) => submission,
        Err(e) => return submit_error_response(e),
    };

    match submission.outcome {
        SubmissionOutcome::Shared => HttpResponse::Ok().json(ShareResponse {
            shared: true,
            filename: submission.file.filename,
            status: submission.status,
            warning: submission.warning,
        }),
        _ => pdf_attachment(submission, "saved-fallback"),
    }
}

#[utoipa::path(
    post,
    path = "/api/forms/{id}/locate",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Form session ID")),
    request_body = PositionReport,
    responses(
        (status = 200, description = "Neighborhood and street filled", body = LocateResponse),
        (status = 404, description = "Form session not found", body = ErrorResponse),
        (status = 409, description = "Lookup already in progress", body = ErrorResponse),
        (status = 422, description = "No position fix; fields cleared", body = LocateResponse),
        (status = 502, description = "Geocoder failed; fields cleared", body = LocateResponse)
    )
)]
pub async fn locate_form(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    report: web::Json<PositionReport>,
) -> impl Responder {
    let session = match find_session(&state, path.into_inner()).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let report = report.into_inner();
    match workflow::locate(&session, &state.address_lookup, &report).await {
        Ok(address) => HttpResponse::Ok().json(LocateResponse {
            address: Some(address),
            alert: None,
            form: session.view(),
        }),
        Err(LocateError::InFlight) => HttpResponse::Conflict()
            .json(ErrorResponse::conflict("Location lookup already in progress")),
        Err(LocateError::Lookup(e)) => {
            let body = LocateResponse {
                address: None,
                alert: Some(messages::LOCATION_FAILED.to_string()),
                form: session.view(),
            };
            match e {
                AddressLookupError::Lookup(_) => HttpResponse::BadGateway().json(body),
                _ => HttpResponse::UnprocessableEntity().json(body),
            }
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/previews/{id}",
    tag = "Report Form",
    params(("id" = Uuid, Path, description = "Preview ID")),
    responses(
        (status = 200, description = "Image bytes of a live preview"),
        (status = 404, description = "Preview revoked or unknown", body = ErrorResponse)
    )
)]
pub async fn get_preview(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    match state.previews.get(&id) {
        // The type is whatever the client declared; never let it run as a document.
        Some(resource) => HttpResponse::Ok()
            .content_type(resource.mime_type.as_str())
            .insert_header(("X-Content-Type-Options", "nosniff"))
            .insert_header(("Content-Security-Policy", "sandbox"))
            .body(resource.bytes.as_ref().clone()),
        None => HttpResponse::NotFound().json(ErrorResponse::not_found("Preview not found")),
    }
}

#[utoipa::path(
    get,
    path = "/api/address/reverse",
    tag = "Address Lookup",
    params(ReverseQuery),
    responses(
        (status = 200, description = "Neighborhood and street for the coordinates", body = AddressResult),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse),
        (status = 502, description = "Geocoder failed", body = ErrorResponse)
    )
)]
pub async fn reverse_address(
    state: web::Data<AppState>,
    query: web::Query<ReverseQuery>,
) -> impl Responder {
    let position = match Position::new(query.lat, query.lon) {
        Ok(position) => position,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string())),
    };

    match state.address_lookup.lookup_position(position).await {
        Ok(address) => HttpResponse::Ok().json(address),
        Err(e) => {
            log::warn!("Reverse geocoding failed: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse::new("BadGateway", &e.to_string()))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/forms").route(web::post().to(create_form)))
        .service(web::resource("/forms/{id}").route(web::get().to(get_form)))
        .service(web::resource("/forms/{id}/fields").route(web::put().to(update_fields)))
        .service(
            web::resource("/forms/{id}/image")
                .route(web::post().to(upload_image))
                .route(web::delete().to(remove_image)),
        )
        .service(web::resource("/forms/{id}/reset").route(web::post().to(reset_form)))
        .service(web::resource("/forms/{id}/submit").route(web::post().to(submit_form)))
        .service(web::resource("/forms/{id}/share").route(web::post().to(share_form)))
        .service(web::resource("/forms/{id}/locate").route(web::post().to(locate_form)))
        .service(web::resource("/previews/{id}").route(web::get().to(get_preview)))
        .service(web::resource("/address/reverse").route(web::get().to(reverse_address)));
}
