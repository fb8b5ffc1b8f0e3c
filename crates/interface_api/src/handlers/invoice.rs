//! Invoice handlers
//!
//! Each handler checks the caller's permission, validates its input, and
//! delegates to `InvoiceUserApi`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{AccountId, InvoiceId, PaymentId, SubscriptionId};

use crate::auth::{permissions, require, Claims};
use crate::dto::invoice::*;
use crate::{error::ApiError, AppState};

/// Gets an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    require(&claims, permissions::INVOICE_READ)?;

    let invoice_id = InvoiceId::from_uuid(id);
    let invoice = state
        .user_api
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {} not found", invoice_id)))?;

    Ok(Json(invoice.into()))
}

/// Creates an invoice; resubmitting the same id is accepted and ignored
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), ApiError> {
    require(&claims, permissions::INVOICE_WRITE)?;
    request.validate()?;

    let invoice = request.into_invoice()?;
    state.user_api.create_invoice(&invoice).await?;

    Ok((StatusCode::CREATED, Json(CreateInvoiceResponse { id: invoice.id })))
}

/// Lists invoices due for payment in a date window
pub async fn list_due_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DueInvoicesQuery>,
) -> Result<Json<DueInvoicesResponse>, ApiError> {
    require(&claims, permissions::INVOICE_READ)?;
    query.validate()?;

    let target_date = query.target_date.unwrap_or_else(Utc::now);
    let invoice_ids = state
        .user_api
        .get_invoices_for_payment(target_date, query.days)
        .await?;

    Ok(Json(DueInvoicesResponse { invoice_ids }))
}

/// Records a successful payment
pub async fn record_payment_success(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentSuccessRequest>,
) -> Result<StatusCode, ApiError> {
    require(&claims, permissions::INVOICE_WRITE)?;
    request.validate()?;

    let amount = request.money()?;
    state
        .user_api
        .payment_attempt_successful(
            InvoiceId::from_uuid(id),
            amount,
            PaymentId::from_uuid(request.payment_id),
            request.payment_date.unwrap_or_else(Utc::now),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Records a failed payment attempt
pub async fn record_payment_failure(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentFailureRequest>,
) -> Result<StatusCode, ApiError> {
    require(&claims, permissions::INVOICE_WRITE)?;
    request.validate()?;

    state
        .user_api
        .payment_attempt_failed(
            InvoiceId::from_uuid(id),
            PaymentId::from_uuid(request.payment_id),
            request.payment_attempt_date.unwrap_or_else(Utc::now),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the invoices of an account
pub async fn list_account_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    require(&claims, permissions::INVOICE_READ)?;

    let invoices = state
        .user_api
        .get_invoices_by_account(AccountId::from_uuid(id))
        .await?;

    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// Lists the invoice items of an account
pub async fn list_account_invoice_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceItemResponse>>, ApiError> {
    require(&claims, permissions::INVOICE_READ)?;

    let items = state
        .user_api
        .get_invoice_items_by_account(AccountId::from_uuid(id))
        .await?;

    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Lists the invoices billing a subscription
pub async fn list_subscription_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    require(&claims, permissions::INVOICE_READ)?;

    let invoices = state
        .user_api
        .get_invoices_by_subscription(SubscriptionId::from_uuid(id))
        .await?;

    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}
