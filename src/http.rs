// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Renderer-facing HTTP surface.
//!
//! Renderers follow a view's `events` stream, report the rectangle a human selected, and upload
//! the images they export so agents can fetch them.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::error::{ErrorKind, SyncError};
use crate::hub::{ImageFormat, LiveViewHub, PushEvent, SubscriberId, ViewSnapshot};
use crate::model::{Selection, SelectionBounds, ViewId};

type SharedHub = Arc<LiveViewHub>;

pub fn router(hub: SharedHub) -> Router {
    Router::new()
        .route("/views/{view_id}/events", get(events))
        .route("/views/{view_id}/state", get(state))
        .route("/views/{view_id}/selection", put(set_selection).delete(clear_selection))
        .route("/views/{view_id}/render-cache", put(set_render_cache))
        .route("/views/{view_id}/image.png", get(image_png))
        .route("/views/{view_id}/image.svg", get(image_svg))
        .route("/views/{view_id}/image-access", post(mark_image_access))
        .with_state(hub)
}

#[derive(Debug, Deserialize)]
struct SelectionReport {
    bounds: SelectionBounds,
    #[serde(default, rename = "pngBase64")]
    png_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenderCacheUpload {
    #[serde(default)]
    svg: Option<String>,
    #[serde(default)]
    png_base64: Option<String>,
}

async fn events(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HttpError> {
    let view_id = LiveViewHub::parse_view_id(&view_id)?;
    let subscription = hub.subscribe(&view_id).await?;
    tracing::debug!(view_id = %view_id, "renderer stream opened");

    let stream = RendererStream {
        events: UnboundedReceiverStream::new(subscription.receiver),
        _detach: DetachOnDrop { hub, view_id, subscriber_id: subscription.subscriber_id },
    }
    .map(|event| {
        let data = serde_json::to_string(&*event).unwrap_or_else(|_| "{}".to_owned());
        Ok(Event::default().event(event.name()).data(data))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Push events for one renderer connection; dropping it detaches the subscriber.
struct RendererStream {
    events: UnboundedReceiverStream<Arc<PushEvent>>,
    _detach: DetachOnDrop,
}

impl Stream for RendererStream {
    type Item = Arc<PushEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

struct DetachOnDrop {
    hub: SharedHub,
    view_id: ViewId,
    subscriber_id: SubscriberId,
}

impl Drop for DetachOnDrop {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let hub = Arc::clone(&self.hub);
        let view_id = self.view_id.clone();
        let subscriber_id = self.subscriber_id;
        runtime.spawn(async move {
            if hub.unsubscribe(&view_id, subscriber_id).await {
                tracing::debug!(view_id = %view_id, "renderer stream closed");
            }
        });
    }
}

async fn state(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
) -> Result<Json<ViewSnapshot>, HttpError> {
    let view_id = LiveViewHub::parse_view_id(&view_id)?;
    Ok(Json(hub.get_view(&view_id).await?))
}

async fn set_selection(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
    Json(report): Json<SelectionReport>,
) -> Result<Json<Selection>, HttpError> {
    let view_id = LiveViewHub::parse_view_id(&view_id)?;
    let selection = hub.set_selection(&view_id, report.bounds, report.png_base64).await?;
    Ok(Json(selection))
}

async fn clear_selection(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let view_id = LiveViewHub::parse_view_id(&view_id)?;
    hub.clear_selection(&view_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_render_cache(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
    Json(upload): Json<RenderCacheUpload>,
) -> Result<StatusCode, HttpError> {
    let view_id = LiveViewHub::parse_view_id(&view_id)?;
    let png_bytes = upload
        .png_base64
        .map(|encoded| {
            STANDARD
                .decode(encoded.as_bytes())
                .map_err(|err| SyncError::parse(format!("png_base64 is not valid base64: {err}")))
        })
        .transpose()?;
    hub.set_render_cache(&view_id, upload.svg, png_bytes).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn image_png(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
) -> Result<Response, HttpError> {
    serve_image(&hub, &view_id, ImageFormat::Png).await
}

async fn image_svg(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
) -> Result<Response, HttpError> {
    serve_image(&hub, &view_id, ImageFormat::Svg).await
}

async fn serve_image(
    hub: &LiveViewHub,
    view_id: &str,
    format: ImageFormat,
) -> Result<Response, HttpError> {
    let view_id = LiveViewHub::parse_view_id(view_id)?;
    match hub.get_image_as(&view_id, format).await? {
        Some(bytes) => {
            Ok(([(header::CONTENT_TYPE, format.content_type())], Bytes::from(bytes)).into_response())
        }
        None => Ok(missing_artifact(&view_id, format)),
    }
}

async fn mark_image_access(
    State(hub): State<SharedHub>,
    Path(view_id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let view_id = LiveViewHub::parse_view_id(&view_id)?;
    let at = hub.mark_image_access(&view_id).await?;
    Ok(Json(serde_json::json!({ "view_id": view_id, "last_image_access_at": at })))
}

fn missing_artifact(view_id: &ViewId, format: ImageFormat) -> Response {
    let body = serde_json::json!({
        "error": format!(
            "no {} image has been rendered for view {view_id} yet",
            format.as_str()
        ),
        "kind": ErrorKind::NotFound.as_str(),
        "view_id": view_id,
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// A [`SyncError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct HttpError(SyncError);

impl From<SyncError> for HttpError {
    fn from(err: SyncError) -> Self {
        Self(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ParseError => StatusCode::BAD_REQUEST,
        ErrorKind::PolicyViolation => StatusCode::CONFLICT,
        ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_REQUIRED,
        ErrorKind::ResourceExceeded => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind == ErrorKind::StorageError {
            tracing::warn!(error = %self.0, "storage failure on renderer request");
        }
        let mut body = self.0.remediation();
        if let Value::Object(fields) = &mut body {
            fields.insert("error".to_owned(), Value::from(self.0.to_string()));
            fields.insert("kind".to_owned(), Value::from(kind.as_str()));
        }
        (status_for(kind), Json(body)).into_response()
    }
}
