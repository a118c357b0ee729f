//! Repository request handlers.

use crate::artifact::{ArtifactKind, ArtifactRequest};
use crate::server::AppState;
use crate::stream::{forward_archive, DigestSink};
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use blackdog_core::{PluginVersion, Result};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

const ARCHIVE_CONTENT_TYPE: &str = "application/java-archive";
const DESCRIPTOR_CONTENT_TYPE: &str = "text/xml";
const CHECKSUM_CONTENT_TYPE: &str = "text/plain";

/// Serve any repository path.
///
/// Every failure is answered with an empty 404; errors other than an
/// unknown plugin or version are logged with full detail.
pub async fn handle_artifact(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return not_found();
    }
    let Some(request) = ArtifactRequest::parse(uri.path()) else {
        debug!("Not an artifact path: {}", uri.path());
        return not_found();
    };

    match serve_artifact(&state, &request).await {
        Ok(response) => response,
        Err(e) if e.is_not_found() => {
            info!("{}: {}", uri.path(), e);
            not_found()
        }
        Err(e) => {
            error!("Failed to serve {}: {:?}", uri.path(), e);
            not_found()
        }
    }
}

/// Fallback for anything the repository does not serve.
pub async fn handle_not_found() -> Response {
    not_found()
}

async fn serve_artifact(state: &Arc<AppState>, request: &ArtifactRequest) -> Result<Response> {
    let plugin = state
        .registry
        .resolve(&request.plugin, &request.version)
        .await?;
    let version = plugin.get_version(&request.version)?;

    let response = match request.kind {
        ArtifactKind::Archive => return serve_archive(state, version).await,
        ArtifactKind::Descriptor => {
            text_response(DESCRIPTOR_CONTENT_TYPE, version.descriptor(&request.group_id))
        }
        ArtifactKind::DescriptorSha1 => text_response(
            CHECKSUM_CONTENT_TYPE,
            version.descriptor_sha1(&request.group_id),
        ),
        ArtifactKind::DescriptorMd5 => text_response(
            CHECKSUM_CONTENT_TYPE,
            version.descriptor_md5(&request.group_id),
        ),
        ArtifactKind::ArchiveSha1 => checksum_response(version.sha1.as_deref()),
        ArtifactKind::ArchiveMd5 => checksum_response(version.md5.as_deref()),
    };
    Ok(response)
}

async fn serve_archive(state: &Arc<AppState>, version: &PluginVersion) -> Result<Response> {
    let Some(url) = version.url.as_deref() else {
        info!(
            "No download URL known for {} {}",
            version.plugin_name(),
            version.version()
        );
        return Ok(not_found());
    };

    let upstream = state.http.get(url).await?;
    let status = upstream.status();
    if !status.is_success() {
        info!("Archive {} answered {}", url, status);
        return Ok(not_found());
    }
    let length = upstream.content_length();

    let sink = (version.sha1.is_none() || version.md5.is_none()).then(|| DigestSink {
        registry: Arc::clone(&state.registry),
        plugin: version.plugin_name().to_string(),
        version: version.version().to_string(),
    });
    let body = forward_archive(upstream.bytes_stream().boxed(), sink);

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(ARCHIVE_CONTENT_TYPE),
    );
    match length {
        Some(length) => {
            headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(length));
        }
        None => debug!("Archive {} sent no Content-Length; streaming without one", url),
    }
    Ok(response)
}

fn checksum_response(checksum: Option<&str>) -> Response {
    match checksum {
        Some(checksum) => text_response(CHECKSUM_CONTENT_TYPE, checksum.to_string()),
        None => not_found(),
    }
}

fn text_response(content_type: &'static str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, body.len().to_string()),
        ],
        body,
    )
        .into_response()
}

fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}
