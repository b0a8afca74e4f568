//! Upload front end served over `tiny_http`.
//!
//! Pages carry the [`Navbar`]. The upload page posts the raw PDF to
//! `POST /upload` with its MIME type in `Content-Type` and its name in
//! `X-File-Name`; the JSON reply is the [`PdfConversionResult`] plus a
//! `previewHref` under `/objects/` from which the PNG can be fetched.
//!
//! Request routing and page rendering are plain functions over [`Reply`], so
//! they are tested without opening a socket.

use crate::convert::Converter;
use crate::navbar::Navbar;
use crate::object_url::ObjectUrl;
use crate::output::PdfConversionResult;
use crate::pipeline::input::{InputFile, OCTET_STREAM_MIME};
use serde::Serialize;
use std::borrow::Cow;
use std::io::{self, Read};
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const OBJECTS_PREFIX: &str = "/objects/";

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|e| {
            format!(r#"{{"error":"serialisation failed: {e}"}}"#).into_bytes()
        });
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: Vec::new(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain; charset=utf-8",
            body: b"Not Found".to_vec(),
        }
    }
}

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    UploadPage,
    Upload,
    Object(Uuid),
    RevokeObject(Uuid),
    NotFound,
}

pub fn route(method: &Method, url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match (method, path) {
        (Method::Get, "/") => Route::Home,
        (Method::Get, "/upload") => Route::UploadPage,
        (Method::Post, "/upload") => Route::Upload,
        (Method::Get | Method::Delete, p) if p.starts_with(OBJECTS_PREFIX) => {
            match Uuid::parse_str(&p[OBJECTS_PREFIX.len()..]) {
                Ok(id) if *method == Method::Get => Route::Object(id),
                Ok(id) => Route::RevokeObject(id),
                Err(_) => Route::NotFound,
            }
        }
        _ => Route::NotFound,
    }
}

fn page(title: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; margin: 0; }}
        .navbar {{ display: flex; justify-content: space-between; align-items: center; padding: 1rem 2rem; }}
        .navbar a {{ text-decoration: none; }}
        main {{ padding: 2rem; }}
        #preview {{ max-width: 100%; border: 1px solid #ddd; }}
    </style>
</head>
<body>
{nav}
<main>
{main}
</main>
</body>
</html>"#,
        nav = Navbar::default().render_html()
    )
}

pub fn home_page() -> String {
    page(
        "RESUMIND",
        r#"<h1>Track your applications and resume ratings</h1>
<p><a href="/upload">Upload a resume</a> to get started.</p>"#,
    )
}

pub fn upload_page(max_file_bytes: u64) -> String {
    let max_mb = max_file_bytes / (1024 * 1024);
    page(
        "Upload Resume",
        &format!(
            r#"<h1>Upload your resume</h1>
<p>PDF only, up to {max_mb}MB.</p>
<input type="file" id="file" accept="application/pdf">
<p id="status"></p>
<img id="preview" alt="" hidden>
<script>
document.getElementById('file').addEventListener('change', async (event) => {{
    const file = event.target.files[0];
    if (!file) return;
    const status = document.getElementById('status');
    status.textContent = 'Converting…';
    const res = await fetch('/upload', {{
        method: 'POST',
        headers: {{ 'Content-Type': file.type || 'application/octet-stream', 'X-File-Name': encodeURIComponent(file.name) }},
        body: file,
    }});
    const result = await res.json();
    if (result.error) {{
        status.textContent = result.error;
        return;
    }}
    status.textContent = result.file.name;
    const img = document.getElementById('preview');
    const previous = img.dataset.href;
    img.src = result.previewHref;
    img.dataset.href = result.previewHref;
    img.hidden = false;
    if (previous) {{
        img.addEventListener('load', () => fetch(previous, {{ method: 'DELETE' }}), {{ once: true }});
    }}
}});
</script>"#
        ),
    )
}

/// JSON body of `POST /upload`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadReply<'a> {
    #[serde(flatten)]
    result: &'a PdfConversionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview_href: Option<String>,
}

/// Percent-decode an `X-File-Name` header. Undecodable names are kept verbatim.
fn decode_file_name(raw: String) -> String {
    urlencoding::decode(&raw)
        .map(Cow::into_owned)
        .unwrap_or(raw)
}

/// Run an upload through the converter and build the reply.
pub async fn handle_upload(converter: &Converter, file: InputFile) -> Reply {
    let result = converter.convert(&file).await;
    upload_reply(&result)
}

/// `200` with a `previewHref` on success, `422` otherwise.
pub fn upload_reply(result: &PdfConversionResult) -> Reply {
    let preview_href = result
        .image_url()
        .parse::<ObjectUrl>()
        .ok()
        .map(|url| format!("{OBJECTS_PREFIX}{}", url.id()));
    let status = if result.is_success() { 200 } else { 422 };
    Reply::json(
        status,
        &UploadReply {
            result,
            preview_href,
        },
    )
}

pub fn handle_object(converter: &Converter, id: &Uuid) -> Reply {
    match converter.object_store().get_by_id(id) {
        Some(object) => Reply {
            status: 200,
            content_type: if object.mime_type == "image/png" {
                "image/png"
            } else {
                OCTET_STREAM_MIME
            },
            body: object.bytes.to_vec(),
        },
        None => Reply::not_found(),
    }
}

pub fn handle_revoke(converter: &Converter, id: &Uuid) -> Reply {
    if converter.object_store().revoke_id(id) {
        Reply::status(204)
    } else {
        Reply::not_found()
    }
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

/// Build the uploaded file from its headers and body, reading at most one
/// byte past the limit so oversized uploads are still recognised as such
/// without buffering them whole.
fn upload_from_parts(
    content_type: Option<String>,
    file_name: Option<String>,
    body: impl Read,
    max_file_bytes: u64,
) -> io::Result<InputFile> {
    let mime_type = content_type.unwrap_or_else(|| OCTET_STREAM_MIME.to_string());
    let name = file_name
        .map(decode_file_name)
        .unwrap_or_else(|| "upload.pdf".to_string());

    let mut bytes = Vec::new();
    body.take(max_file_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;
    Ok(InputFile::new(name, mime_type, bytes))
}

fn read_upload(request: &mut Request, max_file_bytes: u64) -> io::Result<InputFile> {
    let content_type = header_value(request, "Content-Type");
    let file_name = header_value(request, "X-File-Name");
    upload_from_parts(content_type, file_name, request.as_reader(), max_file_bytes)
}

fn respond(request: Request, reply: Reply) {
    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!("Failed to send response: {}", e);
    }
}

fn handle_request(converter: &Converter, runtime: &Handle, mut request: Request) {
    let route = route(request.method(), request.url());
    debug!("{} {} → {:?}", request.method(), request.url(), route);

    let reply = match route {
        Route::Home => Reply::html(home_page()),
        Route::UploadPage => Reply::html(upload_page(converter.config().max_file_bytes)),
        Route::Upload => match read_upload(&mut request, converter.config().max_file_bytes) {
            Ok(file) => runtime.block_on(handle_upload(converter, file)),
            Err(e) => {
                warn!("Failed to read upload body: {}", e);
                Reply::status(400)
            }
        },
        Route::Object(id) => handle_object(converter, &id),
        Route::RevokeObject(id) => handle_revoke(converter, &id),
        Route::NotFound => Reply::not_found(),
    };
    respond(request, reply);
}

/// Serve the upload front end on `addr` until the listener fails.
///
/// Requests are handled one at a time on a blocking-pool thread.
pub async fn serve(addr: &str, converter: Arc<Converter>) -> io::Result<()> {
    let server = Server::http(addr).map_err(|e| io::Error::other(e.to_string()))?;
    info!("Listening on http://{}", addr);

    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || {
        for request in server.incoming_requests() {
            handle_request(&converter, &runtime, request);
        }
        error!("HTTP listener stopped");
    })
    .await
    .map_err(|e| io::Error::other(format!("server task panicked: {e}")))
}
