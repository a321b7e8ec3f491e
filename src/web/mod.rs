//! HTTP front-end: an upload form that converts JSON dumps and a download
//! route for the produced workbooks.

pub mod filename;

use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::convert::{convert_json_to_excel, excel_path_for};
use crate::error::{Result, ToolError};
use crate::flatten::DEFAULT_SHEET_NAME;

pub use filename::{ALLOWED_EXTENSIONS, allowed_file, secure_filename};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Settings for the upload server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Where uploaded JSON files are stored.
    pub upload_dir: PathBuf,
    /// Where converted workbooks are written and served from.
    pub processed_dir: PathBuf,
    pub sheet_name: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from("uploads"),
            processed_dir: PathBuf::from("processed"),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Creates the upload and processed directories if they are missing.
    pub fn prepare_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.processed_dir)?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

/// Builds the application router.
pub fn router(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(index).post(upload))
        .route("/download/{filename}", get(download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Prepares the working directories and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    config.prepare_dirs()?;
    let listener = TcpListener::bind(config.bind).await?;
    info!(
        address = %listener.local_addr()?,
        uploads = %config.upload_dir.display(),
        processed = %config.processed_dir.display(),
        "listening"
    );

    axum::serve(listener, router(config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

/// Errors reported back to the browser.
#[derive(Debug, Error)]
enum UploadError {
    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("File type not allowed")]
    NotAllowed,

    #[error("Invalid file name")]
    InvalidName,

    #[error("File not found")]
    NotFound,

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    Conversion(#[from] ToolError),

    #[error("conversion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::NoFilePart
            | UploadError::NoSelectedFile
            | UploadError::NotAllowed
            | UploadError::InvalidName => StatusCode::BAD_REQUEST,
            UploadError::NotFound => StatusCode::NOT_FOUND,
            UploadError::Multipart(error) => error.status(),
            UploadError::Conversion(error) if error.is_invalid_input() => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            UploadError::Conversion(_) | UploadError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), "request rejected: {}", self);
        (status, self.to_string()).into_response()
    }
}

async fn index() -> Html<String> {
    render_page(None)
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Html<String>, UploadError> {
    let (client_name, contents) = loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(UploadError::NoFilePart);
        };
        if field.name() == Some("file") {
            let client_name = field.file_name().unwrap_or_default().to_string();
            let contents = field.bytes().await?;
            break (client_name, contents);
        }
    };

    if client_name.is_empty() {
        return Err(UploadError::NoSelectedFile);
    }
    let stored_name = secure_filename(&client_name);
    if !allowed_file(&client_name) || !allowed_file(&stored_name) {
        return Err(UploadError::NotAllowed);
    }

    let config = Arc::clone(&state.config);
    let json_path = config.upload_dir.join(&stored_name);
    tokio::fs::write(&json_path, &contents)
        .await
        .map_err(ToolError::from)?;

    let excel_path = excel_path_for(&json_path, Some(&config.processed_dir));
    let excel_name = file_name_of(&excel_path);
    tokio::task::spawn_blocking(move || {
        convert_json_to_excel(&json_path, &excel_path, &config.sheet_name)
    })
    .await??;

    Ok(render_page(Some(&format!("/download/{excel_name}"))))
}

async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> std::result::Result<Response, UploadError> {
    if filename.is_empty() || secure_filename(&filename) != filename {
        return Err(UploadError::InvalidName);
    }

    let path = state.config.processed_dir.join(&filename);
    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound);
        }
        Err(error) => return Err(ToolError::from(error).into()),
    };

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, contents).into_response())
}

fn file_name_of(path: &FsPath) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn render_page(download_link: Option<&str>) -> Html<String> {
    let download = match download_link {
        Some(link) => format!(
            "<p class=\"result\">Conversion complete: <a href=\"{link}\">Download Excel file</a></p>"
        ),
        None => String::new(),
    };

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>JSON to Excel</title>
</head>
<body>
  <h1>Convert a JSON breach dump to Excel</h1>
  <form method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".json">
    <button type="submit">Convert</button>
  </form>
  {download}
</body>
</html>
"#
    ))
}
