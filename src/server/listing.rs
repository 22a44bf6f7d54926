use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::path::{Component, Path, PathBuf};

/// Map a request path onto the root, refusing anything that climbs out of it
pub fn resolve_request_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;

    let mut resolved = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

/// HTML index for a directory without `index.html`, 404 for anything else
pub async fn directory_listing(root: &Path, request_path: &str) -> Response {
    let Some(dir) = resolve_request_path(root, request_path) else {
        return not_found();
    };

    match tokio::fs::metadata(&dir).await {
        Ok(metadata) if metadata.is_dir() => {}
        _ => return not_found(),
    }

    let mut read_dir = match tokio::fs::read_dir(&dir).await {
        Ok(read_dir) => read_dir,
        Err(_) => return not_found(),
    };

    let mut entries = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_dir())
            .unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();

    Html(render_listing(request_path, &entries)).into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

fn render_listing(request_path: &str, entries: &[(String, bool)]) -> String {
    let title = format!(
        "Directory listing for {}",
        escape_html(&urlencoding::decode(request_path).unwrap_or_default())
    );

    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for (name, is_dir) in entries {
        let suffix = if *is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>\n",
            urlencoding::encode(name),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
