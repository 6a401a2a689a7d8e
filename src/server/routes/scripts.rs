use crate::server::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Filenames that are eligible for download through the proxy.
///
/// Matched case-insensitively against the last path segment; anything else
/// redirects to the repository.
const ALLOWED_FILE_NAMES: [&str; 2] = ["prepare.sh", "prepare.ps1"];

/// Script flavour inferred from a filename's extension.
///
/// Selects both the subdirectory inside the repository's `scripts/` tree and
/// the Content-Type sent back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptType {
    Bash,
    Powershell,
}

impl ScriptType {
    fn from_file_name(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".sh") {
            Some(Self::Bash)
        } else if file_name.ends_with(".ps1") {
            Some(Self::Powershell)
        } else {
            None
        }
    }

    const fn subdirectory(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Powershell => "powershell",
        }
    }

    const fn content_type(self) -> &'static str {
        match self {
            Self::Bash => "application/x-sh",
            Self::Powershell => "application/x-powershell",
        }
    }
}

/// An inbound path that passed the allow-list, mapped onto the repository's
/// `scripts/{bash|powershell}/` layout.
#[derive(Debug, PartialEq, Eq)]
struct MappedScript {
    file_name: String,
    script_type: ScriptType,
    upstream_path: String,
}

impl MappedScript {
    /// Map inbound path segments to the location of a script upstream.
    ///
    /// The last segment is lower-cased and checked against the allow-list,
    /// then replaced with `{subdirectory}/{lower-cased name}`. Leading
    /// segments pass through verbatim, so their casing must match the
    /// repository's where the upstream is case-sensitive.
    fn from_segments(segments: &[&str]) -> Option<Self> {
        let (last, leading) = segments.split_last()?;
        let file_name = last.to_lowercase();
        if !ALLOWED_FILE_NAMES.contains(&file_name.as_str()) {
            return None;
        }
        let script_type = ScriptType::from_file_name(&file_name)?;
        let upstream_path = leading
            .iter()
            .copied()
            .chain([script_type.subdirectory(), file_name.as_str()])
            .collect::<Vec<_>>()
            .join("/");
        Some(Self {
            file_name,
            script_type,
            upstream_path,
        })
    }
}

pub async fn scripts_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Response {
    let repository_url = &state.settings.proxy_settings.repository_url;
    let segments = path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();

    let Some(script) = MappedScript::from_segments(&segments) else {
        debug!("No downloadable script at '{path}', redirecting to repository");
        return super::repository_redirect(repository_url);
    };

    match state.fetcher.fetch(&script.upstream_path).await {
        Ok(Some(buffer)) => Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", script.file_name),
            )
            .header(header::CONTENT_TYPE, script.script_type.content_type())
            .body(Body::from(buffer))
            .expect("attachment response should always build"),
        Ok(None) => {
            debug!(
                "Upstream has no file at '{}', redirecting to repository",
                script.upstream_path
            );
            super::repository_redirect(repository_url)
        }
        Err(err) => {
            // Transport failures resolve the same as a miss; the client only
            // ever sees a redirect.
            warn!(
                "Failed to fetch '{}' from upstream: {err:?}",
                script.upstream_path
            );
            super::repository_redirect(repository_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_bash_script_into_bash_subdirectory() {
        let script = MappedScript::from_segments(&["prepare.sh"]).unwrap();
        assert_eq!(script.script_type, ScriptType::Bash);
        assert_eq!(script.file_name, "prepare.sh");
        assert_eq!(script.upstream_path, "bash/prepare.sh");
    }

    #[test]
    fn maps_powershell_script_into_powershell_subdirectory() {
        let script = MappedScript::from_segments(&["prepare.ps1"]).unwrap();
        assert_eq!(script.script_type, ScriptType::Powershell);
        assert_eq!(script.upstream_path, "powershell/prepare.ps1");
    }

    #[test]
    fn lowercases_file_name_before_matching_and_mapping() {
        let script = MappedScript::from_segments(&["PREPARE.PS1"]).unwrap();
        assert_eq!(script.file_name, "prepare.ps1");
        assert_eq!(script.upstream_path, "powershell/prepare.ps1");
    }

    #[test]
    fn preserves_leading_segments_verbatim() {
        let script = MappedScript::from_segments(&["V2", "Nested", "prepare.sh"]).unwrap();
        assert_eq!(script.upstream_path, "V2/Nested/bash/prepare.sh");
    }

    #[test]
    fn rejects_file_names_outside_the_allow_list() {
        assert_eq!(MappedScript::from_segments(&["install.sh"]), None);
        assert_eq!(MappedScript::from_segments(&["prepare.txt"]), None);
        assert_eq!(MappedScript::from_segments(&["prepare.sh.bak"]), None);
        assert_eq!(MappedScript::from_segments(&["nested", "setup.ps1"]), None);
    }

    #[test]
    fn rejects_empty_paths() {
        assert_eq!(MappedScript::from_segments(&[]), None);
    }

    #[test]
    fn content_types_follow_script_type() {
        assert_eq!(ScriptType::Bash.content_type(), "application/x-sh");
        assert_eq!(
            ScriptType::Powershell.content_type(),
            "application/x-powershell"
        );
    }
}
