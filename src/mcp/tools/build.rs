// src/mcp/tools/build.rs
// Build tools: hvigor clean/assemble and artifact lookup

use std::path::Path;

use serde_json::{Value, json};

use crate::artifacts::{find_app_output, find_hap_output};
use crate::error::{Result, ToolsError};
use crate::mcp::HarmonyServer;
use crate::mcp::{FindOutputRequest, HvigorAssembleRequest, HvigorCleanRequest};

use super::execute_hvigor;

const DEFAULT_BUILD_TIMEOUT_SECS: f64 = 900.0;

/// Remove build artifacts from a project.
pub async fn clean(server: &HarmonyServer, req: HvigorCleanRequest) -> Result<Value> {
    let mut args = vec!["clean".to_string()];
    if req.no_daemon.unwrap_or(true) {
        args.push("--no-daemon".to_string());
    }
    let timeout = req.timeout.unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);
    execute_hvigor(server, args, &req.project_dir, timeout).await
}

/// Build a HAP/HSP/HAR/APP package.
pub async fn assemble(server: &HarmonyServer, req: HvigorAssembleRequest) -> Result<Value> {
    let product = req.product.as_deref().unwrap_or("default");
    let build_mode = req.build_mode.as_deref().unwrap_or("debug");
    let args = assemble_args(
        &req.target_type,
        req.module.as_deref(),
        product,
        build_mode,
        req.no_daemon.unwrap_or(true),
    )?;
    let timeout = req.timeout.unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);
    execute_hvigor(server, args, &req.project_dir, timeout).await
}

/// Map a target type to the hvigor task invocation. Module targets build in
/// `--mode module`; app packages build the whole project.
pub(crate) fn assemble_args(
    target_type: &str,
    module: Option<&str>,
    product: &str,
    build_mode: &str,
    no_daemon: bool,
) -> Result<Vec<String>> {
    // Only the exact lowercase names are valid target types
    let (task_name, mode) = match target_type {
        "hap" => ("assembleHap", "module"),
        "hsp" => ("assembleHsp", "module"),
        "har" => ("assembleHar", "module"),
        "app" => ("assembleApp", "project"),
        _ => {
            return Err(ToolsError::InvalidArguments(format!(
                "invalid target_type '{}'. Must be one of: hap, hsp, har, app",
                target_type
            )));
        }
    };

    let mut args = vec![task_name.to_string(), "--mode".to_string(), mode.to_string()];

    if matches!(target_type, "hap" | "hsp" | "har") {
        if let Some(module) = module {
            args.push("-p".to_string());
            args.push(format!("module={}@{}", module, product));
        }
        args.push("-p".to_string());
        args.push(format!("product={}", product));
    }

    if matches!(target_type, "hap" | "app") {
        args.push("-p".to_string());
        args.push(format!("buildMode={}", build_mode));
    }

    if target_type == "app" {
        args.push("-p".to_string());
        args.push(format!("product={}", product));
    }

    if no_daemon {
        args.push("--no-daemon".to_string());
    }

    Ok(args)
}

/// Report where a build artifact is (or would be). Pure filesystem lookup,
/// no process runs.
pub fn find_output(req: FindOutputRequest) -> Result<Value> {
    let target_type = req.target_type.as_deref().unwrap_or("hap");
    let module = req.module.as_deref().unwrap_or("entry");
    let build_mode = req.build_mode.as_deref().unwrap_or("debug");
    let product = req.product.as_deref().unwrap_or("default");
    let project_dir = Path::new(&req.project_dir);

    match target_type {
        "hap" => {
            let output = find_hap_output(project_dir, module, build_mode, product);
            let mut payload = serde_json::to_value(&output)?;
            payload["target_type"] = json!("hap");
            Ok(payload)
        }
        "app" => {
            let output = find_app_output(project_dir, build_mode, product);
            let mut payload = serde_json::to_value(&output)?;
            payload["target_type"] = json!("app");
            Ok(payload)
        }
        other => Err(ToolsError::InvalidArguments(format!(
            "invalid target_type '{}'. Must be one of: hap, app",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_hap_with_module() {
        let args = assemble_args("hap", Some("entry"), "default", "debug", true).unwrap();
        assert_eq!(
            args,
            vec![
                "assembleHap",
                "--mode",
                "module",
                "-p",
                "module=entry@default",
                "-p",
                "product=default",
                "-p",
                "buildMode=debug",
                "--no-daemon",
            ]
        );
    }

    #[test]
    fn test_assemble_hap_without_module() {
        let args = assemble_args("hap", None, "default", "release", false).unwrap();
        assert_eq!(
            args,
            vec![
                "assembleHap",
                "--mode",
                "module",
                "-p",
                "product=default",
                "-p",
                "buildMode=release",
            ]
        );
    }

    #[test]
    fn test_assemble_har_has_no_build_mode() {
        let args = assemble_args("har", Some("lib"), "default", "debug", true).unwrap();
        assert!(!args.iter().any(|a| a.contains("buildMode")));
        assert_eq!(args[0], "assembleHar");
    }

    #[test]
    fn test_assemble_app_is_project_mode() {
        let args = assemble_args("app", None, "default", "release", true).unwrap();
        assert_eq!(
            args,
            vec![
                "assembleApp",
                "--mode",
                "project",
                "-p",
                "buildMode=release",
                "-p",
                "product=default",
                "--no-daemon",
            ]
        );
    }

    #[test]
    fn test_assemble_rejects_unknown_target() {
        let err = assemble_args("apk", None, "default", "debug", true).unwrap_err();
        assert!(matches!(err, ToolsError::InvalidArguments(_)));
        assert!(err.to_string().contains("apk"));
    }

    #[test]
    fn test_assemble_rejects_uppercase_target() {
        let err = assemble_args("HAP", None, "default", "debug", true).unwrap_err();
        assert!(matches!(err, ToolsError::InvalidArguments(_)));
        assert!(err.to_string().contains("HAP"));
    }

    #[test]
    fn test_find_output_rejects_unknown_target() {
        let req = FindOutputRequest {
            project_dir: "/tmp".into(),
            target_type: Some("har".into()),
            module: None,
            build_mode: None,
            product: None,
        };
        let err = find_output(req).unwrap_err();
        assert!(matches!(err, ToolsError::InvalidArguments(_)));
    }

    #[test]
    fn test_find_output_missing_hap() {
        let dir = tempfile::tempdir().unwrap();
        let req = FindOutputRequest {
            project_dir: dir.path().to_string_lossy().into_owned(),
            target_type: None,
            module: None,
            build_mode: None,
            product: None,
        };
        let payload = find_output(req).unwrap();
        assert_eq!(payload["target_type"], "hap");
        assert_eq!(payload["exists"], false);
        assert!(
            payload["path"]
                .as_str()
                .unwrap()
                .ends_with("entry-default-signed.hap")
        );
        // Missing metadata is reported as explicit nulls, not dropped keys
        assert!(payload["size_bytes"].is_null());
        assert!(payload.as_object().unwrap().contains_key("size_bytes"));
        assert!(payload.as_object().unwrap().contains_key("modified_time"));
    }
}
