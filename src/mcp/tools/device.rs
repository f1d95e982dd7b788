// src/mcp/tools/device.rs
// Device tools: target listing, shell passthrough, screenshot, install

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::error::{Result, ToolsError};
use crate::mcp::HarmonyServer;
use crate::mcp::{InstallAppRequest, ScreenshotRequest, ShellRequest};

use super::{execute_hdc, payload_returncode, payload_text};

const DEFAULT_SHELL_TIMEOUT_SECS: f64 = 120.0;
const DEFAULT_SCREENSHOT_TIMEOUT_SECS: f64 = 30.0;
const DEFAULT_INSTALL_TIMEOUT_SECS: f64 = 120.0;
const CLEANUP_TIMEOUT_SECS: f64 = 10.0;

/// List connected devices and emulators.
pub async fn list_targets(server: &HarmonyServer) -> Result<Value> {
    execute_hdc(server, vec!["list".into(), "targets".into()], None, 15.0).await
}

/// Run a shell command on the target device.
pub async fn shell(server: &HarmonyServer, req: ShellRequest) -> Result<Value> {
    let tokens = shell_words::split(&req.command)
        .map_err(|e| ToolsError::InvalidArguments(format!("cannot parse command: {}", e)))?;
    if tokens.is_empty() {
        return Err(ToolsError::InvalidArguments(
            "shell command cannot be empty".to_string(),
        ));
    }

    let mut args = Vec::with_capacity(tokens.len() + 1);
    args.push("shell".to_string());
    args.extend(tokens);

    let timeout = req.timeout.unwrap_or(DEFAULT_SHELL_TIMEOUT_SECS);
    execute_hdc(server, args, req.device, timeout).await
}

/// Capture a screenshot on the device and pull it into the project
/// directory. Three steps: snapshot on device, transfer, cleanup.
pub async fn screenshot(server: &HarmonyServer, req: ScreenshotRequest) -> Result<Value> {
    let start = Instant::now();
    let timeout = req.timeout.unwrap_or(DEFAULT_SCREENSHOT_TIMEOUT_SECS);

    info!(
        project_dir = %req.project_dir,
        output_path = ?req.output_path,
        filename = ?req.filename,
        device = ?req.device,
        "capturing device screenshot"
    );

    if !Path::new(&req.project_dir).is_dir() {
        error!("project directory does not exist: {}", req.project_dir);
        return Ok(json!({
            "success": false,
            "error": format!("project directory does not exist: {}", req.project_dir),
        }));
    }

    let filename = normalize_screenshot_filename(req.filename.as_deref());

    let local_dir = match &req.output_path {
        Some(sub) => Path::new(&req.project_dir).join(sub),
        None => PathBuf::from(&req.project_dir),
    };
    if let Err(e) = std::fs::create_dir_all(&local_dir) {
        error!(dir = %local_dir.display(), "failed to create output directory: {}", e);
        return Ok(json!({
            "success": false,
            "error": format!("failed to create output directory: {}", e),
        }));
    }
    let local_path = local_dir.join(&filename);

    let device_temp_path = format!(
        "/data/local/tmp/screenshot_{}.jpeg",
        uuid::Uuid::new_v4().simple()
    );

    let outcome = screenshot_steps(
        server,
        &req,
        timeout,
        &local_path,
        &filename,
        &device_temp_path,
        start,
    )
    .await;

    match outcome {
        Ok(payload) => Ok(payload),
        Err(e) => {
            // Best-effort removal of the device-side temp file
            warn!("screenshot failed, cleaning up {}", device_temp_path);
            let _ = execute_hdc(
                server,
                vec!["shell".into(), "rm".into(), device_temp_path.clone()],
                req.device.clone(),
                CLEANUP_TIMEOUT_SECS,
            )
            .await;
            Err(e)
        }
    }
}

async fn screenshot_steps(
    server: &HarmonyServer,
    req: &ScreenshotRequest,
    timeout: f64,
    local_path: &Path,
    filename: &str,
    device_temp_path: &str,
    start: Instant,
) -> Result<Value> {
    info!("step 1/3: snapshot on device -> {}", device_temp_path);
    let snapshot_result = execute_hdc(
        server,
        vec![
            "shell".into(),
            "snapshot_display".into(),
            "-f".into(),
            device_temp_path.to_string(),
        ],
        req.device.clone(),
        timeout,
    )
    .await?;

    let snapshot_stdout = payload_text(&snapshot_result, "stdout").to_lowercase();
    if payload_returncode(&snapshot_result) != 0 || snapshot_stdout.contains("error:") {
        error!(
            stdout = payload_text(&snapshot_result, "stdout"),
            stderr = payload_text(&snapshot_result, "stderr"),
            "screenshot command failed"
        );
        return Ok(json!({
            "success": false,
            "error": "screenshot command failed",
            "snapshot_result": snapshot_result,
        }));
    }

    info!("step 2/3: transfer {} -> {}", device_temp_path, local_path.display());
    let recv_result = execute_hdc(
        server,
        vec![
            "file".into(),
            "recv".into(),
            device_temp_path.to_string(),
            local_path.to_string_lossy().into_owned(),
        ],
        req.device.clone(),
        timeout,
    )
    .await?;

    let recv_stdout = payload_text(&recv_result, "stdout").to_lowercase();
    if payload_returncode(&recv_result) != 0
        || recv_stdout.contains("[fail]")
        || recv_stdout.contains("error")
    {
        error!(
            stdout = payload_text(&recv_result, "stdout"),
            stderr = payload_text(&recv_result, "stderr"),
            "file transfer failed"
        );
        let cleanup_result = execute_hdc(
            server,
            vec!["shell".into(), "rm".into(), device_temp_path.to_string()],
            req.device.clone(),
            CLEANUP_TIMEOUT_SECS,
        )
        .await?;
        info!(
            returncode = payload_returncode(&cleanup_result),
            "cleaned up device temp file after failed transfer"
        );
        return Ok(json!({
            "success": false,
            "error": "file transfer failed",
            "recv_result": recv_result,
        }));
    }

    info!("step 3/3: remove device temp file {}", device_temp_path);
    let cleanup_result = execute_hdc(
        server,
        vec!["shell".into(), "rm".into(), device_temp_path.to_string()],
        req.device.clone(),
        CLEANUP_TIMEOUT_SECS,
    )
    .await?;

    let file_size = std::fs::metadata(local_path).map(|m| m.len()).unwrap_or(0);
    if file_size == 0 {
        warn!("local screenshot file missing or empty: {}", local_path.display());
    }

    let total_time_ms = start.elapsed().as_millis() as u64;
    info!(
        total_time_ms,
        file_size_bytes = file_size,
        "screenshot complete"
    );

    Ok(json!({
        "success": true,
        "total_time_ms": total_time_ms,
        "local_path": local_path.to_string_lossy(),
        "filename": filename,
        "device_temp_path": device_temp_path,
        "file_size_bytes": file_size,
        "snapshot_result": snapshot_result,
        "recv_result": recv_result,
        "cleanup_result": cleanup_result,
    }))
}

/// Default to a timestamped name, and force a .jpeg extension because that
/// is what snapshot_display writes.
fn normalize_screenshot_filename(filename: Option<&str>) -> String {
    let filename = match filename {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!(
            "screenshot_{}.jpeg",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ),
    };

    let lower = filename.to_lowercase();
    if lower.ends_with(".jpeg") || lower.ends_with(".jpg") {
        return filename;
    }
    let base = match filename.rsplit_once('.') {
        Some((base, _)) => base.to_string(),
        None => filename,
    };
    format!("{}.jpeg", base)
}

/// Install a HAP the way DevEco Studio does: stop, stage into a device temp
/// directory, `bm install`, clean up, optionally start the ability.
pub async fn install_app(server: &HarmonyServer, req: InstallAppRequest) -> Result<Value> {
    let start = Instant::now();
    let timeout = req.timeout.unwrap_or(DEFAULT_INSTALL_TIMEOUT_SECS);
    let mut steps = Map::new();
    let temp_dir = format!("/data/local/tmp/{}", uuid::Uuid::new_v4().simple());

    info!(
        hap_path = %req.hap_path,
        bundle_name = ?req.bundle_name,
        device = ?req.device,
        temp_dir = %temp_dir,
        "installing application"
    );

    if !Path::new(&req.hap_path).is_file() {
        error!("HAP file does not exist or is not a file: {}", req.hap_path);
        return Ok(json!({
            "success": false,
            "error": format!("HAP file does not exist or is not a file: {}", req.hap_path),
            "hap_path": req.hap_path,
            "bundle_name": req.bundle_name,
            "temp_dir": temp_dir,
            "steps": steps,
        }));
    }

    let hap_size = std::fs::metadata(&req.hap_path).map(|m| m.len()).unwrap_or(0);
    info!(hap_size_bytes = hap_size, "HAP file located");

    let outcome = install_steps(server, &req, timeout, &temp_dir, hap_size, &mut steps, start).await;

    match outcome {
        Ok(payload) => Ok(payload),
        Err(e) => {
            warn!("install failed, cleaning up {}", temp_dir);
            let _ = execute_hdc(
                server,
                vec![
                    "shell".into(),
                    "rm".into(),
                    "-rf".into(),
                    temp_dir.clone(),
                ],
                req.device.clone(),
                30.0,
            )
            .await;
            Err(e)
        }
    }
}

async fn install_steps(
    server: &HarmonyServer,
    req: &InstallAppRequest,
    timeout: f64,
    temp_dir: &str,
    hap_size: u64,
    steps: &mut Map<String, Value>,
    start: Instant,
) -> Result<Value> {
    let force_stop = req.force_stop.unwrap_or(true);
    let auto_start = req.auto_start.unwrap_or(true);
    let ability_name = req.ability_name.as_deref().unwrap_or("EntryAbility");

    if force_stop && req.bundle_name.is_some() {
        let bundle = req.bundle_name.clone().unwrap_or_default();
        info!("step 1/6: force-stop {}", bundle);
        let stop_result = execute_hdc(
            server,
            vec![
                "shell".into(),
                "aa".into(),
                "force-stop".into(),
                bundle,
            ],
            req.device.clone(),
            timeout,
        )
        .await?;
        steps.insert("stop".into(), stop_result);
    } else {
        info!(
            force_stop,
            bundle_name = ?req.bundle_name,
            "step 1/6: skipped"
        );
    }

    info!("step 2/6: create device temp dir {}", temp_dir);
    let mkdir_result = execute_hdc(
        server,
        vec!["shell".into(), "mkdir".into(), temp_dir.to_string()],
        req.device.clone(),
        timeout,
    )
    .await?;
    if payload_returncode(&mkdir_result) != 0 {
        error!(
            stdout = payload_text(&mkdir_result, "stdout"),
            stderr = payload_text(&mkdir_result, "stderr"),
            "failed to create device temp dir"
        );
    }
    steps.insert("create_dir".into(), mkdir_result);

    info!(hap_size_bytes = hap_size, "step 3/6: send HAP to device");
    let transfer_result = execute_hdc(
        server,
        vec![
            "file".into(),
            "send".into(),
            req.hap_path.clone(),
            temp_dir.to_string(),
        ],
        req.device.clone(),
        timeout,
    )
    .await?;
    if payload_returncode(&transfer_result) != 0 {
        error!(
            stdout = payload_text(&transfer_result, "stdout"),
            stderr = payload_text(&transfer_result, "stderr"),
            "HAP transfer failed"
        );
    }
    steps.insert("transfer".into(), transfer_result);

    info!("step 4/6: bm install from {}", temp_dir);
    let install_result = execute_hdc(
        server,
        vec![
            "shell".into(),
            "bm".into(),
            "install".into(),
            "-p".into(),
            temp_dir.to_string(),
        ],
        req.device.clone(),
        timeout,
    )
    .await?;
    let install_code = payload_returncode(&install_result);
    info!(
        returncode = install_code,
        stdout = payload_text(&install_result, "stdout"),
        "install step finished"
    );
    steps.insert("install".into(), install_result);

    info!("step 5/6: remove device temp dir {}", temp_dir);
    let cleanup_result = execute_hdc(
        server,
        vec![
            "shell".into(),
            "rm".into(),
            "-rf".into(),
            temp_dir.to_string(),
        ],
        req.device.clone(),
        timeout,
    )
    .await?;
    steps.insert("cleanup".into(), cleanup_result);

    if auto_start && req.bundle_name.is_some() {
        let bundle = req.bundle_name.clone().unwrap_or_default();
        info!("step 6/6: start {}/{}", bundle, ability_name);
        let start_result = execute_hdc(
            server,
            vec![
                "shell".into(),
                "aa".into(),
                "start".into(),
                "-a".into(),
                ability_name.to_string(),
                "-b".into(),
                bundle,
            ],
            req.device.clone(),
            timeout,
        )
        .await?;
        steps.insert("start".into(), start_result);
    } else {
        info!(
            auto_start,
            bundle_name = ?req.bundle_name,
            "step 6/6: skipped"
        );
    }

    // The install step alone decides overall success
    let success = steps
        .get("install")
        .map(payload_returncode)
        .unwrap_or(-1)
        == 0;
    let total_time_ms = start.elapsed().as_millis() as u64;
    info!(success, total_time_ms, "application install finished");

    Ok(json!({
        "success": success,
        "total_time_ms": total_time_ms,
        "hap_path": req.hap_path,
        "bundle_name": req.bundle_name,
        "temp_dir": temp_dir,
        "steps": steps,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_default_is_timestamped_jpeg() {
        let name = normalize_screenshot_filename(None);
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".jpeg"));

        let blank = normalize_screenshot_filename(Some("  "));
        assert!(blank.ends_with(".jpeg"));
    }

    #[test]
    fn test_filename_keeps_jpeg_extensions() {
        assert_eq!(
            normalize_screenshot_filename(Some("shot.jpeg")),
            "shot.jpeg"
        );
        assert_eq!(normalize_screenshot_filename(Some("shot.JPG")), "shot.JPG");
    }

    #[test]
    fn test_filename_rewrites_other_extensions() {
        assert_eq!(normalize_screenshot_filename(Some("shot.png")), "shot.jpeg");
        assert_eq!(normalize_screenshot_filename(Some("shot")), "shot.jpeg");
        assert_eq!(
            normalize_screenshot_filename(Some("a.b.png")),
            "a.b.jpeg"
        );
    }
}
