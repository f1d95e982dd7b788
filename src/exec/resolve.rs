// src/exec/resolve.rs
// Best-effort resolution of configured executable paths

use std::path::PathBuf;

/// Expand `~` and `$VAR`/`${VAR}` references, then resolve a configured path
/// to an executable file.
///
/// Resolution never fails: if the path does not exist (a bare command name
/// looked up via PATH, or a typo'd location) it is returned unchanged and
/// the spawn itself reports the problem. If the path is a directory, the
/// well-known candidate locations are probed in order and the first regular
/// file wins; when none match, the directory is returned unchanged.
pub fn resolve_executable(configured: &str, candidates: &[&str]) -> PathBuf {
    let path = PathBuf::from(expand_path(configured));

    if !path.exists() || path.is_file() {
        return path;
    }

    if path.is_dir() {
        for rel in candidates {
            let candidate = path.join(rel);
            if candidate.is_file() {
                return candidate;
            }
        }
    }

    path
}

/// Expand environment variables and a leading `~` in a user-supplied path.
pub fn expand_path(input: &str) -> String {
    let expanded = expand_env_vars(input);

    if expanded == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().into_owned();
        }
    } else if let Some(rest) = expanded.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }

    expanded
}

/// Substitute `$VAR` and `${VAR}` with their environment values. Unknown
/// variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() {
            if chars[i + 1] == '{' {
                if let Some(close) = chars[i + 2..].iter().position(|&c| c == '}') {
                    let name: String = chars[i + 2..i + 2 + close].iter().collect();
                    match std::env::var(&name) {
                        Ok(value) => out.push_str(&value),
                        Err(_) => {
                            out.push_str("${");
                            out.push_str(&name);
                            out.push('}');
                        }
                    }
                    i += close + 3;
                    continue;
                }
            } else if chars[i + 1] == '_' || chars[i + 1].is_ascii_alphanumeric() {
                let mut end = i + 1;
                while end < chars.len() && (chars[end] == '_' || chars[end].is_ascii_alphanumeric())
                {
                    end += 1;
                }
                let name: String = chars[i + 1..end].iter().collect();
                match std::env::var(&name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('$');
                        out.push_str(&name);
                    }
                }
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}
