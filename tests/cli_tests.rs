//! 命令行进程退出行为测试

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

// =============================================================================
// 测试辅助函数
// =============================================================================

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shortlinker-insights"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn binary")
}

/// 写入日志到文件的配置和一个空快照
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[logging]\nlevel = \"info\"\nfile = \"insights.log\"\nenable_rotation = false\n",
    )
    .unwrap();
    fs::write(dir.path().join("seed.json"), r#"{"links": [], "clicks": []}"#).unwrap();
    dir
}

// =============================================================================
// 失败路径
// =============================================================================

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_failed_command_exits_nonzero_and_flushes_log() {
        let dir = workspace();
        let output = run(
            dir.path(),
            &["report", "7", "--seed", "seed.json", "--no-cache"],
        );
        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());

        // 退出前 WorkerGuard 已释放，缓冲的日志写入文件
        let log = fs::read_to_string(dir.path().join("insights.log")).unwrap();
        assert!(log.contains("Command failed"));
    }

    #[test]
    fn test_generate_config_refuses_to_overwrite() {
        let dir = workspace();
        let output = run(dir.path(), &["generate-config", "config.toml"]);
        assert_eq!(output.status.code(), Some(1));

        let config = fs::read_to_string(dir.path().join("config.toml")).unwrap();
        assert!(config.starts_with("[logging]"));
    }
}
