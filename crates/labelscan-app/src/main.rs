//! LABELSCAN 서버 진입점.
//!
//! 설정 로드 → 어댑터 생성 → HTTP 서버 실행 → 시그널 수신 시 graceful shutdown.

mod lifecycle;
mod wiring;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use labelscan_core::config::AppConfig;
use labelscan_core::config_loader::ConfigLoader;
use labelscan_web::WebServer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;

/// 혈액제제 라벨 인식 서버
///
/// 라벨 사진을 받아 OCR 후 제제 종류, 혈액형, Rh 인자, 유효기간을 JSON으로 돌려준다.
#[derive(Parser, Debug)]
#[command(name = "labelscan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (JSON/TOML/YAML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 바인드 주소 (설정/환경변수보다 우선)
    #[arg(long)]
    host: Option<String>,

    /// 포트 (설정/환경변수보다 우선)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

/// 설정 파일 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// 기본 경로의 파일은 있을 때만 읽는다.
/// - macOS: `~/Library/Application Support/com.labelscan.server/config.toml`
/// - Linux: `~/.config/labelscan/config.toml`
fn resolve_config_path(cli: Option<PathBuf>) -> Option<PathBuf> {
    cli.or_else(|| {
        ProjectDirs::from("com", "labelscan", "server")
            .map(|p| p.config_dir().join("config.toml"))
            .filter(|p| p.is_file())
    })
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = resolve_config_path(args.config.clone()) {
        loader = loader.with_file(path);
    }
    let mut config = loader.load().context("설정 로드 실패")?;

    // CLI 인자로 설정 오버라이드
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "labelscan={lvl},labelscan_app={lvl},labelscan_core={lvl},labelscan_extraction={lvl},labelscan_network={lvl},labelscan_vision={lvl},labelscan_web={lvl},tower_http={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("LABELSCAN 서버 시작 (v{})", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;

    std::fs::create_dir_all(&config.upload.dir).with_context(|| {
        format!(
            "업로드 디렉토리 생성 실패: {}",
            config.upload.dir.display()
        )
    })?;
    info!(dir = %config.upload.dir.display(), "업로드 디렉토리");

    let ocr = wiring::build_ocr_provider(&config)?;
    let extractor = wiring::build_extractor(&config)?;
    let images = wiring::build_image_source(&config.upload)?;

    let server = WebServer::new(
        config.server.clone(),
        config.upload.clone(),
        ocr,
        extractor,
        images,
    );
    info!("서버 주소: {}", server.url());

    let lifecycle = Arc::new(LifecycleManager::new());
    let shutdown_rx = lifecycle.subscribe();

    let signal_task = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move {
            if let Err(e) = lifecycle.wait_for_signal().await {
                error!("시그널 핸들러 등록 실패: {}", e);
            }
        })
    };

    server
        .run(shutdown_rx)
        .await
        .context("웹 서버 실행 실패")?;

    signal_task.abort();
    info!("LABELSCAN 서버 종료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_port_and_host() {
        let args = Args::parse_from(["labelscan", "--port", "8088", "--host", "0.0.0.0"]);
        assert_eq!(args.port, Some(8088));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = PathBuf::from("/tmp/labelscan-test.toml");
        assert_eq!(resolve_config_path(Some(path.clone())), Some(path));
    }
}
