//! 계층형 설정 로드.
//!
//! 우선순위 (뒤가 이긴다):
//! 1. 내장 기본값 ([`AppConfig::default_config`])
//! 2. 설정 파일 (JSON/TOML/YAML, 확장자로 판별)
//! 3. `LABELSCAN__` 접두 환경변수 (`LABELSCAN__SERVER__PORT=8080`)
//! 4. 기존 배포 호환 변수 `DEEPSEEK_API_KEY`, `PORT`

use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::CoreError;

/// 환경변수 접두어
pub const ENV_PREFIX: &str = "LABELSCAN";

/// LLM API 키 호환 변수
pub const LEGACY_API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

/// 포트 호환 변수
pub const LEGACY_PORT_VAR: &str = "PORT";

/// 설정 로더
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    /// 설정 파일 경로 (없으면 기본값 + 환경변수만)
    file: Option<PathBuf>,
    /// 환경변수 스냅샷: None이면 프로세스 환경을 읽는다
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정 파일 지정 (반드시 존재해야 함)
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// 프로세스 환경 대신 주어진 변수 맵 사용
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    fn env_var(&self, key: &str) -> Option<String> {
        match &self.env {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
        .filter(|v| !v.trim().is_empty())
    }

    /// 설정 로드 및 역직렬화
    pub fn load(&self) -> Result<AppConfig, CoreError> {
        let defaults = Config::try_from(&AppConfig::default_config())
            .map_err(|e| CoreError::Config(format!("기본 설정 직렬화 실패: {e}")))?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = &self.file {
            info!("설정 파일 로드: {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let mut environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        if let Some(vars) = &self.env {
            environment = environment.source(Some(vars.clone().into_iter().collect()));
        }
        builder = builder.add_source(environment);

        if let Some(key) = self.env_var(LEGACY_API_KEY_VAR) {
            debug!("{} 환경변수에서 LLM API 키 적용", LEGACY_API_KEY_VAR);
            builder = builder
                .set_override("ai_provider.llm_api.api_key", key)
                .map_err(|e| CoreError::Config(e.to_string()))?;
        }
        if let Some(port) = self.env_var(LEGACY_PORT_VAR) {
            let port: u16 = port.trim().parse().map_err(|_| {
                CoreError::Config(format!("{LEGACY_PORT_VAR} 값이 포트 번호가 아님: {port}"))
            })?;
            builder = builder
                .set_override("server.port", i64::from(port))
                .map_err(|e| CoreError::Config(e.to_string()))?;
        }

        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::Config(format!("설정 로드 실패: {e}")))?;

        config.validate()?;
        Ok(config)
    }
}
