use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("IO error\n{0}")]
    Read(#[from] std::io::Error),

    #[error("askama templating error\n{0}")]
    Askama(#[from] askama::Error),

    #[error("serde_yaml error\n{0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("config error \n{0}")]
    Config(String),

    #[error("other error \n{0}")]
    Other(String),
}

impl actix_web::error::ResponseError for BoardError {}

/// Failure of a single call against the monitoring API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("API请求失败: {0}")]
    HttpStatus(StatusCode),

    #[error("JSON解析失败: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// `success: false` or no `data` in an otherwise valid body.
    #[error("API返回失败")]
    Unsuccessful,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Network,
    HttpStatus,
    MalformedJson,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::Network => "network",
            ApiErrorKind::HttpStatus => "http-status",
            ApiErrorKind::MalformedJson => "malformed-json",
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Network(_) => ApiErrorKind::Network,
            ApiError::HttpStatus(_) => ApiErrorKind::HttpStatus,
            ApiError::MalformedJson(_) | ApiError::Unsuccessful => ApiErrorKind::MalformedJson,
        }
    }
}
