//! Schedule service factory for dependency injection.
//!
//! Picks and builds a [`ScheduleService`] implementation from configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::error::{ServiceError, ServiceResult};
#[cfg(feature = "http-client")]
use super::http::HttpScheduleService;
#[cfg(feature = "local-service")]
use super::local::LocalScheduleService;
use super::service::ScheduleService;
use crate::config::EngineConfig;

/// Schedule service implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    /// In-memory service
    Local,
    /// REST client for the remote service
    Http,
}

impl FromStr for ServiceType {
    type Err = String;

    /// Parse a service type ("local", "memory", "http", "rest"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "http" | "rest" => Ok(Self::Http),
            _ => Err(format!("Unknown service type: {}", s)),
        }
    }
}

pub struct ServiceFactory;

impl ServiceFactory {
    /// Create the service described by `config`.
    pub fn create(config: &EngineConfig) -> ServiceResult<Arc<dyn ScheduleService>> {
        let service_type = config
            .service
            .service_type()
            .map_err(|e| ServiceError::configuration(e.to_string()))?;

        match service_type {
            ServiceType::Local => Self::create_local(),
            ServiceType::Http => {
                #[cfg(feature = "http-client")]
                {
                    let service = HttpScheduleService::new(
                        config.service.base_url.clone(),
                        config.service.request_timeout(),
                    )?;
                    Ok(Arc::new(service) as Arc<dyn ScheduleService>)
                }
                #[cfg(not(feature = "http-client"))]
                {
                    Err(ServiceError::configuration(
                        "HTTP schedule service feature not enabled",
                    ))
                }
            }
        }
    }

    /// Create an empty in-memory service.
    pub fn create_local() -> ServiceResult<Arc<dyn ScheduleService>> {
        #[cfg(feature = "local-service")]
        {
            Ok(Arc::new(LocalScheduleService::new()) as Arc<dyn ScheduleService>)
        }
        #[cfg(not(feature = "local-service"))]
        {
            Err(ServiceError::configuration(
                "Local schedule service feature not enabled",
            ))
        }
    }
}
