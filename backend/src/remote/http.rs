//! REST client for the remote schedule service.
//!
//! Endpoints (relative to `base_url`):
//! - `GET    /users/{user_id}/enrollments`  → [`FetchScheduleResponse`]
//! - `PUT    /enrollments/schedule`         → [`CourseWithEnrollment`]
//! - `DELETE /enrollments/{enrollment_id}`  → [`RemoveCourseResponse`] (404 = already removed)
//! - `GET    /courses/reviews?ids=1,2,3`    → `Vec<ReviewStats>`
//! - `GET    /health`

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{ErrorContext, ServiceError, ServiceResult};
use super::service::ScheduleService;
use crate::api::{
    CourseId, CourseWithEnrollment, EnrollmentId, FetchScheduleResponse, RemoveCourseResponse,
    ReviewStats, UpdateCourseScheduleRequest, UserId,
};

#[derive(Clone)]
pub struct HttpScheduleService {
    client: Client,
    base_url: String,
}

impl HttpScheduleService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ServiceError::configuration(
                "HTTP schedule service requires a base URL",
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a classified error, keeping the body as details.
    async fn error_for(response: Response, context: ErrorContext) -> ServiceError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<empty response>".to_string());
        let reason = status.canonical_reason().unwrap_or("request failed");
        let mut err = ServiceError::from_status(status.as_u16(), reason);
        if let Some(op) = context.operation {
            err = err.with_operation(op);
        }
        if let (Some(entity), Some(id)) = (context.entity, context.entity_id) {
            err = err.with_entity(entity, id);
        }
        log::debug!("schedule service returned {}: {}", status, body.trim());
        err
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: ErrorContext) -> ServiceResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_for(response, context).await);
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ScheduleService for HttpScheduleService {
    async fn fetch_schedule(&self, user_id: UserId) -> ServiceResult<FetchScheduleResponse> {
        let context = ErrorContext::new("fetch_schedule")
            .with_entity("user")
            .with_entity_id(user_id);
        let response = self
            .client
            .get(self.url(&format!("/users/{}/enrollments", user_id)))
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_operation("fetch_schedule"))?;
        Self::decode(response, context).await
    }

    async fn update_course_schedule(
        &self,
        request: &UpdateCourseScheduleRequest,
    ) -> ServiceResult<CourseWithEnrollment> {
        let context = ErrorContext::new("update_course_schedule")
            .with_entity("course")
            .with_entity_id(request.course_id);
        let response = self
            .client
            .put(self.url("/enrollments/schedule"))
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_operation("update_course_schedule"))?;
        Self::decode(response, context).await
    }

    async fn remove_course_from_schedule(
        &self,
        enrollment_id: EnrollmentId,
    ) -> ServiceResult<RemoveCourseResponse> {
        let context = ErrorContext::new("remove_course_from_schedule")
            .with_entity("enrollment")
            .with_entity_id(enrollment_id);
        let response = self
            .client
            .delete(self.url(&format!("/enrollments/{}", enrollment_id)))
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_operation("remove_course_from_schedule"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RemoveCourseResponse::already_removed());
        }
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(RemoveCourseResponse::removed());
        }
        Self::decode(response, context).await
    }

    async fn fetch_review_stats(&self, course_ids: &[CourseId]) -> ServiceResult<Vec<ReviewStats>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = course_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let response = self
            .client
            .get(self.url("/courses/reviews"))
            .query(&[("ids", ids)])
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_operation("fetch_review_stats"))?;
        Self::decode(response, ErrorContext::new("fetch_review_stats")).await
    }

    async fn health_check(&self) -> ServiceResult<bool> {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) if e.is_connect() || e.is_timeout() => Ok(false),
            Err(e) => Err(ServiceError::from(e).with_operation("health_check")),
        }
    }
}
