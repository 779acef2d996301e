use reqwest::Method;
use uc_transport::{HttpTransport, TransportError};

use crate::error::ApiError;
use crate::wire::{
    InventoryAttribute, LogReport, NextDeploymentRequest, NextDeploymentResponse, StatusReport,
};

/// Component E: the server API client. Wire endpoints are fixed; retry and
/// backoff live one layer up in [`crate::poller`], which this client is a
/// plain, retry-free collaborator for.
pub struct ApiClient<'a> {
    transport: &'a HttpTransport,
    server_url: String,
}

impl<'a> ApiClient<'a> {
    pub fn new(transport: &'a HttpTransport, server_url: impl Into<String>) -> Self {
        Self { transport, server_url: server_url.into() }
    }

    pub async fn poll_next_deployment(
        &self,
        req: &NextDeploymentRequest,
    ) -> Result<Option<NextDeploymentResponse>, ApiError> {
        let v2_url = format!("{}/api/devices/v2/deployments/device/deployments/next", self.server_url);
        let resp = self
            .transport
            .send(Method::POST, &v2_url, |b| b.json(req))
            .await
            .map_err(ApiError::from_transport)?;
        match resp.status().as_u16() {
            200 => Ok(Some(resp.json().await.map_err(TransportError::from)?)),
            204 => Ok(None),
            404 => self.poll_next_deployment_v1(req).await,
            403 => Err(ApiError::Forbidden),
            s if s >= 500 => Err(ApiError::ServerError(s)),
            s => Err(ApiError::UnexpectedResponse(format!("status {s}"))),
        }
    }

    async fn poll_next_deployment_v1(
        &self,
        req: &NextDeploymentRequest,
    ) -> Result<Option<NextDeploymentResponse>, ApiError> {
        let url = format!(
            "{}/api/devices/v1/deployments/device/deployments/next?artifact_name={}&device_type={}",
            self.server_url, req.artifact_name, req.device_type
        );
        let resp = self.transport.send(Method::GET, &url, |b| b).await.map_err(ApiError::from_transport)?;
        match resp.status().as_u16() {
            200 => Ok(Some(resp.json().await.map_err(TransportError::from)?)),
            204 => Ok(None),
            403 => Err(ApiError::Forbidden),
            s if s >= 500 => Err(ApiError::ServerError(s)),
            s => Err(ApiError::UnexpectedResponse(format!("status {s}"))),
        }
    }

    pub async fn push_status(&self, deployment_id: &str, report: &StatusReport) -> Result<(), ApiError> {
        let url = format!(
            "{}/api/devices/v1/deployments/device/deployments/{deployment_id}/status",
            self.server_url
        );
        let resp =
            self.transport.send(Method::PUT, &url, |b| b.json(report)).await.map_err(ApiError::from_transport)?;
        self.interpret_push_response(resp).await
    }

    pub async fn push_log(&self, deployment_id: &str, log: &LogReport) -> Result<(), ApiError> {
        let url =
            format!("{}/api/devices/v1/deployments/device/deployments/{deployment_id}/log", self.server_url);
        let resp =
            self.transport.send(Method::PUT, &url, |b| b.json(log)).await.map_err(ApiError::from_transport)?;
        self.interpret_push_response(resp).await
    }

    pub async fn push_inventory(&self, attributes: &[InventoryAttribute]) -> Result<(), ApiError> {
        let url = format!("{}/api/devices/v1/inventory/device/attributes", self.server_url);
        let resp = self
            .transport
            .send(Method::PUT, &url, |b| b.json(attributes))
            .await
            .map_err(ApiError::from_transport)?;
        self.interpret_push_response(resp).await
    }

    async fn interpret_push_response(&self, resp: reqwest::Response) -> Result<(), ApiError> {
        match resp.status().as_u16() {
            200..=299 => Ok(()),
            409 => Err(ApiError::DeploymentAborted),
            403 => Err(ApiError::Forbidden),
            s if s >= 500 => Err(ApiError::ServerError(s)),
            s => Err(ApiError::UnexpectedResponse(format!("status {s}"))),
        }
    }
}
