use super::{decode, success_data, OpenDeriskClient};
use crate::error::ClientError;
use crate::http::ApiRequest;
use crate::protocol::AgentAppPage;
use serde_json::json;

impl OpenDeriskClient {
    /// One page of agent instances across all users
    pub async fn list_apps(&self, page: u32, page_size: u32) -> Result<AgentAppPage, ClientError> {
        let request = ApiRequest::post("/api/v1/app/list").with_body(json!({
            "page": page,
            "page_size": page_size,
            "ignore_user": "true",
        }));

        let envelope = self.transport.request(request).await?;
        match success_data(envelope, "Failed to list apps")? {
            Some(data) => decode(data),
            None => Ok(AgentAppPage::default()),
        }
    }
}
