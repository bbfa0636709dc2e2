//! Agent (app) listing types

use serde::{Deserialize, Serialize};

/// An agent instance published on the platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentApp {
    pub app_code: Option<String>,
    pub app_name: Option<String>,
    pub app_describe: Option<String>,
    pub team_mode: Option<String>,
    pub published: Option<bool>,
    pub user_code: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One page of agent instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentAppPage {
    pub total_count: u64,
    pub total_page: u64,
    pub current_page: u64,
    pub page_size: u64,
    pub app_list: Vec<AgentApp>,
}

impl Default for AgentAppPage {
    fn default() -> Self {
        Self {
            total_count: 0,
            total_page: 0,
            current_page: 0,
            page_size: 20,
            app_list: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: AgentAppPage =
            serde_json::from_value(json!({"app_list": [{"app_code": "a1"}]})).unwrap();
        assert_eq!(page.page_size, 20);
        assert_eq!(page.app_list.len(), 1);
        assert_eq!(page.app_list[0].app_code.as_deref(), Some("a1"));
        assert_eq!(page.app_list[0].published, None);
    }
}
