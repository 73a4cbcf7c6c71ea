use serde::{Deserialize, Serialize};

use crate::shadow::BoolCoercion;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub gateway_base_url: String,
    pub node_id: u32,
    pub history_minutes: u32,
    pub poll_period_secs: u64,
    pub http_port: u16,
    pub timezone: String,
    pub bool_coercion: BoolCoercion,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            gateway_base_url: "http://127.0.0.1:9000".to_string(),
            node_id: 1,
            history_minutes: 60,
            poll_period_secs: 30,
            http_port: 8080,
            timezone: "America/Los_Angeles".to_string(),
            bool_coercion: BoolCoercion::StrictString,
        }
    }
}

impl DashboardConfig {
    pub fn sanitize(&mut self) {
        self.poll_period_secs = self.poll_period_secs.clamp(1, 3600);
        self.history_minutes = self.history_minutes.clamp(1, 10_080);
        if self.node_id == 0 {
            self.node_id = 1;
        }
        while self.gateway_base_url.ends_with('/') {
            self.gateway_base_url.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitize_clamps_nonsense() {
        let mut config = DashboardConfig {
            gateway_base_url: "http://gw.example//".to_string(),
            node_id: 0,
            history_minutes: 0,
            poll_period_secs: 86_400,
            ..DashboardConfig::default()
        };
        config.sanitize();

        assert_eq!(config.gateway_base_url, "http://gw.example");
        assert_eq!(config.node_id, 1);
        assert_eq!(config.history_minutes, 1);
        assert_eq!(config.poll_period_secs, 3600);
    }
}
