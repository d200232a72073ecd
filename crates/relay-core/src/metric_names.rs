//! Metric names shared by every crate that records them.

/// Registered subscriptions (gauge).
pub const RELAY_SUBSCRIPTIONS_ACTIVE: &str = "relay_subscriptions_active";
/// Register attempts (counter, labels: outcome).
pub const RELAY_REGISTER_TOTAL: &str = "relay_register_total";
/// Unregister attempts (counter, labels: outcome).
pub const RELAY_UNREGISTER_TOTAL: &str = "relay_unregister_total";
/// Inbound notifications (counter, labels: outcome).
pub const RELAY_NOTIFICATIONS_TOTAL: &str = "relay_notifications_total";
/// Token renewals (counter, labels: status).
pub const AUTH_REFRESH_TOTAL: &str = "auth_refresh_total";
/// WebSocket connections opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Open WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Frames dropped because a session's queue was full (counter).
pub const WS_DELIVERY_DROPS_TOTAL: &str = "ws_delivery_drops_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            RELAY_SUBSCRIPTIONS_ACTIVE,
            RELAY_REGISTER_TOTAL,
            RELAY_UNREGISTER_TOTAL,
            RELAY_NOTIFICATIONS_TOTAL,
            AUTH_REFRESH_TOTAL,
            WS_CONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            WS_DELIVERY_DROPS_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
