//! Order endpoints

use super::{segment, BackendClient};
use chrono::{DateTime, SecondsFormat, Utc};
use ddrp_core::{DdrpResult, NewOrder, Order, OrderStatus};
use log::info;
use reqwest::Method;
use serde_json::json;

impl BackendClient {
    /// `GET /orders`: every order (admin)
    pub async fn list_orders(&self, token: &str) -> DdrpResult<Vec<Order>> {
        let builder = self.request(Method::GET, "orders", Some(token));
        self.send_json(builder, "list_orders").await
    }

    /// `GET /orders/{userId}`: orders placed by one customer
    pub async fn list_user_orders(&self, token: &str, user_id: &str) -> DdrpResult<Vec<Order>> {
        let endpoint = format!("orders/{}", segment(user_id));
        let builder = self.request(Method::GET, &endpoint, Some(token));
        self.send_json(builder, "list_user_orders").await
    }

    /// `POST /orders`
    pub async fn create_order(&self, token: &str, order: &NewOrder) -> DdrpResult<Order> {
        let builder = self.request(Method::POST, "orders", Some(token)).json(order);
        let created: Order = self.send_json(builder, "create_order").await?;
        info!("Placed order {} for {}", created.id, created.product);
        Ok(created)
    }

    /// `PUT /orders/{id}/status`
    pub async fn update_order_status(
        &self,
        token: &str,
        order_id: &str,
        status: OrderStatus,
    ) -> DdrpResult<()> {
        let endpoint = format!("orders/{}/status", segment(order_id));
        let builder = self
            .request(Method::PUT, &endpoint, Some(token))
            .json(&json!({ "status": status }));
        self.send(builder, "update_order_status").await?;
        Ok(())
    }

    /// `DELETE /orders/{id}`
    pub async fn delete_order(&self, token: &str, order_id: &str) -> DdrpResult<()> {
        let endpoint = format!("orders/{}", segment(order_id));
        let builder = self.request(Method::DELETE, &endpoint, Some(token));
        self.send(builder, "delete_order").await?;
        Ok(())
    }

    /// `PUT /orders/{id}/expected-delivery`
    ///
    /// The date is sent as an ISO-8601 UTC timestamp with millisecond precision.
    pub async fn update_expected_delivery(
        &self,
        token: &str,
        order_id: &str,
        expected: DateTime<Utc>,
    ) -> DdrpResult<()> {
        let endpoint = format!("orders/{}/expected-delivery", segment(order_id));
        let builder = self
            .request(Method::PUT, &endpoint, Some(token))
            .json(&json!({
                "expected_delivery_date": expected.to_rfc3339_opts(SecondsFormat::Millis, true)
            }));
        self.send(builder, "update_expected_delivery").await?;
        Ok(())
    }

    /// `POST /orders/check-delays`: ask the backend to flag late orders
    pub async fn check_delays(&self, token: &str) -> DdrpResult<serde_json::Value> {
        let builder = self
            .request(Method::POST, "orders/check-delays", Some(token))
            .json(&json!({}));
        self.send_value(builder, "check_delays").await
    }
}
