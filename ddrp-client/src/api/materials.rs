//! Raw material inventory endpoints

use super::{segment, BackendClient};
use ddrp_core::{DdrpResult, NewRawMaterial, RawMaterial};
use reqwest::Method;
use serde_json::json;

impl BackendClient {
    /// `GET /raw-materials`
    pub async fn list_raw_materials(&self, token: &str) -> DdrpResult<Vec<RawMaterial>> {
        let builder = self.request(Method::GET, "raw-materials", Some(token));
        self.send_json(builder, "list_raw_materials").await
    }

    /// `POST /raw-materials`
    pub async fn create_raw_material(
        &self,
        token: &str,
        material: &NewRawMaterial,
    ) -> DdrpResult<()> {
        let builder = self
            .request(Method::POST, "raw-materials", Some(token))
            .json(material);
        self.send(builder, "create_raw_material").await?;
        Ok(())
    }

    /// `PUT /raw-materials/{id}/consume`
    pub async fn consume_raw_material(&self, token: &str, material_id: &str) -> DdrpResult<()> {
        let endpoint = format!("raw-materials/{}/consume", segment(material_id));
        let builder = self
            .request(Method::PUT, &endpoint, Some(token))
            .json(&json!({}));
        self.send(builder, "consume_raw_material").await?;
        Ok(())
    }

    /// `DELETE /raw-materials/{id}`
    pub async fn delete_raw_material(&self, token: &str, material_id: &str) -> DdrpResult<()> {
        let endpoint = format!("raw-materials/{}", segment(material_id));
        let builder = self.request(Method::DELETE, &endpoint, Some(token));
        self.send(builder, "delete_raw_material").await?;
        Ok(())
    }

    /// `POST /raw-materials/check-natural-alerts`
    pub async fn check_natural_alerts(&self, token: &str) -> DdrpResult<serde_json::Value> {
        let builder = self
            .request(Method::POST, "raw-materials/check-natural-alerts", Some(token))
            .json(&json!({}));
        self.send_value(builder, "check_natural_alerts").await
    }
}
