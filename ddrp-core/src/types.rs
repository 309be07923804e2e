//! Core data types: configuration sections and backend records

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DdrpConfig {
    pub api: ApiConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the order/invoice/inventory backend
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

/// Session persistence and expiry sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// File holding the persisted `token`, `role` and `userId` entries
    pub storage_path: String,
    /// Seconds between background expiry checks
    pub expiry_check_interval_secs: u64,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Body of a successful `POST /token`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Production stage of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    #[serde(rename = "In Production")]
    InProduction,
    Dispatched,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProduction,
        OrderStatus::Dispatched,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InProduction => "In Production",
            OrderStatus::Dispatched => "Dispatched",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "in production" => Ok(OrderStatus::InProduction),
            "dispatched" => Ok(OrderStatus::Dispatched),
            "delivered" => Ok(OrderStatus::Delivered),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product: String,
    pub quantity: u32,
    pub status: OrderStatus,
    pub order_date: String,
    #[serde(default)]
    pub expected_delivery_date: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
}

/// Body of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub product: String,
    pub quantity: u32,
}

/// Rubber compound supplied as raw material
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RubberType {
    Natural,
    Nitrile,
    #[serde(rename = "EPDM")]
    Epdm,
    Neoprene,
    #[serde(rename = "Styrene Butadiene")]
    StyreneButadiene,
    Butyl,
    Silicone,
}

impl RubberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RubberType::Natural => "Natural",
            RubberType::Nitrile => "Nitrile",
            RubberType::Epdm => "EPDM",
            RubberType::Neoprene => "Neoprene",
            RubberType::StyreneButadiene => "Styrene Butadiene",
            RubberType::Butyl => "Butyl",
            RubberType::Silicone => "Silicone",
        }
    }
}

impl fmt::Display for RubberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RubberType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "natural" => Ok(RubberType::Natural),
            "nitrile" => Ok(RubberType::Nitrile),
            "epdm" => Ok(RubberType::Epdm),
            "neoprene" => Ok(RubberType::Neoprene),
            "styrene butadiene" | "sbr" => Ok(RubberType::StyreneButadiene),
            "butyl" => Ok(RubberType::Butyl),
            "silicone" => Ok(RubberType::Silicone),
            _ => Err(format!("Unknown rubber type: {}", s)),
        }
    }
}

/// Raw material batch tracked against an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawMaterial {
    pub id: String,
    pub order_id: String,
    pub batch_no: String,
    pub recipe_no: String,
    pub raw_material_quantity: f64,
    pub rubber_type: String,
    pub arrival_date: String,
    #[serde(default)]
    pub consumption_date: Option<String>,
    #[serde(default)]
    pub consumption_deadline: Option<String>,
}

impl RawMaterial {
    pub fn is_consumed(&self) -> bool {
        self.consumption_date.is_some()
    }
}

/// Body of `POST /raw-materials`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRawMaterial {
    pub order_id: String,
    pub batch_no: String,
    pub recipe_no: String,
    pub raw_material_quantity: f64,
    pub rubber_type: RubberType,
}

/// Line item of a GST invoice draft, as sent to `POST /invoices/gst`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub hsn_code: String,
    pub description: String,
    pub quantity: u32,
    pub rate: f64,
    pub cgst_percent: f64,
    pub sgst_percent: f64,
    pub igst_percent: f64,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            hsn_code: String::new(),
            description: String::new(),
            quantity: 1,
            rate: 0.0,
            cgst_percent: 0.0,
            sgst_percent: 0.0,
            igst_percent: 0.0,
        }
    }
}

/// Body of `POST /invoices/gst`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GstInvoiceRequest {
    pub order_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_gstin: Option<String>,
    pub customer_address: Option<String>,
    pub delivery_note_no: Option<String>,
    pub buyer_order_no: Option<String>,
    pub dispatch_through: Option<String>,
    pub dispatch_doc_no: Option<String>,
    pub line_items: Vec<LineItem>,
    pub discount_percent: f64,
    pub notes: Option<String>,
}

/// Server-computed invoice line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    pub hsn_code: String,
    pub description: String,
    pub quantity: u32,
    pub rate: f64,
    pub amount: f64,
    pub cgst_percent: f64,
    pub sgst_percent: f64,
    pub igst_percent: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub total_with_tax: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_gstin: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub line_items: Vec<InvoiceLineItem>,
    pub subtotal: f64,
    pub total_cgst: f64,
    pub total_sgst: f64,
    pub total_igst: f64,
    pub total_tax: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
    /// Kept as text: the backend may report states beyond [`InvoiceStatus`]
    pub status: String,
    pub issue_date: String,
    pub due_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Invoice states a client may set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Pending => f.write_str("Pending"),
            InvoiceStatus::Paid => f.write_str("Paid"),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}
