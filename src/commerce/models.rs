//! OCC v2 response records.
//!
//! Only the fields the formatters read are modelled. Every field is
//! optional: OCC trims responses according to the `fields` level the
//! caller asked for, so absence is normal and never an error. Counts and
//! amounts stay as `serde_json::Number` so they print exactly as the API
//! sent them.

use serde::Deserialize;
use serde_json::Number;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub value: Option<Number>,
    pub currency_iso: Option<String>,
    pub formatted_value: Option<String>,
}

impl Price {
    /// `formattedValue`, or `<value> <currency>` when the API left it out.
    pub fn display(&self) -> String {
        if let Some(formatted) = &self.formatted_value {
            return formatted.clone();
        }
        match (&self.value, &self.currency_iso) {
            (Some(value), Some(currency)) => format!("{value} {currency}"),
            (Some(value), None) => value.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub stock_level: Option<Number>,
    pub stock_level_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<Stock>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: Option<i64>,
    pub page_size: Option<i64>,
    pub total_results: Option<Number>,
    pub total_pages: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchPage {
    pub products: Option<Vec<Product>>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseSite {
    pub uid: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseSiteList {
    pub base_sites: Option<Vec<BaseSite>>,
}

/// `{code, name}` pair: cost centers, card types, entry delivery modes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeName {
    pub code: Option<String>,
    pub name: Option<String>,
}

/// `{uid, name}` pair: users and organizational units.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Principal {
    pub uid: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    pub code: Option<String>,
    pub status: Option<String>,
    pub status_display: Option<String>,
    pub placed: Option<String>,
    pub total: Option<Price>,
    pub purchase_order_number: Option<String>,
    pub cost_center: Option<CodeName>,
    pub org_unit: Option<Principal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryPage {
    pub orders: Option<Vec<OrderHistory>>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryProduct {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfService {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

impl PointOfService {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// Line item of a cart or an order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub entry_number: Option<Number>,
    pub quantity: Option<Number>,
    pub base_price: Option<Price>,
    pub total_price: Option<Price>,
    pub product: Option<EntryProduct>,
    pub delivery_mode: Option<CodeName>,
    pub delivery_point_of_service: Option<PointOfService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Country {
    pub isocode: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub town: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub country: Option<Country>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryMode {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub delivery_cost: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryModeList {
    pub delivery_modes: Option<Vec<DeliveryMode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub account_holder_name: Option<String>,
    pub card_type: Option<CodeName>,
    pub card_number: Option<String>,
    pub expiry_month: Option<String>,
    pub expiry_year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub code: Option<String>,
    pub status: Option<String>,
    pub status_display: Option<String>,
    pub placed: Option<String>,
    pub sub_total: Option<Price>,
    pub delivery_cost: Option<Price>,
    pub total_tax: Option<Price>,
    pub total_price_with_tax: Option<Price>,
    pub total_price: Option<Price>,
    pub entries: Option<Vec<Entry>>,
    pub delivery_mode: Option<DeliveryMode>,
    pub delivery_address: Option<Address>,
    pub purchase_order_number: Option<String>,
    pub cost_center: Option<CodeName>,
    pub org_unit: Option<Principal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2BOrder {
    #[serde(flatten)]
    pub order: Order,
    pub created: Option<String>,
    pub org_customer: Option<Principal>,
    pub sap_quote_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Promotion {
    pub code: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromotionResult {
    pub promotion: Option<Promotion>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Currency {
    pub isocode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Voucher {
    pub code: Option<String>,
    pub name: Option<String>,
    pub value: Option<Number>,
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartMessage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub code: Option<String>,
    pub user: Option<Principal>,
    pub total_items: Option<Number>,
    pub total_unit_count: Option<Number>,
    pub sub_total: Option<Price>,
    pub delivery_cost: Option<Price>,
    pub total_tax: Option<Price>,
    pub total_price_with_tax: Option<Price>,
    pub total_price: Option<Price>,
    pub delivery_mode: Option<DeliveryMode>,
    pub delivery_address: Option<Address>,
    pub payment_info: Option<PaymentInfo>,
    pub purchase_order_number: Option<String>,
    pub cost_center: Option<CodeName>,
    pub entries: Option<Vec<Entry>>,
    pub applied_order_promotions: Option<Vec<PromotionResult>>,
    pub applied_vouchers: Option<Vec<Voucher>>,
    #[serde(rename = "_messages")]
    pub messages: Option<Vec<CartMessage>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentType {
    pub code: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgCustomer {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub org_unit: Option<Principal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2BCart {
    #[serde(flatten)]
    pub cart: Cart,
    pub name: Option<String>,
    pub created: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub org_customer: Option<OrgCustomer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartModification {
    pub entry: Option<Entry>,
    pub quantity: Option<Number>,
    pub quantity_added: Option<Number>,
    pub status_code: Option<String>,
    pub status_message: Option<String>,
}
