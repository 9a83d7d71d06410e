//! B2C tools: catalog, cart, checkout and orders.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::api::CommerceApi;
use super::format::{
    address_lines, format_cart, format_delivery_modes, format_order_details,
    format_order_history, format_product,
};
use super::models::{
    Address, BaseSiteList, Cart, CartModification, DeliveryModeList, Order, OrderHistoryPage,
    ProductSearchPage,
};
use crate::context::CallContext;
use crate::error::ToolError;
use crate::tools::{
    InputSchema, ParamType, RegistryError, ToolDescriptor, ToolHandler, ToolRegistry, ToolResponse,
    parse_args,
};

/// Most orders `order-history` will ever ask for.
const ORDER_HISTORY_LIMIT: i64 = 5;

const BASE_SITE_DOC: &str = "Base site identifier (e.g., 'electronics-spa')";
const USER_DOC: &str = "User identifier (use 'current' for authenticated user)";
const CART_DOC: &str = "Cart identifier (default: 'current')";
const FIELDS_DOC: &str = "Response field configuration";

pub(crate) fn required<T>(value: Option<T>, message: impl Into<String>) -> Result<T, ToolError> {
    value.ok_or_else(|| ToolError::UnexpectedResponse {
        message: message.into(),
    })
}

/// `\n**Status:** <code>[ - <message>]` for a non-success modification.
pub(crate) fn status_suffix(modification: &CartModification) -> String {
    match modification.status_code.as_deref() {
        Some(code) if !code.is_empty() && code != "success" => {
            let mut out = format!("\n**Status:** {code}");
            if let Some(message) = modification.status_message.as_deref().filter(|m| !m.is_empty())
            {
                out.push_str(&format!(" - {message}"));
            }
            out
        }
        _ => String::new(),
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// ============================================================================
// product-search
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductSearchArgs {
    base_site_id: String,
    query: Option<String>,
    page_size: i64,
    current_page: i64,
    fields: String,
}

struct ProductSearch {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for ProductSearch {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: ProductSearchArgs = parse_args(args)?;
        let site = args.base_site_id.as_str();
        let query = non_empty(&args.query);

        let page_size = args.page_size.to_string();
        let current_page = args.current_page.to_string();
        let mut params = vec![
            ("pageSize", page_size.as_str()),
            ("currentPage", current_page.as_str()),
            ("fields", args.fields.as_str()),
        ];
        params.extend(query.map(|q| ("query", q)));

        let url = self.api.endpoint(&[site, "products", "search"], &params);
        let page: ProductSearchPage = required(
            self.api.get(url, ctx).await?,
            "Failed to retrieve product search data from SAP Commerce API",
        )?;

        let products = page.products.unwrap_or_default();
        if products.is_empty() {
            return Ok(ToolResponse::text(match query {
                Some(q) => format!("No products found for query \"{q}\" in base site \"{site}\""),
                None => format!("No products found in base site \"{site}\""),
            }));
        }

        let summary = match query {
            Some(q) => format!("Product search results for \"{q}\" in {site}:"),
            None => format!("Product listing for {site}:"),
        };
        let pagination = page
            .pagination
            .map(|p| {
                format!(
                    "\n\nShowing page {} of {} ({} total results)",
                    p.current_page.unwrap_or(0) + 1,
                    p.total_pages.map(|n| n.to_string()).unwrap_or_default(),
                    p.total_results.map(|n| n.to_string()).unwrap_or_default()
                )
            })
            .unwrap_or_default();
        let listing: Vec<String> = products.iter().map(format_product).collect();

        Ok(ToolResponse::text(format!(
            "{summary}{pagination}\n\n{}",
            listing.join("\n")
        )))
    }
}

fn product_search(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "product-search",
        "Search for products in SAP Commerce. Requests go to the gateway's configured \
         OCC base URL; a baseSiteUrl argument is accepted but ignored.",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .optional(
                "baseSiteUrl",
                ParamType::String,
                "Ignored. The OCC base URL is set by the gateway's configuration",
            )
            .optional("query", ParamType::String, "Search query for products")
            .with_default("pageSize", ParamType::Integer, 20, "Number of results per page")
            .with_default("currentPage", ParamType::Integer, 0, "Page number (0-based)")
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(ProductSearch {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error searching products")
}

// ============================================================================
// get-base-sites
// ============================================================================

#[derive(Debug, Deserialize)]
struct BaseSitesArgs {
    fields: String,
}

struct GetBaseSites {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetBaseSites {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: BaseSitesArgs = parse_args(args)?;
        let url = self
            .api
            .endpoint(&["basesites"], &[("fields", args.fields.as_str())]);

        let sites = required(
            self.api
                .get::<BaseSiteList>(url, ctx)
                .await?
                .and_then(|list| list.base_sites),
            "No base sites found or failed to retrieve base sites",
        )?;

        let lines: Vec<String> = sites
            .iter()
            .map(|site| {
                let uid = site.uid.as_deref().unwrap_or_default();
                let name = non_empty(&site.name).unwrap_or(uid);
                format!("- **{uid}**: {name}")
            })
            .collect();

        Ok(ToolResponse::text(format!(
            "Available base sites:\n\n{}",
            lines.join("\n")
        )))
    }
}

fn get_base_sites(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get-base-sites",
        "Get available base sites from SAP Commerce",
        InputSchema::new().with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(GetBaseSites {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error retrieving base sites")
}

// ============================================================================
// order-history / order-details
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderHistoryArgs {
    base_site_id: String,
    user_id: String,
    page_size: i64,
    statuses: Option<String>,
    fields: String,
}

struct GetOrderHistory {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetOrderHistory {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: OrderHistoryArgs = parse_args(args)?;
        let (site, user) = (args.base_site_id.as_str(), args.user_id.as_str());

        let page_size = args.page_size.min(ORDER_HISTORY_LIMIT).to_string();
        let mut params = vec![
            ("pageSize", page_size.as_str()),
            ("currentPage", "0"),
            ("fields", args.fields.as_str()),
        ];
        params.extend(non_empty(&args.statuses).map(|s| ("statuses", s)));

        let url = self.api.endpoint(&[site, "users", user, "orders"], &params);
        let page: OrderHistoryPage = required(
            self.api.get(url, ctx).await?,
            "Failed to retrieve order history from SAP Commerce API",
        )?;

        let orders = page.orders.unwrap_or_default();
        if orders.is_empty() {
            return Ok(ToolResponse::text(format!(
                "No orders found for user \"{user}\" in base site \"{site}\""
            )));
        }

        let summary = format!(
            "Order history for {user} in {site} ({} most recent orders):",
            orders.len()
        );
        let pagination = page
            .pagination
            .map(|p| {
                format!(
                    "\n\nShowing {} of {} total orders",
                    orders.len(),
                    p.total_results.map(|n| n.to_string()).unwrap_or_default()
                )
            })
            .unwrap_or_default();
        let listing: Vec<String> = orders.iter().map(format_order_history).collect();

        Ok(ToolResponse::text(format!(
            "{summary}{pagination}\n\n{}",
            listing.join("\n")
        )))
    }
}

fn order_history(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "order-history",
        "Get user's order history from SAP Commerce (limited to 5 most recent orders)",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .with_default("pageSize", ParamType::Integer, ORDER_HISTORY_LIMIT, "Number of orders to retrieve (max 5)")
            .optional("statuses", ParamType::String, "Filter by order statuses (comma-separated)")
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(GetOrderHistory {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error retrieving order history")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetailsArgs {
    base_site_id: String,
    user_id: String,
    order_code: String,
    fields: String,
}

struct GetOrderDetails {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetOrderDetails {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: OrderDetailsArgs = parse_args(args)?;
        let code = args.order_code.as_str();
        let url = self.api.endpoint(
            &[&args.base_site_id, "users", &args.user_id, "orders", code],
            &[("fields", args.fields.as_str())],
        );

        let order: Order = required(
            self.api.get(url, ctx).await?,
            format!("Failed to retrieve order details for order \"{code}\" from SAP Commerce API"),
        )?;

        Ok(ToolResponse::text(format!(
            "Order details for {code}:\n\n{}",
            format_order_details(&order)
        )))
    }
}

fn order_details(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "order-details",
        "Get detailed information about a specific order from SAP Commerce. The user will provide the order code, also known as order number or order id.",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .required("orderCode", ParamType::String, "Order code/identifier to retrieve details for")
            .with_default("fields", ParamType::String, "FULL", "Response field configuration (DEFAULT, BASIC, FULL)"),
        Arc::new(GetOrderDetails {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error retrieving order details")
}

// ============================================================================
// add-to-cart / get-cart / update-cart-entry
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartArgs {
    base_site_id: String,
    user_id: String,
    product_code: String,
    quantity: i64,
    pickup_store: Option<String>,
    fields: String,
}

struct AddToCart {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for AddToCart {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: AddToCartArgs = parse_args(args)?;
        let pickup_store = non_empty(&args.pickup_store);

        let mut body = json!({
            "product": {"code": args.product_code},
            "quantity": args.quantity,
        });
        if let Some(store) = pickup_store {
            body["deliveryPointOfService"] = json!({"name": store});
        }

        let url = self.api.endpoint(
            &[&args.base_site_id, "users", &args.user_id, "carts", "current", "entries"],
            &[("fields", args.fields.as_str())],
        );
        let modification: CartModification = required(
            self.api.send(Method::POST, url, Some(body), ctx).await?,
            "Failed to add product to cart via SAP Commerce API",
        )?;

        let mut text = String::from("Product added to cart successfully!\n\n");
        if let Some(entry) = &modification.entry {
            let product_name = entry
                .product
                .as_ref()
                .and_then(|p| non_empty(&p.name))
                .unwrap_or(&args.product_code);
            text.push_str(&format!("**Product:** {product_name}\n"));

            let added = modification
                .quantity_added
                .as_ref()
                .filter(|n| n.as_f64().is_some_and(|v| v != 0.0))
                .map(ToString::to_string)
                .unwrap_or_else(|| args.quantity.to_string());
            text.push_str(&format!("**Quantity Added:** {added}\n"));

            if let Some(total) = &entry.total_price {
                text.push_str(&format!("**Line Total:** {}\n", total.display()));
            }
            if let (Some(_), Some(pos)) = (pickup_store, &entry.delivery_point_of_service) {
                text.push_str(&format!("**Pickup Store:** {}\n", pos.label()));
            }
        }
        text.push_str(&status_suffix(&modification));

        Ok(ToolResponse::text(text))
    }
}

fn add_to_cart(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "add-to-cart",
        "Add a product to the user's shopping cart in SAP Commerce",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .required("productCode", ParamType::String, "Product code to add to cart")
            .with_default("quantity", ParamType::Integer, 1, "Quantity to add (default: 1)")
            .optional("pickupStore", ParamType::String, "Pickup store name for in-store pickup")
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(AddToCart {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error adding product to cart")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetCartArgs {
    base_site_id: String,
    user_id: String,
    cart_id: String,
    fields: String,
}

struct GetCart {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetCart {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: GetCartArgs = parse_args(args)?;
        let url = self.api.endpoint(
            &[&args.base_site_id, "users", &args.user_id, "carts", &args.cart_id],
            &[("fields", args.fields.as_str())],
        );

        let cart: Cart = required(
            self.api.get(url, ctx).await?,
            format!("Failed to retrieve cart \"{}\" from SAP Commerce API", args.cart_id),
        )?;

        Ok(ToolResponse::text(format!(
            "Cart details:\n\n{}",
            format_cart(&cart)
        )))
    }
}

fn get_cart(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get-cart",
        "Get the current shopping cart details from SAP Commerce",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .with_default("cartId", ParamType::String, "current", CART_DOC)
            .with_default("fields", ParamType::String, "FULL", "Response field configuration (DEFAULT, BASIC, FULL)"),
        Arc::new(GetCart {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error retrieving cart")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCartEntryArgs {
    base_site_id: String,
    user_id: String,
    entry_number: i64,
    quantity: i64,
    cart_id: String,
    fields: String,
}

struct UpdateCartEntry {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for UpdateCartEntry {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: UpdateCartEntryArgs = parse_args(args)?;
        let entry_number = args.entry_number.to_string();
        let url = self.api.endpoint(
            &[
                &args.base_site_id,
                "users",
                &args.user_id,
                "carts",
                &args.cart_id,
                "entries",
                &entry_number,
            ],
            &[("fields", args.fields.as_str())],
        );

        let updating = args.quantity > 0;
        let (method, body) = if updating {
            (Method::PUT, Some(json!({"quantity": args.quantity})))
        } else {
            (Method::DELETE, None)
        };

        // DELETE answers with an empty body.
        let modification: CartModification = self
            .api
            .send(method, url, body, ctx)
            .await?
            .unwrap_or_default();

        let mut text = String::from(if updating {
            "Cart entry updated successfully!\n\n"
        } else {
            "Cart entry removed successfully!\n\n"
        });
        if let Some(entry) = &modification.entry {
            let product_name = entry
                .product
                .as_ref()
                .and_then(|p| non_empty(&p.name))
                .unwrap_or("Product");
            text.push_str(&format!("**Product:** {product_name}\n"));
            if updating {
                let quantity = modification
                    .quantity
                    .as_ref()
                    .filter(|n| n.as_f64().is_some_and(|v| v != 0.0))
                    .map(ToString::to_string)
                    .unwrap_or_else(|| args.quantity.to_string());
                text.push_str(&format!("**New Quantity:** {quantity}\n"));
                if let Some(total) = &entry.total_price {
                    text.push_str(&format!("**Line Total:** {}\n", total.display()));
                }
            }
        }
        text.push_str(&status_suffix(&modification));

        Ok(ToolResponse::text(text))
    }
}

fn update_cart_entry(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "update-cart-entry",
        "Update the quantity of a product in the user's cart or remove it entirely",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .required("entryNumber", ParamType::Integer, "Cart entry number to update")
            .required("quantity", ParamType::Integer, "New quantity (use 0 to remove the item)")
            .with_default("cartId", ParamType::String, "current", CART_DOC)
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(UpdateCartEntry {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error updating cart entry")
}

// ============================================================================
// Checkout
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryAddressArgs {
    base_site_id: String,
    user_id: String,
    address_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    line1: Option<String>,
    line2: Option<String>,
    town: Option<String>,
    postal_code: Option<String>,
    country_isocode: Option<String>,
    region_isocode: Option<String>,
    phone: Option<String>,
    cart_id: String,
}

impl DeliveryAddressArgs {
    /// Body for the PUT: a reference to a saved address, or a new one.
    fn request_body(&self) -> Result<Value, ToolError> {
        if let Some(address_id) = non_empty(&self.address_id) {
            return Ok(json!({"addressId": address_id}));
        }

        let (Some(first), Some(last), Some(line1), Some(town), Some(country)) = (
            non_empty(&self.first_name),
            non_empty(&self.last_name),
            non_empty(&self.line1),
            non_empty(&self.town),
            non_empty(&self.country_isocode),
        ) else {
            return Err(ToolError::InvalidInput {
                message: "When not using an existing addressId, firstName, lastName, line1, town, and countryIsocode are required.".to_string(),
            });
        };

        let mut body = json!({
            "firstName": first,
            "lastName": last,
            "line1": line1,
            "town": town,
            "country": {"isocode": country},
        });
        if let Some(line2) = non_empty(&self.line2) {
            body["line2"] = json!(line2);
        }
        if let Some(postal) = non_empty(&self.postal_code) {
            body["postalCode"] = json!(postal);
        }
        if let Some(region) = non_empty(&self.region_isocode) {
            body["region"] = json!({"isocode": region});
        }
        if let Some(phone) = non_empty(&self.phone) {
            body["phone"] = json!(phone);
        }
        Ok(body)
    }
}

struct SetDeliveryAddress {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SetDeliveryAddress {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: DeliveryAddressArgs = parse_args(args)?;
        let body = args.request_body()?;

        let url = self.api.endpoint(
            &[
                &args.base_site_id,
                "users",
                &args.user_id,
                "carts",
                &args.cart_id,
                "addresses",
                "delivery",
            ],
            &[],
        );
        let address: Option<Address> = self.api.send(Method::PUT, url, Some(body), ctx).await?;

        let mut text = String::from("Delivery address set successfully!");
        if let Some(address) = address {
            text.push_str(&format!(
                "\n\n**Address:**\n{}",
                address_lines(&address).join("\n")
            ));
            if let Some(phone) = non_empty(&address.phone) {
                text.push_str(&format!("\n**Phone:** {phone}"));
            }
        }
        Ok(ToolResponse::text(text))
    }
}

fn set_delivery_address(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "set-delivery-address",
        "Set the delivery address for the user's cart",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .optional("addressId", ParamType::String, "Existing address ID to use")
            .optional("firstName", ParamType::String, "First name (required if creating new address)")
            .optional("lastName", ParamType::String, "Last name (required if creating new address)")
            .optional("line1", ParamType::String, "Address line 1 (required if creating new address)")
            .optional("line2", ParamType::String, "Address line 2")
            .optional("town", ParamType::String, "City/Town (required if creating new address)")
            .optional("postalCode", ParamType::String, "Postal/ZIP code")
            .optional("countryIsocode", ParamType::String, "Country ISO code (e.g., 'US', 'DE')")
            .optional("regionIsocode", ParamType::String, "Region/State ISO code")
            .optional("phone", ParamType::String, "Phone number")
            .with_default("cartId", ParamType::String, "current", CART_DOC),
        Arc::new(SetDeliveryAddress {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error setting delivery address")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryModeArgs {
    base_site_id: String,
    user_id: String,
    delivery_mode_id: String,
    cart_id: String,
}

struct SetDeliveryMode {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SetDeliveryMode {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: DeliveryModeArgs = parse_args(args)?;
        let url = self.api.endpoint(
            &[
                &args.base_site_id,
                "users",
                &args.user_id,
                "carts",
                &args.cart_id,
                "deliverymode",
            ],
            &[("deliveryModeId", args.delivery_mode_id.as_str())],
        );

        // OCC answers 200 with no body; any payload is ignored.
        self.api.send::<Value>(Method::PUT, url, None, ctx).await?;

        Ok(ToolResponse::text(format!(
            "Delivery mode set successfully!\n\n**Delivery Mode:** {}",
            args.delivery_mode_id
        )))
    }
}

fn set_delivery_mode(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "set-delivery-mode",
        "Set the delivery mode for the user's cart",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .required("deliveryModeId", ParamType::String, "Delivery mode code (e.g., 'standard-gross', 'premium-gross')")
            .with_default("cartId", ParamType::String, "current", CART_DOC),
        Arc::new(SetDeliveryMode {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error setting delivery mode")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryModesArgs {
    base_site_id: String,
    user_id: String,
    cart_id: String,
}

struct GetDeliveryModes {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetDeliveryModes {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: DeliveryModesArgs = parse_args(args)?;
        let url = self.api.endpoint(
            &[
                &args.base_site_id,
                "users",
                &args.user_id,
                "carts",
                &args.cart_id,
                "deliverymodes",
            ],
            &[],
        );

        let list: DeliveryModeList = required(
            self.api.get(url, ctx).await?,
            "Failed to retrieve delivery modes from SAP Commerce API",
        )?;

        let modes = list.delivery_modes.unwrap_or_default();
        if modes.is_empty() {
            return Ok(ToolResponse::text("No delivery modes available for this cart."));
        }
        Ok(ToolResponse::text(format_delivery_modes(&modes)))
    }
}

fn get_delivery_modes(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get-delivery-modes",
        "Get available delivery modes for the user's cart",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .with_default("cartId", ParamType::String, "current", CART_DOC),
        Arc::new(GetDeliveryModes {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error retrieving delivery modes")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderArgs {
    base_site_id: String,
    user_id: String,
    cart_id: String,
    security_code: Option<String>,
    terms_checked: bool,
    fields: String,
}

struct PlaceOrder {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for PlaceOrder {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: PlaceOrderArgs = parse_args(args)?;
        if !args.terms_checked {
            return Err(ToolError::InvalidInput {
                message: "Terms and conditions must be accepted before placing an order."
                    .to_string(),
            });
        }

        let mut body = json!({
            "cartId": args.cart_id,
            "termsChecked": args.terms_checked,
        });
        if let Some(code) = non_empty(&args.security_code) {
            body["securityCode"] = json!(code);
        }

        let url = self.api.endpoint(
            &[&args.base_site_id, "users", &args.user_id, "orders"],
            &[("fields", args.fields.as_str())],
        );
        let order: Order = required(
            self.api.send(Method::POST, url, Some(body), ctx).await?,
            "Failed to place order via SAP Commerce API",
        )?;

        let mut text = String::from("🎉 **ORDER PLACED SUCCESSFULLY!** 🎉\n\n");
        text.push_str(&format!(
            "**Order Number:** {}\n",
            order.code.as_deref().unwrap_or_default()
        ));
        text.push_str(&format!(
            "**Order Status:** {}\n",
            non_empty(&order.status_display)
                .or(non_empty(&order.status))
                .unwrap_or_default()
        ));
        if let Some(total) = order
            .total_price_with_tax
            .as_ref()
            .or(order.total_price.as_ref())
        {
            text.push_str(&format!("**Total Amount:** {}\n", total.display()));
        }
        text.push('\n');
        text.push_str(&format_order_details(&order));

        Ok(ToolResponse::text(text))
    }
}

fn place_order(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "place-order",
        "Place an order from the user's current cart",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("userId", ParamType::String, USER_DOC)
            .with_default("cartId", ParamType::String, "current", CART_DOC)
            .optional("securityCode", ParamType::String, "Credit card security code (CVV) if required")
            .with_default("termsChecked", ParamType::Boolean, true, "Confirm terms and conditions are accepted")
            .with_default("fields", ParamType::String, "FULL", FIELDS_DOC),
        Arc::new(PlaceOrder {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error placing order")
}

/// Register the eleven B2C tools, in catalog order.
pub fn register(registry: &mut ToolRegistry, api: &Arc<CommerceApi>) -> Result<(), RegistryError> {
    for descriptor in [
        product_search(api),
        get_base_sites(api),
        order_history(api),
        order_details(api),
        add_to_cart(api),
        get_cart(api),
        update_cart_entry(api),
        set_delivery_address(api),
        set_delivery_mode(api),
        get_delivery_modes(api),
        place_order(api),
    ] {
        registry.register(descriptor)?;
    }
    Ok(())
}
